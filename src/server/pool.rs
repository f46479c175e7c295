//! Bounded worker pool
//!
//! Limits how many exchanges run at once and, optionally, how many accepted
//! connections may wait for a free worker. Without a queue bound waiting
//! connections simply pile up; with one, excess connections are refused at
//! accept time.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    workers: usize,
    max_queued: Option<usize>,
}

/// A connection admitted to the pool, not yet running.
#[derive(Debug)]
pub struct Admission {
    kind: AdmissionKind,
}

#[derive(Debug)]
enum AdmissionKind {
    Ready(OwnedSemaphorePermit),
    Queued {
        slot: QueueSlot,
        permits: Arc<Semaphore>,
    },
}

/// Holds one place in the wait queue until dropped.
#[derive(Debug)]
struct QueueSlot(Arc<AtomicUsize>);

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl WorkerPool {
    /// Create a pool running at most `workers` exchanges concurrently
    pub fn new(workers: usize, max_queued: Option<usize>) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            queued: Arc::new(AtomicUsize::new(0)),
            workers,
            max_queued,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Workers currently idle
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Connections waiting for a worker
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Admit a new connection.
    ///
    /// Returns `None` when every worker is busy and the wait queue is full.
    pub fn admit(&self) -> Option<Admission> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Some(Admission {
                kind: AdmissionKind::Ready(permit),
            });
        }

        let waiting = self.queued.fetch_add(1, Ordering::SeqCst);
        let slot = QueueSlot(Arc::clone(&self.queued));
        if let Some(max) = self.max_queued {
            if waiting >= max {
                return None;
            }
        }

        Some(Admission {
            kind: AdmissionKind::Queued {
                slot,
                permits: Arc::clone(&self.permits),
            },
        })
    }
}

impl Admission {
    pub fn is_queued(&self) -> bool {
        matches!(self.kind, AdmissionKind::Queued { .. })
    }

    /// Wait for a worker. The returned permit frees the worker when dropped.
    pub async fn acquire(self) -> anyhow::Result<OwnedSemaphorePermit> {
        match self.kind {
            AdmissionKind::Ready(permit) => Ok(permit),
            AdmissionKind::Queued { slot, permits } => {
                let permit = permits.acquire_owned().await?;
                drop(slot);
                Ok(permit)
            }
        }
    }
}
