use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::write_response;
use crate::routing::{Dispatcher, Registry};
use crate::server::pool::WorkerPool;

/// Pause after a failed accept, e.g. when out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub async fn run(cfg: &Config, registry: Arc<Registry>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.server.listen_addr))?;

    let pool = WorkerPool::new(cfg.server.workers, cfg.server.max_queued);
    serve(listener, Dispatcher::new(registry), pool).await
}

/// Accepts connections forever, one exchange per connection.
pub async fn serve(listener: TcpListener, dispatcher: Dispatcher, pool: WorkerPool) -> anyhow::Result<()> {
    info!(
        addr = %listener.local_addr()?,
        workers = pool.workers(),
        "Listening"
    );

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!("accept error: {e}");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        tracing::debug!(%peer, "Accepted connection");

        let Some(admission) = pool.admit() else {
            tracing::warn!(%peer, queued = pool.queued(), "Worker queue full, rejecting connection");
            tokio::spawn(reject(socket));
            continue;
        };

        let dispatcher = dispatcher.clone();
        tokio::spawn(async move {
            let _worker = match admission.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!(%peer, error = %e, "Worker pool closed");
                    return;
                }
            };

            let conn = Connection::new(socket, dispatcher);
            if let Err(e) = conn.run().await {
                tracing::warn!(%peer, "Connection error: {e:#}");
            }
        });
    }
}

async fn reject(mut socket: TcpStream) {
    let mut response = Response::error(StatusCode::ServiceUnavailable);
    if let Err(e) = write_response(&mut response, &mut socket).await {
        tracing::debug!(error = %e, "Failed to send 503");
    }
    let _ = socket.shutdown().await;
}
