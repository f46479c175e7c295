//! Request dispatch.
//!
//! A request path either names a registered handler, a regular file below the
//! static root, or nothing, in which case the not-found document is served
//! with status 404.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::routing::registry::Registry;

/// A handler failed to complete.
#[derive(Debug)]
pub enum DispatchError {
    /// The handler returned an error.
    HandlerFailed { path: String, source: anyhow::Error },
    /// The handler panicked or its task was cancelled.
    HandlerPanicked { path: String, message: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::HandlerFailed { path, source } => {
                write!(f, "handler for {path} failed: {source:#}")
            }
            DispatchError::HandlerPanicked { path, message } => {
                write!(f, "handler for {path} panicked: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::HandlerFailed { source, .. } => Some(&**source),
            DispatchError::HandlerPanicked { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Routes `request` and returns the populated response.
    ///
    /// Handlers run on tokio's blocking pool since they are synchronous and
    /// may touch the filesystem; the request and response move there and the
    /// response comes back on success.
    pub async fn dispatch(&self, request: Request, mut response: Response) -> Result<Response, DispatchError> {
        let path = request.request_path.clone();

        if let Some(handler) = self.registry.lookup(&path) {
            tracing::debug!(path = %path, "Dispatching to handler");

            let handler = Arc::clone(handler);
            let joined = tokio::task::spawn_blocking(move || {
                handler
                    .handle(&request, &mut response)
                    .map(|()| response)
            })
            .await;

            return match joined {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(source)) => Err(DispatchError::HandlerFailed { path, source }),
                Err(e) => Err(DispatchError::HandlerPanicked {
                    path,
                    message: e.to_string(),
                }),
            };
        }

        self.serve_static(&path, &mut response).await;
        Ok(response)
    }

    async fn serve_static(&self, path: &str, response: &mut Response) {
        let mime = self.registry.mime();

        if let Some(file) = resolve_static_path(self.registry.static_root(), path) {
            if let Some(len) = regular_file_len(&file).await {
                tracing::debug!(path = %path, file = %file.display(), len, "Serving static file");
                response.set_content_file(file.clone(), len, mime.for_path(&file));
                return;
            }
        }

        response.set_status(StatusCode::NotFound);

        let page = self.registry.not_found_page();
        match regular_file_len(&page).await {
            Some(len) => response.set_content_file(page.clone(), len, mime.for_path(&page)),
            None => {
                tracing::warn!(page = %page.display(), "Not-found document is missing");
                response.add_header("Content-Length", "0");
            }
        }
        tracing::debug!(path = %path, "No handler or file, answering 404");
    }
}

/// Maps a request path onto a file below `root`.
///
/// Returns `None` for paths that could escape the root (a `..` segment) or
/// that contain a NUL byte. The result is not checked for existence.
pub fn resolve_static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    if request_path.contains('\0') {
        return None;
    }

    let relative = Path::new(request_path.trim_start_matches('/'));
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    Some(resolved)
}

/// Size of `path` if it is an existing regular file.
async fn regular_file_len(path: &Path) -> Option<u64> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    metadata.is_file().then(|| metadata.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_parent_segments() {
        let root = Path::new("static");
        assert_eq!(resolve_static_path(root, "/../secret"), None);
        assert_eq!(resolve_static_path(root, "/myweb/../../x"), None);
        assert_eq!(resolve_static_path(root, "/a\0b"), None);
    }

    #[test]
    fn resolve_joins_below_root() {
        let root = Path::new("static");
        assert_eq!(
            resolve_static_path(root, "/myweb/index.html"),
            Some(PathBuf::from("static/myweb/index.html"))
        );
        assert_eq!(
            resolve_static_path(root, "/myweb/archive..tar"),
            Some(PathBuf::from("static/myweb/archive..tar"))
        );
    }
}
