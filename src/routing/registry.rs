//! Path to handler registry.
//!
//! Every handler, whatever business logic it wraps, is stored behind the same
//! capability: [`Handler::handle`] receives the parsed request and the response
//! under construction. The registry is assembled once by [`RegistryBuilder`]
//! before the listener starts and is shared read-only (`Arc<Registry>`) by all
//! connection tasks afterwards.
//!
//! ```text
//! fn login(req: &Request, resp: &mut Response) -> anyhow::Result<()>   ← user writes this
//!        ↓ builder.route("/myweb/login", login)
//! Arc::new(login) as BoxedHandler                                       ← blanket impl
//!        ↓ registry.lookup("/myweb/login")
//! handler.handle(&request, &mut response)                               ← one vtable call
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::http::mime::MimeTable;
use crate::http::request::Request;
use crate::http::response::Response;

/// A unit of business logic bound to one exact request path.
///
/// Implemented automatically for any `Fn(&Request, &mut Response) ->
/// anyhow::Result<()>`. Handlers run on a blocking-capable thread, so plain
/// file I/O inside them is fine. Returning an error (or panicking) aborts the
/// exchange.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        (self)(request, response)
    }
}

/// A shared, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// The immutable routing table plus the static-content settings.
pub struct Registry {
    routes: HashMap<String, BoxedHandler>,
    static_root: PathBuf,
    not_found_page: PathBuf,
    mime: MimeTable,
}

impl Registry {
    pub fn builder(static_root: impl Into<PathBuf>) -> RegistryBuilder {
        RegistryBuilder::new(static_root)
    }

    /// Exact-match lookup. The same path always yields the same handler.
    pub fn lookup(&self, path: &str) -> Option<&BoxedHandler> {
        self.routes.get(path)
    }

    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// Full path of the document served with 404 responses.
    pub fn not_found_page(&self) -> PathBuf {
        self.static_root.join(&self.not_found_page)
    }

    pub fn mime(&self) -> &MimeTable {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

/// Collects route registrations before the server starts.
pub struct RegistryBuilder {
    routes: HashMap<String, BoxedHandler>,
    static_root: PathBuf,
    not_found_page: PathBuf,
    mime: MimeTable,
}

impl RegistryBuilder {
    pub fn new(static_root: impl Into<PathBuf>) -> Self {
        Self {
            routes: HashMap::new(),
            static_root: static_root.into(),
            not_found_page: PathBuf::from("root/404.html"),
            mime: MimeTable::default(),
        }
    }

    /// Document served with 404 responses, relative to the static root.
    pub fn not_found_page(mut self, page: impl Into<PathBuf>) -> Self {
        self.not_found_page = page.into();
        self
    }

    pub fn mime_table(mut self, mime: MimeTable) -> Self {
        self.mime = mime;
        self
    }

    /// Registers `handler` for `path`. A later registration for the same
    /// path replaces the earlier one.
    pub fn route(self, path: impl Into<String>, handler: impl Handler) -> Self {
        self.boxed_route(path, Arc::new(handler))
    }

    pub fn boxed_route(mut self, path: impl Into<String>, handler: BoxedHandler) -> Self {
        let path = path.into();
        tracing::debug!(path = %path, "Registered handler");
        if self.routes.insert(path.clone(), handler).is_some() {
            tracing::warn!(path = %path, "Handler registered twice, keeping the later one");
        }
        self
    }

    /// Registers every `(path, handler)` pair in order.
    pub fn routes<I, P>(self, routes: I) -> Self
    where
        I: IntoIterator<Item = (P, BoxedHandler)>,
        P: Into<String>,
    {
        routes
            .into_iter()
            .fold(self, |builder, (path, handler)| builder.boxed_route(path, handler))
    }

    pub fn build(self) -> Registry {
        tracing::info!(
            routes = self.routes.len(),
            static_root = %self.static_root.display(),
            "Route registry built"
        );

        Registry {
            routes: self.routes,
            static_root: self.static_root,
            not_found_page: self.not_found_page,
            mime: self.mime,
        }
    }
}
