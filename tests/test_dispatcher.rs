use minihttp::http::mime::MimeTable;
use minihttp::http::request::{Request, RequestBuilder};
use minihttp::http::response::{Body, Response};
use minihttp::routing::{BoxedHandler, DispatchError, Dispatcher, Registry};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn static_root(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(format!("minihttp-dispatch-{}-{name}", std::process::id()));
    std::fs::create_dir_all(root.join("root")).unwrap();
    std::fs::create_dir_all(root.join("myweb")).unwrap();
    std::fs::write(root.join("root/404.html"), "<h1>missing</h1>").unwrap();
    std::fs::write(root.join("myweb/index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(root.join("myweb/style.css"), "body{}").unwrap();
    root
}

fn get(path: &str) -> Request {
    RequestBuilder::new().uri(path).build().unwrap()
}

fn hello(_req: &Request, resp: &mut Response) -> anyhow::Result<()> {
    resp.set_content_type("text/plain");
    write!(resp.writer(), "hello")?;
    Ok(())
}

fn dispatcher(root: &Path) -> Dispatcher {
    let registry = Registry::builder(root)
        .mime_table(MimeTable::builtin().unwrap())
        .route("/hello", hello)
        .build();
    Dispatcher::new(Arc::new(registry))
}

#[test]
fn test_lookup_returns_same_handler() {
    let registry = Registry::builder("static").route("/hello", hello).build();

    let first = registry.lookup("/hello").unwrap();
    let second = registry.lookup("/hello").unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert!(registry.lookup("/hello/").is_none());
    assert!(registry.lookup("/HELLO").is_none());
}

#[test]
fn test_later_registration_wins() {
    let first: BoxedHandler = Arc::new(hello);
    let second: BoxedHandler = Arc::new(hello);

    let registry = Registry::builder("static")
        .boxed_route("/p", Arc::clone(&first))
        .boxed_route("/p", Arc::clone(&second))
        .build();

    assert_eq!(registry.len(), 1);
    assert!(Arc::ptr_eq(registry.lookup("/p").unwrap(), &second));
}

#[test]
fn test_registry_not_found_page_is_below_root() {
    let registry = Registry::builder("/srv/www").not_found_page("errors/404.html").build();
    assert_eq!(registry.not_found_page(), Path::new("/srv/www/errors/404.html"));
}

#[tokio::test]
async fn test_dispatch_to_handler() {
    let root = static_root("handler");
    let response = dispatcher(&root).dispatch(get("/hello?x=1"), Response::new()).await.unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert!(matches!(response.body(), Body::Buffer(b) if b == b"hello"));
}

#[tokio::test]
async fn test_dispatch_static_file() {
    let root = static_root("static");
    let response = dispatcher(&root)
        .dispatch(get("/myweb/index.html"), Response::new())
        .await
        .unwrap();

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.header("Content-Length"), Some("13"));
    assert_eq!(response.content_file(), Some(root.join("myweb/index.html").as_path()));
}

#[tokio::test]
async fn test_dispatch_static_css_type() {
    let root = static_root("css");
    let response = dispatcher(&root)
        .dispatch(get("/myweb/style.css"), Response::new())
        .await
        .unwrap();

    assert_eq!(response.header("Content-Type"), Some("text/css"));
}

#[tokio::test]
async fn test_dispatch_unknown_path_is_404() {
    let root = static_root("missing");
    let response = dispatcher(&root)
        .dispatch(get("/nope.html"), Response::new())
        .await
        .unwrap();

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.status_reason(), "Not Found");
    assert_eq!(response.header("Content-Type"), Some("text/html"));
    assert_eq!(response.content_file(), Some(root.join("root/404.html").as_path()));
}

#[tokio::test]
async fn test_dispatch_directory_is_404() {
    let root = static_root("dir");
    let response = dispatcher(&root).dispatch(get("/myweb"), Response::new()).await.unwrap();
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_dispatch_parent_traversal_is_404() {
    let root = static_root("traversal");
    let response = dispatcher(&root)
        .dispatch(get("/myweb/../../etc/passwd"), Response::new())
        .await
        .unwrap();

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.content_file(), Some(root.join("root/404.html").as_path()));
}

#[tokio::test]
async fn test_dispatch_without_not_found_page() {
    let root = static_root("no404");
    let registry = Registry::builder(&root).not_found_page("gone.html").build();
    let response = Dispatcher::new(Arc::new(registry))
        .dispatch(get("/x"), Response::new())
        .await
        .unwrap();

    assert_eq!(response.status_code(), 404);
    assert_eq!(response.header("Content-Length"), Some("0"));
    assert!(matches!(response.body(), Body::Empty));
}

#[tokio::test]
async fn test_dispatch_handler_error() {
    let registry = Registry::builder("static")
        .route("/fail", |_req: &Request, _resp: &mut Response| -> anyhow::Result<()> {
            anyhow::bail!("database offline")
        })
        .build();

    let err = Dispatcher::new(Arc::new(registry))
        .dispatch(get("/fail"), Response::new())
        .await
        .unwrap_err();

    match &err {
        DispatchError::HandlerFailed { path, source } => {
            assert_eq!(path, "/fail");
            assert_eq!(source.to_string(), "database offline");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_dispatch_handler_panic() {
    let registry = Registry::builder("static")
        .route("/boom", |_req: &Request, _resp: &mut Response| -> anyhow::Result<()> {
            panic!("handler exploded")
        })
        .build();

    let err = Dispatcher::new(Arc::new(registry))
        .dispatch(get("/boom"), Response::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::HandlerPanicked { ref path, .. } if path == "/boom"));
}
