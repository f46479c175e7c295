//! Sample web application served under `/myweb`.
//!
//! Not part of the engine: it only uses the public handler contract and shows
//! how an application assembles its route list at startup.

pub mod articles;
pub mod store;
pub mod users;

use std::sync::Arc;

use crate::config::StorageConfig;
use crate::routing::BoxedHandler;

use articles::{Article, ArticleStore, WriteArticle};
use store::YamlFileStore;
use users::{Login, Register, ShowAllUsers, User, UserStore};

/// The application's `(path, handler)` pairs.
pub fn routes(storage: &StorageConfig) -> anyhow::Result<Vec<(&'static str, BoxedHandler)>> {
    let users: UserStore = Arc::new(YamlFileStore::<User>::open(&storage.users_dir)?);
    let articles: ArticleStore = Arc::new(YamlFileStore::<Article>::open(&storage.articles_dir)?);

    Ok(vec![
        ("/myweb/reg", Arc::new(Register::new(Arc::clone(&users))) as BoxedHandler),
        ("/myweb/login", Arc::new(Login::new(Arc::clone(&users))) as BoxedHandler),
        ("/myweb/showAllUser", Arc::new(ShowAllUsers::new(users)) as BoxedHandler),
        ("/myweb/writeArticle", Arc::new(WriteArticle::new(articles)) as BoxedHandler),
    ])
}
