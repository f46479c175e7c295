use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::Handler;
use crate::webapp::store::{RecordStore, is_valid_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub author: String,
    pub content: String,
}

pub type ArticleStore = Arc<dyn RecordStore<Article>>;

/// `/myweb/writeArticle`, keyed by title; a second article with the same
/// title replaces the first.
pub struct WriteArticle {
    articles: ArticleStore,
}

impl WriteArticle {
    pub fn new(articles: ArticleStore) -> Self {
        Self { articles }
    }
}

impl Handler for WriteArticle {
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        let (Some(title), Some(author), Some(content)) = (
            request.parameter("title"),
            request.parameter("author"),
            request.parameter("content"),
        ) else {
            response.send_redirect("/myweb/writeArticle_info_error.html");
            return Ok(());
        };

        if !is_valid_id(title) {
            response.send_redirect("/myweb/writeArticle_info_error.html");
            return Ok(());
        }

        let article = Article {
            title: title.to_string(),
            author: author.to_string(),
            content: content.to_string(),
        };
        self.articles.put(title, &article)?;

        tracing::info!(title, author, "Article stored");
        response.send_redirect("/myweb/writeArticle_success.html");
        Ok(())
    }
}
