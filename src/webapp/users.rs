//! Registration and login.

use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::Handler;
use crate::webapp::store::{RecordStore, is_valid_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub age: u32,
}

pub type UserStore = Arc<dyn RecordStore<User>>;

/// `/myweb/reg`
pub struct Register {
    users: UserStore,
}

impl Register {
    pub fn new(users: UserStore) -> Self {
        Self { users }
    }
}

impl Handler for Register {
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        let fields = (
            request.parameter("username"),
            request.parameter("password"),
            request.parameter("nickname"),
            request.parameter("age").and_then(parse_age),
        );
        let (Some(username), Some(password), Some(nickname), Some(age)) = fields else {
            tracing::info!("Registration rejected, incomplete form");
            response.send_redirect("/myweb/reg_fail.html");
            return Ok(());
        };

        if !is_valid_id(username) {
            tracing::info!(username, "Registration rejected, unusable username");
            response.send_redirect("/myweb/reg_fail.html");
            return Ok(());
        }

        let user = User {
            username: username.to_string(),
            password: password.to_string(),
            nickname: nickname.to_string(),
            age,
        };
        if !self.users.create(username, &user)? {
            tracing::info!(username, "Registration rejected, user exists");
            response.send_redirect("/myweb/have_user.html");
            return Ok(());
        }

        tracing::info!(username, "User registered");
        response.send_redirect("/myweb/reg_success.html");
        Ok(())
    }
}

/// Digits only, as the registration form requires.
fn parse_age(value: &str) -> Option<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// `/myweb/login`
pub struct Login {
    users: UserStore,
}

impl Login {
    pub fn new(users: UserStore) -> Self {
        Self { users }
    }
}

impl Handler for Login {
    fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()> {
        let (Some(username), Some(password)) =
            (request.parameter("username"), request.parameter("password"))
        else {
            response.send_redirect("/myweb/login_info_error.html");
            return Ok(());
        };

        let stored = if is_valid_id(username) {
            self.users.get(username).unwrap_or_else(|e| {
                tracing::warn!(username, error = %e, "Could not load user");
                None
            })
        } else {
            None
        };

        match stored {
            Some(user) if user.password == password => {
                tracing::info!(username, "Login succeeded");
                response.send_redirect("/myweb/login_success.html");
            }
            _ => {
                tracing::info!(username, "Login failed");
                response.send_redirect("/myweb/login_fail.html");
            }
        }
        Ok(())
    }
}

/// `/myweb/showAllUser`, an HTML table of every registered user.
pub struct ShowAllUsers {
    users: UserStore,
}

impl ShowAllUsers {
    pub fn new(users: UserStore) -> Self {
        Self { users }
    }
}

impl Handler for ShowAllUsers {
    fn handle(&self, _request: &Request, response: &mut Response) -> anyhow::Result<()> {
        let users = self.users.all()?;

        let mut out = response.writer();
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html lang=\"en\">")?;
        writeln!(out, "<head>")?;
        writeln!(out, "<meta charset=\"UTF-8\">")?;
        writeln!(out, "<title>Users</title>")?;
        writeln!(out, "</head>")?;
        writeln!(out, "<body>")?;
        writeln!(out, "<h1>Users</h1>")?;
        writeln!(out, "<table border=\"1\">")?;
        writeln!(out, "<tr><th>Username</th><th>Nickname</th><th>Age</th></tr>")?;
        for user in &users {
            writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&user.username),
                escape_html(&user.nickname),
                user.age
            )?;
        }
        writeln!(out, "</table>")?;
        writeln!(out, "</body>")?;
        writeln!(out, "</html>")?;

        response.set_content_type("text/html");
        tracing::debug!(users = users.len(), "Rendered user list");
        Ok(())
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_must_be_digits() {
        assert_eq!(parse_age("30"), Some(30));
        assert_eq!(parse_age(""), None);
        assert_eq!(parse_age("-3"), None);
        assert_eq!(parse_age("3a"), None);
        assert_eq!(parse_age("99999999999"), None);
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(escape_html("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
