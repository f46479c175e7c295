//! minihttp - one-request-per-connection HTTP/1.x server
//!
//! Core library: request parsing, routing, static files and response
//! serialization. The `webapp` module is a sample application built on top.

pub mod config;
pub mod http;
pub mod routing;
pub mod server;
pub mod webapp;
