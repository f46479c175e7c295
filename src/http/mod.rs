//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.x side of the server: exactly one
//! request and one response per TCP connection.
//!
//! Submodules, in the order a request flows through them:
//!
//! - [`parser`] reads the request line, headers and body off the stream
//! - [`request`] holds the parsed request (path, parameters, headers)
//! - [`response`] is the response handlers fill in
//! - [`writer`] serializes a response, streaming file bodies in chunks
//! - [`mime`] maps file extensions to content types
//! - [`connection`] ties them together for one exchange
//!
//! # Exchange states
//!
//! ```text
//! Reading ──parsed──▶ Processing ──response──▶ Writing ──sent──▶ Closed
//!    │                    │                      ▲
//!    │ malformed (400/413)│ handler fault (500)  │
//!    ├────────────────────┴──────────────────────┘
//!    │
//!    └─ empty request ───────────────────────────────────────▶ Closed
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;
pub mod mime;
