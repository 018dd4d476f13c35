//! Courier - a minimal concurrent file server
//!
//! Accepts TCP connections, reads a one-line `GET` request from each and
//! streams back the named file behind a length-prefixed header.

pub mod config;
pub mod error;
pub mod http;
pub mod server;
