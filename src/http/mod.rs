//! The file retrieval protocol.
//!
//! A client sends one line, `GET /<path> ...`, in the first chunk of bytes on
//! a connection. The server answers with a fixed header and the file's bytes,
//! then closes:
//!
//! ```text
//! HTTP/1.1 200 OK\nContent-Length: <N>\nConnection: close\n\n<N bytes>
//! ```
//!
//! Any failure closes the connection without a response.
//!
//! - **`connection`**: the per-connection handler state machine
//! - **`parser`**: extracts the resource path from the request bytes
//! - **`request`**: request representation
//! - **`response`**: the response header
//! - **`writer`**: streams the header and payload to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Single read of the request line
//!        └──────┬──────┘
//!               │ Request parsed
//!               ▼
//!        ┌──────────────────┐
//!        │    Serving       │ ← Header, file blocks, drain
//!        └──────┬───────────┘
//!               │ Done, or any error
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
