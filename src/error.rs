//! Error taxonomy for the dispatcher and for connection handlers.
//!
//! Dispatcher errors are never fatal to the accept loop. Handler errors are
//! fatal to the one connection they occur on and never leave its task.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::parser::ParseError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("accept failed: {0}")]
    AcceptFailure(#[source] io::Error),

    #[error("cannot spawn handler: {active} of {limit} handlers running")]
    SpawnFailure { active: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("failed to read request: {0}")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to open {}: {source}", path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("response stream aborted: {0}")]
    StreamWrite(#[source] io::Error),
}

impl HandlerError {
    /// Taxonomy name used as the `kind` field in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::Read(_) => "read_failure",
            HandlerError::Parse(ParseError::ReadFailure) => "read_failure",
            HandlerError::Parse(ParseError::UnsupportedMethod) => "unsupported_method",
            HandlerError::Parse(ParseError::MalformedRequest) => "malformed_request",
            HandlerError::ResourceUnavailable { .. } => "resource_unavailable",
            HandlerError::StreamWrite(_) => "stream_write_failure",
        }
    }
}
