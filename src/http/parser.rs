use thiserror::Error;

use crate::http::request::{Method, Request};

/// Offset of the first path byte after `GET /`.
///
/// The character at offset 4 is dropped from the path, the way the filesystem
/// lookup always has.
const PATH_START: usize = 5;

/// Byte written over every CR and LF in the received request.
const PLACEHOLDER: u8 = b'*';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("failed to read request")]
    ReadFailure,
    #[error("only simple GET operation supported")]
    UnsupportedMethod,
    #[error("request line has no terminating space")]
    MalformedRequest,
}

/// Parses the request line from the bytes of a connection's first read.
///
/// `buf` is the consumed region of a buffer `capacity` bytes long. CR and LF
/// bytes in it are overwritten in place. A read that filled the whole buffer
/// may be cut short, so it is rejected as malformed.
pub fn parse_request(buf: &mut [u8], capacity: usize) -> Result<Request, ParseError> {
    if buf.is_empty() {
        return Err(ParseError::ReadFailure);
    }

    for byte in buf.iter_mut() {
        if *byte == b'\r' || *byte == b'\n' {
            *byte = PLACEHOLDER;
        }
    }

    if buf.len() >= capacity {
        return Err(ParseError::MalformedRequest);
    }

    let method = Method::from_prefix(buf).ok_or(ParseError::UnsupportedMethod)?;

    // "GET URL " followed by anything else, which is ignored
    let end = buf[4..]
        .iter()
        .position(|&b| b == b' ')
        .map(|i| i + 4)
        .ok_or(ParseError::MalformedRequest)?;

    let mut path = buf.get(PATH_START..end).unwrap_or(&[]);
    if let Some(nul) = path.iter().position(|&b| b == 0) {
        path = &path[..nul];
    }

    Ok(Request {
        method,
        path: path.to_vec(),
        line: String::from_utf8_lossy(&buf[..end]).into_owned(),
    })
}
