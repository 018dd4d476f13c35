use std::fmt;

const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes the server emits.
///
/// Failures never produce a response, so success is the only status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
        }
    }
}

/// The fixed response header sent ahead of a file's bytes.
///
/// Lines end in a bare `\n`, not `\r\n`. Clients of this server depend on the
/// exact bytes, so this is not normalised to strict HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: StatusCode,
    /// Exact number of payload bytes that follow the header
    pub content_length: u64,
}

impl ResponseHeader {
    pub fn ok(content_length: u64) -> Self {
        Self {
            status: StatusCode::Ok,
            content_length,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for ResponseHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}\nContent-Length: {}\nConnection: close\n\n",
            HTTP_VERSION,
            self.status.as_u16(),
            self.status.reason_phrase(),
            self.content_length
        )
    }
}
