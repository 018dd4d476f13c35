use std::path::PathBuf;

/// Request methods understood by the server.
///
/// Only the simple GET operation is supported. The method token is accepted
/// in exactly two spellings, `GET` and `get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a file
    GET,
}

/// A request line extracted from the first chunk read on a connection.
///
/// The path is a slice of the received bytes and has not been checked
/// against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The request method
    pub method: Method,
    /// Resource path bytes, without the leading path character
    pub path: Vec<u8>,
    /// The request line with CR/LF replaced and trailing bytes cut off, for logging
    pub line: String,
}

impl Method {
    /// Matches the method token prefix (including its trailing space).
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::request::Method;
    /// assert_eq!(Method::from_prefix(b"GET /index.html"), Some(Method::GET));
    /// assert_eq!(Method::from_prefix(b"get /index.html"), Some(Method::GET));
    /// assert_eq!(Method::from_prefix(b"Get /index.html"), None);
    /// ```
    pub fn from_prefix(buf: &[u8]) -> Option<Self> {
        match buf.get(..4)? {
            b"GET " | b"get " => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

impl Request {
    /// The resource path as a filesystem path, relative unless the request
    /// named an absolute one.
    pub fn resource_path(&self) -> PathBuf {
        #[cfg(unix)]
        {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;
            PathBuf::from(OsStr::from_bytes(&self.path))
        }
        #[cfg(not(unix))]
        {
            PathBuf::from(String::from_utf8_lossy(&self.path).into_owned())
        }
    }

    /// The resource path for display purposes.
    pub fn path_lossy(&self) -> String {
        String::from_utf8_lossy(&self.path).into_owned()
    }
}
