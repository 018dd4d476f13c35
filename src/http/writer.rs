use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::HandlerError;
use crate::http::response::ResponseHeader;

/// Writes a response header followed by exactly `content_length` bytes read
/// from `body`, in blocks of at most `block_size` bytes.
pub struct ResponseWriter<R> {
    header: Vec<u8>,
    body: R,
    remaining: u64,
    block: BytesMut,
    written: u64,
}

impl<R> ResponseWriter<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(header: &ResponseHeader, body: R, block_size: usize) -> Self {
        Self {
            header: header.to_bytes(),
            body,
            remaining: header.content_length,
            block: BytesMut::zeroed(block_size.max(1)),
            written: 0,
        }
    }

    /// Payload bytes written so far, excluding the header.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Streams the header and payload, returning the payload byte count.
    ///
    /// Never writes more than the announced length. A body that ends early
    /// aborts the stream, so the peer sees a truncated response rather than a
    /// wrong one.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> Result<u64, HandlerError>
    where
        W: AsyncWrite + Unpin,
    {
        stream
            .write_all(&self.header)
            .await
            .map_err(HandlerError::StreamWrite)?;

        while self.remaining > 0 {
            let want = usize::try_from(self.remaining)
                .map_or(self.block.len(), |r| r.min(self.block.len()));
            let n = self
                .body
                .read(&mut self.block[..want])
                .await
                .map_err(HandlerError::StreamWrite)?;

            if n == 0 {
                return Err(HandlerError::StreamWrite(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("resource ended {} bytes short", self.remaining),
                )));
            }

            stream
                .write_all(&self.block[..n])
                .await
                .map_err(HandlerError::StreamWrite)?;

            self.remaining -= n as u64;
            self.written += n as u64;
        }

        stream.flush().await.map_err(HandlerError::StreamWrite)?;
        Ok(self.written)
    }
}
