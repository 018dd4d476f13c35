use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::Config;
use crate::error::HandlerError;
use crate::http::parser::parse_request;
use crate::http::request::Request;
use crate::http::response::ResponseHeader;
use crate::http::writer::ResponseWriter;

/// Handles exactly one accepted connection, end to end.
///
/// The stream and any opened file are owned here, so every exit path
/// (including errors and panics) closes both when the `Connection` drops.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    order: u64,
    config: Arc<Config>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Serving(Request),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, order: u64, config: Arc<Config>) -> Self {
        Self {
            stream,
            peer,
            order,
            config,
            state: ConnectionState::Reading,
        }
    }

    /// Runs the connection to completion. Any error leaves the state
    /// `Closed`, and the stream is closed when `self` is dropped.
    pub async fn run(&mut self) -> Result<(), HandlerError> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let request = self.read_request().await?;
                    self.state = ConnectionState::Serving(request);
                }

                ConnectionState::Serving(request) => {
                    self.serve(&request).await?;
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(())
    }

    /// Reads the request in one go. There is no reassembly across reads.
    pub async fn read_request(&mut self) -> Result<Request, HandlerError> {
        let capacity = self.config.max_request_size;
        let mut buffer = BytesMut::zeroed(capacity);

        let n = self
            .stream
            .read(&mut buffer[..])
            .await
            .map_err(HandlerError::Read)?;

        let request = parse_request(&mut buffer[..n], capacity)?;
        debug!(peer = %self.peer, order = self.order, line = %request.line, "Request received");
        Ok(request)
    }

    /// Streams the requested file, then drains and closes.
    pub async fn serve(&mut self, request: &Request) -> Result<u64, HandlerError> {
        let path = self.config.root.join(request.resource_path());
        let unavailable = |source: io::Error| HandlerError::ResourceUnavailable {
            path: path.clone(),
            source,
        };

        let file = File::open(&path).await.map_err(&unavailable)?;
        let metadata = file.metadata().await.map_err(&unavailable)?;
        if !metadata.is_file() {
            return Err(unavailable(io::Error::other("not a regular file")));
        }

        let header = ResponseHeader::ok(metadata.len());
        debug!(
            order = self.order,
            content_length = header.content_length,
            path = %request.path_lossy(),
            "Sending header"
        );

        let mut writer = ResponseWriter::new(&header, file, self.config.max_request_size);
        let sent = writer.write_to_stream(&mut self.stream).await?;
        debug!(order = self.order, bytes = writer.written(), "Payload sent");
        drop(writer);

        self.drain().await?;
        Ok(sent)
    }

    /// Shuts down the write half, then discards inbound bytes until the peer
    /// closes or the drain timeout elapses. Closing with unread inbound data
    /// would reset the connection and could cut off the response.
    async fn drain(&mut self) -> Result<(), HandlerError> {
        self.stream
            .shutdown()
            .await
            .map_err(HandlerError::StreamWrite)?;

        let limit = self.config.drain_timeout();
        let stream = &mut self.stream;
        let linger = async move {
            let mut scratch = [0u8; 512];
            loop {
                match stream.read(&mut scratch).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
        };

        if tokio::time::timeout(limit, linger).await.is_err() {
            debug!(order = self.order, "Drain timeout elapsed, closing");
        }

        Ok(())
    }
}
