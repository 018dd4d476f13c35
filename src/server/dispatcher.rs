use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DispatchError;
use crate::http::connection::Connection;
use crate::server::reaper::Reaper;

/// The accept loop.
///
/// Each accepted connection gets its own task; the dispatcher never reads or
/// writes a connection itself. `order` counts accepted connections, starting
/// at 1, and is only used to label log lines.
pub struct Dispatcher {
    listener: TcpListener,
    config: Arc<Config>,
    reaper: Reaper,
    order: u64,
}

impl Dispatcher {
    pub fn new(listener: TcpListener, config: Config) -> Self {
        let reaper = Reaper::new(config.max_handlers);
        Self {
            listener,
            config: Arc::new(config),
            reaper,
            order: 1,
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever. Accept and spawn failures are logged and
    /// the loop carries on, pausing briefly after an accept failure; finished
    /// handlers are reaped as they complete.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer)) => self.dispatch(socket, peer),
                    Err(e) => {
                        let err = DispatchError::AcceptFailure(e);
                        warn!(error = %err, "Accept failed");
                        // Persistent failures such as EMFILE would otherwise spin
                        tokio::time::sleep(self.config.accept_backoff()).await;
                    }
                },

                Some(()) = self.reaper.reap_next() => {}
            }
        }
    }

    fn dispatch(&mut self, socket: TcpStream, peer: SocketAddr) {
        let order = self.order;
        info!(%peer, order, "Got connection");

        let config = Arc::clone(&self.config);
        let handler = async move {
            let mut conn = Connection::new(socket, peer, order, config);
            match conn.run().await {
                Ok(()) => debug!(%peer, order, "Connection closed"),
                Err(e) => warn!(%peer, order, kind = e.kind(), error = %e, "Handler failed"),
            }
        };

        if let Err(e) = self.reaper.spawn(order, handler) {
            error!(%peer, order, error = %e, "Dropping connection");
        }

        self.order += 1;
    }
}
