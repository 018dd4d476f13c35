use std::io;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, lookup_host};
use tracing::{info, warn};

use crate::config::Config;

/// Resolves `listen_addr` and binds the first address that accepts us,
/// listening with the configured backlog.
pub async fn bind(cfg: &Config) -> Result<TcpListener> {
    let addrs: Vec<SocketAddr> = lookup_host(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to resolve {}", cfg.listen_addr))?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        match bind_addr(addr, cfg.backlog) {
            Ok(listener) => {
                info!("Listening on {}", listener.local_addr()?);
                return Ok(listener);
            }
            Err(e) => {
                warn!(%addr, error = %e, "Failed to bind");
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) => Err(e).with_context(|| format!("Failed to bind {}", cfg.listen_addr)),
        None => anyhow::bail!("{} resolved to no addresses", cfg.listen_addr),
    }
}

fn bind_addr(addr: SocketAddr, backlog: u32) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    // Serve IPv4 clients on an IPv6 wildcard whatever the platform default is
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
