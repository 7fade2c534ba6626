//! Hostname resolution and TCP reachability checks.
//!
//! The [`NetworkProbe`] trait is the seam between structural validation and
//! the network; [`SystemProbe`] is the real implementation, tests supply
//! their own.

use crate::{DataVizError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, lookup_host};
use tracing::debug;

/// Default time allowed for each TCP connect attempt.
pub const PORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Network checks used while validating connection parameters.
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    /// Returns whether `host` resolves to at least one address.
    ///
    /// # Errors
    /// Resolution misses return `Ok(false)`; any other I/O failure is
    /// returned as [`DataVizError::Network`].
    async fn hostname_resolves(&self, host: &str) -> Result<bool>;

    /// Returns whether any resolved address of `host` accepts a TCP
    /// connection on `port` within `timeout`.
    async fn port_open(&self, host: &str, port: u16, timeout: Duration) -> bool;
}

/// Probe backed by the system resolver and real sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

#[async_trait]
impl NetworkProbe for SystemProbe {
    async fn hostname_resolves(&self, host: &str) -> Result<bool> {
        match lookup_host((host, 0)).await {
            Ok(mut addrs) => Ok(addrs.next().is_some()),
            // getaddrinfo failures carry no OS error code; EAI_SYSTEM does
            Err(e) if e.raw_os_error().is_none() => {
                debug!("Hostname '{}' did not resolve: {}", host, e);
                Ok(false)
            }
            Err(e) => Err(DataVizError::network(
                format!("Failed to resolve hostname '{}'", host),
                e,
            )),
        }
    }

    async fn port_open(&self, host: &str, port: u16, timeout: Duration) -> bool {
        let addrs = match lookup_host((host, port)).await {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("Cannot probe {}:{}: {}", host, port, e);
                return false;
            }
        };

        for addr in addrs {
            match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
                Ok(Ok(mut stream)) => {
                    let _ = stream.shutdown().await;
                    return true;
                }
                Ok(Err(e)) => debug!("Connect to {} failed: {}", addr, e),
                Err(_) => debug!("Connect to {} timed out after {:?}", addr, timeout),
            }
        }

        false
    }
}
