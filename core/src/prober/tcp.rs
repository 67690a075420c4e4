//! Unprivileged fallback: times a TCP handshake.
//!
//! Both a completed handshake and a refused connection (RST) prove the host
//! answered, so either counts as a round trip. The prober bounds the wait.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;

use super::Probe;

pub const DEFAULT_TCP_PORT: u16 = 443;

pub struct TcpProbe {
    port: u16,
}

impl TcpProbe {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TCP_PORT)
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<Duration>> {
        let socket_addr: SocketAddr = SocketAddr::new(addr, self.port);
        let started = Instant::now();

        match TcpStream::connect(socket_addr).await {
            Ok(_) => Ok(Some(started.elapsed())),
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => Ok(Some(started.elapsed())),
            Err(e) => Err(e.into()),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
