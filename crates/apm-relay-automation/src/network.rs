//! Outbound connectivity probe.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use apm_relay_core::{Error, Result, WorkflowSettings};
use tracing::debug;

/// Address and timeout used to prove the machine is online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkProbe {
    /// Address to dial
    pub addr: SocketAddr,
    /// Connect timeout
    pub timeout: Duration,
}

impl NetworkProbe {
    /// Build the probe from workflow settings.
    pub fn from_settings(settings: &WorkflowSettings) -> Result<Self> {
        Ok(Self {
            addr: settings.network_probe_addr()?,
            timeout: settings.network_timeout(),
        })
    }

    /// Run the probe.
    pub fn check(&self) -> Result<()> {
        ensure_connection(self.addr, self.timeout)
    }
}

/// Open and immediately drop a TCP connection to `addr`.
pub fn ensure_connection(addr: SocketAddr, timeout: Duration) -> Result<()> {
    debug!("Probing network via {} (timeout {:?})", addr, timeout);
    TcpStream::connect_timeout(&addr, timeout)
        .map(drop)
        .map_err(|e| Error::NetworkUnavailable(format!("{addr}: {e}")))
}
