use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use logrelay_channel::{RegistryConfig, DEFAULT_GRACE, DEFAULT_SWEEP_INTERVAL};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default writer copy chunk. Kept small so the buffer lock is never held long.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Default pause between drains when a reader finds nothing queued.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Relay server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub listen: SocketAddr,

    /// Window during which a writer may reconnect to a channel whose reader is still attached.
    pub grace: Duration,

    /// Period of the background eviction sweep.
    pub sweep_interval: Duration,

    /// Maximum bytes appended to a buffer per lock acquisition on the write path.
    pub chunk_size: usize,

    /// Idle pause between drains on the read path.
    pub poll_interval: Duration,

    /// File served by `/dl/client`. Defaults to the running executable.
    pub binary_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            grace: DEFAULT_GRACE,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            binary_path: None,
        }
    }
}

impl ServerConfig {
    /// Config with the given listen address and defaults elsewhere.
    pub fn with_listen(listen: SocketAddr) -> Self {
        Self {
            listen,
            ..Self::default()
        }
    }

    /// Registry settings derived from this config.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig { grace: self.grace }
    }

    /// Chunk size clamped to at least one byte.
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
