//! Relay live log streams from devices to a single remote reader over HTTP.
//!
//! A device pipes its output into `POST /log/{channel}`; an operator follows it
//! with `GET /log/{channel}`. Bytes queue in an in-memory channel buffer while
//! no reader is attached, and a reader that stays attached sees a restarted
//! writer continue the same stream within a short grace window.
//!
//! # Crate Structure
//!
//! - [`channel`] - Channel buffers, the registry, and the eviction sweep
//! - [`server`] - The HTTP endpoints (behind `server` feature)
//! - [`client`] - Retrying write/read drivers (behind `client` feature)

/// Re-export channel types.
pub mod channel {
    pub use logrelay_channel::*;
}

/// Re-export server types (requires `server` feature).
#[cfg(feature = "server")]
pub mod server {
    pub use logrelay_server::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use logrelay_client::*;
}
