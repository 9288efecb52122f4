//! In-memory channel buffers for the logrelay server.
//!
//! A channel is a named FIFO byte queue with one producer side and at most
//! one consumer side. This crate owns the data model and its lifecycle:
//! - [`ChannelBuffer`] - the queue plus writer/reader occupancy and the
//!   finalize/expiry state that decides when a channel may be reclaimed
//! - [`ChannelRegistry`] - name → buffer membership behind one lock
//! - [`SweepTask`] - the periodic pass that evicts reclaimable channels
//!
//! Nothing here performs network I/O; locks are held only for the duration
//! of a single queue or counter operation.

pub mod buffer;
pub mod error;
pub mod name;
pub mod registry;
pub mod sweep;

pub use buffer::{BufferStats, ChannelBuffer, DEFAULT_GRACE};
pub use error::{ChannelError, Result};
pub use name::{is_valid_channel_name, validate_channel_name};
pub use registry::{ChannelRegistry, EvictionHook, RegistryConfig};
pub use sweep::{SweepTask, DEFAULT_SWEEP_INTERVAL};
