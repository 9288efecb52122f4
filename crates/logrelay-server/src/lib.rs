//! HTTP surface of the logrelay server.
//!
//! # Endpoints
//!
//! - `POST /log/{channel}` - append the request body to a channel. The raw
//!   query string, if any, is written as a `====tag====` line before and
//!   after the session's bytes.
//! - `GET /log/{channel}` - stream a channel to the client as data arrives.
//!   404 if the channel does not exist, 409 if a reader is already attached.
//! - `GET /dl/client` - download the relay binary itself.
//!
//! # Example
//!
//! ```ignore
//! use logrelay_server::{RelayServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let server = RelayServer::new(ServerConfig::default());
//! server.run(CancellationToken::new()).await?;
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod read;
pub mod server;
pub mod session;
pub mod write;

pub use config::ServerConfig;
pub use error::{RelayError, ServerError, READER_CONFLICT_MESSAGE};
pub use server::{build_router, RelayServer, RelayState};
pub use session::{tag_line, ReaderSession, WriterSession};
