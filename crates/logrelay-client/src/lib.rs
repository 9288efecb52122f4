//! Client drivers for a logrelay server.
//!
//! [`write_with_retry`] streams a local source into `POST /log/{channel}` and
//! [`read_with_retry`] copies `GET /log/{channel}` into a local sink. Both
//! retry transient transport and gateway failures under a [`RetryPolicy`].
//!
//! # Example
//!
//! ```ignore
//! use logrelay_client::{read_with_retry, write_with_retry, ReadOnlySource, RetryPolicy};
//!
//! let client = reqwest::Client::new();
//! let policy = RetryPolicy::default();
//!
//! let source = ReadOnlySource::new(tokio::io::stdin());
//! write_with_retry(&client, "http://relay:8080/log/printer", &source, &policy).await?;
//!
//! let mut stdout = tokio::io::stdout();
//! let outcome = read_with_retry(&client, "http://relay:8080/log/printer", &mut stdout, &policy).await?;
//! ```

pub mod error;
pub mod reader;
pub mod retry;
pub mod source;
pub mod writer;

pub use error::{ClientError, Result};
pub use reader::{read_with_retry, ReadOutcome};
pub use retry::{is_retryable_error, is_retryable_status, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use source::ReadOnlySource;
pub use writer::write_with_retry;
