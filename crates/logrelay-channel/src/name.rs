//! Channel name rules.
//!
//! Names travel as a single URL path segment, so they are restricted to ASCII
//! word characters.

use crate::error::{ChannelError, Result};

/// Returns true if `name` is non-empty and only contains `[A-Za-z0-9_]`.
pub fn is_valid_channel_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validate a channel name, returning it unchanged on success.
pub fn validate_channel_name(name: &str) -> Result<&str> {
    if is_valid_channel_name(name) {
        Ok(name)
    } else {
        Err(ChannelError::InvalidName(name.to_string()))
    }
}
