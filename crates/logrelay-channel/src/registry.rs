use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::buffer::{ChannelBuffer, DEFAULT_GRACE};
use crate::error::{ChannelError, Result};

/// Callback invoked with the name of every evicted channel.
pub type EvictionHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Registry behaviour config.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Grace window handed to every buffer the registry creates.
    pub grace: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }
}

/// Name → buffer membership.
///
/// The registry lock guards membership only. Buffer contents are guarded by
/// each buffer's own lock, which is only ever taken briefly while membership
/// is locked (to read or flip counters), never the other way round.
pub struct ChannelRegistry {
    channels: Mutex<HashMap<String, Arc<ChannelBuffer>>>,
    config: RegistryConfig,
    on_evict: Option<EvictionHook>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.len())
            .field("config", &self.config)
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            config,
            on_evict: None,
        }
    }

    /// Attach a callback that is told about every eviction.
    ///
    /// The hook runs after the registry lock has been released.
    pub fn with_eviction_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_evict = Some(Arc::new(hook));
        self
    }

    /// Return the buffer for `name`, creating and registering an empty one if needed.
    #[cfg(test)]
    pub(crate) fn checkout_for_write(&self, name: &str) -> Arc<ChannelBuffer> {
        let mut channels = self.lock();
        Self::checkout_or_insert(&mut channels, name, self.config.grace)
    }

    /// Check out `name` for writing and open a writer session on it.
    ///
    /// Both steps happen while membership is locked, so a concurrent eviction
    /// cannot remove the buffer between checkout and session start.
    pub fn open_writer(&self, name: &str) -> Arc<ChannelBuffer> {
        let mut channels = self.lock();
        let buffer = Self::checkout_or_insert(&mut channels, name, self.config.grace);
        buffer.writer_start();
        buffer
    }

    /// Return the existing buffer for `name`. Never creates one.
    pub fn checkout_for_read(&self, name: &str) -> Result<Arc<ChannelBuffer>> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ChannelError::NotFound(name.to_string()))
    }

    /// Remove `name` if it still maps to `buffer` and that buffer is reclaimable and empty.
    ///
    /// Returns true if the entry was removed.
    pub fn evict_if_drained(&self, name: &str, buffer: &Arc<ChannelBuffer>) -> bool {
        let evicted = {
            let mut channels = self.lock();
            match channels.get(name) {
                Some(current) if Arc::ptr_eq(current, buffer) && current.is_drained() => {
                    channels.remove(name);
                    true
                }
                _ => false,
            }
        };
        if evicted {
            debug!(channel = name, "channel evicted after drain");
            self.notify(name);
        }
        evicted
    }

    /// Evict every reclaimable channel, returning the evicted names.
    ///
    /// Queue contents are not considered: this is the safety net for channels
    /// whose reader left early or that were never read.
    pub fn sweep(&self) -> Vec<String> {
        let evicted: Vec<String> = {
            let mut channels = self.lock();
            let names: Vec<String> = channels
                .iter()
                .filter(|(_, buffer)| buffer.is_reclaimable())
                .map(|(name, _)| name.clone())
                .collect();
            for name in &names {
                channels.remove(name);
            }
            names
        };

        for name in &evicted {
            debug!(channel = %name, "channel evicted by sweep");
            self.notify(name);
        }
        evicted
    }

    /// Returns true if `name` currently maps to exactly `buffer`.
    pub fn holds(&self, name: &str, buffer: &Arc<ChannelBuffer>) -> bool {
        self.lock()
            .get(name)
            .is_some_and(|current| Arc::ptr_eq(current, buffer))
    }

    /// Returns true if a channel is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of all registered channels, sorted.
    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn checkout_or_insert(
        channels: &mut HashMap<String, Arc<ChannelBuffer>>,
        name: &str,
        grace: Duration,
    ) -> Arc<ChannelBuffer> {
        if let Some(buffer) = channels.get(name) {
            return Arc::clone(buffer);
        }
        debug!(channel = name, "creating channel");
        let buffer = Arc::new(ChannelBuffer::with_grace(grace));
        channels.insert(name.to_string(), Arc::clone(&buffer));
        buffer
    }

    fn notify(&self, name: &str) {
        if let Some(hook) = &self.on_evict {
            hook(name);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<ChannelBuffer>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
