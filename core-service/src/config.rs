//! # Service Configuration
//!
//! Builder for the settings and bridge handles an [`AudioService`] needs.
//!
//! ## Required Dependencies
//!
//! - `AudioBackend` - voice and buffer primitives the channels stream into
//!
//! When the `desktop-shims` feature is enabled, the in-process
//! `SoftwareBackend` from `bridge-desktop` is injected if no backend is
//! provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_playback::ChannelConfig;
//! use core_service::config::ServiceConfig;
//!
//! let config = ServiceConfig::builder()
//!     .channels(16)
//!     .channel_config(ChannelConfig::low_latency())
//!     .build()?;
//! ```
//!
//! [`AudioService`]: crate::AudioService

use crate::error::{CoreError, Result};
use bridge_traits::AudioBackend;
use core_playback::{ChannelConfig, PoolConfig};
use core_runtime::LoggingConfig;
use std::sync::Arc;

/// Settings and bridges for an [`AudioService`](crate::AudioService).
#[derive(Clone)]
pub struct ServiceConfig {
    /// Backend every channel allocates its voice and buffers from
    pub backend: Arc<dyn AudioBackend>,

    /// Channel count and per-channel ring geometry
    pub pool: PoolConfig,

    /// Installed as the global subscriber on startup when present
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("backend", &"AudioBackend { ... }")
            .field("pool", &self.pool)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Checks the pool geometry.
    pub fn validate(&self) -> Result<()> {
        self.pool
            .validate()
            .map_err(|msg| CoreError::from(core_playback::PlaybackError::InvalidConfig(msg)))
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_backend() -> Result<Arc<dyn AudioBackend>> {
    use bridge_desktop::SoftwareBackend;

    let backend: Arc<dyn AudioBackend> = Arc::new(SoftwareBackend::new());
    Ok(backend)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_backend() -> Result<Arc<dyn AudioBackend>> {
    Err(CoreError::CapabilityMissing {
        capability: "AudioBackend".to_string(),
        message: "An AudioBackend implementation is required to allocate voices and buffers. \
                 Desktop: enable the 'desktop-shims' feature to use the default SoftwareBackend. \
                 Other hosts: inject a backend over the platform audio API."
            .to_string(),
    })
}

/// Builder for [`ServiceConfig`].
#[derive(Default)]
pub struct ServiceConfigBuilder {
    backend: Option<Arc<dyn AudioBackend>>,
    channels: Option<usize>,
    channel: Option<ChannelConfig>,
    logging: Option<LoggingConfig>,
}

impl ServiceConfigBuilder {
    /// Sets the audio backend.
    pub fn backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets how many channels the pool allocates up front.
    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Sets the ring geometry used by every channel.
    pub fn channel_config(mut self, channel: ChannelConfig) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Shorthand for [`channel_config`](Self::channel_config) from raw values.
    pub fn buffers(self, buffer_count: usize, buffer_size: usize) -> Self {
        self.channel_config(ChannelConfig::new(buffer_count, buffer_size))
    }

    /// Requests logging initialization when the service starts.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` if no backend was given and no default exists
    /// - `Playback(InvalidConfig)` if the pool geometry is invalid
    pub fn build(self) -> Result<ServiceConfig> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => provide_default_backend()?,
        };

        let defaults = PoolConfig::default();
        let config = ServiceConfig {
            backend,
            pool: PoolConfig {
                channels: self.channels.unwrap_or(defaults.channels),
                channel: self.channel.unwrap_or(defaults.channel),
            },
            logging: self.logging,
        };

        config.validate()?;
        Ok(config)
    }
}
