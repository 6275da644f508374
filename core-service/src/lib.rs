//! Core service façade and bootstrap helpers.
//!
//! This crate wires a host-provided [`AudioBackend`] into a pool of streaming
//! channels. Desktop hosts typically enable the `desktop-shims` feature
//! (which depends on `bridge-desktop`) and get an in-process software mixer
//! when they do not inject a backend of their own.
//!
//! ```ignore
//! use core_service::{AudioService, ServiceConfig};
//!
//! let service = AudioService::start(ServiceConfig::builder().build()?)?;
//! let id = service.play_file("assets/theme.ogg")?;
//!
//! // From the host's audio tick:
//! let tick = service.update();
//! ```
//!
//! [`AudioBackend`]: bridge_traits::AudioBackend

pub mod config;
pub mod error;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{CoreError, Result};

use bridge_traits::AudioBackend;
use core_playback::{
    clip_handle, ChannelId, ChannelPool, ChannelStats, ClipHandle, PcmClip, PoolConfig, PoolTick,
};
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
///
/// Cloning is cheap; clones share the same channel pool.
#[derive(Clone)]
pub struct AudioService {
    pool: Arc<ChannelPool>,
    backend: Arc<dyn AudioBackend>,
}

impl AudioService {
    /// Initialize logging if requested and allocate the channel pool.
    pub fn start(config: ServiceConfig) -> Result<Self> {
        if let Some(logging) = config.logging.clone() {
            core_runtime::init_logging(logging)?;
        }

        let pool = ChannelPool::new(Arc::clone(&config.backend), config.pool.clone())?;
        info!(
            channels = config.pool.channels,
            buffer_count = config.pool.channel.buffer_count,
            buffer_size = config.pool.channel.buffer_size,
            "Audio service started"
        );

        Ok(Self {
            pool: Arc::new(pool),
            backend: config.backend,
        })
    }

    /// Play a clip on the first free channel.
    ///
    /// Returns `NoFreeChannel` when every channel is busy.
    pub fn play(&self, clip: ClipHandle) -> Result<ChannelId> {
        self.pool.play(clip)?.ok_or(CoreError::NoFreeChannel {
            channels: self.pool.len(),
        })
    }

    /// Play interleaved 16-bit little-endian PCM held in memory.
    pub fn play_pcm(
        &self,
        data: impl Into<bytes::Bytes>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<ChannelId> {
        let clip = PcmClip::new(data, Some(channels), Some(sample_rate));
        self.play(clip_handle(clip))
    }

    /// Open a container file through symphonia and play it.
    #[cfg(feature = "decoder")]
    pub fn play_file(&self, path: impl AsRef<std::path::Path>) -> Result<ChannelId> {
        let clip = core_playback::SymphoniaClip::open(path)?;
        tracing::debug!(codec = ?clip.codec(), "Opened clip");
        self.play(clip_handle(clip))
    }

    /// Advance every channel by one tick.
    pub fn update(&self) -> PoolTick {
        self.pool.update()
    }

    pub fn stop(&self, id: ChannelId) -> Result<()> {
        Ok(self.pool.stop(id)?)
    }

    pub fn stop_all(&self) {
        self.pool.stop_all();
    }

    pub fn set_volume(&self, id: ChannelId, gain: f32) -> Result<()> {
        Ok(self.pool.set_volume(id, gain)?)
    }

    pub fn is_playing(&self, id: ChannelId) -> Result<bool> {
        Ok(!self.pool.is_free(id)?)
    }

    pub fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    pub fn stats(&self, id: ChannelId) -> Result<ChannelStats> {
        Ok(self.pool.stats(id)?)
    }

    pub fn pool_config(&self) -> &PoolConfig {
        self.pool.config()
    }

    /// The backend channels stream into.
    pub fn backend(&self) -> Arc<dyn AudioBackend> {
        Arc::clone(&self.backend)
    }
}
