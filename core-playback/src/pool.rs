//! # Channel Pool
//!
//! A fixed set of streaming channels for one backend device, serialized by a
//! single coarse lock.
//!
//! Channels are not thread-safe on their own. The pool owns them behind one
//! `parking_lot::Mutex` so a game loop, UI thread and audio tick can all call
//! into it safely.

use crate::clip::ClipHandle;
use crate::config::{ChannelStats, PoolConfig};
use crate::channel::StreamingChannel;
use crate::error::{PlaybackError, Result};
use bridge_traits::AudioBackend;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Index of a channel within its pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub usize);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// Outcome of updating every channel in the pool once.
#[derive(Debug, Default)]
pub struct PoolTick {
    /// Channels that had a clip when the tick started.
    pub active: usize,
    /// Channels whose clip drained to completion.
    pub finished: Vec<ChannelId>,
    /// Channels whose clip was aborted, with the reason.
    pub failed: Vec<(ChannelId, PlaybackError)>,
    /// Channels that reported an underrun.
    pub underruns: usize,
}

/// Per-device channel manager.
pub struct ChannelPool {
    channels: Mutex<Vec<StreamingChannel>>,
    config: PoolConfig,
}

impl ChannelPool {
    /// Create `config.channels` channels on `backend`.
    ///
    /// Channels created before a failure are released again.
    pub fn new(backend: Arc<dyn AudioBackend>, config: PoolConfig) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let channels = (0..config.channels)
            .map(|_| StreamingChannel::new(Arc::clone(&backend), config.channel.clone()))
            .collect::<Result<Vec<_>>>()?;

        info!(
            channels = config.channels,
            buffer_count = config.channel.buffer_count,
            buffer_size = config.channel.buffer_size,
            "Channel pool ready"
        );

        Ok(Self {
            channels: Mutex::new(channels),
            config,
        })
    }

    /// Play `clip` on the first free channel.
    ///
    /// Returns `Ok(None)` when every channel is busy.
    pub fn play(&self, clip: ClipHandle) -> Result<Option<ChannelId>> {
        let mut channels = self.channels.lock();
        let Some(index) = channels.iter().position(|c| c.is_free()) else {
            debug!("No free channel for clip");
            return Ok(None);
        };

        channels[index].play(clip)?;
        Ok(Some(ChannelId(index)))
    }

    /// Update every channel once.
    ///
    /// A failing channel does not stop the others from being updated.
    pub fn update(&self) -> PoolTick {
        let mut tick = PoolTick::default();
        let mut channels = self.channels.lock();

        for (index, channel) in channels.iter_mut().enumerate() {
            if channel.is_free() {
                continue;
            }
            tick.active += 1;
            let id = ChannelId(index);

            match channel.update() {
                Ok(report) => {
                    if report.underrun {
                        tick.underruns += 1;
                    }
                    if report.finished {
                        tick.finished.push(id);
                    }
                }
                Err(e) => {
                    warn!(channel = %id, "Channel failed: {}", e);
                    tick.failed.push((id, e));
                }
            }
        }

        tick
    }

    /// Stop one channel.
    pub fn stop(&self, id: ChannelId) -> Result<()> {
        let mut channels = self.channels.lock();
        channels
            .get_mut(id.0)
            .ok_or(PlaybackError::UnknownChannel(id.0))?
            .stop();
        Ok(())
    }

    /// Stop every active channel.
    pub fn stop_all(&self) {
        let mut channels = self.channels.lock();
        for channel in channels.iter_mut().filter(|c| !c.is_free()) {
            channel.stop();
        }
    }

    pub fn set_volume(&self, id: ChannelId, gain: f32) -> Result<()> {
        let channels = self.channels.lock();
        channels
            .get(id.0)
            .ok_or(PlaybackError::UnknownChannel(id.0))?
            .set_volume(gain)
    }

    pub fn is_free(&self, id: ChannelId) -> Result<bool> {
        let channels = self.channels.lock();
        channels
            .get(id.0)
            .map(StreamingChannel::is_free)
            .ok_or(PlaybackError::UnknownChannel(id.0))
    }

    /// Number of channels with a clip assigned.
    pub fn active_count(&self) -> usize {
        self.channels.lock().iter().filter(|c| !c.is_free()).count()
    }

    /// Total number of channels.
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self, id: ChannelId) -> Result<ChannelStats> {
        let channels = self.channels.lock();
        channels
            .get(id.0)
            .map(|c| c.stats().clone())
            .ok_or(PlaybackError::UnknownChannel(id.0))
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}
