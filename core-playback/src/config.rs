//! # Streaming Configuration
//!
//! Configuration, state and statistics types for streaming channels.

use serde::{Deserialize, Serialize};

/// Ring geometry of a single streaming channel.
///
/// `buffer_count` backend buffers of `buffer_size` bytes each are allocated
/// once when the channel is created. The product bounds how much decoded
/// audio is queued ahead of the playback position, so `update()` must be
/// driven faster than that much audio takes to play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Number of backend buffers in the ring.
    ///
    /// Default: 4.
    #[serde(default = "default_buffer_count")]
    pub buffer_count: usize,

    /// Size of each backend buffer (and of the scratch decode area) in bytes.
    ///
    /// Must hold whole stereo 16-bit frames, i.e. be a multiple of 4.
    ///
    /// Default: 16 KiB (~93ms of 44.1kHz stereo).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            buffer_count: default_buffer_count(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl ChannelConfig {
    /// Create a configuration with explicit ring geometry.
    pub fn new(buffer_count: usize, buffer_size: usize) -> Self {
        Self {
            buffer_count,
            buffer_size,
        }
    }

    /// Small ring for short effects: 3 x 4 KiB.
    pub fn low_latency() -> Self {
        Self::new(3, 4 * 1024)
    }

    /// Deep ring for long music tracks: 8 x 32 KiB.
    pub fn high_capacity() -> Self {
        Self::new(8, 32 * 1024)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_count == 0 {
            return Err("buffer_count must be > 0".to_string());
        }

        if self.buffer_size == 0 {
            return Err("buffer_size must be > 0".to_string());
        }

        if self.buffer_size % 4 != 0 {
            return Err(format!(
                "buffer_size must be a multiple of 4 bytes, got {}",
                self.buffer_size
            ));
        }

        Ok(())
    }

    /// Total bytes the ring can hold ahead of the playback position.
    pub fn buffered_bytes(&self) -> usize {
        self.buffer_count * self.buffer_size
    }
}

/// Configuration of a per-device [`ChannelPool`](crate::pool::ChannelPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of channels (simultaneous clips).
    ///
    /// Default: 8.
    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Geometry shared by every channel.
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            channel: ChannelConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.channels == 0 {
            return Err("channels must be > 0".to_string());
        }
        self.channel.validate()
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_buffer_count() -> usize {
    4
}

fn default_buffer_size() -> usize {
    16 * 1024
}

fn default_channels() -> usize {
    8
}

// ============================================================================
// Channel State
// ============================================================================

/// Observable state of a streaming channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    /// No clip assigned; the channel is free.
    Idle,
    /// Clip assigned and still producing data.
    Streaming,
    /// Clip exhausted; queued buffers are playing out.
    Draining,
}

impl ChannelState {
    /// Returns `true` if a clip is assigned.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Streaming | Self::Draining)
    }
}

/// Counters accumulated over a channel's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// Clips accepted by `play()`.
    pub clips_started: u64,
    /// Clips that drained to completion.
    pub clips_finished: u64,
    /// Clips aborted by a read or backend error.
    pub clips_failed: u64,
    /// Buffers filled while priming.
    pub buffers_primed: u64,
    /// Buffers refilled and re-queued by `update()`.
    pub buffers_refilled: u64,
    /// Total PCM bytes uploaded to the backend.
    pub bytes_uploaded: u64,
    /// `update()` ticks that observed every buffer processed.
    pub underrun_ticks: u64,
    /// Times a silently stopped voice was restarted.
    pub voice_restarts: u64,
}
