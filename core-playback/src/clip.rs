//! # Clip Decoder Capability
//!
//! The pull-based decoder interface every streamed clip implements, plus the
//! in-memory [`PcmClip`].
//!
//! ## Overview
//!
//! A [`StreamingChannel`](crate::channel::StreamingChannel) never inspects the
//! concrete clip type. It only rewinds the clip, asks for its declared layout,
//! and pulls bytes of interleaved signed 16-bit little-endian PCM into its
//! scratch buffer until the clip reports end of stream.
//!
//! ## Example
//!
//! ```rust
//! use core_playback::{clip_handle, ClipDecoder, PcmClip};
//!
//! let samples: Vec<u8> = [0i16, 1000, -1000, 0]
//!     .iter()
//!     .flat_map(|s| s.to_le_bytes())
//!     .collect();
//!
//! let clip = clip_handle(PcmClip::new(samples, Some(1), Some(22_050)));
//! let mut scratch = [0u8; 4];
//! let read = clip.lock().read(&mut scratch).unwrap();
//! assert_eq!(read, 4);
//! ```

use crate::error::Result;
use crate::format::TrackInfo;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::Arc;

/// Pull-based source of 16-bit PCM for a streaming channel.
///
/// Implementations produce interleaved signed 16-bit little-endian samples in
/// the layout reported by [`channel_count`](Self::channel_count).
pub trait ClipDecoder: Send {
    /// Rewind to the start of the stream.
    ///
    /// Decoders that cannot rewind treat this as a no-op.
    fn reset(&mut self);

    /// Fill `dest` with up to `dest.len()` bytes of PCM.
    ///
    /// Returns the number of bytes written. `Ok(0)` means end of stream.
    ///
    /// # Errors
    ///
    /// Any error is unrecoverable for the current playback of this clip.
    fn read(&mut self, dest: &mut [u8]) -> Result<usize>;

    /// Declared channel count.
    fn channel_count(&self) -> u16;

    /// Declared sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Whether a stopped channel should rewind this clip.
    ///
    /// Uncompressed containers return `true` so a stopped clip plays from the
    /// start next time.
    fn rewinds_on_stop(&self) -> bool {
        false
    }
}

/// Shared handle to a clip decoder.
///
/// The owner of a clip keeps one handle while the channel streaming it holds
/// another.
pub type ClipHandle = Arc<Mutex<dyn ClipDecoder>>;

/// Wrap a decoder in a [`ClipHandle`].
pub fn clip_handle<D: ClipDecoder + 'static>(decoder: D) -> ClipHandle {
    Arc::new(Mutex::new(decoder))
}

/// Raw 16-bit PCM held in memory.
///
/// Used for headerless sound effects and synthesized audio. Containers
/// without track metadata leave `channels`/`sample_rate` undeclared and get
/// the mono / 44.1kHz fallback.
#[derive(Debug, Clone)]
pub struct PcmClip {
    data: Bytes,
    position: usize,
    info: TrackInfo,
}

impl PcmClip {
    /// Create a clip from raw interleaved 16-bit little-endian samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn new(data: impl Into<Bytes>, channels: Option<u16>, sample_rate: Option<u32>) -> Self {
        let info = TrackInfo::from_declared(channels, sample_rate);
        let mut data: Bytes = data.into();
        let frame = 2 * info.channels.max(1) as usize;
        data.truncate(data.len() - data.len() % frame);

        Self {
            data,
            position: 0,
            info,
        }
    }

    /// Build a clip from samples.
    pub fn from_samples(samples: &[i16], channels: u16, sample_rate: u32) -> Self {
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(data, Some(channels), Some(sample_rate))
    }

    /// Total PCM bytes in the clip.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl ClipDecoder for PcmClip {
    fn reset(&mut self) {
        self.position = 0;
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        let count = dest.len().min(self.remaining());
        dest[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }

    fn channel_count(&self) -> u16 {
        self.info.channels
    }

    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    fn rewinds_on_stop(&self) -> bool {
        true
    }
}
