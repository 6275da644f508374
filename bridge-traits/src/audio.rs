//! Audio backend bridge trait and supporting handle types.
//!
//! The backend is the native playback device: it owns voices (playback
//! objects that consume queued buffers in FIFO order) and buffers (slots
//! holding one chunk of uploaded PCM). The core never talks to a platform
//! audio API directly; it drives an [`AudioBackend`] instead.
//!
//! The surface mirrors buffer-queue audio APIs: creation calls report
//! failures through [`Result`], every other primitive is fire-and-forget and
//! reports problems through a sticky error state read with
//! [`AudioBackend::last_error`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to a backend buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Opaque handle to a backend playback voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u32);

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// PCM layouts a backend buffer can hold.
///
/// Only signed 16-bit little-endian interleaved data is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PcmFormat {
    /// One channel, 16 bits per sample.
    Mono16,
    /// Two interleaved channels, 16 bits per sample.
    Stereo16,
}

impl PcmFormat {
    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        match self {
            PcmFormat::Mono16 => 1,
            PcmFormat::Stereo16 => 2,
        }
    }

    /// Size of one frame (one sample per channel) in bytes.
    pub fn bytes_per_frame(&self) -> usize {
        self.channels() as usize * 2
    }
}

/// Playback state of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceState {
    /// Created, never played.
    Initial,
    /// Consuming queued buffers.
    Playing,
    /// Paused mid-buffer.
    Paused,
    /// Stopped explicitly or ran out of queued data.
    Stopped,
}

/// Backend error state.
///
/// The backend keeps the first error raised since the last query; reading it
/// through [`AudioBackend::last_error`] resets it to [`BackendErrorCode::NoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendErrorCode {
    NoError,
    /// A handle did not name a live voice or buffer.
    InvalidName,
    /// An enumerated argument was out of range.
    InvalidEnum,
    /// A numeric argument was out of range.
    InvalidValue,
    /// The call is not allowed in the current state.
    InvalidOperation,
    OutOfMemory,
}

impl BackendErrorCode {
    /// Returns `true` for anything other than [`BackendErrorCode::NoError`].
    pub fn is_error(&self) -> bool {
        !matches!(self, BackendErrorCode::NoError)
    }
}

impl fmt::Display for BackendErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendErrorCode::NoError => "no error",
            BackendErrorCode::InvalidName => "invalid name",
            BackendErrorCode::InvalidEnum => "invalid enum",
            BackendErrorCode::InvalidValue => "invalid value",
            BackendErrorCode::InvalidOperation => "invalid operation",
            BackendErrorCode::OutOfMemory => "out of memory",
        };
        f.write_str(name)
    }
}

/// Native playback device capability.
///
/// Implementations must be `Send + Sync`: a per-device manager may share one
/// backend between several channels and an audio thread may render from it
/// while channels are being updated.
///
/// ## Example
///
/// ```ignore
/// use bridge_traits::audio::{AudioBackend, PcmFormat};
///
/// fn prime(backend: &dyn AudioBackend) -> bridge_traits::error::Result<()> {
///     let voice = backend.create_voice()?;
///     let buffers = backend.create_buffers(2)?;
///     backend.upload_buffer_data(buffers[0], PcmFormat::Mono16, &[0, 0, 0, 0], 44_100);
///     backend.queue_buffers(voice, &buffers[..1]);
///     backend.play(voice);
///     Ok(())
/// }
/// ```
pub trait AudioBackend: Send + Sync {
    /// Create a playback voice.
    fn create_voice(&self) -> Result<VoiceId>;

    /// Release a voice. Buffers still queued on it are detached.
    fn delete_voice(&self, voice: VoiceId);

    /// Create `count` empty buffer slots.
    fn create_buffers(&self, count: usize) -> Result<Vec<BufferId>>;

    /// Release buffer slots. Buffers still queued on a voice are left alone
    /// and flag [`BackendErrorCode::InvalidOperation`].
    fn delete_buffers(&self, buffers: &[BufferId]);

    /// Replace the contents of a buffer that is not currently queued.
    fn upload_buffer_data(&self, buffer: BufferId, format: PcmFormat, data: &[u8], sample_rate: u32);

    /// Append buffers to the tail of a voice queue, in order.
    fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]);

    /// Remove up to `count` processed buffers from the head of a voice queue.
    ///
    /// Asking for more buffers than have been processed flags
    /// [`BackendErrorCode::InvalidValue`] and removes nothing.
    fn unqueue_buffers(&self, voice: VoiceId, count: usize) -> Vec<BufferId>;

    /// Number of buffers queued on the voice, processed or not.
    fn queued_count(&self, voice: VoiceId) -> usize;

    /// Number of queued buffers the voice has finished playing.
    fn processed_count(&self, voice: VoiceId) -> usize;

    /// Start (or restart) playback of the voice queue.
    fn play(&self, voice: VoiceId);

    /// Stop playback; every queued buffer counts as processed afterwards.
    fn stop(&self, voice: VoiceId);

    /// Current playback state of the voice.
    fn voice_state(&self, voice: VoiceId) -> VoiceState;

    /// Read and clear the sticky error state.
    fn last_error(&self) -> BackendErrorCode;

    /// Set the linear gain applied to the voice.
    fn set_gain(&self, voice: VoiceId, gain: f32);
}
