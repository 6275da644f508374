//! # Streaming Channel
//!
//! Feeds one backend voice from a pull-based clip decoder through a fixed ring
//! of backend buffers.
//!
//! ## Lifecycle
//!
//! ```text
//!            play()                 read() == 0
//!   Idle ───────────────▶ Streaming ───────────▶ Draining
//!    ▲                        │                      │
//!    │   read/backend error   │   all buffers played │
//!    └────────────────────────┴──────────────────────┘
//! ```
//!
//! `play()` primes up to `buffer_count` buffers and starts the voice. The
//! host then calls `update()` on a steady cadence. Each tick retires the
//! buffers the backend finished with, refills them from the clip one at a
//! time and re-queues them. Once the clip is exhausted no further reads
//! happen; the channel waits for the queued audio to play out and goes idle.
//!
//! A single scratch buffer is shared by every read, so decoding and uploading
//! never overlap.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_desktop::SoftwareBackend;
//! use core_playback::{clip_handle, ChannelConfig, PcmClip, StreamingChannel};
//! use std::sync::Arc;
//!
//! # fn main() -> core_playback::Result<()> {
//! let backend = Arc::new(SoftwareBackend::new());
//! let mut channel = StreamingChannel::new(backend.clone(), ChannelConfig::new(2, 1024))?;
//!
//! let clip = clip_handle(PcmClip::from_samples(&[0i16; 4096], 1, 22_050));
//! channel.play(clip)?;
//!
//! while !channel.is_free() {
//!     backend.skip_frames(512);
//!     channel.update()?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::clip::ClipHandle;
use crate::config::{ChannelConfig, ChannelState, ChannelStats};
use crate::error::{PlaybackError, Result};
use crate::format::resolve_format;
use bridge_traits::{AudioBackend, BufferId, PcmFormat, VoiceId, VoiceState};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, trace, warn};

/// What a single [`StreamingChannel::update`] tick observed and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Buffers queued on the voice at the start of the tick.
    pub queued: usize,
    /// Buffers the backend had finished at the start of the tick.
    pub processed: usize,
    /// Buffers refilled and re-queued during the tick.
    pub refilled: usize,
    /// Every buffer in the ring was starved when the tick started.
    pub underrun: bool,
    /// The voice had stopped with audio still queued and was restarted.
    pub restarted: bool,
    /// The clip finished draining and the channel went idle.
    pub finished: bool,
}

/// Voice and buffer handles owned for the lifetime of a channel.
///
/// Released on drop, including when construction fails halfway.
struct VoiceLease {
    backend: Arc<dyn AudioBackend>,
    voice: VoiceId,
    buffers: Vec<BufferId>,
}

impl VoiceLease {
    fn acquire(backend: Arc<dyn AudioBackend>, buffer_count: usize) -> Result<Self> {
        let voice = backend.create_voice()?;
        let mut lease = Self {
            backend,
            voice,
            buffers: Vec::new(),
        };
        lease.buffers = lease.backend.create_buffers(buffer_count)?;
        debug!(voice = %voice, buffers = buffer_count, "Acquired voice lease");
        Ok(lease)
    }
}

impl Drop for VoiceLease {
    fn drop(&mut self) {
        self.backend.stop(self.voice);
        self.backend.delete_voice(self.voice);
        if !self.buffers.is_empty() {
            self.backend.delete_buffers(&self.buffers);
        }
        debug!(voice = %self.voice, "Released voice lease");
    }
}

/// Streams one clip at a time into a backend voice.
///
/// Not synchronized: the owner serializes `play`, `update` and `stop`.
/// [`ChannelPool`](crate::pool::ChannelPool) does that for a set of channels.
pub struct StreamingChannel {
    lease: VoiceLease,
    config: ChannelConfig,
    scratch: Vec<u8>,
    clip: Option<ClipHandle>,
    format: PcmFormat,
    sample_rate: u32,
    eof: bool,
    stats: ChannelStats,
}

impl StreamingChannel {
    /// Allocate the voice, the buffer ring and the scratch buffer.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidConfig`] if `config` does not validate
    /// - [`PlaybackError::Bridge`] if the backend cannot create the handles
    pub fn new(backend: Arc<dyn AudioBackend>, config: ChannelConfig) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let lease = VoiceLease::acquire(backend, config.buffer_count)?;

        Ok(Self {
            lease,
            scratch: vec![0u8; config.buffer_size],
            config,
            clip: None,
            format: PcmFormat::Mono16,
            sample_rate: 0,
            eof: false,
            stats: ChannelStats::default(),
        })
    }

    /// Start streaming `clip`, replacing whatever was playing.
    ///
    /// The clip is rewound, its format resolved, and up to `buffer_count`
    /// buffers are filled and queued before the voice is started. A clip
    /// shorter than the ring enters draining immediately.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::FormatUnsupported`] for more than two channels,
    ///   raised before anything is buffered
    /// - [`PlaybackError::ReadError`] if the clip fails while priming
    ///
    /// The channel is free after either error.
    #[instrument(skip(self, clip), fields(voice = %self.lease.voice))]
    pub fn play(&mut self, clip: ClipHandle) -> Result<()> {
        let backend = Arc::clone(&self.lease.backend);
        let voice = self.lease.voice;

        if self.clip.take().is_some() {
            debug!("Replacing active clip");
            backend.stop(voice);
        }
        self.release_residue();

        let mut decoder = clip.lock();
        decoder.reset();

        let (format, sample_rate) =
            match resolve_format(decoder.channel_count(), decoder.sample_rate()) {
                Ok(resolved) => resolved,
                Err(e) => {
                    self.stats.clips_failed += 1;
                    warn!("Rejected clip: {}", e);
                    return Err(e);
                }
            };
        self.format = format;
        self.sample_rate = sample_rate;

        let mut primed = 0;
        let mut eof = false;
        for &buffer in &self.lease.buffers {
            let read = match decoder.read(&mut self.scratch) {
                Ok(read) => read,
                Err(e) => {
                    self.stats.clips_failed += 1;
                    error!("Clip read failed while priming: {}", e);
                    return Err(into_read_error(e));
                }
            };
            if read == 0 {
                eof = true;
                break;
            }
            backend.upload_buffer_data(buffer, format, &self.scratch[..read], sample_rate);
            self.stats.bytes_uploaded += read as u64;
            primed += 1;
        }
        drop(decoder);

        if primed > 0 {
            backend.queue_buffers(voice, &self.lease.buffers[..primed]);
        }
        backend.play(voice);

        self.stats.buffers_primed += primed as u64;
        self.stats.clips_started += 1;
        self.clip = Some(clip);
        self.eof = eof;

        info!(
            ?format,
            sample_rate,
            primed,
            draining = eof,
            "Clip started"
        );
        Ok(())
    }

    /// Advance the stream by one tick.
    ///
    /// Does nothing while the channel is free. Otherwise polls the backend,
    /// finishes the clip once everything queued after end of stream has
    /// played, or refills each processed buffer with one read.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::ReadError`] or [`PlaybackError::BackendError`] abort
    /// the clip: the voice is stopped, the channel is free, and no further
    /// buffers are touched in this tick.
    pub fn update(&mut self) -> Result<TickReport> {
        if self.clip.is_none() {
            return Ok(TickReport::default());
        }

        let backend = Arc::clone(&self.lease.backend);
        let voice = self.lease.voice;
        let queued = backend.queued_count(voice);
        let processed = backend.processed_count(voice);
        let mut report = TickReport {
            queued,
            processed,
            ..TickReport::default()
        };

        if self.eof {
            if queued <= processed {
                backend.stop(voice);
                self.release_residue();
                self.clip = None;
                self.stats.clips_finished += 1;
                report.finished = true;
                info!(voice = %voice, "Clip finished");
            }
            return Ok(report);
        }

        if queued > processed {
            let code = backend.last_error();
            if code.is_error() {
                return Err(self.abort(PlaybackError::BackendError(code)));
            }
            if backend.voice_state(voice) != VoiceState::Playing {
                warn!(voice = %voice, queued, processed, "Voice stopped with audio queued, restarting");
                backend.play(voice);
                self.stats.voice_restarts += 1;
                report.restarted = true;
            }
        }

        report.underrun = processed >= self.config.buffer_count;
        if report.underrun {
            self.stats.underrun_ticks += 1;
            debug!(voice = %voice, processed, "Buffer underrun");
        }

        for _ in 0..processed {
            let unqueued = backend.unqueue_buffers(voice, 1);

            if let (Some(&buffer), false) = (unqueued.first(), self.eof) {
                let read = match self.read_next() {
                    Ok(read) => read,
                    Err(e) => return Err(self.abort(e)),
                };

                if read > 0 {
                    backend.upload_buffer_data(
                        buffer,
                        self.format,
                        &self.scratch[..read],
                        self.sample_rate,
                    );
                    backend.queue_buffers(voice, &[buffer]);
                    self.stats.buffers_refilled += 1;
                    self.stats.bytes_uploaded += read as u64;
                    report.refilled += 1;
                    trace!(buffer = %buffer, bytes = read, "Buffer refilled");
                } else {
                    self.eof = true;
                    debug!(voice = %voice, "End of clip, draining");
                }
            }

            let code = backend.last_error();
            if code.is_error() {
                return Err(self.abort(PlaybackError::BackendError(code)));
            }
        }

        Ok(report)
    }

    /// Stop immediately.
    ///
    /// Clips that rewind on stop are reset. Queued audio is discarded
    /// without fading.
    pub fn stop(&mut self) {
        if let Some(clip) = self.clip.take() {
            let mut decoder = clip.lock();
            if decoder.rewinds_on_stop() {
                decoder.reset();
            }
            debug!(voice = %self.lease.voice, "Clip stopped");
        }
        self.lease.backend.stop(self.lease.voice);
    }

    /// Set the voice gain.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidVolume`] unless `gain` is within `[0.0, 1.0]`.
    pub fn set_volume(&self, gain: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&gain) {
            return Err(PlaybackError::InvalidVolume(gain));
        }
        self.lease.backend.set_gain(self.lease.voice, gain);
        Ok(())
    }

    /// `true` when no clip is assigned.
    pub fn is_free(&self) -> bool {
        self.clip.is_none()
    }

    pub fn state(&self) -> ChannelState {
        match (&self.clip, self.eof) {
            (None, _) => ChannelState::Idle,
            (Some(_), false) => ChannelState::Streaming,
            (Some(_), true) => ChannelState::Draining,
        }
    }

    /// `true` once the current clip has reported end of stream.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Upload format bound by the last `play()`.
    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// Sample rate bound by the last `play()`.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }

    /// Backend voice owned by this channel.
    pub fn voice(&self) -> VoiceId {
        self.lease.voice
    }

    fn read_next(&mut self) -> Result<usize> {
        match &self.clip {
            Some(clip) => clip.lock().read(&mut self.scratch).map_err(into_read_error),
            None => Ok(0),
        }
    }

    /// Unqueue whatever a stopped voice still holds.
    fn release_residue(&mut self) {
        let voice = self.lease.voice;
        let residue = self.lease.backend.processed_count(voice);
        if residue > 0 {
            self.lease.backend.unqueue_buffers(voice, residue);
            trace!(voice = %voice, residue, "Released residual buffers");
        }
    }

    fn abort(&mut self, err: PlaybackError) -> PlaybackError {
        self.lease.backend.stop(self.lease.voice);
        self.clip = None;
        self.stats.clips_failed += 1;
        error!(voice = %self.lease.voice, "Clip aborted: {}", err);
        err
    }
}

fn into_read_error(err: PlaybackError) -> PlaybackError {
    match err {
        PlaybackError::ReadError(_) => err,
        other => PlaybackError::ReadError(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{clip_handle, PcmClip};
    use bridge_desktop::SoftwareBackend;

    fn channel(count: usize, size: usize) -> (Arc<SoftwareBackend>, StreamingChannel) {
        let backend = Arc::new(SoftwareBackend::new());
        let channel = StreamingChannel::new(backend.clone(), ChannelConfig::new(count, size)).unwrap();
        (backend, channel)
    }

    #[test]
    fn test_new_channel_is_idle() {
        let (backend, channel) = channel(3, 64);
        assert!(channel.is_free());
        assert_eq!(channel.state(), ChannelState::Idle);
        assert_eq!(backend.voice_count(), 1);
        assert_eq!(backend.buffer_count(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let backend = Arc::new(SoftwareBackend::new());
        let result = StreamingChannel::new(backend.clone(), ChannelConfig::new(0, 64));
        assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
        assert_eq!(backend.voice_count(), 0);
    }

    #[test]
    fn test_short_clip_drains_immediately() {
        let (backend, mut channel) = channel(4, 8);
        channel
            .play(clip_handle(PcmClip::from_samples(&[1, 2, 3, 4, 5, 6], 1, 8_000)))
            .unwrap();
        assert_eq!(channel.state(), ChannelState::Draining);

        backend.skip_frames(16);
        let report = channel.update().unwrap();
        assert!(report.finished);
        assert!(channel.is_free());
        assert_eq!(channel.stats().clips_finished, 1);
    }

    #[test]
    fn test_volume_validation() {
        let (_backend, channel) = channel(2, 8);
        assert!(channel.set_volume(0.5).is_ok());
        assert!(matches!(channel.set_volume(1.5), Err(PlaybackError::InvalidVolume(_))));
        assert!(channel.set_volume(f32::NAN).is_err());
    }

    #[test]
    fn test_drop_releases_handles() {
        let (backend, channel) = channel(4, 8);
        drop(channel);
        assert_eq!(backend.voice_count(), 0);
        assert_eq!(backend.buffer_count(), 0);
    }
}
