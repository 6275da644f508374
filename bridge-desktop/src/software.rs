//! In-process buffer-queue backend with a software mixer.
//!
//! `SoftwareBackend` keeps voices and buffers in memory and consumes queued
//! PCM when [`SoftwareBackend::render`] is called. It follows the usual
//! buffer-queue rules (processed counts, sticky errors, restart on play) so
//! the streaming core behaves the same against it as against a native
//! device. Pair it with `CpalOutput` to hear the result, or drive `render` /
//! `skip_frames` directly for headless use and tests.
//!
//! Once the output rate is declared with [`SoftwareBackend::set_output_rate`],
//! buffers uploaded at another rate are converted per voice with `rubato`.
//! Without it, every voice advances one source frame per output frame.

use bridge_traits::{
    error::{BridgeError, Result},
    AudioBackend, BackendErrorCode, BufferId, PcmFormat, VoiceId, VoiceState,
};
use parking_lot::Mutex;
use rubato::{FastFixedIn, PolynomialDegree, Resampler};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace, warn};

/// Upper bound on live buffers, mirrors the slot limits of native devices.
const DEFAULT_MAX_BUFFERS: usize = 1024;

/// Upper bound on live voices.
const DEFAULT_MAX_VOICES: usize = 64;

/// Source frames fed to a voice resampler per call.
const RESAMPLE_CHUNK_FRAMES: usize = 256;

struct BufferSlot {
    format: PcmFormat,
    sample_rate: u32,
    data: Vec<u8>,
}

impl Default for BufferSlot {
    fn default() -> Self {
        Self {
            format: PcmFormat::Mono16,
            sample_rate: 0,
            data: Vec::new(),
        }
    }
}

/// Converts one voice from its buffers' rate to the output rate.
struct VoiceResampler {
    source_rate: u32,
    inner: FastFixedIn<f32>,
}

impl VoiceResampler {
    fn new(source_rate: u32, output_rate: u32) -> std::result::Result<Self, String> {
        let inner = FastFixedIn::<f32>::new(
            output_rate as f64 / source_rate as f64,
            1.0,
            PolynomialDegree::Cubic,
            RESAMPLE_CHUNK_FRAMES,
            2,
        )
        .map_err(|e| e.to_string())?;
        Ok(Self { source_rate, inner })
    }
}

struct VoiceSlot {
    queue: VecDeque<BufferId>,
    /// Number of buffers at the head of `queue` that finished playing.
    processed: usize,
    /// Byte offset into the buffer at `queue[processed]`.
    cursor: usize,
    state: VoiceState,
    gain: f32,
    resampler: Option<VoiceResampler>,
    /// Converted stereo frames not yet mixed.
    resampled: VecDeque<(f32, f32)>,
}

impl VoiceSlot {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            processed: 0,
            cursor: 0,
            state: VoiceState::Initial,
            gain: 1.0,
            resampler: None,
            resampled: VecDeque::new(),
        }
    }

    fn rewind(&mut self, processed: usize) {
        self.processed = processed;
        self.cursor = 0;
        self.resampler = None;
        self.resampled.clear();
    }

    fn advance_buffer(&mut self) {
        self.processed += 1;
        self.cursor = 0;
    }

    fn is_exhausted(&self) -> bool {
        self.processed >= self.queue.len() && self.resampled.is_empty()
    }

    /// Take one source frame from the queue head, retiring finished buffers.
    ///
    /// Returns `None` when the queue is empty or the head buffer was not
    /// uploaded at `rate`.
    fn take_source_frame(
        &mut self,
        buffers: &HashMap<BufferId, BufferSlot>,
        rate: Option<u32>,
    ) -> Option<(i16, i16)> {
        loop {
            let buffer_id = *self.queue.get(self.processed)?;
            let slot = match buffers.get(&buffer_id) {
                Some(slot) if !slot.data.is_empty() => slot,
                _ => {
                    self.advance_buffer();
                    continue;
                }
            };
            if rate.is_some_and(|rate| rate != slot.sample_rate) {
                return None;
            }

            let frame_bytes = slot.format.bytes_per_frame();
            if self.cursor + frame_bytes > slot.data.len() {
                self.advance_buffer();
                continue;
            }
            let frame = read_frame(slot, self.cursor);
            self.cursor += frame_bytes;
            if self.cursor + frame_bytes > slot.data.len() {
                trace!(buffer = %buffer_id, "Buffer processed");
                self.advance_buffer();
            }
            return Some(frame);
        }
    }

    /// Produce the next output frame, or `None` once the voice ran dry.
    fn next_frame(
        &mut self,
        buffers: &HashMap<BufferId, BufferSlot>,
        output_rate: Option<u32>,
    ) -> Option<(f32, f32)> {
        loop {
            if let Some(frame) = self.resampled.pop_front() {
                return Some(frame);
            }

            let buffer_id = *self.queue.get(self.processed)?;
            let source_rate = match buffers.get(&buffer_id) {
                Some(slot) if !slot.data.is_empty() => slot.sample_rate,
                _ => {
                    self.advance_buffer();
                    continue;
                }
            };

            match output_rate {
                Some(output_rate) if output_rate != source_rate => {
                    self.resample_chunk(buffers, source_rate, output_rate);
                }
                _ => {
                    self.resampler = None;
                    if let Some((left, right)) = self.take_source_frame(buffers, None) {
                        return Some((left as f32, right as f32));
                    }
                }
            }
        }
    }

    /// Feed one chunk of same-rate source frames through the resampler.
    ///
    /// Always consumes from the queue head, so repeated calls make progress.
    fn resample_chunk(
        &mut self,
        buffers: &HashMap<BufferId, BufferSlot>,
        source_rate: u32,
        output_rate: u32,
    ) {
        let mut resampler = match self.resampler.take() {
            Some(resampler) if resampler.source_rate == source_rate => resampler,
            _ => match VoiceResampler::new(source_rate, output_rate) {
                Ok(resampler) => {
                    debug!(source_rate, output_rate, "Created voice resampler");
                    resampler
                }
                Err(e) => {
                    warn!(source_rate, output_rate, "Cannot resample, skipping buffer: {}", e);
                    self.advance_buffer();
                    return;
                }
            },
        };

        let needed = resampler.inner.input_frames_next();
        let mut planes = [Vec::with_capacity(needed), Vec::with_capacity(needed)];
        while planes[0].len() < needed {
            let Some((left, right)) = self.take_source_frame(buffers, Some(source_rate)) else {
                break;
            };
            planes[0].push(left as f32);
            planes[1].push(right as f32);
        }

        let converted = if planes[0].len() == needed {
            resampler.inner.process(&planes[..], None)
        } else {
            resampler.inner.process_partial(Some(&planes[..]), None)
        };
        match converted {
            Ok(out) => self
                .resampled
                .extend(out[0].iter().copied().zip(out[1].iter().copied())),
            Err(e) => warn!("Resampling failed: {}", e),
        }
        self.resampler = Some(resampler);
    }
}

#[derive(Default)]
struct MixerState {
    next_id: u32,
    buffers: HashMap<BufferId, BufferSlot>,
    voices: HashMap<VoiceId, VoiceSlot>,
    last_error: Option<BackendErrorCode>,
    output_rate: Option<u32>,
}

impl MixerState {
    fn flag(&mut self, code: BackendErrorCode) {
        if self.last_error.is_none() {
            debug!(error = %code, "Software backend error flagged");
            self.last_error = Some(code);
        }
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    fn is_queued(&self, buffer: BufferId) -> bool {
        self.voices.values().any(|v| v.queue.contains(&buffer))
    }
}

/// Software implementation of [`AudioBackend`].
pub struct SoftwareBackend {
    state: Mutex<MixerState>,
    max_buffers: usize,
    max_voices: usize,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareBackend {
    /// Create a backend with default slot limits.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_VOICES, DEFAULT_MAX_BUFFERS)
    }

    /// Create a backend that refuses to allocate beyond the given limits.
    pub fn with_limits(max_voices: usize, max_buffers: usize) -> Self {
        Self {
            state: Mutex::new(MixerState::default()),
            max_buffers,
            max_voices,
        }
    }

    /// Number of live voices.
    pub fn voice_count(&self) -> usize {
        self.state.lock().voices.len()
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Declare the rate `render` output is played at.
    ///
    /// Buffers uploaded at any other rate are resampled to it.
    pub fn set_output_rate(&self, rate: u32) {
        let mut state = self.state.lock();
        if rate == 0 {
            state.flag(BackendErrorCode::InvalidValue);
            return;
        }
        debug!(rate, "Output rate set");
        state.output_rate = Some(rate);
    }

    /// Rate declared with [`set_output_rate`](Self::set_output_rate).
    pub fn output_rate(&self) -> Option<u32> {
        self.state.lock().output_rate
    }

    /// Mix every playing voice into `out`.
    ///
    /// `out` holds interleaved stereo frames; mono voices are written to both
    /// sides. Existing contents are overwritten. Returns the number of frames
    /// rendered.
    pub fn render(&self, out: &mut [i16]) -> usize {
        let frames = out.len() / 2;
        let mut mix = vec![0i32; frames * 2];
        let mut state = self.state.lock();
        let MixerState {
            buffers,
            voices,
            output_rate,
            ..
        } = &mut *state;

        for (voice_id, voice) in voices.iter_mut() {
            if voice.state != VoiceState::Playing {
                continue;
            }
            for frame in mix.chunks_exact_mut(2) {
                let Some((left, right)) = voice.next_frame(buffers, *output_rate) else {
                    break;
                };
                frame[0] += (left * voice.gain) as i32;
                frame[1] += (right * voice.gain) as i32;
            }

            if voice.is_exhausted() {
                debug!(voice = %voice_id, "Voice ran out of queued data");
                voice.state = VoiceState::Stopped;
            }
        }
        drop(state);

        for (dst, src) in out.iter_mut().zip(mix.iter()) {
            *dst = (*src).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
        frames
    }

    /// Advance every playing voice by `frames` without producing output.
    pub fn skip_frames(&self, frames: usize) {
        let mut scratch = vec![0i16; frames * 2];
        self.render(&mut scratch);
    }
}

fn read_frame(slot: &BufferSlot, offset: usize) -> (i16, i16) {
    let sample = |at: usize| i16::from_le_bytes([slot.data[at], slot.data[at + 1]]);
    match slot.format {
        PcmFormat::Mono16 => {
            let s = sample(offset);
            (s, s)
        }
        PcmFormat::Stereo16 => (sample(offset), sample(offset + 2)),
    }
}

impl AudioBackend for SoftwareBackend {
    fn create_voice(&self) -> Result<VoiceId> {
        let mut state = self.state.lock();
        if state.voices.len() >= self.max_voices {
            warn!(limit = self.max_voices, "Voice limit reached");
            return Err(BridgeError::ResourceExhausted(format!(
                "voice limit of {} reached",
                self.max_voices
            )));
        }
        let voice = VoiceId(state.allocate_id());
        state.voices.insert(voice, VoiceSlot::new());
        debug!(voice = %voice, "Created voice");
        Ok(voice)
    }

    fn delete_voice(&self, voice: VoiceId) {
        let mut state = self.state.lock();
        if state.voices.remove(&voice).is_none() {
            state.flag(BackendErrorCode::InvalidName);
        } else {
            debug!(voice = %voice, "Deleted voice");
        }
    }

    fn create_buffers(&self, count: usize) -> Result<Vec<BufferId>> {
        let mut state = self.state.lock();
        if state.buffers.len() + count > self.max_buffers {
            warn!(requested = count, limit = self.max_buffers, "Buffer limit reached");
            return Err(BridgeError::ResourceExhausted(format!(
                "cannot allocate {} buffers, limit is {}",
                count, self.max_buffers
            )));
        }
        let ids: Vec<BufferId> = (0..count).map(|_| BufferId(state.allocate_id())).collect();
        for id in &ids {
            state.buffers.insert(*id, BufferSlot::default());
        }
        debug!(count, "Created buffers");
        Ok(ids)
    }

    fn delete_buffers(&self, buffers: &[BufferId]) {
        let mut state = self.state.lock();
        for buffer in buffers {
            if state.is_queued(*buffer) {
                state.flag(BackendErrorCode::InvalidOperation);
                continue;
            }
            if state.buffers.remove(buffer).is_none() {
                state.flag(BackendErrorCode::InvalidName);
            }
        }
    }

    fn upload_buffer_data(&self, buffer: BufferId, format: PcmFormat, data: &[u8], sample_rate: u32) {
        let mut state = self.state.lock();
        if state.is_queued(buffer) {
            state.flag(BackendErrorCode::InvalidOperation);
            return;
        }
        if sample_rate == 0 {
            state.flag(BackendErrorCode::InvalidValue);
            return;
        }
        match state.buffers.get_mut(&buffer) {
            Some(slot) => {
                slot.format = format;
                slot.sample_rate = sample_rate;
                slot.data.clear();
                slot.data.extend_from_slice(data);
            }
            None => state.flag(BackendErrorCode::InvalidName),
        }
    }

    fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]) {
        let mut state = self.state.lock();
        if buffers.iter().any(|b| !state.buffers.contains_key(b)) {
            state.flag(BackendErrorCode::InvalidName);
            return;
        }
        match state.voices.get_mut(&voice) {
            Some(slot) => slot.queue.extend(buffers.iter().copied()),
            None => state.flag(BackendErrorCode::InvalidName),
        }
    }

    fn unqueue_buffers(&self, voice: VoiceId, count: usize) -> Vec<BufferId> {
        let mut state = self.state.lock();
        let Some(slot) = state.voices.get_mut(&voice) else {
            state.flag(BackendErrorCode::InvalidName);
            return Vec::new();
        };
        if count > slot.processed {
            state.flag(BackendErrorCode::InvalidValue);
            return Vec::new();
        }
        slot.processed -= count;
        slot.queue.drain(..count).collect()
    }

    fn queued_count(&self, voice: VoiceId) -> usize {
        let mut state = self.state.lock();
        match state.voices.get(&voice) {
            Some(slot) => slot.queue.len(),
            None => {
                state.flag(BackendErrorCode::InvalidName);
                0
            }
        }
    }

    fn processed_count(&self, voice: VoiceId) -> usize {
        let mut state = self.state.lock();
        match state.voices.get(&voice) {
            Some(slot) => slot.processed,
            None => {
                state.flag(BackendErrorCode::InvalidName);
                0
            }
        }
    }

    fn play(&self, voice: VoiceId) {
        let mut state = self.state.lock();
        let Some(slot) = state.voices.get_mut(&voice) else {
            state.flag(BackendErrorCode::InvalidName);
            return;
        };
        match slot.state {
            VoiceState::Playing => {}
            VoiceState::Paused => slot.state = VoiceState::Playing,
            VoiceState::Initial | VoiceState::Stopped => {
                slot.rewind(0);
                slot.state = if slot.queue.is_empty() {
                    VoiceState::Stopped
                } else {
                    VoiceState::Playing
                };
            }
        }
    }

    fn stop(&self, voice: VoiceId) {
        let mut state = self.state.lock();
        let Some(slot) = state.voices.get_mut(&voice) else {
            state.flag(BackendErrorCode::InvalidName);
            return;
        };
        slot.state = VoiceState::Stopped;
        let queued = slot.queue.len();
        slot.rewind(queued);
    }

    fn voice_state(&self, voice: VoiceId) -> VoiceState {
        let mut state = self.state.lock();
        match state.voices.get(&voice) {
            Some(slot) => slot.state,
            None => {
                state.flag(BackendErrorCode::InvalidName);
                VoiceState::Initial
            }
        }
    }

    fn last_error(&self) -> BackendErrorCode {
        self.state
            .lock()
            .last_error
            .take()
            .unwrap_or(BackendErrorCode::NoError)
    }

    fn set_gain(&self, voice: VoiceId, gain: f32) {
        let mut state = self.state.lock();
        if !gain.is_finite() || gain < 0.0 {
            state.flag(BackendErrorCode::InvalidValue);
            return;
        }
        match state.voices.get_mut(&voice) {
            Some(slot) => slot.gain = gain,
            None => state.flag(BackendErrorCode::InvalidName),
        }
    }
}
