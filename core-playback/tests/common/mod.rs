//! Shared fixtures for the streaming integration tests.

#![allow(dead_code)]

use bridge_desktop::SoftwareBackend;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{AudioBackend, BackendErrorCode, BufferId, PcmFormat, VoiceId, VoiceState};
use core_playback::{ClipDecoder, PlaybackError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// One backend call as seen by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateVoice,
    DeleteVoice(VoiceId),
    CreateBuffers(usize),
    DeleteBuffers(Vec<BufferId>),
    Upload {
        buffer: BufferId,
        format: PcmFormat,
        data: Vec<u8>,
        sample_rate: u32,
    },
    Queue(Vec<BufferId>),
    Unqueue(usize),
    QueuedCount,
    ProcessedCount,
    Play,
    Stop,
    VoiceState,
    LastError,
    SetGain(f32),
}

/// Wraps [`SoftwareBackend`] and records every call made through the trait.
#[derive(Default)]
pub struct RecordingBackend {
    pub inner: SoftwareBackend,
    calls: Mutex<Vec<Call>>,
    injected_error: Mutex<Option<BackendErrorCode>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| matches(c)).count()
    }

    /// Report `code` from the next `last_error` call.
    pub fn inject_error(&self, code: BackendErrorCode) {
        *self.injected_error.lock() = Some(code);
    }

    /// Advance playback by `frames` output frames.
    pub fn play_frames(&self, frames: usize) {
        self.inner.skip_frames(frames);
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

impl AudioBackend for RecordingBackend {
    fn create_voice(&self) -> BridgeResult<VoiceId> {
        self.record(Call::CreateVoice);
        self.inner.create_voice()
    }

    fn delete_voice(&self, voice: VoiceId) {
        self.record(Call::DeleteVoice(voice));
        self.inner.delete_voice(voice)
    }

    fn create_buffers(&self, count: usize) -> BridgeResult<Vec<BufferId>> {
        self.record(Call::CreateBuffers(count));
        self.inner.create_buffers(count)
    }

    fn delete_buffers(&self, buffers: &[BufferId]) {
        self.record(Call::DeleteBuffers(buffers.to_vec()));
        self.inner.delete_buffers(buffers)
    }

    fn upload_buffer_data(&self, buffer: BufferId, format: PcmFormat, data: &[u8], sample_rate: u32) {
        self.record(Call::Upload {
            buffer,
            format,
            data: data.to_vec(),
            sample_rate,
        });
        self.inner.upload_buffer_data(buffer, format, data, sample_rate)
    }

    fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]) {
        self.record(Call::Queue(buffers.to_vec()));
        self.inner.queue_buffers(voice, buffers)
    }

    fn unqueue_buffers(&self, voice: VoiceId, count: usize) -> Vec<BufferId> {
        self.record(Call::Unqueue(count));
        self.inner.unqueue_buffers(voice, count)
    }

    fn queued_count(&self, voice: VoiceId) -> usize {
        self.record(Call::QueuedCount);
        self.inner.queued_count(voice)
    }

    fn processed_count(&self, voice: VoiceId) -> usize {
        self.record(Call::ProcessedCount);
        self.inner.processed_count(voice)
    }

    fn play(&self, voice: VoiceId) {
        self.record(Call::Play);
        self.inner.play(voice)
    }

    fn stop(&self, voice: VoiceId) {
        self.record(Call::Stop);
        self.inner.stop(voice)
    }

    fn voice_state(&self, voice: VoiceId) -> VoiceState {
        self.record(Call::VoiceState);
        self.inner.voice_state(voice)
    }

    fn last_error(&self) -> BackendErrorCode {
        self.record(Call::LastError);
        match self.injected_error.lock().take() {
            Some(code) => code,
            None => self.inner.last_error(),
        }
    }

    fn set_gain(&self, voice: VoiceId, gain: f32) {
        self.record(Call::SetGain(gain));
        self.inner.set_gain(voice, gain)
    }
}

/// One scripted result of [`ScriptedClip::read`].
#[derive(Debug, Clone)]
pub enum Step {
    Data(Vec<u8>),
    Fail,
}

/// Clip that replays a fixed script of reads and counts how it was used.
///
/// Once the script runs out every read returns `Ok(0)`.
pub struct ScriptedClip {
    script: Vec<Step>,
    remaining: VecDeque<Step>,
    channels: u16,
    sample_rate: u32,
    rewinds: bool,
    pub reads: usize,
    pub resets: usize,
}

impl ScriptedClip {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            remaining: script.iter().cloned().collect(),
            script,
            channels: 1,
            sample_rate: 22_050,
            rewinds: false,
            reads: 0,
            resets: 0,
        }
    }

    /// Script of successful reads, each yielding the given bytes.
    pub fn chunks(chunks: &[&[u8]]) -> Self {
        Self::new(chunks.iter().map(|c| Step::Data(c.to_vec())).collect())
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn rewinding(mut self) -> Self {
        self.rewinds = true;
        self
    }
}

impl ClipDecoder for ScriptedClip {
    fn reset(&mut self) {
        self.resets += 1;
        self.remaining = self.script.iter().cloned().collect();
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        self.reads += 1;
        match self.remaining.pop_front() {
            Some(Step::Data(data)) => {
                assert!(data.len() <= dest.len(), "scripted chunk larger than scratch");
                dest[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
            Some(Step::Fail) => Err(PlaybackError::DecodingError("scripted failure".into())),
            None => Ok(0),
        }
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn rewinds_on_stop(&self) -> bool {
        self.rewinds
    }
}

/// Keeps a typed handle for inspection next to the type-erased one the
/// channel gets.
pub fn scripted(clip: ScriptedClip) -> (Arc<Mutex<ScriptedClip>>, core_playback::ClipHandle) {
    let typed = Arc::new(Mutex::new(clip));
    let erased: core_playback::ClipHandle = typed.clone();
    (typed, erased)
}

pub fn is_upload(call: &Call) -> bool {
    matches!(call, Call::Upload { .. })
}

pub fn is_queue(call: &Call) -> bool {
    matches!(call, Call::Queue(_))
}
