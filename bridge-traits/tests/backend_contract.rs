//! Contract checks for the `AudioBackend` bridge trait.
//!
//! Verifies the trait stays object safe and mockable so the core can hold it
//! as `Arc<dyn AudioBackend>`.

use bridge_traits::error::Result;
use bridge_traits::{AudioBackend, BackendErrorCode, BufferId, PcmFormat, VoiceId, VoiceState};
use mockall::mock;
use mockall::predicate::*;
use std::sync::Arc;

mock! {
    pub Backend {}

    impl AudioBackend for Backend {
        fn create_voice(&self) -> Result<VoiceId>;
        fn delete_voice(&self, voice: VoiceId);
        fn create_buffers(&self, count: usize) -> Result<Vec<BufferId>>;
        fn delete_buffers(&self, buffers: &[BufferId]);
        fn upload_buffer_data(&self, buffer: BufferId, format: PcmFormat, data: &[u8], sample_rate: u32);
        fn queue_buffers(&self, voice: VoiceId, buffers: &[BufferId]);
        fn unqueue_buffers(&self, voice: VoiceId, count: usize) -> Vec<BufferId>;
        fn queued_count(&self, voice: VoiceId) -> usize;
        fn processed_count(&self, voice: VoiceId) -> usize;
        fn play(&self, voice: VoiceId);
        fn stop(&self, voice: VoiceId);
        fn voice_state(&self, voice: VoiceId) -> VoiceState;
        fn last_error(&self) -> BackendErrorCode;
        fn set_gain(&self, voice: VoiceId, gain: f32);
    }
}

#[test]
fn backend_is_usable_as_trait_object() {
    let mut mock = MockBackend::new();
    mock.expect_create_voice().times(1).returning(|| Ok(VoiceId(1)));
    mock.expect_create_buffers()
        .with(eq(3))
        .times(1)
        .returning(|n| Ok((0..n as u32).map(BufferId).collect()));
    mock.expect_voice_state()
        .with(eq(VoiceId(1)))
        .returning(|_| VoiceState::Initial);

    let backend: Arc<dyn AudioBackend> = Arc::new(mock);
    let voice = backend.create_voice().unwrap();
    let buffers = backend.create_buffers(3).unwrap();

    assert_eq!(voice, VoiceId(1));
    assert_eq!(buffers, vec![BufferId(0), BufferId(1), BufferId(2)]);
    assert_eq!(backend.voice_state(voice), VoiceState::Initial);
}

#[test]
fn sticky_error_is_reported_once() {
    let mut mock = MockBackend::new();
    let mut seq = mockall::Sequence::new();
    mock.expect_last_error()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| BackendErrorCode::InvalidOperation);
    mock.expect_last_error()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| BackendErrorCode::NoError);

    let backend: Arc<dyn AudioBackend> = Arc::new(mock);
    assert!(backend.last_error().is_error());
    assert!(!backend.last_error().is_error());
}
