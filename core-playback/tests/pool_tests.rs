//! Integration tests for `ChannelPool`.

mod common;

use bridge_desktop::SoftwareBackend;
use common::{scripted, ScriptedClip, Step};
use core_playback::{
    clip_handle, ChannelConfig, ChannelId, ChannelPool, PcmClip, PlaybackError, PoolConfig,
};
use std::sync::Arc;

fn pool(channels: usize) -> (Arc<SoftwareBackend>, ChannelPool) {
    let backend = Arc::new(SoftwareBackend::new());
    let config = PoolConfig {
        channels,
        channel: ChannelConfig::new(2, 8),
    };
    let pool = ChannelPool::new(backend.clone(), config).unwrap();
    (backend, pool)
}

fn tone(frames: usize) -> core_playback::ClipHandle {
    clip_handle(PcmClip::from_samples(&vec![1000i16; frames], 1, 8_000))
}

#[test]
fn pool_allocates_free_channels_in_order() {
    let (backend, pool) = pool(3);
    assert_eq!(backend.voice_count(), 3);
    assert_eq!(backend.buffer_count(), 6);

    assert_eq!(pool.play(tone(64)).unwrap(), Some(ChannelId(0)));
    assert_eq!(pool.play(tone(64)).unwrap(), Some(ChannelId(1)));
    assert_eq!(pool.play(tone(64)).unwrap(), Some(ChannelId(2)));
    assert_eq!(pool.active_count(), 3);

    // Exhausted
    assert_eq!(pool.play(tone(64)).unwrap(), None);

    pool.stop(ChannelId(1)).unwrap();
    assert!(pool.is_free(ChannelId(1)).unwrap());
    assert_eq!(pool.play(tone(64)).unwrap(), Some(ChannelId(1)));
}

#[test]
fn pool_update_reports_finished_channels() {
    let (backend, pool) = pool(2);
    pool.play(tone(4)).unwrap();
    pool.play(tone(64)).unwrap();

    backend.skip_frames(8);
    let tick = pool.update();

    assert_eq!(tick.active, 2);
    assert_eq!(tick.finished, vec![ChannelId(0)]);
    assert!(tick.failed.is_empty());
    assert_eq!(pool.active_count(), 1);
    assert_eq!(pool.stats(ChannelId(0)).unwrap().clips_finished, 1);
}

#[test]
fn failing_channel_does_not_block_others() {
    let (backend, pool) = pool(2);
    let (_bad, bad) = scripted(ScriptedClip::new(vec![
        Step::Data(vec![0; 8]),
        Step::Data(vec![0; 8]),
        Step::Fail,
    ]));
    pool.play(bad).unwrap();
    pool.play(tone(64)).unwrap();

    backend.skip_frames(8);
    let tick = pool.update();

    assert_eq!(tick.failed.len(), 1);
    assert_eq!(tick.failed[0].0, ChannelId(0));
    assert!(matches!(tick.failed[0].1, PlaybackError::ReadError(_)));
    assert!(pool.is_free(ChannelId(0)).unwrap());
    assert!(!pool.is_free(ChannelId(1)).unwrap());
    assert_eq!(pool.stats(ChannelId(1)).unwrap().buffers_refilled, 2);
}

#[test]
fn stop_all_and_volume() {
    let (_backend, pool) = pool(2);
    pool.play(tone(64)).unwrap();
    pool.play(tone(64)).unwrap();

    pool.set_volume(ChannelId(0), 0.5).unwrap();
    assert!(matches!(
        pool.set_volume(ChannelId(0), 2.0),
        Err(PlaybackError::InvalidVolume(_))
    ));
    assert!(matches!(
        pool.set_volume(ChannelId(4), 0.5),
        Err(PlaybackError::UnknownChannel(4))
    ));

    pool.stop_all();
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn pool_is_shareable_across_threads() {
    let (backend, pool) = pool(4);
    let pool = Arc::new(pool);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || pool.play(tone(16)).unwrap())
        })
        .collect();
    let mut ids: Vec<ChannelId> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    ids.sort();
    assert_eq!(ids, (0..4).map(ChannelId).collect::<Vec<_>>());

    for _ in 0..8 {
        backend.skip_frames(8);
        pool.update();
    }
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn invalid_pool_config_is_rejected() {
    let backend = Arc::new(SoftwareBackend::new());
    let config = PoolConfig {
        channels: 0,
        channel: ChannelConfig::default(),
    };
    assert!(matches!(
        ChannelPool::new(backend, config),
        Err(PlaybackError::InvalidConfig(_))
    ));
}
