//! Headless streaming demo.
//!
//! Plays a synthesized tone (or the file given as the first argument) on a
//! small channel pool backed by the software mixer, driving `update()` from a
//! simulated audio tick.
//!
//! ```text
//! cargo run -p core-playback --example playback_demo
//! cargo run -p core-playback --example playback_demo -- path/to/clip.ogg
//! ```

use bridge_desktop::SoftwareBackend;
use core_playback::{
    clip_handle, ChannelConfig, ClipHandle, PcmClip, PoolConfig, ChannelPool, SampleConverter,
    SymphoniaClip,
};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::f32::consts::TAU;
use std::sync::Arc;
use tracing::{info, warn};

const SAMPLE_RATE: u32 = 44_100;

/// Frames mixed per simulated audio tick (~23ms).
const TICK_FRAMES: usize = 1024;

fn sine_clip(frequency: f32, seconds: f32) -> ClipHandle {
    let frames = (SAMPLE_RATE as f32 * seconds) as usize;
    let left: Vec<f32> = (0..frames)
        .map(|i| (TAU * frequency * i as f32 / SAMPLE_RATE as f32).sin() * 0.4)
        .collect();
    let right: Vec<f32> = left.iter().map(|s| -s).collect();

    let mut pcm = Vec::with_capacity(frames * 4);
    SampleConverter::f32_planes_to_i16_le(&[&left[..], &right[..]], &mut pcm);
    clip_handle(PcmClip::new(pcm, Some(2), Some(SAMPLE_RATE)))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let backend = Arc::new(SoftwareBackend::new());
    let pool = ChannelPool::new(
        backend.clone(),
        PoolConfig {
            channels: 4,
            channel: ChannelConfig::default(),
        },
    )?;

    let clip = match std::env::args().nth(1) {
        Some(path) => clip_handle(SymphoniaClip::open(&path)?),
        None => sine_clip(440.0, 2.0),
    };

    let music = pool.play(clip)?.ok_or("no free channel")?;
    pool.set_volume(music, 0.8)?;
    pool.play(sine_clip(880.0, 0.25))?;

    let mut mix = vec![0i16; TICK_FRAMES * 2];
    let mut ticks = 0u64;
    let mut peak = 0i16;

    while pool.active_count() > 0 {
        backend.render(&mut mix);
        peak = mix.iter().fold(peak, |p, s| p.max(s.saturating_abs()));

        let tick = pool.update();
        for id in &tick.finished {
            info!(channel = %id, "Finished");
        }
        for (id, err) in &tick.failed {
            warn!(channel = %id, "Failed: {}", err);
        }
        ticks += 1;
    }

    let stats = pool.stats(music)?;
    info!(
        ticks,
        peak,
        buffers_refilled = stats.buffers_refilled,
        underruns = stats.underrun_ticks,
        "Playback complete"
    );
    Ok(())
}
