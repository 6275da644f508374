//! Default output device driver for [`SoftwareBackend`].
//!
//! Opens the host's default output device with `cpal` and pulls mixed frames
//! from the software backend on the device callback thread.

use crate::software::SoftwareBackend;
use bridge_traits::error::{BridgeError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{OutputCallbackInfo, SampleFormat, Stream, StreamConfig};
use std::sync::Arc;
use tracing::{error, info};

/// Running output stream. Dropping it stops playback on the device.
pub struct CpalOutput {
    _stream: Stream,
    sample_rate: u32,
    channels: u16,
}

impl CpalOutput {
    /// Start rendering `backend` on the default output device.
    pub fn start(backend: Arc<SoftwareBackend>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| BridgeError::NotAvailable("No default output device".to_string()))?;

        let supported = device.default_output_config().map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to query output config: {}", e))
        })?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();
        let channels = config.channels;
        let sample_rate = config.sample_rate.0;
        backend.set_output_rate(sample_rate);

        let stream = match sample_format {
            SampleFormat::F32 => {
                let mut mix = Vec::new();
                device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &OutputCallbackInfo| {
                        fill_device_buffer(&backend, &mut mix, data, channels, |s| {
                            s as f32 / i16::MAX as f32
                        })
                    },
                    |err| error!("Output stream error: {}", err),
                    None,
                )
            }
            SampleFormat::I16 => {
                let mut mix = Vec::new();
                device.build_output_stream(
                    &config,
                    move |data: &mut [i16], _: &OutputCallbackInfo| {
                        fill_device_buffer(&backend, &mut mix, data, channels, |s| s)
                    },
                    |err| error!("Output stream error: {}", err),
                    None,
                )
            }
            other => {
                return Err(BridgeError::NotAvailable(format!(
                    "Unsupported device sample format: {:?}",
                    other
                )))
            }
        }
        .map_err(|e| BridgeError::OperationFailed(format!("Failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to start output stream: {}", e)))?;

        info!(sample_rate, channels, "Output device started");

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    /// Device sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Device channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn fill_device_buffer<T: Copy>(
    backend: &SoftwareBackend,
    mix: &mut Vec<i16>,
    data: &mut [T],
    channels: u16,
    convert: impl Fn(i16) -> T,
) {
    let channels = channels.max(1) as usize;
    let frames = data.len() / channels;
    mix.resize(frames * 2, 0);
    backend.render(mix);

    for (frame, stereo) in data.chunks_exact_mut(channels).zip(mix.chunks_exact(2)) {
        let (left, right) = (stereo[0], stereo[1]);
        for (index, sample) in frame.iter_mut().enumerate() {
            let value = match (channels, index % 2) {
                (1, _) => ((left as i32 + right as i32) / 2) as i16,
                (_, 0) => left,
                _ => right,
            };
            *sample = convert(value);
        }
    }
}
