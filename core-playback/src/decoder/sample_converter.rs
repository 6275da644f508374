//! # Sample Format Converter
//!
//! Converts decoded Symphonia buffers to the 16-bit PCM backends accept.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter that normalizes audio to interleaved i16 little-endian bytes.
///
/// Symphonia outputs audio in various formats (u8 through f64) and always in
/// planar layout. Backend buffers take interleaved signed 16-bit samples, so
/// every decoded packet goes through here exactly once.
pub struct SampleConverter;

impl SampleConverter {
    /// Append `buffer` to `out` as interleaved i16 LE bytes.
    ///
    /// Returns the number of bytes appended.
    pub fn append_i16_le(buffer: &AudioBufferRef<'_>, out: &mut Vec<u8>) -> usize {
        match buffer {
            AudioBufferRef::U8(buf) => Self::interleave(buf, out),
            AudioBufferRef::U16(buf) => Self::interleave(buf, out),
            AudioBufferRef::U24(buf) => Self::interleave(buf, out),
            AudioBufferRef::U32(buf) => Self::interleave(buf, out),
            AudioBufferRef::S8(buf) => Self::interleave(buf, out),
            AudioBufferRef::S16(buf) => Self::interleave(buf, out),
            AudioBufferRef::S24(buf) => Self::interleave(buf, out),
            AudioBufferRef::S32(buf) => Self::interleave(buf, out),
            AudioBufferRef::F32(buf) => Self::interleave(buf, out),
            AudioBufferRef::F64(buf) => Self::interleave(buf, out),
        }
    }

    fn interleave<T>(buf: &AudioBuffer<T>, out: &mut Vec<u8>) -> usize
    where
        T: Sample + IntoSample<i16>,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        let start = out.len();
        out.reserve(num_frames * num_channels * 2);

        for frame_idx in 0..num_frames {
            for chan_idx in 0..num_channels {
                let sample: i16 = buf.chan(chan_idx)[frame_idx].into_sample();
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }

        out.len() - start
    }

    /// Interleave f32 planes into i16 LE bytes, clamping out-of-range input.
    ///
    /// Used for synthesized audio that never went through a Symphonia buffer.
    pub fn f32_planes_to_i16_le(planes: &[&[f32]], out: &mut Vec<u8>) -> usize {
        let frames = planes.iter().map(|p| p.len()).min().unwrap_or(0);
        let start = out.len();

        for frame_idx in 0..frames {
            for plane in planes {
                let clamped = plane[frame_idx].clamp(-1.0, 1.0);
                let sample: i16 = clamped.into_sample();
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }

        out.len() - start
    }
}
