//! Output format resolution.
//!
//! A clip declares a channel count and sample rate; the channel binds those to
//! a backend [`PcmFormat`] once per `play()` and keeps them for the lifetime of
//! that clip.

use crate::error::{PlaybackError, Result};
use bridge_traits::PcmFormat;
use serde::{Deserialize, Serialize};

/// Sample rate assumed for containers that carry no track metadata.
pub const FALLBACK_SAMPLE_RATE: u32 = 44_100;

/// Channel count assumed for containers that carry no track metadata.
pub const FALLBACK_CHANNELS: u16 = 1;

/// Channel layout and rate a decoder reports for its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub channels: u16,
    pub sample_rate: u32,
}

impl TrackInfo {
    /// Build track info from whatever the container declared.
    ///
    /// Missing values fall back to mono at [`FALLBACK_SAMPLE_RATE`]. A declared
    /// rate of zero counts as missing.
    pub fn from_declared(channels: Option<u16>, sample_rate: Option<u32>) -> Self {
        Self {
            channels: channels.unwrap_or(FALLBACK_CHANNELS),
            sample_rate: sample_rate
                .filter(|rate| *rate > 0)
                .unwrap_or(FALLBACK_SAMPLE_RATE),
        }
    }
}

/// Map a declared channel count and rate to the backend upload format.
///
/// Stereo becomes [`PcmFormat::Stereo16`], everything at or below one channel
/// becomes [`PcmFormat::Mono16`]. A count of zero is not rejected and plays as
/// mono. Counts above two fail with [`PlaybackError::FormatUnsupported`].
pub fn resolve_format(channels: u16, sample_rate: u32) -> Result<(PcmFormat, u32)> {
    match channels {
        0 | 1 => Ok((PcmFormat::Mono16, sample_rate)),
        2 => Ok((PcmFormat::Stereo16, sample_rate)),
        other => Err(PlaybackError::FormatUnsupported { channels: other }),
    }
}
