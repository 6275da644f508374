//! # Format Detection Module
//!
//! Probe hints and codec classification for Symphonia.

use serde::{Deserialize, Serialize};
use std::path::Path;
use symphonia::core::codecs::CodecType;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Codec family of a decoded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Audio Layer 3
    Mp3,
    /// Advanced Audio Coding (AAC/M4A)
    Aac,
    /// Free Lossless Audio Codec
    Flac,
    /// Ogg Vorbis
    Vorbis,
    /// Apple Lossless Audio Codec
    Alac,
    /// Uncompressed samples in a WAV/AIFF container
    Wav,
    /// Codec not recognized
    Unknown,
}

impl AudioCodec {
    /// Returns `true` if this is a lossless codec.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioCodec::Flac | AudioCodec::Wav | AudioCodec::Alac)
    }
}

/// Format detector for audio streams.
///
/// Builds hints for Symphonia's probe from extensions and MIME types, and
/// maps Symphonia codec types to [`AudioCodec`].
pub struct FormatDetector;

impl FormatDetector {
    /// Create a probe hint from file path.
    ///
    /// ```rust
    /// use core_playback::FormatDetector;
    /// use std::path::Path;
    ///
    /// let hint = FormatDetector::hint_from_path(Path::new("/sfx/jump.wav"));
    /// ```
    pub fn hint_from_path(path: &Path) -> Hint {
        let mut hint = Hint::new();

        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            debug!("Setting probe hint extension: {}", extension);
            hint.with_extension(extension);
        } else {
            debug!("No file extension found, probe will auto-detect");
        }

        hint
    }

    /// Create a probe hint from a codec the caller already knows.
    pub fn hint_from_codec(codec: AudioCodec) -> Hint {
        let mut hint = Hint::new();
        hint.with_extension(Self::codec_extension(codec));
        hint.mime_type(Self::codec_mime_type(codec));
        hint
    }

    /// Map a Symphonia codec type to an [`AudioCodec`].
    pub fn detect_codec(codec_type: CodecType) -> AudioCodec {
        use symphonia::core::codecs::*;

        if codec_type == CODEC_TYPE_MP3 {
            AudioCodec::Mp3
        } else if codec_type == CODEC_TYPE_AAC {
            AudioCodec::Aac
        } else if codec_type == CODEC_TYPE_FLAC {
            AudioCodec::Flac
        } else if codec_type == CODEC_TYPE_VORBIS {
            AudioCodec::Vorbis
        } else if codec_type == CODEC_TYPE_ALAC {
            AudioCodec::Alac
        } else if Self::is_uncompressed(codec_type) {
            AudioCodec::Wav
        } else {
            warn!("Unknown codec type: {:?}", codec_type);
            AudioCodec::Unknown
        }
    }

    /// Returns `true` for raw PCM codec types.
    ///
    /// Clips in these formats rewind when their channel is stopped.
    pub fn is_uncompressed(codec_type: CodecType) -> bool {
        use symphonia::core::codecs::*;

        [
            CODEC_TYPE_PCM_S8,
            CODEC_TYPE_PCM_U8,
            CODEC_TYPE_PCM_S16LE,
            CODEC_TYPE_PCM_S16BE,
            CODEC_TYPE_PCM_S24LE,
            CODEC_TYPE_PCM_S24BE,
            CODEC_TYPE_PCM_S32LE,
            CODEC_TYPE_PCM_S32BE,
            CODEC_TYPE_PCM_F32LE,
            CODEC_TYPE_PCM_F32BE,
            CODEC_TYPE_PCM_F64LE,
            CODEC_TYPE_PCM_F64BE,
            CODEC_TYPE_PCM_ALAW,
            CODEC_TYPE_PCM_MULAW,
        ]
        .contains(&codec_type)
    }

    /// Get the common file extension for a codec.
    pub fn codec_extension(codec: AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "mp3",
            AudioCodec::Aac => "m4a",
            AudioCodec::Flac => "flac",
            AudioCodec::Vorbis => "ogg",
            AudioCodec::Alac => "m4a",
            AudioCodec::Wav => "wav",
            AudioCodec::Unknown => "bin",
        }
    }

    /// Get the MIME type for a codec.
    pub fn codec_mime_type(codec: AudioCodec) -> &'static str {
        match codec {
            AudioCodec::Mp3 => "audio/mpeg",
            AudioCodec::Aac => "audio/mp4",
            AudioCodec::Flac => "audio/flac",
            AudioCodec::Vorbis => "audio/ogg",
            AudioCodec::Alac => "audio/mp4",
            AudioCodec::Wav => "audio/wav",
            AudioCodec::Unknown => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::codecs::{CODEC_TYPE_FLAC, CODEC_TYPE_PCM_S16LE, CODEC_TYPE_VORBIS};

    #[test]
    fn test_detect_codec() {
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_PCM_S16LE), AudioCodec::Wav);
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_FLAC), AudioCodec::Flac);
        assert_eq!(FormatDetector::detect_codec(CODEC_TYPE_VORBIS), AudioCodec::Vorbis);
    }

    #[test]
    fn test_uncompressed_classification() {
        assert!(FormatDetector::is_uncompressed(CODEC_TYPE_PCM_S16LE));
        assert!(!FormatDetector::is_uncompressed(CODEC_TYPE_VORBIS));
        assert!(!FormatDetector::is_uncompressed(CODEC_TYPE_FLAC));
    }

    #[test]
    fn test_codec_extension() {
        assert_eq!(FormatDetector::codec_extension(AudioCodec::Mp3), "mp3");
        assert_eq!(FormatDetector::codec_extension(AudioCodec::Flac), "flac");
        assert_eq!(FormatDetector::codec_extension(AudioCodec::Vorbis), "ogg");
        assert_eq!(FormatDetector::codec_extension(AudioCodec::Wav), "wav");
    }

    #[test]
    fn test_codec_mime_type() {
        assert_eq!(FormatDetector::codec_mime_type(AudioCodec::Mp3), "audio/mpeg");
        assert_eq!(FormatDetector::codec_mime_type(AudioCodec::Wav), "audio/wav");
    }

    #[test]
    fn test_lossless() {
        assert!(AudioCodec::Flac.is_lossless());
        assert!(!AudioCodec::Mp3.is_lossless());
    }
}
