//! # Playback Error Types
//!
//! Error types for streaming channels, clip decoders and the channel pool.

use bridge_traits::{BackendErrorCode, BridgeError};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Streaming Errors
    // ========================================================================
    /// Clip declares a channel layout the backend buffers cannot hold.
    #[error("Unsupported channel count: {channels} (only mono and stereo are supported)")]
    FormatUnsupported { channels: u16 },

    /// Clip decoder failed while filling a buffer.
    #[error("Clip read failed: {0}")]
    ReadError(String),

    /// Backend reported an error state while streaming.
    #[error("Audio backend error: {0}")]
    BackendError(BackendErrorCode),

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Failed to open or read audio source.
    #[error("Failed to open audio source: {0}")]
    SourceError(String),

    // ========================================================================
    // Format/Codec Errors
    // ========================================================================
    /// Audio format is not recognized or cannot be parsed.
    #[error("Unsupported or invalid audio format: {0}")]
    InvalidFormat(String),

    /// Audio format was detected but cannot be decoded.
    #[error("Cannot decode audio format: {0}")]
    FormatNotDecodable(String),

    // ========================================================================
    // Decoding Errors
    // ========================================================================
    /// Error occurred during audio decoding.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Audio stream is corrupted or contains invalid data.
    #[error("Corrupted audio stream: {0}")]
    CorruptedStream(String),

    /// Decoder encountered an internal error.
    #[error("Decoder internal error: {0}")]
    DecoderError(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    /// Channel configuration rejected by validation.
    #[error("Invalid channel configuration: {0}")]
    InvalidConfig(String),

    /// Channel index outside the pool.
    #[error("Unknown channel: {0}")]
    UnknownChannel(usize),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Backend resource creation failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if this error ended the clip that was streaming.
    ///
    /// The channel is always idle after one of these.
    pub fn is_terminal_for_clip(&self) -> bool {
        matches!(
            self,
            PlaybackError::FormatUnsupported { .. }
                | PlaybackError::ReadError(_)
                | PlaybackError::BackendError(_)
        )
    }

    /// Returns `true` if this error is related to audio format/codec issues.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::FormatUnsupported { .. }
                | PlaybackError::InvalidFormat(_)
                | PlaybackError::FormatNotDecodable(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
