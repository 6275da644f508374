//! # Audio Decoder Module
//!
//! Container decoding using the Symphonia library.
//!
//! ## Overview
//!
//! [`SymphoniaClip`] implements [`ClipDecoder`](crate::clip::ClipDecoder) for
//! every container Symphonia can probe. Decoded packets are converted to
//! interleaved signed 16-bit little-endian PCM and handed out in whatever
//! byte counts the streaming channel asks for.
//!
//! ## Supported Formats
//!
//! | Format | Codec | Rewinds on stop |
//! |--------|-------|-----------------|
//! | MP3 | MPEG-1/2 Audio Layer III | no |
//! | FLAC | Free Lossless Audio Codec | no |
//! | Vorbis | Ogg Vorbis | no |
//! | AAC | Advanced Audio Coding | no |
//! | ALAC | Apple Lossless | no |
//! | WAV / AIFF | PCM | yes |
//!
//! ## Pipeline
//!
//! ```text
//! path / bytes → MediaSourceStream → FormatReader → Decoder → SampleConverter → i16 LE bytes
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use core_playback::{clip_handle, SymphoniaClip};
//!
//! # fn example() -> core_playback::Result<()> {
//! let clip = SymphoniaClip::open("/path/to/music.ogg")?;
//! println!("{} channels at {}Hz", clip.track_info().channels, clip.track_info().sample_rate);
//! let handle = clip_handle(clip);
//! # Ok(())
//! # }
//! ```

mod format_detector;
mod sample_converter;
mod symphonia;

pub use self::symphonia::SymphoniaClip;
pub use format_detector::{AudioCodec, FormatDetector};
pub use sample_converter::SampleConverter;
