//! # Playback & Streaming Module
//!
//! Streams decoded audio into a ring of fixed-size backend buffers.
//!
//! ## Overview
//!
//! This module handles:
//! - [`StreamingChannel`]: the decode → upload → queue → drain cycle for one
//!   backend voice
//! - [`ClipDecoder`]: the pull-based decoder capability every clip implements
//! - [`ChannelPool`]: a per-device set of channels behind one coarse lock
//! - Audio decoding using symphonia (optional, feature `decoder`)
//!
//! The crate never talks to an audio device itself. Hosts inject an
//! [`AudioBackend`](bridge_traits::AudioBackend) and drive `update()` from
//! their own tick.

pub mod channel;
pub mod clip;
pub mod config;
pub mod error;
pub mod format;
pub mod pool;

#[cfg(feature = "decoder")]
pub mod decoder;

pub use channel::{StreamingChannel, TickReport};
pub use clip::{clip_handle, ClipDecoder, ClipHandle, PcmClip};
pub use config::{ChannelConfig, ChannelState, ChannelStats, PoolConfig};
pub use error::{PlaybackError, Result};
pub use format::{resolve_format, TrackInfo, FALLBACK_SAMPLE_RATE};
pub use pool::{ChannelId, ChannelPool, PoolTick};

#[cfg(feature = "decoder")]
pub use decoder::{AudioCodec, FormatDetector, SampleConverter, SymphoniaClip};
