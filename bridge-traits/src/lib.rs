//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the streaming core and the native
//! audio device. The core requires a buffer-queue playback backend but never
//! links a platform audio API itself; hosts inject an [`AudioBackend`]
//! implementation instead.
//!
//! ## Traits
//!
//! - [`AudioBackend`](audio::AudioBackend) - voice and buffer primitives:
//!   create, upload, queue, unqueue, play, stop, state and error query
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Software mixer, optional cpal output |
//! | Embedded | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! Resource creation returns [`BridgeError`](error::BridgeError). Everything
//! else follows the buffer-queue convention of a sticky error state that the
//! caller polls with [`AudioBackend::last_error`](audio::AudioBackend::last_error).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds so a backend can be shared
//! between a channel manager and an audio rendering thread.

pub mod audio;
pub mod error;

pub use error::BridgeError;

pub use audio::{AudioBackend, BackendErrorCode, BufferId, PcmFormat, VoiceId, VoiceState};
