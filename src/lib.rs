//! Workspace umbrella crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-playback`). Host applications can depend on
//! `pcm-stream-workspace` and enable the documented features without wiring
//! each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "decoder")]
pub use core_playback as playback;
