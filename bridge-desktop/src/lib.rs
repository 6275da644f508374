//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides the desktop audio backend:
//! - `SoftwareBackend` - in-process voice/buffer queue with a software mixer
//! - `CpalOutput` - drives the software mixer from the default output device
//!
//! ## Feature Flags
//!
//! - `cpal-output`: Enable the `cpal` device driver (off by default so headless
//!   builds do not need system audio libraries)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{CpalOutput, SoftwareBackend};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(SoftwareBackend::new());
//! let _output = CpalOutput::start(Arc::clone(&backend))?;
//!
//! // Hand `backend` to the streaming core as `Arc<dyn AudioBackend>`
//! ```

mod software;

#[cfg(feature = "cpal-output")]
mod cpal_output;

pub use software::SoftwareBackend;

#[cfg(feature = "cpal-output")]
pub use cpal_output::CpalOutput;
