//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the streaming core:
//! - Logging and tracing bootstrap
//! - Runtime error type
//!
//! ## Overview
//!
//! The playback crates only emit `tracing` events. This crate decides where
//! those events go, so hosts and demos share one logging setup.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
