//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use core_runtime::logging::{init_logging, strip_path, LogFormat, LogLevel, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, span, trace, warn, Level};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    let span = span!(Level::INFO, "channel", id = 0);
    let _enter = span.enter();

    info!(file = %strip_path("/srv/audio/music/theme.ogg"), "Opening clip");
    prime_buffers(4);
    warn!("Voice stopped unexpectedly, restarting");
    info!("Demo complete");
}

#[instrument]
fn prime_buffers(count: usize) {
    for index in 0..count {
        trace!(index, "Uploading buffer");
    }
    debug!(count, "Buffers primed");
}
