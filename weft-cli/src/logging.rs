//! CLI logging bootstrap
//!
//! Staged log control on top of `tracing-subscriber`: one filter built
//! from the per-subsystem configuration, one formatting layer per output.

use std::io;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::config::LogConfig;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// Single-line
    Compact,
    /// JSON (tool integration)
    Json,
}

/// Initialize the log system with the given format and configuration.
pub fn init_with_file<P: AsRef<std::path::Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) {
    // Build filter targets
    let targets = Targets::new()
        .with_default(log_config.global)
        .with_target("weft::resolver", log_config.level_for("weft::resolver"))
        .with_target("weft::scanner", log_config.level_for("weft::scanner"))
        .with_target("weft::weaver", log_config.level_for("weft::weaver"))
        .with_target("weft::writer", log_config.level_for("weft::writer"))
        .with_target("weft::cli", log_config.global);

    // If file specified, output to both console and file
    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open log file");

        let stdout_layer = fmt::layer()
            .with_writer(io::stdout)
            .with_filter(targets.clone());

        let file_layer = fmt::layer()
            .with_writer(move || file_handle.try_clone().expect("Failed to clone file handle"))
            .with_filter(targets);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        // Console only
        let stdout_layer = create_format_layer(format, io::stdout).with_filter(targets);
        tracing_subscriber::registry().with(stdout_layer).init();
    }
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
