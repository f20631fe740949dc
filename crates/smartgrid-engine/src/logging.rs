//! Logging bootstrap for hosts embedding SmartGrid
//!
//! The engine itself only emits `tracing` events. Hosts that do not install
//! their own subscriber can call [`init`] to get console output and, when a
//! log directory is configured, a JSON file with daily rotation. `RUST_LOG`
//! overrides the configured filter.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// How events are printed to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStyle {
    Off,
    Compact,
    Pretty,
}

/// Rolling JSON log file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    pub dir: PathBuf,
    /// File name prefix, the date is appended on rotation
    pub prefix: String,
}

impl FileOutput {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "smartgrid.log".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub console: ConsoleStyle,
    pub file: Option<FileOutput>,
    /// Report when grid operation spans open and close
    pub span_timing: bool,
    /// Used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl LoggingConfig {
    /// Pretty console plus a JSON file, engine crates at debug
    pub fn development() -> Self {
        Self {
            console: ConsoleStyle::Pretty,
            file: Some(FileOutput::in_dir(log_directory())),
            span_timing: true,
            filter: "info,smartgrid_engine=debug,smartgrid_settings=debug".to_string(),
        }
    }

    /// JSON file only
    pub fn production() -> Self {
        Self {
            console: ConsoleStyle::Off,
            file: Some(FileOutput::in_dir(log_directory())),
            span_timing: false,
            filter: "warn,smartgrid_engine=info".to_string(),
        }
    }

    pub fn testing() -> Self {
        Self {
            console: ConsoleStyle::Compact,
            file: None,
            span_timing: true,
            filter: "debug".to_string(),
        }
    }

    fn span_events(&self) -> FmtSpan {
        // Async grid operations re-enter their span on every poll, so only
        // creation and close are reported
        if self.span_timing {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.filter))
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(config: &LoggingConfig) -> Option<BoxedLayer> {
    let layer = fmt::layer()
        .with_target(true)
        .with_span_events(config.span_events())
        .with_writer(std::io::stderr);
    match config.console {
        ConsoleStyle::Off => None,
        ConsoleStyle::Compact => Some(layer.compact().with_filter(config.env_filter()).boxed()),
        ConsoleStyle::Pretty => Some(
            layer
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .with_filter(config.env_filter())
                .boxed(),
        ),
    }
}

fn file_layer(config: &LoggingConfig, output: &FileOutput) -> anyhow::Result<BoxedLayer> {
    std::fs::create_dir_all(&output.dir)
        .with_context(|| format!("Failed to create log directory: {:?}", output.dir))?;
    let appender = tracing_appender::rolling::daily(&output.dir, &output.prefix);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    // The worker must keep flushing for as long as the global subscriber lives
    std::mem::forget(guard);

    Ok(fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(config.span_events())
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(config.env_filter())
        .boxed())
}

/// Install the global subscriber described by `config`.
///
/// Fails when a global subscriber is already installed.
pub fn init(config: LoggingConfig) -> anyhow::Result<()> {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    layers.extend(console_layer(&config));
    if let Some(output) = &config.file {
        layers.push(file_layer(&config, output)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("A tracing subscriber is already installed")?;

    tracing::info!(
        console = ?config.console,
        log_dir = ?config.file.as_ref().map(|f| f.dir.display().to_string()),
        "SmartGrid logging ready"
    );
    Ok(())
}

/// `development()` in debug builds, `production()` otherwise
pub fn init_default() -> anyhow::Result<()> {
    if cfg!(debug_assertions) {
        init(LoggingConfig::development())
    } else {
        init(LoggingConfig::production())
    }
}

pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartgrid")
        .join("logs")
}

/// Logs the elapsed time of a pipeline stage when dropped
pub struct TimingGuard {
    stage: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        tracing::trace!(
            stage = self.stage,
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "Stage finished"
        );
    }
}
