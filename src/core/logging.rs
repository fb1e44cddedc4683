//! Logging Module
//!
//! Provides:
//! - `tracing` subscriber with a daily-rolling JSON file log and a human
//!   stderr layer (the CLI writes documents, not logs, to stdout)
//! - `log` macro bridge, so library code can stay on `log::info!` and friends
//! - Background gzip compression of previous days' logs
//! - miette error reporting tuned to the terminal's capabilities

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flate2::write::GzEncoder;
use flate2::Compression;
use miette::Diagnostic;
use supports_color::Stream;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Base name of the rolling log file
pub const LOG_FILE_NAME: &str = "docweaver.log";

const DEFAULT_FILTER: &str = "info,docweaver=debug";

static TERMINAL_CAPS: OnceLock<TerminalCapabilities> = OnceLock::new();

fn get_terminal_caps() -> &'static TerminalCapabilities {
    TERMINAL_CAPS.get_or_init(TerminalCapabilities::detect)
}

// ============================================================================
// Terminal Capability Detection
// ============================================================================

/// Terminal color support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorLevel {
    TrueColor,
    Ansi256,
    Ansi16,
    NoColor,
}

/// Detected terminal capabilities
#[derive(Debug, Clone)]
pub struct TerminalCapabilities {
    pub color_level: ColorLevel,
    pub supports_unicode: bool,
    pub is_interactive: bool,
}

impl TerminalCapabilities {
    /// Detect capabilities of stderr, where diagnostics go
    pub fn detect() -> Self {
        use is_terminal::IsTerminal;

        let color_level = match supports_color::on(Stream::Stderr) {
            Some(support) if support.has_16m => ColorLevel::TrueColor,
            Some(support) if support.has_256 => ColorLevel::Ansi256,
            Some(support) if support.has_basic => ColorLevel::Ansi16,
            _ => ColorLevel::NoColor,
        };

        let is_interactive = io::stderr().is_terminal();

        let supports_unicode = std::env::var("TERM")
            .map(|t| !t.contains("dumb"))
            .unwrap_or(true)
            && std::env::var("LANG")
                .map(|l| l.contains("UTF-8") || l.contains("utf8"))
                .unwrap_or(true);

        Self {
            color_level,
            supports_unicode,
            is_interactive,
        }
    }

    pub fn should_colorize(&self) -> bool {
        self.is_interactive && self.color_level != ColorLevel::NoColor
    }
}

// ============================================================================
// Logging Initialization
// ============================================================================

/// Default log directory under the platform data dir
pub fn default_log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("docweaver").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Initialize logging with a JSON file layer and a stderr layer.
///
/// Returns a `WorkerGuard` that must be kept alive until exit so buffered
/// file logs are flushed.
pub fn init(log_dir: &Path) -> WorkerGuard {
    init_with(log_dir, true)
}

/// Like [`init()`] but file-only, for scripted runs that want a clean stderr.
pub fn init_quiet(log_dir: &Path) -> WorkerGuard {
    init_with(log_dir, false)
}

fn init_with(log_dir: &Path, stderr: bool) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    let stderr_layer = stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_ansi(get_terminal_caps().should_colorize())
            .with_filter(env_filter)
    });

    let registry = tracing_subscriber::registry().with(file_layer).with(stderr_layer);
    if let Err(e) = registry.try_init() {
        eprintln!("Logging already initialized: {}", e);
    }

    // Usually installed by try_init already; only fails in that case
    let _ = tracing_log::LogTracer::init();

    init_miette();

    let log_dir_owned = log_dir.to_path_buf();
    std::thread::spawn(move || {
        compress_old_logs(&log_dir_owned);
    });

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_NAME)
    );

    guard
}

/// Whether a file in the log dir is a finished day's log awaiting compression
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(&format!("{}.", LOG_FILE_NAME))
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

/// Compress previous days' logs
fn compress_old_logs(log_dir: &Path) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !should_compress(name, &today_suffix) {
            continue;
        }
        match compress_file(&path) {
            Ok(()) => log::info!("Compressed old log: {:?}", path),
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
}

fn compress_file(path: &Path) -> io::Result<()> {
    let file = fs::File::open(path)?;
    let mut reader = io::BufReader::new(file);

    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    if gz_path.exists() {
        return Ok(());
    }

    let output = fs::File::create(&gz_path)?;
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(())
}

fn init_miette() {
    let caps = get_terminal_caps();

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(caps.color_level == ColorLevel::TrueColor)
                .unicode(caps.supports_unicode)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(caps.should_colorize())
                .build(),
        )
    }))
    .ok(); // Ignore if already set
}

// ============================================================================
// Diagnostic Error Types (miette integration)
// ============================================================================

/// Generation failed on every provider
#[derive(Debug, Error, Diagnostic)]
#[error("Generation failed: {message}")]
#[diagnostic(code("DOCWEAVER::GENERATION_ERROR"))]
pub struct GenerationDiagnostic {
    pub message: String,

    #[help]
    pub recovery_hint: Option<String>,
}

impl GenerationDiagnostic {
    pub fn new(message: impl Into<String>, last_provider: Option<&str>) -> Self {
        Self {
            message: message.into(),
            recovery_hint: last_provider.map(|p| {
                format!(
                    "Last attempt was {}. Check its API key, or add another provider to the chain",
                    p
                )
            }),
        }
    }
}

/// A template that could not be read as DOCX
#[derive(Debug, Error, Diagnostic)]
#[error("Cannot use template {filename}: {reason}")]
#[diagnostic(
    code("DOCWEAVER::TEMPLATE_ERROR"),
    help("Templates must be .docx files saved by a word processor")
)]
pub struct TemplateDiagnostic {
    pub filename: String,
    pub reason: String,
}

impl TemplateDiagnostic {
    pub fn new(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}
