use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name (`DEBUG`, `INFO`, `WARNING`, `ERROR`) to an
/// [`EnvFilter`] directive.
///
/// With `cap_to_error` set the result is never more verbose than `error`;
/// the dashboard view uses this so log lines do not tear the TUI.
pub fn filter_directive(log_level: &str, cap_to_error: bool) -> &'static str {
    if cap_to_error {
        return "error";
    }
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Logs go to `log_file` (appended, no ANSI colours) when given, otherwise to
/// stderr. `tui_owns_screen` caps stderr output at `error`; it has no effect
/// when logging to a file.
pub fn setup_logging(
    log_level: &str,
    log_file: Option<&Path>,
    tui_owns_screen: bool,
) -> anyhow::Result<()> {
    let file = log_file
        .map(|path| OpenOptions::new().create(true).append(true).open(path))
        .transpose()?;

    let directive = filter_directive(log_level, tui_owns_screen && file.is_none());
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = file.map(|f| {
        fmt::layer()
            .with_writer(Mutex::new(f))
            .with_ansi(false)
            .with_target(false)
    });
    let stderr_layer = if file_layer.is_none() {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
