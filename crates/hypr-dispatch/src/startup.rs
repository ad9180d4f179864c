//! Daemon startup helpers
//!
//! Config discovery, log filter selection and the `--check` report used by
//! the `hypr-dispatchd` binary.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hypr_dispatch_config::{Config, LogLevel};
use tracing_subscriber::EnvFilter;

use crate::hypr_ipc::HyprError;
use crate::loader::HandlerLoader;

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/hypr-dispatch/config.kdl";

/// Load the config file, falling back to defaults when the default file is absent
///
/// `explicit` is the `--config` argument. A path given there must exist;
/// a missing file at `default_path` yields `Config::default()` and no path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn load_config(
    explicit: Option<&str>,
    default_path: &str,
) -> Result<(Config, Option<PathBuf>)> {
    let raw = explicit.unwrap_or(default_path);
    let path: PathBuf = shellexpand::tilde(raw).into_owned().into();

    if explicit.is_none() && !path.exists() {
        return Ok((Config::default(), None));
    }

    let config = hypr_dispatch_config::parse_config(&path)
        .map_err(|e| anyhow::anyhow!("{:?}", miette::Report::new(e)))
        .with_context(|| format!("Invalid configuration file {}", path.display()))?;

    Ok((config, Some(path)))
}

/// Pick the log filter: a valid `RUST_LOG` wins over the configured level
pub fn log_filter(rust_log: Option<&str>, level: LogLevel) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.as_str()))
}

/// Write the `--check` summary to `out`
///
/// # Errors
///
/// Fails when the event socket path cannot be resolved, after the summary
/// has been written.
pub fn write_check(
    out: &mut dyn Write,
    config: &Config,
    config_path: Option<&Path>,
    loader: &HandlerLoader,
    socket_path: Result<PathBuf, HyprError>,
) -> Result<()> {
    writeln!(out, "Configuration is valid!")?;
    match config_path {
        Some(path) => writeln!(out, "  File: {}", path.display())?,
        None => writeln!(out, "  File: none (defaults)")?,
    }
    writeln!(out, "  Log level: {}", config.global.log_level.as_str())?;
    writeln!(
        out,
        "  Reconnect: {} retries, {}ms initial delay, {}ms max delay",
        config.reconnect.max_retries,
        config.reconnect.initial_delay_ms,
        config.reconnect.max_delay_ms
    )?;
    let names = loader.names();
    writeln!(out, "  Handler modules: {}", names.len())?;
    for name in names {
        writeln!(out, "    - {}", name)?;
    }

    match socket_path {
        Ok(path) => {
            writeln!(out, "  Event socket: {}", path.display())?;
            Ok(())
        }
        Err(e) => {
            writeln!(out, "  Event socket: unavailable ({})", e)?;
            Err(e).context("Event socket path could not be resolved")
        }
    }
}
