mod cli;
mod error_fmt;
#[cfg(target_os = "linux")]
mod rt;
mod stream;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use armrest_core::error::ArmrestError;
use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn config_error(e: impl std::fmt::Display) -> eyre::Report {
    eyre::Report::new(ArmrestError::Config(e.to_string()))
}

/// Read and validate the TOML config; built-in defaults when no path is given.
fn load_config(path: Option<&Path>) -> eyre::Result<armrest_config::Config> {
    let cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| config_error(format!("read {}: {e}", p.display())))?;
            armrest_config::load_toml(&text)
                .map_err(|e| config_error(format!("parse {}: {e}", p.display())))?
        }
        None => armrest_config::Config::default(),
    };
    cfg.validate().map_err(|e| config_error(format!("{e:#}")))?;
    Ok(cfg)
}

fn file_appender(
    path: &str,
    rotation: Option<&str>,
) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    use tracing_appender::rolling;
    let p = Path::new(path);
    let dir = p
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(name) = p.file_name() else {
        eyre::bail!("logging.file {path:?} has no file name");
    };
    Ok(match rotation.unwrap_or("never") {
        "daily" => rolling::daily(dir, name),
        "hourly" => rolling::hourly(dir, name),
        "never" => rolling::never(dir, name),
        other => eyre::bail!("logging.rotation must be never|daily|hourly, got {other:?}"),
    })
}

/// Console logs go to stderr (stdout carries the record stream); optional
/// JSON-lines file output per [logging].
fn init_tracing(
    json: bool,
    level: Option<&str>,
    logging: &armrest_config::Logging,
) -> eyre::Result<()> {
    let level = level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid log level {level:?}"))?;

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match logging.file.as_deref() {
        Some(path) => {
            let appender = file_appender(path, logging.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer).boxed())
        }
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    if let Some(p) = &cli.config {
        tracing::info!(path = %p.display(), "config loaded");
    } else {
        tracing::info!("no --config given; using built-in defaults");
    }

    match cli.cmd {
        Commands::Stream {
            iterations,
            format,
            pace_ms,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let shutdown = Arc::new(AtomicBool::new(false));
            {
                let flag = Arc::clone(&shutdown);
                ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                    .wrap_err("install Ctrl-C handler")?;
            }
            let summary = stream::run_stream(
                &cfg, iterations, format, pace_ms, rt, rt_prio, rt_lock, rt_cpu, shutdown,
            )?;
            tracing::info!(
                iterations = summary.iterations,
                emitted = summary.emitted,
                read_faults = summary.read_faults,
                "stream finished"
            );
        }
        Commands::SelfCheck => stream::self_check(&cfg)?,
        Commands::Calibrate {
            sensitivity,
            known_kg,
            corrected_raw_total,
        } => stream::calibrate(&sensitivity, known_kg, corrected_raw_total)?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: color-eyre not installed: {e}");
    }

    if let Err(err) = run(cli) {
        tracing::error!(error = %format!("{err:#}"), "armrest failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("{}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
