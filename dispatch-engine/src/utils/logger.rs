//! Logging Infrastructure
//!
//! - Console output: pretty in development, JSON in production
//! - Daily rotating application logs (deleted after 14 days)
//! - Permanent audit logs (`target: "audit"`, never deleted)

use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::Subscriber;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter::filter_fn, fmt, prelude::*};

/// 应用日志保留天数
const APP_LOG_RETENTION_DAYS: i64 = 14;
/// Cleanup interval
const CLEANUP_INTERVAL_SECS: u64 = 3600;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Clean up application log files older than 14 days
///
/// Only `app/app.YYYY-MM-DD` style files are touched; audit logs are kept.
pub fn cleanup_old_logs(log_dir: &Path) -> anyhow::Result<usize> {
    let cutoff = chrono::Local::now().date_naive() - chrono::Duration::days(APP_LOG_RETENTION_DAYS);

    let app_log_dir = log_dir.join("app");
    if !app_log_dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(app_log_dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(date) = log_file_date(name) else {
            continue;
        };
        if date < cutoff {
            fs::remove_file(&path)?;
            removed += 1;
            tracing::info!(file = %name, "Deleted old log file");
        }
    }

    Ok(removed)
}

/// `app.2026-01-31` (tracing-appender) or `app-2026-01-31.log`
fn log_file_date(name: &str) -> Option<chrono::NaiveDate> {
    let rest = name.strip_prefix("app")?;
    let rest = rest.strip_prefix('.').or_else(|| rest.strip_prefix('-'))?;
    let date_part = rest.strip_suffix(".log").unwrap_or(rest);
    chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn console_layer<S>(level: &str, json_format: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(EnvFilter::new(level))
            .boxed()
    }
}

/// One rolling file layer, restricted to events `keep` accepts
fn file_layer<S>(
    dir: PathBuf,
    prefix: &str,
    json_format: bool,
    keep: fn(&str) -> bool,
) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let appender = RollingFileAppender::new(Rotation::DAILY, dir, prefix);
    let filter = filter_fn(move |meta| keep(meta.target()));

    if json_format {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(appender))
            .with_filter(filter)
            .boxed()
    }
}

/// Initialize the logging system with daily rotating logs
///
/// # Arguments
/// * `level` - Log level (e.g., "info", "debug"); `RUST_LOG` wins when set
/// * `json_format` - JSON output (production) or pretty output (development)
/// * `log_dir` - Optional directory for file logging; pair with [`periodic_cleanup`]
pub fn init_logger_with_file(
    level: &str,
    json_format: bool,
    log_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers = vec![console_layer(level, json_format)];

    if let Some(log_dir) = log_dir {
        let app_log_dir = log_dir.join("app");
        let audit_log_dir = log_dir.join("audit");
        fs::create_dir_all(&app_log_dir)?;
        fs::create_dir_all(&audit_log_dir)?;

        // 业务日志 (非 audit)，14 天后清理
        layers.push(file_layer(app_log_dir, "app", json_format, |target| {
            target != "audit"
        }));
        // 审计日志，永久保留
        layers.push(file_layer(audit_log_dir, "audit", json_format, |target| {
            target == "audit"
        }));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()?;

    Ok(())
}

/// Initialize console-only logging
pub fn init_logger(level: &str, json_format: bool) -> anyhow::Result<()> {
    init_logger_with_file(level, json_format, None)
}

/// Periodic cleanup task - runs at start, then every hour until `shutdown`
pub async fn periodic_cleanup(log_dir: PathBuf, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(CLEANUP_INTERVAL_SECS));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                match cleanup_old_logs(&log_dir) {
                    Ok(0) => {}
                    Ok(removed) => tracing::info!(removed, "Old log files cleaned up"),
                    Err(e) => tracing::error!(error = %e, "Failed to cleanup old logs"),
                }
            }
        }
    }
}
