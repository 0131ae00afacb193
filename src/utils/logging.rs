use std::{path::Path, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::MakeWriterExt},
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "workclock";
const DEFAULT_LEVEL: &str = "info";

/// `--log-filter` wins over `RUST_LOG`. Only this crate's events are kept, dependencies stay quiet.
fn filter_directive(log_level: Option<LevelFilter>, env_level: Option<String>) -> String {
    let level = log_level
        .map(|v| v.to_string())
        .or(env_level.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_LEVEL.into());
    format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"))
}

/// Logs always go into rotating files under `state_dir/logs`. Stdout is reserved for reports, so
/// the console copy goes to stderr and only when asked for.
pub fn enable_logging(
    state_dir: &Path,
    log_level: Option<LevelFilter>,
    to_stderr: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(state_dir.join("logs"))?;

    let stderr = std::io::stderr.with_filter(move |_| to_stderr);
    let filter = EnvFilter::try_new(filter_directive(
        log_level,
        std::env::var("RUST_LOG").ok(),
    ))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stderr.and(appender))
        .with_ansi(false)
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
