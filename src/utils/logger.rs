use bson::Bson;
use log::LevelFilter;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

/// Log target for write audits.
pub const AUDIT_TARGET: &str = "chatmodels::audit";

/// Log target for developer traces emitted by [`model_trace!`](crate::model_trace).
pub const TRACE_TARGET: &str = "chatmodels::trace";

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, Box<dyn std::error::Error>> {
    let roller = FixedWindowRoller::builder().build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    Ok(RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))?)
}

/// Configure process-wide logging: `app.log` for everything, `audit.log` for
/// write audits. Optionally routes `model_trace!` lines to `trace.log`.
/// - dir: base directory for logs; if None, current directory.
/// - level: off|error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// # Errors
/// Returns an error if an appender cannot be built or a logger is already installed.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<u32>,
    enable_trace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = retention.unwrap_or(7);
    let lvl = parse_level(level);

    let mut builder = Config::builder()
        .appender(Appender::builder().build("app", Box::new(rolling(&base, "app", keep)?)))
        .appender(Appender::builder().build("audit", Box::new(rolling(&base, "audit", keep)?)))
        .logger(Logger::builder().appender("audit").additive(false).build(AUDIT_TARGET, lvl));
    builder = if enable_trace {
        builder
            .appender(Appender::builder().build("trace", Box::new(rolling(&base, "trace", keep)?)))
            .logger(Logger::builder().appender("trace").additive(false).build(TRACE_TARGET, LevelFilter::Trace))
    } else {
        builder.logger(Logger::builder().additive(false).build(TRACE_TARGET, LevelFilter::Off))
    };
    let config = builder.build(Root::builder().appender("app").build(lvl))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// Configure logging from environment variables if present:
/// - CHATMODELS_LOG_DIR
/// - CHATMODELS_LOG_LEVEL
/// - CHATMODELS_LOG_RETENTION
/// - CHATMODELS_TRACE
///
/// # Errors
/// See [`configure_logging`].
pub fn configure_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::var("CHATMODELS_LOG_DIR").ok().map(PathBuf::from);
    let level = std::env::var("CHATMODELS_LOG_LEVEL").ok();
    let retention = std::env::var("CHATMODELS_LOG_RETENTION").ok().and_then(|s| s.parse::<u32>().ok());
    let trace_enabled = std::env::var("CHATMODELS_TRACE")
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    configure_logging(dir.as_deref(), level.as_deref(), retention, trace_enabled)
}

/// Records a write against `collection` as one JSON line on [`AUDIT_TARGET`].
pub fn log_audit(op: &str, collection: &str, id: &Bson) {
    let line = serde_json::json!({
        "ts": chrono::Utc::now().to_rfc3339(),
        "op": op,
        "collection": collection,
        "id": id.clone().into_relaxed_extjson(),
    })
    .to_string();
    super::devlog::record(&line);
    log::info!(target: AUDIT_TARGET, "{line}");
}
