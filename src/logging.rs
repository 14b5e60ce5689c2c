use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Resolve the log level: explicit argument, then `RUST_LOG`, then `info`
pub fn resolve_level(level: Option<&str>) -> LevelFilter {
    level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info)
}

/// Install the process logger. Later calls are ignored, so a host that loads
/// the library more than once keeps its first configuration. Returns whether
/// this call installed it.
pub fn init_logging(level: Option<&str>) -> bool {
    let log_level = resolve_level(level);
    let installed = env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:5} aoa_sweep] {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .is_ok();
    if installed {
        log::debug!("logger initialized (level: {})", log_level);
    }
    installed
}
