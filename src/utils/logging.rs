//! Console logging for the server and the console tools.
//!
//! Lines look like `2026-10-18 14:03:22.417 WARN  detection::deauth - ...`:
//! millisecond local time, padded level, and the module path without the
//! crate prefix.

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

const CRATE_PREFIX: &str = concat!(env!("CARGO_PKG_NAME"), "::");

/// Web server modules that are chatty at info level
const QUIET_MODULES: &[&str] = &["actix_server", "actix_web", "actix_http"];

/// Initialize the logger at `level`.
///
/// `RUST_LOG` directives are applied last, so they can still raise or lower
/// individual modules.
pub fn init_logger(level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                short_target(record.target()),
                record.args()
            )
        })
        .filter_level(level);

    for module in QUIET_MODULES {
        builder.filter_module(module, level.min(LevelFilter::Warn));
    }

    builder.parse_default_env().init();
}

/// Module path relative to this crate; foreign targets are left alone
fn short_target(target: &str) -> &str {
    target.strip_prefix(CRATE_PREFIX).unwrap_or(target)
}

/// Parse a `--log-level` value, falling back to info
pub fn get_log_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}
