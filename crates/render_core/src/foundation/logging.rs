//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with the default filter
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system
///
/// `RUST_LOG` wins when it is set; otherwise `level` (e.g. `"info"`,
/// `"debug"`) becomes the default filter. Calling this twice is harmless.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}
