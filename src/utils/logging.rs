//! Logging setup

use env_logger::{Builder, Env};

/// Initialises `env_logger`. `RUST_LOG` wins over `level` when set. Calling
/// it twice is harmless.
pub fn init_logging(level: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init_logging("debug");
        init_logging("info");
        log::info!("logging initialised");
    }
}
