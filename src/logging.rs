//! Logger setup for binaries and demos

use std::sync::Once;

/// Logger configuration
///
/// `filter` uses the `env_logger` filter syntax, e.g. `"info"` or
/// `"thistle=debug,winit=warn"`. Without one, `RUST_LOG` is consulted and
/// then `info` is used.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

static INIT: Once = Once::new();

/// Installs the global logger; later calls do nothing
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match config.filter {
            Some(filter) => {
                builder.parse_filters(&filter);
            }
            None => match std::env::var("RUST_LOG") {
                Ok(filter) => {
                    builder.parse_filters(&filter);
                }
                Err(_) => {
                    builder.filter_level(log::LevelFilter::Info);
                }
            },
        }

        builder.write_style(config.write_style);
        // Tests may already have installed a logger
        if builder.try_init().is_ok() {
            log::debug!("Logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging(LoggingConfig::default().with_filter("thistle=trace"));
        init_logging(LoggingConfig::default());
        assert!(INIT.is_completed());
    }
}
