//! CLI configuration via environment variables
//!
//! Settings that only affect how htask presents itself. Build settings live
//! in `hpipe_config` so library users see the same precedence rules.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Disable colored output (HPIPE_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Log filter (HPIPE_LOG), in env_logger syntax
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("HPIPE_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            log_filter: env::var("HPIPE_LOG").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// Log filter to use: HPIPE_LOG wins, otherwise `debug` when verbose
    pub fn log_filter(&self, verbose: bool) -> &str {
        match (&self.log_filter, verbose) {
            (Some(filter), _) => filter.as_str(),
            (None, true) => "debug",
            (None, false) => "warn",
        }
    }

    /// Install the global logger
    pub fn init_logging(&self, verbose: bool) {
        env_logger::Builder::new()
            .parse_filters(self.log_filter(verbose))
            .format_timestamp(None)
            .init();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
