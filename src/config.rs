use std::env;

use once_cell::sync::Lazy;

/// Environment variable overriding [`Config::alloc_limit`].
pub const ALLOC_LIMIT_VAR: &str = "BYTE_SOURCE_ALLOC_LIMIT";

const GIGABYTE: usize = 1024 * 1024 * 1024;

/// Default upper bound for a single buffer handed out by
/// [`crate::alloc::byte_array`].
pub const DEFAULT_ALLOC_LIMIT: usize = GIGABYTE;

static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Process-wide settings, resolved once on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Largest buffer, in bytes, a range read may allocate.
    pub alloc_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alloc_limit: DEFAULT_ALLOC_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = env::var(ALLOC_LIMIT_VAR) {
            match parse_limit(&value) {
                Some(limit) => config.alloc_limit = limit,
                None => log::warn!(
                    "byte-source: ignoring {}={:?}, expected a byte count",
                    ALLOC_LIMIT_VAR,
                    value
                ),
            }
        }
        log::debug!("byte-source: {:?}", config);
        config
    }
}

fn parse_limit(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

/// Returns the shared configuration.
pub fn get() -> &'static Config {
    &CONFIG
}
