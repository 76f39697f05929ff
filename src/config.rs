//! Configuration Module
//!
//! Handles loading cache and demo settings from environment variables.

use std::env;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds used by `ObjectCache::add_default`
    pub default_ttl: u64,
    /// Number of objects the demo binary pushes through the cache
    pub demo_objects: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3, zero is ignored)
    /// - `DEMO_OBJECTS` - Objects inserted by the demo (default: 3)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.default_ttl),
            demo_objects: env::var("DEMO_OBJECTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.demo_objects),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 3,
            demo_objects: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 3);
        assert_eq!(config.demo_objects, 3);
    }

    #[test]
    fn test_config_from_env() {
        // Both variables are handled in one test to avoid racing on the process env
        env::remove_var("DEFAULT_TTL");
        env::remove_var("DEMO_OBJECTS");
        let config = Config::from_env();
        assert_eq!(config.default_ttl, 3);
        assert_eq!(config.demo_objects, 3);

        env::set_var("DEFAULT_TTL", "0");
        env::set_var("DEMO_OBJECTS", "7");
        let config = Config::from_env();
        assert_eq!(config.default_ttl, 3);
        assert_eq!(config.demo_objects, 7);

        env::remove_var("DEFAULT_TTL");
        env::remove_var("DEMO_OBJECTS");
    }
}
