//! Environment variable lookup.

use std::collections::HashMap;

/// Somewhere to read environment variables from.
///
/// Production code uses [`ProcessEnv`]; tests pass a `HashMap` so they
/// can run in parallel without mutating the real environment.
pub trait EnvSource: Send + Sync {
    /// Returns the value of `key`, or `None` if it isn't set.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads from the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_env_source() {
        let env = HashMap::from([("A".to_string(), "1".to_string())]);
        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("B"), None);
    }

    #[test]
    fn test_process_env_missing_var() {
        assert_eq!(ProcessEnv.var("HOSTLINK_SURELY_NOT_SET_4F1C"), None);
    }
}
