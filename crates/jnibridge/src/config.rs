//! Bridge configuration
//!
//! Settings that apply to an [`Env`](crate::Env) for its whole life. They can
//! be built in code, parsed from TOML, or read from the process environment.
//!
//! ```toml
//! exception_handler = "structured"
//! local_frame_capacity = 32
//! class_cache = true
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{BridgeError, BridgeResult};
use crate::exception::ExceptionStrategy;

/// Environment variable naming the exception handler
pub const EXCEPTION_HANDLER_VAR: &str = "JNIBRIDGE_EXCEPTION_HANDLER";

/// Environment variable holding the default local frame capacity
pub const LOCAL_FRAME_CAPACITY_VAR: &str = "JNIBRIDGE_LOCAL_FRAME_CAPACITY";

fn default_local_frame_capacity() -> i32 {
    16
}

fn default_class_cache() -> bool {
    true
}

/// Settings applied by [`Env::with_config`](crate::Env::with_config)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Handler installed when the environment is created
    pub exception_handler: ExceptionStrategy,

    /// Capacity for local frames pushed without an explicit one
    #[serde(default = "default_local_frame_capacity")]
    pub local_frame_capacity: i32,

    /// Memoize class lookups as global references
    #[serde(default = "default_class_cache")]
    pub class_cache: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            exception_handler: ExceptionStrategy::default(),
            local_frame_capacity: default_local_frame_capacity(),
            class_cache: default_class_cache(),
        }
    }
}

impl BridgeConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> BridgeResult<Self> {
        let config: BridgeConfig =
            toml::from_str(content).map_err(|e| BridgeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> BridgeResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `JNIBRIDGE_*` environment variables
    pub fn from_env() -> BridgeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BridgeResult<Self> {
        let mut config = BridgeConfig::default();
        if let Some(handler) = lookup(EXCEPTION_HANDLER_VAR) {
            config.exception_handler = handler.parse()?;
        }
        if let Some(capacity) = lookup(LOCAL_FRAME_CAPACITY_VAR) {
            config.local_frame_capacity = capacity.trim().parse().map_err(|_| {
                BridgeError::Config(format!(
                    "{LOCAL_FRAME_CAPACITY_VAR} is not an integer: '{capacity}'"
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.local_frame_capacity <= 0 {
            return Err(BridgeError::Config(format!(
                "local_frame_capacity must be positive, got {}",
                self.local_frame_capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.exception_handler, ExceptionStrategy::Describe);
        assert_eq!(config.local_frame_capacity, 16);
        assert!(config.class_cache);
        assert_eq!(BridgeConfig::from_toml_str("").unwrap(), config);
    }

    #[test]
    fn test_toml_overrides() {
        let config = BridgeConfig::from_toml_str(
            r#"
            exception_handler = "tostring"
            local_frame_capacity = 64
            class_cache = false
            "#,
        )
        .unwrap();
        assert_eq!(config.exception_handler, ExceptionStrategy::ToString);
        assert_eq!(config.local_frame_capacity, 64);
        assert!(!config.class_cache);
    }

    #[test]
    fn test_toml_rejects_bad_values() {
        assert!(matches!(
            BridgeConfig::from_toml_str("exception_handler = \"loud\""),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("local_frame_capacity = 0"),
            Err(BridgeError::Config(_))
        ));
        assert!(matches!(
            BridgeConfig::from_toml_str("frames = 3"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_lookup() {
        let config = BridgeConfig::from_lookup(|key| match key {
            EXCEPTION_HANDLER_VAR => Some("Structured".to_string()),
            LOCAL_FRAME_CAPACITY_VAR => Some(" 8 ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.exception_handler, ExceptionStrategy::Structured);
        assert_eq!(config.local_frame_capacity, 8);

        let err = BridgeConfig::from_lookup(|key| {
            (key == LOCAL_FRAME_CAPACITY_VAR).then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jnibridge.toml");
        std::fs::write(&path, "exception_handler = \"structured\"\n").unwrap();
        let config = BridgeConfig::from_file(&path).unwrap();
        assert_eq!(config.exception_handler, ExceptionStrategy::Structured);
        assert!(config.class_cache);
    }

    #[test]
    fn test_from_missing_file() {
        let err = BridgeConfig::from_file(Path::new("/nonexistent/jnibridge.toml")).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
