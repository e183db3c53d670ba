//! Store configuration.
//!
//! Configuration can be built in code, parsed from JSON, or read from the
//! environment:
//!
//! | variable | field |
//! |---|---|
//! | `SECURESTORE_SERVICE` | `service` |
//! | `SECURESTORE_NAMESPACE` | `namespace` |
//! | `SECURESTORE_SEPARATOR` | `separator` |
//! | `SECURESTORE_FALLBACK_ONLY` | `fallback_only` |
//! | `SECURESTORE_REQUIRE_AUTH` | `item_options.require_authentication` |

use serde::{Deserialize, Serialize};

use crate::backend::{validate_key, ItemOptions, PlatformBackend};
use crate::errors::StoreError;

/// Separator between namespace and key.
pub const DEFAULT_SEPARATOR: &str = ":";

/// Keychain service used when none is configured.
pub const DEFAULT_SERVICE: &str = "securestore";

/// Configuration for a [`SecureStore`](crate::SecureStore) and its platform backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Keychain service grouping the items.
    #[serde(default = "default_service")]
    pub service: String,

    /// Namespace prefixed to every key.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Separator between namespace and key.
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Skip native storage and keep items in process memory.
    #[serde(default)]
    pub fallback_only: bool,

    /// Options passed to the backend on every call.
    #[serde(default)]
    pub item_options: ItemOptions,
}

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            service: default_service(),
            namespace: None,
            separator: default_separator(),
            fallback_only: false,
            item_options: ItemOptions::default(),
        }
    }
}

impl StoreConfig {
    /// Create a configuration for the given keychain service.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from `SECURESTORE_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparseable booleans are errors.
    pub fn from_env() -> Result<Self, StoreError> {
        let mut config = Self::default();

        if let Ok(service) = std::env::var("SECURESTORE_SERVICE") {
            config = config.with_service(service);
        }

        if let Ok(namespace) = std::env::var("SECURESTORE_NAMESPACE") {
            config = config.with_namespace(namespace);
        }

        if let Ok(separator) = std::env::var("SECURESTORE_SEPARATOR") {
            config = config.with_separator(separator);
        }

        if let Ok(flag) = std::env::var("SECURESTORE_FALLBACK_ONLY") {
            config.fallback_only = parse_flag("SECURESTORE_FALLBACK_ONLY", &flag)?;
        }

        if let Ok(flag) = std::env::var("SECURESTORE_REQUIRE_AUTH") {
            config.item_options.require_authentication =
                parse_flag("SECURESTORE_REQUIRE_AUTH", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the keychain service.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Set the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the namespace separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Keep items in process memory only.
    pub fn with_fallback_only(mut self) -> Self {
        self.fallback_only = true;
        self
    }

    /// Set the backend options used on every call.
    pub fn with_item_options(mut self, options: ItemOptions) -> Self {
        self.item_options = options;
        self
    }

    /// Check the configuration for values no store can work with.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.service.is_empty() {
            return Err(StoreError::config("service must not be empty"));
        }
        if self.separator.is_empty() {
            return Err(StoreError::config("separator must not be empty"));
        }
        if validate_key(&self.separator).is_err() {
            return Err(StoreError::config(format!(
                "separator '{}' contains characters not allowed in keys",
                self.separator
            )));
        }
        if let Some(namespace) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            if validate_key(namespace).is_err() {
                return Err(StoreError::config(format!(
                    "namespace '{}' contains characters not allowed in keys",
                    namespace
                )));
            }
        }
        Ok(())
    }

    /// Build the platform backend this configuration describes.
    pub fn platform_backend(&self) -> PlatformBackend {
        let backend = PlatformBackend::new(self.service.clone());
        if self.fallback_only {
            backend.with_fallback_only()
        } else {
            backend
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, StoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(StoreError::config(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.service, "securestore");
        assert_eq!(config.separator, ":");
        assert_eq!(config.namespace, None);
        assert!(!config.fallback_only);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            StoreConfig::from_json_str(r#"{"namespace":"wallet","fallback_only":true}"#).unwrap();
        assert_eq!(config.service, "securestore");
        assert_eq!(config.namespace.as_deref(), Some("wallet"));
        assert!(config.fallback_only);
        assert!(!config.platform_backend().uses_native());
    }

    #[test]
    fn test_from_json_with_item_options() {
        let config = StoreConfig::from_json_str(
            r#"{"service":"com.example","item_options":{"require_authentication":true}}"#,
        )
        .unwrap();
        assert!(config.item_options.require_authentication);
        assert_eq!(config.platform_backend().service(), "com.example");
    }

    #[test]
    fn test_rejects_empty_separator() {
        let err = StoreConfig::from_json_str(r#"{"separator":""}"#).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_rejects_separator_outside_key_alphabet() {
        let err = StoreConfig::new("app").with_separator("/").validate().unwrap_err();
        assert!(err.to_string().contains("not allowed in keys"));
    }

    #[test]
    fn test_rejects_namespace_outside_key_alphabet() {
        let err = StoreConfig::from_json_str(r#"{"namespace":"my app"}"#).unwrap_err();
        assert!(err.to_string().contains("namespace 'my app'"));

        // Empty means no namespace.
        assert!(StoreConfig::new("app").with_namespace("").validate().is_ok());
        assert!(StoreConfig::new("app").with_namespace("my-app.v2").validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = StoreConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new("com.example.app")
            .with_namespace("session")
            .with_separator(".")
            .with_fallback_only()
            .with_item_options(ItemOptions::new().with_prompt("Unlock"));

        assert_eq!(config.service, "com.example.app");
        assert_eq!(config.namespace.as_deref(), Some("session"));
        assert_eq!(config.separator, ".");
        assert!(config.fallback_only);
        assert_eq!(
            config.item_options.authentication_prompt.as_deref(),
            Some("Unlock")
        );
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(parse_flag("X", "1").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
