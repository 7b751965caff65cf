//! Configuration of serialization defaults
//!
//! The engine itself only reads the process-wide [`PolicyConfig`]. This module
//! lets an integrator describe the defaults declaratively and apply them once
//! at startup.
//!
//! ## Example config file (store_models.toml):
//! ```toml
//! [policy]
//! serialize_unknown_attributes = false
//! serialize_enums_using_as_json = true
//! ```
//!
//! [`PolicyConfig`]: crate::policy::PolicyConfig

use config_crate::{Config, ConfigError, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::policy::{self, PolicyConfig};

/// Main configuration for model serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StoreModelConfig {
    /// Serialization policy defaults
    #[serde(default)]
    pub policy: PolicySettings,
}

/// Policy defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    /// Append unknown attributes to serialized output
    #[serde(default = "default_flag")]
    pub serialize_unknown_attributes: bool,

    /// Serialize enums as their display label rather than the backing value
    #[serde(default = "default_flag")]
    pub serialize_enums_using_as_json: bool,
}

fn default_flag() -> bool {
    PolicyConfig::DEFAULT_FLAG
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            serialize_unknown_attributes: default_flag(),
            serialize_enums_using_as_json: default_flag(),
        }
    }
}

impl PolicySettings {
    /// Snapshot the process-wide policy
    pub fn current() -> Self {
        Self::from_policy(policy::policy())
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self {
            serialize_unknown_attributes: policy.serialize_unknown_attributes(),
            serialize_enums_using_as_json: policy.serialize_enums_using_as_json(),
        }
    }

    /// Write these settings into `policy`
    pub fn apply_to(&self, policy: &PolicyConfig) {
        policy.set_serialize_unknown_attributes(self.serialize_unknown_attributes);
        policy.set_serialize_enums_using_as_json(self.serialize_enums_using_as_json);
    }
}

impl StoreModelConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Make these settings the process-wide policy
    pub fn apply(&self) {
        tracing::debug!(
            serialize_unknown_attributes = self.policy.serialize_unknown_attributes,
            serialize_enums_using_as_json = self.policy.serialize_enums_using_as_json,
            "applying serialization policy"
        );
        self.policy.apply_to(policy::policy());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreModelConfig::default();
        assert!(config.policy.serialize_unknown_attributes);
        assert!(config.policy.serialize_enums_using_as_json);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StoreModelConfig::from_toml_str(
            "[policy]\nserialize_unknown_attributes = false\n",
        )
        .unwrap();
        assert!(!config.policy.serialize_unknown_attributes);
        assert!(config.policy.serialize_enums_using_as_json);

        let empty = StoreModelConfig::from_toml_str("").unwrap();
        assert_eq!(empty, StoreModelConfig::default());
    }

    #[test]
    fn test_serialize_config() {
        let config = StoreModelConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("[policy]"));
        assert_eq!(StoreModelConfig::from_toml_str(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_apply_to_explicit_policy() {
        let target = PolicyConfig::default();
        let settings = PolicySettings {
            serialize_unknown_attributes: false,
            serialize_enums_using_as_json: true,
        };
        settings.apply_to(&target);
        assert_eq!(PolicySettings::from_policy(&target), settings);
    }
}
