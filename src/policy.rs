//! Process-wide serialization policy
//!
//! Two flags decide how models serialize when an instance carries no
//! override of its own. The global value is read on every serialization call,
//! never snapshotted at cast time. A write racing a concurrent serialization
//! may be observed old or new by that call; instance overrides are the way to
//! get deterministic output under concurrent reconfiguration.

use std::sync::atomic::{AtomicBool, Ordering};

/// Serialization flags shared by every model without an override
#[derive(Debug)]
pub struct PolicyConfig {
    serialize_unknown_attributes: AtomicBool,
    serialize_enums_using_as_json: AtomicBool,
}

impl PolicyConfig {
    /// Baseline for both flags in a fresh process
    pub const DEFAULT_FLAG: bool = true;

    #[must_use]
    pub const fn new(serialize_unknown_attributes: bool, serialize_enums_using_as_json: bool) -> Self {
        Self {
            serialize_unknown_attributes: AtomicBool::new(serialize_unknown_attributes),
            serialize_enums_using_as_json: AtomicBool::new(serialize_enums_using_as_json),
        }
    }

    /// Whether unknown attributes are appended to serialized output
    #[must_use]
    pub fn serialize_unknown_attributes(&self) -> bool {
        self.serialize_unknown_attributes.load(Ordering::Relaxed)
    }

    pub fn set_serialize_unknown_attributes(&self, enabled: bool) {
        self.serialize_unknown_attributes.store(enabled, Ordering::Relaxed);
    }

    /// Whether enums serialize as their display label instead of the backing value
    #[must_use]
    pub fn serialize_enums_using_as_json(&self) -> bool {
        self.serialize_enums_using_as_json.load(Ordering::Relaxed)
    }

    pub fn set_serialize_enums_using_as_json(&self, enabled: bool) {
        self.serialize_enums_using_as_json.store(enabled, Ordering::Relaxed);
    }

    /// Restore both flags to the baseline
    pub fn reset(&self) {
        self.set_serialize_unknown_attributes(Self::DEFAULT_FLAG);
        self.set_serialize_enums_using_as_json(Self::DEFAULT_FLAG);
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FLAG, Self::DEFAULT_FLAG)
    }
}

static POLICY: PolicyConfig = PolicyConfig::new(PolicyConfig::DEFAULT_FLAG, PolicyConfig::DEFAULT_FLAG);

/// The process-wide policy
pub fn policy() -> &'static PolicyConfig {
    &POLICY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match() {
        let config = PolicyConfig::default();
        assert_eq!(
            config.serialize_unknown_attributes(),
            config.serialize_enums_using_as_json()
        );
        assert!(config.serialize_unknown_attributes());
    }

    #[test]
    fn test_flags_are_independent() {
        let config = PolicyConfig::default();
        config.set_serialize_enums_using_as_json(false);
        assert!(config.serialize_unknown_attributes());
        assert!(!config.serialize_enums_using_as_json());

        config.reset();
        assert!(config.serialize_enums_using_as_json());
    }
}
