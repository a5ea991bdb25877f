//! Conversion defaults and per-call conversion inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use startosis_core::{Result, ScriptDuration};

use crate::records::ImageDownloadMode;
use crate::resolver::{PackageContentProvider, STANDALONE_PACKAGE_ID};

/// Defaults applied when converting composite values into engine records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeDefaults {
    /// Substituted into service config strings with the service's IP.
    pub private_ip_address_placeholder: String,

    /// Readiness check interval when none is given.
    #[serde(with = "duration_text")]
    pub ready_interval: ScriptDuration,

    /// Readiness check timeout when none is given.
    #[serde(with = "duration_text")]
    pub ready_timeout: ScriptDuration,

    pub tini_enabled: bool,

    /// Build file looked up inside an image build context.
    pub build_file_name: String,

    pub nix_flake_file: String,

    /// Size of a persistent directory when none is given.
    pub persistent_directory_size_mb: u64,

    pub min_memory_allocation_mb: u64,

    /// Content type of POST recipes when none is given.
    pub http_content_type: String,
}

impl Default for TypeDefaults {
    fn default() -> Self {
        Self {
            private_ip_address_placeholder: "KURTOSIS_IP_ADDR_PLACEHOLDER".to_string(),
            ready_interval: ScriptDuration::from_secs(1),
            ready_timeout: ScriptDuration::from_mins(15),
            tini_enabled: true,
            build_file_name: "Dockerfile".to_string(),
            nix_flake_file: "flake.nix".to_string(),
            persistent_directory_size_mb: 1024,
            min_memory_allocation_mb: 6,
            http_content_type: "application/json".to_string(),
        }
    }
}

impl TypeDefaults {
    /// Load defaults from JSON; missing fields keep their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Everything `to_kurtosis_type` needs beyond the composite value itself.
pub struct ConversionContext<'a> {
    pub defaults: TypeDefaults,

    /// Locator of the module making the builtin call.
    pub module_locator: String,

    pub package_id: String,

    pub replace_options: BTreeMap<String, String>,

    pub content_provider: &'a dyn PackageContentProvider,

    pub image_download_mode: ImageDownloadMode,
}

impl<'a> ConversionContext<'a> {
    /// A context for a standalone script.
    pub fn new(content_provider: &'a dyn PackageContentProvider) -> Self {
        Self {
            defaults: TypeDefaults::default(),
            module_locator: String::new(),
            package_id: STANDALONE_PACKAGE_ID.to_string(),
            replace_options: BTreeMap::new(),
            content_provider,
            image_download_mode: ImageDownloadMode::default(),
        }
    }

    /// Convert on behalf of `module_locator` inside `package_id`.
    pub fn with_package(
        mut self,
        package_id: impl Into<String>,
        module_locator: impl Into<String>,
    ) -> Self {
        self.package_id = package_id.into();
        self.module_locator = module_locator.into();
        self
    }

    pub fn with_defaults(mut self, defaults: TypeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_replace_option(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replace_options.insert(from.into(), to.into());
        self
    }

    pub fn with_image_download_mode(mut self, mode: ImageDownloadMode) -> Self {
        self.image_download_mode = mode;
        self
    }

    pub fn is_standalone(&self) -> bool {
        self.package_id == STANDALONE_PACKAGE_ID
    }
}

/// Serde adapter storing a [`ScriptDuration`] as its text form (`"1m30s"`).
pub(crate) mod duration_text {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use startosis_core::ScriptDuration;

    pub fn serialize<S: Serializer>(value: &ScriptDuration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScriptDuration, D::Error> {
        let text = String::deserialize(deserializer)?;
        ScriptDuration::parse(&text).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::LocalPackageContentProvider;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let defaults = TypeDefaults::from_json_str(r#"{"ready_timeout": "2m", "tini_enabled": false}"#).unwrap();
        assert_eq!(defaults.ready_timeout, ScriptDuration::from_mins(2));
        assert_eq!(defaults.ready_interval, ScriptDuration::from_secs(1));
        assert!(!defaults.tini_enabled);
        assert_eq!(defaults.build_file_name, "Dockerfile");
    }

    #[test]
    fn test_bad_duration_is_defect() {
        let err = TypeDefaults::from_json_str(r#"{"ready_timeout": "later"}"#).unwrap_err();
        assert!(err.is_defect());
    }

    #[test]
    fn test_serializes_durations_as_text() {
        let json = serde_json::to_value(TypeDefaults::default()).unwrap();
        assert_eq!(json["ready_timeout"], "15m0s");
    }

    #[test]
    fn test_context_builder() {
        let provider = LocalPackageContentProvider::new();
        let ctx = ConversionContext::new(&provider);
        assert!(ctx.is_standalone());
        let ctx = ctx
            .with_package("github.com/acme/stack", "github.com/acme/stack/main.star")
            .with_replace_option("github.com/a/b", "github.com/c/b");
        assert!(!ctx.is_standalone());
        assert_eq!(ctx.replace_options.len(), 1);
    }
}
