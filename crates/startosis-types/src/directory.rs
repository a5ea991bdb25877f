//! `Directory(artifact_names?, persistent_key?, size?)`.
//!
//! A directory mounted into a service: either expanded files artifacts or a
//! persistent volume. Exactly one of the two must be set; the check happens
//! at conversion time so the value itself can still be constructed and
//! rendered.

use startosis_args::{safe_cast_to_string_list, validators, ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::config::TypeDefaults;
use crate::constructor::{kurtosis_value_type, KurtosisValueType};

pub const DIRECTORY_TYPE_NAME: &str = "Directory";

pub const ARTIFACT_NAMES_ATTR: &str = "artifact_names";
pub const PERSISTENT_KEY_ATTR: &str = "persistent_key";
pub const SIZE_ATTR: &str = "size";

fn validate_size(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::uint64_in_range(value, name, 1, u64::MAX)
}

fn directory_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::optional(ARTIFACT_NAMES_ATTR, ArgumentKind::LIST)
            .with_validator(validators::string_list_with_not_empty_values),
        BuiltinArgument::optional(PERSISTENT_KEY_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(SIZE_ATTR, ArgumentKind::INT).with_validator(validate_size),
    ]
}

kurtosis_value_type!(
    /// A directory mounted into a service container.
    Directory,
    DIRECTORY_TYPE_NAME,
    directory_arguments
);

/// What a [`Directory`] mounts once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryContent {
    FilesArtifacts(Vec<String>),
    Persistent { persistent_key: String, size_mb: u64 },
}

impl Directory {
    /// A directory expanding a single files artifact.
    pub fn from_files_artifact(artifact_name: &str) -> Result<Self> {
        <Self as KurtosisValueType>::create(vec![(
            ARTIFACT_NAMES_ATTR.to_string(),
            Value::list(vec![Value::from(artifact_name)]),
        )])
    }

    pub fn artifact_names_if_set(&self) -> Result<Option<Vec<String>>> {
        match self.base.attr(ARTIFACT_NAMES_ATTR) {
            Some(value) if self.base.is_set(ARTIFACT_NAMES_ATTR) => {
                Ok(Some(safe_cast_to_string_list(&value, ARTIFACT_NAMES_ATTR)?))
            }
            _ => Ok(None),
        }
    }

    pub fn persistent_key_if_set(&self) -> Result<Option<String>> {
        self.base.extract_attr_value(PERSISTENT_KEY_ATTR)
    }

    pub fn size_or_default(&self, defaults: &TypeDefaults) -> Result<u64> {
        Ok(self
            .base
            .extract_attr_value::<u64>(SIZE_ATTR)?
            .unwrap_or(defaults.persistent_directory_size_mb))
    }

    /// Check exclusivity and return what the directory mounts.
    pub fn content(&self, defaults: &TypeDefaults) -> Result<DirectoryContent> {
        let artifact_names = self.artifact_names_if_set()?;
        let persistent_key = self.persistent_key_if_set()?;
        match (artifact_names, persistent_key) {
            (Some(names), None) => Ok(DirectoryContent::FilesArtifacts(names)),
            (None, Some(persistent_key)) => Ok(DirectoryContent::Persistent {
                persistent_key,
                size_mb: self.size_or_default(defaults)?,
            }),
            _ => Err(StartosisError::interpretation(format!(
                "Parameter '{}' and '{}' cannot be set on the same '{}' object: '{}'",
                ARTIFACT_NAMES_ATTR, PERSISTENT_KEY_ATTR, DIRECTORY_TYPE_NAME, self
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(pairs: &[(&str, Value)]) -> Directory {
        Directory::create(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_from_files_artifact() {
        let dir = Directory::from_files_artifact("genesis").unwrap();
        assert_eq!(dir.to_string(), "Directory(artifact_names=[\"genesis\"])");
        assert_eq!(
            dir.content(&TypeDefaults::default()).unwrap(),
            DirectoryContent::FilesArtifacts(vec!["genesis".to_string()])
        );
    }

    #[test]
    fn test_persistent_default_size() {
        let dir = directory(&[("persistent_key", Value::from("db-data"))]);
        assert_eq!(
            dir.content(&TypeDefaults::default()).unwrap(),
            DirectoryContent::Persistent {
                persistent_key: "db-data".to_string(),
                size_mb: 1024,
            }
        );
        let dir = directory(&[
            ("persistent_key", Value::from("db-data")),
            ("size", Value::from(64)),
        ]);
        assert_eq!(dir.size_or_default(&TypeDefaults::default()).unwrap(), 64);
    }

    #[test]
    fn test_exactly_one_source() {
        let err = directory(&[]).content(&TypeDefaults::default()).unwrap_err();
        assert!(err.to_string().contains("cannot be set on the same 'Directory'"));

        let both = directory(&[
            ("artifact_names", Value::list(vec![Value::from("a")])),
            ("persistent_key", Value::from("k")),
        ]);
        assert!(both.content(&TypeDefaults::default()).is_err());
    }

    #[test]
    fn test_empty_artifact_name_rejected() {
        let err = Directory::create(vec![(
            "artifact_names".to_string(),
            Value::list(vec![Value::from("")]),
        )])
        .unwrap_err();
        assert!(err.to_string().contains("artifact_names"));
    }
}
