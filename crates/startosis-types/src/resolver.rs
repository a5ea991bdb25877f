//! Package content resolution.
//!
//! Composite types that reference files inside a package (build contexts,
//! Dockerfiles, nix flakes) resolve them through a
//! [`PackageContentProvider`]. Errors from the provider propagate unchanged.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use startosis_core::InterpretationError;

/// Package id used when a script runs outside any package.
pub const STANDALONE_PACKAGE_ID: &str = "DEFAULT_PACKAGE_ID_FOR_SCRIPT";

/// A locator that names a package and a path inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PackageAbsoluteLocator {
    locator: String,
    tag_branch_or_commit: String,
}

impl PackageAbsoluteLocator {
    pub fn new(locator: impl Into<String>, tag_branch_or_commit: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            tag_branch_or_commit: tag_branch_or_commit.into(),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn tag_branch_or_commit(&self) -> &str {
        &self.tag_branch_or_commit
    }

    /// Append path segments, normalising `.` and `..`.
    pub fn join(&self, segments: &[&str]) -> Self {
        let mut joined = self.locator.clone();
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            joined.push('/');
            joined.push_str(segment);
        }
        Self {
            locator: normalize(&joined),
            tag_branch_or_commit: self.tag_branch_or_commit.clone(),
        }
    }
}

/// Resolves locators referenced by composite types.
pub trait PackageContentProvider {
    /// Resolve a relative or absolute locator used inside `module_locator`.
    fn get_absolute_locator(
        &self,
        package_id: &str,
        module_locator: &str,
        relative_or_absolute: &str,
        replace_options: &BTreeMap<String, String>,
    ) -> Result<PackageAbsoluteLocator, InterpretationError>;

    /// On-disk path of a directory inside a package.
    fn get_on_disk_absolute_path(
        &self,
        locator: &PackageAbsoluteLocator,
    ) -> Result<PathBuf, InterpretationError>;

    /// On-disk path of a file inside a package.
    fn get_on_disk_absolute_package_file_path(
        &self,
        locator: &PackageAbsoluteLocator,
    ) -> Result<PathBuf, InterpretationError>;
}

/// Serves packages already checked out under local directories.
///
/// Never touches the filesystem; it only maps locators onto paths.
#[derive(Debug, Clone, Default)]
pub struct LocalPackageContentProvider {
    packages: BTreeMap<String, PathBuf>,
}

impl LocalPackageContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `package_id` from `root`.
    pub fn with_package(mut self, package_id: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.packages.insert(package_id.into(), root.into());
        self
    }

    fn owning_package(&self, locator: &str) -> Option<(&str, &Path)> {
        self.packages
            .iter()
            .filter(|(id, _)| locator == id.as_str() || locator.starts_with(&format!("{}/", id)))
            .max_by_key(|(id, _)| id.len())
            .map(|(id, root)| (id.as_str(), root.as_path()))
    }

    fn on_disk(&self, locator: &PackageAbsoluteLocator) -> Result<PathBuf, InterpretationError> {
        let (id, root) = self.owning_package(locator.locator()).ok_or_else(|| {
            InterpretationError::new(format!(
                "Package owning '{}' is not available locally",
                locator.locator()
            ))
        })?;
        let inner = locator.locator()[id.len()..].trim_start_matches('/');
        if inner.is_empty() {
            Ok(root.to_path_buf())
        } else {
            Ok(root.join(inner))
        }
    }
}

impl PackageContentProvider for LocalPackageContentProvider {
    fn get_absolute_locator(
        &self,
        package_id: &str,
        module_locator: &str,
        relative_or_absolute: &str,
        replace_options: &BTreeMap<String, String>,
    ) -> Result<PackageAbsoluteLocator, InterpretationError> {
        let absolute = if is_relative(relative_or_absolute) {
            let module_dir = module_locator
                .rsplit_once('/')
                .map(|(dir, _)| dir)
                .unwrap_or(package_id);
            let joined = normalize(&format!("{}/{}", module_dir, relative_or_absolute));
            if joined != package_id && !joined.starts_with(&format!("{}/", package_id)) {
                return Err(InterpretationError::new(format!(
                    "Locator '{}' resolves outside of package '{}'",
                    relative_or_absolute, package_id
                )));
            }
            joined
        } else {
            normalize(relative_or_absolute.trim_start_matches('/'))
        };
        Ok(PackageAbsoluteLocator::new(
            apply_replace_options(&absolute, replace_options),
            "",
        ))
    }

    fn get_on_disk_absolute_path(
        &self,
        locator: &PackageAbsoluteLocator,
    ) -> Result<PathBuf, InterpretationError> {
        self.on_disk(locator)
    }

    fn get_on_disk_absolute_package_file_path(
        &self,
        locator: &PackageAbsoluteLocator,
    ) -> Result<PathBuf, InterpretationError> {
        self.on_disk(locator)
    }
}

fn is_relative(locator: &str) -> bool {
    locator.starts_with("./") || locator.starts_with("../") || locator == "." || locator == ".."
}

fn apply_replace_options(locator: &str, replace_options: &BTreeMap<String, String>) -> String {
    let replaced = replace_options
        .iter()
        .filter(|(from, _)| locator == from.as_str() || locator.starts_with(&format!("{}/", from)))
        .max_by_key(|(from, _)| from.len());
    match replaced {
        Some((from, to)) => format!("{}{}", to, &locator[from.len()..]),
        None => locator.to_string(),
    }
}

fn normalize(locator: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in locator.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE: &str = "github.com/acme/stack";

    fn provider() -> LocalPackageContentProvider {
        LocalPackageContentProvider::new().with_package(PACKAGE, "/packages/stack")
    }

    #[test]
    fn test_relative_locator() {
        let locator = provider()
            .get_absolute_locator(
                PACKAGE,
                "github.com/acme/stack/services/main.star",
                "./../images/api",
                &BTreeMap::new(),
            )
            .unwrap();
        assert_eq!(locator.locator(), "github.com/acme/stack/images/api");
        assert_eq!(
            provider().get_on_disk_absolute_path(&locator).unwrap(),
            PathBuf::from("/packages/stack/images/api")
        );
    }

    #[test]
    fn test_relative_locator_cannot_escape_package() {
        let err = provider()
            .get_absolute_locator(PACKAGE, "github.com/acme/stack/main.star", "../../other", &BTreeMap::new())
            .unwrap_err();
        assert!(err.message().contains("outside of package"));
    }

    #[test]
    fn test_replace_options() {
        let mut replace = BTreeMap::new();
        replace.insert("github.com/acme/lib".to_string(), "github.com/fork/lib".to_string());
        let locator = provider()
            .get_absolute_locator(PACKAGE, "github.com/acme/stack/main.star", "github.com/acme/lib/img", &replace)
            .unwrap();
        assert_eq!(locator.locator(), "github.com/fork/lib/img");
        assert!(provider().get_on_disk_absolute_path(&locator).is_err());
    }

    #[test]
    fn test_join() {
        let locator = PackageAbsoluteLocator::new("github.com/acme/stack/img", "main");
        let joined = locator.join(&["./nix", "flake.nix"]);
        assert_eq!(joined.locator(), "github.com/acme/stack/img/nix/flake.nix");
        assert_eq!(joined.tag_branch_or_commit(), "main");
    }
}
