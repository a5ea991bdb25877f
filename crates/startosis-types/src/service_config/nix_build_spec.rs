//! `NixBuildSpec(flake_location_dir, build_context_dir, image_name, flake_output?)`.

use startosis_args::{validators, ArgumentKind, BuiltinArgument};
use startosis_core::{Result, StartosisError};

use crate::config::ConversionContext;
use crate::constructor::kurtosis_value_type;
use crate::records::NixBuildSpecRecord;

pub const NIX_BUILD_SPEC_TYPE_NAME: &str = "NixBuildSpec";

pub const FLAKE_LOCATION_DIR_ATTR: &str = "flake_location_dir";
pub const BUILD_CONTEXT_DIR_ATTR: &str = "build_context_dir";
pub const IMAGE_NAME_ATTR: &str = "image_name";
pub const FLAKE_OUTPUT_ATTR: &str = "flake_output";

fn nix_build_spec_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(FLAKE_LOCATION_DIR_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(BUILD_CONTEXT_DIR_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(IMAGE_NAME_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(FLAKE_OUTPUT_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
    ]
}

kurtosis_value_type!(
    /// Builds a service image from a nix flake inside the package.
    NixBuildSpec,
    NIX_BUILD_SPEC_TYPE_NAME,
    nix_build_spec_arguments
);

impl NixBuildSpec {
    pub fn image_name(&self) -> Result<String> {
        self.base.required_attr_value(IMAGE_NAME_ATTR)
    }

    pub fn build_context_locator(&self) -> Result<String> {
        self.base.required_attr_value(BUILD_CONTEXT_DIR_ATTR)
    }

    pub fn flake_location_dir(&self) -> Result<String> {
        self.base.required_attr_value(FLAKE_LOCATION_DIR_ATTR)
    }

    pub fn flake_output(&self) -> Result<Option<String>> {
        self.base.extract_attr_value(FLAKE_OUTPUT_ATTR)
    }

    /// `<flake_location_dir>/.#<flake_output>`
    pub fn full_flake_reference(&self) -> Result<String> {
        Ok(format!(
            "{}/.#{}",
            self.flake_location_dir()?,
            self.flake_output()?.unwrap_or_default()
        ))
    }

    /// Resolve the build context and flake directory inside the package.
    /// The flake location is relative to the build context.
    pub fn to_kurtosis_type(&self, ctx: &ConversionContext<'_>) -> Result<NixBuildSpecRecord> {
        if ctx.is_standalone() {
            return Err(StartosisError::interpretation(
                "Cannot use NixBuildSpec in a standalone script; create a package and rerun to use NixBuildSpec.",
            ));
        }
        let context_locator = ctx.content_provider.get_absolute_locator(
            &ctx.package_id,
            &ctx.module_locator,
            &self.build_context_locator()?,
            &ctx.replace_options,
        )?;
        let flake_dir = self.flake_location_dir()?;
        let flake_locator =
            context_locator.join(&[flake_dir.as_str(), ctx.defaults.nix_flake_file.as_str()]);
        let flake_path = ctx
            .content_provider
            .get_on_disk_absolute_package_file_path(&flake_locator)?;
        let build_context_dir = ctx.content_provider.get_on_disk_absolute_path(&context_locator)?;
        let flake_dir = flake_path
            .parent()
            .map(|dir| dir.to_path_buf())
            .unwrap_or_else(|| build_context_dir.clone());

        Ok(NixBuildSpecRecord {
            image_name: self.image_name()?,
            build_context_dir,
            flake_dir,
            flake_output: self.flake_output()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::KurtosisValueType;
    use crate::resolver::LocalPackageContentProvider;
    use startosis_core::Value;
    use std::path::PathBuf;

    fn spec(flake_output: Option<&str>) -> NixBuildSpec {
        let mut named = vec![
            (FLAKE_LOCATION_DIR_ATTR.to_string(), Value::from("./nix")),
            (BUILD_CONTEXT_DIR_ATTR.to_string(), Value::from("./api")),
            (IMAGE_NAME_ATTR.to_string(), Value::from("acme/api:dev")),
        ];
        if let Some(output) = flake_output {
            named.push((FLAKE_OUTPUT_ATTR.to_string(), Value::from(output)));
        }
        NixBuildSpec::create(named).unwrap()
    }

    #[test]
    fn test_full_flake_reference() {
        assert_eq!(spec(Some("api")).full_flake_reference().unwrap(), "./nix/.#api");
        assert_eq!(spec(None).full_flake_reference().unwrap(), "./nix/.#");
    }

    #[test]
    fn test_standalone_rejected() {
        let provider = LocalPackageContentProvider::new();
        let err = spec(None)
            .to_kurtosis_type(&ConversionContext::new(&provider))
            .unwrap_err();
        assert!(err.to_string().starts_with("Cannot use NixBuildSpec in a standalone script"));
    }

    #[test]
    fn test_resolves_paths() {
        let provider =
            LocalPackageContentProvider::new().with_package("github.com/acme/stack", "/pkg");
        let ctx = ConversionContext::new(&provider)
            .with_package("github.com/acme/stack", "github.com/acme/stack/main.star");
        let record = spec(Some("api")).to_kurtosis_type(&ctx).unwrap();
        assert_eq!(record.build_context_dir, PathBuf::from("/pkg/api"));
        assert_eq!(record.flake_dir, PathBuf::from("/pkg/api/nix"));
        assert_eq!(record.flake_output.as_deref(), Some("api"));
    }
}
