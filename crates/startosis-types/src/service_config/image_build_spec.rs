//! `ImageBuildSpec(image_name, build_context_dir, build_file?, target_stage?, build_args?)`.

use std::collections::BTreeMap;

use startosis_args::{safe_cast_to_string_map, validators, ArgumentKind, BuiltinArgument};
use startosis_core::{Result, StartosisError};

use crate::config::ConversionContext;
use crate::constructor::kurtosis_value_type;
use crate::records::ImageBuildSpecRecord;

pub const IMAGE_BUILD_SPEC_TYPE_NAME: &str = "ImageBuildSpec";

pub const IMAGE_NAME_ATTR: &str = "image_name";
pub const BUILD_CONTEXT_DIR_ATTR: &str = "build_context_dir";
pub const BUILD_FILE_ATTR: &str = "build_file";
pub const TARGET_STAGE_ATTR: &str = "target_stage";
pub const BUILD_ARGS_ATTR: &str = "build_args";

fn image_build_spec_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(IMAGE_NAME_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(BUILD_CONTEXT_DIR_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(BUILD_FILE_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(TARGET_STAGE_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::optional(BUILD_ARGS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
    ]
}

kurtosis_value_type!(
    /// Builds a service image from a build file inside the package.
    ImageBuildSpec,
    IMAGE_BUILD_SPEC_TYPE_NAME,
    image_build_spec_arguments
);

impl ImageBuildSpec {
    pub fn image_name(&self) -> Result<String> {
        self.base.required_attr_value(IMAGE_NAME_ATTR)
    }

    pub fn build_context_locator(&self) -> Result<String> {
        self.base.required_attr_value(BUILD_CONTEXT_DIR_ATTR)
    }

    pub fn target_stage(&self) -> Result<Option<String>> {
        self.base.extract_attr_value(TARGET_STAGE_ATTR)
    }

    pub fn build_args(&self) -> Result<BTreeMap<String, String>> {
        match self.base.attr(BUILD_ARGS_ATTR) {
            Some(value) if self.base.is_set(BUILD_ARGS_ATTR) => {
                Ok(safe_cast_to_string_map(&value, BUILD_ARGS_ATTR)?)
            }
            _ => Ok(BTreeMap::new()),
        }
    }

    /// Resolve the build context and build file inside the package. The
    /// build file is relative to the build context.
    pub fn to_kurtosis_type(&self, ctx: &ConversionContext<'_>) -> Result<ImageBuildSpecRecord> {
        if ctx.is_standalone() {
            return Err(StartosisError::interpretation(
                "Cannot use ImageBuildSpec in a standalone script; create a package and rerun to use ImageBuildSpec.",
            ));
        }
        let context_locator = ctx.content_provider.get_absolute_locator(
            &ctx.package_id,
            &ctx.module_locator,
            &self.build_context_locator()?,
            &ctx.replace_options,
        )?;
        let build_file_name = self
            .base
            .extract_attr_value::<String>(BUILD_FILE_ATTR)?
            .unwrap_or_else(|| ctx.defaults.build_file_name.clone());
        let build_file_locator = context_locator.join(&[build_file_name.as_str()]);

        Ok(ImageBuildSpecRecord {
            image_name: self.image_name()?,
            build_context_dir: ctx.content_provider.get_on_disk_absolute_path(&context_locator)?,
            build_file: ctx
                .content_provider
                .get_on_disk_absolute_package_file_path(&build_file_locator)?,
            target_stage: self.target_stage()?,
            build_args: self.build_args()?,
        })
    }
}
