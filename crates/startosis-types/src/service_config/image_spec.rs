//! `ImageSpec(image, registry, email, username, password)`.

use startosis_args::{validators, ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, Value};

use crate::constructor::kurtosis_value_type;
use crate::records::ImageRegistrySpecRecord;

pub const IMAGE_SPEC_TYPE_NAME: &str = "ImageSpec";

pub const IMAGE_ATTR: &str = "image";
pub const REGISTRY_ATTR: &str = "registry";
pub const EMAIL_ATTR: &str = "email";
pub const USERNAME_ATTR: &str = "username";
pub const PASSWORD_ATTR: &str = "password";

fn validate_email(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::non_empty_string(value, name)?;
    validators::email_address(value, name)
}

fn image_spec_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(IMAGE_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(REGISTRY_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(EMAIL_ATTR, ArgumentKind::STRING).with_validator(validate_email),
        BuiltinArgument::required(USERNAME_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(PASSWORD_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
    ]
}

kurtosis_value_type!(
    /// An image pulled from a registry that requires credentials.
    ImageSpec,
    IMAGE_SPEC_TYPE_NAME,
    image_spec_arguments
);

impl ImageSpec {
    pub fn image(&self) -> Result<String> {
        self.base.required_attr_value(IMAGE_ATTR)
    }

    pub fn to_kurtosis_type(&self) -> Result<ImageRegistrySpecRecord> {
        Ok(ImageRegistrySpecRecord {
            image: self.image()?,
            registry: self.base.required_attr_value(REGISTRY_ATTR)?,
            email: self.base.required_attr_value(EMAIL_ATTR)?,
            username: self.base.required_attr_value(USERNAME_ATTR)?,
            password: self.base.required_attr_value(PASSWORD_ATTR)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::KurtosisValueType;

    fn named(email: &str) -> Vec<(String, Value)> {
        vec![
            (IMAGE_ATTR.to_string(), Value::from("acme/api:1.0")),
            (REGISTRY_ATTR.to_string(), Value::from("registry.acme.io")),
            (EMAIL_ATTR.to_string(), Value::from(email)),
            (USERNAME_ATTR.to_string(), Value::from("ci")),
            (PASSWORD_ATTR.to_string(), Value::from("s3cret")),
        ]
    }

    #[test]
    fn test_to_kurtosis_type() {
        let record = ImageSpec::create(named("ci@acme.io"))
            .unwrap()
            .to_kurtosis_type()
            .unwrap();
        assert_eq!(record.registry, "registry.acme.io");
        assert_eq!(record.password, "s3cret");
    }

    #[test]
    fn test_invalid_email() {
        let err = ImageSpec::create(named("not-an-email")).unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
