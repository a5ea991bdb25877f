//! `User(uid, gid?)`.

use startosis_args::{validators, ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, Value};

use crate::constructor::{kurtosis_value_type, KurtosisValueType};
use crate::records::ServiceUser;

pub const USER_TYPE_NAME: &str = "User";

pub const UID_ATTR: &str = "uid";
pub const GID_ATTR: &str = "gid";

fn validate_id(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    validators::int64_in_range(value, name, 0, i64::MAX)
}

fn user_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(UID_ATTR, ArgumentKind::INT).with_validator(validate_id),
        BuiltinArgument::optional(GID_ATTR, ArgumentKind::INT).with_validator(validate_id),
    ]
}

kurtosis_value_type!(
    /// The user and group a service container runs as.
    User,
    USER_TYPE_NAME,
    user_arguments
);

impl User {
    pub fn create(uid: i64, gid: Option<i64>) -> Result<Self> {
        let mut named = vec![(UID_ATTR.to_string(), Value::from(uid))];
        if let Some(gid) = gid {
            named.push((GID_ATTR.to_string(), Value::from(gid)));
        }
        <Self as KurtosisValueType>::create(named)
    }

    pub fn to_kurtosis_type(&self) -> Result<ServiceUser> {
        Ok(ServiceUser {
            uid: self.base.required_attr_value(UID_ATTR)?,
            gid: self.base.extract_attr_value(GID_ATTR)?,
        })
    }
}
