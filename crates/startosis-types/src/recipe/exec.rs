use startosis_args::{safe_cast_to_string_list, ArgumentKind, BuiltinArgument};
use startosis_core::{InterpretationError, Result, StartosisError, Value};

use crate::constructor::kurtosis_value_type;
use crate::records::RecipeRecord;

pub const EXEC_RECIPE_TYPE_NAME: &str = "ExecRecipe";

pub const COMMAND_ATTR: &str = "command";

fn validate_command(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    safe_cast_to_string_list(value, name).map(|_| ())
}

fn exec_arguments() -> Vec<BuiltinArgument> {
    vec![BuiltinArgument::required(COMMAND_ATTR, ArgumentKind::LIST).with_validator(validate_command)]
}

kurtosis_value_type!(
    /// A command run inside a service container.
    ExecRecipe,
    EXEC_RECIPE_TYPE_NAME,
    exec_arguments
);

impl ExecRecipe {
    pub fn command(&self) -> Result<Vec<String>> {
        let value = self.base.attr(COMMAND_ATTR).ok_or_else(|| {
            StartosisError::defect(format!(
                "Required attribute '{}' could not be found on type '{}'",
                COMMAND_ATTR, EXEC_RECIPE_TYPE_NAME
            ))
        })?;
        Ok(safe_cast_to_string_list(&value, COMMAND_ATTR)?)
    }

    pub fn to_kurtosis_type(&self) -> Result<RecipeRecord> {
        Ok(RecipeRecord::Exec {
            command: self.command()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constructor::KurtosisValueType;

    #[test]
    fn test_command() {
        let value = ExecRecipe::constructor()
            .unwrap()
            .construct(
                vec![Value::list(vec![Value::from("pg_isready"), Value::from("-q")])],
                vec![],
            )
            .unwrap();
        let recipe = value.downcast_ref::<ExecRecipe>().unwrap();
        assert_eq!(
            recipe.to_kurtosis_type().unwrap(),
            RecipeRecord::Exec {
                command: vec!["pg_isready".to_string(), "-q".to_string()],
            }
        );
    }

    #[test]
    fn test_non_string_command_rejected() {
        let err = ExecRecipe::constructor()
            .unwrap()
            .construct(vec![Value::list(vec![Value::from(1)])], vec![])
            .unwrap_err();
        assert!(err.to_string().contains("command"));
    }
}
