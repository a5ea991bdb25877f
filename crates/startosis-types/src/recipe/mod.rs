//! Recipes: requests the engine runs against a service.
//!
//! [`Recipe`] is the closed set of recipe types a `ReadyCondition` accepts.

mod exec;
mod http;

pub use exec::*;
pub use http::*;

use startosis_core::{InterpretationError, Result, Value};

use crate::config::TypeDefaults;
use crate::constructor::KurtosisValueType;
use crate::records::RecipeRecord;

/// Any recipe value.
#[derive(Debug, Clone, PartialEq)]
pub enum Recipe {
    GetHttp(GetHttpRequestRecipe),
    PostHttp(PostHttpRequestRecipe),
    Exec(ExecRecipe),
}

impl Recipe {
    pub const TYPE_NAMES: &'static [&'static str] = &[
        GET_HTTP_RECIPE_TYPE_NAME,
        POST_HTTP_RECIPE_TYPE_NAME,
        EXEC_RECIPE_TYPE_NAME,
    ];

    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(recipe) = value.downcast_ref::<GetHttpRequestRecipe>() {
            return Some(Recipe::GetHttp(recipe.clone()));
        }
        if let Some(recipe) = value.downcast_ref::<PostHttpRequestRecipe>() {
            return Some(Recipe::PostHttp(recipe.clone()));
        }
        value
            .downcast_ref::<ExecRecipe>()
            .map(|recipe| Recipe::Exec(recipe.clone()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Recipe::GetHttp(_) => GetHttpRequestRecipe::TYPE_NAME,
            Recipe::PostHttp(_) => PostHttpRequestRecipe::TYPE_NAME,
            Recipe::Exec(_) => ExecRecipe::TYPE_NAME,
        }
    }

    pub fn to_kurtosis_type(&self, defaults: &TypeDefaults) -> Result<RecipeRecord> {
        match self {
            Recipe::GetHttp(recipe) => recipe.to_kurtosis_type(),
            Recipe::PostHttp(recipe) => recipe.to_kurtosis_type(defaults),
            Recipe::Exec(recipe) => recipe.to_kurtosis_type(),
        }
    }
}

/// Accepts any recipe value.
pub fn validate_recipe(value: &Value, name: &str) -> std::result::Result<(), InterpretationError> {
    if Recipe::from_value(value).is_some() {
        return Ok(());
    }
    Err(InterpretationError::new(format!(
        "The '{}' attribute is not a Recipe (was '{}').",
        name,
        value.type_name()
    )))
}
