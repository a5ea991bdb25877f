use std::collections::BTreeMap;

use startosis_args::{safe_cast_to_string_map, validators, ArgumentKind, BuiltinArgument};
use startosis_core::Result;

use crate::config::TypeDefaults;
use crate::constructor::kurtosis_value_type;
use crate::records::{HttpMethod, RecipeRecord};

pub const GET_HTTP_RECIPE_TYPE_NAME: &str = "GetHttpRequestRecipe";
pub const POST_HTTP_RECIPE_TYPE_NAME: &str = "PostHttpRequestRecipe";

pub const PORT_ID_ATTR: &str = "port_id";
pub const ENDPOINT_ATTR: &str = "endpoint";
pub const BODY_ATTR: &str = "body";
pub const CONTENT_TYPE_ATTR: &str = "content_type";
pub const EXTRACT_ATTR: &str = "extract";
pub const HEADERS_ATTR: &str = "headers";

fn get_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(PORT_ID_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(ENDPOINT_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(EXTRACT_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
        BuiltinArgument::optional(HEADERS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
    ]
}

fn post_arguments() -> Vec<BuiltinArgument> {
    vec![
        BuiltinArgument::required(PORT_ID_ATTR, ArgumentKind::STRING)
            .with_validator(validators::non_empty_string),
        BuiltinArgument::required(ENDPOINT_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(BODY_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(CONTENT_TYPE_ATTR, ArgumentKind::STRING),
        BuiltinArgument::optional(EXTRACT_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
        BuiltinArgument::optional(HEADERS_ATTR, ArgumentKind::DICT)
            .with_validator(validators::string_mapping_to_string),
    ]
}

kurtosis_value_type!(
    /// An HTTP GET against a named service port.
    GetHttpRequestRecipe,
    GET_HTTP_RECIPE_TYPE_NAME,
    get_arguments
);

kurtosis_value_type!(
    /// An HTTP POST against a named service port.
    PostHttpRequestRecipe,
    POST_HTTP_RECIPE_TYPE_NAME,
    post_arguments
);

fn string_map_attr(
    base: &crate::constructor::KurtosisValueTypeDefault,
    attr: &str,
) -> Result<BTreeMap<String, String>> {
    match base.attr(attr) {
        Some(value) if base.is_set(attr) => Ok(safe_cast_to_string_map(&value, attr)?),
        _ => Ok(BTreeMap::new()),
    }
}

impl GetHttpRequestRecipe {
    pub fn port_id(&self) -> Result<String> {
        self.base.required_attr_value(PORT_ID_ATTR)
    }

    pub fn to_kurtosis_type(&self) -> Result<RecipeRecord> {
        Ok(RecipeRecord::Http {
            method: HttpMethod::Get,
            port_id: self.port_id()?,
            endpoint: self.base.required_attr_value(ENDPOINT_ATTR)?,
            body: String::new(),
            content_type: String::new(),
            extractors: string_map_attr(&self.base, EXTRACT_ATTR)?,
            headers: string_map_attr(&self.base, HEADERS_ATTR)?,
        })
    }
}

impl PostHttpRequestRecipe {
    pub fn port_id(&self) -> Result<String> {
        self.base.required_attr_value(PORT_ID_ATTR)
    }

    pub fn to_kurtosis_type(&self, defaults: &TypeDefaults) -> Result<RecipeRecord> {
        let content_type = self
            .base
            .extract_attr_value::<String>(CONTENT_TYPE_ATTR)?
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| defaults.http_content_type.clone());
        Ok(RecipeRecord::Http {
            method: HttpMethod::Post,
            port_id: self.port_id()?,
            endpoint: self.base.required_attr_value(ENDPOINT_ATTR)?,
            body: self.base.attr_value_or_default(BODY_ATTR)?,
            content_type,
            extractors: string_map_attr(&self.base, EXTRACT_ATTR)?,
            headers: string_map_attr(&self.base, HEADERS_ATTR)?,
        })
    }
}
