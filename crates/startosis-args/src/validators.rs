//! Reusable argument validators.
//!
//! Validators take the bound value and the argument name used in messages.
//! Parameterised checks are wrapped by the type that uses them, e.g.
//! `|v, n| uint64_in_range(v, n, 1, 65535)` as a plain `fn`.

use num_traits::ToPrimitive;
use once_cell::sync::OnceCell;
use regex::Regex;
use startosis_core::{DefectError, InterpretationError, ScriptDuration, Value};

use crate::cast::safe_cast_to_string_map;

const MAX_LABEL_LENGTH: usize = 63;
const RESERVED_LABEL_PREFIX: &str = "com.kurtosistech.";
const MAX_ANNOTATION_PREFIX_LENGTH: usize = 253;

static LABEL_KEY: Pattern = Pattern::new(r"^[a-z0-9]([-a-z0-9_.]*[a-z0-9])?$");
static LABEL_VALUE: Pattern = Pattern::new(r"^([A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?)?$");
static EMAIL: Pattern = Pattern::new(r"^[^@\s<>]+@[^@\s<>]+\.[^@\s<>.]+$");
static ANNOTATION_PREFIX: Pattern =
    Pattern::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$");
static ANNOTATION_NAME: Pattern = Pattern::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$");

/// A regular expression compiled on first use and shared afterwards.
///
/// Patterns are written into type definitions, so one that fails to compile
/// is a defect.
#[derive(Debug)]
pub struct Pattern {
    source: &'static str,
    compiled: OnceCell<Regex>,
}

impl Pattern {
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn regex(&self) -> Result<&Regex, DefectError> {
        self.compiled.get_or_try_init(|| {
            Regex::new(self.source).map_err(|err| {
                DefectError::new(format!("Pattern '{}' does not compile: {}", self.source, err))
            })
        })
    }

    fn is_match(&self, text: &str, name: &str) -> Result<bool, InterpretationError> {
        self.regex()
            .map(|re| re.is_match(text))
            .map_err(|err| InterpretationError::wrap(err, format!("Cannot validate '{}'", name)))
    }
}

/// Compile every pattern the builtin validators use.
pub fn check_builtin_patterns() -> Result<(), DefectError> {
    for pattern in [
        &LABEL_KEY,
        &LABEL_VALUE,
        &EMAIL,
        &ANNOTATION_PREFIX,
        &ANNOTATION_NAME,
    ] {
        pattern.regex()?;
    }
    Ok(())
}

/// Assertion tokens accepted by readiness checks.
pub const ASSERTION_TOKENS: &[&str] = &["==", "!=", ">=", "<=", ">", "<", "IN", "NOT_IN"];

fn expected_string<'a>(value: &'a Value, name: &str) -> Result<&'a str, InterpretationError> {
    value.as_str().ok_or_else(|| {
        InterpretationError::new(format!(
            "Value for '{}' was expected to be a string but was '{}'",
            name,
            value.type_name()
        ))
    })
}

pub fn non_empty_string(value: &Value, name: &str) -> Result<(), InterpretationError> {
    if expected_string(value, name)?.is_empty() {
        return Err(InterpretationError::new(format!(
            "Value for '{}' was an empty string. This is disallowed",
            name
        )));
    }
    Ok(())
}

pub fn string_list_with_not_empty_values(
    value: &Value,
    name: &str,
) -> Result<(), InterpretationError> {
    let list = value.as_list().ok_or_else(|| {
        InterpretationError::new(format!(
            "Value for '{}' was expected to be a list but was '{}'",
            name,
            value.type_name()
        ))
    })?;
    for (idx, item) in list.borrow().iter().enumerate() {
        non_empty_string(item, &format!("element {} in argument '{}'", idx, name))?;
    }
    Ok(())
}

pub fn uint64_in_range(
    value: &Value,
    name: &str,
    min: u64,
    max: u64,
) -> Result<(), InterpretationError> {
    let int = value.as_int().ok_or_else(|| {
        InterpretationError::new(format!(
            "Value for '{}' was expected to be an integer between {} and {}, but it was '{}'",
            name,
            min,
            max,
            value.type_name()
        ))
    })?;
    match int.to_u64() {
        Some(n) if n >= min && n <= max => Ok(()),
        _ => Err(InterpretationError::new(format!(
            "Value for '{}' was expected to be an integer between {} and {}, but it was {}",
            name, min, max, int
        ))),
    }
}

pub fn int64_in_range(
    value: &Value,
    name: &str,
    min: i64,
    max: i64,
) -> Result<(), InterpretationError> {
    let int = value.as_int().ok_or_else(|| {
        InterpretationError::new(format!(
            "Value for '{}' was expected to be an integer between {} and {}, but it was '{}'",
            name,
            min,
            max,
            value.type_name()
        ))
    })?;
    match int.to_i64() {
        Some(n) if n >= min && n <= max => Ok(()),
        _ => Err(InterpretationError::new(format!(
            "Value for '{}' was expected to be an integer between {} and {}, but it was {}",
            name, min, max, int
        ))),
    }
}

pub fn float_in_range(
    value: &Value,
    name: &str,
    min: f64,
    max: f64,
) -> Result<(), InterpretationError> {
    let float = value.as_float().ok_or_else(|| {
        InterpretationError::new(format!(
            "Value for '{}' was expected to be a float between {:.6} and {:.6}, but it was '{}'",
            name,
            min,
            max,
            value.type_name()
        ))
    })?;
    if !(min..=max).contains(&float) {
        return Err(InterpretationError::new(format!(
            "Value for '{}' was expected to be a float between {:.6} and {:.6}, but it was {}",
            name, min, max, float
        )));
    }
    Ok(())
}

pub fn string_values(
    value: &Value,
    name: &str,
    acceptable: &[&str],
) -> Result<(), InterpretationError> {
    let text = expected_string(value, name)?;
    if acceptable.contains(&text) {
        return Ok(());
    }
    Err(InterpretationError::new(format!(
        "Invalid argument value for '{}': '{}'. Valid values are {}",
        name,
        text,
        acceptable.join(", ")
    )))
}

pub fn string_regexp(
    value: &Value,
    name: &str,
    pattern: &Pattern,
) -> Result<(), InterpretationError> {
    let text = expected_string(value, name)?;
    if pattern.is_match(text, name)? {
        return Ok(());
    }
    Err(InterpretationError::new(format!(
        "Argument '{}' must match regexp: '{}'. Its value was '{}'",
        name,
        pattern.source(),
        text
    )))
}

/// A duration string; empty is allowed and means "unset".
pub fn duration(value: &Value, name: &str) -> Result<(), InterpretationError> {
    let text = value.as_str().ok_or_else(|| {
        InterpretationError::new(format!(
            "The '{}' attribute is not a valid string type (was '{}').",
            name,
            value.type_name()
        ))
    })?;
    if text.is_empty() {
        return Ok(());
    }
    ScriptDuration::parse(text).map(|_| ()).map_err(|err| {
        InterpretationError::wrap(
            err,
            format!(
                "The value '{}' of '{}' attribute is not a valid duration string format",
                text, name
            ),
        )
    })
}

/// A non-empty duration string, or None to disable.
pub fn duration_or_none(value: &Value, name: &str) -> Result<(), InterpretationError> {
    if value.is_none() {
        return Ok(());
    }
    non_empty_string(value, name)?;
    duration(value, name)
}

pub fn string_mapping_to_string(value: &Value, name: &str) -> Result<(), InterpretationError> {
    safe_cast_to_string_map(value, name).map(|_| ())
}

/// Label keys are lowercase DNS-like tokens, values alphanumeric with
/// `-`, `_` and `.` inside. Both are limited to 63 characters.
pub fn service_labels(value: &Value, name: &str) -> Result<(), InterpretationError> {
    let labels = safe_cast_to_string_map(value, name)?;
    for (key, label) in &labels {
        let problem = if key.len() > MAX_LABEL_LENGTH || !LABEL_KEY.is_match(key, name)? {
            Some(format!(
                "label key '{}' must be at most {} characters of lowercase alphanumerics, '-', '_' or '.', starting and ending with an alphanumeric",
                key, MAX_LABEL_LENGTH
            ))
        } else if key.starts_with(RESERVED_LABEL_PREFIX) {
            Some(format!(
                "label key '{}' uses the reserved prefix '{}'",
                key, RESERVED_LABEL_PREFIX
            ))
        } else if label.len() > MAX_LABEL_LENGTH || !LABEL_VALUE.is_match(label, name)? {
            Some(format!(
                "label value '{}' for key '{}' must be at most {} characters of alphanumerics, '-', '_' or '.', starting and ending with an alphanumeric",
                label, key, MAX_LABEL_LENGTH
            ))
        } else {
            None
        };
        if let Some(problem) = problem {
            return Err(InterpretationError::wrap(
                problem,
                format!("An error occurred validating service config labels '{:?}'", labels),
            ));
        }
    }
    Ok(())
}

fn annotation_key_problem(key: &str, name: &str) -> Result<Option<String>, InterpretationError> {
    let (prefix, local) = match key.split_once('/') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, key),
    };
    if let Some(prefix) = prefix {
        if prefix.is_empty()
            || prefix.len() > MAX_ANNOTATION_PREFIX_LENGTH
            || !ANNOTATION_PREFIX.is_match(prefix, name)?
        {
            return Ok(Some(format!(
                "annotation key prefix '{}' must be a DNS subdomain of at most {} characters",
                prefix, MAX_ANNOTATION_PREFIX_LENGTH
            )));
        }
    }
    if local.len() > MAX_LABEL_LENGTH || !ANNOTATION_NAME.is_match(local, name)? {
        return Ok(Some(format!(
            "annotation key name '{}' must be at most {} characters of alphanumerics, '-', '_' or '.', starting and ending with an alphanumeric",
            local, MAX_LABEL_LENGTH
        )));
    }
    Ok(None)
}

/// A dict of Kubernetes annotations: string keys of the form
/// `[prefix/]name` mapped to string values.
pub fn kubernetes_annotations(value: &Value, name: &str) -> Result<(), InterpretationError> {
    let dict = value.as_dict().ok_or_else(|| {
        InterpretationError::new(format!(
            "Expected '{}' to be a dict of string annotations",
            name
        ))
    })?;
    let dict = dict.borrow();
    for (idx, (key, annotation)) in dict.iter().enumerate() {
        let key = key.as_str().ok_or_else(|| {
            InterpretationError::new(format!(
                "Expected key at index {} of '{}' to be a string",
                idx, name
            ))
        })?;
        if let Some(problem) = annotation_key_problem(key, name)? {
            return Err(InterpretationError::wrap(
                problem,
                format!("Error occurred while creating annotation key '{}'", key),
            ));
        }
        if annotation.as_str().is_none() {
            return Err(InterpretationError::new(format!(
                "Expected value at index {} of '{}' to be a string",
                idx, name
            )));
        }
    }
    Ok(())
}

pub fn email_address(value: &Value, name: &str) -> Result<(), InterpretationError> {
    let text = expected_string(value, name)?;
    if EMAIL.is_match(text, name)? {
        return Ok(());
    }
    Err(InterpretationError::new(format!(
        "Value for '{}' is not a valid email address: '{}'",
        name, text
    )))
}

pub fn assertion_token(value: &Value, name: &str) -> Result<(), InterpretationError> {
    string_values(value, name, ASSERTION_TOKENS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> Value {
        Value::dict_from(
            pairs
                .iter()
                .map(|(k, v)| (Value::from(*k), Value::from(*v))),
        )
        .unwrap()
    }

    #[test]
    fn test_non_empty_string() {
        assert!(non_empty_string(&Value::from("x"), "image").is_ok());
        let err = non_empty_string(&Value::from(""), "image").unwrap_err();
        assert_eq!(
            err.message(),
            "Value for 'image' was an empty string. This is disallowed"
        );
        assert!(non_empty_string(&Value::from(1), "image").is_err());
    }

    #[test]
    fn test_string_list_names_element() {
        let list = Value::list(vec![Value::from("a"), Value::from("")]);
        let err = string_list_with_not_empty_values(&list, "cmd").unwrap_err();
        assert!(err.message().contains("element 1 in argument 'cmd'"));
    }

    #[test]
    fn test_ranges() {
        assert!(uint64_in_range(&Value::from(80), "number", 1, 65535).is_ok());
        assert!(uint64_in_range(&Value::from(0), "number", 1, 65535).is_err());
        assert!(uint64_in_range(&Value::from(-1), "number", 1, 65535).is_err());
        assert!(int64_in_range(&Value::from(-5), "x", -10, 10).is_ok());
        assert!(float_in_range(&Value::from(0.5), "x", 0.0, 1.0).is_ok());
        assert!(float_in_range(&Value::from(f64::NAN), "x", 0.0, 1.0).is_err());
    }

    #[test]
    fn test_string_values() {
        let err = string_values(&Value::from("ICMP"), "transport_protocol", &["TCP", "UDP"])
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid argument value for 'transport_protocol': 'ICMP'. Valid values are TCP, UDP"
        );
    }

    static LOWER_ALNUM: Pattern = Pattern::new(r"^[a-z0-9]*$");
    static UNCLOSED: Pattern = Pattern::new(r"^[a-z");

    #[test]
    fn test_string_regexp() {
        assert!(string_regexp(&Value::from("http2"), "p", &LOWER_ALNUM).is_ok());
        let err = string_regexp(&Value::from("HTTP/2"), "p", &LOWER_ALNUM).unwrap_err();
        assert_eq!(
            err.message(),
            "Argument 'p' must match regexp: '^[a-z0-9]*$'. Its value was 'HTTP/2'"
        );
    }

    #[test]
    fn test_pattern_compiles_once() {
        let first = LOWER_ALNUM.regex().unwrap() as *const Regex;
        let second = LOWER_ALNUM.regex().unwrap() as *const Regex;
        assert_eq!(first, second);
        assert!(check_builtin_patterns().is_ok());
    }

    #[test]
    fn test_broken_pattern_is_defect() {
        let err = UNCLOSED.regex().unwrap_err();
        assert!(err.to_string().starts_with("Pattern '^[a-z' does not compile"));
        let err = string_regexp(&Value::from("abc"), "p", &UNCLOSED).unwrap_err();
        assert_eq!(err.message(), "Cannot validate 'p'");
        assert!(err.cause().unwrap_or_default().contains("internal bug"));
    }

    #[test]
    fn test_durations() {
        assert!(duration(&Value::from(""), "interval").is_ok());
        assert!(duration(&Value::from("1m30s"), "interval").is_ok());
        assert!(duration(&Value::from("soon"), "interval").is_err());
        assert!(duration_or_none(&Value::None, "wait").is_ok());
        assert!(duration_or_none(&Value::from(""), "wait").is_err());
    }

    #[test]
    fn test_service_labels() {
        assert!(service_labels(&labels(&[("tier", "backend"), ("app.name", "api-1")]), "labels").is_ok());
        assert!(service_labels(&labels(&[("Tier", "x")]), "labels").is_err());
        assert!(service_labels(&labels(&[("tier", "has space")]), "labels").is_err());
        assert!(service_labels(&labels(&[("com.kurtosistech.guid", "x")]), "labels").is_err());
        assert!(service_labels(&labels(&[("tier", "")]), "labels").is_ok());
    }

    #[test]
    fn test_kubernetes_annotations() {
        let ok = labels(&[
            ("nginx.ingress.kubernetes.io/rewrite-target", "/"),
            ("owner", "Platform Team"),
        ]);
        assert!(kubernetes_annotations(&ok, "annotations").is_ok());

        let err = kubernetes_annotations(&labels(&[("Bad_Prefix/x", "1")]), "annotations")
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Error occurred while creating annotation key 'Bad_Prefix/x'"
        );
        assert!(kubernetes_annotations(&labels(&[("-leading", "1")]), "annotations").is_err());

        let not_string = Value::dict_from(vec![(Value::from("owner"), Value::from(1))]).unwrap();
        let err = kubernetes_annotations(&not_string, "annotations").unwrap_err();
        assert_eq!(
            err.message(),
            "Expected value at index 0 of 'annotations' to be a string"
        );
        assert!(kubernetes_annotations(&Value::from("x"), "annotations").is_err());
    }

    #[test]
    fn test_email_and_assertion() {
        assert!(email_address(&Value::from("dev@example.com"), "email").is_ok());
        assert!(email_address(&Value::from("not-an-email"), "email").is_err());
        assert!(assertion_token(&Value::from("NOT_IN"), "assertion").is_ok());
        assert!(assertion_token(&Value::from("~="), "assertion").is_err());
    }
}
