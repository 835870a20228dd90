//! Typed access to operation arguments.
//!
//! Query-string arguments arrive as strings, JSON bodies may carry numbers,
//! so numeric accessors accept both.

use apilama_core::Arguments;
use serde_json::Value;

use crate::error::{LocalError, LocalResult};

pub(crate) fn optional_str<'a>(args: &'a Arguments, name: &str) -> LocalResult<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(LocalError::InvalidArgument(format!(
            "Argument '{}' must be a string, got {}",
            name,
            type_name(other)
        ))),
    }
}

pub(crate) fn required_str<'a>(args: &'a Arguments, name: &str) -> LocalResult<&'a str> {
    optional_str(args, name)?
        .ok_or_else(|| LocalError::InvalidArgument(format!("Missing required argument: {}", name)))
}

/// First present string among `names`
pub(crate) fn first_str<'a>(args: &'a Arguments, names: &[&str]) -> LocalResult<&'a str> {
    for name in names {
        if let Some(value) = optional_str(args, name)?.filter(|s| !s.is_empty()) {
            return Ok(value);
        }
    }
    Err(LocalError::InvalidArgument(format!(
        "Missing required argument: {}",
        names.join(" or ")
    )))
}

pub(crate) fn optional_u64(args: &Arguments, name: &str) -> LocalResult<Option<u64>> {
    let invalid = || {
        LocalError::InvalidArgument(format!(
            "Argument '{}' must be a non-negative integer",
            name
        ))
    };

    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn test_required_str_rejects_wrong_type() {
        let a = args(json!({"filename": 42}));
        let err = required_str(&a, "filename").unwrap_err();
        assert!(err.to_string().contains("must be a string, got number"));
    }

    #[test]
    fn test_first_str_skips_empty() {
        let a = args(json!({"path": "", "filename": "a.md"}));
        assert_eq!(first_str(&a, &["path", "filename"]).unwrap(), "a.md");
    }

    #[test]
    fn test_optional_u64_accepts_strings() {
        let a = args(json!({"timeout_ms": "1500", "n": 7, "bad": "x"}));
        assert_eq!(optional_u64(&a, "timeout_ms").unwrap(), Some(1500));
        assert_eq!(optional_u64(&a, "n").unwrap(), Some(7));
        assert_eq!(optional_u64(&a, "missing").unwrap(), None);
        assert!(optional_u64(&a, "bad").is_err());
    }
}
