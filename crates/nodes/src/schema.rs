//! Structural descriptors for node configuration and payloads.
//!
//! A [`Schema`] is a deliberately small JSON-schema-like shape: either
//! "anything" or an object with typed, optionally-required fields. It is
//! what the graph validator checks raw node configs against, and what
//! preview tooling reads to render forms.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON shape a field may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Any,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Any => true,
        }
    }
}

/// One named field of an object schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }
}

/// A structural descriptor for a JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    /// Any JSON value is accepted.
    Any,
    /// A JSON object with the given fields. Unknown extra keys are allowed.
    Object { fields: Vec<Field> },
}

impl Schema {
    pub fn any() -> Self {
        Self::Any
    }

    pub fn object(fields: impl Into<Vec<Field>>) -> Self {
        Self::Object {
            fields: fields.into(),
        }
    }

    /// Check `value` against this schema.
    ///
    /// Template placeholders have not been resolved when this runs, so a
    /// string is accepted wherever a string is expected even if it still
    /// contains `{{...}}` references.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        let fields = match self {
            Self::Any => return Ok(()),
            Self::Object { fields } => fields,
        };

        let map = match value {
            Value::Object(map) => map,
            // A null config is fine when nothing is required.
            Value::Null if fields.iter().all(|f| !f.required) => return Ok(()),
            other => {
                return Err(format!(
                    "expected a config object, got {}",
                    type_name(other)
                ));
            }
        };

        for field in fields {
            match map.get(&field.name) {
                Some(v) => {
                    if !field.field_type.matches(v) {
                        return Err(format!(
                            "field '{}' should be {:?}, got {}",
                            field.name,
                            field.field_type,
                            type_name(v)
                        ));
                    }
                }
                None if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None => {}
            }
        }

        Ok(())
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

    fn echo_schema() -> Schema {
        Schema::object(vec![
            Field::required("text", FieldType::String),
            Field::optional("prefix", FieldType::String),
        ])
    }

    #[test]
    fn any_accepts_everything() {
        assert!(Schema::any().validate(&json!(null)).is_ok());
        assert!(Schema::any().validate(&json!([1, 2])).is_ok());
    }

    #[test]
    fn required_field_must_be_present() {
        let err = echo_schema().validate(&json!({ "prefix": "x" })).unwrap_err();
        assert!(err.contains("text"));
    }

    #[test]
    fn field_type_is_enforced() {
        let err = echo_schema().validate(&json!({ "text": 42 })).unwrap_err();
        assert!(err.contains("text"));
    }

    #[test]
    fn optional_fields_may_be_absent() {
        assert!(echo_schema().validate(&json!({ "text": "hi" })).is_ok());
    }

    #[test]
    fn null_config_needs_no_required_fields() {
        let optional_only = Schema::object(vec![Field::optional("value", FieldType::Any)]);
        assert!(optional_only.validate(&Value::Null).is_ok());
        assert!(echo_schema().validate(&Value::Null).is_err());
    }

    #[test]
    fn unresolved_templates_still_count_as_strings() {
        assert!(echo_schema()
            .validate(&json!({ "text": "{{upstream.output}}" }))
            .is_ok());
    }
}
