//! Declarative field validation for incoming JSON records.
//!
//! A schema is an ordered slice of [`FieldSpec`]. Fields are checked in
//! declaration order and the first violation wins, so the error a caller sees
//! for a record with several problems is stable.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    /// A string that contains `@`.
    Email,
    /// One of an exact, lowercase set of strings.
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("data must be a valid object")]
    NotAnObject,
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a valid {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} must be one of: {}", .allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        allowed: &'static [&'static str],
    },
    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str },
    #[error("{field} must be a valid string")]
    InvalidKey { field: &'static str },
    #[error("no valid fields to update")]
    NoValidFields,
}

pub fn as_object(data: &Value) -> Result<&Map<String, Value>, ValidationError> {
    data.as_object().ok_or(ValidationError::NotAnObject)
}

/// Absent, `null` and `""` all count as not provided.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

pub fn check_kind(field: &'static str, kind: FieldKind, value: &Value) -> Result<(), ValidationError> {
    match (kind, value) {
        (FieldKind::String, Value::String(_)) => Ok(()),
        (FieldKind::String, _) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
        (FieldKind::Number, Value::Number(_)) => Ok(()),
        (FieldKind::Number, _) => Err(ValidationError::WrongType {
            field,
            expected: "number",
        }),
        (FieldKind::Boolean, Value::Bool(_)) => Ok(()),
        (FieldKind::Boolean, _) => Err(ValidationError::WrongType {
            field,
            expected: "boolean",
        }),
        (FieldKind::Email, Value::String(s)) if s.contains('@') => Ok(()),
        (FieldKind::Email, Value::String(_)) => Err(ValidationError::InvalidEmail { field }),
        (FieldKind::Email, _) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
        (FieldKind::Enum(allowed), Value::String(s)) if allowed.contains(&s.as_str()) => Ok(()),
        (FieldKind::Enum(allowed), Value::String(_)) => {
            Err(ValidationError::InvalidEnum { field, allowed })
        }
        (FieldKind::Enum(_), _) => Err(ValidationError::WrongType {
            field,
            expected: "string",
        }),
    }
}

/// Check a whole record against `schema`.
pub fn validate(data: &Value, schema: &[FieldSpec]) -> Result<(), ValidationError> {
    let record = as_object(data)?;
    for spec in schema {
        let value = record.get(spec.name);
        if is_blank(value) {
            if spec.required {
                return Err(ValidationError::Missing { field: spec.name });
            }
            continue;
        }
        if let Some(value) = value {
            check_kind(spec.name, spec.kind, value)?;
        }
    }
    Ok(())
}

/// Copy the schema's fields out of `data`, dropping blanks and anything the
/// schema does not name. Run [`validate`] first.
pub fn pick(data: &Value, schema: &[FieldSpec]) -> Result<Document, ValidationError> {
    let record = as_object(data)?;
    Ok(schema
        .iter()
        .filter_map(|spec| match record.get(spec.name) {
            Some(value) if !is_blank(Some(value)) => Some((spec.name.to_string(), value.clone())),
            _ => None,
        })
        .collect())
}

/// Reduce an update payload to the allow-listed fields.
///
/// Unknown keys are dropped silently. A present allow-listed key must pass
/// its type check; `null` clears an optional field but is rejected for a
/// required one. An empty result is an error.
pub fn filter_update(partial: &Value, allowed: &[FieldSpec]) -> Result<Document, ValidationError> {
    let record = as_object(partial)?;
    let mut updates = Document::new();
    for spec in allowed {
        let Some(value) = record.get(spec.name) else {
            continue;
        };
        if is_blank(Some(value)) {
            if spec.required {
                return Err(ValidationError::Missing { field: spec.name });
            }
            updates.insert(spec.name.to_string(), Value::Null);
            continue;
        }
        check_kind(spec.name, spec.kind, value)?;
        updates.insert(spec.name.to_string(), value.clone());
    }
    if updates.is_empty() {
        return Err(ValidationError::NoValidFields);
    }
    Ok(updates)
}

pub fn require_key(field: &'static str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::InvalidKey { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GENDERS: &[&str] = &["male", "female"];
    const SCHEMA: &[FieldSpec] = &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("email", FieldKind::Email),
        FieldSpec::required("gender", FieldKind::Enum(GENDERS)),
        FieldSpec::optional("umur", FieldKind::Number),
        FieldSpec::optional("konsumsiBuah", FieldKind::Boolean),
    ];

    #[test]
    fn rejects_non_objects() {
        assert_eq!(validate(&json!("x"), SCHEMA), Err(ValidationError::NotAnObject));
        assert_eq!(validate(&Value::Null, SCHEMA), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn reports_first_failing_field_in_declaration_order() {
        let err = validate(&json!({}), SCHEMA).unwrap_err();
        assert_eq!(err.to_string(), "name is required");

        let err = validate(&json!({ "name": 1, "email": 2 }), SCHEMA).unwrap_err();
        assert_eq!(err.to_string(), "name must be a valid string");

        let err = validate(&json!({ "name": "John", "gender": "Male" }), SCHEMA).unwrap_err();
        assert_eq!(err.to_string(), "email is required");
    }

    #[test]
    fn enum_values_are_exact_and_lowercase() {
        let data = json!({ "name": "John", "email": "j@x.com", "gender": "Male" });
        assert_eq!(
            validate(&data, SCHEMA).unwrap_err().to_string(),
            "gender must be one of: male, female"
        );
    }

    #[test]
    fn email_needs_an_at_sign() {
        let data = json!({ "name": "John", "email": "john.x.com", "gender": "male" });
        assert_eq!(
            validate(&data, SCHEMA),
            Err(ValidationError::InvalidEmail { field: "email" })
        );
    }

    #[test]
    fn optional_fields_are_typed_strictly() {
        let base = json!({ "name": "John", "email": "j@x.com", "gender": "male" });
        assert!(validate(&base, SCHEMA).is_ok());

        let mut data = base.clone();
        data["umur"] = json!("30");
        assert_eq!(
            validate(&data, SCHEMA).unwrap_err().to_string(),
            "umur must be a valid number"
        );

        let mut data = base;
        data["konsumsiBuah"] = json!(1);
        assert_eq!(
            validate(&data, SCHEMA).unwrap_err().to_string(),
            "konsumsiBuah must be a valid boolean"
        );
    }

    #[test]
    fn zero_and_false_count_as_present() {
        let data = json!({ "name": "John", "email": "j@x.com", "gender": "male", "umur": 0, "konsumsiBuah": false });
        assert!(validate(&data, SCHEMA).is_ok());
        let picked = pick(&data, SCHEMA).unwrap();
        assert_eq!(picked["umur"], 0);
        assert_eq!(picked["konsumsiBuah"], false);
    }

    #[test]
    fn pick_drops_unknown_and_blank_fields() {
        let data = json!({ "name": "John", "email": "j@x.com", "gender": "male", "umur": null, "role": "admin" });
        let picked = pick(&data, SCHEMA).unwrap();
        assert_eq!(picked.len(), 3);
        assert!(!picked.contains_key("role"));
        assert!(!picked.contains_key("umur"));
    }

    #[test]
    fn update_filter_drops_unknown_keys() {
        assert_eq!(
            filter_update(&json!({ "unknownField": "x" }), SCHEMA),
            Err(ValidationError::NoValidFields)
        );
        let updates = filter_update(&json!({ "name": "x", "unknownField": "y" }), SCHEMA).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates["name"], "x");
    }

    #[test]
    fn update_filter_type_checks_allowed_keys() {
        assert_eq!(
            filter_update(&json!({ "gender": "other" }), SCHEMA).unwrap_err().to_string(),
            "gender must be one of: male, female"
        );
        assert_eq!(
            filter_update(&json!({ "name": null }), SCHEMA),
            Err(ValidationError::Missing { field: "name" })
        );
        let cleared = filter_update(&json!({ "umur": null }), SCHEMA).unwrap();
        assert_eq!(cleared["umur"], Value::Null);
    }

    #[test]
    fn keys_must_be_non_empty() {
        assert!(require_key("userId", "abc").is_ok());
        assert_eq!(
            require_key("userId", "  ").unwrap_err().to_string(),
            "userId must be a valid string"
        );
    }
}
