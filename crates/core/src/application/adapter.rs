//! Input Adapter - turns script-supplied condition lists into `Vec<Condition>`
//!
//! Every supported representation is viewed through one capability,
//! `ConditionSequence` (length + indexed unwrap). `normalize` picks the view
//! by the `ScriptValue` tag and walks it in index order.

use crate::domain::{Condition, NativeElement, Operator, ScriptValue};
use crate::error::{EvalError, Result};
use tracing::warn;

/// An ordered, length-known sequence of opaque condition records
pub trait ConditionSequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unwrap the record at `index`
    ///
    /// # Errors
    /// - EvalError::InvalidElement if the record is not a condition
    /// - EvalError::UnknownOperator if its operator is out of range
    fn condition_at(&self, index: usize) -> Result<Condition>;
}

/// Normalize a script value into conditions, preserving order
///
/// # Errors
/// - EvalError::UnrecognizedRepresentation if `params` holds no sequence
/// - Any element error from `ConditionSequence::condition_at`
pub fn normalize(params: &ScriptValue) -> Result<Vec<Condition>> {
    let result = sequence_of(params).and_then(|sequence| {
        (0..sequence.len())
            .map(|index| sequence.condition_at(index))
            .collect::<Result<Vec<_>>>()
    });

    if let Err(e) = &result {
        warn!(representation = params.kind(), error = %e, "Cannot normalize conditions parameter");
    }
    result
}

fn sequence_of(params: &ScriptValue) -> Result<Box<dyn ConditionSequence + '_>> {
    match params {
        ScriptValue::Json(serde_json::Value::Array(items)) => Ok(Box::new(JsonSequence(items))),
        ScriptValue::Toml(toml::Value::Array(items)) => Ok(Box::new(TomlSequence(items))),
        ScriptValue::Native(items) => Ok(Box::new(NativeSequence(items))),
        other => Err(EvalError::UnrecognizedRepresentation(other.to_string())),
    }
}

// ============================================================================
// Record decoding shared by the text-based representations
// ============================================================================

/// Scalar view over JSON/TOML leaves
enum Scalar<'a> {
    Str(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
    Other,
}

impl<'a> From<&'a serde_json::Value> for Scalar<'a> {
    fn from(value: &'a serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Scalar::Str(s),
            serde_json::Value::Bool(b) => Scalar::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Other),
            },
            _ => Scalar::Other,
        }
    }
}

impl<'a> From<&'a toml::Value> for Scalar<'a> {
    fn from(value: &'a toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Scalar::Str(s),
            toml::Value::Integer(i) => Scalar::Int(*i),
            toml::Value::Float(f) => Scalar::Float(*f),
            toml::Value::Boolean(b) => Scalar::Bool(*b),
            _ => Scalar::Other,
        }
    }
}

fn json_field<'a>(record: &'a serde_json::Map<String, serde_json::Value>, key: &str) -> Scalar<'a> {
    record.get(key).map(Scalar::from).unwrap_or(Scalar::Other)
}

fn toml_field<'a>(record: &'a toml::Table, key: &str) -> Scalar<'a> {
    record.get(key).map(Scalar::from).unwrap_or(Scalar::Other)
}

fn invalid(index: usize, reason: impl Into<String>) -> EvalError {
    EvalError::InvalidElement {
        index,
        reason: reason.into(),
    }
}

/// Build a condition from the three record fields
fn decode_record(index: usize, name: Scalar<'_>, operator: Scalar<'_>, value: Scalar<'_>) -> Result<Condition> {
    let name = match name {
        Scalar::Str(s) if !s.is_empty() => s.to_string(),
        _ => return Err(invalid(index, "name must be a non-empty string")),
    };

    let operator = match operator {
        Scalar::Int(code) => i32::try_from(code)
            .map_err(|_| EvalError::UnknownOperator(code.to_string()))
            .and_then(Operator::try_from)?,
        Scalar::Str(s) => s.parse::<Operator>()?,
        _ => return Err(invalid(index, "operator must be a code or an operator name")),
    };

    let value = match value {
        Scalar::Str(s) => s.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Other => return Err(invalid(index, "value must be a scalar")),
    };

    Ok(Condition::new(name, operator, value))
}

// ============================================================================
// Representations
// ============================================================================

struct JsonSequence<'a>(&'a [serde_json::Value]);

impl ConditionSequence for JsonSequence<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn condition_at(&self, index: usize) -> Result<Condition> {
        match self.0.get(index) {
            Some(serde_json::Value::Object(record)) => decode_record(
                index,
                json_field(record, "name"),
                json_field(record, "operator"),
                json_field(record, "value"),
            ),
            Some(serde_json::Value::Array(triple)) if triple.len() == 3 => {
                decode_record(index, (&triple[0]).into(), (&triple[1]).into(), (&triple[2]).into())
            }
            Some(other) => Err(invalid(index, format!("not a condition record: {}", other))),
            None => Err(invalid(index, "out of range")),
        }
    }
}

struct TomlSequence<'a>(&'a [toml::Value]);

impl ConditionSequence for TomlSequence<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn condition_at(&self, index: usize) -> Result<Condition> {
        match self.0.get(index) {
            Some(toml::Value::Table(record)) => decode_record(
                index,
                toml_field(record, "name"),
                toml_field(record, "operator"),
                toml_field(record, "value"),
            ),
            Some(toml::Value::Array(triple)) if triple.len() == 3 => {
                decode_record(index, (&triple[0]).into(), (&triple[1]).into(), (&triple[2]).into())
            }
            Some(other) => Err(invalid(index, format!("not a condition record: {}", other))),
            None => Err(invalid(index, "out of range")),
        }
    }
}

struct NativeSequence<'a>(&'a [NativeElement]);

impl ConditionSequence for NativeSequence<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn condition_at(&self, index: usize) -> Result<Condition> {
        self.0
            .get(index)
            .ok_or_else(|| invalid(index, "out of range"))?
            .downcast_ref::<Condition>()
            .cloned()
            .ok_or_else(|| invalid(index, "element is not a Condition"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_objects_and_triples() {
        let params = ScriptValue::Json(json!([
            {"name": "cores", "operator": 2, "value": "4"},
            ["os", "MATCH", "Linux"],
            {"name": "ram", "operator": "<", "value": 65536},
        ]));

        let conditions = normalize(&params).unwrap();
        assert_eq!(
            conditions,
            vec![
                Condition::new("cores", Operator::GreaterThan, "4"),
                Condition::new("os", Operator::Match, "Linux"),
                Condition::new("ram", Operator::LessThan, "65536"),
            ]
        );
    }

    #[test]
    fn test_toml_tables() {
        let doc: toml::Table = toml::from_str(
            r#"
            conditions = [
                { name = "cuda", operator = 3, value = true },
                ["load", 1, 0.75],
            ]
            "#,
        )
        .unwrap();
        let params = ScriptValue::Toml(doc.get("conditions").cloned().unwrap());

        let conditions = normalize(&params).unwrap();
        assert_eq!(conditions[0], Condition::new("cuda", Operator::Equal, "true"));
        assert_eq!(conditions[1], Condition::new("load", Operator::LessThan, "0.75"));
    }

    #[test]
    fn test_native_preserves_order() {
        let params = ScriptValue::Native(
            (0..5)
                .map(|i| Box::new(Condition::new(format!("k{}", i), Operator::Equal, "v")) as NativeElement)
                .collect(),
        );

        let names: Vec<String> = normalize(&params)
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["k0", "k1", "k2", "k3", "k4"]);
    }

    #[test]
    fn test_empty_sequences_are_valid() {
        assert!(normalize(&ScriptValue::Json(json!([]))).unwrap().is_empty());
        assert!(normalize(&ScriptValue::Native(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn test_plain_value_is_unrecognized() {
        for params in [
            ScriptValue::Json(json!("cores > 4")),
            ScriptValue::Json(json!({"name": "cores", "operator": 2, "value": "4"})),
            ScriptValue::Toml(toml::Value::Integer(3)),
        ] {
            let err = normalize(&params).unwrap_err();
            assert!(matches!(err, EvalError::UnrecognizedRepresentation(_)), "{:?}", params);
        }

        let err = normalize(&ScriptValue::Json(json!(42))).unwrap_err();
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_native_element_must_be_condition() {
        let params = ScriptValue::Native(vec![
            Box::new(Condition::new("a", Operator::Equal, "b")) as NativeElement,
            Box::new("a == b".to_string()),
        ]);
        assert!(matches!(
            normalize(&params),
            Err(EvalError::InvalidElement { index: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_operator_named_in_error() {
        let params = ScriptValue::Json(json!([["cores", 9, "4"]]));
        let err = normalize(&params).unwrap_err();
        assert!(matches!(err, EvalError::UnknownOperator(ref op) if op == "9"));

        let params = ScriptValue::Json(json!([["cores", "INFERIOR", "4"]]));
        assert!(matches!(normalize(&params), Err(EvalError::UnknownOperator(_))));
    }

    #[test]
    fn test_bad_records() {
        let cases = [
            json!([["cores", 2]]),
            json!([{"operator": 2, "value": "4"}]),
            json!([{"name": "cores", "operator": 2, "value": [1]}]),
            json!([7]),
        ];
        for case in cases {
            assert!(
                matches!(normalize(&ScriptValue::Json(case.clone())), Err(EvalError::InvalidElement { index: 0, .. })),
                "{}",
                case
            );
        }
    }
}
