// Script Value - condition lists as handed in by selection-script front ends

use std::any::Any;
use std::fmt;

/// A boxed element of a native condition list
pub type NativeElement = Box<dyn Any + Send + Sync>;

/// Condition-list representations accepted from selection scripts
///
/// Each case is a foreign sequence of opaque condition records. Supporting a
/// new front end means adding a case here and a `ConditionSequence` for it in
/// `application::adapter`; the evaluator never sees which one was used.
pub enum ScriptValue {
    /// JSON front ends: an array of `{name, operator, value}` objects or `[name, operator, value]` triples
    Json(serde_json::Value),
    /// TOML front ends: an array of tables or triples
    Toml(toml::Value),
    /// Rust hosts: boxed `Condition` values
    Native(Vec<NativeElement>),
}

impl ScriptValue {
    /// Short name of the representation, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ScriptValue::Json(_) => "json",
            ScriptValue::Toml(_) => "toml",
            ScriptValue::Native(_) => "native",
        }
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Json(v) => f.debug_tuple("Json").field(v).finish(),
            ScriptValue::Toml(v) => f.debug_tuple("Toml").field(v).finish(),
            ScriptValue::Native(v) => write!(f, "Native([{} elements])", v.len()),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Json(v) => write!(f, "{}", v),
            ScriptValue::Toml(v) => write!(f, "{}", v),
            ScriptValue::Native(v) => write!(f, "<native list of {}>", v.len()),
        }
    }
}

impl From<serde_json::Value> for ScriptValue {
    fn from(value: serde_json::Value) -> Self {
        ScriptValue::Json(value)
    }
}

impl From<toml::Value> for ScriptValue {
    fn from(value: toml::Value) -> Self {
        ScriptValue::Toml(value)
    }
}

impl From<Vec<NativeElement>> for ScriptValue {
    fn from(value: Vec<NativeElement>) -> Self {
        ScriptValue::Native(value)
    }
}
