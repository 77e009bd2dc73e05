// Condition Domain Model

use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Less than operator
pub const LESS_THAN: i32 = 1;
/// Greater than operator
pub const GREATER_THAN: i32 = 2;
/// Equal operator
pub const EQUAL: i32 = 3;
/// Substring matching operator
pub const MATCH: i32 = 4;

/// Comparison kind of a condition
///
/// The integer codes are a public contract shared with selection scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Operator {
    LessThan,
    GreaterThan,
    Equal,
    Match,
}

impl Operator {
    pub fn code(self) -> i32 {
        match self {
            Operator::LessThan => LESS_THAN,
            Operator::GreaterThan => GREATER_THAN,
            Operator::Equal => EQUAL,
            Operator::Match => MATCH,
        }
    }
}

impl TryFrom<i32> for Operator {
    type Error = EvalError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            LESS_THAN => Ok(Operator::LessThan),
            GREATER_THAN => Ok(Operator::GreaterThan),
            EQUAL => Ok(Operator::Equal),
            MATCH => Ok(Operator::Match),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

impl From<Operator> for i32 {
    fn from(op: Operator) -> Self {
        op.code()
    }
}

impl FromStr for Operator {
    type Err = EvalError;

    /// Accepts the integer code, the constant name or a symbol
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i32>() {
            return Operator::try_from(code);
        }
        match s.to_ascii_uppercase().as_str() {
            "LESS_THAN" | "<" => Ok(Operator::LessThan),
            "GREATER_THAN" | ">" => Ok(Operator::GreaterThan),
            "EQUAL" | "=" | "==" => Ok(Operator::Equal),
            "MATCH" | "~" => Ok(Operator::Match),
            _ => Err(EvalError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::LessThan => write!(f, "LESS_THAN"),
            Operator::GreaterThan => write!(f, "GREATER_THAN"),
            Operator::Equal => write!(f, "EQUAL"),
            Operator::Match => write!(f, "MATCH"),
        }
    }
}

/// One atomic placement requirement: fact name, operator, expected value
///
/// Immutable once built. An out-of-range operator code is rejected at
/// construction, so a `Condition` always carries one of the four operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    name: String,
    operator: Operator,
    value: String,
}

impl Condition {
    pub fn new(name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator,
            value: value.into(),
        }
    }

    /// Build from the `(name, code, value)` record shape used by scripts
    ///
    /// # Errors
    /// - EvalError::UnknownOperator if `code` is not one of 1..=4
    pub fn from_code(name: impl Into<String>, code: i32, value: impl Into<String>) -> Result<Self> {
        Ok(Self::new(name, Operator::try_from(code)?, value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.name, self.operator, self.value)
    }
}
