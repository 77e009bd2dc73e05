// Domain Layer - conditions, facts and script values

pub mod condition;
pub mod facts;
pub mod script_value;

// Re-exports
pub use condition::{Condition, Operator, EQUAL, GREATER_THAN, LESS_THAN, MATCH};
pub use facts::FactMap;
pub use script_value::{NativeElement, ScriptValue};
