// Application Layer - evaluation, input adaptation and probing

pub mod adapter;
pub mod constants;
pub mod evaluator;
pub mod probes;

// Re-exports
pub use adapter::{normalize, ConditionSequence};
pub use evaluator::{evaluate, try_evaluate, ConditionEvaluator, ConditionOutcome};
pub use probes::{find_in_search_path, PlatformProbes};
