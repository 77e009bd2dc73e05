//! Condition Evaluator - decides whether a node's facts satisfy a job's conditions
//!
//! - `evaluate`: one condition against an already-loaded `FactMap`
//! - `ConditionEvaluator::evaluate_all`: load a fact store once, AND all
//!   conditions left to right, stop at the first failure
//! - `ConditionEvaluator::check_properties`: normalize a script value first
//!
//! The boolean forms never fail: every error is logged and becomes `false`.

use crate::application::adapter::normalize;
use crate::domain::{Condition, FactMap, Operator, ScriptValue};
use crate::error::{EvalError, Result};
use crate::port::FactStore;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Evaluate one condition, keeping the failure cause
///
/// # Errors
/// - EvalError::MissingFact if the fact is absent
/// - EvalError::NotNumeric if an ordering operator meets a non-number
pub fn try_evaluate(facts: &FactMap, condition: &Condition) -> Result<bool> {
    let fact = facts
        .get(condition.name())
        .ok_or_else(|| EvalError::MissingFact(condition.name().to_string()))?;

    match condition.operator() {
        Operator::LessThan => Ok(parse_number(fact)? < parse_number(condition.value())?),
        Operator::GreaterThan => Ok(parse_number(fact)? > parse_number(condition.value())?),
        Operator::Equal => Ok(fact == condition.value()),
        Operator::Match => Ok(fact.contains(condition.value())),
    }
}

/// Evaluate one condition; any failure is `false`
pub fn evaluate(facts: &FactMap, condition: &Condition) -> bool {
    match try_evaluate(facts, condition) {
        Ok(satisfied) => {
            debug!(condition = %condition, satisfied, "Condition evaluated");
            satisfied
        }
        Err(e) => {
            debug!(condition = %condition, error = %e, "Condition failed");
            false
        }
    }
}

/// Decimal parse: surrounding whitespace and a trailing `d`/`f` type suffix are tolerated
///
/// Only digit-led decimals count; `inf`, `infinity` and `nan` are not numbers here.
fn parse_number(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(EvalError::NotNumeric(raw.to_string()));
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Ok(n);
    }
    trimmed
        .strip_suffix(['d', 'D', 'f', 'F'])
        .filter(|s| !s.is_empty() && !s.ends_with(['e', 'E', '+', '-']))
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| EvalError::NotNumeric(raw.to_string()))
}

/// Per-condition result, for explaining a decision
#[derive(Debug, Clone)]
pub struct ConditionOutcome {
    pub condition: Condition,
    pub satisfied: bool,
    /// Why the condition failed, if it failed on an error rather than a comparison
    pub reason: Option<String>,
}

/// Evaluates condition lists against a fact store
pub struct ConditionEvaluator {
    fact_store: Arc<dyn FactStore>,
}

impl ConditionEvaluator {
    pub fn new(fact_store: Arc<dyn FactStore>) -> Self {
        Self { fact_store }
    }

    /// AND of `conditions` against the facts at `fact_store_path`
    ///
    /// The store is loaded before looking at any condition, so an empty list
    /// still fails on a missing store. Conditions are consumed in order and
    /// the first `false` stops iteration.
    ///
    /// # Errors
    /// - Only fact-store load errors; failing conditions are `Ok(false)`
    pub fn try_evaluate_all<'a, I>(&self, fact_store_path: &Path, conditions: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a Condition>,
    {
        let facts = self.fact_store.load(fact_store_path)?;

        for condition in conditions {
            if !evaluate(&facts, condition) {
                debug!(
                    path = %fact_store_path.display(),
                    condition = %condition,
                    "Condition not satisfied, skipping the rest"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// `try_evaluate_all` with load failures collapsed to `false`
    pub fn evaluate_all<'a, I>(&self, fact_store_path: &Path, conditions: I) -> bool
    where
        I: IntoIterator<Item = &'a Condition>,
    {
        self.try_evaluate_all(fact_store_path, conditions)
            .unwrap_or_else(|e| {
                warn!(path = %fact_store_path.display(), error = %e, "Fact store load failed");
                false
            })
    }

    /// Load the store and evaluate exactly one condition
    ///
    /// # Errors
    /// - Load errors and the condition's own failure cause
    pub fn try_evaluate_one(&self, fact_store_path: &Path, condition: &Condition) -> Result<bool> {
        let facts = self.fact_store.load(fact_store_path)?;
        try_evaluate(&facts, condition)
    }

    pub fn evaluate_one(&self, fact_store_path: &Path, condition: &Condition) -> bool {
        match self.fact_store.load(fact_store_path) {
            Ok(facts) => evaluate(&facts, condition),
            Err(e) => {
                warn!(path = %fact_store_path.display(), error = %e, "Fact store load failed");
                false
            }
        }
    }

    /// Normalize a script-supplied condition list, then `evaluate_all`
    ///
    /// # Errors
    /// - Normalization errors (unrecognized representation, bad element, unknown operator)
    /// - Fact-store load errors
    pub fn try_check_properties(&self, fact_store_path: &Path, params: &ScriptValue) -> Result<bool> {
        let conditions = normalize(params)?;
        self.try_evaluate_all(fact_store_path, &conditions)
    }

    /// True iff every condition in `params` holds for the facts at `fact_store_path`
    pub fn check_properties(&self, fact_store_path: &Path, params: &ScriptValue) -> bool {
        self.try_check_properties(fact_store_path, params)
            .unwrap_or_else(|e| {
                warn!(
                    path = %fact_store_path.display(),
                    representation = params.kind(),
                    error = %e,
                    "Condition list rejected"
                );
                false
            })
    }

    /// Evaluate every condition without short-circuit and report each outcome
    ///
    /// # Errors
    /// - Fact-store load errors
    pub fn explain(&self, fact_store_path: &Path, conditions: &[Condition]) -> Result<Vec<ConditionOutcome>> {
        let facts = self.fact_store.load(fact_store_path)?;
        Ok(conditions
            .iter()
            .map(|condition| {
                let (satisfied, reason) = match try_evaluate(&facts, condition) {
                    Ok(satisfied) => (satisfied, None),
                    Err(e) => (false, Some(e.to_string())),
                };
                ConditionOutcome {
                    condition: condition.clone(),
                    satisfied,
                    reason,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NativeElement;
    use crate::port::fact_store::mocks::MockFactStore;
    use std::cell::Cell;
    use std::path::PathBuf;

    const NODE: [(&str, &str); 5] = [
        ("cores", "3"),
        ("os", "Linux x86_64"),
        ("name", "Linux"),
        ("ram", " 2048 "),
        ("gpu", "none"),
    ];

    fn facts() -> FactMap {
        NODE.into_iter().collect()
    }

    fn store() -> (Arc<MockFactStore>, PathBuf) {
        let path = PathBuf::from("/etc/nodegate/node.properties");
        let store = Arc::new(MockFactStore::with_facts(path.clone(), NODE));
        (store, path)
    }

    #[test]
    fn test_numeric_operators() {
        let f = facts();
        assert!(evaluate(&f, &Condition::new("cores", Operator::LessThan, "5")));
        assert!(!evaluate(&f, &Condition::new("cores", Operator::GreaterThan, "5")));
        assert!(evaluate(&f, &Condition::new("cores", Operator::GreaterThan, "2.5")));
        assert!(evaluate(&f, &Condition::new("ram", Operator::GreaterThan, "1024")));
        // strict comparisons
        assert!(!evaluate(&f, &Condition::new("cores", Operator::LessThan, "3")));
    }

    #[test]
    fn test_non_numeric_is_false_not_error() {
        let f = facts();
        let condition = Condition::new("gpu", Operator::GreaterThan, "1");
        assert!(!evaluate(&f, &condition));
        assert!(matches!(
            try_evaluate(&f, &condition),
            Err(EvalError::NotNumeric(ref v)) if v == "none"
        ));

        let bad_value = Condition::new("cores", Operator::LessThan, "many");
        assert!(matches!(try_evaluate(&f, &bad_value), Err(EvalError::NotNumeric(_))));
    }

    #[test]
    fn test_equal_is_case_sensitive() {
        let f = facts();
        assert!(evaluate(&f, &Condition::new("name", Operator::Equal, "Linux")));
        assert!(!evaluate(&f, &Condition::new("name", Operator::Equal, "linux")));
    }

    #[test]
    fn test_match_is_substring_not_regex() {
        let f = facts();
        assert!(evaluate(&f, &Condition::new("os", Operator::Match, "x86")));
        assert!(!evaluate(&f, &Condition::new("os", Operator::Match, "x8.")));
    }

    #[test]
    fn test_missing_fact() {
        let condition = Condition::new("cuda", Operator::Equal, "yes");
        assert!(!evaluate(&facts(), &condition));
        assert!(matches!(
            try_evaluate(&facts(), &condition),
            Err(EvalError::MissingFact(ref k)) if k == "cuda"
        ));
    }

    #[test]
    fn test_parse_number_suffixes() {
        assert_eq!(parse_number("2.5d").unwrap(), 2.5);
        assert_eq!(parse_number(" 1e3 ").unwrap(), 1000.0);
        assert!(parse_number("d").is_err());
        assert!(parse_number("").is_err());
        assert_eq!(parse_number("-.5").unwrap(), -0.5);
        assert_eq!(parse_number("+7F").unwrap(), 7.0);
    }

    #[test]
    fn test_infinity_and_nan_are_not_numbers() {
        for word in ["inf", "Infinity", "-inf", "+INFINITY", "NaN", "nan"] {
            assert!(
                matches!(parse_number(word), Err(EvalError::NotNumeric(_))),
                "{} parsed as a number",
                word
            );
        }

        let f: FactMap = [("gpus", "inf")].into_iter().collect();
        let condition = Condition::new("gpus", Operator::GreaterThan, "5");
        assert!(!evaluate(&f, &condition));
        assert!(matches!(try_evaluate(&f, &condition), Err(EvalError::NotNumeric(_))));
        assert!(!evaluate(&facts(), &Condition::new("cores", Operator::LessThan, "Infinity")));
    }

    #[test]
    fn test_evaluate_all_is_and() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store);

        let all_true = vec![
            Condition::new("cores", Operator::LessThan, "5"),
            Condition::new("os", Operator::Match, "Linux"),
        ];
        assert!(evaluator.evaluate_all(&path, &all_true));

        let one_false = vec![
            Condition::new("cores", Operator::LessThan, "5"),
            Condition::new("name", Operator::Equal, "Windows"),
        ];
        assert!(!evaluator.evaluate_all(&path, &one_false));
    }

    #[test]
    fn test_empty_list_is_true_when_store_loads() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store.clone());
        assert!(evaluator.evaluate_all(&path, &Vec::<Condition>::new()));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn test_missing_store_fails_even_for_empty_list() {
        let store = Arc::new(MockFactStore::new());
        let evaluator = ConditionEvaluator::new(store.clone());
        let missing = Path::new("/nowhere/node.properties");

        assert!(!evaluator.evaluate_all(missing, &Vec::<Condition>::new()));
        assert!(!evaluator.evaluate_all(missing, &[Condition::new("a", Operator::Equal, "b")]));
        assert!(matches!(
            evaluator.try_evaluate_all(missing, &Vec::<Condition>::new()),
            Err(EvalError::FactStoreUnavailable { .. })
        ));
        assert_eq!(store.load_count(), 3);
    }

    #[test]
    fn test_short_circuit_stops_at_first_failure() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store);
        let conditions = vec![
            Condition::new("name", Operator::Equal, "Windows"),
            Condition::new("cores", Operator::LessThan, "5"),
            Condition::new("os", Operator::Match, "Linux"),
        ];

        let visited = Cell::new(0);
        let result = evaluator.evaluate_all(
            &path,
            conditions.iter().inspect(|_| visited.set(visited.get() + 1)),
        );

        assert!(!result);
        assert_eq!(visited.get(), 1);
    }

    #[test]
    fn test_store_loaded_once_per_batch() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store.clone());
        let conditions: Vec<Condition> = (0..10)
            .map(|_| Condition::new("cores", Operator::LessThan, "5"))
            .collect();

        assert!(evaluator.evaluate_all(&path, &conditions));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn test_evaluate_one() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store);

        assert!(evaluator.evaluate_one(&path, &Condition::new("name", Operator::Equal, "Linux")));
        assert!(!evaluator.evaluate_one(&path, &Condition::new("nope", Operator::Equal, "x")));
        assert!(!evaluator.evaluate_one(
            Path::new("/missing"),
            &Condition::new("name", Operator::Equal, "Linux")
        ));
        assert!(matches!(
            evaluator.try_evaluate_one(&path, &Condition::new("nope", Operator::Equal, "x")),
            Err(EvalError::MissingFact(_))
        ));
    }

    #[test]
    fn test_check_properties_rejects_unrecognized_value() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store.clone());

        let plain = ScriptValue::Json(serde_json::json!(42));
        assert!(!evaluator.check_properties(&path, &plain));
        assert!(matches!(
            evaluator.try_check_properties(&path, &plain),
            Err(EvalError::UnrecognizedRepresentation(_))
        ));
        // rejected before the store is touched
        assert_eq!(store.load_count(), 0);
    }

    #[test]
    fn test_check_properties_native_list() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store);

        let params = ScriptValue::Native(vec![
            Box::new(Condition::new("cores", Operator::GreaterThan, "1")) as NativeElement,
            Box::new(Condition::new("os", Operator::Match, "x86_64")),
        ]);
        assert!(evaluator.check_properties(&path, &params));
    }

    #[test]
    fn test_explain_reports_every_condition() {
        let (store, path) = store();
        let evaluator = ConditionEvaluator::new(store);
        let conditions = vec![
            Condition::new("name", Operator::Equal, "Windows"),
            Condition::new("cores", Operator::LessThan, "5"),
            Condition::new("cuda", Operator::Equal, "yes"),
        ];

        let outcomes = evaluator.explain(&path, &conditions).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[0].satisfied && outcomes[0].reason.is_none());
        assert!(outcomes[1].satisfied);
        assert!(outcomes[2].reason.as_deref().unwrap().contains("cuda"));
    }
}
