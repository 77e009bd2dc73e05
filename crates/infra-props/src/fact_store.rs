// Properties-file FactStore
use std::path::Path;
use tracing::debug;

use nodegate_core::domain::FactMap;
use nodegate_core::error::{EvalError, Result};
use nodegate_core::port::FactStore;

use crate::properties;

/// Loads node facts from a properties file on disk
///
/// Nothing is cached: every `load` reads the file again, so concurrent
/// evaluations only share read access to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertiesFactStore;

impl PropertiesFactStore {
    pub fn new() -> Self {
        Self
    }
}

impl FactStore for PropertiesFactStore {
    fn load(&self, path: &Path) -> Result<FactMap> {
        let bytes = std::fs::read(path).map_err(|source| EvalError::FactStoreUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let pairs = properties::parse(&properties::decode(&bytes)).map_err(|e| {
            EvalError::MalformedFactStore {
                path: path.to_path_buf(),
                line: e.line,
                reason: e.reason,
            }
        })?;

        // last occurrence of a key wins
        let facts: FactMap = pairs.into_iter().collect();

        debug!(path = %path.display(), facts = facts.len(), "Fact store loaded");
        Ok(facts)
    }
}
