// Fact Store port - loads a flat key/value snapshot of node properties
use crate::domain::FactMap;
use crate::error::Result;
use std::path::Path;

/// Fact store loader
///
/// Implementations:
/// - PropertiesFactStore (infra-props): properties-file syntax on disk
pub trait FactStore: Send + Sync {
    /// Load every fact stored at `path`
    ///
    /// # Errors
    /// - EvalError::FactStoreUnavailable if the file is missing or unreadable
    /// - EvalError::MalformedFactStore if its content cannot be parsed
    fn load(&self, path: &Path) -> Result<FactMap>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::EvalError;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// In-memory fact stores keyed by path; unknown paths are "missing files"
    #[derive(Default)]
    pub struct MockFactStore {
        stores: Arc<Mutex<HashMap<PathBuf, FactMap>>>,
        load_count: Arc<Mutex<usize>>,
    }
    impl MockFactStore {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn with_facts<P, I, K, V>(path: P, facts: I) -> Self
        where
            P: Into<PathBuf>,
            I: IntoIterator<Item = (K, V)>,
            K: Into<String>,
            V: Into<String>,
        {
            let store = Self::new();
            store.insert(path, facts.into_iter().collect());
            store
        }
        pub fn insert(&self, path: impl Into<PathBuf>, facts: FactMap) {
            self.stores.lock().unwrap().insert(path.into(), facts);
        }
        pub fn load_count(&self) -> usize {
            *self.load_count.lock().unwrap()
        }
    }
    impl FactStore for MockFactStore {
        fn load(&self, path: &Path) -> Result<FactMap> {
            *self.load_count.lock().unwrap() += 1;
            self.stores
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| EvalError::FactStoreUnavailable {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such fact store"),
                })
        }
    }
}
