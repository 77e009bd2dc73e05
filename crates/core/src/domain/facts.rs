// Fact Map - key/value snapshot of node properties for one evaluation batch

use std::collections::HashMap;

/// Facts loaded from a fact store
///
/// Built fresh for every evaluation call and dropped when it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactMap(HashMap<String, String>);

impl FactMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Later pairs with the same key replace earlier ones
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FactMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_pair_wins() {
        let facts: FactMap = [("cores", "8"), ("os", "Linux"), ("cores", "16")].into_iter().collect();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts.get("cores"), Some("16"));
        assert_eq!(facts.get("gpu"), None);
    }
}
