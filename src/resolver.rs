use indexmap::IndexMap;

use crate::env::EnvSnapshot;

/// Variables for one artifact after defaults and overrides were merged.
///
/// Iteration order is the order in which keys were first inserted: defaults
/// in declaration order, followed by keys that only the environment sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    entries: IndexMap<String, String>,
}

impl VariableTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects every default and environment variable starting with `prefix`.
/// Environment values replace defaults for the same key; a key set only in
/// the environment is still included.
pub fn resolve(
    prefix: &str,
    defaults: &IndexMap<String, String>,
    env: &EnvSnapshot,
) -> VariableTable {
    let mut entries: IndexMap<String, String> = defaults
        .iter()
        .filter(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (key, value) in env.prefixed(prefix) {
        // IndexMap::insert keeps the original slot of an existing key.
        entries.insert(key.to_string(), value.to_string());
    }

    VariableTable { entries }
}
