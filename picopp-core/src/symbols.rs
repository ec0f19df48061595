//! Defined-symbols set supplied by the caller.
//!
//! A symbol carries no value, only definedness. The set is kept ordered
//! so that two sets with the same members always produce the same cache
//! key, whatever order the caller listed them in.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DefinedSymbols {
    names: BTreeSet<String>,
}

impl DefinedSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Canonical, order-independent key: the sorted, deduplicated names.
    pub fn cache_key(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for DefinedSymbols {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        DefinedSymbols {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for DefinedSymbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}
