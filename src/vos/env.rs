//! Virtual environment-variable table.
//!
//! Seeded once at scope creation from the fixture's declared pairs and
//! read-only afterwards; the host process environment never leaks in. An
//! absent key is observably distinct from a key with an empty value.

use std::collections::BTreeMap;

/// Isolated name -> value mapping visible to one guest.
#[derive(Clone, Debug, Default)]
pub struct EnvTable {
    vars: BTreeMap<String, String>,
}

impl EnvTable {
    /// Empty table (no variables declared).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from declared pairs. Keys are unique by construction.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            vars: pairs.into_iter().collect(),
        }
    }

    /// Look up a variable. `None` means the key was never declared.
    #[inline(always)]
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Number of declared variables.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
