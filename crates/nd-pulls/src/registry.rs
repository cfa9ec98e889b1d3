//! Name-keyed registry of pull definitions.

use std::collections::BTreeMap;

use nd_core::{Error, Result};

use crate::definition::PullDefinition;
use crate::methods::{DiffPullAsym, RelDiffAsymErrs, UnconstPullAsym};

/// Registry of pull definitions keyed by name.
pub struct PullRegistry {
    methods: BTreeMap<String, Box<dyn PullDefinition>>,
}

impl PullRegistry {
    /// Empty registry.
    pub fn empty() -> Self {
        Self { methods: BTreeMap::new() }
    }

    /// Registry holding the built-in definitions.
    pub fn standard() -> Self {
        let mut r = Self::empty();
        r.register(Box::new(RelDiffAsymErrs));
        r.register(Box::new(UnconstPullAsym));
        r.register(Box::new(DiffPullAsym));
        r
    }

    /// Add (or replace) a definition under its own name.
    pub fn register(&mut self, method: Box<dyn PullDefinition>) {
        self.methods.insert(method.name().to_string(), method);
    }

    /// Registered names, sorted.
    pub fn allowed(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Look up a definition, failing with the allowed set if it is unknown.
    pub fn lookup(&self, name: &str) -> Result<&dyn PullDefinition> {
        self.methods.get(name).map(|m| m.as_ref()).ok_or_else(|| Error::UnknownPullDefinition {
            name: name.to_string(),
            allowed: self.allowed(),
        })
    }
}

impl Default for PullRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for PullRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullRegistry").field("methods", &self.allowed()).finish()
    }
}
