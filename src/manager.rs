//! Named engines living side by side.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::config::OntologyConfig;
use crate::engine::KnowledgeEngine;

/// Keeps independent engines by name.
#[derive(Debug, Default)]
pub struct OntologyManager {
    base: OntologyConfig,
    engines: RwLock<BTreeMap<String, Arc<KnowledgeEngine>>>,
}

impl OntologyManager {
    /// Manager whose new engines start from `base`.
    #[must_use]
    pub fn new(base: OntologyConfig) -> Self {
        Self {
            base,
            engines: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an engine named `name`. Returns false if the name is taken.
    pub fn add(&self, name: &str) -> bool {
        let mut engines = self.engines.write().unwrap_or_else(PoisonError::into_inner);
        if engines.contains_key(name) {
            return false;
        }
        let config = OntologyConfig {
            name: Some(name.to_string()),
            ..self.base.clone()
        };
        engines.insert(name.to_string(), Arc::new(KnowledgeEngine::new(config)));
        info!(name, "ontology added");
        true
    }

    /// Creates `dest` as a versioned copy of `src`. Returns false if `src`
    /// is unknown or `dest` is taken.
    pub fn copy(&self, dest: &str, src: &str) -> bool {
        let Some(source) = self.get(src) else {
            return false;
        };
        if self.get(dest).is_some() {
            return false;
        }
        let copy = Arc::new(source.copy_as(dest));
        let mut engines = self.engines.write().unwrap_or_else(PoisonError::into_inner);
        if engines.contains_key(dest) {
            return false;
        }
        engines.insert(dest.to_string(), copy);
        info!(dest, src, "ontology copied");
        true
    }

    /// Removes an engine. Returns false if it is unknown.
    pub fn delete(&self, name: &str) -> bool {
        let removed = self
            .engines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            info!(name, "ontology deleted");
        }
        removed
    }

    /// The engine named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<KnowledgeEngine>> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Engine names, sorted.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.engines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
