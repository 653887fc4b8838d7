//! The ontology: owns the registry and every graph, each behind its own
//! reader/writer lock.
//!
//! Locks are always taken in the same order, whatever the operation:
//! individuals, classes, object properties, data properties, anonymous
//! classes. The registry has its own leaf lock and is never held while a
//! graph lock is requested. Methods that only read take shared locks; a
//! mutation write-locks the graphs it changes and read-locks the ones it
//! consults.

mod client;
mod declare;
mod mutate;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OntologyConfig;
use crate::graph::{
    AnonymousClassGraph, ClassGraph, DataPropertyGraph, IndividualGraph, ObjectPropertyGraph,
};
use crate::handle::{Handle, HandleRegistry};

pub use client::{ClassClient, DataPropertyClient, IndividualClient, ObjectPropertyClient};
pub use declare::{
    ClassDeclaration, DataPropertyDeclaration, IndividualDeclaration, Label, ObjectPropertyDeclaration,
    RelationDeclaration,
};

/// Unique identifier of an ontology instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OntologyId(Uuid);

impl OntologyId {
    /// A fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OntologyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OntologyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which graph an identifier lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A named individual.
    Individual,
    /// A named class.
    Class,
    /// An object property.
    ObjectProperty,
    /// A data property.
    DataProperty,
}

/// Branch counts of every graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OntologyStats {
    /// Individuals.
    pub individuals: usize,
    /// Classes.
    pub classes: usize,
    /// Object properties.
    pub object_properties: usize,
    /// Data properties.
    pub data_properties: usize,
    /// Anonymous classes.
    pub anonymous_classes: usize,
}

fn read<'a, T>(lock: &'a RwLock<T>, graph: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(graph, "recovering poisoned graph lock");
        PoisonError::into_inner(poisoned)
    })
}

fn write<'a, T>(lock: &'a RwLock<T>, graph: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(graph, "recovering poisoned graph lock");
        PoisonError::into_inner(poisoned)
    })
}

/// An in-memory ontology.
#[derive(Debug)]
pub struct Ontology {
    id: OntologyId,
    config: OntologyConfig,
    registry: Arc<HandleRegistry>,
    individuals: RwLock<IndividualGraph>,
    classes: RwLock<ClassGraph>,
    object_properties: RwLock<ObjectPropertyGraph>,
    data_properties: RwLock<DataPropertyGraph>,
    anonymous: RwLock<AnonymousClassGraph>,
    language: RwLock<String>,
    initialized: AtomicBool,
}

impl Default for Ontology {
    fn default() -> Self {
        Self::new(OntologyConfig::default())
    }
}

impl Ontology {
    /// Creates an empty ontology.
    #[must_use]
    pub fn new(config: OntologyConfig) -> Self {
        let registry = Arc::new(HandleRegistry::new());
        Self {
            id: OntologyId::new(),
            language: RwLock::new(config.language.clone()),
            individuals: RwLock::new(IndividualGraph::new(Arc::clone(&registry))),
            classes: RwLock::new(ClassGraph::new(Arc::clone(&registry))),
            object_properties: RwLock::new(ObjectPropertyGraph::new(Arc::clone(&registry))),
            data_properties: RwLock::new(DataPropertyGraph::new(Arc::clone(&registry))),
            anonymous: RwLock::new(AnonymousClassGraph::new()),
            registry,
            config,
            initialized: AtomicBool::new(false),
        }
    }

    /// Identifier of this instance.
    #[must_use]
    pub const fn id(&self) -> OntologyId {
        self.id
    }

    /// Configuration the ontology was built with.
    #[must_use]
    pub const fn config(&self) -> &OntologyConfig {
        &self.config
    }

    /// Handle registry shared by every graph.
    #[must_use]
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// Shared lock on the individual graph.
    pub fn individuals(&self) -> RwLockReadGuard<'_, IndividualGraph> {
        read(&self.individuals, "individuals")
    }

    /// Exclusive lock on the individual graph.
    pub fn individuals_mut(&self) -> RwLockWriteGuard<'_, IndividualGraph> {
        write(&self.individuals, "individuals")
    }

    /// Shared lock on the class graph.
    pub fn classes(&self) -> RwLockReadGuard<'_, ClassGraph> {
        read(&self.classes, "classes")
    }

    /// Exclusive lock on the class graph.
    pub fn classes_mut(&self) -> RwLockWriteGuard<'_, ClassGraph> {
        write(&self.classes, "classes")
    }

    /// Shared lock on the object property graph.
    pub fn object_properties(&self) -> RwLockReadGuard<'_, ObjectPropertyGraph> {
        read(&self.object_properties, "object_properties")
    }

    /// Exclusive lock on the object property graph.
    pub fn object_properties_mut(&self) -> RwLockWriteGuard<'_, ObjectPropertyGraph> {
        write(&self.object_properties, "object_properties")
    }

    /// Shared lock on the data property graph.
    pub fn data_properties(&self) -> RwLockReadGuard<'_, DataPropertyGraph> {
        read(&self.data_properties, "data_properties")
    }

    /// Exclusive lock on the data property graph.
    pub fn data_properties_mut(&self) -> RwLockWriteGuard<'_, DataPropertyGraph> {
        write(&self.data_properties, "data_properties")
    }

    /// Shared lock on the anonymous class graph.
    pub fn anonymous(&self) -> RwLockReadGuard<'_, AnonymousClassGraph> {
        read(&self.anonymous, "anonymous")
    }

    /// Exclusive lock on the anonymous class graph.
    pub fn anonymous_mut(&self) -> RwLockWriteGuard<'_, AnonymousClassGraph> {
        write(&self.anonymous, "anonymous")
    }

    /// Label language used by name queries.
    #[must_use]
    pub fn language(&self) -> String {
        read(&self.language, "language").clone()
    }

    /// Switches the label language.
    pub fn set_language(&self, language: &str) {
        *write(&self.language, "language") = language.to_string();
    }

    /// Finishes loading: generates inverted property chains and marks the
    /// ontology initialized.
    pub fn close(&self) {
        let inverted = self.object_properties_mut().create_invert_chains();
        self.initialized.store(true, Ordering::SeqCst);
        info!(ontology = %self.id, inverted, "ontology closed");
    }

    /// True once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_init(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Graph the identifier lives in, looked up in lock order.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        if self.individuals().touch(name) {
            Some(EntityKind::Individual)
        } else if self.classes().touch(name) {
            Some(EntityKind::Class)
        } else if self.object_properties().touch(name) {
            Some(EntityKind::ObjectProperty)
        } else if self.data_properties().touch(name) {
            Some(EntityKind::DataProperty)
        } else {
            None
        }
    }

    /// Branch counts.
    #[must_use]
    pub fn stats(&self) -> OntologyStats {
        OntologyStats {
            individuals: self.individuals().len(),
            classes: self.classes().len(),
            object_properties: self.object_properties().len(),
            data_properties: self.data_properties().len(),
            anonymous_classes: self.anonymous().len(),
        }
    }

    /// Independent deep copy with its own registry and a new identifier.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.copy_with_config(self.config.clone())
    }

    /// Deep copy running under another configuration.
    #[must_use]
    pub fn copy_with_config(&self, config: OntologyConfig) -> Self {
        let individuals = self.individuals();
        let classes = self.classes();
        let object_properties = self.object_properties();
        let data_properties = self.data_properties();
        let anonymous = self.anonymous();
        let registry = Arc::new(self.registry.deep_copy());
        let copy = Self {
            id: OntologyId::new(),
            config,
            individuals: RwLock::new(individuals.deep_copy(Arc::clone(&registry))),
            classes: RwLock::new(classes.deep_copy(Arc::clone(&registry))),
            object_properties: RwLock::new(object_properties.deep_copy(Arc::clone(&registry))),
            data_properties: RwLock::new(data_properties.deep_copy(Arc::clone(&registry))),
            anonymous: RwLock::new(anonymous.clone()),
            language: RwLock::new(self.language()),
            registry,
            initialized: AtomicBool::new(self.is_init()),
        };
        info!(source = %self.id, copy = %copy.id, "ontology copied");
        copy
    }

    /// Forgets the registry name of `handle` once no graph holds it.
    /// Expects no graph lock to be held by the caller.
    fn release(&self, handle: Handle) {
        let held = self.individuals().contains(handle)
            || self.classes().contains(handle)
            || self.object_properties().contains(handle)
            || self.data_properties().contains(handle);
        if !held {
            self.registry.forget(handle);
        }
    }

    /// Name-keyed individual queries.
    #[must_use]
    pub const fn individual(&self) -> IndividualClient<'_> {
        IndividualClient::new(self)
    }

    /// Name-keyed class queries.
    #[must_use]
    pub const fn class(&self) -> ClassClient<'_> {
        ClassClient::new(self)
    }

    /// Name-keyed object property queries.
    #[must_use]
    pub const fn object_property(&self) -> ObjectPropertyClient<'_> {
        ObjectPropertyClient::new(self)
    }

    /// Name-keyed data property queries.
    #[must_use]
    pub const fn data_property(&self) -> DataPropertyClient<'_> {
        DataPropertyClient::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_are_independent() {
        let ontology = Ontology::default();
        ontology.add_inheritance("Dog", "Animal").unwrap();
        ontology.add_inheritance("rex", "Dog").unwrap();
        let copy = ontology.copy();
        assert_ne!(copy.id(), ontology.id());

        copy.delete_individual("rex").unwrap();
        assert!(ontology.individual().touch("rex"));
        assert!(!copy.individual().touch("rex"));
        assert!(copy.registry().lookup("rex").is_none());
        assert!(ontology.registry().lookup("rex").is_some());
    }

    #[test]
    fn language_and_init_flags() {
        let ontology = Ontology::default();
        assert_eq!(ontology.language(), "en");
        ontology.set_language("fr");
        assert_eq!(ontology.language(), "fr");
        assert!(!ontology.is_init());
        ontology.close();
        assert!(ontology.is_init());
    }

    #[test]
    fn kinds_follow_lock_order() {
        let ontology = Ontology::default();
        ontology.add_inheritance("Dog", "Animal").unwrap();
        ontology.add_inheritance("rex", "Dog").unwrap();
        assert_eq!(ontology.kind_of("rex"), Some(EntityKind::Individual));
        assert_eq!(ontology.kind_of("Animal"), Some(EntityKind::Class));
        assert_eq!(ontology.kind_of("nobody"), None);
    }
}
