//! Compact handles and the per-ontology registry that issues them.
//!
//! Positive handles address entities (classes, individuals, properties),
//! negative handles address typed literals, and zero is the absent sentinel.
//! Handles are allocated monotonically and never reused, so a handle that
//! outlives its entity resolves to nothing rather than to a newcomer.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Stable identifier of an entity or literal within one ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(i64);

impl Handle {
    /// The absent sentinel.
    pub const ABSENT: Self = Self(0);

    /// Wraps a raw handle value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw signed value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// True for the zero sentinel.
    #[must_use]
    pub const fn is_absent(self) -> bool {
        self.0 == 0
    }

    /// True for class, individual and property handles.
    #[must_use]
    pub const fn is_entity(self) -> bool {
        self.0 > 0
    }

    /// True for literal handles.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed literal value, such as `integer#42` or `string#hello`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    /// Type tag (`integer`, `string`, `boolean`, ...).
    pub literal_type: String,
    /// Raw lexical value.
    pub value: String,
}

impl Literal {
    /// Builds a literal from its type tag and raw value.
    pub fn new(literal_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            literal_type: literal_type.into(),
            value: value.into(),
        }
    }

    /// Parses the `type#value` form. Returns `None` when there is no `#`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (literal_type, value) = text.split_once('#')?;
        let literal_type = literal_type.trim();
        if literal_type.is_empty() {
            return None;
        }
        Some(Self::new(literal_type, value))
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.literal_type, self.value)
    }
}

#[derive(Debug, Clone)]
struct RegistryState {
    by_name: HashMap<String, Handle>,
    names: HashMap<Handle, String>,
    by_literal: HashMap<Literal, Handle>,
    literals: HashMap<Handle, Literal>,
    next_entity: i64,
    next_literal: i64,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            by_name: HashMap::new(),
            names: HashMap::new(),
            by_literal: HashMap::new(),
            literals: HashMap::new(),
            next_entity: 1,
            next_literal: -1,
        }
    }
}

/// Bidirectional name/handle and literal/handle table.
///
/// The registry lock is always taken last and never held while a graph lock
/// is being acquired.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    state: RwLock<RegistryState>,
}

impl HandleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for `name`, allocating one on first use.
    pub fn intern(&self, name: &str) -> Handle {
        if let Some(handle) = self.lookup(name) {
            return handle;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = state.by_name.get(name) {
            return *handle;
        }
        let handle = Handle(state.next_entity);
        state.next_entity += 1;
        state.by_name.insert(name.to_string(), handle);
        state.names.insert(handle, name.to_string());
        handle
    }

    /// Looks a name up without allocating.
    pub fn lookup(&self, name: &str) -> Option<Handle> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_name.get(name).copied()
    }

    /// Resolves an entity handle to its name.
    pub fn resolve(&self, handle: Handle) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.names.get(&handle).cloned()
    }

    /// Drops the mapping for an entity handle once no graph holds it.
    pub fn forget(&self, handle: Handle) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(name) = state.names.remove(&handle) {
            state.by_name.remove(&name);
        }
    }

    /// Hash-conses a literal: identical (type, value) pairs share one handle.
    pub fn intern_literal(&self, literal: &Literal) -> Handle {
        if let Some(handle) = self.lookup_literal(literal) {
            return handle;
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = state.by_literal.get(literal) {
            return *handle;
        }
        let handle = Handle(state.next_literal);
        state.next_literal -= 1;
        state.by_literal.insert(literal.clone(), handle);
        state.literals.insert(handle, literal.clone());
        handle
    }

    /// Looks a literal up without allocating.
    pub fn lookup_literal(&self, literal: &Literal) -> Option<Handle> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_literal.get(literal).copied()
    }

    /// Resolves a literal handle.
    pub fn literal(&self, handle: Handle) -> Option<Literal> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.literals.get(&handle).cloned()
    }

    /// Renders any handle: names for entities, `type#value` for literals.
    pub fn display(&self, handle: Handle) -> String {
        if handle.is_literal() {
            self.literal(handle).map_or_else(|| handle.to_string(), |l| l.to_string())
        } else {
            self.resolve(handle).unwrap_or_else(|| handle.to_string())
        }
    }

    /// Number of live entity names.
    pub fn len(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.names.len()
    }

    /// True when no entity name is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Independent copy for a versioned ontology.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Self {
            state: RwLock::new(state.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent_and_positive() {
        let registry = HandleRegistry::new();
        let dog = registry.intern("Dog");
        assert!(dog.is_entity());
        assert_eq!(registry.intern("Dog"), dog);
        assert_eq!(registry.resolve(dog).as_deref(), Some("Dog"));
        assert_ne!(registry.intern("Cat"), dog);
    }

    #[test]
    fn literals_are_hash_consed_and_negative() {
        let registry = HandleRegistry::new();
        let a = registry.intern_literal(&Literal::new("integer", "42"));
        let b = registry.intern_literal(&Literal::new("integer", "42"));
        let c = registry.intern_literal(&Literal::new("string", "42"));
        assert!(a.is_literal());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(registry.display(a), "integer#42");
    }

    #[test]
    fn forgotten_handles_never_resolve_again() {
        let registry = HandleRegistry::new();
        let rex = registry.intern("rex");
        registry.forget(rex);
        assert!(registry.resolve(rex).is_none());
        assert!(registry.lookup("rex").is_none());

        let again = registry.intern("rex");
        assert_ne!(again, rex);
        assert!(!again.is_absent());
    }

    #[test]
    fn literal_parse_requires_type() {
        assert_eq!(Literal::parse("boolean#true"), Some(Literal::new("boolean", "true")));
        assert_eq!(Literal::parse("#x"), None);
        assert_eq!(Literal::parse("plain"), None);
    }
}
