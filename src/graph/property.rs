//! Behaviour shared by object and data properties: characteristics,
//! inherited domains, and the read capability handed to other graphs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

use super::branch::remove_handle;
use super::tree::{Depth, EntityGraph, Hierarchy};
use super::view::PropertyView;

/// Boolean characteristics of a property.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Characteristics {
    /// `p(a, b)` implies `p(b, a)`.
    pub symmetric: bool,
    /// `p(a, a)` never holds.
    pub irreflexive: bool,
    /// `p(a, b)` excludes `p(b, a)`.
    pub asymmetric: bool,
    /// `p(a, b)` and `p(b, c)` imply `p(a, c)`.
    pub transitive: bool,
    /// At most one target per subject.
    pub functional: bool,
}

impl Characteristics {
    /// Merges the characteristics a sub-property inherits from `ancestor`.
    #[must_use]
    pub const fn inherit(self, ancestor: Self) -> Self {
        Self {
            symmetric: self.symmetric,
            transitive: self.transitive,
            irreflexive: self.irreflexive || ancestor.irreflexive,
            asymmetric: self.asymmetric || ancestor.asymmetric,
            functional: self.functional || ancestor.functional,
        }
    }

    /// Sets every flag present in `other`.
    pub fn merge(&mut self, other: Self) {
        self.symmetric |= other.symmetric;
        self.irreflexive |= other.irreflexive;
        self.asymmetric |= other.asymmetric;
        self.transitive |= other.transitive;
        self.functional |= other.functional;
    }
}

/// A branch of a property hierarchy.
pub trait PropertyBranch: Hierarchy {
    /// Declared domain classes.
    fn domains(&self) -> &[Handle];
    /// Declared domain classes, mutably.
    fn domains_mut(&mut self) -> &mut Vec<Handle>;
    /// Declared characteristics.
    fn characteristics(&self) -> Characteristics;
}

impl<B: PropertyBranch> PropertyView for EntityGraph<B> {
    fn property_name(&self, property: Handle) -> Option<&str> {
        self.name(property)
    }

    fn is_property(&self, property: Handle) -> bool {
        self.contains(property)
    }

    fn property_up(&self, property: Handle, depth: Depth) -> HashSet<Handle> {
        self.up(property, depth)
    }

    fn property_up_inclusive(&self, property: Handle) -> HashSet<Handle> {
        self.up_inclusive(property)
    }

    fn property_down_inclusive(&self, property: Handle) -> HashSet<Handle> {
        self.down_inclusive(property)
    }

    fn domains(&self, property: Handle) -> HashSet<Handle> {
        self.up_inclusive(property)
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| b.domains().iter().copied())
            .collect()
    }

    fn characteristics(&self, property: Handle) -> Characteristics {
        let own = self.get(property).map(PropertyBranch::characteristics).unwrap_or_default();
        self.up(property, Depth::Unbounded)
            .into_iter()
            .filter_map(|p| self.get(p))
            .fold(own, |acc, b| acc.inherit(b.characteristics()))
    }
}

impl<B: PropertyBranch> EntityGraph<B> {
    /// Properties whose declared domain contains one of `classes`.
    #[must_use]
    pub fn with_domain_in(&self, classes: &HashSet<Handle>) -> HashSet<Handle> {
        self.iter()
            .filter(|b| b.domains().iter().any(|d| classes.contains(d)))
            .map(|b| b.meta().handle)
            .collect()
    }

    /// Drops `class` from every domain.
    pub fn forget_domain_class(&mut self, class: Handle) {
        for branch in self.iter_mut() {
            remove_handle(branch.domains_mut(), class);
        }
    }
}
