//! Narrow read capabilities one graph needs from its siblings.
//!
//! The individual graph never sees the class or property graphs directly;
//! it is handed these views (backed by whatever lock guards the caller
//! holds) for the duration of one operation.

use std::collections::HashSet;

use crate::handle::Handle;

use super::object_property::ChainMatch;
use super::property::Characteristics;
use super::tree::Depth;

/// Class lookups used by membership and domain/range checks.
pub trait ClassView {
    /// Identifier of a class.
    fn class_name(&self, class: Handle) -> Option<&str>;

    /// Ancestors of `class` within `depth`, excluding itself.
    fn class_up(&self, class: Handle, depth: Depth) -> HashSet<Handle>;

    /// Every class in `classes` plus all of their ancestors.
    fn class_closure(&self, classes: &[Handle]) -> HashSet<Handle>;

    /// Every class disjoint with a member of `classes`.
    fn disjoint_closure(&self, classes: &HashSet<Handle>) -> HashSet<Handle>;

    /// Class-level `(property, target)` pairs, object then data relations.
    fn class_relations(&self, class: Handle) -> Vec<(Handle, Handle)>;
}

/// Lookups shared by object and data properties.
pub trait PropertyView {
    /// Identifier of a property.
    fn property_name(&self, property: Handle) -> Option<&str>;

    /// True if `property` is a branch of this graph.
    fn is_property(&self, property: Handle) -> bool;

    /// Ancestors within `depth`, excluding the property itself.
    fn property_up(&self, property: Handle, depth: Depth) -> HashSet<Handle>;

    /// The property and all of its ancestors.
    fn property_up_inclusive(&self, property: Handle) -> HashSet<Handle>;

    /// The property and all of its descendants.
    fn property_down_inclusive(&self, property: Handle) -> HashSet<Handle>;

    /// Domain classes, inherited from every ancestor.
    fn domains(&self, property: Handle) -> HashSet<Handle>;

    /// Characteristics in effect for the property.
    fn characteristics(&self, property: Handle) -> Characteristics;
}

/// Object-property specific lookups.
pub trait ObjectPropertyView: PropertyView {
    /// Range classes, inherited from every ancestor.
    fn ranges(&self, property: Handle) -> HashSet<Handle>;

    /// Declared inverses.
    fn inverses(&self, property: Handle) -> Vec<Handle>;

    /// Chains in which a relation using `property` can fill a link.
    fn chains_involving(&self, property: Handle) -> Vec<ChainMatch>;
}

/// Data-property specific lookups.
pub trait DataPropertyView: PropertyView {
    /// Accepted literal types, inherited from every ancestor.
    fn literal_ranges(&self, property: Handle) -> HashSet<String>;
}

/// The sibling views handed to an individual or class graph operation.
#[derive(Clone, Copy)]
pub struct Schema<'a> {
    /// Class capability.
    pub classes: &'a dyn ClassView,
    /// Object-property capability.
    pub object_properties: &'a dyn ObjectPropertyView,
    /// Data-property capability.
    pub data_properties: &'a dyn DataPropertyView,
}
