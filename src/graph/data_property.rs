//! Data properties: hierarchy, domain classes and accepted literal types.

use std::collections::HashSet;

use crate::handle::Handle;

use super::branch::{push_handle, BranchMeta};
use super::property::{Characteristics, PropertyBranch};
use super::tree::{Branch, Depth, EntityGraph, Hierarchy, HierarchyLinks};
use super::view::DataPropertyView;

/// A data property.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPropertyBranch {
    meta: BranchMeta,
    links: HierarchyLinks,
    /// Domain classes.
    pub domains: Vec<Handle>,
    /// Accepted literal types (`integer`, `string`, ...).
    pub ranges: Vec<String>,
    /// Declared characteristics.
    pub characteristics: Characteristics,
}

impl Branch for DataPropertyBranch {
    fn new(meta: BranchMeta) -> Self {
        Self {
            meta,
            links: HierarchyLinks::default(),
            domains: Vec::new(),
            ranges: Vec::new(),
            characteristics: Characteristics::default(),
        }
    }

    fn meta(&self) -> &BranchMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut BranchMeta {
        &mut self.meta
    }
}

impl Hierarchy for DataPropertyBranch {
    fn links(&self) -> &HierarchyLinks {
        &self.links
    }

    fn links_mut(&mut self) -> &mut HierarchyLinks {
        &mut self.links
    }
}

impl PropertyBranch for DataPropertyBranch {
    fn domains(&self) -> &[Handle] {
        &self.domains
    }

    fn domains_mut(&mut self) -> &mut Vec<Handle> {
        &mut self.domains
    }

    fn characteristics(&self) -> Characteristics {
        self.characteristics
    }
}

/// Handle-level declaration of a data property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataPropertyDecl {
    /// Super-properties.
    pub mothers: Vec<Handle>,
    /// Disjoint properties.
    pub disjoints: Vec<Handle>,
    /// Domain classes.
    pub domains: Vec<Handle>,
    /// Accepted literal types.
    pub ranges: Vec<String>,
    /// Characteristics (only `functional` is meaningful).
    pub characteristics: Characteristics,
}

/// Graph of every data property.
pub type DataPropertyGraph = EntityGraph<DataPropertyBranch>;

impl DataPropertyView for DataPropertyGraph {
    fn literal_ranges(&self, property: Handle) -> HashSet<String> {
        self.up_inclusive(property)
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| b.ranges.iter().cloned())
            .collect()
    }
}

impl DataPropertyGraph {
    /// Creates or extends a property from its declaration.
    pub fn declare(&mut self, name: &str, decl: &DataPropertyDecl) -> Handle {
        let handle = self.find_or_create(name);
        for mother in &decl.mothers {
            self.add_mother(handle, *mother, 1.0, false);
        }
        for disjoint in &decl.disjoints {
            self.add_disjoint(handle, *disjoint);
        }
        if let Some(branch) = self.get_mut(handle) {
            for domain in &decl.domains {
                push_handle(&mut branch.domains, *domain);
            }
            for range in &decl.ranges {
                if !branch.ranges.contains(range) {
                    branch.ranges.push(range.clone());
                }
            }
            branch.characteristics.merge(decl.characteristics);
            branch.meta_mut().mark_updated();
        }
        handle
    }

    /// Domain classes of `property` and its ancestors within `depth`.
    #[must_use]
    pub fn get_domain(&self, property: Handle, depth: Depth) -> HashSet<Handle> {
        let mut properties = self.up(property, depth);
        properties.insert(property);
        properties
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| b.domains.iter().copied())
            .collect()
    }

    /// Literal types accepted by `property` and its ancestors within `depth`.
    #[must_use]
    pub fn get_range(&self, property: Handle, depth: Depth) -> HashSet<String> {
        let mut properties = self.up(property, depth);
        properties.insert(property);
        properties
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| b.ranges.iter().cloned())
            .collect()
    }

    /// Properties accepting `literal_type`.
    #[must_use]
    pub fn with_literal_range(&self, literal_type: &str) -> HashSet<Handle> {
        self.iter()
            .filter(|b| b.ranges.iter().any(|r| r == literal_type))
            .map(|b| b.meta().handle)
            .collect()
    }
}
