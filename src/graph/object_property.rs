//! Object properties: hierarchy, domain/range classes, inverses, chains.

use std::collections::HashSet;

use crate::handle::Handle;

use super::branch::{push_handle, remove_handle, BranchMeta};
use super::property::{Characteristics, PropertyBranch};
use super::tree::{Branch, Depth, EntityGraph, Hierarchy, HierarchyLinks};
use super::view::{ObjectPropertyView, PropertyView};

/// `links[0] ∘ … ∘ links[n-1]` implies `result`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyChain {
    /// Properties to follow, in order.
    pub links: Vec<Handle>,
    /// Property holding between the endpoints.
    pub result: Handle,
}

/// A chain together with the link a given relation can fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMatch {
    /// The chain.
    pub chain: PropertyChain,
    /// Index of the matching link.
    pub position: usize,
}

/// An object property.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPropertyBranch {
    meta: BranchMeta,
    links: HierarchyLinks,
    /// Domain classes.
    pub domains: Vec<Handle>,
    /// Range classes.
    pub ranges: Vec<Handle>,
    /// Inverse properties.
    pub inverses: Vec<Handle>,
    /// Chains whose first link is this property.
    pub chains: Vec<PropertyChain>,
    /// Declared characteristics.
    pub characteristics: Characteristics,
}

impl Branch for ObjectPropertyBranch {
    fn new(meta: BranchMeta) -> Self {
        Self {
            meta,
            links: HierarchyLinks::default(),
            domains: Vec::new(),
            ranges: Vec::new(),
            inverses: Vec::new(),
            chains: Vec::new(),
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

impl Hierarchy for ObjectPropertyBranch {
    fn links(&self) -> &HierarchyLinks {
        &self.links
    }

    fn links_mut(&mut self) -> &mut HierarchyLinks {
        &mut self.links
    }
}

impl PropertyBranch for ObjectPropertyBranch {
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

/// Handle-level declaration of an object property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPropertyDecl {
    /// Super-properties.
    pub mothers: Vec<Handle>,
    /// Disjoint properties.
    pub disjoints: Vec<Handle>,
    /// Inverse properties.
    pub inverses: Vec<Handle>,
    /// Domain classes.
    pub domains: Vec<Handle>,
    /// Range classes.
    pub ranges: Vec<Handle>,
    /// Chains implying this property.
    pub chains: Vec<Vec<Handle>>,
    /// Characteristics.
    pub characteristics: Characteristics,
}

/// Graph of every object property.
pub type ObjectPropertyGraph = EntityGraph<ObjectPropertyBranch>;

impl ObjectPropertyView for ObjectPropertyGraph {
    fn ranges(&self, property: Handle) -> HashSet<Handle> {
        self.up_inclusive(property)
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| b.ranges.iter().copied())
            .collect()
    }

    fn inverses(&self, property: Handle) -> Vec<Handle> {
        self.get(property).map_or_else(Vec::new, |b| b.inverses.clone())
    }

    fn chains_involving(&self, property: Handle) -> Vec<ChainMatch> {
        let up = self.up_inclusive(property);
        let mut matches = Vec::new();
        for branch in self.iter() {
            for chain in &branch.chains {
                for (position, link) in chain.links.iter().enumerate() {
                    if up.contains(link) {
                        matches.push(ChainMatch {
                            chain: chain.clone(),
                            position,
                        });
                    }
                }
            }
        }
        for ancestor in &up {
            let transitive = self.get(*ancestor).is_some_and(|b| b.characteristics.transitive);
            if transitive {
                let chain = PropertyChain {
                    links: vec![*ancestor, *ancestor],
                    result: *ancestor,
                };
                for position in 0..2 {
                    matches.push(ChainMatch {
                        chain: chain.clone(),
                        position,
                    });
                }
            }
        }
        matches
    }
}

impl ObjectPropertyGraph {
    /// Creates or extends a property from its declaration.
    pub fn declare(&mut self, name: &str, decl: &ObjectPropertyDecl) -> Handle {
        let handle = self.find_or_create(name);
        for mother in &decl.mothers {
            self.add_mother(handle, *mother, 1.0, false);
        }
        for disjoint in &decl.disjoints {
            self.add_disjoint(handle, *disjoint);
        }
        for inverse in &decl.inverses {
            self.add_inverse_of(handle, *inverse);
        }
        if let Some(branch) = self.get_mut(handle) {
            for domain in &decl.domains {
                push_handle(&mut branch.domains, *domain);
            }
            for range in &decl.ranges {
                push_handle(&mut branch.ranges, *range);
            }
            branch.characteristics.merge(decl.characteristics);
            branch.meta_mut().mark_updated();
        }
        for links in &decl.chains {
            self.add_chain(handle, links.clone());
        }
        handle
    }

    /// Declares `a` and `b` inverse of each other.
    pub fn add_inverse_of(&mut self, a: Handle, b: Handle) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut added = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.get_mut(from) {
                if push_handle(&mut branch.inverses, to) {
                    branch.meta_mut().mark_updated();
                    added = true;
                }
            }
        }
        added
    }

    /// Removes an inverse declaration (both directions).
    pub fn remove_inverse_of(&mut self, a: Handle, b: Handle) -> bool {
        let mut removed = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.get_mut(from) {
                if remove_handle(&mut branch.inverses, to) {
                    branch.meta_mut().mark_updated();
                    removed = true;
                }
            }
        }
        removed
    }

    /// Registers `links → result` on its first link.
    pub fn add_chain(&mut self, result: Handle, links: Vec<Handle>) -> bool {
        let Some(first) = links.first().copied() else {
            return false;
        };
        if !links.iter().all(|l| self.contains(*l)) || !self.contains(result) {
            return false;
        }
        let chain = PropertyChain { links, result };
        self.get_mut(first).is_some_and(|branch| {
            if branch.chains.contains(&chain) {
                false
            } else {
                branch.chains.push(chain);
                true
            }
        })
    }

    /// For every chain whose links and result all have an inverse,
    /// registers the reversed chain of inverses. Returns how many were added.
    pub fn create_invert_chains(&mut self) -> usize {
        let chains: Vec<PropertyChain> = self.iter().flat_map(|b| b.chains.clone()).collect();
        let first_inverse = |graph: &Self, p: Handle| graph.get(p).and_then(|b| b.inverses.first().copied());
        let mut added = 0;
        for chain in chains {
            let Some(result) = first_inverse(self, chain.result) else {
                continue;
            };
            let inverted: Option<Vec<Handle>> =
                chain.links.iter().rev().map(|l| first_inverse(self, *l)).collect();
            if let Some(links) = inverted {
                if self.add_chain(result, links) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Declared characteristics of a property.
    pub fn set_characteristics(&mut self, property: Handle, characteristics: Characteristics) -> bool {
        self.get_mut(property).is_some_and(|b| {
            b.characteristics = characteristics;
            b.meta_mut().mark_updated();
            true
        })
    }

    /// Domain classes of `property` and its ancestors within `depth`.
    #[must_use]
    pub fn get_domain(&self, property: Handle, depth: Depth) -> HashSet<Handle> {
        self.collect_upwards(property, depth, |b| &b.domains)
    }

    /// Range classes of `property` and its ancestors within `depth`.
    #[must_use]
    pub fn get_range(&self, property: Handle, depth: Depth) -> HashSet<Handle> {
        self.collect_upwards(property, depth, |b| &b.ranges)
    }

    fn collect_upwards(
        &self,
        property: Handle,
        depth: Depth,
        select: impl Fn(&ObjectPropertyBranch) -> &Vec<Handle>,
    ) -> HashSet<Handle> {
        let mut properties = self.up(property, depth);
        properties.insert(property);
        properties
            .into_iter()
            .filter_map(|p| self.get(p))
            .flat_map(|b| select(b).iter().copied())
            .collect()
    }

    /// Declared inverses of `property`.
    #[must_use]
    pub fn get_inverse(&self, property: Handle) -> HashSet<Handle> {
        self.inverses(property).into_iter().collect()
    }

    /// Properties whose declared range contains one of `classes`.
    #[must_use]
    pub fn with_range_in(&self, classes: &HashSet<Handle>) -> HashSet<Handle> {
        self.iter()
            .filter(|b| b.ranges.iter().any(|r| classes.contains(r)))
            .map(|b| b.meta().handle)
            .collect()
    }

    /// Drops `class` from every domain and range.
    pub fn forget_class(&mut self, class: Handle) {
        self.forget_domain_class(class);
        for branch in self.iter_mut() {
            remove_handle(&mut branch.ranges, class);
        }
    }

    /// Scrubs every reference to `property` held by other properties.
    pub fn scrub_property(&mut self, property: Handle) {
        self.detach(property);
        for branch in self.iter_mut() {
            remove_handle(&mut branch.inverses, property);
            branch
                .chains
                .retain(|c| c.result != property && !c.links.contains(&property));
        }
    }

    /// Effective characteristics, see [`PropertyView::characteristics`].
    #[must_use]
    pub fn effective_characteristics(&self, property: Handle) -> Characteristics {
        PropertyView::characteristics(self, property)
    }
}
