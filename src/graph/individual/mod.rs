//! Individuals: class membership, same-as equivalence classes, relation
//! assertion with consistency checks, inference provenance and retraction.

mod inference;
mod query;
mod relations;
mod retraction;

use std::collections::HashSet;

use crate::error::GraphError;
use crate::handle::Handle;

use super::branch::{push_handle, remove_handle, BranchMeta, Link, Relation};
use super::tree::{Branch, EntityGraph};
use super::view::ClassView;

/// A named individual.
#[derive(Debug, Clone, PartialEq)]
pub struct IndividualBranch {
    meta: BranchMeta,
    /// Classes this individual is directly declared a member of.
    pub is_a: Vec<Link>,
    /// Equivalence class, including this individual once non-trivial.
    pub same_as: Vec<Handle>,
    /// Individuals declared different from this one.
    pub distinct: Vec<Handle>,
    /// Relations to other individuals.
    pub object_relations: Vec<Relation>,
    /// Relations to literals.
    pub data_relations: Vec<Relation>,
}

impl Branch for IndividualBranch {
    fn new(meta: BranchMeta) -> Self {
        Self {
            meta,
            is_a: Vec::new(),
            same_as: Vec::new(),
            distinct: Vec::new(),
            object_relations: Vec::new(),
            data_relations: Vec::new(),
        }
    }

    fn meta(&self) -> &BranchMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut BranchMeta {
        &mut self.meta
    }
}

/// Graph of every individual.
pub type IndividualGraph = EntityGraph<IndividualBranch>;

impl IndividualGraph {
    /// Members of the same-as class of `individual`, itself included.
    #[must_use]
    pub fn same_or_self(&self, individual: Handle) -> Vec<Handle> {
        match self.get(individual) {
            None => Vec::new(),
            Some(branch) if branch.same_as.is_empty() => vec![individual],
            Some(branch) => branch
                .same_as
                .iter()
                .copied()
                .filter(|h| self.contains(*h))
                .collect(),
        }
    }

    /// Classes directly asserted for any member of the same-as class.
    #[must_use]
    pub fn direct_classes(&self, individual: Handle) -> Vec<Handle> {
        let mut classes = Vec::new();
        for member in self.same_or_self(individual) {
            if let Some(branch) = self.get(member) {
                for link in &branch.is_a {
                    push_handle(&mut classes, link.target);
                }
            }
        }
        classes
    }

    /// Every class `individual` belongs to, inherited classes included.
    #[must_use]
    pub fn class_closure(&self, classes: &dyn ClassView, individual: Handle) -> HashSet<Handle> {
        classes.class_closure(&self.direct_classes(individual))
    }

    /// Adds `class` to the is-a list. Returns false if already present.
    pub fn add_is_a(&mut self, individual: Handle, class: Handle, weight: f64, inferred: bool) -> bool {
        let Some(branch) = self.get_mut(individual) else {
            return false;
        };
        if let Some(link) = branch.is_a.iter_mut().find(|l| l.target == class) {
            link.weight = weight;
            link.inferred = link.inferred && inferred;
            return false;
        }
        branch.is_a.push(Link {
            target: class,
            weight,
            inferred,
        });
        branch.meta_mut().mark_updated();
        true
    }

    /// Removes `class` from the is-a list.
    pub fn remove_is_a(&mut self, individual: Handle, class: Handle) -> bool {
        self.get_mut(individual).is_some_and(|branch| {
            let before = branch.is_a.len();
            branch.is_a.retain(|l| l.target != class);
            let removed = branch.is_a.len() != before;
            if removed {
                branch.meta_mut().mark_updated();
            }
            removed
        })
    }

    /// Merges the same-as classes of `a` and `b`; every member ends up
    /// listing every other member and itself.
    pub fn merge_same_as(&mut self, a: Handle, b: Handle) -> Result<(), GraphError> {
        for handle in [a, b] {
            if !self.contains(handle) {
                return Err(GraphError::UnknownEntity {
                    name: handle.to_string(),
                });
            }
        }
        let mut members = self.same_or_self(a);
        for member in self.same_or_self(b) {
            push_handle(&mut members, member);
        }
        members.sort();
        for member in &members {
            if let Some(branch) = self.get_mut(*member) {
                if branch.same_as != members {
                    branch.same_as.clone_from(&members);
                    branch.meta_mut().mark_updated();
                }
            }
        }
        Ok(())
    }

    /// Name-level same-as: fails if neither exists, creates the missing one.
    pub fn add_same_as(&mut self, a: &str, b: &str) -> Result<(Handle, Handle), GraphError> {
        if self.find(a).is_none() && self.find(b).is_none() {
            return Err(GraphError::MissingOperands {
                first: a.to_string(),
                second: b.to_string(),
            });
        }
        let first = self.find_or_create(a);
        let second = self.find_or_create(b);
        if first != second {
            self.merge_same_as(first, second)?;
        }
        Ok((first, second))
    }

    /// Detaches `a` and `b`; a list left holding only its owner is cleared.
    ///
    /// Only the pair is touched. Other members of the same-as class keep
    /// listing both `a` and `b`.
    pub fn remove_same_as(&mut self, a: Handle, b: Handle) -> bool {
        let mut removed = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.get_mut(from) {
                if remove_handle(&mut branch.same_as, to) {
                    removed = true;
                    branch.meta_mut().mark_updated();
                }
                if branch.same_as.len() == 1 {
                    branch.same_as.clear();
                }
            }
        }
        removed
    }

    /// Declares `a` and `b` different individuals.
    pub fn add_distinct(&mut self, a: Handle, b: Handle) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        let mut added = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.get_mut(from) {
                if push_handle(&mut branch.distinct, to) {
                    branch.meta_mut().mark_updated();
                    added = true;
                }
            }
        }
        added
    }

    /// Removes a distinctness declaration.
    pub fn remove_distinct(&mut self, a: Handle, b: Handle) -> bool {
        let mut removed = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(branch) = self.get_mut(from) {
                removed |= remove_handle(&mut branch.distinct, to);
            }
        }
        removed
    }

    /// Deletes an individual after scrubbing every reference other
    /// individuals hold to it. Class back-references are the caller's job,
    /// using the returned branch's is-a list.
    pub fn delete_individual(&mut self, individual: Handle) -> Option<IndividualBranch> {
        let removed = self.remove(individual)?;
        for branch in self.iter_mut() {
            let mut touched = remove_handle(&mut branch.distinct, individual);
            if remove_handle(&mut branch.same_as, individual) {
                touched = true;
                if branch.same_as.len() == 1 {
                    branch.same_as.clear();
                }
            }
            let before = branch.object_relations.len();
            branch.object_relations.retain(|r| r.target != individual);
            touched |= branch.object_relations.len() != before;
            for relation in branch.object_relations.iter_mut().chain(branch.data_relations.iter_mut()) {
                relation
                    .induced
                    .retain(|t| t.subject != individual && t.object != individual);
            }
            if touched {
                branch.meta_mut().mark_updated();
            }
        }
        Some(removed)
    }

    /// Removes `class` from every is-a list.
    pub fn forget_class(&mut self, class: Handle) {
        for branch in self.iter_mut() {
            branch.is_a.retain(|l| l.target != class);
        }
    }

    /// Removes every relation using `property`.
    pub fn forget_property(&mut self, property: Handle) {
        for branch in self.iter_mut() {
            branch.object_relations.retain(|r| r.property != property);
            branch.data_relations.retain(|r| r.property != property);
            for relation in branch.object_relations.iter_mut().chain(branch.data_relations.iter_mut()) {
                relation.induced.retain(|t| t.property != property);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::handle::HandleRegistry;

    fn graph() -> IndividualGraph {
        IndividualGraph::new(Arc::new(HandleRegistry::new()))
    }

    #[test]
    fn same_as_is_closed_eagerly() {
        let mut individuals = graph();
        let a = individuals.find_or_create("a");
        let b = individuals.find_or_create("b");
        let c = individuals.find_or_create("c");
        individuals.merge_same_as(a, b).unwrap();
        individuals.merge_same_as(b, c).unwrap();
        for member in [a, b, c] {
            let same: HashSet<Handle> = individuals.same_or_self(member).into_iter().collect();
            assert_eq!(same, HashSet::from([a, b, c]));
        }
    }

    #[test]
    fn same_as_needs_one_existing_side() {
        let mut individuals = graph();
        assert!(matches!(
            individuals.add_same_as("x", "y"),
            Err(GraphError::MissingOperands { .. })
        ));
        individuals.find_or_create("x");
        let (x, y) = individuals.add_same_as("x", "y").unwrap();
        assert_eq!(individuals.get(y).unwrap().same_as, {
            let mut v = vec![x, y];
            v.sort();
            v
        });
    }

    #[test]
    fn removing_the_last_partner_clears_the_list() {
        let mut individuals = graph();
        let a = individuals.find_or_create("a");
        let b = individuals.find_or_create("b");
        individuals.merge_same_as(a, b).unwrap();
        assert!(individuals.remove_same_as(a, b));
        assert!(individuals.get(a).unwrap().same_as.is_empty());
        assert!(individuals.get(b).unwrap().same_as.is_empty());
        assert_eq!(individuals.same_or_self(a), vec![a]);
    }

    #[test]
    fn removing_a_pair_leaves_other_members_alone() {
        let mut individuals = graph();
        let a = individuals.find_or_create("a");
        let b = individuals.find_or_create("b");
        let c = individuals.find_or_create("c");
        individuals.merge_same_as(a, b).unwrap();
        individuals.merge_same_as(b, c).unwrap();
        assert!(individuals.remove_same_as(a, b));

        let listed = |x: Handle| -> HashSet<Handle> { individuals.get(x).unwrap().same_as.iter().copied().collect() };
        assert_eq!(listed(a), HashSet::from([a, c]));
        assert_eq!(listed(b), HashSet::from([b, c]));
        assert_eq!(listed(c), HashSet::from([a, b, c]));
    }

    #[test]
    fn deleting_scrubs_back_references() {
        let mut individuals = graph();
        let a = individuals.find_or_create("a");
        let b = individuals.find_or_create("b");
        individuals.add_distinct(a, b);
        individuals.merge_same_as(a, b).unwrap();
        individuals.delete_individual(b).unwrap();
        let branch = individuals.get(a).unwrap();
        assert!(branch.distinct.is_empty());
        assert!(branch.same_as.is_empty());
        assert!(individuals.find("b").is_none());
    }
}
