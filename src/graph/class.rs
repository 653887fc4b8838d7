//! Class hierarchy: multiple inheritance, disjointness, class-level
//! relations inherited by members, and links to anonymous equivalents.

use std::collections::HashSet;

use tracing::debug;

use crate::error::Inconsistency;
use crate::handle::{Handle, Literal};

use super::assertion::{membership, Assertion, ConstraintStatus, Membership, UnresolvedConstraint};
use super::branch::{push_handle, remove_handle, upsert_relation, BranchMeta, Relation, Triple};
use super::tree::{Branch, Depth, EntityGraph, Hierarchy, HierarchyLinks};
use super::view::{ClassView, DataPropertyView, ObjectPropertyView, PropertyView};

/// A named class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBranch {
    meta: BranchMeta,
    links: HierarchyLinks,
    /// Individuals directly declared members of this class.
    pub individual_children: Vec<Handle>,
    /// Class-level object relations (targets are classes).
    pub object_relations: Vec<Relation>,
    /// Class-level data relations (targets are literals).
    pub data_relations: Vec<Relation>,
    /// Identifier of the anonymous class equivalent to this one.
    pub anonymous: Option<String>,
}

impl Branch for ClassBranch {
    fn new(meta: BranchMeta) -> Self {
        Self {
            meta,
            links: HierarchyLinks::default(),
            individual_children: Vec::new(),
            object_relations: Vec::new(),
            data_relations: Vec::new(),
            anonymous: None,
        }
    }

    fn meta(&self) -> &BranchMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut BranchMeta {
        &mut self.meta
    }
}

impl Hierarchy for ClassBranch {
    fn links(&self) -> &HierarchyLinks {
        &self.links
    }

    fn links_mut(&mut self) -> &mut HierarchyLinks {
        &mut self.links
    }
}

/// Graph of every named class.
pub type ClassGraph = EntityGraph<ClassBranch>;

impl ClassView for ClassGraph {
    fn class_name(&self, class: Handle) -> Option<&str> {
        self.name(class)
    }

    fn class_up(&self, class: Handle, depth: Depth) -> HashSet<Handle> {
        self.up(class, depth)
    }

    fn class_closure(&self, classes: &[Handle]) -> HashSet<Handle> {
        classes.iter().flat_map(|c| self.up_inclusive(*c)).collect()
    }

    fn disjoint_closure(&self, classes: &HashSet<Handle>) -> HashSet<Handle> {
        classes.iter().flat_map(|c| self.disjoint(*c)).collect()
    }

    fn class_relations(&self, class: Handle) -> Vec<(Handle, Handle)> {
        self.get(class).map_or_else(Vec::new, |b| {
            b.object_relations
                .iter()
                .chain(&b.data_relations)
                .map(|r| (r.property, r.target))
                .collect()
        })
    }
}

impl ClassGraph {
    /// Records `individual` as a direct member of `class`.
    pub fn add_individual_child(&mut self, class: Handle, individual: Handle) -> bool {
        self.get_mut(class)
            .is_some_and(|b| push_handle(&mut b.individual_children, individual))
    }

    /// Forgets `individual` as a direct member of `class`.
    pub fn remove_individual_child(&mut self, class: Handle, individual: Handle) -> bool {
        self.get_mut(class)
            .is_some_and(|b| remove_handle(&mut b.individual_children, individual))
    }

    /// Asserts a class-level object relation between two classes.
    pub fn add_relation(
        &mut self,
        properties: &dyn ObjectPropertyView,
        subject: Handle,
        property: Handle,
        object: Handle,
        weight: f64,
    ) -> Result<Assertion, Inconsistency> {
        let subject_name = self.name(subject).unwrap_or_default().to_string();
        let object_name = self.name(object).unwrap_or_default().to_string();
        let property_name = properties.property_name(property).unwrap_or_default().to_string();
        let mut unresolved = Vec::new();

        match membership(&*self, &self.up_inclusive(subject), &properties.domains(property)) {
            Membership::Confirmed => {}
            Membership::Unknown => unresolved.push(UnresolvedConstraint::Domain {
                property: property_name.clone(),
            }),
            Membership::Contradicted => {
                return Err(Inconsistency::Domain {
                    subject: subject_name,
                    property: property_name,
                })
            }
        }
        match membership(&*self, &self.up_inclusive(object), &properties.ranges(property)) {
            Membership::Confirmed => {}
            Membership::Unknown => unresolved.push(UnresolvedConstraint::Range {
                property: property_name.clone(),
            }),
            Membership::Contradicted => {
                return Err(Inconsistency::Range {
                    object: object_name,
                    property: property_name,
                })
            }
        }

        let characteristics = properties.characteristics(property);
        if characteristics.irreflexive && subject == object {
            return Err(Inconsistency::Irreflexive {
                subject: subject_name,
                property: property_name,
            });
        }
        if characteristics.asymmetric {
            let down = properties.property_down_inclusive(property);
            let reverse = self.get(object).is_some_and(|b| {
                b.object_relations
                    .iter()
                    .any(|r| r.target == subject && down.contains(&r.property))
            });
            if reverse {
                return Err(Inconsistency::Asymmetric {
                    subject: subject_name,
                    property: property_name,
                    object: object_name,
                });
            }
        }

        let Some(branch) = self.get_mut(subject) else {
            return Err(Inconsistency::Domain {
                subject: subject_name,
                property: property_name,
            });
        };
        let (_, created) = upsert_relation(&mut branch.object_relations, property, object, weight, false);
        for constraint in &unresolved {
            branch.meta_mut().set_flag(constraint.flag(), constraint.property());
        }
        branch.meta_mut().mark_updated();
        self.mark_updated(object);
        if !unresolved.is_empty() {
            debug!(subject = %subject_name, property = %property_name, "class relation accepted with unresolved constraints");
        }

        Ok(Assertion {
            triple: Triple::new(subject, property, object),
            created,
            status: ConstraintStatus::from_list(unresolved),
            explanations: Vec::new(),
            rejected: Vec::new(),
        })
    }

    /// Asserts a class-level data relation.
    pub fn add_data_relation(
        &mut self,
        properties: &dyn DataPropertyView,
        subject: Handle,
        property: Handle,
        literal: &Literal,
        weight: f64,
    ) -> Result<Assertion, Inconsistency> {
        let subject_name = self.name(subject).unwrap_or_default().to_string();
        let property_name = properties.property_name(property).unwrap_or_default().to_string();
        let mut unresolved = Vec::new();

        match membership(&*self, &self.up_inclusive(subject), &properties.domains(property)) {
            Membership::Confirmed => {}
            Membership::Unknown => unresolved.push(UnresolvedConstraint::Domain {
                property: property_name.clone(),
            }),
            Membership::Contradicted => {
                return Err(Inconsistency::Domain {
                    subject: subject_name,
                    property: property_name,
                })
            }
        }
        let ranges = properties.literal_ranges(property);
        if !ranges.is_empty() && !ranges.contains(&literal.literal_type) {
            return Err(Inconsistency::LiteralRange {
                property: property_name,
                literal_type: literal.literal_type.clone(),
            });
        }

        let target = self.registry().intern_literal(literal);
        let Some(branch) = self.get_mut(subject) else {
            return Err(Inconsistency::Domain {
                subject: subject_name,
                property: property_name,
            });
        };
        let (_, created) = upsert_relation(&mut branch.data_relations, property, target, weight, false);
        for constraint in &unresolved {
            branch.meta_mut().set_flag(constraint.flag(), constraint.property());
        }
        branch.meta_mut().mark_updated();

        Ok(Assertion {
            triple: Triple::new(subject, property, target),
            created,
            status: ConstraintStatus::from_list(unresolved),
            explanations: Vec::new(),
            rejected: Vec::new(),
        })
    }

    /// Removes class-level relations of `subject` whose property is in
    /// `properties` and whose target matches `object` (`None` = any).
    pub fn remove_relation(
        &mut self,
        subject: Handle,
        properties: &HashSet<Handle>,
        object: Option<Handle>,
    ) -> Vec<Triple> {
        let Some(branch) = self.get_mut(subject) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        for list in [&mut branch.object_relations, &mut branch.data_relations] {
            list.retain(|r| {
                let matches = properties.contains(&r.property) && object.map_or(true, |o| o == r.target);
                if matches {
                    removed.push(Triple::new(subject, r.property, r.target));
                }
                !matches
            });
        }
        if !removed.is_empty() {
            branch.meta_mut().mark_updated();
        }
        removed
    }

    /// Drops every class-level relation targeting `target`.
    pub fn remove_relations_to(&mut self, target: Handle) {
        for branch in self.iter_mut() {
            branch.object_relations.retain(|r| r.target != target);
        }
    }

    /// Drops every class-level relation using `property`.
    pub fn remove_relations_using(&mut self, property: Handle) {
        for branch in self.iter_mut() {
            branch.object_relations.retain(|r| r.property != property);
            branch.data_relations.retain(|r| r.property != property);
        }
    }

    /// Disjoint classes of `class`, including descendants of each.
    #[must_use]
    pub fn get_disjoint(&self, class: Handle) -> HashSet<Handle> {
        self.disjoint(class)
    }

    /// Properties used by `class` or its ancestors, widened by `depth`
    /// levels of property ancestors.
    #[must_use]
    pub fn get_relation_from(
        &self,
        class: Handle,
        depth: Depth,
        object_properties: &dyn PropertyView,
        data_properties: &dyn PropertyView,
    ) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for up in self.up_inclusive(class) {
            let Some(branch) = self.get(up) else { continue };
            for relation in &branch.object_relations {
                result.insert(relation.property);
                result.extend(object_properties.property_up(relation.property, depth));
            }
            for relation in &branch.data_relations {
                result.insert(relation.property);
                result.extend(data_properties.property_up(relation.property, depth));
            }
        }
        result
    }

    /// Classes (and their descendants) declaring a relation with a property
    /// in `properties`.
    #[must_use]
    pub fn get_related_from(&self, properties: &HashSet<Handle>) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for branch in self.iter() {
            let uses = branch
                .object_relations
                .iter()
                .chain(&branch.data_relations)
                .any(|r| properties.contains(&r.property));
            if uses {
                result.extend(self.down_inclusive(branch.meta().handle));
            }
        }
        result
    }

    /// Properties of class-level relations targeting `target`.
    #[must_use]
    pub fn get_relation_on(
        &self,
        target: Handle,
        depth: Depth,
        properties: &dyn PropertyView,
    ) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for branch in self.iter() {
            for relation in branch.object_relations.iter().chain(&branch.data_relations) {
                if relation.target == target {
                    result.insert(relation.property);
                    result.extend(properties.property_up(relation.property, depth));
                }
            }
        }
        result
    }

    /// Targets of class-level relations using a property in `properties`.
    #[must_use]
    pub fn get_related_on(&self, properties: &HashSet<Handle>) -> HashSet<Handle> {
        self.iter()
            .flat_map(|b| b.object_relations.iter().chain(&b.data_relations))
            .filter(|r| properties.contains(&r.property))
            .map(|r| r.target)
            .collect()
    }

    /// Targets of the relations of `class` and its ancestors.
    #[must_use]
    pub fn get_relation_with(&self, class: Handle) -> HashSet<Handle> {
        self.up_inclusive(class)
            .into_iter()
            .filter_map(|c| self.get(c))
            .flat_map(|b| b.object_relations.iter().chain(&b.data_relations))
            .map(|r| r.target)
            .collect()
    }

    /// Classes with a class-level relation targeting `target`.
    #[must_use]
    pub fn get_related_with(&self, target: Handle) -> HashSet<Handle> {
        self.iter()
            .filter(|b| {
                b.object_relations
                    .iter()
                    .chain(&b.data_relations)
                    .any(|r| r.target == target)
            })
            .map(|b| b.meta().handle)
            .collect()
    }

    /// Targets reached from `class` through a property in `properties`;
    /// the nearest ancestor level that has any wins.
    #[must_use]
    pub fn get_on(&self, class: Handle, properties: &HashSet<Handle>) -> HashSet<Handle> {
        let mut level = HashSet::from([class]);
        let mut visited = level.clone();
        while !level.is_empty() {
            let found: HashSet<Handle> = level
                .iter()
                .filter_map(|c| self.get(*c))
                .flat_map(|b| b.object_relations.iter().chain(&b.data_relations))
                .filter(|r| properties.contains(&r.property))
                .map(|r| r.target)
                .collect();
            if !found.is_empty() {
                return found;
            }
            let mut next = HashSet::new();
            for c in &level {
                for up in self.up(*c, Depth::DIRECT) {
                    if visited.insert(up) {
                        next.insert(up);
                    }
                }
            }
            level = next;
        }
        HashSet::new()
    }

    /// Classes whose class-level relations (own or inherited) reach `target`
    /// through a property in `properties`.
    #[must_use]
    pub fn get_from(&self, target: Handle, properties: &HashSet<Handle>) -> HashSet<Handle> {
        self.handles()
            .into_iter()
            .filter(|c| self.get_on(*c, properties).contains(&target))
            .collect()
    }

    /// Properties linking `class` (or an ancestor) to `target`.
    #[must_use]
    pub fn get_with(
        &self,
        class: Handle,
        target: Handle,
        depth: Depth,
        properties: &dyn PropertyView,
    ) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for up in self.up_inclusive(class) {
            let Some(branch) = self.get(up) else { continue };
            for relation in branch.object_relations.iter().chain(&branch.data_relations) {
                if relation.target == target {
                    result.insert(relation.property);
                    result.extend(properties.property_up(relation.property, depth));
                }
            }
        }
        result
    }

    /// Individuals of `class` or of any subclass.
    #[must_use]
    pub fn get_individuals(&self, class: Handle) -> HashSet<Handle> {
        self.down_inclusive(class)
            .into_iter()
            .filter_map(|c| self.get(c))
            .flat_map(|b| b.individual_children.iter().copied())
            .collect()
    }

    /// Scrubs every reference to `class` held by other classes.
    pub fn scrub_class(&mut self, class: Handle) {
        self.detach(class);
        self.remove_relations_to(class);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::object_property::{ObjectPropertyDecl, ObjectPropertyGraph};
    use crate::handle::HandleRegistry;

    fn setup() -> (ClassGraph, ObjectPropertyGraph) {
        let registry = Arc::new(HandleRegistry::new());
        (ClassGraph::new(Arc::clone(&registry)), ObjectPropertyGraph::new(registry))
    }

    #[test]
    fn class_relation_checks_domain_disjointness() {
        let (mut classes, mut properties) = setup();
        let animal = classes.find_or_create("Animal");
        let food = classes.find_or_create("Food");
        let rock = classes.find_or_create("Rock");
        classes.add_disjoint(food, rock);
        let eats = properties
            .declare(
                "eats",
                &ObjectPropertyDecl {
                    domains: vec![animal],
                    ranges: vec![food],
                    ..ObjectPropertyDecl::default()
                },
            );

        let ok = classes.add_relation(&properties, animal, eats, food, 1.0).unwrap();
        assert!(ok.status.is_satisfied());
        let err = classes.add_relation(&properties, animal, eats, rock, 1.0).unwrap_err();
        assert_eq!(err.kind(), "range");
        assert_eq!(classes.get(animal).unwrap().object_relations.len(), 1);
    }

    #[test]
    fn get_on_inherits_from_nearest_ancestor() {
        let (mut classes, mut properties) = setup();
        let animal = classes.find_or_create("Animal");
        let dog = classes.find_or_create("Dog");
        let food = classes.find_or_create("Food");
        classes.add_mother(dog, animal, 1.0, false);
        let eats = properties.declare("eats", &ObjectPropertyDecl::default());
        classes.add_relation(&properties, animal, eats, food, 1.0).unwrap();

        let on = classes.get_on(dog, &HashSet::from([eats]));
        assert_eq!(on, HashSet::from([food]));
        assert!(classes.get_from(food, &HashSet::from([eats])).contains(&dog));
    }

    #[test]
    fn individuals_of_subclasses_are_members() {
        let (mut classes, _) = setup();
        let animal = classes.find_or_create("Animal");
        let dog = classes.find_or_create("Dog");
        classes.add_mother(dog, animal, 1.0, false);
        let rex = Handle::from_raw(99);
        classes.add_individual_child(dog, rex);
        assert_eq!(classes.get_individuals(animal), HashSet::from([rex]));
    }
}
