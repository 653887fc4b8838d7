//! Read-only queries. Every query aggregates over same-as members and
//! treats unknown handles as empty results.

use std::collections::HashSet;

use crate::graph::tree::{Branch, Depth};
use crate::graph::view::{ClassView, Schema};
use crate::handle::Handle;

use super::IndividualGraph;

/// Ancestors of `property` within `depth`, looked up in the object or data
/// hierarchy depending on the kind of `target`.
fn property_up(schema: Schema<'_>, property: Handle, target: Handle, depth: Depth) -> HashSet<Handle> {
    if target.is_literal() {
        schema.data_properties.property_up(property, depth)
    } else {
        schema.object_properties.property_up(property, depth)
    }
}

/// Walks class levels upwards from `start`, one level at a time.
fn class_levels(classes: &dyn ClassView, start: Vec<Handle>) -> Vec<Vec<Handle>> {
    let mut visited: HashSet<Handle> = start.iter().copied().collect();
    let mut levels = Vec::new();
    let mut level = start;
    while !level.is_empty() {
        let mut next = Vec::new();
        for class in &level {
            for up in classes.class_up(*class, Depth::DIRECT) {
                if visited.insert(up) {
                    next.push(up);
                }
            }
        }
        levels.push(level);
        level = next;
    }
    levels
}

impl IndividualGraph {
    /// Same-as members of `individual` as a set.
    #[must_use]
    pub fn get_same(&self, individual: Handle) -> HashSet<Handle> {
        self.same_or_self(individual).into_iter().collect()
    }

    /// Smallest handle of the same-as class.
    #[must_use]
    pub fn get_lowest_same(&self, individual: Handle) -> Option<Handle> {
        self.same_or_self(individual).into_iter().min()
    }

    /// Expands every handle of `set` to its same-as class, or to its lowest
    /// representative when `single_same` is set. Literals pass through.
    #[must_use]
    pub fn expand_same(&self, set: &HashSet<Handle>, single_same: bool) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for handle in set {
            if !self.contains(*handle) {
                result.insert(*handle);
            } else if single_same {
                result.extend(self.get_lowest_same(*handle));
            } else {
                result.extend(self.same_or_self(*handle));
            }
        }
        result
    }

    /// Individuals declared distinct from any same-as member.
    #[must_use]
    pub fn get_distincts(&self, individual: Handle) -> HashSet<Handle> {
        self.same_or_self(individual)
            .into_iter()
            .filter_map(|i| self.get(i))
            .flat_map(|b| b.distinct.iter().copied())
            .filter(|h| self.contains(*h))
            .collect()
    }

    /// Classes of `individual`: direct ones at depth 1, ancestors beyond.
    #[must_use]
    pub fn get_up(&self, classes: &dyn ClassView, individual: Handle, depth: Depth) -> HashSet<Handle> {
        if !depth.allows(1) {
            return HashSet::new();
        }
        let direct = self.direct_classes(individual);
        let mut result: HashSet<Handle> = direct.iter().copied().collect();
        for class in direct {
            result.extend(classes.class_up(class, depth.step()));
        }
        result
    }

    /// True if `class` is in the class closure of `individual`.
    #[must_use]
    pub fn is_a(&self, classes: &dyn ClassView, individual: Handle, class: Handle) -> bool {
        self.class_closure(classes, individual).contains(&class)
    }

    /// Keeps the individuals of `set` that belong to `selector`.
    #[must_use]
    pub fn select(&self, classes: &dyn ClassView, set: &HashSet<Handle>, selector: Handle) -> HashSet<Handle> {
        set.iter()
            .copied()
            .filter(|i| self.is_a(classes, *i, selector))
            .collect()
    }

    /// Properties used by `individual`, its same-as members, or its
    /// classes, each widened by `depth` levels of property ancestors.
    #[must_use]
    pub fn get_relation_from(&self, schema: Schema<'_>, individual: Handle, depth: Depth) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for member in self.same_or_self(individual) {
            let Some(branch) = self.get(member) else { continue };
            for relation in branch.object_relations.iter().chain(&branch.data_relations) {
                result.insert(relation.property);
                result.extend(property_up(schema, relation.property, relation.target, depth));
            }
        }
        for class in self.class_closure(schema.classes, individual) {
            for (property, target) in schema.classes.class_relations(class) {
                result.insert(property);
                result.extend(property_up(schema, property, target, depth));
            }
        }
        result
    }

    /// Individuals using a property of `properties`, directly or through a
    /// direct class listed in `declaring_classes`.
    #[must_use]
    pub fn get_related_from(
        &self,
        properties: &HashSet<Handle>,
        declaring_classes: &HashSet<Handle>,
    ) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for branch in self.iter() {
            let uses = branch
                .object_relations
                .iter()
                .chain(&branch.data_relations)
                .any(|r| properties.contains(&r.property))
                || branch.is_a.iter().any(|l| declaring_classes.contains(&l.target));
            if uses {
                result.extend(self.same_or_self(branch.meta().handle));
            }
        }
        result
    }

    /// Properties through which some individual reaches `target` (an
    /// individual or a literal), widened by `depth`.
    #[must_use]
    pub fn get_relation_on(&self, schema: Schema<'_>, target: Handle, depth: Depth) -> HashSet<Handle> {
        let targets = self.targets_of(target);
        let mut result = HashSet::new();
        for branch in self.iter() {
            let relations = if target.is_literal() {
                &branch.data_relations
            } else {
                &branch.object_relations
            };
            for relation in relations {
                if targets.contains(&relation.target) {
                    result.insert(relation.property);
                    result.extend(property_up(schema, relation.property, relation.target, depth));
                }
            }
        }
        result
    }

    /// Targets of every relation whose property is in `properties`.
    #[must_use]
    pub fn get_related_on(&self, properties: &HashSet<Handle>) -> HashSet<Handle> {
        let mut result = HashSet::new();
        for branch in self.iter() {
            for relation in &branch.object_relations {
                if properties.contains(&relation.property) {
                    result.extend(self.same_or_self(relation.target));
                }
            }
            for relation in &branch.data_relations {
                if properties.contains(&relation.property) {
                    result.insert(relation.target);
                }
            }
        }
        result
    }

    /// Everything `individual` relates to, including class-level relations
    /// for properties the individual does not already fill itself.
    #[must_use]
    pub fn get_relation_with(&self, classes: &dyn ClassView, individual: Handle) -> HashSet<Handle> {
        let mut result = HashSet::new();
        let mut taken = HashSet::new();
        for member in self.same_or_self(individual) {
            let Some(branch) = self.get(member) else { continue };
            for relation in &branch.object_relations {
                result.extend(self.same_or_self(relation.target));
                taken.insert(relation.property);
            }
            for relation in &branch.data_relations {
                result.insert(relation.target);
                taken.insert(relation.property);
            }
        }
        for level in class_levels(classes, self.direct_classes(individual)) {
            let mut defined = Vec::new();
            for class in level {
                for (property, target) in classes.class_relations(class) {
                    if !taken.contains(&property) {
                        result.insert(target);
                        defined.push(property);
                    }
                }
            }
            taken.extend(defined);
        }
        result
    }

    /// Individuals relating to `target`, directly or through the nearest
    /// class level that defines a relation to it.
    #[must_use]
    pub fn get_related_with(&self, classes: &dyn ClassView, target: Handle) -> HashSet<Handle> {
        let targets = self.targets_of(target);
        let mut result = HashSet::new();
        for branch in self.iter() {
            let mut taken = HashSet::new();
            let mut found = false;
            for relation in branch.object_relations.iter().chain(&branch.data_relations) {
                if targets.contains(&relation.target) {
                    found = true;
                    taken.insert(relation.property);
                }
            }
            if !found {
                let direct: Vec<Handle> = branch.is_a.iter().map(|l| l.target).collect();
                'levels: for level in class_levels(classes, direct) {
                    let mut defined = Vec::new();
                    for class in level {
                        for (property, class_target) in classes.class_relations(class) {
                            if class_target == target && !taken.contains(&property) {
                                found = true;
                                break 'levels;
                            }
                            defined.push(property);
                        }
                    }
                    taken.extend(defined);
                }
            }
            if found {
                result.extend(self.same_or_self(branch.meta().handle));
            }
        }
        result
    }

    /// Targets of `individual` through `property` (or a sub-property). When
    /// the individual has none, the nearest class level defining the
    /// property answers instead.
    #[must_use]
    pub fn get_on(&self, schema: Schema<'_>, individual: Handle, property: Handle, single_same: bool) -> HashSet<Handle> {
        let object_properties = schema.object_properties.property_down_inclusive(property);
        let data_properties = schema.data_properties.property_down_inclusive(property);
        let mut result = HashSet::new();
        for member in self.same_or_self(individual) {
            let Some(branch) = self.get(member) else { continue };
            for relation in &branch.object_relations {
                if object_properties.contains(&relation.property) {
                    if single_same {
                        result.extend(self.get_lowest_same(relation.target));
                    } else {
                        result.extend(self.same_or_self(relation.target));
                    }
                }
            }
            for relation in &branch.data_relations {
                if data_properties.contains(&relation.property) {
                    result.insert(relation.target);
                }
            }
        }
        if result.is_empty() && self.contains(individual) {
            for level in class_levels(schema.classes, self.direct_classes(individual)) {
                for class in level {
                    for (p, target) in schema.classes.class_relations(class) {
                        if object_properties.contains(&p) || data_properties.contains(&p) {
                            result.insert(target);
                        }
                    }
                }
                if !result.is_empty() {
                    break;
                }
            }
        }
        result
    }

    /// Individuals reaching `target` through `property` (or a
    /// sub-property), directly or through their nearest defining class.
    #[must_use]
    pub fn get_from(&self, schema: Schema<'_>, target: Handle, property: Handle, single_same: bool) -> HashSet<Handle> {
        let mut properties = schema.object_properties.property_down_inclusive(property);
        properties.extend(schema.data_properties.property_down_inclusive(property));
        let targets = self.targets_of(target);
        let mut found = HashSet::new();
        for branch in self.iter() {
            let direct = branch
                .object_relations
                .iter()
                .chain(&branch.data_relations)
                .any(|r| properties.contains(&r.property) && targets.contains(&r.target));
            let inherited = !direct && {
                let start: Vec<Handle> = branch.is_a.iter().map(|l| l.target).collect();
                class_levels(schema.classes, start)
                    .into_iter()
                    .find_map(|level| {
                        let defined: Vec<Handle> = level
                            .iter()
                            .flat_map(|c| schema.classes.class_relations(*c))
                            .filter(|(p, _)| properties.contains(p))
                            .map(|(_, t)| t)
                            .collect();
                        (!defined.is_empty()).then(|| defined.contains(&target))
                    })
                    .unwrap_or(false)
            };
            if direct || inherited {
                found.insert(branch.meta().handle);
            }
        }
        self.expand_same(&found, single_same)
    }

    /// Properties linking `individual` to `target`, widened by `depth`;
    /// falls back to the nearest class level that links to `target`.
    #[must_use]
    pub fn get_with(&self, schema: Schema<'_>, individual: Handle, target: Handle, depth: Depth) -> HashSet<Handle> {
        let targets = self.targets_of(target);
        let mut result = HashSet::new();
        for member in self.same_or_self(individual) {
            let Some(branch) = self.get(member) else { continue };
            for relation in branch.object_relations.iter().chain(&branch.data_relations) {
                if targets.contains(&relation.target) {
                    result.insert(relation.property);
                    result.extend(property_up(schema, relation.property, relation.target, depth));
                }
            }
        }
        for level in class_levels(schema.classes, self.direct_classes(individual)) {
            let mut found = false;
            for class in level {
                for (property, class_target) in schema.classes.class_relations(class) {
                    if class_target == target {
                        found = true;
                        result.insert(property);
                        result.extend(property_up(schema, property, class_target, depth));
                    }
                }
            }
            if found {
                break;
            }
        }
        result
    }

    /// `target` with its same-as members when it is an individual.
    fn targets_of(&self, target: Handle) -> HashSet<Handle> {
        let mut targets: HashSet<Handle> = self.same_or_self(target).into_iter().collect();
        targets.insert(target);
        targets
    }
}
