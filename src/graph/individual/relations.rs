use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Inconsistency;
use crate::graph::assertion::{membership, Assertion, ConstraintStatus, Membership, UnresolvedConstraint};
use crate::graph::branch::{upsert_relation, Relation, Triple};
use crate::graph::tree::Branch;
use crate::graph::view::{ClassView, PropertyView, Schema};
use crate::handle::{Handle, Literal};

use super::IndividualGraph;

/// Outcome of storing one checked relation.
#[derive(Debug, Clone)]
pub(super) struct Insertion {
    pub(super) created: bool,
    pub(super) unresolved: Vec<UnresolvedConstraint>,
}

impl IndividualGraph {
    pub(super) fn display(&self, handle: Handle) -> String {
        self.registry().display(handle)
    }

    fn domain_check(
        &self,
        classes: &dyn ClassView,
        properties: &dyn PropertyView,
        subject: Handle,
        property: Handle,
    ) -> Result<Option<UnresolvedConstraint>, Inconsistency> {
        let property_name = self.display(property);
        let closure = self.class_closure(classes, subject);
        match membership(classes, &closure, &properties.domains(property)) {
            Membership::Confirmed => Ok(None),
            Membership::Unknown => Ok(Some(UnresolvedConstraint::Domain {
                property: property_name,
            })),
            Membership::Contradicted => Err(Inconsistency::Domain {
                subject: self.display(subject),
                property: property_name,
            }),
        }
    }

    /// Runs every check an object relation must pass, without mutating.
    pub(super) fn check_object_relation(
        &self,
        schema: Schema<'_>,
        triple: Triple,
    ) -> Result<Vec<UnresolvedConstraint>, Inconsistency> {
        let Triple {
            subject,
            property,
            object,
        } = triple;
        let properties = schema.object_properties;
        let property_name = self.display(property);
        let mut unresolved = Vec::new();

        if let Some(soft) = self.domain_check(schema.classes, properties, subject, property)? {
            unresolved.push(soft);
        }
        let object_closure = self.class_closure(schema.classes, object);
        match membership(schema.classes, &object_closure, &properties.ranges(property)) {
            Membership::Confirmed => {}
            Membership::Unknown => unresolved.push(UnresolvedConstraint::Range {
                property: property_name.clone(),
            }),
            Membership::Contradicted => {
                return Err(Inconsistency::Range {
                    object: self.display(object),
                    property: property_name,
                })
            }
        }

        let subject_same = self.same_or_self(subject);
        let object_same: HashSet<Handle> = self.same_or_self(object).into_iter().chain([object]).collect();
        let characteristics = properties.characteristics(property);
        if characteristics.irreflexive && subject_same.iter().chain([&subject]).any(|s| object_same.contains(s)) {
            return Err(Inconsistency::Irreflexive {
                subject: self.display(subject),
                property: property_name,
            });
        }

        let down = properties.property_down_inclusive(property);
        if characteristics.asymmetric {
            let reverse_exists = object_same.iter().filter_map(|o| self.get(*o)).any(|branch| {
                branch
                    .object_relations
                    .iter()
                    .any(|r| down.contains(&r.property) && (r.target == subject || subject_same.contains(&r.target)))
            });
            if reverse_exists {
                return Err(Inconsistency::Asymmetric {
                    subject: self.display(subject),
                    property: property_name,
                    object: self.display(object),
                });
            }
        }

        if characteristics.functional {
            let conflicting = subject_same.iter().filter_map(|s| self.get(*s)).any(|branch| {
                branch
                    .object_relations
                    .iter()
                    .any(|r| down.contains(&r.property) && !object_same.contains(&r.target))
            });
            if conflicting {
                unresolved.push(UnresolvedConstraint::Functional {
                    property: property_name,
                });
            }
        }
        Ok(unresolved)
    }

    /// Checks and stores one object relation without cascading.
    pub(super) fn insert_object_relation(
        &mut self,
        schema: Schema<'_>,
        triple: Triple,
        weight: f64,
        inferred: bool,
    ) -> Result<Insertion, Inconsistency> {
        if !self.contains(triple.subject) {
            return Err(Inconsistency::Domain {
                subject: self.display(triple.subject),
                property: self.display(triple.property),
            });
        }
        let unresolved = self.check_object_relation(schema, triple)?;
        let Some(branch) = self.get_mut(triple.subject) else {
            return Ok(Insertion {
                created: false,
                unresolved,
            });
        };
        let (_, created) = upsert_relation(
            &mut branch.object_relations,
            triple.property,
            triple.object,
            weight,
            inferred,
        );
        for constraint in &unresolved {
            branch.meta_mut().set_flag(constraint.flag(), constraint.property());
        }
        branch.meta_mut().mark_updated();
        self.mark_updated(triple.object);
        Ok(Insertion { created, unresolved })
    }

    /// Asserts `subject property object` and runs the inference cascade.
    ///
    /// On rejection nothing changes. Derived relations failing their own
    /// checks are listed in [`Assertion::rejected`] and do not undo the
    /// asserted one.
    pub fn add_relation(
        &mut self,
        schema: Schema<'_>,
        subject: Handle,
        property: Handle,
        object: Handle,
        weight: f64,
        inferred: bool,
    ) -> Result<Assertion, Inconsistency> {
        let triple = Triple::new(subject, property, object);
        let insertion = match self.insert_object_relation(schema, triple, weight, inferred) {
            Ok(insertion) => insertion,
            Err(reason) => {
                debug!(subject = %self.display(subject), property = %self.display(property), %reason, "relation rejected");
                return Err(reason);
            }
        };
        if !insertion.unresolved.is_empty() {
            debug!(
                subject = %self.display(subject),
                property = %self.display(property),
                unresolved = insertion.unresolved.len(),
                "relation accepted with unresolved constraints"
            );
        }
        let mut assertion = Assertion {
            triple,
            created: insertion.created,
            status: ConstraintStatus::from_list(insertion.unresolved),
            explanations: Vec::new(),
            rejected: Vec::new(),
        };
        if insertion.created {
            self.propagate(schema, triple, weight, &mut assertion);
        }
        Ok(assertion)
    }

    /// Asserts a relation from `subject` to a literal.
    pub fn add_data_relation(
        &mut self,
        schema: Schema<'_>,
        subject: Handle,
        property: Handle,
        literal: &Literal,
        weight: f64,
        inferred: bool,
    ) -> Result<Assertion, Inconsistency> {
        let properties = schema.data_properties;
        if !self.contains(subject) {
            return Err(Inconsistency::Domain {
                subject: self.display(subject),
                property: self.display(property),
            });
        }
        let mut unresolved = Vec::new();
        if let Some(soft) = self.domain_check(schema.classes, properties, subject, property)? {
            unresolved.push(soft);
        }
        let ranges = properties.literal_ranges(property);
        if !ranges.is_empty() && !ranges.contains(&literal.literal_type) {
            debug!(property = %self.display(property), literal_type = %literal.literal_type, "literal rejected");
            return Err(Inconsistency::LiteralRange {
                property: self.display(property),
                literal_type: literal.literal_type.clone(),
            });
        }

        let registry = Arc::clone(self.registry());
        let target = registry.intern_literal(literal);
        let down = properties.property_down_inclusive(property);
        if properties.characteristics(property).functional {
            let conflicting = self
                .same_or_self(subject)
                .into_iter()
                .filter_map(|s| self.get(s))
                .any(|b| b.data_relations.iter().any(|r| down.contains(&r.property) && r.target != target));
            if conflicting {
                unresolved.push(UnresolvedConstraint::Functional {
                    property: self.display(property),
                });
            }
        }

        let Some(branch) = self.get_mut(subject) else {
            return Err(Inconsistency::Domain {
                subject: registry.display(subject),
                property: registry.display(property),
            });
        };
        let (_, created) = upsert_relation(&mut branch.data_relations, property, target, weight, inferred);
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

    /// The exact object relation `triple`, if stored.
    #[must_use]
    pub fn relation(&self, triple: Triple) -> Option<&Relation> {
        self.get(triple.subject)?
            .object_relations
            .iter()
            .find(|r| r.property == triple.property && r.target == triple.object)
    }

    /// True if any same-as member of `subject` relates to a same-as member
    /// of `object` through `property` or one of its sub-properties. Works
    /// for both object and literal targets.
    #[must_use]
    pub fn relation_exists(
        &self,
        properties: &dyn PropertyView,
        subject: Handle,
        property: Handle,
        object: Handle,
    ) -> bool {
        let down = properties.property_down_inclusive(property);
        let mut objects: HashSet<Handle> = self.same_or_self(object).into_iter().collect();
        objects.insert(object);
        self.same_or_self(subject)
            .into_iter()
            .filter_map(|s| self.get(s))
            .flat_map(|b| b.object_relations.iter().chain(&b.data_relations))
            .any(|r| down.contains(&r.property) && objects.contains(&r.target))
    }
}
