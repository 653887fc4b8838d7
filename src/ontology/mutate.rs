//! Name-level mutations. Update statements are mapped onto these.

use tracing::debug;

use crate::error::{GraphError, OntoError, OntoResult};
use crate::graph::{
    Assertion, Branch, ClassGraph, DataPropertyGraph, EntityGraph, Hierarchy, IndividualGraph, ObjectPropertyGraph,
    PropertyView, Retraction, Schema,
};
use crate::handle::{Handle, Literal};

use super::{EntityKind, Ontology};

fn unknown(name: &str) -> OntoError {
    GraphError::UnknownEntity {
        name: name.to_string(),
    }
    .into()
}

fn mismatch(name: &str, expected: &'static str) -> OntoError {
    GraphError::KindMismatch {
        name: name.to_string(),
        expected,
    }
    .into()
}

/// Asserts an object relation between individuals, creating either end on
/// first use. Handles created here are pushed to `created`; on rejection
/// the branches are removed again.
#[allow(clippy::too_many_arguments)]
fn assert_between_individuals(
    individuals: &mut IndividualGraph,
    classes: &ClassGraph,
    object_properties: &mut ObjectPropertyGraph,
    data_properties: &DataPropertyGraph,
    subject: &str,
    property: &str,
    object: &str,
    weight: f64,
    created: &mut Vec<Handle>,
) -> OntoResult<Assertion> {
    if data_properties.touch(property) {
        return Err(mismatch(property, "an object property"));
    }
    if classes.touch(object) && !individuals.touch(object) {
        return Err(mismatch(object, "an individual"));
    }

    let mut fresh = Vec::new();
    for name in [subject, object] {
        if individuals.find(name).is_none() {
            fresh.push(individuals.find_or_create(name));
        }
    }
    let property_created = object_properties.find(property).is_none();
    let p = object_properties.find_or_create(property);
    let s = individuals.find_or_create(subject);
    let o = individuals.find_or_create(object);

    let schema = Schema {
        classes,
        object_properties: &*object_properties,
        data_properties,
    };
    let outcome = individuals.add_relation(schema, s, p, o, weight, false);
    if outcome.is_err() {
        for handle in &fresh {
            individuals.remove(*handle);
        }
        if property_created {
            object_properties.remove(p);
            fresh.push(p);
        }
    }
    created.extend(fresh);
    outcome.map_err(Into::into)
}

#[allow(clippy::too_many_arguments)]
fn assert_between_classes(
    individuals: &IndividualGraph,
    classes: &mut ClassGraph,
    object_properties: &mut ObjectPropertyGraph,
    data_properties: &DataPropertyGraph,
    subject: &str,
    property: &str,
    object: &str,
    weight: f64,
    created: &mut Vec<Handle>,
) -> OntoResult<Assertion> {
    if data_properties.touch(property) {
        return Err(mismatch(property, "an object property"));
    }
    if individuals.touch(object) && !classes.touch(object) {
        return Err(mismatch(object, "a class"));
    }
    let Some(s) = classes.find(subject) else {
        return Err(unknown(subject));
    };
    let object_created = classes.find(object).is_none();
    let o = classes.find_or_create(object);
    let property_created = object_properties.find(property).is_none();
    let p = object_properties.find_or_create(property);

    let outcome = classes.add_relation(&*object_properties, s, p, o, weight);
    if outcome.is_err() {
        if object_created {
            classes.remove(o);
            created.push(o);
        }
        if property_created {
            object_properties.remove(p);
            created.push(p);
        }
    }
    outcome.map_err(Into::into)
}

/// Asserts a literal relation on a class or, failing that, an individual
/// created on first use.
#[allow(clippy::too_many_arguments)]
fn assert_literal(
    individuals: &mut IndividualGraph,
    classes: &mut ClassGraph,
    object_properties: &ObjectPropertyGraph,
    data_properties: &mut DataPropertyGraph,
    subject: &str,
    property: &str,
    literal: &Literal,
    weight: f64,
    created: &mut Vec<Handle>,
) -> OntoResult<Assertion> {
    if object_properties.touch(property) {
        return Err(mismatch(property, "a data property"));
    }
    let class = classes.find(subject).filter(|_| !individuals.touch(subject));
    let property_created = data_properties.find(property).is_none();
    let p = data_properties.find_or_create(property);

    let outcome = if let Some(s) = class {
        classes.add_data_relation(&*data_properties, s, p, literal, weight)
    } else {
        let fresh = individuals.find(subject).is_none();
        let s = individuals.find_or_create(subject);
        if fresh {
            created.push(s);
        }
        let schema = Schema {
            classes: &*classes,
            object_properties,
            data_properties: &*data_properties,
        };
        let outcome = individuals.add_data_relation(schema, s, p, literal, weight, false);
        if outcome.is_err() && fresh {
            individuals.remove(s);
        }
        outcome
    };
    if outcome.is_err() && property_created {
        data_properties.remove(p);
        created.push(p);
    }
    outcome.map_err(Into::into)
}

fn retract_from_class(
    classes: &mut ClassGraph,
    object_properties: &ObjectPropertyGraph,
    data_properties: &DataPropertyGraph,
    subject: &str,
    property: &str,
    object: Option<&str>,
    data: bool,
) -> OntoResult<Retraction> {
    let s = classes.find(subject).ok_or_else(|| unknown(subject))?;
    let properties: &dyn PropertyView = if data { data_properties } else { object_properties };
    let p = if data {
        data_properties.find(property)
    } else {
        object_properties.find(property)
    }
    .ok_or_else(|| unknown(property))?;
    let target = match object {
        None => None,
        Some(text) if data => {
            let literal = Literal::parse(text).ok_or_else(|| mismatch(text, "a literal"))?;
            match classes.registry().lookup_literal(&literal) {
                Some(handle) => Some(handle),
                None => return Ok(Retraction::default()),
            }
        }
        Some(name) => Some(classes.find(name).ok_or_else(|| unknown(name))?),
    };
    let removed = classes.remove_relation(s, &properties.property_down_inclusive(p), target);
    Ok(Retraction {
        removed,
        ..Retraction::default()
    })
}

fn retract_literal(
    individuals: &mut IndividualGraph,
    data_properties: &DataPropertyGraph,
    subject: &str,
    property: &str,
    object: Option<&str>,
) -> OntoResult<Retraction> {
    let s = individuals.find(subject).ok_or_else(|| unknown(subject))?;
    let p = data_properties.find(property).ok_or_else(|| unknown(property))?;
    let literal = match object {
        None => None,
        Some(text) => {
            let literal = Literal::parse(text).ok_or_else(|| mismatch(text, "a literal"))?;
            match individuals.registry().lookup_literal(&literal) {
                Some(handle) => Some(handle),
                None => return Ok(Retraction::default()),
            }
        }
    };
    Ok(individuals.remove_data_relation(data_properties, s, p, literal))
}

fn retract_between_individuals(
    individuals: &mut IndividualGraph,
    object_properties: &ObjectPropertyGraph,
    subject: &str,
    property: &str,
    object: Option<&str>,
    force: bool,
) -> OntoResult<Retraction> {
    let s = individuals.find(subject).ok_or_else(|| unknown(subject))?;
    let p = object_properties.find(property).ok_or_else(|| unknown(property))?;
    let o = match object {
        None => None,
        Some(name) => Some(individuals.find(name).ok_or_else(|| unknown(name))?),
    };
    let retraction = individuals.remove_relation(object_properties, s, p, o, force);
    debug!(subject, property, removed = retraction.removed.len(), "relation removed");
    Ok(retraction)
}

impl Ontology {
    /// True when `name` is a class and not also an individual.
    fn is_class_subject(&self, name: &str) -> bool {
        let individual = self.individuals().touch(name);
        !individual && self.classes().touch(name)
    }

    /// Asserts `subject property object`. An object in `type#value` form is
    /// a literal and goes through [`add_data_relation`](Self::add_data_relation).
    ///
    /// A class subject gets a class-level relation; any other subject is an
    /// individual, created on first use. On rejection, entities this call
    /// created are removed again and nothing else changes.
    pub fn add_relation(&self, subject: &str, property: &str, object: &str, weight: f64) -> OntoResult<Assertion> {
        if let Some(literal) = Literal::parse(object) {
            return self.add_data_relation(subject, property, &literal, weight);
        }
        let mut created = Vec::new();
        let outcome = if self.is_class_subject(subject) {
            let individuals = self.individuals();
            let mut classes = self.classes_mut();
            let mut object_properties = self.object_properties_mut();
            let data_properties = self.data_properties();
            assert_between_classes(
                &individuals,
                &mut classes,
                &mut object_properties,
                &data_properties,
                subject,
                property,
                object,
                weight,
                &mut created,
            )
        } else {
            let mut individuals = self.individuals_mut();
            let classes = self.classes();
            let mut object_properties = self.object_properties_mut();
            let data_properties = self.data_properties();
            assert_between_individuals(
                &mut individuals,
                &classes,
                &mut object_properties,
                &data_properties,
                subject,
                property,
                object,
                weight,
                &mut created,
            )
        };
        self.finish(outcome, &created)
    }

    /// Asserts `subject property literal`.
    pub fn add_data_relation(
        &self,
        subject: &str,
        property: &str,
        literal: &Literal,
        weight: f64,
    ) -> OntoResult<Assertion> {
        let mut created = Vec::new();
        let outcome = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let object_properties = self.object_properties();
            let mut data_properties = self.data_properties_mut();
            assert_literal(
                &mut individuals,
                &mut classes,
                &object_properties,
                &mut data_properties,
                subject,
                property,
                literal,
                weight,
                &mut created,
            )
        };
        self.finish(outcome, &created)
    }

    /// Releases the handles of a rolled-back assertion. Expects every graph
    /// lock to be dropped.
    fn finish<T>(&self, outcome: OntoResult<T>, created: &[Handle]) -> OntoResult<T> {
        if outcome.is_err() {
            for handle in created {
                self.release(*handle);
            }
        }
        outcome
    }

    /// Removes `subject property object` (`None` = any target) and whatever
    /// it induced. `force` also retracts induced relations that were
    /// asserted directly.
    pub fn remove_relation(
        &self,
        subject: &str,
        property: &str,
        object: Option<&str>,
        force: bool,
    ) -> OntoResult<Retraction> {
        let data = self.data_properties().touch(property)
            || object.is_some_and(|o| Literal::parse(o).is_some());
        if self.is_class_subject(subject) {
            let mut classes = self.classes_mut();
            let object_properties = self.object_properties();
            let data_properties = self.data_properties();
            return retract_from_class(
                &mut classes,
                &object_properties,
                &data_properties,
                subject,
                property,
                object,
                data,
            );
        }
        let mut individuals = self.individuals_mut();
        if data {
            let data_properties = self.data_properties();
            return retract_literal(&mut individuals, &data_properties, subject, property, object);
        }
        let object_properties = self.object_properties();
        retract_between_individuals(&mut individuals, &object_properties, subject, property, object, force)
    }

    /// Replaces every `subject property *` by `subject property object`.
    ///
    /// Removal and assertion run under one set of write locks. If the new
    /// relation is rejected, the graph the removal touched is put back as
    /// it was, cascades included.
    pub fn update_relation(
        &self,
        subject: &str,
        property: &str,
        object: &str,
        weight: f64,
    ) -> OntoResult<(Retraction, Assertion)> {
        let mut created = Vec::new();
        let outcome = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let mut object_properties = self.object_properties_mut();
            let mut data_properties = self.data_properties_mut();
            let literal = Literal::parse(object);
            let class_subject = !individuals.touch(subject) && classes.touch(subject);
            let data = literal.is_some() || data_properties.touch(property);

            let saved_individuals = (!class_subject).then(|| (*individuals).clone());
            let saved_classes = class_subject.then(|| (*classes).clone());

            let retraction = if class_subject {
                retract_from_class(
                    &mut classes,
                    &object_properties,
                    &data_properties,
                    subject,
                    property,
                    None,
                    data,
                )
            } else if data {
                retract_literal(&mut individuals, &data_properties, subject, property, None)
            } else {
                retract_between_individuals(&mut individuals, &object_properties, subject, property, None, false)
            };
            let retraction = match retraction {
                Ok(retraction) => retraction,
                Err(OntoError::Graph(GraphError::UnknownEntity { .. })) => Retraction::default(),
                Err(err) => return Err(err),
            };

            let assertion = match &literal {
                Some(literal) => assert_literal(
                    &mut individuals,
                    &mut classes,
                    &object_properties,
                    &mut data_properties,
                    subject,
                    property,
                    literal,
                    weight,
                    &mut created,
                ),
                None if class_subject => assert_between_classes(
                    &individuals,
                    &mut classes,
                    &mut object_properties,
                    &data_properties,
                    subject,
                    property,
                    object,
                    weight,
                    &mut created,
                ),
                None => assert_between_individuals(
                    &mut individuals,
                    &classes,
                    &mut object_properties,
                    &data_properties,
                    subject,
                    property,
                    object,
                    weight,
                    &mut created,
                ),
            };
            match assertion {
                Ok(assertion) => Ok((retraction, assertion)),
                Err(err) => {
                    if let Some(saved) = saved_individuals {
                        *individuals = saved;
                    }
                    if let Some(saved) = saved_classes {
                        *classes = saved;
                    }
                    debug!(subject, property, "update rejected, previous relations kept");
                    Err(err)
                }
            }
        };
        self.finish(outcome, &created)
    }

    /// Merges the same-as classes of two individuals. At least one must
    /// exist; the other is created.
    pub fn add_same_as(&self, a: &str, b: &str) -> OntoResult<()> {
        self.individuals_mut().add_same_as(a, b)?;
        Ok(())
    }

    /// Detaches two same-as individuals. Other members of their same-as
    /// class are left as they were.
    pub fn remove_same_as(&self, a: &str, b: &str) -> OntoResult<bool> {
        let mut individuals = self.individuals_mut();
        let first = individuals.find(a).ok_or_else(|| unknown(a))?;
        let second = individuals.find(b).ok_or_else(|| unknown(b))?;
        Ok(individuals.remove_same_as(first, second))
    }

    /// Declares two individuals different, creating them if needed.
    pub fn add_distinct(&self, a: &str, b: &str) -> OntoResult<bool> {
        let mut individuals = self.individuals_mut();
        let classes = self.classes();
        for name in [a, b] {
            if classes.touch(name) && !individuals.touch(name) {
                return Err(mismatch(name, "an individual"));
            }
        }
        let first = individuals.find_or_create(a);
        let second = individuals.find_or_create(b);
        Ok(individuals.add_distinct(first, second))
    }

    /// Removes a distinctness declaration.
    pub fn remove_distinct(&self, a: &str, b: &str) -> OntoResult<bool> {
        let mut individuals = self.individuals_mut();
        let first = individuals.find(a).ok_or_else(|| unknown(a))?;
        let second = individuals.find(b).ok_or_else(|| unknown(b))?;
        Ok(individuals.remove_distinct(first, second))
    }

    /// `subject isA mother`, applied to the graph `subject` lives in.
    ///
    /// An unknown subject becomes a member of `mother` when that is a known
    /// class, a sub-property when it is a property, and a sub-class
    /// otherwise.
    pub fn add_inheritance(&self, subject: &str, mother: &str) -> OntoResult<bool> {
        let mother_kind = self.kind_of(mother);
        let kind = match self.kind_of(subject) {
            Some(kind) => kind,
            None => match mother_kind {
                Some(EntityKind::Individual) => return Err(mismatch(mother, "a class")),
                Some(EntityKind::Class) => EntityKind::Individual,
                Some(kind) => kind,
                None => EntityKind::Class,
            },
        };
        if mother_kind.is_some_and(|k| k != kind && !(kind == EntityKind::Individual && k == EntityKind::Class)) {
            return Err(mismatch(mother, expected_mother(kind)));
        }
        let added = match kind {
            EntityKind::Individual => {
                let mut individuals = self.individuals_mut();
                let mut classes = self.classes_mut();
                let individual = individuals.find_or_create(subject);
                let class = classes.find_or_create(mother);
                let added = individuals.add_is_a(individual, class, 1.0, false);
                classes.add_individual_child(class, individual);
                classes.mark_updated(class);
                added
            }
            EntityKind::Class => {
                let mut classes = self.classes_mut();
                let child = classes.find_or_create(subject);
                let parent = classes.find_or_create(mother);
                classes.add_mother(child, parent, 1.0, false)
            }
            EntityKind::ObjectProperty => {
                let mut properties = self.object_properties_mut();
                let child = properties.find_or_create(subject);
                let parent = properties.find_or_create(mother);
                properties.add_mother(child, parent, 1.0, false)
            }
            EntityKind::DataProperty => {
                let mut properties = self.data_properties_mut();
                let child = properties.find_or_create(subject);
                let parent = properties.find_or_create(mother);
                properties.add_mother(child, parent, 1.0, false)
            }
        };
        Ok(added)
    }

    /// Removes `subject isA mother`.
    pub fn remove_inheritance(&self, subject: &str, mother: &str) -> OntoResult<bool> {
        let removed = match self.kind_of(subject).ok_or_else(|| unknown(subject))? {
            EntityKind::Individual => {
                let mut individuals = self.individuals_mut();
                let mut classes = self.classes_mut();
                let individual = individuals.find(subject).ok_or_else(|| unknown(subject))?;
                let class = classes.find(mother).ok_or_else(|| unknown(mother))?;
                classes.remove_individual_child(class, individual);
                individuals.remove_is_a(individual, class)
            }
            EntityKind::Class => {
                let mut classes = self.classes_mut();
                remove_mother(&mut *classes, subject, mother)?
            }
            EntityKind::ObjectProperty => {
                let mut properties = self.object_properties_mut();
                remove_mother(&mut *properties, subject, mother)?
            }
            EntityKind::DataProperty => {
                let mut properties = self.data_properties_mut();
                remove_mother(&mut *properties, subject, mother)?
            }
        };
        Ok(removed)
    }

    /// Adds a spoken label to any entity.
    pub fn add_label(&self, name: &str, lang: &str, label: &str) -> OntoResult<bool> {
        self.edit_label(name, LabelOp::Add, lang, label)
    }

    /// Removes a label from any entity.
    pub fn remove_label(&self, name: &str, lang: &str, label: &str) -> OntoResult<bool> {
        self.edit_label(name, LabelOp::Remove, lang, label)
    }

    fn edit_label(&self, name: &str, op: LabelOp, lang: &str, label: &str) -> OntoResult<bool> {
        match self.kind_of(name).ok_or_else(|| unknown(name))? {
            EntityKind::Individual => edit_label(&mut *self.individuals_mut(), name, op, lang, label),
            EntityKind::Class => edit_label(&mut *self.classes_mut(), name, op, lang, label),
            EntityKind::ObjectProperty => edit_label(&mut *self.object_properties_mut(), name, op, lang, label),
            EntityKind::DataProperty => edit_label(&mut *self.data_properties_mut(), name, op, lang, label),
        }
    }

    /// Declares two object properties inverse of each other, creating them
    /// if needed.
    pub fn add_inverse_of(&self, a: &str, b: &str) -> OntoResult<bool> {
        let mut properties = self.object_properties_mut();
        let data_properties = self.data_properties();
        for name in [a, b] {
            if data_properties.touch(name) {
                return Err(mismatch(name, "an object property"));
            }
        }
        let first = properties.find_or_create(a);
        let second = properties.find_or_create(b);
        Ok(properties.add_inverse_of(first, second))
    }

    /// Removes an inverse declaration.
    pub fn remove_inverse_of(&self, a: &str, b: &str) -> OntoResult<bool> {
        let mut properties = self.object_properties_mut();
        let first = properties.find(a).ok_or_else(|| unknown(a))?;
        let second = properties.find(b).ok_or_else(|| unknown(b))?;
        Ok(properties.remove_inverse_of(first, second))
    }

    /// Deletes an individual and every reference to it.
    pub fn delete_individual(&self, name: &str) -> OntoResult<()> {
        let handle = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let handle = individuals.find(name).ok_or_else(|| unknown(name))?;
            if let Some(branch) = individuals.delete_individual(handle) {
                for link in &branch.is_a {
                    classes.remove_individual_child(link.target, handle);
                }
            }
            handle
        };
        self.release(handle);
        debug!(individual = name, "individual deleted");
        Ok(())
    }

    /// Deletes a class, its anonymous equivalent, and every reference to it.
    pub fn delete_class(&self, name: &str) -> OntoResult<()> {
        let handle = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let mut object_properties = self.object_properties_mut();
            let mut data_properties = self.data_properties_mut();
            let mut anonymous = self.anonymous_mut();
            let handle = classes.find(name).ok_or_else(|| unknown(name))?;
            anonymous.remove_for_class(&mut classes, handle);
            individuals.forget_class(handle);
            classes.scrub_class(handle);
            classes.remove(handle);
            object_properties.forget_class(handle);
            data_properties.forget_domain_class(handle);
            handle
        };
        self.release(handle);
        debug!(class = name, "class deleted");
        Ok(())
    }

    /// Deletes an object property and every relation using it.
    pub fn delete_object_property(&self, name: &str) -> OntoResult<()> {
        let handle = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let mut properties = self.object_properties_mut();
            let handle = properties.find(name).ok_or_else(|| unknown(name))?;
            individuals.forget_property(handle);
            classes.remove_relations_using(handle);
            properties.scrub_property(handle);
            properties.remove(handle);
            handle
        };
        self.release(handle);
        debug!(property = name, "object property deleted");
        Ok(())
    }

    /// Deletes a data property and every relation using it.
    pub fn delete_data_property(&self, name: &str) -> OntoResult<()> {
        let handle = {
            let mut individuals = self.individuals_mut();
            let mut classes = self.classes_mut();
            let mut properties = self.data_properties_mut();
            let handle = properties.find(name).ok_or_else(|| unknown(name))?;
            individuals.forget_property(handle);
            classes.remove_relations_using(handle);
            properties.detach(handle);
            properties.remove(handle);
            handle
        };
        self.release(handle);
        debug!(property = name, "data property deleted");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LabelOp {
    Add,
    Remove,
}

fn edit_label<B: Branch>(
    graph: &mut EntityGraph<B>,
    name: &str,
    op: LabelOp,
    lang: &str,
    label: &str,
) -> OntoResult<bool> {
    let handle = graph.find(name).ok_or_else(|| unknown(name))?;
    Ok(match op {
        LabelOp::Add => graph.add_label(handle, lang, label),
        LabelOp::Remove => graph.remove_label(handle, lang, label),
    })
}

fn remove_mother<B: Hierarchy>(graph: &mut EntityGraph<B>, child: &str, mother: &str) -> OntoResult<bool> {
    let child = graph.find(child).ok_or_else(|| unknown(child))?;
    let mother = graph.find(mother).ok_or_else(|| unknown(mother))?;
    Ok(graph.remove_mother(child, mother))
}

const fn expected_mother(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Individual | EntityKind::Class => "a class",
        EntityKind::ObjectProperty => "an object property",
        EntityKind::DataProperty => "a data property",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoo() -> Ontology {
        let ontology = Ontology::default();
        ontology.add_inheritance("Dog", "Animal").unwrap();
        ontology.add_inheritance("rex", "Dog").unwrap();
        ontology
    }

    #[test]
    fn inheritance_follows_subject_kind() {
        let ontology = zoo();
        assert_eq!(ontology.kind_of("Dog"), Some(EntityKind::Class));
        assert_eq!(ontology.kind_of("rex"), Some(EntityKind::Individual));
        assert!(ontology.individual().is_a("rex", "Animal"));

        let err = ontology.add_inheritance("Cat", "rex").unwrap_err();
        assert!(matches!(err, OntoError::Graph(GraphError::KindMismatch { .. })));
        assert!(ontology.remove_inheritance("rex", "Dog").unwrap());
        assert!(!ontology.individual().is_a("rex", "Animal"));
    }

    #[test]
    fn rejected_assertion_rolls_back_created_entities() {
        let ontology = zoo();
        ontology
            .declare_class(&crate::ontology::ClassDeclaration {
                name: "Rock".to_string(),
                disjoints: vec!["Food".to_string()],
                ..Default::default()
            })
            .unwrap();
        ontology.add_inheritance("pebble", "Rock").unwrap();
        ontology
            .declare_object_property(&crate::ontology::ObjectPropertyDeclaration {
                name: "eats".to_string(),
                ranges: vec!["Food".to_string()],
                ..Default::default()
            })
            .unwrap();

        let err = ontology.add_relation("fido", "eats", "pebble", 1.0).unwrap_err();
        assert!(err.is_inconsistency());
        assert!(!ontology.individual().touch("fido"));
        assert!(ontology.registry().lookup("fido").is_none());
        assert!(ontology.individual().touch("pebble"));
    }

    #[test]
    fn literal_objects_become_data_relations() {
        let ontology = zoo();
        let assertion = ontology.add_relation("rex", "hasAge", "integer#4", 1.0).unwrap();
        assert!(assertion.triple.object.is_literal());
        assert!(ontology.data_property().touch("hasAge"));

        let err = ontology.add_relation("rex", "hasAge", "bob", 1.0).unwrap_err();
        assert!(matches!(err, OntoError::Graph(GraphError::KindMismatch { .. })));

        let retraction = ontology.remove_relation("rex", "hasAge", None, false).unwrap();
        assert_eq!(retraction.removed.len(), 1);
    }

    #[test]
    fn class_subjects_get_class_relations() {
        let ontology = zoo();
        ontology.add_inheritance("Bone", "Food").unwrap();
        ontology.add_relation("Dog", "eats", "Bone", 0.8).unwrap();
        {
            let classes = ontology.classes();
            let dog = classes.branch("Dog").unwrap();
            assert_eq!(dog.object_relations.len(), 1);
        }
        assert!(!ontology.individual().touch("Bone"));
        let retraction = ontology.remove_relation("Dog", "eats", Some("Bone"), false).unwrap();
        assert_eq!(retraction.removed.len(), 1);
    }

    #[test]
    fn update_replaces_every_target() {
        let ontology = zoo();
        ontology.add_relation("rex", "likes", "ball", 1.0).unwrap();
        ontology.add_relation("rex", "likes", "stick", 1.0).unwrap();
        let (retraction, assertion) = ontology.update_relation("rex", "likes", "bone", 1.0).unwrap();
        assert_eq!(retraction.removed.len(), 2);
        assert!(assertion.created);
        let individuals = ontology.individuals();
        assert_eq!(individuals.branch("rex").unwrap().object_relations.len(), 1);
    }

    #[test]
    fn rejected_update_keeps_previous_relations() {
        let ontology = zoo();
        ontology
            .declare_class(&crate::ontology::ClassDeclaration {
                name: "Rock".to_string(),
                disjoints: vec!["Food".to_string()],
                ..Default::default()
            })
            .unwrap();
        ontology.add_inheritance("pebble", "Rock").unwrap();
        ontology
            .declare_object_property(&crate::ontology::ObjectPropertyDeclaration {
                name: "eats".to_string(),
                ranges: vec!["Food".to_string()],
                inverses: vec!["eatenBy".to_string()],
                ..Default::default()
            })
            .unwrap();
        ontology.add_relation("fido", "eats", "bone1", 1.0).unwrap();

        let err = ontology.update_relation("fido", "eats", "pebble", 1.0).unwrap_err();
        assert!(err.is_inconsistency());
        {
            let individuals = ontology.individuals();
            assert_eq!(individuals.branch("fido").unwrap().object_relations.len(), 1);
        }
        assert!(ontology.individual().relation_exists("fido", "eats", "bone1"));
        assert!(ontology.individual().relation_exists("bone1", "eatenBy", "fido"));
        assert!(!ontology.individual().relation_exists("pebble", "eatenBy", "fido"));
    }

    #[test]
    fn rejected_literal_update_keeps_previous_value() {
        let ontology = zoo();
        ontology
            .declare_data_property(&crate::ontology::DataPropertyDeclaration {
                name: "hasAge".to_string(),
                ranges: vec!["integer".to_string()],
                ..Default::default()
            })
            .unwrap();
        ontology.add_relation("rex", "hasAge", "integer#4", 1.0).unwrap();

        assert!(ontology.update_relation("rex", "hasAge", "string#old", 1.0).is_err());
        assert!(ontology.individual().relation_exists("rex", "hasAge", "integer#4"));
    }

    #[test]
    fn deleting_a_class_scrubs_memberships() {
        let ontology = zoo();
        ontology.add_label("Dog", "en", "dog").unwrap();
        ontology.delete_class("Dog").unwrap();
        assert!(!ontology.class().touch("Dog"));
        let individuals = ontology.individuals();
        assert!(individuals.branch("rex").unwrap().is_a.is_empty());
        assert!(ontology.registry().lookup("Dog").is_none());
    }

    #[test]
    fn deleting_an_individual_scrubs_relations_and_same_as() {
        let ontology = zoo();
        ontology.add_relation("alice", "knows", "rex", 1.0).unwrap();
        ontology.add_same_as("rex", "rexy").unwrap();
        ontology.delete_individual("rex").unwrap();
        let individuals = ontology.individuals();
        assert!(individuals.branch("alice").unwrap().object_relations.is_empty());
        assert!(individuals.branch("rexy").unwrap().same_as.is_empty());
        drop(individuals);
        let classes = ontology.classes();
        assert!(classes.branch("Dog").unwrap().individual_children.is_empty());
    }
}
