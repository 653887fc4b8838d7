//! Retraction with provenance cascade.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::graph::assertion::{Explanation, Retraction};
use crate::graph::branch::{Relation, Triple};
use crate::graph::tree::Branch;
use crate::graph::view::{ObjectPropertyView, PropertyView};
use crate::handle::{Handle, HandleRegistry};

use super::IndividualGraph;

/// State threaded through one retraction cascade.
struct Cascade<'a> {
    properties: &'a dyn ObjectPropertyView,
    registry: Arc<HandleRegistry>,
    force: bool,
    visited: HashSet<Triple>,
    out: Retraction,
}

impl IndividualGraph {
    /// Removes the object relations of `subject` using `property` (or a
    /// sub-property) towards `object` (`None` = any target), then retracts
    /// whatever they induced.
    ///
    /// Inverse and symmetric counterparts always go. Other induced relations
    /// go only when inferred, unless `force` is set. Stale provenance is
    /// reported in [`Retraction::skipped`], never as an error.
    pub fn remove_relation(
        &mut self,
        properties: &dyn ObjectPropertyView,
        subject: Handle,
        property: Handle,
        object: Option<Handle>,
        force: bool,
    ) -> Retraction {
        let down = properties.property_down_inclusive(property);
        let targets: Vec<Triple> = self
            .get(subject)
            .map(|branch| {
                branch
                    .object_relations
                    .iter()
                    .filter(|r| down.contains(&r.property) && object.map_or(true, |o| o == r.target))
                    .map(|r| Triple::new(subject, r.property, r.target))
                    .collect()
            })
            .unwrap_or_default();

        let mut cascade = Cascade {
            properties,
            registry: Arc::clone(self.registry()),
            force,
            visited: HashSet::new(),
            out: Retraction::default(),
        };
        for triple in targets {
            self.retract(&mut cascade, triple, None);
        }
        if cascade.out.removed.len() > 1 || !cascade.out.skipped.is_empty() {
            debug!(
                removed = cascade.out.removed.len(),
                skipped = cascade.out.skipped.len(),
                "retraction cascade finished"
            );
        }
        cascade.out
    }

    fn retract(&mut self, cascade: &mut Cascade<'_>, triple: Triple, cause: Option<Triple>) {
        if !cascade.visited.insert(triple) {
            return;
        }
        let Some(relation) = self.take_relation(triple) else {
            cascade.out.skipped.push(triple);
            return;
        };
        cascade.out.removed.push(triple);
        if let Some(cause) = cause {
            cascade
                .out
                .explanations
                .push(Explanation::removed(&cascade.registry, triple, cause));
        }
        self.mark_updated(triple.object);

        let mut counterparts: Vec<Triple> = cascade
            .properties
            .inverses(triple.property)
            .into_iter()
            .map(|inverse| Triple::new(triple.object, inverse, triple.subject))
            .collect();
        if cascade.properties.characteristics(triple.property).symmetric {
            counterparts.push(triple.reversed());
        }
        for counterpart in counterparts {
            if self.relation(counterpart).is_some() {
                self.retract(cascade, counterpart, Some(triple));
            }
        }

        for induced in relation.induced {
            if cascade.visited.contains(&induced) {
                continue;
            }
            match self.relation(induced) {
                None => cascade.out.skipped.push(induced),
                Some(r) if r.inferred || cascade.force => self.retract(cascade, induced, Some(triple)),
                Some(_) => {}
            }
        }
    }

    fn take_relation(&mut self, triple: Triple) -> Option<Relation> {
        let branch = self.get_mut(triple.subject)?;
        let index = branch
            .object_relations
            .iter()
            .position(|r| r.property == triple.property && r.target == triple.object)?;
        branch.meta_mut().mark_updated();
        Some(branch.object_relations.remove(index))
    }

    /// Removes data relations of `subject` using `property` (or a
    /// sub-property) towards `literal` (`None` = any value).
    pub fn remove_data_relation(
        &mut self,
        properties: &dyn PropertyView,
        subject: Handle,
        property: Handle,
        literal: Option<Handle>,
    ) -> Retraction {
        let down = properties.property_down_inclusive(property);
        let mut out = Retraction::default();
        let Some(branch) = self.get_mut(subject) else {
            return out;
        };
        branch.data_relations.retain(|r| {
            let matches = down.contains(&r.property) && literal.map_or(true, |l| l == r.target);
            if matches {
                out.removed.push(Triple::new(subject, r.property, r.target));
            }
            !matches
        });
        if !out.removed.is_empty() {
            branch.meta_mut().mark_updated();
        }
        out
    }
}
