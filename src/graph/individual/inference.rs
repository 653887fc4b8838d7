//! Inverse, symmetric and chain propagation with provenance.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::graph::assertion::{Assertion, Explanation, RejectedDerivation};
use crate::graph::branch::Triple;
use crate::graph::tree::Branch;
use crate::graph::view::{ObjectPropertyView, Schema};
use crate::handle::Handle;

use super::IndividualGraph;

/// A relation implied by one or more existing relations.
#[derive(Debug, Clone)]
struct Derivation {
    triple: Triple,
    /// Relations whose removal must retract `triple`; the first one is
    /// the relation that triggered the derivation.
    causes: Vec<Triple>,
}

/// A partial walk along chain links: the entity reached and the relations
/// followed to get there.
type Path = (Handle, Vec<Triple>);

impl IndividualGraph {
    /// Derives everything `origin` implies, breadth first. Only newly
    /// created relations are propagated further.
    pub(super) fn propagate(&mut self, schema: Schema<'_>, origin: Triple, weight: f64, assertion: &mut Assertion) {
        let registry = Arc::clone(self.registry());
        let mut queue = VecDeque::from([origin]);
        while let Some(triple) = queue.pop_front() {
            for derivation in self.derivations(schema.object_properties, triple) {
                let derived = derivation.triple;
                match self.insert_object_relation(schema, derived, weight, true) {
                    Ok(insertion) => {
                        if self.relation(derived).is_some_and(|r| r.inferred) {
                            for cause in &derivation.causes {
                                self.record_provenance(*cause, derived);
                            }
                        }
                        if insertion.created {
                            assertion
                                .explanations
                                .push(Explanation::added(&registry, derived, triple));
                            queue.push_back(derived);
                        }
                    }
                    Err(reason) => {
                        debug!(derived = %registry.display(derived.subject), %reason, "derivation rejected");
                        assertion.rejected.push(RejectedDerivation {
                            triple: derived,
                            reason,
                        });
                    }
                }
            }
        }
        if !assertion.explanations.is_empty() || !assertion.rejected.is_empty() {
            debug!(
                derived = assertion.explanations.len(),
                rejected = assertion.rejected.len(),
                "cascade finished"
            );
        }
    }

    fn derivations(&self, properties: &dyn ObjectPropertyView, triple: Triple) -> Vec<Derivation> {
        let Triple {
            subject,
            property,
            object,
        } = triple;
        let mut derivations: Vec<Derivation> = properties
            .inverses(property)
            .into_iter()
            .map(|inverse| Derivation {
                triple: Triple::new(object, inverse, subject),
                causes: vec![triple],
            })
            .collect();
        if properties.characteristics(property).symmetric {
            derivations.push(Derivation {
                triple: triple.reversed(),
                causes: vec![triple],
            });
        }

        for found in properties.chains_involving(property) {
            let links = &found.chain.links;
            let before = &links[..found.position];
            let after = &links[found.position + 1..];
            let starts = self.walk_backward(properties, subject, before);
            if starts.is_empty() {
                continue;
            }
            let ends = self.walk_forward(properties, object, after);
            for (start, head) in &starts {
                for (end, tail) in &ends {
                    let mut causes = Vec::with_capacity(head.len() + tail.len() + 1);
                    causes.push(triple);
                    causes.extend(head.iter().copied());
                    causes.extend(tail.iter().copied());
                    derivations.push(Derivation {
                        triple: Triple::new(*start, found.chain.result, *end),
                        causes,
                    });
                }
            }
        }
        derivations.retain(|d| d.triple != triple);
        derivations
    }

    /// Follows `links` forward from `from`, over same-as members.
    fn walk_forward(&self, properties: &dyn ObjectPropertyView, from: Handle, links: &[Handle]) -> Vec<Path> {
        let mut paths: Vec<Path> = vec![(from, Vec::new())];
        for link in links {
            let mut next = Vec::new();
            for (node, path) in &paths {
                for member in self.same_or_self(*node) {
                    let Some(branch) = self.get(member) else { continue };
                    for relation in &branch.object_relations {
                        if properties.property_up_inclusive(relation.property).contains(link) {
                            let mut extended = path.clone();
                            extended.push(Triple::new(member, relation.property, relation.target));
                            next.push((relation.target, extended));
                        }
                    }
                }
            }
            paths = next;
            if paths.is_empty() {
                break;
            }
        }
        paths
    }

    /// Follows `links` backward into `to`, last link first.
    fn walk_backward(&self, properties: &dyn ObjectPropertyView, to: Handle, links: &[Handle]) -> Vec<Path> {
        let mut paths: Vec<Path> = vec![(to, Vec::new())];
        for link in links.iter().rev() {
            let mut next = Vec::new();
            for (node, path) in &paths {
                let mut targets = self.same_or_self(*node);
                if targets.is_empty() {
                    targets.push(*node);
                }
                for branch in self.iter() {
                    for relation in &branch.object_relations {
                        if targets.contains(&relation.target)
                            && properties.property_up_inclusive(relation.property).contains(link)
                        {
                            let source = branch.meta().handle;
                            let mut extended = vec![Triple::new(source, relation.property, relation.target)];
                            extended.extend(path.iter().copied());
                            next.push((source, extended));
                        }
                    }
                }
            }
            paths = next;
            if paths.is_empty() {
                break;
            }
        }
        paths
    }

    /// Records on `cause` that it induced `induced`.
    pub(super) fn record_provenance(&mut self, cause: Triple, induced: Triple) {
        let Some(branch) = self.get_mut(cause.subject) else {
            return;
        };
        if let Some(relation) = branch
            .object_relations
            .iter_mut()
            .find(|r| r.property == cause.property && r.target == cause.object)
        {
            if !relation.induced.contains(&induced) {
                relation.induced.push(induced);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::graph::class::ClassGraph;
    use crate::graph::data_property::DataPropertyGraph;
    use crate::graph::object_property::{ObjectPropertyDecl, ObjectPropertyGraph};
    use crate::graph::property::Characteristics;
    use crate::graph::view::Schema;
    use crate::graph::{IndividualGraph, Triple};
    use crate::handle::HandleRegistry;

    struct Fixture {
        classes: ClassGraph,
        objects: ObjectPropertyGraph,
        data: DataPropertyGraph,
        individuals: IndividualGraph,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = Arc::new(HandleRegistry::new());
            Self {
                classes: ClassGraph::new(Arc::clone(&registry)),
                objects: ObjectPropertyGraph::new(Arc::clone(&registry)),
                data: DataPropertyGraph::new(Arc::clone(&registry)),
                individuals: IndividualGraph::new(registry),
            }
        }

        fn relate(&mut self, s: &str, p: &str, o: &str) -> crate::graph::Assertion {
            let s = self.individuals.find_or_create(s);
            let o = self.individuals.find_or_create(o);
            let p = self.objects.find(p).unwrap();
            let schema = Schema {
                classes: &self.classes,
                object_properties: &self.objects,
                data_properties: &self.data,
            };
            self.individuals.add_relation(schema, s, p, o, 1.0, false).unwrap()
        }

        fn holds(&self, s: &str, p: &str, o: &str) -> bool {
            let (Some(s), Some(p), Some(o)) = (self.individuals.find(s), self.objects.find(p), self.individuals.find(o))
            else {
                return false;
            };
            self.individuals.relation(Triple::new(s, p, o)).is_some()
        }
    }

    #[test]
    fn chains_match_at_every_position() {
        let mut f = Fixture::new();
        let uncle = f.objects.declare("hasUncle", &ObjectPropertyDecl::default());
        let parent = f.objects.declare("hasParent", &ObjectPropertyDecl::default());
        let brother = f.objects.declare("hasBrother", &ObjectPropertyDecl::default());
        assert!(f.objects.add_chain(uncle, vec![parent, brother]));

        f.relate("tom", "hasBrother", "bob");
        assert!(!f.holds("ann", "hasUncle", "bob"));
        let assertion = f.relate("ann", "hasParent", "tom");
        assert!(f.holds("ann", "hasUncle", "bob"));
        assert_eq!(assertion.explanations.len(), 1);

        f.relate("joe", "hasParent", "sam");
        f.relate("sam", "hasBrother", "max");
        assert!(f.holds("joe", "hasUncle", "max"));
    }

    #[test]
    fn chain_provenance_is_recorded_on_every_link() {
        let mut f = Fixture::new();
        let part = f.objects.declare(
            "hasPart",
            &ObjectPropertyDecl {
                characteristics: Characteristics {
                    transitive: true,
                    ..Characteristics::default()
                },
                ..ObjectPropertyDecl::default()
            },
        );
        f.relate("car", "hasPart", "engine");
        f.relate("engine", "hasPart", "piston");
        let derived = Triple::new(
            f.individuals.find("car").unwrap(),
            part,
            f.individuals.find("piston").unwrap(),
        );
        assert!(f.individuals.relation(derived).unwrap().inferred);
        for (s, o) in [("car", "engine"), ("engine", "piston")] {
            let cause = Triple::new(f.individuals.find(s).unwrap(), part, f.individuals.find(o).unwrap());
            assert!(f.individuals.relation(cause).unwrap().induced.contains(&derived));
        }
    }

    #[test]
    fn symmetric_and_inverse_terminate() {
        let mut f = Fixture::new();
        let married = f.objects.declare(
            "marriedTo",
            &ObjectPropertyDecl {
                characteristics: Characteristics {
                    symmetric: true,
                    ..Characteristics::default()
                },
                ..ObjectPropertyDecl::default()
            },
        );
        let spouse = f.objects.declare("spouseOf", &ObjectPropertyDecl::default());
        f.objects.add_inverse_of(married, spouse);
        f.relate("alice", "marriedTo", "bob");
        assert!(f.holds("bob", "marriedTo", "alice"));
        assert!(f.holds("bob", "spouseOf", "alice"));
        assert!(f.holds("alice", "spouseOf", "bob"));
    }
}
