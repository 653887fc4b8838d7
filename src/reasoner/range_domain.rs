use std::collections::HashSet;

use crate::graph::{Branch, ClassGraph, ClassView, Depth, IndividualGraph, PropertyView};
use crate::handle::Handle;
use crate::notify::Severity;
use crate::ontology::Ontology;

use super::{Capabilities, Reasoner, ReasonerOutput};

const NAME: &str = "range_domain";

/// Turns unresolved "domain" and "range" flags into inferred memberships.
///
/// An individual flagged `domain: p` joins the domain classes of `p`; the
/// targets of an individual flagged `range: p` join the range classes of
/// `p`. A class disjoint with what the entity already is gets skipped with
/// a warning. Flags are cleared once handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeDomainReasoner;

struct Flagged {
    individual: Handle,
    domains: Vec<String>,
    ranges: Vec<String>,
}

/// Direct declarations first, inherited ones when there are none.
fn nearest(direct: HashSet<Handle>, inherited: impl FnOnce() -> HashSet<Handle>) -> HashSet<Handle> {
    if direct.is_empty() {
        inherited()
    } else {
        direct
    }
}

fn join(
    individuals: &mut IndividualGraph,
    classes: &mut ClassGraph,
    individual: Handle,
    candidates: &HashSet<Handle>,
    cause: (&str, &str),
    out: &mut ReasonerOutput,
) -> bool {
    let closure = individuals.class_closure(&*classes, individual);
    if candidates.is_empty() || !closure.is_disjoint(candidates) {
        return false;
    }
    let name = individuals.name(individual).unwrap_or_default().to_string();
    let mut changed = false;
    for &class in candidates {
        let class_name = classes.name(class).unwrap_or_default().to_string();
        if !closure.is_disjoint(&classes.disjoint_closure(&HashSet::from([class]))) {
            out.notify(
                Severity::Warning,
                NAME,
                format!("{name} cannot join {class_name}: disjoint with one of its classes"),
            );
            continue;
        }
        if individuals.add_is_a(individual, class, 1.0, true) {
            classes.add_individual_child(class, individual);
            classes.mark_updated(class);
            let (property, key) = cause;
            out.explain(
                format!("[ADD]{name}|isA|{class_name}"),
                format!("[ADD]{property}|{key}|{class_name}"),
            );
            changed = true;
        }
    }
    changed
}

impl RangeDomainReasoner {
    fn resolve(ontology: &Ontology, out: &mut ReasonerOutput) -> bool {
        let mut individuals = ontology.individuals_mut();
        let mut classes = ontology.classes_mut();
        let object_properties = ontology.object_properties();
        let data_properties = ontology.data_properties();

        let flagged: Vec<Flagged> = individuals
            .iter()
            .filter_map(|b| {
                let meta = b.meta();
                let domains = meta.flag("domain").to_vec();
                let ranges = meta.flag("range").to_vec();
                (!domains.is_empty() || !ranges.is_empty()).then(|| Flagged {
                    individual: meta.handle,
                    domains,
                    ranges,
                })
            })
            .collect();

        let mut changed = false;
        for Flagged {
            individual,
            domains,
            ranges,
        } in flagged
        {
            for property in &domains {
                let candidates = if let Some(p) = object_properties.find(property) {
                    nearest(object_properties.get_domain(p, Depth::DIRECT), || {
                        object_properties.get_domain(p, Depth::Unbounded)
                    })
                } else if let Some(p) = data_properties.find(property) {
                    nearest(data_properties.get_domain(p, Depth::DIRECT), || {
                        data_properties.get_domain(p, Depth::Unbounded)
                    })
                } else {
                    HashSet::new()
                };
                changed |= join(
                    &mut individuals,
                    &mut classes,
                    individual,
                    &candidates,
                    (property, "hasDomain"),
                    out,
                );
                if let Some(branch) = individuals.get_mut(individual) {
                    branch.meta_mut().clear_flag("domain", property);
                }
            }

            for property in &ranges {
                if let Some(p) = object_properties.find(property) {
                    let candidates = nearest(object_properties.get_range(p, Depth::DIRECT), || {
                        object_properties.get_range(p, Depth::Unbounded)
                    });
                    let down = object_properties.property_down_inclusive(p);
                    let targets: Vec<Handle> = individuals.get(individual).map_or_else(Vec::new, |b| {
                        b.object_relations
                            .iter()
                            .filter(|r| down.contains(&r.property))
                            .map(|r| r.target)
                            .collect()
                    });
                    for target in targets {
                        changed |= join(
                            &mut individuals,
                            &mut classes,
                            target,
                            &candidates,
                            (property, "hasRange"),
                            out,
                        );
                    }
                }
                if let Some(branch) = individuals.get_mut(individual) {
                    branch.meta_mut().clear_flag("range", property);
                }
            }
        }
        changed
    }
}

impl Reasoner for RangeDomainReasoner {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "This reasoner resolves unconfirmed domains and ranges by inferring class memberships."
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pre: false,
            post: true,
            periodic: true,
        }
    }

    fn post_reason(&mut self, ontology: &Ontology, out: &mut ReasonerOutput) {
        Self::resolve(ontology, out);
    }

    fn periodic_reason(&mut self, ontology: &Ontology, out: &mut ReasonerOutput) -> bool {
        Self::resolve(ontology, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::ObjectPropertyDeclaration;

    #[test]
    fn test_flags_become_memberships() {
        let ontology = Ontology::default();
        ontology
            .declare_object_property(&ObjectPropertyDeclaration {
                name: "eats".to_string(),
                domains: vec!["Animal".to_string()],
                ranges: vec!["Food".to_string()],
                ..ObjectPropertyDeclaration::default()
            })
            .unwrap();
        let assertion = ontology.add_relation("fido", "eats", "kibble", 1.0).unwrap();
        assert!(!assertion.status.is_satisfied());

        let mut out = ReasonerOutput::default();
        assert!(RangeDomainReasoner.periodic_reason(&ontology, &mut out));
        assert!(ontology.individual().is_a("fido", "Animal"));
        assert!(ontology.individual().is_a("kibble", "Food"));
        assert!(out
            .explanations
            .iter()
            .any(|e| e.fact == "[ADD]fido|isA|Animal" && e.cause == "[ADD]eats|hasDomain|Animal"));

        let mut again = ReasonerOutput::default();
        assert!(!RangeDomainReasoner.periodic_reason(&ontology, &mut again));
        assert!(again.is_empty());
    }
}
