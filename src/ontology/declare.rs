//! Name-level declarations, as produced by an ontology-file parser and
//! stored in snapshots.

use std::collections::HashSet;
use std::slice;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, OntoError, OntoResult};
use crate::graph::{
    AnonymousScope, Branch, Characteristics, DataPropertyDecl, Dictionary, EntityGraph, Expression, Hierarchy,
    ObjectPropertyDecl, Schema,
};
use crate::handle::{Handle, Literal};

use super::Ontology;

/// A label attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Language tag.
    pub lang: String,
    /// Label text.
    pub text: String,
    /// Recognition-only label.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub muted: bool,
}

impl Label {
    /// A spoken label.
    pub fn spoken(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
            muted: false,
        }
    }

    pub(crate) fn from_dictionary(dictionary: &Dictionary) -> Vec<Self> {
        let mut labels = Vec::new();
        for (muted, map) in [(false, &dictionary.spoken), (true, &dictionary.muted)] {
            for (lang, texts) in map {
                labels.extend(texts.iter().map(|text| Self {
                    lang: lang.clone(),
                    text: text.clone(),
                    muted,
                }));
            }
        }
        labels
    }
}

fn default_weight() -> f64 {
    1.0
}

/// A relation by name. Data relation targets use the `type#value` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDeclaration {
    /// Property name.
    pub property: String,
    /// Target name or literal.
    pub target: String,
    /// Confidence weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl RelationDeclaration {
    /// A relation with weight 1.
    pub fn new(property: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            target: target.into(),
            weight: 1.0,
        }
    }
}

/// A named class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassDeclaration {
    /// Identifier.
    pub name: String,
    /// Direct super-classes.
    pub mothers: Vec<String>,
    /// Disjoint classes.
    pub disjoints: Vec<String>,
    /// Class-level object relations.
    pub relations: Vec<RelationDeclaration>,
    /// Class-level data relations.
    pub data_relations: Vec<RelationDeclaration>,
    /// Labels.
    pub labels: Vec<Label>,
}

/// An object property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPropertyDeclaration {
    /// Identifier.
    pub name: String,
    /// Super-properties.
    pub mothers: Vec<String>,
    /// Disjoint properties.
    pub disjoints: Vec<String>,
    /// Inverse properties.
    pub inverses: Vec<String>,
    /// Domain classes.
    pub domains: Vec<String>,
    /// Range classes.
    pub ranges: Vec<String>,
    /// Chains implying this property, each listed link by link.
    pub chains: Vec<Vec<String>>,
    /// Characteristics.
    pub characteristics: Characteristics,
    /// Labels.
    pub labels: Vec<Label>,
}

/// A data property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPropertyDeclaration {
    /// Identifier.
    pub name: String,
    /// Super-properties.
    pub mothers: Vec<String>,
    /// Disjoint properties.
    pub disjoints: Vec<String>,
    /// Domain classes.
    pub domains: Vec<String>,
    /// Accepted literal types.
    pub ranges: Vec<String>,
    /// Characteristics.
    pub characteristics: Characteristics,
    /// Labels.
    pub labels: Vec<Label>,
}

/// A named individual.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndividualDeclaration {
    /// Identifier.
    pub name: String,
    /// Classes.
    pub is_a: Vec<String>,
    /// Same-as partners.
    pub same_as: Vec<String>,
    /// Distinct individuals.
    pub distinct: Vec<String>,
    /// Object relations.
    pub relations: Vec<RelationDeclaration>,
    /// Data relations.
    pub data_relations: Vec<RelationDeclaration>,
    /// Labels.
    pub labels: Vec<Label>,
}

fn apply_labels<B: Branch>(graph: &mut EntityGraph<B>, handle: Handle, labels: &[Label]) {
    for label in labels {
        if label.muted {
            graph.add_muted_label(handle, &label.lang, &label.text);
        } else {
            graph.add_label(handle, &label.lang, &label.text);
        }
    }
}

fn create_all<B: Branch>(graph: &mut EntityGraph<B>, names: &[String]) -> Vec<Handle> {
    names.iter().map(|name| graph.find_or_create(name)).collect()
}

fn parse_literal(target: &str) -> Result<Literal, GraphError> {
    Literal::parse(target).ok_or_else(|| GraphError::KindMismatch {
        name: target.to_string(),
        expected: "a literal",
    })
}

impl Ontology {
    /// Creates or extends a class.
    pub fn declare_class(&self, declaration: &ClassDeclaration) -> OntoResult<Handle> {
        let mut classes = self.classes_mut();
        let mut object_properties = self.object_properties_mut();
        let mut data_properties = self.data_properties_mut();

        let class = classes.find_or_create(&declaration.name);
        for mother in create_all(&mut *classes, &declaration.mothers) {
            classes.add_mother(class, mother, 1.0, false);
        }
        for disjoint in create_all(&mut *classes, &declaration.disjoints) {
            classes.add_disjoint(class, disjoint);
        }
        apply_labels(&mut *classes, class, &declaration.labels);

        for relation in &declaration.relations {
            let property = object_properties.find_or_create(&relation.property);
            let target = classes.find_or_create(&relation.target);
            classes.add_relation(&*object_properties, class, property, target, relation.weight)?;
        }
        for relation in &declaration.data_relations {
            let literal = parse_literal(&relation.target)?;
            let property = data_properties.find_or_create(&relation.property);
            classes.add_data_relation(&*data_properties, class, property, &literal, relation.weight)?;
        }
        Ok(class)
    }

    /// Creates or extends an object property.
    pub fn declare_object_property(&self, declaration: &ObjectPropertyDeclaration) -> OntoResult<Handle> {
        let mut classes = self.classes_mut();
        let mut properties = self.object_properties_mut();
        let decl = ObjectPropertyDecl {
            mothers: create_all(&mut *properties, &declaration.mothers),
            disjoints: create_all(&mut *properties, &declaration.disjoints),
            inverses: create_all(&mut *properties, &declaration.inverses),
            domains: create_all(&mut *classes, &declaration.domains),
            ranges: create_all(&mut *classes, &declaration.ranges),
            chains: declaration
                .chains
                .iter()
                .map(|links| create_all(&mut *properties, links))
                .collect(),
            characteristics: declaration.characteristics,
        };
        let property = properties.declare(&declaration.name, &decl);
        apply_labels(&mut *properties, property, &declaration.labels);
        Ok(property)
    }

    /// Creates or extends a data property.
    pub fn declare_data_property(&self, declaration: &DataPropertyDeclaration) -> OntoResult<Handle> {
        let mut classes = self.classes_mut();
        let mut properties = self.data_properties_mut();
        let decl = DataPropertyDecl {
            mothers: create_all(&mut *properties, &declaration.mothers),
            disjoints: create_all(&mut *properties, &declaration.disjoints),
            domains: create_all(&mut *classes, &declaration.domains),
            ranges: declaration.ranges.clone(),
            characteristics: declaration.characteristics,
        };
        let property = properties.declare(&declaration.name, &decl);
        apply_labels(&mut *properties, property, &declaration.labels);
        Ok(property)
    }

    /// Creates or extends one individual.
    pub fn declare_individual(&self, declaration: &IndividualDeclaration) -> OntoResult<Handle> {
        let handles = self.declare_individuals(slice::from_ref(declaration))?;
        handles
            .first()
            .copied()
            .ok_or_else(|| OntoError::internal("individual declaration produced no handle"))
    }

    /// Creates or extends a batch of individuals. Memberships, same-as and
    /// distinct declarations of the whole batch are applied before any
    /// relation, so relation checks see the final class memberships.
    pub fn declare_individuals(&self, declarations: &[IndividualDeclaration]) -> OntoResult<Vec<Handle>> {
        let mut individuals = self.individuals_mut();
        let mut classes = self.classes_mut();
        let mut object_properties = self.object_properties_mut();
        let mut data_properties = self.data_properties_mut();

        let mut handles = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            let individual = individuals.find_or_create(&declaration.name);
            for name in &declaration.is_a {
                if individuals.find(name).is_some() && classes.find(name).is_none() {
                    return Err(GraphError::KindMismatch {
                        name: name.clone(),
                        expected: "a class",
                    }
                    .into());
                }
                let class = classes.find_or_create(name);
                individuals.add_is_a(individual, class, 1.0, false);
                classes.add_individual_child(class, individual);
            }
            for partner in create_all(&mut *individuals, &declaration.same_as) {
                if partner != individual {
                    individuals.merge_same_as(individual, partner)?;
                }
            }
            for other in create_all(&mut *individuals, &declaration.distinct) {
                individuals.add_distinct(individual, other);
            }
            apply_labels(&mut *individuals, individual, &declaration.labels);
            handles.push(individual);
        }

        for (declaration, individual) in declarations.iter().zip(&handles) {
            for relation in &declaration.relations {
                let property = object_properties.find_or_create(&relation.property);
                let target = individuals.find_or_create(&relation.target);
                let schema = Schema {
                    classes: &*classes,
                    object_properties: &*object_properties,
                    data_properties: &*data_properties,
                };
                individuals.add_relation(schema, *individual, property, target, relation.weight, false)?;
            }
            for relation in &declaration.data_relations {
                let literal = parse_literal(&relation.target)?;
                let property = data_properties.find_or_create(&relation.property);
                let schema = Schema {
                    classes: &*classes,
                    object_properties: &*object_properties,
                    data_properties: &*data_properties,
                };
                individuals.add_data_relation(schema, *individual, property, &literal, relation.weight, false)?;
            }
        }
        Ok(handles)
    }

    /// Materializes `expression` as the anonymous equivalent of `class`.
    /// Returns the `ano{N}` identifier.
    pub fn declare_anonymous(&self, class: &str, expression: &Expression) -> OntoResult<String> {
        let mut individuals = self.individuals_mut();
        let mut classes = self.classes_mut();
        let mut object_properties = self.object_properties_mut();
        let mut data_properties = self.data_properties_mut();
        let mut anonymous = self.anonymous_mut();
        let mut scope = AnonymousScope {
            classes: &mut classes,
            object_properties: &mut object_properties,
            data_properties: &mut data_properties,
            individuals: &mut individuals,
        };
        Ok(anonymous.add(&mut scope, class, expression)?)
    }

    /// Every class as a declaration, ordered by name.
    #[must_use]
    pub fn class_declarations(&self) -> Vec<ClassDeclaration> {
        let classes = self.classes();
        let object_properties = self.object_properties();
        let data_properties = self.data_properties();
        let registry = self.registry();
        let mut out: Vec<ClassDeclaration> = classes
            .iter()
            .map(|branch| ClassDeclaration {
                name: branch.meta().name.clone(),
                mothers: names(&*classes, branch.links().mothers.iter().map(|l| l.target)),
                disjoints: names(&*classes, branch.links().disjoints.iter().copied()),
                relations: branch
                    .object_relations
                    .iter()
                    .filter_map(|r| {
                        Some(RelationDeclaration {
                            property: object_properties.name(r.property)?.to_string(),
                            target: classes.name(r.target)?.to_string(),
                            weight: r.weight,
                        })
                    })
                    .collect(),
                data_relations: branch
                    .data_relations
                    .iter()
                    .filter_map(|r| {
                        Some(RelationDeclaration {
                            property: data_properties.name(r.property)?.to_string(),
                            target: registry.literal(r.target)?.to_string(),
                            weight: r.weight,
                        })
                    })
                    .collect(),
                labels: Label::from_dictionary(&branch.meta().dictionary),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Every object property as a declaration, ordered by name.
    #[must_use]
    pub fn object_property_declarations(&self) -> Vec<ObjectPropertyDeclaration> {
        let classes = self.classes();
        let properties = self.object_properties();
        let mut out: Vec<ObjectPropertyDeclaration> = properties
            .iter()
            .map(|branch| ObjectPropertyDeclaration {
                name: branch.meta().name.clone(),
                mothers: names(&*properties, branch.links().mothers.iter().map(|l| l.target)),
                disjoints: names(&*properties, branch.links().disjoints.iter().copied()),
                inverses: names(&*properties, branch.inverses.iter().copied()),
                domains: names(&*classes, branch.domains.iter().copied()),
                ranges: names(&*classes, branch.ranges.iter().copied()),
                chains: Vec::new(),
                characteristics: branch.characteristics,
                labels: Label::from_dictionary(&branch.meta().dictionary),
            })
            .collect();
        // chains are stored on their first link but declared on their result
        for branch in properties.iter() {
            for chain in &branch.chains {
                let Some(result) = properties.name(chain.result) else {
                    continue;
                };
                let links = names(&*properties, chain.links.iter().copied());
                if links.len() != chain.links.len() {
                    continue;
                }
                if let Some(declaration) = out.iter_mut().find(|d| d.name == result) {
                    declaration.chains.push(links);
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Every data property as a declaration, ordered by name.
    #[must_use]
    pub fn data_property_declarations(&self) -> Vec<DataPropertyDeclaration> {
        let classes = self.classes();
        let properties = self.data_properties();
        let mut out: Vec<DataPropertyDeclaration> = properties
            .iter()
            .map(|branch| DataPropertyDeclaration {
                name: branch.meta().name.clone(),
                mothers: names(&*properties, branch.links().mothers.iter().map(|l| l.target)),
                disjoints: names(&*properties, branch.links().disjoints.iter().copied()),
                domains: names(&*classes, branch.domains.iter().copied()),
                ranges: branch.ranges.clone(),
                characteristics: branch.characteristics,
                labels: Label::from_dictionary(&branch.meta().dictionary),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Every individual as a declaration, ordered by name. Only asserted
    /// relations and memberships are listed; derived ones are recomputed
    /// when the declarations are replayed.
    #[must_use]
    pub fn individual_declarations(&self) -> Vec<IndividualDeclaration> {
        let individuals = self.individuals();
        let classes = self.classes();
        let object_properties = self.object_properties();
        let data_properties = self.data_properties();
        let registry = self.registry();
        let mut out: Vec<IndividualDeclaration> = individuals
            .iter()
            .map(|branch| {
                let handle = branch.meta().handle;
                IndividualDeclaration {
                    name: branch.meta().name.clone(),
                    is_a: names(&*classes, branch.is_a.iter().filter(|l| !l.inferred).map(|l| l.target)),
                    same_as: names(&*individuals, branch.same_as.iter().copied().filter(|h| *h != handle)),
                    distinct: names(&*individuals, branch.distinct.iter().copied()),
                    relations: branch
                        .object_relations
                        .iter()
                        .filter(|r| !r.inferred)
                        .filter_map(|r| {
                            Some(RelationDeclaration {
                                property: object_properties.name(r.property)?.to_string(),
                                target: individuals.name(r.target)?.to_string(),
                                weight: r.weight,
                            })
                        })
                        .collect(),
                    data_relations: branch
                        .data_relations
                        .iter()
                        .filter(|r| !r.inferred)
                        .filter_map(|r| {
                            Some(RelationDeclaration {
                                property: data_properties.name(r.property)?.to_string(),
                                target: registry.literal(r.target)?.to_string(),
                                weight: r.weight,
                            })
                        })
                        .collect(),
                    labels: Label::from_dictionary(&branch.meta().dictionary),
                }
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// `(class, expression)` of every anonymous class.
    #[must_use]
    pub fn anonymous_declarations(&self) -> Vec<(String, Expression)> {
        let classes = self.classes();
        let anonymous = self.anonymous();
        anonymous
            .iter()
            .filter_map(|b| Some((classes.name(b.equivalent_to)?.to_string(), b.expression.clone())))
            .collect()
    }
}

fn names<B: Branch>(graph: &EntityGraph<B>, handles: impl Iterator<Item = Handle>) -> Vec<String> {
    let mut seen = HashSet::new();
    handles
        .filter(|h| seen.insert(*h))
        .filter_map(|h| graph.name(h).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Depth;

    #[test]
    fn declarations_round_trip_by_name() {
        let ontology = Ontology::default();
        ontology
            .declare_class(&ClassDeclaration {
                name: "Dog".to_string(),
                mothers: vec!["Animal".to_string()],
                labels: vec![Label::spoken("en", "dog")],
                ..ClassDeclaration::default()
            })
            .unwrap();
        ontology
            .declare_object_property(&ObjectPropertyDeclaration {
                name: "hasUncle".to_string(),
                chains: vec![vec!["hasParent".to_string(), "hasBrother".to_string()]],
                ..ObjectPropertyDeclaration::default()
            })
            .unwrap();

        let classes = ontology.class_declarations();
        let dog = classes.iter().find(|c| c.name == "Dog").unwrap();
        assert_eq!(dog.mothers, vec!["Animal".to_string()]);
        assert_eq!(dog.labels, vec![Label::spoken("en", "dog")]);

        let properties = ontology.object_property_declarations();
        let uncle = properties.iter().find(|p| p.name == "hasUncle").unwrap();
        assert_eq!(uncle.chains, vec![vec!["hasParent".to_string(), "hasBrother".to_string()]]);
    }

    #[test]
    fn individual_batches_apply_memberships_first() {
        let ontology = Ontology::default();
        ontology
            .declare_object_property(&ObjectPropertyDeclaration {
                name: "eats".to_string(),
                ranges: vec!["Food".to_string()],
                ..ObjectPropertyDeclaration::default()
            })
            .unwrap();
        ontology
            .declare_individuals(&[
                IndividualDeclaration {
                    name: "fido".to_string(),
                    relations: vec![RelationDeclaration::new("eats", "bone")],
                    ..IndividualDeclaration::default()
                },
                IndividualDeclaration {
                    name: "bone".to_string(),
                    is_a: vec!["Food".to_string()],
                    ..IndividualDeclaration::default()
                },
            ])
            .unwrap();

        let individuals = ontology.individuals();
        let fido = individuals.branch("fido").unwrap();
        assert!(fido.meta().flag("range").is_empty());
        assert_eq!(fido.object_relations.len(), 1);
        let classes = ontology.classes();
        let food = classes.find("Food").unwrap();
        assert!(classes.up(food, Depth::Unbounded).is_empty());
    }
}
