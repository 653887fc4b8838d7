//! Name-keyed query adapters over the handle-keyed graphs.
//!
//! Every query takes shared locks only, in lock order, and answers with
//! identifiers (literals in `type#value` form). Unknown names give empty
//! results, never errors.

use std::collections::HashSet;

use crate::graph::{
    Branch, ClassGraph, DataPropertyGraph, Depth, EntityGraph, Hierarchy, IndividualGraph, ObjectPropertyGraph,
    PropertyView, Schema,
};
use crate::handle::{Handle, HandleRegistry, Literal};

use super::Ontology;

fn render(registry: &HandleRegistry, handles: &HashSet<Handle>) -> HashSet<String> {
    handles.iter().map(|h| registry.display(*h)).collect()
}

/// Handle of an individual name or an interned `type#value` literal.
fn target(registry: &HandleRegistry, individuals: &IndividualGraph, name: &str) -> Option<Handle> {
    match Literal::parse(name) {
        Some(literal) => registry.lookup_literal(&literal),
        None => individuals.find(name),
    }
}

fn property(
    object_properties: &ObjectPropertyGraph,
    data_properties: &DataPropertyGraph,
    name: &str,
) -> Option<Handle> {
    object_properties.find(name).or_else(|| data_properties.find(name))
}

/// The property and every sub-property, looked up in whichever graph holds it.
fn property_down(
    object_properties: &ObjectPropertyGraph,
    data_properties: &DataPropertyGraph,
    name: &str,
) -> HashSet<Handle> {
    match property(object_properties, data_properties, name) {
        None => HashSet::new(),
        Some(p) if object_properties.contains(p) => object_properties.property_down_inclusive(p),
        Some(p) => data_properties.property_down_inclusive(p),
    }
}

fn find_by_label<B: Branch>(graph: &EntityGraph<B>, text: &str, lang: &str) -> HashSet<String> {
    graph.names(&graph.find_by_label(text, lang))
}

fn find_fuzzy<B: Branch>(graph: &EntityGraph<B>, text: &str, lang: &str, threshold: f64) -> HashSet<String> {
    graph.names(&graph.find_fuzzy(text, lang, threshold))
}

fn preferred_name<B: Branch>(graph: &EntityGraph<B>, name: &str, lang: &str) -> Option<String> {
    graph.find(name).and_then(|h| graph.get_name(h, lang))
}

fn up_names<B: Hierarchy>(graph: &EntityGraph<B>, name: &str, depth: Depth) -> HashSet<String> {
    graph.find(name).map_or_else(HashSet::new, |h| graph.names(&graph.up(h, depth)))
}

fn down_names<B: Hierarchy>(graph: &EntityGraph<B>, name: &str, depth: Depth) -> HashSet<String> {
    graph.find(name).map_or_else(HashSet::new, |h| graph.names(&graph.down(h, depth)))
}

fn disjoint_names<B: Hierarchy>(graph: &EntityGraph<B>, name: &str) -> HashSet<String> {
    graph.find(name).map_or_else(HashSet::new, |h| graph.names(&graph.disjoint(h)))
}

/// Queries on individuals.
#[derive(Debug, Clone, Copy)]
pub struct IndividualClient<'a> {
    ontology: &'a Ontology,
}

impl<'a> IndividualClient<'a> {
    pub(super) const fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    fn with_schema<R>(&self, query: impl FnOnce(&IndividualGraph, Schema<'_>, &HandleRegistry) -> R) -> R {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let schema = Schema {
            classes: &*classes,
            object_properties: &*object_properties,
            data_properties: &*data_properties,
        };
        query(&*individuals, schema, self.ontology.registry().as_ref())
    }

    /// True if the individual exists.
    #[must_use]
    pub fn touch(&self, name: &str) -> bool {
        self.ontology.individuals().touch(name)
    }

    /// Every individual.
    #[must_use]
    pub fn list(&self) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        individuals.iter().map(|b| b.meta().name.clone()).collect()
    }

    /// Classes of the individual within `depth`.
    #[must_use]
    pub fn get_up(&self, name: &str, depth: Depth) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        individuals
            .find(name)
            .map_or_else(HashSet::new, |i| classes.names(&individuals.get_up(&*classes, i, depth)))
    }

    /// True if the individual belongs to `class`.
    #[must_use]
    pub fn is_a(&self, name: &str, class: &str) -> bool {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        match (individuals.find(name), classes.find(class)) {
            (Some(i), Some(c)) => individuals.is_a(&*classes, i, c),
            _ => false,
        }
    }

    /// Keeps the members of `names` belonging to `class`.
    #[must_use]
    pub fn select(&self, names: &HashSet<String>, class: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let Some(selector) = classes.find(class) else {
            return HashSet::new();
        };
        let set: HashSet<Handle> = names.iter().filter_map(|n| individuals.find(n)).collect();
        individuals.names(&individuals.select(&*classes, &set, selector))
    }

    /// Same-as class of the individual, itself included.
    #[must_use]
    pub fn get_same(&self, name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        individuals
            .find(name)
            .map_or_else(HashSet::new, |i| individuals.names(&individuals.get_same(i)))
    }

    /// Representative of the same-as class: the member with the smallest handle.
    #[must_use]
    pub fn get_lowest_same(&self, name: &str) -> Option<String> {
        let individuals = self.ontology.individuals();
        let lowest = individuals.get_lowest_same(individuals.find(name)?)?;
        individuals.name(lowest).map(str::to_string)
    }

    /// Individuals declared distinct from this one.
    #[must_use]
    pub fn get_distincts(&self, name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        individuals
            .find(name)
            .map_or_else(HashSet::new, |i| individuals.names(&individuals.get_distincts(i)))
    }

    /// Properties used by the individual, its same-as members and classes.
    #[must_use]
    pub fn get_relation_from(&self, name: &str, depth: Depth) -> HashSet<String> {
        self.with_schema(|individuals, schema, registry| {
            individuals.find(name).map_or_else(HashSet::new, |i| {
                render(registry, &individuals.get_relation_from(schema, i, depth))
            })
        })
    }

    /// Individuals using `property` or a sub-property.
    #[must_use]
    pub fn get_related_from(&self, property: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let properties = property_down(&*self.ontology.object_properties(), &*self.ontology.data_properties(), property);
        let declaring = classes.get_related_from(&properties);
        individuals.names(&individuals.get_related_from(&properties, &declaring))
    }

    /// Properties through which some individual reaches `target`.
    #[must_use]
    pub fn get_relation_on(&self, target_name: &str, depth: Depth) -> HashSet<String> {
        self.with_schema(|individuals, schema, registry| {
            target(registry, individuals, target_name).map_or_else(HashSet::new, |t| {
                render(registry, &individuals.get_relation_on(schema, t, depth))
            })
        })
    }

    /// Targets of every relation using `property` or a sub-property.
    #[must_use]
    pub fn get_related_on(&self, property: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let properties = property_down(&*self.ontology.object_properties(), &*self.ontology.data_properties(), property);
        render(self.ontology.registry(), &individuals.get_related_on(&properties))
    }

    /// Everything the individual relates to.
    #[must_use]
    pub fn get_relation_with(&self, name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        individuals.find(name).map_or_else(HashSet::new, |i| {
            render(self.ontology.registry(), &individuals.get_relation_with(&*classes, i))
        })
    }

    /// Individuals relating to `target`.
    #[must_use]
    pub fn get_related_with(&self, target_name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let registry = self.ontology.registry();
        target(registry, &individuals, target_name).map_or_else(HashSet::new, |t| {
            individuals.names(&individuals.get_related_with(&*classes, t))
        })
    }

    /// Targets of the individual through `property`, optionally restricted
    /// to members of `selector`.
    #[must_use]
    pub fn get_on(&self, name: &str, property_name: &str, selector: Option<&str>, single_same: bool) -> HashSet<String> {
        self.with_schema(|individuals, schema, registry| {
            let (Some(i), Some(p)) = (individuals.find(name), schema_property(schema, registry, property_name)) else {
                return HashSet::new();
            };
            let mut found = individuals.get_on(schema, i, p, single_same);
            if let Some(selector) = selector {
                found = select_any(individuals, schema, registry, &found, selector);
            }
            render(registry, &found)
        })
    }

    /// Individuals reaching `target` through `property`, optionally
    /// restricted to members of `selector`.
    #[must_use]
    pub fn get_from(
        &self,
        target_name: &str,
        property_name: &str,
        selector: Option<&str>,
        single_same: bool,
    ) -> HashSet<String> {
        self.with_schema(|individuals, schema, registry| {
            let (Some(t), Some(p)) = (
                target(registry, individuals, target_name),
                schema_property(schema, registry, property_name),
            ) else {
                return HashSet::new();
            };
            let mut found = individuals.get_from(schema, t, p, single_same);
            if let Some(selector) = selector {
                found = select_any(individuals, schema, registry, &found, selector);
            }
            individuals.names(&found)
        })
    }

    /// Properties linking the individual to `target`.
    #[must_use]
    pub fn get_with(&self, name: &str, target_name: &str, depth: Depth) -> HashSet<String> {
        self.with_schema(|individuals, schema, registry| {
            match (individuals.find(name), target(registry, individuals, target_name)) {
                (Some(i), Some(t)) => render(registry, &individuals.get_with(schema, i, t, depth)),
                _ => HashSet::new(),
            }
        })
    }

    /// Properties whose domain holds one of the individual's classes.
    #[must_use]
    pub fn get_domain_of(&self, name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let Some(i) = individuals.find(name) else {
            return HashSet::new();
        };
        let closure = individuals.class_closure(&*classes, i);
        let mut names = object_properties.names(&object_properties.with_domain_in(&closure));
        names.extend(data_properties.names(&data_properties.with_domain_in(&closure)));
        names
    }

    /// Object properties whose range holds one of the individual's classes.
    #[must_use]
    pub fn get_range_of(&self, name: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        individuals.find(name).map_or_else(HashSet::new, |i| {
            let closure = individuals.class_closure(&*classes, i);
            object_properties.names(&object_properties.with_range_in(&closure))
        })
    }

    /// Individuals of `class` or of any subclass.
    #[must_use]
    pub fn get_type(&self, class: &str) -> HashSet<String> {
        let individuals = self.ontology.individuals();
        let classes = self.ontology.classes();
        classes
            .find(class)
            .map_or_else(HashSet::new, |c| individuals.names(&classes.get_individuals(c)))
    }

    /// True if `subject property object` holds, through sub-properties and
    /// same-as members. `object` may be a `type#value` literal.
    #[must_use]
    pub fn relation_exists(&self, subject: &str, property_name: &str, object: &str) -> bool {
        let individuals = self.ontology.individuals();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let registry = self.ontology.registry();
        let (Some(s), Some(o)) = (individuals.find(subject), target(registry, &individuals, object)) else {
            return false;
        };
        if let Some(p) = object_properties.find(property_name) {
            individuals.relation_exists(&*object_properties, s, p, o)
        } else if let Some(p) = data_properties.find(property_name) {
            individuals.relation_exists(&*data_properties, s, p, o)
        } else {
            false
        }
    }

    /// Individuals whose identifier or label equals `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> HashSet<String> {
        find_by_label(&*self.ontology.individuals(), text, &*self.ontology.language())
    }

    /// Closest individuals by edit distance.
    #[must_use]
    pub fn find_fuzzy(&self, text: &str) -> HashSet<String> {
        let threshold = self.ontology.config().fuzzy_threshold;
        find_fuzzy(&*self.ontology.individuals(), text, &*self.ontology.language(), threshold)
    }

    /// Preferred label in the current language.
    #[must_use]
    pub fn get_name(&self, name: &str) -> Option<String> {
        preferred_name(&*self.ontology.individuals(), name, &*self.ontology.language())
    }

    /// Spoken labels in the current language.
    #[must_use]
    pub fn get_names(&self, name: &str) -> Vec<String> {
        let individuals = self.ontology.individuals();
        let lang = self.ontology.language();
        individuals.find(name).map_or_else(Vec::new, |i| individuals.get_names(i, &lang))
    }

    /// Spoken and muted labels in the current language.
    #[must_use]
    pub fn get_every_names(&self, name: &str) -> Vec<String> {
        let individuals = self.ontology.individuals();
        let lang = self.ontology.language();
        individuals
            .find(name)
            .map_or_else(Vec::new, |i| individuals.get_every_names(i, &lang))
    }
}

fn schema_property(schema: Schema<'_>, registry: &HandleRegistry, name: &str) -> Option<Handle> {
    let handle = registry.lookup(name)?;
    (schema.object_properties.is_property(handle) || schema.data_properties.is_property(handle)).then_some(handle)
}

/// Keeps individuals that belong to `selector`; literals never do.
fn select_any(
    individuals: &IndividualGraph,
    schema: Schema<'_>,
    registry: &HandleRegistry,
    set: &HashSet<Handle>,
    selector: &str,
) -> HashSet<Handle> {
    let Some(class) = registry.lookup(selector) else {
        return HashSet::new();
    };
    individuals.select(schema.classes, set, class)
}

/// Queries on classes.
#[derive(Debug, Clone, Copy)]
pub struct ClassClient<'a> {
    ontology: &'a Ontology,
}

impl<'a> ClassClient<'a> {
    pub(super) const fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    fn property_down(&self, name: &str) -> HashSet<Handle> {
        property_down(&*self.ontology.object_properties(), &*self.ontology.data_properties(), name)
    }

    /// True if the class exists.
    #[must_use]
    pub fn touch(&self, name: &str) -> bool {
        self.ontology.classes().touch(name)
    }

    /// Every class.
    #[must_use]
    pub fn list(&self) -> HashSet<String> {
        let classes = self.ontology.classes();
        classes.iter().map(|b| b.meta().name.clone()).collect()
    }

    /// Ancestors within `depth`.
    #[must_use]
    pub fn get_up(&self, name: &str, depth: Depth) -> HashSet<String> {
        up_names(&*self.ontology.classes(), name, depth)
    }

    /// Descendants within `depth`.
    #[must_use]
    pub fn get_down(&self, name: &str, depth: Depth) -> HashSet<String> {
        down_names(&*self.ontology.classes(), name, depth)
    }

    /// Disjoint classes, descendants included.
    #[must_use]
    pub fn get_disjoint(&self, name: &str) -> HashSet<String> {
        disjoint_names(&*self.ontology.classes(), name)
    }

    /// Keeps the members of `names` that are `class` or a subclass of it.
    #[must_use]
    pub fn select(&self, names: &HashSet<String>, class: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        let Some(selector) = classes.find(class) else {
            return HashSet::new();
        };
        let set: HashSet<Handle> = names.iter().filter_map(|n| classes.find(n)).collect();
        classes.names(&classes.select(&set, selector))
    }

    /// Individuals of the class or of a subclass.
    #[must_use]
    pub fn get_individuals(&self, name: &str) -> HashSet<String> {
        self.ontology.individual().get_type(name)
    }

    /// Properties used at class level by the class or its ancestors.
    #[must_use]
    pub fn get_relation_from(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        classes.find(name).map_or_else(HashSet::new, |c| {
            render(
                self.ontology.registry(),
                &classes.get_relation_from(c, depth, &*object_properties, &*data_properties),
            )
        })
    }

    /// Classes declaring a relation with `property` or a sub-property.
    #[must_use]
    pub fn get_related_from(&self, property: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.property_down(property);
        classes.names(&classes.get_related_from(&properties))
    }

    /// Properties of class-level relations targeting `target`.
    #[must_use]
    pub fn get_relation_on(&self, target_name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let registry = self.ontology.registry();
        match Literal::parse(target_name) {
            Some(literal) => registry.lookup_literal(&literal).map_or_else(HashSet::new, |t| {
                render(registry, &classes.get_relation_on(t, depth, &*data_properties))
            }),
            None => classes.find(target_name).map_or_else(HashSet::new, |t| {
                render(registry, &classes.get_relation_on(t, depth, &*object_properties))
            }),
        }
    }

    /// Targets of class-level relations using `property`.
    #[must_use]
    pub fn get_related_on(&self, property: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.property_down(property);
        render(self.ontology.registry(), &classes.get_related_on(&properties))
    }

    /// Targets of the class-level relations of the class and its ancestors.
    #[must_use]
    pub fn get_relation_with(&self, name: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        classes.find(name).map_or_else(HashSet::new, |c| {
            render(self.ontology.registry(), &classes.get_relation_with(c))
        })
    }

    /// Classes with a class-level relation targeting `target`.
    #[must_use]
    pub fn get_related_with(&self, target_name: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        self.class_target(&classes, target_name)
            .map_or_else(HashSet::new, |t| classes.names(&classes.get_related_with(t)))
    }

    /// Targets reached from the class through `property`.
    #[must_use]
    pub fn get_on(&self, name: &str, property: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.property_down(property);
        classes.find(name).map_or_else(HashSet::new, |c| {
            render(self.ontology.registry(), &classes.get_on(c, &properties))
        })
    }

    /// Classes reaching `target` through `property`.
    #[must_use]
    pub fn get_from(&self, target_name: &str, property: &str) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.property_down(property);
        self.class_target(&classes, target_name)
            .map_or_else(HashSet::new, |t| classes.names(&classes.get_from(t, &properties)))
    }

    /// Properties linking the class (or an ancestor) to `target`.
    #[must_use]
    pub fn get_with(&self, name: &str, target_name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let properties: &dyn PropertyView = if Literal::parse(target_name).is_some() {
            &*data_properties
        } else {
            &*object_properties
        };
        match (classes.find(name), self.class_target(&classes, target_name)) {
            (Some(c), Some(t)) => render(self.ontology.registry(), &classes.get_with(c, t, depth, properties)),
            _ => HashSet::new(),
        }
    }

    /// Properties whose domain holds the class or one of its ancestors
    /// within `depth`.
    #[must_use]
    pub fn get_domain_of(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        let data_properties = self.ontology.data_properties();
        let Some(c) = classes.find(name) else {
            return HashSet::new();
        };
        let mut set = classes.up(c, depth);
        set.insert(c);
        let mut names = object_properties.names(&object_properties.with_domain_in(&set));
        names.extend(data_properties.names(&data_properties.with_domain_in(&set)));
        names
    }

    /// Object properties whose range holds the class or one of its
    /// ancestors within `depth`.
    #[must_use]
    pub fn get_range_of(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let object_properties = self.ontology.object_properties();
        classes.find(name).map_or_else(HashSet::new, |c| {
            let mut set = classes.up(c, depth);
            set.insert(c);
            object_properties.names(&object_properties.with_range_in(&set))
        })
    }

    fn class_target(&self, classes: &ClassGraph, name: &str) -> Option<Handle> {
        match Literal::parse(name) {
            Some(literal) => self.ontology.registry().lookup_literal(&literal),
            None => classes.find(name),
        }
    }

    /// Classes whose identifier or label equals `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> HashSet<String> {
        find_by_label(&*self.ontology.classes(), text, &*self.ontology.language())
    }

    /// Closest classes by edit distance.
    #[must_use]
    pub fn find_fuzzy(&self, text: &str) -> HashSet<String> {
        let threshold = self.ontology.config().fuzzy_threshold;
        find_fuzzy(&*self.ontology.classes(), text, &*self.ontology.language(), threshold)
    }

    /// Preferred label in the current language.
    #[must_use]
    pub fn get_name(&self, name: &str) -> Option<String> {
        preferred_name(&*self.ontology.classes(), name, &*self.ontology.language())
    }

    /// Spoken labels in the current language.
    #[must_use]
    pub fn get_names(&self, name: &str) -> Vec<String> {
        let classes = self.ontology.classes();
        let lang = self.ontology.language();
        classes.find(name).map_or_else(Vec::new, |c| classes.get_names(c, &lang))
    }

    /// Spoken and muted labels in the current language.
    #[must_use]
    pub fn get_every_names(&self, name: &str) -> Vec<String> {
        let classes = self.ontology.classes();
        let lang = self.ontology.language();
        classes.find(name).map_or_else(Vec::new, |c| classes.get_every_names(c, &lang))
    }
}

/// Queries on object properties.
#[derive(Debug, Clone, Copy)]
pub struct ObjectPropertyClient<'a> {
    ontology: &'a Ontology,
}

impl<'a> ObjectPropertyClient<'a> {
    pub(super) const fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    /// True if the property exists.
    #[must_use]
    pub fn touch(&self, name: &str) -> bool {
        self.ontology.object_properties().touch(name)
    }

    /// Super-properties within `depth`.
    #[must_use]
    pub fn get_up(&self, name: &str, depth: Depth) -> HashSet<String> {
        up_names(&*self.ontology.object_properties(), name, depth)
    }

    /// Sub-properties within `depth`.
    #[must_use]
    pub fn get_down(&self, name: &str, depth: Depth) -> HashSet<String> {
        down_names(&*self.ontology.object_properties(), name, depth)
    }

    /// Disjoint properties.
    #[must_use]
    pub fn get_disjoint(&self, name: &str) -> HashSet<String> {
        disjoint_names(&*self.ontology.object_properties(), name)
    }

    /// Domain classes, inherited within `depth`.
    #[must_use]
    pub fn get_domain(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.ontology.object_properties();
        properties
            .find(name)
            .map_or_else(HashSet::new, |p| classes.names(&properties.get_domain(p, depth)))
    }

    /// Range classes, inherited within `depth`.
    #[must_use]
    pub fn get_range(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.ontology.object_properties();
        properties
            .find(name)
            .map_or_else(HashSet::new, |p| classes.names(&properties.get_range(p, depth)))
    }

    /// Declared inverses.
    #[must_use]
    pub fn get_inverse(&self, name: &str) -> HashSet<String> {
        let properties = self.ontology.object_properties();
        properties
            .find(name)
            .map_or_else(HashSet::new, |p| properties.names(&properties.get_inverse(p)))
    }

    /// Properties whose identifier or label equals `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> HashSet<String> {
        find_by_label(&*self.ontology.object_properties(), text, &*self.ontology.language())
    }

    /// Closest properties by edit distance.
    #[must_use]
    pub fn find_fuzzy(&self, text: &str) -> HashSet<String> {
        let threshold = self.ontology.config().fuzzy_threshold;
        find_fuzzy(&*self.ontology.object_properties(), text, &*self.ontology.language(), threshold)
    }

    /// Preferred label in the current language.
    #[must_use]
    pub fn get_name(&self, name: &str) -> Option<String> {
        preferred_name(&*self.ontology.object_properties(), name, &*self.ontology.language())
    }
}

/// Queries on data properties.
#[derive(Debug, Clone, Copy)]
pub struct DataPropertyClient<'a> {
    ontology: &'a Ontology,
}

impl<'a> DataPropertyClient<'a> {
    pub(super) const fn new(ontology: &'a Ontology) -> Self {
        Self { ontology }
    }

    /// True if the property exists.
    #[must_use]
    pub fn touch(&self, name: &str) -> bool {
        self.ontology.data_properties().touch(name)
    }

    /// Super-properties within `depth`.
    #[must_use]
    pub fn get_up(&self, name: &str, depth: Depth) -> HashSet<String> {
        up_names(&*self.ontology.data_properties(), name, depth)
    }

    /// Sub-properties within `depth`.
    #[must_use]
    pub fn get_down(&self, name: &str, depth: Depth) -> HashSet<String> {
        down_names(&*self.ontology.data_properties(), name, depth)
    }

    /// Disjoint properties.
    #[must_use]
    pub fn get_disjoint(&self, name: &str) -> HashSet<String> {
        disjoint_names(&*self.ontology.data_properties(), name)
    }

    /// Domain classes, inherited within `depth`.
    #[must_use]
    pub fn get_domain(&self, name: &str, depth: Depth) -> HashSet<String> {
        let classes = self.ontology.classes();
        let properties = self.ontology.data_properties();
        properties
            .find(name)
            .map_or_else(HashSet::new, |p| classes.names(&properties.get_domain(p, depth)))
    }

    /// Accepted literal types, inherited within `depth`.
    #[must_use]
    pub fn get_range(&self, name: &str, depth: Depth) -> HashSet<String> {
        let properties = self.ontology.data_properties();
        properties
            .find(name)
            .map_or_else(HashSet::new, |p| properties.get_range(p, depth))
    }

    /// Properties whose identifier or label equals `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> HashSet<String> {
        find_by_label(&*self.ontology.data_properties(), text, &*self.ontology.language())
    }

    /// Closest properties by edit distance.
    #[must_use]
    pub fn find_fuzzy(&self, text: &str) -> HashSet<String> {
        let threshold = self.ontology.config().fuzzy_threshold;
        find_fuzzy(&*self.ontology.data_properties(), text, &*self.ontology.language(), threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family() -> Ontology {
        let ontology = Ontology::default();
        ontology.add_inheritance("Person", "Agent").unwrap();
        ontology.add_inheritance("alice", "Person").unwrap();
        ontology.add_relation("alice", "hasChild", "bob", 1.0).unwrap();
        ontology.add_relation("alice", "hasAge", "integer#41", 1.0).unwrap();
        ontology.add_same_as("bob", "robert").unwrap();
        ontology
    }

    #[test]
    fn individual_queries_answer_by_name() {
        let ontology = family();
        let client = ontology.individual();
        assert_eq!(client.get_up("alice", Depth::DIRECT), HashSet::from(["Person".to_string()]));
        assert_eq!(
            client.get_on("alice", "hasChild", None, false),
            HashSet::from(["bob".to_string(), "robert".to_string()])
        );
        assert_eq!(client.get_on("alice", "hasAge", None, false), HashSet::from(["integer#41".to_string()]));
        assert!(client.relation_exists("alice", "hasChild", "robert"));
        assert!(client.relation_exists("alice", "hasAge", "integer#41"));
        assert_eq!(client.get_from("robert", "hasChild", Some("Agent"), false), HashSet::from(["alice".to_string()]));
        assert_eq!(client.get_lowest_same("robert").as_deref(), Some("bob"));
        assert!(client.get_up("nobody", Depth::Unbounded).is_empty());
    }

    #[test]
    fn class_queries_answer_by_name() {
        let ontology = family();
        let client = ontology.class();
        assert_eq!(client.get_down("Agent", Depth::Unbounded), HashSet::from(["Person".to_string()]));
        assert_eq!(client.get_individuals("Agent"), HashSet::from(["alice".to_string()]));
        ontology.add_label("Person", "en", "person").unwrap();
        assert_eq!(client.find("person"), HashSet::from(["Person".to_string()]));
        assert_eq!(client.find_fuzzy("persn"), HashSet::from(["Person".to_string()]));
        assert_eq!(client.get_name("Person").as_deref(), Some("person"));
    }
}
