//! Consistency checks and inference cascades, exercised through the
//! name-keyed ontology surface.

use std::collections::HashSet;

use ontokb::graph::{Branch, Characteristics};
use ontokb::{
    ClassDeclaration, Depth, Explanation, IndividualDeclaration, ObjectPropertyDeclaration, Ontology, OntologyConfig,
};

fn names(items: &[&str]) -> HashSet<String> {
    items.iter().map(ToString::to_string).collect()
}

fn class(name: &str, mothers: &[&str], disjoints: &[&str]) -> ClassDeclaration {
    ClassDeclaration {
        name: name.to_string(),
        mothers: mothers.iter().map(ToString::to_string).collect(),
        disjoints: disjoints.iter().map(ToString::to_string).collect(),
        ..ClassDeclaration::default()
    }
}

fn individual(name: &str, classes: &[&str]) -> IndividualDeclaration {
    IndividualDeclaration {
        name: name.to_string(),
        is_a: classes.iter().map(ToString::to_string).collect(),
        ..IndividualDeclaration::default()
    }
}

fn property(name: &str, characteristics: Characteristics) -> ObjectPropertyDeclaration {
    ObjectPropertyDeclaration {
        name: name.to_string(),
        characteristics,
        ..ObjectPropertyDeclaration::default()
    }
}

fn ontology() -> Ontology {
    Ontology::new(OntologyConfig::default())
}

#[test]
fn asserting_twice_keeps_one_entry() {
    let onto = ontology();
    let first = onto.add_relation("alice", "knows", "bob", 0.4).unwrap();
    let second = onto.add_relation("alice", "knows", "bob", 0.9).unwrap();
    assert!(first.created);
    assert!(!second.created);

    let individuals = onto.individuals();
    let alice = individuals.branch("alice").unwrap();
    assert_eq!(alice.object_relations.len(), 1);
    assert!((alice.object_relations[0].weight - 0.9).abs() < f64::EPSILON);
}

#[test]
fn same_as_closure_is_shared_by_every_member() {
    let onto = ontology();
    onto.declare_individual(&individual("a", &[])).unwrap();
    onto.add_same_as("a", "b").unwrap();
    onto.add_same_as("b", "c").unwrap();

    for member in ["a", "b", "c"] {
        assert_eq!(onto.individual().get_same(member), names(&["a", "b", "c"]), "same-as of {member}");
    }
}

#[test]
fn same_as_needs_one_known_individual() {
    let onto = ontology();
    assert!(onto.add_same_as("ghost", "phantom").is_err());
    assert!(!onto.individual().touch("ghost"));
}

#[test]
fn same_as_partners_share_classes_and_relations() {
    let onto = ontology();
    onto.declare_class(&class("Robot", &[], &[])).unwrap();
    onto.declare_individuals(&[individual("pepper", &["Robot"]), individual("robot_1", &[])])
        .unwrap();
    onto.add_relation("robot_1", "isIn", "kitchen", 1.0).unwrap();
    onto.add_same_as("pepper", "robot_1").unwrap();

    assert!(onto.individual().is_a("robot_1", "Robot"));
    assert_eq!(onto.individual().get_on("pepper", "isIn", None, false), names(&["kitchen"]));

    onto.remove_same_as("pepper", "robot_1").unwrap();
    assert_eq!(onto.individual().get_same("pepper"), names(&["pepper"]));
    assert!(!onto.individual().is_a("robot_1", "Robot"));
}

#[test]
fn range_violation_leaves_subject_untouched() {
    let onto = ontology();
    onto.declare_class(&class("Animal", &[], &[])).unwrap();
    onto.declare_class(&class("Food", &[], &[])).unwrap();
    onto.declare_class(&class("Rock", &[], &["Food"])).unwrap();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "eats".to_string(),
        ranges: vec!["Food".to_string()],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();
    onto.declare_individuals(&[individual("fido", &["Animal"]), individual("pebble", &["Rock"])])
        .unwrap();

    let err = onto.add_relation("fido", "eats", "pebble", 1.0).unwrap_err();
    assert_eq!(err.inconsistency().map(|i| i.kind()), Some("range"));
    assert!(onto.individual().get_relation_from("fido", Depth::Unbounded).is_empty());
    assert!(!onto.individual().relation_exists("fido", "eats", "pebble"));
}

#[test]
fn unconfirmed_domain_is_flagged_not_rejected() {
    let onto = ontology();
    onto.declare_class(&class("Person", &[], &[])).unwrap();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "owns".to_string(),
        domains: vec!["Person".to_string()],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();

    let assertion = onto.add_relation("x", "owns", "y", 1.0).unwrap();
    assert!(!assertion.status.is_satisfied());
    let individuals = onto.individuals();
    assert_eq!(individuals.branch("x").unwrap().meta().flag("domain"), ["owns".to_string()]);
}

#[test]
fn irreflexive_property_refuses_self_links() {
    let onto = ontology();
    onto.declare_object_property(&property(
        "marriedTo",
        Characteristics {
            irreflexive: true,
            ..Characteristics::default()
        },
    ))
    .unwrap();

    let err = onto.add_relation("alice", "marriedTo", "alice", 1.0).unwrap_err();
    assert_eq!(err.inconsistency().map(|i| i.kind()), Some("irreflexive"));
    assert!(!onto.individual().touch("alice"));
}

#[test]
fn irreflexive_property_sees_through_same_as() {
    let onto = ontology();
    onto.declare_object_property(&property(
        "marriedTo",
        Characteristics {
            irreflexive: true,
            ..Characteristics::default()
        },
    ))
    .unwrap();
    onto.declare_individual(&individual("alice", &[])).unwrap();
    onto.add_same_as("alice", "ally").unwrap();

    assert!(onto.add_relation("alice", "marriedTo", "ally", 1.0).is_err());
}

#[test]
fn asymmetric_property_refuses_the_reverse() {
    let onto = ontology();
    onto.declare_object_property(&property(
        "parentOf",
        Characteristics {
            asymmetric: true,
            ..Characteristics::default()
        },
    ))
    .unwrap();

    onto.add_relation("alice", "parentOf", "bob", 1.0).unwrap();
    let err = onto.add_relation("bob", "parentOf", "alice", 1.0).unwrap_err();
    assert_eq!(err.inconsistency().map(|i| i.kind()), Some("asymmetric"));
    assert!(onto.individual().relation_exists("alice", "parentOf", "bob"));
    assert!(!onto.individual().relation_exists("bob", "parentOf", "alice"));
}

#[test]
fn retraction_cascades_through_inverses() {
    let onto = ontology();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "partOf".to_string(),
        inverses: vec!["hasPart".to_string()],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();

    let assertion = onto.add_relation("wheel", "partOf", "car", 1.0).unwrap();
    assert_eq!(
        assertion.explanations,
        vec![Explanation {
            fact: "[ADD]car|hasPart|wheel".to_string(),
            cause: "[ADD]wheel|partOf|car".to_string(),
        }]
    );
    assert!(onto.individual().relation_exists("car", "hasPart", "wheel"));

    let retraction = onto.remove_relation("wheel", "partOf", Some("car"), false).unwrap();
    assert_eq!(retraction.removed.len(), 2);
    assert!(retraction.explanations.contains(&Explanation {
        fact: "[DEL]car|hasPart|wheel".to_string(),
        cause: "[DEL]wheel|partOf|car".to_string(),
    }));
    assert!(!onto.individual().relation_exists("car", "hasPart", "wheel"));
    assert!(!onto.individual().relation_exists("wheel", "partOf", "car"));
}

#[test]
fn retraction_protects_direct_assertions_unless_forced() {
    let onto = ontology();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "hasPart".to_string(),
        chains: vec![vec!["hasPart".to_string(), "hasPart".to_string()]],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();
    onto.add_relation("car", "hasPart", "engine", 1.0).unwrap();
    onto.add_relation("engine", "hasPart", "piston", 1.0).unwrap();
    onto.add_relation("car", "hasPart", "piston", 1.0).unwrap();

    onto.remove_relation("engine", "hasPart", Some("piston"), false).unwrap();
    assert!(onto.individual().relation_exists("car", "hasPart", "piston"));

    onto.remove_relation("car", "hasPart", Some("engine"), true).unwrap();
    assert!(!onto.individual().relation_exists("car", "hasPart", "piston"));
}

#[test]
fn symmetric_property_mirrors_relations() {
    let onto = ontology();
    onto.declare_object_property(&property(
        "near",
        Characteristics {
            symmetric: true,
            ..Characteristics::default()
        },
    ))
    .unwrap();

    onto.add_relation("cup", "near", "plate", 1.0).unwrap();
    assert!(onto.individual().relation_exists("plate", "near", "cup"));
    onto.remove_relation("cup", "near", Some("plate"), false).unwrap();
    assert!(!onto.individual().relation_exists("plate", "near", "cup"));
}

#[test]
fn up_closure_respects_depth() {
    let onto = ontology();
    onto.declare_class(&class("Animal", &[], &[])).unwrap();
    onto.declare_class(&class("Mammal", &["Animal"], &[])).unwrap();
    onto.declare_class(&class("Dog", &["Mammal"], &[])).unwrap();
    onto.declare_individual(&individual("rex", &["Dog"])).unwrap();

    let individual = onto.individual();
    assert_eq!(individual.get_up("rex", Depth::DIRECT), names(&["Dog"]));
    assert_eq!(individual.get_up("rex", Depth::Unbounded), names(&["Dog", "Mammal", "Animal"]));
    assert!(individual.get_up("rex", Depth::Limited(0)).is_empty());
    assert_eq!(onto.class().get_down("Animal", Depth::Unbounded), names(&["Mammal", "Dog"]));
    assert!(individual.get_up("nobody", Depth::Unbounded).is_empty());
}

#[test]
fn up_closure_survives_cycles() {
    let onto = ontology();
    onto.declare_class(&class("A", &["B"], &[])).unwrap();
    onto.declare_class(&class("B", &["A"], &[])).unwrap();
    assert_eq!(onto.class().get_up("A", Depth::Unbounded), names(&["B"]));
}

#[test]
fn chains_derive_in_either_order() {
    let onto = ontology();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "hasPart".to_string(),
        chains: vec![vec!["hasPart".to_string(), "hasPart".to_string()]],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();

    onto.add_relation("car", "hasPart", "engine", 1.0).unwrap();
    onto.add_relation("engine", "hasPart", "piston", 1.0).unwrap();
    assert!(onto.individual().relation_exists("car", "hasPart", "piston"));

    onto.add_relation("piston", "hasPart", "ring", 1.0).unwrap();
    assert!(onto.individual().relation_exists("car", "hasPart", "ring"));
    assert!(onto.individual().relation_exists("engine", "hasPart", "ring"));

    onto.remove_relation("engine", "hasPart", Some("piston"), false).unwrap();
    assert!(!onto.individual().relation_exists("car", "hasPart", "piston"));
    assert!(!onto.individual().relation_exists("engine", "hasPart", "ring"));
    assert!(onto.individual().relation_exists("car", "hasPart", "engine"));
}

#[test]
fn stale_provenance_does_not_fail_removal() {
    let onto = ontology();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "hasPart".to_string(),
        chains: vec![vec!["hasPart".to_string(), "hasPart".to_string()]],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();
    onto.add_relation("car", "hasPart", "engine", 1.0).unwrap();
    onto.add_relation("engine", "hasPart", "piston", 1.0).unwrap();
    assert!(onto.individual().relation_exists("car", "hasPart", "piston"));

    // the derived relation goes first, leaving its provenance behind
    let direct = onto.remove_relation("car", "hasPart", Some("piston"), false).unwrap();
    assert_eq!(direct.removed.len(), 1);

    let retraction = onto.remove_relation("car", "hasPart", Some("engine"), false).unwrap();
    assert_eq!(retraction.removed.len(), 1);
    assert_eq!(retraction.skipped.len(), 1);
    assert!(!onto.individual().relation_exists("car", "hasPart", "engine"));
    assert!(onto.individual().relation_exists("engine", "hasPart", "piston"));
}
