//! Snapshot files: save, reload, integrity and status codes.

use std::fs;

use ontokb::graph::Expression;
use ontokb::{
    ClassDeclaration, Depth, IndividualDeclaration, KnowledgeEngine, ObjectPropertyDeclaration, Ontology,
    OntologyConfig, ReadStatus, Snapshot,
};
use tempfile::tempdir;

fn populated() -> Ontology {
    let onto = Ontology::new(OntologyConfig::default());
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "partOf".to_string(),
        inverses: vec!["hasPart".to_string()],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();
    onto.declare_class(&ClassDeclaration {
        name: "Car".to_string(),
        mothers: vec!["Vehicle".to_string()],
        ..ClassDeclaration::default()
    })
    .unwrap();
    onto.declare_individual(&IndividualDeclaration {
        name: "herbie".to_string(),
        is_a: vec!["Car".to_string()],
        ..IndividualDeclaration::default()
    })
    .unwrap();
    onto.add_relation("wheel", "partOf", "herbie", 0.8).unwrap();
    onto.add_relation("herbie", "mileage", "integer#42000", 1.0).unwrap();
    onto.add_same_as("herbie", "car_53").unwrap();
    onto.add_label("herbie", "en", "Herbie").unwrap();
    onto.declare_anonymous("Car", &Expression::leaf(["hasPart", "min", "4", "Wheel"]))
        .unwrap();
    onto
}

#[test]
fn saved_snapshots_reload_with_derivations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garage.json");
    let source = populated();
    source.save(&path).unwrap();
    assert!(!dir.path().join("garage.tmp").exists());

    let reloaded = Ontology::new(OntologyConfig::default());
    assert_eq!(reloaded.read_from_file(&path), ReadStatus::Loaded);
    assert_eq!(reloaded.stats(), source.stats());

    let individual = reloaded.individual();
    assert!(individual.is_a("car_53", "Vehicle"));
    assert!(individual.relation_exists("herbie", "hasPart", "wheel"));
    assert!(individual.relation_exists("car_53", "mileage", "integer#42000"));
    assert!(individual.find("Herbie").contains("herbie"));
    assert_eq!(
        reloaded.class().get_up("Car", Depth::Unbounded),
        source.class().get_up("Car", Depth::Unbounded)
    );
    assert_eq!(Snapshot::capture(&reloaded), Snapshot::capture(&source));
}

#[test]
fn derived_relations_are_not_stored() {
    let snapshot = Snapshot::capture(&populated());
    let herbie = snapshot.individuals.iter().find(|i| i.name == "herbie").unwrap();
    assert!(herbie.relations.iter().all(|r| r.property != "hasPart"));
    let wheel = snapshot.individuals.iter().find(|i| i.name == "wheel").unwrap();
    assert_eq!(wheel.relations.len(), 1);
    assert!((wheel.relations[0].weight - 0.8).abs() < f64::EPSILON);
}

#[test]
fn tampered_files_are_reported_corrupted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garage.json");
    populated().save(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    fs::write(&path, text.replace("herbie", "herbert")).unwrap();

    let target = Ontology::new(OntologyConfig::default());
    let status = target.read_from_file(&path);
    assert_eq!(status, ReadStatus::Corrupted);
    assert_eq!(status.code(), -2);
    assert_eq!(target.stats().individuals, 0);
}

#[test]
fn missing_and_foreign_sources() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nothing.json");
    let onto = Ontology::new(OntologyConfig::default());

    assert_eq!(onto.read_from_file(&missing).code(), -1);
    assert!(!onto.preload(&missing));
    assert_eq!(onto.read_from_uri("http://example.org/onto.owl"), ReadStatus::UnsupportedUri);

    let garbage = dir.path().join("garbage.json");
    fs::write(&garbage, "not a snapshot").unwrap();
    assert!(!onto.read_from_file(&garbage).is_loaded());
}

#[test]
fn uri_and_preload_paths() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garage.json");
    populated().save(&path).unwrap();

    let by_uri = Ontology::new(OntologyConfig::default());
    let uri = format!("file://{}", path.display());
    assert!(by_uri.read_from_uri(&uri).is_loaded());
    assert!(by_uri.individual().touch("herbie"));

    let engine = KnowledgeEngine::default();
    assert!(engine.ontology().preload(&path));
    engine.close();
    engine.feed_until_idle();
    assert!(engine.ontology().individual().relation_exists("herbie", "hasPart", "wheel"));
    assert!(engine.ontology().individual().touch("myself"));
}
