//! End-to-end feeding: statements in, knowledge and events out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ontokb::{
    Capabilities, ClassDeclaration, Event, FeedStatus, KnowledgeEngine, ObjectPropertyDeclaration, Ontology,
    OntologyConfig, Reasoner, ReasonerOutput, Severity, Statement,
};

struct Censor;

impl Reasoner for Censor {
    fn name(&self) -> &str {
        "censor"
    }

    fn description(&self) -> &str {
        "Refuses statements about secrets."
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            pre: true,
            ..Capabilities::default()
        }
    }

    fn pre_reason(&mut self, _ontology: &Ontology, statement: &Statement, out: &mut ReasonerOutput) -> bool {
        if statement.subject == "secret" {
            out.notify(Severity::Warning, "censor", format!("refused {statement}"));
            return false;
        }
        true
    }
}

struct Ticker {
    ticks: Arc<AtomicUsize>,
}

impl Reasoner for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn description(&self) -> &str {
        "Counts periodic calls."
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            periodic: true,
            ..Capabilities::default()
        }
    }

    fn periodic_reason(&mut self, _ontology: &Ontology, out: &mut ReasonerOutput) -> bool {
        let n = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        out.notify(Severity::Debug, "ticker", format!("tick {n}"));
        true
    }
}

fn notifications(events: &[Event]) -> Vec<(Severity, String, String)> {
    events
        .iter()
        .filter_map(Event::as_notification)
        .map(|n| (n.severity, n.source.clone(), n.message.clone()))
        .collect()
}

#[test]
fn statements_build_knowledge() {
    let engine = KnowledgeEngine::default();
    for statement in [
        "[add]Dog|isA|Animal",
        "[add]rex|isA|Dog",
        "[add]rex|=|rexy",
        "[add]rex|!=|tom",
        "[add]rex|@en|Rex the dog",
        "[add]rex|weighs|float#12.5",
        "[add]rex|chases|tom|0.7",
    ] {
        assert!(engine.store(statement), "{statement}");
    }
    assert_eq!(engine.feed_until_idle(), 7);

    let individual = engine.ontology().individual();
    assert!(individual.is_a("rexy", "Animal"));
    assert!(individual.get_distincts("rexy").contains("tom"));
    assert!(individual.find("Rex the dog").contains("rex"));
    assert!(individual.relation_exists("rexy", "weighs", "float#12.5"));
    assert_eq!(individual.get_name("rex").as_deref(), Some("Rex the dog"));
    assert!(individual.get_on("rex", "chases", None, false).contains("tom"));
}

#[test]
fn deleting_entities_and_relations() {
    let engine = KnowledgeEngine::default();
    engine.store("[add]cup|isOn|table");
    engine.store("[add]cup|isOn|shelf");
    engine.feed_until_idle();

    engine.store("[del]cup|isOn|table");
    engine.feed_until_idle();
    assert!(!engine.ontology().individual().relation_exists("cup", "isOn", "table"));
    assert!(engine.ontology().individual().relation_exists("cup", "isOn", "shelf"));

    engine.store("[del]shelf|");
    engine.feed_until_idle();
    assert!(!engine.ontology().individual().touch("shelf"));
    assert!(engine.ontology().individual().get_on("cup", "isOn", None, false).is_empty());
}

#[test]
fn pre_reasoners_can_veto() {
    let engine = KnowledgeEngine::default();
    assert!(engine.register_reasoner(Box::new(Censor)));
    assert!(!engine.register_reasoner(Box::new(Censor)));
    let stream = engine.subscribe();

    engine.store("[add]secret|isIn|vault");
    engine.store("[add]key|isIn|vault");
    engine.feed_until_idle();

    assert!(!engine.ontology().individual().touch("secret"));
    assert!(engine.ontology().individual().touch("key"));
    let notes = notifications(&stream.drain());
    assert!(notes
        .iter()
        .any(|(severity, source, _)| *severity == Severity::Warning && source == "censor"));

    assert!(engine.deactivate_reasoner("censor"));
    engine.store("[add]secret|isIn|vault");
    engine.feed_until_idle();
    assert!(engine.ontology().individual().touch("secret"));
}

#[test]
fn batch_end_runs_range_domain() {
    let engine = KnowledgeEngine::default();
    engine
        .ontology()
        .declare_object_property(&ObjectPropertyDeclaration {
            name: "owns".to_string(),
            domains: vec!["Agent".to_string()],
            ranges: vec!["Object".to_string()],
            ..ObjectPropertyDeclaration::default()
        })
        .unwrap();
    let stream = engine.subscribe();

    engine.store("[add]bob|owns|mug");
    assert_eq!(engine.feed_once(), FeedStatus::Processed(1));
    assert!(!engine.ontology().individual().is_a("bob", "Agent"));
    assert_eq!(engine.feed_once(), FeedStatus::BatchCompleted);

    assert!(engine.ontology().individual().is_a("bob", "Agent"));
    assert!(engine.ontology().individual().is_a("mug", "Object"));
    let events = stream.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Explanation(x) if x.fact == "[ADD]bob|isA|Agent" && x.cause == "[ADD]owns|hasDomain|Agent"
    )));
    assert_eq!(events.last(), Some(&Event::BatchEnd));
}

#[test]
fn dictionary_adds_muted_variants_after_a_batch() {
    let engine = KnowledgeEngine::default();
    engine.store("[add]coffee_cup|");
    engine.store("[add]coffee_cup|@en|Coffee_Cup");
    engine.feed_until_idle();

    let individual = engine.ontology().individual();
    assert!(individual.find("coffee cup").contains("coffee_cup"));
    assert!(individual.get_every_names("coffee_cup").contains(&"Coffee Cup".to_string()));
    assert_eq!(individual.get_names("coffee_cup"), vec!["Coffee_Cup".to_string()]);
    assert!(individual.find_fuzzy("cofee cup").contains("coffee_cup"));
}

#[test]
fn periodic_reasoners_run_on_demand() {
    let engine = KnowledgeEngine::default();
    let ticks = Arc::new(AtomicUsize::new(0));
    engine.register_reasoner(Box::new(Ticker {
        ticks: Arc::clone(&ticks),
    }));
    let stream = engine.subscribe();

    assert!(engine.periodic_once());
    assert!(engine.periodic_once());
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
    let event = stream.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(event.as_notification().map(|n| n.message.as_str()), Some("tick 1"));

    engine.deactivate_reasoner("ticker");
    assert!(!engine.periodic_once());
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
}

#[test]
fn failed_statements_are_reported_and_skipped() {
    let engine = KnowledgeEngine::default();
    engine
        .ontology()
        .declare_object_property(&ObjectPropertyDeclaration {
            name: "marriedTo".to_string(),
            characteristics: ontokb::graph::Characteristics {
                irreflexive: true,
                ..Default::default()
            },
            ..ObjectPropertyDeclaration::default()
        })
        .unwrap();
    let stream = engine.subscribe();

    engine.store("[add]alice|marriedTo|alice");
    engine.store("[upd]alice|isA|Person");
    engine.store("[add]alice|marriedTo|bob");
    assert_eq!(engine.feed_until_idle(), 3);

    assert!(engine.ontology().individual().relation_exists("alice", "marriedTo", "bob"));
    let errors: Vec<_> = notifications(&stream.drain())
        .into_iter()
        .filter(|(severity, _, _)| *severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 2);
}

#[test]
fn versioned_engines_keep_history() {
    let engine = KnowledgeEngine::new(OntologyConfig {
        versioning: true,
        ..OntologyConfig::default()
    });
    engine.store("[add]a|likes|b");
    engine.store("[del]a|likes|b");
    engine.feed_until_idle();
    assert_eq!(engine.history(), vec!["[add]a|likes|b".to_string(), "[del]a|likes|b".to_string()]);
}

#[test]
fn rejected_update_statement_keeps_the_old_relation() {
    let engine = KnowledgeEngine::default();
    let onto = engine.ontology();
    onto.declare_class(&ClassDeclaration {
        name: "Rock".to_string(),
        disjoints: vec!["Food".to_string()],
        ..ClassDeclaration::default()
    })
    .unwrap();
    onto.declare_object_property(&ObjectPropertyDeclaration {
        name: "eats".to_string(),
        ranges: vec!["Food".to_string()],
        ..ObjectPropertyDeclaration::default()
    })
    .unwrap();
    let stream = engine.subscribe();

    engine.store("[add]pebble|isA|Rock");
    engine.store("[add]fido|eats|bone1");
    engine.store("[upd]fido|eats|pebble");
    assert_eq!(engine.feed_until_idle(), 3);

    assert!(onto.individual().relation_exists("fido", "eats", "bone1"));
    assert!(!onto.individual().relation_exists("fido", "eats", "pebble"));
    assert!(notifications(&stream.drain())
        .iter()
        .any(|(severity, _, _)| *severity == Severity::Error));

    engine.store("[upd]fido|eats|kibble");
    engine.feed_until_idle();
    assert_eq!(onto.individual().get_on("fido", "eats", None, false).len(), 1);
    assert!(onto.individual().relation_exists("fido", "eats", "kibble"));
}
