//! The feeder: a queue of update statements applied one at a time.
//!
//! Statements are parsed when stored; a malformed one never reaches the
//! queue and becomes an error notification instead. [`Feeder::run`] drains
//! the queue, asking a gate (the pre reasoners) before each statement.
//! A failing statement is reported and the batch moves on.

pub mod statement;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{GraphError, OntoError, OntoResult};
use crate::graph::{Assertion, ConstraintStatus, Explanation, Retraction};
use crate::notify::{Notification, Severity};
use crate::ontology::{EntityKind, IndividualDeclaration, Ontology};

pub use statement::{Action, Operation, Statement};

const SOURCE: &str = "feeder";

/// What one [`Feeder::run`] did.
#[derive(Debug, Clone, Default)]
pub struct FeedReport {
    /// Statements applied.
    pub applied: usize,
    /// Statements refused by the gate.
    pub vetoed: usize,
    /// Statements that failed.
    pub failed: usize,
    /// Applied statements in text form.
    pub echoes: Vec<String>,
    /// Derivation and retraction steps, in order.
    pub explanations: Vec<Explanation>,
    /// Errors and warnings raised while applying.
    pub notifications: Vec<Notification>,
}

impl FeedReport {
    /// True if at least one statement was taken off the queue.
    #[must_use]
    pub const fn worked(&self) -> bool {
        self.applied + self.vetoed + self.failed > 0
    }

    fn record_assertion(&mut self, assertion: Assertion) {
        if let ConstraintStatus::Unresolved(flags) = &assertion.status {
            debug!(unresolved = flags.len(), "assertion left constraints unresolved");
        }
        for rejected in &assertion.rejected {
            self.notifications.push(Notification::new(
                Severity::Warning,
                SOURCE,
                format!("derivation refused: {}", rejected.reason),
            ));
        }
        self.explanations.extend(assertion.explanations);
    }

    fn record_retraction(&mut self, retraction: Retraction) {
        if !retraction.skipped.is_empty() {
            debug!(skipped = retraction.skipped.len(), "stale provenance skipped");
        }
        self.explanations.extend(retraction.explanations);
    }
}

/// Queue of parsed statements.
#[derive(Debug, Default)]
pub struct Feeder {
    queue: Mutex<VecDeque<Statement>>,
    rejected: Mutex<Vec<Notification>>,
    versioning: bool,
    history: Mutex<Vec<Statement>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("recovering poisoned feeder lock");
        PoisonError::into_inner(poisoned)
    })
}

impl Feeder {
    /// Creates an empty feeder. With `versioning`, applied statements are
    /// kept in [`history`](Self::history).
    #[must_use]
    pub fn new(versioning: bool) -> Self {
        Self {
            versioning,
            ..Self::default()
        }
    }

    /// Parses and queues a statement stamped now.
    pub fn store(&self, text: &str) -> bool {
        self.store_at(text, Utc::now())
    }

    /// Parses and queues a statement with an explicit stamp. Returns false
    /// and records an error notification if it is malformed.
    pub fn store_at(&self, text: &str, stamp: DateTime<Utc>) -> bool {
        match Statement::parse_at(text, stamp) {
            Ok(statement) => {
                lock(&self.queue).push_back(statement);
                true
            }
            Err(err) => {
                warn!(statement = text, error = %err, "statement rejected");
                lock(&self.rejected).push(Notification::new(Severity::Error, SOURCE, format!("{text}: {err}")));
                false
            }
        }
    }

    /// True if statements are waiting or parse errors are unreported.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !lock(&self.queue).is_empty() || !lock(&self.rejected).is_empty()
    }

    /// Queued statements.
    #[must_use]
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Applied statements, oldest first, when versioning is on.
    #[must_use]
    pub fn history(&self) -> Vec<Statement> {
        lock(&self.history).clone()
    }

    /// Drains the queue into `ontology`. `gate` sees each statement first
    /// and may veto it.
    pub fn run(&self, ontology: &Ontology, gate: &mut dyn FnMut(&Statement) -> bool) -> FeedReport {
        let mut report = FeedReport {
            notifications: std::mem::take(&mut *lock(&self.rejected)),
            ..FeedReport::default()
        };
        report.failed = report.notifications.len();
        let default_weight = ontology.config().default_weight;
        loop {
            let Some(statement) = lock(&self.queue).pop_front() else {
                break;
            };
            if !gate(&statement) {
                report.vetoed += 1;
                report.notifications.push(Notification::new(
                    Severity::Info,
                    SOURCE,
                    format!("{statement}: vetoed by a reasoner"),
                ));
                continue;
            }
            match apply(ontology, &statement, default_weight, &mut report) {
                Ok(()) => {
                    report.applied += 1;
                    report.echoes.push(statement.to_string());
                    if self.versioning {
                        lock(&self.history).push(statement);
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    debug!(statement = %statement, error = %err, "statement failed");
                    report
                        .notifications
                        .push(Notification::new(Severity::Error, SOURCE, format!("{statement}: {err}")));
                }
            }
        }
        report
    }
}

fn apply(ontology: &Ontology, statement: &Statement, default_weight: f64, report: &mut FeedReport) -> OntoResult<()> {
    let subject = statement.subject.as_str();
    let add = statement.op == Operation::Add;
    match &statement.action {
        Action::Entity if add => {
            if ontology.kind_of(subject).is_none() {
                ontology.declare_individual(&IndividualDeclaration {
                    name: subject.to_string(),
                    ..IndividualDeclaration::default()
                })?;
            }
        }
        Action::Entity => match ontology.kind_of(subject) {
            Some(EntityKind::Individual) => ontology.delete_individual(subject)?,
            Some(EntityKind::Class) => ontology.delete_class(subject)?,
            Some(EntityKind::ObjectProperty) => ontology.delete_object_property(subject)?,
            Some(EntityKind::DataProperty) => ontology.delete_data_property(subject)?,
            None => return Err(unknown(subject)),
        },
        Action::SameAs(other) if add => ontology.add_same_as(subject, other)?,
        Action::SameAs(other) => {
            ontology.remove_same_as(subject, other)?;
        }
        Action::Distinct(other) if add => {
            ontology.add_distinct(subject, other)?;
        }
        Action::Distinct(other) => {
            ontology.remove_distinct(subject, other)?;
        }
        Action::IsA(mother) if add => {
            ontology.add_inheritance(subject, mother)?;
        }
        Action::IsA(mother) => {
            ontology.remove_inheritance(subject, mother)?;
        }
        Action::Label { lang, text } if add => {
            ontology.add_label(subject, lang, text)?;
        }
        Action::Label { lang, text } => {
            ontology.remove_label(subject, lang, text)?;
        }
        Action::InverseOf(other) if add => {
            ontology.add_inverse_of(subject, other)?;
        }
        Action::InverseOf(other) => {
            ontology.remove_inverse_of(subject, other)?;
        }
        Action::Relation { property, object } => {
            let weight = statement.weight.unwrap_or(default_weight);
            match (statement.op, object) {
                (Operation::Add, Some(object)) => {
                    report.record_assertion(ontology.add_relation(subject, property, object, weight)?);
                }
                (Operation::Update, Some(object)) => {
                    let (retraction, assertion) = ontology.update_relation(subject, property, object, weight)?;
                    report.record_retraction(retraction);
                    report.record_assertion(assertion);
                }
                (Operation::Delete, object) => {
                    report.record_retraction(ontology.remove_relation(subject, property, object.as_deref(), false)?);
                }
                (_, None) => return Err(unknown("_")),
            }
        }
    }
    Ok(())
}

fn unknown(name: &str) -> OntoError {
    GraphError::UnknownEntity {
        name: name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(_: &Statement) -> bool {
        true
    }

    #[test]
    fn test_malformed_statements_do_not_abort_the_batch() {
        let ontology = Ontology::default();
        let feeder = Feeder::new(false);
        assert!(feeder.store("[add]Dog|isA|Animal"));
        assert!(feeder.store("[add]rex|isA|Dog"));
        assert!(!feeder.store("[zap]rex|isA|Dog"));
        assert!(!feeder.store("[add]rex|eats|rock|heavy"));
        assert!(feeder.store("[del]ghost|likes|_"));
        assert!(feeder.store("[add]rex|chases|tom"));

        let report = feeder.run(&ontology, &mut accept);
        assert_eq!(report.applied, 3);
        assert_eq!(report.failed, 3);
        assert_eq!(report.echoes[1..], ["[add]rex|isA|Dog".to_string(), "[add]rex|chases|tom".to_string()]);
        assert!(ontology.individual().relation_exists("rex", "chases", "tom"));
        assert!(!feeder.has_pending());
    }

    #[test]
    fn test_gate_vetoes_statements() {
        let ontology = Ontology::default();
        let feeder = Feeder::new(true);
        feeder.store("[add]a|likes|b");
        feeder.store("[add]c|likes|d");
        let report = feeder.run(&ontology, &mut |s: &Statement| s.subject != "c");
        assert_eq!((report.applied, report.vetoed), (1, 1));
        assert!(!ontology.individual().touch("c"));
        assert_eq!(feeder.history().len(), 1);
    }

    #[test]
    fn test_update_and_wildcard_delete() {
        let ontology = Ontology::default();
        let feeder = Feeder::new(false);
        feeder.store("[add]door|color|red");
        feeder.store("[add]door|color|blue");
        feeder.store("[upd]door|color|green");
        feeder.run(&ontology, &mut accept);
        let colors = ontology.individual().get_on("door", "color", None, false);
        assert_eq!(colors, std::collections::HashSet::from(["green".to_string()]));

        feeder.store("[del]door|color|_");
        let report = feeder.run(&ontology, &mut accept);
        assert_eq!(report.applied, 1);
        assert!(ontology.individual().get_on("door", "color", None, false).is_empty());
    }

    #[test]
    fn test_inverse_statements_explain_the_cascade() {
        let ontology = Ontology::default();
        let feeder = Feeder::new(false);
        feeder.store("[add]partOf|inverseOf|hasPart");
        feeder.store("[add]wheel|partOf|car");
        let report = feeder.run(&ontology, &mut accept);
        assert_eq!(report.applied, 2);
        assert!(report
            .explanations
            .iter()
            .any(|e| e.fact == "[ADD]car|hasPart|wheel" && e.cause == "[ADD]wheel|partOf|car"));
    }
}
