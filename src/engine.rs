//! The knowledge engine: one ontology, its feeder, its reasoners and its
//! notification hub.
//!
//! Applying statements is serialized by a coarse feed lock; reasoners sit
//! behind their own lock, always taken after the feed lock. The engine
//! owns no thread: a host loop calls [`KnowledgeEngine::feed_once`] and
//! [`KnowledgeEngine::periodic_once`] at the configured rates.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::OntologyConfig;
use crate::feeder::{FeedReport, Feeder, Statement};
use crate::notify::{Event, EventStream, NotificationHub};
use crate::ontology::Ontology;
use crate::reasoner::{Reasoner, ReasonerOutput, ReasonerRegistry};

/// Outcome of one [`KnowledgeEngine::feed_once`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// That many statements were taken off the queue.
    Processed(usize),
    /// The queue ran dry after a batch; post reasoners ran.
    BatchCompleted,
    /// Nothing to do.
    Idle,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &'static str) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!(lock = name, "recovering poisoned engine lock");
        PoisonError::into_inner(poisoned)
    })
}

/// Hosts one ontology and applies update statements to it.
#[derive(Debug)]
pub struct KnowledgeEngine {
    ontology: Arc<Ontology>,
    feeder: Feeder,
    reasoners: Mutex<ReasonerRegistry>,
    feed_lock: Mutex<()>,
    hub: NotificationHub,
    batch_open: AtomicBool,
}

impl Default for KnowledgeEngine {
    fn default() -> Self {
        Self::new(OntologyConfig::default())
    }
}

impl KnowledgeEngine {
    /// Engine over a fresh ontology with the built-in reasoners.
    #[must_use]
    pub fn new(config: OntologyConfig) -> Self {
        Self::with_ontology(Arc::new(Ontology::new(config)))
    }

    /// Engine over an existing ontology with the built-in reasoners.
    #[must_use]
    pub fn with_ontology(ontology: Arc<Ontology>) -> Self {
        let config = ontology.config();
        Self {
            feeder: Feeder::new(config.versioning),
            hub: NotificationHub::new(config.stream_capacity),
            reasoners: Mutex::new(ReasonerRegistry::with_builtins()),
            feed_lock: Mutex::new(()),
            batch_open: AtomicBool::new(false),
            ontology,
        }
    }

    /// The hosted ontology.
    #[must_use]
    pub const fn ontology(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    /// Opens a stream of notifications, explanations, echoes and batch ends.
    pub fn subscribe(&self) -> EventStream {
        self.hub.subscribe()
    }

    /// The notification hub.
    #[must_use]
    pub const fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    /// Statements applied so far, when versioning is on.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.feeder.history().iter().map(ToString::to_string).collect()
    }

    /// Queues a statement stamped now. Returns false if it is malformed;
    /// the error is published on the next [`feed_once`](Self::feed_once).
    pub fn store(&self, text: &str) -> bool {
        self.feeder.store(text)
    }

    /// Queues a statement with an explicit stamp.
    pub fn store_at(&self, text: &str, stamp: DateTime<Utc>) -> bool {
        self.feeder.store_at(text, stamp)
    }

    /// Non-blocking "is there work".
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.feeder.has_pending() || self.batch_open.load(Ordering::SeqCst)
    }

    fn publish_output(&self, output: ReasonerOutput) {
        for notification in output.notifications {
            self.hub.publish(&Event::Notification(notification));
        }
        self.hub.explain(&output.explanations);
    }

    fn publish_report(&self, report: FeedReport) {
        for notification in report.notifications {
            self.hub.publish(&Event::Notification(notification));
        }
        for echo in report.echoes {
            self.hub.publish(&Event::Echo(echo));
        }
        self.hub.explain(&report.explanations);
    }

    /// One unit of feeding: drains the queue, or closes the batch once it
    /// ran dry.
    pub fn feed_once(&self) -> FeedStatus {
        let _feed = lock(&self.feed_lock, "feed");
        if self.feeder.has_pending() {
            let mut reasoners = lock(&self.reasoners, "reasoners");
            let mut pre = ReasonerOutput::default();
            let ontology = &*self.ontology;
            let report = self
                .feeder
                .run(ontology, &mut |statement: &Statement| reasoners.run_pre(ontology, statement, &mut pre));
            drop(reasoners);
            let processed = report.applied + report.vetoed + report.failed;
            debug!(applied = report.applied, vetoed = report.vetoed, failed = report.failed, "feed unit");
            self.publish_output(pre);
            self.publish_report(report);
            self.batch_open.store(true, Ordering::SeqCst);
            return FeedStatus::Processed(processed);
        }
        if self.batch_open.swap(false, Ordering::SeqCst) {
            let output = lock(&self.reasoners, "reasoners").run_post(&self.ontology);
            self.publish_output(output);
            self.hub.publish(&Event::BatchEnd);
            return FeedStatus::BatchCompleted;
        }
        FeedStatus::Idle
    }

    /// Calls [`feed_once`](Self::feed_once) until it reports idle. Returns
    /// the number of statements processed.
    pub fn feed_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            match self.feed_once() {
                FeedStatus::Processed(n) => total += n,
                FeedStatus::BatchCompleted => {}
                FeedStatus::Idle => return total,
            }
        }
    }

    /// One unit of periodic reasoning. Returns true if a reasoner did
    /// something.
    pub fn periodic_once(&self) -> bool {
        let output = lock(&self.reasoners, "reasoners").run_periodic(&self.ontology);
        match output {
            Some(output) => {
                self.publish_output(output);
                true
            }
            None => false,
        }
    }

    /// Finishes loading: closes the ontology, initializes the reasoners,
    /// runs the post reasoners once and queues the `myself` statements.
    pub fn close(&self) {
        let _feed = lock(&self.feed_lock, "feed");
        self.ontology.close();
        let mut reasoners = lock(&self.reasoners, "reasoners");
        let init = reasoners.initialize(&self.ontology);
        let post = reasoners.run_post(&self.ontology);
        drop(reasoners);
        self.publish_output(init);
        self.publish_output(post);

        self.feeder.store("[add]myself|");
        if let Some(name) = &self.ontology.config().name {
            self.feeder.store(&format!("[add]myself|=|{name}"));
        }
        info!(ontology = %self.ontology.id(), "engine ready");
    }

    /// Registers an extra reasoner. Returns false if the name is taken.
    pub fn register_reasoner(&self, reasoner: Box<dyn Reasoner>) -> bool {
        lock(&self.reasoners, "reasoners").register(reasoner)
    }

    /// Activates a reasoner by name.
    pub fn activate_reasoner(&self, name: &str) -> bool {
        lock(&self.reasoners, "reasoners").activate(name)
    }

    /// Deactivates a reasoner by name.
    pub fn deactivate_reasoner(&self, name: &str) -> bool {
        lock(&self.reasoners, "reasoners").deactivate(name)
    }

    /// Every reasoner name.
    #[must_use]
    pub fn reasoners(&self) -> Vec<String> {
        lock(&self.reasoners, "reasoners").list()
    }

    /// Active reasoner names.
    #[must_use]
    pub fn active_reasoners(&self) -> Vec<String> {
        lock(&self.reasoners, "reasoners").active_list()
    }

    /// Description of a reasoner.
    #[must_use]
    pub fn reasoner_description(&self, name: &str) -> Option<String> {
        lock(&self.reasoners, "reasoners").description(name)
    }

    /// Versioned copy named `name`: same knowledge, versioning on, same
    /// active reasoners.
    #[must_use]
    pub fn copy_as(&self, name: &str) -> Self {
        let _feed = lock(&self.feed_lock, "feed");
        let mut config = self.ontology.config().clone();
        config.versioning = true;
        config.name = Some(name.to_string());
        let copy = Self::with_ontology(Arc::new(self.ontology.copy_with_config(config)));
        let active = self.active_reasoners();
        for reasoner in copy.reasoners() {
            if !active.contains(&reasoner) {
                copy.deactivate_reasoner(&reasoner);
            }
        }
        info!(source = %self.ontology.id(), copy = %copy.ontology.id(), name, "engine copied");
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[test]
    fn test_feed_cycle_ends_with_a_batch() {
        let engine = KnowledgeEngine::default();
        let stream = engine.subscribe();
        assert_eq!(engine.feed_once(), FeedStatus::Idle);

        engine.store("[add]Dog|isA|Animal");
        engine.store("[add]rex|isA|Dog");
        assert!(engine.has_pending());
        assert_eq!(engine.feed_once(), FeedStatus::Processed(2));
        assert_eq!(engine.feed_once(), FeedStatus::BatchCompleted);
        assert_eq!(engine.feed_once(), FeedStatus::Idle);
        assert!(!engine.has_pending());

        let events = stream.drain();
        assert!(events.contains(&Event::Echo("[add]rex|isA|Dog".to_string())));
        assert_eq!(events.last(), Some(&Event::BatchEnd));
    }

    #[test]
    fn test_malformed_statements_are_notified() {
        let engine = KnowledgeEngine::default();
        let stream = engine.subscribe();
        assert!(!engine.store("[add]"));
        engine.feed_until_idle();
        let errors: Vec<_> = stream
            .drain()
            .into_iter()
            .filter_map(|e| e.as_notification().cloned())
            .filter(|n| n.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_close_introduces_myself() {
        let engine = KnowledgeEngine::new(OntologyConfig {
            name: Some("robot".to_string()),
            ..OntologyConfig::default()
        });
        engine.close();
        engine.feed_until_idle();
        assert!(engine.ontology().is_init());
        let same = engine.ontology().individual().get_same("myself");
        assert!(same.contains("robot"));
    }

    #[test]
    fn test_copies_keep_reasoner_state_and_version() {
        let engine = KnowledgeEngine::default();
        engine.deactivate_reasoner("dictionary");
        engine.store("[add]a|likes|b");
        engine.feed_until_idle();

        let copy = engine.copy_as("draft");
        assert_eq!(copy.active_reasoners(), vec!["none", "range_domain"]);
        copy.store("[add]a|likes|c");
        copy.feed_until_idle();
        assert_eq!(copy.history(), vec!["[add]a|likes|c".to_string()]);
        assert!(!engine.ontology().individual().relation_exists("a", "likes", "c"));
    }
}
