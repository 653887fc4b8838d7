//! Reasoner plugins and their registry.
//!
//! A reasoner implements any of three hooks: pre (on each incoming
//! statement, may veto it), post (after a batch of statements) and periodic
//! (on a timer). [`Capabilities`] says which ones; the registry skips the
//! others and every inactive reasoner.

mod dictionary;
mod none;
mod range_domain;

use tracing::info;

use crate::feeder::Statement;
use crate::graph::Explanation;
use crate::notify::{Notification, Severity};
use crate::ontology::Ontology;

pub use dictionary::DictionaryReasoner;
pub use none::NoneReasoner;
pub use range_domain::RangeDomainReasoner;

/// Hooks a reasoner implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Runs before each statement.
    pub pre: bool,
    /// Runs after each batch.
    pub post: bool,
    /// Runs on the periodic timer.
    pub periodic: bool,
}

impl Capabilities {
    /// Every hook.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            pre: true,
            post: true,
            periodic: true,
        }
    }
}

/// Sink for what reasoners emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasonerOutput {
    /// Severity-tagged messages.
    pub notifications: Vec<Notification>,
    /// Derivation steps.
    pub explanations: Vec<Explanation>,
}

impl ReasonerOutput {
    /// Records a notification from `source`.
    pub fn notify(&mut self, severity: Severity, source: &str, message: impl Into<String>) {
        self.notifications.push(Notification::new(severity, source, message));
    }

    /// Records a (fact, cause) pair.
    pub fn explain(&mut self, fact: impl Into<String>, cause: impl Into<String>) {
        self.explanations.push(Explanation {
            fact: fact.into(),
            cause: cause.into(),
        });
    }

    /// True if nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty() && self.explanations.is_empty()
    }
}

/// A reasoning plugin.
///
/// Hooks the plugin does not declare in [`capabilities`](Self::capabilities)
/// are never called.
pub trait Reasoner: Send {
    /// Unique name, used to address the plugin.
    fn name(&self) -> &str;

    /// Free-text description.
    fn description(&self) -> &str;

    /// Hooks implemented.
    fn capabilities(&self) -> Capabilities;

    /// Called once the ontology is closed.
    fn initialize(&mut self, _ontology: &Ontology, _out: &mut ReasonerOutput) {}

    /// Called before `statement` is applied. Returning false vetoes it.
    fn pre_reason(&mut self, _ontology: &Ontology, _statement: &Statement, _out: &mut ReasonerOutput) -> bool {
        true
    }

    /// Called after a batch of statements.
    fn post_reason(&mut self, _ontology: &Ontology, _out: &mut ReasonerOutput) {}

    /// Called on the periodic timer. Returns true if it changed anything.
    fn periodic_reason(&mut self, _ontology: &Ontology, _out: &mut ReasonerOutput) -> bool {
        false
    }
}

struct Entry {
    reasoner: Box<dyn Reasoner>,
    active: bool,
}

/// Plugins in registration order, each with an active toggle.
#[derive(Default)]
pub struct ReasonerRegistry {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for ReasonerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasonerRegistry")
            .field("reasoners", &self.list())
            .field("active", &self.active_list())
            .finish()
    }
}

impl ReasonerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in plugins, all active.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(NoneReasoner));
        registry.register(Box::new(RangeDomainReasoner));
        registry.register(Box::new(DictionaryReasoner));
        registry
    }

    /// Adds an active plugin. Returns false if the name is taken.
    pub fn register(&mut self, reasoner: Box<dyn Reasoner>) -> bool {
        if self.entry(reasoner.name()).is_some() {
            return false;
        }
        self.entries.push(Entry { reasoner, active: true });
        true
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.reasoner.name() == name)
    }

    fn toggle(&mut self, name: &str, active: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.reasoner.name() == name) {
            Some(entry) => {
                entry.active = active;
                info!(reasoner = name, active, "reasoner toggled");
                true
            }
            None => false,
        }
    }

    /// Activates a plugin. Returns false if it is unknown.
    pub fn activate(&mut self, name: &str) -> bool {
        self.toggle(name, true)
    }

    /// Deactivates a plugin. Returns false if it is unknown.
    pub fn deactivate(&mut self, name: &str) -> bool {
        self.toggle(name, false)
    }

    /// Every plugin name.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.reasoner.name().to_string()).collect()
    }

    /// Active plugin names.
    #[must_use]
    pub fn active_list(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.active)
            .map(|e| e.reasoner.name().to_string())
            .collect()
    }

    /// Description of a plugin.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<String> {
        self.entry(name).map(|e| e.reasoner.description().to_string())
    }

    fn active(&mut self) -> impl Iterator<Item = &mut Box<dyn Reasoner>> {
        self.entries.iter_mut().filter(|e| e.active).map(|e| &mut e.reasoner)
    }

    /// Initializes every active plugin.
    pub fn initialize(&mut self, ontology: &Ontology) -> ReasonerOutput {
        let mut out = ReasonerOutput::default();
        for reasoner in self.active() {
            reasoner.initialize(ontology, &mut out);
        }
        out
    }

    /// Asks every active pre reasoner about `statement`; the first veto wins.
    pub fn run_pre(&mut self, ontology: &Ontology, statement: &Statement, out: &mut ReasonerOutput) -> bool {
        self.active()
            .filter(|r| r.capabilities().pre)
            .all(|r| r.pre_reason(ontology, statement, out))
    }

    /// Runs every active post reasoner, then clears the dirty flags they
    /// consumed.
    pub fn run_post(&mut self, ontology: &Ontology) -> ReasonerOutput {
        let mut out = ReasonerOutput::default();
        for reasoner in self.active().filter(|r| r.capabilities().post) {
            reasoner.post_reason(ontology, &mut out);
        }
        ontology.individuals_mut().clear_updated();
        ontology.classes_mut().clear_updated();
        ontology.object_properties_mut().clear_updated();
        ontology.data_properties_mut().clear_updated();
        out
    }

    /// Runs every active periodic reasoner. Returns the output if any of
    /// them did something.
    pub fn run_periodic(&mut self, ontology: &Ontology) -> Option<ReasonerOutput> {
        let mut out = ReasonerOutput::default();
        let mut worked = false;
        for reasoner in self.active().filter(|r| r.capabilities().periodic) {
            worked |= reasoner.periodic_reason(ontology, &mut out);
        }
        (worked || !out.is_empty()).then_some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Veto;

    impl Reasoner for Veto {
        fn name(&self) -> &str {
            "veto"
        }

        fn description(&self) -> &str {
            "refuses statements about secrets"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities {
                pre: true,
                ..Capabilities::default()
            }
        }

        fn pre_reason(&mut self, _ontology: &Ontology, statement: &Statement, out: &mut ReasonerOutput) -> bool {
            let allowed = statement.subject != "secret";
            if !allowed {
                out.notify(Severity::Warning, self.name(), "vetoed");
            }
            allowed
        }
    }

    #[test]
    fn test_builtins_are_registered_and_active() {
        let registry = ReasonerRegistry::with_builtins();
        assert_eq!(registry.list(), vec!["none", "range_domain", "dictionary"]);
        assert_eq!(registry.active_list(), registry.list());
        assert!(registry.description("dictionary").is_some());
        assert!(registry.description("missing").is_none());
    }

    #[test]
    fn test_toggling_controls_hooks() {
        let ontology = Ontology::default();
        let mut registry = ReasonerRegistry::new();
        assert!(registry.register(Box::new(Veto)));
        assert!(!registry.register(Box::new(Veto)));

        let secret = Statement::parse("[add]secret|isA|Thing").unwrap();
        let mut out = ReasonerOutput::default();
        assert!(!registry.run_pre(&ontology, &secret, &mut out));
        assert_eq!(out.notifications.len(), 1);

        assert!(registry.deactivate("veto"));
        assert!(registry.active_list().is_empty());
        assert!(registry.run_pre(&ontology, &secret, &mut out));
        assert!(!registry.activate("ghost"));
    }
}
