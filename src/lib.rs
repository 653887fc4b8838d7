//! # ontokb - an in-memory ontology knowledge base
//!
//! ontokb keeps a typed OWL-style knowledge base in memory: classes,
//! object and data properties, individuals and anonymous class expressions,
//! each in its own graph behind its own reader/writer lock. Assertions are
//! checked against domains, ranges, disjointness, irreflexivity and
//! asymmetry, and propagate through inverses, symmetry, transitivity and
//! property chains with provenance so that retraction cascades.
//!
//! ## Core Concepts
//!
//! - **Handle**: a signed integer naming an entity (positive) or a literal
//!   (negative), issued by the registry of one ontology
//! - **Ontology**: the graphs, their locks and a name-keyed query surface
//! - **Statement**: a text update such as `[add]rex|isA|Dog`
//! - **KnowledgeEngine**: applies statements, runs reasoner plugins and
//!   publishes notifications and explanations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ontokb::{Depth, KnowledgeEngine};
//!
//! let engine = KnowledgeEngine::default();
//! engine.store("[add]Dog|isA|Animal");
//! engine.store("[add]rex|isA|Dog");
//! engine.feed_until_idle();
//!
//! let classes = engine.ontology().individual().get_up("rex", Depth::Unbounded);
//! assert!(classes.contains("Animal"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handle;

mod fuzzy;
pub mod graph;
pub mod ontology;

pub mod engine;
pub mod feeder;
pub mod manager;
pub mod notify;
pub mod persistence;
pub mod reasoner;

pub use config::OntologyConfig;
pub use error::{
    GraphError, Inconsistency, OntoError, OntoResult, PersistenceError, StatementError, StreamError,
};
pub use handle::{Handle, HandleRegistry, Literal};

pub use graph::{
    Assertion, ConstraintStatus, Depth, Expression, Explanation, Retraction, Triple, UnresolvedConstraint,
};
pub use ontology::{
    ClassDeclaration, DataPropertyDeclaration, EntityKind, IndividualDeclaration, Label, ObjectPropertyDeclaration,
    Ontology, OntologyId, OntologyStats, RelationDeclaration,
};

pub use engine::{FeedStatus, KnowledgeEngine};
pub use feeder::{Action, Feeder, Operation, Statement};
pub use manager::OntologyManager;
pub use notify::{Event, EventStream, Notification, NotificationHub, Severity};
pub use persistence::{ReadStatus, Snapshot};
pub use reasoner::{Capabilities, Reasoner, ReasonerOutput, ReasonerRegistry};
