//! Outcomes of relation assertions and retractions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Inconsistency;
use crate::handle::{Handle, HandleRegistry};

use super::branch::Triple;
use super::view::ClassView;

/// How an entity's class closure relates to a domain or range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    Confirmed,
    Unknown,
    Contradicted,
}

/// Checks `closure` against `expected`: an empty expectation or a shared
/// class confirms, a class disjoint with the expectation contradicts.
pub(crate) fn membership(
    classes: &dyn ClassView,
    closure: &HashSet<Handle>,
    expected: &HashSet<Handle>,
) -> Membership {
    if expected.is_empty() || !closure.is_disjoint(expected) {
        Membership::Confirmed
    } else if closure.is_disjoint(&classes.disjoint_closure(expected)) {
        Membership::Unknown
    } else {
        Membership::Contradicted
    }
}

/// A constraint that could be neither confirmed nor refuted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnresolvedConstraint {
    /// The subject is not known to be in the property's domain.
    Domain { property: String },
    /// The object is not known to be in the property's range.
    Range { property: String },
    /// A functional property now has more than one distinct target.
    Functional { property: String },
}

impl UnresolvedConstraint {
    /// Flag key used in the entity's flag bag.
    #[must_use]
    pub const fn flag(&self) -> &'static str {
        match self {
            Self::Domain { .. } => "domain",
            Self::Range { .. } => "range",
            Self::Functional { .. } => "functional",
        }
    }

    /// Property involved.
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Domain { property } | Self::Range { property } | Self::Functional { property } => property,
        }
    }
}

/// Soft outcome of an accepted assertion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConstraintStatus {
    /// Every constraint is confirmed.
    #[default]
    Satisfied,
    /// Accepted, but the subject was flagged for later inspection.
    Unresolved(Vec<UnresolvedConstraint>),
}

impl ConstraintStatus {
    pub(crate) fn from_list(unresolved: Vec<UnresolvedConstraint>) -> Self {
        if unresolved.is_empty() {
            Self::Satisfied
        } else {
            Self::Unresolved(unresolved)
        }
    }

    /// True when nothing was left unresolved.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// A (fact, cause) pair describing one derivation or retraction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    /// What changed, e.g. `[DEL]car|hasPart|wheel`.
    pub fact: String,
    /// Why, e.g. `[DEL]wheel|partOf|car`.
    pub cause: String,
}

impl Explanation {
    pub(crate) fn added(registry: &HandleRegistry, fact: Triple, cause: Triple) -> Self {
        Self {
            fact: format!("[ADD]{}", render(registry, fact)),
            cause: format!("[ADD]{}", render(registry, cause)),
        }
    }

    pub(crate) fn removed(registry: &HandleRegistry, fact: Triple, cause: Triple) -> Self {
        Self {
            fact: format!("[DEL]{}", render(registry, fact)),
            cause: format!("[DEL]{}", render(registry, cause)),
        }
    }
}

/// `subject|property|object` using names and `type#value` literals.
pub(crate) fn render(registry: &HandleRegistry, triple: Triple) -> String {
    format!(
        "{}|{}|{}",
        registry.display(triple.subject),
        registry.display(triple.property),
        registry.display(triple.object)
    )
}

/// A derived relation that failed its own consistency checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDerivation {
    /// Triple the cascade tried to add.
    pub triple: Triple,
    /// Why it was refused.
    pub reason: Inconsistency,
}

/// Result of an accepted assertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    /// The asserted triple.
    pub triple: Triple,
    /// False if an existing entry was updated in place.
    pub created: bool,
    /// Soft constraint outcome.
    pub status: ConstraintStatus,
    /// Relations derived by the cascade, as explanation pairs.
    pub explanations: Vec<Explanation>,
    /// Derivations refused by consistency checks.
    pub rejected: Vec<RejectedDerivation>,
}

/// Result of a retraction cascade.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Retraction {
    /// Every triple removed, top-level ones first.
    pub removed: Vec<Triple>,
    /// One pair per cascaded removal.
    pub explanations: Vec<Explanation>,
    /// Provenance entries pointing at relations that no longer exist.
    pub skipped: Vec<Triple>,
}

impl Retraction {
    /// True if nothing was removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    pub(crate) fn merge(&mut self, other: Self) {
        self.removed.extend(other.removed);
        self.explanations.extend(other.explanations);
        self.skipped.extend(other.skipped);
    }
}
