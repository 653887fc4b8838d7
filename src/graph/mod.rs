//! The typed graphs of an ontology and the arena they are built on.
//!
//! Every graph stores its branches in an [`EntityGraph`] keyed by
//! [`Handle`](crate::handle::Handle). Graphs never hold each other; an
//! operation that needs a sibling receives the narrow capability from
//! [`view`] for its duration.

pub mod anonymous;
pub mod assertion;
pub mod branch;
pub mod class;
pub mod data_property;
pub mod individual;
pub mod object_property;
pub mod property;
pub mod tree;
pub mod view;

pub use anonymous::{
    AnonymousBranch, AnonymousClassGraph, AnonymousElement, AnonymousScope, CardinalityKind, Expression, LogicalOp,
    RestrictedProperty, Restriction,
};
pub use assertion::{
    Assertion, ConstraintStatus, Explanation, RejectedDerivation, Retraction, UnresolvedConstraint,
};
pub use branch::{BranchMeta, Dictionary, Link, Relation, Triple};
pub use class::{ClassBranch, ClassGraph};
pub use data_property::{DataPropertyBranch, DataPropertyDecl, DataPropertyGraph};
pub use individual::{IndividualBranch, IndividualGraph};
pub use object_property::{ChainMatch, ObjectPropertyBranch, ObjectPropertyDecl, ObjectPropertyGraph, PropertyChain};
pub use property::{Characteristics, PropertyBranch};
pub use tree::{Branch, Depth, EntityGraph, Hierarchy, HierarchyLinks};
pub use view::{ClassView, DataPropertyView, ObjectPropertyView, PropertyView, Schema};
