//! Anonymous class expressions (restrictions and logical combinations)
//! materialized into trees of handles, each equivalent to one named class.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::handle::{Handle, HandleRegistry};

use super::class::ClassGraph;
use super::data_property::DataPropertyGraph;
use super::individual::IndividualGraph;
use super::object_property::ObjectPropertyGraph;

const W3C_PREFIX: &str = "http://www.w3.org/";
const XSD_PREFIX: &str = "xsd:";

/// Parsed class expression, as produced by an ontology-file parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    /// Intersection.
    And(Vec<Expression>),
    /// Union.
    Or(Vec<Expression>),
    /// Complement.
    Not(Box<Expression>),
    /// Enumeration of individuals.
    OneOf(Vec<Expression>),
    /// `[Class]`, `[property, value, individual]` or
    /// `[property, kind, count?, target]`.
    Leaf(Vec<String>),
    /// `[property, kind, count?]` applied to a nested filler expression.
    Restriction {
        /// Property, cardinality kind and optional count.
        tokens: Vec<String>,
        /// The restricted filler.
        filler: Box<Expression>,
    },
}

impl Expression {
    /// Convenience constructor for leaves.
    pub fn leaf<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Leaf(tokens.into_iter().map(Into::into).collect())
    }

    fn validate(&self) -> Result<(), GraphError> {
        match self {
            Self::And(items) | Self::Or(items) | Self::OneOf(items) => {
                if items.is_empty() {
                    return Err(GraphError::MalformedExpression {
                        reason: "logical node without operands".to_string(),
                    });
                }
                items.iter().try_for_each(Self::validate)
            }
            Self::Not(inner) => inner.validate(),
            Self::Leaf(tokens) if tokens.is_empty() || tokens.len() == 2 => Err(GraphError::MalformedExpression {
                reason: format!("leaf with {} token(s)", tokens.len()),
            }),
            Self::Leaf(_) => Ok(()),
            Self::Restriction { tokens, filler } => {
                if tokens.len() < 2 {
                    return Err(GraphError::MalformedExpression {
                        reason: "restriction without property and kind".to_string(),
                    });
                }
                filler.validate()
            }
        }
    }
}

/// Logical combinator of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    /// Intersection.
    And,
    /// Union.
    Or,
    /// Complement.
    Not,
}

/// Cardinality descriptor of a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityKind {
    /// Existential.
    Some,
    /// Universal.
    Only,
    /// Exact count.
    Exactly,
    /// Minimum count.
    Min,
    /// Maximum count.
    Max,
    /// Has a specific individual.
    Value,
    /// Unrecognized kind, kept rather than dropped.
    Error,
}

impl CardinalityKind {
    /// Parses a kind keyword; unknown keywords map to [`Self::Error`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text {
            "some" => Self::Some,
            "only" => Self::Only,
            "exactly" => Self::Exactly,
            "min" => Self::Min,
            "max" => Self::Max,
            "value" => Self::Value,
            _ => Self::Error,
        }
    }

    /// Keyword of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Some => "some",
            Self::Only => "only",
            Self::Exactly => "exactly",
            Self::Min => "min",
            Self::Max => "max",
            Self::Value => "value",
            Self::Error => "error",
        }
    }
}

/// Property constrained by a restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictedProperty {
    /// Object property.
    Object(Handle),
    /// Data property.
    Data(Handle),
}

impl RestrictedProperty {
    /// The property handle.
    #[must_use]
    pub const fn handle(self) -> Handle {
        match self {
            Self::Object(h) | Self::Data(h) => h,
        }
    }
}

/// A cardinality restriction node.
#[derive(Debug, Clone, PartialEq)]
pub struct Restriction {
    /// Restricted property.
    pub property: RestrictedProperty,
    /// Cardinality kind.
    pub kind: CardinalityKind,
    /// Count for `exactly`/`min`/`max`, zero otherwise.
    pub count: u32,
    /// Class, individual, literal type or nested expression.
    pub filler: Option<Box<AnonymousElement>>,
}

/// One node of a materialized expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AnonymousElement {
    /// And / or / not.
    Logical {
        /// Combinator.
        op: LogicalOp,
        /// Sub-elements.
        operands: Vec<AnonymousElement>,
    },
    /// Enumeration of individuals.
    OneOf(Vec<AnonymousElement>),
    /// Named class.
    Class(Handle),
    /// Named individual.
    Individual(Handle),
    /// Literal type tag.
    LiteralType(String),
    /// Cardinality restriction.
    Restriction(Restriction),
}

impl AnonymousElement {
    fn children(&self) -> Vec<&Self> {
        match self {
            Self::Logical { operands, .. } | Self::OneOf(operands) => operands.iter().collect(),
            Self::Restriction(Restriction {
                filler: Some(filler), ..
            }) if !filler.is_simple() => vec![filler.as_ref()],
            _ => Vec::new(),
        }
    }

    const fn is_simple(&self) -> bool {
        matches!(self, Self::Class(_) | Self::Individual(_) | Self::LiteralType(_))
    }

    fn label(&self, registry: &HandleRegistry) -> String {
        match self {
            Self::Logical { op, .. } => match op {
                LogicalOp::And => "and".to_string(),
                LogicalOp::Or => "or".to_string(),
                LogicalOp::Not => "not".to_string(),
            },
            Self::OneOf(_) => "oneOf".to_string(),
            Self::Class(h) | Self::Individual(h) => registry.display(*h),
            Self::LiteralType(tag) => tag.clone(),
            Self::Restriction(r) => {
                let mut text = format!("{} {}", registry.display(r.property.handle()), r.kind.as_str());
                if r.count != 0 {
                    let _ = write!(text, " {}", r.count);
                }
                if let Some(filler) = r.filler.as_deref().filter(|f| f.is_simple()) {
                    let _ = write!(text, " {}", filler.label(registry));
                }
                text
            }
        }
    }
}

/// If `token` names a literal type, its tag.
#[must_use]
pub fn literal_type(token: &str) -> Option<&str> {
    if token.starts_with(W3C_PREFIX) {
        token.rsplit('#').next()
    } else {
        token.strip_prefix(XSD_PREFIX)
    }
}

/// Mutable access to the graphs an expression creates entities in.
pub struct AnonymousScope<'a> {
    /// Classes.
    pub classes: &'a mut ClassGraph,
    /// Object properties.
    pub object_properties: &'a mut ObjectPropertyGraph,
    /// Data properties.
    pub data_properties: &'a mut DataPropertyGraph,
    /// Individuals.
    pub individuals: &'a mut IndividualGraph,
}

impl AnonymousScope<'_> {
    fn materialize(&mut self, expression: &Expression, in_one_of: bool) -> AnonymousElement {
        match expression {
            Expression::And(items) => self.logical(LogicalOp::And, items),
            Expression::Or(items) => self.logical(LogicalOp::Or, items),
            Expression::Not(inner) => AnonymousElement::Logical {
                op: LogicalOp::Not,
                operands: vec![self.materialize(inner, false)],
            },
            Expression::OneOf(items) => {
                AnonymousElement::OneOf(items.iter().map(|i| self.materialize(i, true)).collect())
            }
            Expression::Leaf(tokens) => self.leaf(tokens, in_one_of),
            Expression::Restriction { tokens, filler } => {
                let filler = self.materialize(filler, false);
                let (kind, count) = kind_and_count(&tokens[1], tokens.get(2).map(String::as_str));
                let property = if matches!(filler, AnonymousElement::LiteralType(_)) {
                    RestrictedProperty::Data(self.data_properties.find_or_create(&tokens[0]))
                } else {
                    RestrictedProperty::Object(self.object_properties.find_or_create(&tokens[0]))
                };
                AnonymousElement::Restriction(Restriction {
                    property,
                    kind,
                    count,
                    filler: Some(Box::new(filler)),
                })
            }
        }
    }

    fn logical(&mut self, op: LogicalOp, items: &[Expression]) -> AnonymousElement {
        AnonymousElement::Logical {
            op,
            operands: items.iter().map(|i| self.materialize(i, false)).collect(),
        }
    }

    fn leaf(&mut self, tokens: &[String], in_one_of: bool) -> AnonymousElement {
        if let [name] = tokens {
            return match literal_type(name) {
                Some(tag) => AnonymousElement::LiteralType(tag.to_string()),
                None if in_one_of => AnonymousElement::Individual(self.individuals.find_or_create(name)),
                None => AnonymousElement::Class(self.classes.find_or_create(name)),
            };
        }
        let property = &tokens[0];
        if tokens[1] == "value" {
            return AnonymousElement::Restriction(Restriction {
                property: RestrictedProperty::Object(self.object_properties.find_or_create(property)),
                kind: CardinalityKind::Value,
                count: 0,
                filler: Some(Box::new(AnonymousElement::Individual(
                    self.individuals.find_or_create(&tokens[2]),
                ))),
            });
        }
        let count = (tokens.len() == 4).then(|| tokens[2].as_str());
        let (kind, count) = kind_and_count(&tokens[1], count);
        let target = &tokens[tokens.len() - 1];
        let (property, filler) = match literal_type(target) {
            Some(tag) => (
                RestrictedProperty::Data(self.data_properties.find_or_create(property)),
                AnonymousElement::LiteralType(tag.to_string()),
            ),
            None => (
                RestrictedProperty::Object(self.object_properties.find_or_create(property)),
                AnonymousElement::Class(self.classes.find_or_create(target)),
            ),
        };
        AnonymousElement::Restriction(Restriction {
            property,
            kind,
            count,
            filler: Some(Box::new(filler)),
        })
    }
}

fn kind_and_count(kind: &str, count: Option<&str>) -> (CardinalityKind, u32) {
    let kind = CardinalityKind::parse(kind);
    match count.map(str::parse::<u32>) {
        None => (kind, 0),
        Some(Ok(count)) => (kind, count),
        Some(Err(_)) => (CardinalityKind::Error, 0),
    }
}

/// One anonymous class.
#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousBranch {
    /// `ano{N}` identifier.
    pub id: String,
    /// Named class this expression is equivalent to.
    pub equivalent_to: Handle,
    /// Expression as given, kept for snapshots.
    pub expression: Expression,
    /// Materialized tree.
    pub root: AnonymousElement,
}

/// Every anonymous class of one ontology.
#[derive(Debug, Clone, Default)]
pub struct AnonymousClassGraph {
    branches: BTreeMap<String, AnonymousBranch>,
    next_id: u64,
}

impl AnonymousClassGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `expression` as the equivalent of `class_name`,
    /// creating every entity it mentions. An existing equivalent of the
    /// class is replaced.
    pub fn add(
        &mut self,
        scope: &mut AnonymousScope<'_>,
        class_name: &str,
        expression: &Expression,
    ) -> Result<String, GraphError> {
        expression.validate()?;
        let class = scope.classes.find_or_create(class_name);
        let root = scope.materialize(expression, false);

        let id = format!("ano{}", self.next_id);
        self.next_id += 1;
        if let Some(branch) = scope.classes.get_mut(class) {
            if let Some(previous) = branch.anonymous.replace(id.clone()) {
                self.branches.remove(&previous);
            }
        }
        self.branches.insert(
            id.clone(),
            AnonymousBranch {
                id: id.clone(),
                equivalent_to: class,
                expression: expression.clone(),
                root,
            },
        );
        Ok(id)
    }

    /// Anonymous class by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AnonymousBranch> {
        self.branches.get(id)
    }

    /// The anonymous equivalent of `class`, if any.
    #[must_use]
    pub fn for_class(&self, class: Handle) -> Option<&AnonymousBranch> {
        self.branches.values().find(|b| b.equivalent_to == class)
    }

    /// Removes the anonymous equivalent of `class` and unlinks it.
    pub fn remove_for_class(&mut self, classes: &mut ClassGraph, class: Handle) -> Option<AnonymousBranch> {
        let id = self.for_class(class)?.id.clone();
        if let Some(branch) = classes.get_mut(class) {
            branch.anonymous = None;
        }
        self.branches.remove(&id)
    }

    /// Every anonymous class, ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &AnonymousBranch> {
        self.branches.values()
    }

    /// Number of anonymous classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// True if there are none.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Renders the tree of `id` as indented text.
    #[must_use]
    pub fn describe(&self, id: &str, registry: &HandleRegistry) -> Option<String> {
        let branch = self.branches.get(id)?;
        let mut out = format!("{} = {}\n", registry.display(branch.equivalent_to), branch.root.label(registry));
        describe_children(&branch.root, registry, "", &mut out);
        Some(out)
    }
}

fn describe_children(element: &AnonymousElement, registry: &HandleRegistry, prefix: &str, out: &mut String) {
    let children = element.children();
    let last = children.len().saturating_sub(1);
    for (index, child) in children.into_iter().enumerate() {
        let (branch, indent) = if index == last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        let _ = writeln!(out, "{prefix}{branch}{}", child.label(registry));
        describe_children(child, registry, &format!("{prefix}{indent}"), out);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::tree::Branch;

    struct Graphs {
        classes: ClassGraph,
        objects: ObjectPropertyGraph,
        data: DataPropertyGraph,
        individuals: IndividualGraph,
        registry: Arc<HandleRegistry>,
    }

    impl Graphs {
        fn new() -> Self {
            let registry = Arc::new(HandleRegistry::new());
            Self {
                classes: ClassGraph::new(Arc::clone(&registry)),
                objects: ObjectPropertyGraph::new(Arc::clone(&registry)),
                data: DataPropertyGraph::new(Arc::clone(&registry)),
                individuals: IndividualGraph::new(Arc::clone(&registry)),
                registry,
            }
        }

        fn scope(&mut self) -> AnonymousScope<'_> {
            AnonymousScope {
                classes: &mut self.classes,
                object_properties: &mut self.objects,
                data_properties: &mut self.data,
                individuals: &mut self.individuals,
            }
        }
    }

    #[test]
    fn leaves_resolve_by_context() {
        let mut graphs = Graphs::new();
        let mut anonymous = AnonymousClassGraph::new();
        let expression = Expression::And(vec![
            Expression::leaf(["Vehicle"]),
            Expression::leaf(["hasWheel", "min", "4", "Wheel"]),
            Expression::leaf(["hasWeight", "some", "http://www.w3.org/2001/XMLSchema#double"]),
            Expression::OneOf(vec![Expression::leaf(["herbie"])]),
        ]);
        let id = anonymous.add(&mut graphs.scope(), "Car", &expression).unwrap();
        assert_eq!(id, "ano0");

        assert!(graphs.individuals.find("herbie").is_some());
        assert!(graphs.classes.find("Wheel").is_some());
        assert!(graphs.data.find("hasWeight").is_some());
        assert!(graphs.objects.find("hasWheel").is_some());
        let car = graphs.classes.find("Car").unwrap();
        assert_eq!(graphs.classes.get(car).unwrap().anonymous.as_deref(), Some("ano0"));

        let AnonymousElement::Logical { operands, .. } = &anonymous.get(&id).unwrap().root else {
            panic!("expected a logical root");
        };
        assert!(matches!(
            &operands[1],
            AnonymousElement::Restriction(Restriction { kind: CardinalityKind::Min, count: 4, .. })
        ));
        assert!(matches!(
            &operands[2],
            AnonymousElement::Restriction(Restriction {
                property: RestrictedProperty::Data(_),
                ..
            })
        ));

        let text = anonymous.describe(&id, &graphs.registry).unwrap();
        assert!(text.starts_with("Car = and"));
        assert!(text.contains("hasWheel min 4 Wheel"));
    }

    #[test]
    fn unknown_kinds_are_kept_as_errors() {
        let mut graphs = Graphs::new();
        let mut anonymous = AnonymousClassGraph::new();
        let id = anonymous
            .add(&mut graphs.scope(), "Odd", &Expression::leaf(["p", "several", "Thing"]))
            .unwrap();
        assert!(matches!(
            anonymous.get(&id).unwrap().root,
            AnonymousElement::Restriction(Restriction {
                kind: CardinalityKind::Error,
                ..
            })
        ));
    }

    #[test]
    fn redeclaring_replaces_the_equivalent() {
        let mut graphs = Graphs::new();
        let mut anonymous = AnonymousClassGraph::new();
        anonymous.add(&mut graphs.scope(), "A", &Expression::leaf(["B"])).unwrap();
        let second = anonymous.add(&mut graphs.scope(), "A", &Expression::leaf(["C"])).unwrap();
        assert_eq!(anonymous.len(), 1);
        let a = graphs.classes.find("A").unwrap();
        assert_eq!(anonymous.for_class(a).unwrap().id, second);
        assert!(anonymous.remove_for_class(&mut graphs.classes, a).is_some());
        assert!(graphs.classes.get(a).unwrap().anonymous.is_none());
        assert!(graphs.classes.get(a).unwrap().meta().dictionary.spoken.is_empty());
    }

    #[test]
    fn empty_leaves_are_rejected() {
        let mut graphs = Graphs::new();
        let mut anonymous = AnonymousClassGraph::new();
        let err = anonymous
            .add(&mut graphs.scope(), "A", &Expression::Leaf(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, GraphError::MalformedExpression { .. }));
        assert!(graphs.classes.find("A").is_none());
    }
}
