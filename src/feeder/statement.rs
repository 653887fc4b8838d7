//! Update statement grammar.
//!
//! `[op]subject|predicate|object[|weight]` with `op` one of `add`, `del`,
//! `upd`. The predicate selects the action: `=` same-as, `!=` distinct,
//! `isA` inheritance, `@lang` label, `inverseOf` inverse properties, any
//! other name a relation. `[add]s|` creates an individual, `[del]s|`
//! deletes an entity, and `_` as object of a `[del]` relation matches any
//! target.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::{OntoError, OntoResult, StatementError};

static STATEMENT: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn statement_regex() -> OntoResult<&'static Regex> {
    STATEMENT
        .get_or_init(|| Regex::new(r"^\[(?P<op>[A-Za-z]*)\](?P<body>.*)$"))
        .as_ref()
        .map_err(|e| OntoError::internal(format!("statement pattern: {e}")))
}

/// Statement operation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `[add]`
    Add,
    /// `[del]`
    Delete,
    /// `[upd]`
    Update,
}

impl Operation {
    /// Tag as written in statements.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "del",
            Self::Update => "upd",
        }
    }

    fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "del" => Some(Self::Delete),
            "upd" => Some(Self::Update),
            _ => None,
        }
    }
}

/// What a statement does to its subject.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// `s|`: the subject itself.
    Entity,
    /// `s|=|o`
    SameAs(String),
    /// `s|!=|o`
    Distinct(String),
    /// `s|isA|C`
    IsA(String),
    /// `s|@lang|text`
    Label {
        /// Language tag.
        lang: String,
        /// Label text.
        text: String,
    },
    /// `p|inverseOf|q`
    InverseOf(String),
    /// `s|p|o`, `s|p|type#value` or `s|p|_`.
    Relation {
        /// Property name.
        property: String,
        /// Target; `None` for the `_` wildcard.
        object: Option<String>,
    },
}

/// A parsed update statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Operation tag.
    pub op: Operation,
    /// Subject identifier.
    pub subject: String,
    /// Action on the subject.
    pub action: Action,
    /// Optional trailing weight.
    pub weight: Option<f64>,
    /// When the statement was issued.
    pub stamp: DateTime<Utc>,
}

fn field<'a>(fields: &[&'a str], index: usize, statement: &str, name: &'static str) -> Result<&'a str, StatementError> {
    fields
        .get(index)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .ok_or_else(|| StatementError::MissingField {
            statement: statement.to_string(),
            field: name,
        })
}

impl Statement {
    /// Parses `text`, stamped now.
    pub fn parse(text: &str) -> OntoResult<Self> {
        Self::parse_at(text, Utc::now())
    }

    /// Parses `text` with an explicit stamp.
    pub fn parse_at(text: &str, stamp: DateTime<Utc>) -> OntoResult<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StatementError::Empty.into());
        }
        let captures = statement_regex()?.captures(text).ok_or_else(|| StatementError::MissingField {
            statement: text.to_string(),
            field: "operation",
        })?;
        let tag = captures.name("op").map_or("", |m| m.as_str());
        let op = Operation::parse(tag).ok_or_else(|| StatementError::UnknownOperation {
            op: tag.to_string(),
            statement: text.to_string(),
        })?;
        let body = captures.name("body").map_or("", |m| m.as_str());
        let fields: Vec<&str> = body.split('|').collect();
        let subject = field(&fields, 0, text, "subject")?.to_string();

        let predicate = fields.get(1).map_or("", |p| p.trim());
        if predicate.is_empty() {
            if op == Operation::Update {
                return Err(StatementError::UnsupportedPredicate {
                    predicate: String::new(),
                    op: op.tag(),
                }
                .into());
            }
            return Ok(Self {
                op,
                subject,
                action: Action::Entity,
                weight: None,
                stamp,
            });
        }

        let object = field(&fields, 2, text, "object")?.to_string();
        let weight = match fields.get(3).map(|w| w.trim()).filter(|w| !w.is_empty()) {
            None => None,
            Some(raw) => Some(
                raw.parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite())
                    .ok_or_else(|| StatementError::InvalidWeight {
                        weight: raw.to_string(),
                        statement: text.to_string(),
                    })?,
            ),
        };

        let action = match predicate {
            "=" => Action::SameAs(object),
            "!=" => Action::Distinct(object),
            "isA" => Action::IsA(object),
            "inverseOf" => Action::InverseOf(object),
            lang if lang.starts_with('@') && lang.len() > 1 => Action::Label {
                lang: lang[1..].to_string(),
                text: object,
            },
            property => Action::Relation {
                property: property.to_string(),
                object: (object != "_").then_some(object),
            },
        };

        let relation_only = matches!(&action, Action::Relation { object: Some(_), .. });
        let wildcard = matches!(&action, Action::Relation { object: None, .. });
        if (op == Operation::Update && !relation_only) || (wildcard && op != Operation::Delete) {
            return Err(StatementError::UnsupportedPredicate {
                predicate: predicate.to_string(),
                op: op.tag(),
            }
            .into());
        }

        Ok(Self {
            op,
            subject,
            action,
            weight,
            stamp,
        })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]{}|", self.op.tag(), self.subject)?;
        match &self.action {
            Action::Entity => return Ok(()),
            Action::SameAs(o) => write!(f, "=|{o}")?,
            Action::Distinct(o) => write!(f, "!=|{o}")?,
            Action::IsA(o) => write!(f, "isA|{o}")?,
            Action::Label { lang, text } => write!(f, "@{lang}|{text}")?,
            Action::InverseOf(o) => write!(f, "inverseOf|{o}")?,
            Action::Relation { property, object } => {
                write!(f, "{property}|{}", object.as_deref().unwrap_or("_"))?;
            }
        }
        if let Some(weight) = self.weight {
            write!(f, "|{weight}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement_error(text: &str) -> StatementError {
        match Statement::parse(text) {
            Err(OntoError::Statement(err)) => err,
            other => panic!("expected a statement error, got {other:?}"),
        }
    }

    #[test]
    fn test_parses_every_predicate_form() {
        let s = Statement::parse("[add]bob|=|robert").unwrap();
        assert_eq!(s.action, Action::SameAs("robert".to_string()));
        let s = Statement::parse("[del]bob|!=|alice").unwrap();
        assert_eq!((s.op, s.action), (Operation::Delete, Action::Distinct("alice".to_string())));
        let s = Statement::parse("[add]rex|isA|Dog").unwrap();
        assert_eq!(s.action, Action::IsA("Dog".to_string()));
        let s = Statement::parse("[add]Dog|@fr|chien").unwrap();
        assert_eq!(
            s.action,
            Action::Label {
                lang: "fr".to_string(),
                text: "chien".to_string()
            }
        );
        let s = Statement::parse("[add]partOf|inverseOf|hasPart").unwrap();
        assert_eq!(s.action, Action::InverseOf("hasPart".to_string()));
        let s = Statement::parse("[add]myself|").unwrap();
        assert_eq!(s.action, Action::Entity);
    }

    #[test]
    fn test_relation_weight_and_wildcard() {
        let s = Statement::parse("[add]alice|hasAge|integer#41|0.5").unwrap();
        assert_eq!(s.weight, Some(0.5));
        assert_eq!(s.to_string(), "[add]alice|hasAge|integer#41|0.5");
        let s = Statement::parse("[del]alice|hasChild|_").unwrap();
        assert_eq!(
            s.action,
            Action::Relation {
                property: "hasChild".to_string(),
                object: None
            }
        );
    }

    #[test]
    fn test_malformed_statements_are_classified() {
        assert_eq!(statement_error("   "), StatementError::Empty);
        assert!(matches!(statement_error("[mov]a|b|c"), StatementError::UnknownOperation { .. }));
        assert!(matches!(statement_error("a|b|c"), StatementError::MissingField { field: "operation", .. }));
        assert!(matches!(statement_error("[add]a|b|"), StatementError::MissingField { field: "object", .. }));
        assert!(matches!(statement_error("[add]a|b|c|heavy"), StatementError::InvalidWeight { .. }));
        assert!(matches!(statement_error("[add]a|b|_"), StatementError::UnsupportedPredicate { .. }));
        assert!(matches!(statement_error("[upd]a|isA|B"), StatementError::UnsupportedPredicate { .. }));
    }
}
