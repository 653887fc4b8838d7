//! Data carried by every branch: identity, dirty tracking, flags, labels,
//! and the edge and relation records stored inside branches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::handle::Handle;

/// Multilingual labels of one entity.
///
/// Spoken labels are the ones meant to be said; muted labels only help
/// recognition (lower-case forms, split identifiers, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Spoken labels, per language.
    pub spoken: BTreeMap<String, Vec<String>>,
    /// Muted labels, per language.
    pub muted: BTreeMap<String, Vec<String>>,
}

impl Dictionary {
    /// Adds a spoken label. Returns false if it was already present.
    pub fn add_spoken(&mut self, lang: &str, label: &str) -> bool {
        push_unique(self.spoken.entry(lang.to_string()).or_default(), label)
    }

    /// Adds a muted label. Returns false if it was already present.
    pub fn add_muted(&mut self, lang: &str, label: &str) -> bool {
        push_unique(self.muted.entry(lang.to_string()).or_default(), label)
    }

    /// Removes a label from both dictionaries.
    pub fn remove(&mut self, lang: &str, label: &str) -> bool {
        let mut removed = false;
        for map in [&mut self.spoken, &mut self.muted] {
            if let Some(labels) = map.get_mut(lang) {
                let before = labels.len();
                labels.retain(|l| l != label);
                removed |= labels.len() != before;
                if labels.is_empty() {
                    map.remove(lang);
                }
            }
        }
        removed
    }

    /// Spoken labels in `lang`.
    #[must_use]
    pub fn spoken(&self, lang: &str) -> &[String] {
        self.spoken.get(lang).map_or(&[], Vec::as_slice)
    }

    /// Muted labels in `lang`.
    #[must_use]
    pub fn muted(&self, lang: &str) -> &[String] {
        self.muted.get(lang).map_or(&[], Vec::as_slice)
    }

    /// Spoken then muted labels in `lang`.
    pub fn every(&self, lang: &str) -> impl Iterator<Item = &String> {
        self.spoken(lang).iter().chain(self.muted(lang))
    }
}

fn push_unique(labels: &mut Vec<String>, label: &str) -> bool {
    if labels.iter().any(|l| l == label) {
        false
    } else {
        labels.push(label.to_string());
        true
    }
}

/// Fields common to every branch.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMeta {
    /// Identifier.
    pub name: String,
    /// Handle issued by the ontology registry.
    pub handle: Handle,
    /// Dirty flag, cleared by whoever consumes updates.
    pub updated: bool,
    /// Number of mutations since creation.
    pub update_count: u64,
    /// Free-form flags such as unresolved "domain" / "range" properties.
    pub flags: BTreeMap<String, Vec<String>>,
    /// Labels.
    pub dictionary: Dictionary,
}

impl BranchMeta {
    /// Fresh metadata for a newly created branch.
    pub fn new(name: impl Into<String>, handle: Handle) -> Self {
        Self {
            name: name.into(),
            handle,
            updated: true,
            update_count: 0,
            flags: BTreeMap::new(),
            dictionary: Dictionary::default(),
        }
    }

    /// Marks the branch dirty and bumps the update counter.
    pub fn mark_updated(&mut self) {
        self.updated = true;
        self.update_count += 1;
    }

    /// Records `value` under `key`, without duplicates.
    pub fn set_flag(&mut self, key: &str, value: &str) {
        push_unique(self.flags.entry(key.to_string()).or_default(), value);
    }

    /// Removes `value` from `key`; drops the key once empty.
    pub fn clear_flag(&mut self, key: &str, value: &str) {
        if let Some(values) = self.flags.get_mut(key) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.flags.remove(key);
            }
        }
    }

    /// Values recorded under `key`.
    #[must_use]
    pub fn flag(&self, key: &str) -> &[String] {
        self.flags.get(key).map_or(&[], Vec::as_slice)
    }
}

/// A weighted edge to another branch (is-a, mother).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Target branch.
    pub target: Handle,
    /// Confidence weight.
    pub weight: f64,
    /// True when produced by a reasoner.
    pub inferred: bool,
}

impl Link {
    /// A directly asserted edge.
    #[must_use]
    pub const fn asserted(target: Handle, weight: f64) -> Self {
        Self {
            target,
            weight,
            inferred: false,
        }
    }
}

/// A (subject, property, object) triple of handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    /// Subject.
    pub subject: Handle,
    /// Property.
    pub property: Handle,
    /// Object (entity or literal).
    pub object: Handle,
}

impl Triple {
    /// Builds a triple.
    #[must_use]
    pub const fn new(subject: Handle, property: Handle, object: Handle) -> Self {
        Self {
            subject,
            property,
            object,
        }
    }

    /// The same triple with subject and object swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self::new(self.object, self.property, self.subject)
    }
}

/// One entry of a relation list.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Property used.
    pub property: Handle,
    /// Target entity or literal.
    pub target: Handle,
    /// Confidence weight.
    pub weight: f64,
    /// True when derived rather than asserted.
    pub inferred: bool,
    /// Triples this relation caused to exist.
    pub induced: Vec<Triple>,
}

/// Inserts or updates a relation in place.
///
/// Returns the index of the entry and whether it was newly created. An
/// inferred re-assertion never turns a direct relation into an inferred one.
pub(crate) fn upsert_relation(
    relations: &mut Vec<Relation>,
    property: Handle,
    target: Handle,
    weight: f64,
    inferred: bool,
) -> (usize, bool) {
    if let Some(index) = relations
        .iter()
        .position(|r| r.property == property && r.target == target)
    {
        let existing = &mut relations[index];
        existing.weight = weight;
        existing.inferred = existing.inferred && inferred;
        return (index, false);
    }
    relations.push(Relation {
        property,
        target,
        weight,
        inferred,
        induced: Vec::new(),
    });
    (relations.len() - 1, true)
}

pub(crate) fn push_handle(list: &mut Vec<Handle>, handle: Handle) -> bool {
    if list.contains(&handle) {
        false
    } else {
        list.push(handle);
        true
    }
}

pub(crate) fn remove_handle(list: &mut Vec<Handle>, handle: Handle) -> bool {
    let before = list.len();
    list.retain(|h| *h != handle);
    list.len() != before
}
