//! JSON snapshots of an ontology.
//!
//! A snapshot file is one `blake3:<hex>` digest line followed by the pretty
//! JSON body the digest covers. Only asserted knowledge is stored; derived
//! relations and memberships come back when the declarations are replayed.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{OntoError, OntoResult, PersistenceError};
use crate::graph::Expression;
use crate::ontology::{
    ClassDeclaration, DataPropertyDeclaration, IndividualDeclaration, ObjectPropertyDeclaration, Ontology,
};

const DIGEST_PREFIX: &str = "blake3:";
const FORMAT_VERSION: u32 = 1;

/// Anonymous equivalent of a named class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymousDeclaration {
    /// Named class the expression is equivalent to.
    pub class: String,
    /// The expression.
    pub expression: Expression,
}

/// Everything needed to rebuild an ontology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Label language at capture time.
    pub language: String,
    /// Classes.
    pub classes: Vec<ClassDeclaration>,
    /// Object properties.
    pub object_properties: Vec<ObjectPropertyDeclaration>,
    /// Data properties.
    pub data_properties: Vec<DataPropertyDeclaration>,
    /// Individuals.
    pub individuals: Vec<IndividualDeclaration>,
    /// Anonymous classes.
    pub anonymous: Vec<AnonymousDeclaration>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            language: "en".to_string(),
            classes: Vec::new(),
            object_properties: Vec::new(),
            data_properties: Vec::new(),
            individuals: Vec::new(),
            anonymous: Vec::new(),
        }
    }
}

impl Snapshot {
    /// Captures the asserted content of `ontology`.
    #[must_use]
    pub fn capture(ontology: &Ontology) -> Self {
        Self {
            version: FORMAT_VERSION,
            language: ontology.language(),
            classes: ontology.class_declarations(),
            object_properties: ontology.object_property_declarations(),
            data_properties: ontology.data_property_declarations(),
            individuals: ontology.individual_declarations(),
            anonymous: ontology
                .anonymous_declarations()
                .into_iter()
                .map(|(class, expression)| AnonymousDeclaration { class, expression })
                .collect(),
        }
    }

    /// Replays the snapshot into `ontology`: properties, then classes, then
    /// individuals as one batch, then anonymous classes.
    pub fn apply(&self, ontology: &Ontology) -> OntoResult<()> {
        for declaration in &self.data_properties {
            ontology.declare_data_property(declaration)?;
        }
        for declaration in &self.object_properties {
            ontology.declare_object_property(declaration)?;
        }
        for declaration in &self.classes {
            ontology.declare_class(declaration)?;
        }
        ontology.declare_individuals(&self.individuals)?;
        for declaration in &self.anonymous {
            ontology.declare_anonymous(&declaration.class, &declaration.expression)?;
        }
        Ok(())
    }

    /// Digest line plus pretty JSON.
    pub fn to_text(&self) -> OntoResult<String> {
        let body = serde_json::to_string_pretty(self).map_err(PersistenceError::from)?;
        let digest = blake3::hash(body.as_bytes());
        Ok(format!("{DIGEST_PREFIX}{}\n{body}", digest.to_hex()))
    }

    /// Parses and verifies text written by [`to_text`](Self::to_text).
    /// `path` only labels errors.
    pub fn from_text(text: &str, path: &str) -> OntoResult<Self> {
        let corrupted = || -> OntoError {
            PersistenceError::Corrupted {
                path: path.to_string(),
            }
            .into()
        };
        let (header, body) = text.split_once('\n').ok_or_else(corrupted)?;
        let expected = header.trim().strip_prefix(DIGEST_PREFIX).ok_or_else(corrupted)?;
        if blake3::hash(body.as_bytes()).to_hex().as_str() != expected {
            return Err(corrupted());
        }
        Ok(serde_json::from_str(body).map_err(PersistenceError::from)?)
    }
}

/// Outcome of loading a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Loaded into the ontology.
    Loaded,
    /// No file at that path.
    NotFound,
    /// The digest did not match.
    Corrupted,
    /// Unreadable, not a snapshot, or rejected while replaying.
    Invalid,
    /// The URI scheme is not `file://`.
    UnsupportedUri,
}

impl ReadStatus {
    /// Integer status: 0 when loaded, negative otherwise.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Loaded => 0,
            Self::NotFound => -1,
            Self::Corrupted => -2,
            Self::Invalid => -3,
            Self::UnsupportedUri => -4,
        }
    }

    /// True when loaded.
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded)
    }
}

fn io_error(path: &Path, source: io::Error) -> OntoError {
    PersistenceError::Io {
        path: path.display().to_string(),
        source,
    }
    .into()
}

impl Ontology {
    /// Writes a snapshot to `path`, replacing it atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> OntoResult<()> {
        let path = path.as_ref();
        let snapshot = Snapshot::capture(self);
        let text = snapshot.to_text()?;
        let temp = path.with_extension("tmp");
        let mut file = File::create(&temp).map_err(|e| io_error(&temp, e))?;
        file.write_all(text.as_bytes()).map_err(|e| io_error(&temp, e))?;
        file.sync_all().map_err(|e| io_error(&temp, e))?;
        fs::rename(&temp, path).map_err(|e| io_error(path, e))?;
        info!(
            path = %path.display(),
            individuals = snapshot.individuals.len(),
            classes = snapshot.classes.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Loads the snapshot at `path` into this ontology.
    pub fn read_from_file(&self, path: impl AsRef<Path>) -> ReadStatus {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return ReadStatus::NotFound,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "snapshot unreadable");
                return ReadStatus::Invalid;
            }
        };
        let label = path.display().to_string();
        let loaded = Snapshot::from_text(&text, &label).and_then(|snapshot| {
            snapshot.apply(self)?;
            Ok(snapshot)
        });
        match loaded {
            Ok(snapshot) => {
                info!(
                    path = %label,
                    individuals = snapshot.individuals.len(),
                    classes = snapshot.classes.len(),
                    "snapshot loaded"
                );
                ReadStatus::Loaded
            }
            Err(OntoError::Persistence(PersistenceError::Corrupted { .. })) => {
                warn!(path = %label, "snapshot failed its integrity check");
                ReadStatus::Corrupted
            }
            Err(err) => {
                warn!(path = %label, error = %err, "snapshot rejected");
                ReadStatus::Invalid
            }
        }
    }

    /// Loads a `file://` URI.
    pub fn read_from_uri(&self, uri: &str) -> ReadStatus {
        match uri.strip_prefix("file://") {
            Some(path) => self.read_from_file(path),
            None => {
                let err = PersistenceError::UnsupportedUri { uri: uri.to_string() };
                warn!(error = %err, "snapshot not loaded");
                ReadStatus::UnsupportedUri
            }
        }
    }

    /// Loads `path` if a snapshot exists there. Returns true on success.
    pub fn preload(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        path.exists() && self.read_from_file(path).is_loaded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tampered_body_is_corrupted() {
        let snapshot = Snapshot::default();
        let text = snapshot.to_text().unwrap();
        assert_eq!(Snapshot::from_text(&text, "mem").unwrap(), snapshot);

        let tampered = text.replace("\"en\"", "\"fr\"");
        let err = Snapshot::from_text(&tampered, "mem").unwrap_err();
        assert!(matches!(err, OntoError::Persistence(PersistenceError::Corrupted { .. })));
        assert!(Snapshot::from_text("no header", "mem").is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ReadStatus::Loaded.code(), 0);
        assert!(ReadStatus::NotFound.code() < 0);
        assert_eq!(Ontology::default().read_from_uri("http://example.org/onto").code(), -4);
    }
}
