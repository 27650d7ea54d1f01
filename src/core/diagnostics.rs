//! Unified diagnostic records for the builder and the capability checker.
//!
//! Both error families are normalized into one `DiagnosticRecord` with a
//! stable code, a presentation category and structured metadata. Records are
//! pushed into a `DiagnosticSink`; ordering across declarations is only
//! fixed by `sort_diagnostics`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::capability::{CapabilityError, CapabilityErrorKind};
use crate::core::diag::{FixIt, Note, Span};
use crate::core::repr::{BuildError, BuildErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    StructuralConflict,
    SubstitutionViolation,
    UnsupportedSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticValue {
    String(String),
    Number(u64),
    Bool(bool),
}

pub type DiagnosticMetadata = BTreeMap<String, DiagnosticValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub category: DiagnosticCategory,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub span: Span,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixits: Vec<FixIt>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: DiagnosticMetadata,
}

/// Receiver of diagnostic records; the renderer lives on the other side.
pub trait DiagnosticSink {
    fn emit(&mut self, record: DiagnosticRecord);
}

impl DiagnosticSink for Vec<DiagnosticRecord> {
    fn emit(&mut self, record: DiagnosticRecord) {
        self.push(record);
    }
}

fn string(value: impl Into<String>) -> DiagnosticValue {
    DiagnosticValue::String(value.into())
}

fn insert_note_count(metadata: &mut DiagnosticMetadata, notes: &[Note]) {
    if !notes.is_empty() {
        metadata.insert(
            "note_count".to_string(),
            DiagnosticValue::Number(notes.len() as u64),
        );
    }
}

impl DiagnosticRecord {
    pub fn from_build_error(error: &BuildError, file: Option<&str>) -> Self {
        let mut metadata = DiagnosticMetadata::new();
        let (category, code) = match error.kind() {
            BuildErrorKind::UnexpectedToken(text) => {
                metadata.insert("token".to_string(), string(text.clone()));
                (
                    DiagnosticCategory::UnsupportedSyntax,
                    "TF-BUILD-UNEXPECTED-TOKEN",
                )
            }
            BuildErrorKind::UnknownTypeAttribute(name) => {
                metadata.insert("attribute".to_string(), string(name.clone()));
                (
                    DiagnosticCategory::UnsupportedSyntax,
                    "TF-BUILD-UNKNOWN-ATTRIBUTE",
                )
            }
            BuildErrorKind::UnsupportedTypeAttribute(name) => {
                metadata.insert("attribute".to_string(), string(name.clone()));
                (
                    DiagnosticCategory::UnsupportedSyntax,
                    "TF-BUILD-UNSUPPORTED-ATTRIBUTE",
                )
            }
            BuildErrorKind::MissingChild(kind, slot) => {
                metadata.insert("node".to_string(), string(format!("{kind:?}")));
                metadata.insert("slot".to_string(), string(format!("{slot:?}")));
                (
                    DiagnosticCategory::UnsupportedSyntax,
                    "TF-BUILD-MISSING-CHILD",
                )
            }
        };
        insert_note_count(&mut metadata, error.notes());
        Self {
            category,
            code: code.to_string(),
            file: file.map(str::to_string),
            span: error.span(),
            message: error.to_string(),
            notes: error.notes().to_vec(),
            fixits: error.fixits().to_vec(),
            metadata,
        }
    }

    pub fn from_capability_error(error: &CapabilityError, file: Option<&str>) -> Self {
        let kind = error.kind();
        let mut metadata = DiagnosticMetadata::new();
        match kind {
            CapabilityErrorKind::ClassCannotSuppress { name, cap, .. }
            | CapabilityErrorKind::InverseInExtension { name, cap } => {
                metadata.insert("declaration".to_string(), string(name.clone()));
                metadata.insert("capability".to_string(), string(cap.name()));
            }
            CapabilityErrorKind::ConflictingRequirement {
                subject,
                cap,
                origin,
            } => {
                metadata.insert("subject".to_string(), string(subject.clone()));
                metadata.insert("capability".to_string(), string(cap.name()));
                metadata.insert("origin".to_string(), string(origin.clone()));
            }
            CapabilityErrorKind::SameTypeConflict {
                suppressed,
                other,
                cap,
            } => {
                metadata.insert("suppressed".to_string(), string(suppressed.clone()));
                metadata.insert("other".to_string(), string(other.clone()));
                metadata.insert("capability".to_string(), string(cap.name()));
            }
            CapabilityErrorKind::SubstitutionViolation {
                ty,
                param,
                owner,
                cap,
                ..
            } => {
                metadata.insert("type".to_string(), string(ty.clone()));
                metadata.insert("param".to_string(), string(param.clone()));
                metadata.insert("owner".to_string(), string(owner.clone()));
                metadata.insert("capability".to_string(), string(cap.name()));
            }
            CapabilityErrorKind::NoncopyableMember {
                member,
                aggregate,
                cap,
                ..
            }
            | CapabilityErrorKind::MemberNotCoveredByCondition {
                member,
                aggregate,
                cap,
                ..
            } => {
                metadata.insert("member".to_string(), string(member.clone()));
                metadata.insert("aggregate".to_string(), string(aggregate.clone()));
                metadata.insert("capability".to_string(), string(cap.name()));
            }
            _ => {}
        }
        if !error.fixits().is_empty() {
            metadata.insert("has_fixit".to_string(), DiagnosticValue::Bool(true));
        }
        insert_note_count(&mut metadata, error.notes());
        Self {
            category: kind.category(),
            code: kind.code().to_string(),
            file: file.map(str::to_string),
            span: error.span(),
            message: error.to_string(),
            notes: error.notes().to_vec(),
            fixits: error.fixits().to_vec(),
            metadata,
        }
    }
}

/// Presentation order: by file, then primary location. Stable, so records
/// at the same location keep emission order.
pub fn sort_diagnostics(records: &mut [DiagnosticRecord]) {
    records.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.span.start.cmp(&b.span.start))
            .then(a.span.end.cmp(&b.span.end))
    });
}

#[cfg(test)]
#[path = "../tests/diagnostics/t_diagnostics.rs"]
mod tests;
