//! Capability checker diagnostics.
//!
//! Every kind belongs to one presentation category; see `category`.

use thiserror::Error;

use crate::core::capability::model::Capability;
use crate::core::diag::{Span, SpannedError};
use crate::core::diagnostics::DiagnosticCategory;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityErrorKind {
    #[error("{kind} '{name}' cannot suppress '{cap}'; {kind} types always carry it")]
    ClassCannotSuppress {
        kind: &'static str,
        name: String,
        cap: Capability,
    },

    #[error("cannot suppress '{cap}' in an extension of '{name}'")]
    InverseInExtension { name: String, cap: Capability },

    #[error("type '{0}' cannot be suppressed with '~'")]
    NotSuppressible(String),

    #[error("cannot suppress '{cap}' on '{subject}': not a generic parameter of this declaration")]
    InverseNotOnLocalParam { subject: String, cap: Capability },

    #[error("'{subject}' is required to be '{cap}' by {origin} but is marked '~{cap}'")]
    ConflictingRequirement {
        subject: String,
        cap: Capability,
        origin: String,
    },

    #[error(
        "same-type requirement makes '{suppressed}' (marked '~{cap}') equal to '{other}', which requires '{cap}'"
    )]
    SameTypeConflict {
        suppressed: String,
        other: String,
        cap: Capability,
    },

    #[error(
        "same-type requirement binds '{subject}', which requires '{cap}', to non-{cap} type '{ty}'"
    )]
    SameTypeConcreteConflict {
        subject: String,
        ty: String,
        cap: Capability,
    },

    #[error(
        "type '{ty}' does not conform to '{cap}' required by generic parameter '{param}' of {owner_kind} '{owner}'"
    )]
    SubstitutionViolation {
        ty: String,
        param: String,
        owner: String,
        owner_kind: &'static str,
        cap: Capability,
    },

    #[error("composition '{ty}' suppresses '{cap}' but another member requires it")]
    ConflictingComposition { ty: String, cap: Capability },

    #[error("'{0}' can only appear in a constraint")]
    InverseOutsideConstraint(String),

    #[error(
        "parameter '{param}' of non-Copyable type '{ty}' must specify ownership ('borrowing', 'consuming' or 'inout')"
    )]
    MissingOwnershipSpecifier { param: String, ty: String },

    #[error(
        "{member_kind} '{member}' of '{cap}'-conforming {aggregate_kind} '{aggregate}' has non-{cap} type '{ty}'"
    )]
    NoncopyableMember {
        member_kind: &'static str,
        member: String,
        aggregate_kind: &'static str,
        aggregate: String,
        ty: String,
        cap: Capability,
    },

    #[error(
        "{member_kind} '{member}' of '{aggregate}' is non-{cap} through '{cause}', which the conditional '{cap}' conformance does not depend on"
    )]
    MemberNotCoveredByCondition {
        member_kind: &'static str,
        member: String,
        aggregate: String,
        cause: String,
        cap: Capability,
    },

    #[error("conditional conformance of '{aggregate}' to '{cap}' cannot depend on '{requirement}'")]
    ConditionalRequirementNotCapability {
        aggregate: String,
        requirement: String,
        cap: Capability,
    },

    #[error("deinitializer cannot be declared in {kind} '{aggregate}' that conforms to 'Copyable'")]
    DeinitOnCopyable {
        kind: &'static str,
        aggregate: String,
    },
}

pub type CapabilityError = SpannedError<CapabilityErrorKind>;
pub use CapabilityErrorKind as CEK;

impl CapabilityErrorKind {
    pub fn at(self, span: Span) -> CapabilityError {
        CapabilityError::new(self, span)
    }

    pub fn category(&self) -> DiagnosticCategory {
        match self {
            CEK::SubstitutionViolation { .. } => DiagnosticCategory::SubstitutionViolation,
            CEK::InverseOutsideConstraint(_) => DiagnosticCategory::UnsupportedSyntax,
            _ => DiagnosticCategory::StructuralConflict,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CEK::ClassCannotSuppress { .. } => "TF-CAP-CLASS-SUPPRESS",
            CEK::InverseInExtension { .. } => "TF-CAP-EXT-INVERSE",
            CEK::NotSuppressible(_) => "TF-CAP-NOT-SUPPRESSIBLE",
            CEK::InverseNotOnLocalParam { .. } => "TF-CAP-NONLOCAL-INVERSE",
            CEK::ConflictingRequirement { .. } => "TF-CAP-CONFLICT",
            CEK::SameTypeConflict { .. } => "TF-CAP-SAME-TYPE",
            CEK::SameTypeConcreteConflict { .. } => "TF-CAP-SAME-TYPE-CONCRETE",
            CEK::SubstitutionViolation { .. } => "TF-CAP-SUBST",
            CEK::ConflictingComposition { .. } => "TF-CAP-COMPOSITION",
            CEK::InverseOutsideConstraint(_) => "TF-CAP-BARE-INVERSE",
            CEK::MissingOwnershipSpecifier { .. } => "TF-CAP-OWNERSHIP",
            CEK::NoncopyableMember { .. } => "TF-CAP-MEMBER",
            CEK::MemberNotCoveredByCondition { .. } => "TF-CAP-MEMBER-CONDITION",
            CEK::ConditionalRequirementNotCapability { .. } => "TF-CAP-CONDITION-REQ",
            CEK::DeinitOnCopyable { .. } => "TF-CAP-DEINIT",
        }
    }
}
