use thiserror::Error;

use crate::core::diag::{Span, SpannedError};
use crate::core::tree::{Slot, SyntaxKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildErrorKind {
    #[error("unexpected token '{0}' in type")]
    UnexpectedToken(String),

    #[error("unknown type attribute '@{0}'")]
    UnknownTypeAttribute(String),

    #[error("type attribute '@{0}' is not supported here yet")]
    UnsupportedTypeAttribute(String),

    #[error("malformed {0:?}: missing {1:?}")]
    MissingChild(SyntaxKind, Slot),
}

pub type BuildError = SpannedError<BuildErrorKind>;

impl BuildErrorKind {
    pub fn at(self, span: Span) -> BuildError {
        BuildError::new(self, span)
    }
}
