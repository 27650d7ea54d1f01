//! Declarations as seen by the capability checker.
//!
//! Type positions hold `TypeRepr`s produced by the builder. Inheritance
//! clauses keep capability claims (`Copyable`), inverses (`~Copyable`) and
//! protocol names side by side, exactly as written.

use serde::{Deserialize, Serialize};

use crate::core::diag::Span;
use crate::core::repr::TypeRepr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub file: Option<String>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    #[serde(default)]
    pub name_span: Span,
    pub kind: DeclKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclKind {
    Nominal(NominalDecl),
    Protocol(ProtocolDecl),
    Extension(ExtensionDecl),
    TypeAlias(TypeAliasDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Actor,
}

impl NominalKind {
    pub fn is_class_like(self) -> bool {
        matches!(self, NominalKind::Class | NominalKind::Actor)
    }

    pub fn describe(self) -> &'static str {
        match self {
            NominalKind::Struct => "struct",
            NominalKind::Enum => "enum",
            NominalKind::Class => "class",
            NominalKind::Actor => "actor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    #[serde(default)]
    pub inherited: Vec<TypeRepr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParamList {
    pub params: Vec<GenericParam>,
    /// From `<` through `>`.
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementKind {
    Conformance {
        subject: TypeRepr,
        constraint: TypeRepr,
    },
    SameType {
        first: TypeRepr,
        second: TypeRepr,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub kind: RequirementKind,
    #[serde(default)]
    pub span: Span,
}

/// Generic parameters plus `where` clause of one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericSig {
    #[serde(default)]
    pub params: Option<GenericParamList>,
    #[serde(default)]
    pub where_clause: Vec<Requirement>,
}

impl GenericSig {
    pub fn params(&self) -> &[GenericParam] {
        self.params
            .as_ref()
            .map(|list| list.params.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    StoredProperty {
        name: String,
        ty: TypeRepr,
        #[serde(default)]
        span: Span,
    },
    EnumCase {
        name: String,
        #[serde(default)]
        payload: Vec<TypeRepr>,
        #[serde(default)]
        span: Span,
    },
    Deinit {
        #[serde(default)]
        is_empty: bool,
        #[serde(default)]
        span: Span,
    },
}

impl Member {
    pub fn span(&self) -> Span {
        match self {
            Member::StoredProperty { span, .. }
            | Member::EnumCase { span, .. }
            | Member::Deinit { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominalDecl {
    pub kind: NominalKind,
    #[serde(default)]
    pub generics: GenericSig,
    #[serde(default)]
    pub inherited: Vec<TypeRepr>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssocTypeDecl {
    pub name: String,
    #[serde(default)]
    pub inherited: Vec<TypeRepr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDecl {
    #[serde(default)]
    pub inherited: Vec<TypeRepr>,
    #[serde(default)]
    pub where_clause: Vec<Requirement>,
    #[serde(default)]
    pub assoc_types: Vec<AssocTypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDecl {
    pub extended: TypeRepr,
    #[serde(default)]
    pub inherited: Vec<TypeRepr>,
    #[serde(default)]
    pub where_clause: Vec<Requirement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAliasDecl {
    #[serde(default)]
    pub generics: GenericSig,
    pub underlying: TypeRepr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRepr,
    #[serde(default)]
    pub span: Span,
}

/// A call in a function body with its (explicit or inferred) type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    pub type_args: Vec<TypeRepr>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncDecl {
    #[serde(default)]
    pub generics: GenericSig,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub result: Option<TypeRepr>,
    #[serde(default)]
    pub calls: Vec<CallSite>,
}

impl Module {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self { file: None, decls }
    }
}
