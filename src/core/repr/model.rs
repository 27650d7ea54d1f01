//! Internal type representation produced from syntax.

use serde::{Deserialize, Serialize};

use crate::core::diag::Span;
use crate::core::repr::attrs::{TypeAttrKind, TypeSpecifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRepr {
    pub kind: TypeReprKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericArgs {
    pub args: Vec<TypeRepr>,
    #[serde(default)]
    pub l_angle: Span,
    #[serde(default)]
    pub r_angle: Span,
}

/// `Name` or `Name<Args>`; also one component of a member chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentRepr {
    pub name: String,
    #[serde(default)]
    pub name_span: Span,
    #[serde(default)]
    pub generic_args: Option<GenericArgs>,
}

impl IdentRepr {
    pub fn args(&self) -> &[TypeRepr] {
        self.generic_args
            .as_ref()
            .map(|g| g.args.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleElementRepr {
    #[serde(default)]
    pub first_name: Option<(String, Span)>,
    #[serde(default)]
    pub second_name: Option<(String, Span)>,
    #[serde(default)]
    pub colon: Option<Span>,
    pub ty: TypeRepr,
    #[serde(default)]
    pub trailing_comma: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleRepr {
    pub elements: Vec<TupleElementRepr>,
    #[serde(default)]
    pub l_paren: Span,
    #[serde(default)]
    pub r_paren: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetatypeKind {
    Type,
    Protocol,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAttr {
    pub kind: TypeAttrKind,
    #[serde(default)]
    pub at: Span,
    #[serde(default)]
    pub name: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeReprKind {
    Ident(IdentRepr),
    Member {
        base: Box<TypeRepr>,
        components: Vec<IdentRepr>,
    },
    Array {
        elem: Box<TypeRepr>,
        #[serde(default)]
        l_square: Span,
        #[serde(default)]
        r_square: Span,
    },
    Dictionary {
        key: Box<TypeRepr>,
        value: Box<TypeRepr>,
        #[serde(default)]
        l_square: Span,
        #[serde(default)]
        colon: Span,
        #[serde(default)]
        r_square: Span,
    },
    Tuple(TupleRepr),
    Function {
        params: TupleRepr,
        #[serde(default)]
        async_span: Option<Span>,
        #[serde(default)]
        throws_span: Option<Span>,
        #[serde(default)]
        thrown: Option<Box<TypeRepr>>,
        #[serde(default)]
        arrow: Span,
        result: Box<TypeRepr>,
    },
    Optional {
        base: Box<TypeRepr>,
        #[serde(default)]
        question: Span,
    },
    ImplicitlyUnwrapped {
        base: Box<TypeRepr>,
        #[serde(default)]
        exclamation: Span,
    },
    Metatype {
        base: Box<TypeRepr>,
        meta: MetatypeKind,
        #[serde(default)]
        meta_span: Span,
    },
    /// `A & B`. No members spells the top type `Any`.
    Composition { members: Vec<TypeRepr> },
    Opaque {
        constraint: Box<TypeRepr>,
        #[serde(default)]
        some_span: Span,
    },
    Existential {
        constraint: Box<TypeRepr>,
        #[serde(default)]
        any_span: Span,
    },
    Inverse {
        constraint: Box<TypeRepr>,
        #[serde(default)]
        tilde: Span,
    },
    PackElement {
        pack: Box<TypeRepr>,
        #[serde(default)]
        each_span: Span,
    },
    PackExpansion {
        pattern: Box<TypeRepr>,
        #[serde(default)]
        repeat_span: Span,
    },
    Vararg {
        elem: Box<TypeRepr>,
        #[serde(default)]
        ellipsis: Span,
    },
    Specifier {
        base: Box<TypeRepr>,
        specifier: TypeSpecifier,
        #[serde(default)]
        specifier_span: Span,
    },
    Attributed {
        base: Box<TypeRepr>,
        attrs: Vec<TypeAttr>,
    },
    Error,
}

impl TypeRepr {
    pub fn new(kind: TypeReprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn error(span: Span) -> Self {
        Self::new(TypeReprKind::Error, span)
    }

    pub fn ident(name: impl Into<String>, span: Span) -> Self {
        Self::new(
            TypeReprKind::Ident(IdentRepr {
                name: name.into(),
                name_span: span,
                generic_args: None,
            }),
            span,
        )
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRepr>, span: Span) -> Self {
        Self::new(
            TypeReprKind::Ident(IdentRepr {
                name: name.into(),
                name_span: span,
                generic_args: Some(GenericArgs {
                    args,
                    l_angle: span,
                    r_angle: span,
                }),
            }),
            span,
        )
    }

    pub fn inverse(constraint: TypeRepr, span: Span) -> Self {
        Self::new(
            TypeReprKind::Inverse {
                constraint: Box::new(constraint),
                tilde: Span::point(span.start),
            },
            span,
        )
    }

    pub fn any(span: Span) -> Self {
        Self::new(TypeReprKind::Composition { members: Vec::new() }, span)
    }

    pub fn as_ident(&self) -> Option<&IdentRepr> {
        match &self.kind {
            TypeReprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Name of a plain identifier without generic arguments.
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeReprKind::Ident(ident) if ident.generic_args.is_none() => Some(&ident.name),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeReprKind::Error)
    }

    /// Members of a composition, or the repr itself.
    pub fn composition_members(&self) -> Vec<&TypeRepr> {
        match &self.kind {
            TypeReprKind::Composition { members } => {
                members.iter().flat_map(|m| m.composition_members()).collect()
            }
            _ => vec![self],
        }
    }
}
