//! Closed lookup tables for type specifiers and `@` type attributes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSpecifier {
    InOut,
    Borrowing,
    Consuming,
    LegacyShared,
    LegacyOwned,
    CompileTimeConst,
    Isolated,
    ResultDependsOn,
}

const SPECIFIERS: &[(&str, TypeSpecifier)] = &[
    ("inout", TypeSpecifier::InOut),
    ("borrowing", TypeSpecifier::Borrowing),
    ("consuming", TypeSpecifier::Consuming),
    ("__shared", TypeSpecifier::LegacyShared),
    ("__owned", TypeSpecifier::LegacyOwned),
    ("_const", TypeSpecifier::CompileTimeConst),
    ("isolated", TypeSpecifier::Isolated),
    ("_resultDependsOn", TypeSpecifier::ResultDependsOn),
];

impl TypeSpecifier {
    pub fn from_keyword(text: &str) -> Option<Self> {
        SPECIFIERS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, spec)| *spec)
    }

    pub fn as_str(self) -> &'static str {
        SPECIFIERS
            .iter()
            .find(|(_, spec)| *spec == self)
            .map(|(kw, _)| *kw)
            .unwrap_or("<specifier>")
    }

    pub fn is_ownership(self) -> bool {
        matches!(
            self,
            TypeSpecifier::InOut
                | TypeSpecifier::Borrowing
                | TypeSpecifier::Consuming
                | TypeSpecifier::LegacyShared
                | TypeSpecifier::LegacyOwned
        )
    }
}

/// How the builder treats an attribute kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeAttrClass {
    /// Calling-convention and ownership markers only valid in SIL mode.
    Sil,
    /// Escapability, concurrency and other markers with no arguments.
    Simple,
    /// Attributes whose arguments need dedicated parsing.
    Deferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeAttrKind {
    // SIL
    Out,
    In,
    Owned,
    UnownedInnerPointer,
    Guaranteed,
    Autoreleased,
    CalleeOwned,
    CalleeGuaranteed,
    ObjcMetatype,
    SilWeak,
    SilUnowned,
    SilInOut,
    BlockStorage,
    Box,
    DynamicSelf,
    SilUnmanaged,
    Error,
    Direct,
    InOutAliasable,
    InGuaranteed,
    InConstant,
    CapturesGenerics,
    MoveOnly,
    PackOwned,
    PackGuaranteed,
    PackInOut,
    PackOut,
    Pseudogeneric,
    Yields,
    YieldOnce,
    YieldMany,
    Thin,
    Thick,
    // Simple
    Autoclosure,
    Escaping,
    NoEscape,
    NoDerivative,
    Async,
    Sendable,
    Unchecked,
    Local,
    NoMetadata,
    Retroactive,
    Preconcurrency,
    // Deferred
    Opened,
    PackElement,
    Differentiable,
    Convention,
    OpaqueReturnTypeOf,
}

const TYPE_ATTRS: &[(&str, TypeAttrKind)] = &[
    ("out", TypeAttrKind::Out),
    ("in", TypeAttrKind::In),
    ("owned", TypeAttrKind::Owned),
    ("unowned_inner_pointer", TypeAttrKind::UnownedInnerPointer),
    ("guaranteed", TypeAttrKind::Guaranteed),
    ("autoreleased", TypeAttrKind::Autoreleased),
    ("callee_owned", TypeAttrKind::CalleeOwned),
    ("callee_guaranteed", TypeAttrKind::CalleeGuaranteed),
    ("objc_metatype", TypeAttrKind::ObjcMetatype),
    ("sil_weak", TypeAttrKind::SilWeak),
    ("sil_unowned", TypeAttrKind::SilUnowned),
    ("inout", TypeAttrKind::SilInOut),
    ("block_storage", TypeAttrKind::BlockStorage),
    ("box", TypeAttrKind::Box),
    ("dynamic_self", TypeAttrKind::DynamicSelf),
    ("sil_unmanaged", TypeAttrKind::SilUnmanaged),
    ("error", TypeAttrKind::Error),
    ("direct", TypeAttrKind::Direct),
    ("inout_aliasable", TypeAttrKind::InOutAliasable),
    ("in_guaranteed", TypeAttrKind::InGuaranteed),
    ("in_constant", TypeAttrKind::InConstant),
    ("captures_generics", TypeAttrKind::CapturesGenerics),
    ("moveOnly", TypeAttrKind::MoveOnly),
    ("pack_owned", TypeAttrKind::PackOwned),
    ("pack_guaranteed", TypeAttrKind::PackGuaranteed),
    ("pack_inout", TypeAttrKind::PackInOut),
    ("pack_out", TypeAttrKind::PackOut),
    ("pseudogeneric", TypeAttrKind::Pseudogeneric),
    ("yields", TypeAttrKind::Yields),
    ("yield_once", TypeAttrKind::YieldOnce),
    ("yield_many", TypeAttrKind::YieldMany),
    ("thin", TypeAttrKind::Thin),
    ("thick", TypeAttrKind::Thick),
    ("autoclosure", TypeAttrKind::Autoclosure),
    ("escaping", TypeAttrKind::Escaping),
    ("noescape", TypeAttrKind::NoEscape),
    ("noDerivative", TypeAttrKind::NoDerivative),
    ("async", TypeAttrKind::Async),
    ("Sendable", TypeAttrKind::Sendable),
    ("unchecked", TypeAttrKind::Unchecked),
    ("_local", TypeAttrKind::Local),
    ("_noMetadata", TypeAttrKind::NoMetadata),
    ("retroactive", TypeAttrKind::Retroactive),
    ("preconcurrency", TypeAttrKind::Preconcurrency),
    ("opened", TypeAttrKind::Opened),
    ("pack_element", TypeAttrKind::PackElement),
    ("differentiable", TypeAttrKind::Differentiable),
    ("convention", TypeAttrKind::Convention),
    ("_opaqueReturnTypeOf", TypeAttrKind::OpaqueReturnTypeOf),
];

impl TypeAttrKind {
    pub fn from_name(name: &str) -> Option<Self> {
        TYPE_ATTRS
            .iter()
            .find(|(text, _)| *text == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(self) -> &'static str {
        TYPE_ATTRS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(text, _)| *text)
            .unwrap_or("<attribute>")
    }

    pub fn class(self) -> TypeAttrClass {
        use TypeAttrKind::*;
        match self {
            Out | In | Owned | UnownedInnerPointer | Guaranteed | Autoreleased | CalleeOwned
            | CalleeGuaranteed | ObjcMetatype | SilWeak | SilUnowned | SilInOut | BlockStorage
            | Box | DynamicSelf | SilUnmanaged | Error | Direct | InOutAliasable | InGuaranteed
            | InConstant | CapturesGenerics | MoveOnly | PackOwned | PackGuaranteed | PackInOut
            | PackOut | Pseudogeneric | Yields | YieldOnce | YieldMany | Thin | Thick => {
                TypeAttrClass::Sil
            }
            Autoclosure | Escaping | NoEscape | NoDerivative | Async | Sendable | Unchecked
            | Local | NoMetadata | Retroactive | Preconcurrency => TypeAttrClass::Simple,
            Opened | PackElement | Differentiable | Convention | OpaqueReturnTypeOf => {
                TypeAttrClass::Deferred
            }
        }
    }
}
