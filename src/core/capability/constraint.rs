//! Reading capability facts out of constraint positions.

use crate::core::capability::model::Capability;
use crate::core::diag::Span;
use crate::core::repr::{TypeRepr, TypeReprKind, render_type};

/// One member of an inheritance clause or conformance constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConstraintItem<'a> {
    /// `Copyable`
    Claim(Capability, Span),
    /// `~Copyable`
    Inverse(Capability, Span),
    /// `~Hashable`
    BadInverse(String, Span),
    Protocol(&'a str, Span),
    Other(&'a TypeRepr),
}

pub(crate) fn classify(ty: &TypeRepr) -> Vec<ConstraintItem<'_>> {
    ty.composition_members()
        .into_iter()
        .map(classify_member)
        .collect()
}

pub(crate) fn classify_all(types: &[TypeRepr]) -> Vec<ConstraintItem<'_>> {
    types.iter().flat_map(classify).collect()
}

fn classify_member(ty: &TypeRepr) -> ConstraintItem<'_> {
    match &ty.kind {
        TypeReprKind::Ident(ident) if ident.generic_args.is_none() => {
            match Capability::from_name(&ident.name) {
                Some(cap) => ConstraintItem::Claim(cap, ty.span),
                None => ConstraintItem::Protocol(&ident.name, ty.span),
            }
        }
        TypeReprKind::Inverse { constraint, .. } => {
            match constraint.simple_name().and_then(Capability::from_name) {
                Some(cap) => ConstraintItem::Inverse(cap, ty.span),
                None => ConstraintItem::BadInverse(render_type(constraint), ty.span),
            }
        }
        _ => ConstraintItem::Other(ty),
    }
}

pub(crate) fn inverse_span(items: &[ConstraintItem<'_>], cap: Capability) -> Option<Span> {
    items.iter().find_map(|item| match item {
        ConstraintItem::Inverse(c, span) if *c == cap => Some(*span),
        _ => None,
    })
}

pub(crate) fn claims(items: &[ConstraintItem<'_>], cap: Capability) -> bool {
    items
        .iter()
        .any(|item| matches!(item, ConstraintItem::Claim(c, _) if *c == cap))
}

/// `T`, `Self`, `T.Element` or `Self.A.B` spelled as a dotted key.
pub(crate) fn subject_key(ty: &TypeRepr) -> Option<String> {
    match &ty.kind {
        TypeReprKind::Ident(ident) if ident.generic_args.is_none() => Some(ident.name.clone()),
        TypeReprKind::Member { base, components } => {
            let mut key = subject_key(base)?;
            for component in components {
                if component.generic_args.is_some() {
                    return None;
                }
                key.push('.');
                key.push_str(&component.name);
            }
            Some(key)
        }
        _ => None,
    }
}

/// Splits `T.A.B` into (`T.A`, `B`).
pub(crate) fn split_dependent(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('.')
}
