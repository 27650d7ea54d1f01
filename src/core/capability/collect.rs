//! Phase 1: index declarations, reject suppressions that are never valid on
//! a declaration's own `Self`, and compute each aggregate's conformance
//! shape per capability.

use std::collections::HashMap;

use tracing::trace;

use crate::core::capability::constraint::{
    ConstraintItem, classify, classify_all, claims, inverse_span,
};
use crate::core::capability::engine::{CapabilityEngine, CkEnv};
use crate::core::capability::errors::{CEK, CapabilityError};
use crate::core::capability::model::{Capability, Conformance};
use crate::core::decl::{DeclKind, NominalDecl, RequirementKind};

pub(super) fn run(engine: &mut CapabilityEngine<'_>) {
    index_decls(engine.env_mut());

    let (env, state) = engine.split();
    for (idx, decl) in env.module.decls.iter().enumerate() {
        let mut errors = Vec::new();
        match &decl.kind {
            DeclKind::Nominal(nominal) => {
                for item in nominal.inherited.iter().flat_map(classify) {
                    match item {
                        ConstraintItem::Inverse(cap, span)
                            if nominal.kind.is_class_like() && env.caps.contains(&cap) =>
                        {
                            errors.push(
                                CEK::ClassCannotSuppress {
                                    kind: nominal.kind.describe(),
                                    name: decl.name.clone(),
                                    cap,
                                }
                                .at(span),
                            );
                        }
                        ConstraintItem::BadInverse(name, span) => {
                            errors.push(CEK::NotSuppressible(name).at(span));
                        }
                        _ => {}
                    }
                }
            }
            DeclKind::Extension(ext) => {
                let extended = ext
                    .extended
                    .as_ident()
                    .map(|ident| ident.name.clone())
                    .unwrap_or_default();
                for item in ext.inherited.iter().flat_map(classify) {
                    match item {
                        ConstraintItem::Inverse(cap, span) if env.caps.contains(&cap) => {
                            errors.push(
                                CEK::InverseInExtension {
                                    name: extended.clone(),
                                    cap,
                                }
                                .at(span),
                            );
                        }
                        ConstraintItem::BadInverse(name, span) => {
                            errors.push(CEK::NotSuppressible(name).at(span));
                        }
                        _ => {}
                    }
                }
            }
            DeclKind::Protocol(proto) => {
                errors.extend(bad_inverses(proto.inherited.iter().flat_map(classify)));
            }
            DeclKind::TypeAlias(_) | DeclKind::Func(_) => {}
        }
        state.report_all(idx, errors);
    }

    let conformances = compute_conformances(engine.env());
    engine.env_mut().conformances = conformances;
}

fn bad_inverses<'a>(
    items: impl Iterator<Item = ConstraintItem<'a>>,
) -> impl Iterator<Item = CapabilityError> {
    items.filter_map(|item| match item {
        ConstraintItem::BadInverse(name, span) => Some(CEK::NotSuppressible(name).at(span)),
        _ => None,
    })
}

fn index_decls(env: &mut CkEnv<'_>) {
    for (idx, decl) in env.module.decls.iter().enumerate() {
        let table = match &decl.kind {
            DeclKind::Nominal(_) => &mut env.nominals,
            DeclKind::Protocol(_) => &mut env.protocols,
            DeclKind::TypeAlias(_) => &mut env.aliases,
            DeclKind::Func(_) => &mut env.funcs,
            DeclKind::Extension(ext) => {
                if let Some(ident) = ext.extended.as_ident() {
                    env.extensions
                        .entry(ident.name.clone())
                        .or_default()
                        .push(idx);
                }
                continue;
            }
        };
        // First declaration of a name wins; later ones are still checked on
        // their own but never resolved to.
        table.entry(decl.name.clone()).or_insert(idx);
        trace!(idx, name = %decl.name, "indexed declaration");
    }
}

fn compute_conformances(env: &CkEnv<'_>) -> HashMap<(usize, Capability), Conformance> {
    let mut out = HashMap::new();
    for (name, &idx) in &env.nominals {
        let DeclKind::Nominal(nominal) = &env.decl(idx).kind else {
            continue;
        };
        for &cap in &env.caps {
            let conformance = conformance_of(env, name, nominal, cap);
            trace!(%name, %cap, ?conformance, "conformance");
            out.insert((idx, cap), conformance);
        }
    }
    out
}

fn conformance_of(
    env: &CkEnv<'_>,
    name: &str,
    nominal: &NominalDecl,
    cap: Capability,
) -> Conformance {
    if nominal.kind.is_class_like() {
        return Conformance::Unconditional { implicit: true };
    }

    let items = classify_all(&nominal.inherited);
    let explicit = claims(&items, cap);
    let required_by_protocol = items.iter().any(|item| {
        matches!(item, ConstraintItem::Protocol(proto, _) if env.protocol_requires(proto, cap))
    });

    if inverse_span(&items, cap).is_none() {
        return Conformance::Unconditional {
            implicit: !explicit && !required_by_protocol,
        };
    }
    if explicit || required_by_protocol {
        return Conformance::Conflicted;
    }

    let params = nominal.generics.params();
    for &ext_idx in env.extensions.get(name).into_iter().flatten() {
        let DeclKind::Extension(ext) = &env.decl(ext_idx).kind else {
            continue;
        };
        if !claims(&classify_all(&ext.inherited), cap) {
            continue;
        }
        let conditions: Vec<usize> = ext
            .where_clause
            .iter()
            .filter_map(|req| match &req.kind {
                RequirementKind::Conformance {
                    subject,
                    constraint,
                } if claims(&classify(constraint), cap) => {
                    let subject = subject.simple_name()?;
                    params.iter().position(|p| p.name == subject)
                }
                _ => None,
            })
            .collect();
        if conditions.is_empty() {
            return Conformance::Unconditional { implicit: false };
        }
        return Conformance::Conditional {
            params: conditions,
            extension: ext_idx,
        };
    }
    Conformance::None
}
