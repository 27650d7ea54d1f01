//! Capability of a written type inside a solved generic context.

use std::collections::HashMap;

use crate::core::capability::builtins;
use crate::core::capability::constraint::{
    ConstraintItem, classify, inverse_span, split_dependent, subject_key,
};
use crate::core::capability::engine::CkEnv;
use crate::core::capability::model::{
    Capability, CapabilityRequirement, Conformance, Verdict,
};
use crate::core::capability::solve::SolvedSig;
use crate::core::decl::TypeAliasDecl;
use crate::core::repr::{IdentRepr, TypeRepr, TypeReprKind, render_type};

/// Aliases referring to aliases stop being expanded past this depth.
const MAX_ALIAS_DEPTH: usize = 16;

pub(crate) struct Evaluator<'a, 'm> {
    env: &'a CkEnv<'m>,
    sigs: &'a HashMap<usize, SolvedSig>,
}

impl<'a, 'm> Evaluator<'a, 'm> {
    pub(crate) fn new(env: &'a CkEnv<'m>, sigs: &'a HashMap<usize, SolvedSig>) -> Self {
        Self { env, sigs }
    }

    pub(crate) fn sig_of(&self, idx: usize) -> Option<&'a SolvedSig> {
        self.sigs.get(&idx)
    }

    pub(crate) fn eval(&self, sig: &SolvedSig, ty: &TypeRepr, cap: Capability) -> Verdict {
        self.eval_at(sig, ty, cap, 0)
    }

    fn eval_at(&self, sig: &SolvedSig, ty: &TypeRepr, cap: Capability, depth: usize) -> Verdict {
        match &ty.kind {
            TypeReprKind::Ident(ident) => self.eval_ident(sig, ident, cap, depth),
            TypeReprKind::Member { .. } => match subject_key(ty) {
                Some(key) => self.eval_subject(sig, &key, cap),
                None => Verdict::unresolved(),
            },
            TypeReprKind::Array { .. }
            | TypeReprKind::Dictionary { .. }
            | TypeReprKind::Function { .. }
            | TypeReprKind::Metatype { .. }
            | TypeReprKind::Vararg { .. } => Verdict::present(),
            TypeReprKind::Tuple(tuple) => Verdict::all_of(
                tuple
                    .elements
                    .iter()
                    .map(|element| self.eval_at(sig, &element.ty, cap, depth)),
            ),
            TypeReprKind::Optional { base, .. } | TypeReprKind::ImplicitlyUnwrapped { base, .. } => {
                self.eval_at(sig, base, cap, depth)
            }
            TypeReprKind::Composition { .. } => self.eval_constraint(ty, ty, cap),
            TypeReprKind::Existential { constraint, .. } | TypeReprKind::Opaque { constraint, .. } => {
                self.eval_constraint(ty, constraint, cap)
            }
            TypeReprKind::PackElement { pack, .. } => self.eval_at(sig, pack, cap, depth),
            TypeReprKind::PackExpansion { pattern, .. } => self.eval_at(sig, pattern, cap, depth),
            TypeReprKind::Specifier { base, .. } | TypeReprKind::Attributed { base, .. } => {
                self.eval_at(sig, base, cap, depth)
            }
            TypeReprKind::Inverse { .. } | TypeReprKind::Error => Verdict::unresolved(),
        }
    }

    fn eval_subject(&self, sig: &SolvedSig, key: &str, cap: Capability) -> Verdict {
        match sig.requirement(key, cap) {
            Some(CapabilityRequirement::Present) => return Verdict::present(),
            Some(CapabilityRequirement::Suppressed) => return Verdict::by_param(key),
            Some(CapabilityRequirement::Unresolved) => return Verdict::unresolved(),
            None => {}
        }

        // Dependent member never named in a requirement: ask the protocols
        // its base conforms to.
        let Some((base, assoc)) = split_dependent(key) else {
            return Verdict::unresolved();
        };
        let Some(facts) = sig.facts(base) else {
            return Verdict::unresolved();
        };
        for proto in &facts.protocols {
            match self.env.assoc_suppresses(proto, assoc, cap) {
                Some(true) => return Verdict::by_param(key),
                Some(false) => return Verdict::present(),
                None => {}
            }
        }
        Verdict::unresolved()
    }

    fn eval_ident(
        &self,
        sig: &SolvedSig,
        ident: &IdentRepr,
        cap: Capability,
        depth: usize,
    ) -> Verdict {
        let args = ident.args();
        if args.is_empty() && sig.facts(&ident.name).is_some() {
            return self.eval_subject(sig, &ident.name, cap);
        }

        if let Some((idx, decl, _)) = self.env.nominal(&ident.name) {
            return match self.env.conformance(idx, cap) {
                Conformance::Unconditional { .. } => Verdict::present(),
                Conformance::None => Verdict::by_concrete(decl.name.clone()),
                Conformance::Conflicted => Verdict::unresolved(),
                Conformance::Conditional { params, .. } => {
                    Verdict::all_of(params.iter().map(|&i| self.eval_arg(sig, args, i, cap, depth)))
                }
            };
        }

        if let Some((idx, _, alias)) = self.env.alias(&ident.name) {
            return self.eval_alias(sig, idx, alias, args, cap, depth);
        }

        if let Some(generic) = builtins::builtin_generic(&ident.name) {
            if !generic.conditional {
                return Verdict::present();
            }
            return Verdict::all_of(
                generic
                    .params
                    .iter()
                    .enumerate()
                    .filter(|(_, param)| !param.requires(cap))
                    .map(|(i, _)| self.eval_arg(sig, args, i, cap, depth)),
            );
        }

        // Concrete types from outside the module, and bare protocols used as
        // existentials, carry every capability.
        Verdict::present()
    }

    fn eval_arg(
        &self,
        sig: &SolvedSig,
        args: &[TypeRepr],
        index: usize,
        cap: Capability,
        depth: usize,
    ) -> Verdict {
        args.get(index)
            .map_or_else(Verdict::unresolved, |arg| self.eval_at(sig, arg, cap, depth))
    }

    fn eval_alias(
        &self,
        sig: &SolvedSig,
        idx: usize,
        alias: &TypeAliasDecl,
        args: &[TypeRepr],
        cap: Capability,
        depth: usize,
    ) -> Verdict {
        if depth >= MAX_ALIAS_DEPTH {
            return Verdict::unresolved();
        }
        let fallback = SolvedSig::default();
        let alias_sig = self.sigs.get(&idx).unwrap_or(&fallback);
        let inner = self.eval_at(alias_sig, &alias.underlying, cap, depth + 1);
        if !inner.is_suppressed() {
            return inner;
        }

        // Map suppression caused by the alias's own parameters onto the
        // arguments written at this use.
        let params = alias.generics.params();
        let mut parts = Vec::new();
        if !inner.concrete.is_empty() {
            parts.push(Verdict {
                requirement: CapabilityRequirement::Suppressed,
                params: Default::default(),
                concrete: inner.concrete,
            });
        }
        for name in &inner.params {
            parts.push(match params.iter().position(|p| &p.name == name) {
                Some(i) => self.eval_arg(sig, args, i, cap, depth),
                None => Verdict::unresolved(),
            });
        }
        Verdict::all_of(parts)
    }

    /// `ty` is the whole composition, existential or opaque type and
    /// `constraint` its constraint part.
    fn eval_constraint(&self, ty: &TypeRepr, constraint: &TypeRepr, cap: Capability) -> Verdict {
        let items = classify(constraint);
        if inverse_span(&items, cap).is_none() {
            return Verdict::present();
        }
        if self.items_require(&items, cap) {
            return Verdict::unresolved();
        }
        Verdict::by_concrete(render_type(ty))
    }

    /// Whether any member of a constraint set requires `cap`.
    pub(crate) fn items_require(&self, items: &[ConstraintItem<'_>], cap: Capability) -> bool {
        items.iter().any(|item| match item {
            ConstraintItem::Claim(c, _) => *c == cap,
            ConstraintItem::Protocol(proto, _) => self.env.protocol_requires(proto, cap),
            _ => false,
        })
    }
}
