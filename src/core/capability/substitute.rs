//! Phase 3: use-site checks.
//!
//! Walks every type written in a declaration and checks:
//! - generic arguments against the capability each parameter requires,
//! - call-site type arguments against the callee's parameters,
//! - compositions that both suppress and require a capability,
//! - inverses written outside a constraint,
//! - ownership specifiers on parameters of suppressed types.

use tracing::trace;

use crate::core::capability::builtins;
use crate::core::capability::constraint::{ConstraintItem, classify, inverse_span};
use crate::core::capability::engine::{CapabilityEngine, CkEnv};
use crate::core::capability::errors::{CEK, CapabilityError};
use crate::core::capability::model::{Capability, CapabilityRequirement};
use crate::core::capability::solve::SolvedSig;
use crate::core::capability::verdict::Evaluator;
use crate::core::decl::{DeclKind, GenericParam, Member, Requirement, RequirementKind};
use crate::core::diag::Span;
use crate::core::repr::{IdentRepr, TypeRepr, TypeReprKind, render_type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Type,
    Constraint,
}

/// Generic parameters of a substitution target, in declaration order.
struct TargetParams {
    owner: String,
    owner_kind: &'static str,
    /// Name, declaration span (when declared in this module), and which
    /// enabled capabilities the parameter requires.
    params: Vec<(String, Option<Span>, Vec<Capability>)>,
}

struct UseSiteChecker<'a, 'm> {
    env: &'a CkEnv<'m>,
    eval: Evaluator<'a, 'm>,
    sig: &'a SolvedSig,
    errors: Vec<CapabilityError>,
}

pub(super) fn run(engine: &mut CapabilityEngine<'_>) {
    let mut reported = Vec::new();
    {
        let env = engine.env();
        let sigs = &engine.state().sigs;
        let fallback = SolvedSig::default();
        for (idx, decl) in env.module.decls.iter().enumerate() {
            let sig = sigs.get(&idx).unwrap_or(&fallback);
            let mut checker = UseSiteChecker {
                env,
                eval: Evaluator::new(env, sigs),
                sig,
                errors: Vec::new(),
            };
            checker.check_decl(idx);
            trace!(decl = %decl.name, errors = checker.errors.len(), "use sites checked");
            reported.push((idx, checker.errors));
        }
    }
    let state = engine.state_mut();
    for (idx, errors) in reported {
        state.report_all(idx, errors);
    }
}

impl<'a, 'm> UseSiteChecker<'a, 'm> {
    fn check_decl(&mut self, idx: usize) {
        let decl = self.env.decl(idx);
        match &decl.kind {
            DeclKind::Nominal(nominal) => {
                self.walk_constraints(&nominal.inherited);
                self.walk_generics(nominal.generics.params().iter().map(|p| &p.inherited));
                self.walk_requirements(&nominal.generics.where_clause);
                for member in &nominal.members {
                    match member {
                        Member::StoredProperty { ty, .. } => self.walk(ty, Position::Type),
                        Member::EnumCase { payload, .. } => {
                            for ty in payload {
                                self.walk(ty, Position::Type);
                            }
                        }
                        Member::Deinit { .. } => {}
                    }
                }
            }
            DeclKind::Protocol(proto) => {
                self.walk_constraints(&proto.inherited);
                self.walk_generics(proto.assoc_types.iter().map(|a| &a.inherited));
                self.walk_requirements(&proto.where_clause);
            }
            DeclKind::Extension(ext) => {
                if let TypeReprKind::Ident(ident) = &ext.extended.kind {
                    for arg in ident.args() {
                        self.walk(arg, Position::Type);
                    }
                }
                self.walk_constraints(&ext.inherited);
                self.walk_requirements(&ext.where_clause);
            }
            DeclKind::TypeAlias(alias) => {
                self.walk_generics(alias.generics.params().iter().map(|p| &p.inherited));
                self.walk_requirements(&alias.generics.where_clause);
                self.walk(&alias.underlying, Position::Type);
            }
            DeclKind::Func(func) => {
                self.walk_generics(func.generics.params().iter().map(|p| &p.inherited));
                self.walk_requirements(&func.generics.where_clause);
                for param in &func.params {
                    self.walk(&param.ty, Position::Type);
                    self.check_ownership(&param.name, &param.ty, param.span);
                }
                if let Some(result) = &func.result {
                    self.walk(result, Position::Type);
                }
                for call in &func.calls {
                    self.check_call(&call.callee, &call.type_args, call.span);
                    for arg in &call.type_args {
                        self.walk(arg, Position::Type);
                    }
                }
            }
        }
    }

    fn walk_generics<'t>(&mut self, lists: impl Iterator<Item = &'t Vec<TypeRepr>>) {
        for list in lists {
            self.walk_constraints(list);
        }
    }

    /// Inheritance entries; top-level compositions here are the solver's
    /// business, so only their nested types are walked.
    fn walk_constraints(&mut self, entries: &[TypeRepr]) {
        for entry in entries {
            for member in entry.composition_members() {
                self.walk(member, Position::Constraint);
            }
        }
    }

    fn walk_requirements(&mut self, reqs: &[Requirement]) {
        for req in reqs {
            match &req.kind {
                RequirementKind::Conformance {
                    subject,
                    constraint,
                } => {
                    self.walk(subject, Position::Type);
                    self.walk_constraints(std::slice::from_ref(constraint));
                }
                RequirementKind::SameType { first, second } => {
                    self.walk(first, Position::Type);
                    self.walk(second, Position::Type);
                }
            }
        }
    }

    fn walk(&mut self, ty: &TypeRepr, pos: Position) {
        match &ty.kind {
            TypeReprKind::Ident(ident) => {
                if ident.generic_args.is_some() {
                    self.check_generic(ident, ty.span);
                }
                for arg in ident.args() {
                    self.walk(arg, Position::Type);
                }
            }
            TypeReprKind::Member { base, components } => {
                self.walk(base, Position::Type);
                for component in components {
                    for arg in component.args() {
                        self.walk(arg, Position::Type);
                    }
                }
            }
            TypeReprKind::Array { elem, .. } | TypeReprKind::Vararg { elem, .. } => {
                self.check_builtin_sugar("Array", std::slice::from_ref(elem.as_ref()), ty.span);
                self.walk(elem, Position::Type);
            }
            TypeReprKind::Dictionary { key, value, .. } => {
                let args = [key.as_ref().clone(), value.as_ref().clone()];
                self.check_builtin_sugar("Dictionary", &args, ty.span);
                self.walk(key, Position::Type);
                self.walk(value, Position::Type);
            }
            TypeReprKind::Tuple(tuple) => {
                for element in &tuple.elements {
                    self.walk(&element.ty, Position::Type);
                }
            }
            TypeReprKind::Function {
                params,
                thrown,
                result,
                ..
            } => {
                for element in &params.elements {
                    self.walk(&element.ty, Position::Type);
                }
                if let Some(thrown) = thrown {
                    self.walk(thrown, Position::Type);
                }
                self.walk(result, Position::Type);
            }
            TypeReprKind::Optional { base, .. }
            | TypeReprKind::ImplicitlyUnwrapped { base, .. }
            | TypeReprKind::Metatype { base, .. }
            | TypeReprKind::Specifier { base, .. }
            | TypeReprKind::Attributed { base, .. } => self.walk(base, Position::Type),
            TypeReprKind::Composition { members } => {
                self.check_composition(ty, ty);
                for member in members {
                    self.walk(member, Position::Constraint);
                }
            }
            TypeReprKind::Existential { constraint, .. }
            | TypeReprKind::Opaque { constraint, .. } => {
                self.check_composition(ty, constraint);
                for member in constraint.composition_members() {
                    self.walk(member, Position::Constraint);
                }
            }
            TypeReprKind::Inverse { .. } => {
                if pos == Position::Type {
                    self.errors
                        .push(CEK::InverseOutsideConstraint(render_type(ty)).at(ty.span));
                }
            }
            TypeReprKind::PackElement { pack, .. } => self.walk(pack, Position::Type),
            TypeReprKind::PackExpansion { pattern, .. } => self.walk(pattern, Position::Type),
            TypeReprKind::Error => {}
        }
    }

    fn check_composition(&mut self, ty: &TypeRepr, constraint: &TypeRepr) {
        let items = classify(constraint);
        for &cap in &self.env.caps {
            if inverse_span(&items, cap).is_none() || !self.eval.items_require(&items, cap) {
                continue;
            }
            let mut error = CEK::ConflictingComposition {
                ty: render_type(ty),
                cap,
            }
            .at(ty.span);
            for item in &items {
                match item {
                    ConstraintItem::Claim(c, span) if *c == cap => {
                        error = error.with_note(*span, format!("'{cap}' is required here"));
                    }
                    ConstraintItem::Protocol(proto, span)
                        if self.env.protocol_requires(proto, cap) =>
                    {
                        error = error.with_note(*span, format!("'{proto}' requires '{cap}'"));
                    }
                    _ => {}
                }
            }
            self.errors.push(error);
        }
    }

    fn check_generic(&mut self, ident: &IdentRepr, span: Span) {
        if let Some(target) = self.target_params(&ident.name) {
            self.check_args(&target, ident.args(), span);
        }
    }

    fn check_builtin_sugar(&mut self, name: &str, args: &[TypeRepr], span: Span) {
        if let Some(target) = self.target_params(name) {
            self.check_args(&target, args, span);
        }
    }

    fn check_call(&mut self, callee: &str, args: &[TypeRepr], span: Span) {
        let Some((idx, decl, func)) = self.env.func(callee) else {
            return;
        };
        let target = TargetParams {
            owner: decl.name.clone(),
            owner_kind: "function",
            params: self.declared_params(idx, func.generics.params()),
        };
        self.check_args(&target, args, span);
    }

    fn target_params(&self, name: &str) -> Option<TargetParams> {
        if let Some((idx, decl, nominal)) = self.env.nominal(name) {
            return Some(TargetParams {
                owner: decl.name.clone(),
                owner_kind: nominal.kind.describe(),
                params: self.declared_params(idx, nominal.generics.params()),
            });
        }
        if let Some((idx, decl, alias)) = self.env.alias(name) {
            return Some(TargetParams {
                owner: decl.name.clone(),
                owner_kind: "type alias",
                params: self.declared_params(idx, alias.generics.params()),
            });
        }
        let generic = builtins::builtin_generic(name)?;
        Some(TargetParams {
            owner: generic.name.to_string(),
            owner_kind: "type",
            params: generic
                .params
                .iter()
                .map(|param| {
                    let caps = self
                        .env
                        .caps
                        .iter()
                        .copied()
                        .filter(|&cap| param.requires(cap))
                        .collect();
                    (param.name.to_string(), None, caps)
                })
                .collect(),
        })
    }

    /// Parameters of a module declaration with the capabilities its solved
    /// signature fixes as present.
    fn declared_params(
        &self,
        idx: usize,
        params: &[GenericParam],
    ) -> Vec<(String, Option<Span>, Vec<Capability>)> {
        let Some(target_sig) = self.eval.sig_of(idx) else {
            return Vec::new();
        };
        params
            .iter()
            .map(|param| {
                let caps = self
                    .env
                    .caps
                    .iter()
                    .copied()
                    .filter(|&cap| {
                        target_sig.requirement(&param.name, cap)
                            == Some(CapabilityRequirement::Present)
                    })
                    .collect();
                (param.name.clone(), Some(param.span), caps)
            })
            .collect()
    }

    fn check_args(&mut self, target: &TargetParams, args: &[TypeRepr], span: Span) {
        for ((param, param_span, caps), arg) in target.params.iter().zip(args) {
            for &cap in caps {
                let verdict = self.eval.eval(self.sig, arg, cap);
                if !verdict.is_suppressed() {
                    continue;
                }
                let mut error = CEK::SubstitutionViolation {
                    ty: render_type(arg),
                    param: param.clone(),
                    owner: target.owner.clone(),
                    owner_kind: target.owner_kind,
                    cap,
                }
                .at(span);
                if let Some(param_span) = param_span {
                    error = error.with_note(
                        *param_span,
                        format!(
                            "'{param}' of '{}' requires '{cap}' because it is not marked '~{cap}'",
                            target.owner
                        ),
                    );
                }
                self.errors.push(error);
            }
        }
    }

    fn check_ownership(&mut self, name: &str, ty: &TypeRepr, span: Span) {
        if !self.env.caps.contains(&Capability::Copyable) || has_ownership(ty) {
            return;
        }
        if self.eval.eval(self.sig, ty, Capability::Copyable).is_suppressed() {
            self.errors.push(
                CEK::MissingOwnershipSpecifier {
                    param: name.to_string(),
                    ty: render_type(ty),
                }
                .at(span),
            );
        }
    }
}

fn has_ownership(ty: &TypeRepr) -> bool {
    match &ty.kind {
        TypeReprKind::Specifier {
            base, specifier, ..
        } => specifier.is_ownership() || has_ownership(base),
        TypeReprKind::Attributed { base, .. } => has_ownership(base),
        _ => false,
    }
}
