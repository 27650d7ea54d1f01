//! Phase 4: aggregate members and teardown hooks against the aggregate's
//! own capability conformance.

use tracing::trace;

use crate::core::capability::constraint::{ConstraintItem, classify};
use crate::core::capability::engine::{CapabilityEngine, CkEnv};
use crate::core::capability::errors::{CEK, CapabilityError};
use crate::core::capability::model::{Capability, Conformance, Verdict};
use crate::core::capability::solve::SolvedSig;
use crate::core::capability::verdict::Evaluator;
use crate::core::decl::{
    Decl, DeclKind, Member, NominalDecl, Requirement, RequirementKind,
};
use crate::core::diag::{FixIt, Span};
use crate::core::repr::{TypeRepr, render_type};

struct ConformanceValidator<'a, 'm> {
    env: &'a CkEnv<'m>,
    eval: Evaluator<'a, 'm>,
    sig: &'a SolvedSig,
    decl: &'m Decl,
    nominal: &'m NominalDecl,
    errors: Vec<CapabilityError>,
}

pub(super) fn run(engine: &mut CapabilityEngine<'_>) {
    let mut reported = Vec::new();
    {
        let env = engine.env();
        let sigs = &engine.state().sigs;
        let fallback = SolvedSig::default();
        for (idx, decl) in env.module.decls.iter().enumerate() {
            let DeclKind::Nominal(nominal) = &decl.kind else {
                continue;
            };
            // Class-like aggregates hold members by reference.
            if nominal.kind.is_class_like() {
                continue;
            }
            let mut validator = ConformanceValidator {
                env,
                eval: Evaluator::new(env, sigs),
                sig: sigs.get(&idx).unwrap_or(&fallback),
                decl,
                nominal,
                errors: Vec::new(),
            };
            for &cap in &env.caps {
                validator.check(idx, cap);
            }
            trace!(decl = %decl.name, errors = validator.errors.len(), "conformance validated");
            reported.push((idx, validator.errors));
        }
    }
    let state = engine.state_mut();
    for (idx, errors) in reported {
        state.report_all(idx, errors);
    }
}

/// A stored member with the type whose capability is in question.
struct MemberUse<'m> {
    kind: &'static str,
    name: &'m str,
    ty: &'m TypeRepr,
    span: Span,
}

impl<'a, 'm> ConformanceValidator<'a, 'm> {
    fn check(&mut self, idx: usize, cap: Capability) {
        match self.env.conformance(idx, cap).clone() {
            Conformance::Unconditional { implicit } => {
                self.check_unconditional(cap, implicit);
                self.check_deinit(cap);
            }
            Conformance::Conditional { params, extension } => {
                self.check_conditional(cap, &params);
                self.check_condition_requirements(cap, extension);
                self.check_deinit(cap);
            }
            Conformance::None | Conformance::Conflicted => {}
        }
    }

    fn members(&self) -> Vec<MemberUse<'m>> {
        let mut out = Vec::new();
        for member in &self.nominal.members {
            match member {
                Member::StoredProperty { name, ty, span } => out.push(MemberUse {
                    kind: "stored property",
                    name,
                    ty,
                    span: *span,
                }),
                Member::EnumCase {
                    name,
                    payload,
                    span,
                } => out.extend(payload.iter().map(|ty| MemberUse {
                    kind: "associated value of case",
                    name,
                    ty,
                    span: *span,
                })),
                Member::Deinit { .. } => {}
            }
        }
        out
    }

    /// First suppressed verdict per member name; one diagnostic per member.
    fn suppressed_members(&self, cap: Capability) -> Vec<(MemberUse<'m>, Verdict)> {
        let mut out: Vec<(MemberUse<'m>, Verdict)> = Vec::new();
        for member in self.members() {
            if out
                .iter()
                .any(|(seen, _)| seen.name == member.name && seen.span == member.span)
            {
                continue;
            }
            let verdict = self.eval.eval(self.sig, member.ty, cap);
            if verdict.is_suppressed() {
                out.push((member, verdict));
            }
        }
        out
    }

    fn check_unconditional(&mut self, cap: Capability, implicit: bool) {
        for (member, verdict) in self.suppressed_members(cap) {
            let mut error = CEK::NoncopyableMember {
                member_kind: member.kind,
                member: member.name.to_string(),
                aggregate_kind: self.nominal.kind.describe(),
                aggregate: self.decl.name.clone(),
                ty: render_type(member.ty),
                cap,
            }
            .at(member.span);
            if implicit {
                error = error.with_fixit(self.suppression_fixit(cap));
                for param in &verdict.params {
                    if let Some(decl) = self.nominal.generics.params().iter().find(|p| &p.name == param)
                    {
                        error = error.with_note(
                            decl.span,
                            format!(
                                "'{}' can only be '{cap}' when '{param}' is; mark it '~{cap}' and add a conditional conformance",
                                self.decl.name
                            ),
                        );
                    }
                }
            }
            self.errors.push(error);
        }
    }

    /// `: ~Cap` after the generic parameter list (or the name), or `~Cap, `
    /// in front of the first inherited type.
    fn suppression_fixit(&self, cap: Capability) -> FixIt {
        if let Some(first) = self.nominal.inherited.first() {
            return FixIt::insert(first.span.start, format!("~{cap}, "));
        }
        let anchor = self
            .nominal
            .generics
            .params
            .as_ref()
            .map_or(self.decl.name_span, |list| list.span);
        FixIt::insert(anchor.end, format!(": ~{cap}"))
    }

    fn check_conditional(&mut self, cap: Capability, conditions: &[usize]) {
        let params = self.nominal.generics.params();
        let conditioning: Vec<&str> = conditions
            .iter()
            .filter_map(|&i| params.get(i).map(|p| p.name.as_str()))
            .collect();

        for (member, verdict) in self.suppressed_members(cap) {
            let mut causes: Vec<String> = verdict.concrete.iter().cloned().collect();
            causes.extend(
                verdict
                    .params
                    .iter()
                    .filter(|param| !conditioning.contains(&param.as_str()))
                    .cloned(),
            );
            let Some(cause) = causes.first() else {
                continue;
            };
            let mut error = CEK::MemberNotCoveredByCondition {
                member_kind: member.kind,
                member: member.name.to_string(),
                aggregate: self.decl.name.clone(),
                cause: cause.clone(),
                cap,
            }
            .at(member.span);
            for other in &causes[1..] {
                error = error.with_note(member.span, format!("also non-{cap} through '{other}'"));
            }
            self.errors.push(error);
        }
    }

    /// Requirements of the conditional extension other than
    /// `Param: Capability` on the aggregate's own parameters.
    fn check_condition_requirements(&mut self, cap: Capability, extension: usize) {
        let DeclKind::Extension(ext) = &self.env.decl(extension).kind else {
            return;
        };
        for req in &ext.where_clause {
            if !self.is_capability_condition(req) {
                self.errors.push(
                    CEK::ConditionalRequirementNotCapability {
                        aggregate: self.decl.name.clone(),
                        requirement: render_requirement(req),
                        cap,
                    }
                    .at(req.span),
                );
            }
        }
    }

    fn is_capability_condition(&self, req: &Requirement) -> bool {
        let RequirementKind::Conformance {
            subject,
            constraint,
        } = &req.kind
        else {
            return false;
        };
        let own_param = subject
            .simple_name()
            .is_some_and(|name| self.nominal.generics.params().iter().any(|p| p.name == name));
        own_param
            && classify(constraint)
                .iter()
                .all(|item| matches!(item, ConstraintItem::Claim(..)))
    }

    fn check_deinit(&mut self, cap: Capability) {
        if cap != Capability::Copyable {
            return;
        }
        for member in &self.nominal.members {
            if let Member::Deinit { span, .. } = member {
                self.errors.push(
                    CEK::DeinitOnCopyable {
                        kind: self.nominal.kind.describe(),
                        aggregate: self.decl.name.clone(),
                    }
                    .at(*span),
                );
            }
        }
    }
}

fn render_requirement(req: &Requirement) -> String {
    match &req.kind {
        RequirementKind::Conformance {
            subject,
            constraint,
        } => format!("{}: {}", render_type(subject), render_type(constraint)),
        RequirementKind::SameType { first, second } => {
            format!("{} == {}", render_type(first), render_type(second))
        }
    }
}
