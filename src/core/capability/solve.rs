//! Phase 2: per-signature capability solve.
//!
//! Every declaration with a generic context gets one `SigSolver`. Subjects
//! are generic parameters, `Self`, associated types and the dependent member
//! types mentioned in requirements. Each subject collects marks:
//! - inverses (`T: ~Copyable`), only allowed on local subjects,
//! - claims, each with the origin that produced it.
//!
//! Local conflicts (claim and inverse on one subject) are reported first.
//! Same-type requirements then join subjects in a union-find; a join that
//! brings a suppressed subject together with a claiming one is reported at
//! the requirement clause. Each class resolves to one requirement per
//! capability, and same-type bindings to concrete types are checked last,
//! once every signature is available for evaluating them.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::core::capability::constraint::{
    ConstraintItem, classify, classify_all, inverse_span, split_dependent, subject_key,
};
use crate::core::capability::engine::{CapabilityEngine, CkEnv};
use crate::core::capability::env::param_items;
use crate::core::capability::errors::{CEK, CapabilityError};
use crate::core::capability::model::{Capability, CapabilityRequirement};
use crate::core::capability::union_find::UnionFind;
use crate::core::capability::verdict::Evaluator;
use crate::core::decl::{DeclKind, GenericSig, Requirement, RequirementKind};
use crate::core::diag::Span;
use crate::core::repr::{TypeRepr, render_type};

const CAP_COUNT: usize = Capability::ALL.len();

/// Resolved capability facts for one declaration's generic context.
#[derive(Debug, Clone, Default)]
pub(crate) struct SolvedSig {
    subjects: IndexMap<String, SubjectFacts>,
    /// Bare associated type names in a protocol, mapped to `Self.Name`.
    aliases: HashMap<String, String>,
    /// Union-find root of every subject, by subject index.
    classes: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct SubjectFacts {
    pub(crate) span: Span,
    pub(crate) protocols: Vec<String>,
    requirement: [CapabilityRequirement; CAP_COUNT],
}

impl SolvedSig {
    pub(crate) fn facts(&self, key: &str) -> Option<&SubjectFacts> {
        self.subjects.get(&canonical(&self.aliases, key))
    }

    pub(crate) fn requirement(&self, key: &str, cap: Capability) -> Option<CapabilityRequirement> {
        self.facts(key).map(|facts| facts.requirement[cap.index()])
    }

    fn set_class_requirement(&mut self, subject: usize, cap: Capability, req: CapabilityRequirement) {
        let root = self.classes[subject];
        for (idx, facts) in self.subjects.values_mut().enumerate() {
            if self.classes[idx] == root {
                facts.requirement[cap.index()] = req;
            }
        }
    }
}

fn display_key(owner: &str, key: &str) -> String {
    match key.strip_prefix("Self") {
        Some(rest) if !owner.is_empty() && (rest.is_empty() || rest.starts_with('.')) => {
            format!("{owner}{rest}")
        }
        _ => key.to_string(),
    }
}

fn canonical(aliases: &HashMap<String, String>, key: &str) -> String {
    let (head, rest) = match key.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };
    match (aliases.get(head), rest) {
        (Some(full), Some(rest)) => format!("{full}.{rest}"),
        (Some(full), None) => full.clone(),
        (None, _) => key.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClaimOrigin {
    Explicit,
    /// The extended declaration never suppressed this parameter.
    OuterDecl(String),
    Protocol(String),
    /// An associated type the subject resolves to does not suppress.
    Associated(String),
    /// Unmarked local subjects carry every capability.
    Default,
}

impl ClaimOrigin {
    fn rank(&self) -> u8 {
        match self {
            ClaimOrigin::Explicit => 0,
            ClaimOrigin::OuterDecl(_) => 1,
            ClaimOrigin::Protocol(_) => 2,
            ClaimOrigin::Associated(_) => 3,
            ClaimOrigin::Default => 4,
        }
    }

    /// Origins that contradict an inverse on the same subject.
    fn is_stated(&self) -> bool {
        self.rank() <= 2
    }

    fn describe(&self) -> String {
        match self {
            ClaimOrigin::Explicit => "an explicit requirement".to_string(),
            ClaimOrigin::OuterDecl(name) => format!("the declaration of '{name}'"),
            ClaimOrigin::Protocol(name) => format!("its conformance to '{name}'"),
            ClaimOrigin::Associated(path) => format!("associated type '{path}'"),
            ClaimOrigin::Default => "the default for unmarked generic parameters".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Claim {
    origin: ClaimOrigin,
    span: Span,
}

#[derive(Debug)]
struct Subject {
    key: String,
    span: Span,
    local: bool,
    protocols: Vec<String>,
    inverse: [Option<Span>; CAP_COUNT],
    claims: [Vec<Claim>; CAP_COUNT],
    conflicted: [bool; CAP_COUNT],
}

impl Subject {
    fn new(key: String, span: Span, local: bool) -> Self {
        Self {
            key,
            span,
            local,
            protocols: Vec::new(),
            inverse: [None; CAP_COUNT],
            claims: Default::default(),
            conflicted: [false; CAP_COUNT],
        }
    }

    fn best_claim(&self, cap: Capability) -> Option<&Claim> {
        self.claims[cap.index()].iter().min_by_key(|claim| claim.origin.rank())
    }
}

/// Per-class, per-capability facts tracked while merging.
#[derive(Debug, Clone, Default)]
struct ClassFacts {
    suppressors: Vec<usize>,
    claimers: Vec<usize>,
    tainted: bool,
}

/// Same-type binding of a subject to a concrete type, checked once every
/// signature has been solved.
struct PendingBinding<'m> {
    subject: usize,
    ty: &'m TypeRepr,
    span: Span,
}

struct SigSolver<'e, 'm> {
    env: &'e CkEnv<'m>,
    /// Name substituted for `Self` in messages.
    owner: String,
    subjects: IndexMap<String, Subject>,
    aliases: HashMap<String, String>,
    edges: Vec<(usize, usize, Span)>,
    bindings: Vec<PendingBinding<'m>>,
    errors: Vec<CapabilityError>,
}

pub(super) fn run(engine: &mut CapabilityEngine<'_>) {
    let (env, state) = engine.split();

    let mut pending = Vec::new();
    for (idx, decl) in env.module.decls.iter().enumerate() {
        let mut solver = SigSolver::new(env);
        solver.collect(idx);
        let (sig, bindings, errors) = solver.solve();
        trace!(decl = %decl.name, subjects = sig.subjects.len(), "solved signature");
        state.report_all(idx, errors);
        state.sigs.insert(idx, sig);
        if !bindings.is_empty() {
            pending.push((idx, bindings));
        }
    }

    // Concrete bindings may mention any declaration, so they are evaluated
    // against the complete signature table.
    let mut updates = Vec::new();
    {
        let eval = Evaluator::new(env, &state.sigs);
        for (idx, bindings) in &pending {
            let Some(sig) = state.sigs.get(idx) else {
                continue;
            };
            for binding in bindings {
                let key = sig
                    .subjects
                    .get_index(binding.subject)
                    .map(|(key, _)| key.clone())
                    .unwrap_or_default();
                for &cap in &env.caps {
                    let current = sig.requirement(&key, cap);
                    let verdict = eval.eval(sig, binding.ty, cap);
                    match (current, verdict.requirement) {
                        (Some(CapabilityRequirement::Present), CapabilityRequirement::Suppressed) => {
                            let error = CEK::SameTypeConcreteConflict {
                                subject: key.clone(),
                                ty: render_type(binding.ty),
                                cap,
                            }
                            .at(binding.span);
                            updates.push((
                                *idx,
                                binding.subject,
                                cap,
                                CapabilityRequirement::Unresolved,
                                Some(error),
                            ));
                        }
                        (Some(CapabilityRequirement::Suppressed), CapabilityRequirement::Present) => {
                            updates.push((
                                *idx,
                                binding.subject,
                                cap,
                                CapabilityRequirement::Present,
                                None,
                            ));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    for (idx, subject, cap, req, error) in updates {
        if let Some(sig) = state.sigs.get_mut(&idx) {
            sig.set_class_requirement(subject, cap, req);
        }
        if let Some(error) = error {
            state.report(idx, error);
        }
    }
}

impl<'e, 'm> SigSolver<'e, 'm> {
    fn new(env: &'e CkEnv<'m>) -> Self {
        Self {
            env,
            owner: String::new(),
            subjects: IndexMap::new(),
            aliases: HashMap::new(),
            edges: Vec::new(),
            bindings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn collect(&mut self, idx: usize) {
        let decl = self.env.decl(idx);
        self.owner = decl.name.clone();
        match &decl.kind {
            DeclKind::Nominal(nominal) => {
                let self_idx = self.declare("Self", decl.name_span, true);
                self.declare_params(&nominal.generics);
                // Inverses on a class were already rejected by collect.
                let allow_inverse = !nominal.kind.is_class_like();
                self.apply(self_idx, classify_all(&nominal.inherited), false, allow_inverse);
                self.constrain_params(&nominal.generics);
            }
            DeclKind::Protocol(proto) => {
                let self_idx = self.declare("Self", decl.name_span, true);
                for assoc in &proto.assoc_types {
                    let key = format!("Self.{}", assoc.name);
                    self.declare(&key, assoc.span, true);
                    self.aliases.insert(assoc.name.clone(), key);
                }
                self.apply(self_idx, classify_all(&proto.inherited), false, true);
                for assoc in &proto.assoc_types {
                    let key = format!("Self.{}", assoc.name);
                    if let Some(assoc_idx) = self.subjects.get_index_of(&key) {
                        self.apply(assoc_idx, classify_all(&assoc.inherited), true, true);
                    }
                }
                for req in &proto.where_clause {
                    self.requirement(req);
                }
            }
            DeclKind::Extension(ext) => {
                let Some((_, nominal_decl, nominal)) = ext
                    .extended
                    .as_ident()
                    .and_then(|ident| self.env.nominal(&ident.name))
                else {
                    return;
                };
                for param in nominal.generics.params() {
                    let param_idx = self.declare(&param.name, param.span, true);
                    let items = param_items(&nominal.generics, &param.name);
                    for item in &items {
                        if let ConstraintItem::Protocol(proto, _) = item {
                            self.subjects[param_idx].protocols.push(proto.to_string());
                        }
                    }
                    for &cap in &self.env.caps {
                        if inverse_span(&items, cap).is_none() {
                            self.subjects[param_idx].claims[cap.index()].push(Claim {
                                origin: ClaimOrigin::OuterDecl(nominal_decl.name.clone()),
                                span: param.span,
                            });
                        }
                    }
                }
                for req in &ext.where_clause {
                    self.requirement(req);
                }
            }
            DeclKind::TypeAlias(alias) => {
                self.declare_params(&alias.generics);
                self.constrain_params(&alias.generics);
            }
            DeclKind::Func(func) => {
                self.declare_params(&func.generics);
                self.constrain_params(&func.generics);
            }
        }
    }

    fn declare(&mut self, key: &str, span: Span, local: bool) -> usize {
        if let Some(idx) = self.subjects.get_index_of(key) {
            return idx;
        }
        let (idx, _) = self
            .subjects
            .insert_full(key.to_string(), Subject::new(key.to_string(), span, local));
        idx
    }

    fn declare_params(&mut self, generics: &GenericSig) {
        for param in generics.params() {
            self.declare(&param.name, param.span, true);
        }
    }

    fn constrain_params(&mut self, generics: &'m GenericSig) {
        for param in generics.params() {
            if let Some(idx) = self.subjects.get_index_of(&param.name) {
                self.apply(idx, classify_all(&param.inherited), true, true);
            }
        }
        for req in &generics.where_clause {
            self.requirement(req);
        }
    }

    /// Subject named by `ty`, creating dependent member subjects on demand.
    fn lookup(&mut self, ty: &TypeRepr) -> Option<usize> {
        let key = canonical(&self.aliases, &subject_key(ty)?);
        self.lookup_key(&key, ty.span)
    }

    fn lookup_key(&mut self, key: &str, span: Span) -> Option<usize> {
        if let Some(idx) = self.subjects.get_index_of(key) {
            return Some(idx);
        }
        let (base, _) = split_dependent(key)?;
        self.lookup_key(base, span)?;
        Some(self.declare(key, span, false))
    }

    fn requirement(&mut self, req: &'m Requirement) {
        match &req.kind {
            RequirementKind::Conformance {
                subject,
                constraint,
            } => match self.lookup(subject) {
                Some(idx) => self.apply(idx, classify(constraint), true, true),
                None => {
                    for item in classify(constraint) {
                        match item {
                            ConstraintItem::Inverse(cap, span) if self.env.caps.contains(&cap) => {
                                self.errors.push(
                                    CEK::InverseNotOnLocalParam {
                                        subject: render_type(subject),
                                        cap,
                                    }
                                    .at(span),
                                );
                            }
                            ConstraintItem::BadInverse(name, span) => {
                                self.errors.push(CEK::NotSuppressible(name).at(span));
                            }
                            _ => {}
                        }
                    }
                }
            },
            RequirementKind::SameType { first, second } => {
                match (self.lookup(first), self.lookup(second)) {
                    (Some(a), Some(b)) => self.edges.push((a, b, req.span)),
                    (Some(subject), None) => self.bindings.push(PendingBinding {
                        subject,
                        ty: second,
                        span: req.span,
                    }),
                    (None, Some(subject)) => self.bindings.push(PendingBinding {
                        subject,
                        ty: first,
                        span: req.span,
                    }),
                    (None, None) => {}
                }
            }
        }
    }

    fn apply(
        &mut self,
        idx: usize,
        items: Vec<ConstraintItem<'_>>,
        report_bad: bool,
        allow_inverse: bool,
    ) {
        let caps = self.env.caps.clone();
        for item in items {
            match item {
                ConstraintItem::Claim(cap, span) if caps.contains(&cap) => {
                    self.subjects[idx].claims[cap.index()].push(Claim {
                        origin: ClaimOrigin::Explicit,
                        span,
                    });
                }
                ConstraintItem::Inverse(cap, span) if allow_inverse && caps.contains(&cap) => {
                    let subject = &mut self.subjects[idx];
                    if subject.local {
                        if subject.inverse[cap.index()].is_none() {
                            subject.inverse[cap.index()] = Some(span);
                        }
                    } else {
                        self.errors.push(
                            CEK::InverseNotOnLocalParam {
                                subject: display_key(&self.owner, &subject.key),
                                cap,
                            }
                            .at(span),
                        );
                    }
                }
                ConstraintItem::BadInverse(name, span) if report_bad => {
                    self.errors.push(CEK::NotSuppressible(name).at(span));
                }
                ConstraintItem::Protocol(proto, span) => {
                    self.subjects[idx].protocols.push(proto.to_string());
                    for &cap in &caps {
                        if self.env.protocol_requires(proto, cap) {
                            self.subjects[idx].claims[cap.index()].push(Claim {
                                origin: ClaimOrigin::Protocol(proto.to_string()),
                                span,
                            });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn solve(mut self) -> (SolvedSig, Vec<PendingBinding<'m>>, Vec<CapabilityError>) {
        self.add_defaults();
        self.check_local_conflicts();
        let (roots, facts) = self.unify();
        let sig = self.resolve(roots, &facts);
        (sig, self.bindings, self.errors)
    }

    fn add_defaults(&mut self) {
        for idx in 0..self.subjects.len() {
            for &cap in &self.env.caps {
                let subject = &self.subjects[idx];
                if subject.inverse[cap.index()].is_some() {
                    continue;
                }
                let claim = if subject.local {
                    Some(Claim {
                        origin: ClaimOrigin::Default,
                        span: subject.span,
                    })
                } else {
                    self.associated_default(&subject.key, cap).map(|origin| Claim {
                        origin,
                        span: subject.span,
                    })
                };
                if let Some(claim) = claim {
                    self.subjects[idx].claims[cap.index()].push(claim);
                }
            }
        }
    }

    fn associated_default(&self, key: &str, cap: Capability) -> Option<ClaimOrigin> {
        let (base, assoc) = split_dependent(key)?;
        let base = self.subjects.get(base)?;
        for proto in &base.protocols {
            match self.env.assoc_suppresses(proto, assoc, cap) {
                Some(false) => return Some(ClaimOrigin::Associated(format!("{proto}.{assoc}"))),
                Some(true) => return None,
                None => {}
            }
        }
        None
    }

    fn check_local_conflicts(&mut self) {
        let owner = self.owner.clone();
        for subject in self.subjects.values_mut() {
            for &cap in &self.env.caps {
                let Some(inverse) = subject.inverse[cap.index()] else {
                    continue;
                };
                let mut stated: Vec<&Claim> = subject.claims[cap.index()]
                    .iter()
                    .filter(|claim| claim.origin.is_stated())
                    .collect();
                if stated.is_empty() {
                    continue;
                }
                stated.sort_by_key(|claim| claim.origin.rank());

                let name = display_key(&owner, &subject.key);
                let primary = stated[0];
                let mut error = CEK::ConflictingRequirement {
                    subject: name.clone(),
                    cap,
                    origin: primary.origin.describe(),
                }
                .at(inverse)
                .with_note(primary.span, format!("'{name}: {cap}' is required here"));
                for claim in &stated[1..] {
                    error = error.with_note(
                        claim.span,
                        format!("also required by {}", claim.origin.describe()),
                    );
                }
                debug!(subject = %name, %cap, "conflicting capability requirement");
                self.errors.push(error);
                subject.conflicted[cap.index()] = true;
            }
        }
    }

    /// Runs the same-type edges through a union-find, per capability.
    /// Returns the root of every subject and the facts held at each root.
    fn unify(&mut self) -> (Vec<usize>, Vec<[ClassFacts; CAP_COUNT]>) {
        let count = self.subjects.len();
        let mut uf = UnionFind::with_size(count);
        let mut facts: Vec<[ClassFacts; CAP_COUNT]> = (0..count)
            .map(|idx| {
                let subject = &self.subjects[idx];
                std::array::from_fn(|ci| {
                    let cap = Capability::ALL[ci];
                    if subject.conflicted[ci] {
                        return ClassFacts {
                            tainted: true,
                            ..ClassFacts::default()
                        };
                    }
                    ClassFacts {
                        suppressors: subject.inverse[ci].map(|_| idx).into_iter().collect(),
                        claimers: subject.best_claim(cap).map(|_| idx).into_iter().collect(),
                        tainted: false,
                    }
                })
            })
            .collect();

        for (a, b, span) in self.edges.clone() {
            let (ra, rb) = (uf.find(a), uf.find(b));
            if ra == rb {
                trace!(a, b, "same-type requirement already implied");
                continue;
            }
            let mut conflict = [false; CAP_COUNT];
            for &cap in &self.env.caps {
                let ci = cap.index();
                for (sup, other) in [(ra, rb), (rb, ra)] {
                    if facts[sup][ci].suppressors.is_empty() || facts[other][ci].claimers.is_empty()
                    {
                        continue;
                    }
                    let mut claimers = facts[other][ci].claimers.clone();
                    claimers.sort_by_key(|&c| {
                        self.subjects[c].best_claim(cap).map_or(u8::MAX, |claim| claim.origin.rank())
                    });
                    for &suppressor in &facts[sup][ci].suppressors {
                        let error = self.same_type_conflict(suppressor, &claimers, cap, span);
                        self.errors.push(error);
                        conflict[ci] = true;
                    }
                }
            }

            let root = uf.union(ra, rb);
            let (from, into) = if root == ra { (rb, ra) } else { (ra, rb) };
            for ci in 0..CAP_COUNT {
                let moved = std::mem::take(&mut facts[from][ci]);
                let target = &mut facts[into][ci];
                target.suppressors.extend(moved.suppressors);
                target.claimers.extend(moved.claimers);
                target.tainted |= moved.tainted || conflict[ci];
            }
        }

        let roots = (0..count).map(|idx| uf.find(idx)).collect();
        (roots, facts)
    }

    fn same_type_conflict(
        &self,
        suppressor: usize,
        claimers: &[usize],
        cap: Capability,
        span: Span,
    ) -> CapabilityError {
        let suppressed = &self.subjects[suppressor];
        let suppressed_name = display_key(&self.owner, &suppressed.key);
        let other_name = display_key(&self.owner, &self.subjects[claimers[0]].key);
        debug!(
            suppressed = %suppressed_name,
            other = %other_name,
            %cap,
            "same-type capability conflict"
        );

        let mut error = CEK::SameTypeConflict {
            suppressed: suppressed_name.clone(),
            other: other_name,
            cap,
        }
        .at(span);
        if let Some(inverse) = suppressed.inverse[cap.index()] {
            error = error.with_note(inverse, format!("'{suppressed_name}' is marked '~{cap}' here"));
        }
        for &claimer in claimers {
            let subject = &self.subjects[claimer];
            if let Some(claim) = subject.best_claim(cap) {
                error = error.with_note(
                    claim.span,
                    format!(
                        "'{}' requires '{cap}' through {}",
                        display_key(&self.owner, &subject.key),
                        claim.origin.describe()
                    ),
                );
            }
        }
        error
    }

    fn resolve(&self, roots: Vec<usize>, facts: &[[ClassFacts; CAP_COUNT]]) -> SolvedSig {
        let mut sig = SolvedSig {
            subjects: IndexMap::new(),
            aliases: self.aliases.clone(),
            classes: Vec::new(),
        };
        for (idx, (key, subject)) in self.subjects.iter().enumerate() {
            let class = &facts[roots[idx]];
            let requirement = std::array::from_fn(|ci| {
                let cap = Capability::ALL[ci];
                let fact = &class[ci];
                if !self.env.caps.contains(&cap) {
                    CapabilityRequirement::Present
                } else if fact.tainted {
                    CapabilityRequirement::Unresolved
                } else if !fact.suppressors.is_empty() {
                    CapabilityRequirement::Suppressed
                } else if !fact.claimers.is_empty() {
                    CapabilityRequirement::Present
                } else {
                    CapabilityRequirement::Unresolved
                }
            });
            sig.subjects.insert(
                key.clone(),
                SubjectFacts {
                    span: subject.span,
                    protocols: subject.protocols.clone(),
                    requirement,
                },
            );
        }
        sig.classes = roots;
        sig
    }
}
