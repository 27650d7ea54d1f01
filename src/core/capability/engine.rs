//! Capability check engine and shared phase state.
//!
//! `CapabilityEngine` wires phase order and owns:
//! - the declaration index and conformance table built by collect (`CkEnv`),
//! - per-phase outputs (`CkState`).
//!
//! Phases never abort: every declaration is checked even when another one
//! already failed.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::core::capability::errors::CapabilityError;
use crate::core::capability::model::{Capability, Conformance};
use crate::core::capability::solve::SolvedSig;
use crate::core::decl::{Decl, Module};

use super::{collect, conform, solve, substitute};

static IMPLICIT_CONFORMANCE: Conformance = Conformance::Unconditional { implicit: true };

/// Declaration index and facts derived from declarations alone.
pub(crate) struct CkEnv<'m> {
    pub(crate) module: &'m Module,
    pub(crate) caps: Vec<Capability>,
    pub(crate) nominals: IndexMap<String, usize>,
    pub(crate) protocols: IndexMap<String, usize>,
    pub(crate) aliases: IndexMap<String, usize>,
    pub(crate) funcs: IndexMap<String, usize>,
    /// Extended nominal name -> extension declarations, in source order.
    pub(crate) extensions: IndexMap<String, Vec<usize>>,
    pub(crate) conformances: HashMap<(usize, Capability), Conformance>,
}

#[derive(Debug, Default)]
pub(crate) struct CkState {
    /// Errors tagged with the index of the declaration they belong to.
    pub(crate) errors: Vec<(usize, CapabilityError)>,
    pub(crate) phase: Option<CkPhase>,
    pub(crate) sigs: HashMap<usize, SolvedSig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CkPhase {
    Collect,
    Solve,
    Substitute,
    Conform,
}

pub(crate) struct CapabilityEngine<'m> {
    env: CkEnv<'m>,
    state: CkState,
}

impl<'m> CapabilityEngine<'m> {
    pub(crate) fn new(module: &'m Module, caps: &[Capability]) -> Self {
        Self {
            env: CkEnv {
                module,
                caps: caps.to_vec(),
                nominals: IndexMap::new(),
                protocols: IndexMap::new(),
                aliases: IndexMap::new(),
                funcs: IndexMap::new(),
                extensions: IndexMap::new(),
                conformances: HashMap::new(),
            },
            state: CkState::default(),
        }
    }

    pub(crate) fn run(mut self) -> Vec<CapabilityError> {
        self.run_phase(CkPhase::Collect, collect::run);
        self.run_phase(CkPhase::Solve, solve::run);
        self.run_phase(CkPhase::Substitute, substitute::run);
        self.run_phase(CkPhase::Conform, conform::run);

        // Group by declaration; order inside a declaration follows the phases.
        let mut errors = std::mem::take(&mut self.state.errors);
        errors.sort_by_key(|(decl, _)| *decl);
        errors.into_iter().map(|(_, error)| error).collect()
    }

    fn run_phase(&mut self, phase: CkPhase, run: fn(&mut CapabilityEngine<'m>)) {
        self.state.phase = Some(phase);
        let before = self.state.errors.len();
        run(self);
        debug!(
            ?phase,
            new_errors = self.state.errors.len() - before,
            "capability phase done"
        );
    }

    pub(crate) fn env(&self) -> &CkEnv<'m> {
        &self.env
    }

    pub(crate) fn env_mut(&mut self) -> &mut CkEnv<'m> {
        &mut self.env
    }

    pub(crate) fn state(&self) -> &CkState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut CkState {
        &mut self.state
    }

    /// Immutable environment next to mutable state, for phases that read
    /// one while filling the other.
    pub(crate) fn split(&mut self) -> (&CkEnv<'m>, &mut CkState) {
        (&self.env, &mut self.state)
    }
}

impl CkState {
    pub(crate) fn report(&mut self, decl: usize, error: CapabilityError) {
        debug!(decl, code = error.kind().code(), %error, "capability error");
        self.errors.push((decl, error));
    }

    pub(crate) fn report_all(&mut self, decl: usize, errors: Vec<CapabilityError>) {
        for error in errors {
            self.report(decl, error);
        }
    }
}

impl<'m> CkEnv<'m> {
    pub(crate) fn decl(&self, idx: usize) -> &'m Decl {
        &self.module.decls[idx]
    }

    pub(crate) fn conformance(&self, idx: usize, cap: Capability) -> &Conformance {
        self.conformances
            .get(&(idx, cap))
            .unwrap_or(&IMPLICIT_CONFORMANCE)
    }
}
