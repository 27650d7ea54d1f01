//! Suppressible-capability checking (`Copyable`, `Escapable`).
//!
//! Phase order is fixed: collect, solve, substitute, conform. Each phase
//! records errors per declaration and never stops the pipeline.

mod builtins;
mod collect;
mod conform;
mod constraint;
mod engine;
mod env;
mod solve;
mod substitute;
mod union_find;
mod verdict;

pub mod errors;
pub mod model;

pub use errors::{CEK, CapabilityError, CapabilityErrorKind};
pub use model::{Capability, CapabilityRequirement, Conformance, Verdict};

use crate::core::decl::Module;

/// Checks every declaration of `module` for the enabled capabilities.
pub fn check(module: &Module, caps: &[Capability]) -> Vec<CapabilityError> {
    engine::CapabilityEngine::new(module, caps).run()
}

#[cfg(test)]
#[path = "../../tests/capability/t_solve.rs"]
mod tests_solve;

#[cfg(test)]
#[path = "../../tests/capability/t_substitute.rs"]
mod tests_substitute;

#[cfg(test)]
#[path = "../../tests/capability/t_conform.rs"]
mod tests_conform;

#[cfg(test)]
#[path = "../../tests/capability/t_union_find.rs"]
mod tests_union_find;

#[cfg(test)]
#[path = "../../tests/capability/t_verdict.rs"]
mod tests_verdict;
