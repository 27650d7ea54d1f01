use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Suppressible default capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    Copyable,
    Escapable,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Copyable, Capability::Escapable];

    pub fn name(self) -> &'static str {
        match self {
            Capability::Copyable => "Copyable",
            Capability::Escapable => "Escapable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cap| cap.name() == name)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityRequirement {
    Present,
    Suppressed,
    /// Not known yet: a dependent type without facts, an error type, or an
    /// entity whose annotations conflict.
    Unresolved,
}

/// How an aggregate conforms to a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conformance {
    /// Always conforms. `implicit` when no annotation spelled it out.
    Unconditional { implicit: bool },
    /// Conforms when each listed generic parameter (by index) does.
    Conditional {
        params: Vec<usize>,
        extension: usize,
    },
    None,
    /// Annotations on the declaration itself contradict each other.
    Conflicted,
}

/// Capability of a type in some generic context, with the reasons it is
/// suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub requirement: CapabilityRequirement,
    /// Generic parameters whose suppression flows into the type.
    pub params: IndexSet<String>,
    /// Concrete suppressed types that flow into the type.
    pub concrete: IndexSet<String>,
}

impl Verdict {
    pub fn present() -> Self {
        Self::with(CapabilityRequirement::Present)
    }

    pub fn unresolved() -> Self {
        Self::with(CapabilityRequirement::Unresolved)
    }

    pub fn by_param(name: impl Into<String>) -> Self {
        let mut verdict = Self::with(CapabilityRequirement::Suppressed);
        verdict.params.insert(name.into());
        verdict
    }

    pub fn by_concrete(name: impl Into<String>) -> Self {
        let mut verdict = Self::with(CapabilityRequirement::Suppressed);
        verdict.concrete.insert(name.into());
        verdict
    }

    fn with(requirement: CapabilityRequirement) -> Self {
        Self {
            requirement,
            params: IndexSet::new(),
            concrete: IndexSet::new(),
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.requirement == CapabilityRequirement::Suppressed
    }

    /// Verdict of an aggregate that needs every part to carry the capability.
    pub fn all_of(parts: impl IntoIterator<Item = Verdict>) -> Self {
        let mut out = Self::present();
        for part in parts {
            match (out.requirement, part.requirement) {
                (_, CapabilityRequirement::Suppressed) => {
                    if out.requirement != CapabilityRequirement::Suppressed {
                        out.params.clear();
                        out.concrete.clear();
                    }
                    out.requirement = CapabilityRequirement::Suppressed;
                    out.params.extend(part.params);
                    out.concrete.extend(part.concrete);
                }
                (CapabilityRequirement::Present, CapabilityRequirement::Unresolved) => {
                    out.requirement = CapabilityRequirement::Unresolved;
                }
                _ => {}
            }
        }
        out
    }
}
