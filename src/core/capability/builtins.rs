//! Standard-library generic types and protocols the checker knows without
//! seeing their declarations.

use crate::core::capability::model::Capability;

const BOTH: &[Capability] = &[Capability::Copyable, Capability::Escapable];
const COPYABLE: &[Capability] = &[Capability::Copyable];
const ESCAPABLE: &[Capability] = &[Capability::Escapable];

#[derive(Debug, Clone, Copy)]
pub(crate) struct BuiltinParam {
    pub(crate) name: &'static str,
    /// Capabilities this parameter does not require of its argument.
    pub(crate) suppresses: &'static [Capability],
}

impl BuiltinParam {
    pub(crate) fn requires(&self, cap: Capability) -> bool {
        !self.suppresses.contains(&cap)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BuiltinGeneric {
    pub(crate) name: &'static str,
    pub(crate) params: &'static [BuiltinParam],
    /// The type carries a capability only when every argument for a
    /// parameter suppressing it does. Otherwise the type always carries it.
    pub(crate) conditional: bool,
}

const fn param(name: &'static str, suppresses: &'static [Capability]) -> BuiltinParam {
    BuiltinParam { name, suppresses }
}

const BUILTIN_GENERICS: &[BuiltinGeneric] = &[
    BuiltinGeneric {
        name: "Optional",
        params: &[param("Wrapped", BOTH)],
        conditional: true,
    },
    BuiltinGeneric {
        name: "Result",
        params: &[param("Success", COPYABLE), param("Failure", &[])],
        conditional: true,
    },
    BuiltinGeneric {
        name: "Array",
        params: &[param("Element", &[])],
        conditional: false,
    },
    BuiltinGeneric {
        name: "ContiguousArray",
        params: &[param("Element", &[])],
        conditional: false,
    },
    BuiltinGeneric {
        name: "Set",
        params: &[param("Element", &[])],
        conditional: false,
    },
    BuiltinGeneric {
        name: "Dictionary",
        params: &[param("Key", &[]), param("Value", &[])],
        conditional: false,
    },
    BuiltinGeneric {
        name: "UnsafePointer",
        params: &[param("Pointee", COPYABLE)],
        conditional: false,
    },
    BuiltinGeneric {
        name: "UnsafeMutablePointer",
        params: &[param("Pointee", COPYABLE)],
        conditional: false,
    },
    BuiltinGeneric {
        name: "UnsafeBufferPointer",
        params: &[param("Element", COPYABLE)],
        conditional: false,
    },
    BuiltinGeneric {
        name: "MemoryLayout",
        params: &[param("T", BOTH)],
        conditional: false,
    },
];

/// Protocols whose `Self` does not require the listed capabilities.
const SUPPRESSING_PROTOCOLS: &[(&str, &[Capability])] = &[
    ("Sendable", BOTH),
    ("SendableMetatype", BOTH),
    ("BitwiseCopyable", ESCAPABLE),
];

pub(crate) fn builtin_generic(name: &str) -> Option<&'static BuiltinGeneric> {
    BUILTIN_GENERICS.iter().find(|generic| generic.name == name)
}

/// Whether a protocol the module does not declare requires `cap` of its
/// conformers.
pub(crate) fn external_protocol_requires(name: &str, cap: Capability) -> bool {
    SUPPRESSING_PROTOCOLS
        .iter()
        .find(|(proto, _)| *proto == name)
        .is_none_or(|(_, caps)| !caps.contains(&cap))
}
