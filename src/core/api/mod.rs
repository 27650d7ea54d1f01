//! Front-end entry points.
//!
//! Callers hand in syntax trees for type building and declaration modules
//! for capability checking; both sides report through plain error vectors or
//! a `DiagnosticSink`.

use tracing::debug;

use crate::core::capability::{self, Capability, CapabilityError};
use crate::core::decl::Module;
use crate::core::diagnostics::{DiagnosticRecord, DiagnosticSink};
use crate::core::repr::{
    BuildError, BuilderOptions, DeferredAttrPolicy, LegacyTypeBuilder, TypeRepr, TypeReprBuilder,
};
use crate::core::tree::{NodeId, SyntaxFile, SyntaxTree};

/// Front-end configuration shared by the builder and the checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontendOptions {
    pub deferred_attrs: DeferredAttrPolicy,
    /// Capabilities the checker reasons about. A capability left out is
    /// treated as always present.
    pub capabilities: Vec<Capability>,
}

impl Default for FrontendOptions {
    fn default() -> Self {
        Self {
            deferred_attrs: DeferredAttrPolicy::default(),
            capabilities: Capability::ALL.to_vec(),
        }
    }
}

impl FrontendOptions {
    fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            deferred_attrs: self.deferred_attrs,
        }
    }
}

/// Builds the type rooted at `node`, delegating unmigrated subtrees to
/// `legacy`.
pub fn build_type(
    tree: &SyntaxTree,
    node: NodeId,
    legacy: &mut dyn LegacyTypeBuilder,
    options: &FrontendOptions,
) -> (TypeRepr, Vec<BuildError>) {
    let mut builder = TypeReprBuilder::new(tree, legacy, options.builder_options());
    let repr = builder.build(node);
    (repr, builder.into_errors())
}

/// Pushes one record per builder diagnostic into `sink`. Returns the number
/// of records emitted.
pub fn report_build_errors(
    errors: &[BuildError],
    file: Option<&str>,
    sink: &mut dyn DiagnosticSink,
) -> usize {
    for error in errors {
        sink.emit(DiagnosticRecord::from_build_error(error, file));
    }
    errors.len()
}

/// Builds every listed type node of `syntax` in order and reports builder
/// diagnostics through `sink`.
pub fn build_types(
    syntax: &SyntaxFile,
    legacy: &mut dyn LegacyTypeBuilder,
    options: &FrontendOptions,
    sink: &mut dyn DiagnosticSink,
) -> Vec<TypeRepr> {
    let file = syntax.file.as_deref();
    let mut reported = 0;
    let mut types = Vec::with_capacity(syntax.types.len());
    for &node in &syntax.types {
        let (repr, errors) = build_type(&syntax.tree, node, legacy, options);
        reported += report_build_errors(&errors, file, sink);
        types.push(repr);
    }
    debug!(
        file = file.unwrap_or("<memory>"),
        types = types.len(),
        errors = reported,
        "type building finished"
    );
    types
}

pub fn check_module(module: &Module, options: &FrontendOptions) -> Vec<CapabilityError> {
    capability::check(module, &options.capabilities)
}

/// Checks `module` and pushes one record per diagnostic into `sink`.
/// Returns the number of records emitted.
pub fn run_frontend(
    module: &Module,
    options: &FrontendOptions,
    sink: &mut dyn DiagnosticSink,
) -> usize {
    let errors = check_module(module, options);
    debug!(
        file = module.file.as_deref().unwrap_or("<memory>"),
        decls = module.decls.len(),
        errors = errors.len(),
        "frontend finished"
    );
    let file = module.file.as_deref();
    for error in &errors {
        sink.emit(DiagnosticRecord::from_capability_error(error, file));
    }
    errors.len()
}
