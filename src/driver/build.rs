use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::api::{FrontendOptions, build_types};
use crate::core::diag::Span;
use crate::core::diagnostics::{DiagnosticRecord, sort_diagnostics};
use crate::core::repr::{NoLegacyBuilder, TypeRepr, render_type};
use crate::core::tree::SyntaxFile;
use crate::driver::check::{DriverError, OutputFormat, read_source, write_records};

/// Result of building the listed types of one syntax file.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub syntax: SyntaxFile,
    /// One entry per listed node, in listing order.
    pub types: Vec<TypeRepr>,
    pub records: Vec<DiagnosticRecord>,
    pub source: Option<String>,
}

impl BuildReport {
    pub fn has_errors(&self) -> bool {
        !self.records.is_empty()
    }
}

#[derive(Serialize)]
struct BuiltType<'a> {
    span: Span,
    rendered: String,
    repr: &'a TypeRepr,
}

#[derive(Serialize)]
struct BuildOutput<'a> {
    types: Vec<BuiltType<'a>>,
    diagnostics: &'a [DiagnosticRecord],
}

pub fn load_syntax(path: &Path) -> Result<SyntaxFile, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let syntax: SyntaxFile =
        serde_json::from_str(&text).map_err(|source| DriverError::SyntaxJson {
            path: path.to_path_buf(),
            source,
        })?;
    if !syntax.tree.is_well_formed() {
        return Err(DriverError::MalformedTree {
            path: path.to_path_buf(),
        });
    }
    if let Some(node) = syntax.invalid_type_root() {
        return Err(DriverError::NotATypeNode {
            path: path.to_path_buf(),
            node,
        });
    }
    Ok(syntax)
}

/// Subtrees the native builder cannot handle come back as error types; the
/// command line has no legacy builder to hand them to.
pub fn build_file(path: &Path, options: &FrontendOptions) -> Result<BuildReport, DriverError> {
    let syntax = load_syntax(path)?;
    info!(path = %path.display(), types = syntax.types.len(), "building types");

    let mut records = Vec::new();
    let types = build_types(&syntax, &mut NoLegacyBuilder, options, &mut records);
    sort_diagnostics(&mut records);

    let source = syntax.file.as_deref().and_then(|file| read_source(path, file));
    Ok(BuildReport {
        syntax,
        types,
        records,
        source,
    })
}

pub fn render_build(report: &BuildReport, format: OutputFormat) -> Result<String, DriverError> {
    match format {
        OutputFormat::Json => {
            let output = BuildOutput {
                types: report
                    .types
                    .iter()
                    .map(|repr| BuiltType {
                        span: repr.span,
                        rendered: render_type(repr),
                        repr,
                    })
                    .collect(),
                diagnostics: &report.records,
            };
            Ok(serde_json::to_string_pretty(&output)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            let file = report.syntax.file.as_deref().unwrap_or("<syntax>");
            for repr in &report.types {
                let _ = writeln!(out, "{file}:{}: {}", repr.span.start, render_type(repr));
            }
            write_records(&mut out, &report.records, report.source.as_deref());
            Ok(out)
        }
    }
}
