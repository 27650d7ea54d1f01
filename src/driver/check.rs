use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::core::api::{FrontendOptions, run_frontend};
use crate::core::decl::Module;
use crate::core::diag::format_error;
use crate::core::diagnostics::{DiagnosticRecord, sort_diagnostics};
use crate::core::tree::NodeId;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid declaration module {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid syntax file {}: {source}", .path.display())]
    SyntaxJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed syntax tree in {}", .path.display())]
    MalformedTree { path: PathBuf },

    #[error("{}: listed node {node} is not a type node of the tree", .path.display())]
    NotATypeNode { path: PathBuf, node: NodeId },

    #[error(transparent)]
    Render(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Result of checking one module file.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub module: Module,
    pub records: Vec<DiagnosticRecord>,
    /// Source text of `module.file`, when it could be read.
    pub source: Option<String>,
}

impl CheckReport {
    pub fn has_errors(&self) -> bool {
        !self.records.is_empty()
    }
}

pub fn load_module(path: &Path) -> Result<Module, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DriverError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn check_file(path: &Path, options: &FrontendOptions) -> Result<CheckReport, DriverError> {
    let module = load_module(path)?;
    info!(path = %path.display(), decls = module.decls.len(), "checking module");

    let mut records = Vec::new();
    run_frontend(&module, options, &mut records);
    sort_diagnostics(&mut records);

    let source = module.file.as_deref().and_then(|file| read_source(path, file));
    Ok(CheckReport {
        module,
        records,
        source,
    })
}

/// `file` is resolved relative to the input JSON's directory.
pub(crate) fn read_source(module_path: &Path, file: &str) -> Option<String> {
    let candidate = module_path
        .parent()
        .map_or_else(|| PathBuf::from(file), |dir| dir.join(file));
    match std::fs::read_to_string(&candidate) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(path = %candidate.display(), %err, "source text unavailable");
            None
        }
    }
}

pub fn render(report: &CheckReport, format: OutputFormat) -> Result<String, DriverError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report.records)?),
        OutputFormat::Text => Ok(render_text(report)),
    }
}

fn render_text(report: &CheckReport) -> String {
    let mut out = String::new();
    write_records(&mut out, &report.records, report.source.as_deref());
    if report.records.is_empty() {
        out.push_str("no diagnostics\n");
    }
    out
}

/// Text rendering shared by every subcommand: one block per record, with a
/// source excerpt when the source text is available.
pub(crate) fn write_records(out: &mut String, records: &[DiagnosticRecord], source: Option<&str>) {
    for record in records {
        let file = record.file.as_deref().unwrap_or("<module>");
        match source {
            Some(source) => {
                let _ = write!(out, "{file}: [{}] ", record.code);
                out.push_str(&format_error(source, record.span, &record.message));
            }
            None => {
                let _ = writeln!(
                    out,
                    "{file}:{}: [{}] {}",
                    record.span.start, record.code, record.message
                );
            }
        }
        for note in &record.notes {
            let _ = writeln!(out, "  note ({}): {}", note.span.start, note.message);
        }
        for fixit in &record.fixits {
            let _ = writeln!(
                out,
                "  fix-it ({}): insert '{}'",
                fixit.span.start, fixit.replacement
            );
        }
    }
}
