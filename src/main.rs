use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt};

use tyfront::core::api::FrontendOptions;
use tyfront::core::capability::Capability;
use tyfront::core::repr::DeferredAttrPolicy;
use tyfront::driver::{self, DriverError, OutputFormat};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log filter used when RUST_LOG is unset (e.g. warn, debug, tyfront=trace)
    #[clap(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Check a declaration module (JSON) for capability errors
    Check {
        path: PathBuf,

        #[clap(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,

        /// Restrict checking to these capabilities (comma-separated)
        #[clap(long, value_delimiter = ',')]
        capabilities: Vec<String>,
    },

    /// Build the listed type nodes of a syntax file (JSON)
    Build {
        path: PathBuf,

        #[clap(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,

        /// Handling of attributes such as @convention and @differentiable
        #[clap(long, value_enum, default_value_t = DeferredArg::Diagnose)]
        deferred_attrs: DeferredArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DeferredArg {
    Diagnose,
    Skip,
}

impl From<DeferredArg> for DeferredAttrPolicy {
    fn from(arg: DeferredArg) -> Self {
        match arg {
            DeferredArg::Diagnose => DeferredAttrPolicy::Diagnose,
            DeferredArg::Skip => DeferredAttrPolicy::Skip,
        }
    }
}

fn finish(rendered: Result<String, DriverError>, has_errors: bool) -> ExitCode {
    match rendered {
        Ok(text) => println!("{}", text.trim_end()),
        Err(e) => {
            eprintln!("[ERROR] {e}");
            return ExitCode::from(2);
        }
    }
    if has_errors {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Check {
            path,
            format,
            capabilities,
        } => {
            let mut options = FrontendOptions::default();
            if !capabilities.is_empty() {
                let mut selected = Vec::new();
                for name in &capabilities {
                    match Capability::from_name(name.trim()) {
                        Some(cap) => selected.push(cap),
                        None => {
                            eprintln!("[ERROR] unknown capability '{name}'");
                            return ExitCode::from(2);
                        }
                    }
                }
                options.capabilities = selected;
            }

            let report = match driver::check_file(&path, &options) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("[ERROR] {e}");
                    return ExitCode::from(2);
                }
            };
            finish(driver::render(&report, format.into()), report.has_errors())
        }
        Command::Build {
            path,
            format,
            deferred_attrs,
        } => {
            let options = FrontendOptions {
                deferred_attrs: deferred_attrs.into(),
                ..FrontendOptions::default()
            };
            let report = match driver::build_file(&path, &options) {
                Ok(report) => report,
                Err(e) => {
                    eprintln!("[ERROR] {e}");
                    return ExitCode::from(2);
                }
            };
            finish(
                driver::render_build(&report, format.into()),
                report.has_errors(),
            )
        }
    }
}
