//! Command-line driver: load declaration modules or syntax files, run the
//! front end, render.

pub mod build;
pub mod check;

pub use build::{BuildReport, build_file, load_syntax, render_build};
pub use check::{CheckReport, DriverError, OutputFormat, check_file, load_module, render};
