//! Type representation building and capability checking.

pub mod api;
pub mod capability;
pub mod decl;
pub mod diag;
pub mod diagnostics;
pub mod repr;
pub mod tree;
