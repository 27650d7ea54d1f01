//! Type representations built from syntax.

pub mod attrs;
pub mod builder;
pub mod errors;
pub mod format;
pub mod migration;
pub mod model;

pub use attrs::{TypeAttrClass, TypeAttrKind, TypeSpecifier};
pub use builder::{
    BuilderOptions, DeferredAttrPolicy, LegacyTypeBuilder, NoLegacyBuilder, TypeReprBuilder,
};
pub use errors::{BuildError, BuildErrorKind};
pub use format::{dump_type, render_type};
pub use migration::{LegacyReason, Migration, check_migration, is_migrated};
pub use model::*;

#[cfg(test)]
#[path = "../../tests/repr/t_migration.rs"]
mod tests_migration;

#[cfg(test)]
#[path = "../../tests/repr/t_builder.rs"]
mod tests_builder;

#[cfg(test)]
#[path = "../../tests/repr/t_attrs.rs"]
mod tests_attrs;

#[cfg(test)]
#[path = "../../tests/repr/t_format.rs"]
mod tests_format;
