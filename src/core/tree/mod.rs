pub mod builder;
pub mod model;

pub use builder::SyntaxTreeBuilder;
pub use model::*;

#[cfg(test)]
#[path = "../../tests/tree/t_tree.rs"]
mod tests_tree;
