//! Syntax access layer for reef.
//!
//! This crate owns every tree-sitter facing line of code. It parses C#
//! source text and lowers the slice the analyzer cares about into plain
//! data:
//!
//! - class declarations with property and method summaries
//! - an expression IR (`Expr`) for method bodies, lambda bodies and query
//!   comprehensions
//! - parsed type reference text (`TypeName`)
//!
//! Consumers never see a tree-sitter node. Lookups against the grammar are
//! defensive throughout: field names are tried first, then a kind scan over
//! named children, and anything that cannot be shaped is lowered as an
//! opaque node that still exposes its children for walking.

mod ast;
mod lower;
mod types;

pub use ast::{Expr, Lambda, LocalDecl, Param, QueryExpr};
pub use lower::{
    ClassDecl, MethodDecl, PropertyDecl, SourceModel, parse_source,
};
pub use types::TypeName;

pub use reef_types::Span;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("tree-sitter C# language load failed")]
    Language,
    #[error("tree-sitter failed to produce a syntax tree")]
    Tree,
}
