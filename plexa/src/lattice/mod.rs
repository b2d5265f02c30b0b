//! The type lattice: descriptors, declared type expressions, widening
//! aliases, and normalization of one into the other.
//!
//! # Module Structure
//!
//! - [`desc`] - Type descriptors, host values and the [`TypeOracle`] boundary
//! - [`expr`] - Declared type expressions and placeholders
//! - [`alias`] - The immutable widening alias table
//! - [`hierarchy`] - A nominal [`TypeOracle`] implementation
//! - [`normalize`] - Expression normalization

pub mod alias;
pub mod desc;
pub mod expr;
pub mod hierarchy;
pub mod normalize;

pub use alias::{AliasTable, AliasTableAlreadyInstalled, AliasTableBuilder};
pub use desc::{is_subtype, TypeDesc, TypeOracle, Value};
pub use expr::{Placeholder, TypeExpr, Variance};
pub use hierarchy::{Builtins, Hierarchy, WILDCARD_NAME};
pub use normalize::{Admissible, Normalizer, TypeExprError};
