//! Core type definitions for the Arc type checker
//!
//! This crate holds the leaf data model shared by the checker and its
//! drivers: the type algebra, the physical units registry and source spans.

pub mod span;
pub mod types;
pub mod units;

pub use span::{ByteOffset, FileId, Span};
pub use types::{FunctionProperties, Param, Params, ParseTypeError, Type, TypeKind};
pub use units::{Dimensions, Registry, Unit, UnitError};
