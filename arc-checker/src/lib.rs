//! Arc type checker
//!
//! This crate provides constraint-based type inference with numeric
//! promotion, and a dimensional analyzer for physical units. The AST walk is
//! not part of this crate: callers build a [`System`], feed it constraints and
//! operator nodes, then read back resolved types.

pub mod config;
pub mod constraints;
pub mod dimensions;
pub mod error;
pub mod error_reporting;
pub mod unification;

// Re-export core types
pub use config::{CheckerConfig, ConfigError, MagnitudeConfig};
pub use constraints::{Constraint, ConstraintKind, System};
pub use dimensions::{power_unit, result_unit, scale_factor, BinaryOp, DimensionalAnalyzer};
pub use error::{Result, TypeError};
pub use error_reporting::{Diagnostic, DiagnosticSink, Diagnostics, Severity};
pub use unification::{default_for, promote};
