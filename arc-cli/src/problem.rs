//! JSON problem files for `arc-check solve`
//!
//! Types use the short textual syntax (`"f32 psi"`, `"chan i64"`,
//! `"$T:numeric"`) or the full tagged form.

use anyhow::{Context, Result};
use arc_checker::{BinaryOp, ConstraintKind};
use arc_types::{Span, Type};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Problem {
    #[serde(default)]
    pub constraints: Vec<ConstraintEntry>,
    #[serde(default)]
    pub binary_ops: Vec<BinaryOpEntry>,
    #[serde(default)]
    pub power_ops: Vec<PowerOpEntry>,
    #[serde(default)]
    pub assignments: Vec<AssignmentEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintEntry {
    pub left: Type,
    pub right: Type,
    #[serde(default = "default_kind")]
    pub kind: ConstraintKind,
    #[serde(default)]
    pub reason: String,
    pub span: Option<Span>,
}

fn default_kind() -> ConstraintKind {
    ConstraintKind::Equality
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinaryOpEntry {
    pub op: String,
    pub left: Type,
    pub right: Type,
    pub span: Option<Span>,
}

impl BinaryOpEntry {
    pub fn operator(&self) -> Result<BinaryOp> {
        self.op
            .parse()
            .with_context(|| format!("Invalid binary operation '{}'", self.op))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PowerOpEntry {
    pub base: Type,
    pub exponent: Type,
    #[serde(default)]
    pub is_literal_int: bool,
    /// Literal exponent, used to report the result unit
    pub exponent_value: Option<i64>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentEntry {
    pub target: Type,
    pub source: Type,
    pub literal: Option<f64>,
    pub span: Option<Span>,
}

impl Problem {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse problem file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let problem: Problem = serde_json::from_str(content)?;
        for entry in &problem.binary_ops {
            entry.operator()?;
        }
        Ok(problem)
    }
}
