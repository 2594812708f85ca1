//! Dimensional analysis for unit-bearing operations
//!
//! Rides on top of (possibly partial) types: only the unit annotation of each
//! operand is inspected, looking through one level of `chan`/`series`. Hard
//! dimension mismatches and magnitude warnings go to the injected
//! [`DiagnosticSink`]; power and conversion queries return typed errors.

use crate::config::MagnitudeConfig;
use crate::error::{Result, TypeError};
use crate::error_reporting::DiagnosticSink;
use arc_types::{Span, Type, TypeKind, Unit};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

/// Relative slack applied when comparing a ratio to a threshold
const RELATIVE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    pub fn is_additive(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for BinaryOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let op = match s {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            ">" => BinaryOp::Gt,
            "<=" => BinaryOp::Le,
            ">=" => BinaryOp::Ge,
            "and" | "&&" => BinaryOp::And,
            "or" | "||" => BinaryOp::Or,
            other => return Err(UnknownOperator(other.to_string())),
        };
        Ok(op)
    }
}

/// Unit carried by an operand, looking through one wrapper level
pub fn operand_unit(ty: &Type) -> Option<&Unit> {
    ty.unit.as_ref().or(ty.unwrap().unit.as_ref())
}

fn is_f32(ty: &Type) -> bool {
    matches!(ty.kind, TypeKind::F32) || matches!(ty.unwrap().kind, TypeKind::F32)
}

fn at_least(value: f64, threshold: f64) -> bool {
    value >= threshold * (1.0 - RELATIVE_TOLERANCE)
}

fn at_most(value: f64, threshold: f64) -> bool {
    value <= threshold * (1.0 + RELATIVE_TOLERANCE)
}

fn non_dimensionless(unit: Unit) -> Option<Unit> {
    (!unit.is_dimensionless()).then_some(unit)
}

/// Validates operator nodes against the units of their operands
pub struct DimensionalAnalyzer<'a> {
    sink: &'a mut dyn DiagnosticSink,
    config: MagnitudeConfig,
}

impl<'a> DimensionalAnalyzer<'a> {
    pub fn new(sink: &'a mut dyn DiagnosticSink) -> Self {
        Self::with_config(sink, MagnitudeConfig::default())
    }

    pub fn with_config(sink: &'a mut dyn DiagnosticSink, config: MagnitudeConfig) -> Self {
        DimensionalAnalyzer { sink, config }
    }

    /// Check that `left op right` is dimensionally legal.
    ///
    /// Returns `false` after recording an error diagnostic. Additive operators
    /// may also record a magnitude warning; that never makes the result `false`.
    pub fn validate_binary_op(&mut self, op: BinaryOp, left: &Type, right: &Type, location: Span) -> bool {
        if op.is_logical() || matches!(op, BinaryOp::Mul | BinaryOp::Div) {
            return true;
        }
        let (Some(lu), Some(ru)) = (operand_unit(left), operand_unit(right)) else {
            return true;
        };

        if !lu.same_dimensions(ru) {
            self.sink.error(
                location,
                format!("incompatible dimensions: cannot apply '{}' to {} and {}", op, lu, ru),
                Some(format!(
                    "{} measures {} but {} measures {}",
                    lu, lu.dimensions, ru, ru.dimensions
                )),
            );
            return false;
        }

        if op.is_additive() {
            self.check_additive_magnitude(op, left, right, lu, ru, location);
        }
        true
    }

    fn check_additive_magnitude(
        &mut self,
        op: BinaryOp,
        left: &Type,
        right: &Type,
        lu: &Unit,
        ru: &Unit,
        location: Span,
    ) {
        let (hi, lo) = (lu.scale.max(ru.scale), lu.scale.min(ru.scale));
        if lo <= 0.0 || !hi.is_finite() {
            return;
        }
        let ratio = hi / lo;
        let threshold = if is_f32(left) || is_f32(right) {
            self.config.f32_additive_ratio
        } else {
            self.config.additive_ratio
        };
        trace!(%op, left = %lu, right = %ru, ratio, threshold, "additive magnitude check");

        if at_least(ratio, threshold) {
            let orders = ratio.log10().round() as i64;
            self.sink.warning(
                location,
                format!(
                    "'{}' mixes {} and {}, which are {} orders of magnitude apart; the smaller operand may be lost to rounding",
                    op, lu, ru, orders
                ),
            );
        }
    }

    /// Warn when converting `source` into an integer, unit-bearing `target`
    /// loses the value. `literal` is the statically known source value, if any.
    pub fn check_assignment_magnitude(
        &mut self,
        target: &Type,
        source: &Type,
        literal: Option<f64>,
        location: Span,
    ) {
        let Some((min, max)) = target.unwrap().integer_range() else {
            return;
        };
        let (Some(tu), Some(su)) = (operand_unit(target), operand_unit(source)) else {
            return;
        };
        if !tu.same_dimensions(su) {
            return;
        }

        let factor = su.scale / tu.scale;
        if at_most(factor, self.config.truncation_threshold) {
            self.sink.warning(
                location,
                format!(
                    "assigning {} to {} truncates to zero: one {} is {:e} {}",
                    su, target, su, factor, tu
                ),
            );
            return;
        }
        if factor > max {
            self.sink.warning(
                location,
                format!(
                    "assigning {} to {} will overflow: one {} is {:e} {}, beyond the {} maximum",
                    su,
                    target,
                    su,
                    factor,
                    tu,
                    target.unwrap().kind
                ),
            );
            return;
        }
        if let Some(value) = literal {
            let converted = value * factor;
            if converted < min || converted > max {
                self.sink.warning(
                    location,
                    format!(
                        "literal {} {} is {} {}, outside the range of {}: overflow",
                        value,
                        su,
                        converted,
                        tu,
                        target.unwrap().kind
                    ),
                );
            }
        }
    }

    /// Check `base ^ exponent`. The exponent must be dimensionless, and a
    /// dimensioned base needs an integer literal exponent.
    pub fn validate_power_op(
        &self,
        base: &Type,
        exponent: &Type,
        is_literal_int: bool,
        location: Option<Span>,
    ) -> Result<()> {
        if let Some(eu) = operand_unit(exponent) {
            if !eu.is_dimensionless() {
                return Err(TypeError::InvalidExponent {
                    message: format!("exponent must be dimensionless, found {} ({})", eu, eu.dimensions),
                    location,
                });
            }
        }
        if let Some(bu) = operand_unit(base) {
            if !bu.is_dimensionless() && !is_literal_int {
                return Err(TypeError::InvalidExponent {
                    message: format!("raising {} to a power requires an integer literal exponent", bu),
                    location,
                });
            }
        }
        Ok(())
    }
}

/// Unit of `left op right`, or `None` when the result is unit-less.
pub fn result_unit(op: BinaryOp, left: &Type, right: &Type) -> Option<Unit> {
    let (lu, ru) = (operand_unit(left), operand_unit(right));
    match op {
        BinaryOp::Mul => match (lu, ru) {
            (Some(a), Some(b)) => a.multiply(b).and_then(non_dimensionless),
            (Some(a), None) | (None, Some(a)) => Some(a.clone()),
            (None, None) => None,
        },
        BinaryOp::Div => match (lu, ru) {
            (Some(a), Some(b)) => a.divide(b).and_then(non_dimensionless),
            (Some(a), None) => Some(a.clone()),
            (None, Some(b)) => b.pow(-1).and_then(non_dimensionless),
            (None, None) => None,
        },
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mod => lu.or(ru).cloned(),
        _ => None,
    }
}

/// Unit of `base ^ exponent` for an integer literal exponent.
pub fn power_unit(base: &Type, exponent: i64) -> Result<Option<Unit>> {
    let Some(unit) = operand_unit(base) else {
        return Ok(None);
    };
    let powered = unit.pow(exponent).ok_or_else(|| TypeError::InvalidExponent {
        message: format!("{}^{} exceeds the representable dimension range", unit, exponent),
        location: None,
    })?;
    Ok(non_dimensionless(powered))
}

/// Multiplier converting a value in `from` into `to`.
pub fn scale_factor(from: Option<&Unit>, to: Option<&Unit>) -> Result<f64> {
    match (from, to) {
        (None, None) => Ok(1.0),
        (Some(f), None) => Err(TypeError::DimensionlessConversion {
            from: f.to_string(),
            to: "dimensionless".to_string(),
        }),
        (None, Some(t)) => Err(TypeError::DimensionlessConversion {
            from: "dimensionless".to_string(),
            to: t.to_string(),
        }),
        (Some(f), Some(t)) if !f.same_dimensions(t) => Err(TypeError::IncompatibleDimensions {
            left: format!("{} ({})", f, f.dimensions),
            right: format!("{} ({})", t, t.dimensions),
            location: None,
        }),
        (Some(f), Some(t)) => Ok(f.scale / t.scale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_reporting::Diagnostics;
    use arc_types::units;

    #[test]
    fn test_operator_round_trip_symbols() {
        for symbol in ["+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "and", "or"] {
            let op: BinaryOp = symbol.parse().unwrap();
            assert_eq!(op.symbol(), symbol);
        }
        assert_eq!("**".parse::<BinaryOp>(), Err(UnknownOperator("**".to_string())));
    }

    #[test]
    fn test_operand_unit_looks_through_wrappers() {
        let hz = units::resolve("Hz").unwrap();
        let ty = Type::chan(Type::f32().with_unit(hz.clone()));
        assert_eq!(operand_unit(&ty), Some(&hz));
        assert_eq!(operand_unit(&Type::f32()), None);
    }

    #[test]
    fn test_logical_ops_always_legal() {
        let mut diags = Diagnostics::new();
        let mut analyzer = DimensionalAnalyzer::new(&mut diags);
        let m = Type::u8().with_unit(units::resolve("m").unwrap());
        let s = Type::u8().with_unit(units::resolve("s").unwrap());
        assert!(analyzer.validate_binary_op(BinaryOp::And, &m, &s, Span::dummy()));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_tolerance_helpers() {
        assert!(at_least(1e12 * (1.0 - 1e-12), 1e12));
        assert!(!at_least(1e11, 1e12));
        assert!(at_most(1e-9 * (1.0 + 1e-12), 1e-9));
    }
}
