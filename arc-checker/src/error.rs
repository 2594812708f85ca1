//! Error taxonomy for constraint solving and dimensional analysis

use arc_types::{Span, Type};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TypeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("cyclic type in {reason}: {var} is not compatible with {ty}, which contains it{}", at(.location))]
    CyclicType {
        var: String,
        ty: Type,
        reason: String,
        location: Option<Span>,
    },

    #[error("type mismatch in {reason}: {found} is not compatible with {var}:{constraint}{}", at(.location))]
    ConstraintViolation {
        var: String,
        constraint: Type,
        found: Type,
        reason: String,
        location: Option<Span>,
    },

    #[error("type mismatch in {reason}: {left} is not compatible with {right}{}", at(.location))]
    Unresolvable {
        left: Type,
        right: Type,
        reason: String,
        hint: Option<String>,
        location: Option<Span>,
    },

    #[error("unresolved type variable {var}{}", at(.location))]
    UnresolvedVariable { var: String, location: Option<Span> },

    #[error("type unification did not converge after {iterations} iterations")]
    Convergence { iterations: usize },

    #[error("incompatible dimensions: {left} and {right}{}", at(.location))]
    IncompatibleDimensions {
        left: String,
        right: String,
        location: Option<Span>,
    },

    #[error("invalid exponent: {message}{}", at(.location))]
    InvalidExponent {
        message: String,
        location: Option<Span>,
    },

    #[error("cannot convert between dimensionless and dimensioned value ({from} to {to})")]
    DimensionlessConversion { from: String, to: String },
}

fn at(location: &Option<Span>) -> String {
    match location {
        Some(span) if !span.is_dummy() => format!(" at {}", span),
        _ => String::new(),
    }
}

impl TypeError {
    pub fn mismatch(left: &Type, right: &Type, reason: &str, location: Option<Span>) -> Self {
        TypeError::Unresolvable {
            left: left.clone(),
            right: right.clone(),
            reason: reason.to_string(),
            hint: None,
            location,
        }
    }

    pub fn location(&self) -> Option<Span> {
        match self {
            TypeError::CyclicType { location, .. }
            | TypeError::ConstraintViolation { location, .. }
            | TypeError::Unresolvable { location, .. }
            | TypeError::UnresolvedVariable { location, .. }
            | TypeError::IncompatibleDimensions { location, .. }
            | TypeError::InvalidExponent { location, .. } => *location,
            TypeError::Convergence { .. } | TypeError::DimensionlessConversion { .. } => None,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            TypeError::Unresolvable { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }
}
