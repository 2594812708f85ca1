//! Unification for Arc constraints
//!
//! This module implements:
//! - Per-constraint unification with a visiting set guarding recursion
//! - Numeric promotion for `Compatible` constraints
//! - The occurs check
//! - Fixpoint iteration over all stored constraints, then defaulting of
//!   constrained variables that never met a concrete type

use crate::constraints::{Constraint, ConstraintKind, System};
use crate::error::{Result, TypeError};
use arc_types::{Type, TypeKind, Unit};
use std::collections::HashSet;
use tracing::{debug, trace};

impl System {
    /// Solve every stored constraint to a fixpoint, then default leftovers.
    pub fn unify(&mut self) -> Result<()> {
        let max_iterations = self.config.max_iterations;
        let mut converged = false;

        for pass in 1..=max_iterations {
            let snapshot = self.substitutions.clone();
            let constraints = std::mem::take(&mut self.constraints);
            let outcome = constraints.iter().try_for_each(|c| self.unify_constraint(c));
            self.constraints = constraints;
            outcome?;

            debug!(pass, substitutions = self.substitutions.len(), "unification pass");
            if self.substitutions == snapshot {
                debug!(passes = pass, "unification converged");
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(TypeError::Convergence {
                iterations: max_iterations,
            });
        }

        self.apply_defaults()
    }

    /// Unify a single constraint against the current substitutions.
    pub fn unify_constraint(&mut self, constraint: &Constraint) -> Result<()> {
        let mut visiting = HashSet::new();
        self.unify_types(&constraint.left, &constraint.right, constraint, &mut visiting)
    }

    /// `visiting` holds the variables on the current recursion path only, so
    /// sibling parameters of a function still unify their shared variables.
    fn unify_types(
        &mut self,
        t1: &Type,
        t2: &Type,
        constraint: &Constraint,
        visiting: &mut HashSet<String>,
    ) -> Result<()> {
        if let Some(name) = t1.variable_name() {
            if visiting.insert(name.to_string()) {
                let result = self.unify_type_variable(t1, t2, constraint, visiting);
                visiting.remove(name);
                return result;
            }
        }
        if let Some(name) = t2.variable_name() {
            if visiting.insert(name.to_string()) {
                let result = self.unify_type_variable(t2, t1, constraint, visiting);
                visiting.remove(name);
                return result;
            }
        }

        let left = self.apply_substitutions(t1);
        let right = self.apply_substitutions(t2);
        if left == right {
            return Ok(());
        }
        // A unit-less side takes on the other's unit; dimensions are the analyzer's concern.
        if left.kind == right.kind && (left.unit.is_none() || right.unit.is_none()) {
            return Ok(());
        }

        match (&left.kind, &right.kind) {
            (TypeKind::Chan(a), TypeKind::Chan(b)) | (TypeKind::Series(a), TypeKind::Series(b)) => {
                return self.unify_types(a, b, constraint, visiting);
            }
            (TypeKind::Function(f), TypeKind::Function(g)) if f.same_shape(g) => {
                for (fs, gs) in f.param_lists().into_iter().zip(g.param_lists()) {
                    for (p, q) in fs.iter().zip(gs.iter()) {
                        self.unify_types(&p.ty, &q.ty, constraint, visiting)?;
                    }
                }
                return Ok(());
            }
            _ => {}
        }

        if left.is_wrapper() || right.is_wrapper() || left.is_function() || right.is_function() {
            return Err(TypeError::mismatch(&left, &right, &constraint.reason, constraint.location));
        }

        let both_numeric = left.is_numeric() && right.is_numeric();
        if constraint.kind == ConstraintKind::Compatible && both_numeric {
            return Ok(());
        }

        Err(TypeError::Unresolvable {
            hint: both_numeric.then(|| format!("use {}(value) to convert", left.kind)),
            left,
            right,
            reason: constraint.reason.clone(),
            location: constraint.location,
        })
    }

    fn unify_type_variable(
        &mut self,
        tv: &Type,
        other: &Type,
        constraint: &Constraint,
        visiting: &mut HashSet<String>,
    ) -> Result<()> {
        let Some(name) = tv.variable_name() else {
            return self.unify_types(tv, other, constraint, visiting);
        };

        if let Some(existing) = self.substitutions.get(name).cloned() {
            let resolved = self.apply_substitutions(other);
            if constraint.kind == ConstraintKind::Compatible
                && is_scalar_numeric(&existing)
                && is_scalar_numeric(&resolved)
                && existing != resolved
            {
                let promoted = promote(&existing, &resolved);
                trace!(var = name, from = %existing, with = %resolved, to = %promoted, "promoted substitution");
                self.substitutions.insert(name.to_string(), promoted.clone());
                return self.unify_types(&promoted, other, constraint, visiting);
            }
            return self.unify_types(&existing, other, constraint, visiting);
        }

        let resolved = self.apply_substitutions(other);

        if let Some(other_name) = resolved.variable_name() {
            if other_name == name {
                return Ok(());
            }
            let tv_constrained = tv.variable_constraint().is_some();
            let other_constrained = resolved.variable_constraint().is_some();
            if tv_constrained && !other_constrained {
                self.bind(other_name, tv.clone());
            } else {
                self.bind(name, resolved.clone());
            }
            return Ok(());
        }

        let mut binding = other.clone();
        if let Some(bound) = tv.variable_constraint() {
            if let Some(adjusted) = self.check_constraint(name, bound, &resolved, constraint)? {
                binding = adjusted;
            }
        }

        if resolved.contains_variable(name) {
            return Err(TypeError::CyclicType {
                var: name.to_string(),
                ty: resolved,
                reason: constraint.reason.clone(),
                location: constraint.location,
            });
        }

        self.bind(name, binding);
        Ok(())
    }

    /// Validate a concrete type against a variable's constraint. Returns a
    /// replacement binding when the value must be widened to satisfy it.
    fn check_constraint(
        &self,
        name: &str,
        bound: &Type,
        value: &Type,
        constraint: &Constraint,
    ) -> Result<Option<Type>> {
        let compatible = constraint.kind == ConstraintKind::Compatible;
        let satisfied = match &bound.kind {
            TypeKind::IntegerConstraint
            | TypeKind::NumericConstraint
            | TypeKind::ExactIntegerFloatConstraint => value.is_numeric(),
            TypeKind::FloatConstraint if compatible => {
                if value.is_integer() {
                    return Ok(Some(Type {
                        kind: TypeKind::F64,
                        unit: value.unit.clone(),
                    }));
                }
                value.is_numeric()
            }
            TypeKind::FloatConstraint => value.is_float(),
            _ if bound.kind == value.kind
                && (bound.unit.is_none() || value.unit.is_none() || bound.unit == value.unit) =>
            {
                true
            }
            _ if compatible && bound.is_numeric() && value.is_numeric() => {
                return Ok(Some(promote(bound, value)));
            }
            _ => false,
        };

        if satisfied {
            Ok(None)
        } else {
            Err(TypeError::ConstraintViolation {
                var: name.to_string(),
                constraint: bound.clone(),
                found: value.clone(),
                reason: constraint.reason.clone(),
                location: constraint.location,
            })
        }
    }

    fn bind(&mut self, name: &str, ty: Type) {
        trace!(var = name, ty = %ty, "bind");
        self.substitutions.insert(name.to_string(), ty);
    }

    /// Give every still-unresolved variable the default of its constraint.
    fn apply_defaults(&mut self) -> Result<()> {
        let vars: Vec<(String, Type)> = self
            .type_vars
            .iter()
            .map(|(name, ty)| (name.clone(), ty.clone()))
            .collect();

        for (name, var) in vars {
            let resolved = self.apply_substitutions(&var);
            let Some(root) = resolved.variable_name() else {
                continue;
            };
            let bound = resolved
                .variable_constraint()
                .or_else(|| var.variable_constraint());
            let Some(default) = bound.map(default_for) else {
                let location = self
                    .constraints
                    .iter()
                    .find(|c| c.left.contains_variable(&name) || c.right.contains_variable(&name))
                    .and_then(|c| c.location);
                return Err(TypeError::UnresolvedVariable { var: name, location });
            };
            debug!(var = root, ty = %default, "defaulted type variable");
            self.substitutions.insert(root.to_string(), default);
        }
        Ok(())
    }
}

fn is_scalar_numeric(ty: &Type) -> bool {
    ty.is_integer() || ty.is_float()
}

/// Default concrete type for a variable constraint
pub fn default_for(bound: &Type) -> Type {
    match bound.kind {
        TypeKind::IntegerConstraint => Type::i64(),
        TypeKind::FloatConstraint
        | TypeKind::NumericConstraint
        | TypeKind::ExactIntegerFloatConstraint => Type::f64(),
        _ => bound.clone(),
    }
}

/// Smallest common numeric type of `a` and `b`.
///
/// Mixed signedness at 64 bits has no integer that holds both ranges and
/// widens to `f64`. Below 64 bits mixed signedness settles on `i32`.
/// Two units of the same dimension settle on the smaller scale.
pub fn promote(a: &Type, b: &Type) -> Type {
    if a == b {
        return a.clone();
    }

    let wide = a.is_64bit() || b.is_64bit();
    let kind = if a.is_float() || b.is_float() {
        if wide {
            TypeKind::F64
        } else {
            TypeKind::F32
        }
    } else if wide {
        if a.is_unsigned_integer() && b.is_unsigned_integer() {
            TypeKind::U64
        } else {
            TypeKind::F64
        }
    } else if a.is_signed_integer() || b.is_signed_integer() {
        TypeKind::I32
    } else {
        TypeKind::U32
    };

    Type {
        kind,
        unit: common_unit(a.unit.as_ref(), b.unit.as_ref()),
    }
}

/// Finer of two units of one dimension, otherwise the first present unit
fn common_unit(a: Option<&Unit>, b: Option<&Unit>) -> Option<Unit> {
    match (a, b) {
        (Some(a), Some(b))
            if a.same_dimensions(b)
                && (b.scale < a.scale || (b.scale == a.scale && b.name < a.name)) =>
        {
            Some(b.clone())
        }
        (Some(a), _) => Some(a.clone()),
        (None, b) => b.cloned(),
    }
}
