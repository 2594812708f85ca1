//! Constraint collection and substitution for type inference
//!
//! A [`System`] is created once per compilation unit. The analyzer walking the
//! AST adds constraints as it meets expressions; each one is unified eagerly so
//! errors surface at the offending node, and stored so that [`System::unify`]
//! can later run every constraint to a global fixpoint.

use crate::config::CheckerConfig;
use crate::error::Result;
use arc_types::{Param, Params, Span, Type, TypeKind};
use im::OrdMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::trace;

/// How strictly two types must agree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Types must be identical
    Equality,
    /// Types must be compatible; numerics may promote
    Compatible,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::Equality => write!(f, "="),
            ConstraintKind::Compatible => write!(f, "~"),
        }
    }
}

/// A relation between two types produced by one AST node
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub left: Type,
    pub right: Type,
    pub kind: ConstraintKind,
    pub location: Option<Span>,
    pub reason: String,
}

impl Constraint {
    pub fn new(
        left: Type,
        right: Type,
        kind: ConstraintKind,
        location: Option<Span>,
        reason: impl Into<String>,
    ) -> Self {
        Constraint {
            left,
            right,
            kind,
            location,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.left, self.kind, self.right, self.reason)
    }
}

/// Constraint system for one compilation unit
#[derive(Debug, Clone, Default)]
pub struct System {
    pub(crate) constraints: Vec<Constraint>,
    /// Every variable seen, keyed by name, as first encountered
    pub(crate) type_vars: OrdMap<String, Type>,
    pub(crate) substitutions: OrdMap<String, Type>,
    pub(crate) config: CheckerConfig,
}

impl System {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CheckerConfig) -> Self {
        System {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Require `left` and `right` to be the same type
    pub fn add_equality(
        &mut self,
        left: Type,
        right: Type,
        location: Option<Span>,
        reason: impl Into<String>,
    ) -> Result<()> {
        self.add(Constraint::new(left, right, ConstraintKind::Equality, location, reason))
    }

    /// Require `left` and `right` to be compatible, allowing numeric promotion
    pub fn add_compatible(
        &mut self,
        left: Type,
        right: Type,
        location: Option<Span>,
        reason: impl Into<String>,
    ) -> Result<()> {
        self.add(Constraint::new(left, right, ConstraintKind::Compatible, location, reason))
    }

    fn add(&mut self, constraint: Constraint) -> Result<()> {
        self.record_variables(&constraint.left);
        self.record_variables(&constraint.right);
        let snapshot = self.substitutions.clone();
        if let Err(e) = self.unify_constraint(&constraint) {
            // Bindings made before the failure would cascade into later constraints.
            self.substitutions = snapshot;
            return Err(e);
        }
        trace!(constraint = %constraint, "constraint added");
        self.constraints.push(constraint);
        Ok(())
    }

    fn record_variables(&mut self, ty: &Type) {
        for var in ty.variables() {
            if let Some(name) = var.variable_name() {
                if !self.type_vars.contains_key(name) {
                    self.type_vars.insert(name.to_string(), var.clone());
                }
            }
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn type_variables(&self) -> &OrdMap<String, Type> {
        &self.type_vars
    }

    pub fn substitutions(&self) -> &OrdMap<String, Type> {
        &self.substitutions
    }

    pub fn substitution(&self, name: &str) -> Option<&Type> {
        self.substitutions.get(name)
    }

    pub fn has_type_variables(&self) -> bool {
        !self.type_vars.is_empty()
    }

    /// Resolve a type through the current substitutions.
    ///
    /// Chains are followed to their end; a cycle yields the variable that
    /// closes it. A unit-bearing variable that resolves to a unit-less
    /// concrete type keeps its unit.
    pub fn apply_substitutions(&self, ty: &Type) -> Type {
        let mut visiting = HashSet::new();
        self.apply_with(ty, &mut visiting)
    }

    fn apply_with(&self, ty: &Type, visiting: &mut HashSet<String>) -> Type {
        match &ty.kind {
            TypeKind::Variable { name, .. } => {
                if visiting.contains(name) {
                    return ty.clone();
                }
                let Some(bound) = self.substitutions.get(name) else {
                    return ty.clone();
                };
                visiting.insert(name.clone());
                let mut resolved = self.apply_with(bound, visiting);
                visiting.remove(name);

                if resolved.unit.is_none() && !resolved.is_variable() {
                    resolved.unit = ty.unit.clone();
                }
                resolved
            }
            TypeKind::Chan(elem) => Type {
                kind: TypeKind::Chan(Box::new(self.apply_with(elem, visiting))),
                unit: ty.unit.clone(),
            },
            TypeKind::Series(elem) => Type {
                kind: TypeKind::Series(Box::new(self.apply_with(elem, visiting))),
                unit: ty.unit.clone(),
            },
            TypeKind::Function(props) => {
                let mut props = props.clone();
                props.inputs = self.apply_params(&props.inputs, visiting);
                props.outputs = self.apply_params(&props.outputs, visiting);
                props.config = self.apply_params(&props.config, visiting);
                Type {
                    kind: TypeKind::Function(props),
                    unit: ty.unit.clone(),
                }
            }
            _ => ty.clone(),
        }
    }

    fn apply_params(&self, params: &Params, visiting: &mut HashSet<String>) -> Params {
        params
            .iter()
            .map(|p| Param::new(p.name.clone(), self.apply_with(&p.ty, visiting)))
            .collect()
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type variables ({}):", self.type_vars.len())?;
        for (name, var) in &self.type_vars {
            match var.variable_constraint() {
                Some(c) => writeln!(f, "  {}: {}", name, c)?,
                None => writeln!(f, "  {}", name)?,
            }
        }
        writeln!(f, "constraints ({}):", self.constraints.len())?;
        for constraint in &self.constraints {
            writeln!(f, "  {}", constraint)?;
        }
        writeln!(f, "substitutions ({}):", self.substitutions.len())?;
        for (name, ty) in &self.substitutions {
            writeln!(f, "  {} -> {}", name, ty)?;
        }
        Ok(())
    }
}
