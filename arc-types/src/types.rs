//! Type algebra for the Arc language
//!
//! Every value in an Arc program has a [`Type`]: a [`TypeKind`] plus an
//! optional physical [`Unit`]. Kinds cover the fixed-width numerics, strings,
//! timestamps, the `chan`/`series` wrappers, inference variables, the soft
//! constraint tags that restrict what a variable may become, and function
//! signatures.

use crate::units::{self, Unit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of type shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    #[serde(rename = "str")]
    String,
    #[serde(rename = "timestamp")]
    TimeStamp,
    #[serde(rename = "timespan")]
    TimeSpan,

    /// Channel carrying values of the element type
    Chan(Box<Type>),

    /// Ordered sequence of values of the element type
    Series(Box<Type>),

    /// Inference variable, optionally restricted by a constraint type
    Variable {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        constraint: Option<Box<Type>>,
    },

    /// Soft constraint: any numeric type
    #[serde(rename = "numeric")]
    NumericConstraint,
    /// Soft constraint: any integer type
    #[serde(rename = "integer")]
    IntegerConstraint,
    /// Soft constraint: any float type
    #[serde(rename = "float")]
    FloatConstraint,
    /// Soft constraint: a float literal with an exact integer value (`2.0`)
    #[serde(rename = "exact_integer_float")]
    ExactIntegerFloatConstraint,

    /// Callable signature
    Function(FunctionProperties),
}

/// A type: its shape plus an optional unit of measure.
///
/// Equality is structural and includes the unit, so `f32 psi` differs from
/// both `f32 bar` and a plain `f32`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TypeRepr")]
pub struct Type {
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

/// Types may be written in full or in the short textual form (`"chan f32 psi"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRepr {
    Short(String),
    Full {
        kind: TypeKind,
        #[serde(default)]
        unit: Option<Unit>,
    },
}

impl TryFrom<TypeRepr> for Type {
    type Error = ParseTypeError;

    fn try_from(repr: TypeRepr) -> Result<Self, Self::Error> {
        match repr {
            TypeRepr::Short(text) => text.parse(),
            TypeRepr::Full { kind, unit } => Ok(Type { kind, unit }),
        }
    }
}

/// A named, typed parameter of a function signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Param {
            name: name.into(),
            ty,
        }
    }
}

/// Ordered parameter list. Order is significant for equality.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(pub Vec<Param>);

impl Params {
    pub fn new() -> Self {
        Params(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&Param> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|p| p.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn push(&mut self, param: Param) {
        self.0.push(param);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same parameter names in the same order
    pub fn same_shape(&self, other: &Params) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a.name == b.name)
    }
}

impl FromIterator<Param> for Params {
    fn from_iter<I: IntoIterator<Item = Param>>(iter: I) -> Self {
        Params(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Signature of a function or stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionProperties {
    #[serde(default)]
    pub inputs: Params,
    #[serde(default)]
    pub outputs: Params,
    #[serde(default)]
    pub config: Params,
}

impl FunctionProperties {
    /// All parameter lists, in declaration order
    pub fn param_lists(&self) -> [&Params; 3] {
        [&self.inputs, &self.outputs, &self.config]
    }

    pub fn same_shape(&self, other: &FunctionProperties) -> bool {
        self.inputs.same_shape(&other.inputs)
            && self.outputs.same_shape(&other.outputs)
            && self.config.same_shape(&other.config)
    }
}

impl Type {
    pub fn new(kind: TypeKind) -> Self {
        Type { kind, unit: None }
    }

    /// Attach a unit, replacing any existing one
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn u8() -> Self {
        Type::new(TypeKind::U8)
    }

    pub fn u16() -> Self {
        Type::new(TypeKind::U16)
    }

    pub fn u32() -> Self {
        Type::new(TypeKind::U32)
    }

    pub fn u64() -> Self {
        Type::new(TypeKind::U64)
    }

    pub fn i8() -> Self {
        Type::new(TypeKind::I8)
    }

    pub fn i16() -> Self {
        Type::new(TypeKind::I16)
    }

    pub fn i32() -> Self {
        Type::new(TypeKind::I32)
    }

    pub fn i64() -> Self {
        Type::new(TypeKind::I64)
    }

    pub fn f32() -> Self {
        Type::new(TypeKind::F32)
    }

    pub fn f64() -> Self {
        Type::new(TypeKind::F64)
    }

    pub fn string() -> Self {
        Type::new(TypeKind::String)
    }

    pub fn timestamp() -> Self {
        Type::new(TypeKind::TimeStamp)
    }

    pub fn timespan() -> Self {
        Type::new(TypeKind::TimeSpan)
    }

    pub fn chan(elem: Type) -> Self {
        Type::new(TypeKind::Chan(Box::new(elem)))
    }

    pub fn series(elem: Type) -> Self {
        Type::new(TypeKind::Series(Box::new(elem)))
    }

    pub fn variable(name: impl Into<String>, constraint: Option<Type>) -> Self {
        Type::new(TypeKind::Variable {
            name: name.into(),
            constraint: constraint.map(Box::new),
        })
    }

    pub fn numeric_constraint() -> Self {
        Type::new(TypeKind::NumericConstraint)
    }

    pub fn integer_constraint() -> Self {
        Type::new(TypeKind::IntegerConstraint)
    }

    pub fn float_constraint() -> Self {
        Type::new(TypeKind::FloatConstraint)
    }

    pub fn exact_integer_float_constraint() -> Self {
        Type::new(TypeKind::ExactIntegerFloatConstraint)
    }

    pub fn function(props: FunctionProperties) -> Self {
        Type::new(TypeKind::Function(props))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self.kind, TypeKind::Variable { .. })
    }

    pub fn variable_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Variable { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn variable_constraint(&self) -> Option<&Type> {
        match &self.kind {
            TypeKind::Variable { constraint, .. } => constraint.as_deref(),
            _ => None,
        }
    }

    /// One of the soft constraint tags
    pub fn is_constraint_tag(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::NumericConstraint
                | TypeKind::IntegerConstraint
                | TypeKind::FloatConstraint
                | TypeKind::ExactIntegerFloatConstraint
        )
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self.kind, TypeKind::Chan(_) | TypeKind::Series(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeKind::Function(_))
    }

    /// Strip one level of `chan`/`series`
    pub fn unwrap(&self) -> &Type {
        match &self.kind {
            TypeKind::Chan(elem) | TypeKind::Series(elem) => elem,
            _ => self,
        }
    }

    pub fn is_numeric(&self) -> bool {
        match &self.kind {
            TypeKind::Variable { constraint, .. } => {
                constraint.as_deref().is_some_and(Type::is_numeric)
            }
            TypeKind::Chan(elem) => elem.is_numeric(),
            TypeKind::NumericConstraint
            | TypeKind::IntegerConstraint
            | TypeKind::FloatConstraint
            | TypeKind::ExactIntegerFloatConstraint => true,
            _ => self.is_integer() || self.is_float(),
        }
    }

    pub fn is_integer(&self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer()
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::I8 | TypeKind::I16 | TypeKind::I32 | TypeKind::I64
        )
    }

    pub fn is_unsigned_integer(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::U8 | TypeKind::U16 | TypeKind::U32 | TypeKind::U64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, TypeKind::F32 | TypeKind::F64)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.kind, TypeKind::U8)
    }

    pub fn is_64bit(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::I64 | TypeKind::U64 | TypeKind::F64 | TypeKind::TimeStamp | TypeKind::TimeSpan
        )
    }

    /// Size in bytes of fixed-width primitives
    pub fn density(&self) -> Option<usize> {
        match self.kind {
            TypeKind::U8 | TypeKind::I8 => Some(1),
            TypeKind::U16 | TypeKind::I16 => Some(2),
            TypeKind::U32 | TypeKind::I32 | TypeKind::F32 => Some(4),
            TypeKind::U64 | TypeKind::I64 | TypeKind::F64 | TypeKind::TimeStamp | TypeKind::TimeSpan => {
                Some(8)
            }
            _ => None,
        }
    }

    /// Inclusive value range of an integer type
    pub fn integer_range(&self) -> Option<(f64, f64)> {
        let range = match self.kind {
            TypeKind::U8 => (0.0, u8::MAX as f64),
            TypeKind::U16 => (0.0, u16::MAX as f64),
            TypeKind::U32 => (0.0, u32::MAX as f64),
            TypeKind::U64 => (0.0, u64::MAX as f64),
            TypeKind::I8 => (i8::MIN as f64, i8::MAX as f64),
            TypeKind::I16 => (i16::MIN as f64, i16::MAX as f64),
            TypeKind::I32 => (i32::MIN as f64, i32::MAX as f64),
            TypeKind::I64 => (i64::MIN as f64, i64::MAX as f64),
            _ => return None,
        };
        Some(range)
    }

    /// Whether a variable named `name` occurs anywhere inside this type
    pub fn contains_variable(&self, name: &str) -> bool {
        match &self.kind {
            TypeKind::Variable { name: n, .. } => n == name,
            TypeKind::Chan(elem) | TypeKind::Series(elem) => elem.contains_variable(name),
            TypeKind::Function(props) => props
                .param_lists()
                .iter()
                .any(|params| params.iter().any(|p| p.ty.contains_variable(name))),
            _ => false,
        }
    }

    /// Collect every variable reachable through wrappers and function parameters
    pub fn variables(&self) -> Vec<&Type> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a Type>) {
        match &self.kind {
            TypeKind::Variable { .. } => out.push(self),
            TypeKind::Chan(elem) | TypeKind::Series(elem) => elem.collect_variables(out),
            TypeKind::Function(props) => {
                for params in props.param_lists() {
                    for param in params {
                        param.ty.collect_variables(out);
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn unsigned_integers() -> Vec<Type> {
    vec![Type::u8(), Type::u16(), Type::u32(), Type::u64()]
}

pub fn signed_integers() -> Vec<Type> {
    vec![Type::i8(), Type::i16(), Type::i32(), Type::i64()]
}

pub fn floats() -> Vec<Type> {
    vec![Type::f32(), Type::f64()]
}

/// Every concrete numeric type, unsigned first
pub fn numerics() -> Vec<Type> {
    let mut all = unsigned_integers();
    all.extend(signed_integers());
    all.extend(floats());
    all
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::U8 => write!(f, "u8"),
            TypeKind::U16 => write!(f, "u16"),
            TypeKind::U32 => write!(f, "u32"),
            TypeKind::U64 => write!(f, "u64"),
            TypeKind::I8 => write!(f, "i8"),
            TypeKind::I16 => write!(f, "i16"),
            TypeKind::I32 => write!(f, "i32"),
            TypeKind::I64 => write!(f, "i64"),
            TypeKind::F32 => write!(f, "f32"),
            TypeKind::F64 => write!(f, "f64"),
            TypeKind::String => write!(f, "str"),
            TypeKind::TimeStamp => write!(f, "timestamp"),
            TypeKind::TimeSpan => write!(f, "timespan"),
            TypeKind::Chan(elem) => write!(f, "chan {}", elem),
            TypeKind::Series(elem) => write!(f, "series {}", elem),
            TypeKind::Variable { name, constraint } => match constraint {
                Some(c) => write!(f, "{}:{}", name, c),
                None => write!(f, "{}", name),
            },
            TypeKind::NumericConstraint => write!(f, "numeric"),
            TypeKind::IntegerConstraint => write!(f, "integer"),
            TypeKind::FloatConstraint => write!(f, "float"),
            TypeKind::ExactIntegerFloatConstraint => write!(f, "exact_integer_float"),
            TypeKind::Function(_) => write!(f, "function"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(unit) = &self.unit {
            write!(f, " {}", unit)?;
        }
        Ok(())
    }
}

/// Errors from the short textual type syntax
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseTypeError {
    #[error("empty type")]
    Empty,

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("unexpected tokens after type: {0}")]
    Trailing(String),
}

/// Short textual syntax: `f32`, `f64 psi`, `chan series i32`, `$T`, `$T:numeric`.
impl FromStr for Type {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        parse_tokens(&tokens)
    }
}

fn parse_tokens(tokens: &[&str]) -> Result<Type, ParseTypeError> {
    let (head, rest) = tokens.split_first().ok_or(ParseTypeError::Empty)?;
    match *head {
        "chan" => return Ok(Type::chan(parse_tokens(rest)?)),
        "series" => return Ok(Type::series(parse_tokens(rest)?)),
        _ => {}
    }

    let mut ty = parse_atom(head)?;
    match rest {
        [] => Ok(ty),
        [unit] => {
            let unit = units::resolve(unit).ok_or_else(|| ParseTypeError::UnknownUnit(unit.to_string()))?;
            ty.unit = Some(unit);
            Ok(ty)
        }
        _ => Err(ParseTypeError::Trailing(rest.join(" "))),
    }
}

fn parse_atom(atom: &str) -> Result<Type, ParseTypeError> {
    if let Some(var) = atom.strip_prefix('$') {
        let (name, constraint) = match var.split_once(':') {
            Some((name, c)) => (name, Some(parse_atom(c)?)),
            None => (var, None),
        };
        if name.is_empty() {
            return Err(ParseTypeError::UnknownType(atom.to_string()));
        }
        return Ok(Type::variable(name, constraint));
    }

    let kind = match atom {
        "u8" => TypeKind::U8,
        "u16" => TypeKind::U16,
        "u32" => TypeKind::U32,
        "u64" => TypeKind::U64,
        "i8" => TypeKind::I8,
        "i16" => TypeKind::I16,
        "i32" => TypeKind::I32,
        "i64" => TypeKind::I64,
        "f32" => TypeKind::F32,
        "f64" => TypeKind::F64,
        "str" | "string" => TypeKind::String,
        "timestamp" => TypeKind::TimeStamp,
        "timespan" => TypeKind::TimeSpan,
        "numeric" => TypeKind::NumericConstraint,
        "integer" => TypeKind::IntegerConstraint,
        "float" => TypeKind::FloatConstraint,
        "exact_integer_float" => TypeKind::ExactIntegerFloatConstraint,
        other => return Err(ParseTypeError::UnknownType(other.to_string())),
    };
    Ok(Type::new(kind))
}
