//! Physical units of measure
//!
//! A [`Unit`] pairs a dimension vector (exponents of the base physical
//! quantities) with a scale factor to the SI coherent unit of that dimension.
//! Units are looked up by name in the process-wide [`Registry`], which is built
//! once on first access and never mutated afterwards.
//!
//! # Examples
//!
//! ```rust
//! # use arc_types::units::{self, Dimensions};
//! let m = units::resolve("m").unwrap();
//! let s = units::resolve("s").unwrap();
//! let velocity = m.divide(&s).unwrap();
//! assert_eq!(velocity.dimensions, Dimensions::VELOCITY);
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

/// Exponents of the eight base quantities tracked by the checker.
///
/// Derived quantities (frequency, force, pressure, ...) are expressed as
/// combinations of these, e.g. frequency is `time^-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    /// Length (L) - base unit: meter
    pub length: i8,
    /// Mass (M) - base unit: kilogram
    pub mass: i8,
    /// Time (T) - base unit: second
    pub time: i8,
    /// Electric current (I) - base unit: ampere
    pub current: i8,
    /// Temperature (Θ) - base unit: kelvin
    pub temperature: i8,
    /// Plane angle - base unit: radian
    pub angle: i8,
    /// Discrete count of events or items
    pub count: i8,
    /// Digital information - base unit: bit
    pub data: i8,
}

const BASE_SYMBOLS: [&str; 8] = ["m", "kg", "s", "A", "K", "rad", "count", "bit"];

impl Dimensions {
    pub const DIMENSIONLESS: Dimensions = Dimensions::from_array([0, 0, 0, 0, 0, 0, 0, 0]);
    pub const LENGTH: Dimensions = Dimensions::from_array([1, 0, 0, 0, 0, 0, 0, 0]);
    pub const MASS: Dimensions = Dimensions::from_array([0, 1, 0, 0, 0, 0, 0, 0]);
    pub const TIME: Dimensions = Dimensions::from_array([0, 0, 1, 0, 0, 0, 0, 0]);
    pub const CURRENT: Dimensions = Dimensions::from_array([0, 0, 0, 1, 0, 0, 0, 0]);
    pub const TEMPERATURE: Dimensions = Dimensions::from_array([0, 0, 0, 0, 1, 0, 0, 0]);
    pub const ANGLE: Dimensions = Dimensions::from_array([0, 0, 0, 0, 0, 1, 0, 0]);
    pub const COUNT: Dimensions = Dimensions::from_array([0, 0, 0, 0, 0, 0, 1, 0]);
    pub const DATA: Dimensions = Dimensions::from_array([0, 0, 0, 0, 0, 0, 0, 1]);

    pub const FREQUENCY: Dimensions = Dimensions::from_array([0, 0, -1, 0, 0, 0, 0, 0]);
    pub const VELOCITY: Dimensions = Dimensions::from_array([1, 0, -1, 0, 0, 0, 0, 0]);
    pub const ACCELERATION: Dimensions = Dimensions::from_array([1, 0, -2, 0, 0, 0, 0, 0]);
    pub const FORCE: Dimensions = Dimensions::from_array([1, 1, -2, 0, 0, 0, 0, 0]);
    pub const PRESSURE: Dimensions = Dimensions::from_array([-1, 1, -2, 0, 0, 0, 0, 0]);
    pub const ENERGY: Dimensions = Dimensions::from_array([2, 1, -2, 0, 0, 0, 0, 0]);
    pub const POWER: Dimensions = Dimensions::from_array([2, 1, -3, 0, 0, 0, 0, 0]);
    pub const VOLTAGE: Dimensions = Dimensions::from_array([2, 1, -3, -1, 0, 0, 0, 0]);
    pub const RESISTANCE: Dimensions = Dimensions::from_array([2, 1, -3, -2, 0, 0, 0, 0]);

    pub const fn from_array(exps: [i8; 8]) -> Self {
        Dimensions {
            length: exps[0],
            mass: exps[1],
            time: exps[2],
            current: exps[3],
            temperature: exps[4],
            angle: exps[5],
            count: exps[6],
            data: exps[7],
        }
    }

    pub const fn to_array(self) -> [i8; 8] {
        [
            self.length,
            self.mass,
            self.time,
            self.current,
            self.temperature,
            self.angle,
            self.count,
            self.data,
        ]
    }

    /// Look up the dimensions of a named physical quantity ("pressure", "velocity", ...)
    pub fn for_quantity(quantity: &str) -> Option<Dimensions> {
        let dims = match quantity.to_lowercase().as_str() {
            "dimensionless" => Self::DIMENSIONLESS,
            "length" | "distance" => Self::LENGTH,
            "mass" => Self::MASS,
            "time" | "duration" => Self::TIME,
            "current" => Self::CURRENT,
            "temperature" => Self::TEMPERATURE,
            "angle" => Self::ANGLE,
            "count" => Self::COUNT,
            "data" => Self::DATA,
            "frequency" => Self::FREQUENCY,
            "velocity" | "speed" => Self::VELOCITY,
            "acceleration" => Self::ACCELERATION,
            "force" => Self::FORCE,
            "pressure" => Self::PRESSURE,
            "energy" => Self::ENERGY,
            "power" => Self::POWER,
            "voltage" => Self::VOLTAGE,
            "resistance" => Self::RESISTANCE,
            _ => return None,
        };
        Some(dims)
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// Exponents add under multiplication. `None` if an exponent overflows.
    pub fn multiply(&self, other: &Dimensions) -> Option<Dimensions> {
        self.zip_with(other, i8::checked_add)
    }

    /// Exponents subtract under division. `None` if an exponent overflows.
    pub fn divide(&self, other: &Dimensions) -> Option<Dimensions> {
        self.zip_with(other, i8::checked_sub)
    }

    /// Every exponent is scaled by `exponent`. `None` if the result does not fit.
    pub fn pow(&self, exponent: i64) -> Option<Dimensions> {
        let exponent = i8::try_from(exponent).ok()?;
        let mut out = [0i8; 8];
        for (slot, exp) in out.iter_mut().zip(self.to_array()) {
            *slot = exp.checked_mul(exponent)?;
        }
        Some(Dimensions::from_array(out))
    }

    fn zip_with(&self, other: &Dimensions, op: fn(i8, i8) -> Option<i8>) -> Option<Dimensions> {
        let mut out = [0i8; 8];
        for ((slot, a), b) in out.iter_mut().zip(self.to_array()).zip(other.to_array()) {
            *slot = op(a, b)?;
        }
        Some(Dimensions::from_array(out))
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let parts: Vec<String> = BASE_SYMBOLS
            .iter()
            .zip(self.to_array())
            .filter(|(_, exp)| *exp != 0)
            .map(|(symbol, exp)| match exp {
                1 => symbol.to_string(),
                _ => format!("{symbol}^{exp}"),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Errors raised when a unit cannot be materialised
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("unknown unit: {0}")]
    Unknown(String),
}

/// A unit of measure: a dimension vector, a scale to SI base and a display name.
///
/// Units are plain values. Anything handed out by the [`Registry`] is an owned
/// copy, so changing a field on it never reaches the registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UnitRepr")]
pub struct Unit {
    pub dimensions: Dimensions,
    /// Multiplier to the SI coherent unit of `dimensions`
    pub scale: f64,
    pub name: String,
}

/// Problem files may spell a unit either as a registry name or in full.
#[derive(Deserialize)]
#[serde(untagged)]
enum UnitRepr {
    Named(String),
    Full {
        #[serde(default)]
        dimensions: Dimensions,
        scale: f64,
        #[serde(default)]
        name: String,
    },
}

impl TryFrom<UnitRepr> for Unit {
    type Error = UnitError;

    fn try_from(repr: UnitRepr) -> Result<Self, Self::Error> {
        match repr {
            UnitRepr::Named(name) => resolve(&name).ok_or(UnitError::Unknown(name)),
            UnitRepr::Full {
                dimensions,
                scale,
                name,
            } => Ok(Unit::new(name, dimensions, scale)),
        }
    }
}

impl Unit {
    pub fn new(name: impl Into<String>, dimensions: Dimensions, scale: f64) -> Self {
        Unit {
            dimensions,
            scale,
            name: name.into(),
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimensions.is_dimensionless()
    }

    pub fn same_dimensions(&self, other: &Unit) -> bool {
        self.dimensions == other.dimensions
    }

    /// Product unit: dimensions add, scales multiply.
    pub fn multiply(&self, other: &Unit) -> Option<Unit> {
        Some(Unit::new(
            format!("{}*{}", self.name, other.name),
            self.dimensions.multiply(&other.dimensions)?,
            self.scale * other.scale,
        ))
    }

    /// Quotient unit: dimensions subtract, scales divide.
    pub fn divide(&self, other: &Unit) -> Option<Unit> {
        Some(Unit::new(
            format!("{}/{}", self.name, other.name),
            self.dimensions.divide(&other.dimensions)?,
            self.scale / other.scale,
        ))
    }

    /// Integer power of a unit.
    pub fn pow(&self, exponent: i64) -> Option<Unit> {
        let dimensions = self.dimensions.pow(exponent)?;
        let scale = self.scale.powi(i32::try_from(exponent).ok()?);
        Some(Unit::new(format!("{}^{}", self.name, exponent), dimensions, scale))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.dimensions)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Static table of every unit the language knows by name.
#[derive(Debug)]
pub struct Registry {
    units: HashMap<&'static str, Unit>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::build);

impl Registry {
    /// The process-wide registry
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    /// Look up a unit by name, returning an owned copy.
    pub fn resolve(&self, name: &str) -> Option<Unit> {
        self.units.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in sorted order
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.units.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Every registered unit measuring `dimensions`, smallest scale first
    pub fn with_dimensions(&self, dimensions: Dimensions) -> Vec<Unit> {
        let mut units: Vec<Unit> = self
            .units
            .values()
            .filter(|u| u.dimensions == dimensions)
            .cloned()
            .collect();
        units.sort_by(|a, b| a.scale.total_cmp(&b.scale).then_with(|| a.name.cmp(&b.name)));
        units
    }

    fn build() -> Self {
        let mut units = HashMap::new();
        let mut add = |name: &'static str, dimensions: Dimensions, scale: f64| {
            units.insert(name, Unit::new(name, dimensions, scale));
        };

        // Length
        add("m", Dimensions::LENGTH, 1.0);
        add("km", Dimensions::LENGTH, 1e3);
        add("cm", Dimensions::LENGTH, 1e-2);
        add("mm", Dimensions::LENGTH, 1e-3);
        add("um", Dimensions::LENGTH, 1e-6);
        add("nm", Dimensions::LENGTH, 1e-9);
        add("in", Dimensions::LENGTH, 0.0254);
        add("ft", Dimensions::LENGTH, 0.3048);
        add("mi", Dimensions::LENGTH, 1609.344);

        // Mass
        add("kg", Dimensions::MASS, 1.0);
        add("g", Dimensions::MASS, 1e-3);
        add("mg", Dimensions::MASS, 1e-6);
        add("lb", Dimensions::MASS, 0.453_592_37);

        // Time
        add("s", Dimensions::TIME, 1.0);
        add("ms", Dimensions::TIME, 1e-3);
        add("us", Dimensions::TIME, 1e-6);
        add("ns", Dimensions::TIME, 1e-9);
        add("min", Dimensions::TIME, 60.0);
        add("h", Dimensions::TIME, 3600.0);
        add("day", Dimensions::TIME, 86_400.0);

        // Current
        add("A", Dimensions::CURRENT, 1.0);
        add("mA", Dimensions::CURRENT, 1e-3);
        add("uA", Dimensions::CURRENT, 1e-6);

        // Temperature (absolute scales only)
        add("K", Dimensions::TEMPERATURE, 1.0);
        add("mK", Dimensions::TEMPERATURE, 1e-3);
        add("uK", Dimensions::TEMPERATURE, 1e-6);
        add("nK", Dimensions::TEMPERATURE, 1e-9);
        add("pK", Dimensions::TEMPERATURE, 1e-12);

        // Angle
        add("rad", Dimensions::ANGLE, 1.0);
        add("deg", Dimensions::ANGLE, PI / 180.0);

        // Count and data
        add("count", Dimensions::COUNT, 1.0);
        add("bit", Dimensions::DATA, 1.0);
        add("B", Dimensions::DATA, 8.0);
        add("KB", Dimensions::DATA, 8e3);
        add("MB", Dimensions::DATA, 8e6);
        add("GB", Dimensions::DATA, 8e9);

        // Frequency
        add("Hz", Dimensions::FREQUENCY, 1.0);
        add("kHz", Dimensions::FREQUENCY, 1e3);
        add("MHz", Dimensions::FREQUENCY, 1e6);
        add("GHz", Dimensions::FREQUENCY, 1e9);

        // Force
        add("N", Dimensions::FORCE, 1.0);
        add("kN", Dimensions::FORCE, 1e3);
        add("lbf", Dimensions::FORCE, 4.448_221_615_260_5);

        // Pressure
        add("Pa", Dimensions::PRESSURE, 1.0);
        add("kPa", Dimensions::PRESSURE, 1e3);
        add("MPa", Dimensions::PRESSURE, 1e6);
        add("bar", Dimensions::PRESSURE, 1e5);
        add("psi", Dimensions::PRESSURE, 6_894.757_293_168);
        add("atm", Dimensions::PRESSURE, 101_325.0);

        // Energy and power
        add("J", Dimensions::ENERGY, 1.0);
        add("kJ", Dimensions::ENERGY, 1e3);
        add("W", Dimensions::POWER, 1.0);
        add("kW", Dimensions::POWER, 1e3);

        // Electrical
        add("V", Dimensions::VOLTAGE, 1.0);
        add("mV", Dimensions::VOLTAGE, 1e-3);
        add("ohm", Dimensions::RESISTANCE, 1.0);

        Registry { units }
    }
}

/// Look up a unit in the global registry, returning an owned copy.
pub fn resolve(name: &str) -> Option<Unit> {
    Registry::global().resolve(name)
}
