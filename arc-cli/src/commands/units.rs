//! `units` command

use anyhow::{anyhow, Result};
use arc_types::{Dimensions, Registry, Unit};
use colored::*;

pub fn units_command(dimension: Option<&str>) -> Result<()> {
    let units = list_units(dimension)?;
    for unit in &units {
        println!(
            "{:<8} {:>12e}  {}",
            unit.name.bold(),
            unit.scale,
            unit.dimensions.to_string().dimmed()
        );
    }
    println!("{} units", units.len());
    Ok(())
}

/// Registry entries, optionally limited to one physical quantity
pub fn list_units(dimension: Option<&str>) -> Result<Vec<Unit>> {
    let registry = Registry::global();
    match dimension {
        Some(quantity) => {
            let dims = Dimensions::for_quantity(quantity)
                .ok_or_else(|| anyhow!("Unknown quantity '{}'", quantity))?;
            Ok(registry.with_dimensions(dims))
        }
        None => Ok(registry
            .names()
            .into_iter()
            .filter_map(|name| registry.resolve(name))
            .collect()),
    }
}
