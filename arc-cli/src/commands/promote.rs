//! `promote` command

use anyhow::{bail, Context, Result};
use arc_checker::promote;
use arc_types::Type;
use colored::*;

pub fn promote_command(a: &str, b: &str) -> Result<()> {
    let promoted = promote_names(a, b)?;
    println!("{} ~ {} => {}", a, b, promoted.to_string().cyan().bold());
    Ok(())
}

/// Parse two numeric types and promote them
pub fn promote_names(a: &str, b: &str) -> Result<Type> {
    let left = parse_numeric(a)?;
    let right = parse_numeric(b)?;
    Ok(promote(&left, &right))
}

fn parse_numeric(text: &str) -> Result<Type> {
    let ty: Type = text
        .parse()
        .with_context(|| format!("Invalid type '{}'", text))?;
    if !(ty.is_integer() || ty.is_float()) {
        bail!("'{}' is not a numeric type", text);
    }
    Ok(ty)
}
