//! `solve` command: constraints, then operator checks on the resolved types

use crate::problem::Problem;
use crate::OutputFormat;
use anyhow::{bail, Result};
use arc_checker::{
    power_unit, CheckerConfig, ConstraintKind, Diagnostic, DiagnosticSink, DimensionalAnalyzer,
    Diagnostics, System, TypeError,
};
use arc_types::Span;
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of solving one problem file
#[derive(Debug, Serialize)]
pub struct Report {
    /// Type variable name to its resolved type
    pub resolved: BTreeMap<String, String>,
    /// Result units of power operations with a literal exponent, by index
    pub power_units: BTreeMap<usize, String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == arc_checker::Severity::Error).count()
    }
}

pub fn solve_command(input: &Path, format: OutputFormat, config: CheckerConfig) -> Result<()> {
    info!("Solving {}", input.display());
    let problem = Problem::from_file(input)?;
    let report = solve(&problem, config)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }

    let errors = report.error_count();
    if errors > 0 {
        bail!("{} error(s) in {}", errors, input.display());
    }
    Ok(())
}

/// Run the checker over a parsed problem.
///
/// Constraint errors are reported as diagnostics. Operator checks run only
/// once unification succeeded, against the resolved operand types.
pub fn solve(problem: &Problem, config: CheckerConfig) -> Result<Report> {
    let magnitude = config.magnitude;
    let mut system = System::with_config(config);
    let mut diags = Diagnostics::new();

    for entry in &problem.constraints {
        let (left, right) = (entry.left.clone(), entry.right.clone());
        let reason = entry.reason.clone();
        let added = match entry.kind {
            ConstraintKind::Equality => system.add_equality(left, right, entry.span, reason),
            ConstraintKind::Compatible => system.add_compatible(left, right, entry.span, reason),
        };
        if let Err(e) = added {
            report_type_error(&mut diags, &e, entry.span);
        }
    }

    let mut power_units = BTreeMap::new();
    if diags.has_errors() {
        debug!("skipping unification after constraint errors");
    } else if let Err(e) = system.unify() {
        report_type_error(&mut diags, &e, None);
    } else {
        for c in system.constraints() {
            debug!(constraint = %c, "solved");
        }
        let mut analyzer = DimensionalAnalyzer::with_config(&mut diags, magnitude);

        for entry in &problem.binary_ops {
            let left = system.apply_substitutions(&entry.left);
            let right = system.apply_substitutions(&entry.right);
            analyzer.validate_binary_op(entry.operator()?, &left, &right, location(entry.span));
        }

        for entry in &problem.assignments {
            let target = system.apply_substitutions(&entry.target);
            let source = system.apply_substitutions(&entry.source);
            analyzer.check_assignment_magnitude(&target, &source, entry.literal, location(entry.span));
        }

        let mut power_errors = Vec::new();
        for (index, entry) in problem.power_ops.iter().enumerate() {
            let base = system.apply_substitutions(&entry.base);
            let exponent = system.apply_substitutions(&entry.exponent);
            let checked = analyzer
                .validate_power_op(&base, &exponent, entry.is_literal_int, entry.span)
                .and_then(|()| match entry.exponent_value {
                    Some(n) => power_unit(&base, n),
                    None => Ok(None),
                });
            match checked {
                Ok(Some(unit)) => {
                    power_units.insert(index, unit.to_string());
                }
                Ok(None) => {}
                Err(e) => power_errors.push(e),
            }
        }

        for e in power_errors {
            report_type_error(&mut diags, &e, None);
        }
    }

    let resolved = system
        .type_variables()
        .iter()
        .map(|(name, var)| (name.clone(), system.apply_substitutions(var).to_string()))
        .collect();

    Ok(Report {
        resolved,
        power_units,
        diagnostics: diags.iter().cloned().collect(),
    })
}

fn location(span: Option<Span>) -> Span {
    span.unwrap_or_else(Span::dummy)
}

fn report_type_error(sink: &mut dyn DiagnosticSink, error: &TypeError, fallback: Option<Span>) {
    let location = location(error.location().or(fallback));
    sink.error(location, error.to_string(), error.hint().map(str::to_string));
}

fn print_report(report: &Report) {
    if !report.resolved.is_empty() {
        println!("{}", "Resolved types:".bold());
        for (name, ty) in &report.resolved {
            println!("  {} = {}", name.cyan(), ty);
        }
    }

    if !report.power_units.is_empty() {
        println!("{}", "Power results:".bold());
        for (index, unit) in &report.power_units {
            println!("  #{} -> {}", index, unit);
        }
    }

    for diagnostic in &report.diagnostics {
        let label = match diagnostic.severity {
            arc_checker::Severity::Error => "error".red().bold(),
            arc_checker::Severity::Warning => "warning".yellow().bold(),
        };
        println!("{}: {}", label, diagnostic.message);
        if let Some(hint) = &diagnostic.hint {
            println!("  {} {}", "hint:".blue(), hint);
        }
    }

    if report.error_count() == 0 {
        println!("{} No errors", "✓".green());
    }
}
