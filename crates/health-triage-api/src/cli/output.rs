//! Output formatting for the health triage CLI
//!
//! JSON, YAML or a colored table. Findings are colored by status: high
//! readings red, low readings yellow.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use health_triage_core::{Analysis, Finding, RuleTable, Status};
use serde::Serialize;
use std::io::{self, Write};

use crate::error::{Result, ServiceError};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Result of `analyze` or `predict` as rendered by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct TriageOutput {
    /// Present only for `predict`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub message: String,
    pub issues: Vec<Finding>,
}

impl TriageOutput {
    pub fn from_analysis(condition: Option<String>, analysis: &Analysis) -> Self {
        Self {
            condition,
            message: analysis.message().to_string(),
            issues: analysis.issues().to_vec(),
        }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => print_json(self),
            OutputFormat::Yaml => print_yaml(self),
            OutputFormat::Table => self.render_table(),
        }
    }

    fn render_table(&self) -> Result<()> {
        let mut stdout = io::stdout();

        writeln!(stdout)?;
        writeln!(stdout, "{}", "Triage Results".cyan().bold())?;
        writeln!(stdout, "{}", "=".repeat(60))?;

        if let Some(condition) = &self.condition {
            writeln!(stdout, "Condition: {}", condition.bold())?;
        }

        let status_icon = if self.issues.is_empty() {
            "+".green()
        } else {
            "x".red()
        };
        writeln!(stdout, "{} {}", status_icon, self.message)?;
        writeln!(stdout)?;

        if !self.issues.is_empty() {
            writeln!(stdout, "{}", "Findings:".cyan().bold())?;
            writeln!(stdout, "{}", "-".repeat(60))?;

            for finding in &self.issues {
                writeln!(
                    stdout,
                    "  {:<14} {:>8}  {}",
                    finding.parameter.label(),
                    finding.value,
                    status_colored(finding.status)
                )?;
                writeln!(stdout, "  {} {}", "->".dimmed(), finding.suggestion)?;
            }
            writeln!(stdout)?;
        }

        Ok(())
    }
}

/// Render the rule table
pub fn render_rules(table: &RuleTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&table.rules()),
        OutputFormat::Yaml => print_yaml(&table.rules()),
        OutputFormat::Table => {
            let mut stdout = io::stdout();
            writeln!(stdout)?;
            writeln!(
                stdout,
                "{} ({})",
                "Threshold Rules".cyan().bold(),
                table.len()
            )?;
            writeln!(stdout, "{}", "=".repeat(60))?;
            for rule in table.rules() {
                writeln!(
                    stdout,
                    "  {:<22} {:<12} {}",
                    rule.describe(),
                    status_colored(rule.status),
                    rule.suggestion
                )?;
            }
            writeln!(stdout)?;
            Ok(())
        }
    }
}

fn status_colored(status: Status) -> ColoredString {
    let label = status.to_string();
    match status {
        Status::High | Status::Obese => label.red().bold(),
        Status::Low | Status::Underweight => label.yellow().bold(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).map_err(ServiceError::from)?;
    print!("{}", yaml);
    Ok(())
}
