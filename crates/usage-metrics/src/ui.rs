//! Terminal rendering of reports and generator summaries.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};
use num_format::{Locale, ToFormattedString};

use crate::client::{AccessStatus, EndpointProbe, Project};
use crate::generator::GenerationSummary;
use crate::report::{AggregatedReport, MetricsReport};

/// Format an integer with thousands separators, e.g. `1,234,567`.
#[must_use]
pub fn format_count(value: impl ToFormattedString) -> String {
    value.to_formatted_string(&Locale::en)
}

/// Format a micro-dollar amount as `$0.0000`.
#[must_use]
pub fn format_usd(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    // Four decimals: round to the nearest hundred micro-dollars.
    let hundreds = (micros + 50) / 100;
    format!("{sign}${}.{:04}", hundreds / 10_000, hundreds % 10_000)
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles.iter().map(|t| Cell::new(t).fg(Color::Cyan)).collect()
}

fn numeric(value: String) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Table of token usage per day and model.
#[must_use]
pub fn usage_table(usage: &AggregatedReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Date", "Model", "Input", "Output", "Cached", "Requests"]));

    for row in usage.rows() {
        table.add_row(vec![
            Cell::new(row.date),
            Cell::new(row.model),
            numeric(format_count(row.totals.input_tokens)),
            numeric(format_count(row.totals.output_tokens)),
            numeric(format_count(row.totals.cached_input_tokens)).fg(Color::DarkGrey),
            numeric(format_count(row.totals.num_requests)),
        ]);
    }

    table
}

/// Table of spend per day and line item.
#[must_use]
pub fn cost_table(costs: &AggregatedReport) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["Date", "Line item", "Cost"]));

    for row in costs.rows() {
        table.add_row(vec![
            Cell::new(row.date),
            Cell::new(row.model),
            numeric(format_usd(row.totals.cost_micros)).fg(Color::Green),
        ]);
    }

    table
}

/// Table of organization projects.
#[must_use]
pub fn project_table(projects: &[Project]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["ID", "Name", "Status", "Created"]));

    for project in projects {
        let status_color = match project.status.as_deref() {
            Some("active") => Color::Green,
            Some("archived") => Color::DarkGrey,
            _ => Color::White,
        };
        table.add_row(vec![
            Cell::new(&project.id),
            Cell::new(&project.name),
            Cell::new(project.status.as_deref().unwrap_or("-")).fg(status_color),
            Cell::new(
                project
                    .created_at
                    .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d").to_string()),
            ),
        ]);
    }

    table
}

/// Print one line per endpoint access check.
pub fn print_access(probes: &[EndpointProbe]) {
    println!("{}", "Testing API access...".bold());
    for probe in probes {
        match &probe.status {
            AccessStatus::Accessible { items: Some(n) } => {
                println!(
                    "{} {} - accessible ({n} items)",
                    "✓".green().bold(),
                    probe.endpoint
                );
            }
            AccessStatus::Accessible { items: None } => {
                println!("{} {} - accessible", "✓".green().bold(), probe.endpoint);
            }
            AccessStatus::Unauthorized { status, message } => {
                println!(
                    "{} {} - {status}: {message}",
                    "⚠".yellow().bold(),
                    probe.endpoint
                );
            }
            AccessStatus::Failed { status, message } => {
                let code = status.map_or_else(|| "error".to_string(), |s| s.to_string());
                println!(
                    "{} {} - {code}: {message}",
                    "✗".red().bold(),
                    probe.endpoint
                );
            }
        }
    }
    println!();
}

fn section(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

/// Print the full report as tables.
pub fn print_report(report: &MetricsReport) {
    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {}",
        "Usage metrics".cyan().bold(),
        report.range.to_string().dimmed()
    );
    println!("{}", "═".repeat(60).dimmed());

    if !report.access.is_empty() {
        println!();
        print_access(&report.access);
    }

    if report.has_no_metrics() {
        print_empty_summary(report);
    } else {
        if !report.usage.is_empty() {
            section("Usage");
            println!("{}", usage_table(&report.usage));
            let totals = report.usage.totals();
            println!(
                "{}: {} input, {} output tokens",
                "Total tokens".bold(),
                format_count(totals.input_tokens),
                format_count(totals.output_tokens)
            );
        }

        if !report.costs.is_empty() {
            section("Costs");
            println!("{}", cost_table(&report.costs));
            println!(
                "{}: {}",
                "Total cost".bold(),
                format_usd(report.costs.totals().cost_micros).green()
            );
        }
    }

    section("Projects");
    if report.projects.is_empty() {
        println!("{}", "No project data available".dimmed());
    } else {
        println!("{}", project_table(&report.projects));
    }
    println!();
}

fn print_empty_summary(report: &MetricsReport) {
    section("Summary");
    println!("No usage or cost data was found for {}.", report.range);
    let restricted = report
        .access
        .iter()
        .any(|p| matches!(p.status, AccessStatus::Unauthorized { .. }));
    if restricted {
        print_warning("Some endpoints need higher permissions (marked ⚠ above).");
    }
}

/// Print the outcome of a generator run.
pub fn print_generation_summary(summary: &GenerationSummary) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(&["#", "Kind", "Model", "Input", "Output", "Flagged"]));

    for (i, call) in summary.calls.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(call.kind),
            Cell::new(call.model.as_deref().unwrap_or("-")),
            numeric(format_count(call.input_tokens)),
            numeric(format_count(call.output_tokens)),
            Cell::new(call.flagged.map_or("-", |f| if f { "yes" } else { "no" })),
        ]);
    }

    println!("{table}");
    print_success(&format!(
        "{} calls succeeded ({} input, {} output tokens)",
        summary.successful_calls(),
        format_count(summary.total_input_tokens()),
        format_count(summary.total_output_tokens())
    ));
    print_info("Usage data can take a few minutes to appear in the metrics endpoints");
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
