//! Output formatting for CLI commands.
//!
//! Text output uses coloured summaries and `tabled` tables; JSON output
//! serializes the underlying result types for scripting.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::planner::{Action, ActionKind, ReconcilePlan};
use crate::reconciler::{DriftReport, ReconciliationResult};

use super::commands::OutputFormat;

/// Longest value shown in a table cell before truncation.
const MAX_VALUE_WIDTH: usize = 40;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanActionRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Whether JSON output was requested.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Formats a reconciliation plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ReconcilePlan) -> String {
        match self.format {
            OutputFormat::Json => to_json(plan),
            OutputFormat::Text => Self::format_plan_text(plan),
        }
    }

    fn format_plan_text(plan: &ReconcilePlan) -> String {
        if plan.is_empty() {
            return format!("{} No changes required - live tree is up to date.\n", "✓".green());
        }

        let mut output = String::new();
        let _ = writeln!(output, "\nReconcile Plan");
        let _ = writeln!(
            output,
            "   Desired: {}  Live: {}\n",
            short(&plan.desired_hash),
            short(&plan.live_hash)
        );

        let rows: Vec<PlanActionRow> = plan
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| PlanActionRow {
                index: i + 1,
                action: Self::format_action_kind(a.kind()),
                key: a.key().to_string(),
                value: Self::format_value_change(a),
            })
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let _ = write!(
            output,
            "\nPlan: {} to create, {} to update, {} to delete\n",
            plan.create_count().to_string().green(),
            plan.update_count().to_string().yellow(),
            plan.delete_count().to_string().red()
        );

        output
    }

    /// Formats a drift report.
    #[must_use]
    pub fn format_drift(&self, report: &DriftReport) -> String {
        match self.format {
            OutputFormat::Json => to_json(report),
            OutputFormat::Text => {
                if report.is_converged() {
                    format!("{} No drift detected - live tree is converged.\n", "✓".green())
                } else {
                    let mut output = format!("{} Drift detected:\n\n", "⚠".yellow());
                    for key in &report.drifted_keys {
                        let _ = writeln!(output, "   - {key}");
                    }
                    let _ = write!(
                        output,
                        "\n{} keys differ ({} desired nodes, {} live nodes).\n",
                        report.drifted_keys.len(),
                        report.desired_nodes,
                        report.live_nodes
                    );
                    output
                }
            }
        }
    }

    /// Formats a reconciliation result.
    #[must_use]
    pub fn format_reconciliation(&self, result: &ReconciliationResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(result),
            OutputFormat::Text => {
                let status = if result.report.cancelled {
                    format!("{} Reconciliation cancelled", "⚠".yellow())
                } else if result.success {
                    format!("{} Reconciliation successful", "✓".green())
                } else {
                    format!("{} Reconciliation incomplete", "⚠".yellow())
                };

                let mut output = format!("{status}\n\n");
                let _ = writeln!(output, "   Applied: {}", result.report.applied.len());
                let _ = writeln!(output, "   Skipped: {}", result.report.skipped.len());
                let _ = writeln!(output, "   Planned: {}", result.plan.action_count());

                if !result.report.skipped.is_empty() {
                    let _ = write!(output, "\n{} Declined:\n", "⚠".yellow());
                    for action in &result.report.skipped {
                        let _ = writeln!(output, "   - {action}");
                    }
                }

                output
            }
        }
    }

    /// Formats a successful validation.
    #[must_use]
    pub fn format_valid(&self, source: &str, nodes: usize) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "status": "valid",
                "source": source,
                "nodes": nodes,
            })),
            OutputFormat::Text => format!("{} {source} is valid ({nodes} nodes)\n", "✓".green()),
        }
    }

    /// Formats a fatal error for the operator.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "status": "error",
                "message": message,
            })),
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Formats an action kind with color.
    fn format_action_kind(kind: ActionKind) -> String {
        match kind {
            ActionKind::Create => "+create".green().to_string(),
            ActionKind::SetValue => "~value".yellow().to_string(),
            ActionKind::Delete => "-delete".red().to_string(),
        }
    }

    fn format_value_change(action: &Action) -> String {
        match (action.old_value(), action.new_value()) {
            (Some(old), Some(new)) => format!(
                "{} -> {}",
                truncate(old, MAX_VALUE_WIDTH),
                truncate(new, MAX_VALUE_WIDTH)
            ),
            (None, Some(new)) => truncate(new, MAX_VALUE_WIDTH),
            _ => String::new(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

/// Truncates a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> ReconcilePlan {
        ReconcilePlan::new(
            vec![
                Action::delete("/old"),
                Action::set_value("/a", "2", "1"),
                Action::create("/b", "x"),
            ],
            "0123456789abcdef",
            "fedcba9876543210",
        )
    }

    #[test]
    fn test_text_plan_has_table_and_summary() {
        colored::control::set_override(false);
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&sample_plan());

        assert!(text.contains("/old"));
        assert!(text.contains("1 -> 2"));
        assert!(text.contains("Plan: 1 to create, 1 to update, 1 to delete"));
        assert!(text.contains("01234567"));
    }

    #[test]
    fn test_json_plan() {
        let json = OutputFormatter::new(OutputFormat::Json).format_plan(&sample_plan());
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");

        assert_eq!(value["actions"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["actions"][0]["kind"], "DELETE");
    }

    #[test]
    fn test_empty_plan() {
        let plan = ReconcilePlan::new(Vec::new(), "a", "a");
        let text = OutputFormatter::new(OutputFormat::Text).format_plan(&plan);
        assert!(text.contains("No changes required"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate("ééééééééé", 5), "éé...");
    }
}
