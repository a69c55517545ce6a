//! Output formatting for multiple formats
//!
//! JSON and YAML serialize the presenter views directly; the human format
//! draws them as text.
//!
//! # Example
//!
//! ```ignore
//! use puresign::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_verification(&result)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::{VerificationResult, VerificationStatus};
use crate::presenter::{gauge, history_row, present, GaugeView, StageStatus, StageView};
use crate::remote::{HealthStatus, HistoryEntry, UserProfile};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct VerificationReport<'a> {
    result: &'a VerificationResult,
    stages: [StageView; 3],
    gauge: GaugeView,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_verification(&self, result: &VerificationResult) -> Result<String> {
        let report = VerificationReport {
            result,
            stages: present(result),
            gauge: gauge(result.score()),
        };

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&report)
                .context("Failed to serialize verification result to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&report)
                .context("Failed to serialize verification result to YAML"),
            OutputFormat::Human => Ok(self.format_verification_human(&report)),
        }
    }

    pub fn format_history(&self, entries: &[HistoryEntry]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(entries).context("Failed to serialize history to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(entries).context("Failed to serialize history to YAML")
            }
            OutputFormat::Human => Ok(self.format_history_human(entries)),
        }
    }

    pub fn format_profile(&self, profile: &UserProfile) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(profile).context("Failed to serialize profile to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(profile).context("Failed to serialize profile to YAML")
            }
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("User Profile\n");
                output.push_str(RULE);
                output.push_str("\n\n");
                output.push_str(&format!("Name:          {}\n", profile.user_name));
                output.push_str(&format!("ID:            {}\n", profile.id));
                output.push_str(&format!("Reference:     {}\n", profile.reference_sig_url));
                output.push_str(&format!(
                    "Member since:  {}\n",
                    profile.created_at.format("%Y-%m-%d")
                ));
                Ok(output)
            }
        }
    }

    pub fn format_health(&self, base_url: &str, health: &HealthStatus) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "service": base_url,
                "status": health.status,
            }))
            .context("Failed to serialize health status to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&serde_json::json!({
                "service": base_url,
                "status": health.status,
            }))
            .context("Failed to serialize health status to YAML"),
            OutputFormat::Human => Ok(format!("\u{2713} {}\n  Status: {}\n", base_url, health.status)),
        }
    }

    fn format_verification_human(&self, report: &VerificationReport<'_>) -> String {
        let result = report.result;
        let mut output = String::new();

        if result.status() == VerificationStatus::Success {
            output.push_str("\u{2713} Signature Verification Result\n");
        } else {
            output.push_str("\u{2717} Signature Verification Failed\n");
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str("Stages:\n");
        for (i, stage) in report.stages.iter().enumerate() {
            let connector = if i == report.stages.len() - 1 {
                "\u{2514}"
            } else {
                "\u{251C}"
            };
            let symbol = match stage.status {
                StageStatus::Success => "\u{2713}",
                StageStatus::Failed => "\u{2717}",
                StageStatus::Pending | StageStatus::Processing => "\u{00B7}",
            };
            output.push_str(&format!(
                "{}\u{2500} {} {} ({})",
                connector,
                symbol,
                stage.title,
                stage.status.as_str().to_uppercase()
            ));
            if let Some(ref artifact) = stage.artifact {
                output.push_str(&format!("  {}", artifact));
            }
            output.push('\n');
        }
        output.push('\n');

        let gauge = &report.gauge;
        let filled_blocks = ((gauge.fill() * 10.0).round() as usize).min(10);
        let bar = "\u{2588}".repeat(filled_blocks) + &"\u{2591}".repeat(10 - filled_blocks);
        output.push_str(&format!(
            "Match Score: {} {}% ({})\n",
            bar, gauge.percentage, gauge.label
        ));

        if let Some(message) = result.message() {
            output.push_str(&format!("\n\u{26A0} {}\n", message));
        }

        output.push_str(&format!(
            "\nID: {}  Mode: {}  At: {}\n",
            result.id(),
            result.mode(),
            result.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output
    }

    fn format_history_human(&self, entries: &[HistoryEntry]) -> String {
        if entries.is_empty() {
            return "No verification history yet. Start by verifying a document.\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!(
            "{:<20} {:<11} {:<11} {}\n",
            "DATE", "STATUS", "CONFIDENCE", "PURIFIED"
        ));
        for entry in entries {
            let row = history_row(entry);
            output.push_str(&format!(
                "{:<20} {:<11} {:<11} {}\n",
                row.date,
                row.status,
                row.confidence,
                row.link.as_deref().unwrap_or("-")
            ));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ArtifactRef, Mode, Score};
    use chrono::Utc;

    fn result() -> VerificationResult {
        VerificationResult::new(
            "v-9".to_string(),
            Some(ArtifactRef::remote("https://cdn/d.jpg")),
            None,
            Score::ZERO,
            VerificationStatus::Failed,
            Mode::Remote,
            Utc::now(),
            Some("Signature could not be purified".to_string()),
        )
    }

    #[test]
    fn test_human_verification_output() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_verification(&result())
            .unwrap();

        assert!(output.contains("Verification Failed"));
        assert!(output.contains("Detected (SUCCESS)"));
        assert!(output.contains("Purified (PENDING)"));
        assert!(output.contains("Result (FAILED)"));
        assert!(output.contains("Signature could not be purified"));
        assert!(output.contains("0% (Failed)"));
    }

    #[test]
    fn test_json_verification_output() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_verification(&result())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["result"]["status"], "failed");
        assert_eq!(value["stages"][0]["status"], "success");
        assert_eq!(value["stages"][1]["status"], "pending");
        assert_eq!(value["gauge"]["color"], "#ef4444");
    }

    #[test]
    fn test_empty_history_message() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_history(&[])
            .unwrap();
        assert!(output.contains("No verification history yet"));
    }
}
