//! Pure projections from results into what the output layer draws
//!
//! Nothing here renders. [`present`], [`gauge`] and [`history_row`] compute
//! labels, statuses, geometry and colours; `cli::output` turns them into
//! text.

use crate::pipeline::{classify, ArtifactRef, Band, VerificationResult, VerificationStatus};
use crate::remote::HistoryEntry;
use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Pending,
    Failed,
    Processing,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StageStatus::Success => "success",
            StageStatus::Pending => "pending",
            StageStatus::Failed => "failed",
            StageStatus::Processing => "processing",
        }
    }
}

impl From<VerificationStatus> for StageStatus {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Success => StageStatus::Success,
            VerificationStatus::Failed => StageStatus::Failed,
            VerificationStatus::Processing => StageStatus::Processing,
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    pub title: &'static str,
    pub description: &'static str,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,
}

fn artifact_stage(
    title: &'static str,
    description: &'static str,
    artifact: Option<&ArtifactRef>,
) -> StageView {
    StageView {
        title,
        description,
        status: if artifact.is_some() {
            StageStatus::Success
        } else {
            StageStatus::Pending
        },
        artifact: artifact.cloned(),
    }
}

/// Three stage cards for a (possibly partial) result: Detected, Purified,
/// Result. The first two succeed iff their artifact exists; the last
/// mirrors the result status.
pub fn present(result: &VerificationResult) -> [StageView; 3] {
    [
        artifact_stage("Detected", "Signature located in the document", result.detected()),
        artifact_stage("Purified", "Background artifacts removed", result.purified()),
        StageView {
            title: "Result",
            description: "Verification complete",
            status: result.status().into(),
            artifact: None,
        },
    ]
}

pub const VERIFIED_COLOR: &str = "#10b981";
pub const UNCERTAIN_COLOR: &str = "#f59e0b";
pub const FAILED_COLOR: &str = "#ef4444";

pub fn band_color(band: Band) -> &'static str {
    match band {
        Band::Verified => VERIFIED_COLOR,
        Band::Uncertain => UNCERTAIN_COLOR,
        Band::Failed => FAILED_COLOR,
    }
}

/// Semicircular confidence gauge. Angles are in radians, drawn clockwise
/// from `start_angle` (π, the left end) towards `end_angle` (0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaugeView {
    pub percentage: u8,
    pub start_angle: f64,
    pub end_angle: f64,
    pub score_angle: f64,
    pub band: Band,
    pub label: &'static str,
    pub color: &'static str,
}

impl GaugeView {
    /// Share of the arc that is filled, in [0, 1]
    pub fn fill(&self) -> f64 {
        (self.start_angle - self.score_angle) / (self.start_angle - self.end_angle)
    }
}

/// Expects a validated score in [0, 1]; values outside are clamped
pub fn gauge(score: f64) -> GaugeView {
    let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
    let band = classify(score);

    GaugeView {
        percentage: (score * 100.0).round() as u8,
        start_angle: PI,
        end_angle: 0.0,
        score_angle: PI - PI * score,
        band,
        label: band.label(),
        color: band_color(band),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub id: String,
    pub date: String,
    pub status: String,
    pub confidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

pub fn history_row(entry: &HistoryEntry) -> HistoryRow {
    HistoryRow {
        id: entry.id.clone(),
        date: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        status: entry.status.to_uppercase(),
        confidence: entry
            .confidence_score
            .filter(|score| score.is_finite())
            .map(|score| format!("{}%", (score * 100.0).round()))
            .unwrap_or_else(|| "N/A".to_string()),
        link: entry.cleaned_sig_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Mode, Score};
    use chrono::{TimeZone, Utc};

    fn result(
        detected: Option<ArtifactRef>,
        purified: Option<ArtifactRef>,
        status: VerificationStatus,
    ) -> VerificationResult {
        VerificationResult::new(
            "v".to_string(),
            detected,
            purified,
            Score::new(0.4).unwrap(),
            status,
            Mode::Remote,
            Utc::now(),
            None,
        )
    }

    #[test]
    fn test_partial_result_stages() {
        let views = present(&result(
            Some(ArtifactRef::remote("https://cdn/d.jpg")),
            None,
            VerificationStatus::Failed,
        ));

        let statuses: Vec<_> = views.iter().map(|v| v.status).collect();
        assert_eq!(
            statuses,
            vec![StageStatus::Success, StageStatus::Pending, StageStatus::Failed]
        );
        assert_eq!(views[0].title, "Detected");
        assert!(views[1].artifact.is_none());
    }

    #[test]
    fn test_processing_status_is_mirrored() {
        let views = present(&result(None, None, VerificationStatus::Processing));
        assert_eq!(views[0].status, StageStatus::Pending);
        assert_eq!(views[2].status, StageStatus::Processing);
    }

    #[test]
    fn test_gauge_geometry() {
        let view = gauge(0.85);
        assert_eq!(view.percentage, 85);
        assert_eq!(view.band, Band::Verified);
        assert_eq!(view.color, VERIFIED_COLOR);
        assert!((view.score_angle - PI * 0.15).abs() < 1e-9);
        assert!((view.fill() - 0.85).abs() < 1e-9);

        let empty = gauge(0.0);
        assert_eq!(empty.score_angle, PI);
        assert_eq!(empty.color, FAILED_COLOR);

        assert_eq!(gauge(0.55).color, UNCERTAIN_COLOR);
        assert_eq!(gauge(1.0).score_angle, 0.0);
    }

    #[test]
    fn test_history_row_formatting() {
        let mut entry = HistoryEntry {
            id: "1".to_string(),
            user_id: "u".to_string(),
            original_doc_url: None,
            cleaned_sig_url: Some("https://cdn/c.jpg".to_string()),
            confidence_score: Some(0.876),
            status: "success".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };

        let row = history_row(&entry);
        assert_eq!(row.status, "SUCCESS");
        assert_eq!(row.confidence, "88%");
        assert_eq!(row.date, "2024-05-01 12:00:00");
        assert_eq!(row.link.as_deref(), Some("https://cdn/c.jpg"));

        entry.confidence_score = None;
        entry.cleaned_sig_url = None;
        let row = history_row(&entry);
        assert_eq!(row.confidence, "N/A");
        assert!(row.link.is_none());
    }
}
