//! Stage outputs and the terminal verification result

use super::confidence::{Band, Score};
use super::mode::Mode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel region `[x0, y0, x1, y1]` of a detected signature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).max(0.0)
    }

    /// Non-degenerate box with finite corners
    pub fn is_usable(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }
}

/// Where a stage artifact can be found
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactRef {
    /// Image hosted by the verification service
    Remote { url: String },
    /// Region of the uploaded document found on-device
    LocalRegion { bbox: BoundingBox },
}

impl ArtifactRef {
    pub fn remote(url: impl Into<String>) -> Self {
        ArtifactRef::Remote { url: url.into() }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ArtifactRef::Remote { url } => Some(url),
            ArtifactRef::LocalRegion { .. } => None,
        }
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactRef::Remote { url } => f.write_str(url),
            ArtifactRef::LocalRegion { bbox } => write!(
                f,
                "local region [{}, {}, {}, {}]",
                bbox.x0, bbox.y0, bbox.x1, bbox.y1
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub artifact: ArtifactRef,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Purification {
    pub artifact: ArtifactRef,
}

/// Raw output of the scoring collaborator, prior to range validation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub verification_id: String,
    pub score: f64,
    /// The collaborator's own verdict for this score
    pub status: VerificationStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Success,
    Failed,
    Processing,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Success => "success",
            VerificationStatus::Failed => "failed",
            VerificationStatus::Processing => "processing",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline run. Immutable once built; the band always
/// follows from the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    id: String,
    detected: Option<ArtifactRef>,
    purified: Option<ArtifactRef>,
    score: Score,
    band: Band,
    status: VerificationStatus,
    mode: Mode,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl VerificationResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        detected: Option<ArtifactRef>,
        purified: Option<ArtifactRef>,
        score: Score,
        status: VerificationStatus,
        mode: Mode,
        timestamp: DateTime<Utc>,
        message: Option<String>,
    ) -> Self {
        Self {
            id,
            detected,
            purified,
            band: score.band(),
            score,
            status,
            mode,
            timestamp,
            message,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn detected(&self) -> Option<&ArtifactRef> {
        self.detected.as_ref()
    }

    pub fn purified(&self) -> Option<&ArtifactRef> {
        self.purified.as_ref()
    }

    pub fn score(&self) -> f64 {
        self.score.value()
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// User-facing failure text, for failed runs
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
