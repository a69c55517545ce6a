//! Confidence bands for verification scores

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lower bound (inclusive) of the Verified band
pub const VERIFIED_THRESHOLD: f64 = 0.70;

/// Lower bound (inclusive) of the Uncertain band
pub const UNCERTAIN_THRESHOLD: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Verified,
    Uncertain,
    Failed,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::Verified => "Verified",
            Band::Uncertain => "Uncertain",
            Band::Failed => "Failed",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a confidence score onto its band.
///
/// # Precondition
///
/// `score` must already be validated: finite and within `[0, 1]`. This
/// function does not check; callers reject anything else first (see
/// [`Score::new`]). An unvalidated NaN would land in `Failed`.
pub fn classify(score: f64) -> Band {
    if score >= VERIFIED_THRESHOLD {
        Band::Verified
    } else if score >= UNCERTAIN_THRESHOLD {
        Band::Uncertain
    } else {
        Band::Failed
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error("confidence score is not a number")]
    NotANumber,

    #[error("confidence score {0} is outside [0, 1]")]
    OutOfRange(f64),
}

/// A confidence score known to be finite and within `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const ZERO: Score = Score(0.0);

    pub fn new(value: f64) -> Result<Self, ScoreError> {
        if value.is_nan() {
            return Err(ScoreError::NotANumber);
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn band(self) -> Band {
        classify(self.0)
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        exact_verified = { 0.70, Band::Verified },
        just_below_verified = { 0.6999, Band::Uncertain },
        exact_uncertain = { 0.50, Band::Uncertain },
        just_below_uncertain = { 0.4999, Band::Failed },
        top = { 1.0, Band::Verified },
        bottom = { 0.0, Band::Failed },
        high = { 0.85, Band::Verified },
    )]
    fn test_classify_boundaries(score: f64, expected: Band) {
        assert_eq!(classify(score), expected);
    }

    #[test]
    fn test_score_rejects_invalid_values() {
        assert_eq!(Score::new(f64::NAN), Err(ScoreError::NotANumber));
        assert_eq!(Score::new(1.01), Err(ScoreError::OutOfRange(1.01)));
        assert_eq!(Score::new(-0.1), Err(ScoreError::OutOfRange(-0.1)));
        assert!(Score::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_score_band_matches_classify() {
        let score = Score::new(0.55).unwrap();
        assert_eq!(score.band(), Band::Uncertain);
        assert_eq!(Score::ZERO.band(), Band::Failed);
    }

    #[test]
    fn test_band_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Band::Verified).unwrap(), "\"verified\"");
    }
}
