//! JSON bodies exchanged with the verification service

use crate::pipeline::VerificationStatus;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub verification_id: String,
    #[serde(default)]
    pub detected_sig_url: Option<String>,
    #[serde(default)]
    pub cleaned_sig_url: Option<String>,
    pub confidence_score: f64,
    pub status: VerificationStatus,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub user_name: String,
    pub reference_sig_url: String,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub profile: UserProfile,
}

/// One past verification, as stored server side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub original_doc_url: Option<String>,
    #[serde(default)]
    pub cleaned_sig_url: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    pub status: String,
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerificationsEnvelope {
    #[serde(default)]
    pub verifications: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Error body of a non-2xx response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` as display text; validation errors send a list, not a string
    pub fn into_detail(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// RFC 3339, or a zone-less ISO-8601 timestamp taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_naive_timestamp_as_utc() {
        let ts = parse_timestamp("2024-05-01T12:30:00.123456").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 30);
    }

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let ts = parse_timestamp("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 10);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_verification_response_from_service() {
        let body = r#"{
            "verification_id": "6f1c",
            "detected_sig_url": "https://cdn/detected.jpg",
            "cleaned_sig_url": null,
            "confidence_score": 0.42,
            "status": "failed",
            "timestamp": "2024-05-01T12:00:00.5"
        }"#;

        let response: VerificationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, VerificationStatus::Failed);
        assert_eq!(response.detected_sig_url.as_deref(), Some("https://cdn/detected.jpg"));
        assert!(response.cleaned_sig_url.is_none());
        assert!(response.timestamp.is_some());
    }

    #[test]
    fn test_unparseable_verify_timestamp_is_dropped() {
        let body = r#"{"verification_id":"a","confidence_score":0.9,"status":"success","timestamp":"soon"}"#;
        let response: VerificationResponse = serde_json::from_str(body).unwrap();
        assert!(response.timestamp.is_none());
    }

    #[test]
    fn test_history_envelope() {
        let body = r#"{"verifications": [
            {"id": "1", "user_id": "u", "original_doc_url": "https://cdn/doc.png",
             "cleaned_sig_url": null, "confidence_score": null,
             "status": "processing", "timestamp": "2024-05-01T12:00:00"}
        ]}"#;

        let envelope: VerificationsEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.verifications.len(), 1);
        assert!(envelope.verifications[0].confidence_score.is_none());
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"User profile not found"}"#).unwrap();
        assert_eq!(body.into_detail().as_deref(), Some("User profile not found"));

        let body: ErrorBody = serde_json::from_str(r#"{"detail":[{"msg":"field required"}]}"#).unwrap();
        assert!(body.into_detail().unwrap().contains("field required"));
    }
}
