//! On-device signature detection
//!
//! The detector is a capability: either an engine is present
//! ([`OnDeviceDetector::Available`]) or it is not
//! ([`OnDeviceDetector::Unavailable`]). Callers go through the same methods
//! in both cases; the Unavailable arm simply reports no capability and no
//! result, which the pipeline treats as "escalate to remote".

use crate::pipeline::{ArtifactRef, BoundingBox, Detection};
use crate::staging::StagedArtifact;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// What an engine reports for one image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalDetection {
    pub bbox: [f64; 4],
    pub confidence: f64,
}

#[async_trait]
pub trait DetectionEngine: Send + Sync {
    /// Capability probe, re-evaluated before each run
    fn is_supported(&self) -> bool;

    /// Prepares the engine; `false` means it cannot be used right now
    async fn initialize(&self) -> bool;

    /// `None` when nothing usable was found
    async fn detect(&self, image: &[u8]) -> Option<LocalDetection>;

    fn name(&self) -> &str;
}

#[derive(Clone, Default)]
pub enum OnDeviceDetector {
    Available(Arc<dyn DetectionEngine>),
    #[default]
    Unavailable,
}

impl OnDeviceDetector {
    pub fn available(engine: Arc<dyn DetectionEngine>) -> Self {
        OnDeviceDetector::Available(engine)
    }

    pub fn is_available(&self) -> bool {
        match self {
            OnDeviceDetector::Available(engine) => engine.is_supported(),
            OnDeviceDetector::Unavailable => false,
        }
    }

    /// Runs on-device detection, returning `None` if the capability is
    /// missing, initialization fails, or the engine finds nothing usable.
    pub async fn detect(&self, artifact: &StagedArtifact) -> Option<Detection> {
        let engine = match self {
            OnDeviceDetector::Available(engine) => engine,
            OnDeviceDetector::Unavailable => return None,
        };

        if !engine.initialize().await {
            warn!(engine = engine.name(), "On-device engine failed to initialize");
            return None;
        }

        let found = engine.detect(&artifact.content()).await?;
        let bbox = BoundingBox::from_array(found.bbox);
        if !bbox.is_usable() || !found.confidence.is_finite() {
            debug!(engine = engine.name(), ?found, "Discarding unusable on-device detection");
            return None;
        }

        debug!(
            engine = engine.name(),
            confidence = found.confidence,
            "On-device detection succeeded"
        );

        Some(Detection {
            artifact: ArtifactRef::LocalRegion { bbox },
            confidence: Some(found.confidence),
        })
    }
}

impl fmt::Debug for OnDeviceDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnDeviceDetector::Available(engine) => {
                f.debug_tuple("Available").field(&engine.name()).finish()
            }
            OnDeviceDetector::Unavailable => f.write_str("Unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::{UploadFile, UploadStager};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FixedEngine {
        supported: AtomicBool,
        init_ok: bool,
        result: Option<LocalDetection>,
    }

    #[async_trait]
    impl DetectionEngine for FixedEngine {
        fn is_supported(&self) -> bool {
            self.supported.load(Ordering::SeqCst)
        }

        async fn initialize(&self) -> bool {
            self.init_ok
        }

        async fn detect(&self, _image: &[u8]) -> Option<LocalDetection> {
            self.result
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn artifact() -> StagedArtifact {
        UploadStager::default()
            .validate(UploadFile::new("doc.png", "image/png", vec![1u8; 8]))
            .unwrap()
    }

    fn engine(init_ok: bool, result: Option<LocalDetection>) -> Arc<FixedEngine> {
        Arc::new(FixedEngine {
            supported: AtomicBool::new(true),
            init_ok,
            result,
        })
    }

    #[tokio::test]
    async fn test_unavailable_detects_nothing() {
        let detector = OnDeviceDetector::Unavailable;
        assert!(!detector.is_available());
        assert!(detector.detect(&artifact()).await.is_none());
    }

    #[tokio::test]
    async fn test_available_engine_returns_region() {
        let detector = OnDeviceDetector::available(engine(
            true,
            Some(LocalDetection {
                bbox: [100.0, 100.0, 400.0, 300.0],
                confidence: 0.85,
            }),
        ));

        let detection = detector.detect(&artifact()).await.unwrap();
        assert_eq!(
            detection.artifact,
            ArtifactRef::LocalRegion {
                bbox: BoundingBox::new(100.0, 100.0, 400.0, 300.0)
            }
        );
        assert_eq!(detection.confidence, Some(0.85));
    }

    #[tokio::test]
    async fn test_failed_initialization_yields_none() {
        let detector = OnDeviceDetector::available(engine(
            false,
            Some(LocalDetection {
                bbox: [0.0, 0.0, 10.0, 10.0],
                confidence: 0.9,
            }),
        ));
        assert!(detector.detect(&artifact()).await.is_none());
    }

    #[tokio::test]
    async fn test_degenerate_box_yields_none() {
        let detector = OnDeviceDetector::available(engine(
            true,
            Some(LocalDetection {
                bbox: [50.0, 50.0, 50.0, 80.0],
                confidence: 0.9,
            }),
        ));
        assert!(detector.detect(&artifact()).await.is_none());
    }

    #[test]
    fn test_capability_probe_is_live() {
        let fixed = engine(true, None);
        let detector = OnDeviceDetector::available(fixed.clone());
        assert!(detector.is_available());

        fixed.supported.store(false, Ordering::SeqCst);
        assert!(!detector.is_available());
    }
}
