//! Verification orchestrator
//!
//! One operation, [`VerificationService::verify`], used both by the manual
//! "verify now" check and by the completion guard.

use shared::order::{Attachment, VerificationRecord};
use std::sync::Arc;
use thiserror::Error;

use super::candidates::{EXTRACTION_PROMPT, extract_candidates};
use super::matcher::{MatchResult, compare};
use super::vision::{VisionClient, VisionError};

/// Verification could not produce a verdict
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("order has no serial number to verify against")]
    MissingTarget,
}

/// Verdict of one verification
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub matched: bool,
    /// Candidate the verdict is about (empty when nothing was detected)
    pub detected: String,
    pub message: String,
    /// Every candidate extracted from the image
    pub candidates: Vec<String>,
}

impl VerificationReport {
    pub fn record(&self) -> VerificationRecord {
        VerificationRecord {
            matched: self.matched,
            detected: self.detected.clone(),
            message: self.message.clone(),
        }
    }
}

pub struct VerificationService {
    vision: Arc<dyn VisionClient>,
}

impl VerificationService {
    pub fn new(vision: Arc<dyn VisionClient>) -> Self {
        Self { vision }
    }

    /// Read `image` and compare what it shows with `target`.
    ///
    /// Service failures are errors, not a non-match.
    pub async fn verify(
        &self,
        image: &Attachment,
        target: &str,
    ) -> Result<VerificationReport, VerificationError> {
        if target.trim().is_empty() {
            return Err(VerificationError::MissingTarget);
        }

        let text = self.vision.recognize(image, EXTRACTION_PROMPT).await?;
        let candidates = extract_candidates(&text);
        tracing::debug!(target_serial = %target, ?candidates, "Vision candidates extracted");

        Ok(Self::evaluate(candidates, target))
    }

    /// Pick the verdict among `candidates`.
    ///
    /// First match wins. Otherwise report the closest failure (most positions
    /// walked, earlier candidate on ties), skipping length mismatches; otherwise
    /// the first candidate.
    pub fn evaluate(candidates: Vec<String>, target: &str) -> VerificationReport {
        if candidates.is_empty() {
            return VerificationReport {
                matched: false,
                detected: String::new(),
                message: "nothing detected: no serial number found on the photo".to_string(),
                candidates,
            };
        }

        let results: Vec<MatchResult> = candidates.iter().map(|c| compare(target, c)).collect();

        if let Some(idx) = results.iter().position(MatchResult::is_match) {
            return VerificationReport {
                matched: true,
                detected: candidates[idx].clone(),
                message: results[idx].reason(),
                candidates,
            };
        }

        let mut closest: Option<usize> = None;
        for (idx, result) in results.iter().enumerate() {
            if result.is_length_mismatch() {
                continue;
            }
            match closest {
                Some(best) if results[best].compared >= result.compared => {}
                _ => closest = Some(idx),
            }
        }

        let idx = closest.unwrap_or(0);
        VerificationReport {
            matched: false,
            detected: candidates[idx].clone(),
            message: format!("serial mismatch: {}", results[idx].reason()),
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeVision;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_match_wins() {
        let report = VerificationService::evaluate(strings(&["ZZZZZZZ", "O812345", "0812345"]), "0812345");
        assert!(report.matched);
        assert_eq!(report.detected, "O812345");
        assert!(report.message.starts_with("fuzzy match"));
    }

    #[test]
    fn test_nothing_detected() {
        let report = VerificationService::evaluate(vec![], "0812345");
        assert!(!report.matched);
        assert!(report.detected.is_empty());
        assert!(report.message.contains("nothing detected"));
    }

    #[test]
    fn test_closest_failure_preferred_over_length_mismatch() {
        // 第一个长度不符，第二个在第 2 位失败，第三个在第 6 位失败
        let report = VerificationService::evaluate(
            strings(&["12", "0X12345", "081234X"]),
            "0812345",
        );
        assert!(!report.matched);
        assert_eq!(report.detected, "081234X");
        assert!(report.message.contains("character 7"));
    }

    #[test]
    fn test_ties_keep_earlier_candidate() {
        let report = VerificationService::evaluate(strings(&["X812345", "Y812345"]), "0812345");
        assert_eq!(report.detected, "X812345");
    }

    #[test]
    fn test_all_length_mismatch_falls_back_to_first() {
        let report = VerificationService::evaluate(strings(&["ABCDEFGHIJ", "12"]), "0812345");
        assert!(!report.matched);
        assert_eq!(report.detected, "ABCDEFGHIJ");
        assert!(report.message.contains("length mismatch"));
    }

    #[tokio::test]
    async fn test_verify_uses_vision_output() {
        let vision = Arc::new(FakeVision::answering(r#"{"candidates": ["O812345"]}"#));
        let service = VerificationService::new(vision.clone());
        let report = service
            .verify(&Attachment::new("p.jpg", "AAAA"), "0812345")
            .await
            .unwrap();
        assert!(report.matched);
        assert_eq!(report.record().detected, "O812345");
        assert_eq!(vision.calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_service_failure_is_error() {
        let service = VerificationService::new(Arc::new(FakeVision::failing_with_status(503)));
        let err = service
            .verify(&Attachment::new("p.jpg", "AAAA"), "0812345")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerificationError::Vision(VisionError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_blank_target() {
        let vision = Arc::new(FakeVision::answering("0812345"));
        let service = VerificationService::new(vision.clone());
        let err = service
            .verify(&Attachment::new("p.jpg", "AAAA"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::MissingTarget));
        assert_eq!(vision.calls(), 0);
    }
}
