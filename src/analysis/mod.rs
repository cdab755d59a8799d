//! Steganalysis scorer.
//!
//! Runs two classic detectors over a pixel buffer and folds them into a
//! single security score:
//! - the chi-square attack on pairs of values ([`chi_square`])
//! - RS analysis on regular and singular groups ([`rs`])
//!
//! RS drives the score. Equalized pairs are common in noisy photographs, so
//! the chi-square probability only adds suspicion in proportion to the RS
//! estimate, plus whatever sequential evidence the prefix test finds.
//!
//! A higher score means the image is less likely to be flagged as carrying
//! hidden data.

pub mod chi_square;
pub mod rs;
pub mod special;

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::stego::PixelBuffer;

pub use chi_square::MIN_SAMPLES;

/// Scores above this are reported as [`SecurityLevel::High`].
pub const HIGH_THRESHOLD: f64 = 0.7;

/// Scores above this (and up to [`HIGH_THRESHOLD`]) are [`SecurityLevel::Medium`].
pub const MEDIUM_THRESHOLD: f64 = 0.4;

const RS_WEIGHT: f64 = 0.7;
const AGREEMENT_WEIGHT: f64 = 0.3;

/// How hard the image is to flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SecurityLevel {
    High,
    Medium,
    Low,
}

/// How likely a detector is to flag the image. Inverse of [`SecurityLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionRisk {
    Low,
    Medium,
    High,
}

impl SecurityLevel {
    /// Maps a security score onto a level.
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_THRESHOLD {
            Self::High
        } else if score > MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Risk paired with this level.
    pub fn detection_risk(self) -> DetectionRisk {
        match self {
            Self::High => DetectionRisk::Low,
            Self::Medium => DetectionRisk::Medium,
            Self::Low => DetectionRisk::High,
        }
    }

    fn recommendation(self) -> &'static str {
        match self {
            Self::High => {
                "No statistical traces of LSB embedding were found. The image is suitable for sharing."
            }
            Self::Medium => {
                "Some statistical anomalies are present. Use a lower bit depth or a larger image to reduce detectability."
            }
            Self::Low => {
                "The image shows the statistics of LSB embedding. Use 1 bit per channel, a shorter message, or a larger and noisier image."
            }
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

impl fmt::Display for DetectionRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Raw detector outputs behind a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSignals {
    /// Chi-square embedding probability, `[0, 1]`.
    pub chi_square: f64,
    /// Chi-square evidence of embedding confined to a prefix, `[0, 1]`.
    pub sequential: f64,
    /// RS estimate of the embedding rate, `[0, 1]`.
    pub rs_estimate: f64,
    /// Number of samples the detectors looked at.
    pub samples_analyzed: usize,
}

/// Result of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// `1 - suspicion`, in `[0, 1]`; higher is safer.
    pub security_score: f64,
    pub security_level: SecurityLevel,
    pub detection_risk: DetectionRisk,
    pub recommendation: String,
    #[serde(skip)]
    pub signals: AnalysisSignals,
}

/// Scores how detectable LSB embedding in `buffer` is.
///
/// Deterministic: the same buffer always yields the same report.
pub fn analyze(buffer: &PixelBuffer) -> AnalysisReport {
    let (chi, rs_estimate) = rayon::join(
        || chi_square::chi_square_signals(buffer),
        || rs::rs_estimate(buffer),
    );

    let security_score = combine(chi.probability, chi.sequential, rs_estimate);
    let security_level = SecurityLevel::from_score(security_score);

    let mut recommendation = security_level.recommendation().to_string();
    if buffer.pixel_count() < MIN_SAMPLES {
        recommendation.push_str(" Note: the image is too small for reliable analysis.");
    }

    debug!(
        chi_square = chi.probability,
        sequential = chi.sequential,
        rs_estimate,
        security_score,
        level = %security_level,
        "analyzed carrier"
    );

    AnalysisReport {
        security_score,
        security_level,
        detection_risk: security_level.detection_risk(),
        recommendation,
        signals: AnalysisSignals {
            chi_square: chi.probability,
            sequential: chi.sequential,
            rs_estimate,
            samples_analyzed: buffer.samples().len(),
        },
    }
}

/// Folds the detector outputs into a security score.
///
/// `suspicion = 0.7 * rs + 0.3 * chi_square * rs + sequential`, and the
/// score is `1 - suspicion` clamped to `[0, 1]`.
pub fn combine(chi_square: f64, sequential: f64, rs_estimate: f64) -> f64 {
    let suspicion =
        RS_WEIGHT * rs_estimate + AGREEMENT_WEIGHT * chi_square * rs_estimate + sequential;
    (1.0 - suspicion).clamp(0.0, 1.0)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{natural_carrier, randomize_lsbs};
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_level_thresholds() {
        assert_eq!(SecurityLevel::from_score(1.0), SecurityLevel::High);
        assert_eq!(SecurityLevel::from_score(0.71), SecurityLevel::High);
        assert_eq!(SecurityLevel::from_score(0.7), SecurityLevel::Medium);
        assert_eq!(SecurityLevel::from_score(0.41), SecurityLevel::Medium);
        assert_eq!(SecurityLevel::from_score(0.4), SecurityLevel::Low);
        assert_eq!(SecurityLevel::from_score(0.0), SecurityLevel::Low);
    }

    #[test]
    fn test_risk_is_inverse_of_level() {
        assert_eq!(SecurityLevel::High.detection_risk(), DetectionRisk::Low);
        assert_eq!(SecurityLevel::Medium.detection_risk(), DetectionRisk::Medium);
        assert_eq!(SecurityLevel::Low.detection_risk(), DetectionRisk::High);
    }

    #[test]
    fn test_combine() {
        assert_eq!(combine(0.0, 0.0, 0.0), 1.0);
        assert!((combine(1.0, 0.0, 1.0) - 0.0).abs() < 1e-12);
        // Equalized pairs alone are not evidence
        assert_eq!(combine(1.0, 0.0, 0.0), 1.0);
        assert!((combine(0.0, 0.0, 0.5) - 0.65).abs() < 1e-12);
        assert!((combine(1.0, 0.0, 0.5) - 0.5).abs() < 1e-12);
        assert!((combine(0.0, 0.25, 0.0) - 0.75).abs() < 1e-12);
        assert_eq!(combine(0.0, 2.0, 0.0), 0.0);
    }

    #[test]
    fn test_noisy_carrier_outscores_its_stego_version() {
        let clean = natural_carrier(4, 200, 150);
        let stego = randomize_lsbs(&clean, 1, 1.0, 9);

        let clean_report = analyze(&clean);
        let stego_report = analyze(&stego);

        assert!(
            clean_report.security_score > MEDIUM_THRESHOLD,
            "clean = {:?}",
            clean_report.signals
        );
        assert_ne!(clean_report.security_level, SecurityLevel::Low);
        assert!(clean_report.security_score > stego_report.security_score);
        assert_eq!(stego_report.security_level, SecurityLevel::Low);
    }

    #[test]
    fn test_score_falls_with_embedding_rate() {
        let clean = natural_carrier(6, 200, 150);
        let scores: Vec<f64> = [0.0, 0.5, 1.0]
            .iter()
            .map(|&fraction| analyze(&randomize_lsbs(&clean, 1, fraction, 13)).security_score)
            .collect();

        assert!(scores[0] > scores[1], "{:?}", scores);
        assert!(scores[1] > scores[2], "{:?}", scores);
    }

    #[test]
    fn test_high_bit_depth_is_flagged() {
        let stego = randomize_lsbs(&natural_carrier(8, 200, 150), 8, 0.9, 2);
        let report = analyze(&stego);
        assert_eq!(report.security_level, SecurityLevel::Low);
    }

    #[test]
    fn test_flat_image_is_secure() {
        let buffer = PixelBuffer::filled(64, 64, 3, 200).unwrap();
        let report = analyze(&buffer);

        assert_eq!(report.security_score, 1.0);
        assert_eq!(report.security_level, SecurityLevel::High);
        assert_eq!(report.detection_risk, DetectionRisk::Low);
        assert_eq!(report.signals.samples_analyzed, 64 * 64 * 3);
        assert!(!report.recommendation.contains("too small"));
    }

    #[test]
    fn test_random_image_is_flagged() {
        let mut rng = StdRng::seed_from_u64(3);
        let buffer = PixelBuffer::from_fn(128, 128, 3, |_, _, _| rng.gen()).unwrap();
        let report = analyze(&buffer);

        assert!(report.security_score < 0.3, "score = {}", report.security_score);
        assert_eq!(report.security_level, SecurityLevel::Low);
        assert_eq!(report.detection_risk, DetectionRisk::High);
    }

    #[test]
    fn test_small_image_note() {
        let buffer = PixelBuffer::filled(10, 10, 3, 50).unwrap();
        let report = analyze(&buffer);
        assert!(report.recommendation.ends_with("too small for reliable analysis."));
    }

    #[test]
    fn test_report_serialization() {
        let buffer = PixelBuffer::filled(32, 32, 1, 1).unwrap();
        let json = serde_json::to_value(analyze(&buffer)).unwrap();

        assert_eq!(json["security_level"], "High");
        assert_eq!(json["detection_risk"], "Low");
        assert!(json.get("signals").is_none());
        assert!(json["recommendation"].is_string());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let buffer =
            PixelBuffer::from_fn(80, 60, 3, |x, y, c| ((x * 5 + y * 3) as u8) ^ c).unwrap();
        assert_eq!(analyze(&buffer), analyze(&buffer));
    }
}
