//! Threat annotation over fixed-size path chunks.
//!
//! The path is split into disjoint chunks of [`CHUNK_LEN`] indices. Each chunk
//! is flagged by a threshold test on the seed's gate value, so the same
//! `(seed, chunk, safety_weight)` always gives the same decision.

use crate::models::ThreatSegment;
use crate::seed::RouteSeed;

pub const CHUNK_LEN: usize = 8;
/// Threat probability at safety weight 0.
pub const MAX_THREAT_PROBABILITY: f64 = 0.4;
pub const MIN_UTI: f64 = 0.2;
pub const UTI_SPAN: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    High,
    Moderate,
    Low,
}

impl ThreatLevel {
    pub fn from_uti(uti_score: f64) -> Self {
        if uti_score > 0.6 {
            Self::High
        } else if uti_score > 0.4 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Self::High => "High predicted incident risk along this stretch",
            Self::Moderate => "Moderate risk area",
            Self::Low => "Slightly elevated risk",
        }
    }

    pub fn mitigation(self) -> &'static str {
        match self {
            Self::High => "Consider an alternative route or travel with others",
            Self::Moderate => "Stay alert and avoid distractions",
            Self::Low => "Exercise normal caution",
        }
    }
}

/// Per-chunk inclusion probability; falls as the safety weight rises.
pub fn threat_probability(safety_weight: f64) -> f64 {
    (1.0 - safety_weight.clamp(0.0, 1.0)) * MAX_THREAT_PROBABILITY
}

/// Flag chunks of a path of `path_len` points.
///
/// A trailing chunk holding a single index cannot span a segment and is
/// skipped; every returned segment satisfies `start_idx < end_idx < path_len`.
pub fn annotate(path_len: usize, safety_weight: f64, seed: &RouteSeed) -> Vec<ThreatSegment> {
    let threshold = 1.0 - 2.0 * threat_probability(safety_weight);
    let mut segments = Vec::new();

    for (chunk, start_idx) in (0..path_len).step_by(CHUNK_LEN).enumerate() {
        let end_idx = (start_idx + CHUNK_LEN - 1).min(path_len - 1);
        if end_idx == start_idx {
            continue;
        }
        if seed.chunk_gate(chunk) <= threshold {
            continue;
        }

        let uti_score = (seed.chunk_intensity(chunk) * UTI_SPAN + MIN_UTI)
            .clamp(MIN_UTI, MIN_UTI + UTI_SPAN);
        let level = ThreatLevel::from_uti(uti_score);
        segments.push(ThreatSegment {
            start_idx,
            end_idx,
            uti_score,
            reason: level.reason().to_string(),
            mitigation: level.mitigation().to_string(),
        });
    }

    segments
}
