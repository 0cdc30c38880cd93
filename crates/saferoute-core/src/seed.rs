//! Deterministic variation derived purely from the request coordinates.
//!
//! Two modes are available. `Trigonometric` feeds the coordinate sum through
//! `sin`, which is reproducible but visibly periodic. `SplitMix` hashes the
//! coordinate bit patterns with splitmix64 and is the default. Neither mode
//! keeps state between calls.

use crate::models::Coordinate;
use crate::spatial::coordinate_sum_seed;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Offset between consecutive chunk seeds in trigonometric mode.
pub const CHUNK_SEED_STRIDE: f64 = 123.456;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const SCORE_STREAM: u64 = u64::MAX;
const JITTER_TAG: u64 = 0xA5A5_5A5A_C3C3_3C3C;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    #[default]
    SplitMix,
    Trigonometric,
}

impl FromStr for SeedMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "splitmix" | "splitmix64" => Ok(Self::SplitMix),
            "trig" | "trigonometric" => Ok(Self::Trigonometric),
            other => Err(format!("unknown seed mode '{}'", other)),
        }
    }
}

/// Per-request variation source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RouteSeed {
    SplitMix(u64),
    Trigonometric(f64),
}

impl RouteSeed {
    pub fn derive(mode: SeedMode, start: Coordinate, end: Coordinate) -> Self {
        match mode {
            SeedMode::Trigonometric => Self::Trigonometric(coordinate_sum_seed(start, end)),
            SeedMode::SplitMix => {
                let state = [start.lat, start.lng, end.lat, end.lng]
                    .iter()
                    .fold(GOLDEN_GAMMA, |acc, value| {
                        // -0.0 and 0.0 must hash alike.
                        splitmix64(acc ^ (value + 0.0).to_bits())
                    });
                Self::SplitMix(state)
            }
        }
    }

    /// Gate value for chunk `chunk`, in [-1, 1].
    ///
    /// A chunk is flagged when the gate exceeds `1 - 2p`.
    pub fn chunk_gate(&self, chunk: usize) -> f64 {
        match *self {
            Self::Trigonometric(seed) => chunk_seed(seed, chunk).sin(),
            Self::SplitMix(state) => draw(state, 2 * chunk as u64) * 2.0 - 1.0,
        }
    }

    /// Intensity for chunk `chunk`, in [0, 1].
    pub fn chunk_intensity(&self, chunk: usize) -> f64 {
        match *self {
            Self::Trigonometric(seed) => (2.0 * chunk_seed(seed, chunk)).sin().abs(),
            Self::SplitMix(state) => draw(state, 2 * chunk as u64 + 1),
        }
    }

    /// Route-level wobble for the safety score, in [-1, 1].
    pub fn score_wobble(&self) -> f64 {
        match *self {
            Self::Trigonometric(seed) => (seed * 100.0).sin(),
            Self::SplitMix(state) => draw(state, SCORE_STREAM) * 2.0 - 1.0,
        }
    }

    /// Lateral jitter for an interpolated point, in [-1, 1].
    pub fn lateral_jitter(&self, point: Coordinate) -> f64 {
        match *self {
            Self::Trigonometric(_) => (point.lat * 1000.0).sin(),
            Self::SplitMix(state) => {
                draw(state, (point.lat + 0.0).to_bits() ^ JITTER_TAG) * 2.0 - 1.0
            }
        }
    }
}

fn chunk_seed(seed: f64, chunk: usize) -> f64 {
    seed + chunk as f64 * CHUNK_SEED_STRIDE
}

pub(crate) fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(GOLDEN_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Uniform draw in [0, 1) for a given stream.
fn draw(state: u64, stream: u64) -> f64 {
    let bits = splitmix64(state ^ splitmix64(stream));
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: Coordinate = Coordinate::new(40.70, -74.00);
    const END: Coordinate = Coordinate::new(40.75, -73.95);

    #[test]
    fn trigonometric_mode_matches_coordinate_formulas() {
        let seed = RouteSeed::derive(SeedMode::Trigonometric, START, END);
        let sum = 40.70 - 74.00 + 40.75 - 73.95;
        assert_eq!(seed, RouteSeed::Trigonometric(sum));
        assert_eq!(seed.chunk_gate(2), (sum + 2.0 * 123.456).sin());
        let intensity = (2.0 * (sum + 123.456)).sin().abs();
        assert_eq!(seed.chunk_intensity(1), intensity);
        assert_eq!(seed.score_wobble(), (sum * 100.0).sin());
    }

    #[test]
    fn splitmix_is_reproducible_and_input_sensitive() {
        let a = RouteSeed::derive(SeedMode::SplitMix, START, END);
        let b = RouteSeed::derive(SeedMode::SplitMix, START, END);
        assert_eq!(a, b);

        let swapped = RouteSeed::derive(SeedMode::SplitMix, END, START);
        assert_ne!(a, swapped);
    }

    #[test]
    fn splitmix_draws_stay_in_range() {
        let seed = RouteSeed::derive(SeedMode::SplitMix, START, END);
        for chunk in 0..256 {
            let gate = seed.chunk_gate(chunk);
            let intensity = seed.chunk_intensity(chunk);
            assert!((-1.0..1.0).contains(&gate));
            assert!((0.0..1.0).contains(&intensity));
        }
        assert!((-1.0..1.0).contains(&seed.score_wobble()));
    }

    #[test]
    fn negative_zero_hashes_like_zero() {
        let a = RouteSeed::derive(SeedMode::SplitMix, Coordinate::new(0.0, 10.0), END);
        let b = RouteSeed::derive(SeedMode::SplitMix, Coordinate::new(-0.0, 10.0), END);
        assert_eq!(a, b);
    }

    #[test]
    fn seed_mode_parses_aliases() {
        assert_eq!("SplitMix".parse::<SeedMode>(), Ok(SeedMode::SplitMix));
        assert_eq!("trig".parse::<SeedMode>(), Ok(SeedMode::Trigonometric));
        assert!("random".parse::<SeedMode>().is_err());
    }
}
