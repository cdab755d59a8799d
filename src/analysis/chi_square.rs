//! Chi-square attack on pairs of values (Westfeld & Pfitzmann).
//!
//! LSB replacement with random data equalizes the counts of each pair of
//! values `(2k, 2k+1)`. The test compares the observed even counts with the
//! pair means; a small statistic (high p-value) means the pairs look
//! equalized. Growing prefixes of each channel are tested so sequential
//! embedding at the start of the image is caught even when the rest of the
//! carrier is clean.
//!
//! Smooth, noisy photographs already have nearly equal pairs, so a high
//! p-value alone says little. The telling pattern is a prefix that passes
//! the test while the whole channel clearly fails it.

use rayon::prelude::*;

use super::special::chi_square_sf;
use crate::stego::PixelBuffer;

/// Smallest prefix (in samples) the test is run on.
pub const MIN_SAMPLES: usize = 1024;

/// Whole-channel p-values below this reject equalized pairs.
pub const SIGNIFICANCE: f64 = 0.05;

/// Number of prefix checkpoints per channel (10%, 20%, ... 100%).
const CHECKPOINTS: usize = 10;

/// Pair-of-values results for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelSignal {
    /// Highest p-value over the prefix checkpoints.
    pub peak: f64,
    /// p-value of the whole channel.
    pub whole: f64,
}

impl ChannelSignal {
    /// Evidence of sequential embedding: how far the best prefix sits above
    /// a whole channel that rejects equalized pairs.
    pub fn sequential(&self) -> f64 {
        if self.whole < SIGNIFICANCE {
            (self.peak - self.whole).max(0.0)
        } else {
            0.0
        }
    }
}

/// Chi-square outputs averaged over channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChiSquareSignals {
    /// Mean of the per-channel peak p-values.
    pub probability: f64,
    /// Mean of the per-channel sequential evidence.
    pub sequential: f64,
}

/// Runs the pair-of-values test on every channel.
///
/// Both signals are 0 when no channel has a testable prefix.
pub fn chi_square_signals(buffer: &PixelBuffer) -> ChiSquareSignals {
    let channels: Vec<ChannelSignal> = (0..buffer.channels())
        .into_par_iter()
        .map(|c| {
            let samples: Vec<u8> = buffer.channel_samples(c).collect();
            channel_signal(&samples)
        })
        .collect();

    if channels.is_empty() {
        return ChiSquareSignals::default();
    }
    let n = channels.len() as f64;
    ChiSquareSignals {
        probability: channels.iter().map(|s| s.peak).sum::<f64>() / n,
        sequential: channels.iter().map(ChannelSignal::sequential).sum::<f64>() / n,
    }
}

/// Peak and whole-channel p-values of one channel.
///
/// Prefixes shorter than [`MIN_SAMPLES`] or with fewer than two populated
/// pairs are skipped; a channel without any testable prefix yields zeros.
pub fn channel_signal(samples: &[u8]) -> ChannelSignal {
    let n = samples.len();
    let mut histogram = [0u64; 256];
    let mut filled = 0usize;
    let mut signal = ChannelSignal::default();

    for checkpoint in 1..=CHECKPOINTS {
        let end = n * checkpoint / CHECKPOINTS;
        for &s in &samples[filled..end] {
            histogram[s as usize] += 1;
        }
        filled = end;

        if end < MIN_SAMPLES {
            continue;
        }
        if let Some(p) = pair_probability(&histogram) {
            signal.peak = signal.peak.max(p);
            if checkpoint == CHECKPOINTS {
                signal.whole = p;
            }
        }
    }
    signal
}

/// p-value of the pair-of-values test for one histogram.
///
/// Returns `None` when fewer than two pairs are populated.
pub fn pair_probability(histogram: &[u64; 256]) -> Option<f64> {
    let mut chi = 0.0f64;
    let mut pairs = 0u32;

    for k in 0..128 {
        let even = histogram[2 * k] as f64;
        let odd = histogram[2 * k + 1] as f64;
        let expected = (even + odd) / 2.0;
        if expected > 0.0 {
            chi += (even - expected).powi(2) / expected;
            pairs += 1;
        }
    }

    if pairs < 2 {
        return None;
    }
    let p = chi_square_sf(chi, (pairs - 1) as f64);
    if p.is_nan() {
        None
    } else {
        Some(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn even_biased(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, 3, |x, y, c| {
            let base = ((x * 2 + y * 3 + c as u32 * 40) / 5) as u8 & 0xFE;
            if (x * 7 + y * 13 + c as u32) % 11 == 0 {
                base | 1
            } else {
                base
            }
        })
        .unwrap()
    }

    #[test]
    fn test_equal_pairs_give_high_probability() {
        let mut histogram = [0u64; 256];
        for (i, h) in histogram.iter_mut().enumerate() {
            *h = 100 + (i as u64 / 2) % 7;
        }
        let p = pair_probability(&histogram).unwrap();
        assert!(p > 0.999, "p = {}", p);
    }

    #[test]
    fn test_unequal_pairs_give_low_probability() {
        let mut histogram = [0u64; 256];
        for k in 0..128 {
            histogram[2 * k] = 90;
            histogram[2 * k + 1] = 10;
        }
        let p = pair_probability(&histogram).unwrap();
        assert!(p < 1e-6, "p = {}", p);
    }

    #[test]
    fn test_single_pair_is_untestable() {
        let mut histogram = [0u64; 256];
        histogram[10] = 500;
        histogram[11] = 20;
        assert_eq!(pair_probability(&histogram), None);
    }

    #[test]
    fn test_clean_carrier_scores_low() {
        let buffer = even_biased(128, 128);
        let p = chi_square_signals(&buffer).probability;
        assert!(p < 0.05, "p = {}", p);
    }

    #[test]
    fn test_random_lsbs_score_high() {
        let mut rng = StdRng::seed_from_u64(7);
        let buffer = PixelBuffer::from_fn(128, 128, 3, |_, _, _| rng.gen()).unwrap();
        let p = chi_square_signals(&buffer).probability;
        assert!(p > 0.9, "p = {}", p);
    }

    #[test]
    fn test_small_channel_is_skipped() {
        // 20x20 = 400 samples per channel, below the floor
        let mut rng = StdRng::seed_from_u64(1);
        let buffer = PixelBuffer::from_fn(20, 20, 3, |_, _, _| rng.gen()).unwrap();
        assert_eq!(chi_square_signals(&buffer).probability, 0.0);
    }

    #[test]
    fn test_sequential_prefix_stands_out() {
        // First 30% random, the rest strictly even
        let mut rng = StdRng::seed_from_u64(11);
        let samples: Vec<u8> = (0..20_000)
            .map(|i| {
                if i < 6_000 {
                    rng.gen()
                } else {
                    ((i % 100) * 2) as u8
                }
            })
            .collect();

        let signal = channel_signal(&samples);
        assert!(signal.peak > 0.99, "peak = {}", signal.peak);
        assert!(signal.whole < 1e-6, "whole = {}", signal.whole);
        assert!(signal.sequential() > 0.9);
    }

    #[test]
    fn test_uniformly_equal_pairs_are_not_sequential() {
        let mut rng = StdRng::seed_from_u64(5);
        let samples: Vec<u8> = (0..20_000).map(|_| rng.gen()).collect();

        let signal = channel_signal(&samples);
        assert!(signal.peak > 0.9);
        assert!(signal.whole > SIGNIFICANCE);
        assert_eq!(signal.sequential(), 0.0);
    }

    #[test]
    fn test_clean_carrier_has_no_sequential_signal() {
        let signals = chi_square_signals(&even_biased(128, 128));
        assert_eq!(signals.sequential, 0.0);
    }

    #[test]
    fn test_flat_image_is_untestable() {
        let buffer = PixelBuffer::filled(64, 64, 1, 77).unwrap();
        assert_eq!(chi_square_signals(&buffer).probability, 0.0);
    }
}
