//! RS steganalysis (Fridrich, Goljan & Du).
//!
//! Samples are split into horizontal groups of four same-channel values.
//! A group is *regular* when flipping the masked samples makes it noisier,
//! *singular* when it makes it smoother. In a natural image the
//! regular-minus-singular margin is about the same under the positive flip
//! `F1` and the shifted flip `F-1`. Randomizing the LSB plane drives the
//! `F1` margin to zero while the `F-1` margin stays, so the ratio of the
//! two margins measures how much of the LSB plane was replaced.
//!
//! When embedding reaches the higher bit planes the image loses its
//! spatial correlation altogether and both margins collapse. That case is
//! caught by the mean discrimination of the groups, which climbs towards
//! the value of uniform noise (about 85).

use std::ops::Add;

use rayon::prelude::*;

use crate::stego::PixelBuffer;

/// Samples per group.
pub const GROUP_SIZE: usize = 4;

/// Flipping mask; `true` positions are flipped.
const MASK: [bool; GROUP_SIZE] = [false, true, true, false];

/// Smallest `F-1` margin (as a fraction of groups) the ratio is trusted at.
pub const MIN_STRUCTURE: f64 = 0.05;

/// Mean neighbour difference up to which an image counts as structured.
pub const STRUCTURED_DIFFERENCE: f64 = 20.0;

/// Mean neighbour difference from which an image counts as pure noise.
pub const NOISE_DIFFERENCE: f64 = 48.0;

/// Classification of a group under one flipping function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Flipping increased the discrimination value.
    Regular,
    /// Flipping decreased the discrimination value.
    Singular,
    /// Flipping left it unchanged.
    Unusable,
}

/// Regular/singular counts under `M` and `-M`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsCounts {
    pub regular: u64,
    pub singular: u64,
    pub regular_neg: u64,
    pub singular_neg: u64,
}

impl RsCounts {
    fn record(&mut self, group: [i16; GROUP_SIZE]) {
        match classify(group, flip_positive) {
            GroupKind::Regular => self.regular += 1,
            GroupKind::Singular => self.singular += 1,
            GroupKind::Unusable => {}
        }
        match classify(group, flip_negative) {
            GroupKind::Regular => self.regular_neg += 1,
            GroupKind::Singular => self.singular_neg += 1,
            GroupKind::Unusable => {}
        }
    }
}

impl Add for RsCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            regular: self.regular + other.regular,
            singular: self.singular + other.singular,
            regular_neg: self.regular_neg + other.regular_neg,
            singular_neg: self.singular_neg + other.singular_neg,
        }
    }
}

/// Group counts plus the summed discrimination over all groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsTally {
    pub counts: RsCounts,
    pub discrimination: u64,
    pub groups: u64,
}

impl Add for RsTally {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            counts: self.counts + other.counts,
            discrimination: self.discrimination + other.discrimination,
            groups: self.groups + other.groups,
        }
    }
}

impl RsTally {
    /// Regular-minus-singular margin under `M`, per group.
    pub fn margin(&self) -> f64 {
        self.per_group(self.counts.regular, self.counts.singular)
    }

    /// Regular-minus-singular margin under `-M`, per group.
    pub fn margin_neg(&self) -> f64 {
        self.per_group(self.counts.regular_neg, self.counts.singular_neg)
    }

    /// Mean absolute difference between neighbouring samples in a group.
    pub fn mean_difference(&self) -> f64 {
        if self.groups == 0 {
            return 0.0;
        }
        self.discrimination as f64 / (self.groups * (GROUP_SIZE as u64 - 1)) as f64
    }

    fn per_group(&self, regular: u64, singular: u64) -> f64 {
        if self.groups == 0 {
            return 0.0;
        }
        (regular as f64 - singular as f64) / self.groups as f64
    }
}

/// Estimated fraction of the LSB plane replaced by random data, in `[0, 1]`.
pub fn rs_estimate(buffer: &PixelBuffer) -> f64 {
    estimate(&rs_tally(buffer))
}

/// Counts regular and singular groups over every row and channel.
pub fn rs_tally(buffer: &PixelBuffer) -> RsTally {
    let width = buffer.width() as usize;
    let channels = buffer.channels() as usize;

    (0..buffer.height())
        .into_par_iter()
        .map(|y| row_tally(buffer.row(y), width, channels))
        .reduce(RsTally::default, |a, b| a + b)
}

fn row_tally(row: &[u8], width: usize, channels: usize) -> RsTally {
    let mut tally = RsTally::default();

    for c in 0..channels {
        for start in (0..width / GROUP_SIZE).map(|g| g * GROUP_SIZE) {
            let mut group = [0i16; GROUP_SIZE];
            for (i, slot) in group.iter_mut().enumerate() {
                *slot = row[(start + i) * channels + c] as i16;
            }

            tally.counts.record(group);
            tally.discrimination += smoothness(&group) as u64;
            tally.groups += 1;
        }
    }
    tally
}

/// Combines the margin ratio with the loss of spatial structure.
pub fn estimate(tally: &RsTally) -> f64 {
    ratio_estimate(tally).max(structure_loss(tally))
}

/// `1 - margin(M) / margin(-M)`, clamped to `[0, 1]`.
///
/// Returns 0 when the `-M` margin is below [`MIN_STRUCTURE`], since the
/// ratio is meaningless without it.
pub fn ratio_estimate(tally: &RsTally) -> f64 {
    let margin_neg = tally.margin_neg();
    if margin_neg < MIN_STRUCTURE {
        return 0.0;
    }
    (1.0 - tally.margin() / margin_neg).clamp(0.0, 1.0)
}

/// How close the groups are to uniform noise, in `[0, 1]`.
pub fn structure_loss(tally: &RsTally) -> f64 {
    let excess = tally.mean_difference() - STRUCTURED_DIFFERENCE;
    (excess / (NOISE_DIFFERENCE - STRUCTURED_DIFFERENCE)).clamp(0.0, 1.0)
}

/// Classifies a group under the masked flip `flip`.
pub fn classify(group: [i16; GROUP_SIZE], flip: fn(i16) -> i16) -> GroupKind {
    let before = smoothness(&group);
    let mut flipped = group;
    for (value, &masked) in flipped.iter_mut().zip(MASK.iter()) {
        if masked {
            *value = flip(*value);
        }
    }
    let after = smoothness(&flipped);

    match after.cmp(&before) {
        std::cmp::Ordering::Greater => GroupKind::Regular,
        std::cmp::Ordering::Less => GroupKind::Singular,
        std::cmp::Ordering::Equal => GroupKind::Unusable,
    }
}

/// Discrimination function: sum of absolute neighbour differences.
pub fn smoothness(group: &[i16; GROUP_SIZE]) -> i32 {
    group
        .windows(2)
        .map(|w| (w[1] as i32 - w[0] as i32).abs())
        .sum()
}

/// `F1`: 0 <-> 1, 2 <-> 3, ...
pub fn flip_positive(v: i16) -> i16 {
    v ^ 1
}

/// `F-1`: -1 <-> 0, 1 <-> 2, ...
pub fn flip_negative(v: i16) -> i16 {
    if v & 1 == 0 {
        v - 1
    } else {
        v + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures::{natural_carrier, randomize_lsbs};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_flip_functions() {
        assert_eq!(flip_positive(4), 5);
        assert_eq!(flip_positive(5), 4);
        assert_eq!(flip_negative(4), 3);
        assert_eq!(flip_negative(5), 6);
        assert_eq!(flip_negative(0), -1);
        assert_eq!(flip_negative(255), 256);
    }

    #[test]
    fn test_smoothness() {
        assert_eq!(smoothness(&[10, 12, 9, 9]), 5);
        assert_eq!(smoothness(&[7, 7, 7, 7]), 0);
    }

    #[test]
    fn test_group_classification() {
        // Flat group always becomes noisier
        assert_eq!(classify([8, 8, 8, 8], flip_positive), GroupKind::Regular);
        assert_eq!(classify([8, 8, 8, 8], flip_negative), GroupKind::Regular);

        // [4, 5, 5, 4]: F1 gives [4, 4, 4, 4], smoother
        assert_eq!(classify([4, 5, 5, 4], flip_positive), GroupKind::Singular);
        // F-1 gives [4, 6, 6, 4], noisier
        assert_eq!(classify([4, 5, 5, 4], flip_negative), GroupKind::Regular);

        // [2, 3, 2, 3]: F1 gives [2, 2, 3, 3], f 3 -> 1
        assert_eq!(classify([2, 3, 2, 3], flip_positive), GroupKind::Singular);
        // [1, 2, 3, 4]: F1 gives [1, 3, 2, 4], f 3 -> 5
        assert_eq!(classify([1, 2, 3, 4], flip_positive), GroupKind::Regular);
        // [0, 5, 1, 9]: F1 gives [0, 4, 0, 9], f 17 -> 17
        assert_eq!(classify([0, 5, 1, 9], flip_positive), GroupKind::Unusable);
    }

    #[test]
    fn test_flat_image_estimates_zero() {
        let buffer = PixelBuffer::filled(64, 64, 3, 120).unwrap();
        let tally = rs_tally(&buffer);

        assert_eq!(tally.groups, 16 * 64 * 3);
        assert_eq!(tally.counts.regular, tally.groups);
        assert_eq!(tally.counts.regular_neg, tally.groups);
        assert_eq!(tally.mean_difference(), 0.0);
        assert_eq!(estimate(&tally), 0.0);
    }

    #[test]
    fn test_narrow_image_has_no_groups() {
        let buffer = PixelBuffer::filled(3, 50, 3, 9).unwrap();
        assert_eq!(rs_tally(&buffer).groups, 0);
        assert_eq!(rs_estimate(&buffer), 0.0);
    }

    #[test]
    fn test_ratio_tracks_lsb_replacement() {
        let clean = natural_carrier(0, 200, 150);
        let half = randomize_lsbs(&clean, 1, 0.5, 21);
        let full = randomize_lsbs(&clean, 1, 1.0, 21);

        let clean_rate = rs_estimate(&clean);
        let half_rate = rs_estimate(&half);
        let full_rate = rs_estimate(&full);

        assert!(clean_rate < 0.3, "clean = {}", clean_rate);
        assert!(clean_rate < half_rate, "{} vs {}", clean_rate, half_rate);
        assert!(half_rate < full_rate, "{} vs {}", half_rate, full_rate);
        assert!(full_rate > 0.8, "full = {}", full_rate);
    }

    #[test]
    fn test_natural_carrier_keeps_structure() {
        let tally = rs_tally(&natural_carrier(1, 200, 150));

        assert!(tally.margin_neg() > MIN_STRUCTURE);
        assert!(tally.mean_difference() < STRUCTURED_DIFFERENCE);
        assert_eq!(structure_loss(&tally), 0.0);
    }

    #[test]
    fn test_noise_has_no_structure() {
        let mut rng = StdRng::seed_from_u64(42);
        let buffer = PixelBuffer::from_fn(128, 128, 3, |_, _, _| rng.gen()).unwrap();
        let tally = rs_tally(&buffer);

        // Uniform noise averages about 85 between neighbours
        assert!(tally.mean_difference() > 80.0);
        assert_eq!(structure_loss(&tally), 1.0);
        assert_eq!(estimate(&tally), 1.0);
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let buffer = natural_carrier(2, 96, 96);
        let first = rs_estimate(&buffer);

        assert!((0.0..=1.0).contains(&first));
        assert_eq!(first, rs_estimate(&buffer));
    }

    #[test]
    fn test_tally_is_additive_over_rows() {
        let buffer = PixelBuffer::from_fn(16, 4, 1, |x, y, _| (x * 3 + y * 5) as u8).unwrap();
        let total = rs_tally(&buffer);

        let by_hand = (0..4)
            .map(|y| row_tally(buffer.row(y), 16, 1))
            .fold(RsTally::default(), |a, b| a + b);
        assert_eq!(total, by_hand);
    }
}
