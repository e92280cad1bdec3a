//! Log-spaced bucketing of FFT bins and per-frame normalization.
//!
//! Bucket boundaries grow geometrically from bin 1: each next boundary is the
//! previous one times the growth factor, rounded up. Low bins therefore get
//! one bucket each while high bins are merged in ever wider groups, roughly
//! following perceived pitch.

use std::ops::Range;

/// Divisor floor for [`normalize`]; keeps silence from being scaled up
pub const NORMALIZE_FLOOR: f64 = 1.0;

/// Half-open bin ranges for `half` bins (N/2) and growth factor `step`.
///
/// Ranges start at bin 1, are contiguous and end at `half`. `step` must be
/// greater than 1.
pub fn bucket_ranges(half: usize, step: f64) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let limit = half as f64;
    let mut f = 1.0f64;

    while f < limit {
        let next = (f * step).ceil();
        let start = f.floor() as usize;
        let end = (next.floor() as usize).min(half);
        ranges.push(start..end);
        f = next;
    }
    ranges
}

/// Peak log-magnitude per bucket, floored at zero
pub fn bucketize(magnitudes_log: &[f64], step: f64) -> Vec<f64> {
    bucket_ranges(magnitudes_log.len(), step)
        .into_iter()
        .map(|range| {
            magnitudes_log[range]
                .iter()
                .copied()
                .fold(0.0f64, f64::max)
        })
        .collect()
}

/// Scale values into [0, 1] by the frame maximum (at least `floor`)
pub fn normalize(buckets: &[f64], floor: f64) -> Vec<f64> {
    let max = buckets.iter().copied().fold(floor, f64::max);
    buckets.iter().map(|&b| b / max).collect()
}

/// First `bar_count` buckets, zero-padded when there are fewer buckets than bars
pub fn select_bars(buckets: &[f64], bar_count: usize) -> Vec<f64> {
    let mut bars: Vec<f64> = buckets.iter().take(bar_count).copied().collect();
    bars.resize(bar_count, 0.0);
    bars
}

/// Bar heights for one frame: selection first, then normalization
pub fn bar_heights(buckets: &[f64], bar_count: usize) -> Vec<f64> {
    normalize(&select_bars(buckets, bar_count), NORMALIZE_FLOOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_contiguous_and_cover_half() {
        for &n in &[8usize, 64, 512, 2048, 8192] {
            for &step in &[1.01, 1.08, 1.5, 2.0, 3.7] {
                let half = n / 2;
                let ranges = bucket_ranges(half, step);
                assert_eq!(ranges.first().map(|r| r.start), Some(1));
                assert_eq!(ranges.last().map(|r| r.end), Some(half));
                for r in &ranges {
                    assert!(r.start < r.end, "empty range {:?} for n={} step={}", r, n, step);
                }
                for pair in ranges.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start);
                    assert!(pair[0].start < pair[1].start);
                }
            }
        }
    }

    #[test]
    fn bucket_count_is_reproducible() {
        assert_eq!(bucket_ranges(1024, 1.08).len(), 64);
        assert_eq!(bucket_ranges(512, 1.08).len(), 55);
        assert_eq!(bucket_ranges(8, 1.5), vec![1..2, 2..3, 3..5, 5..8]);
        assert_eq!(bucket_ranges(4, 2.0), vec![1..2, 2..4]);
    }

    #[test]
    fn low_buckets_are_single_bins() {
        let ranges = bucket_ranges(1024, 1.08);
        assert_eq!(&ranges[..3], &[1..2, 2..3, 3..4]);
        assert_eq!(ranges[12], 13..15);
        assert!(ranges[24].contains(&46));
    }

    #[test]
    fn bucketize_takes_peak_and_floors_negatives() {
        let logs = [9.0, 1.0, -2.0, 3.0, 0.5, f64::NEG_INFINITY, -1.0, 2.5];
        // ranges for half=8, step=1.5: 1..2, 2..3, 3..5, 5..8
        assert_eq!(bucketize(&logs, 1.5), vec![1.0, 0.0, 3.0, 2.5]);
    }

    #[test]
    fn bucketize_ignores_dc_bin() {
        let mut logs = vec![0.0; 16];
        logs[0] = 100.0;
        assert!(bucketize(&logs, 1.3).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_peaks_at_one() {
        let out = normalize(&[2.0, 8.0, 4.0, 0.0], NORMALIZE_FLOOR);
        assert_eq!(out, vec![0.25, 1.0, 0.5, 0.0]);
        let max = out.iter().copied().fold(0.0, f64::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn normalize_silence_and_small_values() {
        assert_eq!(normalize(&[0.0; 4], NORMALIZE_FLOOR), vec![0.0; 4]);
        // everything under the floor is divided by the floor itself
        assert_eq!(normalize(&[0.5, 0.25], NORMALIZE_FLOOR), vec![0.5, 0.25]);
    }

    #[test]
    fn select_bars_truncates_or_pads() {
        assert_eq!(select_bars(&[1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
        assert_eq!(select_bars(&[1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert!(select_bars(&[], 0).is_empty());
    }

    #[test]
    fn bar_heights_normalize_selected_bars() {
        let heights = bar_heights(&[2.0, 4.0, 8.0], 2);
        assert_eq!(heights, vec![0.5, 1.0]);
        let padded = bar_heights(&[3.0], 3);
        assert_eq!(padded, vec![1.0, 0.0, 0.0]);
    }
}
