// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Scalar statistics helpers shared by the baseline engine and the method
//! optimizer. Callers guarantee non-empty input.

/// Arithmetic mean.
pub(crate) fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample standard deviation (n - 1 divisor), 0.0 for fewer than two samples.
pub(crate) fn sample_std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = samples.iter().map(|s| (s - mean).powi(2)).sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

/// Smallest and largest sample.
pub(crate) fn min_max(samples: &[f64]) -> (f64, f64) {
    samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), &s| (min.min(s), max.max(s)),
    )
}

/// Percentile by linear interpolation between closest ranks. `sorted` must
/// be ascending and non-empty; `p` in [0, 100].
pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Adjusted Fisher-Pearson sample skewness (the pandas `.skew()` estimator),
/// 0.0 for fewer than three samples or zero variance.
pub(crate) fn sample_skewness(samples: &[f64], mean: f64, std_dev: f64) -> f64 {
    let n = samples.len();
    if n < 3 || std_dev == 0.0 {
        return 0.0;
    }
    let n_f = n as f64;
    let m3: f64 = samples
        .iter()
        .map(|s| ((s - mean) / std_dev).powi(3))
        .sum::<f64>();
    n_f / ((n_f - 1.0) * (n_f - 2.0)) * m3
}
