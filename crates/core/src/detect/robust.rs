//! Median / MAD dispersion and the modified (robust) z-score.

/// Scales MAD so the robust z-score is comparable to a standard z-score for normal data.
pub const MAD_SCALE: f64 = 0.6745;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dispersion {
    pub median: f64,
    pub mad: f64,
}

impl Dispersion {
    /// Median and median absolute deviation of `sample`. `None` for an empty sample.
    pub fn of(sample: &[f64]) -> Option<Self> {
        let median = median(sample)?;
        let deviations: Vec<f64> = sample.iter().map(|v| (v - median).abs()).collect();
        let mad = median_of(deviations)?;
        Some(Self { median, mad })
    }

    /// `0.6745 * (target - median) / mad`, or exactly `0.0` when the sample has no spread.
    pub fn z_score(&self, target: f64) -> f64 {
        if self.mad == 0.0 {
            return 0.0;
        }
        MAD_SCALE * (target - self.median) / self.mad
    }
}

pub fn median(sample: &[f64]) -> Option<f64> {
    median_of(sample.to_vec())
}

/// Robust z-score of `target` against `window`; `0.0` for an empty or constant window.
pub fn robust_z_score(window: &[f64], target: f64) -> f64 {
    Dispersion::of(window)
        .map(|d| d.z_score(target))
        .unwrap_or(0.0)
}

pub fn is_anomalous(score: f64, threshold: f64) -> bool {
    score.abs() > threshold
}

fn median_of(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
