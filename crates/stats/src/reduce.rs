//! Scalar reductions. Every function takes the non-missing samples of one
//! group and returns `None` when the statistic is undefined; an empty
//! group never produces a fabricated value.

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (N−1 denominator); undefined below two samples.
pub fn std_dev(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    let m = mean(samples)?;
    let var = samples.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (samples.len() - 1) as f64;
    Some(var.sqrt())
}

/// Geometric mean: `exp(mean(ln(x)))` over the positive samples.
///
/// Non-positive samples are excluded before reducing: throughput and rate
/// metrics are strictly positive, so a zero or negative sample is a
/// measurement artifact, not data.
pub fn geo_mean(samples: &[f64]) -> Option<f64> {
    let logs: Vec<f64> = samples.iter().filter(|v| **v > 0.0).map(|v| v.ln()).collect();
    mean(&logs).map(f64::exp)
}

/// Geometric mean of relative changes: `exp(mean(ln(1 + x))) − 1`.
///
/// Relative changes may legitimately be negative, so nothing is excluded;
/// but a change at or below −100% has no logarithm and makes the whole
/// group undefined rather than panicking.
pub fn geo_mean_delta(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() || samples.iter().any(|x| 1.0 + x <= 0.0) {
        return None;
    }
    let log_sum: f64 = samples.iter().map(|x| (1.0 + x).ln()).sum();
    Some((log_sum / samples.len() as f64).exp() - 1.0)
}

/// Quantile with linear interpolation (the R-7 method used by the original
/// pandas pipelines). `q` is clamped to [0, 1].
pub fn quantile(samples: &[f64], q: f64) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn geo_mean_of_two_and_eight_is_four() {
        assert!(close(geo_mean(&[2.0, 8.0]).unwrap(), 4.0));
    }

    #[test]
    fn geo_mean_of_ones_is_one() {
        assert!(close(geo_mean(&[1.0, 1.0, 1.0]).unwrap(), 1.0));
    }

    #[test]
    fn geo_mean_excludes_non_positive_samples() {
        assert!(close(geo_mean(&[2.0, 8.0, -1.0]).unwrap(), 4.0));
        assert!(close(geo_mean(&[2.0, 8.0, 0.0]).unwrap(), 4.0));
    }

    #[test]
    fn geo_mean_of_nothing_is_undefined() {
        assert_eq!(geo_mean(&[]), None);
        assert_eq!(geo_mean(&[-3.0, 0.0]), None);
    }

    #[test]
    fn geo_mean_delta_of_no_change_is_zero() {
        assert!(close(geo_mean_delta(&[0.0, 0.0]).unwrap(), 0.0));
    }

    #[test]
    fn geo_mean_delta_of_doubling_and_halving_cancels() {
        // +100% and -50% multiply out to no net change.
        assert!(close(geo_mean_delta(&[1.0, -0.5]).unwrap(), 0.0));
    }

    #[test]
    fn geo_mean_delta_keeps_negative_changes() {
        let d = geo_mean_delta(&[-0.1, -0.1]).unwrap();
        assert!(close(d, -0.1));
    }

    #[test]
    fn geo_mean_delta_undefined_at_total_loss() {
        assert_eq!(geo_mean_delta(&[-1.0]), None);
        assert_eq!(geo_mean_delta(&[0.5, -1.5]), None);
        assert_eq!(geo_mean_delta(&[]), None);
    }

    #[test]
    fn std_dev_needs_two_samples() {
        assert_eq!(std_dev(&[5.0]), None);
        assert!(close(std_dev(&[2.0, 4.0]).unwrap(), std::f64::consts::SQRT_2));
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&xs, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&xs, 0.0).unwrap(), 1.0));
        assert!(close(quantile(&xs, 1.0).unwrap(), 4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }
}
