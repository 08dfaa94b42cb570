//! Knee detection on a throughput/latency curve via finite-difference
//! curvature, matching numpy's second-order `gradient` on non-uniform grids.

/// Second-order-accurate first derivative of `y` with respect to `x`.
///
/// Interior points use the non-uniform central formula; the edges use
/// one-sided second-order differences. Requires at least three points and
/// strictly increasing `x`.
pub fn gradient(x: &[f64], y: &[f64]) -> Option<Vec<f64>> {
    let n = x.len();
    if n < 3 || y.len() != n || x.windows(2).any(|w| w[1] <= w[0]) {
        return None;
    }

    let mut d = vec![0.0; n];
    for i in 1..n - 1 {
        let hd = x[i] - x[i - 1];
        let hs = x[i + 1] - x[i];
        d[i] = (hs * hs * y[i - 1] - (hs * hs - hd * hd) * y[i] - hd * hd * y[i + 1])
            / (-(hs * hd) * (hd + hs));
    }

    let h1 = x[1] - x[0];
    let h2 = x[2] - x[1];
    d[0] = -(2.0 * h1 + h2) / (h1 * (h1 + h2)) * y[0] + (h1 + h2) / (h1 * h2) * y[1]
        - h1 / (h2 * (h1 + h2)) * y[2];

    let g1 = x[n - 1] - x[n - 2];
    let g2 = x[n - 2] - x[n - 3];
    d[n - 1] = (2.0 * g1 + g2) / (g1 * (g1 + g2)) * y[n - 1] - (g1 + g2) / (g1 * g2) * y[n - 2]
        + g1 / (g2 * (g1 + g2)) * y[n - 3];

    Some(d)
}

/// Locate the knee of a curve as the point of maximum curvature
/// `|y''| / (1 + y'²)^1.5`. Returns the `(x, y)` of the knee, or `None`
/// when the curve is too short or not strictly increasing in `x`.
pub fn knee_point(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let d1 = gradient(x, y)?;
    let d2 = gradient(x, &d1)?;
    let mut best = 0usize;
    let mut best_curv = f64::NEG_INFINITY;
    for i in 0..x.len() {
        let curv = d2[i].abs() / (1.0 + d1[i] * d1[i]).powf(1.5);
        if curv.is_finite() && curv > best_curv {
            best_curv = curv;
            best = i;
        }
    }
    if best_curv.is_finite() && best_curv >= 0.0 {
        Some((x[best], y[best]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_of_line_is_constant() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        let d = gradient(&x, &y).unwrap();
        for v in d {
            assert!((v - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn gradient_of_parabola_is_exact() {
        // Second-order scheme differentiates x^2 exactly, even off-grid.
        let x = [0.0, 0.5, 1.5, 3.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let d = gradient(&x, &y).unwrap();
        for (xi, di) in x.iter().zip(d) {
            assert!((di - 2.0 * xi).abs() < 1e-9);
        }
    }

    #[test]
    fn gradient_rejects_short_or_unsorted_input() {
        assert!(gradient(&[0.0, 1.0], &[0.0, 1.0]).is_none());
        assert!(gradient(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_none());
    }

    #[test]
    fn knee_of_hockey_stick_sits_at_the_bend() {
        // Flat until x=4, then steeply rising: the knee is near the bend.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let y = [10.0, 10.1, 10.2, 10.4, 20.0, 45.0, 80.0];
        let (kx, _) = knee_point(&x, &y).unwrap();
        assert!((3.0..=5.0).contains(&kx), "knee at {kx}");
    }

    #[test]
    fn knee_needs_three_points() {
        assert!(knee_point(&[1.0, 2.0], &[1.0, 2.0]).is_none());
    }
}
