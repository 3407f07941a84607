//! Statistical helper functions for LIM skill scoring.

/// Arithmetic mean of a slice. Returns 0.0 if empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Pearson correlation of two series over the samples where both are
/// finite.
///
/// `None` when fewer than 3 such samples remain or either series is
/// constant over them.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let finite = || {
        x.iter()
            .zip(y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
    };
    let (n, sx, sy) = finite().fold((0usize, 0.0_f64, 0.0_f64), |(n, sx, sy), (a, b)| {
        (n + 1, sx + a, sy + b)
    });
    if n < 3 {
        return None;
    }
    let (mx, my) = (sx / n as f64, sy / n as f64);

    let (cov, vx, vy) = finite().fold((0.0_f64, 0.0_f64, 0.0_f64), |(c, vx, vy), (a, b)| {
        let (da, db) = (a - mx, b - my);
        (c + da * db, vx + da * da, vy + db * db)
    });
    let scale = (vx * vy).sqrt();
    (scale > 0.0).then(|| cov / scale)
}

/// Lag-1 autocorrelation of a series about its mean.
///
/// Uses the biased (1/N) autocovariance estimator normalised by the lag-0
/// autocovariance. Returns `None` for fewer than 3 values or constant input.
pub fn lag1_autocorrelation(data: &[f64]) -> Option<f64> {
    let n = data.len();
    if n < 3 {
        return None;
    }
    let m = mean(data);
    let c0: f64 = data.iter().map(|&x| (x - m) * (x - m)).sum();
    if c0 == 0.0 {
        return None;
    }
    let c1: f64 = data
        .windows(2)
        .map(|w| (w[0] - m) * (w[1] - m))
        .sum();
    Some(c1 / c0)
}

/// Effective number of independent samples for the correlation of two
/// autocorrelated series (Bretherton et al., 1999):
///
/// `n_eff = n (1 - r1a r1b) / (1 + r1a r1b)`
///
/// The result is clamped to `[1, n]`.
pub fn effective_sample_size(n: usize, r1a: f64, r1b: f64) -> f64 {
    let nf = n as f64;
    if n == 0 {
        return 0.0;
    }
    let rr = r1a * r1b;
    if rr <= -1.0 {
        return nf;
    }
    (nf * (1.0 - rr) / (1.0 + rr)).clamp(1.0, nf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&data), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_pearson_correlation_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        let r = pearson_correlation(&x, &y);
        assert_relative_eq!(r.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_correlation_negated() {
        let x = [0.3, -1.2, 2.5, 0.7, -0.4];
        let y: Vec<f64> = x.iter().map(|v| -v).collect();
        let r = pearson_correlation(&x, &y);
        assert_relative_eq!(r.unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_correlation_insufficient() {
        let x = [1.0, 2.0];
        let y = [3.0, 4.0];
        assert!(pearson_correlation(&x, &y).is_none());
    }

    #[test]
    fn test_pearson_correlation_constant() {
        let x = [1.0, 1.0, 1.0, 1.0];
        let y = [3.0, 4.0, 5.0, 6.0];
        assert!(pearson_correlation(&x, &y).is_none());
    }

    #[test]
    fn test_pearson_correlation_with_nan() {
        let x = [1.0, f64::NAN, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, f64::NAN, 8.0, 10.0];
        // Finite pairs: (1,2), (4,8), (5,10): 3 pairs, perfect linear
        let r = pearson_correlation(&x, &y);
        assert_relative_eq!(r.unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_lag1_autocorrelation_alternating() {
        // mean 0, c0 = 6, c1 = -5 → -5/6
        let data = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        assert_relative_eq!(
            lag1_autocorrelation(&data).unwrap(),
            -5.0 / 6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_lag1_autocorrelation_constant() {
        assert!(lag1_autocorrelation(&[2.0, 2.0, 2.0, 2.0]).is_none());
    }

    #[test]
    fn test_effective_sample_size_white_noise() {
        assert_relative_eq!(effective_sample_size(50, 0.0, 0.0), 50.0, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_sample_size_red_noise() {
        // 100 * (1 - 0.25) / (1 + 0.25) = 60
        assert_relative_eq!(effective_sample_size(100, 0.5, 0.5), 60.0, epsilon = 1e-12);
    }

    #[test]
    fn test_effective_sample_size_clamped() {
        assert_relative_eq!(effective_sample_size(10, 0.999, 0.999), 1.0, epsilon = 1e-12);
        assert_relative_eq!(effective_sample_size(10, 0.9, -0.9), 10.0, epsilon = 1e-12);
    }
}
