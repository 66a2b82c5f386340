//! Model performance metrics over paired series with missing values.
//!
//! Undefined results (empty samples, all-missing observations) are `NaN`
//! rather than errors.

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// (simulated, observed) pairs where both values are present.
pub fn complete_cases(sim: &[Option<f64>], obs: &[Option<f64>]) -> Vec<(f64, f64)> {
    sim.iter()
        .zip(obs)
        .filter_map(|(s, o)| Some((present(*s)?, present(*o)?)))
        .collect()
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Mean of the non-missing values.
pub fn mean(values: &[Option<f64>]) -> f64 {
    mean_of(values.iter().filter_map(|v| present(*v)))
}

/// Sample standard deviation (n - 1) of the non-missing values.
pub fn sample_std(values: &[Option<f64>]) -> f64 {
    let kept: Vec<f64> = values.iter().filter_map(|v| present(*v)).collect();
    if kept.len() < 2 {
        return f64::NAN;
    }
    let m = mean_of(kept.iter().copied());
    let ss: f64 = kept.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (kept.len() - 1) as f64).sqrt()
}

/// MB = mean(sim) - mean(obs).
pub fn mean_bias(pairs: &[(f64, f64)]) -> f64 {
    mean_of(pairs.iter().map(|(s, _)| *s)) - mean_of(pairs.iter().map(|(_, o)| *o))
}

/// ME = mean(|sim - obs|).
pub fn mean_gross_error(pairs: &[(f64, f64)]) -> f64 {
    mean_of(pairs.iter().map(|(s, o)| (s - o).abs()))
}

pub fn root_mean_square_error(pairs: &[(f64, f64)]) -> f64 {
    mean_of(pairs.iter().map(|(s, o)| (s - o).powi(2))).sqrt()
}

/// NMB = Σ(sim - obs) / Σobs × 100, `NaN` when `obs` has no value at all.
pub fn normalized_mean_bias(sim: &[Option<f64>], obs: &[Option<f64>]) -> f64 {
    if obs.iter().all(|o| present(*o).is_none()) {
        return f64::NAN;
    }
    let pairs = complete_cases(sim, obs);
    let diff: f64 = pairs.iter().map(|(s, o)| s - o).sum();
    let total: f64 = pairs.iter().map(|(_, o)| o).sum();
    diff / total * 100.0
}

/// NME = Σ|sim - obs| / Σobs × 100, `NaN` when `obs` has no value at all.
pub fn normalized_mean_error(sim: &[Option<f64>], obs: &[Option<f64>]) -> f64 {
    if obs.iter().all(|o| present(*o).is_none()) {
        return f64::NAN;
    }
    let pairs = complete_cases(sim, obs);
    let diff: f64 = pairs.iter().map(|(s, o)| (s - o).abs()).sum();
    let total: f64 = pairs.iter().map(|(_, o)| o).sum();
    diff / total * 100.0
}

/// Pearson correlation of the pairs; `NaN` below two pairs or for a
/// constant series.
pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let ms = mean_of(pairs.iter().map(|(s, _)| *s));
    let mo = mean_of(pairs.iter().map(|(_, o)| *o));
    let (mut cov, mut var_s, mut var_o) = (0.0, 0.0, 0.0);
    for (s, o) in pairs {
        cov += (s - ms) * (o - mo);
        var_s += (s - ms).powi(2);
        var_o += (o - mo).powi(2);
    }
    if var_s == 0.0 || var_o == 0.0 {
        return f64::NAN;
    }
    cov / (var_s * var_o).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_row_example() {
        let sim = [Some(10.0), Some(20.0)];
        let obs = [Some(8.0), None];
        let pairs = complete_cases(&sim, &obs);
        assert_eq!(pairs, vec![(10.0, 8.0)]);
        assert_eq!(mean_bias(&pairs), 2.0);
        assert_eq!(mean_gross_error(&pairs), 2.0);
        assert_eq!(root_mean_square_error(&pairs), 2.0);
        assert_eq!(normalized_mean_bias(&sim, &obs), 25.0);
        assert_eq!(normalized_mean_error(&sim, &obs), 25.0);
    }

    #[test]
    fn test_normalized_nan_when_obs_missing() {
        let sim = [Some(1.0), Some(2.0)];
        let obs = [None, Some(f64::NAN)];
        assert!(normalized_mean_bias(&sim, &obs).is_nan());
        assert!(normalized_mean_error(&sim, &obs).is_nan());

        let obs = [Some(1.5), None];
        assert!(normalized_mean_bias(&sim, &obs).is_finite());
        assert!(normalized_mean_error(&sim, &obs).is_finite());
    }

    #[test]
    fn test_mean_and_std_ignore_missing() {
        let values = [Some(2.0), None, Some(4.0), Some(6.0)];
        assert_eq!(mean(&values), 4.0);
        assert_eq!(sample_std(&values), 2.0);
        assert!(sample_std(&[Some(1.0), None]).is_nan());
        assert!(mean(&[None]).is_nan());
    }

    #[test]
    fn test_correlation() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        assert!((correlation(&pairs) - 1.0).abs() < 1e-12);
        let pairs = [(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)];
        assert!((correlation(&pairs) + 1.0).abs() < 1e-12);
        assert!(correlation(&[(1.0, 1.0), (2.0, 1.0)]).is_nan());
        assert!(correlation(&[(1.0, 1.0)]).is_nan());
    }

    #[test]
    fn test_empty_pairs_are_nan() {
        assert!(mean_bias(&[]).is_nan());
        assert!(mean_gross_error(&[]).is_nan());
        assert!(root_mean_square_error(&[]).is_nan());
    }
}
