//! Wind direction statistics on the circle.

use crate::statistics::metrics::complete_cases;

/// Signed shortest angular difference `model - observed`, in degrees.
///
/// When both ways round are equally long (|d| = 180) the plain difference is
/// kept.
pub fn wind_dir_diff(model: f64, observed: f64) -> f64 {
    let d = model - observed;
    if model < observed {
        if (360.0 + d).abs() < d.abs() {
            360.0 + d
        } else {
            d
        }
    } else if model > observed {
        if (d - 360.0).abs() < d.abs() {
            d - 360.0
        } else {
            d
        }
    } else {
        0.0
    }
}

fn differences(sim: &[Option<f64>], obs: &[Option<f64>]) -> Vec<f64> {
    complete_cases(sim, obs)
        .into_iter()
        .map(|(m, o)| wind_dir_diff(m, o))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Mean of the signed circular differences.
pub fn wind_dir_mean_bias(sim: &[Option<f64>], obs: &[Option<f64>]) -> f64 {
    mean(&differences(sim, obs))
}

/// Mean of the absolute circular differences.
pub fn wind_dir_mean_gross_error(sim: &[Option<f64>], obs: &[Option<f64>]) -> f64 {
    let abs: Vec<f64> = differences(sim, obs).iter().map(|d| d.abs()).collect();
    mean(&abs)
}
