//! Summary statistics over a single peak's samples

/// Integrate the samples in the inclusive index range `[start, end]` with the trapezoid rule
pub fn trapz(mz_array: &[f64], intensity_array: &[f32], start: usize, end: usize) -> f64 {
    (start..end)
        .map(|k| {
            (mz_array[k + 1] - mz_array[k]) * (intensity_array[k] + intensity_array[k + 1]) as f64
                / 2.0
        })
        .sum()
}

/// The trapezoidal areas of the left `[left, apex]` and right `[apex, right]` sides of a peak.
///
/// The right side is summed from its outer edge inward.
pub fn partial_areas(
    mz_array: &[f64],
    intensity_array: &[f32],
    left: usize,
    apex: usize,
    right: usize,
) -> (f64, f64) {
    let left_area = trapz(mz_array, intensity_array, left, apex);
    let right_area = (apex + 1..=right)
        .rev()
        .map(|k| {
            (mz_array[k] - mz_array[k - 1]) * (intensity_array[k] + intensity_array[k - 1]) as f64
                / 2.0
        })
        .sum();
    (left_area, right_area)
}

/// The intensity-weighted mean m/z of the samples near the apex.
///
/// Starting at the apex and moving outward on both sides without leaving `[left, right]`,
/// samples are included while they reach `percentage` of the apex intensity. Returns
/// `None` if nothing carries weight.
pub fn weighted_centroid(
    mz_array: &[f64],
    intensity_array: &[f32],
    left: usize,
    apex: usize,
    right: usize,
    percentage: f32,
) -> Option<f64> {
    let threshold = intensity_array[apex] * percentage;
    let mut weighted = 0.0;
    let mut total = 0.0;

    let mut accumulate = |k: usize| -> bool {
        let y = intensity_array[k];
        if y >= threshold {
            weighted += y as f64 * mz_array[k];
            total += y as f64;
            true
        } else {
            false
        }
    };

    for k in (left..apex).rev() {
        if !accumulate(k) {
            break;
        }
    }
    for k in apex..=right {
        if !accumulate(k) {
            break;
        }
    }

    if total > 0.0 {
        Some(weighted / total)
    } else {
        None
    }
}

/// The squared Pearson correlation between observed intensities and a model's predictions
/// over the inclusive index range `[left, right]`. Returns `NaN` when either side has no variance.
pub fn squared_correlation<F: Fn(f64) -> f64>(
    mz_array: &[f64],
    intensity_array: &[f32],
    left: usize,
    right: usize,
    model: F,
) -> f64 {
    let n = (right + 1 - left) as f64;
    let mut data_sum = 0.0;
    let mut fit_sum = 0.0;
    let mut data_sq = 0.0;
    let mut fit_sq = 0.0;
    let mut cross = 0.0;
    for k in left..=right {
        let d = intensity_array[k] as f64;
        let f = model(mz_array[k]);
        data_sum += d;
        fit_sum += f;
        data_sq += d * d;
        fit_sq += f * f;
        cross += d * f;
    }
    let data_mean = data_sum / n;
    let fit_mean = fit_sum / n;
    let sxx = data_sq - n * data_mean * data_mean;
    let syy = fit_sq - n * fit_mean * fit_mean;
    let sxy = cross - n * data_mean * fit_mean;
    let denom = sxx * syy;
    if denom == 0.0 || !denom.is_finite() {
        return f64::NAN;
    }
    (sxy * sxy) / denom
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_areas_triangle() {
        let mz = [0.0, 1.0, 2.0, 3.0, 4.0];
        let intensity = [0.0f32, 5.0, 10.0, 5.0, 0.0];
        let (left, right) = partial_areas(&mz, &intensity, 0, 2, 4);
        assert_eq!(left, 10.0);
        assert_eq!(right, 10.0);
        assert_eq!(trapz(&mz, &intensity, 0, 4), 20.0);
        let (left, right) = partial_areas(&mz, &intensity, 1, 2, 3);
        assert_eq!(left, 7.5);
        assert_eq!(right, 7.5);
    }

    #[test]
    fn test_weighted_centroid() {
        let mz = [0.0, 1.0, 2.0, 3.0, 4.0];
        let intensity = [1.0f32, 9.0, 10.0, 7.0, 1.0];
        let centroid = weighted_centroid(&mz, &intensity, 0, 2, 4, 0.5).unwrap();
        let expected = (9.0 * 1.0 + 10.0 * 2.0 + 7.0 * 3.0) / 26.0;
        assert!((centroid - expected).abs() < 1e-12);

        let centroid = weighted_centroid(&mz, &intensity, 0, 2, 4, 0.8).unwrap();
        let expected = (9.0 * 1.0 + 10.0 * 2.0) / 19.0;
        assert!((centroid - expected).abs() < 1e-12);

        let zeros = [0.0f32; 5];
        assert!(weighted_centroid(&mz, &zeros, 0, 2, 4, 0.8).is_none());
    }

    #[test]
    fn test_squared_correlation() {
        let mz = [0.0, 1.0, 2.0, 3.0, 4.0];
        let intensity = [1.0f32, 3.0, 5.0, 7.0, 9.0];
        let r2 = squared_correlation(&mz, &intensity, 0, 4, |x| 2.0 * x + 1.0);
        assert!((r2 - 1.0).abs() < 1e-12);
        let r2 = squared_correlation(&mz, &intensity, 0, 4, |_| 4.0);
        assert!(r2.is_nan());
    }
}
