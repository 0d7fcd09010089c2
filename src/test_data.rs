//! Synthetic profile spectra for tests
pub use crate::shape::SECH2_HALF_MAX as SECH2_HWHM;

pub fn grid(start: f64, end: f64, step: f64) -> Vec<f64> {
    let n = ((end - start) / step).round() as usize + 1;
    (0..n).map(|i| start + i as f64 * step).collect()
}

/// Sum of symmetric Sech² peaks `(center, height)` sharing one FWHM
pub fn sech2_signal(mz: &[f64], peaks: &[(f64, f64)], fwhm: f64) -> Vec<f32> {
    let lambda = 2.0 * SECH2_HWHM / fwhm;
    mz.iter()
        .map(|x| {
            peaks
                .iter()
                .map(|(center, height)| {
                    let z = (lambda * (x - center)).clamp(-300.0, 300.0);
                    height / z.cosh().powi(2)
                })
                .sum::<f64>() as f32
        })
        .collect()
}

/// Sum of symmetric Lorentzian peaks `(center, height)` sharing one FWHM
pub fn lorentzian_signal(mz: &[f64], peaks: &[(f64, f64)], fwhm: f64) -> Vec<f32> {
    let lambda = 2.0 / fwhm;
    mz.iter()
        .map(|x| {
            peaks
                .iter()
                .map(|(center, height)| height / (1.0 + (lambda * (x - center)).powi(2)))
                .sum::<f64>() as f32
        })
        .collect()
}

/// Zero every sample outside `[lo, hi]`
pub fn zero_outside(mz: &[f64], intensity: &mut [f32], lo: f64, hi: f64) {
    for (x, y) in mz.iter().zip(intensity.iter_mut()) {
        if *x < lo || *x > hi {
            *y = 0.0;
        }
    }
}

/// One isolated Sech² peak at 500 m/z, zero beyond 1.5 m/z of its center
pub fn isolated_sech2(height: f64, fwhm: f64) -> (Vec<f64>, Vec<f32>) {
    let mz = grid(498.0, 502.0, 0.005);
    let mut intensity = sech2_signal(&mz, &[(500.0, height)], fwhm);
    zero_outside(&mz, &mut intensity, 498.5, 501.5);
    (mz, intensity)
}

/// Two equal Sech² peaks at 500 and `500 + separation` that merge into one hump
pub fn merged_sech2(separation: f64, fwhm: f64) -> (Vec<f64>, Vec<f32>) {
    let mz = grid(498.0, 502.0, 0.005);
    let mut intensity = sech2_signal(
        &mz,
        &[(500.0, 1000.0), (500.0 + separation, 1000.0)],
        fwhm,
    );
    zero_outside(&mz, &mut intensity, 498.5, 501.5 + separation);
    (mz, intensity)
}

/// Nine well separated Sech² peaks of FWHM 0.1 between 400 and 412 m/z
pub fn sech2_ladder() -> (Vec<f64>, Vec<f32>) {
    let mz = grid(400.0, 412.0, 0.005);
    let peaks = [
        (401.0, 800.0),
        (402.3, 1200.0),
        (403.1, 500.0),
        (404.6, 900.0),
        (405.2, 1500.0),
        (406.7, 700.0),
        (408.4, 1000.0),
        (409.5, 600.0),
        (410.6, 1100.0),
    ];
    let intensity = sech2_signal(&mz, &peaks, 0.1);
    (mz, intensity)
}
