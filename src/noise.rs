//! Translate intensity floors into wavelet-domain thresholds.
//!
//! A Lorentzian whose FWHM equals the wavelet scale and whose height equals the
//! floor is synthesized and transformed. Its largest transform value is the
//! smallest transform maximum a real peak at the floor would produce.
use crate::wavelet::ContinuousWaveletTransform;

/// The wavelet threshold for a single intensity floor
pub fn calibrate_threshold(cwt: &ContinuousWaveletTransform, intensity_floor: f32) -> f64 {
    let scale = cwt.scale();
    let spacing = cwt.spacing();
    let n = (4.0 * scale / spacing) as usize + 1;
    let lambda = 2.0 / scale;
    let height = intensity_floor as f64;

    let mz: Vec<f64> = (0..n).map(|i| -2.0 * scale + i as f64 * spacing).collect();
    let intensity: Vec<f32> = mz
        .iter()
        .map(|x| (height / (1.0 + (lambda * x).powi(2))) as f32)
        .collect();
    cwt.transform(&mz, &intensity, 1).max_value()
}

/// The calibrated wavelet thresholds for MS1 and MSn spectra
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseThresholds {
    pub ms1: f64,
    pub msn: f64,
}

impl NoiseThresholds {
    pub fn calibrate(cwt: &ContinuousWaveletTransform, peak_bound: f32, peak_bound_ms2: f32) -> Self {
        let ms1 = calibrate_threshold(cwt, peak_bound);
        let msn = if peak_bound_ms2 == peak_bound {
            ms1
        } else {
            calibrate_threshold(cwt, peak_bound_ms2)
        };
        log::debug!(
            "Calibrated wavelet thresholds at scale {}: MS1 {ms1:0.4}, MSn {msn:0.4}",
            cwt.scale()
        );
        Self { ms1, msn }
    }

    pub fn for_ms_level(&self, ms_level: u8) -> f64 {
        if ms_level > 1 {
            self.msn
        } else {
            self.ms1
        }
    }
}
