//! Wavelet peak picking for a single profile spectrum, or many of them.
//!
//! Each pass transforms the working copy of the signal, walks it from left to right
//! looking for wavelet maxima, and fits a peak shape to the region around each one.
//! Every region examined is zeroed in the working copy whether its shape was
//! accepted or not, so that the next pass only sees what is left. Picking stops after
//! a pass that accepts nothing.
//!
//! Accepted shapes may then be refined individually, and shapes that look like several
//! overlapping peaks are replaced by their components.
use log::{debug, trace};

use thiserror::Error;

#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::config::PickerConfig;
use crate::deconvolution::Deconvolver;
use crate::fit::ShapeFitter;
use crate::locate::{find_endpoints, find_next_maximum, Direction, LocatorParams, PeakArea, SearchRegion};
use crate::noise::NoiseThresholds;
use crate::optimize::{LevenbergMarquardt, Penalties, SingleShapeProblem};
use crate::peak::PickedPeak;
use crate::peak_statistics::weighted_centroid;
use crate::shape::{PeakShape, PeakShapeModel};
use crate::snr::{MeanIterativeSignalToNoise, SignalToNoise};
use crate::wavelet::ContinuousWaveletTransform;
use crate::width::estimate_peak_width;

/// All the ways peak picking can fail
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeakPickerError {
    #[error("The m/z and intensity arrays do not match in length")]
    MZIntensityMismatch,
    #[error("The m/z array is not sorted")]
    MZNotSorted,
    #[error("The intensity at index {0} is negative or not finite")]
    InvalidIntensity(usize),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No spectrum had any signal to estimate a peak width from")]
    NoUsableSpectrum,
    #[error("The peak width could not be estimated")]
    PeakWidthNotEstimated,
}

/// Check if the values in `it` are strictly increasing
pub fn is_strictly_increasing(it: &[f64]) -> bool {
    it.windows(2).all(|w| w[0] < w[1])
}

/// A profile spectrum with its acquisition metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileSignal {
    mz_array: Vec<f64>,
    intensity_array: Vec<f32>,
    pub ms_level: u8,
    pub retention_time: Option<f64>,
}

impl ProfileSignal {
    /// Create an MS1 profile, checking that the arrays are paired and sorted and that
    /// every intensity is a finite, non-negative number
    pub fn new(mz_array: Vec<f64>, intensity_array: Vec<f32>) -> Result<Self, PeakPickerError> {
        if mz_array.len() != intensity_array.len() {
            return Err(PeakPickerError::MZIntensityMismatch);
        }
        if !is_strictly_increasing(&mz_array) {
            return Err(PeakPickerError::MZNotSorted);
        }
        if let Some(i) = intensity_array.iter().position(|y| !(y.is_finite() && *y >= 0.0)) {
            return Err(PeakPickerError::InvalidIntensity(i));
        }
        Ok(Self {
            mz_array,
            intensity_array,
            ms_level: 1,
            retention_time: None,
        })
    }

    pub fn with_ms_level(mut self, ms_level: u8) -> Self {
        self.ms_level = ms_level;
        self
    }

    pub fn with_retention_time(mut self, retention_time: f64) -> Self {
        self.retention_time = Some(retention_time);
        self
    }

    pub fn mz_array(&self) -> &[f64] {
        &self.mz_array
    }

    pub fn intensity_array(&self) -> &[f32] {
        &self.intensity_array
    }

    pub fn len(&self) -> usize {
        self.mz_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz_array.is_empty()
    }

    pub fn total_ion_current(&self) -> f64 {
        self.intensity_array.iter().map(|y| *y as f64).sum()
    }
}

/// A wavelet-based peak picker with optional deconvolution of overlapping peaks.
///
/// The picker is immutable once built. Its wavelet thresholds are calibrated against
/// the configured peak bounds in [`PeakPickerCWT::new`], so a different scale or bound
/// calls for a new picker.
#[derive(Debug, Clone)]
pub struct PeakPickerCWT {
    config: PickerConfig,
    cwt: ContinuousWaveletTransform,
    thresholds: NoiseThresholds,
}

impl Default for PeakPickerCWT {
    fn default() -> Self {
        let config = PickerConfig::default();
        let cwt = ContinuousWaveletTransform::new(config.peak_width, config.wavelet_spacing);
        let thresholds = NoiseThresholds::calibrate(&cwt, config.peak_bound, config.peak_bound_ms2);
        Self {
            config,
            cwt,
            thresholds,
        }
    }
}

impl PeakPickerCWT {
    pub fn new(config: PickerConfig) -> Result<Self, PeakPickerError> {
        config.validate()?;
        let cwt = ContinuousWaveletTransform::new(config.peak_width, config.wavelet_spacing);
        let thresholds = NoiseThresholds::calibrate(&cwt, config.peak_bound, config.peak_bound_ms2);
        Ok(Self {
            config,
            cwt,
            thresholds,
        })
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &NoiseThresholds {
        &self.thresholds
    }

    /// Pick peaks from paired m/z and intensity arrays using the default
    /// [`MeanIterativeSignalToNoise`] estimator.
    pub fn pick(
        &self,
        mz_array: &[f64],
        intensity_array: &[f32],
        ms_level: u8,
    ) -> Result<Vec<PickedPeak>, PeakPickerError> {
        let signal = ProfileSignal::new(mz_array.to_vec(), intensity_array.to_vec())?
            .with_ms_level(ms_level);
        self.pick_signal(&signal)
    }

    /// Pick peaks from `signal` using the default [`MeanIterativeSignalToNoise`] estimator
    pub fn pick_signal(&self, signal: &ProfileSignal) -> Result<Vec<PickedPeak>, PeakPickerError> {
        let snr = MeanIterativeSignalToNoise::default().estimate(signal.mz_array(), signal.intensity_array());
        self.pick_with(signal, &snr)
    }

    /// Pick peaks from `signal`, taking apex signal-to-noise ratios from `snr`.
    ///
    /// Returns the peaks sorted by m/z. A signal with fewer than four samples has no peaks.
    pub fn pick_with<S: SignalToNoise + ?Sized>(
        &self,
        signal: &ProfileSignal,
        snr: &S,
    ) -> Result<Vec<PickedPeak>, PeakPickerError> {
        let shapes = self.pick_shapes(signal, snr);
        let peaks: Vec<PickedPeak> = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| {
                let mut peak = PickedPeak::from(shape);
                peak.index = i as u32;
                peak
            })
            .collect();
        debug!(
            "Picked {} peaks from {} samples at MS level {}",
            peaks.len(),
            signal.len(),
            signal.ms_level
        );
        Ok(peaks)
    }

    /// Run the full picking pipeline on `signal` and return the shapes sorted by position
    pub fn pick_shapes<S: SignalToNoise + ?Sized>(&self, signal: &ProfileSignal, snr: &S) -> Vec<PeakShape> {
        let mz_array = signal.mz_array();
        let intensity_array = signal.intensity_array();
        if signal.len() < 4 {
            return Vec::new();
        }
        let params = self.locator_params(signal.ms_level);

        let mut working = intensity_array.to_vec();
        let mut shapes = Vec::new();
        let mut passes = 0;
        loop {
            passes += 1;
            let found = self.extract_pass(mz_array, &mut working, snr, &params, &mut shapes);
            trace!("Pass {passes} extracted {found} peaks");
            if found == 0 {
                break;
            }
        }
        debug!("Extracted {} shapes in {passes} passes", shapes.len());

        if self.config.optimization_enabled {
            for shape in shapes.iter_mut() {
                self.optimize_shape(mz_array, intensity_array, shape);
            }
        }
        shapes.sort_by(|a, b| a.position().total_cmp(&b.position()));

        if self.config.deconvolution_enabled {
            let deconvolver = Deconvolver::new(
                mz_array,
                intensity_array,
                &self.config,
                params.threshold,
                params.intensity_floor,
            );
            let before = shapes.len();
            shapes = deconvolver.deconvolve_all(shapes);
            debug!("Deconvolution turned {before} shapes into {}", shapes.len());
        }

        for shape in shapes.iter_mut() {
            shape.retention_time = signal.retention_time;
        }
        shapes
    }

    fn locator_params(&self, ms_level: u8) -> LocatorParams {
        LocatorParams {
            threshold: self.thresholds.for_ms_level(ms_level),
            intensity_floor: self.config.intensity_floor(ms_level),
            search_radius: self.config.search_radius,
            noise_level: self.config.noise_level,
            scale: self.config.peak_width,
        }
    }

    /// Make one left to right pass over the working signal, zeroing every region
    /// examined. Returns the number of shapes accepted.
    fn extract_pass<S: SignalToNoise + ?Sized>(
        &self,
        mz_array: &[f64],
        working: &mut [f32],
        snr: &S,
        params: &LocatorParams,
        shapes: &mut Vec<PeakShape>,
    ) -> usize {
        let n = mz_array.len();
        let transform = self.cwt.transform(mz_array, working, 1);
        let mut region = SearchRegion::new(0..n, n);
        let mut found = 0;
        while region.len() > 3 {
            let Some(apex) = find_next_maximum(working, &region, &transform, params, Direction::Forward) else {
                break;
            };
            let signal_to_noise = snr.signal_to_noise(apex);
            if signal_to_noise < self.config.signal_to_noise {
                trace!("Skipping apex {apex} with signal-to-noise {signal_to_noise}");
                region.advance_to(apex);
                continue;
            }
            let (left, right) = find_endpoints(mz_array, working, &region, apex, &transform, params);
            if let Some(mut shape) = self.extract(mz_array, working, left, apex, right) {
                shape.signal_to_noise = signal_to_noise;
                shapes.push(shape);
                found += 1;
            }
            working[left..=right].fill(0.0);
            region.advance_to(right);
        }
        found
    }

    /// Fit a shape to `[left, right]` and check it against the quality gates
    fn extract(&self, mz_array: &[f64], working: &[f32], left: usize, apex: usize, right: usize) -> Option<PeakShape> {
        let mut area = PeakArea::new(left, apex, right)?;
        area.centroid = weighted_centroid(
            mz_array,
            working,
            left,
            apex,
            right,
            self.config.centroid_percentage,
        );
        area.centroid?;
        let shape = ShapeFitter::new(mz_array, working, self.config.fit_mode).fit(&area)?;

        let fwhm = shape.full_width_at_half_max();
        let (lower, upper) = self.config.fwhm_bounds();
        if shape.correlation > self.config.correlation_floor && lower <= fwhm && fwhm <= upper {
            Some(shape)
        } else {
            trace!("Rejected {shape}");
            None
        }
    }

    /// Refine `shape` against the raw samples it was fit to, leaving it untouched
    /// if the fit does not converge to a usable model.
    fn optimize_shape(&self, mz_array: &[f64], intensity_array: &[f32], shape: &mut PeakShape) {
        let (left, right) = (shape.left_endpoint, shape.right_endpoint);
        let problem = SingleShapeProblem::new(
            &shape.model,
            &mz_array[left..=right],
            &intensity_array[left..=right],
            Penalties {
                position: self.config.optimization_penalty_position,
                left_width: self.config.optimization_penalty_left_width,
                right_width: self.config.optimization_penalty_right_width,
            },
        );
        let solver = LevenbergMarquardt::new(
            self.config.optimization_iterations,
            self.config.optimization_eps_abs,
            self.config.optimization_eps_rel,
        );
        let result = solver.minimize(&problem, problem.reference.clone());
        let model = problem.decode(&result.params);
        if !result.converged() || !model.is_well_formed() {
            debug!(
                "Optimization of {shape} ended with {:?} after {} iterations",
                result.status, result.iterations
            );
            return;
        }
        shape.model = model;
        shape.area = model.analytic_area();
        shape.correlation = model.correlation(mz_array, intensity_array, left, right);
    }

    /// Pick every scan in `scans`, each getting its own result.
    ///
    /// When [`PickerConfig::estimate_peak_width`] is set the peak width is estimated
    /// from `scans` first, and a failure to do so fails the whole run.
    pub fn pick_experiment(
        &self,
        scans: &[ProfileSignal],
    ) -> Result<Vec<Result<Vec<PickedPeak>, PeakPickerError>>, PeakPickerError> {
        if self.config.estimate_peak_width {
            let width = estimate_peak_width(&self.config, scans)?;
            debug!("Estimated peak width {width:0.5}");
            let picker = Self::new(
                self.config
                    .clone()
                    .peak_width(width)
                    .estimate_peak_width(false),
            )?;
            return Ok(pick_experiment_inner(&picker, scans));
        }
        Ok(pick_experiment_inner(self, scans))
    }
}

// Can't inline cfg-if
cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn pick_experiment_inner(
            picker: &PeakPickerCWT,
            scans: &[ProfileSignal],
        ) -> Vec<Result<Vec<PickedPeak>, PeakPickerError>> {
            scans.par_iter().map(|scan| picker.pick_signal(scan)).collect()
        }
    } else {
        fn pick_experiment_inner(
            picker: &PeakPickerCWT,
            scans: &[ProfileSignal],
        ) -> Vec<Result<Vec<PickedPeak>, PeakPickerError>> {
            scans.iter().map(|scan| picker.pick_signal(scan)).collect()
        }
    }
}

/// A convenience function that uses a default peak picking configuration to pick peaks from paired
/// m/z and intensity arrays of an MS1 spectrum.
pub fn pick_peaks(mz_array: &[f64], intensity_array: &[f32]) -> Result<Vec<PickedPeak>, PeakPickerError> {
    PeakPickerCWT::default().pick(mz_array, intensity_array, 1)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shape::PeakShapeKind;
    use crate::test_data::{grid, isolated_sech2, lorentzian_signal, merged_sech2, sech2_ladder, sech2_signal, zero_outside};
    use mzpeaks::prelude::*;
    use rstest::rstest;

    fn signal(mz: Vec<f64>, intensity: Vec<f32>) -> ProfileSignal {
        ProfileSignal::new(mz, intensity).unwrap()
    }

    #[rstest]
    #[case(PeakShapeKind::Sech2, 0.2)]
    #[case(PeakShapeKind::Sech2, 0.15)]
    #[case(PeakShapeKind::Lorentzian, 0.15)]
    fn test_single_peak_round_trip(#[case] kind: PeakShapeKind, #[case] fwhm: f64) {
        let mz = grid(498.0, 502.0, 0.005);
        let intensity = match kind {
            PeakShapeKind::Sech2 => sech2_signal(&mz, &[(500.0, 1000.0)], fwhm),
            PeakShapeKind::Lorentzian => lorentzian_signal(&mz, &[(500.0, 1000.0)], fwhm),
        };
        let mut intensity = intensity;
        zero_outside(&mz, &mut intensity, 498.5, 501.5);
        let picker = PeakPickerCWT::default();
        let peaks = picker.pick(&mz, &intensity, 1).unwrap();
        assert_eq!(peaks.len(), 1, "{peaks:?}");
        let peak = &peaks[0];
        assert_eq!(peak.shape, kind);
        assert!((peak.mz() - 500.0).abs() <= 0.005);
        assert!(
            ((peak.full_width_at_half_max as f64) - fwhm).abs() / fwhm < 0.05,
            "{} vs {fwhm}",
            peak.full_width_at_half_max
        );
        assert!(peak.correlation > 0.99);
        assert!((peak.height - 1000.0).abs() < 1.0);
        assert_eq!(peak.index, 0);
    }

    #[test]
    fn test_too_few_samples() {
        let picker = PeakPickerCWT::default();
        let peaks = picker.pick(&[1.0, 2.0, 3.0], &[0.0, 100.0, 0.0], 1).unwrap();
        assert!(peaks.is_empty());
        assert!(picker.pick(&[], &[], 1).unwrap().is_empty());
    }

    #[test]
    fn test_input_errors() {
        let picker = PeakPickerCWT::default();
        assert_eq!(
            picker.pick(&[1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 0.0], 1),
            Err(PeakPickerError::MZIntensityMismatch)
        );
        assert_eq!(
            picker.pick(&[1.0, 3.0, 2.0, 4.0], &[0.0, 1.0, 0.0, 0.0], 1),
            Err(PeakPickerError::MZNotSorted)
        );
        assert_eq!(
            picker.pick(&[1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, -0.5, 0.0], 1),
            Err(PeakPickerError::InvalidIntensity(2))
        );
        assert_eq!(
            ProfileSignal::new(vec![1.0, 2.0, 3.0], vec![f32::NAN, 1.0, 0.0]),
            Err(PeakPickerError::InvalidIntensity(0))
        );
        assert_eq!(
            ProfileSignal::new(vec![1.0, 2.0, 3.0], vec![0.0, 1.0, f32::INFINITY]),
            Err(PeakPickerError::InvalidIntensity(2))
        );
        assert!(ProfileSignal::new(vec![1.0, 2.0, 3.0], vec![0.0, 1.0, 0.0]).is_ok());
        assert!(matches!(
            PeakPickerCWT::new(PickerConfig::default().peak_width(-1.0)),
            Err(PeakPickerError::InvalidConfiguration(_))
        ));
    }

    #[rstest]
    #[case(10.0, 1)]
    #[case(9.0, 0)]
    fn test_intensity_floor(#[case] height: f64, #[case] expected: usize) {
        let (mz, mut intensity) = isolated_sech2(height, 0.2);
        let apex = mz.iter().position(|x| (x - 500.0).abs() < 1e-6).unwrap();
        intensity[apex] = height as f32;
        let peaks = PeakPickerCWT::default().pick(&mz, &intensity, 1).unwrap();
        assert_eq!(peaks.len(), expected);
    }

    #[test]
    fn test_msn_floor() {
        let (mz, intensity) = isolated_sech2(50.0, 0.2);
        let picker = PeakPickerCWT::new(PickerConfig::default().peak_bound_ms2(100.0)).unwrap();
        assert_eq!(picker.pick(&mz, &intensity, 1).unwrap().len(), 1);
        assert!(picker.pick(&mz, &intensity, 2).unwrap().is_empty());
    }

    #[test]
    fn test_signal_to_noise_gate() {
        let (mz, intensity) = isolated_sech2(1000.0, 0.2);
        let signal = signal(mz, intensity);
        let picker = PeakPickerCWT::new(PickerConfig::default().signal_to_noise(5.0)).unwrap();
        let quiet = |_: usize| 1.0f32;
        assert!(picker.pick_with(&signal, &quiet).unwrap().is_empty());
        let loud = |_: usize| 100.0f32;
        let peaks = picker.pick_with(&signal, &loud).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].signal_to_noise, 100.0);
    }

    #[test]
    fn test_fwhm_gate() {
        let (mz, intensity) = isolated_sech2(1000.0, 0.2);
        let picker = PeakPickerCWT::new(PickerConfig::default().fwhm_upper_factor(1.0)).unwrap();
        assert!(picker.pick(&mz, &intensity, 1).unwrap().is_empty());
    }

    #[test_log::test]
    fn test_merged_peaks_without_deconvolution() {
        let (mz, intensity) = merged_sech2(0.2, 0.3);
        let peaks = PeakPickerCWT::default().pick(&mz, &intensity, 1).unwrap();
        assert_eq!(peaks.len(), 1);
        assert!(peaks[0].full_width_at_half_max > 0.35);
        assert!(peaks[0].correlation < 0.999);
    }

    #[rstest]
    #[case(0.2, 0.3)]
    #[case(0.25, 0.35)]
    #[case(0.3, 0.45)]
    #[test_log::test]
    fn test_merged_peaks_with_deconvolution(#[case] separation: f64, #[case] fwhm: f64) {
        let (mz, intensity) = merged_sech2(separation, fwhm);
        let config = PickerConfig::default()
            .deconvolution_enabled(true)
            .deconvolution_fwhm_threshold(0.35)
            .deconvolution_left_width(5.0)
            .deconvolution_right_width(5.0);
        let picker = PeakPickerCWT::new(config).unwrap();
        let peaks = picker.pick(&mz, &intensity, 1).unwrap();
        assert_eq!(peaks.len(), 2, "{peaks:?}");
        assert!((peaks[0].mz() - 500.0).abs() <= 0.005);
        assert!((peaks[1].mz() - (500.0 + separation)).abs() <= 0.005);
        assert_eq!(peaks[0].index, 0);
        assert_eq!(peaks[1].index, 1);
        for peak in peaks.iter() {
            assert_eq!(peak.shape, PeakShapeKind::Sech2);
        }
    }

    #[test]
    fn test_picking_is_idempotent() {
        let (mz, intensity) = sech2_ladder();
        let picker = PeakPickerCWT::new(PickerConfig::default().peak_width(0.1)).unwrap();
        let first = picker.pick(&mz, &intensity, 1).unwrap();
        let second = picker.pick(&mz, &intensity, 1).unwrap();
        assert_eq!(first.len(), 9);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.mz, b.mz);
            assert_eq!(a.intensity, b.intensity);
            assert_eq!(a.index, b.index);
            assert_eq!(a.full_width_at_half_max, b.full_width_at_half_max);
            assert_eq!(a.left_width, b.left_width);
            assert_eq!(a.right_width, b.right_width);
            assert_eq!(a.shape, b.shape);
            assert_eq!(a.correlation, b.correlation);
            assert_eq!(a.height, b.height);
        }
        assert!(first.windows(2).all(|w| w[0].mz < w[1].mz));
    }

    #[test_log::test]
    fn test_noisy_profile() {
        let (mz, mut intensity) = isolated_sech2(1000.0, 0.2);
        // Uniform noise in [0, 5) from a fixed linear congruential sequence
        let mut state: u64 = 17;
        for y in intensity.iter_mut() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *y += ((state >> 33) as f64 / (1u64 << 31) as f64 * 5.0) as f32;
        }
        for config in [PickerConfig::default(), PickerConfig::default().deconvolution_enabled(true)] {
            let peaks = PeakPickerCWT::new(config).unwrap().pick(&mz, &intensity, 1).unwrap();
            assert_eq!(peaks.len(), 1, "{peaks:?}");
            assert!((peaks[0].mz() - 500.0).abs() < 0.01);
            assert!(((peaks[0].full_width_at_half_max as f64) - 0.2).abs() < 0.02);
            assert!(peaks[0].correlation > 0.99);
        }
    }

    #[test]
    fn test_optimization_keeps_good_fits() {
        let (mz, intensity) = isolated_sech2(1000.0, 0.2);
        let picker = PeakPickerCWT::new(PickerConfig::default().optimization_enabled(true)).unwrap();
        let peaks = picker.pick(&mz, &intensity, 1).unwrap();
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].mz() - 500.0).abs() < 1e-3);
        assert!(((peaks[0].full_width_at_half_max as f64) - 0.2).abs() < 0.01);
        assert!(peaks[0].correlation > 0.99);
    }

    #[test]
    fn test_pick_experiment() {
        let (mz, intensity) = isolated_sech2(1000.0, 0.2);
        let scans = vec![
            signal(mz.clone(), intensity.clone()).with_retention_time(1.5),
            signal(mz.clone(), vec![0.0; mz.len()]).with_retention_time(2.0),
            signal(mz, intensity).with_ms_level(2),
        ];
        let picker = PeakPickerCWT::default();
        let results = picker.pick_experiment(&scans).unwrap();
        assert_eq!(results.len(), 3);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].retention_time, Some(1.5));
        assert!(results[1].as_ref().unwrap().is_empty());
        assert_eq!(results[2].as_ref().unwrap()[0].retention_time, None);
    }

    #[test]
    fn test_pick_experiment_width_failure() {
        let mz = grid(400.0, 401.0, 0.005);
        let scans = vec![signal(mz.clone(), vec![0.0; mz.len()])];
        let picker = PeakPickerCWT::new(PickerConfig::default().estimate_peak_width(true)).unwrap();
        assert_eq!(picker.pick_experiment(&scans), Err(PeakPickerError::NoUsableSpectrum));
    }
}
