//! Splitting peak shapes that are really several overlapping peaks.
//!
//! A shape becomes a candidate when it is too broad or too asymmetric. Whether a candidate
//! is actually split depends on its neighbors: a shape sitting at a plausible isotope
//! spacing from an otherwise well-behaved neighbor is more likely to be one real peak.
//!
//! Splitting counts the sub-peaks with a finer wavelet transform, then fits that many
//! Sech² peaks sharing one pair of widths to the raw signal. Any fit that does not
//! converge, or that moves the sub-peaks too far apart or together, leaves the original
//! shape untouched.
use nalgebra::DVector;

use crate::config::PickerConfig;
use crate::optimize::{summed_density, LevenbergMarquardt, MultiPeakProblem, Penalties};
use crate::peak_statistics::squared_correlation;
use crate::search::nearest_in;
use crate::shape::{PeakShape, PeakShapeKind, PeakShapeModel, ShapeModel};
use crate::wavelet::ContinuousWaveletTransform;

/// The mass difference between the first two isotopic peaks of a typical peptide
pub const ISOTOPE_SPACING: f64 = 1.00235;
/// Neighbors further away than this do not influence the decision
const NEIGHBOR_RANGE: f64 = 1.2;
/// Two neighbors at distances whose ratio is below this suggest a hidden peak
const DISTANCE_RATIO: f64 = 0.6;
/// A neighbor at isotope spacing narrower than this fraction of the candidate suggests overlap
const WIDTH_RATIO: f64 = 0.6;
const CHARGE_1_TOLERANCE: f64 = 0.21;
const CHARGE_2_TOLERANCE: f64 = 0.11;
/// The resampling factor of the sub-peak counting transform
const SUBPEAK_RESOLUTION: usize = 10;
/// The zero-intensity anchors added either side of the fitted signal
const ANCHOR_OFFSET: f64 = 0.2;
/// The largest change in spacing between sub-peaks the fit may introduce
const MAX_SPACING_DRIFT: f64 = 0.1;

/// Whether `distance` matches the isotope spacing at charge 1 or 2
pub fn is_isotope_spacing(distance: f64) -> bool {
    (ISOTOPE_SPACING - distance).abs() < CHARGE_1_TOLERANCE
        || (ISOTOPE_SPACING / 2.0 - distance).abs() < CHARGE_2_TOLERANCE
}

/// Decide whether `shapes[index]` should be deconvolved. `shapes` must be sorted by position.
pub fn needs_deconvolution(shapes: &[PeakShape], index: usize, config: &PickerConfig) -> bool {
    let shape = &shapes[index];
    let fwhm = shape.full_width_at_half_max();
    if !(fwhm > config.deconvolution_fwhm_threshold
        || shape.symmetry() < config.deconvolution_asymmetry_floor)
    {
        return false;
    }

    let position = shape.position();
    let left = index
        .checked_sub(1)
        .map(|i| (position - shapes[i].position(), i))
        .filter(|(d, _)| *d < NEIGHBOR_RANGE);
    let right = shapes
        .get(index + 1)
        .map(|s| (s.position() - position, index + 1))
        .filter(|(d, _)| *d < NEIGHBOR_RANGE);

    match (left, right) {
        (Some((dl, _)), Some((dr, _))) => dl.min(dr) / dl.max(dr) < DISTANCE_RATIO,
        (Some((d, neighbor)), None) | (None, Some((d, neighbor))) => {
            if is_isotope_spacing(d) {
                shapes[neighbor].full_width_at_half_max() / fwhm < WIDTH_RATIO
            } else {
                true
            }
        }
        (None, None) => true,
    }
}

/// Whether the fitted `models` kept the spacing between adjacent `subpeaks` to
/// within [`MAX_SPACING_DRIFT`]
pub fn has_consistent_spacing(subpeaks: &[SubPeak], models: &[ShapeModel]) -> bool {
    subpeaks
        .windows(2)
        .zip(models.windows(2))
        .enumerate()
        .all(|(i, (found, fitted))| {
            let expected = found[1].mz - found[0].mz;
            let refined = (fitted[1].position() - fitted[0].position()).abs();
            if (expected - refined).abs() > MAX_SPACING_DRIFT {
                log::debug!(
                    "Sub-peaks {i} and {} moved from {expected:0.4} to {refined:0.4} apart",
                    i + 1
                );
                false
            } else {
                true
            }
        })
}

/// A local maximum of the sub-peak counting transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubPeak {
    /// The sample nearest the maximum
    pub index: usize,
    pub mz: f64,
    pub intensity: f32,
}

/// Deconvolves shapes against the unmodified signal they were picked from
#[derive(Debug, Clone)]
pub struct Deconvolver<'a> {
    pub mz_array: &'a [f64],
    pub intensity_array: &'a [f32],
    pub config: &'a PickerConfig,
    /// The wavelet threshold of the picking pass
    pub threshold: f64,
    pub intensity_floor: f32,
    cwt: ContinuousWaveletTransform,
}

impl<'a> Deconvolver<'a> {
    pub fn new(
        mz_array: &'a [f64],
        intensity_array: &'a [f32],
        config: &'a PickerConfig,
        threshold: f64,
        intensity_floor: f32,
    ) -> Self {
        // Charge 2 spacing halves the expected sub-peak width
        let cwt = ContinuousWaveletTransform::new(
            config.deconvolution_scaling / 2.0,
            config.wavelet_spacing,
        );
        Self {
            mz_array,
            intensity_array,
            config,
            threshold,
            intensity_floor,
            cwt,
        }
    }

    /// Find the sub-peaks within the span of `shape`
    pub fn count_subpeaks(&self, shape: &PeakShape) -> Vec<SubPeak> {
        let (left, right) = (shape.left_endpoint, shape.right_endpoint);
        if right <= left + 1 {
            return Vec::new();
        }
        let transform = self.cwt.transform(
            &self.mz_array[left..right],
            &self.intensity_array[left..right],
            SUBPEAK_RESOLUTION,
        );
        let n = transform.len();
        let mut subpeaks = Vec::new();
        for k in 1..n.saturating_sub(1) {
            if !(transform.is_local_maximum(k) && transform.value(k) > self.threshold) {
                continue;
            }
            let index = nearest_in(self.mz_array, transform.positions[k], left, right);
            let intensity = self.intensity_array[index];
            if intensity >= self.intensity_floor && index != left && index != right {
                subpeaks.push(SubPeak {
                    index,
                    mz: self.mz_array[index],
                    intensity,
                });
            }
        }
        subpeaks
    }

    fn problem_for(&self, shape: &PeakShape, initial: DVector<f64>) -> MultiPeakProblem {
        let (left, right) = (shape.left_endpoint, shape.right_endpoint);
        let mut mz = Vec::with_capacity(right - left + 3);
        let mut intensity = Vec::with_capacity(right - left + 3);
        mz.push(self.mz_array[left] - ANCHOR_OFFSET);
        intensity.push(0.0);
        mz.extend_from_slice(&self.mz_array[left..=right]);
        intensity.extend(self.intensity_array[left..=right].iter().map(|y| *y as f64));
        mz.push(self.mz_array[right] + ANCHOR_OFFSET);
        intensity.push(0.0);

        MultiPeakProblem::new(
            PeakShapeKind::Sech2,
            mz,
            intensity,
            initial,
            Penalties {
                position: self.config.deconvolution_penalty_position,
                left_width: self.config.deconvolution_penalty_left_width,
                right_width: self.config.deconvolution_penalty_right_width,
            },
        )
    }

    /// The starting point of the joint fit: the configured widths, then a height and
    /// position for each component, spread evenly between the outermost sub-peaks
    fn initial_parameters(&self, shape: &PeakShape, subpeaks: &[SubPeak]) -> DVector<f64> {
        let n_peaks = subpeaks.len();
        let (left, right) = (shape.left_endpoint, shape.right_endpoint);
        let first = subpeaks[0].mz;
        let last = subpeaks[n_peaks - 1].mz;
        let step = (last - first) / (n_peaks - 1) as f64;

        let mut initial = Vec::with_capacity(2 + 2 * n_peaks);
        initial.push(self.config.deconvolution_left_width);
        initial.push(self.config.deconvolution_right_width);
        for i in 0..n_peaks {
            let position = first + i as f64 * step;
            let index = nearest_in(self.mz_array, position, left, right);
            initial.push(self.intensity_array[index] as f64);
            initial.push(position);
        }
        DVector::from_vec(initial)
    }

    /// Split `shape` into its overlapping components. Returns `None` when there is
    /// nothing to split or the fit fails.
    pub fn deconvolve(&self, shape: &PeakShape) -> Option<Vec<PeakShape>> {
        let subpeaks = self.count_subpeaks(shape);
        let n_peaks = subpeaks.len();
        if n_peaks < 2 {
            log::trace!("Found {n_peaks} sub-peaks in {shape}, not deconvolving");
            return None;
        }
        let (left, right) = (shape.left_endpoint, shape.right_endpoint);
        let initial = self.initial_parameters(shape, &subpeaks);

        let problem = self.problem_for(shape, initial.clone());
        let solver = LevenbergMarquardt::new(
            self.config.deconvolution_fit_iterations,
            self.config.deconvolution_fit_eps_abs,
            self.config.deconvolution_fit_eps_rel,
        );
        let result = solver.minimize(&problem, initial);
        if !result.converged() {
            log::debug!(
                "Deconvolution of {shape} into {n_peaks} peaks ended with {:?} after {} iterations",
                result.status,
                result.iterations
            );
            return None;
        }

        let models = problem.models(&result.params);
        if !has_consistent_spacing(&subpeaks, &models) {
            log::debug!("Deconvolution of {shape} into {n_peaks} peaks changed their spacing");
            return None;
        }
        if !models.iter().all(|m| m.is_well_formed()) {
            log::debug!("Deconvolution of {shape} produced an empty component");
            return None;
        }

        let correlation = squared_correlation(self.mz_array, self.intensity_array, left, right, |x| {
            summed_density(&models, x)
        });
        log::debug!(
            "Deconvolved {shape} into {n_peaks} peaks in {} iterations, r²={correlation:0.4}",
            result.iterations
        );
        Some(
            models
                .into_iter()
                .map(|model| PeakShape {
                    model,
                    area: model.analytic_area(),
                    correlation,
                    signal_to_noise: shape.signal_to_noise,
                    left_endpoint: left,
                    right_endpoint: right,
                    retention_time: shape.retention_time,
                })
                .collect(),
        )
    }

    /// Replace every shape that needs it with its deconvolved components. `shapes`
    /// must be sorted by position; the output is re-sorted.
    pub fn deconvolve_all(&self, shapes: Vec<PeakShape>) -> Vec<PeakShape> {
        let mut out = Vec::with_capacity(shapes.len());
        for i in 0..shapes.len() {
            if needs_deconvolution(&shapes, i, self.config) {
                if let Some(parts) = self.deconvolve(&shapes[i]) {
                    out.extend(parts);
                    continue;
                }
            }
            out.push(shapes[i]);
        }
        out.sort_by(|a, b| a.position().total_cmp(&b.position()));
        out
    }
}
