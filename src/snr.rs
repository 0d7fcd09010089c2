//! Signal-to-noise estimation for candidate apexes.
//!
//! The peak picker asks a [`SignalToNoise`] provider for the ratio at each candidate
//! apex. [`MeanIterativeSignalToNoise`] is the default provider; any closure mapping a
//! sample index to a ratio can be used instead.
use num_traits::Float;

use crate::search::find_between;

/// A source of signal-to-noise ratios for the samples of one spectrum
pub trait SignalToNoise {
    /// The signal-to-noise ratio of the sample at `index`
    fn signal_to_noise(&self, index: usize) -> f32;
}

impl<F: Fn(usize) -> f32> SignalToNoise for F {
    fn signal_to_noise(&self, index: usize) -> f32 {
        (self)(index)
    }
}

/// Estimate the noise in sliding m/z windows using an iteratively clipped mean.
///
/// Windows of `window_length` m/z are centered every half window. Within a window,
/// intensities more than `stdev_multiplier` standard deviations above the mean are
/// discarded until the mean stops changing, and the remaining mean is the noise
/// level. A sample's noise is interpolated between the two nearest window centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanIterativeSignalToNoise {
    pub window_length: f64,
    pub stdev_multiplier: f64,
    /// Windows with fewer samples than this report `noise_for_empty_window`
    pub min_required_elements: usize,
    pub noise_for_empty_window: f64,
    pub minimum_noise: f64,
    pub max_rounds: usize,
}

impl Default for MeanIterativeSignalToNoise {
    fn default() -> Self {
        Self {
            window_length: 200.0,
            stdev_multiplier: 3.0,
            min_required_elements: 10,
            noise_for_empty_window: 1e20,
            minimum_noise: 1.0,
            max_rounds: 10,
        }
    }
}

/// Per-sample signal-to-noise ratios for one spectrum
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalToNoiseProfile {
    pub ratios: Vec<f32>,
}

impl SignalToNoise for SignalToNoiseProfile {
    fn signal_to_noise(&self, index: usize) -> f32 {
        self.ratios.get(index).copied().unwrap_or(0.0)
    }
}

/// The mean of `values` after iteratively discarding high outliers
pub fn clipped_mean<T: Float>(values: &[T], stdev_multiplier: f64, max_rounds: usize) -> f64 {
    let mut kept: Vec<f64> = values.iter().filter_map(|v| v.to_f64()).collect();
    let mut mean = 0.0;
    for _ in 0..max_rounds.max(1) {
        if kept.is_empty() {
            break;
        }
        let n = kept.len() as f64;
        mean = kept.iter().sum::<f64>() / n;
        let variance = kept.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let cutoff = mean + stdev_multiplier * variance.sqrt();
        let before = kept.len();
        kept.retain(|v| *v <= cutoff);
        if kept.len() == before {
            break;
        }
    }
    mean
}

impl MeanIterativeSignalToNoise {
    pub fn new(window_length: f64, stdev_multiplier: f64, min_required_elements: usize) -> Self {
        Self {
            window_length,
            stdev_multiplier,
            min_required_elements,
            ..Self::default()
        }
    }

    fn window_noise(&self, mz_array: &[f64], intensity_array: &[f32], center: f64) -> f64 {
        let half = self.window_length / 2.0;
        let (lo, hi) = find_between(mz_array, center - half, center + half);
        let window = &intensity_array[lo..hi];
        if window.len() < self.min_required_elements {
            return self.noise_for_empty_window;
        }
        clipped_mean(window, self.stdev_multiplier, self.max_rounds).max(self.minimum_noise)
    }

    /// Compute the noise level of each sample
    pub fn noise_levels(&self, mz_array: &[f64], intensity_array: &[f32]) -> Vec<f64> {
        let (first, last) = match (mz_array.first(), mz_array.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Vec::new(),
        };
        let step = self.window_length / 2.0;
        let n_windows = ((last - first) / step).floor() as usize + 2;
        let centers: Vec<f64> = (0..n_windows).map(|k| first + k as f64 * step).collect();
        let noise: Vec<f64> = centers
            .iter()
            .map(|c| self.window_noise(mz_array, intensity_array, *c))
            .collect();
        log::trace!("Estimated noise in {} windows", centers.len());

        mz_array
            .iter()
            .map(|x| {
                let k = (((x - first) / step).floor() as usize).min(n_windows - 2);
                let t = ((x - centers[k]) / step).clamp(0.0, 1.0);
                noise[k] + (noise[k + 1] - noise[k]) * t
            })
            .collect()
    }

    /// Compute the signal-to-noise ratio of each sample
    pub fn estimate(&self, mz_array: &[f64], intensity_array: &[f32]) -> SignalToNoiseProfile {
        let ratios = self
            .noise_levels(mz_array, intensity_array)
            .into_iter()
            .zip(intensity_array.iter())
            .map(|(noise, y)| (*y as f64 / noise) as f32)
            .collect();
        SignalToNoiseProfile { ratios }
    }
}
