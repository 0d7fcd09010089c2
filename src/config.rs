//! Configuration for [`PeakPickerCWT`](crate::PeakPickerCWT).
//!
//! All thresholds are collected in a single [`PickerConfig`]. It can be built
//! with struct update syntax or the chained setters:
//!
//! ```
//! use mzcwt::PickerConfig;
//!
//! let config = PickerConfig::default()
//!     .peak_width(0.1)
//!     .signal_to_noise(3.0)
//!     .deconvolution_enabled(true);
//! assert!(config.validate().is_ok());
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::peak_picker::PeakPickerError;

/// Where a peak shape is anchored when computing its closed-form widths
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitMode {
    /// Split the peak at its most intense sample
    #[default]
    Apex,
    /// Split the peak at its intensity-weighted centroid
    Centroid,
}

/// The parameters controlling wavelet peak picking, shape acceptance and deconvolution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PickerConfig {
    /// The minimum signal-to-noise ratio of a candidate apex
    pub signal_to_noise: f32,
    /// The minimum apex intensity of an MS1 peak
    pub peak_bound: f32,
    /// The minimum apex intensity of an MSn peak
    pub peak_bound_ms2: f32,
    /// The expected peak full width at half maximum, used as the wavelet scale
    pub peak_width: f64,
    /// The fraction of the apex intensity a sample must reach to contribute to the centroid
    pub centroid_percentage: f32,
    /// The minimum r² between a fitted shape and its raw samples
    pub correlation_floor: f64,
    /// The smallest accepted FWHM, as a multiple of `peak_width`
    pub fwhm_lower_factor: f64,
    /// The largest accepted FWHM, as a multiple of `peak_width`
    pub fwhm_upper_factor: f64,
    /// The number of samples either side of a wavelet maximum searched for the intensity apex
    pub search_radius: usize,
    /// The m/z step at which the wavelet kernel is tabulated
    pub wavelet_spacing: f64,
    /// The intensity below which the endpoint walk stops
    pub noise_level: f32,
    pub fit_mode: FitMode,
    /// Estimate `peak_width` from the data before picking a whole experiment
    pub estimate_peak_width: bool,

    pub deconvolution_enabled: bool,
    /// Shapes less symmetric than this are deconvolution candidates
    pub deconvolution_asymmetry_floor: f64,
    /// Shapes broader than this (in m/z) are deconvolution candidates
    pub deconvolution_fwhm_threshold: f64,
    /// The starting left width parameter λ of every deconvolved component. `1 / λ`
    /// is roughly its starting half width in m/z.
    pub deconvolution_left_width: f64,
    /// The starting right width parameter λ of every deconvolved component
    pub deconvolution_right_width: f64,
    /// The wavelet scale used to count sub-peaks for charge 1. It is halved for charge 2.
    pub deconvolution_scaling: f64,
    pub deconvolution_fit_iterations: usize,
    pub deconvolution_fit_eps_abs: f64,
    pub deconvolution_fit_eps_rel: f64,
    pub deconvolution_penalty_position: f64,
    pub deconvolution_penalty_left_width: f64,
    pub deconvolution_penalty_right_width: f64,

    /// Refine each accepted shape against its raw samples
    pub optimization_enabled: bool,
    pub optimization_penalty_position: f64,
    pub optimization_penalty_left_width: f64,
    pub optimization_penalty_right_width: f64,
    pub optimization_iterations: usize,
    pub optimization_eps_abs: f64,
    pub optimization_eps_rel: f64,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            signal_to_noise: 1.0,
            peak_bound: 10.0,
            peak_bound_ms2: 10.0,
            peak_width: 0.15,
            centroid_percentage: 0.8,
            correlation_floor: 0.5,
            fwhm_lower_factor: 0.7,
            fwhm_upper_factor: 20.0,
            search_radius: 3,
            wavelet_spacing: 0.001,
            noise_level: 0.1,
            fit_mode: FitMode::Apex,
            estimate_peak_width: false,
            deconvolution_enabled: false,
            deconvolution_asymmetry_floor: 0.3,
            deconvolution_fwhm_threshold: 0.7,
            deconvolution_left_width: 2.0,
            deconvolution_right_width: 2.0,
            deconvolution_scaling: 0.12,
            deconvolution_fit_iterations: 10,
            deconvolution_fit_eps_abs: 1e-5,
            deconvolution_fit_eps_rel: 1e-5,
            deconvolution_penalty_position: 0.0,
            deconvolution_penalty_left_width: 0.0,
            deconvolution_penalty_right_width: 0.0,
            optimization_enabled: false,
            optimization_penalty_position: 0.0,
            optimization_penalty_left_width: 1.0,
            optimization_penalty_right_width: 1.0,
            optimization_iterations: 400,
            optimization_eps_abs: 1e-5,
            optimization_eps_rel: 1e-5,
        }
    }
}

macro_rules! setter {
    ($(#[$meta:meta])* $name:ident: $t:ty) => {
        $(#[$meta])*
        pub fn $name(mut self, $name: $t) -> Self {
            self.$name = $name;
            self
        }
    };
}

impl PickerConfig {
    setter!(signal_to_noise: f32);
    setter!(peak_bound: f32);
    setter!(peak_bound_ms2: f32);
    setter!(
        /// Also the scale of the wavelet transform
        peak_width: f64
    );
    setter!(centroid_percentage: f32);
    setter!(correlation_floor: f64);
    setter!(fwhm_lower_factor: f64);
    setter!(fwhm_upper_factor: f64);
    setter!(search_radius: usize);
    setter!(wavelet_spacing: f64);
    setter!(noise_level: f32);
    setter!(fit_mode: FitMode);
    setter!(estimate_peak_width: bool);
    setter!(deconvolution_enabled: bool);
    setter!(deconvolution_asymmetry_floor: f64);
    setter!(deconvolution_fwhm_threshold: f64);
    setter!(deconvolution_left_width: f64);
    setter!(deconvolution_right_width: f64);
    setter!(deconvolution_scaling: f64);
    setter!(deconvolution_fit_iterations: usize);
    setter!(deconvolution_fit_eps_abs: f64);
    setter!(deconvolution_fit_eps_rel: f64);
    setter!(deconvolution_penalty_position: f64);
    setter!(deconvolution_penalty_left_width: f64);
    setter!(deconvolution_penalty_right_width: f64);
    setter!(optimization_enabled: bool);
    setter!(optimization_penalty_position: f64);
    setter!(optimization_penalty_left_width: f64);
    setter!(optimization_penalty_right_width: f64);
    setter!(optimization_iterations: usize);
    setter!(optimization_eps_abs: f64);
    setter!(optimization_eps_rel: f64);

    /// The intensity floor for a scan of the given MS level
    pub fn intensity_floor(&self, ms_level: u8) -> f32 {
        if ms_level > 1 {
            self.peak_bound_ms2
        } else {
            self.peak_bound
        }
    }

    /// The accepted FWHM interval in m/z
    pub fn fwhm_bounds(&self) -> (f64, f64) {
        (
            self.fwhm_lower_factor * self.peak_width,
            self.fwhm_upper_factor * self.peak_width,
        )
    }

    /// Check that every parameter is usable, returning
    /// [`PeakPickerError::InvalidConfiguration`] naming the first that is not.
    pub fn validate(&self) -> Result<(), PeakPickerError> {
        fn invalid(name: &str, reason: &str) -> Result<(), PeakPickerError> {
            Err(PeakPickerError::InvalidConfiguration(format!(
                "{name} {reason}"
            )))
        }

        if !(self.peak_width.is_finite() && self.peak_width > 0.0) {
            return invalid("peak_width", "must be a positive number");
        }
        if !(self.wavelet_spacing.is_finite() && self.wavelet_spacing > 0.0) {
            return invalid("wavelet_spacing", "must be a positive number");
        }
        if !(self.centroid_percentage > 0.0 && self.centroid_percentage <= 1.0) {
            return invalid("centroid_percentage", "must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.correlation_floor) {
            return invalid("correlation_floor", "must be in [0, 1]");
        }
        if !(self.fwhm_lower_factor >= 0.0 && self.fwhm_lower_factor <= self.fwhm_upper_factor) {
            return invalid("fwhm_lower_factor", "must be non-negative and below fwhm_upper_factor");
        }
        if self.peak_bound < 0.0 || self.peak_bound_ms2 < 0.0 {
            return invalid("peak_bound", "must be non-negative");
        }
        if self.signal_to_noise < 0.0 {
            return invalid("signal_to_noise", "must be non-negative");
        }
        if self.noise_level < 0.0 {
            return invalid("noise_level", "must be non-negative");
        }
        if self.deconvolution_enabled {
            if !(self.deconvolution_scaling > 0.0) {
                return invalid("deconvolution_scaling", "must be a positive number");
            }
            if !(self.deconvolution_left_width > 0.0 && self.deconvolution_right_width > 0.0) {
                return invalid("deconvolution_left_width", "and deconvolution_right_width must be positive");
            }
            if self.deconvolution_fit_iterations == 0 {
                return invalid("deconvolution_fit_iterations", "must be at least 1");
            }
        }
        if self.optimization_enabled && self.optimization_iterations == 0 {
            return invalid("optimization_iterations", "must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_are_valid() {
        let config = PickerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fwhm_bounds(), (0.7 * 0.15, 20.0 * 0.15));
        assert_eq!(config.intensity_floor(1), 10.0);
    }

    #[test]
    fn test_setters_chain() {
        let config = PickerConfig::default()
            .peak_bound(50.0)
            .peak_bound_ms2(5.0)
            .fit_mode(FitMode::Centroid);
        assert_eq!(config.intensity_floor(1), 50.0);
        assert_eq!(config.intensity_floor(2), 5.0);
        assert_eq!(config.fit_mode, FitMode::Centroid);
    }

    #[rstest]
    #[case(PickerConfig::default().peak_width(0.0))]
    #[case(PickerConfig::default().peak_width(f64::NAN))]
    #[case(PickerConfig::default().wavelet_spacing(-1.0))]
    #[case(PickerConfig::default().signal_to_noise(-1.0))]
    #[case(PickerConfig::default().centroid_percentage(1.5))]
    #[case(PickerConfig::default().correlation_floor(2.0))]
    #[case(PickerConfig::default().fwhm_lower_factor(30.0))]
    #[case(PickerConfig::default().deconvolution_enabled(true).deconvolution_fit_iterations(0))]
    fn test_invalid_configurations(#[case] config: PickerConfig) {
        assert!(matches!(
            config.validate(),
            Err(PeakPickerError::InvalidConfiguration(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_round_trip() {
        let config = PickerConfig::default()
            .deconvolution_enabled(true)
            .fit_mode(FitMode::Centroid);
        let text = serde_json::to_string(&config).unwrap();
        let dup: PickerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(config, dup);
    }
}
