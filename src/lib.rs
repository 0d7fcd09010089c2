//! `mzcwt` is a library for picking peaks from profile-mode mass spectra with a
//! continuous wavelet transform, and for separating peaks that overlap.
//!
//! The peak picking facility is [`PeakPickerCWT`]. It locates candidate peaks as maxima
//! of a Marr wavelet transform whose scale matches the expected peak width, delimits
//! each one in the raw signal, and fits an asymmetric Lorentzian or Sech² shape to it.
//! Only shapes that correlate well with the signal and have a plausible width are
//! reported. See [`PickerConfig`] for the thresholds involved.
//!
//! Broad or lopsided shapes can optionally be deconvolved into several Sech² peaks with
//! a bounded Levenberg-Marquardt fit, see the [`crate::deconvolution`] sub-module.
//!
//! # Usage
//! ```
//! use mzcwt::{PeakPickerCWT, PickerConfig};
//!
//! let mz_array: Vec<f64> = (0..801).map(|i| 498.0 + i as f64 * 0.005).collect();
//! let intensity_array: Vec<f32> = mz_array
//!     .iter()
//!     .map(|x| (1000.0 / (8.8 * (x - 500.0)).cosh().powi(2)) as f32)
//!     .collect();
//!
//! let picker = PeakPickerCWT::new(PickerConfig::default()).unwrap();
//! let peaks = picker.pick(&mz_array, &intensity_array, 1).unwrap();
//! assert_eq!(peaks.len(), 1);
//! for peak in peaks.iter() {
//!     println!("{}", peak);
//! }
//! ```
//! ## Features
//! - `parallelism` (default) picks the scans of [`PeakPickerCWT::pick_experiment`] in parallel with `rayon`
//! - `serde` derives serialization for the configuration and output types
//! - `cli` builds the `mzcwt` demo binary
pub mod config;
pub mod deconvolution;
pub mod fit;
pub mod locate;
pub mod noise;
pub mod optimize;
pub mod peak;
pub mod peak_picker;
pub mod peak_statistics;
pub mod search;
pub mod shape;
pub mod snr;
pub mod text;
pub mod wavelet;
pub mod width;

#[cfg(test)]
mod test_data;

pub use crate::config::{FitMode, PickerConfig};
pub use crate::peak::PickedPeak;
pub use crate::peak_picker::{pick_peaks, PeakPickerCWT, PeakPickerError, ProfileSignal};
pub use crate::shape::{PeakShape, PeakShapeKind};
pub use crate::snr::{MeanIterativeSignalToNoise, SignalToNoise};
pub use crate::width::estimate_peak_width;
