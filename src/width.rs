//! Estimating the typical peak width of an experiment.
//!
//! The most intense scans are picked at a ladder of decreasing wavelet scales. As the
//! scale shrinks the number of peaks found rises steeply and then levels off, once the
//! scale is narrower than the real peaks. The mean FWHM of the peaks found just past
//! that knee is the estimate.
#[cfg(feature = "parallelism")]
use rayon::prelude::*;

use crate::config::PickerConfig;
use crate::peak_picker::{PeakPickerCWT, PeakPickerError, ProfileSignal};
use crate::snr::MeanIterativeSignalToNoise;

/// The wavelet scales tried, widest first
pub const CANDIDATE_WIDTHS: [f64; 14] = [
    1.0, 0.5, 0.25, 0.125, 0.1, 0.05, 0.025, 0.0125, 0.01, 0.005, 0.0025, 0.00125, 0.0005, 0.0001,
];

/// How many of the most intense scans are examined
const N_SCANS: usize = 3;
/// The signal-to-noise threshold used while probing
const PROBE_SIGNAL_TO_NOISE: f32 = 10.0;
/// The slope must fall below this fraction of the steepest slope to mark the knee
const KNEE_RATIO: f64 = 0.5;

/// The number of peaks and their mean FWHM at one scale
#[derive(Debug, Clone, Copy, PartialEq)]
struct WidthProbe {
    count: usize,
    mean_fwhm: f64,
}

fn probe(config: &PickerConfig, scan: &ProfileSignal, width: f64) -> Result<WidthProbe, PeakPickerError> {
    let config = config
        .clone()
        .peak_width(width)
        .signal_to_noise(PROBE_SIGNAL_TO_NOISE)
        .deconvolution_enabled(false)
        .optimization_enabled(false)
        .estimate_peak_width(false);
    let picker = PeakPickerCWT::new(config)?;
    let snr = MeanIterativeSignalToNoise::default().estimate(scan.mz_array(), scan.intensity_array());
    let shapes = picker.pick_shapes(scan, &snr);
    let count = shapes.len();
    let mean_fwhm = if count > 0 {
        shapes.iter().map(|s| s.full_width_at_half_max()).sum::<f64>() / count as f64
    } else {
        f64::NAN
    };
    log::trace!("Found {count} peaks with mean FWHM {mean_fwhm:0.5} at scale {width}");
    Ok(WidthProbe { count, mean_fwhm })
}

cfg_if::cfg_if! {
    if #[cfg(feature = "parallelism")] {
        fn probe_all(config: &PickerConfig, scan: &ProfileSignal) -> Result<Vec<WidthProbe>, PeakPickerError> {
            CANDIDATE_WIDTHS.par_iter().map(|w| probe(config, scan, *w)).collect()
        }
    } else {
        fn probe_all(config: &PickerConfig, scan: &ProfileSignal) -> Result<Vec<WidthProbe>, PeakPickerError> {
            CANDIDATE_WIDTHS.iter().map(|w| probe(config, scan, *w)).collect()
        }
    }
}

/// Find the knee of the peak count curve and return the mean FWHM just past it
fn knee_width(probes: &[WidthProbe]) -> Option<f64> {
    let slopes: Vec<f64> = probes
        .windows(2)
        .zip(CANDIDATE_WIDTHS.windows(2))
        .map(|(p, w)| (p[0].count as f64 - p[1].count as f64) / (w[0] - w[1]))
        .collect();
    let steepest = slopes.iter().copied().fold(f64::INFINITY, f64::min);
    if !(steepest < 0.0) {
        return None;
    }
    let mut found = false;
    for (i, slope) in slopes.iter().enumerate() {
        if (slope - steepest).abs() < 0.01 {
            found = true;
        }
        if found && slope / steepest < KNEE_RATIO {
            let width = probes[i + 1].mean_fwhm;
            return width.is_finite().then_some(width);
        }
    }
    None
}

/// Estimate the peak width of an experiment from its most intense scans.
///
/// Returns [`PeakPickerError::NoUsableSpectrum`] if no scan has any signal, and
/// [`PeakPickerError::PeakWidthNotEstimated`] if no scan shows a clear knee.
pub fn estimate_peak_width(config: &PickerConfig, scans: &[ProfileSignal]) -> Result<f64, PeakPickerError> {
    let mut ranked: Vec<(f64, &ProfileSignal)> = scans
        .iter()
        .map(|s| (s.total_ion_current(), s))
        .filter(|(tic, s)| *tic > 0.0 && s.len() >= 4)
        .collect();
    if ranked.is_empty() {
        return Err(PeakPickerError::NoUsableSpectrum);
    }
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut widths = Vec::new();
    for (tic, scan) in ranked.into_iter().take(N_SCANS) {
        let probes = probe_all(config, scan)?;
        match knee_width(&probes) {
            Some(width) => {
                log::debug!("Scan with TIC {tic:0.2} has peak width {width:0.5}");
                widths.push(width);
            }
            None => {
                log::debug!("Scan with TIC {tic:0.2} has no clear peak width");
            }
        }
    }
    if widths.is_empty() {
        return Err(PeakPickerError::PeakWidthNotEstimated);
    }
    Ok(widths.iter().sum::<f64>() / widths.len() as f64)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_data::{grid, sech2_ladder};

    #[test_log::test]
    fn test_estimate_ladder_width() {
        let (mz, intensity) = sech2_ladder();
        let scan = ProfileSignal::new(mz, intensity).unwrap();
        let width = estimate_peak_width(&PickerConfig::default(), &[scan]).unwrap();
        assert!((width - 0.1).abs() < 0.005, "{width}");
    }

    #[test]
    fn test_brightest_scans_are_used() {
        let (mz, intensity) = sech2_ladder();
        let bright = ProfileSignal::new(mz.clone(), intensity.clone()).unwrap();
        let dim: Vec<f32> = intensity.iter().map(|y| y / 100.0).collect();
        let dim = ProfileSignal::new(mz, dim).unwrap();
        let width = estimate_peak_width(&PickerConfig::default(), &[dim, bright]).unwrap();
        assert!(width.is_finite());
    }

    #[test]
    fn test_no_usable_spectrum() {
        let mz = grid(400.0, 401.0, 0.005);
        let empty = ProfileSignal::new(mz.clone(), vec![0.0; mz.len()]).unwrap();
        assert_eq!(
            estimate_peak_width(&PickerConfig::default(), &[empty]),
            Err(PeakPickerError::NoUsableSpectrum)
        );
        assert_eq!(
            estimate_peak_width(&PickerConfig::default(), &[]),
            Err(PeakPickerError::NoUsableSpectrum)
        );
    }

    #[test]
    fn test_knee_width() {
        let probe = |count: usize, mean_fwhm: f64| WidthProbe { count, mean_fwhm };
        let mut probes = vec![probe(0, f64::NAN); CANDIDATE_WIDTHS.len()];
        // The count rises sharply between 0.25 and 0.125, then levels off
        probes[3] = probe(20, 0.12);
        for p in probes.iter_mut().skip(4) {
            *p = probe(21, 0.11);
        }
        assert_eq!(knee_width(&probes), Some(0.11));
        let flat = vec![probe(5, 0.1); CANDIDATE_WIDTHS.len()];
        assert_eq!(knee_width(&flat), None);
    }
}
