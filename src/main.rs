use std::env;
use std::io;
use std::time::Instant;

use mzcwt::text;
use mzcwt::{PeakPickerCWT, PickerConfig};

/// Two overlapping peaks next to an isolated one, on a 0.005 m/z grid
fn synthetic_spectrum() -> (Vec<f64>, Vec<f32>) {
    let mz: Vec<f64> = (0..1201).map(|i| 498.0 + i as f64 * 0.005).collect();
    let lambda = 2.0 * (2.0f64.sqrt() + 1.0).ln() / 0.3;
    let peaks = [(500.0, 1000.0), (500.2, 1000.0), (502.0, 400.0)];
    let intensity = mz
        .iter()
        .map(|x| {
            peaks
                .iter()
                .map(|(center, height)| height / (lambda * (x - center)).min(300.0).cosh().powi(2))
                .sum::<f64>() as f32
        })
        .collect();
    (mz, intensity)
}

fn main() -> io::Result<()> {
    pretty_env_logger::init();

    let (mz_array, intensity_array) = match env::args().nth(1) {
        Some(path) => text::arrays_from_file(path)?,
        None => synthetic_spectrum(),
    };

    for deconvolution_enabled in [false, true] {
        let config = PickerConfig::default()
            .deconvolution_enabled(deconvolution_enabled)
            .deconvolution_fwhm_threshold(0.35)
            .deconvolution_left_width(5.0)
            .deconvolution_right_width(5.0);
        let picker = match PeakPickerCWT::new(config) {
            Ok(picker) => picker,
            Err(err) => {
                println!("Invalid configuration {:?}", err);
                return Ok(());
            }
        };
        let start = Instant::now();
        match picker.pick(&mz_array, &intensity_array, 1) {
            Ok(peaks) => {
                println!(
                    "Found {} peaks with deconvolution {} in {} milliseconds",
                    peaks.len(),
                    if deconvolution_enabled { "enabled" } else { "disabled" },
                    (Instant::now() - start).as_millis()
                );
                for peak in peaks.iter() {
                    println!("\t{}", peak);
                }
            }
            Err(err) => println!("Encountered error {:?}", err),
        }
    }
    Ok(())
}
