//! Closed-form peak shape fitting.
//!
//! Given a peak's apex height, endpoint intensities and the area of each side, the
//! Lorentzian and Sech² width parameters can be solved for directly. Both models are
//! scored against the raw samples and the better one is kept.
use crate::config::FitMode;
use crate::locate::PeakArea;
use crate::peak_statistics::{partial_areas, trapz};
use crate::shape::{LorentzianPeakShape, PeakShape, PeakShapeModel, Sech2PeakShape, ShapeModel};

/// The quantities both closed-form solutions are computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeFitInputs {
    pub height: f64,
    pub position: f64,
    pub left_intensity: f64,
    pub right_intensity: f64,
    pub left_area: f64,
    pub right_area: f64,
}

impl ShapeFitInputs {
    /// Split the peak at its apex sample
    pub fn at_apex(mz_array: &[f64], intensity_array: &[f32], area: &PeakArea) -> Self {
        let (left_area, right_area) =
            partial_areas(mz_array, intensity_array, area.left, area.apex, area.right);
        Self {
            height: intensity_array[area.apex] as f64,
            position: mz_array[area.apex],
            left_intensity: intensity_array[area.left] as f64,
            right_intensity: intensity_array[area.right] as f64,
            left_area,
            right_area,
        }
    }

    /// Split the peak at its centroid, placing the apex height there.
    ///
    /// Returns `None` if the centroid is missing or not strictly inside the peak.
    pub fn at_centroid(mz_array: &[f64], intensity_array: &[f32], area: &PeakArea) -> Option<Self> {
        let centroid = area.centroid?;
        if !(mz_array[area.left] < centroid && centroid < mz_array[area.right]) {
            return None;
        }
        let height = intensity_array[area.apex] as f64;
        // The last sample at or before the centroid
        let k = (area.left..area.right)
            .take_while(|k| mz_array[*k] <= centroid)
            .last()
            .unwrap_or(area.left);
        let left_area = trapz(mz_array, intensity_array, area.left, k)
            + (centroid - mz_array[k]) * (intensity_array[k] as f64 + height) / 2.0;
        let right_area = (mz_array[k + 1] - centroid) * (height + intensity_array[k + 1] as f64) / 2.0
            + trapz(mz_array, intensity_array, k + 1, area.right);
        Some(Self {
            height,
            position: centroid,
            left_intensity: intensity_array[area.left] as f64,
            right_intensity: intensity_array[area.right] as f64,
            left_area,
            right_area,
        })
    }

    /// Whether the closed forms are defined for these inputs
    pub fn is_valid(&self) -> bool {
        self.height > 0.0
            && self.left_intensity < self.height
            && self.right_intensity < self.height
            && self.left_area > 0.0
            && self.right_area > 0.0
    }

    pub fn lorentzian(&self) -> LorentzianPeakShape {
        LorentzianPeakShape::from_areas(
            self.height,
            self.position,
            self.left_intensity,
            self.right_intensity,
            self.left_area,
            self.right_area,
        )
    }

    pub fn sech2(&self) -> Sech2PeakShape {
        Sech2PeakShape::from_areas(
            self.height,
            self.position,
            self.left_intensity,
            self.right_intensity,
            self.left_area,
            self.right_area,
        )
    }
}

/// Fits peak shapes over a single profile
#[derive(Debug, Clone, Copy)]
pub struct ShapeFitter<'a> {
    pub mz_array: &'a [f64],
    pub intensity_array: &'a [f32],
    pub fit_mode: FitMode,
}

impl<'a> ShapeFitter<'a> {
    pub fn new(mz_array: &'a [f64], intensity_array: &'a [f32], fit_mode: FitMode) -> Self {
        Self {
            mz_array,
            intensity_array,
            fit_mode,
        }
    }

    fn inputs(&self, area: &PeakArea) -> Option<ShapeFitInputs> {
        let inputs = match self.fit_mode {
            FitMode::Apex => ShapeFitInputs::at_apex(self.mz_array, self.intensity_array, area),
            FitMode::Centroid => {
                ShapeFitInputs::at_centroid(self.mz_array, self.intensity_array, area)?
            }
        };
        inputs.is_valid().then_some(inputs)
    }

    /// Fit both shape models to `area` and keep the one that correlates better with the
    /// raw samples. A Sech² model with an undefined correlation always loses.
    ///
    /// The returned shape is positioned at the centroid of `area` when one is known.
    /// Returns `None` when the inputs are degenerate.
    pub fn fit(&self, area: &PeakArea) -> Option<PeakShape> {
        let inputs = self.inputs(area)?;
        let total_area = inputs.left_area + inputs.right_area;

        let lorentzian = ShapeModel::from(inputs.lorentzian());
        let sech2 = ShapeModel::from(inputs.sech2());
        let lorentzian_r = self.score(&lorentzian, area);
        let sech2_r = self.score(&sech2, area);

        let (mut model, correlation) = if lorentzian_r > sech2_r || sech2_r.is_nan() {
            (lorentzian, lorentzian_r)
        } else {
            (sech2, sech2_r)
        };
        if !model.is_well_formed() {
            log::trace!("Degenerate {} fit at {}", model.kind(), inputs.position);
            return None;
        }
        if let Some(centroid) = area.centroid {
            model.set_position(centroid);
        }
        let mut shape = PeakShape::new(model, total_area, area.left, area.right);
        shape.correlation = correlation;
        Some(shape)
    }

    fn score(&self, model: &ShapeModel, area: &PeakArea) -> f64 {
        model.correlation(self.mz_array, self.intensity_array, area.left, area.right)
    }
}
