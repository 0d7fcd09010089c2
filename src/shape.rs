//! Asymmetric peak shape models.
//!
//! Both models are split at their position, using a separate width parameter on each
//! side. A larger width parameter means a narrower side.
//!
//! | model      | density                           | FWHM                              |
//! |------------|-----------------------------------|-----------------------------------|
//! | Lorentzian | `h / (1 + (λ(x - x₀))²)`          | `1/λₗ + 1/λᵣ`                     |
//! | Sech²      | `h / cosh²(λ(x - x₀))`            | `ln(√2 + 1)·(1/λₗ + 1/λᵣ)`        |
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::peak_statistics::squared_correlation;

/// `ln(√2 + 1)`, where `sech²` falls to one half
pub const SECH2_HALF_MAX: f64 = 0.881373587019543;

/// The argument past which `cosh²` overflows and the Sech² density is treated as zero
const SECH2_CUTOFF: f64 = 350.0;

/// The family of a peak shape
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeakShapeKind {
    Lorentzian,
    #[default]
    Sech2,
}

impl fmt::Display for PeakShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lorentzian => f.write_str("Lorentzian"),
            Self::Sech2 => f.write_str("Sech2"),
        }
    }
}

/// Shared behavior of the peak shape models
pub trait PeakShapeModel {
    fn height(&self) -> f64;
    fn position(&self) -> f64;
    fn left_width(&self) -> f64;
    fn right_width(&self) -> f64;

    /// The model intensity at `x`
    fn density(&self, x: f64) -> f64;

    fn full_width_at_half_max(&self) -> f64;

    /// The closed-form area under the model
    fn analytic_area(&self) -> f64;

    /// The width parameter governing the side of the peak `x` falls on
    #[inline]
    fn width_at(&self, x: f64) -> f64 {
        if x <= self.position() {
            self.left_width()
        } else {
            self.right_width()
        }
    }

    /// The ratio of the smaller width parameter to the larger one, in `(0, 1]`
    fn symmetry(&self) -> f64 {
        let (l, r) = (self.left_width(), self.right_width());
        l.min(r) / l.max(r)
    }

    fn predict(&self, mz_array: &[f64]) -> Vec<f64> {
        mz_array.iter().map(|x| self.density(*x)).collect()
    }

    /// The squared correlation between the model and the observed samples
    /// in the inclusive index range `[left, right]`
    fn correlation(&self, mz_array: &[f64], intensity_array: &[f32], left: usize, right: usize) -> f64 {
        squared_correlation(mz_array, intensity_array, left, right, |x| self.density(x))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LorentzianPeakShape {
    pub height: f64,
    pub position: f64,
    pub left_width: f64,
    pub right_width: f64,
}

impl LorentzianPeakShape {
    pub fn new(height: f64, position: f64, left_width: f64, right_width: f64) -> Self {
        Self {
            height,
            position,
            left_width,
            right_width,
        }
    }

    /// Solve for the width parameters from the apex height, the endpoint intensities and the
    /// partial areas of each side
    pub fn from_areas(
        height: f64,
        position: f64,
        left_intensity: f64,
        right_intensity: f64,
        left_area: f64,
        right_area: f64,
    ) -> Self {
        let width = |endpoint: f64, area: f64| {
            // atan(sqrt(h / 0 - 1)) -> pi / 2
            let t = if endpoint > 0.0 {
                (height / endpoint - 1.0).sqrt().atan()
            } else {
                std::f64::consts::FRAC_PI_2
            };
            height / area * t
        };
        Self::new(
            height,
            position,
            width(left_intensity, left_area),
            width(right_intensity, right_area),
        )
    }
}

impl PeakShapeModel for LorentzianPeakShape {
    fn height(&self) -> f64 {
        self.height
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn left_width(&self) -> f64 {
        self.left_width
    }

    fn right_width(&self) -> f64 {
        self.right_width
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        let z = self.width_at(x) * (x - self.position);
        self.height / (1.0 + z * z)
    }

    fn full_width_at_half_max(&self) -> f64 {
        self.left_width.recip() + self.right_width.recip()
    }

    /// The area down to where the density reaches one intensity unit
    fn analytic_area(&self) -> f64 {
        if self.height <= 1.0 {
            return 0.0;
        }
        let t = (self.height - 1.0).sqrt().atan();
        self.height / self.left_width * t + self.height / self.right_width * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sech2PeakShape {
    pub height: f64,
    pub position: f64,
    pub left_width: f64,
    pub right_width: f64,
}

impl Sech2PeakShape {
    pub fn new(height: f64, position: f64, left_width: f64, right_width: f64) -> Self {
        Self {
            height,
            position,
            left_width,
            right_width,
        }
    }

    /// Solve for the width parameters from the apex height, the endpoint intensities and the
    /// partial areas of each side
    pub fn from_areas(
        height: f64,
        position: f64,
        left_intensity: f64,
        right_intensity: f64,
        left_area: f64,
        right_area: f64,
    ) -> Self {
        Self::new(
            height,
            position,
            height / left_area * (1.0 - left_intensity / height).sqrt(),
            height / right_area * (1.0 - right_intensity / height).sqrt(),
        )
    }

    /// The value of `sech²(z)`, and `tanh(z)`, at `z`
    #[inline]
    pub(crate) fn sech2_tanh(z: f64) -> (f64, f64) {
        if z.abs() > SECH2_CUTOFF {
            (0.0, z.signum())
        } else {
            let c = z.cosh();
            ((c * c).recip(), z.tanh())
        }
    }
}

impl PeakShapeModel for Sech2PeakShape {
    fn height(&self) -> f64 {
        self.height
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn left_width(&self) -> f64 {
        self.left_width
    }

    fn right_width(&self) -> f64 {
        self.right_width
    }

    #[inline]
    fn density(&self, x: f64) -> f64 {
        let z = self.width_at(x) * (x - self.position);
        self.height * Self::sech2_tanh(z).0
    }

    fn full_width_at_half_max(&self) -> f64 {
        SECH2_HALF_MAX * (self.left_width.recip() + self.right_width.recip())
    }

    fn analytic_area(&self) -> f64 {
        self.height / self.left_width + self.height / self.right_width
    }
}

/// Either of the two peak shape models
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeModel {
    Lorentzian(LorentzianPeakShape),
    Sech2(Sech2PeakShape),
}

macro_rules! dispatch_shape {
    ($d:ident, $r:ident, $e:expr) => {
        match $d {
            ShapeModel::Lorentzian($r) => $e,
            ShapeModel::Sech2($r) => $e,
        }
    };
}

impl ShapeModel {
    pub fn kind(&self) -> PeakShapeKind {
        match self {
            Self::Lorentzian(_) => PeakShapeKind::Lorentzian,
            Self::Sech2(_) => PeakShapeKind::Sech2,
        }
    }

    /// Build a model of `kind` from its parameters
    pub fn from_kind(
        kind: PeakShapeKind,
        height: f64,
        position: f64,
        left_width: f64,
        right_width: f64,
    ) -> Self {
        match kind {
            PeakShapeKind::Lorentzian => {
                LorentzianPeakShape::new(height, position, left_width, right_width).into()
            }
            PeakShapeKind::Sech2 => {
                Sech2PeakShape::new(height, position, left_width, right_width).into()
            }
        }
    }

    pub fn set_position(&mut self, position: f64) {
        dispatch_shape!(self, p, p.position = position)
    }

    /// Whether every parameter is finite and the height and widths are positive
    pub fn is_well_formed(&self) -> bool {
        let (h, x, l, r) = (
            self.height(),
            self.position(),
            self.left_width(),
            self.right_width(),
        );
        h.is_finite() && x.is_finite() && l.is_finite() && r.is_finite() && h > 0.0 && l > 0.0 && r > 0.0
    }
}

impl From<LorentzianPeakShape> for ShapeModel {
    fn from(value: LorentzianPeakShape) -> Self {
        Self::Lorentzian(value)
    }
}

impl From<Sech2PeakShape> for ShapeModel {
    fn from(value: Sech2PeakShape) -> Self {
        Self::Sech2(value)
    }
}

impl PeakShapeModel for ShapeModel {
    fn height(&self) -> f64 {
        dispatch_shape!(self, p, p.height)
    }

    fn position(&self) -> f64 {
        dispatch_shape!(self, p, p.position)
    }

    fn left_width(&self) -> f64 {
        dispatch_shape!(self, p, p.left_width)
    }

    fn right_width(&self) -> f64 {
        dispatch_shape!(self, p, p.right_width)
    }

    fn density(&self, x: f64) -> f64 {
        dispatch_shape!(self, p, p.density(x))
    }

    fn full_width_at_half_max(&self) -> f64 {
        dispatch_shape!(self, p, p.full_width_at_half_max())
    }

    fn analytic_area(&self) -> f64 {
        dispatch_shape!(self, p, p.analytic_area())
    }
}

/// A fitted peak shape together with how well it describes the raw signal and
/// where that signal was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeakShape {
    pub model: ShapeModel,
    /// The area of the peak in the raw signal, or of the model for deconvolved peaks
    pub area: f64,
    /// The squared correlation between the model and the raw signal
    pub correlation: f64,
    pub signal_to_noise: f32,
    /// The first sample of the originating profile belonging to this peak
    pub left_endpoint: usize,
    /// The last sample of the originating profile belonging to this peak
    pub right_endpoint: usize,
    pub retention_time: Option<f64>,
}

impl PeakShape {
    pub fn new(model: ShapeModel, area: f64, left_endpoint: usize, right_endpoint: usize) -> Self {
        Self {
            model,
            area,
            correlation: 0.0,
            signal_to_noise: 0.0,
            left_endpoint,
            right_endpoint,
            retention_time: None,
        }
    }

    pub fn kind(&self) -> PeakShapeKind {
        self.model.kind()
    }

    pub fn height(&self) -> f64 {
        self.model.height()
    }

    pub fn position(&self) -> f64 {
        self.model.position()
    }

    pub fn left_width(&self) -> f64 {
        self.model.left_width()
    }

    pub fn right_width(&self) -> f64 {
        self.model.right_width()
    }

    pub fn full_width_at_half_max(&self) -> f64 {
        self.model.full_width_at_half_max()
    }

    pub fn symmetry(&self) -> f64 {
        self.model.symmetry()
    }

    pub fn density(&self, x: f64) -> f64 {
        self.model.density(x)
    }
}

impl fmt::Display for PeakShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PeakShape({}, {:0.4}, {:0.2}, fwhm={:0.4}, r²={:0.4}, [{}, {}])",
            self.kind(),
            self.position(),
            self.height(),
            self.full_width_at_half_max(),
            self.correlation,
            self.left_endpoint,
            self.right_endpoint,
        )
    }
}
