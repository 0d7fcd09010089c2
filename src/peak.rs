use std::fmt;

use mzpeaks::peak::MZPoint;
use mzpeaks::{CentroidLike, CoordinateLike, IndexedCoordinate, IntensityMeasurement};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::shape::{PeakShape, PeakShapeKind};

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
/// A [`PickedPeak`] implements the [`CentroidLike`](https://docs.rs/mzpeaks/latest/mzpeaks/peak/trait.CentroidLike.html) trait
/// with an m/z coordinate, and carries the shape model it was picked with.
///
/// The `intensity` of a picked peak is the area under its shape, not its apex height,
/// which is stored separately in `height`.
pub struct PickedPeak {
    pub mz: f64,
    pub intensity: f32,
    pub index: u32,

    /// A measure of the difference between the intensity of this peak and the
    /// surrounding data
    pub signal_to_noise: f32,
    pub full_width_at_half_max: f32,
    /// The left width parameter of the shape model
    pub left_width: f64,
    /// The right width parameter of the shape model
    pub right_width: f64,
    pub shape: PeakShapeKind,
    /// The squared correlation between the shape model and the signal
    pub correlation: f64,
    /// The apex height of the shape model
    pub height: f32,
    pub retention_time: Option<f64>,
}

impl PickedPeak {
    pub fn new(mz: f64, intensity: f32, index: u32, signal_to_noise: f32, full_width_at_half_max: f32) -> Self {
        Self {
            mz,
            intensity,
            index,
            signal_to_noise,
            full_width_at_half_max,
            ..Default::default()
        }
    }
}

mzpeaks::implement_mz_coord!(PickedPeak);

impl mzpeaks::IndexedCoordinate<mzpeaks::MZ> for PickedPeak {
    #[inline]
    fn get_index(&self) -> mzpeaks::IndexType {
        self.index
    }
    #[inline]
    fn set_index(&mut self, index: mzpeaks::IndexType) {
        self.index = index
    }
}

impl From<PickedPeak> for mzpeaks::CentroidPeak {
    fn from(peak: PickedPeak) -> Self {
        peak.as_centroid()
    }
}

impl From<PickedPeak> for mzpeaks::peak::MZPoint {
    fn from(peak: PickedPeak) -> Self {
        Self {
            mz: peak.coordinate(),
            intensity: peak.intensity(),
        }
    }
}

impl From<&PeakShape> for PickedPeak {
    fn from(shape: &PeakShape) -> Self {
        Self {
            mz: shape.position(),
            intensity: shape.area as f32,
            index: 0,
            signal_to_noise: shape.signal_to_noise,
            full_width_at_half_max: shape.full_width_at_half_max() as f32,
            left_width: shape.left_width(),
            right_width: shape.right_width(),
            shape: shape.kind(),
            correlation: shape.correlation,
            height: shape.height() as f32,
            retention_time: shape.retention_time,
        }
    }
}

/// Conversion from a [`mzpeaks::CentroidPeak`], which carries no shape
impl From<mzpeaks::CentroidPeak> for PickedPeak {
    fn from(peak: mzpeaks::CentroidPeak) -> Self {
        let mut inst = Self {
            mz: peak.coordinate(),
            intensity: peak.intensity(),
            ..Self::default()
        };
        inst.set_index(peak.index);
        inst
    }
}

impl From<MZPoint> for PickedPeak {
    fn from(value: MZPoint) -> Self {
        Self {
            mz: value.mz,
            intensity: value.intensity,
            index: value.get_index(),
            ..Default::default()
        }
    }
}

impl fmt::Display for PickedPeak {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PickedPeak({}, {}, {}, {}, {}, {})",
            self.mz, self.intensity, self.index, self.full_width_at_half_max, self.signal_to_noise, self.shape
        )
    }
}
