//! Locating peak apexes and endpoints with the help of a wavelet transform.
//!
//! The search works on a [`SearchRegion`], a half-open range of sample indices that
//! shrinks from the left as peaks are consumed. Transform values are read through the
//! [`WaveletTransform`] accessors so that sample `j` maps to buffer slot `j + 1`.
use std::ops::Range;

use crate::wavelet::WaveletTransform;

/// The direction in which to scan for the next maximum
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// A half-open range of sample indices still open to the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRegion {
    start: usize,
    end: usize,
}

impl SearchRegion {
    /// Create a region over `range`, clamped to a signal of `len` samples
    pub fn new(range: Range<usize>, len: usize) -> Self {
        let end = range.end.min(len);
        let start = range.start.min(end);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// The last index in the region
    pub fn last(&self) -> Option<usize> {
        self.end.checked_sub(1).filter(|i| *i >= self.start)
    }

    /// Whether `index` is the first or last sample of the region
    pub fn is_border(&self, index: usize) -> bool {
        index == self.start || Some(index) == self.last()
    }

    /// Move the start of the region up to `index`. The region never grows.
    pub fn advance_to(&mut self, index: usize) {
        self.start = index.clamp(self.start, self.end);
    }
}

/// The sample indices delimiting one peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakArea {
    pub left: usize,
    pub apex: usize,
    pub right: usize,
    /// The intensity-weighted centroid, once computed
    pub centroid: Option<f64>,
}

impl PeakArea {
    /// Returns `None` unless `left < apex < right`
    pub fn new(left: usize, apex: usize, right: usize) -> Option<Self> {
        if left < apex && apex < right {
            Some(Self {
                left,
                apex,
                right,
                centroid: None,
            })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn span(&self) -> Range<usize> {
        self.left..(self.right + 1)
    }
}

/// Parameters controlling the apex and endpoint search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorParams {
    /// The wavelet-domain threshold a maximum must exceed
    pub threshold: f64,
    /// The intensity the refined apex must reach
    pub intensity_floor: f32,
    pub search_radius: usize,
    /// The intensity below which the endpoint walk stops
    pub noise_level: f32,
    /// The wavelet scale, used to decide whether a rise belongs to a neighboring peak
    pub scale: f64,
}

/// Find the next wavelet maximum above the threshold whose refined apex is intense
/// enough and not on the region border.
///
/// Candidates are transform values strictly greater than both neighbors. The apex is the
/// most intense sample within `search_radius` of the candidate, clamped to the region.
pub fn find_next_maximum(
    intensity_array: &[f32],
    region: &SearchRegion,
    transform: &WaveletTransform,
    params: &LocatorParams,
    direction: Direction,
) -> Option<usize> {
    if region.len() < 3 {
        return None;
    }
    let last = region.end() - 1;
    let candidates = (region.start() + 1)..last;
    let check = |j: usize| -> Option<usize> {
        if !(transform.is_local_maximum(j) && transform.value(j) > params.threshold) {
            return None;
        }
        let lo = j.saturating_sub(params.search_radius).max(region.start());
        let hi = (j + params.search_radius).min(last);
        let mut apex = j;
        for k in lo..=hi {
            if intensity_array[k] > intensity_array[apex] {
                apex = k;
            }
        }
        if intensity_array[apex] >= params.intensity_floor && !region.is_border(apex) {
            Some(apex)
        } else {
            log::trace!(
                "Rejected wavelet maximum at {j}, apex {apex} with intensity {}",
                intensity_array[apex]
            );
            None
        }
    };
    match direction {
        Direction::Forward => candidates.into_iter().find_map(check),
        Direction::Backward => candidates.rev().find_map(check),
    }
}

/// The half width, in samples, of the transform window inspected when a rise is found
const MONOTONE_WINDOW: usize = 2;

/// Walk outward from `apex` to find where the peak ends on either side.
///
/// A side keeps extending while intensity falls. A rise stops the walk if the
/// region ends, if it continues into what looks like a neighboring peak more than half
/// the wavelet scale away from the apex, or if the transform has an extremum nearby.
/// Otherwise the rise is treated as noise and skipped.
pub fn find_endpoints(
    mz_array: &[f64],
    intensity_array: &[f32],
    region: &SearchRegion,
    apex: usize,
    transform: &WaveletTransform,
    params: &LocatorParams,
) -> (usize, usize) {
    let start = region.start();
    let end = region.end();
    let half_scale = params.scale / 2.0;

    let mut left = apex;
    if apex > start {
        left = apex - 1;
        while left > start + 1 && intensity_array[left] > params.noise_level {
            if intensity_array[left - 1] < intensity_array[left] {
                left -= 1;
                continue;
            }
            if left <= start + 2 {
                break;
            }
            if intensity_array[left - 2] > intensity_array[left - 1]
                && mz_array[apex] - mz_array[left - 2] > half_scale
            {
                break;
            }
            if !transform.is_monotone_near(left, MONOTONE_WINDOW) {
                break;
            }
            left -= 1;
        }
    }

    let mut right = apex;
    if apex + 1 < end {
        right = apex + 1;
        while right + 1 < end && intensity_array[right] > params.noise_level {
            if intensity_array[right] > intensity_array[right + 1] {
                right += 1;
                continue;
            }
            if right + 2 >= end {
                break;
            }
            if intensity_array[right + 2] > intensity_array[right + 1]
                && mz_array[right + 2] - mz_array[apex] > half_scale
            {
                break;
            }
            if !transform.is_monotone_near(right, MONOTONE_WINDOW) {
                break;
            }
            right += 1;
        }
    }
    (left, right)
}

/// Find the endpoints of the peak at `apex`, returning `None` if either side did not move
pub fn locate_peak_area(
    mz_array: &[f64],
    intensity_array: &[f32],
    region: &SearchRegion,
    apex: usize,
    transform: &WaveletTransform,
    params: &LocatorParams,
) -> Option<PeakArea> {
    if region.is_border(apex) || !region.contains(apex) {
        return None;
    }
    let (left, right) = find_endpoints(mz_array, intensity_array, region, apex, transform, params);
    PeakArea::new(left, apex, right)
}
