//! A discrete continuous wavelet transform using the Marr ("Mexican hat") wavelet.
//!
//! The kernel is tabulated once per scale at a fixed m/z spacing, and the transform
//! of a signal is the trapezoidal integral of the signal against the kernel
//! centered at each sample, normalized by the square root of the scale.
use std::ops::Range;

/// The Marr wavelet, the negative second derivative of a Gaussian, without normalization
#[inline]
pub fn marr(t: f64) -> f64 {
    let t2 = t * t;
    (1.0 - t2) * (-t2 / 2.0).exp()
}

/// The result of transforming a signal at one scale.
///
/// `values` is padded with a single zero on each side, so the value for grid point
/// `k` is at `values[k + 1]`. The transform is immutable once produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveletTransform {
    pub values: Vec<f64>,
    /// The positions of the grid the transform was computed on. When `resolution > 1`
    /// these are not the positions of the input signal.
    pub positions: Vec<f64>,
    /// The last padding slot before real data
    pub left_padding_index: usize,
    /// The first padding slot after real data
    pub right_padding_index: usize,
    pub resolution: usize,
}

impl WaveletTransform {
    /// The number of grid points, excluding padding
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The transform value at grid point `index`
    #[inline]
    pub fn value(&self, index: usize) -> f64 {
        self.values[index + 1]
    }

    /// The range of buffer indices in `values` holding real data
    pub fn data_range(&self) -> Range<usize> {
        (self.left_padding_index + 1)..self.right_padding_index
    }

    /// The largest value in the transform
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Whether grid point `index` is a strict local maximum of the transform
    #[inline]
    pub fn is_local_maximum(&self, index: usize) -> bool {
        let b = index + 1;
        self.values[b - 1] < self.values[b] && self.values[b] > self.values[b + 1]
    }

    /// Whether the transform has no local extremum among the interior points
    /// of the window `[index - half_window, index + half_window]`, clamped to real data.
    pub fn is_monotone_near(&self, index: usize, half_window: usize) -> bool {
        let b = index + 1;
        let data = self.data_range();
        if data.len() < 3 {
            return true;
        }
        let lo = b.saturating_sub(half_window).max(data.start + 1);
        let hi = (b + half_window).min(data.end - 2);
        if lo > hi {
            return true;
        }
        (lo..=hi).all(|s| {
            let v = &self.values;
            (v[s - 1] - v[s]) * (v[s] - v[s + 1]) >= 0.0
        })
    }
}

/// Tabulated Marr wavelet at a single scale
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousWaveletTransform {
    scale: f64,
    spacing: f64,
    kernel: Vec<f64>,
}

impl ContinuousWaveletTransform {
    /// The kernel is truncated at five times the scale
    pub const SUPPORT: f64 = 5.0;

    pub fn new(scale: f64, spacing: f64) -> Self {
        let n = (Self::SUPPORT * scale / spacing).ceil() as usize + 1;
        let kernel = (0..n).map(|i| marr(i as f64 * spacing / scale)).collect();
        Self {
            scale,
            spacing,
            kernel,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// The m/z distance from the center beyond which the kernel is zero
    pub fn support(&self) -> f64 {
        (self.kernel.len().saturating_sub(1)) as f64 * self.spacing
    }

    /// Look up the kernel value at an m/z offset from its center
    #[inline]
    pub fn kernel_at(&self, offset: f64) -> f64 {
        let i = (offset.abs() / self.spacing).round() as usize;
        self.kernel.get(i).copied().unwrap_or(0.0)
    }

    /// Transform a signal. With `resolution > 1` the signal is first linearly
    /// resampled onto `resolution * n` evenly spaced points.
    pub fn transform(&self, mz_array: &[f64], intensity_array: &[f32], resolution: usize) -> WaveletTransform {
        let resolution = resolution.max(1);
        let (positions, intensities) = if resolution == 1 {
            (
                mz_array.to_vec(),
                intensity_array.iter().map(|y| *y as f64).collect(),
            )
        } else {
            resample(mz_array, intensity_array, resolution * mz_array.len())
        };
        let values = self.convolve(&positions, &intensities);
        WaveletTransform {
            right_padding_index: positions.len() + 1,
            left_padding_index: 0,
            values,
            positions,
            resolution,
        }
    }

    fn convolve(&self, positions: &[f64], intensities: &[f64]) -> Vec<f64> {
        let n = positions.len();
        let mut values = Vec::with_capacity(n + 2);
        values.push(0.0);
        let support = self.support();
        let norm = self.scale.sqrt().recip();
        let mut lo = 0;
        let mut hi = 0;
        for (k, x0) in positions.iter().copied().enumerate() {
            while positions[lo] < x0 - support {
                lo += 1;
            }
            hi = hi.max(k);
            while hi + 1 < n && positions[hi + 1] <= x0 + support {
                hi += 1;
            }
            let mut acc = 0.0;
            for j in lo..hi {
                let (a, b) = (positions[j], positions[j + 1]);
                acc += (b - a) / 2.0
                    * (intensities[j] * self.kernel_at(a - x0)
                        + intensities[j + 1] * self.kernel_at(b - x0));
            }
            values.push(acc * norm);
        }
        values.push(0.0);
        values
    }
}

/// Linearly interpolate a signal onto `size` evenly spaced points spanning the same m/z range
pub fn resample(mz_array: &[f64], intensity_array: &[f32], size: usize) -> (Vec<f64>, Vec<f64>) {
    let n = mz_array.len();
    if n < 2 || size < 2 {
        return (
            mz_array.to_vec(),
            intensity_array.iter().map(|y| *y as f64).collect(),
        );
    }
    let origin = mz_array[0];
    let step = (mz_array[n - 1] - origin) / (size - 1) as f64;
    let mut positions = Vec::with_capacity(size);
    let mut intensities = Vec::with_capacity(size);
    let mut j = 0;
    for k in 0..size {
        let x = origin + k as f64 * step;
        while j + 1 < n - 1 && mz_array[j + 1] < x {
            j += 1;
        }
        let (x1, x2) = (mz_array[j], mz_array[j + 1]);
        let (y1, y2) = (intensity_array[j] as f64, intensity_array[j + 1] as f64);
        let y = if x2 != x1 {
            let t = ((x - x1) / (x2 - x1)).clamp(0.0, 1.0);
            y1 + (y2 - y1) * t
        } else {
            y1
        };
        positions.push(x);
        intensities.push(y);
    }
    (positions, intensities)
}
