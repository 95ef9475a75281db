//! Min-max feature normalization

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::record::N_FEATURES;

/// Rescale `values` to [0, 1] via `(x - min) / (max - min)`.
///
/// A zero-range input maps every value to 0.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let (min, max) = bounds(values.iter().copied());
    values.iter().map(|&x| scale(x, min, max)).collect()
}

/// Inverse of [`normalize`] for a column with the given original bounds
pub fn denormalize(values: &[f64], min: f64, max: f64) -> Vec<f64> {
    values.iter().map(|&x| unscale(x, min, max)).collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    if min > max {
        (0.0, 0.0)
    } else {
        (min, max)
    }
}

#[inline]
fn scale(x: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range == 0.0 {
        0.0
    } else {
        (x - min) / range
    }
}

#[inline]
fn unscale(x: f64, min: f64, max: f64) -> f64 {
    x * (max - min) + min
}

/// Per-column min/max fitted on a feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: [f64; N_FEATURES],
    pub max: [f64; N_FEATURES],
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            min: [0.0; N_FEATURES],
            max: [0.0; N_FEATURES],
        }
    }
}

impl MinMaxScaler {
    /// Record the bounds of each column of an (n, 3) matrix
    pub fn fit(features: &Array2<f64>) -> Self {
        let mut scaler = Self::default();
        for (col, column) in features.axis_iter(Axis(1)).take(N_FEATURES).enumerate() {
            let (min, max) = bounds(column.iter().copied());
            scaler.min[col] = min;
            scaler.max[col] = max;
        }
        scaler
    }

    /// Map raw features into normalized space
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        let mut out = features.clone();
        for (col, mut column) in out.axis_iter_mut(Axis(1)).take(N_FEATURES).enumerate() {
            column.mapv_inplace(|x| scale(x, self.min[col], self.max[col]));
        }
        out
    }

    /// Map a single raw row into normalized space
    pub fn transform_row(&self, row: &[f64; N_FEATURES]) -> Array1<f64> {
        Array1::from_iter(
            row.iter()
                .enumerate()
                .map(|(col, &x)| scale(x, self.min[col], self.max[col])),
        )
    }

    /// Map normalized rows back into original units
    pub fn inverse_transform(&self, normalized: &Array2<f64>) -> Array2<f64> {
        let mut out = normalized.clone();
        for (col, mut column) in out.axis_iter_mut(Axis(1)).take(N_FEATURES).enumerate() {
            column.mapv_inplace(|x| unscale(x, self.min[col], self.max[col]));
        }
        out
    }

    /// Map a single normalized row back into original units
    pub fn inverse_row(&self, row: ArrayView1<f64>) -> [f64; N_FEATURES] {
        let mut out = [0.0; N_FEATURES];
        for (col, &x) in row.iter().take(N_FEATURES).enumerate() {
            out[col] = unscale(x, self.min[col], self.max[col]);
        }
        out
    }
}
