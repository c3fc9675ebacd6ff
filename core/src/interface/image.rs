use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Focused image in dB with its physical extents.
///
/// Fields are private; an image is never modified after the processor
/// returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SarImage {
    data: Array2<f64>,
    range_extent: (f64, f64),
    azimuth_extent: (f64, f64),
    min_value: f64,
    max_value: f64,
    peak_index: (usize, usize),
}

impl SarImage {
    /// Wraps `data` (azimuth rows × range columns) and records its statistics.
    pub fn new(data: Array2<f64>, range_extent: (f64, f64), azimuth_extent: (f64, f64)) -> Self {
        let mut min_value = f64::INFINITY;
        let mut max_value = f64::NEG_INFINITY;
        let mut peak_index = (0, 0);
        for ((row, col), &value) in data.indexed_iter() {
            if value < min_value {
                min_value = value;
            }
            if value > max_value {
                max_value = value;
                peak_index = (row, col);
            }
        }
        Self {
            data,
            range_extent,
            azimuth_extent,
            min_value,
            max_value,
            peak_index,
        }
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Slant range (m) of the first and last column.
    pub fn range_extent(&self) -> (f64, f64) {
        self.range_extent
    }

    /// Along-track position (m) of the first and last row.
    pub fn azimuth_extent(&self) -> (f64, f64) {
        self.azimuth_extent
    }

    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// `(azimuth row, range column)` of the brightest pixel, first on ties.
    pub fn peak_index(&self) -> (usize, usize) {
        self.peak_index
    }

    /// Slant range of column `col`, interpolated linearly across the extent.
    pub fn range_at(&self, col: usize) -> f64 {
        position(self.range_extent, col, self.data.ncols())
    }

    /// Along-track position of row `row`.
    pub fn azimuth_at(&self, row: usize) -> f64 {
        position(self.azimuth_extent, row, self.data.nrows())
    }

    pub fn summary(&self) -> ImageSummary {
        let (rows, cols) = self.dim();
        ImageSummary {
            rows,
            cols,
            range_extent: [self.range_extent.0, self.range_extent.1],
            azimuth_extent: [self.azimuth_extent.0, self.azimuth_extent.1],
            min_db: self.min_value,
            max_db: self.max_value,
            peak_row: self.peak_index.0,
            peak_col: self.peak_index.1,
            peak_range: self.range_at(self.peak_index.1),
            peak_azimuth: self.azimuth_at(self.peak_index.0),
        }
    }
}

fn position(extent: (f64, f64), index: usize, len: usize) -> f64 {
    if len < 2 {
        return extent.0;
    }
    extent.0 + (extent.1 - extent.0) * index as f64 / (len - 1) as f64
}

/// Serialisable description of an image without its pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub rows: usize,
    pub cols: usize,
    pub range_extent: [f64; 2],
    pub azimuth_extent: [f64; 2],
    pub min_db: f64,
    pub max_db: f64,
    pub peak_row: usize,
    pub peak_col: usize,
    pub peak_range: f64,
    pub peak_azimuth: f64,
}
