//! Vertical datum correction.

use crate::{DemError, Result};

/// A single-band signed 16-bit raster held in memory, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Int16Raster {
    rows: usize,
    cols: usize,
    data: Vec<i16>,
}

impl Int16Raster {
    /// Wrap a buffer, checking it holds exactly `rows * cols` values.
    pub fn new(rows: usize, cols: usize, data: Vec<i16>) -> Result<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(DemError::BufferSize {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// A raster filled with one value.
    pub fn filled(rows: usize, cols: usize, value: i16) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Number of rows (lines).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (samples).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The pixel values, row-major.
    pub fn data(&self) -> &[i16] {
        &self.data
    }

    /// Consume the raster, returning its pixel values.
    pub fn into_data(self) -> Vec<i16> {
        self.data
    }

    /// Add a geoid height raster to these elevations, in place.
    ///
    /// Sums wrap on overflow, matching 16-bit integer storage.
    pub fn add_geoid(&mut self, geoid: &Int16Raster) -> Result<()> {
        if self.rows != geoid.rows || self.cols != geoid.cols {
            return Err(DemError::DimensionMismatch {
                elevation_rows: self.rows,
                elevation_cols: self.cols,
                geoid_rows: geoid.rows,
                geoid_cols: geoid.cols,
            });
        }

        for (elevation, offset) in self.data.iter_mut().zip(&geoid.data) {
            *elevation = elevation.wrapping_add(*offset);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elementwise_sum() {
        let mut elevation = Int16Raster::new(2, 3, vec![0, 100, -20, 1500, 8848, -400]).unwrap();
        let geoid = Int16Raster::new(2, 3, vec![-30, 12, 20, -5, 0, 17]).unwrap();

        elevation.add_geoid(&geoid).unwrap();

        assert_eq!(elevation.data(), &[-30, 112, 0, 1495, 8848, -383]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut elevation = Int16Raster::filled(2, 3, 10);
        let geoid = Int16Raster::filled(3, 2, 1);

        let err = elevation.add_geoid(&geoid).unwrap_err();
        assert!(matches!(
            err,
            DemError::DimensionMismatch {
                elevation_rows: 2,
                elevation_cols: 3,
                geoid_rows: 3,
                geoid_cols: 2
            }
        ));
        // Untouched on failure
        assert!(elevation.data().iter().all(|&v| v == 10));
    }

    #[test]
    fn test_sum_wraps_without_saturating() {
        let mut elevation = Int16Raster::new(1, 2, vec![i16::MAX, i16::MIN]).unwrap();
        let geoid = Int16Raster::new(1, 2, vec![1, -1]).unwrap();

        elevation.add_geoid(&geoid).unwrap();

        assert_eq!(elevation.data(), &[i16::MIN, i16::MAX]);
    }

    #[test]
    fn test_buffer_size_checked() {
        assert!(matches!(
            Int16Raster::new(2, 2, vec![0; 3]),
            Err(DemError::BufferSize { rows: 2, cols: 2, len: 3 })
        ));
    }
}
