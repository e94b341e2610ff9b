//! Geometry primitives: longitude normalization, point-in-polygon, and
//! affine raster transforms.

use crate::{DemError, Result};

/// Bring a longitude into the canonical range `[-180, 180)`.
///
/// Repeatedly adds or subtracts 360 degrees, so it is intended for
/// real-world longitudes rather than arbitrarily large magnitudes.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let mut result = longitude;
    while result < -180.0 {
        result += 360.0;
    }
    while result >= 180.0 {
        result -= 360.0;
    }
    result
}

/// Test whether `(x, y)` lies inside a closed polygon.
///
/// Franklin's crossing test: the vertex list must be closed (`v[n-1] == v[0]`)
/// and hold at least four entries including the closing duplicate. Each edge
/// whose x-range straddles `x` toggles the result when `y` lies below the
/// edge at that x. An edge with equal endpoint x values never straddles, so
/// the interpolation below never divides by zero for a vertical edge.
pub fn point_in_polygon(vertices: &[(f64, f64)], x: f64, y: f64) -> Result<bool> {
    validate_vertices(vertices)?;
    Ok(crossings_toggle(vertices, x, y))
}

fn validate_vertices(vertices: &[(f64, f64)]) -> Result<()> {
    let count = vertices.len();
    if count < 4 {
        return Err(DemError::InvalidPolygon(format!(
            "insufficient line segments: {count} vertices"
        )));
    }

    let (first_x, first_y) = vertices[0];
    let (last_x, last_y) = vertices[count - 1];
    if first_x != last_x && first_y != last_y {
        return Err(DemError::InvalidPolygon(
            "not a closed polygon vertex list".to_string(),
        ));
    }

    Ok(())
}

fn crossings_toggle(vertices: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;

    for edge in vertices.windows(2) {
        let (x0, y0) = edge[0];
        let (x1, y1) = edge[1];

        if ((x0 > x) != (x1 > x)) && (y < (y1 - y0) * (x - x0) / (x1 - x0) + y0) {
            inside = !inside;
        }
    }

    inside
}

/// A closed polygon, validated once at construction.
///
/// Vertices are expected in clockwise order with the first vertex repeated
/// at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<(f64, f64)>,
}

impl Polygon {
    /// Build a polygon from a closed vertex list.
    pub fn new(vertices: Vec<(f64, f64)>) -> Result<Self> {
        validate_vertices(&vertices)?;
        Ok(Self { vertices })
    }

    /// Build a closed polygon from an open ring by repeating the first vertex.
    pub fn from_ring(ring: &[(f64, f64)]) -> Result<Self> {
        let mut vertices = ring.to_vec();
        if let Some(&first) = ring.first() {
            vertices.push(first);
        }
        Self::new(vertices)
    }

    /// Test whether a point lies inside the polygon.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        crossings_toggle(&self.vertices, x, y)
    }

    /// The closed vertex list.
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }
}

/// Six-coefficient affine transform from image (pixel, line) to map coordinates.
///
/// Coefficients follow the GDAL ordering:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Map X of the upper-left corner.
    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    /// Map Y of the upper-left corner.
    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    /// Translate image coordinates into map coordinates.
    pub fn image_to_map(&self, image_x: f64, image_y: f64) -> (f64, f64) {
        let t = &self.0;
        (
            t[0] + image_x * t[1] + image_y * t[2],
            t[3] + image_x * t[4] + image_y * t[5],
        )
    }

    /// Copy of the transform with its origin moved `offset` units along X.
    pub fn with_origin_shift(&self, offset: f64) -> Self {
        let mut coefficients = self.0;
        coefficients[0] += offset;
        Self(coefficients)
    }

    /// Footprint polygon of a raster of the given size: the centers of the
    /// four corner pixels mapped in UL, UR, LR, LL order and closed.
    pub fn footprint(&self, rows: usize, cols: usize) -> Result<Polygon> {
        let last_col = cols.saturating_sub(1) as f64;
        let last_row = rows.saturating_sub(1) as f64;

        Polygon::from_ring(&[
            self.image_to_map(0.0, 0.0),
            self.image_to_map(last_col, 0.0),
            self.image_to_map(last_col, last_row),
            self.image_to_map(0.0, last_row),
        ])
    }
}
