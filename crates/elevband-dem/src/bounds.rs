//! Geographic and projected bounding boxes.

/// Geographic bounding box of a scene in decimal degrees.
///
/// Longitudes are not normalized: a box with `west > east` spans the
/// antimeridian. `north >= south` is assumed by all downstream arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBoundingBox {
    /// Northern latitude.
    pub north: f64,
    /// Southern latitude.
    pub south: f64,
    /// Eastern longitude.
    pub east: f64,
    /// Western longitude.
    pub west: f64,
}

impl GeoBoundingBox {
    /// Create a bounding box from its four edges.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Grow the box by `margin` degrees on every side.
    pub fn pad(&mut self, margin: f64) {
        self.north += margin;
        self.south -= margin;
        self.east += margin;
        self.west -= margin;
    }

    /// Copy of the box grown by `margin` degrees on every side.
    pub fn padded(&self, margin: f64) -> Self {
        let mut bbox = *self;
        bbox.pad(margin);
        bbox
    }

    /// Arithmetic center as `(longitude, latitude)`.
    pub fn center(&self) -> (f64, f64) {
        ((self.east + self.west) / 2.0, (self.north + self.south) / 2.0)
    }

    /// Corners as `(longitude, latitude)` in UL, UR, LR, LL order.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.west, self.north),
            (self.east, self.north),
            (self.east, self.south),
            (self.west, self.south),
        ]
    }

    /// Whether the whole-degree cells of the west and east edges lie on
    /// opposite sides of the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        (self.west.floor() as i32) > 0 && (self.east.floor() as i32) < 0
    }
}

/// Rectangular extents in a projected coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapExtents {
    /// Minimum X (west edge).
    pub min_x: f64,
    /// Minimum Y (south edge).
    pub min_y: f64,
    /// Maximum X (east edge).
    pub max_x: f64,
    /// Maximum Y (north edge).
    pub max_y: f64,
}

impl MapExtents {
    /// Create extents from their four edges.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Convert pixel-center corner coordinates into pixel-edge extents.
    pub fn widened_by_half_pixel(&self, pixel_x: f64, pixel_y: f64) -> Self {
        Self {
            min_x: self.min_x - pixel_x * 0.5,
            min_y: self.min_y - pixel_y * 0.5,
            max_x: self.max_x + pixel_x * 0.5,
            max_y: self.max_y + pixel_y * 0.5,
        }
    }

    /// Number of samples (columns) at the given pixel width.
    pub fn samples(&self, pixel_x: f64) -> usize {
        ((self.max_x - self.min_x) / pixel_x).round() as usize
    }

    /// Number of lines (rows) at the given pixel height.
    pub fn lines(&self, pixel_y: f64) -> usize {
        ((self.max_y - self.min_y) / pixel_y).round() as usize
    }
}
