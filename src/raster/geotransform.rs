//! North-up affine mapping between grid indices and native coordinates

/// Affine georeferencing of a north-up raster.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y - row * pixel_height
/// ```
///
/// `(origin_x, origin_y)` is the top-left corner of cell (0, 0). Both pixel
/// sizes are positive; rows grow southwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Cell size as `(width, height)`
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width, self.pixel_height)
    }

    /// Native coordinates of the top-left corner of cell `(row, col)`
    #[inline]
    pub fn cell_origin(&self, row: usize, col: usize) -> (f64, f64) {
        self.corner(col, row)
    }

    /// Native coordinates of a grid vertex
    ///
    /// Vertices are indexed by column edge (0..=cols) and row edge (0..=rows).
    #[inline]
    pub fn corner(&self, col_edge: usize, row_edge: usize) -> (f64, f64) {
        (
            self.origin_x + col_edge as f64 * self.pixel_width,
            self.origin_y - row_edge as f64 * self.pixel_height,
        )
    }

    /// Whether both cell sizes are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.origin_x.is_finite()
            && self.origin_y.is_finite()
            && self.pixel_width.is_finite()
            && self.pixel_height.is_finite()
            && self.pixel_width > 0.0
            && self.pixel_height > 0.0
    }
}
