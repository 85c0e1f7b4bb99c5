//! Spatial filter against the region of interest

use geo::{BoundingRect, Centroid, Intersects, Polygon, Rect};

use crate::config::FilterMode;

/// Decide whether `geometry` is kept for `region` under `mode`
///
/// With no region every geometry is accepted.
pub fn accepts(geometry: &Polygon<f64>, region: Option<&Polygon<f64>>, mode: FilterMode) -> bool {
    let Some(region) = region else {
        return true;
    };

    match mode {
        FilterMode::Intersects => geometry.intersects(region),
        FilterMode::CentroidContained => geometry
            .centroid()
            .map(|centroid| region.intersects(&centroid))
            .unwrap_or(false),
    }
}

/// Region filter for one run, with a bounding-box pre-check
#[derive(Debug, Clone)]
pub struct RegionFilter {
    region: Option<Polygon<f64>>,
    bounds: Option<Rect<f64>>,
    mode: FilterMode,
}

impl RegionFilter {
    pub fn new(region: Option<Polygon<f64>>, mode: FilterMode) -> Self {
        let bounds = region.as_ref().and_then(|r| r.bounding_rect());
        RegionFilter {
            region,
            bounds,
            mode,
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn region(&self) -> Option<&Polygon<f64>> {
        self.region.as_ref()
    }

    /// Whether `geometry` is kept
    #[inline]
    pub fn accepts(&self, geometry: &Polygon<f64>) -> bool {
        if let (Some(bounds), Some(candidate)) = (&self.bounds, geometry.bounding_rect()) {
            if !bounds.intersects(&candidate) {
                return false;
            }
        }
        accepts(geometry, self.region.as_ref(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    fn square(min_x: f64, min_y: f64, size: f64) -> Polygon<f64> {
        Rect::new(coord! { x: min_x, y: min_y }, coord! { x: min_x + size, y: min_y + size }).to_polygon()
    }

    #[test]
    fn test_no_region_accepts_everything() {
        assert!(accepts(&square(100.0, 100.0, 1.0), None, FilterMode::Intersects));
        assert!(RegionFilter::new(None, FilterMode::CentroidContained).accepts(&square(-5.0, 3.0, 1.0)));
    }

    #[test]
    fn test_inside_and_outside_agree_across_modes() {
        let region = square(0.0, 0.0, 10.0);
        for mode in [FilterMode::Intersects, FilterMode::CentroidContained] {
            let filter = RegionFilter::new(Some(region.clone()), mode);
            assert!(filter.accepts(&square(2.0, 2.0, 1.0)), "{:?}", mode);
            assert!(!filter.accepts(&square(20.0, 20.0, 1.0)), "{:?}", mode);
        }
    }

    #[test]
    fn test_straddling_square_with_centroid_outside() {
        let region = square(0.0, 0.0, 10.0);
        // Centroid at (10.75, 5.5), a fifth of the rectangle inside
        let straddling = Rect::new(coord! { x: 9.5, y: 5.0 }, coord! { x: 12.0, y: 6.0 }).to_polygon();

        assert!(RegionFilter::new(Some(region.clone()), FilterMode::Intersects).accepts(&straddling));
        assert!(!RegionFilter::new(Some(region), FilterMode::CentroidContained).accepts(&straddling));
    }

    #[test]
    fn test_boundary_touch_counts() {
        let region = square(0.0, 0.0, 1.0);
        let touching = square(1.0, 0.0, 1.0);
        assert!(accepts(&touching, Some(&region), FilterMode::Intersects));

        // Centroid exactly on the region boundary
        let half_out = Rect::new(coord! { x: 0.5, y: 0.0 }, coord! { x: 1.5, y: 1.0 }).to_polygon();
        assert!(accepts(&half_out, Some(&region), FilterMode::CentroidContained));
    }

    #[test]
    fn test_non_rectangular_region() {
        let triangle = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0), (x: 0.0, y: 0.0)];
        let filter = RegionFilter::new(Some(triangle), FilterMode::Intersects);

        // Inside the triangle's bounding box but beyond the hypotenuse
        assert!(!filter.accepts(&square(3.0, 3.0, 0.5)));
        assert!(filter.accepts(&square(0.5, 0.5, 0.5)));
    }
}
