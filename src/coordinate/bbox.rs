//! Bounding box structure for defining regions

use geo::{Coord, Polygon, Rect};

use crate::errors::{ConversionError, ConversionResult};

/// An axis-aligned bounding box in longitude/latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a bounding box from a string (format: "minx,miny,maxx,maxy")
    pub fn from_string(bbox_str: &str) -> ConversionResult<Self> {
        let parts: Vec<&str> = bbox_str.split(',').collect();
        if parts.len() != 4 {
            return Err(ConversionError::Config(format!(
                "Bounding box must have 4 comma-separated values, got '{}'", bbox_str
            )));
        }

        let mut values = [0.0f64; 4];
        for (value, (part, name)) in values.iter_mut().zip(parts.iter().zip(["min_x", "min_y", "max_x", "max_y"])) {
            *value = part.trim().parse::<f64>()
                .map_err(|_| ConversionError::Config(format!("Invalid {} value: '{}'", name, part.trim())))?;
        }

        Ok(BoundingBox::new(values[0], values[1], values[2], values[3]))
    }

    /// Build a bounding box from a `[min_x, min_y, max_x, max_y]` slice
    pub fn from_slice(values: &[f64]) -> ConversionResult<Self> {
        match values {
            [min_x, min_y, max_x, max_y] => Ok(BoundingBox::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(ConversionError::Config(format!(
                "Bounding box must have 4 values, got {}", values.len()
            ))),
        }
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether all bounds are finite and min <= max on both axes
    pub fn is_valid(&self) -> bool {
        [self.min_x, self.min_y, self.max_x, self.max_y].iter().all(|v| v.is_finite())
            && self.width() >= 0.0
            && self.height() >= 0.0
    }

    /// Polygon covering the box
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            Coord { x: self.min_x, y: self.min_y },
            Coord { x: self.max_x, y: self.max_y },
        )
        .to_polygon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string() {
        let bbox = BoundingBox::from_string("-14.60, 28.01,-13.72,28.78").unwrap();
        assert_eq!(bbox, BoundingBox::new(-14.60, 28.01, -13.72, 28.78));
        assert!(bbox.is_valid());
    }

    #[test]
    fn test_from_string_errors() {
        assert!(BoundingBox::from_string("1,2,3").is_err());
        assert!(BoundingBox::from_string("1,2,x,4").is_err());
    }

    #[test]
    fn test_inverted_box_is_invalid() {
        assert!(!BoundingBox::new(2.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn test_to_polygon_covers_box() {
        let polygon = BoundingBox::new(0.0, 0.0, 2.0, 1.0).to_polygon();
        assert_eq!(polygon.exterior().0.len(), 5);
    }
}
