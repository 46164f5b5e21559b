//! ROI parsing (C1): accept either a BBOX form `"xmin,ymin,xmax,ymax"` or a
//! WKT `POLYGON(...)`.

use dc3_common::BoundingBox;
use geo::{Coord, LineString, Polygon};
use thiserror::Error;
use wkt::TryFromWkt;

#[derive(Debug, Error)]
pub enum RoiError {
    #[error("ROI is neither a valid BBOX nor a valid WKT polygon: {0}")]
    Unparseable(String),
}

/// Parse a ROI string into a closed polygon.
///
/// A BBOX `"xmin,ymin,xmax,ymax"` yields the closed rectangle
/// `[(xmin,ymin),(xmax,ymin),(xmax,ymax),(xmin,ymax),(xmin,ymin)]`. Anything
/// else is parsed as WKT; it must resolve to a single `POLYGON`.
pub fn parse_roi(roi: &str) -> Result<Polygon<f64>, RoiError> {
    if let Ok(bbox) = BoundingBox::from_bbox_string(roi) {
        return Ok(bbox_to_polygon(&bbox));
    }

    Polygon::<f64>::try_from_wkt_str(roi).map_err(|_| RoiError::Unparseable(roi.to_string()))
}

/// Convert a BBOX into its closed rectangular polygon.
pub fn bbox_to_polygon(bbox: &BoundingBox) -> Polygon<f64> {
    let coords = vec![
        Coord {
            x: bbox.min_x,
            y: bbox.min_y,
        },
        Coord {
            x: bbox.max_x,
            y: bbox.min_y,
        },
        Coord {
            x: bbox.max_x,
            y: bbox.max_y,
        },
        Coord {
            x: bbox.min_x,
            y: bbox.max_y,
        },
        Coord {
            x: bbox.min_x,
            y: bbox.min_y,
        },
    ];
    Polygon::new(LineString::from(coords), vec![])
}

/// Bounds of a polygon's exterior ring.
pub fn polygon_bounds(polygon: &Polygon<f64>) -> BoundingBox {
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for coord in polygon.exterior().coords() {
        min_x = min_x.min(coord.x);
        min_y = min_y.min(coord.y);
        max_x = max_x.max(coord.x);
        max_y = max_y.max(coord.y);
    }
    BoundingBox::new(min_x, min_y, max_x, max_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox_roi() {
        let polygon = parse_roi("-10.0,-5.0,10.0,5.0").unwrap();
        assert_eq!(polygon.exterior().coords().count(), 5);
        let bounds = polygon_bounds(&polygon);
        assert_eq!(bounds, BoundingBox::new(-10.0, -5.0, 10.0, 5.0));
    }

    #[test]
    fn test_parse_wkt_roi() {
        let polygon =
            parse_roi("POLYGON((-10 -5, 10 -5, 10 5, -10 5, -10 -5))").unwrap();
        let bounds = polygon_bounds(&polygon);
        assert_eq!(bounds, BoundingBox::new(-10.0, -5.0, 10.0, 5.0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_roi("not a roi at all").is_err());
    }

    #[test]
    fn test_rejects_non_polygon_wkt() {
        assert!(parse_roi("POINT(1 2)").is_err());
    }
}
