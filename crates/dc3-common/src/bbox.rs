//! Bounding box types and operations shared by every C1-C9 component.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in some CRS's native coordinate units.
///
/// For geographic CRSs, coordinates are degrees (lon, lat); for projected
/// CRSs they are whatever linear unit the CRS defines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a BBOX ROI string: "minx,miny,maxx,maxy".
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            min_x: parts[0]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[0].to_string()))?,
            min_y: parts[1]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[1].to_string()))?,
            max_x: parts[2]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[2].to_string()))?,
            max_y: parts[3]
                .trim()
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(parts[3].to_string()))?,
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn centroid(&self) -> (f64, f64) {
        (
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Smallest bbox covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Distance from this bbox's centroid to a point, used for center-granule election.
    pub fn centroid_distance(&self, x: f64, y: f64) -> f64 {
        let (cx, cy) = self.centroid();
        ((cx - x).powi(2) + (cy - y).powi(2)).sqrt()
    }
}

/// Area of the union of a set of (possibly overlapping) axis-aligned
/// rectangles, via coordinate-compression sweep: build the grid of distinct
/// x/y cut points every rectangle boundary induces, then sum the area of
/// every grid cell covered by at least one rectangle.
///
/// Used by the Metadata & Quality component (C7) for `spatial_coverage` and
/// `group_lightness`, where `∪ raster_polygons` is approximated by the union
/// of each raster's reprojected bounding box.
pub fn union_area(rects: &[BoundingBox]) -> f64 {
    if rects.is_empty() {
        return 0.0;
    }

    let mut xs: Vec<f64> = rects.iter().flat_map(|r| [r.min_x, r.max_x]).collect();
    let mut ys: Vec<f64> = rects.iter().flat_map(|r| [r.min_y, r.max_y]).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    xs.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
    ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ys.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

    let mut area = 0.0;
    for wx in xs.windows(2) {
        let (x0, x1) = (wx[0], wx[1]);
        let cx = (x0 + x1) / 2.0;
        for wy in ys.windows(2) {
            let (y0, y1) = (wy[0], wy[1]);
            let cy = (y0 + y1) / 2.0;
            if rects.iter().any(|r| r.contains_point(cx, cy)) {
                area += (x1 - x0) * (y1 - y0);
            }
        }
    }
    area
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("invalid BBOX format: {0}, expected 'minx,miny,maxx,maxy'")]
    InvalidFormat(String),

    #[error("invalid number in BBOX: {0}")]
    InvalidNumber(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = BoundingBox::from_bbox_string("-125.0,24.0,-66.0,50.0").unwrap();
        assert_eq!(bbox.min_x, -125.0);
        assert_eq!(bbox.max_y, 50.0);
    }

    #[test]
    fn test_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let intersection = a.intersection(&b).unwrap();
        assert_eq!(intersection.min_x, 5.0);
        assert_eq!(intersection.max_x, 10.0);
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 20.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, 0.0, 15.0, 20.0));
    }

    #[test]
    fn test_centroid_distance() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.centroid(), (5.0, 5.0));
        assert!((a.centroid_distance(5.0, 5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_union_area_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
        assert!((union_area(&[a, b]) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_area_overlapping_not_double_counted() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // union = 15x10 = 150, not 100+100=200
        assert!((union_area(&[a, b]) - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_area_single_rect() {
        let a = BoundingBox::new(0.0, 0.0, 4.0, 3.0);
        assert!((union_area(&[a]) - 12.0).abs() < 1e-9);
    }
}
