use geo::{BoundingRect, Contains, Coord, LineString, Rect};

use crate::model::Point;

/// A polygon needs at least three finite vertices to enclose anything.
#[must_use]
pub fn is_valid_polygon(polygon: &[Point]) -> bool {
    polygon.len() >= 3
        && polygon
            .iter()
            .all(|point| point.x.is_finite() && point.y.is_finite())
}

fn coord(point: &Point) -> Coord<f64> {
    Coord {
        x: point.x,
        y: point.y,
    }
}

/// Closed `geo` polygon over the given vertex ring, without holes.
#[must_use]
pub fn polygon_shape(polygon: &[Point]) -> geo::Polygon<f64> {
    geo::Polygon::new(LineString::from(polygon.iter().map(coord).collect::<Vec<_>>()), vec![])
}

/// Axis-aligned extent of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self {
            xmin: rect.min().x,
            xmax: rect.max().x,
            ymin: rect.min().y,
            ymax: rect.max().y,
        }
    }
}

impl Bounds {
    #[must_use]
    pub fn of_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let coords = points.into_iter().map(coord).collect::<Vec<_>>();
        LineString::from(coords).bounding_rect().map(Self::from)
    }

    /// Closed-interval overlap on the y axis; touching edges overlap.
    #[must_use]
    pub fn overlaps_vertically(&self, ymin: f64, ymax: f64) -> bool {
        !(ymax < self.ymin || ymin > self.ymax)
    }

    #[must_use]
    pub fn to_polygon(self) -> Vec<Point> {
        vec![
            Point::new(self.xmin, self.ymin),
            Point::new(self.xmax, self.ymin),
            Point::new(self.xmax, self.ymax),
            Point::new(self.xmin, self.ymax),
        ]
    }
}

/// Mean of the vertices, not the area centroid.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }
    let count = polygon.len() as f64;
    let (sum_x, sum_y) = polygon
        .iter()
        .fold((0.0, 0.0), |(x, y), point| (x + point.x, y + point.y));
    Some(Point::new(sum_x / count, sum_y / count))
}

/// Interior containment: points on an edge or vertex are outside.
#[must_use]
pub fn polygon_contains(shape: &geo::Polygon<f64>, point: Point) -> bool {
    shape.contains(&geo::Point::new(point.x, point.y))
}
