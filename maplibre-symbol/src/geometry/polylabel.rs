//! Pole of inaccessibility: the interior point of a polygon farthest from its boundary.
//!
//! Searches a quadtree of square cells, always refining the cell which could contain the best
//! point, until no cell can improve the best distance by more than the requested precision.

use std::{cmp::Ordering, collections::BinaryHeap, f64::consts::SQRT_2};

use geo::{BoundingRect, Centroid, Contains, EuclideanDistance};
use geo_types::{Coord, LineString, Point, Polygon};

use crate::{
    euclid::Point2D,
    geometry::{GeometryCollection, GeometryCoordinates},
    TileSpace,
};

struct Cell {
    /// Center of the cell
    center: Point<f64>,
    /// Half of the cell size
    h: f64,
    /// Signed distance from the center to the polygon boundary, negative outside
    d: f64,
    /// Maximum distance to the boundary any point in the cell can have
    max: f64,
}

impl Cell {
    fn new(x: f64, y: f64, h: f64, polygon: &Polygon<f64>) -> Self {
        let center = Point::new(x, y);
        let d = point_to_polygon_dist(&center, polygon);
        Self {
            center,
            h,
            d,
            max: d + h * SQRT_2,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.max.total_cmp(&other.max) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.max.total_cmp(&other.max)
    }
}

fn point_to_polygon_dist(point: &Point<f64>, polygon: &Polygon<f64>) -> f64 {
    let distance = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| point.euclidean_distance(ring))
        .fold(f64::INFINITY, f64::min);

    if polygon.contains(point) {
        distance
    } else {
        -distance
    }
}

fn to_line_string(ring: &GeometryCoordinates) -> LineString<f64> {
    LineString::from(
        ring.iter()
            .map(|p| Coord {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect::<Vec<_>>(),
    )
}

fn to_polygon(rings: &GeometryCollection) -> Option<Polygon<f64>> {
    let (outer, holes) = rings.split_first()?;
    if outer.is_empty() {
        return None;
    }
    Some(Polygon::new(
        to_line_string(outer),
        holes.iter().map(to_line_string).collect(),
    ))
}

/// Finds the pole of inaccessibility of a polygon given as outer ring followed by its holes.
/// Returns `None` for polygons without points.
pub fn find_pole_of_inaccessibility(
    rings: &GeometryCollection,
    precision: f64,
) -> Option<Point2D<f64, TileSpace>> {
    let polygon = to_polygon(rings)?;
    let bounds = polygon.exterior().bounding_rect()?;

    let min = bounds.min();
    let width = bounds.width();
    let height = bounds.height();
    let cell_size = width.min(height);

    if cell_size == 0.0 {
        return Some(Point2D::new(min.x, min.y));
    }

    let mut h = cell_size / 2.0;

    // a priority queue of cells in order of their "potential" (max distance to polygon)
    let mut cell_queue = BinaryHeap::new();

    // cover polygon with initial cells
    let mut x = min.x;
    while x < bounds.max().x {
        let mut y = min.y;
        while y < bounds.max().y {
            cell_queue.push(Cell::new(x + h, y + h, h, &polygon));
            y += cell_size;
        }
        x += cell_size;
    }

    // take centroid as the first best guess
    let centroid = polygon
        .centroid()
        .unwrap_or_else(|| polygon.exterior().0[0].into());
    let mut best_cell = Cell::new(centroid.x(), centroid.y(), 0.0, &polygon);

    // second guess: bounding box centroid
    let bbox_cell = Cell::new(min.x + width / 2.0, min.y + height / 2.0, 0.0, &polygon);
    if bbox_cell.d > best_cell.d {
        best_cell = bbox_cell;
    }

    while let Some(cell) = cell_queue.pop() {
        // update the best cell if we found a better one
        if cell.d > best_cell.d {
            best_cell = Cell::new(cell.center.x(), cell.center.y(), cell.h, &polygon);
        }

        // do not drill down further if there's no chance of a better solution
        if cell.max - best_cell.d <= precision {
            continue;
        }

        // split the cell into four cells
        h = cell.h / 2.0;
        let (cx, cy) = (cell.center.x(), cell.center.y());
        cell_queue.push(Cell::new(cx - h, cy - h, h, &polygon));
        cell_queue.push(Cell::new(cx + h, cy - h, h, &polygon));
        cell_queue.push(Cell::new(cx - h, cy + h, h, &polygon));
        cell_queue.push(Cell::new(cx + h, cy + h, h, &polygon));
    }

    Some(Point2D::new(best_cell.center.x(), best_cell.center.y()))
}

#[cfg(test)]
mod tests {
    use crate::{
        euclid::Point2D,
        geometry::{polylabel::find_pole_of_inaccessibility, GeometryCoordinates},
        TileSpace,
    };

    #[test]
    fn square_pole_is_near_the_centroid() {
        let square =
            GeometryCoordinates::from_xy(&[(0, 0), (100, 0), (100, 100), (0, 100), (0, 0)]);
        let pole = find_pole_of_inaccessibility(&vec![square], 16.0).unwrap();
        assert!(pole.distance_to(Point2D::<f64, TileSpace>::new(50.0, 50.0)) <= 16.0);
    }

    #[test]
    fn pole_avoids_holes() {
        let outer =
            GeometryCoordinates::from_xy(&[(0, 0), (300, 0), (300, 100), (0, 100), (0, 0)]);
        let hole = GeometryCoordinates::from_xy(&[(100, 0), (100, 100), (200, 100), (200, 0), (100, 0)]);
        let pole = find_pole_of_inaccessibility(&vec![outer, hole], 1.0).unwrap();
        assert!(pole.x < 100.0 || pole.x > 200.0);
    }

    #[test]
    fn l_shape_pole_is_inside() {
        let l_shape = GeometryCoordinates::from_xy(&[
            (0, 0),
            (400, 0),
            (400, 100),
            (100, 100),
            (100, 400),
            (0, 400),
            (0, 0),
        ]);
        let pole = find_pole_of_inaccessibility(&vec![l_shape], 1.0).unwrap();
        assert!(pole.x <= 100.0 || pole.y <= 100.0);
    }

    #[test]
    fn degenerate_polygons() {
        let flat = GeometryCoordinates::from_xy(&[(10, 20), (50, 20), (10, 20)]);
        assert_eq!(
            find_pole_of_inaccessibility(&vec![flat], 16.0),
            Some(Point2D::new(10.0, 20.0))
        );
        assert_eq!(find_pole_of_inaccessibility(&vec![], 16.0), None);
    }
}
