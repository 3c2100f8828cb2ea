//! Clipping of lines against an axis aligned box.

use crate::{
    euclid::Point2D,
    geometry::{GeometryCollection, GeometryCoordinate, GeometryCoordinates},
};

fn point(x: f64, y: f64) -> Point2D<f64, crate::TileSpace> {
    Point2D::new(x, y).round()
}

/// Clips every line of `lines` to the box `[x1, x2) × [y1, y2)`. Segments leaving and
/// re-entering the box produce separate lines. Intersections are rounded to whole units.
pub fn clip_lines(
    lines: &GeometryCollection,
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
) -> GeometryCollection {
    let mut clipped_lines: GeometryCollection = Vec::new();

    for line in lines {
        let mut current: Option<usize> = None;

        for pair in line.windows(2) {
            let mut p0 = pair[0].cast::<f64>();
            let mut p1 = pair[1].cast::<f64>();

            if p0.x < x1 && p1.x < x1 {
                continue;
            } else if p0.x < x1 {
                p0 = point(x1, p0.y + (p1.y - p0.y) * ((x1 - p0.x) / (p1.x - p0.x)));
            } else if p1.x < x1 {
                p1 = point(x1, p0.y + (p1.y - p0.y) * ((x1 - p0.x) / (p1.x - p0.x)));
            }

            if p0.y < y1 && p1.y < y1 {
                continue;
            } else if p0.y < y1 {
                p0 = point(p0.x + (p1.x - p0.x) * ((y1 - p0.y) / (p1.y - p0.y)), y1);
            } else if p1.y < y1 {
                p1 = point(p0.x + (p1.x - p0.x) * ((y1 - p0.y) / (p1.y - p0.y)), y1);
            }

            if p0.x >= x2 && p1.x >= x2 {
                continue;
            } else if p0.x >= x2 {
                p0 = point(x2, p0.y + (p1.y - p0.y) * ((x2 - p0.x) / (p1.x - p0.x)));
            } else if p1.x >= x2 {
                p1 = point(x2, p0.y + (p1.y - p0.y) * ((x2 - p0.x) / (p1.x - p0.x)));
            }

            if p0.y >= y2 && p1.y >= y2 {
                continue;
            } else if p0.y >= y2 {
                p0 = point(p0.x + (p1.x - p0.x) * ((y2 - p0.y) / (p1.y - p0.y)), y2);
            } else if p1.y >= y2 {
                p1 = point(p0.x + (p1.x - p0.x) * ((y2 - p0.y) / (p1.y - p0.y)), y2);
            }

            let p0: GeometryCoordinate = p0.cast();
            let p1: GeometryCoordinate = p1.cast();

            let continues = current
                .and_then(|index| clipped_lines[index].0.last())
                .map_or(false, |last| *last == p0);
            if !continues {
                clipped_lines.push(GeometryCoordinates(vec![p0]));
                current = Some(clipped_lines.len() - 1);
            }
            if let Some(index) = current {
                clipped_lines[index].0.push(p1);
            }
        }
    }

    clipped_lines
}

#[cfg(test)]
mod tests {
    use crate::{
        coords::EXTENT,
        geometry::{clip_line::clip_lines, GeometryCoordinates},
    };

    #[test]
    fn keeps_lines_inside() {
        let line = GeometryCoordinates::from_xy(&[(10, 10), (100, 10), (100, 200)]);
        let clipped = clip_lines(&vec![line.clone()], 0.0, 0.0, EXTENT, EXTENT);
        assert_eq!(clipped, vec![line]);
    }

    #[test]
    fn clips_at_the_edges() {
        let line = GeometryCoordinates::from_xy(&[(-100, 50), (100, 50)]);
        let clipped = clip_lines(&vec![line], 0.0, 0.0, EXTENT, EXTENT);
        assert_eq!(
            clipped,
            vec![GeometryCoordinates::from_xy(&[(0, 50), (100, 50)])]
        );
    }

    #[test]
    fn splits_lines_leaving_the_box() {
        let line = GeometryCoordinates::from_xy(&[(10, 10), (10, -10), (20, -10), (20, 10)]);
        let clipped = clip_lines(&vec![line], 0.0, 0.0, EXTENT, EXTENT);
        assert_eq!(
            clipped,
            vec![
                GeometryCoordinates::from_xy(&[(10, 10), (10, 0)]),
                GeometryCoordinates::from_xy(&[(20, 0), (20, 10)]),
            ]
        );
    }

    #[test]
    fn drops_lines_outside() {
        let line = GeometryCoordinates::from_xy(&[(5000, 10), (6000, 10)]);
        assert!(clip_lines(&vec![line], 0.0, 0.0, EXTENT, EXTENT).is_empty());
    }
}
