use crate::geometry::{GeometryCollection, GeometryCoordinates};

/// Twice the signed area of a ring. The sign tells the winding order.
pub fn signed_area(ring: &GeometryCoordinates) -> f64 {
    let mut sum = 0.0;
    let len = ring.len();
    if len == 0 {
        return sum;
    }
    let mut j = len - 1;
    for i in 0..len {
        let p1 = ring[i].cast::<f64>();
        let p2 = ring[j].cast::<f64>();
        sum += (p2.x - p1.x) * (p1.y + p2.y);
        j = i;
    }
    sum
}

/// Groups rings into polygons. The winding order of the first ring with an area marks outer
/// rings, every following ring with the opposite order is a hole of the last outer ring. Rings
/// without area are dropped. With `max_rings > 1` polygons keep only their largest holes.
pub fn classify_rings(rings: &GeometryCollection, max_rings: usize) -> Vec<GeometryCollection> {
    if rings.len() <= 1 {
        return vec![rings.clone()];
    }

    let mut polygons: Vec<GeometryCollection> = Vec::new();
    let mut polygon: Option<Vec<(f64, GeometryCoordinates)>> = None;
    let mut ccw: Option<bool> = None;

    let mut finish = |polygon: Vec<(f64, GeometryCoordinates)>| {
        let mut rings = polygon;
        if max_rings > 1 && rings.len() > max_rings {
            // keep the outer ring and the largest holes
            rings[1..].sort_by(|a, b| b.0.total_cmp(&a.0));
            rings.truncate(max_rings);
        }
        polygons.push(rings.into_iter().map(|(_, ring)| ring).collect());
    };

    for ring in rings {
        let area = signed_area(ring);
        if area == 0.0 {
            continue;
        }

        let ring_ccw = area < 0.0;
        let outer = *ccw.get_or_insert(ring_ccw);

        if outer == ring_ccw {
            if let Some(previous) = polygon.take() {
                finish(previous);
            }
            polygon = Some(vec![(area.abs(), ring.clone())]);
        } else if let Some(current) = polygon.as_mut() {
            current.push((area.abs(), ring.clone()));
        }
    }

    if let Some(last) = polygon {
        finish(last);
    }

    polygons
}

#[cfg(test)]
mod tests {
    use crate::geometry::{
        classify_rings::{classify_rings, signed_area},
        GeometryCoordinates,
    };

    fn square(x: i16, y: i16, size: i16, reverse: bool) -> GeometryCoordinates {
        let mut points = vec![
            (x, y),
            (x + size, y),
            (x + size, y + size),
            (x, y + size),
            (x, y),
        ];
        if reverse {
            points.reverse();
        }
        GeometryCoordinates::from_xy(&points)
    }

    #[test]
    fn area_sign_follows_winding() {
        let area = signed_area(&square(0, 0, 10, false));
        assert_eq!(area.abs(), 200.0);
        assert_eq!(signed_area(&square(0, 0, 10, true)), -area);
    }

    #[test]
    fn groups_holes_with_outer_rings() {
        let rings = vec![
            square(0, 0, 100, false),
            square(10, 10, 10, true),
            square(50, 50, 10, true),
            square(200, 200, 100, false),
            square(210, 210, 10, true),
        ];
        let polygons = classify_rings(&rings, 0);
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].len(), 3);
        assert_eq!(polygons[1].len(), 2);
        assert_eq!(polygons[1][0], rings[3]);
    }

    #[test]
    fn drops_degenerate_rings() {
        let rings = vec![
            GeometryCoordinates::from_xy(&[(0, 0), (10, 0), (20, 0)]),
            square(0, 0, 100, false),
        ];
        let polygons = classify_rings(&rings, 0);
        assert_eq!(polygons, vec![vec![rings[1].clone()]]);
    }

    #[test]
    fn limits_holes_to_the_largest() {
        let rings = vec![
            square(0, 0, 100, false),
            square(10, 10, 5, true),
            square(50, 50, 20, true),
            square(30, 30, 10, true),
        ];
        let polygons = classify_rings(&rings, 2);
        assert_eq!(polygons, vec![vec![rings[0].clone(), rings[2].clone()]]);
    }
}
