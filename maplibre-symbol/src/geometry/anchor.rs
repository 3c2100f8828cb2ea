use crate::{euclid::Point2D, TileSpace};

/// A candidate position for a label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Point2D<f64, TileSpace>,
    /// Angle of the line segment the anchor sits on, 0 for point labels
    pub angle: f64,
    /// Index of the line segment the anchor sits on. Point and polygon labels have none.
    pub segment: Option<usize>,
}

impl Anchor {
    pub fn new(x: f64, y: f64, angle: f64, segment: Option<usize>) -> Self {
        Self {
            point: Point2D::new(x, y),
            angle,
            segment,
        }
    }

    /// Snaps the anchor position to whole tile units.
    pub fn round(mut self) -> Self {
        self.point = self.point.round();
        self
    }
}

pub type Anchors = Vec<Anchor>;
