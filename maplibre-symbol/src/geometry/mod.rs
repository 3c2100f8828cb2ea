//! Tile geometry and the geometric algorithms which produce label anchors.

use std::ops::{Deref, Index};

use crate::{euclid::Point2D, TileSpace};

pub mod anchor;
pub mod classify_rings;
pub mod clip_line;
pub mod get_anchors;
pub mod polylabel;

pub type GeometryCoordinate = Point2D<i16, TileSpace>;

/// A line or ring of a feature in tile coordinates.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct GeometryCoordinates(pub Vec<GeometryCoordinate>);

impl GeometryCoordinates {
    pub fn from_xy(points: &[(i16, i16)]) -> Self {
        Self(points.iter().map(|(x, y)| Point2D::new(*x, *y)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the line in tile units.
    pub fn line_length(&self) -> f64 {
        self.0
            .windows(2)
            .map(|pair| pair[0].cast::<f64>().distance_to(pair[1].cast::<f64>()))
            .sum()
    }
}

impl Index<usize> for GeometryCoordinates {
    type Output = GeometryCoordinate;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl Deref for GeometryCoordinates {
    type Target = [GeometryCoordinate];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub type GeometryCollection = Vec<GeometryCoordinates>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Unknown = 0,
    Point = 1,
    LineString = 2,
    Polygon = 3,
}
