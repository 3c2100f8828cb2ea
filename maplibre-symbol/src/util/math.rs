//! Small geometric helpers on euclid types.

use std::f64::consts::PI;

use crate::euclid::{Point2D, Vector2D};

pub fn rotate<U>(a: &Vector2D<f64, U>, angle: f64) -> Vector2D<f64, U> {
    let cos = angle.cos();
    let sin = angle.sin();
    let x = cos * a.x - sin * a.y;
    let y = sin * a.x + cos * a.y;
    Vector2D::new(x, y)
}

/// Converts degrees to radians
pub fn deg2radf(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Angle of the vector pointing from `from` to `to`.
pub fn angle_to<U>(to: &Point2D<f64, U>, from: &Point2D<f64, U>) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

pub fn interpolate(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

pub trait MinMax<T> {
    fn max_value(self) -> T;
    fn min_value(self) -> T;
}

impl MinMax<f64> for [f64; 4] {
    fn max_value(self) -> f64 {
        self.into_iter().fold(f64::NEG_INFINITY, f64::max)
    }

    fn min_value(self) -> f64 {
        self.into_iter().fold(f64::INFINITY, f64::min)
    }
}

pub fn convert_point_f64<U>(point: &Point2D<i16, U>) -> Point2D<f64, U> {
    Point2D::new(point.x as f64, point.y as f64)
}
