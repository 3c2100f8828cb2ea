//! Tile-local coordinate constants.

pub const EXTENT: f64 = 4096.0;
pub const TILE_SIZE: f64 = 512.0;

/// Number of tile units per device pixel for a tile rendered with the given overscaling.
pub fn tile_pixel_ratio(overscaling: f64) -> f64 {
    EXTENT / (TILE_SIZE * overscaling)
}

/// Whether a position lies in `[0, EXTENT)` on both axes.
pub fn is_within_extent(x: f64, y: f64) -> bool {
    (0.0..EXTENT).contains(&x) && (0.0..EXTENT).contains(&y)
}

#[cfg(test)]
mod tests {
    use crate::coords::{is_within_extent, tile_pixel_ratio, EXTENT};

    #[test]
    fn pixel_ratio_follows_overscaling() {
        assert_eq!(tile_pixel_ratio(1.0), 8.0);
        assert_eq!(tile_pixel_ratio(2.0), 4.0);
    }

    #[test]
    fn extent_is_half_open() {
        assert!(is_within_extent(0.0, 0.0));
        assert!(is_within_extent(EXTENT - 1.0, 10.0));
        assert!(!is_within_extent(EXTENT, 10.0));
        assert!(!is_within_extent(10.0, -0.5));
    }
}
