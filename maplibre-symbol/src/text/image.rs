use std::collections::{BTreeSet, HashMap};

use crate::{euclid::Rect, TileSpace};

/// A sprite image an icon can refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: String,
    /// Pixel ratio of the sprite image.
    pub pixel_ratio: f64,
    /// Whether this image should be interpreted as a signed distance field icon.
    pub sdf: bool,
}

pub type ImageMap = HashMap<String, Image>;

/// Names of the images a tile needs.
pub type ImageDependencies = BTreeSet<String>;

/// Location of an image in the icon atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePosition {
    pub pixel_ratio: f64,
    pub padded_rect: Rect<u16, TileSpace>,
    pub sdf: bool,
}

impl ImagePosition {
    pub const PADDING: u16 = 1;

    pub fn tl(&self) -> [u16; 2] {
        [
            self.padded_rect.min().x + Self::PADDING,
            self.padded_rect.min().y + Self::PADDING,
        ]
    }

    pub fn br(&self) -> [u16; 2] {
        [
            self.padded_rect.min().x + self.padded_rect.width() - Self::PADDING,
            self.padded_rect.min().y + self.padded_rect.height() - Self::PADDING,
        ]
    }

    /// Size of the image in CSS pixels.
    pub fn display_size(&self) -> [f64; 2] {
        [
            (self.padded_rect.width() - Self::PADDING * 2) as f64 / self.pixel_ratio,
            (self.padded_rect.height() - Self::PADDING * 2) as f64 / self.pixel_ratio,
        ]
    }
}

pub type ImagePositions = HashMap<String, ImagePosition>;

#[cfg(test)]
mod tests {
    use crate::{
        euclid::{Point2D, Rect, Size2D},
        text::image::ImagePosition,
    };

    #[test]
    fn display_size_removes_padding() {
        let position = ImagePosition {
            pixel_ratio: 2.0,
            padded_rect: Rect::new(Point2D::new(10, 20), Size2D::new(42, 22)),
            sdf: false,
        };
        assert_eq!(position.display_size(), [20.0, 10.0]);
        assert_eq!(position.tl(), [11, 21]);
        assert_eq!(position.br(), [51, 41]);
    }
}
