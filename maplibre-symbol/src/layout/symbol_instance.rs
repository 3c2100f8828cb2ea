use std::ops::Range;

use crate::{
    geometry::anchor::Anchor,
    style::style_types::TextJustifyType,
    text::glyph::Shaping,
};

/// All shapings of the text of one feature.
#[derive(Debug, Clone, Default)]
pub struct ShapedTextOrientations {
    /// Horizontal shapings in the order their justification was first requested
    pub horizontal: Vec<(TextJustifyType, Shaping)>,
    pub vertical: Option<Shaping>,
}

impl ShapedTextOrientations {
    pub fn get(&self, justify: TextJustifyType) -> Option<&Shaping> {
        self.horizontal
            .iter()
            .find(|(justification, _)| *justification == justify)
            .map(|(_, shaping)| shaping)
    }

    pub fn contains(&self, justify: TextJustifyType) -> bool {
        self.get(justify).is_some()
    }

    /// The first horizontal shaping. All justifications have about the same dimensions, so this
    /// one stands in for all of them when only the size matters.
    pub fn default_horizontal(&self) -> Option<&Shaping> {
        self.horizontal.first().map(|(_, shaping)| shaping)
    }

    pub fn has_text(&self) -> bool {
        !self.horizontal.is_empty()
    }
}

/// Per-justification values of a symbol instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Justified<T> {
    pub right: T,
    pub center: T,
    pub left: T,
}

impl<T> Justified<T> {
    pub fn get_mut(&mut self, justify: TextJustifyType) -> &mut T {
        match justify {
            TextJustifyType::Right => &mut self.right,
            TextJustifyType::Left => &mut self.left,
            TextJustifyType::Center | TextJustifyType::Auto => &mut self.center,
        }
    }
}

/// One candidate placement of a feature's label, the unit the collision pass decides on.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInstance {
    pub anchor: Anchor,
    /// Index of the placed text symbol for every justification, `None` if not shaped
    pub placed_text_indices: Justified<Option<usize>>,
    pub placed_vertical_text_index: Option<usize>,
    /// Hash of the shaped text, equal for labels with the same text
    pub key: u32,
    pub text_box_start_index: usize,
    pub text_box_end_index: usize,
    pub icon_box_start_index: usize,
    pub icon_box_end_index: usize,
    pub feature_index: usize,
    pub num_glyph_vertices: Justified<usize>,
    pub num_vertical_glyph_vertices: usize,
    pub num_icon_vertices: usize,
    /// Assigned later by the cross tile index
    pub cross_tile_id: u32,
    pub line_count: usize,
    pub max_line_length: f64,
    pub text_box_scale: f64,
}

impl SymbolInstance {
    pub fn text_box_range(&self) -> Range<usize> {
        self.text_box_start_index..self.text_box_end_index
    }

    pub fn icon_box_range(&self) -> Range<usize> {
        self.icon_box_start_index..self.icon_box_end_index
    }

    /// Placed text indices as stored in the instance buffer: right, center, left and vertical,
    /// with -1 for variants which were not shaped.
    pub fn packed_placed_text_indices(&self) -> [i32; 4] {
        let pack = |index: Option<usize>| index.map_or(-1, |index| index as i32);
        [
            pack(self.placed_text_indices.right),
            pack(self.placed_text_indices.center),
            pack(self.placed_text_indices.left),
            pack(self.placed_vertical_text_index),
        ]
    }

    /// Every vertex count recorded on the instance.
    pub fn vertex_counts(&self) -> [usize; 5] {
        [
            self.num_glyph_vertices.right,
            self.num_glyph_vertices.center,
            self.num_glyph_vertices.left,
            self.num_vertical_glyph_vertices,
            self.num_icon_vertices,
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        geometry::anchor::Anchor,
        layout::symbol_instance::{Justified, ShapedTextOrientations, SymbolInstance},
        style::style_types::TextJustifyType,
        text::glyph::{Shaping, WritingModeType},
    };

    #[test]
    fn justified_lookup() {
        let mut counts = Justified::<usize>::default();
        *counts.get_mut(TextJustifyType::Left) += 8;
        *counts.get_mut(TextJustifyType::Auto) += 4;
        assert_eq!(
            counts,
            Justified {
                right: 0,
                center: 4,
                left: 8
            }
        );

        let mut orientations = ShapedTextOrientations::default();
        assert!(orientations.default_horizontal().is_none());
        orientations.horizontal.push((
            TextJustifyType::Right,
            Shaping::new(1.0, 0.0, WritingModeType::Horizontal),
        ));
        orientations.horizontal.push((
            TextJustifyType::Left,
            Shaping::new(2.0, 0.0, WritingModeType::Horizontal),
        ));
        assert!(orientations.has_text());
        assert!(orientations.contains(TextJustifyType::Left));
        assert!(!orientations.contains(TextJustifyType::Center));
        assert_eq!(orientations.default_horizontal().map(|s| s.left), Some(1.0));
    }

    #[test]
    fn packed_indices() {
        let instance = SymbolInstance {
            anchor: Anchor::new(1.0, 2.0, 0.0, None),
            placed_text_indices: Justified {
                right: None,
                center: Some(3),
                left: None,
            },
            placed_vertical_text_index: Some(0),
            key: 0,
            text_box_start_index: 0,
            text_box_end_index: 1,
            icon_box_start_index: 1,
            icon_box_end_index: 1,
            feature_index: 0,
            num_glyph_vertices: Justified {
                right: 0,
                center: 8,
                left: 0,
            },
            num_vertical_glyph_vertices: 8,
            num_icon_vertices: 0,
            cross_tile_id: 0,
            line_count: 1,
            max_line_length: 42.0,
            text_box_scale: 1.0,
        };
        assert_eq!(instance.packed_placed_text_indices(), [-1, 3, -1, 0]);
        assert_eq!(instance.vertex_counts(), [0, 8, 0, 8, 0]);
        assert!(instance.icon_box_range().is_empty());
        assert_eq!(instance.text_box_range(), 0..1);
    }
}
