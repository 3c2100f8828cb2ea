use std::collections::{BTreeMap, BTreeSet};

use bitflags::bitflags;

use crate::{
    euclid::Rect,
    text::font_stack::{FontStack, FontStackKey},
    TileSpace,
};

pub type GlyphId = char;
pub type GlyphIds = BTreeSet<GlyphId>;

#[derive(Debug, PartialEq, Eq, Default, Copy, Clone)]
pub struct GlyphMetrics {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub advance: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Glyph {
    pub id: GlyphId,
    pub metrics: GlyphMetrics,
}

impl Glyph {
    /// Border of the signed distance field around every glyph bitmap.
    pub const BORDER_SIZE: u8 = 3;
}

/// Glyphs of one font stack. `None` marks a glyph the font stack does not have.
pub type Glyphs = BTreeMap<GlyphId, Option<Glyph>>;
pub type GlyphMap = BTreeMap<FontStackKey, Glyphs>;

/// Location of a glyph in the glyph atlas.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphPosition {
    pub rect: Rect<u16, TileSpace>,
    pub metrics: GlyphMetrics,
}

pub type GlyphPositionMap = BTreeMap<GlyphId, GlyphPosition>;
pub type GlyphPositions = BTreeMap<FontStackKey, GlyphPositionMap>;

/// Glyphs a tile needs, per font stack.
pub type GlyphDependencies = BTreeMap<FontStack, GlyphIds>;

#[derive(Debug, Clone)]
pub struct PositionedGlyph {
    pub glyph: GlyphId,
    pub x: f64,
    pub y: f64,
    pub vertical: bool,
    /// Atlas location, `None` for glyphs without a bitmap
    pub rect: Option<Rect<u16, TileSpace>>,
    pub metrics: GlyphMetrics,
}

#[derive(Debug, Default, Clone)]
pub struct PositionedLine {
    pub positioned_glyphs: Vec<PositionedGlyph>,
}

/// A text laid out in glyph units around the label anchor.
#[derive(Debug, Clone, Default)]
pub struct Shaping {
    pub positioned_lines: Vec<PositionedLine>,
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
    pub writing_mode: WritingModeType,
    /// The text which was shaped, after trimming and punctuation replacement
    pub text: String,
    pub line_count: usize,
    pub max_line_length: f64,
    pub verticalizable: bool,
}

impl Shaping {
    // The y offset *should* be part of the font metadata.
    pub const Y_OFFSET: i32 = -17;

    pub fn new(x: f64, y: f64, writing_mode: WritingModeType) -> Self {
        Self {
            positioned_lines: vec![],
            top: y,
            bottom: y,
            left: x,
            right: x,
            writing_mode,
            text: String::new(),
            line_count: 0,
            max_line_length: 0.0,
            verticalizable: false,
        }
    }

    pub fn is_any_line_not_empty(&self) -> bool {
        self.positioned_lines
            .iter()
            .any(|line| !line.positioned_glyphs.is_empty())
    }

    pub fn positioned_glyphs(&self) -> impl Iterator<Item = &PositionedGlyph> {
        self.positioned_lines
            .iter()
            .flat_map(|line| line.positioned_glyphs.iter())
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct WritingModeType: u8 {
        const None = 0;
        const Horizontal = 1 << 0;
        const Vertical = 1 << 1;
        /// Horizontal text which has no vertical alternative
        const HorizontalOnly = Self::Horizontal.bits() | 1 << 2;
    }
}
