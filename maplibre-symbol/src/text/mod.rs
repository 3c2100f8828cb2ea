//! Glyph and icon resources, text shaping and the geometry derived from shaped labels.

pub mod collision_feature;
pub mod font_stack;
pub mod glyph;
pub mod i18n;
pub mod image;
pub mod quads;
pub mod shaping;
