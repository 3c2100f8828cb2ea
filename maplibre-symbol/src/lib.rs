//! # maplibre-symbol
//!
//! Symbol layout for vector tiles. Given the decoded features of a tile, the resolved glyph and
//! icon metrics and the layout properties of a symbol layer, the layout pass computes where labels
//! may be placed, shapes their glyphs and icons, records the padded collision footprint of every
//! candidate and packs everything into render-ready buffers.
//!
//! The entry points are [`layout::symbol_layout::perform_symbol_layout`] for the synchronous pass
//! and [`layout::tile_job::layout_symbol_tile`] for the asynchronous per-tile task which first
//! awaits glyphs and images and then commits the finished [`buckets::symbol_bucket::SymbolBucket`].

pub use lyon::geom::euclid;

pub mod buckets;
pub mod coords;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod style;
pub mod text;
pub mod util;

/// The unit in which geometries or symbols are on a tile (0-EXTENT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileSpace;
