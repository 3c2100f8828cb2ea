//! Render-ready buffers produced by the layout of a symbol layer.

pub mod symbol_bucket;
