//! Symbol layer style: layout properties and the zoom and data dependent values they hold.

pub mod property;
pub mod style_types;
pub mod symbol_layer;
