//! Utilities shared by the layout modules.

pub mod constants;
pub mod math;
pub mod murmur;
pub mod warn_once;
