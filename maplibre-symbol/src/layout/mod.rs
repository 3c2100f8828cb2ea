//! The symbol layout pass and the per-tile job which runs it.

pub mod dedup;
pub mod shaping_adapter;
pub mod sizes;
pub mod symbol_instance;
pub mod symbol_layout;
pub mod tile_job;
