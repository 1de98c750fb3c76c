//! UI layer for the munro map: app shell, map surface, and tile textures.

pub mod app;
pub mod map_view;
pub mod tile_cache;

pub use app::{MunroMapApp, StartupConfig};
