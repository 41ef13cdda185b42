//! **tilefog-core**: geometry and plane storage for tile-grid fog of war.
//!
//! Provides the tile coordinate type, half-open ranges, Manhattan diamond
//! iteration and a typed per-tile grid shared by the *tilefog* crates.

pub mod geom;
pub mod grid;

pub use geom::{Diamond, Point, Range, Ring};
pub use grid::Grid;
