//! **tilefog**: fog of war for 2D tile maps.
//!
//! Two visibility planes are tracked per map:
//!
//! - **static** (permanent) fog: a tile stays revealed once it has been seen.
//! - **dynamic** (transient) fog: a tile is revealed only while it is within
//!   the observer's vision range.
//!
//! Vision is a Manhattan diamond around a single observer. The boundary
//! between fog and revealed tiles is drawn with autotile sub-tiles chosen
//! from each fog tile's eight neighbours.
//!
//! # Quick start
//!
//! ```
//! use tilefog::{FogModes, FogOfWar};
//! use tilefog_core::Point;
//!
//! let mut fog = FogOfWar::default();
//! fog.on_map_loaded(20, 15);
//! fog.configure(FogModes::BOTH, 3, false).unwrap();
//! fog.on_observer_landed(Point::new(4, 4));
//!
//! assert!(fog.is_visible(Point::new(4, 7)));
//! assert!(!fog.is_visible(Point::new(4, 8)));
//! ```

pub mod autotile;
pub mod config;
pub mod error;
pub mod fog;
pub mod overlay;
pub mod sheet;
pub mod visibility;

pub use autotile::{EdgeKey, NeighborMask, SpriteIndex};
pub use config::{ConfigError, FogConfig, FogModes, MapFogSetup, VisionRange};
pub use error::FogError;
pub use fog::{FogActor, FogOfWar, FogSink, LayerKind, LayerView};
pub use overlay::{OverlayCompositor, TileLayer};
pub use sheet::{AutotileSheet, SheetError};
pub use visibility::{Plane, TileState, VisibilityGrid};
