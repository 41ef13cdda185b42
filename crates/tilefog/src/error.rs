//! Errors returned by the fog tracker.

use std::fmt;

use tilefog_core::Point;

use crate::config::ConfigError;
use crate::sheet::SheetError;

/// Error type for [`FogOfWar`](crate::FogOfWar) operations.
#[derive(Debug)]
pub enum FogError {
    /// Rejected configuration; the previous settings are kept.
    Config(ConfigError),
    /// The autotile sheet could not be loaded.
    Sheet(SheetError),
    /// No map is loaded.
    NoMap,
    /// Fog is on but no autotile sheet has been loaded.
    SheetMissing,
    /// A restored grid does not match the loaded map.
    SizeMismatch { expected: Point, found: Point },
}

impl fmt::Display for FogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FogError::Config(e) => write!(f, "{e}"),
            FogError::Sheet(e) => write!(f, "{e}"),
            FogError::NoMap => write!(f, "no map loaded"),
            FogError::SheetMissing => write!(f, "no autotile sheet loaded"),
            FogError::SizeMismatch { expected, found } => {
                write!(f, "fog grid size {found} does not match map size {expected}")
            }
        }
    }
}

impl std::error::Error for FogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FogError::Config(e) => Some(e),
            FogError::Sheet(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for FogError {
    fn from(e: ConfigError) -> Self {
        FogError::Config(e)
    }
}

impl From<SheetError> for FogError {
    fn from(e: SheetError) -> Self {
        FogError::Sheet(e)
    }
}
