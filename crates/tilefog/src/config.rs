//! Fog configuration: vision range, enabled planes, layer opacities, and the
//! map-name tag syntax used to switch fog on per map.

use std::fmt;

/// Largest vision range accepted.
pub const MAX_RANGE: i32 = 9;

/// Vision range used when a map enables fog without naming one.
pub const DEFAULT_RANGE: VisionRange = VisionRange(3);

/// Errors in fog configuration. The previous configuration stays in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Range outside `0..=9`.
    RangeOutOfBounds(i32),
    /// A required on/off flag was not given.
    MissingMode(&'static str),
    /// A map-name tag that is neither a mode nor a range.
    UnknownTag(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RangeOutOfBounds(r) => {
                write!(f, "invalid fog range {r} (only 0-{MAX_RANGE} is valid)")
            }
            Self::MissingMode(which) => write!(f, "fog mode flag `{which}` is required"),
            Self::UnknownTag(tag) => write!(f, "unknown fog tag `{tag}`"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Observer vision radius in tiles (Manhattan distance), always `0..=9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32", into = "i32"))]
pub struct VisionRange(u8);

impl VisionRange {
    /// Validate a range. Values outside `0..=9` are rejected, never clamped.
    pub fn new(range: i32) -> Result<Self, ConfigError> {
        if (0..=MAX_RANGE).contains(&range) {
            Ok(Self(range as u8))
        } else {
            Err(ConfigError::RangeOutOfBounds(range))
        }
    }

    /// The radius as a signed tile distance.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0 as i32
    }
}

impl Default for VisionRange {
    fn default() -> Self {
        DEFAULT_RANGE
    }
}

impl TryFrom<i32> for VisionRange {
    type Error = ConfigError;

    fn try_from(range: i32) -> Result<Self, ConfigError> {
        Self::new(range)
    }
}

impl From<VisionRange> for i32 {
    fn from(r: VisionRange) -> Self {
        r.get()
    }
}

/// Which visibility planes are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FogModes {
    /// Static fog: tiles stay revealed once seen.
    pub permanent: bool,
    /// Dynamic fog: tiles are revealed only while in range.
    pub transient: bool,
}

impl FogModes {
    /// Both planes off.
    pub const OFF: Self = Self {
        permanent: false,
        transient: false,
    };
    /// Both planes on.
    pub const BOTH: Self = Self {
        permanent: true,
        transient: true,
    };

    pub const fn new(permanent: bool, transient: bool) -> Self {
        Self {
            permanent,
            transient,
        }
    }

    /// Build modes from optional flags, as received from a scripting or
    /// settings surface where either flag may be absent.
    pub fn from_flags(
        permanent: Option<bool>,
        transient: Option<bool>,
    ) -> Result<Self, ConfigError> {
        let permanent = permanent.ok_or(ConfigError::MissingMode("permanent"))?;
        let transient = transient.ok_or(ConfigError::MissingMode("transient"))?;
        Ok(Self::new(permanent, transient))
    }

    /// Whether any plane is on.
    #[inline]
    pub const fn any(self) -> bool {
        self.permanent || self.transient
    }
}

/// Rendering and behaviour settings that stay fixed for a [`FogOfWar`].
///
/// [`FogOfWar`]: crate::FogOfWar
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FogConfig {
    /// Range used by map-name setup when no range tag is present.
    pub default_range: VisionRange,
    /// Whether actors standing in dynamic fog are hidden.
    pub hide_actors_in_fog: bool,
    /// Opacity of the static fog layer (drawn on top).
    pub static_opacity: u8,
    /// Opacity of the dynamic fog layer.
    pub dynamic_opacity: u8,
    /// Resource name of the autotile image used for both layers.
    pub autotile: String,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            default_range: DEFAULT_RANGE,
            hide_actors_in_fog: true,
            static_opacity: 255,
            dynamic_opacity: 100,
            autotile: "fow_default".to_string(),
        }
    }
}

/// Fog settings requested by a map's name tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapFogSetup {
    pub modes: FogModes,
    pub range: VisionRange,
}

impl MapFogSetup {
    /// Parse fog tags from a map name.
    ///
    /// Tags are `<...>` groups; spaces are ignored and matching is
    /// case-insensitive. The first tag must be `<FOW>` for fog to be on,
    /// otherwise `Ok(None)` is returned. Following tags are `<S>` (static),
    /// `<D>` (dynamic) or a range digit. `<FOW>` with neither mode tag turns
    /// both planes on; a missing range falls back to `default_range`.
    pub fn parse(name: &str, default_range: VisionRange) -> Result<Option<Self>, ConfigError> {
        let compact: String = name.chars().filter(|c| *c != ' ').collect();
        let mut tags = tag_bodies(&compact);
        match tags.next() {
            Some(first) if first.eq_ignore_ascii_case("FOW") => {}
            _ => return Ok(None),
        }
        let mut modes = FogModes::OFF;
        let mut range = None;
        for tag in tags {
            if tag.eq_ignore_ascii_case("S") {
                modes.permanent = true;
            } else if tag.eq_ignore_ascii_case("D") {
                modes.transient = true;
            } else if let Ok(n) = tag.parse::<i32>() {
                range = Some(VisionRange::new(n)?);
            } else {
                return Err(ConfigError::UnknownTag(tag.to_string()));
            }
        }
        if !modes.any() {
            modes = FogModes::BOTH;
        }
        Ok(Some(Self {
            modes,
            range: range.unwrap_or(default_range),
        }))
    }
}

/// Bodies of well-formed `<tag>` groups, in order. Tag bodies are limited to
/// ASCII alphanumerics, `_`, `.` and `,`; anything else is not a tag.
fn tag_bodies(s: &str) -> impl Iterator<Item = &str> {
    s.split('<').skip(1).filter_map(|part| {
        let (body, _) = part.split_once('>')?;
        let valid = !body.is_empty()
            && body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ','));
        valid.then_some(body)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_rejected_not_clamped() {
        assert_eq!(VisionRange::new(0).map(VisionRange::get), Ok(0));
        assert_eq!(VisionRange::new(9).map(VisionRange::get), Ok(9));
        assert_eq!(VisionRange::new(10), Err(ConfigError::RangeOutOfBounds(10)));
        assert_eq!(VisionRange::new(-1), Err(ConfigError::RangeOutOfBounds(-1)));
    }

    #[test]
    fn modes_require_both_flags() {
        assert_eq!(FogModes::from_flags(Some(true), Some(false)), Ok(FogModes::new(true, false)));
        assert_eq!(
            FogModes::from_flags(None, Some(true)),
            Err(ConfigError::MissingMode("permanent"))
        );
        assert_eq!(
            FogModes::from_flags(Some(true), None),
            Err(ConfigError::MissingMode("transient"))
        );
    }

    #[test]
    fn map_without_fow_tag_has_no_fog() {
        assert_eq!(MapFogSetup::parse("Castle Prison", DEFAULT_RANGE), Ok(None));
        assert_eq!(MapFogSetup::parse("Cave <S>", DEFAULT_RANGE), Ok(None));
    }

    #[test]
    fn bare_fow_tag_enables_both_with_default_range() {
        let setup = MapFogSetup::parse("Dark Cave <FOW>", DEFAULT_RANGE).unwrap();
        assert_eq!(
            setup,
            Some(MapFogSetup {
                modes: FogModes::BOTH,
                range: DEFAULT_RANGE,
            })
        );
    }

    #[test]
    fn mode_and_range_tags() {
        let setup = MapFogSetup::parse("Mine <fow> <s> <5>", DEFAULT_RANGE)
            .unwrap()
            .unwrap();
        assert_eq!(setup.modes, FogModes::new(true, false));
        assert_eq!(setup.range.get(), 5);

        let setup = MapFogSetup::parse("<FOW><D>", DEFAULT_RANGE).unwrap().unwrap();
        assert_eq!(setup.modes, FogModes::new(false, true));
        assert_eq!(setup.range, DEFAULT_RANGE);
    }

    #[test]
    fn bad_tags_are_errors() {
        assert_eq!(
            MapFogSetup::parse("<FOW><12>", DEFAULT_RANGE),
            Err(ConfigError::RangeOutOfBounds(12))
        );
        assert_eq!(
            MapFogSetup::parse("<FOW><X>", DEFAULT_RANGE),
            Err(ConfigError::UnknownTag("X".to_string()))
        );
    }

    #[test]
    fn default_config() {
        let cfg = FogConfig::default();
        assert_eq!(cfg.default_range.get(), 3);
        assert!(cfg.hide_actors_in_fog);
        assert_eq!((cfg.static_opacity, cfg.dynamic_opacity), (255, 100));
        assert_eq!(cfg.autotile, "fow_default");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_range_is_validated() {
        let r: VisionRange = serde_json::from_str("4").unwrap();
        assert_eq!(r.get(), 4);
        assert_eq!(serde_json::to_string(&r).unwrap(), "4");
        assert!(serde_json::from_str::<VisionRange>("12").is_err());
        assert!(serde_json::from_str::<VisionRange>("-1").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_partial_config_uses_defaults() {
        let cfg: FogConfig = serde_json::from_str(r#"{"dynamic_opacity": 50}"#).unwrap();
        assert_eq!(
            cfg,
            FogConfig {
                dynamic_opacity: 50,
                ..FogConfig::default()
            }
        );
        let bad = serde_json::from_str::<FogConfig>(r#"{"default_range": 12}"#);
        assert!(bad.is_err());
    }
}
