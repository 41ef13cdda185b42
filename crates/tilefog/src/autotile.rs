//! Autotile edge resolution.
//!
//! A fog tile is drawn with one of the 48 sub-tiles of an autotile sheet,
//! chosen from which of its eight neighbours are still fog. Neighbours are
//! named by their numeric-keypad digit:
//!
//! ```text
//! 1 2 3      NW N NE
//! 4 . 6      W  .  E
//! 7 8 9      SW S SE
//! ```
//!
//! A pattern is an 8-bit [`NeighborMask`]. The sheet only distinguishes 47
//! patterns: a diagonal neighbour matters only when both orthogonal
//! neighbours beside it are fog too, so many raw masks draw the same tile.
//! The canonical patterns and the collapsed duplicates of the default sheet
//! are listed below in keypad-digit form and compiled into a 256-entry
//! lookup.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use tilefog_core::Point;

use crate::visibility::{Plane, TileState, VisibilityGrid};

/// Set of neighbour directions, one bit per keypad digit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeighborMask(u8);

impl NeighborMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0xff);

    /// Keypad 1.
    pub const NW: Self = Self(1 << 0);
    /// Keypad 2.
    pub const N: Self = Self(1 << 1);
    /// Keypad 3.
    pub const NE: Self = Self(1 << 2);
    /// Keypad 4.
    pub const W: Self = Self(1 << 3);
    /// Keypad 6.
    pub const E: Self = Self(1 << 4);
    /// Keypad 7.
    pub const SW: Self = Self(1 << 5);
    /// Keypad 8.
    pub const S: Self = Self(1 << 6);
    /// Keypad 9.
    pub const SE: Self = Self(1 << 7);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The mask as ascending keypad digits, e.g. `N | E | S` is `268`.
    /// The empty mask is `0`.
    pub fn keypad_digits(self) -> u32 {
        COMPASS
            .iter()
            .filter(|d| self.contains(d.mask))
            .fold(0, |acc, d| acc * 10 + d.digit)
    }
}

impl BitOr for NeighborMask {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NeighborMask {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for NeighborMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NeighborMask({})", self.keypad_digits())
    }
}

struct Direction {
    dx: i32,
    dy: i32,
    digit: u32,
    mask: NeighborMask,
}

/// Neighbours in keypad-digit order.
#[rustfmt::skip]
const COMPASS: [Direction; 8] = [
    Direction { dx: -1, dy: -1, digit: 1, mask: NeighborMask::NW },
    Direction { dx: 0, dy: -1, digit: 2, mask: NeighborMask::N },
    Direction { dx: 1, dy: -1, digit: 3, mask: NeighborMask::NE },
    Direction { dx: -1, dy: 0, digit: 4, mask: NeighborMask::W },
    Direction { dx: 1, dy: 0, digit: 6, mask: NeighborMask::E },
    Direction { dx: -1, dy: 1, digit: 7, mask: NeighborMask::SW },
    Direction { dx: 0, dy: 1, digit: 8, mask: NeighborMask::S },
    Direction { dx: 1, dy: 1, digit: 9, mask: NeighborMask::SE },
];

/// Position of a sub-tile in the 6×8 autotile layout, `0..48`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpriteIndex(u8);

impl SpriteIndex {
    /// Fog on every side.
    pub const SOLID: Self = Self(0);
    /// Fog tile with no fog neighbours.
    pub const ISOLATED: Self = Self(ISOLATED_KEY);

    pub const COLUMNS: u8 = 8;
    pub const ROWS: u8 = 6;

    /// Sub-tile at 1-based `row` and `col`: `(row-1)*8 + (col-1)`.
    pub fn from_row_col(row: u8, col: u8) -> Option<Self> {
        if (1..=Self::ROWS).contains(&row) && (1..=Self::COLUMNS).contains(&col) {
            Some(Self((row - 1) * Self::COLUMNS + (col - 1)))
        } else {
            None
        }
    }

    /// Offset into the sheet, `0..48`.
    #[inline]
    pub const fn offset(self) -> u8 {
        self.0
    }

    /// 1-based row in the layout.
    #[inline]
    pub const fn row(self) -> u8 {
        self.0 / Self::COLUMNS + 1
    }

    /// 1-based column in the layout.
    #[inline]
    pub const fn col(self) -> u8 {
        self.0 % Self::COLUMNS + 1
    }
}

/// Canonical neighbour pattern, one of the 47 the sheet can draw.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(u8);

impl EdgeKey {
    /// Collapse a raw neighbour mask onto its canonical pattern.
    #[inline]
    pub fn from_mask(mask: NeighborMask) -> Self {
        Self(LOOKUP[mask.bits() as usize])
    }

    /// The canonical neighbour pattern.
    #[inline]
    pub fn mask(self) -> NeighborMask {
        NeighborMask(keypad(CANONICAL_KEYS[self.0 as usize]))
    }

    /// Sub-tile drawing this pattern.
    #[inline]
    pub fn sprite(self) -> SpriteIndex {
        SpriteIndex(self.0)
    }
}

impl fmt::Debug for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeKey({})", CANONICAL_KEYS[self.0 as usize])
    }
}

/// Neighbours of `p` whose state in `plane` differs from `target`.
///
/// Off-map neighbours always differ, so fog at the map border closes
/// against the edge instead of opening onto nothing.
pub fn neighbor_mask(
    grid: &VisibilityGrid,
    p: Point,
    plane: Plane,
    target: TileState,
) -> NeighborMask {
    let mut mask = NeighborMask::NONE;
    for d in &COMPASS {
        if grid.state(p.shift(d.dx, d.dy), plane) != Some(target) {
            mask |= d.mask;
        }
    }
    mask
}

/// Edge pattern of `p` against `target`, or `None` when every neighbour
/// matches (no boundary to draw).
pub fn resolve(
    grid: &VisibilityGrid,
    p: Point,
    plane: Plane,
    target: TileState,
) -> Option<EdgeKey> {
    let mask = neighbor_mask(grid, p, plane, target);
    if mask.is_empty() {
        None
    } else {
        Some(EdgeKey::from_mask(mask))
    }
}

/// Sub-tile for a fog tile at `p`: its edge pattern against revealed
/// neighbours, or [`SpriteIndex::ISOLATED`] when none of them is fog.
pub fn fog_sprite(grid: &VisibilityGrid, p: Point, plane: Plane) -> SpriteIndex {
    resolve(grid, p, plane, TileState::Revealed).map_or(SpriteIndex::ISOLATED, EdgeKey::sprite)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// The 47 patterns the sheet draws, in sheet order: entry `i` is sub-tile `i`.
#[rustfmt::skip]
const CANONICAL_KEYS: [u32; 47] = [
    12346789, 2346789, 1246789, 246789, 1234678, 234678, 124678, 24678,
    1234689, 234689, 124689, 24689, 123468, 23468, 12468, 2468,
    23689, 2689, 2368, 268, 46789, 4678, 4689, 468,
    12478, 1248, 2478, 248, 12346, 2346, 1246, 246,
    28, 46, 689, 68, 478, 48, 124, 24,
    236, 26, 8, 6, 2, 4, 0,
];

/// Index of the empty pattern in [`CANONICAL_KEYS`].
const ISOLATED_KEY: u8 = 46;

/// Raw patterns drawn with the same sub-tile as a canonical one.
#[rustfmt::skip]
const ALIASES: [(u32, u32); 194] = [
    (123689, 23689), (236789, 23689), (1236789, 23689),
    (34689, 4689), (14689, 4689), (134689, 4689),
    (14678, 4678), (34678, 4678), (134678, 4678),
    (146789, 46789), (346789, 46789), (1346789, 46789),
    (23467, 2346), (23469, 2346), (234679, 2346),
    (123467, 12346), (123469, 12346), (1234679, 12346),
    (12467, 1246), (12469, 1246), (124679, 1246),
    (124789, 12478), (123478, 12478), (1234789, 12478),
    (146, 46), (346, 46), (467, 46), (469, 46),
    (1346, 46), (1467, 46), (1469, 46), (3467, 46),
    (3469, 46), (4679, 46), (13467, 46), (13469, 46),
    (14679, 46), (34679, 46), (134679, 46),
    (128, 28), (238, 28), (278, 28), (289, 28),
    (1238, 28), (1278, 28), (1289, 28), (2378, 28),
    (2389, 28), (2789, 28), (12378, 28), (12389, 28),
    (12789, 28), (23789, 28), (123789, 28),
    (1247, 124), (1234, 124), (1249, 124), (12347, 124),
    (12349, 124), (12479, 124), (123479, 124),
    (2369, 236), (1236, 236), (2367, 236), (12367, 236),
    (12369, 236), (23679, 236), (123679, 236),
    (147, 4), (14, 4), (47, 4), (34, 4),
    (49, 4), (134, 4), (347, 4), (349, 4),
    (149, 4), (479, 4), (1347, 4), (1479, 4),
    (1349, 4), (3479, 4), (13479, 4),
    (247, 24), (234, 24), (249, 24), (2347, 24),
    (2349, 24), (2479, 24), (23479, 24),
    (1478, 478), (3478, 478), (4789, 478), (134789, 478),
    (14789, 478), (13478, 478), (34789, 478),
    (12368, 2368), (23678, 2368), (123678, 2368),
    (12348, 1248), (12489, 1248), (123489, 1248),
    (1689, 689), (3689, 689), (6789, 689), (13689, 689),
    (16789, 689), (36789, 689), (136789, 689),
    (12689, 2689), (26789, 2689), (126789, 2689),
    (23478, 2478), (24789, 2478), (234789, 2478),
    (12, 2), (23, 2), (27, 2), (29, 2),
    (123, 2), (127, 2), (129, 2), (237, 2),
    (239, 2), (279, 2), (1237, 2), (1239, 2),
    (1279, 2), (2379, 2), (12379, 2),
    (16, 6), (36, 6), (67, 6), (69, 6),
    (136, 6), (167, 6), (169, 6), (367, 6),
    (369, 6), (679, 6), (1369, 6), (3679, 6),
    (1367, 6), (1679, 6), (13679, 6),
    (78, 8), (89, 8), (18, 8), (38, 8),
    (138, 8), (789, 8), (178, 8), (189, 8),
    (378, 8), (389, 8), (1789, 8), (3789, 8),
    (1378, 8), (1389, 8), (13789, 8),
    (1468, 468), (3468, 468), (13468, 468),
    (2467, 246), (2469, 246), (24679, 246),
    (2348, 248), (2489, 248), (23489, 248),
    (1268, 268), (2678, 268), (12678, 268),
    (148, 48), (348, 48), (489, 48), (1348, 48),
    (1489, 48), (3489, 48), (13489, 48),
    (168, 68), (368, 68), (678, 68), (1368, 68),
    (1678, 68), (3678, 68), (13678, 68),
    (126, 26), (267, 26), (269, 26), (1267, 26),
    (1269, 26), (2679, 26), (12679, 26),
];

const UNMAPPED: u8 = u8::MAX;

/// Raw mask → index into [`CANONICAL_KEYS`].
static LOOKUP: [u8; 256] = build_lookup();

/// Keypad digits to mask. Only valid on the literal tables above.
const fn keypad(mut digits: u32) -> u8 {
    let mut bits = 0u8;
    while digits > 0 {
        bits |= match digits % 10 {
            1 => 1 << 0,
            2 => 1 << 1,
            3 => 1 << 2,
            4 => 1 << 3,
            6 => 1 << 4,
            7 => 1 << 5,
            8 => 1 << 6,
            9 => 1 << 7,
            _ => panic!("not a keypad neighbour digit"),
        };
        digits /= 10;
    }
    bits
}

const fn build_lookup() -> [u8; 256] {
    let mut table = [UNMAPPED; 256];
    let mut i = 0;
    while i < CANONICAL_KEYS.len() {
        let m = keypad(CANONICAL_KEYS[i]) as usize;
        assert!(table[m] == UNMAPPED, "duplicate canonical pattern");
        table[m] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < ALIASES.len() {
        let (raw, canonical) = ALIASES[i];
        let target = table[keypad(canonical) as usize];
        assert!(target != UNMAPPED, "alias onto a non-canonical pattern");
        table[keypad(raw) as usize] = target;
        i += 1;
    }
    // Corners with both orthogonal sides open draw nothing, so the
    // corner-only patterns look like an isolated tile.
    let mut m = 0;
    while m < table.len() {
        if table[m] == UNMAPPED {
            table[m] = ISOLATED_KEY;
        }
        m += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FogModes, VisionRange};

    /// Drop diagonal neighbours unless both orthogonal neighbours beside
    /// them are set.
    fn corner_masked(m: NeighborMask) -> NeighborMask {
        let edges = NeighborMask::N | NeighborMask::W | NeighborMask::E | NeighborMask::S;
        let mut out = NeighborMask::from_bits(m.bits() & edges.bits());
        for (corner, a, b) in [
            (NeighborMask::NW, NeighborMask::N, NeighborMask::W),
            (NeighborMask::NE, NeighborMask::N, NeighborMask::E),
            (NeighborMask::SW, NeighborMask::S, NeighborMask::W),
            (NeighborMask::SE, NeighborMask::S, NeighborMask::E),
        ] {
            if m.contains(corner | a | b) {
                out |= corner;
            }
        }
        out
    }

    fn revealed_grid(w: i32, h: i32) -> VisibilityGrid {
        let mut g = VisibilityGrid::new(w, h);
        let r = VisionRange::new(9).unwrap();
        for p in g.bounds() {
            if p.x % 9 == 0 && p.y % 9 == 0 {
                g.update(p, r, FogModes::new(true, false));
            }
        }
        g
    }

    #[test]
    fn keypad_digits_are_sorted() {
        assert_eq!(NeighborMask::ALL.keypad_digits(), 12346789);
        assert_eq!(NeighborMask::NONE.keypad_digits(), 0);
        let m = NeighborMask::S | NeighborMask::N | NeighborMask::E;
        assert_eq!(m.keypad_digits(), 268);
        assert_eq!(NeighborMask::from_bits(keypad(268)), m);
    }

    #[test]
    fn canonical_table_covers_sheet() {
        for (i, &k) in CANONICAL_KEYS.iter().enumerate() {
            let key = EdgeKey::from_mask(NeighborMask::from_bits(keypad(k)));
            assert_eq!(key.sprite().offset() as usize, i);
            assert_eq!(key.mask().keypad_digits(), k);
        }
        assert_eq!(EdgeKey::from_mask(NeighborMask::ALL).sprite(), SpriteIndex::SOLID);
        assert_eq!(EdgeKey::from_mask(NeighborMask::NONE).sprite(), SpriteIndex::ISOLATED);
    }

    #[test]
    fn aliases_follow_corner_rule() {
        for &(raw, canonical) in &ALIASES {
            let raw = NeighborMask::from_bits(keypad(raw));
            assert_eq!(corner_masked(raw).keypad_digits(), canonical, "{raw:?}");
        }
    }

    #[test]
    fn every_mask_collapses_to_its_corner_masked_pattern() {
        for bits in 0..=255u8 {
            let m = NeighborMask::from_bits(bits);
            assert_eq!(EdgeKey::from_mask(m).mask(), corner_masked(m), "{m:?}");
        }
    }

    #[test]
    fn known_collapses() {
        let sprite = |k: u32| EdgeKey::from_mask(NeighborMask::from_bits(keypad(k))).sprite();
        assert_eq!(sprite(146), sprite(46));
        assert_eq!(sprite(1234679), sprite(12346));
        assert_eq!(sprite(13), SpriteIndex::ISOLATED);
        assert_eq!(sprite(1379), SpriteIndex::ISOLATED);
        assert_ne!(sprite(268), sprite(2468));
    }

    #[test]
    fn sprite_layout() {
        assert_eq!((SpriteIndex::SOLID.row(), SpriteIndex::SOLID.col()), (1, 1));
        assert_eq!((SpriteIndex::ISOLATED.row(), SpriteIndex::ISOLATED.col()), (6, 7));
        assert_eq!(SpriteIndex::from_row_col(2, 3).map(SpriteIndex::offset), Some(10));
        assert_eq!(SpriteIndex::from_row_col(7, 1), None);
        assert_eq!(SpriteIndex::from_row_col(1, 0), None);
    }

    #[test]
    fn interior_tile_has_no_edge() {
        let g = revealed_grid(12, 12);
        let p = Point::new(5, 5);
        assert_eq!(neighbor_mask(&g, p, Plane::Permanent, TileState::Revealed), NeighborMask::NONE);
        assert_eq!(resolve(&g, p, Plane::Permanent, TileState::Revealed), None);
    }

    #[test]
    fn map_corner_counts_off_map_as_fog() {
        let g = revealed_grid(12, 12);
        let m = neighbor_mask(&g, Point::new(0, 0), Plane::Permanent, TileState::Revealed);
        assert_eq!(m.keypad_digits(), 12347);
        assert!(m.contains(NeighborMask::NW | NeighborMask::W | NeighborMask::SW));

        let m = neighbor_mask(&g, Point::new(11, 11), Plane::Permanent, TileState::Revealed);
        assert_eq!(m.keypad_digits(), 36789);
    }

    #[test]
    fn neighbour_order_does_not_matter() {
        let mut g = VisibilityGrid::new(6, 6);
        g.update(Point::new(2, 2), VisionRange::new(1).unwrap(), FogModes::new(true, false));
        for p in g.bounds() {
            let forward = neighbor_mask(&g, p, Plane::Permanent, TileState::Revealed);
            let mut backward = NeighborMask::NONE;
            for d in COMPASS.iter().rev() {
                if !g.is_revealed(p.shift(d.dx, d.dy), Plane::Permanent) {
                    backward |= d.mask;
                }
            }
            assert_eq!(forward, backward, "{p}");
        }
    }

    #[test]
    fn fog_next_to_plus_shape() {
        // Plus shape revealed around (2, 2); (2, 0) has fog on every side but
        // the south.
        let mut g = VisibilityGrid::new(6, 6);
        g.update(Point::new(2, 2), VisionRange::new(1).unwrap(), FogModes::new(true, false));
        let m = neighbor_mask(&g, Point::new(2, 0), Plane::Permanent, TileState::Revealed);
        assert_eq!(m.keypad_digits(), 1234679);
        assert_eq!(
            fog_sprite(&g, Point::new(2, 0), Plane::Permanent),
            EdgeKey::from_mask(m).sprite()
        );
        // Aliased onto 12346, sub-tile 28.
        assert_eq!(fog_sprite(&g, Point::new(2, 0), Plane::Permanent).offset(), 28);
        // A tile with nothing revealed around it is solid.
        assert_eq!(fog_sprite(&g, Point::new(5, 5), Plane::Permanent), SpriteIndex::SOLID);
    }
}
