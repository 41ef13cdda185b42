//! Per-tile visibility planes and the observer-centred diamond sweep.
//!
//! The permanent plane only ever goes from [`TileState::Fog`] to
//! [`TileState::Revealed`]. The transient plane always equals the most recent
//! visible region: after each [`VisibilityGrid::update`], exactly the tiles
//! within Manhattan distance `range` of the observer are revealed.

use tilefog_core::{Grid, Point, Range};

use crate::config::{FogModes, VisionRange};

/// Visibility of one tile in one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TileState {
    #[default]
    Fog,
    Revealed,
}

/// Selects one of the two visibility planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Permanent,
    Transient,
}

/// Everything the fog tracks for a single tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FogCell {
    pub permanent: TileState,
    pub transient: TileState,
    /// Revealed in the permanent plane with no fog around it; the overlay
    /// need not look at it again. Only meaningful while the permanent plane
    /// is monotone.
    pub skip: bool,
}

impl FogCell {
    #[inline]
    pub fn state(self, plane: Plane) -> TileState {
        match plane {
            Plane::Permanent => self.permanent,
            Plane::Transient => self.transient,
        }
    }
}

/// Counters describing one sweep, mainly for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepStats {
    /// In-bounds tiles inside the diamond.
    pub visible: usize,
    /// Tiles newly revealed in the permanent plane.
    pub discovered: usize,
    /// Tiles that went back under transient fog.
    pub recovered: usize,
}

/// The two visibility planes of a map plus the overlay skip cache.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisibilityGrid {
    cells: Grid<FogCell>,
    /// Transient-visible tiles of the last update.
    last_visible: Vec<Point>,
}

impl VisibilityGrid {
    /// Allocate an all-fog grid for a `width × height` map.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            cells: Grid::new(width, height),
            last_visible: Vec::new(),
        }
    }

    /// The map extent.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.cells.bounds()
    }

    /// Whether `p` is on the map.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        self.cells.contains(p)
    }

    /// State of `p` in `plane`, or `None` if `p` is off the map.
    #[inline]
    pub fn state(&self, p: Point, plane: Plane) -> Option<TileState> {
        self.cells.at(p).map(|c| c.state(plane))
    }

    /// Whether `p` is revealed in `plane`. Off-map tiles are always fog.
    #[inline]
    pub fn is_revealed(&self, p: Point, plane: Plane) -> bool {
        self.state(p, plane) == Some(TileState::Revealed)
    }

    /// Whether `p` is inside the observer's current range (transient plane).
    #[inline]
    pub fn is_visible(&self, p: Point) -> bool {
        self.is_revealed(p, Plane::Transient)
    }

    /// Whether the overlay has marked `p` as fully interior.
    #[inline]
    pub fn is_skipped(&self, p: Point) -> bool {
        self.cells.at(p).is_some_and(|c| c.skip)
    }

    /// Mark `p` as needing no further overlay work.
    #[inline]
    pub(crate) fn set_skip(&mut self, p: Point) {
        if let Some(c) = self.cells.at_mut(p) {
            c.skip = true;
        }
    }

    /// Number of revealed tiles in `plane`.
    pub fn revealed_count(&self, plane: Plane) -> usize {
        self.cells.count_fn(|c| c.state(plane) == TileState::Revealed)
    }

    /// Tiles that were transiently visible after the last update.
    pub fn visible_tiles(&self) -> &[Point] {
        &self.last_visible
    }

    /// Recompute visibility for an observer at `observer`.
    ///
    /// Every on-map tile with `|x-px| + |y-py| <= range` is revealed in each
    /// enabled plane. With the transient plane on, tiles visible last time
    /// but outside the new diamond go back to fog.
    pub fn update(&mut self, observer: Point, range: VisionRange, modes: FogModes) -> SweepStats {
        let mut stats = SweepStats::default();
        let mut visible = Vec::new();
        for p in observer.diamond(range.get()) {
            let Some(cell) = self.cells.at_mut(p) else {
                continue;
            };
            stats.visible += 1;
            if modes.permanent && cell.permanent == TileState::Fog {
                cell.permanent = TileState::Revealed;
                stats.discovered += 1;
            }
            if modes.transient {
                cell.transient = TileState::Revealed;
                visible.push(p);
            }
        }
        if modes.transient {
            // Every remembered tile is on the map, so leaving the diamond is
            // the same as being absent from the new set.
            for &p in &self.last_visible {
                if p.distance(observer) > range.get() {
                    if let Some(cell) = self.cells.at_mut(p) {
                        cell.transient = TileState::Fog;
                        stats.recovered += 1;
                    }
                }
            }
            self.last_visible = visible;
        }
        stats
    }

    /// Cover the whole map again in both planes.
    pub fn reset(&mut self) {
        self.cells.fill(FogCell::default());
        self.last_visible.clear();
    }

    /// Cover the whole map again in the transient plane only.
    pub fn reset_transient(&mut self) {
        self.cells.map_cells(|_, c| FogCell {
            transient: TileState::Fog,
            ..c
        });
        self.last_visible.clear();
    }

    /// Forget every skip mark, e.g. when a fresh overlay is built.
    pub fn clear_skip(&mut self) {
        self.cells.map_cells(|_, c| FogCell { skip: false, ..c });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngExt, SeedableRng};

    fn range(r: i32) -> VisionRange {
        VisionRange::new(r).unwrap()
    }

    #[test]
    fn diamond_edges() {
        let mut g = VisibilityGrid::new(20, 20);
        let obs = Point::new(10, 10);
        g.update(obs, range(4), FogModes::BOTH);
        for p in g.bounds() {
            let d = p.distance(obs);
            assert_eq!(g.is_visible(p), d <= 4, "{p}");
            assert_eq!(g.is_revealed(p, Plane::Permanent), d <= 4, "{p}");
        }
        // Diagonal tile at distance 4 (2+2) is inside, (3,2) at 5 is not.
        assert!(g.is_visible(Point::new(12, 12)));
        assert!(!g.is_visible(Point::new(13, 12)));
    }

    #[test]
    fn scenario_move_south() {
        let mut g = VisibilityGrid::new(10, 10);
        g.update(Point::new(5, 5), range(2), FogModes::BOTH);
        assert!(g.is_visible(Point::new(5, 3)));
        assert!(!g.is_visible(Point::new(5, 2)));

        let stats = g.update(Point::new(5, 6), range(2), FogModes::BOTH);
        assert!(!g.is_visible(Point::new(5, 3)));
        assert!(g.is_revealed(Point::new(5, 3), Plane::Permanent));
        // One step shifts each of the 2r+1 diamond columns by one tile.
        assert_eq!(stats.recovered, 5);
        assert_eq!(stats.discovered, 5);
    }

    #[test]
    fn zero_range_reveals_only_observer() {
        let mut g = VisibilityGrid::new(4, 4);
        let stats = g.update(Point::new(1, 1), range(0), FogModes::BOTH);
        assert_eq!(stats.visible, 1);
        assert_eq!(g.visible_tiles(), &[Point::new(1, 1)]);
        assert_eq!(g.revealed_count(Plane::Permanent), 1);
    }

    #[test]
    fn sweep_clips_at_map_edge() {
        let mut g = VisibilityGrid::new(5, 5);
        let stats = g.update(Point::new(0, 0), range(2), FogModes::BOTH);
        // Quarter diamond: (0,0) (1,0) (2,0) (0,1) (1,1) (0,2).
        assert_eq!(stats.visible, 6);
        assert!(!g.is_visible(Point::new(-1, 0)));
        assert_eq!(g.state(Point::new(-1, 0), Plane::Permanent), None);
    }

    #[test]
    fn permanent_only_leaves_transient_alone() {
        let mut g = VisibilityGrid::new(8, 8);
        g.update(Point::new(3, 3), range(1), FogModes::new(true, false));
        assert_eq!(g.revealed_count(Plane::Permanent), 5);
        assert_eq!(g.revealed_count(Plane::Transient), 0);
        assert!(g.visible_tiles().is_empty());
    }

    #[test]
    fn transient_only_leaves_permanent_alone() {
        let mut g = VisibilityGrid::new(8, 8);
        g.update(Point::new(3, 3), range(1), FogModes::new(false, true));
        g.update(Point::new(6, 6), range(1), FogModes::new(false, true));
        assert_eq!(g.revealed_count(Plane::Permanent), 0);
        assert_eq!(g.revealed_count(Plane::Transient), 5);
        assert!(!g.is_visible(Point::new(3, 3)));
    }

    #[test]
    fn shrinking_range_recovers_outer_ring() {
        let mut g = VisibilityGrid::new(12, 12);
        let obs = Point::new(6, 6);
        g.update(obs, range(3), FogModes::BOTH);
        g.update(obs, range(1), FogModes::BOTH);
        for p in g.bounds() {
            assert_eq!(g.is_visible(p), p.distance(obs) <= 1);
        }
        assert_eq!(g.revealed_count(Plane::Permanent), 25);
    }

    #[test]
    fn random_walk_keeps_invariants() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut g = VisibilityGrid::new(24, 16);
        let mut prev = g.clone();
        let mut obs = Point::new(12, 8);
        for _ in 0..300 {
            obs = Point::new(
                (obs.x + rng.random_range(-2..=2)).clamp(-2, 25),
                (obs.y + rng.random_range(-2..=2)).clamp(-2, 17),
            );
            let r = range(rng.random_range(0..=9));
            g.update(obs, r, FogModes::BOTH);
            for p in g.bounds() {
                if prev.is_revealed(p, Plane::Permanent) {
                    assert!(g.is_revealed(p, Plane::Permanent), "{p} lost");
                }
                assert_eq!(g.is_visible(p), p.distance(obs) <= r.get(), "{p}");
            }
            prev = g.clone();
        }
    }

    #[test]
    fn reset_covers_everything() {
        let mut g = VisibilityGrid::new(6, 6);
        g.update(Point::new(2, 2), range(2), FogModes::BOTH);
        g.set_skip(Point::new(2, 2));
        g.reset();
        assert_eq!(g.revealed_count(Plane::Permanent), 0);
        assert_eq!(g.revealed_count(Plane::Transient), 0);
        assert!(!g.is_skipped(Point::new(2, 2)));
        assert!(g.visible_tiles().is_empty());
    }

    #[test]
    fn reset_transient_keeps_history() {
        let mut g = VisibilityGrid::new(6, 6);
        g.update(Point::new(2, 2), range(1), FogModes::BOTH);
        g.set_skip(Point::new(2, 2));
        g.reset_transient();
        assert_eq!(g.revealed_count(Plane::Permanent), 5);
        assert_eq!(g.revealed_count(Plane::Transient), 0);
        assert!(g.is_skipped(Point::new(2, 2)));
        g.clear_skip();
        assert!(!g.is_skipped(Point::new(2, 2)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_restores_both_planes() {
        let mut g = VisibilityGrid::new(8, 6);
        g.update(Point::new(2, 2), range(1), FogModes::BOTH);
        g.update(Point::new(5, 3), range(1), FogModes::BOTH);
        let json = serde_json::to_string(&g).unwrap();
        let back: VisibilityGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bounds(), g.bounds());
        assert_eq!(back.revealed_count(Plane::Permanent), 10);
        assert_eq!(back.revealed_count(Plane::Transient), 5);
        assert_eq!(back.visible_tiles(), g.visible_tiles());
        assert!(back.is_revealed(Point::new(2, 2), Plane::Permanent));
        assert!(!back.is_visible(Point::new(2, 2)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_truncated_planes() {
        let g = VisibilityGrid::new(10, 10);
        let mut value = serde_json::to_value(&g).unwrap();
        value["cells"]["cells"].as_array_mut().unwrap().truncate(5);
        assert!(serde_json::from_value::<VisibilityGrid>(value).is_err());
    }
}
