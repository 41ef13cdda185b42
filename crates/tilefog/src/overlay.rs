//! Fog overlay layers.
//!
//! The [`OverlayCompositor`] turns the visibility planes into two map-sized
//! [`TileLayer`]s of autotile sub-tiles: an opaque one for static fog and a
//! translucent one for dynamic fog. Only the viewport (plus a one-tile
//! margin) and the band around the observer's diamond are recomputed on
//! each refresh.

use tilefog_core::{Grid, Point, Range};

use crate::autotile::{self, SpriteIndex};
use crate::config::{FogModes, VisionRange};
use crate::visibility::{Plane, TileState, VisibilityGrid};

/// One drawable fog layer. `None` is clear, `Some` names the sub-tile.
pub type TileLayer = Grid<Option<SpriteIndex>>;

/// Counters describing one refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshStats {
    /// Tiles in the clipped viewport window.
    pub window: usize,
    /// Fog tiles whose sub-tile was resolved.
    pub resolved: usize,
    /// Revealed tiles newly marked as fully interior.
    pub skipped: usize,
}

/// Builds the static and dynamic fog layers from a [`VisibilityGrid`].
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    permanent: TileLayer,
    transient: TileLayer,
    /// Refresh generation in which each fog tile was last resolved.
    checked: Grid<u32>,
    generation: u32,
}

impl OverlayCompositor {
    /// A fresh overlay for `grid`: static layer all fog, dynamic layer all
    /// clear.
    ///
    /// Skip marks left on the grid by a previous overlay are dropped, since
    /// the new static layer has not cleared those tiles yet.
    pub fn new(grid: &mut VisibilityGrid) -> Self {
        grid.clear_skip();
        let size = grid.bounds().size();
        Self {
            permanent: Grid::filled(size.x, size.y, Some(SpriteIndex::SOLID)),
            transient: Grid::filled(size.x, size.y, None),
            checked: Grid::new(size.x, size.y),
            generation: 0,
        }
    }

    /// The static (permanent plane) layer.
    pub fn permanent_layer(&self) -> &TileLayer {
        &self.permanent
    }

    /// The dynamic (transient plane) layer.
    pub fn transient_layer(&self) -> &TileLayer {
        &self.transient
    }

    /// Bring both layers up to date around `viewport` and `observer`.
    ///
    /// Without an observer the dynamic layer is only refreshed inside the
    /// viewport, where nothing is visible yet.
    pub fn refresh(
        &mut self,
        grid: &mut VisibilityGrid,
        viewport: Range,
        observer: Option<Point>,
        range: VisionRange,
        modes: FogModes,
    ) -> RefreshStats {
        let window = viewport.grow(1).intersect(grid.bounds());
        let mut stats = RefreshStats {
            window: window.len(),
            ..RefreshStats::default()
        };
        if modes.transient {
            for p in window {
                let tile = if grid.is_visible(p) {
                    None
                } else {
                    Some(SpriteIndex::SOLID)
                };
                self.transient.set(p, tile);
            }
        }
        if modes.permanent {
            self.refresh_permanent(grid, window, &mut stats);
        }
        if let Some(observer) = observer.filter(|_| modes.transient) {
            stats.resolved += self.refresh_band(grid, observer, range);
        }
        if modes.permanent && modes.transient {
            // Static fog is drawn on top; nothing shows through solid tiles.
            for p in window {
                if self.permanent.at(p) == Some(Some(SpriteIndex::SOLID)) {
                    self.transient.set(p, None);
                }
            }
        }
        stats
    }

    fn next_generation(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.checked.fill(0);
            self.generation = 1;
        }
        self.generation
    }

    fn refresh_permanent(
        &mut self,
        grid: &mut VisibilityGrid,
        window: Range,
        stats: &mut RefreshStats,
    ) {
        let generation = self.next_generation();
        for p in window {
            if grid.is_skipped(p) || !grid.is_revealed(p, Plane::Permanent) {
                continue;
            }
            self.permanent.set(p, None);
            let mut fog_near = false;
            for q in p.neighbors_8() {
                if grid.state(q, Plane::Permanent) != Some(TileState::Fog) {
                    continue;
                }
                fog_near = true;
                if self.checked.at(q) == Some(generation) {
                    continue;
                }
                self.checked.set(q, generation);
                self.permanent
                    .set(q, Some(autotile::fog_sprite(grid, q, Plane::Permanent)));
                stats.resolved += 1;
            }
            if !fog_near {
                grid.set_skip(p);
                stats.skipped += 1;
            }
        }
    }

    /// Re-resolve the tiles straddling the diamond edge: the outermost
    /// visible ring and the two fog rings that touch it orthogonally or
    /// diagonally. Everything inside is clear and everything beyond is solid
    /// by construction.
    fn refresh_band(
        &mut self,
        grid: &VisibilityGrid,
        observer: Point,
        range: VisionRange,
    ) -> usize {
        let mut resolved = 0;
        let r = range.get();
        for dist in r..=r + 2 {
            for q in observer.ring(dist) {
                if !grid.contains(q) {
                    continue;
                }
                let tile = if grid.is_visible(q) {
                    None
                } else {
                    resolved += 1;
                    Some(autotile::fog_sprite(grid, q, Plane::Transient))
                };
                self.transient.set(q, tile);
            }
        }
        resolved
    }
}
