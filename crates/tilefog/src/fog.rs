//! The per-map fog tracker.
//!
//! [`FogOfWar`] owns the visibility planes and overlay of the loaded map and
//! is driven by explicit lifecycle hooks from the host: map load/unload,
//! observer moves and jumps, viewport changes. Hosts query it for tile and
//! actor visibility and hand it a [`FogSink`] to draw the layers.

use std::path::Path;

use tilefog_core::{Point, Range};

use crate::autotile::SpriteIndex;
use crate::config::{FogConfig, FogModes, MapFogSetup, VisionRange};
use crate::error::FogError;
use crate::overlay::{OverlayCompositor, TileLayer};
use crate::sheet::AutotileSheet;
use crate::visibility::VisibilityGrid;

/// Something on the map that dynamic fog can hide (NPCs, events).
pub trait FogActor {
    /// Current tile of the actor.
    fn position(&self) -> Point;
    /// Show or hide the actor.
    fn set_hidden(&mut self, hidden: bool);
}

/// Which fog layer a [`LayerView`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Permanent plane, drawn on top.
    Static,
    /// Transient plane, drawn underneath.
    Dynamic,
}

/// One fog layer ready to draw.
#[derive(Debug, Clone, Copy)]
pub struct LayerView<'a> {
    pub kind: LayerKind,
    /// Sub-tile per map tile; `None` is clear.
    pub tiles: &'a TileLayer,
    /// Autotile sheet with the layer opacity applied.
    pub sheet: &'a AutotileSheet,
    /// The tile window last refreshed. Tiles outside it may be stale.
    pub viewport: Range,
}

impl LayerView<'_> {
    /// Sub-tile at `p`, or `None` when clear or off the map.
    pub fn sprite(&self, p: Point) -> Option<SpriteIndex> {
        self.tiles.at(p).flatten()
    }
}

/// Receives the fog layers from [`FogOfWar::present`].
pub trait FogSink {
    /// Draw one layer. Layers arrive bottom first.
    fn draw_layer(&mut self, layer: LayerView<'_>);
}

#[derive(Debug, Clone)]
struct LayerSheets {
    stat: AutotileSheet,
    dynamic: AutotileSheet,
}

#[derive(Debug, Clone)]
struct Planes {
    grid: VisibilityGrid,
    overlay: OverlayCompositor,
}

impl Planes {
    fn new(mut grid: VisibilityGrid) -> Self {
        let overlay = OverlayCompositor::new(&mut grid);
        Self { grid, overlay }
    }
}

/// Fog state of the loaded map.
#[derive(Debug, Clone)]
struct MapFog {
    bounds: Range,
    modes: FogModes,
    range: VisionRange,
    observer: Option<Point>,
    /// Set between a jump and its landing; moves are recorded but reveal
    /// nothing.
    airborne: bool,
    viewport: Range,
    planes: Option<Planes>,
}

impl MapFog {
    fn new(width: i32, height: i32, range: VisionRange) -> Self {
        let bounds = Range::new(0, 0, width.max(0), height.max(0));
        Self {
            bounds,
            modes: FogModes::OFF,
            range,
            observer: None,
            airborne: false,
            viewport: bounds,
            planes: None,
        }
    }

    fn active(&self) -> Option<&Planes> {
        self.planes.as_ref().filter(|_| self.modes.any())
    }

    /// Rebuild the overlay from scratch and sweep at the current position.
    /// Mid-jump there is nothing to sweep until the landing.
    fn rebuild(&mut self) {
        let size = self.bounds.size();
        let planes = self
            .planes
            .get_or_insert_with(|| Planes::new(VisibilityGrid::new(size.x, size.y)));
        planes.grid.reset_transient();
        planes.overlay = OverlayCompositor::new(&mut planes.grid);
        if self.observer.is_some() && !self.airborne {
            self.sweep();
        } else {
            self.redraw();
        }
    }

    fn sweep(&mut self) {
        if !self.modes.any() {
            return;
        }
        let (Some(observer), Some(planes)) = (self.observer, self.planes.as_mut()) else {
            return;
        };
        let sweep = planes.grid.update(observer, self.range, self.modes);
        let refresh = planes.overlay.refresh(
            &mut planes.grid,
            self.viewport,
            Some(observer),
            self.range,
            self.modes,
        );
        log::debug!(
            "fog sweep at {}: {} visible, {} discovered, {} recovered, {} edges resolved",
            observer,
            sweep.visible,
            sweep.discovered,
            sweep.recovered,
            refresh.resolved
        );
    }

    fn redraw(&mut self) {
        if !self.modes.any() {
            return;
        }
        if let Some(planes) = self.planes.as_mut() {
            planes.overlay.refresh(
                &mut planes.grid,
                self.viewport,
                self.observer,
                self.range,
                self.modes,
            );
        }
    }
}

/// Fog of war for one map at a time.
#[derive(Debug, Clone, Default)]
pub struct FogOfWar {
    config: FogConfig,
    sheets: Option<LayerSheets>,
    map: Option<MapFog>,
}

impl FogOfWar {
    pub fn new(config: FogConfig) -> Self {
        Self {
            config,
            sheets: None,
            map: None,
        }
    }

    pub fn config(&self) -> &FogConfig {
        &self.config
    }

    // -- lifecycle ---------------------------------------------------------

    /// Start tracking a new `width × height` map. Fog starts off.
    pub fn on_map_loaded(&mut self, width: i32, height: i32) {
        log::debug!("fog: map loaded ({width}x{height})");
        self.map = Some(MapFog::new(width, height, self.config.default_range));
    }

    /// Drop everything tracked for the current map.
    pub fn on_map_unloaded(&mut self) {
        if self.map.take().is_some() {
            log::debug!("fog: map unloaded");
        }
    }

    /// Configure fog from the loaded map's name tags (`<FOW>`, `<S>`, `<D>`,
    /// `<n>`). Returns whether fog is now on. A name without a leading
    /// `<FOW>` tag turns fog off and forgets any history.
    pub fn apply_map_name(&mut self, name: &str) -> Result<bool, FogError> {
        let setup = MapFogSetup::parse(name, self.config.default_range)?;
        match setup {
            Some(setup) => {
                self.configure(setup.modes, setup.range.get(), true)?;
                Ok(setup.modes.any())
            }
            None => {
                self.configure(FogModes::OFF, self.config.default_range.get(), true)?;
                Ok(false)
            }
        }
    }

    /// Change the enabled planes and vision range of the loaded map.
    ///
    /// With `reset_history` every explored tile is covered again. Turning
    /// both planes off keeps the explored area for a later re-enable. The
    /// overlay is rebuilt and, if the observer is placed, swept at once.
    /// Hosts should call [`update_actors`](Self::update_actors) afterwards.
    ///
    /// On error nothing changes.
    pub fn configure(
        &mut self,
        modes: FogModes,
        range: i32,
        reset_history: bool,
    ) -> Result<(), FogError> {
        let range = VisionRange::new(range)?;
        let map = self.map.as_mut().ok_or(FogError::NoMap)?;
        map.modes = modes;
        map.range = range;
        if reset_history {
            map.planes = None;
        }
        log::debug!(
            "fog: static {}, dynamic {}, range {}{}",
            modes.permanent,
            modes.transient,
            range.get(),
            if reset_history { ", history reset" } else { "" }
        );
        if modes.any() {
            map.rebuild();
        }
        Ok(())
    }

    /// Load the autotile sheet used by both layers, fading a copy per layer
    /// to the configured opacity.
    pub fn load_autotile(&mut self, sheet: &AutotileSheet) {
        self.sheets = Some(LayerSheets {
            stat: sheet.with_opacity(self.config.static_opacity),
            dynamic: sheet.with_opacity(self.config.dynamic_opacity),
        });
    }

    /// Load `<dir>/<autotile>.png`, where `autotile` is the configured
    /// resource name.
    pub fn load_autotile_from(&mut self, dir: impl AsRef<Path>) -> Result<(), FogError> {
        let path = dir.as_ref().join(format!("{}.png", self.config.autotile));
        let sheet = AutotileSheet::open(&path).inspect_err(|e| {
            log::warn!("fog: cannot load {}: {e}", path.display());
        })?;
        self.load_autotile(&sheet);
        Ok(())
    }

    // -- observer ----------------------------------------------------------

    /// The observer stepped to `pos`. Reveals around it unless the position
    /// is unchanged or the observer is mid-jump.
    pub fn on_observer_moved(&mut self, pos: Point) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if map.observer == Some(pos) {
            return;
        }
        map.observer = Some(pos);
        if !map.airborne {
            map.sweep();
        }
    }

    /// The observer started a jump towards `pos`. Nothing is revealed until
    /// [`on_observer_landed`](Self::on_observer_landed).
    pub fn on_observer_jumped(&mut self, pos: Point) {
        if let Some(map) = self.map.as_mut() {
            map.observer = Some(pos);
            map.airborne = true;
        }
    }

    /// The observer finished a jump at `pos`.
    pub fn on_observer_landed(&mut self, pos: Point) {
        if let Some(map) = self.map.as_mut() {
            map.observer = Some(pos);
            map.airborne = false;
            map.sweep();
        }
    }

    /// Set the tile window the overlay keeps up to date and refresh it.
    pub fn set_viewport(&mut self, viewport: Range) {
        if let Some(map) = self.map.as_mut() {
            map.viewport = viewport;
            map.redraw();
        }
    }

    // -- queries -----------------------------------------------------------

    /// Whether fog is on for the loaded map.
    pub fn is_active(&self) -> bool {
        self.modes().any()
    }

    /// Enabled planes; [`FogModes::OFF`] without a map.
    pub fn modes(&self) -> FogModes {
        self.map.as_ref().map_or(FogModes::OFF, |m| m.modes)
    }

    /// Vision range of the loaded map.
    pub fn range(&self) -> Option<VisionRange> {
        self.map.as_ref().map(|m| m.range)
    }

    /// Last reported observer position.
    pub fn observer(&self) -> Option<Point> {
        self.map.as_ref().and_then(|m| m.observer)
    }

    /// Whether the tile at `p` is currently seen.
    ///
    /// Off-map tiles never are. With dynamic fog off, every on-map tile is,
    /// whatever the stored transient plane says.
    pub fn is_visible(&self, p: Point) -> bool {
        let Some(map) = &self.map else {
            return false;
        };
        if !map.bounds.contains(p) {
            return false;
        }
        if !map.modes.transient {
            return true;
        }
        map.planes.as_ref().is_some_and(|pl| pl.grid.is_visible(p))
    }

    /// Whether an actor standing at `p` should be hidden.
    pub fn actor_hidden(&self, p: Point) -> bool {
        self.config.hide_actors_in_fog && self.modes().transient && !self.is_visible(p)
    }

    /// Show or hide one actor, e.g. after it moved.
    pub fn update_actor<A: FogActor + ?Sized>(&self, actor: &mut A) {
        actor.set_hidden(self.actor_hidden(actor.position()));
    }

    /// Show or hide every actor, e.g. after the observer moved or fog was
    /// reconfigured.
    pub fn update_actors<'a, A, I>(&self, actors: I)
    where
        A: FogActor + ?Sized + 'a,
        I: IntoIterator<Item = &'a mut A>,
    {
        for actor in actors {
            self.update_actor(actor);
        }
    }

    // -- layers and persistence ----------------------------------------------

    /// The static layer, while fog is on.
    pub fn permanent_layer(&self) -> Option<&TileLayer> {
        self.map
            .as_ref()
            .and_then(MapFog::active)
            .map(|pl| pl.overlay.permanent_layer())
    }

    /// The dynamic layer, while fog is on.
    pub fn transient_layer(&self) -> Option<&TileLayer> {
        self.map
            .as_ref()
            .and_then(MapFog::active)
            .map(|pl| pl.overlay.transient_layer())
    }

    /// Hand the enabled layers to `sink`, dynamic first. Draws nothing while
    /// fog is off.
    pub fn present<S: FogSink + ?Sized>(&self, sink: &mut S) -> Result<(), FogError> {
        let map = self.map.as_ref().ok_or(FogError::NoMap)?;
        let Some(planes) = map.active() else {
            return Ok(());
        };
        let sheets = self.sheets.as_ref().ok_or(FogError::SheetMissing)?;
        if map.modes.transient {
            sink.draw_layer(LayerView {
                kind: LayerKind::Dynamic,
                tiles: planes.overlay.transient_layer(),
                sheet: &sheets.dynamic,
                viewport: map.viewport,
            });
        }
        if map.modes.permanent {
            sink.draw_layer(LayerView {
                kind: LayerKind::Static,
                tiles: planes.overlay.permanent_layer(),
                sheet: &sheets.stat,
                viewport: map.viewport,
            });
        }
        Ok(())
    }

    /// The visibility planes of the loaded map, if fog was ever enabled on it.
    pub fn grid(&self) -> Option<&VisibilityGrid> {
        self.map.as_ref()?.planes.as_ref().map(|pl| &pl.grid)
    }

    /// Replace the visibility planes of the loaded map, e.g. from a save.
    /// The overlay is rebuilt from the restored permanent plane.
    pub fn restore_grid(&mut self, grid: VisibilityGrid) -> Result<(), FogError> {
        let map = self.map.as_mut().ok_or(FogError::NoMap)?;
        let (expected, found) = (map.bounds.size(), grid.bounds().size());
        if expected != found {
            return Err(FogError::SizeMismatch { expected, found });
        }
        map.planes = Some(Planes::new(grid));
        if map.modes.any() {
            map.rebuild();
        }
        Ok(())
    }
}
