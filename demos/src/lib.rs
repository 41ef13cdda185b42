//! Shared model for the fog-of-war demos.
//!
//! A walker explores a rocky field under static and dynamic fog while a few
//! wanderers roam around. The fog layers are drawn through a [`FogSink`]
//! into a character frame that the terminal driver prints.

use rand::{RngExt, SeedableRng};
use tilefog::{
    AutotileSheet, FogActor, FogError, FogModes, FogOfWar, FogSink, LayerView, Plane, SpriteIndex,
};
use tilefog_core::{Grid, Point, Range};

pub const WIDTH: i32 = 60;
pub const HEIGHT: i32 = 20;

/// Map name carrying the fog tags the demo starts with.
pub const MAP_NAME: &str = "Misty Plains <FOW><S><D><3>";

const ROCK_CHANCE: f64 = 0.08;
const WANDERERS: usize = 6;
const JUMP: i32 = 3;

const HELP: &str = "Arrows move, shift+arrows jump. s/d toggle fog, +/- range, r reset, q quit.";

// ---------------------------------------------------------------------------
// Wanderers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Wanderer {
    pub pos: Point,
    pub ch: char,
    pub hidden: bool,
}

impl FogActor for Wanderer {
    fn position(&self) -> Point {
        self.pos
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// How much fog covers a tile, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Shade {
    #[default]
    Lit,
    /// Explored but not currently seen, or on the edge of the explored area.
    Dim,
    /// Never seen.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub shade: Shade,
}

/// Collects fog coverage per tile from the presented layers.
#[derive(Debug, Clone)]
pub struct FogCanvas {
    shades: Grid<Shade>,
}

impl FogCanvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            shades: Grid::new(width, height),
        }
    }

    pub fn shade(&self, p: Point) -> Shade {
        self.shades.at(p).unwrap_or(Shade::Hidden)
    }
}

impl FogSink for FogCanvas {
    fn draw_layer(&mut self, layer: LayerView<'_>) {
        let opaque = layer.sheet.opacity() == u8::MAX;
        for p in layer.viewport.intersect(self.shades.bounds()) {
            let cover = match layer.sprite(p) {
                None => continue,
                Some(SpriteIndex::SOLID) if opaque => Shade::Hidden,
                Some(_) => Shade::Dim,
            };
            if let Some(shade) = self.shades.at_mut(p) {
                *shade = (*shade).max(cover);
            }
        }
    }
}

/// A fully composed screen: map rows followed by status lines.
#[derive(Debug, Clone)]
pub struct Frame {
    pub rows: Vec<Vec<Glyph>>,
    pub status: Vec<String>,
}

impl Frame {
    /// The map rows as plain text, hidden tiles blank.
    pub fn plain_rows(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|g| if g.shade == Shade::Hidden { ' ' } else { g.ch })
                    .collect()
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// Player input understood by [`Walk::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(i32, i32),
    Jump(i32, i32),
    ToggleStatic,
    ToggleDynamic,
    RangeUp,
    RangeDown,
    ResetHistory,
}

pub struct Walk {
    fog: FogOfWar,
    rocks: Grid<bool>,
    player: Point,
    wanderers: Vec<Wanderer>,
    rng: rand::rngs::StdRng,
    messages: Vec<String>,
}

impl Walk {
    pub fn new(seed: u64) -> Result<Self, FogError> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut rocks = Grid::new(WIDTH, HEIGHT);
        rocks.map_cells(|_, _| rng.random_bool(ROCK_CHANCE));
        let player = Point::new(WIDTH / 2, HEIGHT / 2);
        rocks.set(player, false);

        let wanderer_chars = ['g', 'k', 'r', 's', 'z'];
        let mut wanderers: Vec<Wanderer> = Vec::new();
        let mut attempts = 0;
        while wanderers.len() < WANDERERS && attempts < 500 {
            attempts += 1;
            let p = Point::new(rng.random_range(0..WIDTH), rng.random_range(0..HEIGHT));
            if rocks.at(p) != Some(false)
                || p.distance(player) < 5
                || wanderers.iter().any(|w| w.pos == p)
            {
                continue;
            }
            wanderers.push(Wanderer {
                pos: p,
                ch: wanderer_chars[wanderers.len() % wanderer_chars.len()],
                hidden: false,
            });
        }

        let mut fog = FogOfWar::default();
        fog.on_map_loaded(WIDTH, HEIGHT);
        fog.apply_map_name(MAP_NAME)?;
        fog.load_autotile(&demo_sheet()?);
        fog.on_observer_landed(player);
        fog.update_actors(wanderers.iter_mut());

        Ok(Self {
            fog,
            rocks,
            player,
            wanderers,
            rng,
            messages: vec![HELP.into()],
        })
    }

    pub fn player(&self) -> Point {
        self.player
    }

    pub fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    pub fn wanderers(&self) -> &[Wanderer] {
        &self.wanderers
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn walkable(&self, p: Point) -> bool {
        self.rocks.at(p) == Some(false)
    }

    fn log(&mut self, msg: String) {
        log::info!("{msg}");
        self.messages.push(msg);
        if self.messages.len() > 50 {
            self.messages.remove(0);
        }
    }

    /// Handle one command. Returns whether anything changed.
    pub fn apply(&mut self, cmd: Command) -> bool {
        let changed = match cmd {
            Command::Move(dx, dy) => self.step(dx, dy),
            Command::Jump(dx, dy) => self.jump(dx, dy),
            Command::ToggleStatic => {
                let modes = self.fog.modes();
                let modes = FogModes::new(!modes.permanent, modes.transient);
                self.reconfigure(modes, self.range(), false)
            }
            Command::ToggleDynamic => {
                let modes = self.fog.modes();
                let modes = FogModes::new(modes.permanent, !modes.transient);
                self.reconfigure(modes, self.range(), false)
            }
            Command::RangeUp => self.reconfigure(self.fog.modes(), self.range() + 1, false),
            Command::RangeDown => self.reconfigure(self.fog.modes(), self.range() - 1, false),
            Command::ResetHistory => self.reconfigure(self.fog.modes(), self.range(), true),
        };
        if changed {
            self.fog.update_actors(self.wanderers.iter_mut());
        }
        changed
    }

    fn range(&self) -> i32 {
        self.fog.range().map_or(0, |r| r.get())
    }

    fn reconfigure(&mut self, modes: FogModes, range: i32, reset: bool) -> bool {
        match self.fog.configure(modes, range, reset) {
            Ok(()) => true,
            Err(e) => {
                self.log(format!("Cannot change fog: {e}."));
                false
            }
        }
    }

    fn step(&mut self, dx: i32, dy: i32) -> bool {
        let np = self.player.shift(dx, dy);
        if !self.walkable(np) || self.wanderers.iter().any(|w| w.pos == np) {
            return false;
        }
        self.player = np;
        self.fog.on_observer_moved(np);
        self.tick_wanderers();
        true
    }

    /// Leap `JUMP` tiles at once. Nothing is revealed until the landing.
    fn jump(&mut self, dx: i32, dy: i32) -> bool {
        let target = self.player.shift(dx * JUMP, dy * JUMP);
        if !self.walkable(target) || self.wanderers.iter().any(|w| w.pos == target) {
            self.log("No room to land there.".into());
            return false;
        }
        self.fog.on_observer_jumped(target);
        self.player = target;
        self.fog.on_observer_landed(target);
        self.tick_wanderers();
        true
    }

    fn tick_wanderers(&mut self) {
        for i in 0..self.wanderers.len() {
            if !self.rng.random_bool(0.5) {
                continue;
            }
            let dirs = self.wanderers[i].pos.neighbors_4();
            let next = dirs[self.rng.random_range(0..dirs.len())];
            let taken = next == self.player || self.wanderers.iter().any(|w| w.pos == next);
            if self.walkable(next) && !taken {
                self.wanderers[i].pos = next;
                self.fog.update_actor(&mut self.wanderers[i]);
            }
        }
    }

    /// Compose the current screen.
    pub fn frame(&self) -> Result<Frame, FogError> {
        let mut canvas = FogCanvas::new(WIDTH, HEIGHT);
        self.fog.present(&mut canvas)?;

        let mut rows = Vec::with_capacity(HEIGHT as usize);
        for y in 0..HEIGHT {
            let mut row = Vec::with_capacity(WIDTH as usize);
            for x in 0..WIDTH {
                let p = Point::new(x, y);
                let ch = if self.rocks.at(p) == Some(true) { '#' } else { '.' };
                row.push(Glyph {
                    ch,
                    shade: canvas.shade(p),
                });
            }
            rows.push(row);
        }
        for w in self.wanderers.iter().filter(|w| !w.hidden) {
            if let Some(g) = glyph_mut(&mut rows, w.pos) {
                g.ch = w.ch;
            }
        }
        if let Some(g) = glyph_mut(&mut rows, self.player) {
            *g = Glyph {
                ch: '@',
                shade: Shade::Lit,
            };
        }

        let modes = self.fog.modes();
        let explored = self
            .fog
            .grid()
            .map_or(0, |g| g.revealed_count(Plane::Permanent));
        let mut status = vec![format!(
            "static {} | dynamic {} | range {} | explored {}/{} | {}",
            on_off(modes.permanent),
            on_off(modes.transient),
            self.range(),
            explored,
            Range::new(0, 0, WIDTH, HEIGHT).len(),
            self.player
        )];
        if let Some(msg) = self.messages.last() {
            status.push(msg.clone());
        }
        Ok(Frame { rows, status })
    }
}

fn glyph_mut(rows: &mut [Vec<Glyph>], p: Point) -> Option<&mut Glyph> {
    rows.get_mut(p.y as usize)?.get_mut(p.x as usize)
}

fn on_off(b: bool) -> &'static str {
    if b { "on" } else { "off" }
}

/// A flat grey autotile sheet; the terminal only uses its opacity.
pub fn demo_sheet() -> Result<AutotileSheet, FogError> {
    let image = image::RgbaImage::from_pixel(
        tilefog::sheet::SHEET_WIDTH,
        tilefog::sheet::SHEET_HEIGHT,
        image::Rgba([40, 40, 48, 255]),
    );
    Ok(AutotileSheet::from_image(image)?)
}
