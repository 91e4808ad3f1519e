//! Screens and navigation between them.
//!
//! A [`Screen`] receives key impulses and frame time. Impulses may ask for a
//! [`Transition`]; the [`Navigator`] owns every screen and applies the
//! transitions, so screens never reference each other.

use std::f64::consts::TAU;

use sblp_core::timeline::Millis;

use crate::config::EngineConfig;
use crate::driver::FixedStepDriver;
use crate::input::{Key, KeyRepeat};
use crate::level::{level_one, LevelDescription};
use crate::math::{Rect, Vec2};
use crate::simulation::Simulation;
use crate::EngineError;

/// What a screen asks the navigator to do after an impulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    StartMatch,
    ToMenu,
    Exit,
}

/// A screen the navigator can make active.
pub trait Screen {
    fn name(&self) -> &'static str;

    /// React to one key impulse at time `now`.
    fn impulse(&mut self, key: Key, now: Millis) -> Transition;

    /// Account for `delta` milliseconds of frame time ending at `now`.
    fn advance(&mut self, now: Millis, delta: Millis) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// MainMenu
// ---------------------------------------------------------------------------

/// A main menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    SinglePlayer,
    Multiplayer,
    Settings,
    Quit,
}

impl MenuEntry {
    pub const ALL: [MenuEntry; 4] = [
        MenuEntry::SinglePlayer,
        MenuEntry::Multiplayer,
        MenuEntry::Settings,
        MenuEntry::Quit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuEntry::SinglePlayer => "Single Player",
            MenuEntry::Multiplayer => "Multiplayer",
            MenuEntry::Settings => "Settings",
            MenuEntry::Quit => "Quit",
        }
    }

    /// Area of the menu artwork the entry's highlight dims, in artwork pixels.
    pub fn dim_area(self) -> Rect {
        let (x, y, w, h) = match self {
            MenuEntry::SinglePlayer => (73.0, 75.0, 53.0, 4.0),
            MenuEntry::Multiplayer => (77.0, 83.0, 46.0, 4.0),
            MenuEntry::Settings => (83.0, 91.0, 33.0, 4.0),
            MenuEntry::Quit => (92.0, 99.0, 17.0, 4.0),
        };
        Rect::from_origin_size(Vec2::new(x, y), w, h)
    }
}

/// Opacity of a fully dimmed entry.
const MAX_DIM_ALPHA: f64 = 192.0;
/// Period of the selected entry's pulse.
const PULSE_PERIOD_MS: f64 = 500.0;

/// The title menu.
#[derive(Debug, Clone, Default)]
pub struct MainMenu {
    selected: usize,
    /// When the selection last changed; the pulse restarts from here.
    selection_changed_at: Millis,
}

impl MainMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> MenuEntry {
        MenuEntry::ALL[self.selected]
    }

    /// How dimmed entry `index` is at `now`, from 0 (lit) to 1 (dark).
    ///
    /// Unselected entries are fully dimmed; the selected one pulses, starting
    /// lit whenever the selection changes.
    pub fn dim_factor(&self, index: usize, now: Millis) -> f64 {
        if index != self.selected {
            return 1.0;
        }
        let t = (now - self.selection_changed_at) as f64;
        1.0 - ((TAU * t / PULSE_PERIOD_MS).cos() + 1.0) / 2.0
    }

    /// Opacity of the dimming overlay for entry `index` at `now`.
    pub fn dim_alpha(&self, index: usize, now: Millis) -> u8 {
        (MAX_DIM_ALPHA * self.dim_factor(index, now)).round() as u8
    }

    fn select(&mut self, index: usize, now: Millis) {
        self.selected = index;
        self.selection_changed_at = now;
    }
}

impl Screen for MainMenu {
    fn name(&self) -> &'static str {
        "main menu"
    }

    fn impulse(&mut self, key: Key, now: Millis) -> Transition {
        let count = MenuEntry::ALL.len();
        match key {
            Key::Up => {
                self.select((self.selected + count - 1) % count, now);
                Transition::Stay
            }
            Key::Down => {
                self.select((self.selected + 1) % count, now);
                Transition::Stay
            }
            Key::Enter => match self.selected() {
                MenuEntry::SinglePlayer => Transition::StartMatch,
                MenuEntry::Quit => Transition::Exit,
                entry @ (MenuEntry::Multiplayer | MenuEntry::Settings) => {
                    tracing::warn!(entry = entry.label(), "menu entry is not available");
                    Transition::Stay
                }
            },
            Key::Escape => Transition::Exit,
            Key::Left | Key::Right => Transition::Stay,
        }
    }

    fn advance(&mut self, _now: Millis, _delta: Millis) -> Result<(), EngineError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameScreen
// ---------------------------------------------------------------------------

/// A match in progress.
#[derive(Debug, Clone)]
pub struct GameScreen {
    level_name: String,
    driver: FixedStepDriver,
}

impl GameScreen {
    pub fn new(level: &LevelDescription, config: &EngineConfig) -> Self {
        let simulation = Simulation::new(level, config.removal);
        Self {
            level_name: level.name.clone(),
            driver: FixedStepDriver::new(simulation, config.driver),
        }
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    pub fn driver(&self) -> &FixedStepDriver {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut FixedStepDriver {
        &mut self.driver
    }
}

impl Screen for GameScreen {
    fn name(&self) -> &'static str {
        "game"
    }

    fn impulse(&mut self, key: Key, _now: Millis) -> Transition {
        match key {
            Key::Escape => Transition::ToMenu,
            _ => Transition::Stay,
        }
    }

    fn advance(&mut self, _now: Millis, delta: Millis) -> Result<(), EngineError> {
        self.driver.advance(delta).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Navigator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Active {
    Menu,
    Game(Box<GameScreen>),
}

/// Owns the screens and routes input and frame time to the active one.
///
/// The menu lives as long as the navigator; each match is created fresh
/// when the menu starts one and dropped when it ends.
#[derive(Debug, Clone)]
pub struct Navigator {
    config: EngineConfig,
    menu: MainMenu,
    active: Active,
    keys: KeyRepeat,
    /// Frame time accumulated since the navigator started.
    now: Millis,
    running: bool,
}

impl Navigator {
    /// Start on the main menu.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            keys: KeyRepeat::new(config.repeat_interval_ms),
            config,
            menu: MainMenu::new(),
            active: Active::Menu,
            now: 0,
            running: true,
        })
    }

    pub fn key_down(&mut self, key: Key) {
        self.keys.press(key, self.now);
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys.release(key);
    }

    /// Run one frame of `delta` milliseconds: deliver the frame's impulses,
    /// then advance whichever screen is active afterwards.
    pub fn frame(&mut self, delta: Millis) -> Result<(), EngineError> {
        if !self.running {
            return Ok(());
        }
        let delta = delta.max(0);
        self.now += delta;
        let now = self.now;

        for key in self.keys.drain(now, delta) {
            let transition = self.active_screen_mut().impulse(key, now);
            self.apply(transition);
            if !self.running {
                return Ok(());
            }
        }

        self.active_screen_mut().advance(now, delta)
    }

    fn apply(&mut self, transition: Transition) {
        let from = self.active_screen().name();
        match transition {
            Transition::Stay => return,
            Transition::StartMatch => {
                let game = GameScreen::new(&level_one(), &self.config);
                self.active = Active::Game(Box::new(game));
            }
            Transition::ToMenu => self.active = Active::Menu,
            Transition::Exit => {
                self.running = false;
                self.keys.release_all();
            }
        }
        tracing::debug!(from, to = self.active_screen().name(), ?transition, "screen transition");
    }

    fn active_screen(&self) -> &dyn Screen {
        match &self.active {
            Active::Menu => &self.menu,
            Active::Game(game) => &**game,
        }
    }

    fn active_screen_mut(&mut self) -> &mut dyn Screen {
        match &mut self.active {
            Active::Menu => &mut self.menu,
            Active::Game(game) => &mut **game,
        }
    }

    // -- accessors ----------------------------------------------------------

    /// Name of the active screen.
    pub fn active_name(&self) -> &'static str {
        self.active_screen().name()
    }

    pub fn menu(&self) -> &MainMenu {
        &self.menu
    }

    /// The match in progress, if any.
    pub fn game(&self) -> Option<&GameScreen> {
        match &self.active {
            Active::Game(game) => Some(&**game),
            Active::Menu => None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn now(&self) -> Millis {
        self.now
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
