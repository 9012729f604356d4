//! The editor suite: code, sprite, map, world, sfx, and music.
//!
//! Every editor implements the same narrow contract: `tick` runs once per
//! frame while its mode is active, `event` receives clipboard/undo commands
//! routed from the toolbar, and `rom_loaded` rebuilds history heads and
//! clears transient state after a cartridge swap. Editors own their history
//! handles; the router owns the cartridge and everything else arrives
//! through the per-tick context.

use glint_cart::Cartridge;
use glint_gfx::{Framebuffer, Rect};
use glint_host::{HostSystem, SoundEngine};
use glint_input::Input;
use glint_script::ScriptConfig;

pub mod code;
pub mod map;
pub mod music;
pub mod sfx;
pub mod sprite;
pub mod world;

pub use code::CodeEditor;
pub use map::{MapEditor, MapTool};
pub use music::MusicEditor;
pub use sfx::SfxEditor;
pub use sprite::{SpriteEditor, Tool as SpriteTool};
pub use world::WorldOverview;

/// Height of the studio toolbar strip; editors draw below it.
pub const TOOLBAR_H: i32 = 7;
/// Y of the one-row status line at the bottom of the screen.
pub const STATUS_Y: i32 = glint_gfx::HEIGHT - 7;

/// Top-level studio modes. The router owns the current and previous mode;
/// editors request switches through `EditorCtx::mode_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioMode {
    Console,
    Run,
    Code,
    Sprite,
    Map,
    World,
    Sfx,
    Music,
    Surf,
    Menu,
}

/// Toolbar-sourced commands delivered to whichever editor has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioEvent {
    Cut,
    Copy,
    Paste,
    Undo,
    Redo,
}

/// Everything an editor touches during one tick.
pub struct EditorCtx<'a> {
    pub cart: &'a mut Cartridge,
    pub fb: &'a mut Framebuffer,
    pub input: &'a Input,
    pub sound: &'a mut dyn SoundEngine,
    pub host: &'a mut dyn HostSystem,
    pub script: &'a dyn ScriptConfig,
    /// One-frame tooltip line rendered by the router.
    pub tooltip: &'a mut String,
    /// Mode switch requested by the editor (map ↔ world, outline exits).
    pub mode_request: &'a mut Option<StudioMode>,
    /// Frame counter for blink timing.
    pub frame: u32,
}

impl EditorCtx<'_> {
    pub fn show_tooltip(&mut self, text: &str) {
        self.tooltip.clear();
        self.tooltip.push_str(text);
    }

    /// True when the mouse sits inside `rect` this frame.
    pub fn mouse_in(&self, rect: Rect) -> bool {
        let (x, y) = self.input.mouse_pos();
        rect.contains(x, y)
    }
}

pub trait Editor {
    fn tick(&mut self, ctx: &mut EditorCtx);
    fn event(&mut self, ctx: &mut EditorCtx, event: StudioEvent);
    /// Rebuild history heads and zero transient state for a fresh cart.
    fn rom_loaded(&mut self, cart: &Cartridge);
    /// Drawn after the active mode's frame is composed.
    fn overline(&mut self, _ctx: &mut EditorCtx) {}
    /// Per-row hook while the frame is scanned out.
    fn scanline(&mut self, _ctx: &mut EditorCtx, _row: i32) {}
}
