//! Studio router: owns the cartridge, the current mode, and the editor
//! suite; dispatches global hotkeys before the active editor's tick; renders
//! the toolbar tab strip, tooltip line, and transient popup messages.
//!
//! The console, the cartridge VM, surf, and menu are external collaborators:
//! the router tracks their modes and drives the pause/reset contract, but
//! their surfaces are rendered elsewhere.

use glint_cart::{Cartridge, chunk};
use glint_editors::{
    CodeEditor, Editor, EditorCtx, MapEditor, MusicEditor, SfxEditor, SpriteEditor, StudioEvent,
    StudioMode, TOOLBAR_H, WorldOverview,
};
use glint_gfx::{Framebuffer, Rect, color};
use glint_host::{HostSystem, SoundEngine};
use glint_input::{Input, InputFrame, Key, MouseButton};
use glint_script::{PlainScript, ScriptConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod config;
pub mod keymap;

pub use config::Config;
pub use keymap::{KEYMAP_SIZE, Keymap};

/// Frames a popup message stays on screen (three seconds at 60 Hz).
const POPUP_FRAMES: u32 = 180;

const CONFIG_TOML: &str = "glint.toml";
const KEYMAP_DAT: &str = "keymap.dat";

struct Editors {
    code: CodeEditor,
    sprite: SpriteEditor,
    map: MapEditor,
    world: WorldOverview,
    sfx: SfxEditor,
    music: MusicEditor,
}

pub struct Studio {
    cart: Cartridge,
    input: Input,
    mode: StudioMode,
    prev_mode: StudioMode,
    editors: Editors,
    script: Box<dyn ScriptConfig>,
    tooltip: String,
    popup: Option<(String, u32)>,
    frame: u32,
    folder: PathBuf,
    cart_path: Option<PathBuf>,
    keymap: Keymap,
    config: Config,
    gif_recording: bool,
    exit: bool,
}

impl Studio {
    pub fn new(folder: PathBuf, config: Config, cart: Cartridge) -> Self {
        let keymap = Keymap::load_from(&folder.join(KEYMAP_DAT));
        let editors = Editors {
            code: CodeEditor::new(&cart),
            sprite: SpriteEditor::new(&cart),
            map: MapEditor::new(&cart),
            world: WorldOverview::new(&cart),
            sfx: SfxEditor::new(&cart),
            music: MusicEditor::new(&cart),
        };
        Self {
            cart,
            input: Input::new(),
            mode: StudioMode::Console,
            prev_mode: StudioMode::Code,
            editors,
            script: Box::new(PlainScript),
            tooltip: String::new(),
            popup: None,
            frame: 0,
            folder,
            cart_path: None,
            keymap,
            config,
            gif_recording: false,
            exit: false,
        }
    }

    pub fn config_path(folder: &Path) -> PathBuf {
        folder.join(CONFIG_TOML)
    }

    pub fn mode(&self) -> StudioMode {
        self.mode
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// App folder holding `glint.toml`, `keymap.dat`, and the cover cache.
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn cart(&self) -> &Cartridge {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn set_script(&mut self, script: Box<dyn ScriptConfig>) {
        self.script = script;
    }

    /// Install a fresh cartridge: history heads rebuilt, transient editor
    /// state zeroed.
    pub fn rom_loaded(&mut self, cart: Cartridge, path: Option<PathBuf>) {
        self.cart = cart;
        self.cart_path = path;
        self.editors.code.rom_loaded(&self.cart);
        self.editors.sprite.rom_loaded(&self.cart);
        self.editors.map.rom_loaded(&self.cart);
        self.editors.world.rom_loaded(&self.cart);
        self.editors.sfx.rom_loaded(&self.cart);
        self.editors.music.rom_loaded(&self.cart);
        info!(target: "studio", path = ?self.cart_path, "cartridge installed");
    }

    pub fn load_cart_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let bytes = std::fs::read(path)?;
        let cart = chunk::load(&bytes)?;
        self.rom_loaded(cart, Some(path.to_path_buf()));
        Ok(())
    }

    pub fn show_popup(&mut self, text: &str) {
        self.popup = Some((text.to_string(), POPUP_FRAMES));
    }

    pub fn set_mode(&mut self, mode: StudioMode, sound: &mut dyn SoundEngine) {
        if mode == self.mode {
            return;
        }
        // Leaving RUN pauses the VM; entering any non-RUN mode resets it.
        if self.mode == StudioMode::Run {
            sound.pause();
        }
        if mode != StudioMode::Run {
            sound.reset();
        } else {
            sound.resume();
        }
        self.prev_mode = self.mode;
        self.mode = mode;
        // A mode switch aborts any in-flight gesture.
        self.input.cancel_edges();
        if mode == StudioMode::World {
            self.editors.world.prepare(&self.cart);
        }
        debug!(target: "studio.tick", ?mode, prev = ?self.prev_mode, "mode change");
    }

    fn save_cart(&mut self, host: &mut dyn HostSystem) {
        let bytes = chunk::save(&self.cart);
        match &self.cart_path {
            Some(path) => match std::fs::write(path, &bytes) {
                Ok(()) => self.show_popup("cart saved"),
                Err(err) => {
                    warn!(target: "studio", %err, "cart save failed");
                    self.show_popup("save error");
                }
            },
            None => {
                if host.file_dialog_save("cart.tic", &bytes) {
                    self.show_popup("cart saved");
                }
            }
        }
    }

    fn is_editor_mode(mode: StudioMode) -> bool {
        matches!(
            mode,
            StudioMode::Code
                | StudioMode::Sprite
                | StudioMode::Map
                | StudioMode::World
                | StudioMode::Sfx
                | StudioMode::Music
        )
    }

    /// Global hotkeys, evaluated before the active editor sees input.
    fn process_hotkeys(
        &mut self,
        fb: &Framebuffer,
        sound: &mut dyn SoundEngine,
        host: &mut dyn HostSystem,
    ) {
        let alt = self.input.alt();
        let ctrl = self.input.ctrl();

        let mode_keys = [
            (Key::F1, Key::Digit1, StudioMode::Code),
            (Key::F2, Key::Digit2, StudioMode::Sprite),
            (Key::F3, Key::Digit3, StudioMode::Map),
            (Key::F4, Key::Digit4, StudioMode::Sfx),
            (Key::F5, Key::Digit5, StudioMode::Music),
        ];
        for (fkey, altkey, mode) in mode_keys {
            let hit = self.input.key_pressed_once(fkey)
                || (alt && self.input.key_pressed_once(altkey));
            if hit {
                self.set_mode(mode, sound);
                return;
            }
        }

        if alt && self.input.key_pressed_once(Key::Grave) {
            self.set_mode(StudioMode::Console, sound);
        } else if ctrl
            && (self.input.key_pressed_once(Key::R) || self.input.key_pressed_once(Key::Return))
        {
            self.set_mode(StudioMode::Run, sound);
        } else if ctrl && self.input.key_pressed_once(Key::S) {
            self.save_cart(host);
        } else if self.input.key_pressed_once(Key::F7) {
            self.cart.cover.capture(fb.pixels());
            self.show_popup("cover image saved");
        } else if self.input.key_pressed_once(Key::F8) {
            self.show_popup("screenshot saved");
        } else if self.input.key_pressed_once(Key::F9) {
            self.gif_recording = !self.gif_recording;
            if self.gif_recording {
                self.show_popup("recording gif");
            } else {
                self.show_popup("gif saved");
            }
        } else if self.input.key_pressed_once(Key::F11)
            || (alt && self.input.key_pressed_once(Key::Return))
        {
            host.fullscreen_toggle();
        } else if self.input.key_pressed_once(Key::Escape) {
            // Cascade: close popup, then fall back toward the console.
            if self.mode == StudioMode::Code && self.editors.code.in_popup() {
                self.editors.code.escape(&self.cart);
            } else if self.mode == StudioMode::Console {
                let prev = self.prev_mode;
                self.set_mode(prev, sound);
            } else {
                self.set_mode(StudioMode::Console, sound);
            }
        }
    }

    /// Keyboard clipboard chords routed as toolbar events.
    fn clipboard_event(&self) -> Option<StudioEvent> {
        if !self.input.ctrl() {
            return None;
        }
        if self.input.key_pressed_once(Key::X) {
            Some(StudioEvent::Cut)
        } else if self.input.key_pressed_once(Key::C) {
            Some(StudioEvent::Copy)
        } else if self.input.key_pressed_once(Key::V) {
            Some(StudioEvent::Paste)
        } else {
            None
        }
    }

    fn dispatch_event(
        &mut self,
        event: StudioEvent,
        fb: &mut Framebuffer,
        sound: &mut dyn SoundEngine,
        host: &mut dyn HostSystem,
    ) {
        let mut mode_request = None;
        let mut ctx = EditorCtx {
            cart: &mut self.cart,
            fb,
            input: &self.input,
            sound,
            host,
            script: self.script.as_ref(),
            tooltip: &mut self.tooltip,
            mode_request: &mut mode_request,
            frame: self.frame,
        };
        match self.mode {
            StudioMode::Code => self.editors.code.event(&mut ctx, event),
            StudioMode::Sprite => self.editors.sprite.event(&mut ctx, event),
            StudioMode::Map => self.editors.map.event(&mut ctx, event),
            StudioMode::World => self.editors.world.event(&mut ctx, event),
            StudioMode::Sfx => self.editors.sfx.event(&mut ctx, event),
            StudioMode::Music => self.editors.music.event(&mut ctx, event),
            _ => {}
        }
    }

    fn editor_tick(
        &mut self,
        fb: &mut Framebuffer,
        sound: &mut dyn SoundEngine,
        host: &mut dyn HostSystem,
    ) -> Option<StudioMode> {
        let mut mode_request = None;
        let map_scroll = self.editors.map.scroll();
        {
            let mut ctx = EditorCtx {
                cart: &mut self.cart,
                fb,
                input: &self.input,
                sound,
                host,
                script: self.script.as_ref(),
                tooltip: &mut self.tooltip,
                mode_request: &mut mode_request,
                frame: self.frame,
            };
            match self.mode {
                StudioMode::Code => self.editors.code.tick(&mut ctx),
                StudioMode::Sprite => self.editors.sprite.tick(&mut ctx),
                StudioMode::Map => self.editors.map.tick(&mut ctx),
                StudioMode::World => {
                    self.editors.world.tick(&mut ctx);
                    self.editors.world.draw(&mut ctx, map_scroll);
                }
                StudioMode::Sfx => self.editors.sfx.tick(&mut ctx),
                StudioMode::Music => self.editors.music.tick(&mut ctx),
                StudioMode::Console | StudioMode::Run | StudioMode::Surf | StudioMode::Menu => {
                    // External surfaces; the core only clears the frame.
                    ctx.fb.clear(color::BLACK);
                }
            }
        }
        if let Some((x, y)) = self.editors.world.take_scroll() {
            self.editors.map.set_scroll(x, y);
        }
        mode_request
    }

    /// Tab strip plus the cut/copy/paste/undo/redo/run button row. Returns
    /// whichever control was clicked; the caller applies it after drawing.
    fn toolbar(&mut self, fb: &mut Framebuffer) -> Option<ToolbarAction> {
        if !Self::is_editor_mode(self.mode) || self.mode == StudioMode::World {
            return None;
        }
        fb.rect(Rect::new(0, 0, glint_gfx::WIDTH, TOOLBAR_H), color::WHITE);

        let mut action = None;
        let tabs = [
            (StudioMode::Code, "CODE"),
            (StudioMode::Sprite, "GFX"),
            (StudioMode::Map, "MAP"),
            (StudioMode::Sfx, "SFX"),
            (StudioMode::Music, "TRK"),
        ];
        for (i, (mode, label)) in tabs.iter().enumerate() {
            let rect = Rect::new(i as i32 * 24, 0, 23, TOOLBAR_H);
            let (mx, my) = self.input.mouse_pos();
            if rect.contains(mx, my) && self.input.mouse_pressed(MouseButton::Left) {
                action = Some(ToolbarAction::Tab(*mode));
            }
            let active = self.mode == *mode;
            if active {
                fb.rect(rect, color::DARK_GRAY);
            }
            let paint = if active { color::WHITE } else { color::GRAY };
            fb.print(label, rect.x + 2, 0, paint);
        }

        let buttons = [
            (StudioEvent::Cut, "cut"),
            (StudioEvent::Copy, "copy"),
            (StudioEvent::Paste, "paste"),
            (StudioEvent::Undo, "undo"),
            (StudioEvent::Redo, "redo"),
        ];
        for (i, (event, tip)) in buttons.iter().enumerate() {
            let rect = Rect::new(130 + i as i32 * 9, 0, 8, TOOLBAR_H);
            let (mx, my) = self.input.mouse_pos();
            if rect.contains(mx, my) {
                self.tooltip = tip.to_string();
                if self.input.mouse_pressed(MouseButton::Left) {
                    action = Some(ToolbarAction::Event(*event));
                }
            }
            fb.rect_border(Rect::new(rect.x, 1, 6, 5), color::GRAY);
        }

        let run_rect = Rect::new(178, 0, 8, TOOLBAR_H);
        let (mx, my) = self.input.mouse_pos();
        if run_rect.contains(mx, my) {
            self.tooltip = "run cart".to_string();
            if self.input.mouse_pressed(MouseButton::Left) {
                action = Some(ToolbarAction::Run);
            }
        }
        fb.rect_border(Rect::new(run_rect.x, 1, 6, 5), color::GRAY);

        // Tooltip line at the right end of the strip.
        if !self.tooltip.is_empty() {
            let text = self.tooltip.clone();
            let w = text.len() as i32 * glint_gfx::CHAR_WIDTH;
            fb.print(&text, glint_gfx::WIDTH - w - 1, 0, color::DARK_GRAY);
        }
        action
    }

    fn draw_popup(&mut self, fb: &mut Framebuffer) {
        if let Some((text, frames)) = &mut self.popup {
            let y = TOOLBAR_H;
            fb.rect(Rect::new(0, y, glint_gfx::WIDTH, 8), color::RED);
            let w = text.len() as i32 * glint_gfx::CHAR_WIDTH;
            let text = text.clone();
            fb.print(&text, (glint_gfx::WIDTH - w) / 2, y + 1, color::WHITE);
            *frames -= 1;
        }
        if matches!(self.popup, Some((_, 0))) {
            self.popup = None;
        }
    }

    /// One frame: input snapshot, global hotkeys, active editor, chrome.
    pub fn tick(
        &mut self,
        frame_input: &InputFrame,
        fb: &mut Framebuffer,
        sound: &mut dyn SoundEngine,
        host: &mut dyn HostSystem,
    ) {
        self.frame = self.frame.wrapping_add(1);
        self.input.begin_frame(frame_input);
        self.tooltip.clear();

        self.process_hotkeys(fb, sound, host);

        if let Some(event) = self.clipboard_event() {
            self.dispatch_event(event, fb, sound, host);
        }

        if let Some(mode) = self.editor_tick(fb, sound, host) {
            self.set_mode(mode, sound);
        }

        match self.toolbar(fb) {
            Some(ToolbarAction::Event(event)) => self.dispatch_event(event, fb, sound, host),
            Some(ToolbarAction::Tab(mode)) => self.set_mode(mode, sound),
            Some(ToolbarAction::Run) => self.set_mode(StudioMode::Run, sound),
            None => {}
        }

        self.draw_popup(fb);
    }
}

enum ToolbarAction {
    Event(StudioEvent),
    Tab(StudioMode),
    Run,
}
