//! End-to-end studio scenarios driven through `Studio::tick` with raw input
//! frames, the way a platform frontend would.

use glint_cart::Cartridge;
use glint_gfx::Framebuffer;
use glint_host::{NullHost, NullSound};
use glint_input::{InputFrame, Key};
use glint_studio::{Config, Studio};
use std::path::PathBuf;

struct Harness {
    studio: Studio,
    fb: Framebuffer,
    sound: NullSound,
    host: NullHost,
}

impl Harness {
    fn new() -> Self {
        let studio = Studio::new(PathBuf::from("/tmp"), Config::default(), Cartridge::default());
        Self {
            studio,
            fb: Framebuffer::default(),
            sound: NullSound::new(),
            host: NullHost::new(),
        }
    }

    fn tick(&mut self, frame: InputFrame) {
        self.studio
            .tick(&frame, &mut self.fb, &mut self.sound, &mut self.host);
    }

    fn idle(&mut self) {
        self.tick(InputFrame::default());
    }

    fn keys(&mut self, keys: &[Key]) {
        self.tick(InputFrame {
            keys: keys.to_vec(),
            ..InputFrame::default()
        });
    }

    fn type_text(&mut self, text: &str) {
        self.tick(InputFrame {
            text: text.to_string(),
            ..InputFrame::default()
        });
    }

    fn enter_code_mode(&mut self) {
        self.keys(&[Key::F1]);
        self.idle();
    }
}

#[test]
fn code_insert_then_undo_restores_empty_buffer() {
    let mut h = Harness::new();
    h.enter_code_mode();

    h.type_text("hello");
    assert_eq!(h.studio.cart().code.text(), b"hello");

    // One keystroke, one history commit: five undos peel it all back.
    for _ in 0..5 {
        h.keys(&[Key::Ctrl, Key::Z]);
        h.keys(&[Key::Ctrl]);
    }
    assert_eq!(h.studio.cart().code.text(), b"");

    // A sixth undo is a no-op.
    h.keys(&[Key::Ctrl, Key::Z]);
    assert_eq!(h.studio.cart().code.text(), b"");
}

#[test]
fn undo_then_redo_round_trips_the_text() {
    let mut h = Harness::new();
    h.enter_code_mode();
    h.type_text("ab");
    h.keys(&[Key::Ctrl, Key::Z]);
    assert_eq!(h.studio.cart().code.text(), b"a");
    h.idle();
    h.keys(&[Key::Ctrl, Key::Y]);
    assert_eq!(h.studio.cart().code.text(), b"ab");
}

#[test]
fn function_keys_switch_modes() {
    let mut h = Harness::new();
    h.keys(&[Key::F2]);
    assert_eq!(h.studio.mode(), glint_editors::StudioMode::Sprite);
    h.idle();
    h.keys(&[Key::F5]);
    assert_eq!(h.studio.mode(), glint_editors::StudioMode::Music);
}

#[test]
fn escape_toggles_console_and_returns() {
    let mut h = Harness::new();
    h.enter_code_mode();
    h.keys(&[Key::Escape]);
    assert_eq!(h.studio.mode(), glint_editors::StudioMode::Console);
    h.idle();
    h.keys(&[Key::Escape]);
    assert_eq!(h.studio.mode(), glint_editors::StudioMode::Code);
}

#[test]
fn rom_loaded_resets_editor_history() {
    let mut h = Harness::new();
    h.enter_code_mode();
    h.type_text("abc");

    let mut cart = Cartridge::default();
    cart.code.load_text("fresh");
    h.studio.rom_loaded(cart, None);
    assert_eq!(h.studio.cart().code.text(), b"fresh");

    // Old history is gone: undo leaves the fresh cart untouched.
    h.idle();
    h.keys(&[Key::Ctrl, Key::Z]);
    assert_eq!(h.studio.cart().code.text(), b"fresh");
}

#[test]
fn cover_capture_copies_the_framebuffer() {
    let mut h = Harness::new();
    h.enter_code_mode();
    h.keys(&[Key::F7]);
    assert!(h.studio.cart().cover.present);
}

#[test]
fn tab_on_selection_indents_and_shift_tab_restores() {
    let mut h = Harness::new();
    h.enter_code_mode();
    // Newlines arrive as Return presses, not typed characters.
    h.type_text("a");
    h.keys(&[Key::Return]);
    h.idle();
    h.type_text("b");
    h.keys(&[Key::Return]);
    h.idle();
    h.type_text("c");
    assert_eq!(h.studio.cart().code.text(), b"a\nb\nc");

    // Select all, indent, outdent.
    h.keys(&[Key::Ctrl, Key::A]);
    h.idle();
    h.keys(&[Key::Tab]);
    assert_eq!(h.studio.cart().code.text(), b"\ta\n\tb\n\tc");
    h.idle();
    h.keys(&[Key::Shift, Key::Tab]);
    assert_eq!(h.studio.cart().code.text(), b"a\nb\nc");
}
