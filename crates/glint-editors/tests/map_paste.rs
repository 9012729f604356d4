//! Map clipboard scenario: copy a rectangle, paste it elsewhere through the
//! preview overlay, and verify the rest of the world is untouched.

use glint_cart::Cartridge;
use glint_editors::{Editor, EditorCtx, MapEditor, MapTool, StudioEvent};
use glint_gfx::Framebuffer;
use glint_host::{HostSystem, NullHost, NullSound};
use glint_input::{Input, InputFrame};
use glint_script::PlainScript;

struct Rig {
    cart: Cartridge,
    fb: Framebuffer,
    input: Input,
    sound: NullSound,
    host: NullHost,
    tooltip: String,
}

impl Rig {
    fn new() -> Self {
        Self {
            cart: Cartridge::default(),
            fb: Framebuffer::default(),
            input: Input::new(),
            sound: NullSound::new(),
            host: NullHost::new(),
            tooltip: String::new(),
        }
    }

    fn frame(&mut self, raw: InputFrame) {
        self.input.begin_frame(&raw);
    }

    fn run<F: FnOnce(&mut MapEditor, &mut EditorCtx)>(&mut self, editor: &mut MapEditor, f: F) {
        let mut mode_request = None;
        let mut ctx = EditorCtx {
            cart: &mut self.cart,
            fb: &mut self.fb,
            input: &self.input,
            sound: &mut self.sound,
            host: &mut self.host,
            script: &PlainScript,
            tooltip: &mut self.tooltip,
            mode_request: &mut mode_request,
            frame: 0,
        };
        f(editor, &mut ctx);
    }
}

#[test]
fn copy_then_paste_overlays_at_the_cursor() {
    let mut rig = Rig::new();
    // Source block {1,2,3,4} at (0,0)..(1,1).
    rig.cart.map.set(0, 0, 1);
    rig.cart.map.set(1, 0, 2);
    rig.cart.map.set(0, 1, 3);
    rig.cart.map.set(1, 1, 4);

    let mut editor = MapEditor::new(&rig.cart);
    editor.set_tool(MapTool::Select);

    // Copy the selection, then paste: the editor enters preview mode.
    rig.frame(InputFrame::default());
    rig.run(&mut editor, |e, ctx| {
        e.set_selection(Some(glint_gfx::Rect::new(0, 0, 2, 2)));
        e.event(ctx, StudioEvent::Copy);
        e.event(ctx, StudioEvent::Paste);
    });

    // Click with the stamp centered over tile (5,5): the 2x2 block lands at
    // (5,5)..(6,6).
    rig.frame(InputFrame {
        mouse_x: 44,
        mouse_y: 44,
        left: true,
        ..InputFrame::default()
    });
    rig.run(&mut editor, |e, ctx| e.tick(ctx));

    assert_eq!(rig.cart.map.get(5, 5), 1);
    assert_eq!(rig.cart.map.get(6, 5), 2);
    assert_eq!(rig.cart.map.get(5, 6), 3);
    assert_eq!(rig.cart.map.get(6, 6), 4);

    // The source block and everything else is unchanged.
    assert_eq!(rig.cart.map.get(0, 0), 1);
    assert_eq!(rig.cart.map.get(7, 5), 0);
    assert_eq!(rig.cart.map.get(5, 7), 0);
}

#[test]
fn malformed_clipboard_is_ignored() {
    let mut rig = Rig::new();
    let mut editor = MapEditor::new(&rig.cart);
    rig.frame(InputFrame::default());
    rig.run(&mut editor, |e, ctx| {
        ctx.host.clipboard_set("zz-not-hex");
        e.event(ctx, StudioEvent::Paste);
        e.tick(ctx);
    });
    assert!(rig.cart.map.as_bytes().iter().all(|&b| b == 0));
}
