//! SFX editor: LED-grid envelope canvases (volume / arpeggio / pitch) with
//! loop regions, a waveform pixel editor with a preview bank, a piano for
//! live auditioning, and the speed/stereo/flag toggles.

use crate::{Editor, EditorCtx, StudioEvent, TOOLBAR_H};
use glint_cart::sfx::{SAMPLE_BYTES, SFX_COUNT, SFX_TICKS};
use glint_cart::{Cartridge, Sample, Waveforms, hex};
use glint_gfx::{Rect, color};
use glint_history::History;
use glint_input::{Key, MouseButton};
use tracing::trace;

const SELECTOR_X: i32 = 2;
const SELECTOR_Y: i32 = TOOLBAR_H + 2;

const CANVAS_X: i32 = 88;
const CANVAS_Y: i32 = 12;
const LED_W: i32 = 4;
const LED_H: i32 = 2;
const CANVAS_ROWS: i32 = 16;

const WAVE_X: i32 = 8;
const WAVE_Y: i32 = 56;
const WAVE_CELL: i32 = 2;

const PREVIEW_X: i32 = 8;
const PREVIEW_Y: i32 = 94;

const PIANO_X: i32 = 88;
const PIANO_Y: i32 = 108;
const KEY_W: i32 = 6;
const KEY_H: i32 = 10;

const PREVIEW_CHANNEL: usize = 0;

/// Envelope canvas tabs, indexing `Sample::loops`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Volume = 0,
    Arpeggio = 1,
    Pitch = 2,
}

const TABS: [Tab; 3] = [Tab::Volume, Tab::Arpeggio, Tab::Pitch];

pub struct SfxEditor {
    index: usize,
    tab: Tab,
    /// Waveform being edited in the pixel panel.
    wave_index: usize,
    play_active: bool,
    last_note: Option<(u8, u8)>,
    history: History,
}

fn region_bytes(cart: &Cartridge) -> Vec<u8> {
    let mut out = cart.sfx.to_bytes();
    out.extend_from_slice(cart.waveforms.as_bytes());
    out
}

fn apply_region(cart: &mut Cartridge, bytes: &[u8]) {
    let split = bytes.len() - Waveforms::BYTES;
    cart.sfx.load_bytes(&bytes[..split]);
    cart.waveforms.load_bytes(&bytes[split..]);
}

impl SfxEditor {
    pub fn new(cart: &Cartridge) -> Self {
        Self {
            index: 0,
            tab: Tab::Volume,
            wave_index: 0,
            play_active: false,
            last_note: None,
            history: History::new(&region_bytes(cart)),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn sample<'a>(&self, cart: &'a Cartridge) -> &'a Sample {
        cart.sfx.sample(self.index)
    }

    fn sample_mut<'a>(&self, cart: &'a mut Cartridge) -> &'a mut Sample {
        cart.sfx.sample_mut(self.index)
    }

    fn commit(&mut self, cart: &Cartridge) {
        self.history.add(&region_bytes(cart));
    }

    fn undo(&mut self, cart: &mut Cartridge) {
        let mut bytes = region_bytes(cart);
        if self.history.undo(&mut bytes) {
            apply_region(cart, &bytes);
        }
    }

    fn redo(&mut self, cart: &mut Cartridge) {
        let mut bytes = region_bytes(cart);
        if self.history.redo(&mut bytes) {
            apply_region(cart, &bytes);
        }
    }

    /// Assign one waveform id to every tick of the current sample.
    fn assign_wave(&mut self, cart: &mut Cartridge, wave: u8) {
        self.wave_index = wave as usize % Waveforms::COUNT;
        let sample = self.sample_mut(cart);
        for tick in sample.ticks.iter_mut() {
            tick.wave = wave & 0x0F;
        }
        self.commit(cart);
    }

    // ------------------------------------------------------------ envelope

    fn canvas_rect() -> Rect {
        Rect::new(
            CANVAS_X,
            CANVAS_Y,
            SFX_TICKS as i32 * LED_W,
            CANVAS_ROWS * LED_H,
        )
    }

    fn envelope_value(&self, sample: &Sample, column: usize) -> i32 {
        let tick = &sample.ticks[column];
        match self.tab {
            Tab::Volume => tick.volume as i32,
            Tab::Arpeggio => tick.arpeggio as i32,
            Tab::Pitch => tick.pitch as i32,
        }
    }

    fn set_envelope_value(&self, sample: &mut Sample, column: usize, row: i32) {
        let tick = &mut sample.ticks[column];
        match self.tab {
            Tab::Volume => tick.volume = (CANVAS_ROWS - 1 - row) as u8,
            Tab::Arpeggio => tick.arpeggio = (CANVAS_ROWS - 1 - row) as u8,
            // Signed bar from the vertical center: top row is +7, bottom −8.
            Tab::Pitch => tick.pitch = (7 - row) as i8,
        }
    }

    fn process_canvas(&mut self, ctx: &mut EditorCtx) {
        let rect = Self::canvas_rect();
        let (mx, my) = ctx.input.mouse_pos();
        if rect.contains(mx, my) && ctx.input.mouse_down(MouseButton::Left) {
            let column = ((mx - rect.x) / LED_W).clamp(0, SFX_TICKS as i32 - 1) as usize;
            let row = ((my - rect.y) / LED_H).clamp(0, CANVAS_ROWS - 1);
            let index = self.index;
            let sample = ctx.cart.sfx.sample_mut(index);
            self.set_envelope_value(sample, column, row);
            self.commit(ctx.cart);
        }
    }

    fn draw_canvas(&mut self, ctx: &mut EditorCtx) {
        let rect = Self::canvas_rect();
        let playhead = ctx.sound.sfx_pos(PREVIEW_CHANNEL);
        let sample = *self.sample(ctx.cart);
        let fb = &mut ctx.fb;

        fb.rect_border(
            Rect::new(rect.x - 1, rect.y - 1, rect.w + 2, rect.h + 2),
            color::DARK_GRAY,
        );

        for column in 0..SFX_TICKS {
            let value = self.envelope_value(&sample, column);
            let x = rect.x + column as i32 * LED_W;
            let hot = playhead == Some(column as u8);
            let on = if hot { color::WHITE } else { color::GREEN };
            let off = if hot { color::GRAY } else { color::DARK_GRAY };

            for row in 0..CANVAS_ROWS {
                let lit = match self.tab {
                    // Top-down bar.
                    Tab::Volume => (CANVAS_ROWS - 1 - row) <= value as i32 && value > 0,
                    // Single-row marker.
                    Tab::Arpeggio => (CANVAS_ROWS - 1 - row) == value as i32,
                    // Signed bar from the center line.
                    Tab::Pitch => {
                        let v = 7 - row;
                        (value > 0 && v >= 1 && v <= value)
                            || (value < 0 && v <= -1 && v >= value)
                    }
                };
                fb.rect(
                    Rect::new(x, rect.y + row * LED_H, LED_W - 1, LED_H - 1),
                    if lit { on } else { off },
                );
            }
        }

        // Loop bars under the canvas.
        let lp = sample.loops[self.tab as usize];
        if lp.size > 0 {
            let x0 = rect.x + lp.start as i32 * LED_W;
            let x1 = rect.x + (lp.start + lp.size - 1) as i32 * LED_W;
            fb.vline(x0, rect.y + rect.h, 3, color::YELLOW);
            fb.vline(x1, rect.y + rect.h, 3, color::YELLOW);
        }
    }

    fn process_loop_buttons(&mut self, ctx: &mut EditorCtx) {
        let base = Rect::new(CANVAS_X, CANVAS_Y + CANVAS_ROWS * LED_H + 5, 5, 5);
        let buttons: [(i32, &str, fn(&mut glint_cart::LoopRegion)); 4] = [
            (0, "loop start -", |lp| lp.shift_start(-1)),
            (8, "loop start +", |lp| lp.shift_start(1)),
            (20, "loop size -", |lp| lp.shift_size(-1)),
            (28, "loop size +", |lp| lp.shift_size(1)),
        ];
        for (dx, tip, action) in buttons {
            let rect = Rect::new(base.x + dx, base.y, base.w, base.h);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip(tip);
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    let tab = self.tab as usize;
                    let index = self.index;
                    action(&mut ctx.cart.sfx.sample_mut(index).loops[tab]);
                    self.commit(ctx.cart);
                }
            }
            ctx.fb.rect(rect, color::LIGHT_GRAY);
        }
    }

    fn draw_tabs(&mut self, ctx: &mut EditorCtx) {
        let labels = ["VOLUME", "ARPEGG", "PITCH"];
        for (i, tab) in TABS.iter().enumerate() {
            let rect = Rect::new(CANVAS_X + i as i32 * 44, CANVAS_Y - 9, 40, 8);
            if ctx.mouse_in(rect) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.tab = *tab;
            }
            let paint = if self.tab == *tab {
                color::WHITE
            } else {
                color::GRAY
            };
            ctx.fb.print(labels[i], rect.x, rect.y, paint);
        }
    }

    // ------------------------------------------------------------ waveform

    fn process_wave_editor(&mut self, ctx: &mut EditorCtx) {
        let rect = Rect::new(
            WAVE_X,
            WAVE_Y,
            Waveforms::SAMPLES as i32 * WAVE_CELL,
            16 * WAVE_CELL,
        );
        let (mx, my) = ctx.input.mouse_pos();
        if rect.contains(mx, my) && ctx.input.mouse_down(MouseButton::Left) {
            let column = ((mx - rect.x) / WAVE_CELL) as usize;
            let row = (my - rect.y) / WAVE_CELL;
            // y = 0 maps to maximum amplitude.
            ctx.cart
                .waveforms
                .set_sample(self.wave_index, column, (15 - row) as u8);
            self.commit(ctx.cart);
        }

        let waves = &ctx.cart.waveforms;
        let fb = &mut ctx.fb;
        fb.rect_border(
            Rect::new(rect.x - 1, rect.y - 1, rect.w + 2, rect.h + 2),
            color::DARK_GRAY,
        );
        for column in 0..Waveforms::SAMPLES {
            let value = waves.sample(self.wave_index, column) as i32;
            fb.rect(
                Rect::new(
                    rect.x + column as i32 * WAVE_CELL,
                    rect.y + (15 - value) * WAVE_CELL,
                    WAVE_CELL,
                    WAVE_CELL,
                ),
                color::GREEN,
            );
        }
    }

    fn process_wave_previews(&mut self, ctx: &mut EditorCtx) {
        for wave in 0..Waveforms::COUNT {
            let cell = Rect::new(
                PREVIEW_X + (wave as i32 % 4) * 18,
                PREVIEW_Y + (wave as i32 / 4) * 10,
                17,
                9,
            );
            if ctx.mouse_in(cell) {
                ctx.show_tooltip("select waveform");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.assign_wave(ctx.cart, wave as u8);
                }
            }
            let border = if wave == self.wave_index {
                color::WHITE
            } else {
                color::DARK_GRAY
            };
            {
                let waves = &ctx.cart.waveforms;
                let fb = &mut ctx.fb;
                fb.rect_border(cell, border);
                for column in 0..Waveforms::SAMPLES {
                    let value = waves.sample(wave, column) as i32;
                    fb.set_pixel(
                        cell.x + 1 + column as i32 / 2,
                        cell.y + 7 - value / 2,
                        color::GREEN,
                    );
                }
            }
        }
    }

    // ------------------------------------------------------------ selector

    fn process_selector(&mut self, ctx: &mut EditorCtx) {
        for i in 0..SFX_COUNT {
            let rect = Rect::new(
                SELECTOR_X + (i as i32 % 8) * 8,
                SELECTOR_Y + (i as i32 / 8) * 5,
                7,
                4,
            );
            if ctx.mouse_in(rect) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.index = i;
            }
            let paint = if i == self.index {
                color::WHITE
            } else {
                color::GRAY
            };
            ctx.fb.rect(rect, paint);
        }
        let label = format!("{:02}", self.index);
        ctx.fb
            .print_shadow(&label, SELECTOR_X, SELECTOR_Y + 42, color::WHITE, color::BLACK);
    }

    fn process_speed_and_flags(&mut self, ctx: &mut EditorCtx) {
        // Speed: eight cells, 0..7.
        for i in 0..8i32 {
            let rect = Rect::new(CANVAS_X + i * 6, CANVAS_Y + 44, 5, 4);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip("sfx speed");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    let index = self.index;
                    ctx.cart.sfx.sample_mut(index).speed = i as u8;
                    self.commit(ctx.cart);
                }
            }
            let speed = self.sample(ctx.cart).speed as i32;
            ctx.fb
                .rect(rect, if i <= speed { color::YELLOW } else { color::DARK_GRAY });
        }

        let flags: [(&str, fn(&mut Sample) -> &mut bool); 4] = [
            ("L", |s| &mut s.stereo_left),
            ("R", |s| &mut s.stereo_right),
            ("x16", |s| &mut s.pitch16x),
            ("dn", |s| &mut s.arp_down),
        ];
        for (i, (label, field)) in flags.iter().enumerate() {
            let rect = Rect::new(CANVAS_X + 60 + i as i32 * 16, CANVAS_Y + 44, 14, 6);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip("toggle");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    let index = self.index;
                    let flag = field(ctx.cart.sfx.sample_mut(index));
                    *flag = !*flag;
                    self.commit(ctx.cart);
                }
            }
            let on = {
                let mut sample = *self.sample(ctx.cart);
                *field(&mut sample)
            };
            let paint = if on { color::WHITE } else { color::GRAY };
            ctx.fb.print(label, rect.x, rect.y, paint);
        }
    }

    // --------------------------------------------------------------- piano

    fn process_piano(&mut self, ctx: &mut EditorCtx) {
        let mut held = false;
        for row in 0..2i32 {
            for key in 0..12i32 {
                let rect = Rect::new(PIANO_X + key * KEY_W, PIANO_Y + row * (KEY_H + 2), KEY_W - 1, KEY_H);
                if ctx.mouse_in(rect) && ctx.input.mouse_down(MouseButton::Left) {
                    let index = self.index;
                    let octave = {
                        let sample = ctx.cart.sfx.sample_mut(index);
                        sample.note = key as u8;
                        // Top row plays one octave up.
                        if row == 0 {
                            (sample.octave + 1).min(7)
                        } else {
                            sample.octave
                        }
                    };
                    self.start_preview(ctx, key as u8, octave);
                    held = true;
                }
                let semitone = [1, 3, 6, 8, 10].contains(&key);
                ctx.fb.rect(
                    Rect::new(PIANO_X + key * KEY_W, PIANO_Y + row * (KEY_H + 2), KEY_W - 1, KEY_H),
                    if semitone { color::BLACK } else { color::WHITE },
                );
            }
        }

        // Space auditions the sample's stored note.
        if ctx.input.key(Key::Space) {
            let sample = *self.sample(ctx.cart);
            self.start_preview(ctx, sample.note, sample.octave);
            held = true;
        }

        if !held && self.play_active {
            self.stop_preview(ctx);
        }
    }

    fn start_preview(&mut self, ctx: &mut EditorCtx, note: u8, octave: u8) {
        if self.last_note != Some((note, octave)) {
            ctx.sound.stop_sfx(PREVIEW_CHANNEL);
            ctx.sound
                .play_sfx(self.index as i32, note, octave, -1, PREVIEW_CHANNEL);
            self.last_note = Some((note, octave));
        }
        self.play_active = true;
    }

    fn stop_preview(&mut self, ctx: &mut EditorCtx) {
        ctx.sound.stop_sfx(PREVIEW_CHANNEL);
        self.play_active = false;
        self.last_note = None;
    }

    // ------------------------------------------------------------ keyboard

    fn process_keyboard(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;
        if input.ctrl() {
            if input.key_pressed(Key::Z) {
                self.undo(ctx.cart);
            } else if input.key_pressed(Key::Y) {
                self.redo(ctx.cart);
            }
            return;
        }
        if input.key_pressed(Key::Left) {
            self.index = (self.index + SFX_COUNT - 1) % SFX_COUNT;
        } else if input.key_pressed(Key::Right) {
            self.index = (self.index + 1) % SFX_COUNT;
        } else if input.key_pressed(Key::Up) {
            let index = self.index;
            let sample = ctx.cart.sfx.sample_mut(index);
            sample.octave = (sample.octave + 1).min(7);
            self.commit(ctx.cart);
        } else if input.key_pressed(Key::Down) {
            let index = self.index;
            let sample = ctx.cart.sfx.sample_mut(index);
            sample.octave = sample.octave.saturating_sub(1);
            self.commit(ctx.cart);
        }
    }

    // ------------------------------------------------------------ clipboard

    fn copy(&mut self, ctx: &mut EditorCtx) {
        let mut bytes = [0u8; SAMPLE_BYTES];
        self.sample(ctx.cart).to_bytes(&mut bytes);
        ctx.host.clipboard_set(&hex::encode(&bytes));
    }

    fn cut(&mut self, ctx: &mut EditorCtx) {
        self.copy(ctx);
        *self.sample_mut(ctx.cart) = Sample::default();
        self.commit(ctx.cart);
    }

    fn paste(&mut self, ctx: &mut EditorCtx) {
        let Some(clip) = ctx.host.clipboard_get() else {
            return;
        };
        match hex::decode(&clip, SAMPLE_BYTES) {
            Ok(bytes) => {
                *self.sample_mut(ctx.cart) = Sample::from_bytes(&bytes);
                self.commit(ctx.cart);
            }
            Err(err) => trace!(target: "editor.sfx", %err, "sfx paste rejected"),
        }
    }
}

impl Editor for SfxEditor {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        self.process_keyboard(ctx);

        ctx.fb.clear(color::BLACK);
        self.process_selector(ctx);
        self.draw_tabs(ctx);
        self.process_canvas(ctx);
        self.draw_canvas(ctx);
        self.process_loop_buttons(ctx);
        self.process_speed_and_flags(ctx);
        self.process_wave_editor(ctx);
        self.process_wave_previews(ctx);
        self.process_piano(ctx);
    }

    fn event(&mut self, ctx: &mut EditorCtx, event: StudioEvent) {
        match event {
            StudioEvent::Cut => self.cut(ctx),
            StudioEvent::Copy => self.copy(ctx),
            StudioEvent::Paste => self.paste(ctx),
            StudioEvent::Undo => self.undo(ctx.cart),
            StudioEvent::Redo => self.redo(ctx.cart),
        }
    }

    fn rom_loaded(&mut self, cart: &Cartridge) {
        self.index = 0;
        self.tab = Tab::Volume;
        self.wave_index = 0;
        self.play_active = false;
        self.last_note = None;
        self.history = History::new(&region_bytes(cart));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_host::HostSystem;

    #[test]
    fn assign_wave_touches_every_tick() {
        let mut cart = Cartridge::default();
        let mut editor = SfxEditor::new(&cart);
        editor.assign_wave(&mut cart, 7);
        assert!(cart.sfx.sample(0).ticks.iter().all(|t| t.wave == 7));
        assert_eq!(cart.sfx.sample(0).loops[0].size, 0, "no loop by default");
    }

    #[test]
    fn envelope_rows_map_top_to_max() {
        let cart = Cartridge::default();
        let editor = SfxEditor::new(&cart);
        let mut sample = Sample::default();
        editor.set_envelope_value(&mut sample, 3, 0);
        assert_eq!(sample.ticks[3].volume, 15);
        editor.set_envelope_value(&mut sample, 3, 15);
        assert_eq!(sample.ticks[3].volume, 0);
    }

    #[test]
    fn pitch_rows_are_signed_about_the_center() {
        let cart = Cartridge::default();
        let mut editor = SfxEditor::new(&cart);
        editor.tab = Tab::Pitch;
        let mut sample = Sample::default();
        editor.set_envelope_value(&mut sample, 0, 0);
        assert_eq!(sample.ticks[0].pitch, 7);
        editor.set_envelope_value(&mut sample, 0, 15);
        assert_eq!(sample.ticks[0].pitch, -8);
    }

    #[test]
    fn cut_resets_the_sample() {
        let mut cart = Cartridge::default();
        cart.sfx.sample_mut(0).ticks[0].volume = 9;
        let mut editor = SfxEditor::new(&cart);
        editor.history = History::new(&region_bytes(&cart));
        let mut host = glint_host::NullHost::new();
        let mut sound = glint_host::NullSound::new();
        let mut fb = glint_gfx::Framebuffer::default();
        let mut input = glint_input::Input::new();
        input.begin_frame(&glint_input::InputFrame::default());
        let mut tooltip = String::new();
        let mut mode_request = None;
        let mut ctx = EditorCtx {
            cart: &mut cart,
            fb: &mut fb,
            input: &input,
            sound: &mut sound,
            host: &mut host,
            script: &glint_script::PlainScript,
            tooltip: &mut tooltip,
            mode_request: &mut mode_request,
            frame: 0,
        };
        editor.cut(&mut ctx);
        assert!(cart.sfx.sample(0).is_default());
        assert!(host.clipboard_has());
    }
}
