//! Music tracker: a 16-row × 4-channel grid over the current frame's
//! patterns, a frame column with per-channel pattern-id boxes, note entry
//! from the keyboard piano, a play state machine with follow mode, and
//! per-channel mute tumblers.

use crate::{Editor, EditorCtx, StudioEvent, TOOLBAR_H};
use glint_cart::music::{
    CHANNELS, COMMAND_CHARS, MUSIC_PATTERNS, MUSIC_TRACKS, NOTE_BASE, NOTE_STOP, NOTES,
    PATTERN_ROWS, Row, TRACK_FRAMES,
};
use glint_cart::{Cartridge, hex};
use glint_gfx::{CHAR_HEIGHT, CHAR_WIDTH, Rect, color};
use glint_history::History;
use glint_input::{Key, MouseButton};
use tracing::trace;

/// Rows visible in the tracker grid.
const VISIBLE_ROWS: i32 = 16;
/// Editable columns per channel: note, semitone, octave, sfx hi/lo,
/// command, param1, param2.
const CHANNEL_COLS: i32 = 8;
const TRACKER_COLS: i32 = CHANNELS as i32 * CHANNEL_COLS;

const COL_NOTE: i32 = 0;
const COL_SEMITONE: i32 = 1;
const COL_OCTAVE: i32 = 2;
const COL_SFX_HI: i32 = 3;
const COL_SFX_LO: i32 = 4;
const COL_COMMAND: i32 = 5;
const COL_PARAM1: i32 = 6;
const COL_PARAM2: i32 = 7;

const GRID_X: i32 = 36;
const GRID_Y: i32 = TOOLBAR_H + 20;
const FRAME_X: i32 = 2;
const HEADER_Y: i32 = TOOLBAR_H + 10;
/// Screen width of one channel cell: eight glyphs plus a gutter.
const CELL_W: i32 = CHAR_WIDTH * 8 + 2;

const AUDITION_TICKS: i32 = 4;

/// Keyboard piano: twelve semitones, then the next octave's twelve.
const PIANO_KEYS: [Key; 24] = [
    Key::Z, Key::S, Key::X, Key::D, Key::C, Key::V, Key::G, Key::B,
    Key::H, Key::N, Key::J, Key::M,
    Key::Q, Key::Digit2, Key::W, Key::Digit3, Key::E, Key::R, Key::Digit5,
    Key::T, Key::Digit6, Key::Y, Key::Digit7, Key::U,
];

const NOTE_NAMES: [&str; 12] = [
    "C-", "C#", "D-", "D#", "E-", "F-", "F#", "G-", "G#", "A-", "A#", "B-",
];

pub struct MusicEditor {
    track: usize,
    frame: usize,
    /// −1 addresses the pattern-id header row.
    row: i32,
    col: i32,
    scroll: i32,
    follow: bool,
    /// Row-span selection inside one channel: (channel, first, last).
    selection: Option<(i32, i32, i32)>,
    select_anchor: Option<(i32, i32)>,
    last_octave: u8,
    last_sfx: u8,
    muted: [bool; CHANNELS],
    history: History,
}

impl MusicEditor {
    pub fn new(cart: &Cartridge) -> Self {
        Self {
            track: 0,
            frame: 0,
            row: 0,
            col: 0,
            scroll: 0,
            follow: true,
            selection: None,
            select_anchor: None,
            last_octave: 3,
            last_sfx: 0,
            muted: [false; CHANNELS],
            history: History::new(&cart.music.to_bytes()),
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn set_follow(&mut self, follow: bool) {
        self.follow = follow;
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    fn channel(&self) -> i32 {
        self.col / CHANNEL_COLS
    }

    fn rows(&self, cart: &Cartridge) -> i32 {
        cart.music.tracks[self.track].rows.clamp(1, PATTERN_ROWS as u8) as i32
    }

    fn pattern_id(&self, cart: &Cartridge, channel: i32) -> u8 {
        cart.music.tracks[self.track].frames[self.frame][channel as usize]
    }

    fn commit(&mut self, cart: &Cartridge) {
        self.history.add(&cart.music.to_bytes());
    }

    fn undo(&mut self, cart: &mut Cartridge) {
        let mut bytes = cart.music.to_bytes();
        if self.history.undo(&mut bytes) {
            cart.music.load_bytes(&bytes);
        }
    }

    fn redo(&mut self, cart: &mut Cartridge) {
        let mut bytes = cart.music.to_bytes();
        if self.history.redo(&mut bytes) {
            cart.music.load_bytes(&bytes);
        }
    }

    fn row_at<'a>(&self, cart: &'a mut Cartridge, channel: i32, row: i32) -> Option<&'a mut Row> {
        let id = self.pattern_id(cart, channel);
        let pattern = cart.music.pattern_mut(id)?;
        pattern.rows.get_mut(row.max(0) as usize)
    }

    // -------------------------------------------------------------- motion

    fn update_scroll(&mut self, cart: &Cartridge) {
        let rows = self.rows(cart);
        self.scroll = self
            .scroll
            .clamp((self.row - VISIBLE_ROWS + 1).max(0), self.row.max(0))
            .min((rows - VISIBLE_ROWS).max(0));
    }

    fn up_row(&mut self, cart: &Cartridge) {
        let rows = self.rows(cart);
        if self.row >= 0 {
            self.row = (self.row - 1).rem_euclid(rows);
        }
        self.update_scroll(cart);
    }

    fn down_row(&mut self, cart: &Cartridge) {
        let rows = self.rows(cart);
        if self.row >= 0 {
            self.row = (self.row + 1) % rows;
        } else {
            self.row = 0;
        }
        self.update_scroll(cart);
    }

    fn left_col(&mut self) {
        self.col = (self.col - 1).rem_euclid(TRACKER_COLS);
    }

    fn right_col(&mut self) {
        self.col = (self.col + 1) % TRACKER_COLS;
    }

    fn tab_channel(&mut self) {
        let next = (self.channel() + 1) % CHANNELS as i32;
        self.col = next * CHANNEL_COLS;
    }

    // ----------------------------------------------------------- selection

    fn check_selection(&mut self) {
        if self.select_anchor.is_none() {
            self.select_anchor = Some((self.col, self.row));
        }
    }

    fn update_selection(&mut self) {
        if let Some((anchor_col, anchor_row)) = self.select_anchor {
            let channel = anchor_col / CHANNEL_COLS;
            let first = anchor_row.min(self.row).max(0);
            let last = anchor_row.max(self.row).max(0);
            self.selection = Some((channel, first, last));
        }
    }

    fn reset_selection(&mut self) {
        self.selection = None;
        self.select_anchor = None;
    }

    fn delete_selection(&mut self, cart: &mut Cartridge) {
        let span = self
            .selection
            .unwrap_or((self.channel(), self.row.max(0), self.row.max(0)));
        let (channel, first, last) = span;
        for row in first..=last {
            if let Some(slot) = self.row_at(cart, channel, row) {
                *slot = Row::default();
            }
        }
        self.commit(cart);
    }

    fn transpose(&mut self, cart: &mut Cartridge, delta: i32) {
        let span = self
            .selection
            .unwrap_or((self.channel(), self.row.max(0), self.row.max(0)));
        let (channel, first, last) = span;
        for row in first..=last {
            if let Some(slot) = self.row_at(cart, channel, row) {
                slot.transpose(delta);
            }
        }
        self.commit(cart);
    }

    // --------------------------------------------------------------- entry

    fn set_note(&mut self, cart: &mut Cartridge, semitone: u8, octave: u8, sfx: u8) {
        let channel = self.channel();
        let row = self.row;
        if let Some(slot) = self.row_at(cart, channel, row) {
            slot.note = NOTE_BASE + semitone % NOTES;
            slot.octave = octave.min(7);
            slot.sfx = sfx;
        }
        self.last_octave = octave.min(7);
        self.last_sfx = sfx;
    }

    fn set_stop_note(&mut self, cart: &mut Cartridge) {
        let channel = self.channel();
        let row = self.row;
        if let Some(slot) = self.row_at(cart, channel, row) {
            *slot = Row {
                note: NOTE_STOP,
                ..Row::default()
            };
        }
    }

    fn audition_row(&mut self, ctx: &mut EditorCtx) {
        let channel = self.channel();
        let row = self.row;
        let current = self
            .row_at(ctx.cart, channel, row)
            .map(|slot| *slot)
            .unwrap_or_default();
        if let Some(semitone) = current.semitone() {
            ctx.sound.play_sfx(
                current.sfx as i32,
                semitone,
                current.octave,
                AUDITION_TICKS,
                channel as usize,
            );
        }
    }

    fn note_entry(&mut self, ctx: &mut EditorCtx) -> bool {
        if ctx.input.key_pressed(Key::Digit1) || ctx.input.key_pressed(Key::A) {
            self.set_stop_note(ctx.cart);
            self.down_row(ctx.cart);
            return true;
        }
        for (i, &key) in PIANO_KEYS.iter().enumerate() {
            if ctx.input.key_pressed(key) {
                let semitone = (i % NOTES as usize) as u8;
                let octave = (self.last_octave + (i / NOTES as usize) as u8).min(7);
                let sfx = self.last_sfx;
                self.set_note(ctx.cart, semitone, octave, sfx);
                self.audition_row(ctx);
                self.down_row(ctx.cart);
                return true;
            }
        }
        false
    }

    fn tracker_entry(&mut self, ctx: &mut EditorCtx) -> bool {
        let sub = self.col % CHANNEL_COLS;
        match sub {
            COL_NOTE | COL_SEMITONE => self.note_entry(ctx),
            COL_OCTAVE => {
                let Some(ch) = typed_char(ctx) else { return false };
                if !('1'..='8').contains(&ch) {
                    return false;
                }
                let octave = ch as u8 - b'1';
                let channel = self.channel();
                let row = self.row;
                let mut changed = false;
                if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                    if slot.semitone().is_some() {
                        slot.octave = octave;
                        changed = true;
                    }
                }
                if changed {
                    self.last_octave = octave;
                    self.down_row(ctx.cart);
                }
                changed
            }
            COL_SFX_HI | COL_SFX_LO => {
                let Some(ch) = typed_char(ctx) else { return false };
                let Some(digit) = ch.to_digit(10) else {
                    return false;
                };
                let channel = self.channel();
                let row = self.row;
                let mut changed = false;
                if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                    if slot.semitone().is_some() {
                        let old = slot.sfx as u32;
                        let sfx = if sub == COL_SFX_HI {
                            digit * 10 + old % 10
                        } else {
                            old / 10 * 10 + digit
                        };
                        slot.sfx = sfx.min(63) as u8;
                        changed = true;
                    }
                }
                if changed {
                    let channel = self.channel();
                    let row = self.row;
                    if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                        self.last_sfx = slot.sfx;
                    }
                    // High digit advances across; the low one wraps down-left.
                    if sub == COL_SFX_HI {
                        self.right_col();
                    } else {
                        self.down_row(ctx.cart);
                        self.left_col();
                    }
                }
                changed
            }
            COL_COMMAND => {
                let Some(ch) = typed_char(ctx) else { return false };
                let upper = ch.to_ascii_uppercase() as u8;
                let Some(pos) = COMMAND_CHARS.iter().position(|&c| c == upper) else {
                    return false;
                };
                let channel = self.channel();
                let row = self.row;
                if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                    slot.command = pos as u8 + 1;
                    return true;
                }
                false
            }
            COL_PARAM1 | COL_PARAM2 => {
                let Some(ch) = typed_char(ctx) else { return false };
                let Some(value) = ch.to_digit(16) else {
                    return false;
                };
                let channel = self.channel();
                let row = self.row;
                if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                    if sub == COL_PARAM1 {
                        slot.param1 = value as u8;
                    } else {
                        slot.param2 = value as u8;
                    }
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Pattern-header entry: digits edit the id under the channel column.
    fn header_entry(&mut self, ctx: &mut EditorCtx) -> bool {
        let Some(ch) = typed_char(ctx) else { return false };
        let Some(digit) = ch.to_digit(10) else {
            return false;
        };
        let channel = self.channel() as usize;
        let track = &mut ctx.cart.music.tracks[self.track];
        let id = &mut track.frames[self.frame][channel];
        *id = ((*id as u32 % 10) * 10 + digit).min(MUSIC_PATTERNS as u32) as u8;
        true
    }

    fn shift_pattern_id(&mut self, cart: &mut Cartridge, channel: usize, delta: i32) {
        let id = &mut cart.music.tracks[self.track].frames[self.frame][channel];
        *id = (*id as i32 + delta).clamp(0, MUSIC_PATTERNS as i32) as u8;
        self.commit(cart);
    }

    // ------------------------------------------------------------ playback

    fn toggle_play_frame(&mut self, ctx: &mut EditorCtx) {
        if ctx.sound.music_pos().is_some() {
            ctx.sound.stop_music();
        } else {
            ctx.sound
                .play_music(self.track as i32, self.frame as i32, 0, true);
        }
    }

    fn play_row_once(&mut self, ctx: &mut EditorCtx) {
        ctx.sound
            .play_music(self.track as i32, self.frame as i32, self.row.max(0), false);
    }

    pub fn play_track(&mut self, ctx: &mut EditorCtx) {
        ctx.sound.play_music(self.track as i32, 0, 0, true);
    }

    // ------------------------------------------------------------ keyboard

    fn process_keyboard(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;

        if input.ctrl() {
            if input.key_pressed(Key::Z) {
                self.undo(ctx.cart);
            } else if input.key_pressed(Key::Y) {
                self.redo(ctx.cart);
            } else if input.key_pressed_once(Key::A) {
                let rows = self.rows(ctx.cart);
                self.selection = Some((self.channel(), 0, rows - 1));
            }
            // Ctrl+wheel transposes.
            let wheel = input.scroll();
            if wheel != 0 {
                self.transpose(ctx.cart, if wheel > 0 { 1 } else { -1 });
            }
            return;
        }

        let shift = input.shift();
        let motion_keys = [
            Key::Up,
            Key::Down,
            Key::Left,
            Key::Right,
            Key::Home,
            Key::End,
            Key::PageUp,
            Key::PageDown,
            Key::Tab,
        ];
        let moved = motion_keys.iter().any(|&k| input.key_pressed(k));
        if shift && moved {
            self.check_selection();
        }

        if input.key_pressed(Key::Up) {
            self.up_row(ctx.cart);
        } else if input.key_pressed(Key::Down) {
            self.down_row(ctx.cart);
        } else if input.key_pressed(Key::Left) {
            self.left_col();
        } else if input.key_pressed(Key::Right) {
            self.right_col();
        } else if input.key_pressed(Key::Home) {
            self.row = 0;
            self.update_scroll(ctx.cart);
        } else if input.key_pressed(Key::End) {
            self.row = self.rows(ctx.cart) - 1;
            self.update_scroll(ctx.cart);
        } else if input.key_pressed(Key::PageUp) {
            self.row = (self.row - VISIBLE_ROWS).max(0);
            self.update_scroll(ctx.cart);
        } else if input.key_pressed(Key::PageDown) {
            self.row = (self.row + VISIBLE_ROWS).min(self.rows(ctx.cart) - 1);
            self.update_scroll(ctx.cart);
        } else if input.key_pressed(Key::Tab) {
            self.tab_channel();
        } else if input.key_pressed(Key::Delete) {
            self.delete_selection(ctx.cart);
            self.down_row(ctx.cart);
        } else if input.key_pressed_once(Key::Space) {
            self.audition_row(ctx);
        } else if input.key_pressed_once(Key::Return) {
            if shift {
                self.play_row_once(ctx);
            } else {
                self.toggle_play_frame(ctx);
            }
        } else if input.key_pressed(Key::Minus) {
            self.frame = (self.frame + TRACK_FRAMES - 1) % TRACK_FRAMES;
        } else if input.key_pressed(Key::Equals) {
            self.frame = (self.frame + 1) % TRACK_FRAMES;
        }

        if shift && moved {
            self.update_selection();
        } else if moved {
            self.reset_selection();
        }

        let entered = if self.row < 0 {
            self.header_entry(ctx)
        } else {
            self.tracker_entry(ctx)
        };
        if entered {
            self.commit(ctx.cart);
        }
    }

    // --------------------------------------------------------- clipboard

    fn copy(&mut self, ctx: &mut EditorCtx) {
        let Some((channel, first, last)) = self.selection else {
            return;
        };
        let height = (last - first + 1) as u8;
        let mut payload = vec![height];
        for row in first..=last {
            let slot = self
                .row_at(ctx.cart, channel, row)
                .map(|r| *r)
                .unwrap_or_default();
            payload.push((slot.note & 0x0F) | ((slot.octave & 0x0F) << 4));
            payload.push(slot.sfx);
            payload.push(slot.command);
            payload.push((slot.param1 & 0x0F) | ((slot.param2 & 0x0F) << 4));
        }
        ctx.host.clipboard_set(&hex::encode(&payload));
    }

    fn cut(&mut self, ctx: &mut EditorCtx) {
        self.copy(ctx);
        self.delete_selection(ctx.cart);
    }

    fn paste(&mut self, ctx: &mut EditorCtx) {
        let Some(clip) = ctx.host.clipboard_get() else {
            return;
        };
        let data = match hex::decode_any(&clip) {
            Ok(data) => data,
            Err(err) => {
                trace!(target: "editor.music", %err, "music paste rejected");
                return;
            }
        };
        if data.is_empty() || data.len() != 1 + data[0] as usize * 4 {
            trace!(target: "editor.music", len = data.len(), "music paste header mismatch");
            return;
        }
        let height = data[0] as i32;
        let channel = self.channel();
        let start = self.row.max(0);
        for i in 0..height {
            let row = start + i;
            if row >= PATTERN_ROWS as i32 {
                break;
            }
            let chunk = &data[1 + i as usize * 4..1 + i as usize * 4 + 4];
            if let Some(slot) = self.row_at(ctx.cart, channel, row) {
                slot.note = chunk[0] & 0x0F;
                slot.octave = chunk[0] >> 4;
                slot.sfx = chunk[1];
                slot.command = chunk[2];
                slot.param1 = chunk[3] & 0x0F;
                slot.param2 = chunk[3] >> 4;
            }
        }
        self.commit(ctx.cart);
    }

    // ------------------------------------------------------------- drawing

    fn row_text(row: &Row) -> String {
        let note = match row.note {
            0 => "..".to_string(),
            NOTE_STOP => "--".to_string(),
            n => NOTE_NAMES[((n - NOTE_BASE) % NOTES) as usize].to_string(),
        };
        let octave = if row.note >= NOTE_BASE {
            (row.octave + 1).to_string()
        } else {
            ".".to_string()
        };
        let sfx = if row.note >= NOTE_BASE {
            format!("{:02}", row.sfx)
        } else {
            "..".to_string()
        };
        let command = if row.command > 0 {
            COMMAND_CHARS[(row.command as usize - 1).min(COMMAND_CHARS.len() - 1)] as char
        } else {
            '.'
        };
        format!("{note}{octave}{sfx}-{command}{:X}{:X}", row.param1, row.param2)
    }

    fn draw_grid(&mut self, ctx: &mut EditorCtx) {
        let playing = ctx.sound.music_pos();

        // Frame column.
        for f in 0..TRACK_FRAMES as i32 {
            let y = GRID_Y + f * CHAR_HEIGHT;
            let rect = Rect::new(FRAME_X, y, CHAR_WIDTH * 2 + 2, CHAR_HEIGHT);
            if ctx.mouse_in(rect) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.frame = f as usize;
            }
            let current = f as usize == self.frame;
            let play_frame = playing.map(|p| p.frame == f).unwrap_or(false);
            let paint = if current {
                color::WHITE
            } else if play_frame {
                color::LIGHT_GREEN
            } else {
                color::GRAY
            };
            let label = format!("{f:02}");
            ctx.fb.print(&label, FRAME_X, y, paint);
        }

        // Pattern-id header with step arrows.
        for channel in 0..CHANNELS as i32 {
            let x = GRID_X + channel * CELL_W;
            let id = self.pattern_id(ctx.cart, channel);
            let minus = Rect::new(x, HEADER_Y, 5, 6);
            let plus = Rect::new(x + CHAR_WIDTH * 2 + 8, HEADER_Y, 5, 6);
            if ctx.mouse_in(minus) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.shift_pattern_id(ctx.cart, channel as usize, -1);
            }
            if ctx.mouse_in(plus) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.shift_pattern_id(ctx.cart, channel as usize, 1);
            }
            let header = Rect::new(x + 6, HEADER_Y, CHAR_WIDTH * 2, CHAR_HEIGHT);
            if ctx.mouse_in(header) && ctx.input.mouse_pressed(MouseButton::Left) {
                self.row = -1;
                self.col = channel * CHANNEL_COLS;
            }
            let fb = &mut ctx.fb;
            fb.print("<", minus.x, minus.y, color::GRAY);
            fb.print(">", plus.x, plus.y, color::GRAY);
            let paint = if self.row < 0 && self.channel() == channel {
                color::WHITE
            } else {
                color::LIGHT_GRAY
            };
            fb.print(&format!("{id:02}"), header.x, header.y, paint);
        }

        // Tracker rows.
        for visible in 0..VISIBLE_ROWS {
            let row_index = self.scroll + visible;
            let y = GRID_Y + visible * CHAR_HEIGHT;
            if row_index >= self.rows(ctx.cart) {
                break;
            }
            let play_row = playing
                .map(|p| p.frame as usize == self.frame && p.row == row_index)
                .unwrap_or(false);
            for channel in 0..CHANNELS as i32 {
                let x = GRID_X + channel * CELL_W;
                let id = self.pattern_id(ctx.cart, channel);
                let text = ctx
                    .cart
                    .music
                    .pattern(id)
                    .map(|p| Self::row_text(&p.rows[row_index as usize]))
                    .unwrap_or_else(|| "........".to_string());

                let selected = self
                    .selection
                    .map(|(ch, first, last)| {
                        ch == channel && row_index >= first && row_index <= last
                    })
                    .unwrap_or(false);
                let cell = Rect::new(x, y, CELL_W - 2, CHAR_HEIGHT);
                if ctx.mouse_in(cell) && ctx.input.mouse_pressed(MouseButton::Left) {
                    self.row = row_index;
                    self.col = channel * CHANNEL_COLS;
                    self.reset_selection();
                }
                let fb = &mut ctx.fb;
                if selected {
                    fb.rect(cell, color::DARK_BLUE);
                }
                if play_row {
                    fb.rect(cell, color::DARK_GREEN);
                }
                if self.row == row_index && self.channel() == channel {
                    // Cursor cell within the channel.
                    let sub = self.col % CHANNEL_COLS;
                    fb.rect(
                        Rect::new(x + sub * CHAR_WIDTH, y, CHAR_WIDTH, CHAR_HEIGHT),
                        color::RED,
                    );
                }
                let paint = if play_row { color::WHITE } else { color::LIGHT_GRAY };
                fb.print(&text, x, y, paint);
            }
        }
    }

    fn draw_controls(&mut self, ctx: &mut EditorCtx) {
        // Track selector.
        let track_rect = Rect::new(FRAME_X, TOOLBAR_H + 1, CHAR_WIDTH * 2, CHAR_HEIGHT);
        if ctx.mouse_in(track_rect) {
            ctx.show_tooltip("select track");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                self.track = (self.track + 1) % MUSIC_TRACKS;
                self.row = 0;
                self.frame = 0;
                self.reset_selection();
            }
        }
        let label = format!("T{}", self.track);
        ctx.fb
            .print_shadow(&label, track_rect.x, track_rect.y, color::WHITE, color::BLACK);

        // Tempo / speed steppers.
        let steppers: [(&str, i32, fn(&mut glint_cart::Track, i32)); 2] = [
            ("tempo", 40, |t, d| {
                t.tempo = (t.tempo as i32 + d).clamp(40, 250) as u8;
            }),
            ("speed", 92, |t, d| {
                t.speed = (t.speed as i32 + d).clamp(1, 31) as u8;
            }),
        ];
        for (tip, x, apply) in steppers {
            let minus = Rect::new(x, TOOLBAR_H + 1, 5, 6);
            let plus = Rect::new(x + 24, TOOLBAR_H + 1, 5, 6);
            for (rect, delta) in [(minus, -1), (plus, 1)] {
                if ctx.mouse_in(rect) {
                    ctx.show_tooltip(tip);
                    if ctx.input.mouse_pressed(MouseButton::Left) {
                        apply(&mut ctx.cart.music.tracks[self.track], delta);
                        self.commit(ctx.cart);
                    }
                }
            }
            let track = &ctx.cart.music.tracks[self.track];
            let value = if x == 40 { track.tempo } else { track.speed };
            let fb = &mut ctx.fb;
            fb.print("<", minus.x, minus.y, color::GRAY);
            fb.print(&format!("{value:03}"), x + 6, TOOLBAR_H + 1, color::LIGHT_GRAY);
            fb.print(">", plus.x, plus.y, color::GRAY);
        }

        // Follow toggle and channel mute tumblers.
        let follow_rect = Rect::new(130, TOOLBAR_H + 1, 14, 6);
        if ctx.mouse_in(follow_rect) {
            ctx.show_tooltip("follow playback");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                self.follow = !self.follow;
            }
        }
        ctx.fb.print(
            "FW",
            follow_rect.x,
            follow_rect.y,
            if self.follow { color::WHITE } else { color::GRAY },
        );

        for channel in 0..CHANNELS {
            let rect = Rect::new(150 + channel as i32 * 10, TOOLBAR_H + 1, 8, 6);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip("mute channel");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.muted[channel] = !self.muted[channel];
                }
            }
            let paint = if self.muted[channel] {
                color::DARK_GRAY
            } else {
                color::LIGHT_GREEN
            };
            ctx.fb.rect(rect, paint);
        }
    }
}

fn typed_char(ctx: &EditorCtx) -> Option<char> {
    ctx.input.text().chars().next()
}

impl Editor for MusicEditor {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        // Muted channels are silenced every frame.
        for (channel, &muted) in self.muted.iter().enumerate() {
            ctx.sound.set_channel_mute(channel, muted);
        }

        // Follow mode mirrors the engine's position onto the cursor.
        if self.follow {
            if let Some(pos) = ctx.sound.music_pos() {
                if pos.track as usize == self.track {
                    self.frame = (pos.frame as usize).min(TRACK_FRAMES - 1);
                    self.row = pos.row.clamp(0, PATTERN_ROWS as i32 - 1);
                    self.update_scroll(ctx.cart);
                }
            }
        }

        self.process_keyboard(ctx);

        ctx.fb.clear(color::BLACK);
        self.draw_controls(ctx);
        self.draw_grid(ctx);
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
        self.track = 0;
        self.frame = 0;
        self.row = 0;
        self.col = 0;
        self.scroll = 0;
        self.selection = None;
        self.select_anchor = None;
        self.muted = [false; CHANNELS];
        self.history = History::new(&cart.music.to_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_host::{NullHost, NullSound, SoundEngine};

    fn ctx_parts() -> (Cartridge, glint_gfx::Framebuffer, glint_input::Input, NullSound, NullHost)
    {
        let mut input = glint_input::Input::new();
        input.begin_frame(&glint_input::InputFrame::default());
        (
            Cartridge::default(),
            glint_gfx::Framebuffer::default(),
            input,
            NullSound::new(),
            NullHost::new(),
        )
    }

    #[test]
    fn follow_mode_mirrors_engine_position() {
        let (mut cart, mut fb, input, mut sound, mut host) = ctx_parts();
        cart.music.tracks[0].frames[0][0] = 1;
        let mut editor = MusicEditor::new(&cart);
        sound.play_music(0, 0, 0, true);
        for _ in 0..8 {
            sound.advance();
        }
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
        editor.tick(&mut ctx);
        assert_eq!(editor.frame(), 0);
        assert_eq!(editor.row(), 8);

        // Freezing follow keeps the cursor while playback continues.
        editor.set_follow(false);
        sound.advance();
        let mut ctx = EditorCtx {
            cart: &mut cart,
            fb: &mut fb,
            input: &input,
            sound: &mut sound,
            host: &mut host,
            script: &glint_script::PlainScript,
            tooltip: &mut tooltip,
            mode_request: &mut mode_request,
            frame: 1,
        };
        editor.tick(&mut ctx);
        assert_eq!(editor.row(), 8, "cursor frozen");
        assert_eq!(sound.music_pos().unwrap().row, 9, "playback continues");
    }

    #[test]
    fn note_entry_writes_row_and_advances() {
        let (mut cart, _fb, _input, _sound, _host) = ctx_parts();
        cart.music.tracks[0].frames[0][0] = 1;
        let mut editor = MusicEditor::new(&cart);
        editor.set_note(&mut cart, 4, 3, 7);
        let row = cart.music.pattern(1).unwrap().rows[0];
        assert_eq!(row.note, NOTE_BASE + 4);
        assert_eq!(row.octave, 3);
        assert_eq!(row.sfx, 7);
    }

    #[test]
    fn copy_paste_round_trips_rows() {
        let (mut cart, mut fb, input, mut sound, mut host) = ctx_parts();
        cart.music.tracks[0].frames[0][0] = 1;
        {
            let pattern = cart.music.pattern_mut(1).unwrap();
            pattern.rows[0] = Row {
                note: NOTE_BASE + 3,
                octave: 2,
                sfx: 11,
                command: 1,
                param1: 0xA,
                param2: 0x1,
            };
            pattern.rows[1].note = NOTE_STOP;
        }
        let mut editor = MusicEditor::new(&cart);
        editor.selection = Some((0, 0, 1));
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
        editor.copy(&mut ctx);
        let saved0 = ctx.cart.music.pattern(1).unwrap().rows[0];
        let saved1 = ctx.cart.music.pattern(1).unwrap().rows[1];
        editor.delete_selection(ctx.cart);
        assert!(ctx.cart.music.pattern(1).unwrap().rows[0].is_empty());
        editor.row = 0;
        editor.paste(&mut ctx);
        assert_eq!(ctx.cart.music.pattern(1).unwrap().rows[0], saved0);
        assert_eq!(ctx.cart.music.pattern(1).unwrap().rows[1], saved1);
    }

    #[test]
    fn transpose_wraps_the_selected_rows() {
        let (mut cart, _fb, _input, _sound, _host) = ctx_parts();
        cart.music.tracks[0].frames[0][0] = 1;
        cart.music.pattern_mut(1).unwrap().rows[0].note = NOTE_BASE + 11;
        let mut editor = MusicEditor::new(&cart);
        editor.selection = Some((0, 0, 0));
        editor.transpose(&mut cart, 1);
        assert_eq!(
            cart.music.pattern(1).unwrap().rows[0].semitone(),
            Some(0),
            "B wraps to C"
        );
    }
}
