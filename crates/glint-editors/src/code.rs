//! Code editor: keyboard-driven text editing with syntax coloring, find /
//! goto / outline popups, and a two-track undo history (text bytes plus the
//! cursor struct, pushed atomically).

use crate::{Editor, EditorCtx, STATUS_Y, StudioEvent, TOOLBAR_H};
use glint_cart::{CODE_SIZE, Cartridge, CodeRegion};
use glint_gfx::{CHAR_HEIGHT, CHAR_WIDTH, Rect, SyntaxTheme, color};
use glint_history::History;
use glint_input::{Key, MouseButton};
use glint_script::{OutlineItem, ScriptConfig};
use glint_text as text;
use glint_text::TextCursor;
use tracing::trace;

/// Visible text window in character cells (toolbar and status rows carved
/// off the 40×19 studio grid).
pub const BUFFER_COLS: i32 = glint_gfx::TEXT_COLS;
pub const BUFFER_ROWS: i32 = glint_gfx::TEXT_ROWS - 2;

const CODE_X: i32 = 0;
const CODE_Y: i32 = TOOLBAR_H + 1;

/// Blink period and the always-visible delay a fresh motion restarts.
const CURSOR_BLINK_PERIOD: u32 = 30;
const CURSOR_DELAY: u32 = 15;

const POPUP_MAX: usize = 24;
const OUTLINE_ROWS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeMode {
    Edit,
    Find,
    Goto,
    Outline,
}

pub struct CodeEditor {
    cursor: TextCursor,
    scroll_x: i32,
    scroll_y: i32,
    /// Right-drag pan anchor in document-pixel space.
    pan: Option<(i32, i32)>,
    /// Cursor position at left-button press, for click-vs-drag selection.
    mouse_down: Option<usize>,

    colors: Box<[u8]>,
    theme: SyntaxTheme,

    history: History,
    cursor_history: History,

    mode: CodeMode,
    popup: String,
    /// Cursor/selection snapshot restored when a popup is escaped.
    popup_saved: Option<TextCursor>,
    jump_line: i32,
    outline: Vec<OutlineItem>,
    outline_index: usize,

    blink_delay: u32,
}

impl CodeEditor {
    pub fn new(cart: &Cartridge) -> Self {
        let mut editor = Self {
            cursor: TextCursor::default(),
            scroll_x: 0,
            scroll_y: 0,
            pan: None,
            mouse_down: None,
            colors: vec![0; CODE_SIZE].into_boxed_slice(),
            theme: SyntaxTheme::default(),
            history: History::new(cart.code.as_bytes()),
            cursor_history: History::new(&TextCursor::default().pack()),
            mode: CodeMode::Edit,
            popup: String::new(),
            popup_saved: None,
            jump_line: -1,
            outline: Vec::new(),
            outline_index: 0,
            blink_delay: CURSOR_DELAY,
        };
        editor.colors.fill(editor.theme.var);
        editor
    }

    pub fn cursor(&self) -> &TextCursor {
        &self.cursor
    }

    pub fn history_depth(&self) -> usize {
        self.history.undo_depth()
    }

    fn code_rect() -> Rect {
        Rect::new(
            CODE_X,
            CODE_Y,
            BUFFER_COLS * CHAR_WIDTH,
            BUFFER_ROWS * CHAR_HEIGHT,
        )
    }

    /// Re-run the script colorizer over the whole blob. The buffer is
    /// pre-filled with `var` and sanitized afterwards so every byte is a
    /// valid theme index no matter what the parser wrote.
    fn parse_syntax(&mut self, code: &CodeRegion, script: &dyn ScriptConfig) {
        self.colors.fill(self.theme.var);
        script.parse(code.as_str(), &mut self.colors, &self.theme);
        let theme = self.theme;
        for byte in self.colors.iter_mut() {
            if !theme.is_valid_index(*byte) {
                *byte = theme.var;
            }
        }
    }

    /// One user-observable edit: push text history, and on success the
    /// cursor history (the pair undoes atomically).
    fn commit(&mut self, code: &CodeRegion) {
        if self.history.add(code.as_bytes()) {
            self.cursor_history.add(&self.cursor.pack());
        }
    }

    fn undo(&mut self, code: &mut CodeRegion, script: &dyn ScriptConfig) {
        self.history.undo(code.as_bytes_mut());
        let mut packed = self.cursor.pack();
        if self.cursor_history.undo(&mut packed) {
            self.cursor = TextCursor::unpack(&packed);
        }
        self.cursor.clamp(code);
        self.parse_syntax(code, script);
        self.wake_cursor(code);
    }

    fn redo(&mut self, code: &mut CodeRegion, script: &dyn ScriptConfig) {
        self.history.redo(code.as_bytes_mut());
        let mut packed = self.cursor.pack();
        if self.cursor_history.redo(&mut packed) {
            self.cursor = TextCursor::unpack(&packed);
        }
        self.cursor.clamp(code);
        self.parse_syntax(code, script);
        self.wake_cursor(code);
    }

    /// Clamp scroll so the cursor is inside the window, restart the blink
    /// delay.
    fn wake_cursor(&mut self, code: &CodeRegion) {
        let (column, line) = text::cursor_xy(code, self.cursor.position);
        let (column, line) = (column as i32, line as i32);

        if column < self.scroll_x {
            self.scroll_x = column;
        } else if column >= self.scroll_x + BUFFER_COLS {
            self.scroll_x = column - BUFFER_COLS + 1;
        }
        if line < self.scroll_y {
            self.scroll_y = line;
        } else if line >= self.scroll_y + BUFFER_ROWS {
            self.scroll_y = line - BUFFER_ROWS + 1;
        }
        self.blink_delay = CURSOR_DELAY;
    }

    fn normalize_scroll(&mut self, code: &CodeRegion) {
        self.scroll_x = self.scroll_x.max(0);
        self.scroll_y = self.scroll_y.clamp(0, text::lines_count(code) as i32);
    }

    fn center_scroll(&mut self, code: &CodeRegion) {
        let (column, line) = text::cursor_xy(code, self.cursor.position);
        self.scroll_x = column as i32 - BUFFER_COLS / 2;
        self.scroll_y = line as i32 - BUFFER_ROWS / 2;
        self.normalize_scroll(code);
    }

    fn set_mode(&mut self, code: &CodeRegion, script: &dyn ScriptConfig, mode: CodeMode) {
        if self.mode == CodeMode::Edit && mode != CodeMode::Edit {
            self.popup_saved = Some(self.cursor);
            self.popup.clear();
        }
        match mode {
            CodeMode::Find => {
                // Seed the query from the current selection.
                if let Some((start, end)) = self.cursor.selection() {
                    if end - start < POPUP_MAX {
                        self.popup =
                            String::from_utf8_lossy(&code.text()[start..end]).into_owned();
                    }
                }
            }
            CodeMode::Goto => self.jump_line = -1,
            CodeMode::Outline => self.refresh_outline(code, script),
            CodeMode::Edit => self.jump_line = -1,
        }
        self.mode = mode;
    }

    /// Escape from a popup restores the saved cursor/selection.
    fn escape_popup(&mut self, code: &CodeRegion) {
        if self.mode != CodeMode::Edit {
            if let Some(saved) = self.popup_saved.take() {
                self.cursor = saved;
                self.cursor.clamp(code);
            }
            self.mode = CodeMode::Edit;
            self.jump_line = -1;
            self.wake_cursor(code);
        }
    }

    pub fn in_popup(&self) -> bool {
        self.mode != CodeMode::Edit
    }

    /// Close a popup if one is open; reports whether Escape was consumed.
    pub fn escape(&mut self, cart: &Cartridge) -> bool {
        if self.in_popup() {
            self.escape_popup(&cart.code);
            true
        } else {
            false
        }
    }

    // ---------------------------------------------------------------- edits

    fn insert_char(&mut self, code: &mut CodeRegion, script: &dyn ScriptConfig, ch: u8) {
        if text::insert_char(code, &mut self.cursor, ch) {
            self.commit(code);
            self.parse_syntax(code, script);
            self.wake_cursor(code);
        }
    }

    fn edit_and_commit<F>(&mut self, code: &mut CodeRegion, script: &dyn ScriptConfig, f: F)
    where
        F: FnOnce(&mut CodeRegion, &mut TextCursor),
    {
        f(code, &mut self.cursor);
        self.commit(code);
        self.parse_syntax(code, script);
        self.wake_cursor(code);
    }

    fn paste(&mut self, ctx: &mut EditorCtx) {
        if let Some(clip) = ctx.host.clipboard_get() {
            if text::insert_text(&mut ctx.cart.code, &mut self.cursor, &clip) {
                self.commit(&ctx.cart.code);
                self.parse_syntax(&ctx.cart.code, ctx.script);
                self.wake_cursor(&ctx.cart.code);
            }
        }
    }

    fn copy(&mut self, ctx: &mut EditorCtx) {
        let clip = text::copy_text(&ctx.cart.code, &self.cursor);
        ctx.host.clipboard_set(&clip);
    }

    fn cut(&mut self, ctx: &mut EditorCtx) {
        self.copy(ctx);
        if text::replace_selection(&mut ctx.cart.code, &mut self.cursor) {
            self.commit(&ctx.cart.code);
            self.parse_syntax(&ctx.cart.code, ctx.script);
            self.wake_cursor(&ctx.cart.code);
        }
    }

    // ------------------------------------------------------------ keyboard

    fn process_keyboard(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;
        if !input.any_key_down() {
            return;
        }
        let shift = input.shift();
        let ctrl = input.ctrl();
        let alt = input.alt();

        let motion = [
            Key::Up,
            Key::Down,
            Key::Left,
            Key::Right,
            Key::Home,
            Key::End,
            Key::PageUp,
            Key::PageDown,
        ]
        .iter()
        .any(|&k| input.key_pressed(k));
        if motion {
            if !shift {
                self.cursor.anchor = None;
            } else if self.cursor.anchor.is_none() {
                self.cursor.anchor = Some(self.cursor.position);
            }
        }

        let code = &mut ctx.cart.code;
        let script = ctx.script;

        if ctrl {
            if input.key_pressed(Key::Left) {
                text::left_word(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Right) {
                text::right_word(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Tab) {
                if text::tab_block(code, &mut self.cursor, shift, true) {
                    self.commit(code);
                    self.parse_syntax(code, script);
                }
                self.wake_cursor(code);
            } else if input.key_pressed_once(Key::A) {
                text::select_all(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Z) {
                self.undo(code, script);
            } else if input.key_pressed(Key::Y) {
                self.redo(code, script);
            } else if input.key_pressed_once(Key::F) {
                self.set_mode(code, script, CodeMode::Find);
            } else if input.key_pressed_once(Key::G) {
                self.set_mode(code, script, CodeMode::Goto);
            } else if input.key_pressed_once(Key::O) {
                self.set_mode(code, script, CodeMode::Outline);
            } else if input.key_pressed(Key::Slash) {
                let prefix = script.single_comment().as_bytes().to_vec();
                if text::toggle_comment(code, &mut self.cursor, &prefix) {
                    self.commit(code);
                    self.parse_syntax(code, script);
                }
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Home) {
                text::go_doc_home(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::End) {
                text::go_doc_end(code, &mut self.cursor);
                self.wake_cursor(code);
            }
        } else if alt {
            if input.key_pressed(Key::Left) {
                text::left_word(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Right) {
                text::right_word(code, &mut self.cursor);
                self.wake_cursor(code);
            }
        } else {
            if input.key_pressed(Key::Up) {
                text::up_line(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Down) {
                text::down_line(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Left) {
                text::left_column(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Right) {
                text::right_column(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Home) {
                text::go_home(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::End) {
                text::go_end(code, &mut self.cursor);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::PageUp) {
                text::page_up(code, &mut self.cursor, BUFFER_ROWS as usize);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::PageDown) {
                text::page_down(code, &mut self.cursor, BUFFER_ROWS as usize);
                self.wake_cursor(code);
            } else if input.key_pressed(Key::Delete) {
                self.edit_and_commit(code, script, text::delete_char);
            } else if input.key_pressed(Key::Backspace) {
                self.edit_and_commit(code, script, text::backspace_char);
            } else if input.key_pressed(Key::Return) {
                self.edit_and_commit(code, script, text::newline);
            } else if input.key_pressed(Key::Tab) {
                if text::tab_block(code, &mut self.cursor, shift, false) {
                    self.commit(code);
                    self.parse_syntax(code, script);
                }
                self.wake_cursor(code);
            }
        }
    }

    // --------------------------------------------------------------- mouse

    fn process_mouse(&mut self, ctx: &mut EditorCtx) {
        let rect = Self::code_rect();
        let input = ctx.input;
        let (mx, my) = input.mouse_pos();
        let code = &mut ctx.cart.code;

        if let Some((ax, ay)) = self.pan {
            if input.mouse_down(MouseButton::Right) {
                self.scroll_x = (ax - mx) / CHAR_WIDTH;
                self.scroll_y = (ay - my) / CHAR_HEIGHT;
                self.normalize_scroll(code);
            } else {
                self.pan = None;
            }
            return;
        }

        if !rect.contains(mx, my) {
            return;
        }

        if input.mouse_down(MouseButton::Left) {
            let column = (mx - rect.x) / CHAR_WIDTH + self.scroll_x;
            let line = (my - rect.y) / CHAR_HEIGHT + self.scroll_y;
            let previous = self.cursor.position;
            self.cursor.position =
                text::position_at(code, column.max(0) as usize, line.max(0) as usize);
            self.cursor.sync_column(code);

            if input.shift() {
                self.cursor.anchor = Some(self.cursor.position);
                self.cursor.position = previous;
            } else if self.mouse_down.is_none() {
                self.cursor.anchor = Some(self.cursor.position);
                self.mouse_down = Some(self.cursor.position);
            }
            self.blink_delay = CURSOR_DELAY;
        } else {
            if self.mouse_down == Some(self.cursor.position) {
                self.cursor.anchor = None;
            }
            self.mouse_down = None;
        }

        if input.mouse_down(MouseButton::Right) && self.pan.is_none() {
            self.pan = Some((mx + self.scroll_x * CHAR_WIDTH, my + self.scroll_y * CHAR_HEIGHT));
        }
    }

    // ---------------------------------------------------------- popups

    fn find_tick(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;
        let code = &ctx.cart.code;

        if input.key_pressed_once(Key::Return) {
            self.popup_saved = None;
            self.mode = CodeMode::Edit;
        } else if input.key_pressed(Key::Up)
            || input.key_pressed(Key::Down)
            || input.key_pressed(Key::Left)
            || input.key_pressed(Key::Right)
        {
            if !self.popup.is_empty() {
                let needle = self.popup.as_bytes();
                let reverse = input.key_pressed(Key::Up) || input.key_pressed(Key::Left);
                let span = self.cursor.selection().unwrap_or((
                    self.cursor.position,
                    self.cursor.position,
                ));
                let hit = if reverse {
                    text::find_backward(code, span.0, needle)
                } else {
                    text::find_forward(code, span.1, needle)
                };
                self.apply_find(code, hit);
            }
        } else if input.key_pressed(Key::Backspace) {
            if !self.popup.is_empty() {
                self.popup.pop();
                let hit = text::find_forward(code, 0, self.popup.as_bytes());
                self.apply_find(code, hit);
            }
        } else {
            let typed: String = input.text().to_string();
            for ch in typed.chars().filter(|c| c.is_ascii_graphic() || *c == ' ') {
                if self.popup.len() + 1 < POPUP_MAX {
                    self.popup.push(ch);
                    let hit = text::find_forward(code, 0, self.popup.as_bytes());
                    self.apply_find(code, hit);
                }
            }
        }

        self.draw_editor(ctx, false);
        self.draw_popup_bar(ctx, " FIND:");
    }

    fn apply_find(&mut self, code: &CodeRegion, hit: Option<usize>) {
        if let Some(pos) = hit {
            self.cursor.position = pos;
            self.cursor.anchor = Some(pos + self.popup.len());
            self.center_scroll(code);
        }
    }

    fn goto_tick(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;

        if input.key_pressed_once(Key::Return) {
            if !self.popup.is_empty() {
                self.apply_goto(&ctx.cart.code);
            }
            self.popup_saved = None;
            self.mode = CodeMode::Edit;
            self.jump_line = -1;
        } else if input.key_pressed(Key::Backspace) {
            if !self.popup.is_empty() {
                self.popup.pop();
                self.apply_goto(&ctx.cart.code);
            }
        } else {
            let typed: String = input.text().to_string();
            for ch in typed.chars().filter(char::is_ascii_digit) {
                if self.popup.len() + 1 < POPUP_MAX {
                    self.popup.push(ch);
                    self.apply_goto(&ctx.cart.code);
                }
            }
        }

        self.draw_editor(ctx, false);
        self.draw_popup_bar(ctx, " GOTO:");
    }

    fn apply_goto(&mut self, code: &CodeRegion) {
        let line = self
            .popup
            .parse::<i64>()
            .map(|n| (n - 1).max(0))
            .unwrap_or(0) as usize;
        let line = line.min(text::lines_count(code));
        self.cursor.anchor = None;
        self.cursor.position = text::position_at(code, 0, line);
        self.cursor.sync_column(code);
        self.jump_line = line as i32;
        self.center_scroll(code);
    }

    fn refresh_outline(&mut self, code: &CodeRegion, script: &dyn ScriptConfig) {
        let source = code.as_str();
        let needle = self.popup.to_ascii_lowercase();
        let mut items: Vec<OutlineItem> = script
            .outline(source)
            .into_iter()
            .filter(|item| item.offset + item.len <= source.len())
            .filter(|item| {
                needle.is_empty()
                    || source[item.offset..item.offset + item.len]
                        .to_ascii_lowercase()
                        .contains(&needle)
            })
            .collect();
        items.sort_by(|a, b| {
            source[a.offset..a.offset + a.len].cmp(&source[b.offset..b.offset + b.len])
        });
        self.outline = items;
        self.outline_index = 0;
        self.jump_to_outline(code);
    }

    fn jump_to_outline(&mut self, code: &CodeRegion) {
        match self.outline.get(self.outline_index) {
            Some(item) => {
                self.cursor.position = item.offset;
                self.cursor.anchor = Some(item.offset + item.len);
            }
            None => {
                self.cursor.position = 0;
                self.cursor.anchor = None;
            }
        }
        self.cursor.sync_column(code);
        self.center_scroll(code);
    }

    fn outline_tick(&mut self, ctx: &mut EditorCtx) {
        let input = ctx.input;

        if input.key_pressed(Key::Up) {
            if self.outline_index > 0 {
                self.outline_index -= 1;
                self.jump_to_outline(&ctx.cart.code);
            }
        } else if input.key_pressed(Key::Down) {
            if self.outline_index + 1 < self.outline.len() {
                self.outline_index += 1;
                self.jump_to_outline(&ctx.cart.code);
            }
        } else if input.key_pressed_once(Key::Return) {
            self.jump_to_outline(&ctx.cart.code);
            self.popup_saved = None;
            self.mode = CodeMode::Edit;
        } else if input.key_pressed(Key::Backspace) {
            if !self.popup.is_empty() {
                self.popup.pop();
                self.refresh_outline(&ctx.cart.code, ctx.script);
            }
        } else {
            let typed: String = input.text().to_string();
            for ch in typed.chars().filter(|c| c.is_ascii_graphic()) {
                if self.popup.len() + 1 < POPUP_MAX {
                    self.popup.push(ch);
                    self.refresh_outline(&ctx.cart.code, ctx.script);
                }
            }
        }

        self.draw_editor(ctx, false);
        self.draw_popup_bar(ctx, " FUNC:");
        self.draw_outline_panel(ctx);
    }

    // ------------------------------------------------------------- drawing

    fn draw_popup_bar(&self, ctx: &mut EditorCtx, title: &str) {
        let fb = &mut ctx.fb;
        fb.rect(
            Rect::new(0, TOOLBAR_H, glint_gfx::WIDTH, CHAR_HEIGHT),
            color::BLUE,
        );
        let w = fb.print(title, 0, TOOLBAR_H, color::WHITE);
        let w = w + fb.print(&self.popup, w, TOOLBAR_H, color::WHITE);
        // Popup caret.
        if ctx.frame % CURSOR_BLINK_PERIOD < CURSOR_BLINK_PERIOD / 2 {
            fb.rect(
                Rect::new(w, TOOLBAR_H, CHAR_WIDTH - 1, CHAR_HEIGHT - 1),
                color::WHITE,
            );
        }
    }

    fn draw_outline_panel(&self, ctx: &mut EditorCtx) {
        let source = ctx.cart.code.as_str().to_string();
        let panel_x = glint_gfx::WIDTH - 12 * CHAR_WIDTH;
        let panel_y = TOOLBAR_H + CHAR_HEIGHT;
        let fb = &mut ctx.fb;
        fb.rect(
            Rect::new(
                panel_x - 1,
                panel_y,
                glint_gfx::WIDTH - panel_x + 1,
                glint_gfx::HEIGHT - panel_y,
            ),
            color::BLUE,
        );
        if self.outline.is_empty() {
            fb.print("(EMPTY)", panel_x, panel_y + 1, color::WHITE);
            return;
        }
        fb.rect(
            Rect::new(
                panel_x - 1,
                panel_y + self.outline_index as i32 * CHAR_HEIGHT,
                glint_gfx::WIDTH - panel_x + 1,
                CHAR_HEIGHT,
            ),
            color::RED,
        );
        for (row, item) in self.outline.iter().take(OUTLINE_ROWS).enumerate() {
            let name = &source[item.offset..item.offset + item.len];
            fb.print(
                name,
                panel_x,
                panel_y + 1 + row as i32 * CHAR_HEIGHT,
                color::WHITE,
            );
        }
    }

    fn draw_editor(&self, ctx: &mut EditorCtx, with_cursor: bool) {
        let code = &ctx.cart.code;
        let fb = &mut ctx.fb;
        fb.clear(color::BLACK);

        // Jump-target band behind the text while the goto popup is open.
        if self.mode == CodeMode::Goto && self.jump_line >= 0 {
            let y = CODE_Y + (self.jump_line - self.scroll_y) * CHAR_HEIGHT;
            fb.rect(
                Rect::new(0, y, glint_gfx::WIDTH, CHAR_HEIGHT + 1),
                color::DARK_GREEN,
            );
        }

        let selection = self.cursor.selection();
        let (mut column, mut line) = (0i32, 0i32);
        for (index, &byte) in code.text().iter().enumerate() {
            let x = CODE_X + (column - self.scroll_x) * CHAR_WIDTH;
            let y = CODE_Y + (line - self.scroll_y) * CHAR_HEIGHT;
            let visible = x >= CODE_X
                && y >= CODE_Y
                && x < CODE_X + BUFFER_COLS * CHAR_WIDTH
                && y < CODE_Y + BUFFER_ROWS * CHAR_HEIGHT;
            if visible {
                let selected = selection.map(|(s, e)| index >= s && index < e).unwrap_or(false);
                if selected {
                    fb.rect(Rect::new(x, y, CHAR_WIDTH, CHAR_HEIGHT), color::RED);
                }
                if byte != b'\n' && byte != b'\t' {
                    let glyph = [byte];
                    let s = std::str::from_utf8(&glyph).unwrap_or(" ");
                    let paint = if selected {
                        color::WHITE
                    } else {
                        self.colors[index]
                    };
                    fb.print(s, x, y, paint);
                }
            }
            if byte == b'\n' {
                column = 0;
                line += 1;
            } else {
                column += 1;
            }
        }

        if with_cursor {
            let blinking = self.blink_delay == 0
                && ctx.frame % CURSOR_BLINK_PERIOD >= CURSOR_BLINK_PERIOD / 2;
            if !blinking {
                let (cx, cy) = text::cursor_xy(code, self.cursor.position);
                let x = CODE_X + (cx as i32 - self.scroll_x) * CHAR_WIDTH;
                let y = CODE_Y + (cy as i32 - self.scroll_y) * CHAR_HEIGHT;
                fb.rect(Rect::new(x, y, CHAR_WIDTH - 1, CHAR_HEIGHT - 1), color::WHITE);
                let under = code.text().get(self.cursor.position).copied();
                if let Some(b) = under {
                    if b != b'\n' && b != b'\t' {
                        let glyph = [b];
                        if let Ok(s) = std::str::from_utf8(&glyph) {
                            fb.print(s, x, y, color::BLACK);
                        }
                    }
                }
            }
        }

        self.draw_status(ctx);
    }

    fn draw_status(&self, ctx: &mut EditorCtx) {
        let code = &ctx.cart.code;
        let (column, line) = text::cursor_xy(code, self.cursor.position);
        let left = format!(
            "line {}/{} col {}",
            line + 1,
            text::lines_count(code) + 1,
            column + 1
        );
        let right = format!("{}/{}", code.len(), CODE_SIZE);
        let fb = &mut ctx.fb;
        fb.rect(
            Rect::new(0, STATUS_Y, glint_gfx::WIDTH, glint_gfx::HEIGHT - STATUS_Y),
            color::WHITE,
        );
        fb.print(&left, 1, STATUS_Y, color::DARK_GRAY);
        let w = right.len() as i32 * CHAR_WIDTH;
        fb.print(&right, glint_gfx::WIDTH - w - 1, STATUS_Y, color::DARK_GRAY);
    }

    fn edit_tick(&mut self, ctx: &mut EditorCtx) {
        // Wheel scroll: three rows per detent.
        let wheel = ctx.input.scroll();
        if wheel != 0 {
            self.scroll_y += if wheel > 0 { -3 } else { 3 };
            self.normalize_scroll(&ctx.cart.code);
        }

        self.process_keyboard(ctx);

        if !ctx.input.ctrl() && !ctx.input.alt() {
            let typed: String = ctx.input.text().to_string();
            for ch in typed.chars() {
                if ch.is_ascii_graphic() || ch == ' ' {
                    self.insert_char(&mut ctx.cart.code, ctx.script, ch as u8);
                }
            }
        }

        self.process_mouse(ctx);
        self.draw_editor(ctx, true);
    }
}

impl Editor for CodeEditor {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        if self.blink_delay > 0 && self.mode == CodeMode::Edit {
            self.blink_delay -= 1;
        }
        match self.mode {
            CodeMode::Edit => self.edit_tick(ctx),
            CodeMode::Find => self.find_tick(ctx),
            CodeMode::Goto => self.goto_tick(ctx),
            CodeMode::Outline => self.outline_tick(ctx),
        }
    }

    fn event(&mut self, ctx: &mut EditorCtx, event: StudioEvent) {
        trace!(target: "editor.code", ?event, "studio event");
        match event {
            StudioEvent::Cut => self.cut(ctx),
            StudioEvent::Copy => self.copy(ctx),
            StudioEvent::Paste => self.paste(ctx),
            StudioEvent::Undo => {
                let code = &mut ctx.cart.code;
                self.undo(code, ctx.script);
            }
            StudioEvent::Redo => {
                let code = &mut ctx.cart.code;
                self.redo(code, ctx.script);
            }
        }
    }

    fn rom_loaded(&mut self, cart: &Cartridge) {
        self.cursor = TextCursor::default();
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.pan = None;
        self.mouse_down = None;
        self.mode = CodeMode::Edit;
        self.popup.clear();
        self.popup_saved = None;
        self.jump_line = -1;
        self.outline.clear();
        self.history = History::new(cart.code.as_bytes());
        self.cursor_history = History::new(&self.cursor.pack());
        self.colors.fill(self.theme.var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Colorizer that scribbles out-of-theme indices everywhere.
    struct RogueScript;

    impl ScriptConfig for RogueScript {
        fn single_comment(&self) -> &str {
            "# "
        }

        fn parse(&self, source: &str, colors: &mut [u8], _theme: &SyntaxTheme) {
            for byte in colors.iter_mut().take(source.len()) {
                *byte = 0xEE;
            }
        }

        fn outline(&self, _source: &str) -> Vec<OutlineItem> {
            vec![
                OutlineItem { offset: 0, len: 3 },
                OutlineItem { offset: 999_999, len: 3 },
            ]
        }
    }

    #[test]
    fn color_buffer_is_sanitized_to_theme_indices() {
        let mut cart = Cartridge::default();
        cart.code.load_text("abc");
        let mut editor = CodeEditor::new(&cart);
        editor.parse_syntax(&cart.code, &RogueScript);
        let theme = editor.theme;
        assert!(editor.colors.iter().all(|&b| theme.is_valid_index(b)));
    }

    #[test]
    fn text_and_cursor_histories_undo_together() {
        let mut cart = Cartridge::default();
        let mut editor = CodeEditor::new(&cart);
        let script = glint_script::PlainScript;

        editor.insert_char(&mut cart.code, &script, b'a');
        editor.insert_char(&mut cart.code, &script, b'b');
        assert_eq!(cart.code.text(), b"ab");
        assert_eq!(editor.cursor.position, 2);

        editor.undo(&mut cart.code, &script);
        assert_eq!(cart.code.text(), b"a");
        assert_eq!(editor.cursor.position, 1, "cursor rides the text history");

        editor.redo(&mut cart.code, &script);
        assert_eq!(cart.code.text(), b"ab");
        assert_eq!(editor.cursor.position, 2);
    }

    #[test]
    fn insert_at_capacity_commits_nothing() {
        let mut cart = Cartridge::default();
        cart.code.load_text(&"x".repeat(glint_text::TEXT_CAPACITY));
        let mut editor = CodeEditor::new(&cart);
        let script = glint_script::PlainScript;
        editor.cursor.position = cart.code.len();
        editor.insert_char(&mut cart.code, &script, b'y');
        assert_eq!(cart.code.len(), glint_text::TEXT_CAPACITY);
        assert_eq!(editor.history_depth(), 0);
    }

    #[test]
    fn outline_filters_out_of_range_items() {
        let mut cart = Cartridge::default();
        cart.code.load_text("foo bar");
        let mut editor = CodeEditor::new(&cart);
        editor.refresh_outline(&cart.code, &RogueScript);
        assert_eq!(editor.outline.len(), 1, "item past the source is dropped");
        assert_eq!(editor.cursor.selection(), Some((0, 3)));
    }

    #[test]
    fn escape_restores_the_popup_entry_snapshot() {
        let mut cart = Cartridge::default();
        cart.code.load_text("one two");
        let mut editor = CodeEditor::new(&cart);
        let script = glint_script::PlainScript;
        editor.cursor.position = 4;
        editor.set_mode(&cart.code, &script, CodeMode::Goto);
        editor.cursor.position = 0;
        editor.escape_popup(&cart.code);
        assert_eq!(editor.cursor.position, 4);
        assert!(!editor.in_popup());
    }
}
