//! Sprite editor: per-pixel drawing over a 64×64 canvas mapped onto the
//! sprite sheet, a draw/pick/select/fill tool machine, selection
//! transforms, palette editing, and sheet navigation across two banks.

use crate::{Editor, EditorCtx, StudioEvent, TOOLBAR_H};
use glint_cart::{Cartridge, PALETTE_BYTES, SpriteSheet, hex};
use glint_gfx::{Rect, color};
use glint_history::History;
use glint_input::{Key, MouseButton};
use tracing::trace;

const CANVAS_SIZE: i32 = 64;
const CANVAS_X: i32 = 24;
const CANVAS_Y: i32 = 20;
const SHEET_X: i32 = glint_gfx::WIDTH - 128 - 1;
const SHEET_Y: i32 = TOOLBAR_H;
const PALETTE_X: i32 = 24;
const PALETTE_Y: i32 = 100;
const SWATCH: i32 = 8;

const BANK_PIXELS: i32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Draw,
    Pick,
    Select,
    Fill,
}

#[derive(Default)]
struct Selection {
    rect: Option<Rect>,
    drag: bool,
    start: (i32, i32),
    /// Pixels lifted out of the region, `rect.w * rect.h` bytes.
    front: Vec<u8>,
    /// The untouched region snapshot the selection floats over.
    back: Vec<u8>,
}

pub struct SpriteEditor {
    /// Tile index within the current bank (top-left of the edit region).
    index: usize,
    bank: usize,
    /// Edit region edge in pixels: 8, 16, 32, or 64.
    size: i32,
    color: u8,
    color2: u8,
    brush: i32,
    tool: Tool,
    palette_edit: bool,
    select: Selection,
    stroke: bool,
    history: History,
}

fn region_bytes(cart: &Cartridge) -> Vec<u8> {
    let mut out = cart.tiles.as_bytes().to_vec();
    out.extend_from_slice(cart.palette.as_bytes());
    out
}

fn apply_region(cart: &mut Cartridge, bytes: &[u8]) {
    let split = bytes.len() - PALETTE_BYTES;
    cart.tiles.load_bytes(&bytes[..split]);
    cart.palette.load_bytes(&bytes[split..]);
}

impl SpriteEditor {
    pub fn new(cart: &Cartridge) -> Self {
        Self {
            index: 0,
            bank: 0,
            size: 8,
            color: 2,
            color2: 0,
            brush: 1,
            tool: Tool::Draw,
            palette_edit: false,
            select: Selection::default(),
            stroke: false,
            history: History::new(&region_bytes(cart)),
        }
    }

    pub fn color(&self) -> u8 {
        self.color
    }

    pub fn set_colors(&mut self, fg: u8, bg: u8) {
        self.color = fg;
        self.color2 = bg;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != Tool::Select {
            self.clear_selection();
        }
        self.tool = tool;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sheet_selection(&self) -> Rect {
        let (x, y) = self.origin();
        Rect::new(x, y, self.size, self.size)
    }

    /// Top-left of the edit region in sheet coordinates, clamped so the
    /// region always fits its bank.
    fn origin(&self) -> (i32, i32) {
        let x = ((self.index as i32 % 16) * 8).min(BANK_PIXELS - self.size);
        let y = ((self.index as i32 / 16) * 8).min(BANK_PIXELS - self.size);
        (x, y + self.bank as i32 * BANK_PIXELS)
    }

    fn scale(&self) -> i32 {
        CANVAS_SIZE / self.size
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

    fn clear_selection(&mut self) {
        self.select.rect = None;
        self.select.drag = false;
    }

    fn has_selection(&self) -> bool {
        self.tool == Tool::Select && self.select.rect.is_some()
    }

    fn select_sprite(&mut self, cell_x: i32, cell_y: i32) {
        let max = (BANK_PIXELS - self.size) / 8;
        let x = cell_x.clamp(0, max);
        let y = cell_y.clamp(0, max);
        self.index = (y * 16 + x) as usize;
        self.clear_selection();
    }

    pub fn set_size(&mut self, size: i32) {
        self.size = size.clamp(8, 64);
        self.clear_selection();
    }

    // ----------------------------------------------------- selection float

    /// Lift the selected pixels into the front buffer; the back buffer gets
    /// the whole region with the lifted area filled by the background color.
    fn copy_selection(&mut self, cart: &mut Cartridge) {
        let Some(rect) = self.select.rect else { return };
        let (ox, oy) = self.origin();
        let size = self.size;
        let sheet = SpriteSheet::new(&mut cart.tiles);

        self.select.back.clear();
        for y in 0..size {
            for x in 0..size {
                self.select.back.push(sheet.pixel(ox + x, oy + y));
            }
        }
        self.select.front.clear();
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                let i = (y * size + x) as usize;
                self.select.front.push(self.select.back[i]);
                self.select.back[i] = self.color2;
            }
        }
    }

    /// Re-render back-then-front into the sheet at the current rect.
    fn paste_selection(&mut self, cart: &mut Cartridge) {
        let Some(rect) = self.select.rect else { return };
        let (ox, oy) = self.origin();
        let size = self.size;
        let mut sheet = SpriteSheet::new(&mut cart.tiles);

        for y in 0..size {
            for x in 0..size {
                sheet.set_pixel(ox + x, oy + y, self.select.back[(y * size + x) as usize]);
            }
        }
        let mut i = 0;
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                sheet.set_pixel(ox + x, oy + y, self.select.front[i]);
                i += 1;
            }
        }
    }

    fn move_selection(&mut self, cart: &mut Cartridge, dx: i32, dy: i32) {
        let Some(rect) = self.select.rect else { return };
        let nx = rect.x + dx;
        let ny = rect.y + dy;
        if nx < 0 || ny < 0 || nx + rect.w > self.size || ny + rect.h > self.size {
            return;
        }
        self.select.rect = Some(Rect::new(nx, ny, rect.w, rect.h));
        self.paste_selection(cart);
        self.commit(cart);
    }

    /// Swap the rect's axes about its center and translate it back inside
    /// the region, left/top first.
    fn rotate_select_rect(&mut self) {
        let Some(rect) = self.select.rect else { return };
        let cx = rect.x + rect.w / 2;
        let cy = rect.y + rect.h / 2;
        let mut out = Rect::new(rect.x, rect.y, rect.h, rect.w);
        out.x -= (out.x + out.w / 2) - cx;
        out.y -= (out.y + out.h / 2) - cy;
        out.x = out.x.max(0);
        out.y = out.y.max(0);
        if out.x + out.w > self.size {
            out.x = self.size - out.w;
        }
        if out.y + out.h > self.size {
            out.y = self.size - out.h;
        }
        self.select.rect = Some(out);
    }

    // ----------------------------------------------------------- transforms

    fn flip_horizontal(&mut self, cart: &mut Cartridge) {
        let rect = self.target_rect();
        let (ox, oy) = self.origin();
        let mut sheet = SpriteSheet::new(&mut cart.tiles);
        for y in rect.y..rect.y + rect.h {
            for i in 0..rect.w / 2 {
                let a = (ox + rect.x + i, oy + y);
                let b = (ox + rect.x + rect.w - 1 - i, oy + y);
                let tmp = sheet.pixel(a.0, a.1);
                sheet.set_pixel(a.0, a.1, sheet.pixel(b.0, b.1));
                sheet.set_pixel(b.0, b.1, tmp);
            }
        }
        self.commit(cart);
        if self.has_selection() {
            self.copy_selection(cart);
        }
    }

    fn flip_vertical(&mut self, cart: &mut Cartridge) {
        let rect = self.target_rect();
        let (ox, oy) = self.origin();
        let mut sheet = SpriteSheet::new(&mut cart.tiles);
        for x in rect.x..rect.x + rect.w {
            for i in 0..rect.h / 2 {
                let a = (ox + x, oy + rect.y + i);
                let b = (ox + x, oy + rect.y + rect.h - 1 - i);
                let tmp = sheet.pixel(a.0, a.1);
                sheet.set_pixel(a.0, a.1, sheet.pixel(b.0, b.1));
                sheet.set_pixel(b.0, b.1, tmp);
            }
        }
        self.commit(cart);
        if self.has_selection() {
            self.copy_selection(cart);
        }
    }

    fn rotate(&mut self, cart: &mut Cartridge) {
        if self.has_selection() {
            let Some(rect) = self.select.rect else { return };
            // Rotate the floating pixels: new[y][x] = old[h-1-x][y].
            let (w, h) = (rect.w as usize, rect.h as usize);
            let mut rotated = Vec::with_capacity(w * h);
            for y in 0..w {
                for x in 0..h {
                    rotated.push(self.select.front[(h - 1 - x) * w + y]);
                }
            }
            self.select.front = rotated;
            self.rotate_select_rect();
            self.paste_selection(cart);
            self.commit(cart);
        } else {
            let size = self.size;
            let (ox, oy) = self.origin();
            let mut sheet = SpriteSheet::new(&mut cart.tiles);
            let mut scratch = vec![0u8; (size * size) as usize];
            for y in 0..size {
                for x in 0..size {
                    scratch[(x * size + (size - 1 - y)) as usize] = sheet.pixel(ox + x, oy + y);
                }
            }
            for y in 0..size {
                for x in 0..size {
                    sheet.set_pixel(ox + x, oy + y, scratch[(y * size + x) as usize]);
                }
            }
            self.commit(cart);
        }
    }

    fn erase(&mut self, cart: &mut Cartridge) {
        let rect = self.target_rect();
        let (ox, oy) = self.origin();
        let mut sheet = SpriteSheet::new(&mut cart.tiles);
        for y in rect.y..rect.y + rect.h {
            for x in rect.x..rect.x + rect.w {
                sheet.set_pixel(ox + x, oy + y, self.color2);
            }
        }
        self.clear_selection();
        self.commit(cart);
    }

    /// Selection rect when one exists, else the whole edit region.
    fn target_rect(&self) -> Rect {
        if self.has_selection() {
            self.select.rect.unwrap_or_default()
        } else {
            Rect::new(0, 0, self.size, self.size)
        }
    }

    // ----------------------------------------------------------- fill tool

    fn flood_fill(&mut self, cart: &mut Cartridge, px: i32, py: i32, replace_all: bool, fill: u8) {
        let (ox, oy) = self.origin();
        let size = self.size;
        let mut sheet = SpriteSheet::new(&mut cart.tiles);
        let target = sheet.pixel(ox + px, oy + py);
        if target == fill {
            return;
        }
        if replace_all {
            for y in 0..size {
                for x in 0..size {
                    if sheet.pixel(ox + x, oy + y) == target {
                        sheet.set_pixel(ox + x, oy + y, fill);
                    }
                }
            }
        } else {
            let mut stack = vec![(px, py)];
            while let Some((x, y)) = stack.pop() {
                if x < 0 || y < 0 || x >= size || y >= size {
                    continue;
                }
                if sheet.pixel(ox + x, oy + y) != target {
                    continue;
                }
                sheet.set_pixel(ox + x, oy + y, fill);
                stack.push((x - 1, y));
                stack.push((x + 1, y));
                stack.push((x, y - 1));
                stack.push((x, y + 1));
            }
        }
    }

    // -------------------------------------------------------------- canvas

    fn canvas_rect() -> Rect {
        Rect::new(CANVAS_X, CANVAS_Y, CANVAS_SIZE, CANVAS_SIZE)
    }

    fn process_canvas(&mut self, ctx: &mut EditorCtx) {
        let rect = Self::canvas_rect();
        let (mx, my) = ctx.input.mouse_pos();
        if !rect.contains(mx, my) {
            if self.stroke && !ctx.input.mouse_down(MouseButton::Left)
                && !ctx.input.mouse_down(MouseButton::Right)
            {
                self.stroke = false;
                self.commit(ctx.cart);
            }
            return;
        }
        let scale = self.scale();
        let cx = (mx - rect.x) / scale;
        let cy = (my - rect.y) / scale;

        // Middle button is a one-pixel pick regardless of tool.
        if ctx.input.mouse_pressed(MouseButton::Middle) {
            let (ox, oy) = self.origin();
            let sheet = SpriteSheet::new(&mut ctx.cart.tiles);
            self.color = sheet.pixel(ox + cx, oy + cy);
        }

        match self.tool {
            Tool::Draw => self.canvas_draw(ctx, cx, cy),
            Tool::Pick => self.canvas_pick(ctx, cx, cy),
            Tool::Select => self.canvas_select(ctx, cx, cy),
            Tool::Fill => self.canvas_fill(ctx, cx, cy),
        }
    }

    fn canvas_draw(&mut self, ctx: &mut EditorCtx, cx: i32, cy: i32) {
        let left = ctx.input.mouse_down(MouseButton::Left);
        let right = ctx.input.mouse_down(MouseButton::Right);
        if left || right {
            // Center the brush on the pointer, clamped inside the region.
            let offset = (self.brush - 1) / 2;
            let bx = (cx - offset).clamp(0, self.size - self.brush);
            let by = (cy - offset).clamp(0, self.size - self.brush);
            let paint = if left { self.color } else { self.color2 };
            let (ox, oy) = self.origin();
            let mut sheet = SpriteSheet::new(&mut ctx.cart.tiles);
            for j in 0..self.brush {
                for i in 0..self.brush {
                    sheet.set_pixel(ox + bx + i, oy + by + j, paint);
                }
            }
            self.stroke = true;
        } else if self.stroke {
            self.stroke = false;
            self.commit(ctx.cart);
        }
    }

    fn canvas_pick(&mut self, ctx: &mut EditorCtx, cx: i32, cy: i32) {
        let (ox, oy) = self.origin();
        let left = ctx.input.mouse_down(MouseButton::Left);
        let right = ctx.input.mouse_down(MouseButton::Right);
        if left || right {
            let sheet = SpriteSheet::new(&mut ctx.cart.tiles);
            let picked = sheet.pixel(ox + cx, oy + cy);
            if left {
                self.color = picked;
            } else {
                self.color2 = picked;
            }
        }
    }

    fn canvas_select(&mut self, ctx: &mut EditorCtx, cx: i32, cy: i32) {
        if ctx.input.mouse_down(MouseButton::Left) {
            if self.select.drag {
                let (sx, sy) = self.select.start;
                let l = cx.min(sx);
                let t = cy.min(sy);
                let r = cx.max(sx);
                let b = cy.max(sy);
                self.select.rect = Some(Rect::new(l, t, r - l + 1, b - t + 1));
            } else {
                self.select.drag = true;
                self.select.start = (cx, cy);
                self.select.rect = Some(Rect::new(cx, cy, 1, 1));
            }
        } else if self.select.drag {
            self.select.drag = false;
            self.copy_selection(ctx.cart);
        }
    }

    fn canvas_fill(&mut self, ctx: &mut EditorCtx, cx: i32, cy: i32) {
        let left = ctx.input.mouse_pressed(MouseButton::Left);
        let right = ctx.input.mouse_pressed(MouseButton::Right);
        if left || right {
            let fill = if left { self.color } else { self.color2 };
            self.flood_fill(ctx.cart, cx, cy, ctx.input.ctrl(), fill);
            self.commit(ctx.cart);
        }
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

        if input.key_pressed_once(Key::Tab) {
            self.bank = 1 - self.bank;
            self.clear_selection();
        }

        if self.has_selection() {
            if input.key_pressed(Key::Up) {
                self.move_selection(ctx.cart, 0, -1);
            } else if input.key_pressed(Key::Down) {
                self.move_selection(ctx.cart, 0, 1);
            } else if input.key_pressed(Key::Left) {
                self.move_selection(ctx.cart, -1, 0);
            } else if input.key_pressed(Key::Right) {
                self.move_selection(ctx.cart, 1, 0);
            } else if input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace) {
                self.erase(ctx.cart);
            }
        } else {
            let cells = 1;
            let (x, y) = ((self.index % 16) as i32, (self.index / 16) as i32);
            if input.key_pressed(Key::Up) {
                self.select_sprite(x, y - cells);
            } else if input.key_pressed(Key::Down) {
                self.select_sprite(x, y + cells);
            } else if input.key_pressed(Key::Left) {
                self.select_sprite(x - cells, y);
            } else if input.key_pressed(Key::Right) {
                self.select_sprite(x + cells, y);
            } else if input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace) {
                self.erase(ctx.cart);
            }
        }
    }

    // ------------------------------------------------------------ clipboard

    fn clipboard_payload(&self, cart: &mut Cartridge) -> Vec<u8> {
        if self.palette_edit {
            return cart.palette.as_bytes().to_vec();
        }
        let (ox, oy) = self.origin();
        let sheet = SpriteSheet::new(&mut cart.tiles);
        let mut out = Vec::with_capacity((self.size * self.size) as usize);
        for y in 0..self.size {
            for x in 0..self.size {
                out.push(sheet.pixel(ox + x, oy + y));
            }
        }
        out
    }

    fn copy(&mut self, ctx: &mut EditorCtx) {
        let payload = self.clipboard_payload(ctx.cart);
        ctx.host.clipboard_set(&hex::encode(&payload));
    }

    fn cut(&mut self, ctx: &mut EditorCtx) {
        self.copy(ctx);
        if !self.palette_edit {
            self.erase(ctx.cart);
        }
    }

    fn paste(&mut self, ctx: &mut EditorCtx) {
        let Some(clip) = ctx.host.clipboard_get() else {
            return;
        };
        if self.palette_edit {
            match hex::decode(&clip, PALETTE_BYTES) {
                Ok(bytes) => {
                    ctx.cart.palette.load_bytes(&bytes);
                    self.commit(ctx.cart);
                }
                Err(err) => trace!(target: "editor.sprite", %err, "palette paste rejected"),
            }
            return;
        }
        let expected = (self.size * self.size) as usize;
        match hex::decode(&clip, expected) {
            Ok(bytes) => {
                let (ox, oy) = self.origin();
                let mut sheet = SpriteSheet::new(&mut ctx.cart.tiles);
                for y in 0..self.size {
                    for x in 0..self.size {
                        sheet.set_pixel(ox + x, oy + y, bytes[(y * self.size + x) as usize]);
                    }
                }
                self.commit(ctx.cart);
            }
            Err(err) => trace!(target: "editor.sprite", %err, "sprite paste rejected"),
        }
    }

    // ------------------------------------------------------------- drawing

    fn draw_canvas(&self, ctx: &mut EditorCtx) {
        let scale = self.scale();
        let (ox, oy) = self.origin();
        let sheet = SpriteSheet::new(&mut ctx.cart.tiles);
        let mut grid = vec![0u8; (self.size * self.size) as usize];
        for y in 0..self.size {
            for x in 0..self.size {
                grid[(y * self.size + x) as usize] = sheet.pixel(ox + x, oy + y);
            }
        }
        let fb = &mut ctx.fb;
        fb.rect_border(
            Rect::new(CANVAS_X - 1, CANVAS_Y - 1, CANVAS_SIZE + 2, CANVAS_SIZE + 2),
            color::BLACK,
        );
        for y in 0..self.size {
            for x in 0..self.size {
                fb.rect(
                    Rect::new(CANVAS_X + x * scale, CANVAS_Y + y * scale, scale, scale),
                    grid[(y * self.size + x) as usize],
                );
            }
        }
        if let Some(rect) = self.select.rect {
            if self.tool == Tool::Select {
                fb.rect_border(
                    Rect::new(
                        CANVAS_X + rect.x * scale - 1,
                        CANVAS_Y + rect.y * scale - 1,
                        rect.w * scale + 2,
                        rect.h * scale + 2,
                    ),
                    color::WHITE,
                );
            }
        }
    }

    fn draw_sheet(&self, ctx: &mut EditorCtx) {
        let bank_y = self.bank * (BANK_PIXELS as usize);
        let tiles = &ctx.cart.tiles;
        let fb = &mut ctx.fb;
        for cell in 0..256usize {
            let tile = tiles.tile(self.bank * 256 + cell);
            let x = SHEET_X + (cell as i32 % 16) * 8;
            let y = SHEET_Y + (cell as i32 / 16) * 8;
            fb.blit_tile(tile, x, y, 1, false);
        }
        let (ox, oy) = self.origin();
        fb.rect_border(
            Rect::new(
                SHEET_X + ox - 1,
                SHEET_Y + (oy - bank_y as i32) - 1,
                self.size + 2,
                self.size + 2,
            ),
            color::WHITE,
        );
    }

    fn draw_palette(&mut self, ctx: &mut EditorCtx) {
        for i in 0..16i32 {
            let rect = Rect::new(
                PALETTE_X + (i % 8) * SWATCH,
                PALETTE_Y + (i / 8) * SWATCH,
                SWATCH,
                SWATCH,
            );
            ctx.fb.rect(rect, i as u8);
            if i as u8 == self.color {
                ctx.fb.rect_border(rect, color::WHITE);
            }
            if ctx.mouse_in(rect) {
                ctx.show_tooltip("color");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.color = i as u8;
                }
                if ctx.input.mouse_pressed(MouseButton::Right) {
                    self.color2 = i as u8;
                }
            }
        }
    }

    fn draw_rgb_sliders(&mut self, ctx: &mut EditorCtx) {
        for ch in 0..3i32 {
            let rect = Rect::new(PALETTE_X + 72, PALETTE_Y + ch * 6, 66, 5);
            let value = ctx.cart.palette.channel(self.color as usize, ch as usize);
            if ctx.mouse_in(rect) && ctx.input.mouse_down(MouseButton::Left) {
                let (mx, _) = ctx.input.mouse_pos();
                let v = ((mx - rect.x).clamp(0, 63) * 4 + 3).min(255) as u8;
                ctx.cart.palette.set_channel(self.color as usize, ch as usize, v);
                self.commit(ctx.cart);
            }
            let fb = &mut ctx.fb;
            fb.rect_border(rect, color::LIGHT_GRAY);
            let knob = rect.x + (value as i32) / 4;
            fb.vline(knob, rect.y, rect.h, color::WHITE);
        }
    }

    fn draw_toolbar(&mut self, ctx: &mut EditorCtx) {
        let tools = [
            (Tool::Draw, "draw"),
            (Tool::Pick, "pick"),
            (Tool::Select, "select"),
            (Tool::Fill, "fill"),
        ];
        for (i, (tool, tip)) in tools.iter().enumerate() {
            let rect = Rect::new(CANVAS_X + i as i32 * 9, CANVAS_Y + CANVAS_SIZE + 3, 8, 8);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip(tip);
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.set_tool(*tool);
                }
            }
            let paint = if self.tool == *tool {
                color::WHITE
            } else {
                color::LIGHT_GRAY
            };
            ctx.fb.rect_border(rect, paint);
        }

        let transforms: [(&str, fn(&mut Self, &mut Cartridge)); 4] = [
            ("flip horz", Self::flip_horizontal),
            ("flip vert", Self::flip_vertical),
            ("rotate", Self::rotate),
            ("erase", Self::erase),
        ];
        for (i, (tip, action)) in transforms.iter().enumerate() {
            let rect = Rect::new(
                CANVAS_X + 40 + i as i32 * 9,
                CANVAS_Y + CANVAS_SIZE + 3,
                8,
                8,
            );
            if ctx.mouse_in(rect) {
                ctx.show_tooltip(tip);
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    action(self, ctx.cart);
                }
            }
            ctx.fb.rect_border(rect, color::LIGHT_GRAY);
        }

        // Brush size slider, 1..4.
        for i in 0..4i32 {
            let rect = Rect::new(CANVAS_X - 10, CANVAS_Y + i * 7, 6, 6);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip("brush size");
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.brush = i + 1;
                }
            }
            let paint = if self.brush == i + 1 {
                color::WHITE
            } else {
                color::GRAY
            };
            ctx.fb.rect(rect, paint);
        }

        // Palette-edit toggle and index readout.
        let toggle = Rect::new(PALETTE_X - 10, PALETTE_Y, 8, 8);
        if ctx.mouse_in(toggle) {
            ctx.show_tooltip("edit palette");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                self.palette_edit = !self.palette_edit;
            }
        }
        ctx.fb.rect_border(
            toggle,
            if self.palette_edit {
                color::WHITE
            } else {
                color::LIGHT_GRAY
            },
        );

        let label = format!("#{:03}", self.bank * 256 + self.index);
        ctx.fb
            .print_shadow(&label, CANVAS_X, CANVAS_Y - 10, color::WHITE, color::BLACK);
    }

    fn process_sheet(&mut self, ctx: &mut EditorCtx) {
        let rect = Rect::new(SHEET_X, SHEET_Y, BANK_PIXELS, BANK_PIXELS);
        let (mx, my) = ctx.input.mouse_pos();
        if rect.contains(mx, my) && ctx.input.mouse_down(MouseButton::Left) {
            self.select_sprite((mx - rect.x) / 8, (my - rect.y) / 8);
        }
    }

    fn process_wheel(&mut self, ctx: &mut EditorCtx) {
        let wheel = ctx.input.scroll();
        if wheel == 0 {
            return;
        }
        let next = if wheel > 0 { self.size * 2 } else { self.size / 2 };
        self.set_size(next);
    }
}

impl Editor for SpriteEditor {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        self.process_wheel(ctx);
        self.process_keyboard(ctx);
        self.process_canvas(ctx);
        self.process_sheet(ctx);

        ctx.fb.clear(color::GRAY);
        self.draw_canvas(ctx);
        self.draw_sheet(ctx);
        self.draw_palette(ctx);
        if self.palette_edit {
            self.draw_rgb_sliders(ctx);
        }
        self.draw_toolbar(ctx);
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
        self.bank = 0;
        self.size = 8;
        self.tool = Tool::Draw;
        self.palette_edit = false;
        self.select = Selection::default();
        self.stroke = false;
        self.history = History::new(&region_bytes(cart));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_pixel(cart: &mut Cartridge, x: i32, y: i32) -> u8 {
        SpriteSheet::new(&mut cart.tiles).pixel(x, y)
    }

    fn fill_sprite(cart: &mut Cartridge, value: u8) {
        let mut sheet = SpriteSheet::new(&mut cart.tiles);
        for y in 0..8 {
            for x in 0..8 {
                sheet.set_pixel(x, y, value);
            }
        }
    }

    #[test]
    fn flood_fill_repaints_connected_region_and_undoes() {
        let mut cart = Cartridge::default();
        fill_sprite(&mut cart, 1);
        let mut editor = SpriteEditor::new(&cart);
        editor.history = History::new(&region_bytes(&cart));
        editor.color = 3;

        editor.flood_fill(&mut cart, 0, 0, false, editor.color);
        editor.commit(&cart);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(sheet_pixel(&mut cart, x, y), 3);
            }
        }
        editor.undo(&mut cart);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(sheet_pixel(&mut cart, x, y), 1);
            }
        }
    }

    #[test]
    fn fill_with_matching_color_is_a_noop() {
        let mut cart = Cartridge::default();
        fill_sprite(&mut cart, 5);
        let mut editor = SpriteEditor::new(&cart);
        editor.color = 5;
        editor.flood_fill(&mut cart, 0, 0, false, 5);
        assert!(!editor.history.add(&region_bytes(&cart)), "no change, no commit");
    }

    #[test]
    fn flip_horizontal_twice_is_identity() {
        let mut cart = Cartridge::default();
        {
            let mut sheet = SpriteSheet::new(&mut cart.tiles);
            sheet.set_pixel(0, 0, 7);
            sheet.set_pixel(3, 5, 2);
        }
        let before = cart.tiles.as_bytes().to_vec();
        let mut editor = SpriteEditor::new(&cart);
        editor.flip_horizontal(&mut cart);
        assert_eq!(sheet_pixel(&mut cart, 7, 0), 7);
        editor.flip_horizontal(&mut cart);
        assert_eq!(cart.tiles.as_bytes(), &before[..]);
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let mut cart = Cartridge::default();
        {
            let mut sheet = SpriteSheet::new(&mut cart.tiles);
            sheet.set_pixel(1, 0, 9);
            sheet.set_pixel(2, 6, 4);
        }
        let before = cart.tiles.as_bytes().to_vec();
        let mut editor = SpriteEditor::new(&cart);
        editor.rotate(&mut cart);
        assert_eq!(sheet_pixel(&mut cart, 7, 1), 9, "90 degrees clockwise");
        for _ in 0..3 {
            editor.rotate(&mut cart);
        }
        assert_eq!(cart.tiles.as_bytes(), &before[..]);
    }

    #[test]
    fn selection_rotation_clamps_inside_region() {
        let mut cart = Cartridge::default();
        let mut editor = SpriteEditor::new(&cart);
        editor.tool = Tool::Select;
        // A wide selection hugging the right edge: after rotation the tall
        // rect must be translated back inside the 8x8 region.
        editor.select.rect = Some(Rect::new(2, 6, 6, 2));
        editor.copy_selection(&mut cart);
        editor.rotate(&mut cart);
        let rect = editor.select.rect.unwrap();
        assert_eq!((rect.w, rect.h), (2, 6));
        assert!(rect.x >= 0 && rect.y >= 0);
        assert!(rect.x + rect.w <= 8 && rect.y + rect.h <= 8);
    }

    #[test]
    fn erase_uses_background_color() {
        let mut cart = Cartridge::default();
        fill_sprite(&mut cart, 9);
        let mut editor = SpriteEditor::new(&cart);
        editor.color2 = 6;
        editor.erase(&mut cart);
        assert_eq!(sheet_pixel(&mut cart, 4, 4), 6);
    }

    #[test]
    fn second_bank_edits_land_past_first_bank_pixels() {
        let mut cart = Cartridge::default();
        let mut editor = SpriteEditor::new(&cart);
        editor.bank = 1;
        let (_, oy) = editor.origin();
        assert_eq!(oy, 128);
    }

    #[test]
    fn sheet_click_clamps_region_to_bank_edge() {
        let cart = Cartridge::default();
        let mut editor = SpriteEditor::new(&cart);
        editor.set_size(32);
        editor.select_sprite(15, 15);
        let (x, y) = editor.origin();
        assert_eq!((x, y), (96, 96), "32px region cannot start past column 12");
    }
}
