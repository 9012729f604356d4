//! Tile-map editor: a scrollable 240×136-tile world painted with a
//! multi-tile brush picked from the sprite sheet, a draw/drag/select/fill
//! tool machine, and hex-clipboard rectangles with a paste-preview overlay.

use crate::{Editor, EditorCtx, StudioEvent, StudioMode, TOOLBAR_H};
use glint_cart::{Cartridge, MAP_HEIGHT, MAP_WIDTH, SHEET_COLS, hex};
use glint_gfx::{Rect, color};
use glint_history::History;
use glint_input::{Key, MouseButton};
use tracing::trace;

const MAP_X: i32 = 0;
const MAP_Y: i32 = TOOLBAR_H;
const AREA_W: i32 = glint_gfx::WIDTH;
const AREA_H: i32 = glint_gfx::HEIGHT - TOOLBAR_H;

/// World size in pixels; scroll wraps modulo these.
const WORLD_W: i32 = MAP_WIDTH as i32 * 8;
const WORLD_H: i32 = MAP_HEIGHT as i32 * 8;

const SHEET_PANEL_X: i32 = glint_gfx::WIDTH - 128 - 1;
const SHEET_PANEL_Y: i32 = TOOLBAR_H;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTool {
    Draw,
    Drag,
    Select,
    Fill,
}

pub struct MapEditor {
    scroll_x: i32,
    scroll_y: i32,
    tool: MapTool,
    /// Brush rectangle in sheet cells (within the 16×16 grid of bank 0).
    brush: Rect,
    sheet_visible: bool,
    sheet_drag: bool,
    sheet_start: (i32, i32),
    select: Option<Rect>,
    select_drag: bool,
    select_start: (i32, i32),
    /// Parsed paste payload following the cursor until placed.
    paste: Option<(usize, usize, Vec<u8>)>,
    grid: bool,
    pan: Option<(i32, i32)>,
    /// First stamped cell of the current draw stroke, for grid snapping.
    stamp_anchor: Option<(i32, i32)>,
    history: History,
}

impl MapEditor {
    pub fn new(cart: &Cartridge) -> Self {
        Self {
            scroll_x: 0,
            scroll_y: 0,
            tool: MapTool::Draw,
            brush: Rect::new(0, 0, 1, 1),
            sheet_visible: false,
            sheet_drag: false,
            sheet_start: (0, 0),
            select: None,
            select_drag: false,
            select_start: (0, 0),
            paste: None,
            grid: false,
            pan: None,
            stamp_anchor: None,
            history: History::new(cart.map.as_bytes()),
        }
    }

    pub fn scroll(&self) -> (i32, i32) {
        (self.scroll_x, self.scroll_y)
    }

    pub fn set_scroll(&mut self, x: i32, y: i32) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.normalize_scroll();
    }

    pub fn set_tool(&mut self, tool: MapTool) {
        self.tool = tool;
    }

    pub fn selection(&self) -> Option<Rect> {
        self.select
    }

    /// Replace the selection rectangle (tile coordinates).
    pub fn set_selection(&mut self, rect: Option<Rect>) {
        self.select = rect;
        self.select_drag = false;
    }

    fn normalize_scroll(&mut self) {
        self.scroll_x = self.scroll_x.rem_euclid(WORLD_W);
        self.scroll_y = self.scroll_y.rem_euclid(WORLD_H);
    }

    /// Tile under the mouse, wrapped into the world.
    fn mouse_tile(&self, ctx: &EditorCtx) -> (i32, i32) {
        let (mx, my) = ctx.input.mouse_pos();
        let x = (mx + self.scroll_x).div_euclid(8).rem_euclid(MAP_WIDTH as i32);
        let y = (my + self.scroll_y).div_euclid(8).rem_euclid(MAP_HEIGHT as i32);
        (x, y)
    }

    fn commit(&mut self, cart: &Cartridge) {
        self.history.add(cart.map.as_bytes());
    }

    fn undo(&mut self, cart: &mut Cartridge) {
        let mut bytes = cart.map.as_bytes().to_vec();
        if self.history.undo(&mut bytes) {
            cart.map.load_bytes(&bytes);
        }
    }

    fn redo(&mut self, cart: &mut Cartridge) {
        let mut bytes = cart.map.as_bytes().to_vec();
        if self.history.redo(&mut bytes) {
            cart.map.load_bytes(&bytes);
        }
    }

    /// Lay the brush with its top-left at (tx, ty), wrapping at the edges.
    fn stamp(&mut self, cart: &mut Cartridge, tx: i32, ty: i32) {
        for j in 0..self.brush.h {
            for i in 0..self.brush.w {
                let tile = ((self.brush.x + i) + (self.brush.y + j) * SHEET_COLS as i32) as u8;
                cart.map.set(
                    (tx + i).rem_euclid(MAP_WIDTH as i32) as usize,
                    (ty + j).rem_euclid(MAP_HEIGHT as i32) as usize,
                    tile,
                );
            }
        }
        self.commit(cart);
    }

    fn brush_origin_tile(&self) -> u8 {
        (self.brush.x + self.brush.y * SHEET_COLS as i32) as u8
    }

    // ------------------------------------------------------------- tools

    fn tool_draw(&mut self, ctx: &mut EditorCtx) {
        if ctx.input.mouse_down(MouseButton::Left) {
            let (tx, ty) = self.mouse_tile(ctx);
            match self.stamp_anchor {
                Some((ax, ay)) => {
                    // Re-stamp only on brush-sized steps from the anchor.
                    let w = tx - ax;
                    let h = ty - ay;
                    if w % self.brush.w == 0 && h % self.brush.h == 0 {
                        self.stamp(ctx.cart, tx, ty);
                    }
                }
                None => {
                    self.stamp_anchor = Some((tx, ty));
                    self.stamp(ctx.cart, tx, ty);
                }
            }
        } else {
            self.stamp_anchor = None;
        }

        if ctx.input.mouse_pressed(MouseButton::Middle) {
            let (tx, ty) = self.mouse_tile(ctx);
            let index = ctx.cart.map.get(tx as usize, ty as usize) as i32;
            self.brush = Rect::new(index % SHEET_COLS as i32, index / SHEET_COLS as i32, 1, 1);
        }
    }

    fn pan_world(&mut self, ctx: &mut EditorCtx, pressed: bool) {
        let (mx, my) = ctx.input.mouse_pos();
        match self.pan {
            Some((ax, ay)) => {
                if pressed {
                    self.scroll_x = ax - mx;
                    self.scroll_y = ay - my;
                    self.normalize_scroll();
                } else {
                    self.pan = None;
                }
            }
            None => {
                if pressed {
                    self.pan = Some((mx + self.scroll_x, my + self.scroll_y));
                }
            }
        }
    }

    fn tool_select(&mut self, ctx: &mut EditorCtx) {
        if self.paste.is_some() {
            self.paste_preview(ctx);
            return;
        }
        if ctx.input.mouse_down(MouseButton::Left) {
            let (tx, ty) = self.mouse_tile(ctx);
            if self.select_drag {
                let (sx, sy) = self.select_start;
                let l = tx.min(sx);
                let t = ty.min(sy);
                let r = tx.max(sx);
                let b = ty.max(sy);
                self.select = Some(Rect::new(l, t, r - l + 1, b - t + 1));
            } else {
                self.select_drag = true;
                self.select_start = (tx, ty);
                self.select = Some(Rect::new(tx, ty, 1, 1));
            }
        } else if self.select_drag {
            self.select_drag = false;
            // A bare click clears any selection.
            if let Some(rect) = self.select {
                if rect.w <= 1 && rect.h <= 1 {
                    self.select = None;
                }
            }
        }
    }

    fn tool_fill(&mut self, ctx: &mut EditorCtx) {
        if ctx.input.mouse_pressed(MouseButton::Left) {
            let (tx, ty) = self.mouse_tile(ctx);
            let value = ctx.cart.map.get(tx as usize, ty as usize);
            self.fill(ctx.cart, tx, ty, value);
            self.commit(ctx.cart);
        }
    }

    /// Flood fill in tile space, stepping by brush-sized blocks. Bounded by
    /// the selection when one exists, else the whole world; aborts when the
    /// clicked value already equals the brush origin tile (observable rule).
    fn fill(&mut self, cart: &mut Cartridge, x: i32, y: i32, value: u8) {
        if value == self.brush_origin_tile() {
            return;
        }
        let clip = self
            .select
            .unwrap_or(Rect::new(0, 0, MAP_WIDTH as i32, MAP_HEIGHT as i32));
        let (bw, bh) = (self.brush.w, self.brush.h);

        let block_matches = |cart: &Cartridge, bx: i32, by: i32| {
            for j in 0..bh {
                for i in 0..bw {
                    if cart.map.get((bx + i) as usize, (by + j) as usize) != value {
                        return false;
                    }
                }
            }
            true
        };

        let mut stack = vec![(x, y)];
        while let Some((bx, by)) = stack.pop() {
            for j in 0..bh {
                for i in 0..bw {
                    let tile =
                        ((self.brush.x + i) + (self.brush.y + j) * SHEET_COLS as i32) as u8;
                    cart.map.set((bx + i) as usize, (by + j) as usize, tile);
                }
            }
            for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
                let nx = bx + dx * bw;
                let ny = by + dy * bh;
                if nx >= clip.x
                    && nx < clip.x + clip.w
                    && ny >= clip.y
                    && ny < clip.y + clip.h
                    && block_matches(cart, nx, ny)
                {
                    stack.push((nx, ny));
                }
            }
        }
    }

    fn delete_selection(&mut self, cart: &mut Cartridge) {
        let Some(rect) = self.select else { return };
        for j in rect.y..rect.y + rect.h {
            for i in rect.x..rect.x + rect.w {
                cart.map.set(
                    i.rem_euclid(MAP_WIDTH as i32) as usize,
                    j.rem_euclid(MAP_HEIGHT as i32) as usize,
                    0,
                );
            }
        }
        self.commit(cart);
    }

    // --------------------------------------------------------- clipboard

    fn copy(&mut self, ctx: &mut EditorCtx) {
        let Some(rect) = self.select else { return };
        let mut payload = Vec::with_capacity((rect.w * rect.h + 2) as usize);
        payload.push(rect.w as u8);
        payload.push(rect.h as u8);
        for j in rect.y..rect.y + rect.h {
            for i in rect.x..rect.x + rect.w {
                payload.push(ctx.cart.map.get(
                    i.rem_euclid(MAP_WIDTH as i32) as usize,
                    j.rem_euclid(MAP_HEIGHT as i32) as usize,
                ));
            }
        }
        ctx.host.clipboard_set(&hex::encode(&payload));
        self.select = None;
    }

    fn cut(&mut self, ctx: &mut EditorCtx) {
        if self.select.is_some() {
            self.copy_keep_selection(ctx);
            self.delete_selection(ctx.cart);
            self.select = None;
        }
    }

    fn copy_keep_selection(&mut self, ctx: &mut EditorCtx) {
        let saved = self.select;
        self.copy(ctx);
        self.select = saved;
    }

    fn paste_from_clipboard(&mut self, ctx: &mut EditorCtx) {
        let Some(clip) = ctx.host.clipboard_get() else {
            return;
        };
        match hex::decode_any(&clip) {
            Ok(data) if data.len() > 2 => {
                let w = data[0] as usize;
                let h = data[1] as usize;
                if w * h == data.len() - 2 {
                    self.paste = Some((w, h, data[2..].to_vec()));
                    self.tool = MapTool::Select;
                } else {
                    trace!(target: "editor.map", w, h, len = data.len(), "paste header mismatch");
                }
            }
            Ok(_) => {}
            Err(err) => trace!(target: "editor.map", %err, "map paste rejected"),
        }
    }

    /// The copied stamp follows the cursor; LMB confirms placement.
    fn paste_preview(&mut self, ctx: &mut EditorCtx) {
        let Some((w, h, data)) = self.paste.clone() else {
            return;
        };
        let (mx, my) = ctx.input.mouse_pos();
        let px = mx + self.scroll_x - (w as i32 - 1) * 8 / 2;
        let py = my + self.scroll_y - (h as i32 - 1) * 8 / 2;

        if ctx.input.mouse_pressed(MouseButton::Left) {
            let tx = px.div_euclid(8);
            let ty = py.div_euclid(8);
            for j in 0..h {
                for i in 0..w {
                    cart_set_wrapped(ctx.cart, tx + i as i32, ty + j as i32, data[i + j * w]);
                }
            }
            self.commit(ctx.cart);
            self.paste = None;
        } else {
            // Ghost the stamp under the cursor.
            let gx = px - px.rem_euclid(8) - self.scroll_x;
            let gy = py - py.rem_euclid(8) - self.scroll_y;
            for j in 0..h {
                for i in 0..w {
                    let tile = ctx.cart.tiles.tile(data[i + j * w] as usize).to_vec();
                    ctx.fb
                        .blit_tile(&tile, gx + i as i32 * 8, gy + j as i32 * 8, 1, false);
                }
            }
            ctx.fb.rect_border(
                Rect::new(gx - 1, gy - 1, w as i32 * 8 + 2, h as i32 * 8 + 2),
                color::WHITE,
            );
        }
    }

    // ---------------------------------------------------------- keyboard

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
            *ctx.mode_request = Some(StudioMode::World);
        } else if input.key_pressed_once(Key::Digit1) {
            self.tool = MapTool::Draw;
        } else if input.key_pressed_once(Key::Digit2) {
            self.tool = MapTool::Drag;
        } else if input.key_pressed_once(Key::Digit3) {
            self.tool = MapTool::Select;
        } else if input.key_pressed_once(Key::Digit4) {
            self.tool = MapTool::Fill;
        } else if input.key_pressed(Key::Delete) {
            self.delete_selection(ctx.cart);
        } else if input.key_pressed_once(Key::Grave) {
            self.grid = !self.grid;
        }

        let step = if input.shift() { AREA_H } else { 8 };
        let mut scrolled = false;
        if input.key_pressed(Key::Up) {
            self.scroll_y -= step;
            scrolled = true;
        }
        if input.key_pressed(Key::Down) {
            self.scroll_y += step;
            scrolled = true;
        }
        if input.key_pressed(Key::Left) {
            self.scroll_x -= step;
            scrolled = true;
        }
        if input.key_pressed(Key::Right) {
            self.scroll_x += step;
            scrolled = true;
        }
        if scrolled {
            self.normalize_scroll();
        }
    }

    // ----------------------------------------------------------- drawing

    fn draw_world(&self, ctx: &mut EditorCtx) {
        let tiles = &ctx.cart.tiles;
        let map = &ctx.cart.map;
        let fb = &mut ctx.fb;

        let off_x = self.scroll_x.rem_euclid(8);
        let off_y = self.scroll_y.rem_euclid(8);
        let first_tx = self.scroll_x.div_euclid(8);
        let first_ty = self.scroll_y.div_euclid(8);

        for row in 0..(AREA_H / 8 + 2) {
            for col in 0..(AREA_W / 8 + 2) {
                let tx = (first_tx + col).rem_euclid(MAP_WIDTH as i32) as usize;
                let ty = (first_ty + row).rem_euclid(MAP_HEIGHT as i32) as usize;
                let tile = tiles.tile(map.get(tx, ty) as usize);
                fb.blit_tile(tile, col * 8 - off_x, MAP_Y + row * 8 - off_y, 1, false);
            }
        }

        // World-screen boundary guides.
        let sx = glint_gfx::WIDTH - self.scroll_x % glint_gfx::WIDTH;
        let sy = glint_gfx::HEIGHT - self.scroll_y % glint_gfx::HEIGHT;
        fb.hline(0, sy, glint_gfx::WIDTH, color::GRAY);
        fb.vline(sx, MAP_Y, glint_gfx::HEIGHT, color::GRAY);
    }

    /// XOR overlay along 8-pixel world cell edges.
    fn draw_grid(&self, ctx: &mut EditorCtx) {
        let fb = &mut ctx.fb;
        let off_x = self.scroll_x.rem_euclid(8);
        let off_y = self.scroll_y.rem_euclid(8);

        let mut y = MAP_Y - off_y;
        while y < glint_gfx::HEIGHT {
            if y >= MAP_Y {
                for x in 0..glint_gfx::WIDTH {
                    fb.xor_pixel(x, y);
                }
            }
            y += 8;
        }
        let mut x = -off_x;
        while x < glint_gfx::WIDTH {
            if x >= 0 {
                for y in MAP_Y..glint_gfx::HEIGHT {
                    if (y + off_y - MAP_Y) % 8 != 0 {
                        fb.xor_pixel(x, y);
                    }
                }
            }
            x += 8;
        }
    }

    fn draw_selection(&self, ctx: &mut EditorCtx) {
        let Some(rect) = self.select else { return };
        let x = rect.x * 8 - self.scroll_x;
        let y = rect.y * 8 - self.scroll_y + MAP_Y;
        ctx.fb.rect_border(
            Rect::new(x - 1, y - 1, rect.w * 8 + 2, rect.h * 8 + 2),
            color::WHITE,
        );
    }

    fn draw_sheet_panel(&mut self, ctx: &mut EditorCtx) {
        let panel = Rect::new(SHEET_PANEL_X, SHEET_PANEL_Y, 128, 128);
        {
            let tiles = &ctx.cart.tiles;
            let fb = &mut ctx.fb;
            fb.rect_border(
                Rect::new(panel.x - 1, panel.y - 1, panel.w + 2, panel.h + 2),
                color::WHITE,
            );
            for cell in 0..256usize {
                let tile = tiles.tile(cell);
                fb.blit_tile(
                    tile,
                    panel.x + (cell as i32 % 16) * 8,
                    panel.y + (cell as i32 / 16) * 8,
                    1,
                    false,
                );
            }
        }

        let (mx, my) = ctx.input.mouse_pos();
        if panel.contains(mx, my) && ctx.input.mouse_down(MouseButton::Left) {
            let cx = (mx - panel.x) / 8;
            let cy = (my - panel.y) / 8;
            if self.sheet_drag {
                let (sx, sy) = self.sheet_start;
                let l = cx.min(sx);
                let t = cy.min(sy);
                self.brush = Rect::new(l, t, cx.max(sx) - l + 1, cy.max(sy) - t + 1);
            } else {
                self.sheet_drag = true;
                self.sheet_start = (cx, cy);
                self.brush = Rect::new(cx, cy, 1, 1);
            }
        } else {
            self.sheet_drag = false;
        }

        ctx.fb.rect_border(
            Rect::new(
                panel.x + self.brush.x * 8 - 1,
                panel.y + self.brush.y * 8 - 1,
                self.brush.w * 8 + 2,
                self.brush.h * 8 + 2,
            ),
            color::WHITE,
        );
    }

    fn draw_toolbar(&mut self, ctx: &mut EditorCtx) {
        ctx.fb
            .rect(Rect::new(0, 0, glint_gfx::WIDTH, TOOLBAR_H), color::WHITE);

        let buttons: [(&str, MapTool); 4] = [
            ("draw tiles", MapTool::Draw),
            ("drag map", MapTool::Drag),
            ("select tiles", MapTool::Select),
            ("fill tiles", MapTool::Fill),
        ];
        for (i, (tip, tool)) in buttons.iter().enumerate() {
            let rect = Rect::new(80 + i as i32 * 8, 0, 7, 7);
            if ctx.mouse_in(rect) {
                ctx.show_tooltip(tip);
                if ctx.input.mouse_pressed(MouseButton::Left) {
                    self.tool = *tool;
                }
            }
            let paint = if self.tool == *tool {
                color::BLACK
            } else {
                color::GRAY
            };
            ctx.fb.rect(rect, paint);
        }

        let world_btn = Rect::new(120, 0, 7, 7);
        if ctx.mouse_in(world_btn) {
            ctx.show_tooltip("world map");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                *ctx.mode_request = Some(StudioMode::World);
            }
        }
        ctx.fb.rect_border(world_btn, color::GRAY);

        let grid_btn = Rect::new(129, 0, 7, 7);
        if ctx.mouse_in(grid_btn) {
            ctx.show_tooltip("show/hide grid");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                self.grid = !self.grid;
            }
        }
        ctx.fb
            .rect_border(grid_btn, if self.grid { color::BLACK } else { color::GRAY });

        let sheet_btn = Rect::new(138, 0, 7, 7);
        if ctx.mouse_in(sheet_btn) {
            ctx.show_tooltip("show tiles");
            if ctx.input.mouse_pressed(MouseButton::Left) {
                self.sheet_visible = !self.sheet_visible;
            }
        }
        ctx.fb.rect_border(
            sheet_btn,
            if self.sheet_visible {
                color::BLACK
            } else {
                color::GRAY
            },
        );

        // Cursor cell and brush tile readouts.
        let (tx, ty) = self.mouse_tile(ctx);
        let label = format!("{:03}:{:03} #{:03}", tx, ty, self.brush_origin_tile());
        ctx.fb.print(&label, 2, 0, color::DARK_GRAY);
    }
}

fn cart_set_wrapped(cart: &mut Cartridge, x: i32, y: i32, tile: u8) {
    cart.map.set(
        x.rem_euclid(MAP_WIDTH as i32) as usize,
        y.rem_euclid(MAP_HEIGHT as i32) as usize,
        tile,
    );
}

impl Editor for MapEditor {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        self.process_keyboard(ctx);

        ctx.fb.clear(color::BLACK);
        self.draw_world(ctx);
        if self.grid || self.pan.is_some() {
            self.draw_grid(ctx);
        }

        let area = Rect::new(MAP_X, MAP_Y, AREA_W, AREA_H);
        let over_sheet = self.sheet_visible
            && ctx.mouse_in(Rect::new(SHEET_PANEL_X, SHEET_PANEL_Y, 128, 128));
        if ctx.mouse_in(area) && !over_sheet {
            if ctx.input.key(Key::Space) {
                let pressed = ctx.input.mouse_down(MouseButton::Left)
                    || ctx.input.mouse_down(MouseButton::Right);
                self.pan_world(ctx, pressed);
            } else {
                match self.tool {
                    MapTool::Draw => self.tool_draw(ctx),
                    MapTool::Drag => {
                        let pressed = ctx.input.mouse_down(MouseButton::Left)
                            || ctx.input.mouse_down(MouseButton::Right);
                        self.pan_world(ctx, pressed);
                    }
                    MapTool::Select => self.tool_select(ctx),
                    MapTool::Fill => self.tool_fill(ctx),
                }
                if self.tool != MapTool::Drag {
                    let pressed = ctx.input.mouse_down(MouseButton::Right);
                    self.pan_world(ctx, pressed);
                }
            }
        }

        self.draw_selection(ctx);
        if self.sheet_visible {
            self.draw_sheet_panel(ctx);
        }
        self.draw_toolbar(ctx);
    }

    fn event(&mut self, ctx: &mut EditorCtx, event: StudioEvent) {
        match event {
            StudioEvent::Cut => self.cut(ctx),
            StudioEvent::Copy => self.copy(ctx),
            StudioEvent::Paste => self.paste_from_clipboard(ctx),
            StudioEvent::Undo => self.undo(ctx.cart),
            StudioEvent::Redo => self.redo(ctx.cart),
        }
    }

    fn rom_loaded(&mut self, cart: &Cartridge) {
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.tool = MapTool::Draw;
        self.brush = Rect::new(0, 0, 1, 1);
        self.select = None;
        self.select_drag = false;
        self.paste = None;
        self.pan = None;
        self.stamp_anchor = None;
        self.history = History::new(cart.map.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_aborts_when_value_matches_brush_origin() {
        let mut cart = Cartridge::default();
        let mut editor = MapEditor::new(&cart);
        // Brush origin tile is 0 and the world is all zeros.
        editor.fill(&mut cart, 5, 5, 0);
        assert!(cart.map.as_bytes().iter().all(|&b| b == 0));
        assert!(!editor.history.add(cart.map.as_bytes()));
    }

    #[test]
    fn fill_is_bounded_by_selection() {
        let mut cart = Cartridge::default();
        let mut editor = MapEditor::new(&cart);
        editor.brush = Rect::new(1, 0, 1, 1); // tile 1
        editor.select = Some(Rect::new(10, 10, 3, 3));
        editor.fill(&mut cart, 11, 11, 0);
        for y in 10..13 {
            for x in 10..13 {
                assert_eq!(cart.map.get(x, y), 1);
            }
        }
        assert_eq!(cart.map.get(9, 10), 0);
        assert_eq!(cart.map.get(13, 10), 0);
    }

    #[test]
    fn fill_stops_at_unequal_cells() {
        let mut cart = Cartridge::default();
        cart.map.set(5, 0, 7);
        let mut editor = MapEditor::new(&cart);
        editor.brush = Rect::new(2, 0, 1, 1); // tile 2
        editor.select = Some(Rect::new(0, 0, 10, 1));
        editor.fill(&mut cart, 0, 0, 0);
        for x in 0..5 {
            assert_eq!(cart.map.get(x, 0), 2);
        }
        assert_eq!(cart.map.get(5, 0), 7, "barrier survives");
        assert_eq!(cart.map.get(6, 0), 0, "fill does not jump the barrier");
    }

    #[test]
    fn stamp_wraps_at_world_edges() {
        let mut cart = Cartridge::default();
        let mut editor = MapEditor::new(&cart);
        editor.brush = Rect::new(3, 0, 2, 2);
        editor.stamp(&mut cart, MAP_WIDTH as i32 - 1, MAP_HEIGHT as i32 - 1);
        assert_eq!(cart.map.get(MAP_WIDTH - 1, MAP_HEIGHT - 1), 3);
        assert_eq!(cart.map.get(0, 0), 3 + 1 + SHEET_COLS as u8);
    }

    #[test]
    fn delete_selection_zeroes_cells_and_commits() {
        let mut cart = Cartridge::default();
        cart.map.set(4, 4, 9);
        let mut editor = MapEditor::new(&cart);
        editor.history = History::new(cart.map.as_bytes());
        editor.select = Some(Rect::new(4, 4, 1, 1));
        editor.delete_selection(&mut cart);
        assert_eq!(cart.map.get(4, 4), 0);
        editor.undo(&mut cart);
        assert_eq!(cart.map.get(4, 4), 9);
    }

    #[test]
    fn scroll_wraps_modulo_world_pixels() {
        let cart = Cartridge::default();
        let mut editor = MapEditor::new(&cart);
        editor.set_scroll(-8, WORLD_H + 24);
        assert_eq!(editor.scroll(), (WORLD_W - 8, 24));
    }
}
