//! World overview: a 240×136 thumbnail of the map where each pixel is the
//! dominant non-zero palette index of the referenced tile. Clicking pans the
//! map view; releasing returns to the map editor.

use crate::{Editor, EditorCtx, StudioEvent, StudioMode};
use glint_cart::sheet::tile_pixel;
use glint_cart::{Cartridge, MAP_HEIGHT, MAP_WIDTH, PALETTE_SIZE, TILE_SIZE};
use glint_gfx::{Rect, color};
use glint_input::{Key, MouseButton};

/// Visible map window in tiles (240/8 × rounded-up 136/8).
const SCREEN_TILES_W: i32 = 30;
const SCREEN_TILES_H: i32 = 17;

pub struct WorldOverview {
    preview: Box<[u8]>,
    /// Map scroll chosen by clicking the overview; the router forwards it.
    pending_scroll: Option<(i32, i32)>,
}

impl WorldOverview {
    pub fn new(cart: &Cartridge) -> Self {
        let mut world = Self {
            preview: vec![0; MAP_WIDTH * MAP_HEIGHT].into_boxed_slice(),
            pending_scroll: None,
        };
        world.prepare(cart);
        world
    }

    /// Rebuild the thumbnail; called on every entry into world mode.
    pub fn prepare(&mut self, cart: &Cartridge) {
        self.preview.fill(0);
        for i in 0..MAP_WIDTH * MAP_HEIGHT {
            let index = cart.map.as_bytes()[i];
            if index == 0 {
                continue;
            }
            let tile = cart.tiles.tile(index as usize);
            // Histogram over the tile's 64 pixels; ties break to the lowest
            // palette index, and all-zero tiles stay background.
            let mut counts = [0u32; PALETTE_SIZE];
            for p in 0..TILE_SIZE * TILE_SIZE {
                let c = tile_pixel(tile, p);
                if c != 0 {
                    counts[c as usize] += 1;
                }
            }
            let mut best = 0;
            for (c, &n) in counts.iter().enumerate() {
                if n > counts[best] {
                    best = c;
                }
            }
            self.preview[i] = best as u8;
        }
    }

    pub fn take_scroll(&mut self) -> Option<(i32, i32)> {
        self.pending_scroll.take()
    }

    /// Current map scroll, injected by the router so the viewport frame can
    /// be drawn.
    pub fn draw(&self, ctx: &mut EditorCtx, map_scroll: (i32, i32)) {
        let fb = &mut ctx.fb;
        for y in 0..MAP_HEIGHT as i32 {
            for x in 0..MAP_WIDTH as i32 {
                fb.set_pixel(x, y, self.preview[(y * MAP_WIDTH as i32 + x) as usize]);
            }
        }

        // Screen-sized grid over the world.
        let mut gx = 0;
        while gx < glint_gfx::WIDTH {
            fb.vline(gx, 0, glint_gfx::HEIGHT, color::LIGHT_BLUE);
            gx += SCREEN_TILES_W;
        }
        let mut gy = 0;
        while gy < glint_gfx::HEIGHT {
            fb.hline(0, gy, glint_gfx::WIDTH, color::LIGHT_BLUE);
            gy += SCREEN_TILES_H;
        }
        fb.rect_border(
            Rect::new(0, 0, glint_gfx::WIDTH, glint_gfx::HEIGHT),
            color::LIGHT_BLUE,
        );

        // Viewport frame at the map's scroll position.
        fb.rect_border(
            Rect::new(
                map_scroll.0 / TILE_SIZE as i32,
                map_scroll.1 / TILE_SIZE as i32,
                SCREEN_TILES_W + 1,
                SCREEN_TILES_H + 1,
            ),
            color::RED,
        );
    }
}

impl Editor for WorldOverview {
    fn tick(&mut self, ctx: &mut EditorCtx) {
        if ctx.input.key_pressed_once(Key::Tab) {
            *ctx.mode_request = Some(StudioMode::Map);
            return;
        }
        let (mx, my) = ctx.input.mouse_pos();
        let screen = Rect::new(0, 0, glint_gfx::WIDTH, glint_gfx::HEIGHT);
        if screen.contains(mx, my) {
            if ctx.input.mouse_down(MouseButton::Left) {
                // Center the map viewport on the clicked tile.
                self.pending_scroll = Some((
                    (mx - SCREEN_TILES_W / 2) * TILE_SIZE as i32,
                    (my - SCREEN_TILES_H / 2) * TILE_SIZE as i32,
                ));
            }
            if ctx.input.mouse_released(MouseButton::Left) {
                *ctx.mode_request = Some(StudioMode::Map);
            }
        }
    }

    fn event(&mut self, _ctx: &mut EditorCtx, _event: StudioEvent) {}

    fn rom_loaded(&mut self, cart: &Cartridge) {
        self.pending_scroll = None;
        self.prepare(cart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_cart::SpriteSheet;

    #[test]
    fn preview_uses_dominant_nonzero_color() {
        let mut cart = Cartridge::default();
        {
            // Tile 1: forty pixels of color 5, rest color 2.
            let mut sheet = SpriteSheet::new(&mut cart.tiles);
            for p in 0..64 {
                let (x, y) = ((p % 8) as i32 + 8, (p / 8) as i32);
                sheet.set_pixel(x, y, if p < 40 { 5 } else { 2 });
            }
        }
        cart.map.set(3, 4, 1);
        let world = WorldOverview::new(&cart);
        assert_eq!(world.preview[4 * MAP_WIDTH + 3], 5);
        assert_eq!(world.preview[0], 0, "tile 0 cells stay background");
    }

    #[test]
    fn ties_break_to_the_lowest_index() {
        let mut cart = Cartridge::default();
        {
            let mut sheet = SpriteSheet::new(&mut cart.tiles);
            // Tile 1 at cell (1,0): half color 7, half color 3.
            for p in 0..64 {
                let (x, y) = ((p % 8) as i32 + 8, (p / 8) as i32);
                sheet.set_pixel(x, y, if p % 2 == 0 { 7 } else { 3 });
            }
        }
        cart.map.set(0, 0, 1);
        let world = WorldOverview::new(&cart);
        assert_eq!(world.preview[0], 3);
    }
}
