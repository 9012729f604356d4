//! Coalesced per-frame input.
//!
//! The platform layer polls its event queue and hands the studio one
//! `InputFrame` per tick: the set of held keys, the mouse state, and the
//! characters typed since the last frame. `Input` turns that into the
//! edge-triggered view the editors consume — pressed/released transitions,
//! and keyboard auto-repeat (initial delay then a fixed period) matching
//! the feel of the original studio.

use std::collections::HashSet;

/// Frames a key must stay down before auto-repeat starts.
pub const KEY_REPEAT_HOLD: u32 = 20;
/// Frames between repeats once auto-repeat is active.
pub const KEY_REPEAT_PERIOD: u32 = 3;

/// Physical keys the studio cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,
    Up, Down, Left, Right,
    Home, End, PageUp, PageDown,
    Return, Escape, Backspace, Delete, Tab, Space,
    Shift, Ctrl, Alt,
    Minus, Equals, Slash, Grave, Comma, Period,
    LeftBracket, RightBracket,
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Raw per-frame state delivered by the platform layer.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub keys: Vec<Key>,
    pub mouse_x: i32,
    pub mouse_y: i32,
    pub left: bool,
    pub right: bool,
    pub middle: bool,
    /// Wheel detents this frame; positive scrolls up.
    pub scroll: i32,
    /// Characters typed this frame (already layout-translated).
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    down: bool,
    pressed: bool,
    released: bool,
}

/// Processed snapshot; rebuilt by `begin_frame` once per tick.
#[derive(Default)]
pub struct Input {
    held: HashSet<Key>,
    previous: HashSet<Key>,
    hold_frames: std::collections::HashMap<Key, u32>,
    mouse_x: i32,
    mouse_y: i32,
    buttons: [ButtonState; 3],
    scroll: i32,
    text: String,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self, frame: &InputFrame) {
        self.previous = std::mem::take(&mut self.held);
        self.held = frame.keys.iter().copied().collect();

        self.hold_frames.retain(|key, _| self.held.contains(key));
        for &key in &self.held {
            *self.hold_frames.entry(key).or_insert(0) += 1;
        }

        let down = [frame.left, frame.right, frame.middle];
        for (state, &now) in self.buttons.iter_mut().zip(down.iter()) {
            state.pressed = now && !state.down;
            state.released = !now && state.down;
            state.down = now;
        }

        self.mouse_x = frame.mouse_x;
        self.mouse_y = frame.mouse_y;
        self.scroll = frame.scroll;
        self.text = frame.text.clone();
    }

    /// Abort edge state mid-frame; mode switches call this so a gesture
    /// never leaks into the next editor.
    pub fn cancel_edges(&mut self) {
        for state in &mut self.buttons {
            state.pressed = false;
            state.released = false;
        }
        self.scroll = 0;
        self.text.clear();
    }

    pub fn key(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Edge trigger with auto-repeat: fires on the initial press, then every
    /// `KEY_REPEAT_PERIOD` frames after `KEY_REPEAT_HOLD` frames of hold.
    pub fn key_pressed(&self, key: Key) -> bool {
        if !self.held.contains(&key) {
            return false;
        }
        if !self.previous.contains(&key) {
            return true;
        }
        let frames = self.hold_frames.get(&key).copied().unwrap_or(0);
        frames > KEY_REPEAT_HOLD && (frames - KEY_REPEAT_HOLD) % KEY_REPEAT_PERIOD == 0
    }

    /// Edge trigger without repeat.
    pub fn key_pressed_once(&self, key: Key) -> bool {
        self.held.contains(&key) && !self.previous.contains(&key)
    }

    pub fn any_key_down(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn shift(&self) -> bool {
        self.key(Key::Shift)
    }

    pub fn ctrl(&self) -> bool {
        self.key(Key::Ctrl)
    }

    pub fn alt(&self) -> bool {
        self.key(Key::Alt)
    }

    pub fn mouse_pos(&self) -> (i32, i32) {
        (self.mouse_x, self.mouse_y)
    }

    fn button(&self, button: MouseButton) -> &ButtonState {
        &self.buttons[button as usize]
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.button(button).down
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.button(button).pressed
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.button(button).released
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    /// Characters typed this frame, suppressed while Ctrl or Alt chords are
    /// held so shortcuts never leak printable input.
    pub fn text(&self) -> &str {
        if self.ctrl() || self.alt() { "" } else { &self.text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(keys: &[Key]) -> InputFrame {
        InputFrame {
            keys: keys.to_vec(),
            ..InputFrame::default()
        }
    }

    #[test]
    fn initial_press_fires_once_then_repeats_after_hold() {
        let mut input = Input::new();
        input.begin_frame(&frame(&[Key::Down]));
        assert!(input.key_pressed(Key::Down));
        input.begin_frame(&frame(&[Key::Down]));
        assert!(!input.key_pressed(Key::Down), "no repeat before the hold");

        let mut fired = 0;
        for _ in 0..KEY_REPEAT_HOLD + KEY_REPEAT_PERIOD * 3 {
            input.begin_frame(&frame(&[Key::Down]));
            if input.key_pressed(Key::Down) {
                fired += 1;
            }
        }
        assert!(fired >= 3, "auto-repeat kicked in ({fired})");
    }

    #[test]
    fn release_resets_repeat() {
        let mut input = Input::new();
        for _ in 0..30 {
            input.begin_frame(&frame(&[Key::A]));
        }
        input.begin_frame(&frame(&[]));
        assert!(!input.key_pressed(Key::A));
        input.begin_frame(&frame(&[Key::A]));
        assert!(input.key_pressed_once(Key::A));
    }

    #[test]
    fn mouse_edges() {
        let mut input = Input::new();
        let mut f = frame(&[]);
        f.left = true;
        input.begin_frame(&f);
        assert!(input.mouse_pressed(MouseButton::Left));
        input.begin_frame(&f);
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_down(MouseButton::Left));
        input.begin_frame(&frame(&[]));
        assert!(input.mouse_released(MouseButton::Left));
    }

    #[test]
    fn chords_suppress_text() {
        let mut input = Input::new();
        let mut f = frame(&[Key::Ctrl]);
        f.text = "r".into();
        input.begin_frame(&f);
        assert_eq!(input.text(), "");
        let mut f = frame(&[]);
        f.text = "r".into();
        input.begin_frame(&f);
        assert_eq!(input.text(), "r");
    }
}
