//! Persisted gamepad keymap: a fixed-size button-to-scancode table stored
//! verbatim as `keymap.dat` in the app folder. Read whole or not at all;
//! a short or missing file leaves the defaults.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Two gamepads × eight buttons, two bytes per binding.
pub const KEYMAP_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    data: [u8; KEYMAP_SIZE],
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            data: [0; KEYMAP_SIZE],
        }
    }
}

impl Keymap {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn load_from(path: &Path) -> Self {
        let mut keymap = Self::default();
        match fs::read(path) {
            Ok(bytes) if bytes.len() == KEYMAP_SIZE => {
                keymap.data.copy_from_slice(&bytes);
                debug!(target: "studio.keymap", path = %path.display(), "keymap loaded");
            }
            Ok(bytes) => {
                warn!(target: "studio.keymap", len = bytes.len(), expected = KEYMAP_SIZE, "keymap size mismatch, defaults kept");
            }
            Err(_) => {}
        }
        keymap
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keymap.dat");
        let mut keymap = Keymap::default();
        keymap.data[3] = 42;
        keymap.save_to(&path).unwrap();
        assert_eq!(Keymap::load_from(&path), keymap);
    }

    #[test]
    fn wrong_size_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keymap.dat");
        std::fs::write(&path, [1, 2, 3]).unwrap();
        assert_eq!(Keymap::load_from(&path), Keymap::default());
    }
}
