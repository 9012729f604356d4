//! Text-buffer semantics for the code region.
//!
//! The buffer itself lives in the cartridge (`glint_cart::CodeRegion`, a
//! NUL-terminated byte array); this crate owns the cursor model and every
//! structural edit. Positions are byte indices into the live text, the
//! selection anchor is `Option<usize>` spanning `[min(anchor, cursor),
//! max(anchor, cursor))`, and `column` carries the visual column across
//! vertical motion so up/down keep their intent over short lines.
//!
//! Every mutation here preserves the region invariants: the text never grows
//! past capacity (at-capacity inserts silently refuse) and all bytes past
//! the terminator stay zero. None of these functions commit history; the
//! code editor decides what constitutes one undoable edit.

use glint_cart::{CODE_SIZE, CodeRegion};

pub mod edit;
pub mod motion;
pub mod search;

pub use edit::*;
pub use motion::*;
pub use search::*;

/// Cursor, selection anchor, and remembered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextCursor {
    pub position: usize,
    pub anchor: Option<usize>,
    pub column: usize,
}

impl TextCursor {
    /// Normalized selection span, `None` when absent or zero-width.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.position {
            return None;
        }
        Some((anchor.min(self.position), anchor.max(self.position)))
    }

    /// Recompute the remembered column from the current position.
    pub fn sync_column(&mut self, code: &CodeRegion) {
        self.column = self.position - line_start(code, self.position);
    }

    /// Byte serialization for the parallel cursor history (position,
    /// anchor + 1, column as little-endian u32s; anchor 0 means none).
    pub const PACKED_BYTES: usize = 12;

    pub fn pack(&self) -> [u8; Self::PACKED_BYTES] {
        let mut out = [0u8; Self::PACKED_BYTES];
        out[..4].copy_from_slice(&(self.position as u32).to_le_bytes());
        let anchor = self.anchor.map(|a| a as u32 + 1).unwrap_or(0);
        out[4..8].copy_from_slice(&anchor.to_le_bytes());
        out[8..].copy_from_slice(&(self.column as u32).to_le_bytes());
        out
    }

    pub fn unpack(bytes: &[u8]) -> Self {
        let word = |i: usize| {
            u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]) as usize
        };
        let anchor = word(4);
        Self {
            position: word(0),
            anchor: (anchor > 0).then(|| anchor - 1),
            column: word(8),
        }
    }

    /// Clamp into the live text after an external change (undo, load).
    pub fn clamp(&mut self, code: &CodeRegion) {
        let len = code.len();
        self.position = self.position.min(len);
        if let Some(anchor) = self.anchor {
            self.anchor = Some(anchor.min(len));
        }
    }
}

/// Maximum text length: one byte is always reserved for the terminator.
pub const TEXT_CAPACITY: usize = CODE_SIZE - 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_normalizes_and_drops_zero_width() {
        let mut cursor = TextCursor {
            position: 3,
            anchor: Some(7),
            column: 0,
        };
        assert_eq!(cursor.selection(), Some((3, 7)));
        cursor.anchor = Some(3);
        assert_eq!(cursor.selection(), None);
        cursor.anchor = None;
        assert_eq!(cursor.selection(), None);
    }

    #[test]
    fn cursor_pack_round_trip() {
        let cursor = TextCursor {
            position: 123,
            anchor: Some(0),
            column: 9,
        };
        assert_eq!(TextCursor::unpack(&cursor.pack()), cursor);
        let no_anchor = TextCursor {
            position: 5,
            anchor: None,
            column: 5,
        };
        assert_eq!(TextCursor::unpack(&no_anchor.pack()), no_anchor);
    }
}
