//! Binary cartridge container.
//!
//! A cart file is a sequence of typed chunks. Each chunk header is four
//! bytes: `tag:5 | bank:3`, a little-endian 16-bit payload size, and one
//! reserved byte. Loading zero-initializes the cartridge, then copies
//! `min(size, region capacity)` bytes per chunk; unknown tags are skipped.
//! Saving emits one chunk per non-empty region in tag order and closes the
//! stream with a zero-length `default` tag.

use crate::sfx::SFX_BYTES;
use crate::{
    BANK_TILES, CODE_SIZE, COVER_BYTES, Cartridge, MAP_BYTES, PALETTE_BYTES, TILE_BYTES,
    Waveforms, music,
};
use thiserror::Error;
use tracing::debug;

const HEADER_BYTES: usize = 4;
const BANK_BYTES: usize = BANK_TILES * TILE_BYTES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkTag {
    Tiles = 1,
    Sprites = 2,
    Cover = 3,
    Map = 4,
    Code = 5,
    Flags = 6,
    Samples = 9,
    Waveform = 10,
    Palette = 12,
    Music = 14,
    Patterns = 15,
    Default = 17,
}

impl ChunkTag {
    fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            1 => Self::Tiles,
            2 => Self::Sprites,
            3 => Self::Cover,
            4 => Self::Map,
            5 => Self::Code,
            6 => Self::Flags,
            9 => Self::Samples,
            10 => Self::Waveform,
            12 => Self::Palette,
            14 => Self::Music,
            15 => Self::Patterns,
            17 => Self::Default,
            _ => return None,
        })
    }
}

#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("cart stream truncated inside a chunk ({need} bytes missing)")]
    Truncated { need: usize },
}

fn push_chunk(out: &mut Vec<u8>, tag: ChunkTag, payload: &[u8]) {
    debug_assert!(payload.len() <= u16::MAX as usize);
    out.push(tag as u8);
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    out.push(0);
    out.extend_from_slice(payload);
}

/// Serialize the cartridge. Empty regions (all bytes at their default value)
/// are omitted; loading an omitted region leaves the zero-initialized
/// default in place, so save→load→save is byte-stable.
pub fn save(cart: &Cartridge) -> Vec<u8> {
    let mut out = Vec::new();

    let tiles = cart.tiles.as_bytes();
    let (bank0, bank1) = tiles.split_at(BANK_BYTES);
    if bank0.iter().any(|&b| b != 0) {
        push_chunk(&mut out, ChunkTag::Tiles, bank0);
    }
    if bank1.iter().any(|&b| b != 0) {
        push_chunk(&mut out, ChunkTag::Sprites, bank1);
    }
    if cart.cover.present {
        push_chunk(&mut out, ChunkTag::Cover, cart.cover.as_bytes());
    }
    if cart.map.as_bytes().iter().any(|&b| b != 0) {
        push_chunk(&mut out, ChunkTag::Map, cart.map.as_bytes());
    }
    if !cart.code.is_empty() {
        push_chunk(&mut out, ChunkTag::Code, cart.code.text());
    }
    if cart.sfx.samples.iter().any(|s| !s.is_default()) {
        push_chunk(&mut out, ChunkTag::Samples, &cart.sfx.to_bytes());
    }
    if cart.waveforms.as_bytes().iter().any(|&b| b != 0) {
        push_chunk(&mut out, ChunkTag::Waveform, cart.waveforms.as_bytes());
    }
    if cart.palette.as_bytes().iter().any(|&b| b != 0) {
        push_chunk(&mut out, ChunkTag::Palette, cart.palette.as_bytes());
    }
    if cart.music.tracks.iter().any(|t| *t != music::Track::default()) {
        push_chunk(&mut out, ChunkTag::Music, &cart.music.tracks_to_bytes());
    }
    if cart.music.patterns.iter().any(|p| !p.is_empty()) {
        push_chunk(&mut out, ChunkTag::Patterns, &cart.music.patterns_to_bytes());
    }

    push_chunk(&mut out, ChunkTag::Default, &[]);
    out
}

/// Parse a cart stream into a fresh cartridge.
pub fn load(data: &[u8]) -> Result<Cartridge, ChunkError> {
    let mut cart = Cartridge::default();
    let mut pos = 0;

    while pos + HEADER_BYTES <= data.len() {
        let tag_bits = data[pos] & 0x1F;
        let bank = data[pos] >> 5;
        let size = u16::from_le_bytes([data[pos + 1], data[pos + 2]]) as usize;
        pos += HEADER_BYTES;

        if pos + size > data.len() {
            return Err(ChunkError::Truncated {
                need: pos + size - data.len(),
            });
        }
        let payload = &data[pos..pos + size];
        pos += size;

        let Some(tag) = ChunkTag::from_bits(tag_bits) else {
            debug!(target: "cart.chunk", tag = tag_bits, size, "unknown chunk skipped");
            continue;
        };

        match tag {
            ChunkTag::Default => break,
            ChunkTag::Tiles => {
                let n = payload.len().min(BANK_BYTES);
                cart.tiles.as_bytes_mut()[..n].copy_from_slice(&payload[..n]);
            }
            ChunkTag::Sprites => {
                let n = payload.len().min(BANK_BYTES);
                cart.tiles.as_bytes_mut()[BANK_BYTES..BANK_BYTES + n]
                    .copy_from_slice(&payload[..n]);
            }
            ChunkTag::Cover => cart.cover.load_bytes(&payload[..payload.len().min(COVER_BYTES)]),
            ChunkTag::Map => cart.map.load_bytes(&payload[..payload.len().min(MAP_BYTES)]),
            ChunkTag::Code => {
                let n = payload.len().min(CODE_SIZE - 1);
                cart.code.load_bytes(&payload[..n]);
            }
            // Sprite flags are not part of this cart model; recognized so
            // foreign carts load, but dropped.
            ChunkTag::Flags => {}
            ChunkTag::Samples => cart.sfx.load_bytes(&payload[..payload.len().min(SFX_BYTES)]),
            ChunkTag::Waveform => {
                cart.waveforms
                    .load_bytes(&payload[..payload.len().min(Waveforms::BYTES)]);
            }
            ChunkTag::Palette => {
                cart.palette
                    .load_bytes(&payload[..payload.len().min(PALETTE_BYTES)]);
            }
            ChunkTag::Music => cart.music.load_tracks(payload),
            ChunkTag::Patterns => cart.music.load_patterns(payload),
        }
        let _ = bank;
    }

    Ok(cart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgb;

    fn populated_cart() -> Cartridge {
        let mut cart = Cartridge::default();
        cart.tiles.as_bytes_mut()[0] = 0x21;
        cart.tiles.as_bytes_mut()[BANK_BYTES + 5] = 0x0F;
        cart.map.set(10, 20, 33);
        cart.palette.set(1, Rgb { r: 1, g: 2, b: 3 });
        cart.code.load_text("-- hello\nprint(1)");
        cart.sfx.sample_mut(3).ticks[0].volume = 12;
        cart.waveforms.set_sample(2, 7, 0x9);
        cart.music.patterns[0].rows[0].note = music::NOTE_BASE;
        cart.music.tracks[0].tempo = 140;
        cart
    }

    #[test]
    fn save_load_round_trips() {
        let cart = populated_cart();
        let bytes = save(&cart);
        let loaded = load(&bytes).unwrap();
        assert_eq!(save(&loaded), bytes, "save -> load -> save is byte-stable");
        assert_eq!(loaded.code.text(), cart.code.text());
        assert_eq!(loaded.map.get(10, 20), 33);
        assert_eq!(loaded.tiles.as_bytes(), cart.tiles.as_bytes());
    }

    #[test]
    fn empty_cart_is_just_the_trailer() {
        let bytes = save(&Cartridge::default());
        assert_eq!(bytes.len(), HEADER_BYTES);
        assert_eq!(bytes[0], ChunkTag::Default as u8);
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut bytes = Vec::new();
        // Tag 7 is unused; 2-byte payload.
        bytes.extend_from_slice(&[7, 2, 0, 0, 0xAA, 0xBB]);
        push_chunk(&mut bytes, ChunkTag::Map, &[9]);
        push_chunk(&mut bytes, ChunkTag::Default, &[]);
        let cart = load(&bytes).unwrap();
        assert_eq!(cart.map.get(0, 0), 9);
    }

    #[test]
    fn truncated_chunk_is_an_error() {
        let bytes = vec![ChunkTag::Map as u8, 10, 0, 0, 1, 2];
        assert!(load(&bytes).is_err());
    }

    #[test]
    fn oversized_chunk_clamps_to_region() {
        let mut bytes = Vec::new();
        let big = vec![7u8; PALETTE_BYTES + 100];
        push_chunk(&mut bytes, ChunkTag::Palette, &big);
        push_chunk(&mut bytes, ChunkTag::Default, &[]);
        let cart = load(&bytes).unwrap();
        assert_eq!(cart.palette.as_bytes(), &[7u8; PALETTE_BYTES][..]);
    }
}
