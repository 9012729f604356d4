//! External collaborator interfaces.
//!
//! The studio core never talks to a window, an audio device, or the network
//! directly. The platform layer implements `HostSystem`; the cartridge VM
//! implements `SoundEngine`. Long operations (HTTP) follow a request/poll
//! shape so results arrive on a later tick — the core has no suspension
//! points.
//!
//! `NullHost`/`NullSound` are complete in-memory stand-ins used by the
//! headless binary and the test suites.

use std::path::Path;
use tracing::debug;

/// Playback position of the music engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MusicPos {
    pub track: i32,
    pub frame: i32,
    pub row: i32,
}

/// Audio side of the VM as seen by the sfx and music editors.
pub trait SoundEngine {
    /// Start a sound on `channel`; `duration` is in ticks, −1 for held.
    fn play_sfx(&mut self, index: i32, note: u8, octave: u8, duration: i32, channel: usize);
    fn stop_sfx(&mut self, channel: usize);
    /// Envelope tick (0..30) currently emitted on `channel`, when audible.
    fn sfx_pos(&self, channel: usize) -> Option<u8>;

    fn play_music(&mut self, track: i32, frame: i32, row: i32, repeat: bool);
    fn stop_music(&mut self);
    fn music_pos(&self) -> Option<MusicPos>;

    /// Muted channels have their volume register zeroed every frame.
    fn set_channel_mute(&mut self, channel: usize, mute: bool);

    /// Pause/reset hooks driven by studio mode changes.
    fn pause(&mut self);
    fn resume(&mut self);
    fn reset(&mut self);
}

/// Result of a completed asynchronous URL fetch.
pub type UrlResult = Result<Vec<u8>, String>;

/// Platform services. Every call is synchronous and non-blocking; anything
/// slow is split into request/poll pairs resolved on later ticks.
pub trait HostSystem {
    fn clipboard_get(&mut self) -> Option<String>;
    fn clipboard_has(&self) -> bool;
    fn clipboard_set(&mut self, text: &str);

    fn counter(&self) -> u64;
    fn counter_freq(&self) -> u64;

    fn fullscreen_toggle(&mut self);
    fn set_window_title(&mut self, title: &str);
    fn open_path(&mut self, path: &Path);
    fn message_box(&mut self, title: &str, message: &str);
    fn preseed_rng(&mut self);

    /// Begin a fetch; the id pairs it with a later `poll_url` result.
    fn request_url(&mut self, url: &str) -> u32;
    /// Completed fetches, delivered at most once each.
    fn poll_url(&mut self) -> Option<(u32, UrlResult)>;

    /// Modal load dialog: `(file name, contents)` or `None` on cancel.
    fn file_dialog_load(&mut self) -> Option<(String, Vec<u8>)>;
    /// Modal save dialog; false on cancel.
    fn file_dialog_save(&mut self, name: &str, data: &[u8]) -> bool;
}

/// In-memory host: a clipboard string, a monotonic counter, and recorded
/// message boxes. Dialogs always cancel; URL requests resolve as errors on
/// the next poll.
#[derive(Default)]
pub struct NullHost {
    clipboard: Option<String>,
    ticks: u64,
    pending: Vec<u32>,
    next_request: u32,
    pub messages: Vec<(String, String)>,
    pub fullscreen: bool,
    pub title: String,
}

impl NullHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The headless loop bumps this once per frame.
    pub fn advance(&mut self) {
        self.ticks += 1;
    }
}

impl HostSystem for NullHost {
    fn clipboard_get(&mut self) -> Option<String> {
        self.clipboard.clone()
    }

    fn clipboard_has(&self) -> bool {
        self.clipboard.is_some()
    }

    fn clipboard_set(&mut self, text: &str) {
        self.clipboard = Some(text.to_string());
    }

    fn counter(&self) -> u64 {
        self.ticks
    }

    fn counter_freq(&self) -> u64 {
        60
    }

    fn fullscreen_toggle(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    fn set_window_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn open_path(&mut self, path: &Path) {
        debug!(target: "host", path = %path.display(), "open_path ignored");
    }

    fn message_box(&mut self, title: &str, message: &str) {
        self.messages.push((title.to_string(), message.to_string()));
    }

    fn preseed_rng(&mut self) {}

    fn request_url(&mut self, url: &str) -> u32 {
        debug!(target: "host", url, "url fetch without a network backend");
        let id = self.next_request;
        self.next_request += 1;
        self.pending.push(id);
        id
    }

    fn poll_url(&mut self) -> Option<(u32, UrlResult)> {
        self.pending
            .pop()
            .map(|id| (id, Err("no network backend".to_string())))
    }

    fn file_dialog_load(&mut self) -> Option<(String, Vec<u8>)> {
        None
    }

    fn file_dialog_save(&mut self, _name: &str, _data: &[u8]) -> bool {
        false
    }
}

/// Deterministic sound stand-in. Playback advances one envelope tick and
/// one music row per `advance` call, which is enough for the editors'
/// playhead and follow-mode logic to be exercised headlessly.
#[derive(Default)]
pub struct NullSound {
    sfx: [Option<(i32, u8)>; 4],
    music: Option<MusicPos>,
    music_repeat: bool,
    pub muted: [bool; 4],
    paused: bool,
    rows_per_frame: i32,
    frames_per_track: i32,
}

impl NullSound {
    pub fn new() -> Self {
        Self {
            rows_per_frame: 64,
            frames_per_track: 16,
            ..Self::default()
        }
    }

    /// Step playback state by one frame.
    pub fn advance(&mut self) {
        if self.paused {
            return;
        }
        for slot in self.sfx.iter_mut() {
            if let Some((_, pos)) = slot {
                *pos = (*pos + 1) % 30;
            }
        }
        if let Some(pos) = &mut self.music {
            pos.row += 1;
            if pos.row >= self.rows_per_frame {
                pos.row = 0;
                pos.frame += 1;
                if pos.frame >= self.frames_per_track {
                    if self.music_repeat {
                        pos.frame = 0;
                    } else {
                        self.music = None;
                    }
                }
            }
        }
    }
}

impl SoundEngine for NullSound {
    fn play_sfx(&mut self, index: i32, _note: u8, _octave: u8, _duration: i32, channel: usize) {
        if channel < self.sfx.len() {
            self.sfx[channel] = Some((index, 0));
        }
    }

    fn stop_sfx(&mut self, channel: usize) {
        if channel < self.sfx.len() {
            self.sfx[channel] = None;
        }
    }

    fn sfx_pos(&self, channel: usize) -> Option<u8> {
        self.sfx.get(channel).and_then(|s| s.map(|(_, pos)| pos))
    }

    fn play_music(&mut self, track: i32, frame: i32, row: i32, repeat: bool) {
        self.music = Some(MusicPos { track, frame, row });
        self.music_repeat = repeat;
    }

    fn stop_music(&mut self) {
        self.music = None;
    }

    fn music_pos(&self) -> Option<MusicPos> {
        self.music
    }

    fn set_channel_mute(&mut self, channel: usize, mute: bool) {
        if channel < self.muted.len() {
            self.muted[channel] = mute;
        }
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sound_advances_music_rows() {
        let mut sound = NullSound::new();
        sound.play_music(0, 0, 0, true);
        for _ in 0..8 {
            sound.advance();
        }
        assert_eq!(
            sound.music_pos(),
            Some(MusicPos {
                track: 0,
                frame: 0,
                row: 8
            })
        );
    }

    #[test]
    fn null_sound_wraps_frames_when_repeating() {
        let mut sound = NullSound::new();
        sound.play_music(0, 15, 63, true);
        sound.advance();
        let pos = sound.music_pos().unwrap();
        assert_eq!((pos.frame, pos.row), (0, 0));
    }

    #[test]
    fn null_host_clipboard_round_trip() {
        let mut host = NullHost::new();
        assert!(!host.clipboard_has());
        host.clipboard_set("abc");
        assert_eq!(host.clipboard_get().as_deref(), Some("abc"));
    }
}
