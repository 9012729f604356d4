//! Structural edits over the code region.
//!
//! The primitives `insert_bytes`/`remove_bytes` shift the tail and re-zero
//! the vacated bytes, so the C-string invariant holds after every call.
//! Capacity refusals are silent: the mutators return `false` and leave the
//! buffer untouched.

use crate::motion::{line_size, line_start, next_line_start};
use crate::{TEXT_CAPACITY, TextCursor};
use glint_cart::CodeRegion;
use tracing::trace;

/// Insert raw bytes at `at`. Refuses (and returns false) when the resulting
/// text would not fit.
pub fn insert_bytes(code: &mut CodeRegion, at: usize, bytes: &[u8]) -> bool {
    let len = code.len();
    let at = at.min(len);
    if len + bytes.len() > TEXT_CAPACITY {
        trace!(target: "editor.code", need = bytes.len(), len, "insert refused at capacity");
        return false;
    }
    let data = code.as_bytes_mut();
    data.copy_within(at..len, at + bytes.len());
    data[at..at + bytes.len()].copy_from_slice(bytes);
    data[len + bytes.len()] = 0;
    true
}

/// Remove `[from, to)`, shifting the tail left and zero-filling the gap.
pub fn remove_bytes(code: &mut CodeRegion, from: usize, to: usize) {
    let len = code.len();
    let from = from.min(len);
    let to = to.clamp(from, len);
    let data = code.as_bytes_mut();
    data.copy_within(to..len, from);
    data[len - (to - from)..].fill(0);
}

/// Collapse the selection, placing the cursor at its start. Returns whether
/// anything was deleted.
pub fn replace_selection(code: &mut CodeRegion, cursor: &mut TextCursor) -> bool {
    let Some((start, end)) = cursor.selection() else {
        cursor.anchor = None;
        return false;
    };
    remove_bytes(code, start, end);
    cursor.position = start;
    cursor.anchor = None;
    cursor.sync_column(code);
    true
}

/// Type one character: a live selection is deleted first, then the byte is
/// inserted at the cursor.
pub fn insert_char(code: &mut CodeRegion, cursor: &mut TextCursor, ch: u8) -> bool {
    replace_selection(code, cursor);
    insert_char_raw(code, cursor, ch)
}

/// Insert without touching the selection (used by Tab's literal form).
pub fn insert_char_raw(code: &mut CodeRegion, cursor: &mut TextCursor, ch: u8) -> bool {
    if !insert_bytes(code, cursor.position, &[ch]) {
        return false;
    }
    cursor.position += 1;
    cursor.sync_column(code);
    true
}

/// Newline with auto-indent: the leading whitespace of the current line is
/// carried onto the new line, but never past the cursor's original column.
pub fn newline(code: &mut CodeRegion, cursor: &mut TextCursor) {
    if replace_selection(code, cursor) {
        return;
    }
    let start = line_start(code, cursor.position);
    let text = code.text();
    let mut indent: Vec<u8> = text[start..]
        .iter()
        .take_while(|&&b| b == b'\t' || b == b' ')
        .copied()
        .collect();
    indent.truncate(cursor.position.saturating_sub(start));
    if !insert_char(code, cursor, b'\n') {
        return;
    }
    for &b in &indent {
        if !insert_char(code, cursor, b) {
            break;
        }
    }
}

pub fn delete_char(code: &mut CodeRegion, cursor: &mut TextCursor) {
    if !replace_selection(code, cursor) && cursor.position < code.len() {
        remove_bytes(code, cursor.position, cursor.position + 1);
        cursor.sync_column(code);
    }
}

pub fn backspace_char(code: &mut CodeRegion, cursor: &mut TextCursor) {
    if !replace_selection(code, cursor) && cursor.position > 0 {
        cursor.position -= 1;
        remove_bytes(code, cursor.position, cursor.position + 1);
        cursor.sync_column(code);
    }
}

/// Tab family. The plain key with no anchor inserts a literal tab; with an
/// anchor (even zero-width) or a modifier it operates per covered line:
/// indent prepends one tab, outdent strips one leading tab-or-space.
/// Cursor and anchor track the post-edit extents. Returns whether any line
/// changed.
pub fn tab_block(
    code: &mut CodeRegion,
    cursor: &mut TextCursor,
    shift: bool,
    ctrl: bool,
) -> bool {
    let block_form = cursor.anchor.is_some() || shift || ctrl;
    if !block_form {
        return insert_char_raw(code, cursor, b'\t');
    }

    let (sel_start, sel_end) = match cursor.selection() {
        Some(span) => span,
        None => (cursor.position, cursor.position),
    };
    let had_selection = cursor.selection().is_some() || cursor.anchor.is_some();

    let mut start = line_start(code, sel_start);
    let first = start;
    let mut end = sel_end;
    let mut changed = false;

    loop {
        if shift {
            let text = code.text();
            if start < text.len() && (text[start] == b'\t' || text[start] == b' ') {
                remove_bytes(code, start, start + 1);
                end = end.saturating_sub(1);
                changed = true;
            }
        } else if insert_bytes(code, start, b"\t") {
            end += 1;
            changed = true;
        }
        let next = next_line_start(code, start);
        if next >= end || next >= code.len() {
            break;
        }
        start = next;
    }

    if changed {
        if had_selection {
            cursor.position = first;
            cursor.anchor = Some(end);
        } else {
            cursor.position = end.max(first);
        }
        cursor.sync_column(code);
    }
    changed
}

/// Toggle the script's line-comment prefix on the current line. Prepending
/// refuses at capacity; the cursor shifts with the edit when it sits past
/// the insertion point. Applying twice restores the line verbatim.
pub fn toggle_comment(code: &mut CodeRegion, cursor: &mut TextCursor, prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let start = line_start(code, cursor.position);
    let end = start + line_size(code, start);
    let text = code.text();
    let mut site = start;
    while site < end && (text[site] == b' ' || text[site] == b'\t') {
        site += 1;
    }

    if text[site..end.min(text.len())].starts_with(prefix) {
        remove_bytes(code, site, site + prefix.len());
        if cursor.position > site + prefix.len() {
            cursor.position -= prefix.len();
        } else if cursor.position > site {
            cursor.position = site;
        }
    } else {
        if !insert_bytes(code, site, prefix) {
            return false;
        }
        if cursor.position > site {
            cursor.position += prefix.len();
        }
    }
    cursor.anchor = None;
    cursor.sync_column(code);
    true
}

pub fn select_all(code: &CodeRegion, cursor: &mut TextCursor) {
    cursor.anchor = Some(0);
    cursor.position = code.len();
    cursor.sync_column(code);
}

/// Paste: selection replaced, incoming text CR-stripped and clamped so the
/// total stays within capacity. Returns whether any byte landed.
pub fn insert_text(code: &mut CodeRegion, cursor: &mut TextCursor, text: &str) -> bool {
    let clean: Vec<u8> = text.bytes().filter(|&b| b != b'\r').collect();
    if clean.is_empty() {
        return false;
    }
    replace_selection(code, cursor);
    let room = TEXT_CAPACITY - code.len();
    let take = clean.len().min(room);
    if take == 0 {
        return false;
    }
    let ok = insert_bytes(code, cursor.position, &clean[..take]);
    if ok {
        cursor.position += take;
        cursor.sync_column(code);
    }
    ok
}

/// Text to copy: the selection when present, otherwise the whole current
/// line including its newline.
pub fn copy_text(code: &CodeRegion, cursor: &TextCursor) -> String {
    let (start, end) = match cursor.selection() {
        Some(span) => span,
        None => (
            line_start(code, cursor.position),
            next_line_start(code, cursor.position),
        ),
    };
    String::from_utf8_lossy(&code.text()[start..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str) -> CodeRegion {
        let mut code = CodeRegion::default();
        code.load_text(text);
        code
    }

    #[test]
    fn insert_shifts_tail_and_keeps_zero_fill() {
        let mut code = region("ac");
        assert!(insert_bytes(&mut code, 1, b"b"));
        assert_eq!(code.text(), b"abc");
        assert!(code.as_bytes()[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn insert_refuses_at_capacity() {
        let mut code = CodeRegion::default();
        code.load_text(&"x".repeat(TEXT_CAPACITY));
        assert!(!insert_bytes(&mut code, 0, b"y"));
        assert_eq!(code.len(), TEXT_CAPACITY);
        assert_eq!(code.text()[0], b'x');
    }

    #[test]
    fn typing_replaces_selection_first() {
        let mut code = region("hello");
        let mut cursor = TextCursor {
            position: 4,
            anchor: Some(1),
            column: 0,
        };
        assert!(insert_char(&mut code, &mut cursor, b'!'));
        assert_eq!(code.text(), b"h!o");
        assert_eq!(cursor.position, 2);
        assert_eq!(cursor.anchor, None);
    }

    #[test]
    fn newline_carries_indent_up_to_cursor_column() {
        let mut code = region("\t\tabc");
        let mut cursor = TextCursor {
            position: 5,
            anchor: None,
            column: 5,
        };
        newline(&mut code, &mut cursor);
        assert_eq!(code.text(), b"\t\tabc\n\t\t");

        // Cursor inside the indent run copies only what precedes it.
        let mut code = region("\t\tabc");
        let mut cursor = TextCursor {
            position: 1,
            anchor: None,
            column: 1,
        };
        newline(&mut code, &mut cursor);
        assert_eq!(code.text(), b"\t\n\t\tabc");
    }

    #[test]
    fn backspace_joins_lines() {
        let mut code = region("a\nb");
        let mut cursor = TextCursor {
            position: 2,
            anchor: None,
            column: 0,
        };
        backspace_char(&mut code, &mut cursor);
        assert_eq!(code.text(), b"ab");
        assert_eq!(cursor.position, 1);
    }

    #[test]
    fn tab_indents_every_selected_line_and_shift_undoes_it() {
        let mut code = region("a\nb\nc");
        let mut cursor = TextCursor {
            position: 5,
            anchor: Some(0),
            column: 0,
        };
        assert!(tab_block(&mut code, &mut cursor, false, false));
        assert_eq!(code.text(), b"\ta\n\tb\n\tc");
        assert!(tab_block(&mut code, &mut cursor, true, false));
        assert_eq!(code.text(), b"a\nb\nc");
    }

    #[test]
    fn plain_tab_without_anchor_is_literal() {
        let mut code = region("ab");
        let mut cursor = TextCursor {
            position: 1,
            anchor: None,
            column: 1,
        };
        tab_block(&mut code, &mut cursor, false, false);
        assert_eq!(code.text(), b"a\tb");
        assert_eq!(cursor.position, 2);
    }

    #[test]
    fn zero_width_anchor_indents_its_line() {
        let mut code = region("ab");
        let mut cursor = TextCursor {
            position: 1,
            anchor: Some(1),
            column: 1,
        };
        assert!(tab_block(&mut code, &mut cursor, false, false));
        assert_eq!(code.text(), b"\tab");
    }

    #[test]
    fn comment_toggle_is_involutive() {
        let mut code = region("  local x = 1");
        let mut cursor = TextCursor {
            position: 8,
            anchor: None,
            column: 8,
        };
        assert!(toggle_comment(&mut code, &mut cursor, b"-- "));
        assert_eq!(code.text(), b"  -- local x = 1");
        assert_eq!(cursor.position, 11, "cursor rides the inserted prefix");
        assert!(toggle_comment(&mut code, &mut cursor, b"-- "));
        assert_eq!(code.text(), b"  local x = 1");
        assert_eq!(cursor.position, 8);
    }

    #[test]
    fn paste_strips_cr_and_clamps() {
        let mut code = region("");
        let mut cursor = TextCursor::default();
        assert!(insert_text(&mut code, &mut cursor, "a\r\nb"));
        assert_eq!(code.text(), b"a\nb");

        let mut full = CodeRegion::default();
        full.load_text(&"x".repeat(TEXT_CAPACITY - 2));
        let mut cursor = TextCursor {
            position: TEXT_CAPACITY - 2,
            anchor: None,
            column: 0,
        };
        assert!(insert_text(&mut full, &mut cursor, "abcdef"));
        assert_eq!(full.len(), TEXT_CAPACITY, "clamped to capacity");
        assert_eq!(&full.text()[TEXT_CAPACITY - 2..], b"ab");
    }

    #[test]
    fn copy_without_selection_takes_the_line() {
        let code = region("one\ntwo\n");
        let cursor = TextCursor {
            position: 5,
            anchor: None,
            column: 1,
        };
        assert_eq!(copy_text(&code, &cursor), "two\n");
    }
}
