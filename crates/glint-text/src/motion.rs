//! Cursor motion over the NUL-terminated code text.
//!
//! All scans are bounded by the buffer endpoints; positions returned here
//! are always within `[0, len]`.

use crate::TextCursor;
use glint_cart::CodeRegion;

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Start-of-line byte index for the line containing `pos`.
pub fn line_start(code: &CodeRegion, pos: usize) -> usize {
    let text = code.text();
    let pos = pos.min(text.len());
    text[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Index one past the current line's `\n`, or `len` on the last line.
pub fn next_line_start(code: &CodeRegion, pos: usize) -> usize {
    let text = code.text();
    let pos = pos.min(text.len());
    text[pos..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| pos + i + 1)
        .unwrap_or(text.len())
}

/// Visible length of the line starting at `start` (excluding the newline).
pub fn line_size(code: &CodeRegion, start: usize) -> usize {
    let text = code.text();
    text[start.min(text.len())..]
        .iter()
        .take_while(|&&b| b != b'\n')
        .count()
}

/// Zero-based line count (a trailing newline opens one more line).
pub fn lines_count(code: &CodeRegion) -> usize {
    code.text().iter().filter(|&&b| b == b'\n').count()
}

/// (column, line) of a byte position.
pub fn cursor_xy(code: &CodeRegion, pos: usize) -> (usize, usize) {
    let start = line_start(code, pos);
    let line = code.text()[..start].iter().filter(|&&b| b == b'\n').count();
    (pos - start, line)
}

/// Byte position of (column, line), clamped to line ends and buffer end.
pub fn position_at(code: &CodeRegion, column: usize, line: usize) -> usize {
    let text = code.text();
    let mut start = 0;
    for _ in 0..line {
        match text[start..].iter().position(|&b| b == b'\n') {
            Some(i) => start += i + 1,
            None => break,
        }
    }
    start + column.min(line_size(code, start))
}

pub fn up_line(code: &CodeRegion, cursor: &mut TextCursor) {
    let start = line_start(code, cursor.position);
    if start == 0 {
        return;
    }
    let prev = line_start(code, start - 1);
    cursor.position = prev + cursor.column.min(line_size(code, prev));
}

pub fn down_line(code: &CodeRegion, cursor: &mut TextCursor) {
    // On the last line `next_line_start` returns `len`, whose line size is
    // zero, so down from the bottom lands on the buffer end.
    let next = next_line_start(code, cursor.position);
    cursor.position = next + cursor.column.min(line_size(code, next));
}

pub fn left_column(code: &CodeRegion, cursor: &mut TextCursor) {
    if cursor.position > 0 {
        cursor.position -= 1;
        cursor.sync_column(code);
    }
}

pub fn right_column(code: &CodeRegion, cursor: &mut TextCursor) {
    if cursor.position < code.len() {
        cursor.position += 1;
        cursor.sync_column(code);
    }
}

/// Hop to the start of the previous word run, or over a non-word run.
pub fn left_word(code: &CodeRegion, cursor: &mut TextCursor) {
    let text = code.text();
    if cursor.position == 0 {
        return;
    }
    let mut pos = cursor.position - 1;
    if pos < text.len() && is_word(text[pos]) {
        while pos > 0 && is_word(text[pos - 1]) {
            pos -= 1;
        }
    } else {
        while pos > 0 && !is_word(text[pos - 1]) {
            pos -= 1;
        }
    }
    cursor.position = pos;
    cursor.sync_column(code);
}

pub fn right_word(code: &CodeRegion, cursor: &mut TextCursor) {
    let text = code.text();
    let mut pos = cursor.position;
    if pos >= text.len() {
        return;
    }
    if is_word(text[pos]) {
        while pos < text.len() && is_word(text[pos]) {
            pos += 1;
        }
    } else {
        while pos < text.len() && !is_word(text[pos]) {
            pos += 1;
        }
    }
    cursor.position = pos;
    cursor.sync_column(code);
}

pub fn go_home(code: &CodeRegion, cursor: &mut TextCursor) {
    cursor.position = line_start(code, cursor.position);
    cursor.sync_column(code);
}

pub fn go_end(code: &CodeRegion, cursor: &mut TextCursor) {
    let start = line_start(code, cursor.position);
    cursor.position = start + line_size(code, start);
    cursor.sync_column(code);
}

pub fn go_doc_home(code: &CodeRegion, cursor: &mut TextCursor) {
    cursor.position = 0;
    cursor.sync_column(code);
}

pub fn go_doc_end(code: &CodeRegion, cursor: &mut TextCursor) {
    cursor.position = code.len();
    cursor.sync_column(code);
}

pub fn page_up(code: &CodeRegion, cursor: &mut TextCursor, page: usize) {
    let (column, line) = cursor_xy(code, cursor.position);
    let target = line.saturating_sub(page);
    cursor.position = position_at(code, column, target);
}

pub fn page_down(code: &CodeRegion, cursor: &mut TextCursor, page: usize) {
    let (column, line) = cursor_xy(code, cursor.position);
    let lines = lines_count(code);
    let target = if line + page < lines { line + page } else { lines };
    cursor.position = position_at(code, column, target);
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
    fn line_geometry() {
        let code = region("ab\ncdef\n\nx");
        assert_eq!(line_start(&code, 0), 0);
        assert_eq!(line_start(&code, 5), 3);
        assert_eq!(next_line_start(&code, 0), 3);
        assert_eq!(line_size(&code, 3), 4);
        assert_eq!(lines_count(&code), 3);
        assert_eq!(cursor_xy(&code, 5), (2, 1));
        assert_eq!(position_at(&code, 2, 1), 5);
        assert_eq!(position_at(&code, 99, 1), 7, "clamps to line end");
    }

    #[test]
    fn vertical_motion_keeps_column_intent() {
        let code = region("long line\nx\nanother");
        let mut cursor = TextCursor {
            position: 7,
            anchor: None,
            column: 7,
        };
        down_line(&code, &mut cursor);
        assert_eq!(cursor.position, 11, "short line clamps to its end");
        assert_eq!(cursor.column, 7, "column memory survives");
        down_line(&code, &mut cursor);
        assert_eq!(cursor_xy(&code, cursor.position), (7, 2));
    }

    #[test]
    fn up_from_first_line_stays_put() {
        let code = region("abc");
        let mut cursor = TextCursor {
            position: 2,
            anchor: None,
            column: 2,
        };
        up_line(&code, &mut cursor);
        assert_eq!(cursor.position, 2);
    }

    #[test]
    fn word_hops() {
        let code = region("foo_bar  ++baz");
        let mut cursor = TextCursor::default();
        right_word(&code, &mut cursor);
        assert_eq!(cursor.position, 7, "skips the identifier run");
        right_word(&code, &mut cursor);
        assert_eq!(cursor.position, 11, "then the non-word run");
        left_word(&code, &mut cursor);
        assert_eq!(cursor.position, 7);
        left_word(&code, &mut cursor);
        assert_eq!(cursor.position, 0);
    }

    #[test]
    fn home_end_doc_bounds() {
        let code = region("one\ntwo");
        let mut cursor = TextCursor {
            position: 5,
            anchor: None,
            column: 1,
        };
        go_home(&code, &mut cursor);
        assert_eq!(cursor.position, 4);
        go_end(&code, &mut cursor);
        assert_eq!(cursor.position, 7);
        go_doc_home(&code, &mut cursor);
        assert_eq!(cursor.position, 0);
        go_doc_end(&code, &mut cursor);
        assert_eq!(cursor.position, 7);
    }

    #[test]
    fn paging_clamps_to_document() {
        let code = region("a\nb\nc\nd");
        let mut cursor = TextCursor::default();
        page_down(&code, &mut cursor, 17);
        assert_eq!(cursor_xy(&code, cursor.position).1, 3);
        page_up(&code, &mut cursor, 17);
        assert_eq!(cursor.position, 0);
    }
}
