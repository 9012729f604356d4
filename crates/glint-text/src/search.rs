//! Substring scans for the find popup. Plain bounded memcmp sweeps, no
//! wrap-around: a backward search stops at the buffer start, a forward one
//! at the end.

use glint_cart::CodeRegion;

/// First match at or after `from`.
pub fn find_forward(code: &CodeRegion, from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let text = code.text();
    let from = from.min(text.len());
    text[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// Last match strictly before `from`.
pub fn find_backward(code: &CodeRegion, from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let text = code.text();
    let end = from.min(text.len());
    if end == 0 {
        return None;
    }
    text[..(end - 1 + needle.len()).min(text.len())]
        .windows(needle.len())
        .rposition(|w| w == needle)
        .filter(|&i| i < end)
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
    fn forward_and_backward_scans() {
        let code = region("one two one two");
        assert_eq!(find_forward(&code, 0, b"two"), Some(4));
        assert_eq!(find_forward(&code, 5, b"two"), Some(12));
        assert_eq!(find_forward(&code, 13, b"two"), None);
        assert_eq!(find_backward(&code, 12, b"two"), Some(4));
        assert_eq!(find_backward(&code, 4, b"two"), None);
    }

    #[test]
    fn empty_needle_never_matches() {
        let code = region("abc");
        assert_eq!(find_forward(&code, 0, b""), None);
        assert_eq!(find_backward(&code, 3, b""), None);
    }
}
