//! Script-language bridge consumed by the code editor.
//!
//! The actual language bindings (parsers, runtimes) live outside the studio
//! core; the editor only needs three things from whichever language the
//! cartridge uses: the line-comment prefix, a syntax colorizer that paints
//! one theme index per source byte, and an outline enumerator yielding the
//! positions of named definitions.

use glint_gfx::SyntaxTheme;

/// One named definition discovered in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineItem {
    /// Byte offset of the name within the source.
    pub offset: usize,
    /// Byte length of the name.
    pub len: usize,
}

pub trait ScriptConfig {
    /// Prefix toggled onto a line by the comment command (e.g. `"-- "`).
    fn single_comment(&self) -> &str;

    /// Paint `colors[i]` with a theme index for every byte of `source`.
    /// The buffer arrives pre-filled with `theme.var`; implementations only
    /// need to mark what differs. `colors` is at least `source.len()` long.
    fn parse(&self, source: &str, colors: &mut [u8], theme: &SyntaxTheme);

    /// Named definitions in source order. The editor sorts and filters.
    fn outline(&self, source: &str) -> Vec<OutlineItem>;
}

/// Fallback used when no language binding is wired up: everything colors as
/// a variable and the outline is empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainScript;

impl ScriptConfig for PlainScript {
    fn single_comment(&self) -> &str {
        "-- "
    }

    fn parse(&self, _source: &str, _colors: &mut [u8], _theme: &SyntaxTheme) {}

    fn outline(&self, _source: &str) -> Vec<OutlineItem> {
        Vec::new()
    }
}
