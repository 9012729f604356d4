//! Delta-based undo/redo over fixed-size byte regions.
//!
//! Each editor wraps its cartridge region in a `History`. The engine retains
//! a private snapshot of the last committed state; `add` diffs the live
//! region against it and stores only the changed byte runs, so a 64 KiB code
//! region costs a scan per commit but only a few bytes of storage per
//! keystroke. `undo`/`redo` apply the stored runs to both the caller's
//! region and the snapshot, which keeps the two in lockstep without the
//! engine ever holding a reference into the target.
//!
//! Commit granularity is the caller's contract: one `add` per
//! user-observable edit, and an `add` that changes nothing commits nothing.

use tracing::trace;

/// One contiguous span of changed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    offset: usize,
    old: Vec<u8>,
    new: Vec<u8>,
}

/// A committed edit: the sparse set of runs that turns the previous state
/// into the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Delta {
    runs: Vec<Run>,
}

impl Delta {
    fn diff(before: &[u8], after: &[u8]) -> Self {
        debug_assert_eq!(before.len(), after.len());
        let mut runs = Vec::new();
        let mut i = 0;
        while i < before.len() {
            if before[i] == after[i] {
                i += 1;
                continue;
            }
            let start = i;
            while i < before.len() && before[i] != after[i] {
                i += 1;
            }
            runs.push(Run {
                offset: start,
                old: before[start..i].to_vec(),
                new: after[start..i].to_vec(),
            });
        }
        Self { runs }
    }

    fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    fn apply(&self, region: &mut [u8], forward: bool) {
        for run in &self.runs {
            let src = if forward { &run.new } else { &run.old };
            region[run.offset..run.offset + src.len()].copy_from_slice(src);
        }
    }
}

pub struct History {
    snapshot: Vec<u8>,
    past: Vec<Delta>,
    future: Vec<Delta>,
}

impl History {
    /// Snapshot the initial state; both stacks start empty.
    pub fn new(region: &[u8]) -> Self {
        Self {
            snapshot: region.to_vec(),
            past: Vec::new(),
            future: Vec::new(),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Commit the region's current state. Returns whether anything changed;
    /// a byte-identical region pushes nothing and leaves the redo stack
    /// intact.
    pub fn add(&mut self, region: &[u8]) -> bool {
        debug_assert_eq!(region.len(), self.snapshot.len());
        let delta = Delta::diff(&self.snapshot, region);
        if delta.is_empty() {
            trace!(target: "history", depth = self.past.len(), "identical state, no commit");
            return false;
        }
        self.snapshot.copy_from_slice(region);
        self.past.push(delta);
        self.future.clear();
        trace!(target: "history", depth = self.past.len(), "commit");
        true
    }

    /// Roll the region back one committed edit. No-op with an empty past.
    pub fn undo(&mut self, region: &mut [u8]) -> bool {
        let Some(delta) = self.past.pop() else {
            return false;
        };
        delta.apply(region, false);
        delta.apply(&mut self.snapshot, false);
        self.future.push(delta);
        trace!(target: "history", depth = self.past.len(), "undo");
        true
    }

    pub fn redo(&mut self, region: &mut [u8]) -> bool {
        let Some(delta) = self.future.pop() else {
            return false;
        };
        delta.apply(region, true);
        delta.apply(&mut self.snapshot, true);
        self.past.push(delta);
        trace!(target: "history", depth = self.past.len(), "redo");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_undo_restores_bytes() {
        let mut region = vec![0u8; 64];
        let mut history = History::new(&region);
        region[10] = 5;
        region[11] = 6;
        region[40] = 9;
        assert!(history.add(&region));
        assert!(history.undo(&mut region));
        assert_eq!(region, vec![0u8; 64]);
    }

    #[test]
    fn undo_redo_is_identity() {
        let mut region = b"hello world".to_vec();
        let mut history = History::new(&region);
        region[0] = b'y';
        history.add(&region);
        let committed = region.clone();
        history.undo(&mut region);
        history.redo(&mut region);
        assert_eq!(region, committed);
    }

    #[test]
    fn identical_add_commits_nothing() {
        let region = vec![3u8; 16];
        let mut history = History::new(&region);
        assert!(!history.add(&region));
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn add_discards_buffered_future() {
        let mut region = vec![0u8; 8];
        let mut history = History::new(&region);
        region[0] = 1;
        history.add(&region);
        history.undo(&mut region);
        assert_eq!(history.redo_depth(), 1);
        region[1] = 2;
        history.add(&region);
        assert_eq!(history.redo_depth(), 0);
        assert!(!history.redo(&mut region));
    }

    #[test]
    fn undo_with_empty_past_is_a_noop() {
        let mut region = vec![7u8; 4];
        let mut history = History::new(&region);
        assert!(!history.undo(&mut region));
        assert_eq!(region, vec![7u8; 4]);
    }

    #[test]
    fn deep_edit_chain_walks_both_ways() {
        let mut region = vec![0u8; 4];
        let mut history = History::new(&region);
        for i in 1..=5u8 {
            region[0] = i;
            history.add(&region);
        }
        while history.undo(&mut region) {}
        assert_eq!(region[0], 0);
        while history.redo(&mut region) {}
        assert_eq!(region[0], 5);
    }
}
