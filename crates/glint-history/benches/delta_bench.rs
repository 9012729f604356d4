use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glint_history::History;

fn sparse_commit(c: &mut Criterion) {
    // A 64 KiB region with a handful of dirty bytes models one code-editor
    // keystroke against a full code blob.
    let mut region = vec![0u8; 0x10000];
    c.bench_function("delta_sparse_commit_64k", |b| {
        b.iter(|| {
            let mut history = History::new(&region);
            region[0x1234] ^= 1;
            region[0x1235] ^= 1;
            region[0x8000] ^= 1;
            black_box(history.add(&region));
        });
    });
}

fn dense_undo_redo(c: &mut Criterion) {
    let mut region = vec![0u8; 8192];
    let mut history = History::new(&region);
    for byte in region.iter_mut() {
        *byte = 0xFF;
    }
    history.add(&region);
    c.bench_function("delta_dense_undo_redo_8k", |b| {
        b.iter(|| {
            history.undo(&mut region);
            history.redo(&mut region);
            black_box(region[0]);
        });
    });
}

criterion_group!(benches, sparse_commit, dense_undo_redo);
criterion_main!(benches);
