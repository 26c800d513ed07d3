use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tui_2048::core::{slide_line, GameSnapshot, GameState, IdAllocator, Tile};
use tui_2048::term::{encode_diff_into, FrameBuffer, GameView, Viewport};
use tui_2048::types::{Direction, TileId};

fn started(seed: u32) -> GameState {
    let mut state = GameState::new(seed);
    state.new_game();
    state
}

fn bench_apply_move(c: &mut Criterion) {
    let mut state = started(12345);
    let mut i = 0usize;

    c.bench_function("apply_move_cycle", |b| {
        b.iter(|| {
            if state.is_game_over().unwrap_or(true) {
                state.new_game();
            }
            let dir = Direction::ALL[i % 4];
            i = i.wrapping_add(1);
            black_box(state.apply_move(black_box(dir)).ok());
        })
    });
}

fn bench_slide_line(c: &mut Criterion) {
    let values = [2u32, 2, 4, 4];
    let line: [Option<Tile>; 4] =
        std::array::from_fn(|i| Some(Tile::plain(TileId(i as u32 + 1), values[i])));

    c.bench_function("slide_line_two_merges", |b| {
        b.iter(|| {
            let mut ids = IdAllocator::new();
            black_box(slide_line(black_box(&line), &mut ids));
        })
    });
}

fn bench_can_move(c: &mut Criterion) {
    let stuck = [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]];
    let state = GameState::from_grid(1, stuck).unwrap();

    c.bench_function("has_moves_full_board", |b| {
        b.iter(|| black_box(state.has_moves()))
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let state = started(777);
    let mut snap = GameSnapshot::default();

    c.bench_function("snapshot_into", |b| {
        b.iter(|| {
            state.snapshot_into(&mut snap).unwrap();
            black_box(snap.state_hash());
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let snap = started(42).snapshot().unwrap();
    let view = GameView::default();
    let viewport = Viewport::new(80, 24);
    let prev = FrameBuffer::new(80, 24);
    let mut fb = FrameBuffer::new(80, 24);
    let mut out = Vec::with_capacity(16 * 1024);

    c.bench_function("render_and_diff", |b| {
        b.iter(|| {
            view.render_into(&snap, viewport, &mut fb);
            out.clear();
            encode_diff_into(&prev, &fb, &mut out).unwrap();
            black_box(out.len());
        })
    });
}

criterion_group!(
    benches,
    bench_apply_move,
    bench_slide_line,
    bench_can_move,
    bench_snapshot,
    bench_render
);
criterion_main!(benches);
