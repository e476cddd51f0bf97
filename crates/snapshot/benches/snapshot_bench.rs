//! Snapshot encoding benchmarks.
//!
//! World info is encoded once per joining player, game state once per tick,
//! so the interesting numbers are the world frame size and the per-tick
//! keyframe vs diff cost with a full fleet.
//!
//! Run with: cargo bench -p snapshot --bench snapshot_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use simulation::config::{RailParams, RoomSettings};
use simulation::game::{Game, GameId};
use snapshot::{decode_frame, encode_frame, Compression};

fn busy_game() -> Game {
    let settings = RoomSettings {
        player_count: 4,
        seed: 42,
        ..RoomSettings::default()
    };
    let params = RailParams {
        trains_per_owned_region: 8,
        ..RailParams::default()
    };
    let mut game = match Game::create(GameId(0), settings, params) {
        Ok(game) => game,
        Err(e) => panic!("bench world failed to generate: {e}"),
    };
    for _ in 0..600 {
        if let Err(e) = game.tick(0.1) {
            panic!("warm-up tick failed: {e}");
        }
    }
    game
}

fn bench_world_frame(c: &mut Criterion) {
    let game = busy_game();
    let world = simulation::WorldInfo::clone(game.world());
    let encoded = encode_frame(&world, Compression::Auto).unwrap();
    eprintln!("World frame: {} bytes", encoded.len());

    let mut group = c.benchmark_group("world_frame");
    group.bench_function("encode", |b| {
        b.iter(|| black_box(encode_frame(&world, Compression::Auto).unwrap()));
    });
    group.bench_function("decode", |b| {
        b.iter(|| black_box(decode_frame::<simulation::WorldInfo>(&encoded).unwrap()));
    });
    group.finish();
}

fn bench_state_frames(c: &mut Criterion) {
    let mut game = busy_game();
    let previous = game.state_snapshot();
    game.tick(0.1).unwrap();
    let current = game.state_snapshot();
    let diff = current.diff(&previous);

    let full = encode_frame(&current, Compression::Auto).unwrap();
    let delta = encode_frame(&diff, Compression::Auto).unwrap();
    eprintln!(
        "{} trains: keyframe {} bytes, diff {} bytes",
        current.trains.len(),
        full.len(),
        delta.len()
    );

    let mut group = c.benchmark_group("state_frame");
    group.bench_function("snapshot_and_keyframe", |b| {
        b.iter(|| black_box(encode_frame(&game.state_snapshot(), Compression::Auto).unwrap()));
    });
    group.bench_function("diff_and_encode", |b| {
        b.iter(|| black_box(encode_frame(&current.diff(&previous), Compression::Auto).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_world_frame, bench_state_frames);
criterion_main!(benches);
