//! Stands in for the transport layer: encodes what would be sent to clients
//! every tick and logs the sizes.

use bevy::prelude::*;

use simulation::game_registry::{tick_games, GameCrashed, GameRegistry};
use simulation::GameId;
use snapshot::{peek_header, Compression, PayloadKind, ServerMessage, StateStream};

/// Full state every this many ticks, diffs in between.
pub const KEYFRAME_INTERVAL: u64 = 50;

/// Ticks between progress lines.
const REPORT_EVERY: u64 = 100;

#[derive(Resource)]
pub struct Broadcast {
    pub game: GameId,
    pub stop_after: u64,
    stream: StateStream,
    keyframes: u64,
    diffs: u64,
    bytes: u64,
}

impl Broadcast {
    pub fn new(game: GameId, stop_after: u64) -> Self {
        Self {
            game,
            stop_after,
            stream: StateStream::new(KEYFRAME_INTERVAL, Compression::Auto),
            keyframes: 0,
            diffs: 0,
            bytes: 0,
        }
    }
}

pub fn broadcast_state(registry: Res<GameRegistry>, mut broadcast: ResMut<Broadcast>) {
    let Some(game) = registry.get(broadcast.game) else {
        return;
    };
    let snapshot = game.state_snapshot();
    let frame = match broadcast.stream.push(&snapshot) {
        Ok(frame) => frame,
        Err(e) => {
            error!("Failed to encode tick {}: {e}", snapshot.tick);
            return;
        }
    };
    match peek_header(&frame).map(|h| h.kind()) {
        Ok(Some(PayloadKind::State)) => broadcast.keyframes += 1,
        _ => broadcast.diffs += 1,
    }
    broadcast.bytes += frame.len() as u64;

    if snapshot.tick % REPORT_EVERY == 0 {
        info!(
            "Tick {}: {} trains, {} owned regions, frame {} bytes",
            snapshot.tick,
            snapshot.trains.len(),
            game.regions().owned_region_count(),
            frame.len()
        );
    }
}

pub fn announce_crashes(mut crashed: EventReader<GameCrashed>) {
    for event in crashed.read() {
        let message = ServerMessage::GameCrashed {
            reason: event.error.to_string(),
        };
        match message.to_json() {
            Ok(json) => warn!("Game {} closed, notifying clients: {json}", event.game.0),
            Err(e) => error!("Failed to encode crash notice: {e}"),
        }
    }
}

pub fn stop_when_done(
    registry: Res<GameRegistry>,
    broadcast: Res<Broadcast>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(game) = registry.get(broadcast.game) else {
        exit.send(AppExit::error());
        return;
    };
    if game.tick_count() < broadcast.stop_after {
        return;
    }
    info!(
        "Finished {} ticks: {} keyframes, {} diffs, {} bytes total",
        game.tick_count(),
        broadcast.keyframes,
        broadcast.diffs,
        broadcast.bytes
    );
    exit.send(AppExit::Success);
}

pub struct BroadcastPlugin;

impl Plugin for BroadcastPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (broadcast_state, announce_crashes).after(tick_games),
        )
        .add_systems(Update, stop_when_done);
    }
}
