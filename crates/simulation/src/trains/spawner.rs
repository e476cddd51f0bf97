use std::collections::BTreeSet;

use bevy::log::debug;
use rand::Rng;

use crate::config::{
    RailParams, RoomSettings, DEFAULT_TRAIN_COLOR, LOCOMOTIVE_TYPES, TRAIN_COLORS,
    TRAIN_VALUE_PER_CAR_MAX, TRAIN_VALUE_PER_CAR_MIN,
};
use crate::error::TickError;
use crate::sim_rng::SimRng;

use super::movement::{place_train, TrackView};
use super::types::{Train, TrainId, TrainStyle};

/// Trains the game should keep running given current ownership.
pub fn desired_train_count(view: &TrackView<'_>, params: &RailParams) -> usize {
    view.regions.owned_region_count() * params.trains_per_owned_region
}

/// Appearance of a new train. With varied styles off every train looks the
/// same and has the category's base length.
pub fn random_style(settings: &RoomSettings, rng: &mut SimRng) -> TrainStyle {
    let base = settings.train_length.base_car_count();
    if !settings.varied_train_styles {
        return TrainStyle {
            locomotive_type: 0,
            color: DEFAULT_TRAIN_COLOR,
            car_count: base,
        };
    }
    let delta: i32 = rng.0.gen_range(-1..=1);
    TrainStyle {
        locomotive_type: rng.0.gen_range(0..LOCOMOTIVE_TYPES),
        color: TRAIN_COLORS[rng.0.gen_range(0..TRAIN_COLORS.len())],
        car_count: (base as i32 + delta).max(1) as u8,
    }
}

/// Try to put one new train on a random entrance. Entrances already used by
/// a running train are skipped, as is track too short to hold the train.
pub fn spawn_train(
    id: TrainId,
    view: &TrackView<'_>,
    existing: &[Train],
    settings: &RoomSettings,
    params: &RailParams,
    rng: &mut SimRng,
) -> Result<Option<Train>, TickError> {
    let entrances = &view.network.entrances;
    if entrances.is_empty() {
        return Ok(None);
    }
    let entrance = entrances[rng.0.gen_range(0..entrances.len())];
    let style = random_style(settings, rng);
    let value = rng.0.gen_range(TRAIN_VALUE_PER_CAR_MIN..=TRAIN_VALUE_PER_CAR_MAX)
        * style.car_count as u32;
    let draw = rng.next_draw();

    let busy = existing.iter().any(|t| {
        t.occupied_segments
            .iter()
            .any(|c| c.segment_index == entrance.segment_index)
    });
    if busy {
        debug!("Entrance {entrance:?} is occupied, skipping spawn");
        return Ok(None);
    }

    let Some((occupied_segments, cars)) = place_train(
        view,
        entrance,
        style.cursor_count(),
        params.car_spacing,
        draw,
    )?
    else {
        debug!("Entrance {entrance:?} cannot hold a train of {} cars", style.car_count);
        return Ok(None);
    };

    Ok(Some(Train {
        id,
        style,
        occupied_segments,
        cars,
        speed: 0.0,
        value,
        revealed_to: BTreeSet::new(),
        exiting: false,
    }))
}
