use bevy::log::debug;

use crate::config::RailParams;
use crate::error::TickError;
use crate::regions::RegionMap;
use crate::switches::SwitchStates;
use crate::track_network::{Branches, Connection, TrackNetwork};

use super::types::{CarPosition, Train};

/// Bound on segment hops within one cursor move or one lookahead.
const MAX_HOPS: usize = 1024;

const END_EPSILON: f32 = 1e-3;

/// Read-only view of the shared track state a train needs to move.
#[derive(Clone, Copy)]
pub struct TrackView<'a> {
    pub network: &'a TrackNetwork,
    pub regions: &'a RegionMap,
    pub switches: &'a SwitchStates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDecision {
    Take(Connection),
    /// Owned junction without a usable switch setting.
    Stall,
    DeadEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    Running,
    /// The whole train has left the map and should be removed.
    Finished,
}

/// Why a cursor stopped short of its full distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorStop {
    Moved,
    Stalled,
    DeadEnd,
    EndOfOccupied,
}

impl<'a> TrackView<'a> {
    /// Decide where a train continues after travelling `at` to its end.
    /// Unowned junctions pick a branch from `draw`; owned ones follow the
    /// switch or stall.
    pub fn resolve(&self, at: Connection, draw: u32) -> BranchDecision {
        match self.network.branches(at) {
            Branches::None => BranchDecision::DeadEnd,
            Branches::Single(next) => BranchDecision::Take(next),
            Branches::Multi(choices) => {
                let owner = self
                    .network
                    .junction_position(at)
                    .and_then(|p| self.regions.owner_at_position(p));
                if owner.is_some() {
                    match self.switches.get(at) {
                        Some(i) if (i as usize) < choices.len() => {
                            BranchDecision::Take(choices[i as usize])
                        }
                        _ => BranchDecision::Stall,
                    }
                } else {
                    BranchDecision::Take(choices[draw as usize % choices.len()])
                }
            }
        }
    }

    /// Distance from the locomotive to the nearest point it must stop at,
    /// or `None` if nothing within `max_distance` stops it.
    pub fn stop_distance(&self, train: &Train, draw: u32, max_distance: f32) -> Option<f32> {
        let loco = train.locomotive()?;
        let mut conn = *train.occupied_segments.get(loco.local_segment_index)?;
        let mut distance = self.network.remaining_on(conn, loco.point);
        for _ in 0..MAX_HOPS {
            if distance >= max_distance {
                return None;
            }
            match self.resolve(conn, draw) {
                BranchDecision::Stall => return Some(distance),
                BranchDecision::DeadEnd => return None,
                BranchDecision::Take(next) => {
                    distance += self
                        .network
                        .segment(next.segment_index)
                        .map_or(0.0, |s| s.length());
                    conn = next;
                }
            }
        }
        None
    }
}

/// Move one cursor forward along the occupied list by `distance`. Only the
/// locomotive (`branch_draw` set) may extend the list at segment ends.
fn advance_cursor(
    view: &TrackView<'_>,
    occupied: &mut Vec<Connection>,
    car: &mut CarPosition,
    distance: f32,
    branch_draw: Option<u32>,
) -> Result<(f32, CursorStop), TickError> {
    let mut remaining = distance.max(0.0);
    let mut consumed = 0.0;
    for _ in 0..MAX_HOPS {
        let conn = *occupied.get(car.local_segment_index).ok_or_else(|| {
            TickError::InvariantViolation(format!(
                "car on local segment {} of {}",
                car.local_segment_index,
                occupied.len()
            ))
        })?;
        let seg = view
            .network
            .segment(conn.segment_index)
            .ok_or(TickError::UnknownSegment(conn.segment_index))?;
        let mv = if conn.to_high_end {
            seg.tessellated.advance(&mut car.point, remaining)
        } else {
            seg.tessellated.reverse(&mut car.point, remaining)
        };
        consumed += mv.consumed;
        remaining -= mv.consumed;
        if !mv.reached_end || remaining <= 0.0 {
            return Ok((consumed, CursorStop::Moved));
        }

        let next = if car.local_segment_index + 1 < occupied.len() {
            occupied[car.local_segment_index + 1]
        } else {
            let Some(draw) = branch_draw else {
                return Ok((consumed, CursorStop::EndOfOccupied));
            };
            match view.resolve(conn, draw) {
                BranchDecision::Take(next) => {
                    occupied.push(next);
                    next
                }
                BranchDecision::Stall => return Ok((consumed, CursorStop::Stalled)),
                BranchDecision::DeadEnd => return Ok((consumed, CursorStop::DeadEnd)),
            }
        };
        car.local_segment_index += 1;
        car.point = view
            .network
            .entry_point(next)
            .ok_or(TickError::UnknownSegment(next.segment_index))?;
    }
    Ok((consumed, CursorStop::Moved))
}

/// New speed after one tick: accelerate towards top speed, then cap so the
/// train can still stop before the next blocking junction.
pub fn update_speed(
    train: &Train,
    dt: f32,
    view: &TrackView<'_>,
    params: &RailParams,
    draw: u32,
) -> f32 {
    let mut speed = (train.speed + params.acceleration * dt).min(params.top_speed);
    if !train.exiting {
        if let Some(stop) = view.stop_distance(train, draw, params.max_lookahead()) {
            speed = speed.min(stop * params.braking_factor);
        }
    }
    speed.max(0.0)
}

/// Advance a train by one tick.
pub fn tick_train(
    train: &mut Train,
    dt: f32,
    view: &TrackView<'_>,
    params: &RailParams,
    draw: u32,
) -> Result<TrainOutcome, TickError> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(TickError::InvalidDelta(dt));
    }
    if train.cars.is_empty() || train.occupied_segments.is_empty() {
        return Err(TickError::InvariantViolation(format!(
            "train {} has no cars or no track",
            train.id.0
        )));
    }

    train.speed = update_speed(train, dt, view, params, draw);
    let distance = train.speed * dt;
    let id = train.id;

    let Train {
        occupied_segments,
        cars,
        exiting,
        ..
    } = train;

    let mut follow = distance;
    if !*exiting {
        let (consumed, stop) =
            advance_cursor(view, occupied_segments, &mut cars[0], distance, Some(draw))?;
        follow = consumed;
        if stop == CursorStop::DeadEnd {
            debug!("Train {} reached a dead end, exiting", id.0);
            *exiting = true;
            follow = distance;
        }
    }
    for car in cars.iter_mut().skip(1) {
        advance_cursor(view, occupied_segments, car, follow, None)?;
    }

    if *exiting {
        let rear = cars[cars.len() - 1];
        let last = occupied_segments.len() - 1;
        if rear.local_segment_index == last
            && view.network.remaining_on(occupied_segments[last], rear.point) <= END_EPSILON
        {
            return Ok(TrainOutcome::Finished);
        }
    }

    trim_occupied(train, params)?;
    Ok(TrainOutcome::Running)
}

/// Drop connections behind the rear car and re-index the cars.
pub fn trim_occupied(train: &mut Train, params: &RailParams) -> Result<(), TickError> {
    let rear = train
        .rear()
        .map_or(0, |c| c.local_segment_index);
    for pair in train.cars.windows(2) {
        if pair[1].local_segment_index > pair[0].local_segment_index {
            return Err(TickError::InvariantViolation(format!(
                "train {} has a car ahead of the one in front of it",
                train.id.0
            )));
        }
    }
    if rear > 0 {
        train.occupied_segments.drain(..rear);
        for car in &mut train.cars {
            car.local_segment_index -= rear;
        }
    }
    if train.occupied_segments.len() > params.max_occupied_segments {
        return Err(TickError::InvariantViolation(format!(
            "train {} occupies {} segments",
            train.id.0,
            train.occupied_segments.len()
        )));
    }
    Ok(())
}

/// Lay out a freshly spawned train on `entrance`: the locomotive is pushed
/// ahead by the full train length and each wagon trails at car spacing.
/// Returns `None` if the track ahead is too short or blocked.
pub fn place_train(
    view: &TrackView<'_>,
    entrance: Connection,
    cursor_count: usize,
    spacing: f32,
    draw: u32,
) -> Result<Option<(Vec<Connection>, Vec<CarPosition>)>, TickError> {
    let start = CarPosition {
        local_segment_index: 0,
        point: view
            .network
            .entry_point(entrance)
            .ok_or(TickError::UnknownSegment(entrance.segment_index))?,
    };
    let mut occupied = vec![entrance];
    let mut cars = vec![start; cursor_count.max(1)];
    let span = (cars.len() - 1) as f32 * spacing;

    let (consumed, _) = advance_cursor(view, &mut occupied, &mut cars[0], span, Some(draw))?;
    if consumed + END_EPSILON < span {
        return Ok(None);
    }
    let n = cars.len();
    for (k, car) in cars.iter_mut().enumerate().skip(1) {
        let offset = (n - 1 - k) as f32 * spacing;
        advance_cursor(view, &mut occupied, car, offset, None)?;
    }
    Ok(Some((occupied, cars)))
}
