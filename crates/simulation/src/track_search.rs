//! Heading-aware A* over the tile lattice, used to lay track between
//! neighbouring stations.
//!
//! A search state is a lattice point plus one of eight headings. From each
//! state a train-track can continue straight for one tile or bend 45 degrees
//! left or right along a quadratic arc of radius 1..=3 tiles. Every move
//! ends on a lattice point, so laid track can be stored as discrete
//! [`GridEdge`]s keyed by their origin tile and reused by later searches at
//! zero cost.

use std::collections::BTreeMap;

use bevy::log::{debug, info};
use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::RailParams;
use crate::cost_field::CostField;
use crate::heading::Heading;
use crate::spline::{quad_bezier, quad_bezier_length};
use crate::station_layout::StationLayout;
use crate::units::TileCoord;

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// A single move on the lattice, stored relative to its origin tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridEdge {
    pub heading: Heading,
    pub offset: TileCoord,
    pub end_heading: Heading,
    /// Zero for straight moves.
    pub radius: i32,
}

impl GridEdge {
    pub fn straight(heading: Heading) -> Self {
        Self {
            heading,
            offset: heading.step(),
            end_heading: heading,
            radius: 0,
        }
    }

    /// Turn of `radius` tiles from `heading` to `heading.turned(turn)`.
    pub fn curve(heading: Heading, turn: i32, radius: i32) -> Self {
        let end_heading = heading.turned(turn);
        let a = heading.step();
        let b = end_heading.step();
        Self {
            heading,
            offset: TileCoord::new(radius * (a.x + b.x), radius * (a.z + b.z)),
            end_heading,
            radius,
        }
    }

    pub fn destination(&self, from: TileCoord) -> TileCoord {
        from + self.offset
    }

    /// Quadratic control point in tile space.
    pub fn control(&self, from: TileCoord) -> (f32, f32) {
        if self.radius == 0 {
            (
                from.x as f32 + self.offset.x as f32 * 0.5,
                from.z as f32 + self.offset.z as f32 * 0.5,
            )
        } else {
            let s = self.heading.step();
            (
                (from.x + s.x * self.radius) as f32,
                (from.z + s.z * self.radius) as f32,
            )
        }
    }

    /// The same piece of track traversed from its destination. Returns the
    /// new origin tile and edge.
    pub fn reversed(&self, from: TileCoord) -> (TileCoord, GridEdge) {
        (
            self.destination(from),
            GridEdge {
                heading: self.end_heading.opposite(),
                offset: -self.offset,
                end_heading: self.heading.opposite(),
                radius: self.radius,
            },
        )
    }

    /// Control and destination relative to the origin, in tile space.
    fn local_curve(&self) -> (Vec3, Vec3) {
        let (cx, cz) = self.control(TileCoord::default());
        let to = self.offset;
        (Vec3::new(cx, 0.0, cz), Vec3::new(to.x as f32, 0.0, to.z as f32))
    }

    /// Arc length in tiles.
    pub fn length_tiles(&self) -> f32 {
        let (ctrl, to) = self.local_curve();
        quad_bezier_length(Vec3::ZERO, ctrl, to)
    }

    /// Tile nearest the middle of the arc, relative to the origin.
    pub fn midpoint_offset(&self) -> TileCoord {
        let (ctrl, to) = self.local_curve();
        let mid = quad_bezier(Vec3::ZERO, ctrl, to, 0.5);
        TileCoord::new(mid.x.round() as i32, mid.z.round() as i32)
    }
}

/// All laid track, keyed by origin tile. An edge and its reverse are never
/// both stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackEdges {
    edges: BTreeMap<TileCoord, Vec<GridEdge>>,
}

impl TrackEdges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, from: TileCoord, edge: &GridEdge) -> bool {
        self.edges.get(&from).is_some_and(|list| list.contains(edge))
    }

    /// True if this piece of track exists in either direction.
    pub fn contains_track(&self, from: TileCoord, edge: &GridEdge) -> bool {
        let (rev_from, rev_edge) = edge.reversed(from);
        self.contains(from, edge) || self.contains(rev_from, &rev_edge)
    }

    /// Record an edge unless the same track already exists. Returns whether
    /// it was inserted.
    pub fn insert(&mut self, from: TileCoord, edge: GridEdge) -> bool {
        if self.contains_track(from, &edge) {
            return false;
        }
        self.edges.entry(from).or_default().push(edge);
        true
    }

    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Edges in deterministic (tile, insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, GridEdge)> + '_ {
        self.edges
            .iter()
            .flat_map(|(&from, list)| list.iter().map(move |&e| (from, e)))
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SearchState {
    pub tile: TileCoord,
    pub heading: Heading,
}

#[derive(Debug, Clone, Copy)]
struct Move {
    edge: GridEdge,
    /// Distance plus curvature cost, excluding terrain.
    base_cost: u32,
    /// Extra tile sampled for terrain cost so long arcs cannot jump over
    /// obstacles.
    midpoint: Option<TileCoord>,
}

/// A found route: the edges walked from start to goal and the total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPath {
    pub steps: Vec<(TileCoord, GridEdge)>,
    pub cost: u32,
}

pub struct TrackSearch<'a> {
    cost_field: &'a CostField,
    size_tiles: i32,
    params: &'a RailParams,
    /// Moves available from each heading, indexed by `Heading::index`.
    moves: [Vec<Move>; 8],
}

impl<'a> TrackSearch<'a> {
    pub fn new(cost_field: &'a CostField, size_tiles: i32, params: &'a RailParams) -> Self {
        let moves = std::array::from_fn(|i| Self::moves_for(Heading::from_index(i), params));
        Self {
            cost_field,
            size_tiles,
            params,
            moves,
        }
    }

    fn moves_for(heading: Heading, params: &RailParams) -> Vec<Move> {
        let distance_cost =
            |edge: &GridEdge| (edge.length_tiles() * params.distance_cost_per_tile as f32).round() as u32;
        let mut moves = vec![{
            let edge = GridEdge::straight(heading);
            Move {
                edge,
                base_cost: distance_cost(&edge),
                midpoint: None,
            }
        }];
        for radius in params.min_curve_radius.max(1)..=params.max_curve_radius {
            let curve_cost = (params.max_curve_radius - radius) as u32 * params.curve_cost_factor;
            for turn in [-1, 1] {
                let edge = GridEdge::curve(heading, turn, radius);
                moves.push(Move {
                    edge,
                    base_cost: distance_cost(&edge) + curve_cost,
                    midpoint: Some(edge.midpoint_offset()),
                });
            }
        }
        moves
    }

    fn in_bounds(&self, tile: TileCoord) -> bool {
        (0..=self.size_tiles).contains(&tile.x) && (0..=self.size_tiles).contains(&tile.z)
    }

    fn successors(&self, state: &SearchState, existing: &TrackEdges) -> Vec<(SearchState, u32)> {
        self.moves[state.heading.index()]
            .iter()
            .filter_map(|mv| {
                let to = mv.edge.destination(state.tile);
                if !self.in_bounds(to) {
                    return None;
                }
                let cost = if existing.contains_track(state.tile, &mv.edge) {
                    0
                } else {
                    let mid = mv
                        .midpoint
                        .map_or(0, |m| self.cost_field.get(state.tile + m) as u32);
                    mv.base_cost
                        + self.cost_field.get(state.tile) as u32
                        + self.cost_field.get(to) as u32
                        + mid
                };
                Some((
                    SearchState {
                        tile: to,
                        heading: mv.edge.end_heading,
                    },
                    cost,
                ))
            })
            .collect()
    }

    /// Route from `start` to `goal`, where both tile and heading must match.
    /// `None` when the goal is unreachable. The Manhattan heuristic
    /// overestimates diagonal moves, so the route is not always the cheapest.
    pub fn find_path(
        &self,
        existing: &TrackEdges,
        start: SearchState,
        goal: SearchState,
    ) -> Option<SearchPath> {
        let factor = self.params.distance_cost_per_tile;
        let (states, cost) = pathfinding::prelude::astar(
            &start,
            |s| self.successors(s, existing),
            |s| s.tile.manhattan(goal.tile) as u32 * factor,
            |s| *s == goal,
        )?;

        let steps = states
            .windows(2)
            .filter_map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                self.moves[a.heading.index()]
                    .iter()
                    .find(|mv| {
                        mv.edge.destination(a.tile) == b.tile && mv.edge.end_heading == b.heading
                    })
                    .map(|mv| (a.tile, mv.edge))
            })
            .collect();
        Some(SearchPath { steps, cost })
    }
}

/// Record every step of a path, skipping track that already exists.
pub fn record_path(edges: &mut TrackEdges, path: &SearchPath) -> usize {
    path.steps
        .iter()
        .filter(|(from, edge)| edges.insert(*from, *edge))
        .count()
}

/// Connect every station's exit to the entry of its +X and +Z neighbours.
/// Connections that cannot be found are left out; the map border stays
/// open.
pub fn connect_stations(
    layout: &StationLayout,
    cost_field: &CostField,
    size_tiles: i32,
    params: &RailParams,
) -> TrackEdges {
    let search = TrackSearch::new(cost_field, size_tiles, params);
    let mut edges = TrackEdges::new();
    let mut connected = 0;
    let mut omitted = 0;

    for cz in 0..layout.size_chunks {
        for cx in 0..layout.size_chunks {
            let chunk = TileCoord::new(cx, cz);
            let Some(from) = layout.station_at_chunk(chunk) else {
                continue;
            };
            for neighbour in [chunk.offset(1, 0), chunk.offset(0, 1)] {
                let Some(to) = layout.station_at_chunk(neighbour) else {
                    continue;
                };
                let exit = from.exit();
                let entry = to.entry();
                let start = SearchState {
                    tile: exit.tile,
                    heading: exit.outward,
                };
                let goal = SearchState {
                    tile: entry.tile,
                    heading: entry.outward.opposite(),
                };
                match search.find_path(&edges, start, goal) {
                    Some(path) => {
                        let added = record_path(&mut edges, &path);
                        debug!(
                            "Connected chunk {chunk:?} to {neighbour:?}: {} steps, {added} new, cost {}",
                            path.steps.len(),
                            path.cost
                        );
                        connected += 1;
                    }
                    None => {
                        debug!("No route from chunk {chunk:?} to {neighbour:?}, omitting");
                        omitted += 1;
                    }
                }
            }
        }
    }
    info!(
        "Track search: {connected} connections laid, {omitted} omitted, {} edges",
        edges.len()
    );
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_edges_land_on_lattice_with_turned_heading() {
        for h in Heading::ALL {
            for turn in [-1, 1] {
                for r in 1..=3 {
                    let e = GridEdge::curve(h, turn, r);
                    assert_eq!(e.end_heading.steps_between(h), 1);
                    let (from, rev) = e.reversed(TileCoord::new(10, 10));
                    assert_eq!(rev.destination(from), TileCoord::new(10, 10));
                    assert_eq!(rev.control(from), e.control(TileCoord::new(10, 10)));
                }
            }
        }
    }

    #[test]
    fn test_reverse_of_reverse_is_identity() {
        let from = TileCoord::new(3, 4);
        let e = GridEdge::curve(Heading::SouthEast, 1, 2);
        let (rf, re) = e.reversed(from);
        assert_eq!(re.reversed(rf), (from, e));
    }

    #[test]
    fn test_insert_skips_existing_track_in_either_direction() {
        let mut edges = TrackEdges::new();
        let from = TileCoord::new(2, 2);
        let e = GridEdge::straight(Heading::East);
        assert!(edges.insert(from, e));
        assert!(!edges.insert(from, e));
        let (rf, re) = e.reversed(from);
        assert!(!edges.insert(rf, re));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_straight_line_on_flat_field() {
        let params = RailParams::default();
        let field = CostField::new(32);
        let search = TrackSearch::new(&field, 32, &params);
        let start = SearchState {
            tile: TileCoord::new(2, 5),
            heading: Heading::East,
        };
        let goal = SearchState {
            tile: TileCoord::new(12, 5),
            heading: Heading::East,
        };
        let path = search.find_path(&TrackEdges::new(), start, goal).unwrap();
        assert_eq!(path.steps.len(), 10);
        assert!(path.steps.iter().all(|(_, e)| e.radius == 0));
        assert_eq!(path.cost, 10 * params.distance_cost_per_tile);
    }

    #[test]
    fn test_widest_curve_costs_only_its_length() {
        let params = RailParams::default();
        let field = CostField::new(32);
        let search = TrackSearch::new(&field, 32, &params);
        let from = TileCoord::new(10, 10);
        let edge = GridEdge::curve(Heading::East, 1, params.max_curve_radius);
        let start = SearchState {
            tile: from,
            heading: Heading::East,
        };
        let goal = SearchState {
            tile: edge.destination(from),
            heading: edge.end_heading,
        };
        let path = search.find_path(&TrackEdges::new(), start, goal).unwrap();
        let distance =
            (edge.length_tiles() * params.distance_cost_per_tile as f32).round() as u32;
        assert_eq!(path.cost, distance);
        assert_eq!(path.steps, vec![(from, edge)]);
    }

    #[test]
    fn test_tighter_curves_cost_more_than_their_length() {
        let params = RailParams::default();
        let search_moves = TrackSearch::moves_for(Heading::North, &params);
        for mv in search_moves.iter().filter(|mv| mv.edge.radius > 0) {
            let distance =
                (mv.edge.length_tiles() * params.distance_cost_per_tile as f32).round() as u32;
            let extra = (params.max_curve_radius - mv.edge.radius) as u32 * params.curve_cost_factor;
            assert_eq!(mv.base_cost, distance + extra, "radius {}", mv.edge.radius);
        }
    }

    #[test]
    fn test_routes_around_a_blocking_wall() {
        let params = RailParams::default();
        let mut field = CostField::new(32);
        for z in 0..=10 {
            field.raise(TileCoord::new(8, z), params.station_cost);
        }
        let search = TrackSearch::new(&field, 32, &params);
        let start = SearchState {
            tile: TileCoord::new(2, 5),
            heading: Heading::East,
        };
        let goal = SearchState {
            tile: TileCoord::new(14, 5),
            heading: Heading::East,
        };
        let path = search.find_path(&TrackEdges::new(), start, goal).unwrap();
        assert!(path.cost < params.station_cost as u32);
        for (from, edge) in &path.steps {
            assert!(field.get(*from) == 0 && field.get(edge.destination(*from)) == 0);
        }
        let last = path.steps.last().unwrap();
        assert_eq!(last.0 + last.1.offset, goal.tile);
        assert_eq!(last.1.end_heading, Heading::East);
    }

    #[test]
    fn test_existing_track_is_free() {
        let params = RailParams::default();
        let field = CostField::new(32);
        let search = TrackSearch::new(&field, 32, &params);
        let start = SearchState {
            tile: TileCoord::new(2, 5),
            heading: Heading::East,
        };
        let goal = SearchState {
            tile: TileCoord::new(12, 5),
            heading: Heading::East,
        };
        let mut edges = TrackEdges::new();
        let first = search.find_path(&edges, start, goal).unwrap();
        assert_eq!(record_path(&mut edges, &first), 10);
        let again = search.find_path(&edges, start, goal).unwrap();
        assert_eq!(again.cost, 0);
        assert_eq!(record_path(&mut edges, &again), 0);
    }

    #[test]
    fn test_unreachable_goal_returns_none() {
        let params = RailParams::default();
        let field = CostField::new(8);
        let search = TrackSearch::new(&field, 8, &params);
        let start = SearchState {
            tile: TileCoord::new(2, 2),
            heading: Heading::East,
        };
        let goal = SearchState {
            tile: TileCoord::new(20, 2),
            heading: Heading::East,
        };
        assert!(search.find_path(&TrackEdges::new(), start, goal).is_none());
    }
}
