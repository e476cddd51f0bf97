//! Merge laid grid edges into maximal track splines.
//!
//! Each edge touches two *joints*: a lattice point together with the
//! undirected axis of travel through it. A joint has a front and a back
//! side. Edges that meet at a joint with exactly one edge on each side form
//! a plain continuation and are merged into one spline; anywhere else
//! (branches, dead ends, crossings of different axes) a spline ends.

use std::collections::BTreeMap;

use bevy::log::debug;
use bevy::math::Vec3;

use crate::heading::Heading;
use crate::spline::QuadSpline;
use crate::track_search::{GridEdge, TrackEdges};
use crate::units::{tiles_to_units, TileCoord};

const MIN_CHAIN_LENGTH: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Side {
    Front,
    Back,
}

impl Side {
    /// Side of a joint occupied by track leaving it in `heading`.
    fn leaving(heading: Heading) -> Side {
        if heading.index() < 4 {
            Side::Front
        } else {
            Side::Back
        }
    }

    fn other(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct JointSide {
    tile: TileCoord,
    axis: usize,
    side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeEnd {
    Start,
    End,
}

struct Edge {
    from: TileCoord,
    edge: GridEdge,
}

impl Edge {
    fn joint(&self, end: EdgeEnd) -> JointSide {
        match end {
            EdgeEnd::Start => JointSide {
                tile: self.from,
                axis: self.edge.heading.axis(),
                side: Side::leaving(self.edge.heading),
            },
            EdgeEnd::End => JointSide {
                tile: self.edge.destination(self.from),
                axis: self.edge.end_heading.axis(),
                side: Side::leaving(self.edge.end_heading.opposite()),
            },
        }
    }

    /// Bézier piece in world units, optionally walked backwards.
    fn piece(&self, reversed: bool) -> (Vec3, Vec3, Vec3) {
        let (cx, cz) = self.edge.control(self.from);
        let scale = tiles_to_units(1) as f32;
        let from = self.from.to_world();
        let ctrl = Vec3::new(cx * scale, 0.0, cz * scale);
        let to = self.edge.destination(self.from).to_world();
        if reversed {
            (to, ctrl, from)
        } else {
            (from, ctrl, to)
        }
    }
}

/// Which edges touch each side of each joint.
struct JointIndex {
    sides: BTreeMap<JointSide, Vec<(usize, EdgeEnd)>>,
}

impl JointIndex {
    fn build(edges: &[Edge]) -> Self {
        let mut sides: BTreeMap<JointSide, Vec<(usize, EdgeEnd)>> = BTreeMap::new();
        for (i, e) in edges.iter().enumerate() {
            for end in [EdgeEnd::Start, EdgeEnd::End] {
                sides.entry(e.joint(end)).or_default().push((i, end));
            }
        }
        Self { sides }
    }

    fn count(&self, joint: JointSide) -> usize {
        self.sides.get(&joint).map_or(0, Vec::len)
    }

    /// The edge continuing through `joint` from the opposite side, if the
    /// joint is a plain pass-through.
    fn continuation(&self, joint: JointSide) -> Option<(usize, EdgeEnd)> {
        let opposite = JointSide {
            side: joint.side.other(),
            ..joint
        };
        if self.count(joint) != 1 || self.count(opposite) != 1 {
            return None;
        }
        self.sides.get(&opposite).and_then(|v| v.first().copied())
    }
}

/// Follow pass-through joints from `end` of edge `start`, collecting
/// (edge, reversed) pairs in walking order.
fn walk(
    edges: &[Edge],
    index: &JointIndex,
    visited: &mut [bool],
    start: usize,
    end: EdgeEnd,
) -> Vec<(usize, bool)> {
    let mut out = Vec::new();
    let mut joint = edges[start].joint(end);
    while let Some((next, attached)) = index.continuation(joint) {
        if visited[next] {
            break;
        }
        visited[next] = true;
        // Entering through its start means walking it forwards.
        let reversed = attached == EdgeEnd::End;
        out.push((next, reversed));
        let far = if reversed { EdgeEnd::Start } else { EdgeEnd::End };
        joint = edges[next].joint(far);
    }
    out
}

/// Merge all laid track into maximal splines.
pub fn assemble_track_splines(track: &TrackEdges) -> Vec<QuadSpline> {
    let edges: Vec<Edge> = track.iter().map(|(from, edge)| Edge { from, edge }).collect();
    let index = JointIndex::build(&edges);
    let mut visited = vec![false; edges.len()];
    let mut splines = Vec::new();

    for seed in 0..edges.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let forward = walk(&edges, &index, &mut visited, seed, EdgeEnd::End);
        let backward = walk(&edges, &index, &mut visited, seed, EdgeEnd::Start);

        // Backward pieces were collected walking away from the seed; flip
        // them so the whole chain runs in the seed's direction.
        let chain = backward
            .iter()
            .rev()
            .map(|&(i, reversed)| (i, !reversed))
            .chain(std::iter::once((seed, false)))
            .chain(forward.iter().copied());

        let mut spline: Option<QuadSpline> = None;
        for (i, reversed) in chain {
            let (from, ctrl, to) = edges[i].piece(reversed);
            spline.get_or_insert_with(|| QuadSpline::new(from)).push(ctrl, to);
        }
        match spline {
            Some(s) if s.arc_length() > MIN_CHAIN_LENGTH => splines.push(s),
            _ => debug!("Dropping zero-length chain at {:?}", edges[seed].from),
        }
    }
    debug!(
        "Assembled {} splines from {} edges",
        splines.len(),
        edges.len()
    );
    splines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    fn line(edges: &mut TrackEdges, from: TileCoord, heading: Heading, n: i32) -> TileCoord {
        let mut at = from;
        for _ in 0..n {
            let e = GridEdge::straight(heading);
            edges.insert(at, e);
            at = e.destination(at);
        }
        at
    }

    #[test]
    fn test_straight_run_is_one_spline() {
        let mut edges = TrackEdges::new();
        let end = line(&mut edges, TileCoord::new(0, 0), Heading::East, 5);
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 1);
        let s = &splines[0];
        assert_eq!(s.segments.len(), 5);
        let ends = [s.start, s.end()];
        assert!(ends.iter().any(|p| approx_eq(*p, TileCoord::new(0, 0).to_world())));
        assert!(ends.iter().any(|p| approx_eq(*p, end.to_world())));
    }

    #[test]
    fn test_reversed_edges_join_into_one_chain() {
        let mut edges = TrackEdges::new();
        line(&mut edges, TileCoord::new(0, 0), Heading::East, 3);
        // Second half stored pointing back towards the first half.
        line(&mut edges, TileCoord::new(6, 0), Heading::West, 3);
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 1);
        assert_eq!(splines[0].segments.len(), 6);
        assert!((splines[0].arc_length() - 6.0 * 8.0).abs() < 1e-2);
    }

    #[test]
    fn test_branch_splits_chains() {
        let mut edges = TrackEdges::new();
        let junction = line(&mut edges, TileCoord::new(0, 4), Heading::East, 3);
        line(&mut edges, junction, Heading::East, 3);
        let curve = GridEdge::curve(Heading::East, 1, 1);
        edges.insert(junction, curve);
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 3);
        let touching = splines
            .iter()
            .filter(|s| approx_eq(s.start, junction.to_world()) || approx_eq(s.end(), junction.to_world()))
            .count();
        assert_eq!(touching, 3);
    }

    #[test]
    fn test_crossing_of_different_axes_does_not_merge() {
        let mut edges = TrackEdges::new();
        line(&mut edges, TileCoord::new(0, 3), Heading::East, 6);
        line(&mut edges, TileCoord::new(3, 0), Heading::South, 6);
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 2);
        assert!(splines.iter().all(|s| s.segments.len() == 6));
    }

    #[test]
    fn test_right_angle_corners_break_chains() {
        let mut edges = TrackEdges::new();
        let mut at = TileCoord::new(4, 4);
        for h in [Heading::East, Heading::South, Heading::West, Heading::North] {
            at = line(&mut edges, at, h, 1);
        }
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 4);
    }

    #[test]
    fn test_closed_loop_becomes_one_spline() {
        let mut edges = TrackEdges::new();
        let start = TileCoord::new(10, 10);
        let mut at = start;
        let mut heading = Heading::East;
        for _ in 0..8 {
            let e = GridEdge::curve(heading, 1, 1);
            edges.insert(at, e);
            at = e.destination(at);
            heading = e.end_heading;
        }
        assert_eq!(at, start);
        let splines = assemble_track_splines(&edges);
        assert_eq!(splines.len(), 1);
        assert_eq!(splines[0].segments.len(), 8);
        assert!(approx_eq(splines[0].start, splines[0].end()));
    }

    #[test]
    fn test_empty_input() {
        assert!(assemble_track_splines(&TrackEdges::new()).is_empty());
    }
}
