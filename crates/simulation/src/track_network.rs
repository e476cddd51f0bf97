//! Track segments and the directed connectivity between them.
//!
//! A [`Connection`] is a segment travelled in a direction: `to_high_end`
//! means the train moves from the segment's start towards its end. Each
//! segment stores, for both of its ends, the connections a train may take
//! after arriving at that end. Connectivity is symmetric: if B continues A
//! then A (reversed) continues B (reversed).

use std::collections::BTreeMap;

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::TESSELLATION_RESOLUTION;
use crate::spline::{LinSpline, QuadSpline, SplinePoint};
use crate::station_layout::TrackStation;

/// Endpoint positions are matched on a grid this many times finer than a
/// unit.
const POSITION_QUANTUM: f32 = 64.0;

/// Minimum cosine between travel directions for two ends to be joined.
const MIN_ALIGNMENT: f32 = 0.9;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Connection {
    pub segment_index: u32,
    pub to_high_end: bool,
}

impl Connection {
    pub fn new(segment_index: u32, to_high_end: bool) -> Self {
        Self {
            segment_index,
            to_high_end,
        }
    }

    pub fn reversed(self) -> Self {
        Self::new(self.segment_index, !self.to_high_end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSegment {
    pub spline: QuadSpline,
    pub tessellated: LinSpline,
    /// Continuations for a train arriving at the low end.
    pub connects_at_low_end: Vec<Connection>,
    /// Continuations for a train arriving at the high end.
    pub connects_at_high_end: Vec<Connection>,
}

impl TrackSegment {
    pub fn new(spline: QuadSpline) -> Self {
        let tessellated = spline.tessellate(TESSELLATION_RESOLUTION);
        Self {
            spline,
            tessellated,
            connects_at_low_end: Vec::new(),
            connects_at_high_end: Vec::new(),
        }
    }

    pub fn length(&self) -> f32 {
        self.tessellated.total_length()
    }

    pub fn continuations(&self, at_high_end: bool) -> &[Connection] {
        if at_high_end {
            &self.connects_at_high_end
        } else {
            &self.connects_at_low_end
        }
    }
}

/// Choices available at the end of a travelled connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Branches<'a> {
    /// Dead end.
    None,
    Single(Connection),
    /// A junction; the order is the branch order used by switch states.
    Multi(&'a [Connection]),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackNetwork {
    pub segments: Vec<TrackSegment>,
    pub stations: Vec<TrackStation>,
    /// Connections a newly spawned train may start on.
    pub entrances: Vec<Connection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct PositionKey(i64, i64);

impl PositionKey {
    fn of(p: Vec3) -> Self {
        Self(
            (p.x * POSITION_QUANTUM).round() as i64,
            (p.z * POSITION_QUANTUM).round() as i64,
        )
    }
}

/// One end of one segment, with the direction a train travels when it
/// arrives there.
#[derive(Debug, Clone, Copy)]
struct SegmentEnd {
    segment: u32,
    high: bool,
    arriving: Vec3,
}

impl TrackNetwork {
    /// Build segments and connectivity from raw splines.
    ///
    /// First every segment end is registered by position, then each end is
    /// linked to every other segment end at the same position whose
    /// departing direction continues the arriving one.
    pub fn build(splines: Vec<QuadSpline>, stations: Vec<TrackStation>) -> Self {
        let mut segments: Vec<TrackSegment> = splines.into_iter().map(TrackSegment::new).collect();

        let mut ends: BTreeMap<PositionKey, Vec<SegmentEnd>> = BTreeMap::new();
        for (i, seg) in segments.iter().enumerate() {
            let i = i as u32;
            ends.entry(PositionKey::of(seg.spline.start))
                .or_default()
                .push(SegmentEnd {
                    segment: i,
                    high: false,
                    arriving: -seg.spline.start_tangent(),
                });
            ends.entry(PositionKey::of(seg.spline.end()))
                .or_default()
                .push(SegmentEnd {
                    segment: i,
                    high: true,
                    arriving: seg.spline.end_tangent(),
                });
        }

        for group in ends.values() {
            for a in group {
                for b in group {
                    if a.segment == b.segment {
                        continue;
                    }
                    // Leaving through b's end travels against b's arriving
                    // direction.
                    if a.arriving.dot(-b.arriving) < MIN_ALIGNMENT {
                        continue;
                    }
                    let next = Connection::new(b.segment, !b.high);
                    let seg = &mut segments[a.segment as usize];
                    let list = if a.high {
                        &mut seg.connects_at_high_end
                    } else {
                        &mut seg.connects_at_low_end
                    };
                    if !list.contains(&next) {
                        list.push(next);
                    }
                }
            }
        }

        let entrances = segments
            .iter()
            .enumerate()
            .flat_map(|(i, seg)| {
                let i = i as u32;
                let low = seg
                    .connects_at_low_end
                    .is_empty()
                    .then_some(Connection::new(i, true));
                let high = seg
                    .connects_at_high_end
                    .is_empty()
                    .then_some(Connection::new(i, false));
                low.into_iter().chain(high)
            })
            .collect();

        Self {
            segments,
            stations,
            entrances,
        }
    }

    pub fn segment(&self, index: u32) -> Option<&TrackSegment> {
        self.segments.get(index as usize)
    }

    /// Choices for a train that has travelled `conn` to its far end.
    pub fn branches(&self, conn: Connection) -> Branches<'_> {
        let Some(seg) = self.segment(conn.segment_index) else {
            return Branches::None;
        };
        match seg.continuations(conn.to_high_end) {
            [] => Branches::None,
            [single] => Branches::Single(*single),
            many => Branches::Multi(many),
        }
    }

    /// World position of the end a train travelling `conn` is heading to.
    pub fn junction_position(&self, conn: Connection) -> Option<Vec3> {
        let seg = self.segment(conn.segment_index)?;
        Some(if conn.to_high_end {
            seg.spline.end()
        } else {
            seg.spline.start
        })
    }

    /// Cursor where a train entering via `conn` starts.
    pub fn entry_point(&self, conn: Connection) -> Option<SplinePoint> {
        let seg = self.segment(conn.segment_index)?;
        Some(if conn.to_high_end {
            seg.tessellated.start_point()
        } else {
            seg.tessellated.end_point()
        })
    }

    /// Distance left to travel on `conn` from `point`.
    pub fn remaining_on(&self, conn: Connection, point: SplinePoint) -> f32 {
        let Some(seg) = self.segment(conn.segment_index) else {
            return 0.0;
        };
        if conn.to_high_end {
            seg.tessellated.distance_to_end(point)
        } else {
            seg.tessellated.distance_from_start(point)
        }
    }

    /// All junctions: travelled connections that arrive at more than one
    /// continuation.
    pub fn junctions(&self) -> impl Iterator<Item = Connection> + '_ {
        self.segments.iter().enumerate().flat_map(|(i, seg)| {
            [false, true].into_iter().filter_map(move |high| {
                (seg.continuations(high).len() > 1).then_some(Connection::new(i as u32, high))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight(from: Vec3, to: Vec3) -> QuadSpline {
        let mut q = QuadSpline::new(from);
        q.push_straight(to);
        q
    }

    fn v(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    /// A line split into two segments at x = 16, plus a branch curving away
    /// from the split point.
    fn fork() -> TrackNetwork {
        let mut branch = QuadSpline::new(v(16.0, 0.0));
        branch.push(v(24.0, 0.0), v(24.0, 8.0));
        TrackNetwork::build(
            vec![
                straight(v(0.0, 0.0), v(16.0, 0.0)),
                straight(v(16.0, 0.0), v(32.0, 0.0)),
                branch,
            ],
            Vec::new(),
        )
    }

    #[test]
    fn test_fork_connectivity() {
        let net = fork();
        let at_fork = net.branches(Connection::new(0, true));
        let Branches::Multi(choices) = at_fork else {
            panic!("expected a junction, got {at_fork:?}");
        };
        assert_eq!(choices.len(), 2);
        assert!(choices.contains(&Connection::new(1, true)));
        assert!(choices.contains(&Connection::new(2, true)));
        assert_eq!(
            net.branches(Connection::new(1, false)),
            Branches::Single(Connection::new(0, false))
        );
        assert_eq!(
            net.branches(Connection::new(2, false)),
            Branches::Single(Connection::new(0, false))
        );
    }

    #[test]
    fn test_branches_do_not_connect_to_each_other() {
        let net = fork();
        let from_branch = net.segments[2].continuations(false);
        assert!(!from_branch.contains(&Connection::new(1, true)));
    }

    #[test]
    fn test_connectivity_is_symmetric() {
        let net = fork();
        for (i, seg) in net.segments.iter().enumerate() {
            for high in [false, true] {
                for c in seg.continuations(high) {
                    // Arriving at our end via `c` reversed must list us.
                    let back = net.segments[c.segment_index as usize].continuations(!c.to_high_end);
                    let us = Connection::new(i as u32, !high);
                    assert!(back.contains(&us), "segment {i} high={high} -> {c:?} not mirrored");
                }
            }
        }
    }

    #[test]
    fn test_entrances_are_dead_ends() {
        let net = fork();
        assert_eq!(net.entrances.len(), 3);
        assert!(net.entrances.contains(&Connection::new(0, true)));
        assert!(net.entrances.contains(&Connection::new(1, false)));
        assert!(net.entrances.contains(&Connection::new(2, false)));
        for e in &net.entrances {
            let starting_end = !e.to_high_end;
            assert!(net.segments[e.segment_index as usize]
                .continuations(starting_end)
                .is_empty());
        }
    }

    #[test]
    fn test_misaligned_ends_do_not_connect() {
        // Two segments leaving the same point at 45 degrees to each other.
        let net = TrackNetwork::build(
            vec![
                straight(v(0.0, 0.0), v(8.0, 0.0)),
                straight(v(0.0, 0.0), v(8.0, 8.0)),
            ],
            Vec::new(),
        );
        assert!(net.segments[0].connects_at_low_end.is_empty());
        assert!(net.segments[1].connects_at_low_end.is_empty());
    }

    #[test]
    fn test_junction_position_and_entry_point() {
        let net = fork();
        assert_eq!(net.junction_position(Connection::new(0, true)), Some(v(16.0, 0.0)));
        assert_eq!(net.junction_position(Connection::new(0, false)), Some(v(0.0, 0.0)));
        let entry = net.entry_point(Connection::new(1, false)).unwrap();
        assert_eq!(entry, net.segments[1].tessellated.end_point());
        assert!(net.junction_position(Connection::new(9, true)).is_none());
        assert_eq!(net.branches(Connection::new(9, true)), Branches::None);
        assert_eq!(net.junctions().collect::<Vec<_>>(), vec![Connection::new(0, true)]);
    }
}
