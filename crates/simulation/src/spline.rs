//! Quadratic Bézier splines and their tessellated polyline form.
//!
//! Track geometry is authored as a [`QuadSpline`]: a start point followed by
//! a chain of quadratic pieces. Trains never move along the curves directly;
//! every spline is tessellated once into a [`LinSpline`] with cached segment
//! lengths, and cars are [`SplinePoint`] cursors into that polyline.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerance for "reached the end of a segment" comparisons.
const DISTANCE_EPSILON: f32 = 1e-4;

/// Number of samples used when measuring a single Bézier piece.
const ARC_LENGTH_SAMPLES: usize = 32;

/// Evaluate a quadratic Bézier at parameter `t` in [0, 1].
pub fn quad_bezier(p0: Vec3, p1: Vec3, p2: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Approximate arc length of a quadratic Bézier by polyline sampling.
pub fn quad_bezier_length(p0: Vec3, p1: Vec3, p2: Vec3) -> f32 {
    let mut length = 0.0;
    let mut prev = p0;
    for i in 1..=ARC_LENGTH_SAMPLES {
        let t = i as f32 / ARC_LENGTH_SAMPLES as f32;
        let p = quad_bezier(p0, p1, p2, t);
        length += (p - prev).length();
        prev = p;
    }
    length
}

// ---------------------------------------------------------------------------
// QuadSpline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadSegment {
    pub ctrl: Vec3,
    pub to: Vec3,
}

/// A start point followed by quadratic pieces, each beginning where the
/// previous one ended.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadSpline {
    pub start: Vec3,
    pub segments: Vec<QuadSegment>,
}

impl QuadSpline {
    pub fn new(start: Vec3) -> Self {
        Self {
            start,
            segments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, ctrl: Vec3, to: Vec3) {
        self.segments.push(QuadSegment { ctrl, to });
    }

    /// Append a straight piece (control point at the midpoint).
    pub fn push_straight(&mut self, to: Vec3) {
        let from = self.end();
        self.push((from + to) * 0.5, to);
    }

    pub fn end(&self) -> Vec3 {
        self.segments.last().map_or(self.start, |s| s.to)
    }

    /// Start point of piece `i`.
    fn piece_start(&self, i: usize) -> Vec3 {
        if i == 0 {
            self.start
        } else {
            self.segments[i - 1].to
        }
    }

    /// Same curve traversed in the opposite direction.
    pub fn reversed(&self) -> QuadSpline {
        let mut out = QuadSpline::new(self.end());
        for i in (0..self.segments.len()).rev() {
            out.push(self.segments[i].ctrl, self.piece_start(i));
        }
        out
    }

    /// Append `other`, which must start where this spline ends.
    pub fn extend(&mut self, other: &QuadSpline) {
        self.segments.extend_from_slice(&other.segments);
    }

    /// Direction of travel when leaving the start point.
    pub fn start_tangent(&self) -> Vec3 {
        let Some(first) = self.segments.first() else {
            return Vec3::ZERO;
        };
        let t = first.ctrl - self.start;
        if t.length_squared() > DISTANCE_EPSILON {
            t.normalize()
        } else {
            (first.to - self.start).normalize_or_zero()
        }
    }

    /// Direction of travel when arriving at the end point.
    pub fn end_tangent(&self) -> Vec3 {
        let Some(last) = self.segments.last() else {
            return Vec3::ZERO;
        };
        let t = last.to - last.ctrl;
        if t.length_squared() > DISTANCE_EPSILON {
            t.normalize()
        } else {
            (last.to - self.piece_start(self.segments.len() - 1)).normalize_or_zero()
        }
    }

    pub fn arc_length(&self) -> f32 {
        (0..self.segments.len())
            .map(|i| {
                let s = self.segments[i];
                quad_bezier_length(self.piece_start(i), s.ctrl, s.to)
            })
            .sum()
    }

    /// Convert to a polyline with `resolution` line segments per piece.
    pub fn tessellate(&self, resolution: usize) -> LinSpline {
        let resolution = resolution.max(1);
        let mut points = Vec::with_capacity(self.segments.len() * resolution);
        for (i, seg) in self.segments.iter().enumerate() {
            let from = self.piece_start(i);
            for step in 1..=resolution {
                let t = step as f32 / resolution as f32;
                points.push(quad_bezier(from, seg.ctrl, seg.to, t));
            }
        }
        LinSpline::from_points(self.start, points)
    }
}

// ---------------------------------------------------------------------------
// LinSpline
// ---------------------------------------------------------------------------

/// Cursor into a [`LinSpline`]: segment index plus distance along it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SplinePoint {
    pub segment_index: usize,
    pub distance: f32,
}

impl SplinePoint {
    pub fn new(segment_index: usize, distance: f32) -> Self {
        Self {
            segment_index,
            distance,
        }
    }
}

/// Outcome of moving a cursor along a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineMove {
    /// Distance actually travelled.
    pub consumed: f32,
    /// The cursor stopped at the end it was moving towards.
    pub reached_end: bool,
}

/// A start point followed by line segment end points, with cached lengths.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinSpline {
    pub start: Vec3,
    pub points: Vec<Vec3>,
    lengths: Vec<f32>,
}

impl LinSpline {
    pub fn from_points(start: Vec3, points: Vec<Vec3>) -> Self {
        let mut lengths = Vec::with_capacity(points.len());
        let mut prev = start;
        for &p in &points {
            lengths.push((p - prev).length());
            prev = p;
        }
        Self {
            start,
            points,
            lengths,
        }
    }

    pub fn segment_count(&self) -> usize {
        self.points.len()
    }

    pub fn segment_length(&self, index: usize) -> f32 {
        self.lengths.get(index).copied().unwrap_or(0.0)
    }

    pub fn total_length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    pub fn end(&self) -> Vec3 {
        self.points.last().copied().unwrap_or(self.start)
    }

    fn segment_start(&self, index: usize) -> Vec3 {
        if index == 0 {
            self.start
        } else {
            self.points[index - 1]
        }
    }

    pub fn start_point(&self) -> SplinePoint {
        SplinePoint::new(0, 0.0)
    }

    pub fn end_point(&self) -> SplinePoint {
        match self.lengths.len() {
            0 => SplinePoint::new(0, 0.0),
            n => SplinePoint::new(n - 1, self.lengths[n - 1]),
        }
    }

    /// Arc-length distance of a cursor from the start of the polyline.
    pub fn distance_from_start(&self, point: SplinePoint) -> f32 {
        let before: f32 = self.lengths.iter().take(point.segment_index).sum();
        before + point.distance
    }

    pub fn distance_to_end(&self, point: SplinePoint) -> f32 {
        (self.total_length() - self.distance_from_start(point)).max(0.0)
    }

    /// World position of a cursor.
    pub fn position_at(&self, point: SplinePoint) -> Vec3 {
        if self.points.is_empty() {
            return self.start;
        }
        let i = point.segment_index.min(self.points.len() - 1);
        let from = self.segment_start(i);
        let to = self.points[i];
        let len = self.lengths[i];
        if len <= DISTANCE_EPSILON {
            return to;
        }
        from.lerp(to, (point.distance / len).clamp(0.0, 1.0))
    }

    /// Move a cursor towards the end by `distance`. Stops at the final point.
    /// A cursor that lands exactly on a segment boundary stays in the lower
    /// segment.
    pub fn advance(&self, point: &mut SplinePoint, distance: f32) -> SplineMove {
        if self.lengths.is_empty() {
            *point = self.start_point();
            return SplineMove {
                consumed: 0.0,
                reached_end: true,
            };
        }
        let last = self.lengths.len() - 1;
        point.segment_index = point.segment_index.min(last);
        let mut remaining = distance.max(0.0);
        let mut consumed = 0.0;
        loop {
            let len = self.lengths[point.segment_index];
            let room = (len - point.distance).max(0.0);
            if remaining <= room {
                point.distance += remaining;
                consumed += remaining;
                break;
            }
            consumed += room;
            remaining -= room;
            if point.segment_index == last {
                point.distance = len;
                break;
            }
            point.segment_index += 1;
            point.distance = 0.0;
        }
        let end = self.end_point();
        SplineMove {
            consumed,
            reached_end: point.segment_index == end.segment_index
                && point.distance >= end.distance - DISTANCE_EPSILON,
        }
    }

    /// Move a cursor towards the start by `distance`. Stops at the first
    /// point. A cursor that lands exactly on a segment boundary moves to the
    /// end of the lower segment, as `advance` leaves it.
    pub fn reverse(&self, point: &mut SplinePoint, distance: f32) -> SplineMove {
        if self.lengths.is_empty() {
            *point = self.start_point();
            return SplineMove {
                consumed: 0.0,
                reached_end: true,
            };
        }
        point.segment_index = point.segment_index.min(self.lengths.len() - 1);
        let mut remaining = distance.max(0.0);
        let mut consumed = 0.0;
        loop {
            let room = point.distance.max(0.0);
            if remaining < room || (remaining <= room && point.segment_index == 0) {
                point.distance -= remaining;
                consumed += remaining;
                break;
            }
            consumed += room;
            remaining -= room;
            if point.segment_index == 0 {
                point.distance = 0.0;
                break;
            }
            point.segment_index -= 1;
            point.distance = self.lengths[point.segment_index];
        }
        SplineMove {
            consumed,
            reached_end: point.segment_index == 0 && point.distance <= DISTANCE_EPSILON,
        }
    }
}
