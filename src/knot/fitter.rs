//! Bézier fitting through weave node midpoints.
//!
//! Anchors are the strand's node midpoints, unchanged in number and order.
//! Each anchor gets a tangent direction (from its neighbours or from the
//! framework edge, see [`HandleMode`]) and two handles along it whose lengths
//! scale linearly with `handle_length`.
//!
//! A closed strand of two nodes has the same neighbour on both sides, so its
//! anchors take opposite directions square to the chord instead and the
//! strand becomes a round loop.

use serde::Serialize;

use super::config::{HandleMode, KnotConfig};
use super::framework::FrameworkTopology;
use super::medial::{Route, WeaveGraph};
use super::tracer::Strand;
use crate::geom::{CubicBezier3, Curve3, Point3, Vec3, curve_arc_length};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BezierPoint {
    pub anchor: Point3,
    /// Incoming handle.
    pub left: Point3,
    /// Outgoing handle.
    pub right: Point3,
}

/// Piecewise cubic curve, one segment per strand link. Parameter `t` runs over
/// `0..segment_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BezierCurve {
    pub points: Vec<BezierPoint>,
    pub closed: bool,
}

impl BezierCurve {
    #[must_use]
    pub fn segment_count(&self) -> usize {
        match (self.points.len(), self.closed) {
            (0, _) => 0,
            (n, true) => n,
            (n, false) => n - 1,
        }
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> CubicBezier3 {
        let a = &self.points[index];
        let b = &self.points[(index + 1) % self.points.len()];
        CubicBezier3::new(a.anchor, a.right, b.left, b.anchor)
    }

    #[must_use]
    pub fn arc_length(&self, samples_per_segment: usize) -> f64 {
        curve_arc_length(self, samples_per_segment.max(1) * self.segment_count().max(1))
    }
}

impl Curve3 for BezierCurve {
    fn point_at(&self, t: f64) -> Point3 {
        let segments = self.segment_count();
        if segments == 0 {
            return self.points.first().map_or(Point3::ORIGIN, |p| p.anchor);
        }
        let t = t.clamp(0.0, segments as f64);
        let index = (t.floor() as usize).min(segments - 1);
        self.segment(index).point_at(t - index as f64)
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, self.segment_count() as f64)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[must_use]
pub fn fit_strand(strand: &Strand, graph: &WeaveGraph, topology: &FrameworkTopology, config: &KnotConfig) -> BezierCurve {
    let anchors: Vec<Point3> = strand.nodes.iter().map(|&n| graph.nodes[n].midpoint).collect();
    let n = anchors.len();
    let closed = strand.closed && n > 1;

    let neighbour = |i: usize, step: isize| -> Option<Point3> {
        let j = i as isize + step;
        if closed {
            Some(anchors[j.rem_euclid(n as isize) as usize])
        } else if (0..n as isize).contains(&j) {
            Some(anchors[j as usize])
        } else {
            None
        }
    };

    let bulge = (closed && n == 2).then(|| loop_bulge(strand, graph, topology, anchors[0], anchors[1]));

    let smoothness = config.corner_smoothness;
    let points = (0..n)
        .map(|i| {
            let anchor = anchors[i];
            let prev = neighbour(i, -1);
            let next = neighbour(i, 1);
            let prev_len = prev.map(|p| anchor.distance_to(p));
            let next_len = next.map(|p| anchor.distance_to(p));
            let (prev_len, next_len) = match (prev_len, next_len) {
                (Some(a), Some(b)) => (a, b),
                (Some(a), None) => (a, a),
                (None, Some(b)) => (b, b),
                (None, None) => (0.0, 0.0),
            };
            let average = 0.5 * (prev_len + next_len);

            let auto = match bulge {
                Some(side) if i == 0 => side,
                Some(side) => -side,
                None => auto_direction(anchor, prev, next),
            };
            let direction = match config.handle_mode {
                HandleMode::Auto => auto,
                HandleMode::Aligned { crossing_angle } => {
                    aligned_direction(topology, graph.nodes[strand.nodes[i]].edge, crossing_angle, auto)
                }
            };

            let span = |side: f64| config.handle_length * (smoothness * average + (1.0 - smoothness) * side);
            BezierPoint {
                anchor,
                left: anchor.add_vec(direction * -span(prev_len)),
                right: anchor.add_vec(direction * span(next_len)),
            }
        })
        .collect();

    BezierCurve { points, closed }
}

/// Central difference of the neighbours, one-sided at open ends.
fn auto_direction(anchor: Point3, prev: Option<Point3>, next: Option<Point3>) -> Vec3 {
    let central = match (prev, next) {
        (Some(p), Some(q)) => q.sub_point(p).normalized(),
        _ => None,
    };
    central
        .or_else(|| next.and_then(|q| q.sub_point(anchor).normalized()))
        .or_else(|| prev.and_then(|p| anchor.sub_point(p).normalized()))
        .unwrap_or(Vec3::ZERO)
}

/// Side a two-node loop bulges to at its first anchor: towards the point the
/// first link turns around, square to the chord. Falls back to the in-surface
/// perpendicular of the chord.
fn loop_bulge(strand: &Strand, graph: &WeaveGraph, topology: &FrameworkTopology, from: Point3, to: Point3) -> Vec3 {
    let Some(axis) = to.sub_point(from).normalized() else {
        return Vec3::ZERO;
    };
    let turn = strand
        .links
        .first()
        .map(|link| match graph.connections[link.connection].route {
            Route::Vertex { vertex } => topology.position(vertex),
            Route::Face { face, .. } => topology.face_centroid(face),
        });
    turn.and_then(|p| p.sub_point(from).reject_from(axis).normalized())
        .or_else(|| {
            let normal = topology.edge_normal(graph.nodes[strand.nodes[0]].edge);
            normal.cross(axis).normalized()
        })
        .unwrap_or(Vec3::ZERO)
}

/// Edge direction turned by `angle` towards the in-surface binormal, oriented
/// along the strand's travel.
fn aligned_direction(topology: &FrameworkTopology, edge: usize, angle: f64, travel: Vec3) -> Vec3 {
    let [a, b] = topology.edge(edge).vertices;
    let Some(edge_dir) = topology.position(b).sub_point(topology.position(a)).normalized() else {
        return travel;
    };
    let binormal = topology.edge_normal(edge).cross(edge_dir);
    let direction = (edge_dir * angle.cos() + binormal * angle.sin())
        .normalized()
        .unwrap_or(travel);
    if direction.dot(travel) < 0.0 { -direction } else { direction }
}
