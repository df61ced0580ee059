//! Strand solids.
//!
//! The fitted curve is sampled per segment and every sample is lifted or
//! dropped along the crossing normal by a cosine bump centred on each crossing
//! event. The displaced rail is then swept with the configured profile.

use std::f64::consts::PI;

use serde::Serialize;

use super::config::{KnotConfig, Profile};
use super::crossing::{CrossingEvent, CrossingTable};
use super::fitter::BezierCurve;
use super::framework::FrameworkTopology;
use super::medial::WeaveGraph;
use super::tracer::Strand;
use crate::geom::{
    Curve3, GeomMesh, GeomMeshDiagnostics, Point3, SweepError, SweepOptions, Tolerance, Vec3, sweep_profile,
};

/// Fraction of the closest anchor spacing a profile half-extent may reach.
const SPACING_SAFETY: f64 = 0.45;

/// Profile shrink applied to one strand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileClamp {
    /// Framework edge of the weave node nearest to the limiting spot.
    pub edge: usize,
    pub requested: f64,
    pub applied: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtrudedSolid {
    pub strand: usize,
    pub mesh: GeomMesh,
    pub diagnostics: GeomMeshDiagnostics,
    /// Profile actually swept, after clamping.
    pub profile: Profile,
    pub clamp: Option<ProfileClamp>,
}

/// Samples `curve` and applies the over/under offsets of `events`.
#[must_use]
pub fn displaced_rail(
    curve: &BezierCurve,
    events: &[CrossingEvent],
    table: &CrossingTable,
    topology: &FrameworkTopology,
    config: &KnotConfig,
) -> Vec<Point3> {
    let segments = curve.segment_count();
    let samples = config.samples_per_segment.max(1);
    let (up, down) = (config.weave_up(), config.weave_down());

    let mut rail = Vec::with_capacity(segments * samples + 1);
    for k in 0..segments {
        for s in 0..samples {
            let local = s as f64 / samples as f64;
            let offset = events
                .iter()
                .filter(|event| event.link == k)
                .fold(Vec3::ZERO, |acc, event| {
                    let distance = (local - event.segment_parameter()).abs() / event.half_width();
                    if distance >= 1.0 {
                        return acc;
                    }
                    let weight = 0.5 * (1.0 + (PI * distance).cos());
                    let height = if event.over { up } else { -down };
                    let normal = topology.normal_at(table.crossings[event.crossing].location);
                    acc + normal * (height * weight)
                });
            rail.push(curve.point_at(k as f64 + local).add_vec(offset));
        }
    }
    if !curve.closed {
        rail.push(curve.point_at(segments as f64));
    }
    rail
}

/// Sweeps the configured profile along one strand.
pub fn extrude_strand(
    index: usize,
    strand: &Strand,
    curve: &BezierCurve,
    table: &CrossingTable,
    graph: &WeaveGraph,
    topology: &FrameworkTopology,
    config: &KnotConfig,
) -> Result<ExtrudedSolid, SweepError> {
    let rail = displaced_rail(curve, table.events_for(index), table, topology, config);

    let spacing = closest_anchor_spacing(curve);
    let options = SweepOptions {
        radial_segments: config.radial_segments,
        caps: true,
        max_guard_radius: spacing.map(|(_, d)| SPACING_SAFETY * d),
        up: strand.nodes.first().map(|&n| topology.edge_normal(graph.nodes[n].edge)),
    };

    let result = sweep_profile(
        &rail,
        curve.closed,
        config.profile.to_sweep_profile(),
        options,
        Tolerance::new(config.tolerance),
    )?;

    let samples = config.samples_per_segment.max(1);
    let clamp = result.clamp.map(|clamp| {
        let anchor = match clamp.sample {
            Some(sample) => (sample + samples / 2) / samples,
            None => spacing.map_or(0, |(segment, _)| segment),
        };
        let node = strand.nodes[anchor % strand.nodes.len()];
        ProfileClamp {
            edge: graph.nodes[node].edge,
            requested: clamp.requested,
            applied: clamp.applied,
        }
    });

    Ok(ExtrudedSolid {
        strand: index,
        mesh: result.mesh,
        diagnostics: result.diagnostics,
        profile: Profile::from_sweep_profile(result.profile),
        clamp,
    })
}

/// Segment with the shortest anchor-to-anchor distance.
fn closest_anchor_spacing(curve: &BezierCurve) -> Option<(usize, f64)> {
    (0..curve.segment_count())
        .map(|k| {
            let segment = curve.segment(k);
            (k, segment.p0.distance_to(segment.p3))
        })
        .filter(|(_, d)| d.is_finite() && *d > 0.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
