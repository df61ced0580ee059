//! End-to-end knot generation.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;

use super::config::KnotConfig;
use super::crossing::{CrossingTable, resolve_crossings};
use super::error::{KnotResult, KnotWarning, push_warning};
use super::extrude::{ExtrudedSolid, extrude_strand};
use super::fitter::{BezierCurve, BezierPoint, fit_strand};
use super::framework::{FrameworkMesh, FrameworkTopology};
use super::medial::{WeaveGraph, build_weave_graph};
use super::tracer::{Strand, trace_strands};
use crate::geom::{GeomMesh, GeomMeshDiagnostics, KnotMetrics, KnotTimingReport, SweepError, TimingBucket, Tolerance};

#[derive(Debug, Clone, Serialize)]
pub struct KnotOutput {
    pub strands: Vec<Strand>,
    /// One curve per strand, same order.
    pub curves: Vec<BezierCurve>,
    /// One solid per strand that could be swept. Empty with `curves_only`.
    pub solids: Vec<ExtrudedSolid>,
    pub merged: Option<GeomMesh>,
    pub crossings: CrossingTable,
    pub warnings: Vec<KnotWarning>,
    pub timing: Option<KnotTimingReport>,
}

/// Control points of every strand, for editing outside the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveExport {
    pub curves: Vec<ExportedCurve>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedCurve {
    pub strand: usize,
    pub closed: bool,
    /// Framework edge under each anchor.
    pub edges: Vec<usize>,
    pub points: Vec<BezierPoint>,
}

impl KnotOutput {
    #[must_use]
    pub fn curve_export(&self) -> CurveExport {
        CurveExport {
            curves: self
                .strands
                .iter()
                .zip(&self.curves)
                .enumerate()
                .map(|(strand, (s, curve))| ExportedCurve {
                    strand,
                    closed: curve.closed,
                    edges: s.nodes.clone(),
                    points: curve.points.clone(),
                })
                .collect(),
        }
    }

    /// Combined diagnostics of all solids.
    #[must_use]
    pub fn diagnostics(&self) -> GeomMeshDiagnostics {
        let mut diagnostics = GeomMeshDiagnostics::new();
        for solid in &self.solids {
            diagnostics.merge(&solid.diagnostics);
        }
        diagnostics.timing.clone_from(&self.timing);
        diagnostics
    }
}

/// Runs the full pipeline. Validation and configuration errors abort with no
/// output; everything else is reported in [`KnotOutput::warnings`].
pub fn generate_knot(mesh: &FrameworkMesh, config: &KnotConfig) -> KnotResult<KnotOutput> {
    config.validate()?;
    let tol = Tolerance::new(config.tolerance);

    let mut metrics = KnotMetrics::default();
    metrics.begin();

    let topology = metrics.time(TimingBucket::Validation, || FrameworkTopology::build(mesh, tol))?;

    let mut warnings = Vec::new();
    let graph = metrics.time(TimingBucket::MedialGraph, || {
        build_weave_graph(&topology, &config.gap, &mut warnings)
    });
    let strands = metrics.time(TimingBucket::Tracing, || trace_strands(&graph));
    let crossings = metrics.time(TimingBucket::Crossings, || {
        resolve_crossings(&graph, &strands, config.alternation_seed, &mut warnings)
    });

    let curves = metrics.time(TimingBucket::Fitting, || {
        map_strands(strands.len(), |i| fit_strand(&strands[i], &graph, &topology, config))
    });

    let mut solids = Vec::new();
    if !config.curves_only {
        let results = metrics.time(TimingBucket::Extrusion, || {
            map_strands(strands.len(), |i| {
                extrude_strand(i, &strands[i], &curves[i], &crossings, &graph, &topology, config)
            })
        });
        for (index, result) in results.into_iter().enumerate() {
            let edges = strand_edges(&strands[index], &graph);
            collect_solid(index, result, &edges, config.samples_per_segment, &mut solids, &mut warnings);
        }
    }

    let merged = metrics.time(TimingBucket::Diagnostics, || {
        config.merge_output.then(|| {
            let mut merged = GeomMesh::default();
            for solid in &solids {
                merged.append(&solid.mesh);
            }
            merged
        })
    });

    log::debug!(
        "knot: {} strands, {} crossings, {} solids, {} warnings",
        strands.len(),
        crossings.len(),
        solids.len(),
        warnings.len()
    );

    Ok(KnotOutput {
        strands,
        curves,
        solids,
        merged,
        crossings,
        warnings,
        timing: metrics.end(),
    })
}

fn strand_edges(strand: &Strand, graph: &WeaveGraph) -> Vec<usize> {
    strand.nodes.iter().map(|&n| graph.nodes[n].edge).collect()
}

/// Keeps a swept solid or turns its failure into a warning. `edges` lists the
/// framework edge under every anchor of the strand.
fn collect_solid(
    index: usize,
    result: Result<ExtrudedSolid, SweepError>,
    edges: &[usize],
    samples_per_segment: usize,
    solids: &mut Vec<ExtrudedSolid>,
    warnings: &mut Vec<KnotWarning>,
) {
    match result {
        Ok(solid) => {
            if let Some(clamp) = solid.clamp {
                push_warning(
                    warnings,
                    KnotWarning::ProfileClamped {
                        strand: index,
                        edge: clamp.edge,
                        requested: clamp.requested,
                        applied: clamp.applied,
                    },
                );
            }
            solids.push(solid);
        }
        Err(err) => {
            let anchor = match err {
                SweepError::CuspNotSupported { index: sample } => sample / samples_per_segment.max(1),
                _ => 0,
            };
            let edge = if edges.is_empty() { 0 } else { edges[anchor % edges.len()] };
            push_warning(
                warnings,
                KnotWarning::StrandSkipped {
                    strand: index,
                    edge,
                    reason: err.to_string(),
                },
            );
        }
    }
}

#[cfg(feature = "parallel")]
fn map_strands<T: Send>(count: usize, f: impl Fn(usize) -> T + Sync + Send) -> Vec<T> {
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
fn map_strands<T>(count: usize, f: impl Fn(usize) -> T) -> Vec<T> {
    (0..count).map(f).collect()
}
