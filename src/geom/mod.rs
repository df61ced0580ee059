mod core;
mod curve;
mod diagnostics;
mod frame;
mod mesh;
mod metrics;
mod sweep;

pub use core::{BBox, Point3, Tolerance, Vec3};
pub use curve::{CubicBezier3, Curve3, circumradius, curve_arc_length, tessellate_curve_uniform};
pub use diagnostics::GeomMeshDiagnostics;
pub use frame::{FrenetFrame, compute_rail_frames, parallel_transport_frame, rotate_vector};
pub use mesh::{GeomMesh, mesh_edge_topology};
pub use metrics::{KnotMetrics, KnotTimingReport, TimingBucket};
pub use sweep::{RadiusClamp, SweepError, SweepOptions, SweepProfile, SweepResult, sweep_profile};

#[cfg(test)]
mod tests;
