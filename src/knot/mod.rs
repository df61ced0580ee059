//! Celtic knot generation over a polygonal framework.
//!
//! ```ignore
//! let output = generate_knot(&primitives::octahedron(), &KnotConfig::default())?;
//! for solid in &output.solids {
//!     println!("strand {}: {}", solid.strand, solid.diagnostics.summary());
//! }
//! ```

pub mod config;
pub mod crossing;
pub mod error;
pub mod extrude;
pub mod fitter;
pub mod framework;
pub mod medial;
pub mod pipeline;
pub mod primitives;
pub mod tracer;

pub use config::{GapConfig, HandleMode, KnotConfig, Profile, ProfileType};
pub use crossing::{Crossing, CrossingEvent, CrossingTable, PassRef, resolve_crossings};
pub use error::{ConfigError, KnotError, KnotResult, KnotWarning, Location, ValidationError, WarningClass};
pub use extrude::{ExtrudedSolid, ProfileClamp, extrude_strand};
pub use fitter::{BezierCurve, BezierPoint, fit_strand};
pub use framework::{FrameworkEdge, FrameworkMesh, FrameworkTopology, VertexRotation};
pub use medial::{Connection, Pass, Route, WeaveGraph, WeaveNode, build_weave_graph};
pub use pipeline::{CurveExport, ExportedCurve, KnotOutput, generate_knot};
pub use tracer::{Strand, StrandLink, trace_strands};

#[cfg(test)]
mod tests;
