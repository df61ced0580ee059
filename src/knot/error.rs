//! Errors that abort knot generation and warnings that annotate its output.

use std::fmt;

use serde::Serialize;

/// A place where strands pass and may cross: around a framework vertex or
/// through the interior of a framework face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Location {
    Vertex(usize),
    Face(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Vertex(v) => write!(f, "vertex {v}"),
            Location::Face(face) => write!(f, "face {face}"),
        }
    }
}

/// Framework meshes that cannot be woven. Raised before any generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("framework mesh has no edges")]
    EmptyMesh,
    #[error("vertex {vertex} has non-finite coordinates")]
    NonFiniteVertex { vertex: usize },
    #[error("face {face} has fewer than 3 vertices")]
    FaceTooSmall { face: usize },
    #[error("face {face} references vertex {vertex} which does not exist")]
    VertexOutOfRange { face: usize, vertex: usize },
    #[error("face {face} visits vertex {vertex} more than once")]
    RepeatedFaceVertex { face: usize, vertex: usize },
    #[error("wire edge {index} is invalid (out of range or a loop)")]
    InvalidWireEdge { index: usize },
    #[error("edge {edge} ({a}-{b}) has zero length")]
    DegenerateEdge { edge: usize, a: usize, b: usize },
    #[error("edge {edge} ({a}-{b}) is shared by {} faces: {faces:?}", .faces.len())]
    NonManifoldEdge {
        edge: usize,
        a: usize,
        b: usize,
        faces: Vec<usize>,
    },
    #[error("edge {edge} ({a}-{b}) is traversed in the same direction by both faces")]
    InconsistentOrientation { edge: usize, a: usize, b: usize },
    #[error("faces around vertex {vertex} do not form a single fan")]
    NonManifoldVertex { vertex: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("`{field}` must be finite and > 0 (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("`{field}` must be finite and >= 0 (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("`{field}` must be finite (got {value})")]
    NonFinite { field: &'static str, value: f64 },
    #[error("`corner_smoothness` must lie in 0..=1 (got {0})")]
    SmoothnessOutOfRange(f64),
    #[error("`{field}` must be at least {min} (got {value})")]
    TooFew { field: &'static str, min: usize, value: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum KnotError {
    #[error("invalid framework mesh: {0}")]
    Validation(#[from] ValidationError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type KnotResult<T> = Result<T, KnotError>;

/// Broad class of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningClass {
    Topology,
    Geometry,
}

/// Recoverable issues reported next to the generated knot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnotWarning {
    /// A vertex with fewer than two incident edges; its ends terminate strands.
    DegenerateVertex { vertex: usize, degree: usize },
    /// An odd-degree vertex that found no partner across a face.
    UnpairedOddVertex { vertex: usize, edge: usize },
    /// Over/under could not alternate at this crossing.
    NonAlternatingCrossing { crossing: usize, location: Location },
    /// The profile was shrunk to keep the sweep free of self-overlap.
    ProfileClamped {
        strand: usize,
        edge: usize,
        requested: f64,
        applied: f64,
    },
    /// The sweep for a strand failed; the curve is still reported.
    StrandSkipped { strand: usize, edge: usize, reason: String },
}

impl KnotWarning {
    #[must_use]
    pub fn class(&self) -> WarningClass {
        match self {
            KnotWarning::DegenerateVertex { .. }
            | KnotWarning::UnpairedOddVertex { .. }
            | KnotWarning::NonAlternatingCrossing { .. } => WarningClass::Topology,
            KnotWarning::ProfileClamped { .. } | KnotWarning::StrandSkipped { .. } => {
                WarningClass::Geometry
            }
        }
    }
}

impl fmt::Display for KnotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnotWarning::DegenerateVertex { vertex, degree } => {
                write!(f, "vertex {vertex} has degree {degree}; its strands end there")
            }
            KnotWarning::UnpairedOddVertex { vertex, edge } => write!(
                f,
                "odd vertex {vertex} has no partner; strand through edge {edge} ends there"
            ),
            KnotWarning::NonAlternatingCrossing { crossing, location } => {
                write!(f, "crossing {crossing} at {location} does not alternate")
            }
            KnotWarning::ProfileClamped {
                strand,
                edge,
                requested,
                applied,
            } => write!(
                f,
                "strand {strand}: profile clamped near edge {edge} from {requested:.6} to {applied:.6}"
            ),
            KnotWarning::StrandSkipped { strand, edge, reason } => {
                write!(f, "strand {strand} (edge {edge}) not extruded: {reason}")
            }
        }
    }
}

/// Pushes a warning and mirrors it to the log.
pub(crate) fn push_warning(warnings: &mut Vec<KnotWarning>, warning: KnotWarning) {
    log::warn!("{warning}");
    warnings.push(warning);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_manifold_message_names_edge_and_faces() {
        let err = ValidationError::NonManifoldEdge {
            edge: 3,
            a: 0,
            b: 1,
            faces: vec![0, 1, 2],
        };
        let message = err.to_string();
        assert!(message.contains("edge 3"));
        assert!(message.contains("3 faces"));
    }

    #[test]
    fn warnings_are_classified() {
        let clamp = KnotWarning::ProfileClamped {
            strand: 0,
            edge: 1,
            requested: 1.0,
            applied: 0.5,
        };
        assert_eq!(clamp.class(), WarningClass::Geometry);
        let crossing = KnotWarning::NonAlternatingCrossing {
            crossing: 2,
            location: Location::Face(4),
        };
        assert_eq!(crossing.class(), WarningClass::Topology);
        assert!(crossing.to_string().contains("face 4"));
    }

    #[test]
    fn validation_converts_into_knot_error() {
        let err: KnotError = ValidationError::EmptyMesh.into();
        assert!(matches!(err, KnotError::Validation(ValidationError::EmptyMesh)));
    }
}
