//! Mesh diagnostics returned alongside every swept solid.
//!
//! Diagnostics record topology counts (open and non-manifold edges), the
//! repairs applied by `finalize_mesh` (welding, winding fixes, degenerate
//! culling) and human-readable warnings such as radius guards.
//!
//! ```ignore
//! let (mesh, diagnostics) = sweep_profile(&rail, &profile, options, tol)?;
//! if !diagnostics.is_valid_solid() {
//!     log::warn!("{}", diagnostics.summary());
//! }
//! ```

use std::fmt;

use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Number of vertices merged during tolerance-based welding.
    pub welded_vertex_count: usize,

    /// Number of triangles whose winding order was corrected for consistency.
    pub flipped_triangle_count: usize,

    /// Number of degenerate (zero-area) triangles removed.
    pub degenerate_triangle_count: usize,

    /// Edges with a single adjacent triangle. Zero for a watertight mesh.
    pub open_edge_count: usize,

    /// Edges with more than two adjacent triangles.
    pub non_manifold_edge_count: usize,

    /// Optional timing breakdown, only populated with the `knot_metrics`
    /// feature on native targets.
    pub timing: Option<super::metrics::KnotTimingReport>,

    /// Human-readable warnings about mesh issues and repairs performed.
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.open_edge_count == 0
    }

    #[must_use]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold_edge_count == 0
    }

    /// Watertight and manifold: the minimum for a valid solid.
    #[must_use]
    pub fn is_valid_solid(&self) -> bool {
        self.is_watertight() && self.is_manifold()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Sums counts and appends warnings. `timing` from `other` is ignored.
    pub fn merge(&mut self, other: &GeomMeshDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.triangle_count += other.triangle_count;
        self.welded_vertex_count += other.welded_vertex_count;
        self.flipped_triangle_count += other.flipped_triangle_count;
        self.degenerate_triangle_count += other.degenerate_triangle_count;
        self.open_edge_count += other.open_edge_count;
        self.non_manifold_edge_count += other.non_manifold_edge_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Short summary suitable for logging: `"V:{vertices} T:{triangles} [issues...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.welded_vertex_count > 0 {
            parts.push(format!("welded:{}", self.welded_vertex_count));
        }
        if self.flipped_triangle_count > 0 {
            parts.push(format!("flipped:{}", self.flipped_triangle_count));
        }
        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.open_edge_count > 0 {
            parts.push(format!("open:{}", self.open_edge_count));
        }
        if self.non_manifold_edge_count > 0 {
            parts.push(format!("non-manifold:{}", self.non_manifold_edge_count));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.open_edge_count > 0 {
            writeln!(f, "  Open edges: {}", self.open_edge_count)?;
        }
        if self.non_manifold_edge_count > 0 {
            writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edge_count)?;
        }
        for warning in &self.warnings {
            writeln!(f, "  Warning: {warning}")?;
        }
        if let Some(timing) = &self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        let status = if self.is_valid_solid() { "SOLID" } else { "OPEN" };
        writeln!(f, "  Status: {status}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_solid() {
        let diag = GeomMeshDiagnostics::default();
        assert!(diag.is_valid_solid());
        assert!(!diag.has_warnings());
    }

    #[test]
    fn merge_sums_counts() {
        let mut a = GeomMeshDiagnostics {
            vertex_count: 10,
            triangle_count: 4,
            open_edge_count: 2,
            warnings: vec!["first".to_string()],
            ..Default::default()
        };
        let b = GeomMeshDiagnostics {
            vertex_count: 5,
            triangle_count: 2,
            warnings: vec!["second".to_string()],
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.vertex_count, 15);
        assert_eq!(a.triangle_count, 6);
        assert_eq!(a.warnings.len(), 2);
        assert!(!a.is_watertight());
    }

    #[test]
    fn summary_lists_issues() {
        let diag = GeomMeshDiagnostics {
            vertex_count: 100,
            triangle_count: 50,
            welded_vertex_count: 5,
            open_edge_count: 2,
            ..Default::default()
        };
        let summary = diag.summary();
        assert!(summary.contains("V:100"));
        assert!(summary.contains("welded:5"));
        assert!(summary.contains("open:2"));
        assert!(format!("{diag}").contains("Status: OPEN"));
    }
}
