use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::diagnostics::GeomMeshDiagnostics;
use super::{Point3, Tolerance, Vec3};

/// Indexed triangle mesh produced by the sweep and merge stages.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    /// `u` runs along the rail (0..1), `v` around the profile.
    pub uvs: Option<Vec<[f64; 2]>>,
    pub normals: Option<Vec<[f64; 3]>>,
}

impl GeomMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            indices,
            uvs: None,
            normals: None,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of distinct undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        let mut edges = HashSet::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert(if a <= b { (a, b) } else { (b, a) });
            }
        }
        edges.len()
    }

    /// `V - E + F` of the triangulation.
    ///
    /// A closed tube (torus) gives 0, a capped tube (sphere) gives 2.
    #[must_use]
    pub fn euler_characteristic(&self) -> i64 {
        self.vertex_count() as i64 - self.edge_count() as i64 + self.triangle_count() as i64
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.positions.iter().any(|p| p.iter().any(|c| !c.is_finite())) {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        let n = self.positions.len() as u32;
        if self.indices.iter().any(|&i| i >= n) {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        let attribute_ok = self.uvs.as_ref().is_none_or(|uvs| uvs.len() == self.positions.len())
            && self.normals.as_ref().is_none_or(|normals| normals.len() == self.positions.len());
        if !attribute_ok {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }

    /// Appends `other`, offsetting its indices. Attribute buffers are kept only
    /// when both meshes carry them.
    pub fn append(&mut self, other: &GeomMesh) {
        let offset = self.positions.len() as u32;
        let was_empty = self.positions.is_empty();

        self.uvs = match (self.uvs.take(), other.uvs.as_ref()) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs.clone()),
            _ => None,
        };
        self.normals = match (self.normals.take(), other.normals.as_ref()) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if was_empty => Some(theirs.clone()),
            _ => None,
        };

        self.positions.extend_from_slice(&other.positions);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }
}

/// Welds, culls, repairs winding and orients a raw triangle soup.
pub(crate) fn finalize_mesh(
    points: Vec<Point3>,
    uvs: Option<Vec<[f64; 2]>>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (GeomMesh, GeomMeshDiagnostics) {
    let (repaired_points, repaired_uvs, repaired_indices, welded_vertex_count) =
        weld_mesh_vertices(points, uvs.as_deref(), indices, tol);

    let (mut repaired_indices, degenerate_triangle_count) =
        cull_degenerate_triangles(&repaired_points, &repaired_indices, tol);

    let flipped_triangle_count = fix_triangle_winding_consistency(&mut repaired_indices);
    let (open_edge_count, non_manifold_edge_count) = count_edge_topology(&repaired_indices);

    let mut warnings = Vec::new();
    if open_edge_count == 0 && non_manifold_edge_count == 0 {
        let volume = signed_volume(&repaired_points, &repaired_indices);
        if volume.is_finite() && volume < 0.0 {
            flip_all_triangles(&mut repaired_indices);
            warnings.push("mesh orientation flipped (outward)".to_string());
        }
    }
    if open_edge_count > 0 {
        warnings.push("mesh has open edges".to_string());
    }
    if non_manifold_edge_count > 0 {
        warnings.push("mesh has non-manifold edges".to_string());
    }

    let normals = compute_smooth_normals(&repaired_points, &repaired_indices);

    let mesh = GeomMesh {
        positions: repaired_points.into_iter().map(Point3::to_array).collect(),
        indices: repaired_indices,
        uvs: repaired_uvs,
        normals: Some(normals),
    };

    let diagnostics = GeomMeshDiagnostics {
        vertex_count: mesh.positions.len(),
        triangle_count: mesh.triangle_count(),
        welded_vertex_count,
        flipped_triangle_count,
        degenerate_triangle_count,
        open_edge_count,
        non_manifold_edge_count,
        timing: None,
        warnings,
    };

    (mesh, diagnostics)
}

/// Open and non-manifold edge counts of an index buffer.
#[must_use]
pub fn mesh_edge_topology(mesh: &GeomMesh) -> (usize, usize) {
    count_edge_topology(&mesh.indices)
}

pub(crate) fn weld_mesh_vertices(
    points: Vec<Point3>,
    uvs: Option<&[[f64; 2]]>,
    indices: Vec<u32>,
    tol: Tolerance,
) -> (Vec<Point3>, Option<Vec<[f64; 2]>>, Vec<u32>, usize) {
    if !tol.eps.is_finite() || tol.eps <= 0.0 {
        let uvs = uvs.map(<[[f64; 2]]>::to_vec);
        return (points, uvs, indices, 0);
    }

    let inv = 1.0 / tol.eps;

    /// Grid cell of a coordinate; `None` for non-finite values so they never weld.
    fn quantize(value: f64, inv: f64) -> Option<i64> {
        if !value.is_finite() {
            return None;
        }
        let q = (value * inv).floor();
        Some(q.clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    }

    let mut buckets: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    let mut remap: Vec<u32> = Vec::with_capacity(points.len());
    let mut out_points: Vec<Point3> = Vec::with_capacity(points.len());
    let mut out_uvs: Option<Vec<[f64; 2]>> = uvs.map(|_| Vec::with_capacity(points.len()));

    for (i, p) in points.iter().copied().enumerate() {
        let key = match (quantize(p.x, inv), quantize(p.y, inv), quantize(p.z, inv)) {
            (Some(kx), Some(ky), Some(kz)) => Some((kx, ky, kz)),
            _ => None,
        };

        let found = key.and_then(|key| {
            (-1i64..=1)
                .flat_map(|dx| (-1i64..=1).flat_map(move |dy| (-1i64..=1).map(move |dz| (dx, dy, dz))))
                .filter_map(|(dx, dy, dz)| buckets.get(&(key.0 + dx, key.1 + dy, key.2 + dz)))
                .flatten()
                .copied()
                .find(|&cand| tol.approx_eq_point3(out_points[cand as usize], p))
        });

        let out_idx = if let Some(existing) = found {
            existing
        } else {
            let new_idx = out_points.len() as u32;
            out_points.push(p);
            if let (Some(src), Some(dst)) = (uvs, out_uvs.as_mut()) {
                dst.push(src.get(i).copied().unwrap_or([0.0, 0.0]));
            }
            if let Some(key) = key {
                buckets.entry(key).or_default().push(new_idx);
            }
            new_idx
        };

        remap.push(out_idx);
    }

    let out_indices = indices
        .into_iter()
        .map(|idx| remap.get(idx as usize).copied().unwrap_or(idx))
        .collect();

    let welded = points.len().saturating_sub(out_points.len());
    (out_points, out_uvs, out_indices, welded)
}

fn cull_degenerate_triangles(points: &[Point3], indices: &[u32], tol: Tolerance) -> (Vec<u32>, usize) {
    let mut out = Vec::with_capacity(indices.len());
    let mut removed = 0usize;

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            removed += 1;
            continue;
        }

        let (Some(a), Some(b), Some(c)) = (
            points.get(i0 as usize).copied(),
            points.get(i1 as usize).copied(),
            points.get(i2 as usize).copied(),
        ) else {
            removed += 1;
            continue;
        };

        let area2 = b.sub_point(a).cross(c.sub_point(a)).length_squared();
        if !area2.is_finite() || area2 <= tol.eps_squared() * tol.eps_squared() {
            removed += 1;
            continue;
        }

        out.extend_from_slice(&[i0, i1, i2]);
    }

    (out, removed)
}

/// Propagates a consistent winding across manifold edges; returns the number
/// of triangles flipped.
pub(crate) fn fix_triangle_winding_consistency(indices: &mut [u32]) -> usize {
    let tri_count = indices.len() / 3;
    if tri_count == 0 {
        return 0;
    }

    let mut edges: HashMap<(u32, u32), Vec<(usize, bool)>> = HashMap::with_capacity(tri_count * 3);
    for t in 0..tri_count {
        let (i0, i1, i2) = (indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]);
        for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
            let (lo, hi, dir) = if a <= b { (a, b, true) } else { (b, a, false) };
            edges.entry((lo, hi)).or_default().push((t, dir));
        }
    }

    let mut visited = vec![false; tri_count];
    let mut flipped = vec![false; tri_count];

    for seed in 0..tri_count {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut stack = vec![seed];

        while let Some(t) = stack.pop() {
            let (i0, i1, i2) = (indices[t * 3], indices[t * 3 + 1], indices[t * 3 + 2]);
            for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
                let (lo, hi, dir_t) = if a <= b { (a, b, true) } else { (b, a, false) };
                let Some(adj) = edges.get(&(lo, hi)) else {
                    continue;
                };
                if adj.len() != 2 {
                    continue;
                }

                let (other, dir_other) = match (adj[0], adj[1]) {
                    ((t0, _), (t1, d1)) if t0 == t => (t1, d1),
                    ((t0, d0), (t1, _)) if t1 == t => (t0, d0),
                    _ => continue,
                };

                // Neighbours must traverse the shared edge in opposite directions.
                let desired = flipped[t] ^ dir_t ^ dir_other ^ true;
                if !visited[other] {
                    visited[other] = true;
                    flipped[other] = desired;
                    stack.push(other);
                }
            }
        }
    }

    let mut flipped_count = 0usize;
    for (t, flip) in flipped.into_iter().enumerate() {
        if flip {
            indices.swap(t * 3 + 1, t * 3 + 2);
            flipped_count += 1;
        }
    }
    flipped_count
}

fn count_edge_topology(indices: &[u32]) -> (usize, usize) {
    let mut edge_counts: HashMap<(u32, u32), u32> = HashMap::new();

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        if i0 == i1 || i1 == i2 || i0 == i2 {
            continue;
        }
        for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
            let key = if a <= b { (a, b) } else { (b, a) };
            *edge_counts.entry(key).or_insert(0) += 1;
        }
    }

    let open = edge_counts.values().filter(|&&count| count == 1).count();
    let non_manifold = edge_counts.values().filter(|&&count| count > 2).count();
    (open, non_manifold)
}

fn flip_all_triangles(indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}

fn signed_volume(points: &[Point3], indices: &[u32]) -> f64 {
    let mut volume = 0.0;
    for tri in indices.chunks_exact(3) {
        let (Some(a), Some(b), Some(c)) = (
            points.get(tri[0] as usize),
            points.get(tri[1] as usize),
            points.get(tri[2] as usize),
        ) else {
            continue;
        };
        volume += a.to_vec3().dot(b.to_vec3().cross(c.to_vec3()));
    }
    volume / 6.0
}

fn compute_smooth_normals(points: &[Point3], indices: &[u32]) -> Vec<[f64; 3]> {
    let mut normals = vec![Vec3::ZERO; points.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let (Some(a), Some(b), Some(c)) = (points.get(i0), points.get(i1), points.get(i2)) else {
            continue;
        };
        let n = b.sub_point(*a).cross(c.sub_point(*a));
        normals[i0] = normals[i0] + n;
        normals[i1] = normals[i1] + n;
        normals[i2] = normals[i2] + n;
    }

    normals
        .into_iter()
        .map(|n| n.normalized().unwrap_or(Vec3::Z).to_array())
        .collect()
}
