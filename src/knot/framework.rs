//! Framework mesh input, validation and adjacency.
//!
//! [`FrameworkTopology::build`] rejects meshes that cannot be woven (see
//! [`ValidationError`]) and indexes the rest once: an edge list in
//! first-appearance order, the faces on each side of every edge, and for every
//! vertex the incident edges in rotational order together with the face
//! sector between each consecutive pair.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{Location, ValidationError};
use crate::geom::{Point3, Tolerance, Vec3};

/// Polygon mesh the knot is woven over.
///
/// `faces` are vertex loops; `edges` are optional wire edges that belong to
/// no face (a bare boundary loop, for example).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkMesh {
    pub positions: Vec<[f64; 3]>,
    #[serde(default)]
    pub faces: Vec<Vec<usize>>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
}

impl FrameworkMesh {
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            positions,
            faces,
            edges: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_wire_edges(mut self, edges: Vec<[usize; 2]>) -> Self {
        self.edges = edges;
        self
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkEdge {
    pub vertices: [usize; 2],
    /// Incident faces in first-appearance order. Wire edges have none.
    pub faces: [Option<usize>; 2],
}

impl FrameworkEdge {
    /// The endpoint opposite `vertex`.
    #[must_use]
    pub fn other(&self, vertex: usize) -> usize {
        if self.vertices[0] == vertex {
            self.vertices[1]
        } else {
            self.vertices[0]
        }
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.iter().flatten().count()
    }

    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.face_count() == 1
    }
}

/// Incident edges of a vertex in rotational order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexRotation {
    pub edges: Vec<usize>,
    /// `sectors[i]` is the face between `edges[i]` and `edges[i + 1]`
    /// (cyclically), `None` outside the surface.
    pub sectors: Vec<Option<usize>>,
    /// The face fan around the vertex is open (the vertex lies on a border).
    pub boundary: bool,
}

impl VertexRotation {
    #[must_use]
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn position_of_edge(&self, edge: usize) -> Option<usize> {
        self.edges.iter().position(|&e| e == edge)
    }

    #[must_use]
    pub fn position_of_sector(&self, face: usize) -> Option<usize> {
        self.sectors.iter().position(|&s| s == Some(face))
    }

    /// Position of the boundary edge that leaves the face fan, on a border
    /// vertex. The edge entering the fan is always at position 0.
    #[must_use]
    pub fn boundary_exit(&self) -> Option<usize> {
        if !self.boundary {
            return None;
        }
        self.sectors.iter().position(Option::is_none)
    }
}

#[derive(Debug, Clone, Copy)]
struct Corner {
    face: usize,
    prev: usize,
    next: usize,
}

/// Validated framework with pre-built adjacency.
#[derive(Debug, Clone)]
pub struct FrameworkTopology {
    positions: Vec<Point3>,
    faces: Vec<Vec<usize>>,
    edges: Vec<FrameworkEdge>,
    edge_lookup: HashMap<(usize, usize), usize>,
    rotations: Vec<VertexRotation>,
    face_normals: Vec<Vec3>,
    vertex_normals: Vec<Vec3>,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

impl FrameworkTopology {
    pub fn build(mesh: &FrameworkMesh, tol: Tolerance) -> Result<Self, ValidationError> {
        let vertex_count = mesh.positions.len();
        if vertex_count == 0 {
            return Err(ValidationError::EmptyMesh);
        }

        let positions: Vec<Point3> = mesh.positions.iter().copied().map(Point3::from).collect();
        if let Some(vertex) = positions.iter().position(|p| !p.is_finite()) {
            return Err(ValidationError::NonFiniteVertex { vertex });
        }

        for (face, loop_) in mesh.faces.iter().enumerate() {
            if loop_.len() < 3 {
                return Err(ValidationError::FaceTooSmall { face });
            }
            for (j, &vertex) in loop_.iter().enumerate() {
                if vertex >= vertex_count {
                    return Err(ValidationError::VertexOutOfRange { face, vertex });
                }
                if loop_[..j].contains(&vertex) {
                    return Err(ValidationError::RepeatedFaceVertex { face, vertex });
                }
            }
        }

        let mut edge_lookup: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edge_vertices: Vec<[usize; 2]> = Vec::new();
        let mut edge_faces: Vec<Vec<usize>> = Vec::new();
        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        let mut orientation_conflict: Option<usize> = None;

        for (face, loop_) in mesh.faces.iter().enumerate() {
            let k = loop_.len();
            for j in 0..k {
                let (a, b) = (loop_[j], loop_[(j + 1) % k]);
                let edge = *edge_lookup.entry(edge_key(a, b)).or_insert_with(|| {
                    edge_vertices.push([a, b]);
                    edge_faces.push(Vec::new());
                    edge_vertices.len() - 1
                });
                edge_faces[edge].push(face);
                if directed.insert((a, b), face).is_some() {
                    orientation_conflict = Some(orientation_conflict.map_or(edge, |e: usize| e.min(edge)));
                }
            }
        }

        if let Some(edge) = edge_faces.iter().position(|faces| faces.len() > 2) {
            let [a, b] = edge_vertices[edge];
            return Err(ValidationError::NonManifoldEdge {
                edge,
                a,
                b,
                faces: edge_faces[edge].clone(),
            });
        }
        if let Some(edge) = orientation_conflict {
            let [a, b] = edge_vertices[edge];
            return Err(ValidationError::InconsistentOrientation { edge, a, b });
        }

        for (index, &[a, b]) in mesh.edges.iter().enumerate() {
            if a == b || a >= vertex_count || b >= vertex_count {
                return Err(ValidationError::InvalidWireEdge { index });
            }
            edge_lookup.entry(edge_key(a, b)).or_insert_with(|| {
                edge_vertices.push([a, b]);
                edge_faces.push(Vec::new());
                edge_vertices.len() - 1
            });
        }

        if edge_vertices.is_empty() {
            return Err(ValidationError::EmptyMesh);
        }

        let edges: Vec<FrameworkEdge> = edge_vertices
            .iter()
            .zip(&edge_faces)
            .map(|(&vertices, faces)| FrameworkEdge {
                vertices,
                faces: [faces.first().copied(), faces.get(1).copied()],
            })
            .collect();

        for (edge, e) in edges.iter().enumerate() {
            let [a, b] = e.vertices;
            if tol.is_zero_length(positions[a].distance_to(positions[b])) {
                return Err(ValidationError::DegenerateEdge { edge, a, b });
            }
        }

        let mut corners: Vec<Vec<Corner>> = vec![Vec::new(); vertex_count];
        for (face, loop_) in mesh.faces.iter().enumerate() {
            let k = loop_.len();
            for j in 0..k {
                corners[loop_[j]].push(Corner {
                    face,
                    prev: loop_[(j + k - 1) % k],
                    next: loop_[(j + 1) % k],
                });
            }
        }

        let mut wire_at: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        for (edge, e) in edges.iter().enumerate() {
            if e.face_count() == 0 {
                wire_at[e.vertices[0]].push(edge);
                wire_at[e.vertices[1]].push(edge);
            }
        }

        let mut rotations = Vec::with_capacity(vertex_count);
        for vertex in 0..vertex_count {
            let mut rotation = face_fan(vertex, &corners[vertex], &edges, &edge_lookup)?;
            for &edge in &wire_at[vertex] {
                rotation.edges.push(edge);
                rotation.sectors.push(None);
            }
            rotations.push(rotation);
        }

        let face_normals: Vec<Vec3> = mesh.faces.iter().map(|loop_| newell_normal(&positions, loop_)).collect();
        let vertex_normals = (0..vertex_count)
            .map(|vertex| {
                corners[vertex]
                    .iter()
                    .fold(Vec3::ZERO, |acc, corner| acc + face_normals[corner.face])
                    .normalized()
                    .unwrap_or(Vec3::Z)
            })
            .collect();
        let face_normals = face_normals
            .into_iter()
            .map(|n| n.normalized().unwrap_or(Vec3::Z))
            .collect();

        log::debug!(
            "framework: {} vertices, {} edges, {} faces",
            vertex_count,
            edges.len(),
            mesh.faces.len()
        );

        Ok(Self {
            positions,
            faces: mesh.faces.clone(),
            edges,
            edge_lookup,
            rotations,
            face_normals,
            vertex_normals,
        })
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn position(&self, vertex: usize) -> Point3 {
        self.positions[vertex]
    }

    #[must_use]
    pub fn face(&self, face: usize) -> &[usize] {
        &self.faces[face]
    }

    #[must_use]
    pub fn edges(&self) -> &[FrameworkEdge] {
        &self.edges
    }

    #[must_use]
    pub fn edge(&self, edge: usize) -> &FrameworkEdge {
        &self.edges[edge]
    }

    #[must_use]
    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    #[must_use]
    pub fn rotation(&self, vertex: usize) -> &VertexRotation {
        &self.rotations[vertex]
    }

    #[must_use]
    pub fn edge_midpoint(&self, edge: usize) -> Point3 {
        let [a, b] = self.edges[edge].vertices;
        self.positions[a].lerp(self.positions[b], 0.5)
    }

    #[must_use]
    pub fn face_centroid(&self, face: usize) -> Point3 {
        let corners = &self.faces[face];
        let sum = corners
            .iter()
            .fold(Vec3::ZERO, |acc, &v| acc + self.positions[v].to_vec3());
        Point3::ORIGIN.add_vec(sum * (1.0 / corners.len().max(1) as f64))
    }

    /// Unit normal at a vertex (area-weighted) or face; `+Z` where the
    /// framework has no surface.
    #[must_use]
    pub fn normal_at(&self, location: Location) -> Vec3 {
        match location {
            Location::Vertex(v) => self.vertex_normals[v],
            Location::Face(f) => self.face_normals[f],
        }
    }

    /// Surface normal at an edge midpoint.
    #[must_use]
    pub fn edge_normal(&self, edge: usize) -> Vec3 {
        let [a, b] = self.edges[edge].vertices;
        (self.vertex_normals[a] + self.vertex_normals[b])
            .normalized()
            .unwrap_or(Vec3::Z)
    }
}

/// Orders the face corners around `vertex` into a fan.
fn face_fan(
    vertex: usize,
    corners: &[Corner],
    edges: &[FrameworkEdge],
    lookup: &HashMap<(usize, usize), usize>,
) -> Result<VertexRotation, ValidationError> {
    if corners.is_empty() {
        return Ok(VertexRotation::default());
    }

    let edge_to = |other: usize| lookup[&edge_key(vertex, other)];
    let by_prev: HashMap<usize, usize> = corners.iter().enumerate().map(|(i, c)| (c.prev, i)).collect();

    let mut starts = corners
        .iter()
        .enumerate()
        .filter(|(_, c)| edges[edge_to(c.prev)].is_boundary())
        .map(|(i, _)| i);
    let first_boundary = starts.next();
    if starts.next().is_some() {
        return Err(ValidationError::NonManifoldVertex { vertex });
    }
    let start = first_boundary.unwrap_or(0);

    let mut order = Vec::with_capacity(corners.len());
    let mut visited = vec![false; corners.len()];
    let mut current = start;
    loop {
        visited[current] = true;
        order.push(current);
        match by_prev.get(&corners[current].next) {
            Some(&next) if !visited[next] => current = next,
            _ => break,
        }
    }
    if order.len() != corners.len() {
        return Err(ValidationError::NonManifoldVertex { vertex });
    }

    let k = order.len();
    let mut rotation = VertexRotation {
        boundary: first_boundary.is_some(),
        ..VertexRotation::default()
    };
    if rotation.boundary {
        rotation.edges.push(edge_to(corners[start].prev));
        rotation.sectors.push(Some(corners[start].face));
        for (i, &c) in order.iter().enumerate() {
            rotation.edges.push(edge_to(corners[c].next));
            rotation.sectors.push(order.get(i + 1).map(|&n| corners[n].face));
        }
    } else {
        for (i, &c) in order.iter().enumerate() {
            rotation.edges.push(edge_to(corners[c].next));
            rotation.sectors.push(Some(corners[order[(i + 1) % k]].face));
        }
    }
    Ok(rotation)
}

/// Newell's method: area-weighted normal of a (possibly non-planar) polygon.
fn newell_normal(positions: &[Point3], loop_: &[usize]) -> Vec3 {
    let k = loop_.len();
    (0..k).fold(Vec3::ZERO, |acc, j| {
        let p = positions[loop_[j]];
        let q = positions[loop_[(j + 1) % k]];
        acc + Vec3::new(
            (p.y - q.y) * (p.z + q.z),
            (p.z - q.z) * (p.x + q.x),
            (p.x - q.x) * (p.y + q.y),
        )
    }) * 0.5
}
