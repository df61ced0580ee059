//! Ready-made framework meshes.
//!
//! All closed meshes are wound counter-clockwise seen from outside, so vertex
//! and face normals point outwards.

use std::f64::consts::TAU;

use super::framework::FrameworkMesh;

/// Regular tetrahedron inscribed in the cube `[-1, 1]^3`. Every vertex has
/// degree 3.
#[must_use]
pub fn tetrahedron() -> FrameworkMesh {
    FrameworkMesh::new(
        vec![
            [1.0, 1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
            [-1.0, -1.0, 1.0],
        ],
        vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
    )
}

/// Cube `[-1, 1]^3`. Vertex `i` sits at `(±1, ±1, ±1)` from the bits of `i`.
#[must_use]
pub fn cube() -> FrameworkMesh {
    let positions = (0..8)
        .map(|i| {
            let sign = |bit: usize| if i & bit == 0 { -1.0 } else { 1.0 };
            [sign(1), sign(2), sign(4)]
        })
        .collect();
    FrameworkMesh::new(
        positions,
        vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ],
    )
}

/// Unit octahedron. Every vertex has degree 4.
#[must_use]
pub fn octahedron() -> FrameworkMesh {
    FrameworkMesh::new(
        vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ],
        vec![
            vec![0, 2, 4],
            vec![2, 1, 4],
            vec![1, 3, 4],
            vec![3, 0, 4],
            vec![2, 0, 5],
            vec![1, 2, 5],
            vec![3, 1, 5],
            vec![0, 3, 5],
        ],
    )
}

/// Two pyramids over a regular `k`-gon in the XY plane. Ring vertices are
/// `0..k` with degree 4, the poles `k` (top) and `k + 1` (bottom) have degree
/// `k`.
#[must_use]
pub fn bipyramid(k: usize) -> FrameworkMesh {
    let mut positions: Vec<[f64; 3]> = (0..k)
        .map(|i| {
            let angle = TAU * i as f64 / k as f64;
            [angle.cos(), angle.sin(), 0.0]
        })
        .collect();
    positions.push([0.0, 0.0, 1.0]);
    positions.push([0.0, 0.0, -1.0]);
    let faces = (0..k)
        .map(|i| vec![i, (i + 1) % k, k])
        .chain((0..k).map(|i| vec![(i + 1) % k, i, k + 1]))
        .collect();
    FrameworkMesh::new(positions, faces)
}

/// Square pyramid with apex 4. Base corners have degree 3, the apex degree 4.
#[must_use]
pub fn square_pyramid() -> FrameworkMesh {
    FrameworkMesh::new(
        vec![
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![vec![0, 1, 4], vec![1, 2, 4], vec![2, 3, 4], vec![3, 0, 4], vec![3, 2, 1, 0]],
    )
}

fn unit_square() -> Vec<[f64; 3]> {
    vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ]
}

/// Boundary of the unit square as four wire edges and no faces.
#[must_use]
pub fn quad_loop() -> FrameworkMesh {
    FrameworkMesh::new(unit_square(), Vec::new()).with_wire_edges(vec![[0, 1], [1, 2], [2, 3], [3, 0]])
}

/// The unit square as a single face. All four edges are boundary edges.
#[must_use]
pub fn quad_face() -> FrameworkMesh {
    FrameworkMesh::new(unit_square(), vec![vec![0, 1, 2, 3]])
}

/// Flat `columns` x `rows` grid of unit quads in the XY plane. Strands end on
/// the border.
#[must_use]
pub fn grid(columns: usize, rows: usize) -> FrameworkMesh {
    let stride = columns + 1;
    let positions = (0..=rows)
        .flat_map(|j| (0..=columns).map(move |i| [i as f64, j as f64, 0.0]))
        .collect();
    let faces = (0..rows)
        .flat_map(|j| {
            (0..columns).map(move |i| {
                let v = j * stride + i;
                vec![v, v + 1, v + 1 + stride, v + stride]
            })
        })
        .collect();
    FrameworkMesh::new(positions, faces)
}

/// Quad grid wrapped on a torus: `segments` around the main axis, `sides`
/// around the tube. Every vertex has degree 4.
#[must_use]
pub fn torus_grid(segments: usize, sides: usize, major_radius: f64, minor_radius: f64) -> FrameworkMesh {
    let index = |i: usize, j: usize| (i % segments) * sides + (j % sides);
    let positions = (0..segments)
        .flat_map(|i| {
            let u = TAU * i as f64 / segments as f64;
            (0..sides).map(move |j| {
                let v = TAU * j as f64 / sides as f64;
                let ring = major_radius + minor_radius * v.cos();
                [ring * u.cos(), ring * u.sin(), minor_radius * v.sin()]
            })
        })
        .collect();
    let faces = (0..segments)
        .flat_map(|i| {
            (0..sides).map(move |j| vec![index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1)])
        })
        .collect();
    FrameworkMesh::new(positions, faces)
}
