use crate::geom::{GeomMesh, Point3, SweepOptions, SweepProfile, Tolerance, mesh_edge_topology, sweep_profile};

fn straight_rail() -> Vec<Point3> {
    vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0), Point3::new(0.0, 0.0, 2.0)]
}

#[test]
fn swept_mesh_has_finite_vertices_and_valid_indices() {
    let result = sweep_profile(
        &straight_rail(),
        false,
        SweepProfile::Circle { radius: 0.25 },
        SweepOptions::default(),
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");
    let mesh = &result.mesh;

    mesh.validate().expect("mesh validate");
    assert_eq!(result.diagnostics.vertex_count, mesh.positions.len());
    assert_eq!(result.diagnostics.triangle_count, mesh.triangle_count());
    assert_eq!(mesh.normals.as_ref().map(Vec::len), Some(mesh.positions.len()));
    assert_eq!(mesh.uvs.as_ref().map(Vec::len), Some(mesh.positions.len()));
    for n in mesh.normals.iter().flatten() {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-9);
    }
}

#[test]
fn append_offsets_indices_and_keeps_topology() {
    let tol = Tolerance::default_geom();
    let a = sweep_profile(
        &straight_rail(),
        false,
        SweepProfile::Circle { radius: 0.25 },
        SweepOptions::default(),
        tol,
    )
    .expect("sweep should succeed")
    .mesh;

    let mut merged = GeomMesh::default();
    merged.append(&a);
    merged.append(&a);

    merged.validate().expect("merged mesh validate");
    assert_eq!(merged.vertex_count(), 2 * a.vertex_count());
    assert_eq!(merged.triangle_count(), 2 * a.triangle_count());
    assert_eq!(mesh_edge_topology(&merged), (0, 0));
    assert_eq!(merged.euler_characteristic(), 4);
}

#[test]
fn validate_rejects_out_of_range_indices() {
    let mesh = GeomMesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![0, 1, 3]);
    assert!(mesh.validate().is_err());
}
