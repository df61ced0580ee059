use knot_engine::KnotEngine;
use knot_engine::knot::{
    FrameworkMesh, GapConfig, KnotConfig, KnotError, Location, Profile, ValidationError, generate_knot, primitives,
};

#[test]
fn engine_initializes() {
    let engine = KnotEngine::new();
    assert!(engine.is_initialized());
}

#[test]
fn framework_and_config_load_from_json() {
    let mesh: FrameworkMesh = serde_json::from_str(
        r#"{
            "positions": [[0,0,0],[1,0,0],[1,1,0],[0,1,0]],
            "edges": [[0,1],[1,2],[2,3],[3,0]]
        }"#,
    )
    .expect("parse framework");
    assert!(mesh.faces.is_empty());
    assert_eq!(mesh.edges.len(), 4);

    let config: KnotConfig = serde_json::from_str(
        r#"{
            "profile": { "type": "ribbon", "width": 0.2, "thickness": 0.0 },
            "gap": { "default": 1, "overrides": { "2": 0 } },
            "curves_only": true
        }"#,
    )
    .expect("parse config");
    assert_eq!(config.profile, Profile::Ribbon { width: 0.2, thickness: 0.0 });
    assert_eq!(config.gap.for_vertex(2), 0);
    assert_eq!(config.gap.for_vertex(3), 1);
    assert_eq!(config.handle_length, KnotConfig::default().handle_length);

    let output = generate_knot(&mesh, &config).expect("knot generates");
    assert_eq!(output.strands.len(), 1);
    assert!(output.solids.is_empty());
}

#[test]
fn tetrahedron_weaves_one_closed_alternating_strand() {
    let output = generate_knot(&primitives::tetrahedron(), &KnotConfig::default()).expect("knot generates");
    assert_eq!(output.strands.len(), 1);
    let strand = &output.strands[0];
    assert!(strand.closed);
    let mut nodes = strand.nodes.clone();
    nodes.sort_unstable();
    assert_eq!(nodes, vec![0, 1, 2, 3, 4, 5]);
    assert!(!output.crossings.is_empty());
    assert_eq!(output.crossings.non_alternating_count(), 0);
}

#[test]
fn boundary_loop_gives_one_strand_without_crossings() {
    let output = generate_knot(&primitives::quad_loop(), &KnotConfig::default()).expect("knot generates");
    assert_eq!(output.strands.len(), 1);
    assert!(output.strands[0].closed);
    assert!(output.crossings.is_empty());
    assert!(output.warnings.is_empty());
}

#[test]
fn handle_length_grows_the_curve() {
    let mut previous = 0.0;
    for handle_length in [0.1, 0.25, 0.4] {
        let config = KnotConfig {
            handle_length,
            curves_only: true,
            ..KnotConfig::default()
        };
        let output = generate_knot(&primitives::tetrahedron(), &config).expect("knot generates");
        let length = output.curves[0].arc_length(64);
        assert!(length > previous, "{length} <= {previous} at handle length {handle_length}");
        previous = length;
    }
}

#[test]
fn three_faces_on_one_edge_abort_generation() {
    let mesh = FrameworkMesh::new(
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
        ],
        vec![vec![0, 1, 2], vec![1, 0, 3], vec![0, 1, 4]],
    );
    let err = generate_knot(&mesh, &KnotConfig::default()).expect_err("three faces on one edge");
    assert!(err.to_string().contains("edge 0 (0-1)"), "{err}");
    match err {
        KnotError::Validation(ValidationError::NonManifoldEdge { edge, a, b, faces }) => {
            assert_eq!((edge, a, b), (0, 0, 1));
            assert_eq!(faces, vec![0, 1, 2]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn every_node_lands_in_exactly_one_strand() {
    let meshes = [
        primitives::tetrahedron(),
        primitives::cube(),
        primitives::octahedron(),
        primitives::grid(3, 2),
        primitives::torus_grid(6, 4, 2.0, 0.5),
    ];
    for mesh in &meshes {
        for gap in 0..3 {
            let config = KnotConfig {
                gap: GapConfig::uniform(gap),
                curves_only: true,
                ..KnotConfig::default()
            };
            let output = generate_knot(mesh, &config).expect("knot generates");
            let mut seen: Vec<usize> = output.strands.iter().flat_map(|s| s.nodes.iter().copied()).collect();
            seen.sort_unstable();
            let expected: Vec<usize> = (0..seen.len()).collect();
            assert_eq!(seen, expected, "gap {gap}");
        }
    }
}

#[test]
fn warnings_report_location_of_non_alternating_crossings() {
    let config = KnotConfig {
        curves_only: true,
        ..KnotConfig::default()
    };
    let output = generate_knot(&primitives::torus_grid(5, 4, 2.0, 0.5), &config).expect("knot generates");
    let flagged: Vec<Location> = output
        .crossings
        .crossings
        .iter()
        .filter(|c| !c.alternating)
        .map(|c| c.location)
        .collect();
    assert!(!flagged.is_empty());
    assert_eq!(output.warnings.len(), flagged.len());
    for warning in &output.warnings {
        assert!(warning.to_string().contains("vertex") || warning.to_string().contains("face"));
    }
}
