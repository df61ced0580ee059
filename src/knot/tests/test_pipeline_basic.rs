use crate::geom::mesh_edge_topology;
use crate::knot::{
    FrameworkMesh, GapConfig, HandleMode, KnotConfig, KnotError, KnotWarning, Profile, ValidationError, generate_knot,
    primitives,
};

fn light_config() -> KnotConfig {
    KnotConfig {
        samples_per_segment: 8,
        radial_segments: 8,
        ..KnotConfig::default()
    }
}

fn no_skipped_strands(warnings: &[KnotWarning]) -> bool {
    !warnings.iter().any(|w| matches!(w, KnotWarning::StrandSkipped { .. }))
}

#[test]
fn closed_strands_give_closed_pipes() {
    let output = generate_knot(&primitives::octahedron(), &light_config()).expect("knot generates");
    assert!(no_skipped_strands(&output.warnings));
    assert_eq!(output.solids.len(), output.strands.len());
    for solid in &output.solids {
        assert!(solid.diagnostics.is_valid_solid(), "{}", solid.diagnostics.summary());
        assert_eq!(solid.mesh.euler_characteristic(), 0);
        solid.mesh.validate().expect("mesh validate");
    }
}

#[test]
fn open_strands_give_capped_pipes() {
    let output = generate_knot(&primitives::grid(3, 3), &light_config()).expect("knot generates");
    assert!(no_skipped_strands(&output.warnings));
    assert_eq!(output.strands.len(), 6);
    assert_eq!(output.solids.len(), output.strands.len());
    for solid in &output.solids {
        assert!(solid.diagnostics.is_valid_solid(), "{}", solid.diagnostics.summary());
        assert_eq!(solid.mesh.euler_characteristic(), 2);
    }
}

#[test]
fn two_node_loops_give_closed_pipes() {
    let config = KnotConfig {
        gap: GapConfig::uniform(0),
        ..light_config()
    };
    let output = generate_knot(&primitives::square_pyramid(), &config).expect("knot generates");
    assert!(output.strands.iter().any(|s| s.closed && s.len() == 2));
    assert!(no_skipped_strands(&output.warnings), "{:?}", output.warnings);
    assert_eq!(output.solids.len(), output.strands.len());
    for solid in &output.solids {
        assert!(solid.diagnostics.is_valid_solid(), "{}", solid.diagnostics.summary());
        assert_eq!(solid.mesh.euler_characteristic(), 0);
    }
}

#[test]
fn ribbons_are_bands_or_strips() {
    let band = KnotConfig {
        profile: Profile::Ribbon {
            width: 0.2,
            thickness: 0.04,
        },
        ..light_config()
    };
    let output = generate_knot(&primitives::octahedron(), &band).expect("knot generates");
    for solid in &output.solids {
        assert!(solid.diagnostics.is_valid_solid());
        assert!(matches!(solid.profile, Profile::Ribbon { thickness, .. } if thickness > 0.0));
    }

    let strip = KnotConfig {
        profile: Profile::Ribbon {
            width: 0.2,
            thickness: 0.0,
        },
        ..light_config()
    };
    let output = generate_knot(&primitives::octahedron(), &strip).expect("knot generates");
    for solid in &output.solids {
        let (open, non_manifold) = mesh_edge_topology(&solid.mesh);
        assert!(open > 0);
        assert_eq!(non_manifold, 0);
    }
}

#[test]
fn handle_length_increases_arc_length() {
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
fn non_manifold_framework_produces_no_output() {
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
    let result = generate_knot(&mesh, &KnotConfig::default());
    assert!(matches!(
        result,
        Err(KnotError::Validation(ValidationError::NonManifoldEdge { edge: 0, .. }))
    ));
}

#[test]
fn invalid_config_is_rejected() {
    let config = KnotConfig {
        corner_smoothness: 1.5,
        ..KnotConfig::default()
    };
    assert!(matches!(
        generate_knot(&primitives::tetrahedron(), &config),
        Err(KnotError::Config(_))
    ));
}

#[test]
fn curves_only_skips_extrusion() {
    let config = KnotConfig {
        curves_only: true,
        ..KnotConfig::default()
    };
    let output = generate_knot(&primitives::cube(), &config).expect("knot generates");
    assert!(output.solids.is_empty());
    assert_eq!(output.curves.len(), output.strands.len());

    let export = output.curve_export();
    assert_eq!(export.curves.len(), output.strands.len());
    let anchors: usize = export.curves.iter().map(|c| c.points.len()).sum();
    assert_eq!(anchors, 12);
    let json = serde_json::to_string(&export).expect("export serialises");
    assert!(json.contains("\"closed\":true"));
}

#[test]
fn merged_mesh_concatenates_solids() {
    let config = KnotConfig {
        merge_output: true,
        ..light_config()
    };
    let output = generate_knot(&primitives::octahedron(), &config).expect("knot generates");
    let merged = output.merged.as_ref().expect("merged mesh requested");
    let triangles: usize = output.solids.iter().map(|s| s.mesh.triangle_count()).sum();
    assert_eq!(merged.triangle_count(), triangles);
    assert_eq!(output.diagnostics().triangle_count, triangles);
    merged.validate().expect("merged mesh validate");
}

#[test]
fn aligned_handles_keep_anchor_count() {
    let config = KnotConfig {
        handle_mode: HandleMode::Aligned {
            crossing_angle: std::f64::consts::FRAC_PI_4,
        },
        curves_only: true,
        ..KnotConfig::default()
    };
    let output = generate_knot(&primitives::torus_grid(6, 4, 2.0, 0.5), &config).expect("knot generates");
    for (strand, curve) in output.strands.iter().zip(&output.curves) {
        assert_eq!(strand.len(), curve.points.len());
        assert_eq!(curve.closed, strand.closed);
    }
}

#[test]
fn output_is_reproducible() {
    let config = light_config();
    let a = generate_knot(&primitives::tetrahedron(), &config).expect("knot generates");
    let b = generate_knot(&primitives::tetrahedron(), &config).expect("knot generates");
    assert_eq!(a.curves, b.curves);
    assert_eq!(a.crossings.crossings, b.crossings.crossings);
    let positions = |o: &crate::knot::KnotOutput| o.solids.iter().map(|s| s.mesh.positions.clone()).collect::<Vec<_>>();
    assert_eq!(positions(&a), positions(&b));
}
