use std::f64::consts::TAU;

use crate::geom::{Point3, SweepError, SweepOptions, SweepProfile, Tolerance, Vec3, sweep_profile};

fn circle_rail(samples: usize, radius: f64) -> Vec<Point3> {
    (0..samples)
        .map(|i| {
            let t = TAU * i as f64 / samples as f64;
            Point3::new(radius * t.cos(), radius * t.sin(), 0.0)
        })
        .collect()
}

#[test]
fn straight_rail_rectangle_profile_caps() {
    let rail = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 2.0)];
    let result = sweep_profile(
        &rail,
        false,
        SweepProfile::Rectangle { width: 1.0, thickness: 0.5 },
        SweepOptions::default(),
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");

    // 8 side triangles plus a 4-triangle fan on each end.
    assert_eq!(result.mesh.triangle_count(), 16);
    assert!(result.diagnostics.is_valid_solid());
    assert_eq!(result.mesh.euler_characteristic(), 2);
    assert!(result.clamp.is_none());
}

#[test]
fn closed_rail_pipe_is_a_torus() {
    let options = SweepOptions {
        radial_segments: 12,
        ..SweepOptions::default()
    };
    let result = sweep_profile(
        &circle_rail(32, 2.0),
        true,
        SweepProfile::Circle { radius: 0.2 },
        options,
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");

    assert!(result.diagnostics.is_valid_solid(), "{}", result.diagnostics.summary());
    assert_eq!(result.mesh.euler_characteristic(), 0);
    assert_eq!(result.mesh.vertex_count(), 32 * 12);
}

#[test]
fn strip_profile_only_has_rim_edges_open() {
    let result = sweep_profile(
        &circle_rail(24, 1.0),
        true,
        SweepProfile::Strip { width: 0.1 },
        SweepOptions {
            up: Some(Vec3::Z),
            ..SweepOptions::default()
        },
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");

    assert_eq!(result.diagnostics.open_edge_count, 2 * 24);
    assert!(result.diagnostics.is_manifold());
}

#[test]
fn tight_bend_clamps_profile() {
    let result = sweep_profile(
        &circle_rail(32, 2.0),
        true,
        SweepProfile::Circle { radius: 3.0 },
        SweepOptions::default(),
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");

    let clamp = result.clamp.expect("profile should be clamped");
    assert!(clamp.sample.is_some());
    assert!((clamp.requested - 3.0).abs() < 1e-12);
    assert!(clamp.applied < 2.0);
    assert!(matches!(result.profile, SweepProfile::Circle { radius } if radius < 2.0));
    assert!(result.diagnostics.has_warnings());
}

#[test]
fn external_limit_clamps_profile() {
    let rail = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
    let result = sweep_profile(
        &rail,
        false,
        SweepProfile::Circle { radius: 0.5 },
        SweepOptions {
            max_guard_radius: Some(0.1),
            ..SweepOptions::default()
        },
        Tolerance::default_geom(),
    )
    .expect("sweep should succeed");

    let clamp = result.clamp.expect("profile should be clamped");
    assert_eq!(clamp.sample, None);
    assert!((clamp.applied - 0.1).abs() < 1e-12);
}

#[test]
fn single_point_rail_is_rejected() {
    let rail = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)];
    let result = sweep_profile(
        &rail,
        false,
        SweepProfile::Circle { radius: 0.1 },
        SweepOptions::default(),
        Tolerance::default_geom(),
    );
    assert!(matches!(result, Err(SweepError::RailTooShort)));
}
