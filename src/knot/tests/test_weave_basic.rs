use crate::geom::Tolerance;
use crate::knot::{
    CrossingTable, FrameworkMesh, FrameworkTopology, GapConfig, KnotWarning, Location, Route, Strand, WeaveGraph,
    build_weave_graph, primitives, resolve_crossings, trace_strands,
};

struct Weave {
    graph: WeaveGraph,
    strands: Vec<Strand>,
    table: CrossingTable,
    warnings: Vec<KnotWarning>,
}

fn weave(mesh: &FrameworkMesh, gap: &GapConfig, seed: u64) -> Weave {
    let topology = FrameworkTopology::build(mesh, Tolerance::default_geom()).expect("valid framework");
    let mut warnings = Vec::new();
    let graph = build_weave_graph(&topology, gap, &mut warnings);
    let strands = trace_strands(&graph);
    let table = resolve_crossings(&graph, &strands, seed, &mut warnings);
    Weave {
        graph,
        strands,
        table,
        warnings,
    }
}

fn assert_partition(w: &Weave) {
    let mut seen = vec![0usize; w.graph.node_count()];
    for strand in &w.strands {
        for &node in &strand.nodes {
            seen[node] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1), "nodes covered unevenly: {seen:?}");
}

fn assert_alternates(w: &Weave) {
    assert_eq!(w.table.non_alternating_count(), 0);
    for (s, events) in w.table.events.iter().enumerate() {
        for pair in events.windows(2) {
            assert_ne!(pair[0].over, pair[1].over, "strand {s} repeats a state");
        }
        if w.strands[s].closed && events.len() > 1 {
            assert_ne!(events[0].over, events[events.len() - 1].over, "strand {s} repeats across its seam");
        }
    }
}

#[test]
fn tetrahedron_weaves_one_closed_strand() {
    let w = weave(&primitives::tetrahedron(), &GapConfig::default(), 0);
    assert_eq!(w.strands.len(), 1);
    assert!(w.strands[0].closed);
    assert_eq!(w.strands[0].len(), 6);
    assert_eq!(w.table.len(), 4);
    assert!(w.table.crossings.iter().any(|c| c.alternating));
    assert!(w.warnings.is_empty());
}

#[test]
fn quad_boundary_loop_is_one_plain_strand() {
    let w = weave(&primitives::quad_loop(), &GapConfig::default(), 0);
    assert_eq!(w.strands.len(), 1);
    assert!(w.strands[0].closed);
    assert_eq!(w.strands[0].len(), 4);
    assert!(w.table.is_empty());
    assert!(w.graph.terminating_ends().is_empty());
}

#[test]
fn single_face_border_edges_end_strands() {
    let w = weave(&primitives::quad_face(), &GapConfig::default(), 0);
    assert_eq!(w.graph.terminating_ends().len(), 4);
    assert_eq!(w.strands.len(), 2);
    assert!(w.strands.iter().all(|s| !s.closed && s.len() == 2));
    assert!(w.table.is_empty());
    assert!(w.warnings.is_empty());
}

#[test]
fn strands_partition_the_weave_nodes() {
    let meshes = [
        primitives::tetrahedron(),
        primitives::cube(),
        primitives::octahedron(),
        primitives::grid(3, 2),
        primitives::bipyramid(6),
        primitives::square_pyramid(),
        primitives::torus_grid(5, 4, 2.0, 0.5),
    ];
    for mesh in &meshes {
        for gap in 0..3 {
            assert_partition(&weave(mesh, &GapConfig::uniform(gap), 0));
        }
    }
}

#[test]
fn octahedron_gives_borromean_rings() {
    let w = weave(&primitives::octahedron(), &GapConfig::default(), 3);
    assert_eq!(w.strands.len(), 3);
    assert!(w.strands.iter().all(|s| s.closed && s.len() == 4));
    assert_eq!(w.table.len(), 6);
    assert_alternates(&w);
}

#[test]
fn even_torus_grids_alternate() {
    for (segments, sides) in [(6, 4), (8, 6)] {
        let w = weave(&primitives::torus_grid(segments, sides, 2.0, 0.5), &GapConfig::default(), 11);
        assert_eq!(w.table.len(), segments * sides);
        assert_alternates(&w);
        assert!(w.warnings.is_empty());
    }
}

#[test]
fn bipyramid_poles_alternate_at_every_gap() {
    for k in [6, 8, 10] {
        for gap in 0..=k / 2 {
            for seed in 0..2 {
                let w = weave(&primitives::bipyramid(k), &GapConfig::uniform(gap), seed);
                assert!(w.warnings.is_empty(), "bipyramid {k} gap {gap}: {:?}", w.warnings);
                assert_alternates(&w);
            }
        }
    }
}

#[test]
fn odd_torus_grid_reports_non_alternating_crossings() {
    let w = weave(&primitives::torus_grid(5, 4, 2.0, 0.5), &GapConfig::default(), 0);
    let flagged = w.table.non_alternating_count();
    assert!(flagged > 0);
    let reported = w
        .warnings
        .iter()
        .filter(|warning| matches!(warning, KnotWarning::NonAlternatingCrossing { .. }))
        .count();
    assert_eq!(reported, flagged);
}

#[test]
fn cube_odd_vertices_pair_across_faces() {
    let w = weave(&primitives::cube(), &GapConfig::default(), 0);
    let face_routes = w
        .graph
        .connections
        .iter()
        .filter(|c| matches!(c.route, Route::Face { .. }))
        .count();
    assert_eq!(face_routes, 4);
    assert!(w.graph.terminating_ends().is_empty());
    assert_eq!(w.strands.len(), 3);
    assert_eq!(w.table.len(), 8);
    assert!(w.table.crossings.iter().any(|c| matches!(c.location, Location::Vertex(_))));
}

#[test]
fn bordered_grid_traces_open_strands() {
    let w = weave(&primitives::grid(3, 3), &GapConfig::default(), 0);
    assert_eq!(w.graph.terminating_ends().len(), 12);
    assert_eq!(w.strands.len(), 6);
    assert!(w.strands.iter().all(|s| !s.closed));
    assert_eq!(w.table.len(), 4);
    assert!(w.warnings.is_empty());
    assert_alternates(&w);
}

#[test]
fn gap_overrides_apply_per_vertex() {
    let mut gap = GapConfig::uniform(1);
    gap.overrides.insert(4, 0);
    gap.overrides.insert(5, 0);
    let w = weave(&primitives::octahedron(), &gap, 0);
    assert!(w.table.crossings.iter().all(|c| c.location != Location::Vertex(4)));
    assert!(w.table.crossings.iter().all(|c| c.location != Location::Vertex(5)));
    assert_eq!(w.table.len(), 4);
}

#[test]
fn generation_is_deterministic() {
    let mesh = primitives::torus_grid(6, 4, 2.0, 0.5);
    let a = weave(&mesh, &GapConfig::default(), 42);
    let b = weave(&mesh, &GapConfig::default(), 42);
    assert_eq!(a.strands, b.strands);
    assert_eq!(a.table.crossings, b.table.crossings);
    assert_eq!(a.table.events, b.table.events);
}
