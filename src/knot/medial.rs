//! Weave graph construction.
//!
//! Every framework edge carries one [`WeaveNode`] at its midpoint. A node has
//! two ends, one at each endpoint of the edge; end `side` of node `n` has the
//! id `2 * n + side` and turns at `edge.vertices[side]`. Around each vertex
//! the ends are paired by the gap rule and joined by [`Connection`]s.
//!
//! Odd vertices are matched across a shared face: each gives up the end
//! opposite that face and the two spare ends are joined by a connection that
//! runs through the face interior.
//!
//! Every boundary edge ends one of its node's ends without a connection. Each
//! border loop is walked once and an edge ends at its tail when the tail would
//! otherwise keep an odd number of ends to pair, at its head otherwise.
//!
//! Each connection records the [`Pass`]es it makes. A pass is a chord between
//! two slots on the cyclic slot ring of a location:
//! - vertex: incident edge `i` is slot `2i`, the sector after it `2i + 1`;
//! - face: corner `j` is slot `2j`.
//!
//! Two passes at the same location cross exactly when their chords interleave.

use serde::Serialize;

use super::config::GapConfig;
use super::error::{KnotWarning, Location, push_warning};
use super::framework::{FrameworkTopology, VertexRotation};
use crate::geom::Point3;

#[must_use]
pub const fn end_id(node: usize, side: usize) -> usize {
    2 * node + side
}

#[must_use]
pub const fn end_node(end: usize) -> usize {
    end / 2
}

#[must_use]
pub const fn end_side(end: usize) -> usize {
    end % 2
}

/// The other end of the same node.
#[must_use]
pub const fn opposite_end(end: usize) -> usize {
    end ^ 1
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaveNode {
    pub edge: usize,
    pub midpoint: Point3,
    /// Vertex each end turns at.
    pub vertices: [usize; 2],
    pub faces: [Option<usize>; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Route {
    /// Both ends turn at the same vertex.
    Vertex { vertex: usize },
    /// The ends belong to two odd vertices matched across `face`.
    Face { face: usize, vertices: [usize; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pass {
    pub location: Location,
    pub chord: [usize; 2],
    /// Size of the slot ring at `location`.
    pub slots: usize,
}

impl Pass {
    /// Whether the two chords cross on the slot ring. Chords sharing a slot
    /// never interleave.
    #[must_use]
    pub fn interleaves(&self, other: &Pass) -> bool {
        if self.location != other.location {
            return false;
        }
        let (a, b) = ordered(self.chord);
        let (c, d) = ordered(other.chord);
        (a < c && c < b && b < d) || (c < a && a < d && d < b)
    }
}

fn ordered([a, b]: [usize; 2]) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub ends: [usize; 2],
    pub route: Route,
    /// Passes in order from `ends[0]` to `ends[1]`.
    pub passes: Vec<Pass>,
}

impl Connection {
    #[must_use]
    pub fn other(&self, end: usize) -> usize {
        if self.ends[0] == end { self.ends[1] } else { self.ends[0] }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WeaveGraph {
    pub nodes: Vec<WeaveNode>,
    pub connections: Vec<Connection>,
    end_connection: Vec<Option<usize>>,
    terminating: Vec<usize>,
}

impl WeaveGraph {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn end_count(&self) -> usize {
        self.end_connection.len()
    }

    /// Connection consuming `end`, `None` for a terminating end.
    #[must_use]
    pub fn connection_at(&self, end: usize) -> Option<usize> {
        self.end_connection[end]
    }

    /// Terminating ends in ascending order.
    #[must_use]
    pub fn terminating_ends(&self) -> &[usize] {
        &self.terminating
    }

    #[must_use]
    pub fn is_terminating(&self, end: usize) -> bool {
        self.end_connection[end].is_none()
    }

    fn connect(&mut self, ends: [usize; 2], route: Route, passes: Vec<Pass>) {
        let index = self.connections.len();
        self.end_connection[ends[0]] = Some(index);
        self.end_connection[ends[1]] = Some(index);
        self.connections.push(Connection { ends, route, passes });
    }
}

/// Per-vertex bookkeeping while pairing.
#[derive(Debug, Clone, Default)]
struct VertexPlan {
    /// Edge given up to a face route, with the matched face.
    leftover: Option<(usize, usize)>,
    odd_candidate: bool,
    /// Rotation positions of boundary edges that end here.
    border_ends: Vec<usize>,
}

fn end_at(topology: &FrameworkTopology, edge: usize, vertex: usize) -> usize {
    let side = usize::from(topology.edge(edge).vertices[0] != vertex);
    end_id(edge, side)
}

/// Rotation position of the edge opposite the sector of `face` at a vertex.
fn opposite_position(rotation: &VertexRotation, face: usize) -> Option<usize> {
    let sector = rotation.position_of_sector(face)?;
    let degree = rotation.degree();
    Some((sector + 1 + (degree - 1) / 2) % degree)
}

pub fn build_weave_graph(topology: &FrameworkTopology, gap: &GapConfig, warnings: &mut Vec<KnotWarning>) -> WeaveGraph {
    let node_count = topology.edge_count();
    let mut graph = WeaveGraph {
        nodes: topology
            .edges()
            .iter()
            .enumerate()
            .map(|(edge, e)| WeaveNode {
                edge,
                midpoint: topology.edge_midpoint(edge),
                vertices: e.vertices,
                faces: e.faces,
            })
            .collect(),
        connections: Vec::new(),
        end_connection: vec![None; 2 * node_count],
        terminating: Vec::new(),
    };

    let vertex_count = topology.vertex_count();
    let mut plans = vec![VertexPlan::default(); vertex_count];
    for (vertex, plan) in plans.iter_mut().enumerate() {
        let rotation = topology.rotation(vertex);
        plan.odd_candidate = rotation.degree() >= 3 && rotation.degree() % 2 == 1 && !rotation.boundary;
    }

    match_odd_vertices(topology, &mut plans, &mut graph);
    place_border_ends(topology, &mut plans);

    for (vertex, plan) in plans.iter().enumerate() {
        let rotation = topology.rotation(vertex);
        let degree = rotation.degree();
        if degree < 2 {
            push_warning(warnings, KnotWarning::DegenerateVertex { vertex, degree });
            for &edge in &rotation.edges {
                graph.terminating.push(end_at(topology, edge, vertex));
            }
            continue;
        }

        for &position in &plan.border_ends {
            graph.terminating.push(end_at(topology, rotation.edges[position], vertex));
        }
        let mut order: Vec<usize> = (0..degree).filter(|p| !plan.border_ends.contains(p)).collect();
        if let Some((edge, _)) = plan.leftover {
            let position = rotation.position_of_edge(edge).unwrap_or(0);
            order.rotate_left(position);
            order.remove(0);
        } else if order.len() % 2 == 1 {
            // Prefer an inner edge so that boundary edges keep a single end.
            let pick = order
                .iter()
                .position(|&p| !topology.edge(rotation.edges[p]).is_boundary())
                .unwrap_or(0);
            let edge = rotation.edges[order.remove(pick)];
            if !rotation.boundary {
                push_warning(warnings, KnotWarning::UnpairedOddVertex { vertex, edge });
            }
            graph.terminating.push(end_at(topology, edge, vertex));
        }

        pair_by_gap(topology, vertex, gap.for_vertex(vertex), order, &mut graph);
    }

    graph.terminating.sort_unstable();
    log::debug!(
        "weave graph: {} nodes, {} connections, {} terminating ends",
        graph.node_count(),
        graph.connections.len(),
        graph.terminating.len()
    );
    graph
}

/// Walks every border loop once and picks the terminating end of each of its
/// edges.
fn place_border_ends(topology: &FrameworkTopology, plans: &mut [VertexPlan]) {
    let mut placed = vec![false; topology.edge_count()];
    for start in 0..topology.vertex_count() {
        let mut current = start;
        while let Some(position) = topology.rotation(current).boundary_exit() {
            let rotation = topology.rotation(current);
            let edge = rotation.edges[position];
            if placed[edge] {
                break;
            }
            placed[edge] = true;

            let next = topology.edge(edge).other(current);
            if (plans[current].border_ends.len() + rotation.degree()) % 2 == 1 {
                plans[current].border_ends.push(position);
            } else if let Some(at_next) = topology.rotation(next).position_of_edge(edge) {
                plans[next].border_ends.push(at_next);
            }
            current = next;
        }
    }
}

/// Pairs odd interior vertices across shared faces and adds their face routes.
/// Consecutive corners of a face are tried first, then any two corners.
fn match_odd_vertices(topology: &FrameworkTopology, plans: &mut [VertexPlan], graph: &mut WeaveGraph) {
    for consecutive_only in [true, false] {
        for face in 0..topology.face_count() {
            let corners = topology.face(face);
            let k = corners.len();
            for j in 0..k {
                let partners: Vec<usize> = if consecutive_only {
                    vec![(j + 1) % k]
                } else {
                    (j + 1..k).collect()
                };
                for l in partners {
                    try_match(topology, plans, graph, face, [j, l]);
                }
            }
        }
    }
}

fn try_match(
    topology: &FrameworkTopology,
    plans: &mut [VertexPlan],
    graph: &mut WeaveGraph,
    face: usize,
    corners: [usize; 2],
) {
    let loop_ = topology.face(face);
    let (v, w) = (loop_[corners[0]], loop_[corners[1]]);
    let available = |plan: &VertexPlan| plan.odd_candidate && plan.leftover.is_none();
    if v == w || !available(&plans[v]) || !available(&plans[w]) {
        return;
    }

    let (rv, rw) = (topology.rotation(v), topology.rotation(w));
    let (Some(pv), Some(pw)) = (opposite_position(rv, face), opposite_position(rw, face)) else {
        return;
    };
    let (xv, xw) = (rv.edges[pv], rw.edges[pw]);
    if xv == xw {
        return;
    }
    let (Some(sv), Some(sw)) = (rv.position_of_sector(face), rw.position_of_sector(face)) else {
        return;
    };

    plans[v].leftover = Some((xv, face));
    plans[w].leftover = Some((xw, face));
    let passes = vec![
        Pass {
            location: Location::Vertex(v),
            chord: [2 * pv, 2 * sv + 1],
            slots: 2 * rv.degree(),
        },
        Pass {
            location: Location::Face(face),
            chord: [2 * corners[0], 2 * corners[1]],
            slots: 2 * loop_.len(),
        },
        Pass {
            location: Location::Vertex(w),
            chord: [2 * sw + 1, 2 * pw],
            slots: 2 * rw.degree(),
        },
    ];
    log::debug!("odd vertices {v} and {w} matched across face {face}");
    graph.connect(
        [end_at(topology, xv, v), end_at(topology, xw, w)],
        Route::Face { face, vertices: [v, w] },
        passes,
    );
}

/// Takes the first remaining end, skips `gap` further ends and pairs it with
/// the next; the skip saturates at the last remaining end.
fn pair_by_gap(topology: &FrameworkTopology, vertex: usize, gap: usize, mut order: Vec<usize>, graph: &mut WeaveGraph) {
    let rotation = topology.rotation(vertex);
    while order.len() >= 2 {
        let a = order.remove(0);
        let b = order.remove(gap.min(order.len() - 1));
        let ends = [
            end_at(topology, rotation.edges[a], vertex),
            end_at(topology, rotation.edges[b], vertex),
        ];
        graph.connect(
            ends,
            Route::Vertex { vertex },
            vec![Pass {
                location: Location::Vertex(vertex),
                chord: [2 * a, 2 * b],
                slots: 2 * rotation.degree(),
            }],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use crate::knot::primitives;

    fn graph_for(mesh: &crate::knot::FrameworkMesh, gap: usize) -> (WeaveGraph, Vec<KnotWarning>) {
        let topology = FrameworkTopology::build(mesh, Tolerance::default_geom()).expect("valid framework");
        let mut warnings = Vec::new();
        let graph = build_weave_graph(&topology, &GapConfig::uniform(gap), &mut warnings);
        (graph, warnings)
    }

    #[test]
    fn every_end_is_consumed_once_on_closed_meshes() {
        for mesh in [primitives::tetrahedron(), primitives::cube(), primitives::octahedron()] {
            let (graph, warnings) = graph_for(&mesh, 1);
            assert!(warnings.is_empty());
            assert!(graph.terminating_ends().is_empty());
            assert_eq!(graph.connections.len() * 2, graph.end_count());
            for end in 0..graph.end_count() {
                let connection = graph.connection_at(end).expect("end is connected");
                assert!(graph.connections[connection].ends.contains(&end));
            }
        }
    }

    #[test]
    fn tetrahedron_matches_odd_vertices_across_faces() {
        let (graph, _) = graph_for(&primitives::tetrahedron(), 1);
        let face_routes = graph
            .connections
            .iter()
            .filter(|c| matches!(c.route, Route::Face { .. }))
            .count();
        assert_eq!(face_routes, 2);
        assert_eq!(graph.connections.len(), 6);
    }

    #[test]
    fn gap_zero_turns_back_at_degree_four() {
        let (graph, _) = graph_for(&primitives::octahedron(), 0);
        for connection in &graph.connections {
            let [a, b] = connection.passes[0].chord;
            assert_eq!(a.abs_diff(b), 2, "gap 0 pairs neighbouring edges");
        }
    }

    #[test]
    fn gap_one_crosses_at_degree_four() {
        let (graph, _) = graph_for(&primitives::octahedron(), 1);
        let at_top: Vec<&Pass> = graph
            .connections
            .iter()
            .flat_map(|c| &c.passes)
            .filter(|p| p.location == Location::Vertex(4))
            .collect();
        assert_eq!(at_top.len(), 2);
        assert!(at_top[0].interleaves(at_top[1]));
    }

    fn assert_one_end_per_boundary_edge(mesh: &crate::knot::FrameworkMesh, graph: &WeaveGraph) {
        let topology = FrameworkTopology::build(mesh, Tolerance::default_geom()).expect("valid framework");
        for (edge, e) in topology.edges().iter().enumerate() {
            let ends = (0..2).filter(|&side| graph.is_terminating(end_id(edge, side))).count();
            if e.is_boundary() {
                assert_eq!(ends, 1, "boundary edge {edge}");
            }
        }
    }

    #[test]
    fn border_vertices_terminate_without_warning() {
        let mesh = primitives::grid(2, 2);
        let (graph, warnings) = graph_for(&mesh, 1);
        assert!(warnings.is_empty());
        assert_eq!(graph.terminating_ends().len(), 8);
        assert_one_end_per_boundary_edge(&mesh, &graph);
    }

    #[test]
    fn every_boundary_edge_ends_once() {
        for mesh in [primitives::quad_face(), primitives::grid(3, 3), primitives::grid(3, 2)] {
            for gap in 0..3 {
                let (graph, warnings) = graph_for(&mesh, gap);
                assert!(warnings.is_empty());
                assert_one_end_per_boundary_edge(&mesh, &graph);
                let paired = graph.connections.len() * 2 + graph.terminating_ends().len();
                assert_eq!(paired, graph.end_count());
            }
        }
    }

    #[test]
    fn wire_loop_has_no_terminating_ends() {
        let (graph, warnings) = graph_for(&primitives::quad_loop(), 1);
        assert!(warnings.is_empty());
        assert!(graph.terminating_ends().is_empty());
        assert_eq!(graph.connections.len(), 4);
    }

    #[test]
    fn dangling_edge_reports_degenerate_vertex() {
        let mut mesh = primitives::quad_face();
        mesh.positions.push([2.0, 0.0, 0.0]);
        mesh.edges.push([1, 4]);
        let (graph, warnings) = graph_for(&mesh, 1);
        assert!(warnings.contains(&KnotWarning::DegenerateVertex { vertex: 4, degree: 1 }));
        assert!(graph.terminating_ends().contains(&end_id(4, 1)));
    }

    #[test]
    fn chords_sharing_a_slot_do_not_interleave() {
        let a = Pass {
            location: Location::Face(0),
            chord: [0, 4],
            slots: 8,
        };
        let b = Pass {
            location: Location::Face(0),
            chord: [4, 2],
            slots: 8,
        };
        let c = Pass {
            location: Location::Face(0),
            chord: [2, 6],
            slots: 8,
        };
        assert!(!a.interleaves(&b));
        assert!(a.interleaves(&c));
        assert!(!a.interleaves(&Pass { location: Location::Face(1), ..c }));
    }
}
