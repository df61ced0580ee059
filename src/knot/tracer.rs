//! Strand decomposition of the weave graph.
//!
//! Open strands are walked first, one from every terminating end not yet
//! reached, in ascending end order. Every node still unvisited afterwards lies
//! on a cycle; closed strands start from them in node order, entering at end
//! side 0. Each end is visited once.

use serde::Serialize;

use super::medial::{WeaveGraph, end_id, end_node, end_side, opposite_end};

/// A connection as traversed by a strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrandLink {
    pub connection: usize,
    /// `true` when walked from `ends[0]` to `ends[1]`.
    pub forward: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strand {
    pub nodes: Vec<usize>,
    /// `true` when the node is entered at side 0 and left at side 1.
    pub forward: Vec<bool>,
    /// `links[i]` joins `nodes[i]` to `nodes[i + 1]` (cyclically when closed).
    pub links: Vec<StrandLink>,
    pub closed: bool,
}

impl Strand {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of Bézier segments the strand will carry.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.links.len()
    }
}

#[must_use]
pub fn trace_strands(graph: &WeaveGraph) -> Vec<Strand> {
    let mut visited = vec![false; graph.node_count()];
    let mut strands = Vec::new();

    for &start in graph.terminating_ends() {
        if visited[end_node(start)] {
            continue;
        }
        strands.push(walk(graph, start, &mut visited));
    }

    for node in 0..graph.node_count() {
        if !visited[node] {
            strands.push(walk(graph, end_id(node, 0), &mut visited));
        }
    }

    log::debug!(
        "traced {} strands ({} open)",
        strands.len(),
        strands.iter().filter(|s| !s.closed).count()
    );
    strands
}

/// Follows connections from `entry` until a terminating end or the start.
fn walk(graph: &WeaveGraph, entry: usize, visited: &mut [bool]) -> Strand {
    let mut strand = Strand {
        nodes: Vec::new(),
        forward: Vec::new(),
        links: Vec::new(),
        closed: false,
    };

    let mut current = entry;
    loop {
        let node = end_node(current);
        visited[node] = true;
        strand.nodes.push(node);
        strand.forward.push(end_side(current) == 0);

        let exit = opposite_end(current);
        let Some(index) = graph.connection_at(exit) else {
            break;
        };
        let connection = &graph.connections[index];
        let next = connection.other(exit);
        strand.links.push(StrandLink {
            connection: index,
            forward: connection.ends[0] == exit,
        });

        if next == entry {
            strand.closed = true;
            break;
        }
        if visited[end_node(next)] {
            log::warn!("strand walk from end {entry} re-entered node {}", end_node(next));
            strand.links.pop();
            break;
        }
        current = next;
    }
    strand
}
