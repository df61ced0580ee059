//! Crossing enumeration and over/under resolution.
//!
//! A crossing is a pair of passes at one location whose chords interleave.
//! Crossings are numbered by location (vertices before faces, each in index
//! order) and then by pass order within the location.
//!
//! Every strand sees its crossings as an ordered list of events. Crossings on
//! one pass are met in the order they cut the pass's chord, walked from the
//! entry slot to the exit slot. The state of
//! event `i` is `anchor XOR (i odd)`, so a strand alternates by construction
//! once its anchor is known. Anchors spread over a worklist: the partner pass
//! of every crossing must take the opposite state, which fixes the partner
//! strand's anchor. A strand not yet reached draws its anchor from the seeded
//! generator.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::f64::consts::TAU;

use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::error::{KnotWarning, Location, push_warning};
use super::medial::WeaveGraph;
use super::tracer::Strand;

/// One pass of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PassRef {
    pub connection: usize,
    pub pass: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crossing {
    pub location: Location,
    pub passes: [PassRef; 2],
    pub strands: [usize; 2],
    /// Index into `passes` of the pass that goes over.
    pub over: usize,
    pub alternating: bool,
}

/// A crossing as met along a strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrossingEvent {
    pub crossing: usize,
    /// Which of the crossing's passes this strand makes.
    pub side: usize,
    /// Strand link (Bézier segment) carrying the pass.
    pub link: usize,
    /// Position of the pass along the link, in traversal order.
    pub pass_position: usize,
    pub pass_count: usize,
    /// Position among the crossings sharing this pass.
    pub slot: usize,
    pub slot_count: usize,
    pub over: bool,
}

impl CrossingEvent {
    /// Parameter of the event centre within its segment, in `(0, 1)`.
    #[must_use]
    pub fn segment_parameter(&self) -> f64 {
        let pass_width = 1.0 / (self.pass_count + 1) as f64;
        let centre = (self.pass_position + 1) as f64 * pass_width;
        let slot_offset = (self.slot + 1) as f64 / (self.slot_count + 1) as f64 - 0.5;
        centre + slot_offset * pass_width
    }

    /// Half-width of the event's bump, in segment parameter units.
    #[must_use]
    pub fn half_width(&self) -> f64 {
        1.0 / ((self.pass_count + 1) * self.slot_count.max(1)) as f64
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossingTable {
    pub crossings: Vec<Crossing>,
    /// Events per strand, in traversal order.
    pub events: Vec<Vec<CrossingEvent>>,
}

impl CrossingTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.crossings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.crossings.is_empty()
    }

    #[must_use]
    pub fn events_for(&self, strand: usize) -> &[CrossingEvent] {
        self.events.get(strand).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn non_alternating_count(&self) -> usize {
        self.crossings.iter().filter(|c| !c.alternating).count()
    }
}

fn parity_state(anchor: bool, event: usize) -> bool {
    anchor ^ (event % 2 == 1)
}

/// Fractional part of the golden ratio.
const SLOT_JITTER_STEP: f64 = 0.618_033_988_749_895;

/// Point of `slot` on a unit circle split into `slots` positions. Each slot is
/// nudged forward by less than a quarter step so that no three chords of a
/// regular ring meet in one point.
fn slot_point(slot: usize, slots: usize) -> (f64, f64) {
    let jitter = 0.25 * (slot as f64 * SLOT_JITTER_STEP).fract();
    let angle = TAU * (slot as f64 + jitter) / slots.max(1) as f64;
    (angle.cos(), angle.sin())
}

/// Parameter along the chord `from -> to` where the chord `other` cuts it.
fn chord_parameter([from, to]: [usize; 2], other: [usize; 2], slots: usize) -> f64 {
    let (p0, p1) = (slot_point(from, slots), slot_point(to, slots));
    let (q0, q1) = (slot_point(other[0], slots), slot_point(other[1], slots));
    let r = (p1.0 - p0.0, p1.1 - p0.1);
    let s = (q1.0 - q0.0, q1.1 - q0.1);
    let denominator = r.0 * s.1 - r.1 * s.0;
    if denominator.abs() <= f64::EPSILON {
        return 0.5;
    }
    ((q0.0 - p0.0) * s.1 - (q0.1 - p0.1) * s.0) / denominator
}

pub fn resolve_crossings(
    graph: &WeaveGraph,
    strands: &[Strand],
    alternation_seed: u64,
    warnings: &mut Vec<KnotWarning>,
) -> CrossingTable {
    let mut strand_of = vec![None; graph.connections.len()];
    for (s, strand) in strands.iter().enumerate() {
        for link in &strand.links {
            strand_of[link.connection] = Some(s);
        }
    }

    let mut by_location: BTreeMap<Location, Vec<PassRef>> = BTreeMap::new();
    for (connection, c) in graph.connections.iter().enumerate() {
        if strand_of[connection].is_none() {
            continue;
        }
        for (pass, p) in c.passes.iter().enumerate() {
            by_location.entry(p.location).or_default().push(PassRef { connection, pass });
        }
    }

    let pass_at = |r: PassRef| &graph.connections[r.connection].passes[r.pass];
    let mut crossings = Vec::new();
    let mut pass_crossings: HashMap<PassRef, Vec<usize>> = HashMap::new();
    for (&location, refs) in &by_location {
        for (i, &a) in refs.iter().enumerate() {
            for &b in &refs[i + 1..] {
                if !pass_at(a).interleaves(pass_at(b)) {
                    continue;
                }
                let id = crossings.len();
                crossings.push(Crossing {
                    location,
                    passes: [a, b],
                    strands: [
                        strand_of[a.connection].unwrap_or_default(),
                        strand_of[b.connection].unwrap_or_default(),
                    ],
                    over: 0,
                    alternating: true,
                });
                pass_crossings.entry(a).or_default().push(id);
                pass_crossings.entry(b).or_default().push(id);
            }
        }
    }

    let mut events: Vec<Vec<CrossingEvent>> = vec![Vec::new(); strands.len()];
    let mut event_of = vec![[(0usize, 0usize); 2]; crossings.len()];
    for (s, strand) in strands.iter().enumerate() {
        for (link_index, link) in strand.links.iter().enumerate() {
            let pass_count = graph.connections[link.connection].passes.len();
            for pass_position in 0..pass_count {
                let pass = if link.forward {
                    pass_position
                } else {
                    pass_count - 1 - pass_position
                };
                let key = PassRef {
                    connection: link.connection,
                    pass,
                };
                let Some(ids) = pass_crossings.get(&key) else {
                    continue;
                };
                let here = pass_at(key);
                let walked = if link.forward {
                    here.chord
                } else {
                    [here.chord[1], here.chord[0]]
                };
                let mut along: Vec<(f64, usize)> = ids
                    .iter()
                    .map(|&crossing| {
                        let side = usize::from(crossings[crossing].passes[0] != key);
                        let other = pass_at(crossings[crossing].passes[1 - side]);
                        (chord_parameter(walked, other.chord, here.slots), crossing)
                    })
                    .collect();
                along.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

                for (slot, &(_, crossing)) in along.iter().enumerate() {
                    let side = usize::from(crossings[crossing].passes[0] != key);
                    event_of[crossing][side] = (s, events[s].len());
                    events[s].push(CrossingEvent {
                        crossing,
                        side,
                        link: link_index,
                        pass_position,
                        pass_count,
                        slot,
                        slot_count: along.len(),
                        over: false,
                    });
                }
            }
        }
    }

    // Anchor propagation.
    let mut rng: StdRng = SeedableRng::seed_from_u64(alternation_seed);
    let mut anchors: Vec<Option<(bool, usize)>> = vec![None; strands.len()];
    let mut sequence = 0usize;
    let mut conflicts = vec![false; crossings.len()];
    let mut worklist = VecDeque::new();
    for start in 0..strands.len() {
        if anchors[start].is_some() || events[start].is_empty() {
            continue;
        }
        anchors[start] = Some((rng.random::<bool>(), sequence));
        sequence += 1;
        worklist.push_back(start);

        while let Some(s) = worklist.pop_front() {
            let Some((anchor, _)) = anchors[s] else { continue };
            for (i, event) in events[s].iter().enumerate() {
                let (t, j) = event_of[event.crossing][1 - event.side];
                let required = !parity_state(anchor, i) ^ (j % 2 == 1);
                match anchors[t] {
                    None => {
                        anchors[t] = Some((required, sequence));
                        sequence += 1;
                        worklist.push_back(t);
                    }
                    Some((existing, _)) if existing != required => conflicts[event.crossing] = true,
                    Some(_) => {}
                }
            }
        }
    }

    let state = |s: usize, i: usize| anchors[s].is_some_and(|(anchor, _)| parity_state(anchor, i));
    let order = |s: usize, i: usize| (anchors[s].map_or(usize::MAX, |(_, seq)| seq), i);
    for (id, crossing) in crossings.iter_mut().enumerate() {
        let [(s0, i0), (s1, i1)] = event_of[id];
        let (st0, st1) = (state(s0, i0), state(s1, i1));
        if st0 == st1 {
            conflicts[id] = true;
            crossing.over = usize::from(order(s1, i1) < order(s0, i0));
        } else {
            crossing.over = usize::from(st1);
        }
    }

    for (s, strand) in strands.iter().enumerate() {
        if strand.closed && events[s].len() % 2 == 1 {
            if let Some(last) = events[s].last() {
                conflicts[last.crossing] = true;
            }
        }
    }

    for (id, crossing) in crossings.iter_mut().enumerate() {
        if conflicts[id] {
            crossing.alternating = false;
            push_warning(
                warnings,
                KnotWarning::NonAlternatingCrossing {
                    crossing: id,
                    location: crossing.location,
                },
            );
        }
    }
    for strand_events in &mut events {
        for event in strand_events.iter_mut() {
            event.over = crossings[event.crossing].over == event.side;
        }
    }

    log::debug!(
        "resolved {} crossings ({} non-alternating)",
        crossings.len(),
        conflicts.iter().filter(|&&c| c).count()
    );
    CrossingTable { crossings, events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;
    use crate::knot::config::GapConfig;
    use crate::knot::framework::FrameworkTopology;
    use crate::knot::medial::build_weave_graph;
    use crate::knot::primitives;
    use crate::knot::tracer::trace_strands;

    fn table_for(mesh: &crate::knot::FrameworkMesh, gap: usize, seed: u64) -> (Vec<Strand>, CrossingTable, Vec<KnotWarning>) {
        let topology = FrameworkTopology::build(mesh, Tolerance::default_geom()).expect("valid framework");
        let mut warnings = Vec::new();
        let graph = build_weave_graph(&topology, &GapConfig::uniform(gap), &mut warnings);
        let strands = trace_strands(&graph);
        let table = resolve_crossings(&graph, &strands, seed, &mut warnings);
        (strands, table, warnings)
    }

    fn assert_alternates(table: &CrossingTable) {
        for events in &table.events {
            for pair in events.windows(2) {
                assert_ne!(pair[0].over, pair[1].over, "consecutive events share a state");
            }
        }
    }

    #[test]
    fn octahedron_alternates_for_every_seed() {
        for seed in 0..4 {
            let (_, table, warnings) = table_for(&primitives::octahedron(), 1, seed);
            assert_eq!(table.len(), 6);
            assert_eq!(table.non_alternating_count(), 0);
            assert!(warnings.is_empty());
            assert_alternates(&table);
        }
    }

    #[test]
    fn high_degree_poles_alternate() {
        for k in [6, 8] {
            for seed in 0..3 {
                let (strands, table, warnings) = table_for(&primitives::bipyramid(k), 1, seed);
                assert!(strands.iter().all(|s| s.closed));
                assert_eq!(table.len(), 2 * k - 2, "bipyramid {k}");
                assert_eq!(table.non_alternating_count(), 0, "bipyramid {k} seed {seed}");
                assert!(warnings.is_empty());
                assert_alternates(&table);
            }
        }
    }

    #[test]
    fn wide_gaps_alternate_around_high_degree_poles() {
        for gap in 2..4 {
            let (_, table, _) = table_for(&primitives::bipyramid(8), gap, 0);
            assert_eq!(table.non_alternating_count(), 0, "gap {gap}");
            assert_alternates(&table);
        }
    }

    #[test]
    fn crossings_are_met_from_the_entry_slot() {
        // Chord 0 -> 6 on a ring of 12: [1, 11] cuts it near slot 0, [5, 7] near slot 6.
        let near_entry = chord_parameter([0, 6], [1, 11], 12);
        let near_exit = chord_parameter([0, 6], [5, 7], 12);
        assert!(near_entry < near_exit);

        let reversed = chord_parameter([6, 0], [1, 11], 12);
        assert!((reversed - (1.0 - near_entry)).abs() < 1e-9);
        assert!(chord_parameter([6, 0], [5, 7], 12) < reversed);
    }

    #[test]
    fn every_crossing_has_one_pass_over() {
        let (_, table, _) = table_for(&primitives::tetrahedron(), 1, 7);
        assert!(!table.is_empty());
        for (id, crossing) in table.crossings.iter().enumerate() {
            let overs = table
                .events
                .iter()
                .flatten()
                .filter(|e| e.crossing == id && e.over)
                .count();
            assert_eq!(overs, 1, "crossing {} at {}", id, crossing.location);
        }
    }

    #[test]
    fn gap_zero_has_no_crossings() {
        let (strands, table, _) = table_for(&primitives::octahedron(), 0, 0);
        assert!(table.is_empty());
        assert!(strands.len() > 1);
    }

    #[test]
    fn same_seed_gives_identical_assignment() {
        let (_, a, _) = table_for(&primitives::octahedron(), 1, 1);
        let (_, b, _) = table_for(&primitives::octahedron(), 1, 1);
        assert_eq!(a.crossings, b.crossings);
    }

    #[test]
    fn event_parameters_stay_inside_the_segment() {
        let event = CrossingEvent {
            crossing: 0,
            side: 0,
            link: 0,
            pass_position: 2,
            pass_count: 3,
            slot: 1,
            slot_count: 2,
            over: true,
        };
        let t = event.segment_parameter();
        assert!(t > 0.5 && t < 1.0);
        assert!(t + event.half_width() <= 1.0 + 1e-12);
    }
}
