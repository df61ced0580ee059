//! Opt-in timing hooks for the knot pipeline.
//!
//! Timing is only collected when the `knot_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise
//! every call compiles down to running the closure.
//!
//! ```ignore
//! let mut metrics = KnotMetrics::default();
//! metrics.begin();
//! let strands = metrics.time(TimingBucket::Tracing, || trace_strands(&graph));
//! if let Some(report) = metrics.end() {
//!     println!("tracing: {} ns", report.tracing_ns);
//! }
//! ```

use serde::Serialize;

/// Pipeline stages that accumulate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Framework validation and adjacency indexing.
    Validation,
    /// Weave node and connection construction.
    MedialGraph,
    /// Strand decomposition.
    Tracing,
    /// Crossing enumeration and over/under propagation.
    Crossings,
    /// Bézier fitting.
    Fitting,
    /// Profile sweeps, including mesh repair.
    Extrusion,
    /// Output merging and diagnostics.
    Diagnostics,
}

/// Cumulative nanoseconds per stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct KnotTimingReport {
    pub validation_ns: u64,
    pub medial_graph_ns: u64,
    pub tracing_ns: u64,
    pub crossings_ns: u64,
    pub fitting_ns: u64,
    pub extrusion_ns: u64,
    pub diagnostics_ns: u64,
}

impl KnotTimingReport {
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.validation_ns
            .saturating_add(self.medial_graph_ns)
            .saturating_add(self.tracing_ns)
            .saturating_add(self.crossings_ns)
            .saturating_add(self.fitting_ns)
            .saturating_add(self.extrusion_ns)
            .saturating_add(self.diagnostics_ns)
    }

    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for stage timings. Call [`begin`](Self::begin), wrap stages
/// with [`time`](Self::time) and collect with [`end`](Self::end).
#[derive(Debug, Default)]
pub struct KnotMetrics {
    #[cfg(all(feature = "knot_metrics", not(target_arch = "wasm32")))]
    report: KnotTimingReport,
}

impl KnotMetrics {
    pub fn begin(&mut self) {
        #[cfg(all(feature = "knot_metrics", not(target_arch = "wasm32")))]
        {
            self.report = KnotTimingReport::default();
        }
    }

    /// The accumulated report, or `None` when metrics are compiled out.
    #[must_use]
    pub fn end(&self) -> Option<KnotTimingReport> {
        #[cfg(all(feature = "knot_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "knot_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "knot_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "knot_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "knot_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Validation => &mut self.report.validation_ns,
            TimingBucket::MedialGraph => &mut self.report.medial_graph_ns,
            TimingBucket::Tracing => &mut self.report.tracing_ns,
            TimingBucket::Crossings => &mut self.report.crossings_ns,
            TimingBucket::Fitting => &mut self.report.fitting_ns,
            TimingBucket::Extrusion => &mut self.report.extrusion_ns,
            TimingBucket::Diagnostics => &mut self.report.diagnostics_ns,
        };
        *slot = slot.saturating_add(nanos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_report_total() {
        let report = KnotTimingReport {
            tracing_ns: 1000,
            fitting_ns: 2000,
            extrusion_ns: 3000,
            ..Default::default()
        };
        assert_eq!(report.total_ns(), 6000);
        assert!((report.total_ms() - 0.006).abs() < 1e-9);
    }

    #[test]
    fn time_returns_closure_result() {
        let mut metrics = KnotMetrics::default();
        metrics.begin();
        assert_eq!(metrics.time(TimingBucket::Tracing, || 42), 42);
        let _ = metrics.end();
    }
}
