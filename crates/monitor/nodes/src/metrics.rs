//! Metrics handles owned by each node.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Label, Level, Metadata, Recorder, Unit};

/// Per-node metric handles, registered against an injected [`Recorder`].
#[derive(Debug, Clone)]
pub struct NodeMetrics {
    head: Gauge,
    reorgs: Counter,
    reorg_depth: Histogram,
}

impl NodeMetrics {
    /// Prefix of the per-node head gauge, `head/<name>`.
    pub const HEAD_GAUGE_PREFIX: &'static str = "head";
    /// Total number of stale ancestors replaced, labelled by node.
    pub const NODE_REORGS_TOTAL: &'static str = "headwatch_node_reorgs_total";
    /// Depth of each detected reorg, labelled by node.
    pub const NODE_REORG_DEPTH: &'static str = "headwatch_node_reorg_depth";

    /// Creates metrics from existing handles.
    pub const fn new(head: Gauge, reorgs: Counter, reorg_depth: Histogram) -> Self {
        Self { head, reorgs, reorg_depth }
    }

    /// Creates metrics that discard every update.
    pub fn noop() -> Self {
        Self::new(Gauge::noop(), Counter::noop(), Histogram::noop())
    }

    /// Returns the name of the head gauge for the node called `name`.
    pub fn head_gauge_name(name: &str) -> String {
        format!("{}/{name}", Self::HEAD_GAUGE_PREFIX)
    }

    /// Registers the metrics of the node called `name` with `recorder`.
    pub fn register(name: &str, recorder: &dyn Recorder) -> Self {
        let metadata = metadata();
        let labels = vec![Label::new("node", name.to_string())];
        Self::new(
            recorder.register_gauge(&Key::from_name(Self::head_gauge_name(name)), &metadata),
            recorder.register_counter(
                &Key::from_parts(Self::NODE_REORGS_TOTAL, labels.clone()),
                &metadata,
            ),
            recorder.register_histogram(&Key::from_parts(Self::NODE_REORG_DEPTH, labels), &metadata),
        )
    }

    /// Describes the shared metrics to `recorder`.
    pub fn describe(recorder: &dyn Recorder) {
        recorder.describe_counter(
            KeyName::from_const_str(Self::NODE_REORGS_TOTAL),
            Some(Unit::Count),
            "Total number of stale ancestors replaced after a reorg".into(),
        );
        recorder.describe_histogram(
            KeyName::from_const_str(Self::NODE_REORG_DEPTH),
            Some(Unit::Count),
            "Depth of reorgs detected while walking cached ancestry".into(),
        );
    }

    /// Records a new head.
    pub fn record_head(&self, number: u64) {
        self.head.set(number as f64);
    }

    /// Records a reorg of the given depth. A depth of zero is ignored.
    pub fn record_reorg(&self, depth: u64) {
        if depth == 0 {
            return;
        }
        self.reorgs.increment(depth);
        self.reorg_depth.record(depth as f64);
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::noop()
    }
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}
