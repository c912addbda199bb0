//! maxDOP recommendation
//!
//! The recommended value follows the topology: on a single NUMA node use the
//! physical core count, on several nodes use the cores of one node. Either
//! way the value is capped at [`MAXDOP_CAP`].

use super::{Finding, Rule, RuleId, FALLBACK_NUMA_NODES};
use crate::error::Result;
use crate::snapshot::{Metric, MetricSnapshot};

/// Upper bound for any recommended maxDOP
pub const MAXDOP_CAP: u32 = 8;

/// Computed recommendation and how it was derived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxdopRecommendation {
    /// Recommended maxDOP
    pub value: u32,
    /// Human-readable reason
    pub reason: String,
    /// Machine tag for the reason
    pub reason_code: &'static str,
    /// Fallbacks applied while computing the value
    pub notes: Vec<String>,
}

/// Compute the recommended maxDOP from the snapshot's topology
pub fn recommend_maxdop(snapshot: &MetricSnapshot) -> MaxdopRecommendation {
    let mut notes = Vec::new();

    let nodes = match snapshot.numa_node_count {
        Metric::Available(n) => n,
        Metric::Unavailable => {
            notes.push(format!(
                "NUMA node count unavailable; assuming {} NUMA node.",
                FALLBACK_NUMA_NODES
            ));
            FALLBACK_NUMA_NODES
        }
    };

    let cores = snapshot
        .physical_core_count
        .or(snapshot.logical_processor_count)
        .or(snapshot.logical_cpu_count);
    let cores = match cores {
        Metric::Available(c) => {
            if snapshot.physical_core_count.is_unavailable() {
                notes.push(format!(
                    "Physical core count unavailable; using {} logical processors.",
                    c
                ));
            }
            c
        }
        Metric::Unavailable => {
            notes.push(format!(
                "Core count unavailable; assuming the general cap of {}.",
                MAXDOP_CAP
            ));
            MAXDOP_CAP
        }
    };

    if nodes <= 1 {
        MaxdopRecommendation {
            value: cores.clamp(1, MAXDOP_CAP),
            reason: "Single NUMA node - general best practice".to_string(),
            reason_code: "single-numa-node-best-practice",
            notes,
        }
    } else {
        MaxdopRecommendation {
            value: (cores / nodes).clamp(1, MAXDOP_CAP),
            reason: format!(
                "{} NUMA nodes detected - cores per NUMA node, capped at {}",
                nodes, MAXDOP_CAP
            ),
            reason_code: "multi-numa-node-cores-per-node",
            notes,
        }
    }
}

/// Compares the configured maxDOP with the topology-based recommendation
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxdopRule;

impl Rule for MaxdopRule {
    fn id(&self) -> RuleId {
        RuleId::MaxdopRecommendation
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let current = match snapshot.current_max_dop {
            Metric::Available(v) => v,
            Metric::Unavailable => {
                return Ok(Finding::fail(self.id(), "Unable to retrieve current maxDOP")
                    .with_reason("maxdop-unavailable"));
            }
        };

        let rec = recommend_maxdop(snapshot);
        let mut message = if current == rec.value {
            format!(
                "Current maxDOP {} matches the recommended value. Reason: {}.",
                current, rec.reason
            )
        } else {
            format!(
                "Current maxDOP: {}; recommended maxDOP: {}. Reason: {}.",
                current, rec.value, rec.reason
            )
        };
        for note in &rec.notes {
            message.push(' ');
            message.push_str(note);
        }

        let finding = if current == rec.value {
            Finding::pass(self.id(), message)
        } else {
            Finding::warn(self.id(), message)
                .with_recommendation(format!("Recommended maxDOP: {}", rec.value))
        };
        Ok(finding.with_reason(rec.reason_code))
    }
}
