//! NUMA topology and scheduler rules

use super::{Finding, Rule, RuleId, FALLBACK_NUMA_NODES};
use crate::error::{Result, SnitchError};
use crate::snapshot::{Metric, MetricSnapshot};
use std::collections::BTreeSet;

const PARENT_NODE_MISSING: &str = "NUMA layout cannot be fully validated (parent_node_id missing).";

/// Summarizes CPU and memory specs visible to SQL Server
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpecsRule;

impl Rule for SystemSpecsRule {
    fn id(&self) -> RuleId {
        RuleId::SystemSpecs
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let memory = snapshot
            .physical_memory_mb
            .map(|mb| humansize::format_size(mb.saturating_mul(1024 * 1024), humansize::BINARY));
        let start_time = snapshot
            .sql_start_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string());

        let fields: [(&str, Option<String>); 5] = [
            ("Logical CPUs", snapshot.logical_cpu_count.get().map(|v| v.to_string())),
            ("Hyperthread Ratio", snapshot.hyperthread_ratio.get().map(|v| v.to_string())),
            ("Physical Memory", memory.into_option()),
            ("SQL Server Start Time", start_time.into_option()),
            ("Virtual Machine Type", snapshot.vm_type.get().map(|v| v.to_string())),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        if missing.len() == fields.len() {
            return Ok(Finding::fail(self.id(), "Could not retrieve system specs.")
                .with_recommendation(
                    "Grant VIEW SERVER STATE so sys.dm_os_sys_info can be queried.",
                )
                .with_reason("system-specs-unavailable"));
        }

        let summary = fields
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.as_deref().unwrap_or("unavailable")))
            .collect::<Vec<_>>()
            .join(", ");

        if missing.is_empty() {
            Ok(Finding::pass(self.id(), summary))
        } else {
            Ok(Finding::warn(
                self.id(),
                format!("{}. Partially unavailable: {}.", summary, missing.join(", ")),
            )
            .with_recommendation(
                "Re-run collection with VIEW SERVER STATE to fill in missing specs.",
            )
            .with_reason("system-specs-partial"))
        }
    }
}

/// Checks that logical CPUs divide evenly across NUMA nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct NumaBalanceRule;

impl Rule for NumaBalanceRule {
    fn id(&self) -> RuleId {
        RuleId::NumaBalance
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let nodes = snapshot.numa_node_count;
        if nodes == Metric::Available(0) {
            return Err(SnitchError::rule_defect(self.id().as_str(), "zero NUMA nodes reported"));
        }

        if snapshot.numa_nodes_have_parent_id != Metric::Available(true) {
            let mut message = PARENT_NODE_MISSING.to_string();
            if nodes.is_unavailable() {
                message.push_str(&format!(
                    " Falling back to {} NUMA node (assumed default, node count unavailable).",
                    FALLBACK_NUMA_NODES
                ));
            }
            return Ok(Finding::warn(self.id(), message)
                .with_recommendation(
                    "Confirm sys.dm_os_schedulers exposes parent_node_id and re-run the diagnostics.",
                )
                .with_reason("parent-node-id-missing"));
        }

        let node_count = match nodes {
            Metric::Available(n) => n,
            Metric::Unavailable => {
                return Ok(Finding::warn(
                    self.id(),
                    format!(
                        "NUMA node count unavailable. Falling back to {} NUMA node (assumed default, not detected).",
                        FALLBACK_NUMA_NODES
                    ),
                )
                .with_recommendation("Collect the NUMA node count to validate CPU distribution.")
                .with_reason("numa-node-count-fallback"));
            }
        };

        if node_count == 1 {
            return Ok(Finding::pass(
                self.id(),
                "NUMA CPU distribution appears balanced (single NUMA node).",
            )
            .with_reason("single-numa-node"));
        }

        match snapshot.logical_cpus() {
            Metric::Unavailable => Ok(Finding::warn(
                self.id(),
                format!(
                    "Logical CPU count unavailable; cannot verify CPU distribution across {} NUMA nodes.",
                    node_count
                ),
            )
            .with_recommendation("Collect the logical CPU count to validate NUMA balance.")
            .with_reason("logical-cpu-count-unavailable")),
            Metric::Available(0) => Err(SnitchError::rule_defect(
                self.id().as_str(),
                "zero logical CPUs reported",
            )),
            Metric::Available(cpus) if cpus % node_count == 0 => Ok(Finding::pass(
                self.id(),
                format!(
                    "NUMA CPU distribution appears balanced ({} logical CPUs on each of {} nodes).",
                    cpus / node_count,
                    node_count
                ),
            )),
            Metric::Available(cpus) => Ok(Finding::warn(
                self.id(),
                format!(
                    "NUMA nodes have unbalanced CPU counts: {} logical CPUs across {} nodes.",
                    cpus, node_count
                ),
            )
            .with_recommendation(
                "Size vCPUs so they divide evenly across NUMA nodes (match cores per socket to the host NUMA node size).",
            )
            .with_reason("unbalanced-numa-cpus")),
        }
    }
}

/// Flags schedulers that are offline
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStatusRule;

impl Rule for SchedulerStatusRule {
    fn id(&self) -> RuleId {
        RuleId::SchedulerStatus
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        match snapshot.offline_scheduler_ids.get() {
            None => Ok(Finding::warn(self.id(), "Scheduler status unavailable.")
                .with_recommendation(
                    "Grant VIEW SERVER STATE so sys.dm_os_schedulers can be queried.",
                )
                .with_reason("scheduler-status-unavailable")),
            Some(offline) if offline.is_empty() => {
                Ok(Finding::pass(self.id(), "All schedulers are online."))
            }
            Some(offline) => {
                let mut cpus = offline.clone();
                cpus.sort_unstable();
                Ok(Finding::warn(
                    self.id(),
                    format!("Offline schedulers detected on CPUs: {}.", join_ids(&cpus)),
                )
                .with_recommendation(
                    "Check the affinity mask and licensing limits; offline schedulers leave CPUs unused.",
                )
                .with_reason("offline-schedulers"))
            }
        }
    }
}

/// Compares scheduler NUMA nodes with memory nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryNodeAlignmentRule;

impl Rule for MemoryNodeAlignmentRule {
    fn id(&self) -> RuleId {
        RuleId::MemoryNodeAlignment
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let scheduler_nodes = match snapshot.scheduler_node_ids.get() {
            Some(ids) if snapshot.numa_nodes_have_parent_id == Metric::Available(true) => ids,
            _ => {
                return Ok(Finding::warn(self.id(), PARENT_NODE_MISSING)
                    .with_recommendation(
                        "Confirm sys.dm_os_schedulers exposes parent_node_id and re-run the diagnostics.",
                    )
                    .with_reason("parent-node-id-missing"));
            }
        };

        let memory_nodes = match snapshot.memory_node_ids.get() {
            Some(ids) => ids,
            None => {
                return Ok(Finding::warn(self.id(), "Memory node layout unavailable.")
                    .with_recommendation(
                        "Grant VIEW SERVER STATE so sys.dm_os_memory_nodes can be queried.",
                    )
                    .with_reason("memory-nodes-unavailable"));
            }
        };

        let schedulers: BTreeSet<u32> = scheduler_nodes.iter().copied().collect();
        let memory: BTreeSet<u32> = memory_nodes.iter().copied().collect();

        let without_memory: Vec<u32> = schedulers.difference(&memory).copied().collect();
        let without_cpus: Vec<u32> = memory.difference(&schedulers).copied().collect();

        if without_memory.is_empty() && without_cpus.is_empty() {
            return Ok(Finding::pass(
                self.id(),
                "All scheduler nodes have memory assigned and all memory nodes align with scheduler nodes.",
            ));
        }

        let mut problems = Vec::new();
        if !without_memory.is_empty() {
            problems.push(format!(
                "NUMA nodes with schedulers but no memory assigned: {}.",
                join_ids(&without_memory)
            ));
        }
        if !without_cpus.is_empty() {
            problems.push(format!(
                "Memory nodes present without schedulers: {}.",
                join_ids(&without_cpus)
            ));
        }

        let reason = if without_memory.is_empty() {
            "memory-without-schedulers"
        } else {
            "schedulers-without-memory"
        };

        Ok(Finding::warn(self.id(), problems.join(" "))
            .with_recommendation(
                "Align the VM's vNUMA topology so every node has both CPUs and memory.",
            )
            .with_reason(reason))
    }
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;
    use chrono::TimeZone;

    fn numa(nodes: Metric<u32>, parent: Metric<bool>, cpus: Metric<u32>) -> MetricSnapshot {
        MetricSnapshot {
            numa_node_count: nodes,
            numa_nodes_have_parent_id: parent,
            logical_cpu_count: cpus,
            ..Default::default()
        }
    }

    #[test]
    fn test_numa_balanced_two_nodes() {
        let snapshot = numa(Metric::Available(2), Metric::Available(true), Metric::Available(16));
        let finding = NumaBalanceRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.message.starts_with("NUMA CPU distribution appears balanced"));
    }

    #[test]
    fn test_numa_unbalanced() {
        let snapshot = numa(Metric::Available(2), Metric::Available(true), Metric::Available(11));
        let finding = NumaBalanceRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.reason_code.as_deref(), Some("unbalanced-numa-cpus"));
    }

    #[test]
    fn test_numa_missing_parent_warns_even_when_balanced() {
        let snapshot = numa(Metric::Available(2), Metric::Available(false), Metric::Available(16));
        let finding = NumaBalanceRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding
            .message
            .starts_with("NUMA layout cannot be fully validated (parent_node_id missing)"));
        assert!(!finding.message.contains("Falling back"));
    }

    #[test]
    fn test_numa_count_unavailable_mentions_fallback() {
        let snapshot = numa(Metric::Unavailable, Metric::Available(true), Metric::Available(8));
        let finding = NumaBalanceRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.contains("Falling back to 1 NUMA node"));
        assert_eq!(finding.reason_code.as_deref(), Some("numa-node-count-fallback"));
    }

    #[test]
    fn test_numa_zero_nodes_is_defect() {
        let snapshot = numa(Metric::Available(0), Metric::Available(true), Metric::Available(8));
        assert!(matches!(
            NumaBalanceRule.evaluate(&snapshot),
            Err(SnitchError::RuleDefect { .. })
        ));
    }

    #[test]
    fn test_offline_schedulers() {
        let snapshot = MetricSnapshot {
            offline_scheduler_ids: Metric::Available(vec![7, 3]),
            ..Default::default()
        };
        let finding = SchedulerStatusRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.ends_with("CPUs: 3, 7."));

        let snapshot = MetricSnapshot {
            offline_scheduler_ids: Metric::Available(vec![]),
            ..Default::default()
        };
        assert_eq!(SchedulerStatusRule.evaluate(&snapshot).unwrap().severity, Severity::Pass);
    }

    #[test]
    fn test_memory_node_alignment() {
        let mut snapshot = MetricSnapshot {
            numa_nodes_have_parent_id: Metric::Available(true),
            scheduler_node_ids: Metric::Available(vec![0, 1]),
            memory_node_ids: Metric::Available(vec![0, 1]),
            ..Default::default()
        };
        assert_eq!(
            MemoryNodeAlignmentRule.evaluate(&snapshot).unwrap().severity,
            Severity::Pass
        );

        snapshot.memory_node_ids = Metric::Available(vec![0]);
        let finding = MemoryNodeAlignmentRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.contains("no memory assigned: 1."));
        assert_eq!(finding.reason_code.as_deref(), Some("schedulers-without-memory"));
    }

    #[test]
    fn test_memory_node_alignment_without_parent_ids() {
        let finding = MemoryNodeAlignmentRule
            .evaluate(&MetricSnapshot::default())
            .unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert_eq!(finding.reason_code.as_deref(), Some("parent-node-id-missing"));
    }

    #[test]
    fn test_system_specs() {
        let finding = SystemSpecsRule.evaluate(&MetricSnapshot::default()).unwrap();
        assert_eq!(finding.severity, Severity::Fail);
        assert_eq!(finding.message, "Could not retrieve system specs.");

        let snapshot = MetricSnapshot {
            logical_cpu_count: Metric::Available(16),
            hyperthread_ratio: Metric::Available(2),
            physical_memory_mb: Metric::Available(65536),
            sql_start_time: Metric::Available(
                chrono::Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(),
            ),
            vm_type: Metric::Available(crate::snapshot::VmType::Hypervisor),
            ..Default::default()
        };
        let finding = SystemSpecsRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.message.contains("Physical Memory: 64 GiB"));
        assert!(finding.message.contains("SQL Server Start Time: 2026-01-05 08:00:00 UTC"));

        let partial = MetricSnapshot {
            logical_cpu_count: Metric::Available(16),
            ..Default::default()
        };
        let finding = SystemSpecsRule.evaluate(&partial).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.contains("Partially unavailable: Hyperthread Ratio"));
    }
}
