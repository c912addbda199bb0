//! Built-in simulated dataset

use super::MetricSource;
use crate::error::Result;
use crate::report::{RunMode, ServerLabel};
use crate::snapshot::{DiskInterfaceType, Metric, MetricSnapshot, NicAdapterType, VmType};
use chrono::{TimeZone, Utc};

/// Simulated two-node VMware guest
///
/// The values are fixed so a dry run always produces the same findings: a
/// mix of passes and the warnings most commonly seen on virtualized hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSource;

impl DryRunSource {
    /// The simulated snapshot
    pub fn snapshot() -> MetricSnapshot {
        MetricSnapshot {
            server_name: Metric::Available(ServerLabel::DRY_RUN.to_string()),
            logical_cpu_count: Metric::Available(16),
            hyperthread_ratio: Metric::Available(2),
            physical_memory_mb: Metric::Available(65536),
            sql_start_time: Utc
                .with_ymd_and_hms(2026, 1, 5, 6, 30, 0)
                .single()
                .into(),
            vm_type: Metric::Available(VmType::Hypervisor),
            numa_node_count: Metric::Available(2),
            numa_nodes_have_parent_id: Metric::Available(true),
            current_max_dop: Metric::Available(0),
            affinity_mask_present: Metric::Available(false),
            socket_count: Metric::Available(2),
            physical_core_count: Metric::Available(8),
            logical_processor_count: Metric::Available(16),
            host_hypervisor: Metric::Available("VMware".to_string()),
            disk_interface_type: Metric::Available(DiskInterfaceType::Scsi),
            nic_adapter_type: Metric::Available(NicAdapterType::E1000e),
            memory_grants_pending: Metric::Available(0),
            offline_scheduler_ids: Metric::Available(Vec::new()),
            scheduler_node_ids: Metric::Available(vec![0, 1]),
            memory_node_ids: Metric::Available(vec![0, 1]),
            min_server_memory_mb: Metric::Available(0),
            max_server_memory_mb: Metric::Available(2_147_483_647),
        }
    }
}

impl MetricSource for DryRunSource {
    fn collect(&self) -> Result<MetricSnapshot> {
        Ok(Self::snapshot())
    }

    fn mode(&self) -> RunMode {
        RunMode::DryRun
    }

    fn describe(&self) -> String {
        "dry-run dataset".to_string()
    }
}
