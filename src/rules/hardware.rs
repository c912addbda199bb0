//! Virtual hardware rule
//!
//! Disk controller, network adapter and hypervisor checks are folded into a
//! single finding carrying the worst of the three severities.

use super::{combine, Finding, Rule, RuleId, SubCheck};
use crate::error::Result;
use crate::snapshot::{Metric, MetricSnapshot, VmType};

/// Checks VM disk controllers, NICs and virtualization
#[derive(Debug, Clone, Copy, Default)]
pub struct VmHardwareRule;

impl VmHardwareRule {
    fn disk_check(snapshot: &MetricSnapshot) -> SubCheck {
        match snapshot.disk_interface_type {
            Metric::Available(disk) if disk.is_scsi_class() => {
                SubCheck::pass("Disks are using SCSI interface.")
            }
            Metric::Available(disk) => SubCheck::warn(
                format!("Disks may not be using SCSI interface (detected {}).", disk),
                "Attach database disks to a paravirtual SCSI controller.",
                "non-scsi-disk",
            ),
            Metric::Unavailable => SubCheck::warn(
                "Disk interface type unavailable.",
                "Verify disk controllers are SCSI (e.g. PVSCSI).",
                "disk-interface-unavailable",
            ),
        }
    }

    fn nic_check(snapshot: &MetricSnapshot) -> SubCheck {
        match snapshot.nic_adapter_type {
            Metric::Available(nic) if nic.is_paravirtual() => {
                SubCheck::pass(format!("{} network adapter detected.", nic))
            }
            Metric::Available(nic) => SubCheck::warn(
                format!("VMXNET3-class adapter not detected (current adapter: {}).", nic),
                "Replace emulated network adapters with VMXNET3 or the hypervisor's paravirtual adapter.",
                "non-paravirtual-nic",
            ),
            Metric::Unavailable => SubCheck::warn(
                "Network adapter type unavailable.",
                "Verify the VM uses a VMXNET3-class network adapter.",
                "nic-type-unavailable",
            ),
        }
    }

    fn virtualization_check(snapshot: &MetricSnapshot) -> Option<SubCheck> {
        let hypervisor = match snapshot.host_hypervisor.get() {
            Some(name) if name.trim().eq_ignore_ascii_case("none") => return None,
            Some(name) => name.trim().to_string(),
            None if snapshot.vm_type == Metric::Available(VmType::Hypervisor) => {
                "unknown hypervisor".to_string()
            }
            None => return None,
        };

        Some(SubCheck::warn(
            format!("Detected virtualized SQL Server environment ({}).", hypervisor),
            "Ensure vNUMA is exposed and balanced properly in the hypervisor; misaligned virtual sockets/cores can cause NUMA fragmentation.",
            "virtualized-host",
        ))
    }
}

impl Rule for VmHardwareRule {
    fn id(&self) -> RuleId {
        RuleId::VmHardware
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let mut checks = vec![Self::disk_check(snapshot), Self::nic_check(snapshot)];
        if let Some(check) = Self::virtualization_check(snapshot) {
            checks.push(check);
        }
        Ok(combine(self.id(), &checks))
    }
}
