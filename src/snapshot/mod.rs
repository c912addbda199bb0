//! Metric snapshot model
//!
//! A [`MetricSnapshot`] is everything the rules are allowed to look at. It is
//! produced once by a collector and then only ever borrowed.

mod metric;

pub use metric::Metric;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual machine type as reported by SQL Server (`virtual_machine_type_desc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmType {
    /// Bare metal
    Physical,
    /// Running under a hypervisor
    Hypervisor,
    /// Reported but not recognised
    Unknown,
}

impl fmt::Display for VmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "PHYSICAL"),
            Self::Hypervisor => write!(f, "HYPERVISOR"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Disk controller interface class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiskInterfaceType {
    /// SCSI / SAS / paravirtual SCSI
    Scsi,
    /// NVMe controller
    Nvme,
    /// SATA / AHCI
    Sata,
    /// Legacy IDE
    Ide,
    /// Anything else (virtio-blk, USB, ...)
    Other,
}

impl DiskInterfaceType {
    /// SCSI-class controllers are the recommended choice for database disks
    pub fn is_scsi_class(&self) -> bool {
        matches!(self, Self::Scsi)
    }

    /// Classify a Linux block device by its kernel name
    pub fn from_block_device(name: &str) -> Option<Self> {
        if name.starts_with("sd") {
            Some(Self::Scsi)
        } else if name.starts_with("nvme") {
            Some(Self::Nvme)
        } else if name.starts_with("hd") {
            Some(Self::Ide)
        } else if name.starts_with("vd") || name.starts_with("xvd") {
            Some(Self::Other)
        } else {
            None
        }
    }
}

impl fmt::Display for DiskInterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scsi => write!(f, "SCSI"),
            Self::Nvme => write!(f, "NVMe"),
            Self::Sata => write!(f, "SATA"),
            Self::Ide => write!(f, "IDE"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Network adapter model class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NicAdapterType {
    /// VMware VMXNET3
    Vmxnet3,
    /// Hyper-V synthetic adapter (netvsc)
    HypervSynthetic,
    /// virtio-net (KVM/QEMU)
    Virtio,
    /// Emulated Intel E1000
    E1000,
    /// Emulated Intel E1000E
    E1000e,
    /// Any other adapter
    Other,
}

impl NicAdapterType {
    /// Paravirtual adapters avoid device emulation overhead
    pub fn is_paravirtual(&self) -> bool {
        matches!(self, Self::Vmxnet3 | Self::HypervSynthetic | Self::Virtio)
    }

    /// Classify a NIC from its kernel driver or adapter name
    pub fn from_driver(driver: &str) -> Self {
        let driver = driver.to_ascii_lowercase();
        if driver.contains("vmxnet3") {
            Self::Vmxnet3
        } else if driver.contains("netvsc") || driver.contains("hyper-v") {
            Self::HypervSynthetic
        } else if driver.contains("virtio") {
            Self::Virtio
        } else if driver.contains("e1000e") {
            Self::E1000e
        } else if driver.contains("e1000") {
            Self::E1000
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for NicAdapterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vmxnet3 => write!(f, "VMXNET3"),
            Self::HypervSynthetic => write!(f, "Hyper-V synthetic"),
            Self::Virtio => write!(f, "virtio-net"),
            Self::E1000 => write!(f, "E1000"),
            Self::E1000e => write!(f, "E1000E"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Immutable record of collected metrics
///
/// Every field is a [`Metric`]; fields missing from a JSON snapshot are
/// treated as unavailable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricSnapshot {
    /// Detected server name
    pub server_name: Metric<String>,
    /// Logical CPUs visible to SQL Server
    #[serde(rename = "logicalCPUCount")]
    pub logical_cpu_count: Metric<u32>,
    /// Logical CPUs per physical core
    pub hyperthread_ratio: Metric<u32>,
    /// Physical memory in MB
    #[serde(rename = "physicalMemoryMB")]
    pub physical_memory_mb: Metric<u64>,
    /// SQL Server start time
    pub sql_start_time: Metric<DateTime<Utc>>,
    /// Virtual machine type
    pub vm_type: Metric<VmType>,
    /// Number of NUMA nodes
    pub numa_node_count: Metric<u32>,
    /// Whether schedulers report a parent NUMA node id
    pub numa_nodes_have_parent_id: Metric<bool>,
    /// Current `max degree of parallelism`
    #[serde(rename = "currentMaxDOP")]
    pub current_max_dop: Metric<u32>,
    /// Whether an affinity mask hides online CPUs from SQL Server
    pub affinity_mask_present: Metric<bool>,
    /// CPU sockets seen by the host OS
    pub socket_count: Metric<u32>,
    /// Physical cores across all sockets
    pub physical_core_count: Metric<u32>,
    /// Logical processors across all sockets
    pub logical_processor_count: Metric<u32>,
    /// Hypervisor name, or "none" on bare metal
    pub host_hypervisor: Metric<String>,
    /// Disk controller interface
    pub disk_interface_type: Metric<DiskInterfaceType>,
    /// Network adapter class
    pub nic_adapter_type: Metric<NicAdapterType>,
    /// Queries waiting on a memory grant
    pub memory_grants_pending: Metric<u32>,
    /// CPU ids of offline schedulers
    pub offline_scheduler_ids: Metric<Vec<u32>>,
    /// Distinct parent node ids of the schedulers
    pub scheduler_node_ids: Metric<Vec<u32>>,
    /// Memory node ids (the DAC node excluded)
    pub memory_node_ids: Metric<Vec<u32>>,
    /// `min server memory (MB)`
    #[serde(rename = "minServerMemoryMB")]
    pub min_server_memory_mb: Metric<u64>,
    /// `max server memory (MB)`
    #[serde(rename = "maxServerMemoryMB")]
    pub max_server_memory_mb: Metric<u64>,
}

impl MetricSnapshot {
    /// Parse a snapshot from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Logical CPU count, preferring SQL Server's view over the host's
    pub fn logical_cpus(&self) -> Metric<u32> {
        self.logical_cpu_count.or(self.logical_processor_count)
    }
}
