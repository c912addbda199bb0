//! Local host probe
//!
//! Reads what the operating system knows about the machine: CPU counts and
//! memory through `sysinfo`/`num_cpus`, and NUMA layout, sockets, hypervisor,
//! disks and NICs from sysfs on Linux. SQL Server settings (maxDOP, memory
//! limits, affinity, grants, scheduler state) cannot be seen from the host and
//! are left unavailable.

use super::MetricSource;
use crate::error::{Result, SnitchError};
use crate::snapshot::{DiskInterfaceType, Metric, MetricSnapshot, NicAdapterType, VmType};
use std::collections::BTreeSet;
use std::path::PathBuf;
use sysinfo::System;

/// Block devices that never hold database files
const IGNORED_BLOCK_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "sr", "md", "fd"];

/// NUMA node layout read from sysfs
#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeLayout {
    id: u32,
    cpus: Vec<u32>,
    memory_kb: u64,
}

/// Probes the local machine
#[derive(Debug, Clone)]
pub struct HostProbeSource {
    sysfs_root: PathBuf,
    require_sysfs: bool,
}

impl Default for HostProbeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbeSource {
    /// Probe the live `/sys`
    ///
    /// A missing `/sys` (non-Linux hosts) only makes the sysfs metrics
    /// unavailable.
    pub fn new() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            require_sysfs: false,
        }
    }

    /// Probe a sysfs tree rooted elsewhere
    ///
    /// Collection fails if `root` is not a directory.
    pub fn with_sysfs_root(root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: root.into(),
            require_sysfs: true,
        }
    }

    fn server_name() -> Metric<String> {
        match hostname::get() {
            Ok(name) => Metric::Available(name.to_string_lossy().to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "hostname unavailable");
                Metric::Unavailable
            }
        }
    }

    fn physical_memory_mb() -> Metric<u64> {
        let mut sys = System::new();
        sys.refresh_memory();
        match sys.total_memory() / (1024 * 1024) {
            0 => Metric::Unavailable,
            mb => Metric::Available(mb),
        }
    }

    fn numa_nodes(&self) -> Vec<NodeLayout> {
        let node_dir = self.sysfs_root.join("devices/system/node");
        let Ok(entries) = std::fs::read_dir(&node_dir) else {
            return Vec::new();
        };

        let mut nodes: Vec<NodeLayout> = entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let id = name.to_str()?.strip_prefix("node")?.parse::<u32>().ok()?;
                let path = entry.path();
                let cpus = std::fs::read_to_string(path.join("cpulist"))
                    .map(|s| parse_cpu_list(s.trim()))
                    .unwrap_or_default();
                let memory_kb = std::fs::read_to_string(path.join("meminfo"))
                    .ok()
                    .and_then(|s| parse_node_mem_total(&s))
                    .unwrap_or(0);
                Some(NodeLayout { id, cpus, memory_kb })
            })
            .collect();

        nodes.sort_by_key(|n| n.id);
        nodes
    }

    fn socket_count(&self) -> Metric<u32> {
        let cpu_dir = self.sysfs_root.join("devices/system/cpu");
        let Ok(entries) = std::fs::read_dir(&cpu_dir) else {
            return Metric::Unavailable;
        };

        let packages: BTreeSet<i64> = entries
            .filter_map(|e| e.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|n| n.strip_prefix("cpu"))
                    .map_or(false, |rest| {
                        !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
                    })
            })
            .filter_map(|entry| {
                std::fs::read_to_string(entry.path().join("topology/physical_package_id"))
                    .ok()?
                    .trim()
                    .parse::<i64>()
                    .ok()
            })
            .collect();

        match packages.len() {
            0 => Metric::Unavailable,
            n => Metric::Available(n as u32),
        }
    }

    fn host_hypervisor(&self) -> Metric<String> {
        let dmi = self.sysfs_root.join("class/dmi/id");
        let vendor = std::fs::read_to_string(dmi.join("sys_vendor")).ok();
        let product = std::fs::read_to_string(dmi.join("product_name")).ok();
        if vendor.is_none() && product.is_none() {
            return Metric::Unavailable;
        }
        let identity = format!(
            "{} {}",
            vendor.as_deref().unwrap_or_default().trim(),
            product.as_deref().unwrap_or_default().trim()
        );
        Metric::Available(classify_hypervisor(&identity).to_string())
    }

    fn disk_interface_type(&self) -> Metric<DiskInterfaceType> {
        let Ok(entries) = std::fs::read_dir(self.sysfs_root.join("block")) else {
            return Metric::Unavailable;
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !IGNORED_BLOCK_PREFIXES.iter().any(|p| name.starts_with(p)))
            .collect();
        names.sort();

        names
            .iter()
            .find_map(|name| DiskInterfaceType::from_block_device(name))
            .into()
    }

    fn nic_adapter_type(&self) -> Metric<NicAdapterType> {
        let Ok(entries) = std::fs::read_dir(self.sysfs_root.join("class/net")) else {
            return Metric::Unavailable;
        };

        let mut interfaces: Vec<PathBuf> =
            entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        interfaces.sort();

        // Virtual interfaces (lo, bridges, veth) have no backing device
        interfaces
            .iter()
            .find_map(|iface| {
                let driver = std::fs::read_link(iface.join("device/driver")).ok()?;
                let name = driver.file_name()?.to_str()?.to_string();
                Some(NicAdapterType::from_driver(&name))
            })
            .into()
    }
}

impl MetricSource for HostProbeSource {
    fn collect(&self) -> Result<MetricSnapshot> {
        if self.require_sysfs && !self.sysfs_root.is_dir() {
            return Err(SnitchError::CollectionError(format!(
                "sysfs root '{}' is not a directory",
                self.sysfs_root.display()
            )));
        }

        let logical = num_cpus::get() as u32;
        let physical = num_cpus::get_physical() as u32;
        let nodes = self.numa_nodes();
        let hypervisor = self.host_hypervisor();

        let vm_type = hypervisor.as_ref().map(|name| {
            if name == "none" {
                VmType::Physical
            } else {
                VmType::Hypervisor
            }
        });

        // Only nodes with CPUs get schedulers; memory-only nodes do not count
        let scheduler_ids: Vec<u32> = nodes
            .iter()
            .filter(|n| !n.cpus.is_empty())
            .map(|n| n.id)
            .collect();
        let memory_ids: Vec<u32> = nodes
            .iter()
            .filter(|n| n.memory_kb > 0)
            .map(|n| n.id)
            .collect();

        let (numa_node_count, has_parent, scheduler_nodes, memory_nodes) =
            if scheduler_ids.is_empty() {
                tracing::debug!(
                    root = %self.sysfs_root.display(),
                    "no NUMA nodes with CPUs found in sysfs"
                );
                (
                    Metric::Unavailable,
                    Metric::Unavailable,
                    Metric::Unavailable,
                    Metric::Unavailable,
                )
            } else {
                (
                    Metric::Available(scheduler_ids.len() as u32),
                    Metric::Available(true),
                    Metric::Available(scheduler_ids),
                    Metric::Available(memory_ids),
                )
            };

        let snapshot = MetricSnapshot {
            server_name: Self::server_name(),
            logical_cpu_count: Metric::Unavailable,
            hyperthread_ratio: if physical > 0 {
                Metric::Available((logical / physical).max(1))
            } else {
                Metric::Unavailable
            },
            physical_memory_mb: Self::physical_memory_mb(),
            vm_type,
            numa_node_count,
            numa_nodes_have_parent_id: has_parent,
            socket_count: self.socket_count(),
            physical_core_count: Metric::Available(physical),
            logical_processor_count: Metric::Available(logical),
            host_hypervisor: hypervisor,
            disk_interface_type: self.disk_interface_type(),
            nic_adapter_type: self.nic_adapter_type(),
            scheduler_node_ids: scheduler_nodes,
            memory_node_ids: memory_nodes,
            ..Default::default()
        };

        tracing::info!(
            logical,
            physical,
            numa_nodes = %snapshot.numa_node_count.display_or("unavailable"),
            hypervisor = %snapshot.host_hypervisor.display_or("unknown"),
            "host probed"
        );
        Ok(snapshot)
    }

    fn describe(&self) -> String {
        format!("host probe ({})", self.sysfs_root.display())
    }
}

/// Parse a kernel CPU list such as `0-3,8,10-11`
///
/// Malformed parts are skipped.
pub fn parse_cpu_list(s: &str) -> Vec<u32> {
    let mut cpus = Vec::new();

    for part in s.split(',') {
        let part = part.trim();
        if let Some((start, end)) = part.split_once('-') {
            if let (Ok(start), Ok(end)) = (start.parse::<u32>(), end.parse::<u32>()) {
                cpus.extend(start..=end);
            }
        } else if let Ok(cpu) = part.parse::<u32>() {
            cpus.push(cpu);
        }
    }

    cpus
}

/// `MemTotal` of a per-node meminfo file, in kB
fn parse_node_mem_total(meminfo: &str) -> Option<u64> {
    meminfo
        .lines()
        .find(|line| line.contains("MemTotal:"))
        .and_then(|line| {
            line.split_whitespace()
                .skip_while(|w| *w != "MemTotal:")
                .nth(1)?
                .parse()
                .ok()
        })
}

/// Map DMI vendor/product strings to a hypervisor name, or "none"
fn classify_hypervisor(identity: &str) -> &'static str {
    let identity = identity.to_ascii_lowercase();
    if identity.contains("vmware") {
        "VMware"
    } else if identity.contains("hyper-v") || identity.contains("virtual machine") {
        "Hyper-V"
    } else if identity.contains("kvm") || identity.contains("qemu") {
        "KVM"
    } else if identity.contains("xen") {
        "Xen"
    } else if identity.contains("virtualbox") || identity.contains("innotek") {
        "VirtualBox"
    } else {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fake_sysfs() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "devices/system/node/node0/cpulist", "0-3\n");
        write(
            root,
            "devices/system/node/node0/meminfo",
            "Node 0 MemTotal:       16384000 kB\n",
        );
        write(root, "devices/system/node/node1/cpulist", "4-7\n");
        write(root, "devices/system/node/node1/meminfo", "Node 1 MemTotal:       0 kB\n");
        write(root, "devices/system/node/online", "0-1\n");
        for cpu in 0..8 {
            let package = if cpu < 4 { "0" } else { "1" };
            let rel = format!("devices/system/cpu/cpu{}/topology/physical_package_id", cpu);
            write(root, &rel, package);
        }
        write(root, "devices/system/cpu/cpufreq/policy0", "");
        write(root, "class/dmi/id/sys_vendor", "VMware, Inc.\n");
        write(root, "class/dmi/id/product_name", "VMware Virtual Platform\n");
        std::fs::create_dir_all(root.join("block/loop0")).unwrap();
        std::fs::create_dir_all(root.join("block/sda")).unwrap();
        temp
    }

    #[test]
    fn test_cpu_list_parsing() {
        assert_eq!(parse_cpu_list("0-3"), vec![0, 1, 2, 3]);
        assert_eq!(parse_cpu_list("0,2,4"), vec![0, 2, 4]);
        assert_eq!(parse_cpu_list("0-2,4-6"), vec![0, 1, 2, 4, 5, 6]);
        assert_eq!(parse_cpu_list(""), Vec::<u32>::new());
        assert_eq!(parse_cpu_list("x,3"), vec![3]);
    }

    #[test]
    fn test_node_meminfo_parsing() {
        let meminfo = "Node 0 MemTotal:  2048 kB\nNode 0 MemFree: 10 kB";
        assert_eq!(parse_node_mem_total(meminfo), Some(2048));
        assert_eq!(parse_node_mem_total("Node 0 MemFree: 10 kB"), None);
    }

    #[test]
    fn test_hypervisor_classification() {
        assert_eq!(classify_hypervisor("VMware, Inc. VMware7,1"), "VMware");
        assert_eq!(classify_hypervisor("Microsoft Corporation Virtual Machine"), "Hyper-V");
        assert_eq!(classify_hypervisor("QEMU Standard PC (Q35 + ICH9, 2009)"), "KVM");
        assert_eq!(classify_hypervisor("Dell Inc. PowerEdge R750"), "none");
    }

    #[test]
    fn test_microsoft_hardware_is_not_a_hypervisor() {
        assert_eq!(classify_hypervisor("Microsoft Corporation Surface Laptop 4"), "none");
        assert_eq!(classify_hypervisor("Microsoft Corporation Surface Pro 9"), "none");
        assert_eq!(classify_hypervisor("Microsoft Hyper-V UEFI"), "Hyper-V");
    }

    #[test]
    fn test_memory_only_node_is_not_counted() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "devices/system/node/node0/cpulist", "0-7\n");
        write(root, "devices/system/node/node0/meminfo", "Node 0 MemTotal: 8192000 kB\n");
        write(root, "devices/system/node/node1/cpulist", "\n");
        write(root, "devices/system/node/node1/meminfo", "Node 1 MemTotal: 8192000 kB\n");

        let mut snapshot = HostProbeSource::with_sysfs_root(root).collect().unwrap();
        assert_eq!(snapshot.numa_node_count, Metric::Available(1));
        assert_eq!(snapshot.scheduler_node_ids, Metric::Available(vec![0]));
        assert_eq!(snapshot.memory_node_ids, Metric::Available(vec![0, 1]));

        snapshot.physical_core_count = Metric::Available(8);
        assert_eq!(crate::rules::recommend_maxdop(&snapshot).value, 8);
    }

    #[test]
    fn test_missing_sysfs_root_is_collection_error() {
        let temp = TempDir::new().unwrap();
        let err = HostProbeSource::with_sysfs_root(temp.path().join("absent"))
            .collect()
            .unwrap_err();
        assert!(matches!(err, SnitchError::CollectionError(_)));
    }

    #[test]
    fn test_host_fake_sysfs() {
        let temp = fake_sysfs();
        let snapshot = HostProbeSource::with_sysfs_root(temp.path()).collect().unwrap();

        assert_eq!(snapshot.numa_node_count, Metric::Available(2));
        assert_eq!(snapshot.numa_nodes_have_parent_id, Metric::Available(true));
        assert_eq!(snapshot.scheduler_node_ids, Metric::Available(vec![0, 1]));
        assert_eq!(snapshot.memory_node_ids, Metric::Available(vec![0]));
        assert_eq!(snapshot.socket_count, Metric::Available(2));
        assert_eq!(snapshot.host_hypervisor, Metric::Available("VMware".to_string()));
        assert_eq!(snapshot.vm_type, Metric::Available(VmType::Hypervisor));
        assert_eq!(snapshot.disk_interface_type, Metric::Available(DiskInterfaceType::Scsi));
        assert!(snapshot.nic_adapter_type.is_unavailable());
        assert!(snapshot.current_max_dop.is_unavailable());
        assert!(snapshot.max_server_memory_mb.is_unavailable());
        assert!(snapshot.physical_core_count.is_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_host_nic_driver_symlink() {
        let temp = fake_sysfs();
        let driver = temp.path().join("bus/pci/drivers/vmxnet3");
        std::fs::create_dir_all(&driver).unwrap();
        std::fs::create_dir_all(temp.path().join("class/net/ens192/device")).unwrap();
        std::fs::create_dir_all(temp.path().join("class/net/lo")).unwrap();
        let link = temp.path().join("class/net/ens192/device/driver");
        std::os::unix::fs::symlink(&driver, link).unwrap();

        let snapshot = HostProbeSource::with_sysfs_root(temp.path()).collect().unwrap();
        assert_eq!(snapshot.nic_adapter_type, Metric::Available(NicAdapterType::Vmxnet3));
    }

    #[test]
    fn test_host_empty_root_degrades() {
        let temp = TempDir::new().unwrap();
        let snapshot = HostProbeSource::with_sysfs_root(temp.path()).collect().unwrap();
        assert!(snapshot.numa_node_count.is_unavailable());
        assert!(snapshot.socket_count.is_unavailable());
        assert!(snapshot.host_hypervisor.is_unavailable());
        assert!(snapshot.disk_interface_type.is_unavailable());
        assert!(snapshot.logical_processor_count.is_available());
    }
}
