//! Metric sources
//!
//! A [`MetricSource`] produces the one [`MetricSnapshot`] a run evaluates.
//! Sources decide what is available; the rules never go back to the host.

mod dry_run;
mod file;
mod host;

pub use dry_run::DryRunSource;
pub use file::SnapshotFileSource;
pub use host::{parse_cpu_list, HostProbeSource};

use crate::error::Result;
use crate::report::RunMode;
use crate::snapshot::MetricSnapshot;

/// Something that can produce a metric snapshot
pub trait MetricSource {
    /// Collect a snapshot
    ///
    /// Individual metrics that cannot be read are `Unavailable`; an error
    /// means the source as a whole could not be used.
    fn collect(&self) -> Result<MetricSnapshot>;

    /// Mode recorded in the report
    fn mode(&self) -> RunMode {
        RunMode::Live
    }

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Collect from a source, logging what was obtained
pub fn collect_from(source: &dyn MetricSource) -> Result<MetricSnapshot> {
    tracing::info!(source = %source.describe(), mode = %source.mode(), "collecting metrics");
    let snapshot = source.collect()?;
    tracing::debug!(
        server = %snapshot.server_name.display_or("unknown"),
        numa_nodes = %snapshot.numa_node_count.display_or("unavailable"),
        "snapshot collected"
    );
    Ok(snapshot)
}
