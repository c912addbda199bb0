//! # Infra Snitch - SQL Server Infrastructure Diagnostics
//!
//! Infra Snitch evaluates a snapshot of host and SQL Server metrics against a
//! fixed set of tuning rules and aggregates the outcomes into one report,
//! rendered as a console summary, Markdown and JSON.
//!
//! ## Features
//!
//! - **NUMA Checks**: CPU balance across nodes, offline schedulers, memory node alignment
//! - **maxDOP Recommendation**: Derived from cores per NUMA node, capped at 8
//! - **Memory Configuration**: Min/max server memory against physical RAM
//! - **Licensing**: Socket count against the edition's socket limit
//! - **Virtual Hardware**: SCSI controllers, VMXNET3-class adapters, vNUMA
//! - **Missing Data**: Every metric may be unavailable; rules report it instead of failing
//!
//! ## Quick Start
//!
//! ```no_run
//! use infra_snitch::collector::{DryRunSource, MetricSource};
//! use infra_snitch::report::{evaluate, render_console, ServerLabel};
//!
//! let source = DryRunSource;
//! let snapshot = source.collect().unwrap();
//! let label = ServerLabel::resolve(None, &snapshot, source.mode());
//!
//! let report = evaluate(&snapshot, label, source.mode());
//! print!("{}", render_console(&report));
//! ```
//!
//! ## Selected Rules and Custom Policy
//!
//! ```no_run
//! use infra_snitch::collector::{MetricSource, SnapshotFileSource};
//! use infra_snitch::report::{Aggregator, ReportExporter, ServerLabel};
//! use infra_snitch::rules::{EditionPolicy, RuleSelection, RuleSet};
//!
//! let source = SnapshotFileSource::new("sql01.json");
//! let snapshot = source.collect().unwrap();
//!
//! let selection = RuleSelection { maxdop: true, hardware: true, ..Default::default() };
//! let rules = RuleSet::selected(selection, EditionPolicy::new("Enterprise", 64));
//! let report = Aggregator::new(rules).aggregate(
//!     &snapshot,
//!     ServerLabel::sanitize("prod-sql01"),
//!     source.mode(),
//! );
//!
//! ReportExporter::new("reports").write_all(&report).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod config;
pub mod error;
pub mod report;
pub mod rules;
pub mod snapshot;

// Re-export commonly used types
pub use config::{CliArgs, DiagnosticConfig};
pub use error::{Result, SnitchError};
pub use report::{evaluate, render_console, render_json, render_markdown, Report};
pub use snapshot::{Metric, MetricSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use infra_snitch::prelude::*;
    //! ```

    pub use crate::collector::{DryRunSource, HostProbeSource, MetricSource, SnapshotFileSource};
    pub use crate::config::{DiagnosticConfig, OutputFormat, SourceKind};
    pub use crate::error::{Result, SnitchError};
    pub use crate::report::{
        evaluate, render_console, render_json, render_markdown, Aggregator, Report, ReportExporter,
        RunMode, ServerLabel,
    };
    pub use crate::rules::{EditionPolicy, Finding, Rule, RuleId, RuleSelection, RuleSet, Severity};
    pub use crate::snapshot::{Metric, MetricSnapshot};
}
