//! Findings produced by rule evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome class of a rule
///
/// Ordered so that `max()` picks the worst: `Pass < Warn < Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Check passed
    Pass,
    /// Something worth reviewing
    Warn,
    /// Check failed or could not run
    Fail,
}

impl Severity {
    /// Uppercase label used in every output format
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Grouping used for report sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCategory {
    /// NUMA and scheduler layout
    Topology,
    /// Degree of parallelism
    Parallelism,
    /// Memory configuration and pressure
    Memory,
    /// CPU visibility and licensing
    Cpu,
    /// Virtual hardware
    Virtualization,
}

impl RuleCategory {
    /// Section heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::Topology => "NUMA Topology",
            Self::Parallelism => "Parallelism",
            Self::Memory => "Memory",
            Self::Cpu => "CPU & Licensing",
            Self::Virtualization => "Virtualization",
        }
    }
}

/// Stable identifier of a rule
///
/// The kebab-case names are part of the JSON report schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// Host and SQL Server specs
    SystemSpecs,
    /// CPU distribution across NUMA nodes
    NumaBalance,
    /// Offline schedulers
    SchedulerStatus,
    /// Scheduler nodes vs memory nodes
    MemoryNodeAlignment,
    /// maxDOP recommendation
    MaxdopRecommendation,
    /// Min/max server memory vs physical RAM
    MemoryConfig,
    /// CPU affinity mask
    CpuAffinity,
    /// Socket count vs edition limit
    SocketLayout,
    /// Virtual disk controller, NIC and hypervisor
    VmHardware,
    /// Pending memory grants
    MemoryGrants,
}

impl RuleId {
    /// Every rule id, in standard evaluation order
    pub const ALL: [RuleId; 10] = [
        RuleId::SystemSpecs,
        RuleId::NumaBalance,
        RuleId::SchedulerStatus,
        RuleId::MemoryNodeAlignment,
        RuleId::MaxdopRecommendation,
        RuleId::MemoryConfig,
        RuleId::CpuAffinity,
        RuleId::SocketLayout,
        RuleId::VmHardware,
        RuleId::MemoryGrants,
    ];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemSpecs => "system-specs",
            Self::NumaBalance => "numa-balance",
            Self::SchedulerStatus => "scheduler-status",
            Self::MemoryNodeAlignment => "memory-node-alignment",
            Self::MaxdopRecommendation => "maxdop-recommendation",
            Self::MemoryConfig => "memory-config",
            Self::CpuAffinity => "cpu-affinity",
            Self::SocketLayout => "socket-layout",
            Self::VmHardware => "vm-hardware",
            Self::MemoryGrants => "memory-grants",
        }
    }

    /// Human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::SystemSpecs => "Server CPU & Memory Specs",
            Self::NumaBalance => "NUMA CPU Balance",
            Self::SchedulerStatus => "Scheduler Status",
            Self::MemoryNodeAlignment => "NUMA Memory Alignment",
            Self::MaxdopRecommendation => "maxDOP Recommendation",
            Self::MemoryConfig => "SQL Server Memory Configuration",
            Self::CpuAffinity => "CPU Affinity",
            Self::SocketLayout => "CPU Socket Layout",
            Self::VmHardware => "VM Hardware Configuration",
            Self::MemoryGrants => "Memory Grant Pressure",
        }
    }

    /// Report section this rule belongs to
    pub fn category(&self) -> RuleCategory {
        match self {
            Self::SystemSpecs
            | Self::NumaBalance
            | Self::SchedulerStatus
            | Self::MemoryNodeAlignment => RuleCategory::Topology,
            Self::MaxdopRecommendation => RuleCategory::Parallelism,
            Self::MemoryConfig | Self::MemoryGrants => RuleCategory::Memory,
            Self::CpuAffinity | Self::SocketLayout => RuleCategory::Cpu,
            Self::VmHardware => RuleCategory::Virtualization,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule that produced this finding
    #[serde(rename = "ruleID")]
    pub rule_id: RuleId,
    /// Outcome class
    pub severity: Severity,
    /// Explanation for humans
    pub message: String,
    /// Suggested action, when there is one
    pub recommendation: Option<String>,
    /// Short machine tag
    #[serde(rename = "reasonCode")]
    pub reason_code: Option<String>,
}

impl Finding {
    /// Create a finding with no recommendation or reason code
    pub fn new(rule_id: RuleId, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id,
            severity,
            message: message.into(),
            recommendation: None,
            reason_code: None,
        }
    }

    /// Create a PASS finding
    pub fn pass(rule_id: RuleId, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Pass, message)
    }

    /// Create a WARN finding
    pub fn warn(rule_id: RuleId, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Warn, message)
    }

    /// Create a FAIL finding
    pub fn fail(rule_id: RuleId, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Fail, message)
    }

    /// Attach a recommendation
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Attach a reason code
    pub fn with_reason(mut self, reason_code: impl Into<String>) -> Self {
        self.reason_code = Some(reason_code.into());
        self
    }
}

/// One sub-check of a combined rule
#[derive(Debug, Clone)]
pub(crate) struct SubCheck {
    pub severity: Severity,
    pub message: String,
    pub recommendation: Option<String>,
    pub reason_code: Option<&'static str>,
}

impl SubCheck {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Pass,
            message: message.into(),
            recommendation: None,
            reason_code: None,
        }
    }

    pub fn warn(
        message: impl Into<String>,
        recommendation: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self {
            severity: Severity::Warn,
            message: message.into(),
            recommendation: Some(recommendation.into()),
            reason_code: Some(reason),
        }
    }
}

/// Fold sub-checks into one finding carrying the worst severity
///
/// Messages and recommendations are joined in sub-check order; the reason
/// code is taken from the first sub-check at the worst severity.
pub(crate) fn combine(rule_id: RuleId, checks: &[SubCheck]) -> Finding {
    let severity = checks
        .iter()
        .map(|c| c.severity)
        .max()
        .unwrap_or(Severity::Pass);

    let message = checks
        .iter()
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let recommendations: Vec<&str> = checks
        .iter()
        .filter_map(|c| c.recommendation.as_deref())
        .collect();

    let reason = checks
        .iter()
        .filter(|c| c.severity == severity)
        .find_map(|c| c.reason_code);

    let mut finding = Finding::new(rule_id, severity, message);
    if !recommendations.is_empty() {
        finding = finding.with_recommendation(recommendations.join(" "));
    }
    if let Some(reason) = reason {
        finding = finding.with_reason(reason);
    }
    finding
}
