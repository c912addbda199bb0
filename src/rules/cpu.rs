//! CPU visibility and socket licensing rules

use super::{Finding, Rule, RuleId};
use crate::error::Result;
use crate::snapshot::{Metric, MetricSnapshot};
use serde::{Deserialize, Serialize};

const NO_AFFINITY_MASK: &str = "No CPU affinity mask detected. SQL sees all online CPUs.";

/// Licensing limit the socket layout is checked against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionPolicy {
    /// Edition name used in messages
    pub name: String,
    /// Maximum sockets the edition will use
    pub socket_limit: u32,
}

impl EditionPolicy {
    /// Default edition name
    pub const STANDARD: &'static str = "Standard";
    /// Socket limit applied to Standard Edition
    pub const STANDARD_SOCKET_LIMIT: u32 = 2;

    /// Create a policy
    pub fn new(name: impl Into<String>, socket_limit: u32) -> Self {
        Self {
            name: name.into(),
            socket_limit,
        }
    }
}

impl Default for EditionPolicy {
    fn default() -> Self {
        Self::new(Self::STANDARD, Self::STANDARD_SOCKET_LIMIT)
    }
}

/// Detects an affinity mask hiding online CPUs from SQL Server
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuAffinityRule;

impl Rule for CpuAffinityRule {
    fn id(&self) -> RuleId {
        RuleId::CpuAffinity
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        Ok(match snapshot.affinity_mask_present {
            Metric::Available(false) => Finding::pass(self.id(), NO_AFFINITY_MASK),
            Metric::Available(true) => Finding::warn(
                self.id(),
                "Affinity mask is likely applied. Some CPUs are online but not visible to SQL Server.",
            )
            .with_recommendation(
                "Align the affinity mask with NUMA node boundaries, or remove it so SQL Server can use every online CPU.",
            )
            .with_reason("affinity-mask-present"),
            Metric::Unavailable => {
                Finding::warn(self.id(), "Unable to determine CPU affinity configuration.")
                    .with_recommendation(
                        "Compare online CPUs with VISIBLE ONLINE schedulers in sys.dm_os_schedulers.",
                    )
                    .with_reason("affinity-unavailable")
            }
        })
    }
}

/// Checks the socket count against the edition's socket limit
#[derive(Debug, Clone, Default)]
pub struct SocketLayoutRule {
    policy: EditionPolicy,
}

impl SocketLayoutRule {
    /// Create a rule for the given edition policy
    pub fn new(policy: EditionPolicy) -> Self {
        Self { policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> &EditionPolicy {
        &self.policy
    }
}

impl Rule for SocketLayoutRule {
    fn id(&self) -> RuleId {
        RuleId::SocketLayout
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let layout = format!(
            "Sockets: {}, Physical Cores: {}, Logical Processors: {}.",
            snapshot.socket_count.display_or("unavailable"),
            snapshot.physical_core_count.display_or("unavailable"),
            snapshot.logical_processor_count.display_or("unavailable"),
        );
        let limit = self.policy.socket_limit;
        let edition = &self.policy.name;

        Ok(match snapshot.socket_count {
            Metric::Unavailable => Finding::warn(
                self.id(),
                format!(
                    "{} Socket count unavailable; {} Edition licensing limit cannot be checked.",
                    layout, edition
                ),
            )
            .with_recommendation(
                "Collect the host socket layout to verify edition licensing limits.",
            )
            .with_reason("socket-count-unavailable"),
            Metric::Available(sockets) if sockets <= limit => Finding::pass(
                self.id(),
                format!(
                    "{} Socket count is within SQL Server {} Edition limits ({} sockets).",
                    layout, edition, limit
                ),
            ),
            Metric::Available(sockets) => Finding::warn(
                self.id(),
                format!(
                    "{} Detected {} sockets; SQL Server {} Edition will only use {} sockets regardless of core count.",
                    layout, sockets, edition, limit
                ),
            )
            .with_recommendation(
                "Reconfigure the VM to use fewer sockets with more cores per socket (e.g., 1 socket x 8 cores).",
            )
            .with_reason("socket-limit-exceeded"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    #[test]
    fn test_no_affinity_mask_passes_with_fixed_message() {
        let snapshot = MetricSnapshot {
            affinity_mask_present: Metric::Available(false),
            ..Default::default()
        };
        let finding = CpuAffinityRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert_eq!(finding.message, "No CPU affinity mask detected. SQL sees all online CPUs.");
    }

    #[test]
    fn test_affinity_mask_warns() {
        let snapshot = MetricSnapshot {
            affinity_mask_present: Metric::Available(true),
            ..Default::default()
        };
        let finding = CpuAffinityRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.recommendation.unwrap().contains("NUMA node boundaries"));

        let finding = CpuAffinityRule.evaluate(&MetricSnapshot::default()).unwrap();
        assert_eq!(finding.reason_code.as_deref(), Some("affinity-unavailable"));
    }

    #[test]
    fn test_socket_layout_within_limit() {
        let snapshot = MetricSnapshot {
            socket_count: Metric::Available(2),
            physical_core_count: Metric::Available(16),
            logical_processor_count: Metric::Available(32),
            ..Default::default()
        };
        let finding = SocketLayoutRule::default().evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding
            .message
            .starts_with("Sockets: 2, Physical Cores: 16, Logical Processors: 32."));
    }

    #[test]
    fn test_socket_layout_limit_is_parameterized() {
        let snapshot = MetricSnapshot {
            socket_count: Metric::Available(4),
            ..Default::default()
        };
        let standard = SocketLayoutRule::default().evaluate(&snapshot).unwrap();
        assert_eq!(standard.severity, Severity::Warn);
        assert!(standard.message.contains("will only use 2 sockets"));

        let relaxed = SocketLayoutRule::new(EditionPolicy::new("Standard", 4))
            .evaluate(&snapshot)
            .unwrap();
        assert_eq!(relaxed.severity, Severity::Pass);
    }
}
