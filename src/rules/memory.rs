//! Memory configuration and memory grant rules

use super::{combine, Finding, Rule, RuleId, SubCheck};
use crate::error::Result;
use crate::snapshot::{Metric, MetricSnapshot};

/// Min server memory below this fraction of max is flagged
pub const MIN_TO_MAX_MEMORY_RATIO: f64 = 0.25;

/// Validates min/max server memory against physical RAM
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryConfigRule;

impl Rule for MemoryConfigRule {
    fn id(&self) -> RuleId {
        RuleId::MemoryConfig
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        let (total, min, max) = match (
            snapshot.physical_memory_mb,
            snapshot.min_server_memory_mb,
            snapshot.max_server_memory_mb,
        ) {
            (Metric::Available(total), Metric::Available(min), Metric::Available(max)) => {
                (total, min, max)
            }
            _ => {
                return Ok(Finding::fail(self.id(), "Unable to retrieve memory configuration.")
                    .with_recommendation(
                        "Check sp_configure access and sys.dm_os_sys_memory permissions.",
                    )
                    .with_reason("memory-config-unavailable"));
            }
        };

        let mut checks = vec![SubCheck::pass(format!(
            "Total Physical RAM: {} MB, SQL Min Memory: {} MB, SQL Max Memory: {} MB.",
            total, min, max
        ))];

        if max > total {
            checks.push(SubCheck::warn(
                "SQL Max Memory exceeds physical RAM. Risk of OS starvation.",
                "Set max server memory below physical RAM, leaving headroom for the OS.",
                "max-memory-exceeds-physical",
            ));
        } else {
            checks.push(SubCheck::pass("SQL Max Memory fits within physical RAM."));
        }

        if (min as f64) < (max as f64) * MIN_TO_MAX_MEMORY_RATIO {
            checks.push(SubCheck::warn(
                "SQL Min Memory is set very low compared to Max. Could delay memory ramp-up.",
                "Raise min server memory to at least 25% of max server memory.",
                "min-memory-too-low",
            ));
        } else {
            checks.push(SubCheck::pass("SQL Min/Max memory ratio looks reasonable."));
        }

        Ok(combine(self.id(), &checks))
    }
}

/// Flags queries waiting on memory grants
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryGrantsRule;

impl Rule for MemoryGrantsRule {
    fn id(&self) -> RuleId {
        RuleId::MemoryGrants
    }

    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding> {
        Ok(match snapshot.memory_grants_pending {
            Metric::Available(0) => Finding::pass(self.id(), "No memory grant pressure detected."),
            Metric::Unavailable => Finding::pass(
                self.id(),
                "No memory grant pressure detected (memory grant statistics unavailable).",
            )
            .with_reason("memory-grants-unavailable"),
            Metric::Available(pending) => Finding::warn(
                self.id(),
                format!("{} queries are waiting for memory grants.", pending),
            )
            .with_recommendation(
                "Review memory-intensive queries and max server memory; pending grants indicate memory pressure.",
            )
            .with_reason("memory-grants-pending"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Severity;

    fn memory(total: u64, min: u64, max: u64) -> MetricSnapshot {
        MetricSnapshot {
            physical_memory_mb: Metric::Available(total),
            min_server_memory_mb: Metric::Available(min),
            max_server_memory_mb: Metric::Available(max),
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_config_reasonable() {
        let finding = MemoryConfigRule.evaluate(&memory(65536, 16384, 57344)).unwrap();
        assert_eq!(finding.severity, Severity::Pass);
        assert!(finding.recommendation.is_none());
    }

    #[test]
    fn test_memory_config_default_max_exceeds_ram() {
        let finding = MemoryConfigRule
            .evaluate(&memory(32768, 0, 2_147_483_647))
            .unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.contains("Risk of OS starvation"));
        assert!(finding.message.contains("Could delay memory ramp-up"));
        assert_eq!(finding.reason_code.as_deref(), Some("max-memory-exceeds-physical"));
    }

    #[test]
    fn test_memory_config_unavailable_fails() {
        let finding = MemoryConfigRule.evaluate(&MetricSnapshot::default()).unwrap();
        assert_eq!(finding.severity, Severity::Fail);
    }

    #[test]
    fn test_memory_grants() {
        let finding = MemoryGrantsRule.evaluate(&MetricSnapshot::default()).unwrap();
        assert_eq!(finding.severity, Severity::Pass);

        let snapshot = MetricSnapshot {
            memory_grants_pending: Metric::Available(3),
            ..Default::default()
        };
        let finding = MemoryGrantsRule.evaluate(&snapshot).unwrap();
        assert_eq!(finding.severity, Severity::Warn);
        assert!(finding.message.starts_with("3 queries"));
    }
}
