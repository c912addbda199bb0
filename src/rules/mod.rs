//! Infrastructure tuning rules
//!
//! Each rule inspects a [`MetricSnapshot`] and returns exactly one
//! [`Finding`]. Rules are independent of each other and never perform I/O,
//! so a [`RuleSet`] can be evaluated in any order; reports always present
//! findings in rule-set order.

mod cpu;
mod finding;
mod hardware;
mod maxdop;
mod memory;
mod topology;

pub use cpu::{CpuAffinityRule, EditionPolicy, SocketLayoutRule};
pub use finding::{Finding, RuleCategory, RuleId, Severity};
pub use hardware::VmHardwareRule;
pub use maxdop::{recommend_maxdop, MaxdopRecommendation, MaxdopRule, MAXDOP_CAP};
pub use memory::{MemoryConfigRule, MemoryGrantsRule};
pub use topology::{MemoryNodeAlignmentRule, NumaBalanceRule, SchedulerStatusRule, SystemSpecsRule};

pub(crate) use finding::{combine, SubCheck};

use crate::error::Result;
use crate::snapshot::MetricSnapshot;

/// Nodes assumed when the NUMA node count could not be collected
///
/// This is a policy default, not a measured fact; rules that use it say so
/// in their message.
pub const FALLBACK_NUMA_NODES: u32 = 1;

/// A single tuning rule
pub trait Rule: Send + Sync {
    /// Stable identifier of this rule
    fn id(&self) -> RuleId;

    /// Evaluate the rule against a snapshot
    ///
    /// Unavailable metrics are handled inside the rule and produce a WARN or
    /// FAIL finding. An `Err` is reserved for input the rule cannot
    /// interpret at all.
    fn evaluate(&self, snapshot: &MetricSnapshot) -> Result<Finding>;

    /// Report section of this rule
    fn category(&self) -> RuleCategory {
        self.id().category()
    }
}

/// Which rule families to run, mirroring the CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleSelection {
    /// Run everything
    pub full: bool,
    /// maxDOP recommendation
    pub maxdop: bool,
    /// Memory configuration
    pub memory: bool,
    /// CPU affinity
    pub affinity: bool,
    /// Workload pressure (memory grants)
    pub workload: bool,
    /// Sockets and VM hardware
    pub hardware: bool,
}

impl RuleSelection {
    /// Select every rule
    pub fn all() -> Self {
        Self {
            full: true,
            ..Default::default()
        }
    }

    /// True when no explicit family was requested
    pub fn is_empty(&self) -> bool {
        !(self.full
            || self.maxdop
            || self.memory
            || self.affinity
            || self.workload
            || self.hardware)
    }

    /// Whether `id` is part of this selection
    ///
    /// An empty selection behaves like `--full`.
    pub fn includes(&self, id: RuleId) -> bool {
        if self.full || self.is_empty() {
            return true;
        }
        match id {
            RuleId::MaxdopRecommendation => self.maxdop,
            RuleId::MemoryConfig => self.memory,
            RuleId::CpuAffinity => self.affinity,
            RuleId::MemoryGrants => self.workload,
            RuleId::SocketLayout | RuleId::VmHardware => self.hardware,
            RuleId::SystemSpecs
            | RuleId::NumaBalance
            | RuleId::SchedulerStatus
            | RuleId::MemoryNodeAlignment => false,
        }
    }
}

/// Ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleSet {
    /// Empty rule set
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Every rule, in standard order
    pub fn standard(policy: EditionPolicy) -> Self {
        Self::selected(RuleSelection::all(), policy)
    }

    /// Rules included by `selection`, in standard order
    pub fn selected(selection: RuleSelection, policy: EditionPolicy) -> Self {
        let mut set = Self::empty();
        for id in RuleId::ALL {
            if selection.includes(id) {
                set.rules.push(Self::build(id, &policy));
            }
        }
        set
    }

    fn build(id: RuleId, policy: &EditionPolicy) -> Box<dyn Rule> {
        match id {
            RuleId::SystemSpecs => Box::new(SystemSpecsRule),
            RuleId::NumaBalance => Box::new(NumaBalanceRule),
            RuleId::SchedulerStatus => Box::new(SchedulerStatusRule),
            RuleId::MemoryNodeAlignment => Box::new(MemoryNodeAlignmentRule),
            RuleId::MaxdopRecommendation => Box::new(MaxdopRule),
            RuleId::MemoryConfig => Box::new(MemoryConfigRule),
            RuleId::CpuAffinity => Box::new(CpuAffinityRule),
            RuleId::SocketLayout => Box::new(SocketLayoutRule::new(policy.clone())),
            RuleId::VmHardware => Box::new(VmHardwareRule),
            RuleId::MemoryGrants => Box::new(MemoryGrantsRule),
        }
    }

    /// Append a rule at the end
    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Rule ids in order
    pub fn ids(&self) -> Vec<RuleId> {
        self.rules.iter().map(|r| r.id()).collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard(EditionPolicy::default())
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.ids()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let set = RuleSet::default();
        assert_eq!(set.ids(), RuleId::ALL.to_vec());
    }

    #[test]
    fn test_empty_selection_runs_everything() {
        let set = RuleSet::selected(RuleSelection::default(), EditionPolicy::default());
        assert_eq!(set.len(), RuleId::ALL.len());
    }

    #[test]
    fn test_selection_keeps_standard_order() {
        let selection = RuleSelection {
            workload: true,
            maxdop: true,
            hardware: true,
            ..Default::default()
        };
        let set = RuleSet::selected(selection, EditionPolicy::default());
        assert_eq!(
            set.ids(),
            vec![
                RuleId::MaxdopRecommendation,
                RuleId::SocketLayout,
                RuleId::VmHardware,
                RuleId::MemoryGrants,
            ]
        );
    }

    #[test]
    fn test_category_follows_id() {
        for rule in RuleSet::default().iter() {
            assert_eq!(rule.category(), rule.id().category());
        }
    }
}
