//! Report aggregation and rendering
//!
//! The [`Aggregator`] is the only place a [`Report`] is built. Renderers take
//! a shared reference and never change it, so rendering the same report twice
//! gives byte-identical output.

mod console;
mod export;
mod json;
mod markdown;

pub use console::{render_console, render_console_counts, render_console_styled};
pub use export::ReportExporter;
pub use json::render_json;
pub use markdown::render_markdown;

use crate::rules::{EditionPolicy, Finding, RuleSet, Severity};
use crate::snapshot::MetricSnapshot;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason code attached to findings of rules that failed to evaluate
pub const RULE_DEFECT_REASON: &str = "rule-evaluation-defect";

/// How the metrics were obtained; recorded for display only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    /// Collected from a real host or an external collector
    Live,
    /// Built-in simulated dataset
    DryRun,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::DryRun => write!(f, "DRY_RUN"),
        }
    }
}

/// Filename-safe server identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServerLabel(String);

impl ServerLabel {
    /// Label used when nothing better is known
    pub const UNKNOWN: &'static str = "unknown";
    /// Label used for dry runs
    pub const DRY_RUN: &'static str = "dry_run";

    /// Build a label, replacing every character outside `[A-Za-z0-9_-]` with `_`
    pub fn sanitize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if cleaned.is_empty() {
            Self(Self::UNKNOWN.to_string())
        } else {
            Self(cleaned)
        }
    }

    /// Resolve the label: caller override, then dry-run default, then the
    /// server name from the snapshot
    pub fn resolve(
        override_prefix: Option<&str>,
        snapshot: &MetricSnapshot,
        mode: RunMode,
    ) -> Self {
        if let Some(prefix) = override_prefix {
            return Self::sanitize(prefix);
        }
        if mode == RunMode::DryRun {
            return Self::sanitize(Self::DRY_RUN);
        }
        match snapshot.server_name.get() {
            Some(name) => Self::sanitize(name),
            None => Self::sanitize(Self::UNKNOWN),
        }
    }

    /// The label text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Findings per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Counts {
    /// PASS findings
    pub pass: usize,
    /// WARN findings
    pub warn: usize,
    /// FAIL findings
    pub fail: usize,
}

impl Counts {
    fn tally(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut counts, f| {
            match f.severity {
                Severity::Pass => counts.pass += 1,
                Severity::Warn => counts.warn += 1,
                Severity::Fail => counts.fail += 1,
            }
            counts
        })
    }

    /// Total number of findings
    pub fn total(&self) -> usize {
        self.pass + self.warn + self.fail
    }
}

/// Aggregate of every finding for one run
///
/// Field order matches the JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    server_label: ServerLabel,
    generated_at: DateTime<Utc>,
    mode: RunMode,
    findings: Vec<Finding>,
    counts: Counts,
}

impl Report {
    /// Filename-safe server label
    pub fn server_label(&self) -> &ServerLabel {
        &self.server_label
    }

    /// When the report was generated
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Live or dry run
    pub fn mode(&self) -> RunMode {
        self.mode
    }

    /// Findings in rule-set order
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Findings per severity
    pub fn counts(&self) -> Counts {
        self.counts
    }

    /// Findings with the given severity, in order
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// True if any finding failed
    pub fn has_failures(&self) -> bool {
        self.counts.fail > 0
    }
}

/// Runs a rule set against a snapshot and builds the report
#[derive(Debug, Default)]
pub struct Aggregator {
    rules: RuleSet,
}

impl Aggregator {
    /// Create an aggregator for the given rules
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Rules this aggregator runs
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Build a report stamped with the current time
    pub fn aggregate(
        &self,
        snapshot: &MetricSnapshot,
        label: ServerLabel,
        mode: RunMode,
    ) -> Report {
        self.aggregate_at(snapshot, label, mode, Utc::now().trunc_subsecs(0))
    }

    /// Build a report with an explicit timestamp
    ///
    /// Every rule runs even if an earlier one failed to evaluate; a rule that
    /// returns an error is reported as a FAIL finding.
    pub fn aggregate_at(
        &self,
        snapshot: &MetricSnapshot,
        label: ServerLabel,
        mode: RunMode,
        generated_at: DateTime<Utc>,
    ) -> Report {
        let findings: Vec<Finding> = self
            .rules
            .iter()
            .map(|rule| {
                let id = rule.id();
                match rule.evaluate(snapshot) {
                    Ok(finding) if finding.rule_id == id => {
                        tracing::debug!(rule = %id, severity = %finding.severity, "rule evaluated");
                        finding
                    }
                    Ok(finding) => {
                        tracing::warn!(
                            rule = %id,
                            returned = %finding.rule_id,
                            "rule returned a finding for another rule"
                        );
                        let detail = format!("finding carried rule id '{}'", finding.rule_id);
                        defect_finding(id, &detail)
                    }
                    Err(e) => {
                        tracing::warn!(rule = %id, error = %e, "rule evaluation defect");
                        defect_finding(id, &e.to_string())
                    }
                }
            })
            .collect();

        let counts = Counts::tally(&findings);
        tracing::info!(
            label = %label,
            mode = %mode,
            pass = counts.pass,
            warn = counts.warn,
            fail = counts.fail,
            "report aggregated"
        );

        Report {
            server_label: label,
            generated_at,
            mode,
            findings,
            counts,
        }
    }
}

fn defect_finding(id: crate::rules::RuleId, detail: &str) -> Finding {
    Finding::fail(id, format!("Rule evaluation defect: {}", detail))
        .with_recommendation(
            "Check the collected snapshot for malformed values and re-run the diagnostics.",
        )
        .with_reason(RULE_DEFECT_REASON)
}

/// Evaluate the standard rule set with the default edition policy
pub fn evaluate(snapshot: &MetricSnapshot, label: ServerLabel, mode: RunMode) -> Report {
    Aggregator::new(RuleSet::standard(EditionPolicy::default()))
        .aggregate(snapshot, label, mode)
}
