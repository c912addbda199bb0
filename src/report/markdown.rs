//! Markdown report
//!
//! One `##` section per rule category, in the order categories first appear
//! in the findings, and one `###` entry per finding inside it.

use super::Report;
use crate::rules::{Finding, RuleCategory};

/// Render the Markdown report
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    let counts = report.counts();

    out.push_str(&format!("# NUMA Diagnostics Report: {}\n\n", report.server_label()));
    out.push_str(&format!("- **Generated:** {}\n", report.generated_at().to_rfc3339()));
    out.push_str(&format!("- **Mode:** {}\n", report.mode()));
    out.push_str(&format!(
        "- **Summary:** {} passed, {} warnings, {} failed\n",
        counts.pass, counts.warn, counts.fail
    ));

    for (category, findings) in group_by_category(report.findings()) {
        out.push_str(&format!("\n## {}\n", category.title()));
        for finding in findings {
            push_finding(&mut out, finding);
        }
    }

    out
}

fn group_by_category(findings: &[Finding]) -> Vec<(RuleCategory, Vec<&Finding>)> {
    let mut groups: Vec<(RuleCategory, Vec<&Finding>)> = Vec::new();
    for finding in findings {
        let category = finding.rule_id.category();
        match groups.iter_mut().find(|(c, _)| *c == category) {
            Some((_, members)) => members.push(finding),
            None => groups.push((category, vec![finding])),
        }
    }
    groups
}

fn push_finding(out: &mut String, finding: &Finding) {
    out.push_str(&format!(
        "\n### {} (`{}`)\n\n",
        finding.rule_id.title(),
        finding.rule_id
    ));
    out.push_str(&format!("**Status:** {}\n\n", finding.severity));
    out.push_str(&finding.message);
    out.push('\n');
    if let Some(recommendation) = &finding.recommendation {
        out.push_str(&format!("\n**Recommendation:** {}\n", recommendation));
    }
    if let Some(reason) = &finding.reason_code {
        out.push_str(&format!("\n**Reason code:** `{}`\n", reason));
    }
}
