//! Console summary

use super::Report;
use crate::rules::Severity;

/// Warnings shown in the console summary before truncating
const MAX_HIGHLIGHTED_WARNINGS: usize = 5;

/// Render the plain-text console summary
///
/// Always shows the counts, then every FAIL message verbatim, then the first
/// few warnings.
pub fn render_console(report: &Report) -> String {
    render_with(report, |severity| severity.label().to_string())
}

/// Render the console summary with colored severity badges
///
/// Colors are dropped automatically when stdout is not a terminal.
pub fn render_console_styled(report: &Report) -> String {
    render_with(report, |severity| {
        let label = console::style(severity.label()).bold();
        match severity {
            Severity::Pass => label.green().to_string(),
            Severity::Warn => label.yellow().to_string(),
            Severity::Fail => label.red().to_string(),
        }
    })
}

/// Render only the final counts on one line, for quiet runs
pub fn render_console_counts(report: &Report) -> String {
    let counts = report.counts();
    format!(
        "Summary for {}: PASS {}, WARN {}, FAIL {}",
        report.server_label(),
        counts.pass,
        counts.warn,
        counts.fail
    )
}

fn render_with(report: &Report, badge: impl Fn(Severity) -> String) -> String {
    let mut out = String::new();
    let counts = report.counts();

    out.push_str(&format!(
        "Summary for {} ({}, generated {}):\n",
        report.server_label(),
        report.mode(),
        report.generated_at().to_rfc3339(),
    ));
    out.push_str(&format!(" - {}: {}\n", badge(Severity::Pass), counts.pass));
    out.push_str(&format!(" - {}: {}\n", badge(Severity::Warn), counts.warn));
    out.push_str(&format!(" - {}: {}\n", badge(Severity::Fail), counts.fail));

    if counts.fail > 0 {
        out.push_str(" - Failures:\n");
        for finding in report.with_severity(Severity::Fail) {
            out.push_str(&format!(
                "   {} [{}] {}\n",
                badge(Severity::Fail),
                finding.rule_id,
                finding.message
            ));
        }
    }

    if counts.warn > 0 {
        out.push_str(" - Highlighted issues:\n");
        let highlighted = report
            .with_severity(Severity::Warn)
            .take(MAX_HIGHLIGHTED_WARNINGS);
        for finding in highlighted {
            out.push_str(&format!(
                "   {} [{}] {}\n",
                badge(Severity::Warn),
                finding.rule_id,
                finding.message
            ));
        }
        if counts.warn > MAX_HIGHLIGHTED_WARNINGS {
            out.push_str(&format!(
                "   ... and {} more (see the Markdown report)\n",
                counts.warn - MAX_HIGHLIGHTED_WARNINGS
            ));
        }
    }

    out
}
