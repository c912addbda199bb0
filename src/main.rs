//! Infra Snitch CLI - SQL Server infrastructure diagnostics
//!
//! Collects metrics, runs the selected rules and writes the reports.

use clap::Parser;
use infra_snitch::collector::{
    collect_from, DryRunSource, HostProbeSource, MetricSource, SnapshotFileSource,
};
use infra_snitch::config::{CliArgs, Commands, DiagnosticConfig, OutputFormat, SourceKind};
use infra_snitch::error::{Result, SnitchError};
use infra_snitch::report::{
    render_console_counts, render_console_styled, render_json, Aggregator, Report, ReportExporter,
    ServerLabel,
};
use infra_snitch::rules::RuleSet;
use tracing_subscriber::EnvFilter;

/// Exit code when the report contains a FAIL finding
const EXIT_FINDINGS_FAILED: i32 = 2;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG wins over the flags
    let default_level = if args.quiet {
        "error"
    } else if args.debug || args.verbose > 1 {
        "debug"
    } else if args.verbose == 1 {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle result
    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: CliArgs) -> Result<i32> {
    let config = DiagnosticConfig::from_cli(&args).map_err(SnitchError::config)?;
    let rules = RuleSet::selected(config.selection, config.edition.clone());

    if let Some(Commands::Rules) = &args.command {
        print_rules(&rules);
        return Ok(0);
    }

    let source = build_source(&config);
    let snapshot = collect_from(source.as_ref())?;

    if let Some(Commands::Snapshot) = &args.command {
        println!("{}", snapshot.to_json()?);
        return Ok(0);
    }

    let mode = source.mode();
    let label = ServerLabel::resolve(config.prefix.as_deref(), &snapshot, mode);
    let report = Aggregator::new(rules).aggregate(&snapshot, label, mode);

    // Summary goes out before anything that can fail
    match config.format {
        OutputFormat::Text if !args.quiet => print!("{}", render_console_styled(&report)),
        OutputFormat::Text => println!("{}", render_console_counts(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if config.export {
        export(&config, &report, args.quiet)?;
    }

    Ok(if report.has_failures() {
        EXIT_FINDINGS_FAILED
    } else {
        0
    })
}

fn build_source(config: &DiagnosticConfig) -> Box<dyn MetricSource> {
    match &config.source {
        SourceKind::Host => Box::new(HostProbeSource::new()),
        SourceKind::DryRun => Box::new(DryRunSource),
        SourceKind::File(path) => Box::new(SnapshotFileSource::new(path)),
    }
}

fn export(config: &DiagnosticConfig, report: &Report, quiet: bool) -> Result<()> {
    let exporter = ReportExporter::new(&config.output_dir);
    let (markdown, json) = exporter.write_all(report)?;

    if config.format == OutputFormat::Text && !quiet {
        println!();
        println!("Markdown report: {}", markdown.display());
        println!("JSON report:     {}", json.display());
    }
    Ok(())
}

fn print_rules(rules: &RuleSet) {
    println!("{:<24} {:<16} {}", "RULE", "CATEGORY", "TITLE");
    for rule in rules.iter() {
        let id = rule.id();
        println!("{:<24} {:<16} {}", id.as_str(), id.category().title(), id.title());
    }
}
