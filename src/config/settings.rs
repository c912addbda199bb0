//! Configuration settings for Infra Snitch
//!
//! Defines the CLI arguments and the validated run configuration built from
//! them.

use crate::rules::{EditionPolicy, RuleSelection};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Infra Snitch - NUMA, maxDOP and VM hardware diagnostics for SQL Server hosts
#[derive(Parser, Debug, Clone)]
#[command(name = "infra-snitch")]
#[command(author = "Infra Snitch Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "NUMA, maxDOP and VM hardware diagnostics for SQL Server hosts")]
#[command(long_about = r#"
Infra Snitch evaluates a SQL Server host against infrastructure tuning rules
and reports every check as PASS, WARN or FAIL.

Rules:
  - NUMA balance, scheduler status and memory node alignment
  - maxDOP recommendation based on NUMA topology
  - Min/max server memory vs physical RAM
  - CPU affinity and socket licensing limits
  - Virtual disk controller, network adapter and vNUMA checks
  - Memory grant pressure

Examples:
  infra-snitch --dry-run                          # Simulated dataset
  infra-snitch --snapshot sql01.json --full       # Collected snapshot
  infra-snitch --maxdop --hardware --output prod  # Selected rules, custom prefix
  infra-snitch rules                              # List the rule set
"#)]
pub struct CliArgs {
    /// Run every rule (default when no rule flag is given)
    #[arg(long)]
    pub full: bool,

    /// Recommend maxDOP from the NUMA topology
    #[arg(long)]
    pub maxdop: bool,

    /// Validate min/max server memory
    #[arg(long)]
    pub memory: bool,

    /// Check the CPU affinity mask
    #[arg(long)]
    pub affinity: bool,

    /// Check memory grant pressure
    #[arg(long)]
    pub workload: bool,

    /// Check sockets and virtual hardware
    #[arg(long)]
    pub hardware: bool,

    /// Use the built-in simulated dataset
    #[arg(long, conflicts_with = "snapshot")]
    pub dry_run: bool,

    /// Load a JSON metric snapshot produced by an external collector
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Report file prefix (defaults to the server name)
    #[arg(short = 'o', long, value_name = "PREFIX")]
    pub output: Option<String>,

    /// Directory for the Markdown and JSON reports
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Do not write report files
    #[arg(long)]
    pub no_export: bool,

    /// SQL Server edition name used in licensing messages
    #[arg(
        long,
        env = "INFRA_SNITCH_EDITION",
        default_value = EditionPolicy::STANDARD,
        value_name = "NAME"
    )]
    pub edition: String,

    /// Maximum sockets the edition will use
    #[arg(
        long,
        env = "INFRA_SNITCH_SOCKET_LIMIT",
        default_value_t = EditionPolicy::STANDARD_SOCKET_LIMIT,
        value_name = "NUM"
    )]
    pub socket_limit: u32,

    /// What to print on stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the rules in evaluation order
    #[command(name = "rules")]
    Rules,

    /// Collect metrics and print the snapshot as JSON
    #[command(name = "snapshot")]
    Snapshot,
}

/// Output format for stdout
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Console summary
    #[default]
    Text,
    /// Full JSON report
    Json,
}

/// Where metrics come from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Probe the local host
    #[default]
    Host,
    /// Built-in simulated dataset
    DryRun,
    /// JSON snapshot file
    File(PathBuf),
}

/// Validated configuration for one diagnostics run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticConfig {
    /// Metric source
    pub source: SourceKind,
    /// Rule families to run
    pub selection: RuleSelection,
    /// Report file prefix override
    pub prefix: Option<String>,
    /// Directory for report files
    pub output_dir: PathBuf,
    /// Whether to write report files
    pub export: bool,
    /// Edition licensing policy
    pub edition: EditionPolicy,
    /// Stdout format
    pub format: OutputFormat,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Host,
            selection: RuleSelection::all(),
            prefix: None,
            output_dir: PathBuf::from("."),
            export: true,
            edition: EditionPolicy::default(),
            format: OutputFormat::Text,
        }
    }
}

impl DiagnosticConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        let source = match (&args.snapshot, args.dry_run) {
            (Some(_), true) => {
                return Err("--dry-run and --snapshot are mutually exclusive".to_string())
            }
            (Some(path), false) => SourceKind::File(path.clone()),
            (None, true) => SourceKind::DryRun,
            (None, false) => SourceKind::Host,
        };

        let prefix = match args.output.as_deref() {
            Some(prefix) if prefix.trim().is_empty() => {
                return Err("Output prefix must not be empty".to_string())
            }
            Some(prefix) => Some(prefix.to_string()),
            None => None,
        };

        let edition = args.edition.trim();
        if edition.is_empty() {
            return Err("Edition name must not be empty".to_string());
        }
        if args.socket_limit == 0 {
            return Err("Socket limit must be at least 1".to_string());
        }

        Ok(Self {
            source,
            selection: RuleSelection {
                full: args.full,
                maxdop: args.maxdop,
                memory: args.memory,
                affinity: args.affinity,
                workload: args.workload,
                hardware: args.hardware,
            },
            prefix,
            output_dir: args.output_dir.clone(),
            export: !args.no_export,
            edition: EditionPolicy::new(edition, args.socket_limit),
            format: args.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleId;

    fn parse(args: &[&str]) -> CliArgs {
        let argv = std::iter::once("infra-snitch").chain(args.iter().copied());
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = DiagnosticConfig::from_cli(&parse(&[])).unwrap();
        assert_eq!(config.source, SourceKind::Host);
        assert!(config.selection.is_empty());
        assert!(RuleId::ALL.iter().all(|id| config.selection.includes(*id)));
        assert!(config.export);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn test_rule_flags() {
        let config = DiagnosticConfig::from_cli(&parse(&["--maxdop", "--hardware"])).unwrap();
        assert!(config.selection.includes(RuleId::MaxdopRecommendation));
        assert!(config.selection.includes(RuleId::SocketLayout));
        assert!(config.selection.includes(RuleId::VmHardware));
        assert!(!config.selection.includes(RuleId::MemoryConfig));
    }

    #[test]
    fn test_sources() {
        let config = DiagnosticConfig::from_cli(&parse(&["--dry-run"])).unwrap();
        assert_eq!(config.source, SourceKind::DryRun);

        let config = DiagnosticConfig::from_cli(&parse(&["--snapshot", "sql01.json"])).unwrap();
        assert_eq!(config.source, SourceKind::File(PathBuf::from("sql01.json")));

        let both = ["infra-snitch", "--dry-run", "--snapshot", "x.json"];
        assert!(CliArgs::try_parse_from(both).is_err());
    }

    #[test]
    fn test_edition_flags() {
        let args = parse(&["--edition", "Enterprise", "--socket-limit", "64"]);
        let config = DiagnosticConfig::from_cli(&args).unwrap();
        assert_eq!(config.edition, EditionPolicy::new("Enterprise", 64));

        let err = DiagnosticConfig::from_cli(&parse(&["--socket-limit", "0"])).unwrap_err();
        assert!(err.contains("Socket limit"));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        assert!(DiagnosticConfig::from_cli(&parse(&["--output", "  "])).is_err());
        let args = parse(&["--output", "prod/sql01", "--no-export"]);
        let config = DiagnosticConfig::from_cli(&args).unwrap();
        assert_eq!(config.prefix.as_deref(), Some("prod/sql01"));
        assert!(!config.export);

        let config = DiagnosticConfig::from_cli(&parse(&["--output", " sql01"])).unwrap();
        assert_eq!(config.prefix.as_deref(), Some(" sql01"));
    }

    #[test]
    fn test_subcommands() {
        assert!(matches!(parse(&["rules"]).command, Some(Commands::Rules)));
        assert!(matches!(parse(&["--dry-run", "snapshot"]).command, Some(Commands::Snapshot)));
    }
}
