//! runreport - experiment run aggregation CLI
//!
//! ## Commands
//!
//! - `analyze`: Build the results table from run directories
//! - `discover`: List the run directories found and those skipped

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

use runreport_core::render::ReportArtifact;
use runreport_core::{
    generate_report, generate_report_concurrent, render_text, write_csv, write_json,
    write_latex, ColumnRegistry, Discovery, Report, ReportConfig, RunRecordLoader,
};

#[derive(Parser)]
#[command(name = "runreport")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Aggregate experiment runs into a results table", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse run directories and print or export the results table
    Analyze(AnalyzeArgs),

    /// List run directories that would be analyzed
    Discover {
        /// Root directories to search (default: output/sacred/train)
        #[arg(
            short = 's',
            long = "source-dir",
            env = "RUNREPORT_SOURCE_DIRS",
            value_delimiter = ','
        )]
        source_dirs: Vec<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct AnalyzeArgs {
    /// JSON config file; flags override its values
    #[arg(short, long, env = "RUNREPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Root directories to search for runs
    #[arg(
        short = 's',
        long = "source-dir",
        env = "RUNREPORT_SOURCE_DIRS",
        value_delimiter = ','
    )]
    source_dirs: Vec<PathBuf>,

    /// Only include runs with this experiment name
    #[arg(long, env = "RUNREPORT_RUN_NAME")]
    run_name: Option<String>,

    /// Only include runs for this environment
    #[arg(long, env = "RUNREPORT_ENV_NAME")]
    env_name: Option<String>,

    /// Drop runs whose status is FAILED
    #[arg(long)]
    skip_failed_runs: bool,

    /// Column verbosity: 0 is the most compact, 2 and above show everything
    #[arg(short = 't', long, env = "RUNREPORT_TABLE_VERBOSITY")]
    table_verbosity: Option<usize>,

    /// Write the table as CSV
    #[arg(long)]
    csv_output: Option<PathBuf>,

    /// Write the table as a LaTeX tabular
    #[arg(long)]
    tex_output: Option<PathBuf>,

    /// Write a JSON report artifact
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Do not print the table to stdout
    #[arg(long)]
    no_print: bool,

    /// Number of run directories to parse concurrently
    #[arg(short, long, env = "RUNREPORT_JOBS")]
    jobs: Option<usize>,
}

impl AnalyzeArgs {
    /// Merge flags over the config file (or defaults).
    fn into_config(self) -> Result<ReportConfig> {
        let mut cfg = match &self.config {
            Some(path) => ReportConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => ReportConfig::default(),
        };
        if !self.source_dirs.is_empty() {
            cfg.source_dirs = self.source_dirs;
        }
        if self.run_name.is_some() {
            cfg.run_name = self.run_name;
        }
        if self.env_name.is_some() {
            cfg.env_name = self.env_name;
        }
        cfg.skip_failed_runs |= self.skip_failed_runs;
        if let Some(v) = self.table_verbosity {
            cfg.table_verbosity = v;
        }
        if self.csv_output.is_some() {
            cfg.csv_output_path = self.csv_output;
        }
        if self.tex_output.is_some() {
            cfg.tex_output_path = self.tex_output;
        }
        if self.json_output.is_some() {
            cfg.json_output_path = self.json_output;
        }
        if self.no_print {
            cfg.print_table = false;
        }
        if let Some(jobs) = self.jobs {
            cfg.jobs = jobs;
        }
        cfg.validate().context("Invalid report configuration")?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    runreport_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Analyze(args) => cmd_analyze(args.into_config()?).await,
        Commands::Discover { source_dirs } => cmd_discover(&source_dirs),
    }
}

async fn cmd_analyze(cfg: ReportConfig) -> Result<()> {
    let registry = ColumnRegistry::standard();
    let report = if cfg.jobs > 1 {
        generate_report_concurrent(&cfg, registry).await
    } else {
        generate_report(&cfg, registry)
    };
    info!(
        loaded = report.loaded,
        rows = report.table.len(),
        skipped = report.failures.len(),
        "report generated"
    );
    emit_outputs(&cfg, &report)
}

fn emit_outputs(cfg: &ReportConfig, report: &Report) -> Result<()> {
    if let Some(path) = &cfg.csv_output_path {
        write_csv(path, &report.table)?;
        println!("Wrote CSV file to {}", path.display());
    }
    if let Some(path) = &cfg.tex_output_path {
        write_latex(path, &report.table)?;
        println!("Wrote TeX file to {}", path.display());
    }
    if let Some(path) = &cfg.json_output_path {
        write_json(path, &ReportArtifact::new(&report.table, &report.failures))?;
        println!("Wrote JSON report to {}", path.display());
    }
    if cfg.print_table {
        print!("{}", render_text(&report.table));
    }
    Ok(())
}

fn cmd_discover(source_dirs: &[PathBuf]) -> Result<()> {
    let roots: Vec<PathBuf> = if source_dirs.is_empty() {
        ReportConfig::default().source_dirs
    } else {
        source_dirs.to_vec()
    };
    let discovery = RunRecordLoader::new(roots).discover();
    print!("{}", discovery_listing(&discovery));
    Ok(())
}

fn discovery_listing(discovery: &Discovery) -> String {
    let mut out = String::new();
    if discovery.dirs.is_empty() {
        out.push_str("No run directories found.\n");
    }
    for dir in &discovery.dirs {
        out.push_str(&format!("{}\n", dir.display()));
    }
    if !discovery.failures.is_empty() {
        out.push_str("\nSkipped:\n");
        for failure in &discovery.failures {
            out.push_str(&format!("  - {}: {}\n", failure.dir.display(), failure.reason()));
        }
    }
    out
}
