//! `assembly-line` -- the factory assembly line simulator.
//!
//! Usage:
//!   assembly-line <STATIONS1> <STATIONS2> <ORDERS> <LINE>
//!   assembly-line --config line.toml [--json]
//!   assembly-line                      (interactive menu)
//!
//! Logs go to stderr; stdout carries only the trace and reports.

mod interactive;
mod report;

use anyhow::Context;
use assembly_core::query::RunReport;
use assembly_core::sim::Ticks;
use assembly_data::{LineConfig, Scenario, SourceConfig};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Factory assembly line simulator.
#[derive(Parser, Debug)]
#[command(name = "assembly-line", about = "Factory assembly line simulator")]
struct Cli {
    /// Run configuration file (.ron, .toml or .json).
    #[arg(short = 'c', long = "config", conflicts_with = "files")]
    config: Option<PathBuf>,

    /// Stations file 1, stations file 2, customer orders file, assembly line file.
    #[arg(num_args = 4, value_names = ["STATIONS1", "STATIONS2", "ORDERS", "LINE"])]
    files: Vec<PathBuf>,

    /// Field delimiter of the first stations file.
    #[arg(long, default_value_t = ',')]
    stations1_delimiter: char,

    /// Field delimiter of the second stations file.
    #[arg(long, default_value_t = '|')]
    stations2_delimiter: char,

    /// Field delimiter of the orders file.
    #[arg(long, default_value_t = '|')]
    orders_delimiter: char,

    /// Field delimiter of the assembly line file.
    #[arg(long, default_value_t = '|')]
    line_delimiter: char,

    /// Give up if the line has not drained after this many ticks.
    #[arg(long)]
    max_ticks: Option<Ticks>,

    /// Keep the line in file order instead of chain order.
    #[arg(long)]
    no_reorder: bool,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Log at debug level (overrides RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// The batch configuration, or `None` for interactive mode.
    fn line_config(&self) -> anyhow::Result<Option<LineConfig>> {
        let mut config = match (&self.config, self.files.as_slice()) {
            (Some(path), _) => LineConfig::load(path)
                .with_context(|| format!("cannot load configuration {}", path.display()))?,
            (None, [stations1, stations2, orders, line]) => LineConfig {
                stations: vec![
                    SourceConfig::new(stations1, self.stations1_delimiter),
                    SourceConfig::new(stations2, self.stations2_delimiter),
                ],
                orders: SourceConfig::new(orders, self.orders_delimiter),
                topology: SourceConfig::new(line, self.line_delimiter),
                max_ticks: None,
                reorder: true,
            },
            (None, _) => return Ok(None),
        };

        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
        if self.no_reorder {
            config.reorder = false;
        }
        Ok(Some(config))
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_batch(config: &LineConfig, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let scenario = Scenario::load(config)?;
    let (mut line, mut ctx) = scenario
        .build(config.reorder)
        .context("cannot configure assembly line")?;
    let max_ticks = config.max_ticks.unwrap_or(Ticks::MAX);

    if json {
        let summary = line.run(&mut ctx, max_ticks)?;
        let report = RunReport::collect(&line, &ctx, Some(summary));
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    let trace = report::Trace::attach(&mut line);
    writeln!(out, "\nRunning simulation...")?;
    let result = line.run(&mut ctx, max_ticks);
    trace.flush(out)?;
    result?;

    report::write_results(out, &line, &ctx)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.line_config()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(config) = config {
        if !cli.json {
            writeln!(out, "Factory Assembly Line Simulator")?;
            writeln!(out, "================================")?;
        }
        run_batch(&config, cli.json, &mut out)?;
    } else {
        writeln!(out, "Factory Assembly Line Simulator")?;
        writeln!(out, "================================")?;
        let max_ticks = cli.max_ticks.unwrap_or(Ticks::MAX);
        interactive::Session::new(io::stdin().lock(), out, max_ticks).run()?;
    }
    Ok(())
}
