use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use lazy_deque::report::{self, OutputFormat};
use lazy_deque::workload::{Simulator, Workload};
use lazy_deque::DequeConfig;

mod version;

fn format_help_text() -> String {
    let formats = OutputFormat::all_formats()
        .iter()
        .map(|format| format.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!("Output format (available: {})", formats)
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str(s).ok_or_else(|| {
        let available = OutputFormat::all_formats()
            .iter()
            .map(|format| format.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Invalid format '{}'. Available formats: {}", s, available)
    })
}

#[derive(Parser)]
#[command(name = "lazy-deque")]
#[command(about = "Drive a lazily deallocated deque through a workload and trace its capacity")]
#[command(version = version::release())]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Workload file (JSON). Runs the built-in burst-then-drain workload if not specified.
    #[arg(short, long)]
    workload: Option<PathBuf>,

    /// Shrink evaluation tick in milliseconds
    #[arg(short, long, default_value = "1000")]
    update_interval: u64,

    /// Capacity of the first ring and of rings added at the front
    #[arg(long)]
    min_ring_size: Option<usize>,

    /// Minimum time between shrink evaluations in milliseconds
    #[arg(long)]
    shrink_interval_ms: Option<u64>,

    /// Slack required between capacity and the shrink target before reallocating
    #[arg(long)]
    reclaim_threshold: Option<usize>,

    /// Number of trace samples to keep
    #[arg(long, default_value = "1000")]
    history: usize,

    /// Advance a simulated clock instead of sleeping through idle phases
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[arg(short, long, default_value = "text", value_parser = parse_format, help = format_help_text())]
    format: OutputFormat,
}

#[derive(Parser)]
pub enum Commands {
    /// Show detailed version information
    VersionInfo,
    /// Print the built-in workload as JSON
    DefaultWorkload,
}

impl Cli {
    /// Workload settings first, then any flags given on the command line.
    fn deque_config(&self, workload: &Workload) -> DequeConfig {
        let mut config = workload.config.clone().unwrap_or_default();
        if let Some(min_ring_size) = self.min_ring_size {
            config = config.with_min_ring_size(min_ring_size);
        }
        if let Some(millis) = self.shrink_interval_ms {
            config = config.with_shrink_interval(Duration::from_millis(millis));
        }
        if let Some(reclaim_threshold) = self.reclaim_threshold {
            config = config.with_reclaim_threshold(reclaim_threshold);
        }
        config
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    // Handle subcommands
    if let Some(command) = &cli.command {
        match command {
            Commands::VersionInfo => {
                version::print_version_info();
                return Ok(());
            }
            Commands::DefaultWorkload => {
                println!("{}", Workload::burst_then_drain().to_json()?);
                return Ok(());
            }
        }
    }

    let workload = match &cli.workload {
        Some(path) => Workload::load(path)?,
        None => Workload::burst_then_drain(),
    };
    let config = cli.deque_config(&workload);
    config.validate().context("invalid deque configuration")?;
    log::debug!("deque config: {:?}", config);

    let update_interval = Duration::from_millis(cli.update_interval);
    let samples = if cli.dry_run {
        let mut simulator = Simulator::simulated(config, update_interval, cli.history)?;
        simulator.run(&workload).await?;
        simulator.samples()
    } else {
        let mut simulator = Simulator::realtime(config, update_interval, cli.history)?;
        simulator.run(&workload).await?;
        simulator.samples()
    };

    println!("{}", report::render(&samples, cli.format)?);

    Ok(())
}
