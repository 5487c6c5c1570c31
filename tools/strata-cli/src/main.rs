//! Strata CLI — Command-line interface for timeline plans.
//!
//! Usage:
//!   strata render <PLAN> --assets <TABLE> -o <OUT>   Render a plan to one video file
//!   strata plan <PLAN>                              Print the segmentation plan
//!   strata validate <PLAN> [--assets <TABLE>]       Validate a plan and its assets
//!   strata compose <COMPOSITION> [-o <PLAN>]        Convert an editor composition
//!   strata edl <SOURCE> <EDL> -o <OUT>              Cut a single source by an EDL
//!   strata probe <FILE>                             Show media information
//!   strata check                                    Check encoder availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strata_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "Timeline compositing and rendering for layered video plans",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/strata/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a plan to a single video file
    Render {
        /// Path to the render plan (JSON)
        plan: PathBuf,

        /// Asset table mapping source keys to files
        #[arg(short, long)]
        assets: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,

        /// Intervals composited at once (defaults to the configured limit)
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Print the segmentation plan as JSON
    Plan {
        /// Path to the render plan (JSON)
        plan: PathBuf,
    },

    /// Validate a plan and report unresolved assets
    Validate {
        /// Path to the render plan (JSON)
        plan: PathBuf,

        /// Asset table to resolve sources against
        #[arg(short, long)]
        assets: Option<PathBuf>,
    },

    /// Convert an editor composition into a render plan
    Compose {
        /// Path to the composition document (JSON)
        composition: PathBuf,

        /// Write the plan here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit the single-source EDL instead of a render plan
        #[arg(long)]
        edl: bool,
    },

    /// Cut and join one source file by an edit decision list
    Edl {
        /// Source media file
        source: PathBuf,

        /// Path to the EDL (JSON)
        edl: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "output.mp4")]
        output: PathBuf,
    },

    /// Show media information
    Probe {
        /// Media file to inspect
        file: PathBuf,
    },

    /// Check encoder availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load(),
    };

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    strata_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Render {
            plan,
            assets,
            output,
            concurrency,
        } => commands::render::run(&config, plan, assets, output, concurrency).await,
        Commands::Plan { plan } => commands::plan::run(plan),
        Commands::Validate { plan, assets } => commands::validate::run(plan, assets),
        Commands::Compose {
            composition,
            output,
            edl,
        } => commands::compose::run(composition, output, edl),
        Commands::Edl {
            source,
            edl,
            output,
        } => commands::edl::run(&config, source, edl, output).await,
        Commands::Probe { file } => commands::probe::run(&config, file).await,
        Commands::Check => commands::check::run(&config),
    }
}
