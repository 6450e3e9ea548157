//! CLI entry point for the `nodal` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use nodal_strength::cli::commands::{self, OutputTargets};
use nodal_strength::config::load_config;
use nodal_strength::engine::{
    AggregationMode, Direction, Metric, PipelineParams, RankingKey, Scenario,
};
use nodal_strength::types::{
    Modality, NodalError, NodalResult, DEFAULT_HOMOLOGY_GROUP, DEFAULT_NUM_REGIONS,
};

#[derive(Parser)]
#[command(
    name = "nodal",
    about = "Nodal strength brain maps from dynamic-violation and scaffold frames"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SelectionArgs {
    /// Input modality: dv or scaffold
    #[arg(long)]
    mode: String,
    /// DV containers (dv) or scaffold directories (scaffold), one per subject
    #[arg(long, num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,
    /// Scenario: single_frame, all_frames, top_percent
    #[arg(long, default_value = "single_frame")]
    scenario: String,
    /// Frame for single_frame
    #[arg(long)]
    frame: Option<u32>,
    /// Fraction of frames for top_percent, in (0, 1]
    #[arg(long, default_value = "0.15")]
    percent: f64,
    /// Ranking table for top_percent
    #[arg(long)]
    ranking_table: Option<PathBuf>,
    /// Number of brain regions
    #[arg(long, default_value_t = DEFAULT_NUM_REGIONS)]
    num_regions: usize,
    /// Ranking metric: coherence (high) or complexity (low)
    #[arg(long)]
    metric: Option<String>,
    /// Custom ranking column, overriding --metric
    #[arg(long)]
    ranking_column: Option<usize>,
    /// Direction for --ranking-column: high or low
    #[arg(long, default_value = "high")]
    direction: String,
    /// Scaffold homology group
    #[arg(long, default_value_t = DEFAULT_HOMOLOGY_GROUP)]
    homology_group: u32,
    /// Averaging: pooled or subject_mean
    #[arg(long, default_value = "pooled")]
    aggregation: String,
    /// Extract pairs in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a nodal strength map and save it
    Compute {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output vector path (.npy, .json, or text)
        #[arg(long)]
        output: PathBuf,
        /// Image path handed to the renderer
        #[arg(long)]
        output_img: Option<PathBuf>,
        /// Renderer program, called as `<renderer> <vector> <image>`
        #[arg(long)]
        renderer: Option<String>,
    },
    /// Run a pipeline described by a TOML config file
    Run {
        /// Path to the TOML config
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the frames a selection would process
    Frames {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// Display information about a .dvc container
    Info {
        /// Path to the .dvc file
        file: PathBuf,
    },
    /// Build a .dvc container from JSON frames
    Pack {
        /// JSON file: {"<frame>": [[i, j, weight_sum, count], ...]}
        json_file: PathBuf,
        /// Path to the .dvc file to create
        file: PathBuf,
    },
}

impl SelectionArgs {
    fn modality(&self) -> NodalResult<Modality> {
        Modality::from_name(&self.mode)
            .ok_or_else(|| NodalError::Configuration(format!("Unknown mode: {:?}", self.mode)))
    }

    fn to_params(&self) -> NodalResult<PipelineParams> {
        let metric = match &self.metric {
            Some(m) => Some(Metric::from_name(m).ok_or_else(|| {
                NodalError::Configuration(format!("Unknown metric: {:?}", m))
            })?),
            None => None,
        };
        let ranking_key = match self.ranking_column {
            Some(column) => {
                let direction = Direction::from_name(&self.direction).ok_or_else(|| {
                    NodalError::Configuration(format!("Unknown direction: {:?}", self.direction))
                })?;
                Some(RankingKey::new(column, direction))
            }
            None => None,
        };
        let aggregation = AggregationMode::from_name(&self.aggregation).ok_or_else(|| {
            NodalError::Configuration(format!("Unknown aggregation: {:?}", self.aggregation))
        })?;

        Ok(PipelineParams {
            scenario: Scenario::parse(&self.scenario)?,
            frame: self.frame,
            percent: self.percent,
            ranking_table: self.ranking_table.clone(),
            num_regions: self.num_regions,
            metric,
            ranking_key,
            homology_group: self.homology_group,
            aggregation,
            parallel: self.parallel,
        })
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compute {
            selection,
            output,
            output_img,
            renderer,
        } => selection.modality().and_then(|modality| {
            let params = selection.to_params()?;
            let targets = OutputTargets {
                output,
                output_img,
                renderer,
            };
            commands::cmd_compute(modality, &selection.inputs, &params, &targets, json)
        }),
        Commands::Run { config } => {
            load_config(&config).and_then(|cfg| commands::cmd_run(&cfg, json))
        }
        Commands::Frames { selection } => selection.modality().and_then(|modality| {
            let params = selection.to_params()?;
            commands::cmd_frames(modality, &selection.inputs, &params, json)
        }),
        Commands::Info { file } => commands::cmd_info(&file, json),
        Commands::Pack { json_file, file } => commands::cmd_pack(&json_file, &file, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            NodalError::Io(_) | NodalError::Npy(_) => 1,
            NodalError::InvalidMagic
            | NodalError::UnsupportedVersion(_)
            | NodalError::Truncated
            | NodalError::Corrupt(_)
            | NodalError::Compression(_)
            | NodalError::Json(_) => 2,
            NodalError::Configuration(_)
            | NodalError::RankingTableNotFound(_)
            | NodalError::RankingTableShape { .. }
            | NodalError::NoFramesFound(_)
            | NodalError::EmptyIntersection => 3,
            NodalError::NoValidResults { .. } => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
