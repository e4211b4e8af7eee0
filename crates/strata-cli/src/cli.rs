use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use strata_layout::{Direction, LayoutState, TierId, tier_for_y};

use crate::error::{CliError, Result};
use crate::replay::{load_trace, replay};
use crate::scene::{Scene, load_config};

#[derive(Debug, Parser)]
#[command(
    name = "strata",
    about = "Tier band layout, classification, and drag replay for belief-graph canvases",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Scene file (`{"tiers": [...], "nodes": [...]}`). Defaults to an empty canvas.
    #[arg(long, global = true)]
    pub scene: Option<PathBuf>,

    /// Layout configuration (TOML for `.toml`, JSON otherwise).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured canvas height.
    #[arg(long, global = true)]
    pub canvas_height: Option<f64>,

    /// Write the updated scene here after mutating commands.
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Report errors as JSON on stderr.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the band for every tier.
    Bands,

    /// Print the tier owning a vertical position.
    Classify {
        #[arg(long, allow_hyphen_values = true)]
        y: f64,
    },

    /// Snap foundational nodes to their grid slots.
    Layout,

    /// Edit the tier list.
    Tiers {
        #[command(subcommand)]
        action: TierCommand,
    },

    /// Replay a drag trace against the scene.
    Replay {
        #[arg(long)]
        trace: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum TierCommand {
    /// Append a custom tier.
    Add,

    /// Remove the top custom tier and migrate its nodes.
    Remove,

    /// Reorder a custom tier.
    Move {
        #[arg(long)]
        tier: String,

        /// Target index among custom tiers.
        #[arg(long, conflicts_with = "direction")]
        index: Option<usize>,

        /// Swap with a neighbour instead.
        #[arg(long, value_enum)]
        direction: Option<DirectionArg>,
    },

    /// Rename a custom tier.
    Rename {
        #[arg(long)]
        tier: String,

        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

/// Run a parsed command, writing JSON to stdout.
pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

/// Run a parsed command, writing JSON to `out`.
pub fn run_with_output(cli: Cli, out: &mut impl Write) -> Result<()> {
    let global = cli.global;
    let config = load_config(global.config.as_deref(), global.canvas_height)?;
    let scene = Scene::load_or_default(global.scene.as_deref())?;
    let mut state = scene.into_state(config);

    let (report, mutated) = match cli.command {
        Commands::Bands => (serde_json::to_value(state.bands())?, false),
        Commands::Classify { y } => {
            let tier_id = tier_for_y(y, state.bands());
            (json!({ "y": y, "tier_id": tier_id }), false)
        }
        Commands::Layout => {
            let corrections = state.relayout_foundation();
            (json!({ "corrections": corrections }), true)
        }
        Commands::Tiers { action } => (run_tier_command(&mut state, action)?, true),
        Commands::Replay { trace } => {
            let events = load_trace(&trace)?;
            let outcome = replay(&mut state, &events);
            (
                json!({
                    "transitions": outcome.transitions,
                    "corrections": outcome.corrections,
                    "nodes": state.nodes(),
                }),
                true,
            )
        }
    };

    if mutated {
        if let Some(path) = &global.out {
            Scene::from_state(&state).save(path)?;
            tracing::info!(target: "strata.cli", path = %path.display(), "scene written");
        }
    }

    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

fn run_tier_command(state: &mut LayoutState, action: TierCommand) -> Result<Value> {
    let report = match action {
        TierCommand::Add => {
            let corrections = state.add_tier();
            json!({ "tiers": state.tiers(), "corrections": corrections })
        }
        TierCommand::Remove => {
            let migration = state.remove_top_tier()?;
            json!({
                "tiers": state.tiers(),
                "removed_tier_id": migration.removed_tier_id,
                "target_tier_id": migration.target_tier_id,
                "corrections": migration.corrections,
            })
        }
        TierCommand::Move {
            tier,
            index,
            direction,
        } => {
            let tier_id = TierId::new(tier);
            let changed = match (index, direction) {
                (Some(index), _) => state.move_tier_to_index(&tier_id, index),
                (None, Some(direction)) => state.move_tier(&tier_id, direction.into()),
                (None, None) => {
                    return Err(CliError::invalid("tiers move needs --index or --direction"));
                }
            };
            json!({ "tiers": state.tiers(), "changed": changed, "corrections": [] })
        }
        TierCommand::Rename { tier, name } => {
            let changed = state.rename_tier(&TierId::new(tier), &name);
            json!({ "tiers": state.tiers(), "changed": changed, "corrections": [] })
        }
    };
    Ok(report)
}
