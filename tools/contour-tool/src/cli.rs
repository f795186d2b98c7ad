//! CLI commands for contour-tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contour_core::format::{read_contours, write_contours};
use contour_core::ContourSet;
use contour_join::{ContourJoiner, JoinConfig, JoiningOrder};

use crate::json::{describe, records_to_set, set_to_records, ContourRecord};

#[derive(Parser)]
#[command(name = "contour-tool")]
#[command(about = "Convert, pack and join .ctrs contour files", long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a JSON array of contours into a .ctrs file
    Import {
        /// Input JSON file
        input: PathBuf,
        /// Output .ctrs file
        output: PathBuf,
    },

    /// Convert a .ctrs file into a JSON array of contours
    Export {
        /// Input .ctrs file
        input: PathBuf,
        /// Output JSON file
        output: PathBuf,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Pack every contour into its minimal vertex list
    Pack {
        input: PathBuf,
        output: PathBuf,
    },

    /// Unpack every contour into unit steps
    Unpack {
        input: PathBuf,
        output: PathBuf,
        /// Allow diagonal unit steps
        #[arg(long)]
        diagonal: bool,
    },

    /// Map every point through `v * scale + shift`
    Transform {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
        scale_x: f64,
        #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
        scale_y: f64,
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        shift_x: f64,
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        shift_y: f64,
        /// Drop contours collapsing to zero width or height
        #[arg(long)]
        remove_degenerated: bool,
    },

    /// Join fragments sharing a label into maximal contours
    Join {
        input: PathBuf,
        output: PathBuf,
        /// JSON join configuration; flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,
        /// Visited grid step logarithm (0 disables the grid, default: automatic)
        #[arg(long)]
        grid_step_log: Option<u32>,
        /// Candidate order: unordered, natural, small-first, large-first
        #[arg(long)]
        order: Option<JoiningOrder>,
        /// Keep output contours unpacked
        #[arg(long)]
        no_pack: bool,
        /// Label of every contour when no label map is configured
        #[arg(long)]
        default_label: Option<i32>,
        /// Print join statistics as JSON on stdout
        #[arg(long)]
        stats: bool,
    },

    /// Print label, flags, rectangle, point count and doubled area of every contour
    Info {
        input: PathBuf,
        /// Print a JSON array instead of text lines
        #[arg(long)]
        json: bool,
    },
}

fn load(path: &Path) -> Result<ContourSet> {
    let set = read_contours(path).with_context(|| format!("reading {}", path.display()))?;
    tracing::debug!(path = %path.display(), contours = set.len(), "loaded contours");
    Ok(set)
}

fn save(path: &Path, set: &ContourSet) -> Result<()> {
    write_contours(path, set).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), contours = set.len(), "saved contours");
    Ok(())
}

fn load_join_config(path: Option<&Path>) -> Result<JoinConfig> {
    let Some(path) = path else {
        return Ok(JoinConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Import { input, output } => {
                let text = fs::read_to_string(&input)
                    .with_context(|| format!("reading {}", input.display()))?;
                let records: Vec<ContourRecord> = serde_json::from_str(&text)
                    .with_context(|| format!("parsing {}", input.display()))?;
                save(&output, &records_to_set(&records)?)
            }
            Commands::Export {
                input,
                output,
                pretty,
            } => {
                let records = set_to_records(&load(&input)?)?;
                let text = if pretty {
                    serde_json::to_string_pretty(&records)?
                } else {
                    serde_json::to_string(&records)?
                };
                fs::write(&output, text).with_context(|| format!("writing {}", output.display()))
            }
            Commands::Pack { input, output } => save(&output, &load(&input)?.pack_contours()?),
            Commands::Unpack {
                input,
                output,
                diagonal,
            } => save(&output, &load(&input)?.unpack_contours(diagonal)?),
            Commands::Transform {
                input,
                output,
                scale_x,
                scale_y,
                shift_x,
                shift_y,
                remove_degenerated,
            } => {
                let set = load(&input)?;
                let result =
                    set.transform_contours(scale_x, scale_y, shift_x, shift_y, remove_degenerated)?;
                save(&output, &result)
            }
            Commands::Join {
                input,
                output,
                config,
                grid_step_log,
                order,
                no_pack,
                default_label,
                stats,
            } => {
                let mut join_config = load_join_config(config.as_deref())?;
                if grid_step_log.is_some() {
                    join_config.grid_step_log = grid_step_log;
                }
                if let Some(order) = order {
                    join_config.joining_order = order;
                }
                if no_pack {
                    join_config.pack_result = false;
                }
                if let Some(label) = default_label {
                    join_config.default_joined_label = label;
                }

                let set = load(&input)?;
                let start = Instant::now();
                let mut joiner = ContourJoiner::with_config(&set, &join_config)?;
                let result = joiner.join_contours()?;
                tracing::info!(
                    input = set.len(),
                    output = result.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "join finished"
                );
                save(&output, &result)?;
                if stats {
                    println!("{}", serde_json::to_string_pretty(joiner.stats())?);
                }
                Ok(())
            }
            Commands::Info { input, json } => {
                let info = describe(&load(&input)?)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    for c in &info {
                        let r = c.rectangle;
                        println!(
                            "#{}: label {}{}{}, rectangle {}..{} x {}..{}, {} points, \
                             doubled area {}",
                            c.index,
                            c.label,
                            if c.internal { ", internal" } else { "" },
                            c.frame_id.map(|f| format!(", frame {f}")).unwrap_or_default(),
                            r.min_x,
                            r.max_x,
                            r.min_y,
                            r.max_y,
                            c.points,
                            c.doubled_area
                        );
                    }
                }
                Ok(())
            }
        }
    }
}
