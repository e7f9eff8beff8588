use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::model::{PositionEntry, RowId};

#[derive(Debug, Parser)]
#[command(
    name = "ilastik-bridge",
    version,
    about = "Hilite synchronization between a data table and the ilastik viewer"
)]
pub(super) struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    pub(super) verbose: bool,

    #[command(subcommand)]
    pub(super) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Opens a hilite session over the table and reads commands from stdin.
    Serve {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        table: PathBuf,
    },
    /// Resolves the row ilastik means by an object id and time step.
    Lookup {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        table: PathBuf,
        #[arg(long)]
        ilastik_id: i64,
        #[arg(long)]
        time: i64,
    },
    /// Runs the configured project headless. Inputs are `ROW=PATH` or a path whose
    /// file stem is the row key.
    Headless {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        project: Option<PathBuf>,
        #[arg(long)]
        output_dir: PathBuf,
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    DefaultConfig {
        #[arg(long)]
        yaml: bool,
    },
}

#[derive(Debug, Serialize)]
pub(super) struct RowPosition {
    pub(super) row: RowId,
    pub(super) position: PositionEntry,
}
