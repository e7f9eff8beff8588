use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::BridgeConfig;
use crate::logging::init_tracing;
use crate::model::RowId;
use crate::runtime::AppContext;
use crate::selection::HiliteHandler;

use super::shell;
use super::types::{Cli, Commands, RowPosition};

pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { config, table } => {
            let app = AppContext::load(&config).map_err(|error| error.to_string())?;
            let table = app.load_table(&table).map_err(|error| error.to_string())?;
            let session = app
                .open_session(&table, Arc::new(HiliteHandler::new()))
                .map_err(|error| error.to_string())?;
            match session.start_server() {
                Ok(status) => eprintln!("{status}"),
                Err(error) => eprintln!("{error}"),
            }
            shell::run(&session, io::stdin().lock(), io::stdout().lock())
                .map_err(|error| error.to_string())?;
            session.close();
        }
        Commands::Lookup {
            config,
            table,
            ilastik_id,
            time,
        } => {
            let app = AppContext::load(&config).map_err(|error| error.to_string())?;
            let table = app.load_table(&table).map_err(|error| error.to_string())?;
            let index = app.build_index(&table).map_err(|error| error.to_string())?;
            let resolved = index
                .lookup_by_ilastik_id_and_time(ilastik_id, time)
                .map(|row| -> Result<RowPosition, String> {
                    Ok(RowPosition {
                        row: row.clone(),
                        position: index
                            .lookup_position(row)
                            .map_err(|error| error.to_string())?,
                    })
                })
                .transpose()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&resolved).map_err(|error| error.to_string())?
            );
        }
        Commands::Headless {
            config,
            project,
            output_dir,
            inputs,
        } => {
            let app = AppContext::load(&config).map_err(|error| error.to_string())?;
            let launcher = app.launcher(project).map_err(|error| error.to_string())?;
            let inputs = inputs
                .iter()
                .map(|input| parse_input(input))
                .collect::<Result<Vec<_>, _>>()?;
            let outcome = launcher
                .run(&inputs, &output_dir)
                .map_err(|error| error.to_string())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&outcome).map_err(|error| error.to_string())?
            );
        }
        Commands::DefaultConfig { yaml } => {
            let config = BridgeConfig::default();
            let serialized = if yaml {
                serde_yaml::to_string(&config).map_err(|error| error.to_string())?
            } else {
                serde_json::to_string_pretty(&config).map_err(|error| error.to_string())?
            };
            println!("{serialized}");
        }
    }

    Ok(())
}

/// `ROW=PATH`, or a bare path keyed by its file stem.
pub(super) fn parse_input(input: &str) -> Result<(RowId, PathBuf), String> {
    if let Some((row, path)) = input.split_once('=') {
        if row.is_empty() || path.is_empty() {
            return Err(format!("invalid input `{input}`, expected ROW=PATH"));
        }
        return Ok((RowId::from(row), PathBuf::from(path)));
    }
    let path = PathBuf::from(input);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format!("cannot derive a row key from `{input}`"))?;
    Ok((RowId::from(stem), path))
}
