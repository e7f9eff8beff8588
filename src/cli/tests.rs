use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::HiliteSettings;
use crate::model::{MatchMode, PositionColumns, RowId, Table};
use crate::selection::{HiliteHandler, HostSelection};
use crate::sync::SyncController;

use super::runner::parse_input;
use super::shell::{self, ShellCommand};
use super::types::{Cli, Commands};

fn session() -> SyncController<HiliteHandler> {
    let table = Table::new(vec!["t".into(), "id".into(), "label".into()])
        .with_row("r0", vec![Some(0.0), Some(7.0), Some(1.0)])
        .with_row("r1", vec![Some(1.0), Some(7.0), Some(2.0)]);
    let columns = PositionColumns {
        time: Some("t".into()),
        ilastik_id: Some("id".into()),
        ..PositionColumns::default()
    };
    let settings = HiliteSettings {
        server_port: 0,
        forward_hilites: false,
        ..HiliteSettings::default()
    };
    SyncController::open(&table, &columns, &settings, Arc::new(HiliteHandler::new()))
        .expect("session")
}

fn transcript(session: &SyncController<HiliteHandler>, script: &str) -> String {
    let mut output = Vec::new();
    shell::run(session, script.as_bytes(), &mut output).expect("shell");
    String::from_utf8(output).expect("utf8")
}

#[test]
fn shell_lines_parse_into_commands() {
    assert_eq!(
        shell::parse("hilite r0"),
        Ok(Some(ShellCommand::Hilite(RowId::from("r0"))))
    );
    assert_eq!(shell::parse("   "), Ok(None));
    assert_eq!(shell::parse("# comment"), Ok(None));
    assert_eq!(shell::parse("quit"), Ok(Some(ShellCommand::Quit)));
    assert_eq!(
        shell::parse("query --any t=1 label=2"),
        Ok(Some(ShellCommand::Query {
            mode: MatchMode::Any,
            predicates: BTreeMap::from([("label".to_string(), 2), ("t".to_string(), 1)]),
        }))
    );
}

#[test]
fn malformed_shell_lines_are_rejected() {
    assert!(shell::parse("hilite").is_err());
    assert!(shell::parse("focus a b").is_err());
    assert!(shell::parse("unfocus now").is_err());
    assert!(shell::parse("query").is_err());
    assert!(shell::parse("query t=one").is_err());
    assert!(shell::parse("launch").is_err());
}

#[test]
fn shell_drives_a_session() {
    let session = session();
    let output = transcript(
        &session,
        "hilite r1\nfocus r1\nlist\nfocus r0\nunfocus\nquery label=1\nclear\nlist\nquit\nhilite r0\n",
    );
    let lines = output.lines().collect::<Vec<_>>();

    assert_eq!(lines[0], "hilited r1");
    assert!(lines[1].starts_with("focused r1"));
    assert_eq!(lines[2], "* r1 id=7 t=1 x=0 y=0 z=0");
    assert!(lines[3].starts_with("error: "));
    assert_eq!(lines[4], "unfocused r1");
    assert_eq!(lines[5], "hilited 1 matching row(s)");
    assert_eq!(lines[6], "cleared");
    assert_eq!(lines[7], "no hilited rows");
    assert_eq!(lines.len(), 8);
    assert!(session.host().current_selection().is_empty());
}

#[test]
fn shell_reports_server_status() {
    let session = session();
    let output = transcript(&session, "status\nstop\n");
    assert_eq!(
        output,
        "Server currently not running\nServer currently not running\n"
    );
}

#[test]
fn unknown_rows_do_not_end_the_shell() {
    let session = session();
    let output = transcript(&session, "hilite nope\nhilite r0\n");
    let lines = output.lines().collect::<Vec<_>>();
    assert!(lines[0].contains("not part of the position index"));
    assert_eq!(lines[1], "hilited r0");
}

#[test]
fn headless_inputs_accept_keys_or_stems() {
    assert_eq!(
        parse_input("Row3=/data/cell.tif"),
        Ok((RowId::from("Row3"), PathBuf::from("/data/cell.tif")))
    );
    assert_eq!(
        parse_input("/data/Row7.png"),
        Ok((RowId::from("Row7"), PathBuf::from("/data/Row7.png")))
    );
    assert!(parse_input("=/data/cell.tif").is_err());
}

#[test]
fn command_line_parses_subcommands() {
    let cli = Cli::try_parse_from([
        "ilastik-bridge",
        "lookup",
        "--config",
        "bridge.yaml",
        "--table",
        "objects.json",
        "--ilastik-id",
        "7",
        "--time",
        "2",
    ])
    .expect("parse");
    assert!(!cli.verbose);
    assert!(matches!(
        cli.command,
        Commands::Lookup {
            ilastik_id: 7,
            time: 2,
            ..
        }
    ));

    let cli = Cli::try_parse_from(["ilastik-bridge", "default-config", "--yaml", "-v"])
        .expect("parse");
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::DefaultConfig { yaml: true }));

    assert!(Cli::try_parse_from(["ilastik-bridge", "headless", "--config", "c.json"]).is_err());
}
