use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

use crate::model::{MatchMode, RowId};
use crate::selection::HostSelection;
use crate::sync::SyncController;

const HELP: &str = "commands: hilite <row> | unhilite <row> | focus <row> | unfocus | clear | \
query [--any] <column>=<int>... | list | status | start | stop | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum ShellCommand {
    Hilite(RowId),
    Unhilite(RowId),
    Focus(RowId),
    Unfocus,
    Clear,
    Query {
        mode: MatchMode,
        predicates: BTreeMap<String, i64>,
    },
    List,
    Status,
    Start,
    Stop,
    Help,
    Quit,
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub(super) fn parse(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let rest = words.collect::<Vec<_>>();
    let row = |rest: &[&str]| match rest {
        [row] => Ok(RowId::from(*row)),
        _ => Err(format!("`{name}` expects exactly one row key")),
    };
    let bare = |command: ShellCommand| {
        if rest.is_empty() {
            Ok(command)
        } else {
            Err(format!("`{name}` takes no arguments"))
        }
    };

    let command = match name {
        "hilite" => ShellCommand::Hilite(row(&rest)?),
        "unhilite" => ShellCommand::Unhilite(row(&rest)?),
        "focus" => ShellCommand::Focus(row(&rest)?),
        "unfocus" => bare(ShellCommand::Unfocus)?,
        "clear" => bare(ShellCommand::Clear)?,
        "list" => bare(ShellCommand::List)?,
        "status" => bare(ShellCommand::Status)?,
        "start" => bare(ShellCommand::Start)?,
        "stop" => bare(ShellCommand::Stop)?,
        "help" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "query" => parse_query(&rest)?,
        other => return Err(format!("unknown command `{other}`; {HELP}")),
    };
    Ok(Some(command))
}

fn parse_query(arguments: &[&str]) -> Result<ShellCommand, String> {
    let mut mode = MatchMode::All;
    let mut predicates = BTreeMap::new();
    for argument in arguments {
        if *argument == "--any" {
            mode = MatchMode::Any;
            continue;
        }
        let (column, value) = argument
            .split_once('=')
            .ok_or_else(|| format!("predicate `{argument}` must be <column>=<int>"))?;
        let value = value
            .parse::<i64>()
            .map_err(|error| format!("predicate `{argument}`: {error}"))?;
        predicates.insert(column.to_string(), value);
    }
    if predicates.is_empty() {
        return Err("`query` needs at least one <column>=<int> predicate".to_string());
    }
    Ok(ShellCommand::Query { mode, predicates })
}

/// Reads commands until `quit` or end of input. Command errors are reported on
/// `output` and do not end the loop.
pub(super) fn run<H, R, W>(session: &SyncController<H>, input: R, mut output: W) -> io::Result<()>
where
    H: HostSelection,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        match parse(&line) {
            Ok(Some(command)) => {
                if !execute(session, command, &mut output)? {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => writeln!(output, "error: {message}")?,
        }
        output.flush()?;
    }
    Ok(())
}

/// Runs one command; returns `false` once the session should end.
pub(super) fn execute<H, W>(
    session: &SyncController<H>,
    command: ShellCommand,
    output: &mut W,
) -> io::Result<bool>
where
    H: HostSelection,
    W: Write,
{
    let outcome: Result<String, String> = match command {
        ShellCommand::Hilite(row) => session
            .hilite(&row)
            .map(|()| format!("hilited {row}"))
            .map_err(|error| error.to_string()),
        ShellCommand::Unhilite(row) => session
            .unhilite(&row)
            .map(|()| format!("unhilited {row}"))
            .map_err(|error| error.to_string()),
        ShellCommand::Focus(row) => session
            .focus(&row)
            .map(|entry| {
                format!(
                    "focused {row} at x={} y={} z={} c={} t={}",
                    entry.x, entry.y, entry.z, entry.channel, entry.time
                )
            })
            .map_err(|error| error.to_string()),
        ShellCommand::Unfocus => Ok(match session.unfocus() {
            Some(row) => format!("unfocused {row}"),
            None => "nothing focused".to_string(),
        }),
        ShellCommand::Clear => {
            session.clear_hilites();
            Ok("cleared".to_string())
        }
        ShellCommand::Query { mode, predicates } => {
            let count = session.hilite_matching(&predicates, mode);
            Ok(format!("hilited {count} matching row(s)"))
        }
        ShellCommand::List => {
            let focus = session.focused();
            let lines = session
                .hilited_rows()
                .into_iter()
                .map(|(row, entry)| {
                    let marker = if focus.as_ref() == Some(&row) { "*" } else { " " };
                    format!(
                        "{marker} {row} id={} t={} x={} y={} z={}",
                        entry.ilastik_id, entry.time, entry.x, entry.y, entry.z
                    )
                })
                .collect::<Vec<_>>();
            Ok(if lines.is_empty() {
                "no hilited rows".to_string()
            } else {
                lines.join("\n")
            })
        }
        ShellCommand::Status => Ok(session.status().to_string()),
        ShellCommand::Start => session
            .start_server()
            .map(|status| status.to_string())
            .map_err(|error| error.to_string()),
        ShellCommand::Stop => Ok(session.stop_server().to_string()),
        ShellCommand::Help => Ok(HELP.to_string()),
        ShellCommand::Quit => return Ok(false),
    };
    match outcome {
        Ok(message) => writeln!(output, "{message}")?,
        Err(message) => writeln!(output, "error: {message}")?,
    }
    Ok(true)
}
