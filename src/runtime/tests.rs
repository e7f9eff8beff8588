use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;

use crate::config::BridgeConfig;
use crate::headless::HeadlessError;
use crate::model::{RowId, Table};
use crate::selection::HiliteHandler;
use crate::sync::{SessionStatus, SyncError};

use super::{AppContext, AppError};

fn table() -> Table {
    Table::new(vec!["t".into(), "id".into()])
        .with_row("r0", vec![Some(0.0), Some(7.0)])
        .with_row("r1", vec![Some(1.0), Some(7.0)])
}

fn configured() -> AppContext {
    let mut config = BridgeConfig::default();
    config.hilite.server_port = 0;
    config.columns.time = Some("t".into());
    config.columns.ilastik_id = Some("id".into());
    AppContext::new(config)
}

#[test]
fn context_loads_configuration_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bridge.json");
    fs::write(&path, r#"{"columns":{"time":"t","ilastik_id":"id"}}"#).expect("write");

    let app = AppContext::load(&path).expect("load");
    let index = app.build_index(&table()).expect("index");
    assert_eq!(
        index.lookup_by_ilastik_id_and_time(7, 1),
        Some(&RowId::from("r1"))
    );
}

#[test]
fn unconfigured_columns_fail_fast() {
    let app = AppContext::default();
    assert!(matches!(app.build_index(&table()), Err(AppError::Model(_))));
    assert!(matches!(
        app.open_session(&table(), Arc::new(HiliteHandler::new())),
        Err(AppError::Sync(SyncError::Configuration(_)))
    ));
}

#[test]
fn session_opens_stopped() {
    let app = configured();
    let session = app
        .open_session(&table(), Arc::new(HiliteHandler::new()))
        .expect("session");
    assert_eq!(session.status(), SessionStatus::Stopped);
    assert_eq!(session.index().len(), 2);
}

#[test]
fn launcher_project_can_be_overridden() {
    let mut app = configured();
    assert!(matches!(
        app.launcher(None),
        Err(AppError::Headless(HeadlessError::MissingExecutable))
    ));

    let mut config = app.config().clone();
    config.headless.executable = Some(PathBuf::from("ilastik"));
    config.headless.project = Some(PathBuf::from("configured.ilp"));
    app = AppContext::new(config);

    let launcher = app.launcher(None).expect("launcher");
    assert_eq!(launcher.project(), PathBuf::from("configured.ilp"));
    let launcher = app
        .launcher(Some(PathBuf::from("override.ilp")))
        .expect("launcher");
    assert_eq!(launcher.project(), PathBuf::from("override.ilp"));
}
