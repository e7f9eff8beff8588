use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::HiliteSettings;
use crate::hilite::{DefaultHiliteClient, HiliteClient, HiliteServer, ServerStatus};
use crate::logging::{BridgeLog, TracingLog};
use crate::model::{MatchMode, PositionColumns, PositionEntry, PositionIndex, RowId, Table};
use crate::selection::{
    HiliteEvent, HostSelection, ListenerId, Origin, SelectionChange, SelectionState,
};

use super::relay::{HostRelay, apply_inbound, lock};
use super::{Result, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    pub keep_others: bool,
    pub forward_hilites: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            keep_others: true,
            forward_hilites: true,
        }
    }
}

impl From<&HiliteSettings> for SyncOptions {
    fn from(settings: &HiliteSettings) -> Self {
        Self {
            keep_others: settings.keep_others,
            forward_hilites: settings.forward_hilites,
        }
    }
}

struct Subscriptions {
    host: ListenerId,
    server: ListenerId,
}

/// One hilite session between a host table and ilastik.
///
/// Owns the position index and the session selection (the hilited rows shown next
/// to the table plus the row centered in ilastik) and wires both directions:
/// host changes go out through the client, server events come back as host
/// selection changes tagged with `Origin::Ilastik` so they are never echoed.
pub struct SyncController<H: HostSelection> {
    index: Arc<PositionIndex>,
    selection: Arc<Mutex<SelectionState>>,
    host: Arc<H>,
    client: Arc<dyn HiliteClient>,
    server: HiliteServer,
    options: SyncOptions,
    subscriptions: Mutex<Option<Subscriptions>>,
    log: Arc<dyn BridgeLog>,
}

impl<H: HostSelection> fmt::Debug for SyncController<H> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncController")
            .field("rows", &self.index.len())
            .field("hilited", &lock(&self.selection).len())
            .field("status", &self.status())
            .finish()
    }
}

impl<H: HostSelection> SyncController<H> {
    /// Scans `table` and opens a session talking to ilastik on the configured ports.
    /// Fails fast when no position column is configured.
    pub fn open(
        table: &Table,
        columns: &PositionColumns,
        settings: &HiliteSettings,
        host: Arc<H>,
    ) -> Result<Self> {
        columns.ensure_configured()?;
        let index = Arc::new(PositionIndex::build(table, columns)?);
        let client: Arc<dyn HiliteClient> = Arc::new(DefaultHiliteClient::new(
            settings.client_port,
            TracingLog::shared("hilite-client"),
        ));
        Ok(Self::new(
            index,
            host,
            client,
            settings.server_port,
            SyncOptions::from(settings),
            TracingLog::shared("hilite-server"),
        ))
    }

    pub fn new(
        index: Arc<PositionIndex>,
        host: Arc<H>,
        client: Arc<dyn HiliteClient>,
        server_port: u16,
        options: SyncOptions,
        log: Arc<dyn BridgeLog>,
    ) -> Self {
        let server = HiliteServer::new(
            server_port,
            Arc::clone(&client),
            Arc::clone(&index),
            Arc::clone(&log),
        );
        let selection = Arc::new(Mutex::new(SelectionState::from_rows(
            host.current_selection(),
        )));

        let relay = HostRelay {
            index: Arc::clone(&index),
            selection: Arc::clone(&selection),
            client: Arc::clone(&client),
            options,
            log: Arc::clone(&log),
        };
        let host_id = host.subscribe(Arc::new(move |change: &SelectionChange| {
            relay.on_host_change(change)
        }));
        let server_id = {
            let host = Arc::clone(&host);
            server.register_listener(move |event: &HiliteEvent| apply_inbound(host.as_ref(), event))
        };

        Self {
            index,
            selection,
            host,
            client,
            server,
            options,
            subscriptions: Mutex::new(Some(Subscriptions {
                host: host_id,
                server: server_id,
            })),
            log,
        }
    }

    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn server(&self) -> &HiliteServer {
        &self.server
    }

    pub fn start_server(&self) -> Result<SessionStatus> {
        self.server.start_up()?;
        Ok(self.status())
    }

    pub fn stop_server(&self) -> SessionStatus {
        self.server.shut_down();
        self.status()
    }

    pub fn status(&self) -> SessionStatus {
        match self.server.status() {
            ServerStatus::Stopped => SessionStatus::Stopped,
            ServerStatus::Listening { port } if !self.client.is_connected() => {
                SessionStatus::ClientDisconnected { port }
            }
            ServerStatus::Listening { port } => SessionStatus::Listening { port },
        }
    }

    pub fn hilite(&self, row: &RowId) -> Result<()> {
        self.index.lookup_position(row)?;
        self.host.fire_select(row, Origin::Host);
        Ok(())
    }

    pub fn unhilite(&self, row: &RowId) -> Result<()> {
        self.index.lookup_position(row)?;
        self.host.fire_deselect(row, Origin::Host);
        Ok(())
    }

    pub fn clear_hilites(&self) {
        self.host.fire_clear_all(Origin::Host);
    }

    /// Hilites every row matching the column/value predicates.
    pub fn hilite_matching(&self, predicates: &BTreeMap<String, i64>, mode: MatchMode) -> usize {
        let rows = self.index.lookup_by_attributes(predicates, mode);
        for row in &rows {
            self.host.fire_select(row, Origin::Host);
        }
        rows.len()
    }

    /// Centers ilastik's viewer on a hilited row and makes it the focus.
    pub fn focus(&self, row: &RowId) -> Result<PositionEntry> {
        let entry = self.index.lookup_position(row)?;
        lock(&self.selection).set_focus(row)?;
        self.client
            .send_position_changed(&entry, self.options.keep_others, false);
        Ok(entry)
    }

    pub fn unfocus(&self) -> Option<RowId> {
        let row = lock(&self.selection).take_focus()?;
        if let Ok(entry) = self.index.lookup_position(&row) {
            self.client
                .send_position_changed(&entry, self.options.keep_others, true);
        }
        Some(row)
    }

    pub fn focused(&self) -> Option<RowId> {
        lock(&self.selection).focus().cloned()
    }

    /// Hilited rows in hilite order with their positions. Rows unknown to the index
    /// are listed at the origin.
    pub fn hilited_rows(&self) -> Vec<(RowId, PositionEntry)> {
        lock(&self.selection)
            .iter()
            .map(|row| {
                let entry = self.index.lookup_position(row).unwrap_or_default();
                (row.clone(), entry)
            })
            .collect()
    }

    /// Unregisters both bridges, closes the client and stops the server. Safe to call
    /// more than once.
    pub fn close(&self) {
        let subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(subscriptions) = subscriptions else {
            return;
        };
        self.host.unsubscribe(subscriptions.host);
        self.server.unregister_listener(subscriptions.server);
        self.client.close();
        self.server.shut_down();
        self.log.info("hilite session closed");
    }
}

impl<H: HostSelection> Drop for SyncController<H> {
    fn drop(&mut self) {
        self.close();
    }
}
