use std::collections::HashMap;
use std::fmt;
use std::io::BufReader;
use std::net::{Ipv4Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::logging::BridgeLog;
use crate::model::{PositionIndex, RowId};
use crate::protocol::{ObjectRef, WireMessage, read_message};
use crate::selection::{HiliteEvent, ListenerId, ObserverList};

use super::{HiliteClient, Result, ServerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Stopped,
    Listening { port: u16 },
}

/// Inbound half of the bridge: accepts connections from ilastik on localhost and turns
/// each received hilite command into a `HiliteEvent` for the registered listeners.
///
/// One thread runs the accept loop and every accepted connection gets its own thread.
/// A connection carries exactly one message; after it is handled the connection is
/// closed. Undecodable or unresolvable messages drop that connection only.
pub struct HiliteServer {
    port: u16,
    client: Arc<dyn HiliteClient>,
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

struct Running {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    accept_thread: JoinHandle<()>,
}

struct Shared {
    index: Arc<PositionIndex>,
    listeners: ObserverList<HiliteEvent>,
    connections: Connections,
    log: Arc<dyn BridgeLog>,
}

#[derive(Default)]
struct Connections {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, TcpStream>>,
}

impl Connections {
    fn streams(&self) -> MutexGuard<'_, HashMap<u64, TcpStream>> {
        self.streams.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, stream: &TcpStream) -> std::io::Result<u64> {
        let handle = stream.try_clone()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams().insert(id, handle);
        Ok(id)
    }

    fn release(&self, id: u64) {
        self.streams().remove(&id);
    }

    fn close_all(&self) -> usize {
        let drained = self.streams().drain().collect::<Vec<_>>();
        for (_, stream) in &drained {
            let _ = stream.shutdown(Shutdown::Both);
        }
        drained.len()
    }

    fn len(&self) -> usize {
        self.streams().len()
    }
}

impl fmt::Debug for HiliteServer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HiliteServer")
            .field("port", &self.port)
            .field("status", &self.status())
            .field("listeners", &self.shared.listeners.len())
            .finish()
    }
}

impl HiliteServer {
    pub fn new(
        port: u16,
        client: Arc<dyn HiliteClient>,
        index: Arc<PositionIndex>,
        log: Arc<dyn BridgeLog>,
    ) -> Self {
        Self {
            port,
            client,
            shared: Arc::new(Shared {
                index,
                listeners: ObserverList::new(),
                connections: Connections::default(),
                log,
            }),
            running: Mutex::new(None),
        }
    }

    /// Configured port; 0 asks the OS for a free one, see [`HiliteServer::local_port`].
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local_port(&self) -> Option<u16> {
        self.running().as_ref().map(|running| running.local_addr.port())
    }

    pub fn status(&self) -> ServerStatus {
        match self.local_port() {
            Some(port) => ServerStatus::Listening { port },
            None => ServerStatus::Stopped,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.running().is_some()
    }

    /// Binds the listening socket, starts the accept loop and announces the listening
    /// port to ilastik. When already listening nothing is rebound; the handshake is
    /// only repeated if the client has lost its connection.
    pub fn start_up(&self) -> Result<()> {
        let mut running = self.running();
        if let Some(current) = running.as_ref() {
            let port = current.local_addr.port();
            drop(running);
            if !self.client.is_connected() {
                self.shared
                    .log
                    .debug("client disconnected, repeating handshake");
                self.client.send_handshake(port);
            }
            return Ok(());
        }

        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, self.port)).map_err(|source| {
            self.shared
                .log
                .error(&format!("cannot listen on port {}: {source}", self.port));
            ServerError::Bind {
                port: self.port,
                source,
            }
        })?;
        let local_addr = listener.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));
        let accept_thread = {
            let stop = Arc::clone(&stop);
            let shared = Arc::clone(&self.shared);
            thread::Builder::new()
                .name("hilite-accept".to_string())
                .spawn(move || shared.accept_loop(listener, stop))
                .map_err(ServerError::Spawn)?
        };
        *running = Some(Running {
            local_addr,
            stop,
            accept_thread,
        });
        drop(running);

        self.shared
            .log
            .info(&format!("hilite server listening on {local_addr}"));
        self.client.send_handshake(local_addr.port());
        Ok(())
    }

    /// Stops the accept loop and force-closes every tracked connection. A stopped
    /// server ignores the call.
    pub fn shut_down(&self) {
        let Some(running) = self.running().take() else {
            return;
        };
        running.stop.store(true, Ordering::SeqCst);
        // accept() only returns on a connection, so hand it one.
        if let Err(error) = TcpStream::connect(running.local_addr) {
            self.shared
                .log
                .debug(&format!("wake-up connect failed: {error}"));
        }
        if running.accept_thread.join().is_err() {
            self.shared.log.error("hilite accept thread panicked");
        }
        let closed = self.shared.connections.close_all();
        self.shared.log.info(&format!(
            "hilite server on {} stopped, {closed} connection(s) closed",
            running.local_addr
        ));
    }

    /// Reports whether the server is stopped.
    ///
    /// Not a pure query: every tracked connection is closed and forgotten before the
    /// status is returned, which aborts messages still being read. Use
    /// [`HiliteServer::status`] for a side-effect-free check.
    pub fn is_shut_down(&self) -> bool {
        self.close_client_connections();
        !self.is_listening()
    }

    pub fn close_client_connections(&self) -> usize {
        self.shared.connections.close_all()
    }

    pub fn open_connections(&self) -> usize {
        self.shared.connections.len()
    }

    pub fn register_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&HiliteEvent) + Send + Sync + 'static,
    {
        self.shared.listeners.register(Arc::new(listener))
    }

    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.unregister(id)
    }

    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for HiliteServer {
    fn drop(&mut self) {
        self.shut_down();
    }
}

/// Pause after the `failures`-th consecutive accept error: 10 ms doubling up to 1 s.
pub(super) fn accept_backoff(failures: u32) -> Duration {
    let exponent = failures.saturating_sub(1).min(7);
    Duration::from_millis(10 << exponent).min(Duration::from_secs(1))
}

impl Shared {
    fn accept_loop(self: Arc<Self>, listener: TcpListener, stop: Arc<AtomicBool>) {
        let mut failures: u32 = 0;
        for incoming in listener.incoming() {
            if stop.load(Ordering::SeqCst) {
                break;
            }
            match incoming {
                Ok(stream) => {
                    failures = 0;
                    Arc::clone(&self).spawn_handler(stream);
                }
                Err(error) => {
                    failures = failures.saturating_add(1);
                    let pause = accept_backoff(failures);
                    self.log.warn(&format!(
                        "accept failed ({failures} in a row), retrying in {pause:?}: {error}"
                    ));
                    thread::sleep(pause);
                }
            }
        }
        self.log.debug("accept loop finished");
    }

    fn spawn_handler(self: Arc<Self>, stream: TcpStream) {
        let id = match self.connections.track(&stream) {
            Ok(id) => id,
            Err(error) => {
                self.log
                    .warn(&format!("cannot track hilite connection: {error}"));
                return;
            }
        };
        let handler = Arc::clone(&self);
        let spawned = thread::Builder::new()
            .name(format!("hilite-conn-{id}"))
            .spawn(move || handler.handle_connection(id, stream));
        if let Err(error) = spawned {
            self.log
                .warn(&format!("cannot start hilite connection thread: {error}"));
            self.connections.release(id);
        }
    }

    fn handle_connection(&self, id: u64, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());
        let received = read_message(BufReader::new(&stream));
        self.connections.release(id);
        match received {
            Ok(message) => {
                self.log
                    .debug(&format!("`{}` received from {peer}", message.tag()));
                self.dispatch(message);
            }
            Err(error) => self
                .log
                .warn(&format!("dropping hilite connection from {peer}: {error}")),
        }
    }

    fn dispatch(&self, message: WireMessage) {
        let (object, event): (ObjectRef, fn(RowId) -> HiliteEvent) = match message {
            WireMessage::ClearAll => {
                self.listeners.notify(&HiliteEvent::ClearedAll);
                return;
            }
            WireMessage::Hilite(object) => (object, HiliteEvent::Hilited),
            WireMessage::Unhilite(object) => (object, HiliteEvent::Unhilited),
            WireMessage::Toggle(object) => (object, HiliteEvent::Toggled),
            other => {
                self.log.warn(&format!(
                    "ignoring `{}` message sent to the hilite server",
                    other.tag()
                ));
                return;
            }
        };
        match self
            .index
            .lookup_by_ilastik_id_and_time(object.ilastik_id, object.time)
        {
            Some(row) => self.listeners.notify(&event(row.clone())),
            None => self.log.warn(&format!(
                "no row for ilastik id {} at time {}, command skipped",
                object.ilastik_id, object.time
            )),
        }
    }
}
