use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::logging::BridgeLog;
use crate::model::{PositionColumns, PositionEntry, PositionIndex, RowId, Table};
use crate::protocol::{ObjectRef, ViewerPosition, WireMessage, read_message};
use crate::selection::HiliteEvent;

use super::server::accept_backoff;
use super::{DefaultHiliteClient, HiliteClient, HiliteServer, ServerStatus};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

#[derive(Default)]
struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .expect("lock")
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl BridgeLog for MemoryLog {
    fn debug(&self, message: &str) {
        self.lines.lock().expect("lock").push(format!("DEBUG {message}"));
    }
    fn info(&self, message: &str) {
        self.lines.lock().expect("lock").push(format!("INFO {message}"));
    }
    fn warn(&self, message: &str) {
        self.lines.lock().expect("lock").push(format!("WARN {message}"));
    }
    fn error(&self, message: &str) {
        self.lines.lock().expect("lock").push(format!("ERROR {message}"));
    }
}

#[derive(Default)]
struct RecordingClient {
    connected: AtomicBool,
    handshakes: Mutex<Vec<u16>>,
}

impl RecordingClient {
    fn handshakes(&self) -> Vec<u16> {
        self.handshakes.lock().expect("lock").clone()
    }
}

impl HiliteClient for RecordingClient {
    fn send_handshake(&self, listen_port: u16) {
        self.handshakes.lock().expect("lock").push(listen_port);
    }
    fn send_position_changed(&self, _: &PositionEntry, _: bool, _: bool) {}
    fn send_hilite_toggle(&self, _: f64, _: f64, _: bool, _: bool) {}
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
    fn close(&self) {}
}

fn index() -> Arc<PositionIndex> {
    let table = Table::new(vec!["t".into(), "id".into()])
        .with_row("r0", vec![Some(0.0), Some(7.0)])
        .with_row("r1", vec![Some(2.0), Some(7.0)])
        .with_row("r2", vec![Some(2.0), Some(8.0)]);
    let columns = PositionColumns {
        time: Some("t".into()),
        ilastik_id: Some("id".into()),
        ..PositionColumns::default()
    };
    Arc::new(PositionIndex::build(&table, &columns).expect("index"))
}

struct Harness {
    server: HiliteServer,
    client: Arc<RecordingClient>,
    log: Arc<MemoryLog>,
    events: Receiver<HiliteEvent>,
}

impl Harness {
    fn started() -> Self {
        let client = Arc::new(RecordingClient::default());
        let log = Arc::new(MemoryLog::default());
        let server = HiliteServer::new(0, client.clone(), index(), log.clone());
        let (sender, events) = mpsc::channel();
        let sender = Mutex::new(sender);
        server.register_listener(move |event: &HiliteEvent| {
            let _ = sender.lock().expect("lock").send(event.clone());
        });
        server.start_up().expect("start");
        Self {
            server,
            client,
            log,
            events,
        }
    }

    fn port(&self) -> u16 {
        self.server.local_port().expect("listening")
    }

    fn send_raw(&self, bytes: &[u8]) {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port())).expect("connect");
        stream.write_all(bytes).expect("write");
        let _ = stream.shutdown(Shutdown::Write);
    }

    fn next_event(&self) -> HiliteEvent {
        self.events.recv_timeout(WAIT).expect("event")
    }

    fn assert_quiet(&self) {
        assert!(self.events.recv_timeout(QUIET).is_err());
    }
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

fn free_port() -> u16 {
    let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    listener.local_addr().expect("addr").port()
}

#[test]
fn inbound_hilite_resolves_row_and_fires_once() {
    let harness = Harness::started();
    harness.send_raw(
        br#"{"mode":"hilite","where":{"operands":[{"row":"time","value":2},{"row":"ilastik_id","value":7}]}}"#,
    );
    assert_eq!(harness.next_event(), HiliteEvent::Hilited(RowId::from("r1")));
    harness.assert_quiet();
}

#[test]
fn inbound_modes_map_to_events() {
    let harness = Harness::started();
    let messages = [
        (
            WireMessage::Unhilite(ObjectRef::new(8, 2)),
            HiliteEvent::Unhilited(RowId::from("r2")),
        ),
        (
            WireMessage::Toggle(ObjectRef::new(7, 0)),
            HiliteEvent::Toggled(RowId::from("r0")),
        ),
        (WireMessage::ClearAll, HiliteEvent::ClearedAll),
    ];
    for (message, expected) in messages {
        harness.send_raw(&crate::protocol::encode(&message).expect("encode"));
        assert_eq!(harness.next_event(), expected);
    }
}

#[test]
fn malformed_message_drops_only_that_connection() {
    let harness = Harness::started();
    harness.send_raw(b"{not json");
    harness.assert_quiet();
    assert!(wait_until(|| harness.log.contains("dropping hilite connection")));
    assert_eq!(harness.server.status(), ServerStatus::Listening {
        port: harness.port()
    });
    assert_eq!(harness.server.listener_count(), 1);

    harness.send_raw(br#"{"mode":"clear"}"#);
    assert_eq!(harness.next_event(), HiliteEvent::ClearedAll);
}

#[test]
fn unresolvable_object_is_skipped() {
    let harness = Harness::started();
    harness.send_raw(&crate::protocol::encode(&WireMessage::Hilite(ObjectRef::new(99, 0))).expect("encode"));
    harness.assert_quiet();
    assert!(wait_until(|| harness.log.contains("no row for ilastik id 99")));
    assert!(harness.server.is_listening());
}

#[test]
fn non_hilite_commands_are_ignored() {
    let harness = Harness::started();
    harness.send_raw(
        &crate::protocol::encode(&WireMessage::SetPosition(ViewerPosition::default()))
            .expect("encode"),
    );
    harness.assert_quiet();
    assert!(wait_until(|| harness.log.contains("ignoring `setviewerposition`")));
}

#[test]
fn start_up_announces_port_and_does_not_rebind() {
    let harness = Harness::started();
    let port = harness.port();
    assert_eq!(harness.client.handshakes(), vec![port]);

    harness.client.connected.store(true, Ordering::SeqCst);
    harness.server.start_up().expect("second start");
    assert_eq!(harness.server.local_port(), Some(port));
    assert_eq!(harness.client.handshakes(), vec![port]);

    harness.client.connected.store(false, Ordering::SeqCst);
    harness.server.start_up().expect("third start");
    assert_eq!(harness.server.local_port(), Some(port));
    assert_eq!(harness.client.handshakes(), vec![port, port]);
}

#[test]
fn bind_failure_is_reported() {
    let occupied = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = occupied.local_addr().expect("addr").port();
    let server = HiliteServer::new(
        port,
        Arc::new(RecordingClient::default()),
        index(),
        Arc::new(MemoryLog::default()),
    );
    assert!(server.start_up().is_err());
    assert_eq!(server.status(), ServerStatus::Stopped);
}

#[test]
fn shut_down_is_idempotent_and_allows_restart() {
    let harness = Harness::started();
    harness.server.shut_down();
    assert_eq!(harness.server.status(), ServerStatus::Stopped);
    harness.server.shut_down();
    assert!(harness.server.is_shut_down());

    harness.server.start_up().expect("restart");
    harness.send_raw(br#"{"mode":"clear"}"#);
    assert_eq!(harness.next_event(), HiliteEvent::ClearedAll);
}

#[test]
fn shut_down_force_closes_idle_connections() {
    let harness = Harness::started();
    let mut idle = TcpStream::connect(("127.0.0.1", harness.port())).expect("connect");
    idle.set_read_timeout(Some(WAIT)).expect("timeout");
    assert!(wait_until(|| harness.server.open_connections() == 1));

    harness.server.shut_down();
    let mut buffer = [0_u8; 8];
    let read = idle.read(&mut buffer).unwrap_or(0);
    assert_eq!(read, 0);
    assert_eq!(harness.server.open_connections(), 0);
}

#[test]
fn is_shut_down_closes_tracked_connections() {
    let harness = Harness::started();
    let _idle = TcpStream::connect(("127.0.0.1", harness.port())).expect("connect");
    assert!(wait_until(|| harness.server.open_connections() == 1));

    assert!(!harness.server.is_shut_down());
    assert_eq!(harness.server.open_connections(), 0);
    assert!(harness.server.is_listening());
}

#[test]
fn unregistered_listener_receives_nothing() {
    let harness = Harness::started();
    let (sender, receiver) = mpsc::channel();
    let sender = Mutex::new(sender);
    let id = harness.server.register_listener(move |event: &HiliteEvent| {
        let _ = sender.lock().expect("lock").send(event.clone());
    });
    assert_eq!(harness.server.listener_count(), 2);
    assert!(harness.server.unregister_listener(id));

    harness.send_raw(br#"{"mode":"clear"}"#);
    assert_eq!(harness.next_event(), HiliteEvent::ClearedAll);
    assert!(receiver.recv_timeout(QUIET).is_err());
}

#[test]
fn client_without_peer_reports_disconnected() {
    let client = DefaultHiliteClient::new(free_port(), Arc::new(MemoryLog::default()));
    assert!(!client.is_connected());
    client.send_handshake(9997);
    assert!(!client.is_connected());
    client.close();
    client.close();
}

#[test]
fn client_reuses_connection_across_sends() {
    let ilastik = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = ilastik.local_addr().expect("addr").port();
    let client = DefaultHiliteClient::with_host("127.0.0.1", port, Arc::new(MemoryLog::default()));

    client.send_handshake(4321);
    assert!(client.is_connected());
    let entry = PositionEntry {
        x: 1.0,
        y: 2.0,
        z: 3.0,
        channel: 0.0,
        time: 5.0,
        ilastik_id: 7.0,
    };
    client.send_position_changed(&entry, true, false);
    client.send_hilite_toggle(7.0, 5.0, false, false);
    client.send_hilite_toggle(7.0, 5.0, true, true);

    let (stream, _) = ilastik.accept().expect("accept");
    let mut reader = std::io::BufReader::new(stream);
    assert_eq!(
        read_message(&mut reader).expect("handshake"),
        WireMessage::handshake(4321)
    );
    assert_eq!(
        read_message(&mut reader).expect("position"),
        WireMessage::SetPosition(ViewerPosition::from_entry(&entry, true))
    );
    assert_eq!(
        read_message(&mut reader).expect("unhilite"),
        WireMessage::Unhilite(ObjectRef::new(7, 5))
    );
    assert_eq!(read_message(&mut reader).expect("clear"), WireMessage::ClearAll);

    client.close();
    assert!(!client.is_connected());
}

#[test]
fn server_handshake_reaches_real_client_peer() {
    let ilastik = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let ilastik_port = ilastik.local_addr().expect("addr").port();
    let log: Arc<MemoryLog> = Arc::new(MemoryLog::default());
    let client = Arc::new(DefaultHiliteClient::with_host(
        "127.0.0.1",
        ilastik_port,
        log.clone(),
    ));
    let server = HiliteServer::new(0, client.clone(), index(), log);
    server.start_up().expect("start");

    let (stream, _) = ilastik.accept().expect("accept");
    let message = read_message(std::io::BufReader::new(&stream)).expect("handshake");
    assert_eq!(message, WireMessage::handshake(server.local_port().expect("port")));
    assert!(client.is_connected());
    server.shut_down();
}

#[test]
fn client_reconnects_after_peer_closes_each_connection() {
    let ilastik = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = ilastik.local_addr().expect("addr").port();
    let (sender, received) = mpsc::channel();
    thread::spawn(move || {
        for stream in ilastik.incoming().take(4) {
            let stream = stream.expect("accept");
            let message = read_message(std::io::BufReader::new(&stream)).expect("message");
            let _ = sender.send(message);
        }
    });
    let client = DefaultHiliteClient::with_host("127.0.0.1", port, Arc::new(MemoryLog::default()));

    for listen_port in 1000..1004 {
        client.send_handshake(listen_port);
        thread::sleep(Duration::from_millis(100));
    }
    let delivered = (0..4)
        .map(|_| received.recv_timeout(WAIT).expect("delivered"))
        .collect::<Vec<_>>();
    assert_eq!(
        delivered,
        (1000..1004).map(WireMessage::handshake).collect::<Vec<_>>()
    );
}

#[test]
fn vanished_peer_marks_client_disconnected() {
    let ilastik = TcpListener::bind(("127.0.0.1", 0)).expect("bind");
    let port = ilastik.local_addr().expect("addr").port();
    let log = Arc::new(MemoryLog::default());
    let client = DefaultHiliteClient::with_host("127.0.0.1", port, log.clone());

    client.send_handshake(1000);
    assert!(client.is_connected());
    let (stream, _) = ilastik.accept().expect("accept");
    drop(stream);
    drop(ilastik);
    assert!(wait_until(|| !client.is_connected()));

    client.send_handshake(1001);
    assert!(!client.is_connected());
    assert!(log.contains("`handshake` not delivered"));
}

#[test]
fn accept_errors_back_off_up_to_a_second() {
    assert_eq!(accept_backoff(1), Duration::from_millis(10));
    assert_eq!(accept_backoff(2), Duration::from_millis(20));
    assert_eq!(accept_backoff(5), Duration::from_millis(160));
    assert_eq!(accept_backoff(8), Duration::from_secs(1));
    assert_eq!(accept_backoff(u32::MAX), Duration::from_secs(1));
}
