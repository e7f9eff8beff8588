use std::io::ErrorKind;
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::logging::BridgeLog;
use crate::model::PositionEntry;
use crate::protocol::{ObjectRef, ViewerPosition, WireMessage, write_message};

use super::ClientError;

pub const LOCALHOST: &str = "localhost";

/// Outbound half of the bridge: commands sent to ilastik's listening port.
///
/// Sends never fail towards the caller. A connect or write failure drops the
/// connection, is logged, and leaves `is_connected` false until a later send
/// manages to reconnect.
pub trait HiliteClient: Send + Sync {
    fn send_handshake(&self, listen_port: u16);

    /// Centers the viewer on `position`; `clear` removes that position marker instead.
    fn send_position_changed(&self, position: &PositionEntry, keep_others: bool, clear: bool);

    /// Hilites or unhilites one object; `clear` clears every hilite in ilastik instead.
    fn send_hilite_toggle(&self, ilastik_id: f64, time: f64, hilite: bool, clear: bool);

    fn is_connected(&self) -> bool;

    fn close(&self);
}

pub struct DefaultHiliteClient {
    host: String,
    port: u16,
    socket: Mutex<Option<TcpStream>>,
    log: Arc<dyn BridgeLog>,
}

impl std::fmt::Debug for DefaultHiliteClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DefaultHiliteClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl DefaultHiliteClient {
    pub fn new(port: u16, log: Arc<dyn BridgeLog>) -> Self {
        Self::with_host(LOCALHOST, port, log)
    }

    pub fn with_host(host: impl Into<String>, port: u16, log: Arc<dyn BridgeLog>) -> Self {
        Self {
            host: host.into(),
            port,
            socket: Mutex::new(None),
            log,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn socket(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, message: WireMessage) {
        let mut socket = self.socket();
        match self.deliver(&mut socket, &message) {
            Ok(()) => self.log.debug(&format!("sent `{}` to ilastik", message.tag())),
            Err(error) => {
                *socket = None;
                self.log.warn(&format!("`{}` not delivered: {error}", message.tag()));
            }
        }
    }

    fn deliver(
        &self,
        socket: &mut Option<TcpStream>,
        message: &WireMessage,
    ) -> Result<(), ClientError> {
        if socket.as_ref().is_some_and(|stream| !is_alive(stream)) {
            self.log.debug("ilastik closed the connection, reconnecting");
            *socket = None;
        }
        if socket.is_none() {
            let stream = TcpStream::connect((self.host.as_str(), self.port)).map_err(|source| {
                ClientError::Connect {
                    host: self.host.clone(),
                    port: self.port,
                    source,
                }
            })?;
            self.log
                .debug(&format!("connected to ilastik at {}:{}", self.host, self.port));
            *socket = Some(stream);
        }
        if let Some(stream) = socket.as_mut() {
            write_message(stream, message)?;
        }
        Ok(())
    }
}

impl HiliteClient for DefaultHiliteClient {
    fn send_handshake(&self, listen_port: u16) {
        self.send(WireMessage::handshake(listen_port));
    }

    fn send_position_changed(&self, position: &PositionEntry, keep_others: bool, clear: bool) {
        let position = ViewerPosition::from_entry(position, keep_others);
        if clear {
            self.send(WireMessage::ClearPosition(position));
        } else {
            self.send(WireMessage::SetPosition(position));
        }
    }

    fn send_hilite_toggle(&self, ilastik_id: f64, time: f64, hilite: bool, clear: bool) {
        let object = ObjectRef::new(ilastik_id.round() as i64, time.round() as i64);
        let message = match (clear, hilite) {
            (true, _) => WireMessage::ClearAll,
            (false, true) => WireMessage::Hilite(object),
            (false, false) => WireMessage::Unhilite(object),
        };
        self.send(message);
    }

    fn is_connected(&self) -> bool {
        let mut socket = self.socket();
        if socket.as_ref().is_some_and(|stream| !is_alive(stream)) {
            *socket = None;
        }
        socket.is_some()
    }

    fn close(&self) {
        if let Some(stream) = self.socket().take() {
            let _ = stream.shutdown(Shutdown::Both);
            self.log.debug("closed connection to ilastik");
        }
    }
}

/// A cached stream is dead once the peer has closed it or reset it. ilastik never
/// writes on this connection, so pending bytes only mean it is still open.
fn is_alive(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut byte = [0_u8; 1];
    let alive = match stream.peek(&mut byte) {
        Ok(0) => false,
        Ok(_) => true,
        Err(error) => error.kind() == ErrorKind::WouldBlock,
    };
    stream.set_nonblocking(false).is_ok() && alive
}
