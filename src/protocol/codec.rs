use std::io::{Read, Write};

use serde_json::{Value, json};

use super::message::{
    COMMAND_HANDSHAKE, COMMAND_SET_POSITION, COMMAND_UNSET_POSITION, MODE_CLEAR, MODE_HILITE,
    MODE_TOGGLE, MODE_UNHILITE, OPERAND_ILASTIK_ID, OPERAND_TIME, RawFrame, RawSelector,
};
use super::{ObjectRef, PEER_NAME, ProtocolError, Result, ViewerPosition, WireMessage};

pub fn encode(message: &WireMessage) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&to_value(message))?)
}

pub fn decode(bytes: &[u8]) -> Result<WireMessage> {
    let frame = serde_json::from_slice::<RawFrame>(bytes)?;
    from_frame(frame)
}

/// Reads exactly one JSON document from `reader`. Nothing after the closing brace is
/// consumed, and no length prefix or delimiter is expected.
pub fn read_message<R: Read>(reader: R) -> Result<WireMessage> {
    let mut documents = serde_json::Deserializer::from_reader(reader).into_iter::<RawFrame>();
    match documents.next() {
        Some(frame) => from_frame(frame?),
        None => Err(ProtocolError::ConnectionClosed),
    }
}

pub fn write_message<W: Write>(mut writer: W, message: &WireMessage) -> Result<()> {
    writer.write_all(&encode(message)?)?;
    writer.flush()?;
    Ok(())
}

fn to_value(message: &WireMessage) -> Value {
    match message {
        WireMessage::Handshake { name, port } => json!({
            "command": COMMAND_HANDSHAKE,
            "name": name,
            "port": port,
        }),
        WireMessage::SetPosition(position) => position_value(COMMAND_SET_POSITION, position),
        WireMessage::ClearPosition(position) => position_value(COMMAND_UNSET_POSITION, position),
        WireMessage::Hilite(object) => selector_value(MODE_HILITE, object),
        WireMessage::Unhilite(object) => selector_value(MODE_UNHILITE, object),
        WireMessage::Toggle(object) => selector_value(MODE_TOGGLE, object),
        WireMessage::ClearAll => json!({ "mode": MODE_CLEAR }),
    }
}

fn position_value(command: &str, position: &ViewerPosition) -> Value {
    json!({
        "command": command,
        "x": position.x,
        "y": position.y,
        "z": position.z,
        "c": position.c,
        "t": position.t,
        "name": PEER_NAME,
        "keep": position.keep_others,
    })
}

fn selector_value(mode: &str, object: &ObjectRef) -> Value {
    json!({
        "mode": mode,
        "where": {
            "operands": [
                { "row": OPERAND_TIME, "value": object.time },
                { "row": OPERAND_ILASTIK_ID, "value": object.ilastik_id },
            ]
        }
    })
}

fn from_frame(mut frame: RawFrame) -> Result<WireMessage> {
    // `mode` wins: hilite frames are dispatched on it whatever else they carry.
    match (frame.mode.take(), frame.command.take()) {
        (Some(mode), _) => decode_mode(&mode, frame.selector),
        (None, Some(command)) => decode_command(&command, frame),
        (None, None) => Err(ProtocolError::MissingTag),
    }
}

fn decode_command(command: &str, frame: RawFrame) -> Result<WireMessage> {
    let missing = |field| ProtocolError::MissingField {
        tag: command.to_string(),
        field,
    };
    match command {
        COMMAND_HANDSHAKE => Ok(WireMessage::Handshake {
            name: frame.name.ok_or_else(|| missing("name"))?,
            port: frame.port.ok_or_else(|| missing("port"))?,
        }),
        COMMAND_SET_POSITION | COMMAND_UNSET_POSITION => {
            let position = ViewerPosition {
                x: frame.x.ok_or_else(|| missing("x"))?,
                y: frame.y.ok_or_else(|| missing("y"))?,
                z: frame.z.ok_or_else(|| missing("z"))?,
                c: frame.c.ok_or_else(|| missing("c"))?,
                t: frame.t.ok_or_else(|| missing("t"))?,
                keep_others: frame.keep.unwrap_or(false),
            };
            if command == COMMAND_SET_POSITION {
                Ok(WireMessage::SetPosition(position))
            } else {
                Ok(WireMessage::ClearPosition(position))
            }
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

fn decode_mode(mode: &str, selector: Option<RawSelector>) -> Result<WireMessage> {
    let build: fn(ObjectRef) -> WireMessage = match mode {
        MODE_CLEAR => return Ok(WireMessage::ClearAll),
        MODE_HILITE => WireMessage::Hilite,
        MODE_UNHILITE => WireMessage::Unhilite,
        MODE_TOGGLE => WireMessage::Toggle,
        other => return Err(ProtocolError::UnknownMode(other.to_string())),
    };
    let missing = |field| ProtocolError::MissingField {
        tag: mode.to_string(),
        field,
    };

    let selector = selector.ok_or_else(|| missing("where"))?;
    let mut time = None;
    let mut ilastik_id = None;
    for operand in selector.operands {
        match operand.row.as_str() {
            OPERAND_TIME => time = Some(operand.value),
            OPERAND_ILASTIK_ID => ilastik_id = Some(operand.value),
            _ => {}
        }
    }
    Ok(build(ObjectRef {
        ilastik_id: ilastik_id.ok_or_else(|| missing(OPERAND_ILASTIK_ID))?,
        time: time.ok_or_else(|| missing(OPERAND_TIME))?,
    }))
}
