//! Line framing: splitting inbound lines into `(verb, payload)` and encoding
//! outbound frames.

use serde::Serialize;
use thiserror::Error;

use crate::command::Command;

/// Why an inbound line could not be framed. Every variant maps to an
/// `UNKNOWN_COMMAND` reply on the control channel; payload-level JSON errors
/// are reported separately as `PARSE_ERROR` by the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("empty frame")]
    Empty,
    #[error("frame has no payload separator")]
    MissingPayload,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

/// Splits one line on the first space into a verb and its raw JSON payload.
///
/// The payload is returned unparsed; callers deserialize it against the type
/// the verb calls for.
pub fn decode(line: &str) -> Result<(Command, &str), FrameError> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return Err(FrameError::Empty);
    }
    let (token, payload) = line.split_once(' ').ok_or(FrameError::MissingPayload)?;
    let command = Command::from_token(token)
        .ok_or_else(|| FrameError::UnknownCommand(token.to_string()))?;
    Ok((command, payload))
}

/// Encodes one outbound frame, without the trailing newline (the socket
/// writer appends it).
pub fn encode<T: Serialize>(command: Command, payload: &T) -> String {
    // Payload types are plain data structs; serializing them cannot fail.
    format!("{} {}", command, serde_json::to_string(payload).unwrap())
}
