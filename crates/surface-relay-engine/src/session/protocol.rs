//! Wire format of the channel to the external session.
//!
//! Inbound: `{ "command": "fill-text-input", "arguments": [sessionId, text] }`
//! Outbound: `{ "command": "edit", "arguments": [ { "text", "anchorLine", ... } ] }`

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::session::SessionId;
use crate::surface::selection::SurfaceSnapshot;

pub const EDIT_TEXT_INPUT: &str = "edit-text-input";
pub const FILL_TEXT_INPUT: &str = "fill-text-input";
pub const EDIT: &str = "edit";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Malformed arguments for {command}: {reason}")]
    MalformedArguments {
        command: &'static str,
        reason: String,
    },
}

/// Inbound message as it arrives on the channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub command: String,
    /// Missing or `null` arguments decode as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub arguments: Vec<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CommandEnvelope {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn edit_text_input() -> Self {
        Self {
            command: EDIT_TEXT_INPUT.to_string(),
            arguments: Vec::new(),
        }
    }

    pub fn fill_text_input(session_id: &SessionId, text: &str) -> Self {
        Self {
            command: FILL_TEXT_INPUT.to_string(),
            arguments: vec![
                Value::String(session_id.as_str().to_string()),
                Value::String(text.to_string()),
            ],
        }
    }
}

/// Commands the router understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pull the current surface's text and selection
    EditTextInput,
    /// Push replacement text into the surface owned by `session_id`
    FillTextInput { session_id: SessionId, text: String },
}

impl TryFrom<CommandEnvelope> for Command {
    type Error = ProtocolError;

    fn try_from(envelope: CommandEnvelope) -> Result<Self, Self::Error> {
        match envelope.command.as_str() {
            EDIT_TEXT_INPUT => Ok(Command::EditTextInput),
            FILL_TEXT_INPUT => {
                let session_id = string_argument(&envelope.arguments, 0, "session id")?;
                let text = string_argument(&envelope.arguments, 1, "text")?;
                Ok(Command::FillTextInput {
                    session_id: SessionId::from(session_id),
                    text,
                })
            }
            _ => Err(ProtocolError::UnknownCommand(envelope.command)),
        }
    }
}

fn string_argument(arguments: &[Value], index: usize, name: &str) -> Result<String, ProtocolError> {
    match arguments.get(index) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(ProtocolError::MalformedArguments {
            command: FILL_TEXT_INPUT,
            reason: format!("{name} must be a string, got {other}"),
        }),
        None => Err(ProtocolError::MalformedArguments {
            command: FILL_TEXT_INPUT,
            reason: format!("missing {name}"),
        }),
    }
}

/// Snapshot of a surface sent to the external session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub text: String,
    pub anchor_line: usize,
    pub anchor_column: usize,
    pub cursor_line: usize,
    pub cursor_column: usize,
    pub session_id: SessionId,
}

impl EditRequest {
    pub fn new(snapshot: SurfaceSnapshot, session_id: SessionId) -> Self {
        let SurfaceSnapshot { text, selection } = snapshot;
        Self {
            text,
            anchor_line: selection.anchor.line(),
            anchor_column: selection.anchor.column(),
            cursor_line: selection.cursor.line(),
            cursor_column: selection.cursor.column(),
            session_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub command: String,
    pub arguments: Vec<EditRequest>,
}

impl OutboundMessage {
    pub fn edit(request: EditRequest) -> Self {
        Self {
            command: EDIT.to_string(),
            arguments: vec![request],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{Position, SelectionRange};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_decode_edit_without_arguments() {
        let envelope = CommandEnvelope::from_json(r#"{"command":"edit-text-input"}"#).unwrap();
        assert_eq!(Command::try_from(envelope), Ok(Command::EditTextInput));
    }

    #[test]
    fn test_decode_null_arguments() {
        let envelope =
            CommandEnvelope::from_json(r#"{"command":"edit-text-input","arguments":null}"#)
                .unwrap();
        assert!(envelope.arguments.is_empty());
    }

    #[test]
    fn test_decode_fill() {
        let envelope = CommandEnvelope::from_json(
            r#"{"command":"fill-text-input","arguments":["s-1","new text"]}"#,
        )
        .unwrap();

        assert_eq!(
            Command::try_from(envelope),
            Ok(Command::FillTextInput {
                session_id: SessionId::from("s-1"),
                text: "new text".to_string(),
            })
        );
    }

    #[test]
    fn test_fill_round_trips_through_envelope() {
        let id = SessionId::from("abc");
        let envelope = CommandEnvelope::fill_text_input(&id, "hi\nthere");
        let decoded = CommandEnvelope::from_json(&serde_json::to_string(&envelope).unwrap())
            .unwrap();

        assert_eq!(
            Command::try_from(decoded),
            Ok(Command::FillTextInput {
                session_id: id,
                text: "hi\nthere".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_command() {
        let envelope = CommandEnvelope {
            command: "format-disk".to_string(),
            arguments: Vec::new(),
        };
        assert_eq!(
            Command::try_from(envelope),
            Err(ProtocolError::UnknownCommand("format-disk".to_string()))
        );
    }

    #[rstest]
    #[case(json!([]), "missing session id")]
    #[case(json!(["only-session"]), "missing text")]
    #[case(json!([42, "text"]), "session id must be a string, got 42")]
    #[case(json!(["s", null]), "text must be a string, got null")]
    fn test_malformed_fill_arguments(#[case] arguments: Value, #[case] reason: &str) {
        let envelope = CommandEnvelope {
            command: FILL_TEXT_INPUT.to_string(),
            arguments: serde_json::from_value(arguments).unwrap(),
        };
        assert_eq!(
            Command::try_from(envelope),
            Err(ProtocolError::MalformedArguments {
                command: FILL_TEXT_INPUT,
                reason: reason.to_string(),
            })
        );
    }

    #[test]
    fn test_outbound_edit_shape() {
        let snapshot = SurfaceSnapshot {
            text: "hello\nworld".to_string(),
            selection: SelectionRange {
                anchor: Position::new(2, 1).unwrap(),
                cursor: Position::new(2, 3).unwrap(),
            },
        };
        let message = OutboundMessage::edit(EditRequest::new(snapshot, SessionId::from("s-9")));

        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "command": "edit",
                "arguments": [{
                    "text": "hello\nworld",
                    "anchorLine": 2,
                    "anchorColumn": 1,
                    "cursorLine": 2,
                    "cursorColumn": 3,
                    "sessionId": "s-9"
                }]
            })
        );
    }
}
