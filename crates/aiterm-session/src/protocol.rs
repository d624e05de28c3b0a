//! Wire messages exchanged with the remote command service.
//!
//! Every frame is a JSON envelope `{"event": "<kind>", "data": {...}}`. Inbound
//! envelopes are decoded into the closed [`InboundMessage`] enum at the edge so
//! the session never compares event strings itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::scrollback::LineKind;

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    TerminalOutput(TerminalOutput),
    CommandHistory(CommandHistory),
    SystemInfo(SystemInfo),
    AiSuggestions(AiSuggestions),
    AiInterpretation(AiInterpretation),
    CommandExplanation(CommandExplanation),
}

#[derive(Debug, Deserialize)]
struct InboundEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl InboundMessage {
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let envelope: InboundEnvelope = serde_json::from_str(text)?;
        Self::from_envelope(envelope.event, envelope.data)
    }

    fn from_envelope(event: String, data: Value) -> Result<Self, ProtocolError> {
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };
        match event.as_str() {
            "terminal_output" => decode_payload(&event, data).map(Self::TerminalOutput),
            "command_history" => decode_payload(&event, data).map(Self::CommandHistory),
            "system_info" => decode_payload(&event, data).map(Self::SystemInfo),
            "ai_suggestions" => decode_payload(&event, data).map(Self::AiSuggestions),
            "ai_interpretation" => decode_payload(&event, data).map(Self::AiInterpretation),
            "command_explanation" => decode_payload(&event, data).map(Self::CommandExplanation),
            _ => Err(ProtocolError::UnknownEvent(event.clone())),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TerminalOutput(_) => "terminal_output",
            Self::CommandHistory(_) => "command_history",
            Self::SystemInfo(_) => "system_info",
            Self::AiSuggestions(_) => "ai_suggestions",
            Self::AiInterpretation(_) => "ai_interpretation",
            Self::CommandExplanation(_) => "command_explanation",
        }
    }
}

fn decode_payload<T: for<'de> Deserialize<'de>>(event: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload {
        event: event.to_string(),
        source,
    })
}

/// Classification of a generic command result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Plain,
    Success,
    Error,
}

impl ResultKind {
    fn from_type_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("error") => Self::Error,
            Some("success") => Self::Success,
            _ => Self::Plain,
        }
    }

    pub fn line_kind(self) -> LineKind {
        match self {
            Self::Plain => LineKind::Plain,
            Self::Success => LineKind::Success,
            Self::Error => LineKind::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTerminalOutput")]
pub enum TerminalOutput {
    Clear,
    Welcome {
        output: Option<String>,
    },
    AiInterpretation {
        output: Option<String>,
        interpreted_command: Option<String>,
        original_command: Option<String>,
    },
    Suggestion {
        output: Option<String>,
        suggestions: Vec<String>,
    },
    Result {
        output: Option<String>,
        kind: ResultKind,
        return_code: Option<i32>,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawTerminalOutput {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    interpreted_command: Option<String>,
    #[serde(default)]
    original_command: Option<String>,
    #[serde(default)]
    suggestions: Option<Vec<String>>,
    #[serde(default)]
    return_code: Option<i32>,
}

impl From<RawTerminalOutput> for TerminalOutput {
    fn from(raw: RawTerminalOutput) -> Self {
        match raw.kind.as_deref() {
            Some("clear") => Self::Clear,
            Some("welcome") => Self::Welcome { output: raw.output },
            Some("ai_interpretation") => Self::AiInterpretation {
                output: raw.output,
                interpreted_command: raw.interpreted_command,
                original_command: raw.original_command,
            },
            Some("suggestion") => Self::Suggestion {
                output: raw.output,
                suggestions: raw.suggestions.unwrap_or_default(),
            },
            other => Self::Result {
                output: raw.output,
                kind: ResultKind::from_type_tag(other),
                return_code: raw.return_code,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CommandHistory {
    #[serde(default)]
    pub history: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub cpu_percent: Option<f64>,
    #[serde(default)]
    pub memory_percent: Option<f64>,
    #[serde(default)]
    pub disk_percent: Option<f64>,
    #[serde(default)]
    pub memory_used: Option<u64>,
    #[serde(default)]
    pub memory_total: Option<u64>,
    #[serde(default)]
    pub disk_used: Option<u64>,
    #[serde(default)]
    pub disk_total: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AiSuggestions {
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub request_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AiInterpretation {
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub request_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CommandExplanation {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundMessage {
    Command(CommandRequest),
    GetAiSuggestions(SuggestionRequest),
    GetHistory,
    GetSystemInfo,
    InterpretNaturalLanguage(InterpretRequest),
    ExplainCommand(ExplainRequest),
}

impl OutboundMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub os_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub command: String,
    pub request_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub command: String,
    pub request_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub command: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn terminal_output_type_tag_selects_variant() {
        let clear = InboundMessage::from_json(r#"{"event":"terminal_output","data":{"type":"clear","output":""}}"#)
            .expect("clear should decode");
        assert_eq!(clear, InboundMessage::TerminalOutput(TerminalOutput::Clear));

        let error = InboundMessage::from_json(
            r#"{"event":"terminal_output","data":{"type":"error","output":"boom"}}"#,
        )
        .expect("error should decode");
        assert_eq!(
            error,
            InboundMessage::TerminalOutput(TerminalOutput::Result {
                output: Some("boom".to_string()),
                kind: ResultKind::Error,
                return_code: None,
            })
        );

        let other = InboundMessage::from_json(
            r#"{"event":"terminal_output","data":{"type":"output","output":"a.txt","return_code":0}}"#,
        )
        .expect("output should decode");
        assert_eq!(
            other,
            InboundMessage::TerminalOutput(TerminalOutput::Result {
                output: Some("a.txt".to_string()),
                kind: ResultKind::Plain,
                return_code: Some(0),
            })
        );
    }

    #[test]
    fn ai_interpretation_output_keeps_both_commands() {
        let message = InboundMessage::from_json(
            r#"{"event":"terminal_output","data":{"type":"ai_interpretation","output":"interpreted","interpreted_command":"ls -la","original_command":"list files"}}"#,
        )
        .expect("interpretation should decode");
        assert_eq!(
            message,
            InboundMessage::TerminalOutput(TerminalOutput::AiInterpretation {
                output: Some("interpreted".to_string()),
                interpreted_command: Some("ls -la".to_string()),
                original_command: Some("list files".to_string()),
            })
        );
    }

    #[test]
    fn missing_data_decodes_with_defaults() {
        let message = InboundMessage::from_json(r#"{"event":"command_history"}"#)
            .expect("missing data should decode");
        assert_eq!(
            message,
            InboundMessage::CommandHistory(CommandHistory { history: vec![] })
        );
    }

    #[test]
    fn null_suggestions_are_accepted() {
        let message =
            InboundMessage::from_json(r#"{"event":"ai_suggestions","data":{"suggestions":null}}"#)
                .expect("null suggestions should decode");
        assert_eq!(
            message,
            InboundMessage::AiSuggestions(AiSuggestions {
                suggestions: None,
                request_id: None,
            })
        );
    }

    #[test]
    fn unknown_event_is_rejected() {
        let error = InboundMessage::from_json(r#"{"event":"bogus","data":{}}"#)
            .expect_err("unknown event should fail");
        assert!(matches!(error, ProtocolError::UnknownEvent(ref name) if name == "bogus"));
        assert_eq!(error.event_name(), Some("bogus"));
    }

    #[test]
    fn wrongly_typed_payload_is_rejected() {
        let error = InboundMessage::from_json(
            r#"{"event":"ai_interpretation","data":{"confidence":"high"}}"#,
        )
        .expect_err("string confidence should fail");
        assert!(matches!(error, ProtocolError::InvalidPayload { .. }));
    }

    #[test]
    fn garbage_frame_is_a_decode_error() {
        let error = InboundMessage::from_json("not json").expect_err("garbage should fail");
        assert!(matches!(error, ProtocolError::Decode(_)));
        assert_eq!(error.event_name(), None);
    }

    #[test]
    fn outbound_envelopes_use_event_and_data() {
        let command = OutboundMessage::Command(CommandRequest {
            command: "ls".to_string(),
            os_mode: None,
        });
        let value: Value =
            serde_json::from_str(&command.to_json().expect("encode")).expect("valid json");
        assert_eq!(value, json!({"event": "command", "data": {"command": "ls"}}));

        let history: Value = serde_json::from_str(
            &OutboundMessage::GetHistory.to_json().expect("encode"),
        )
        .expect("valid json");
        assert_eq!(history, json!({"event": "get_history"}));

        let suggestions: Value = serde_json::from_str(
            &OutboundMessage::GetAiSuggestions(SuggestionRequest {
                command: "lst".to_string(),
                request_id: 7,
            })
            .to_json()
            .expect("encode"),
        )
        .expect("valid json");
        assert_eq!(
            suggestions,
            json!({"event": "get_ai_suggestions", "data": {"command": "lst", "request_id": 7}})
        );
    }

    #[test]
    fn os_mode_is_sent_when_configured() {
        let command = OutboundMessage::Command(CommandRequest {
            command: "dir".to_string(),
            os_mode: Some("windows".to_string()),
        });
        let value: Value =
            serde_json::from_str(&command.to_json().expect("encode")).expect("valid json");
        assert_eq!(value["data"]["os_mode"], json!("windows"));
    }
}
