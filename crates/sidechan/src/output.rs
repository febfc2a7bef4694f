use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use sidechan_frame::Message;

const PREVIEW_CHARS: usize = 72;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One parsed message, tagged with the chunk it arrived in.
#[derive(Debug, Serialize)]
pub struct InspectedMessage {
    pub chunk: usize,
    pub kind: &'static str,
    #[serde(rename = "type")]
    pub msg_type: Option<String>,
    pub payload: Value,
    /// Text the message would surface on the output as an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

impl InspectedMessage {
    pub fn new(chunk: usize, message: Message) -> Self {
        let kind = message.kind();
        let error_text = kind.is_error_like().then(|| message.error_text());
        Self {
            chunk,
            kind: kind.as_str(),
            msg_type: message.msg_type,
            payload: message.payload,
            error_text,
        }
    }
}

pub fn print_messages(messages: &[InspectedMessage], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for message in messages {
                println!(
                    "{}",
                    serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHUNK", "KIND", "TYPE", "PAYLOAD"]);
            for message in messages {
                table.add_row(vec![
                    message.chunk.to_string(),
                    message.kind.to_string(),
                    message.msg_type.clone().unwrap_or_else(|| "-".to_string()),
                    preview(&message.payload),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for message in messages {
                println!(
                    "chunk={} kind={} type={} payload={}",
                    message.chunk,
                    message.kind,
                    message.msg_type.as_deref().unwrap_or("-"),
                    preview(&message.payload)
                );
            }
        }
        OutputFormat::Raw => {
            for message in messages {
                if let Some(text) = &message.error_text {
                    print!("{text}");
                }
            }
        }
    }
}

fn preview(payload: &Value) -> String {
    let text = payload.to_string();
    if text.chars().count() <= PREVIEW_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_like_messages_carry_error_text() {
        let inspected = InspectedMessage::new(0, Message::error("boom"));
        assert_eq!(inspected.kind, "error");
        assert_eq!(inspected.error_text.as_deref(), Some("boom"));

        let log = InspectedMessage::new(1, Message::log("x"));
        assert_eq!(log.kind, "log");
        assert!(log.error_text.is_none());
    }

    #[test]
    fn json_shape_omits_absent_error_text() {
        let inspected = InspectedMessage::new(2, Message::end());
        let json = serde_json::to_string(&inspected).unwrap();
        assert_eq!(json, r#"{"chunk":2,"kind":"end","type":"end","payload":{}}"#);
    }

    #[test]
    fn preview_truncates_long_payloads() {
        let long = Value::from("x".repeat(200));
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
        assert_eq!(preview(&Value::from(1)), "1");
    }
}
