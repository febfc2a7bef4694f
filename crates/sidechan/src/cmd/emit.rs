use serde_json::Value;
use sidechan_frame::{Message, RecordWriter};

use crate::cmd::{EmitArgs, EmitRecord};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};

/// What `emit` puts on stdout.
#[derive(Debug, PartialEq)]
enum Emission {
    Record(Message),
    Text(String),
}

pub fn run(args: EmitArgs) -> CliResult<i32> {
    let stdout = std::io::stdout();
    let mut writer = RecordWriter::new(stdout.lock());

    let result = match prepare(args.record)? {
        Emission::Record(message) => writer.send(&message),
        Emission::Text(text) => writer.write_text(&text),
    };
    result.map_err(|err| frame_error("emit failed", err))?;
    Ok(SUCCESS)
}

fn prepare(record: EmitRecord) -> CliResult<Emission> {
    let message = match record {
        EmitRecord::Text { text } => return Ok(Emission::Text(text)),
        EmitRecord::End => Message::end(),
        EmitRecord::Log { entry } => {
            let entry = serde_json::from_str::<Value>(&entry).unwrap_or(Value::String(entry));
            Message::log(entry)
        }
        EmitRecord::Error { text, code: Some(code) } => Message::error_with_code(text, code),
        EmitRecord::Error { text, code: None } => Message::error(text),
        EmitRecord::Record { msg_type, payload } => {
            let payload = serde_json::from_str::<Value>(&payload).map_err(|err| {
                CliError::new(USAGE, format!("--payload is not valid JSON: {err}"))
            })?;
            Message::new(msg_type, payload)
        }
    };
    Ok(Emission::Record(message))
}
