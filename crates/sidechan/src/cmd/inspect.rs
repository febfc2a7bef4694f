use sidechan_frame::{ChunkConfig, ChunkReader};

use crate::cmd::{open_input, InspectArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_messages, InspectedMessage, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }

    let input = open_input(args.input.as_deref())?;
    let mut reader = ChunkReader::with_config(
        input,
        ChunkConfig {
            read_chunk_size: args.chunk_size,
        },
    );

    let mut inspected = Vec::new();
    let mut chunk = 0usize;
    while let Some(messages) = reader
        .read_messages()
        .map_err(|err| frame_error("side channel read failed", err))?
    {
        inspected.extend(
            messages
                .into_iter()
                .map(|message| InspectedMessage::new(chunk, message)),
        );
        chunk += 1;
    }

    tracing::debug!(chunks = chunk, messages = inspected.len(), "inspection complete");
    print_messages(&inspected, format);
    Ok(SUCCESS)
}
