use std::path::PathBuf;
use std::sync::Arc;

use sidechan_dispatch::{
    DispatchConfig, Dispatcher, Output, Session, Status, TracingDebugSink, WriterOutput,
};
use sidechan_frame::ChunkConfig;
use tokio::io::AsyncRead;

use crate::cmd::{parse_duration, DemuxArgs};
use crate::exit::{io_error, session_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};

pub fn run(args: DemuxArgs) -> CliResult<i32> {
    if args.chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be greater than zero"));
    }
    let config = DispatchConfig {
        quiet_window: parse_duration(&args.quiet_window)?,
        termination: args.termination.into(),
        fatal_codes: args.fatal_codes,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;

    let chunks = ChunkConfig {
        read_chunk_size: args.chunk_size,
    };
    runtime.block_on(demux(args.input, config, chunks))
}

async fn demux(
    input: Option<PathBuf>,
    config: DispatchConfig,
    chunks: ChunkConfig,
) -> CliResult<i32> {
    let output: Arc<dyn Output> = Arc::new(WriterOutput::new(std::io::stdout()));
    let dispatcher = Dispatcher::new(Status::shared(), Some(output), Arc::new(TracingDebugSink))
        .with_config(config);
    let session = Session::new(dispatcher);

    let reader = open_async_input(input).await?;
    let stats = session
        .pump_async_with_config(reader, &chunks)
        .await
        .map_err(|err| session_error("side channel read failed", err))?;

    let status = session.shutdown().await;
    tracing::info!(
        chunks = stats.chunks,
        messages = stats.messages,
        service_ended = status.service_ended,
        erroring = status.erroring,
        "side channel drained"
    );

    Ok(if status.erroring { FAILURE } else { SUCCESS })
}

async fn open_async_input(input: Option<PathBuf>) -> CliResult<Box<dyn AsyncRead + Unpin + Send>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(tokio::io::stdin())),
    }
}
