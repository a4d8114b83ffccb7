//! Single-threaded read-dispatch-write loop over line-delimited JSON.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::protocol::Response;

/// Longest request line accepted by [`serve`], newline included.
pub const MAX_LINE_BYTES: u64 = 8 * 1024 * 1024;

const ENCODE_FALLBACK: &str = r#"{"error":"failed to encode response","type":"execution_error"}"#;

/// Serve requests from `reader` until end of input, writing one response
/// line per request to `writer` and flushing after each.
///
/// Each request is finished before the next is read. Malformed requests get
/// an error response and the loop continues; only I/O errors on the streams
/// themselves end it early. Returns the number of requests answered.
pub async fn serve<R, W>(dispatcher: &Dispatcher, reader: R, writer: W) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_with_limit(dispatcher, reader, writer, MAX_LINE_BYTES).await
}

/// [`serve`] with an explicit per-line byte limit.
///
/// A line longer than `max_line_bytes` is answered with an execution error
/// and skipped up to its newline, without buffering the remainder.
pub async fn serve_with_limit<R, W>(
    dispatcher: &Dispatcher,
    mut reader: R,
    mut writer: W,
    max_line_bytes: u64,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(max_line_bytes, "assessd ready, waiting for requests");

    let max_line_bytes = max_line_bytes.max(1);
    let mut handled = 0u64;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = (&mut reader).take(max_line_bytes).read_until(b'\n', &mut buf).await?;
        if read == 0 {
            break;
        }

        let response = if buf.last() != Some(&b'\n') && read as u64 == max_line_bytes {
            warn!(max_line_bytes, "request line too long, skipping it");
            skip_line(&mut reader).await?;
            Response::execution_error(DispatchError::LineTooLong(max_line_bytes))
        } else {
            match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => dispatcher.handle_line(line.trim()).await,
                Err(_) => Response::execution_error(DispatchError::Utf8),
            }
        };

        let mut encoded =
            serde_json::to_string(&response).unwrap_or_else(|_| ENCODE_FALLBACK.to_string());
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;

        handled += 1;
        debug!(handled, error = response.is_error(), "response written");
    }

    info!(handled, "input closed, shutting down");
    Ok(handled)
}

/// Consume input up to and including the next newline, or to end of input.
async fn skip_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let (consumed, done) = {
            let chunk = reader.fill_buf().await?;
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (chunk.len(), chunk.is_empty()),
            }
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}
