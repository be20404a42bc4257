use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::gemini::response::Response;

/// Writes one serialized response and then closes the stream for writing.
///
/// The status line and body live in a single buffer so the client always
/// sees one framed message, however the transport splits it.
pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: response.to_bytes(),
            written: 0,
        }
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        stream.shutdown().await?;

        Ok(())
    }
}

/// Sends `response` on `stream` and shuts the stream down.
pub async fn respond<S>(stream: &mut S, response: &Response) -> anyhow::Result<()>
where
    S: AsyncWrite + Unpin,
{
    ResponseWriter::new(response).write_to_stream(stream).await
}
