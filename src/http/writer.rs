use anyhow::Context;
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response};

const HTTP_VERSION: &str = "HTTP/1.1";

/// Read size used when streaming a content file.
pub const FILE_CHUNK_SIZE: usize = 10 * 1024;

/// Appends `line` plus CRLF, one byte per character.
///
/// Characters outside ISO-8859-1 cannot be represented and become `?`.
fn put_line(buf: &mut BytesMut, line: &str) {
    for c in line.chars() {
        let code = c as u32;
        buf.put_u8(if code <= 0xFF { code as u8 } else { b'?' });
    }
    buf.put_slice(b"\r\n");
}

fn serialize_head(resp: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}",
        HTTP_VERSION,
        resp.status_code(),
        resp.status_reason()
    );
    put_line(&mut buf, &status_line);

    // Headers
    for (k, v) in &resp.headers {
        put_line(&mut buf, &format!("{k}: {v}"));
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf
}

/// Serializes a [`Response`] onto a stream.
///
/// The head (status line, headers, blank line) is rendered up front; the body
/// follows from the buffer or is streamed from the content file.
pub struct ResponseWriter<'a> {
    response: &'a Response,
    head: BytesMut,
    written: usize,
}

impl<'a> ResponseWriter<'a> {
    /// Finalizes `response` and renders its head.
    pub fn new(response: &'a mut Response) -> Self {
        response.prepare();
        let head = serialize_head(response);
        Self {
            response,
            head,
            written: 0,
        }
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.head.len() {
            let n = stream
                .write(&self.head[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        match self.response.body() {
            Body::Buffer(bytes) => stream.write_all(bytes).await?,
            Body::File(path) => {
                let mut file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                let mut chunk = vec![0u8; FILE_CHUNK_SIZE];
                loop {
                    let n = file.read(&mut chunk).await?;
                    if n == 0 {
                        break;
                    }
                    stream.write_all(&chunk[..n]).await?;
                }
            }
            Body::Empty => {}
        }

        stream.flush().await?;

        tracing::debug!(
            status = self.response.status_code(),
            "Response sent"
        );

        Ok(())
    }
}

/// Convenience for the common case of writing a response in one go.
pub async fn write_response<W>(response: &mut Response, stream: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ResponseWriter::new(response).write_to_stream(stream).await
}
