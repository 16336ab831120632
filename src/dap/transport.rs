use super::codec::{self, DapCodec};
use super::transport_trait::DapTransportTrait;
use super::types::Message;
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::process::{ChildStdin, ChildStdout};
use tracing::{debug, trace};

/// DAP transport over a byte stream (stdio pipe or TCP socket), framed with the C1 codec.
///
/// Reads are buffered through [`DapCodec`] so that a message split across several reads
/// (a slow pipe, a partial TCP segment) is handled transparently: bytes are appended to
/// the codec's internal buffer and `try_parse` is retried until a full message or a fatal
/// parse error is produced.
pub struct DapTransport {
    reader: Box<dyn AsyncRead + Unpin + Send>,
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    codec: DapCodec,
}

impl DapTransport {
    pub fn new(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        Self {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            codec: DapCodec::new(),
        }
    }

    /// Construct a transport over an already-connected TCP socket (Delve, vscode-js-debug,
    /// and vscode-js-debug child sessions all speak DAP over a plain TCP stream).
    pub fn new_socket(socket: TcpStream) -> Self {
        let (read_half, write_half) = socket.into_split();
        Self {
            reader: Box::new(read_half),
            writer: Box::new(write_half),
            codec: DapCodec::new(),
        }
    }

    pub async fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.codec.try_parse()? {
                debug!("DAP received: {:?}", message_summary(&message));
                return Ok(message);
            }

            let mut chunk = [0u8; 4096];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::Dap("DAP stream closed".to_string()));
            }
            trace!("DAP: read {} bytes", n);
            self.codec.feed(&chunk[..n]);
        }
    }

    pub async fn write_message(&mut self, msg: &Message) -> Result<()> {
        let bytes = codec::encode(msg)?;
        debug!("DAP sending: {:?}", message_summary(msg));
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

fn message_summary(message: &Message) -> String {
    match message {
        Message::Request(r) => format!("request#{} {}", r.seq, r.command),
        Message::Response(r) => format!("response#{} {} success={}", r.seq, r.command, r.success),
        Message::Event(e) => format!("event#{} {}", e.seq, e.event),
    }
}

#[async_trait]
impl DapTransportTrait for DapTransport {
    async fn read_message(&mut self) -> Result<Message> {
        self.read_message().await
    }

    async fn write_message(&mut self, msg: &Message) -> Result<()> {
        self.write_message(msg).await
    }
}
