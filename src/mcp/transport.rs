//! Line screening in front of the rmcp stdio transport
//!
//! rmcp closes the session on a line it cannot decode. Every client line is
//! checked here first. Well-formed messages are piped through to the service.
//! Requests that cannot be decoded get a JSON-RPC error reply written next to
//! the service output. Undecodable notifications and responses are dropped.

use anyhow::{Context, Result};
use rmcp::model::{ClientJsonRpcMessage, ErrorData};
use serde_json::{json, Value};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const PIPE_CAPACITY: usize = 64 * 1024;

/// What to do with one client line
#[derive(Debug, PartialEq)]
pub(crate) enum Screened {
    Forward,
    Reply(String),
    Drop,
}

/// Check one trimmed, non-empty line
pub(crate) fn screen(line: &[u8]) -> Screened {
    let message: Value = match serde_json::from_slice(line) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Malformed message: {}", e);
            return Screened::Reply(error_line(
                Value::Null,
                ErrorData::parse_error(format!("Parse error: {}", e), None),
            ));
        }
    };

    if !message.is_object() {
        return Screened::Reply(error_line(
            Value::Null,
            ErrorData::invalid_request("Invalid request: expected a JSON object", None),
        ));
    }

    let id = message.get("id").cloned();
    let is_request = message.get("method").is_some() && id.is_some();

    if is_request && id == Some(Value::Null) {
        tracing::warn!("Request with null id rejected");
        return Screened::Reply(error_line(
            Value::Null,
            ErrorData::invalid_request("Invalid request: id must be a string or number", None),
        ));
    }

    match serde_json::from_value::<ClientJsonRpcMessage>(message) {
        Ok(_) => Screened::Forward,
        Err(e) => match id.filter(|_| is_request) {
            Some(id) => {
                tracing::warn!("Undecodable request {}: {}", id, e);
                Screened::Reply(error_line(
                    id,
                    ErrorData::invalid_request(format!("Invalid request: {}", e), None),
                ))
            }
            None => {
                tracing::warn!("Dropping undecodable message: {}", e);
                Screened::Drop
            }
        },
    }
}

fn error_line(id: Value, error: ErrorData) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "error": error }).to_string()
}

/// Background tasks moving bytes between the client and the service pipes
pub struct Relay {
    inbound: JoinHandle<Result<()>>,
    outbound: JoinHandle<Result<()>>,
}

impl Relay {
    /// Wait for the service output to drain, then stop reading client input
    pub async fn finish(self) -> Result<()> {
        let drained = self.outbound.await.context("Output relay task failed")?;
        self.inbound.abort();
        drained
    }
}

/// Wrap client I/O; returns the service's reader and writer plus the relay
pub fn screened<R, W>(input: R, output: W) -> (DuplexStream, DuplexStream, Relay)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (service_reader, feed) = tokio::io::duplex(PIPE_CAPACITY);
    let (service_writer, drain) = tokio::io::duplex(PIPE_CAPACITY);
    let (replies_tx, replies_rx) = mpsc::unbounded_channel();

    let relay = Relay {
        inbound: tokio::spawn(pump_inbound(BufReader::new(input), feed, replies_tx)),
        outbound: tokio::spawn(pump_outbound(BufReader::new(drain), output, replies_rx)),
    };

    (service_reader, service_writer, relay)
}

async fn pump_inbound<R>(
    mut input: BufReader<R>,
    mut feed: DuplexStream,
    replies: mpsc::UnboundedSender<String>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        let read = input
            .read_until(b'\n', &mut line)
            .await
            .context("Failed to read client input")?;
        if read == 0 {
            break;
        }

        let message = line.trim_ascii();
        if message.is_empty() {
            continue;
        }

        match screen(message) {
            Screened::Forward => {
                feed.write_all(message).await.context("Service input closed")?;
                feed.write_all(b"\n").await.context("Service input closed")?;
            }
            Screened::Reply(reply) => {
                if replies.send(reply).is_err() {
                    break;
                }
            }
            Screened::Drop => {}
        }
    }

    tracing::info!("Client input closed");
    Ok(())
}

async fn pump_outbound<W>(
    mut drain: BufReader<DuplexStream>,
    mut output: W,
    mut replies: mpsc::UnboundedReceiver<String>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    // read_until keeps partial bytes in `line` if the other branch wins
    let mut line = Vec::new();
    let mut replies_open = true;

    loop {
        tokio::select! {
            reply = replies.recv(), if replies_open => match reply {
                Some(reply) => {
                    output.write_all(reply.as_bytes()).await?;
                    output.write_all(b"\n").await?;
                    output.flush().await?;
                }
                None => replies_open = false,
            },
            read = drain.read_until(b'\n', &mut line) => {
                if read.context("Failed to read service output")? == 0 {
                    break;
                }
                output.write_all(&line).await.context("Failed to write response")?;
                output.flush().await.context("Failed to flush response")?;
                line.clear();
            }
        }
    }

    Ok(())
}
