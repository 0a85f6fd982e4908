//! Stdin/stdout JSON bridge.
//!
//! Reads one [`HostRequest`] per line, runs it against the shared
//! orchestrator, and writes one [`HostResponse`] per line. Requests are
//! handled in arrival order. Malformed lines get an error reply and the loop
//! continues; EOF ends the loop.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use std::sync::Arc;

use omnisearch_fanout::{FanoutOrchestrator, ProviderRegistry};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::error::{AppError, Result};
use crate::host::contract::{HostCommand, HostRequest, HostResponse};

/// Serves host requests against one orchestrator and registry.
#[derive(Debug, Clone)]
pub struct StdioHost {
    orchestrator: Arc<FanoutOrchestrator>,
    registry: Arc<ProviderRegistry>,
}

impl StdioHost {
    /// Create a host.
    pub fn new(orchestrator: Arc<FanoutOrchestrator>, registry: Arc<ProviderRegistry>) -> Self {
        Self {
            orchestrator,
            registry,
        }
    }

    /// Shared orchestrator.
    pub fn orchestrator(&self) -> &Arc<FanoutOrchestrator> {
        &self.orchestrator
    }

    /// Handle one raw line. Returns `None` for blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<HostResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let request: HostRequest = match serde_json::from_str(trimmed) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse host request");
                let id = salvage_id(trimmed);
                return Some(HostResponse::error(id, format!("malformed request: {e}")));
            }
        };

        Some(self.handle(request).await)
    }

    /// Handle one parsed request.
    pub async fn handle(&self, request: HostRequest) -> HostResponse {
        match request {
            HostRequest::Command {
                id,
                command: HostCommand::Health,
            } => HostResponse::health(id, self.orchestrator.health()),
            HostRequest::Search { id, query } => {
                if query.trim().is_empty() {
                    return HostResponse::error(Some(id), "query must not be empty");
                }
                let report = self
                    .orchestrator
                    .execute_with_report(&self.registry, &query)
                    .await;
                tracing::debug!(
                    request_id = %id,
                    run_id = %report.run_id,
                    successes = report.successes,
                    failures = report.failures,
                    "search request served"
                );
                HostResponse::search(id, report, self.orchestrator.health().summary())
            }
        }
    }

    /// Serve `reader` until EOF, writing replies to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Host`] if reading, serializing or writing fails.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| AppError::Host(format!("failed to read request: {e}")))?;
            if bytes_read == 0 {
                tracing::info!("input closed; stopping host");
                break;
            }

            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            let json = serde_json::to_string(&response)
                .map_err(|e| AppError::Host(format!("failed to serialize response: {e}")))?;
            write_line(&mut writer, &json).await?;
        }

        Ok(())
    }

    /// Serve the process's stdin and stdout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Host`] if stdio fails.
    pub async fn run_stdio(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = BufWriter::new(tokio::io::stdout());
        self.serve(reader, writer).await
    }
}

/// Best-effort id from a line that did not parse as a request.
fn salvage_id(raw: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()?
        .get("id")?
        .as_str()
        .map(String::from)
}

/// Write a single JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, json: &str) -> Result<()> {
    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| AppError::Host(format!("failed to write response: {e}")))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| AppError::Host(format!("failed to write newline: {e}")))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::Host(format!("failed to flush output: {e}")))?;
    Ok(())
}
