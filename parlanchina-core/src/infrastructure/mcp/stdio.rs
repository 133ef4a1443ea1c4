use super::error::ToolInvokeError;
use super::transport::McpTransport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

/// Newline-delimited JSON over a child process's stdin/stdout.
///
/// The child is killed when the transport is dropped.
pub struct StdioTransport {
    server: String,
    child: Child,
    writer: BufWriter<ChildStdin>,
    lines: Lines<BufReader<ChildStdout>>,
}

impl StdioTransport {
    pub fn spawn(
        server: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
    ) -> Result<Self, ToolInvokeError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolInvokeError::transport(server, "failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolInvokeError::transport(server, "failed to capture server stdout"))?;

        debug!(server, command, "spawned MCP server process");
        Ok(Self {
            server: server.to_string(),
            child,
            writer: BufWriter::new(stdin),
            lines: BufReader::new(stdout).lines(),
        })
    }

    fn io_error(&self, err: std::io::Error) -> ToolInvokeError {
        ToolInvokeError::transport(&self.server, err.to_string())
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn send(&mut self, message: &Value) -> Result<(), ToolInvokeError> {
        let encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.clone(),
                source,
            })?;
        self.writer
            .write_all(encoded.as_bytes())
            .await
            .map_err(|err| self.io_error(err))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|err| self.io_error(err))?;
        self.writer.flush().await.map_err(|err| self.io_error(err))
    }

    async fn receive(&mut self) -> Result<Option<Value>, ToolInvokeError> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return Ok(None),
                Err(err) => return Err(self.io_error(err)),
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('\u{1b}') {
                debug!(
                    server = %self.server,
                    line = trimmed,
                    "skipping ANSI log line from MCP server"
                );
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => {
                    debug!(
                        server = %self.server,
                        line = trimmed,
                        %err,
                        "skipping non-JSON line from MCP server"
                    );
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.child.kill().await {
            debug!(
                server = %self.server,
                %err,
                "failed to kill MCP server process (may have already exited)"
            );
        }
    }
}
