use serde_json::{json, Value};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};

use super::framing::FrameDecoder;
use super::McpServerConfig;

const PROTOCOL_VERSION: &str = "2024-11-05";

type PendingResponse = oneshot::Sender<Result<Value, McpClientError>>;
type SharedPending = Arc<Mutex<Pending>>;

/// Requests awaiting a response. Once `closed` is set no new request is
/// accepted, so nothing can wait on a server whose stdout already ended.
#[derive(Default)]
struct Pending {
    waiting: HashMap<u64, PendingResponse>,
    closed: bool,
}

#[derive(Debug, Clone, Error)]
pub enum McpClientError {
    #[error("failed to spawn MCP server '{server}': {message}")]
    SpawnFailed { server: String, message: String },

    #[error("failed to serialize JSON-RPC message: {0}")]
    Serialization(String),

    #[error("failed to parse JSON-RPC message: {0}")]
    Parse(String),

    #[error("JSON-RPC timeout calling '{method}' on '{server}'")]
    Timeout { server: String, method: String },

    #[error("JSON-RPC transport closed for '{server}'")]
    TransportClosed { server: String },

    #[error("MCP protocol error ({code}): {message}")]
    ProtocolError { code: i64, message: String },

    #[error("invalid MCP response from '{server}': {message}")]
    InvalidResponse { server: String, message: String },
}

/// One running MCP server process. Requests may be issued concurrently;
/// responses are routed back by JSON-RPC id.
pub(crate) struct McpConnection {
    server_name: String,
    child: Child,
    stdin: Mutex<ChildStdin>,
    pending: SharedPending,
    next_id: AtomicU64,
}

impl McpConnection {
    pub(crate) async fn spawn(config: &McpServerConfig) -> Result<Self, McpClientError> {
        let mut command = Command::new(&config.command);
        command
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &config.cwd {
            command.current_dir(cwd);
        }

        let spawn_failed = |message: String| McpClientError::SpawnFailed {
            server: config.name.clone(),
            message,
        };

        let mut child = command.spawn().map_err(|e| spawn_failed(e.to_string()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| spawn_failed("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failed("failed to capture stdout".to_string()))?;

        let pending: SharedPending = Arc::new(Mutex::new(Pending::default()));
        spawn_stdout_loop(config.name.clone(), stdout, pending.clone());
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_loop(config.name.clone(), stderr);
        }

        tracing::debug!(server = %config.name, command = %config.command, "spawned MCP server");

        Ok(Self {
            server_name: config.name.clone(),
            child,
            stdin: Mutex::new(stdin),
            pending,
            next_id: AtomicU64::new(1),
        })
    }

    pub(crate) async fn handshake(&self, timeout: Duration) -> Result<(), McpClientError> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "mcpkit", "version": env!("CARGO_PKG_VERSION")}
                }),
                timeout,
            )
            .await?;

        if result.get("protocolVersion").is_none() {
            return Err(self.invalid("initialize response missing protocolVersion"));
        }

        self.notify("notifications/initialized", json!({})).await
    }

    /// Collect every page of a `*/list` method
    pub(crate) async fn list_all(
        &self,
        method: &str,
        key: &str,
        timeout: Duration,
    ) -> Result<Vec<Value>, McpClientError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };

            let result = self.request(method, params, timeout).await?;
            let page = result
                .get(key)
                .and_then(Value::as_array)
                .ok_or_else(|| self.invalid(format!("{method} response missing {key}")))?;
            items.extend(page.iter().cloned());

            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                return Ok(items);
            }
        }
    }

    pub(crate) async fn request(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, McpClientError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(self.closed());
            }
            pending.waiting.insert(id, tx);
        }

        if let Err(err) = self.write_message(&message).await {
            self.pending.lock().await.waiting.remove(&id);
            return Err(err);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(self.closed()),
            Err(_) => {
                self.pending.lock().await.waiting.remove(&id);
                Err(McpClientError::Timeout {
                    server: self.server_name.clone(),
                    method: method.to_string(),
                })
            }
        }
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), McpClientError> {
        self.write_message(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        }))
        .await
    }

    async fn write_message(&self, message: &Value) -> Result<(), McpClientError> {
        let mut payload =
            serde_json::to_vec(message).map_err(|e| McpClientError::Serialization(e.to_string()))?;
        payload.push(b'\n');

        let mut stdin = self.stdin.lock().await;
        stdin.write_all(&payload).await.map_err(|_| self.closed())?;
        stdin.flush().await.map_err(|_| self.closed())
    }

    pub(crate) async fn shutdown(mut self) {
        let _ = self.stdin.get_mut().shutdown().await;
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
        fail_all_pending(&self.pending, &self.server_name).await;
        tracing::debug!(server = %self.server_name, "MCP server stopped");
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> McpClientError {
        McpClientError::InvalidResponse {
            server: self.server_name.clone(),
            message: message.into(),
        }
    }

    fn closed(&self) -> McpClientError {
        McpClientError::TransportClosed {
            server: self.server_name.clone(),
        }
    }
}

fn spawn_stdout_loop(server_name: String, mut stdout: ChildStdout, pending: SharedPending) {
    tokio::spawn(async move {
        let mut decoder = FrameDecoder::default();
        let mut read_buf = [0u8; 8192];

        loop {
            let n = match stdout.read(&mut read_buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };

            decoder.push(&read_buf[..n]);
            while let Some(frame) = decoder.next_frame() {
                match serde_json::from_slice::<Value>(&frame) {
                    Ok(message) => dispatch(&server_name, message, &pending).await,
                    Err(e) => {
                        tracing::warn!(server = %server_name, error = %e, "failed to parse MCP message")
                    }
                }
            }
        }

        fail_all_pending(&pending, &server_name).await;
    });
}

/// Route a response to the request waiting on its id; notifications and
/// server-initiated requests are ignored
async fn dispatch(server_name: &str, message: Value, pending: &SharedPending) {
    let Some(id) = message.get("id").and_then(Value::as_u64) else {
        return;
    };

    let outcome = if let Some(error) = message.get("error") {
        Err(McpClientError::ProtocolError {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        })
    } else if let Some(result) = message.get("result") {
        Ok(result.clone())
    } else {
        return;
    };

    match pending.lock().await.waiting.remove(&id) {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => tracing::debug!(server = %server_name, id, "response for unknown request id"),
    }
}

fn spawn_stderr_loop(server_name: String, stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(server = %server_name, "mcp stderr: {}", line);
        }
    });
}

async fn fail_all_pending(pending: &SharedPending, server_name: &str) {
    let drained = {
        let mut pending = pending.lock().await;
        pending.closed = true;
        std::mem::take(&mut pending.waiting)
    };
    for (_, tx) in drained {
        let _ = tx.send(Err(McpClientError::TransportClosed {
            server: server_name.to_string(),
        }));
    }
}
