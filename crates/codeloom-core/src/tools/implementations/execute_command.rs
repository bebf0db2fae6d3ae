//! execute_command tool - run a shell command inside the workspace
//!
//! stdout and stderr are captured into one bounded buffer. A non-zero exit
//! is still a successful tool call; the model sees the output and decides.
//! Only a timeout is a tool error.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::constants;
use crate::tools::registry::{parse_params, Tool, ToolContext, ToolError};

const MAX_CAPTURE_LINES: usize = 8_000;
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[\?0-9;]*[a-zA-Z]|\x1b\][^\x07]*\x07").expect("valid regex")
});

pub struct ExecuteCommandTool;

#[derive(Deserialize)]
struct Params {
    command: String,
}

/// Keeps the most recent output within line and byte limits
struct BoundedOutputBuffer {
    lines: VecDeque<String>,
    total_bytes: usize,
    dropped_lines: usize,
    max_lines: usize,
    max_bytes: usize,
}

impl BoundedOutputBuffer {
    fn new(max_lines: usize, max_bytes: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            total_bytes: 0,
            dropped_lines: 0,
            max_lines,
            max_bytes,
        }
    }

    fn push_line(&mut self, line: &str) {
        let kept = tail_by_bytes(line, self.max_bytes);
        self.total_bytes = self.total_bytes.saturating_add(kept.len());
        self.lines.push_back(kept);

        while self.lines.len() > self.max_lines || self.total_bytes > self.max_bytes {
            match self.lines.pop_front() {
                Some(removed) => {
                    self.total_bytes = self.total_bytes.saturating_sub(removed.len());
                    self.dropped_lines += 1;
                }
                None => break,
            }
        }
    }

    fn into_text(self) -> String {
        let mut out = self.lines.into_iter().collect::<Vec<_>>().join("\n");
        if self.dropped_lines > 0 {
            out = format!(
                "[... omitted {} earlier line(s) ...]\n{}",
                self.dropped_lines, out
            );
        }
        out
    }
}

/// Keep the tail of a string within `max_bytes`, preserving UTF-8 boundaries.
fn tail_by_bytes(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut start = text.len() - max_bytes;
    while start < text.len() && !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Prefix `cd <root> &&` unless the command already names the root
pub(crate) fn scope_to_workspace(command: &str, root: &Path) -> String {
    let root = root.to_string_lossy();
    if command.contains(root.as_ref()) {
        command.to_string()
    } else {
        format!("cd {} && {}", shell_words::quote(&root), command)
    }
}

fn build_shell_command(command: &str, root: &Path) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command);
        c
    };
    cmd.env("NO_COLOR", "1")
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd
}

async fn collect_pipe_output<R>(pipe: Option<R>, buffer: Arc<Mutex<BoundedOutputBuffer>>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(pipe) = pipe else {
        return;
    };
    let mut reader = BufReader::new(pipe).lines();
    while let Ok(Some(line)) = reader.next_line().await {
        buffer.lock().await.push_line(&line);
    }
}

async fn join_reader(mut handle: tokio::task::JoinHandle<()>) {
    if timeout(READER_JOIN_TIMEOUT, &mut handle).await.is_err() {
        handle.abort();
    }
}

/// Run `command` under the shell in `root`, returning combined output and
/// the exit code (`None` when terminated by a signal)
pub(crate) async fn run_in_workspace(
    command: &str,
    ctx: &ToolContext,
) -> Result<(String, Option<i32>), ToolError> {
    let scoped = scope_to_workspace(command, ctx.root());
    info!(command = %scoped, "Executing command");

    let mut child = build_shell_command(&scoped, ctx.root()).spawn()?;

    let buffer = Arc::new(Mutex::new(BoundedOutputBuffer::new(
        MAX_CAPTURE_LINES,
        constants::agent::MAX_COMMAND_OUTPUT_BYTES,
    )));
    let stdout_handle = tokio::spawn(collect_pipe_output(child.stdout.take(), Arc::clone(&buffer)));
    let stderr_handle = tokio::spawn(collect_pipe_output(child.stderr.take(), Arc::clone(&buffer)));

    let status = match timeout(ctx.command_timeout, child.wait()).await {
        Ok(status) => status?,
        Err(_) => {
            warn!(
                timeout_secs = ctx.command_timeout.as_secs(),
                "Command timed out, killing"
            );
            let _ = child.kill().await;
            stdout_handle.abort();
            stderr_handle.abort();
            return Err(ToolError::Timeout(ctx.command_timeout.as_secs()));
        }
    };

    join_reader(stdout_handle).await;
    join_reader(stderr_handle).await;

    let raw = {
        let mut guard = buffer.lock().await;
        std::mem::replace(&mut *guard, BoundedOutputBuffer::new(0, 0)).into_text()
    };
    let output = ANSI_ESCAPE.replace_all(&raw, "").into_owned();
    debug!(exit_code = ?status.code(), output_len = output.len(), "Command finished");
    Ok((output, status.code()))
}

#[async_trait]
impl Tool for ExecuteCommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the project workspace and return its combined stdout and stderr."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let params: Params = parse_params(self.name(), params)?;
        let (output, exit_code) = run_in_workspace(&params.command, ctx).await?;

        let mut result = format!("Result upon execution: {}", output);
        match exit_code {
            Some(0) => {}
            Some(code) => result.push_str(&format!("\n[exit code: {}]", code)),
            None => result.push_str("\n[terminated by signal]"),
        }
        Ok(result)
    }
}
