//! External minifier process bridge.
//!
//! Each call spawns one process, streams the bundle into its stdin and reads
//! the compressed result from its stdout. Development builds never get here.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::debug;

use crate::mode::BuildMode;
use crate::{Error, Result};

/// Program and arguments of the minifier. It must read stdin and write stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MinifierCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for MinifierCommand {
    fn default() -> Self {
        Self {
            program: "uglifyjs".to_string(),
            args: vec!["-c".to_string(), "-m".to_string()],
        }
    }
}

impl MinifierCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Turns source into smaller source.
#[async_trait]
pub trait Minify: Send + Sync {
    async fn minify(&self, code: &str) -> Result<String>;
}

/// Runs a [`MinifierCommand`] once per call.
#[derive(Debug, Clone, Default)]
pub struct ProcessMinifier {
    command: MinifierCommand,
}

impl ProcessMinifier {
    pub fn new(command: MinifierCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Minify for ProcessMinifier {
    async fn minify(&self, code: &str) -> Result<String> {
        MinifierProcess::spawn(&self.command)?
            .run(code.as_bytes())
            .await
    }
}

/// A running minifier.
///
/// Dropping the guard on any path kills the child if it is still alive; `run`
/// consumes the guard and reaps the child before returning.
pub struct MinifierProcess {
    child: Child,
    program: String,
}

impl MinifierProcess {
    pub fn spawn(command: &MinifierCommand) -> Result<Self> {
        debug!(program = %command.program, args = ?command.args, "spawning minifier");
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Subprocess {
                program: command.program.clone(),
                reason: format!("failed to start: {e}"),
            })?;

        Ok(Self {
            child,
            program: command.program.clone(),
        })
    }

    /// Feed `input`, close stdin, and collect stdout.
    ///
    /// A non-zero exit wins over stream errors, since a dying child usually
    /// breaks the pipe too and its stderr says why.
    pub async fn run(mut self, input: &[u8]) -> Result<String> {
        let (mut stdin, mut stdout, mut stderr) = match (
            self.child.stdin.take(),
            self.child.stdout.take(),
            self.child.stderr.take(),
        ) {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => return Err(self.failure("stdio pipes were not captured")),
        };

        let feed = async move {
            stdin.write_all(input).await?;
            stdin.shutdown().await
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        let (fed, read_out, read_err) = tokio::join!(
            feed,
            stdout.read_to_end(&mut out),
            stderr.read_to_end(&mut err)
        );

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| self.failure(format!("failed to wait: {e}")))?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&err);
            let stderr = stderr.trim();
            return Err(self.failure(if stderr.is_empty() {
                format!("exited with {status}")
            } else {
                format!("exited with {status}: {stderr}")
            }));
        }

        for result in [fed, read_out.map(drop), read_err.map(drop)] {
            result.map_err(|e| self.failure(format!("stream error: {e}")))?;
        }

        String::from_utf8(out).map_err(|e| self.failure(format!("output is not UTF-8: {e}")))
    }

    fn failure(&self, reason: impl Into<String>) -> Error {
        Error::Subprocess {
            program: self.program.clone(),
            reason: reason.into(),
        }
    }
}

/// Mode-aware minification with the license banner prepended.
pub struct MinifierBridge {
    engine: Arc<dyn Minify>,
    mode: BuildMode,
}

impl MinifierBridge {
    pub fn new(engine: Arc<dyn Minify>, mode: BuildMode) -> Self {
        Self { engine, mode }
    }

    /// `None` outside release builds; nothing is spawned then.
    pub async fn minify(&self, code: &str, header: &str) -> Result<Option<String>> {
        if !self.mode.runs_minifier() {
            return Ok(None);
        }
        let minified = self.engine.minify(code).await?;
        Ok(Some(format!("{header}{minified}")))
    }
}

impl std::fmt::Debug for MinifierBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MinifierBridge")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
