//! Engine backed by an external executable.
//!
//! Runs `<program> [args..] pull <store_url> <image>` in a fresh scratch
//! directory. Every non-empty stdout line is reported as one progress
//! message; a non-zero exit fails the pull with the captured stderr.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use crate::engine::{ProgressSender, PullEngine};
use crate::error::EngineError;
use crate::pull::{PullParams, RegistryAuth};

/// Maximum stderr captured from the engine process (64 KiB).
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// Prefix of the per-pull scratch directory created under the temp dir.
const WORKDIR_PREFIX: &str = "pull-";

/// [`PullEngine`] that shells out to a pull executable.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the `pull` subcommand.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl PullEngine for CommandEngine {
    fn pull(&self, params: &PullParams, progress: &ProgressSender) -> Result<(), EngineError> {
        std::fs::create_dir_all(&params.temp_dir).map_err(EngineError::Spawn)?;
        // Removed when dropped at the end of the pull.
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(&params.temp_dir)
            .map_err(EngineError::Spawn)?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("pull")
            .arg(&params.store_url)
            .arg(&params.image)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        apply_credentials(&mut cmd, &params.auth);

        tracing::debug!(
            program = %self.program,
            image = %params.image,
            workdir = %workdir.path().display(),
            "Starting engine process",
        );

        let mut child = cmd.spawn().map_err(EngineError::Spawn)?;

        // Drain stderr on its own thread so a chatty engine cannot block on a
        // full pipe while we are reading stdout.
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || read_capped(stderr));

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, progress);
        }

        let status = child
            .wait()
            .map_err(|e| EngineError::Failed(format!("failed to wait for engine: {e}")))?;
        let stderr = stderr_reader.join().unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(EngineError::ExitStatus {
                exit_code: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

fn apply_credentials(cmd: &mut Command, auth: &RegistryAuth) {
    let vars = [
        ("REGISTRY_USERNAME", &auth.username),
        ("REGISTRY_PASSWORD", &auth.password),
        ("REGISTRY_EMAIL", &auth.email),
        ("REGISTRY_SERVER", &auth.server_address),
    ];
    for (key, value) in vars {
        if let Some(value) = value {
            cmd.env(key, value);
        }
    }
}

/// Report each non-empty line of `stdout` as a progress message.
///
/// Keeps reading after the receiver is gone so the child never blocks on a
/// full pipe.
fn forward_lines<R: Read>(stdout: R, progress: &ProgressSender) {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim();
                if !line.is_empty() {
                    progress.send(line);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read engine output");
                break;
            }
        }
    }
}

fn read_capped<R: Read>(handle: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_STDERR_BYTES).read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
