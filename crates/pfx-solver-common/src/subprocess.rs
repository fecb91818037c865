//! Subprocess management for solver shims.
//!
//! Handles locating shim executables and running one blocking JSON exchange
//! per solve.

use crate::error::{ExitCode, SolverProcessError, SolverProcessResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// Program and fixed arguments of a solver shim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl SolverCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// A solver shim handle.
pub struct SolverProcess {
    command: SolverCommand,
    binary_path: PathBuf,
}

impl SolverProcess {
    /// Resolve the command's program and create a handle.
    pub fn new(command: SolverCommand) -> SolverProcessResult<Self> {
        let binary_path = Self::find_binary(&command.program)?;
        Ok(Self {
            command,
            binary_path,
        })
    }

    /// Find a shim executable.
    ///
    /// Search order:
    /// 1. the program itself when it contains a path separator
    /// 2. ~/.pfx/solvers/<program>
    /// 3. System PATH
    pub fn find_binary(program: &str) -> SolverProcessResult<PathBuf> {
        let direct = Path::new(program);
        if direct.components().count() > 1 {
            if direct.exists() {
                return Ok(direct.to_path_buf());
            }
            return Err(SolverProcessError::NotFound {
                program: program.to_string(),
            });
        }

        if let Some(home) = dirs::home_dir() {
            let pfx_path = home.join(".pfx").join("solvers").join(program);
            if pfx_path.exists() {
                return Ok(pfx_path);
            }
        }

        if let Ok(path) = which::which(program) {
            return Ok(path);
        }

        Err(SolverProcessError::NotFound {
            program: program.to_string(),
        })
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn command(&self) -> &SolverCommand {
        &self.command
    }

    /// Send `request` on stdin and parse the response from stdout (blocking).
    ///
    /// A non-zero exit code is reported with the shim's stderr as message.
    pub fn exchange<Req, Resp>(&self, request: &Req) -> SolverProcessResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        use std::io::Write;

        let start = Instant::now();
        let request_bytes = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.binary_path)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(SolverProcessError::ProcessStart)?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| SolverProcessError::Protocol("stdin was not piped".to_string()))?;
            // a shim that exits before reading surfaces through its exit code below
            if let Err(e) = stdin.write_all(&request_bytes) {
                debug!(error = %e, "solver closed stdin early");
            }
        }
        // stdin is closed when it goes out of scope

        let output = child
            .wait_with_output()
            .map_err(SolverProcessError::ProcessStart)?;
        debug!(
            program = %self.binary_path.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            request_bytes = request_bytes.len(),
            response_bytes = output.stdout.len(),
            "solver exchange finished"
        );

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let Some(code) = output.status.code() else {
            return Err(SolverProcessError::Terminated { message: stderr });
        };
        let exit_code = ExitCode::from_raw(code);
        if !exit_code.is_success() {
            return Err(SolverProcessError::ProcessFailed {
                exit_code,
                message: stderr,
            });
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(SolverProcessError::Protocol(
                "Empty response from solver".to_string(),
            ));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Check if a shim program can be found.
pub fn is_solver_installed(program: &str) -> bool {
    SolverProcess::find_binary(program).is_ok()
}
