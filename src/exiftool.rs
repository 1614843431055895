//! ExifTool process runner
//!
//! `extract` drives the child through tokio, `extract_blocking` through
//! `std::process`. Both take their argv from [`build_args`], their stdin
//! bytes from [`stdin_payload`] and resolve through [`resolve_output`].

use crate::command::{build_args, stdin_payload};
use crate::error::{ExifError, Result};
use crate::output::{resolve_output, Metadata};
use crate::request::ExtractRequest;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Default binary name, resolved through `PATH`
pub const EXIFTOOL_BINARY: &str = "exiftool";

#[derive(Debug, Clone)]
pub struct ExifTool {
    binary: PathBuf,
}

impl ExifTool {
    pub fn new() -> Self {
        Self::with_binary(EXIFTOOL_BINARY)
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Extract metadata without blocking the runtime.
    pub async fn extract(&self, request: &ExtractRequest) -> Result<Metadata> {
        let args = build_args(request)?;
        let input = stdin_payload(request);

        debug!(binary = ?self.binary, args = ?args, stdin_bytes = ?input.map(<[u8]>::len), "Running exiftool");

        let mut child = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::inherit() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ExifError::Launch)?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let (Some(mut stdin), Some(bytes)) = (stdin, input) {
                stdin.write_all(bytes).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        tolerate_broken_pipe(fed)?;
        let output = output?;

        debug!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "exiftool finished"
        );

        resolve_output(output.status.code(), &output.stdout, &output.stderr)
    }

    /// Async extraction that also reports the outcome to `on_complete`.
    ///
    /// The callback sees exactly what the future resolves to, validation
    /// failures included.
    pub async fn extract_with_callback<F>(&self, request: &ExtractRequest, on_complete: F) -> Result<Metadata>
    where
        F: FnOnce(&Result<Metadata>),
    {
        let result = self.extract(request).await;
        on_complete(&result);
        result
    }

    /// Extract metadata, blocking the calling thread until exiftool exits.
    pub fn extract_blocking(&self, request: &ExtractRequest) -> Result<Metadata> {
        let args = build_args(request)?;
        let input = stdin_payload(request);

        debug!(binary = ?self.binary, args = ?args, stdin_bytes = ?input.map(<[u8]>::len), "Running exiftool (blocking)");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::inherit() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ExifError::Launch)?;

        // Feed stdin from a helper thread so a full stdout pipe can't deadlock us
        let output = std::thread::scope(|scope| -> Result<std::process::Output> {
            let writer = match (child.stdin.take(), input) {
                (Some(mut stdin), Some(bytes)) => Some(scope.spawn(move || stdin.write_all(bytes))),
                _ => None,
            };

            let output = child.wait_with_output();

            if let Some(writer) = writer {
                match writer.join() {
                    Ok(fed) => tolerate_broken_pipe(fed)?,
                    Err(_) => {
                        return Err(ExifError::Io(std::io::Error::new(
                            ErrorKind::Other,
                            "stdin writer thread panicked",
                        )))
                    }
                }
            }

            output.map_err(ExifError::Io)
        })?;

        debug!(
            exit_code = ?output.status.code(),
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "exiftool finished"
        );

        resolve_output(output.status.code(), &output.stdout, &output.stderr)
    }

    /// Installed exiftool version (`exiftool -ver`)
    pub async fn version(&self) -> Result<String> {
        let output = tokio::process::Command::new(&self.binary)
            .arg("-ver")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(ExifError::Launch)?;
        version_from_output(output)
    }

    pub fn version_blocking(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("-ver")
            .stdin(Stdio::null())
            .output()
            .map_err(ExifError::Launch)?;
        version_from_output(output)
    }

    /// Whether this binary answers `-ver`
    pub fn available(&self) -> bool {
        self.version_blocking().is_ok()
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if ExifTool is available on the system
pub fn exiftool_available() -> bool {
    ExifTool::new().available()
}

/// exiftool may stop reading stdin once it has seen enough of the file
fn tolerate_broken_pipe(result: std::io::Result<()>) -> Result<()> {
    match result {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("exiftool closed stdin early");
            Ok(())
        }
        other => other.map_err(ExifError::Io),
    }
}

fn version_from_output(output: std::process::Output) -> Result<String> {
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if output.status.success() && !version.is_empty() {
        return Ok(version);
    }

    let exit_code = output.status.code();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if stderr.trim().is_empty() {
        Err(ExifError::UnparseableOutput { exit_code, stderr, stdout: version })
    } else {
        Err(ExifError::ToolFailed { exit_code, stderr, stdout: version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_not_available() {
        assert!(!ExifTool::with_binary("/nonexistent/exiftool").available());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_version_error_kind_follows_stderr() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::{ExitStatus, Output};

        let quiet = Output {
            status: ExitStatus::from_raw(1 << 8),
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        let err = version_from_output(quiet).unwrap_err();
        assert!(matches!(err, ExifError::UnparseableOutput { exit_code: Some(1), .. }));

        let noisy = Output {
            status: ExitStatus::from_raw(2 << 8),
            stdout: Vec::new(),
            stderr: b"Can't locate Image/ExifTool.pm\n".to_vec(),
        };
        let err = version_from_output(noisy).unwrap_err();
        assert!(matches!(err, ExifError::ToolFailed { exit_code: Some(2), .. }));
        assert!(err.to_string().contains("Image/ExifTool.pm"));

        let ok = Output {
            status: ExitStatus::from_raw(0),
            stdout: b"12.76\n".to_vec(),
            stderr: Vec::new(),
        };
        assert_eq!(version_from_output(ok).unwrap(), "12.76");
    }

    #[test]
    fn test_default_binary() {
        assert_eq!(ExifTool::default().binary(), Path::new("exiftool"));
    }

    #[test]
    fn test_blocking_missing_binary_is_launch_error() {
        let tool = ExifTool::with_binary("/nonexistent/exiftool");
        let err = tool.extract_blocking(&ExtractRequest::new("a.jpg")).unwrap_err();
        assert!(matches!(err, ExifError::Launch(_)));
    }

    #[tokio::test]
    async fn test_async_missing_binary_is_launch_error() {
        let tool = ExifTool::with_binary("/nonexistent/exiftool");
        let err = tool.extract(&ExtractRequest::new("a.jpg")).await.unwrap_err();
        assert!(matches!(err, ExifError::Launch(_)));
    }

    #[tokio::test]
    async fn test_validation_precedes_spawn() {
        // a missing binary would give Launch; TypeMismatch proves nothing was spawned
        let tool = ExifTool::with_binary("/nonexistent/exiftool");
        let req = ExtractRequest { source: None, options: Default::default() };

        let mut seen = None;
        let err = tool
            .extract_with_callback(&req, |r| seen = Some(matches!(r, Err(ExifError::TypeMismatch(_)))))
            .await
            .unwrap_err();
        assert!(matches!(err, ExifError::TypeMismatch(_)));
        assert_eq!(seen, Some(true));

        assert!(matches!(tool.extract_blocking(&req), Err(ExifError::TypeMismatch(_))));
    }
}
