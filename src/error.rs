use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExifError {
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Failed to launch exiftool: {0}")]
    Launch(#[source] std::io::Error),

    #[error("exiftool exited with code {}: {}", display_code(.exit_code), trimmed(.stderr))]
    ToolFailed {
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("Could not parse exiftool output (exit code {})", display_code(.exit_code))]
    UnparseableOutput {
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExifError {
    /// Exit code of the tool, when the failure happened after it ran.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ToolFailed { exit_code, .. } | Self::UnparseableOutput { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { stderr, .. } | Self::UnparseableOutput { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { stdout, .. } | Self::UnparseableOutput { stdout, .. } => Some(stdout),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

fn trimmed(s: &str) -> &str {
    s.trim_end()
}

pub type Result<T> = std::result::Result<T, ExifError>;
