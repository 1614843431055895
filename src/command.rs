//! ExifTool command-line construction
//!
//! Pure functions shared by the async and blocking runners, so both call
//! styles always hand exiftool the same argv and the same stdin bytes.

use crate::error::Result;
use crate::request::{ExtractRequest, Source};
use std::ffi::OsString;
use std::path::Path;

/// Selects JSON output
pub const JSON_FLAG: &str = "-j";

/// Tells exiftool to read the subject from stdin
pub const STDIN_PLACEHOLDER: &str = "-";

/// Loads a user config file; exiftool only honours it as the first argument
pub const CONFIG_FLAG: &str = "-config";

/// exiftool argv; paths are kept as raw OS strings so non-UTF-8 names survive
pub struct ExifToolCommand {
    args: Vec<OsString>,
}

impl ExifToolCommand {
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// `Model` becomes `-Model`, `-ThumbnailImage` becomes `--ThumbnailImage`
    pub fn tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        self.args.extend(tags.iter().map(|t| OsString::from(format!("-{}", t.as_ref()))));
        self
    }

    pub fn json(mut self) -> Self {
        self.args.push(JSON_FLAG.into());
        self
    }

    pub fn source(mut self, source: &Source) -> Self {
        match source {
            Source::Buffer(_) => self.args.push(STDIN_PLACEHOLDER.into()),
            Source::Path(path) => self.args.push(path_arg(path)),
            Source::Paths(paths) => self.args.extend(paths.iter().map(|p| path_arg(p))),
        }
        self
    }

    /// Puts `-config <path>` at the very front, whatever was added before
    pub fn config(mut self, path: impl AsRef<Path>) -> Self {
        self.args.insert(0, path_arg(path.as_ref()));
        self.args.insert(0, CONFIG_FLAG.into());
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn into_args(self) -> Vec<OsString> {
        self.args
    }
}

impl Default for ExifToolCommand {
    fn default() -> Self {
        Self::new()
    }
}

fn path_arg(path: &Path) -> OsString {
    path.as_os_str().to_owned()
}

/// Validate the request and build the full exiftool argv for it.
pub fn build_args(request: &ExtractRequest) -> Result<Vec<OsString>> {
    let source = request.validate()?;

    let mut cmd = ExifToolCommand::new()
        .tags(request.options.tags.as_slice())
        .json()
        .source(source);

    if let Some(config) = &request.options.config_path {
        cmd = cmd.config(config);
    }

    Ok(cmd.into_args())
}

/// Bytes to write to exiftool's stdin, if the source is a buffer.
pub fn stdin_payload(request: &ExtractRequest) -> Option<&[u8]> {
    match &request.source {
        Some(Source::Buffer(bytes)) => {
            let opts = &request.options;
            if opts.buffer_limit && bytes.len() > opts.max_buffer_bytes {
                Some(&bytes[..opts.max_buffer_bytes])
            } else {
                Some(bytes.as_slice())
            }
        }
        _ => None,
    }
}
