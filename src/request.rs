//! Extraction requests: what to read and how to call exiftool

use crate::error::{ExifError, Result};
use serde_json::Value;
use std::path::PathBuf;

/// Subject(s) handed to exiftool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Single file on disk
    Path(PathBuf),
    /// Several files, reported in the order given
    Paths(Vec<PathBuf>),
    /// In-memory bytes, piped through stdin
    Buffer(Vec<u8>),
}

impl Source {
    /// Number of subjects exiftool is asked to report on
    pub fn subject_count(&self) -> usize {
        match self {
            Source::Path(_) | Source::Buffer(_) => 1,
            Source::Paths(paths) => paths.len(),
        }
    }

    /// Empty path strings and empty path lists carry no subject
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Source::Path(p) => p.as_os_str().is_empty(),
            Source::Paths(paths) => paths.is_empty(),
            Source::Buffer(_) => false,
        }
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl From<&str> for Source {
    fn from(path: &str) -> Self {
        Source::Path(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for Source {
    fn from(paths: Vec<PathBuf>) -> Self {
        Source::Paths(paths)
    }
}

impl From<Vec<u8>> for Source {
    fn from(bytes: Vec<u8>) -> Self {
        Source::Buffer(bytes)
    }
}

/// Per-call extraction settings
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Tag filter; `Name` selects a tag, `-Name` excludes it
    pub tags: Vec<String>,
    /// Truncate buffer sources to `max_buffer_bytes`
    pub buffer_limit: bool,
    pub max_buffer_bytes: usize,
    /// Custom exiftool config file (`-config`)
    pub config_path: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            buffer_limit: true,
            max_buffer_bytes: 64 * 1024,  // EXIF/XMP headers live near the start
            config_path: None,
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_limit && self.max_buffer_bytes == 0 {
            return Err(ExifError::InvalidOptions(
                "max_buffer_bytes must be > 0 when buffer_limit is set".to_string(),
            ));
        }

        if let Some(tag) = self.tags.iter().find(|t| t.is_empty() || t.as_str() == "-") {
            return Err(ExifError::InvalidOptions(format!("Invalid tag name: {:?}", tag)));
        }

        if let Some(path) = &self.config_path {
            if path.as_os_str().is_empty() {
                return Err(ExifError::InvalidOptions("config_path is empty".to_string()));
            }
        }

        Ok(())
    }
}

/// A single extraction call
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub source: Option<Source>,
    pub options: ExtractOptions,
}

impl ExtractRequest {
    pub fn new(source: impl Into<Source>) -> Self {
        Self {
            source: Some(source.into()),
            options: ExtractOptions::default(),
        }
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn buffer_limit(mut self, max_bytes: Option<usize>) -> Self {
        match max_bytes {
            Some(max) => {
                self.options.buffer_limit = true;
                self.options.max_buffer_bytes = max;
            }
            None => self.options.buffer_limit = false,
        }
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Pre-flight check run before any process is spawned.
    pub fn validate(&self) -> Result<&Source> {
        let source = match &self.source {
            Some(source) if !source.is_empty() => source,
            Some(_) => {
                return Err(ExifError::TypeMismatch(
                    "source is empty; expected a path, a list of paths or a buffer".to_string(),
                ))
            }
            None => {
                return Err(ExifError::TypeMismatch(
                    "source is missing; expected a path, a list of paths or a buffer".to_string(),
                ))
            }
        };
        self.options.validate()?;
        Ok(source)
    }

    /// Decode a request from organ input.
    ///
    /// `source` is a string, an array of strings, or `{"buffer": [bytes]}`.
    /// Wrong shapes surface as `TypeMismatch`, not as deserialization errors.
    pub fn from_json(input: &Value) -> Result<Self> {
        let source = match input.get("source") {
            None | Some(Value::Null) => None,
            Some(value) => Some(source_from_json(value)?),
        };

        let defaults = ExtractOptions::default();
        let tags = match input.get("tags") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|t| {
                    t.as_str().map(str::to_string).ok_or_else(|| {
                        ExifError::TypeMismatch(format!("tag must be a string, got {}", t))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(ExifError::TypeMismatch(format!("tags must be an array, got {}", other)))
            }
        };

        let buffer_limit = match input.get("buffer_limit") {
            None | Some(Value::Null) => defaults.buffer_limit,
            Some(Value::Bool(limit)) => *limit,
            Some(other) => {
                return Err(ExifError::TypeMismatch(format!("buffer_limit must be a boolean, got {}", other)))
            }
        };

        let max_buffer_bytes = match input.get("max_buffer_bytes") {
            None | Some(Value::Null) => defaults.max_buffer_bytes,
            Some(value) => value
                .as_u64()
                .and_then(|v| usize::try_from(v).ok())
                .ok_or_else(|| {
                    ExifError::TypeMismatch(format!(
                        "max_buffer_bytes must be a non-negative integer, got {}",
                        value
                    ))
                })?,
        };

        let config_path = match input.get("config_path") {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(PathBuf::from(path)),
            Some(other) => {
                return Err(ExifError::TypeMismatch(format!("config_path must be a string, got {}", other)))
            }
        };

        let options = ExtractOptions {
            tags,
            buffer_limit,
            max_buffer_bytes,
            config_path,
        };

        Ok(Self { source, options })
    }
}

fn source_from_json(value: &Value) -> Result<Source> {
    match value {
        Value::String(path) => Ok(Source::Path(PathBuf::from(path))),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(PathBuf::from).ok_or_else(|| {
                    ExifError::TypeMismatch(format!("source paths must be strings, got {}", item))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Source::Paths),
        Value::Object(obj) => {
            let bytes = obj.get("buffer").ok_or_else(|| {
                ExifError::TypeMismatch("source object must have a \"buffer\" field".to_string())
            })?;
            serde_json::from_value::<Vec<u8>>(bytes.clone())
                .map(Source::Buffer)
                .map_err(|e| ExifError::TypeMismatch(format!("buffer must be an array of bytes: {}", e)))
        }
        other => Err(ExifError::TypeMismatch(format!(
            "source must be a path, a list of paths or a buffer, got {}",
            other
        ))),
    }
}
