//! UMA Organ Interface for soma_exif
//!
//! Exposes exiftool-backed metadata extraction through the Universal Module
//! Architecture (UMA) stimulus/response interface, so SOMA orchestrators can
//! discover and invoke it like any other organ.
//!
//! ## Available Operations
//!
//! 1. `metadata.extract` - Extract tags from a file, a list of files or a buffer
//! 2. `metadata.version` - Report the installed exiftool version
//! 3. `metadata.capabilities` - Capability card query
//! 4. `metrics` - Request counters and latency
//!
//! ## Example
//!
//! ```rust,no_run
//! use soma_exif::organ::{ExifOrgan, Organ, Stimulus};
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let organ = ExifOrgan::new();
//!
//! let response = organ.stimulate(Stimulus {
//!     op: "metadata.extract".to_string(),
//!     input: json!({"source": "photo.jpg", "tags": ["Model", "-ThumbnailImage"]}),
//!     context: HashMap::new(),
//! }).await?;
//! println!("{}", response.output);
//! # Ok(())
//! # }
//! ```

use crate::error::ExifError;
use crate::exiftool::ExifTool;
use crate::metrics::{Metrics, Timer};
use crate::request::ExtractRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// UMA Stimulus - input to organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stimulus {
    pub op: String,
    pub input: Value,
    #[serde(default)]
    pub context: HashMap<String, String>,
}

/// UMA Response - output from organ operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    pub output: Value,
    pub latency_ms: u64,
    pub cost: Option<f64>,
}

/// Organ trait - all SOMA organs implement this
#[async_trait]
pub trait Organ: Send + Sync {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError>;
    fn describe(&self) -> OrganCard;
}

/// Organ-level errors
#[derive(Debug, Error)]
pub enum OrganError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    Exif(#[from] ExifError),
}

impl OrganError {
    /// Error payload for an `ok: false` response
    pub fn to_output(&self) -> Value {
        let mut output = json!({ "error": self.to_string() });
        if let OrganError::Exif(err) = self {
            output["kind"] = json!(exif_error_kind(err));
            if let (Some(stderr), Some(stdout)) = (err.stderr(), err.stdout()) {
                output["exit_code"] = json!(err.exit_code());
                output["stderr"] = json!(stderr);
                output["stdout"] = json!(stdout);
            }
        }
        output
    }
}

fn exif_error_kind(err: &ExifError) -> &'static str {
    match err {
        ExifError::TypeMismatch(_) => "TypeMismatch",
        ExifError::InvalidOptions(_) => "InvalidOptions",
        ExifError::Launch(_) => "Launch",
        ExifError::ToolFailed { .. } => "ToolFailed",
        ExifError::UnparseableOutput { .. } => "UnparseableOutput",
        ExifError::Io(_) => "Io",
    }
}

/// Organ capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganCard {
    pub name: String,
    pub version: String,
    pub description: String,
    pub division: String,
    pub subsystem: String,
    pub tags: Vec<String>,
    pub execution_modes: Vec<String>,
    pub functions: Vec<FunctionCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

/// Function capability card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCard {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub examples: Vec<String>,
    pub idempotent: bool,
    pub side_effects: Vec<String>,
    pub input_schema: Option<Value>,
    pub output_schema: Value,
}

const OPERATIONS: [&str; 4] = ["metadata.extract", "metadata.version", "metadata.capabilities", "metrics"];

/// Metadata Extraction Organ
pub struct ExifOrgan {
    exiftool: ExifTool,
    metrics: Arc<Metrics>,
}

impl ExifOrgan {
    pub fn new() -> Self {
        Self::with_exiftool(ExifTool::new())
    }

    pub fn with_exiftool(exiftool: ExifTool) -> Self {
        Self {
            exiftool,
            metrics: Metrics::new(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    pub fn exiftool(&self) -> &ExifTool {
        &self.exiftool
    }

    /// Handle metadata.extract operation
    async fn handle_extract(&self, input: Value) -> Result<Value, OrganError> {
        let request = ExtractRequest::from_json(&input)?;
        let metadata = self.exiftool.extract(&request).await?;

        debug!(records = metadata.len(), "Extraction complete");
        self.metrics.record_records(metadata.len());

        Ok(serde_json::to_value(&metadata)?)
    }

    /// Handle metadata.version operation
    async fn handle_version(&self) -> Result<Value, OrganError> {
        let version = self.exiftool.version().await?;
        Ok(json!({
            "version": version,
            "binary": self.exiftool.binary().display().to_string(),
        }))
    }

    /// Handle metadata.capabilities operation
    fn handle_capabilities(&self) -> Result<Value, OrganError> {
        let card = self.describe();
        serde_json::to_value(&card).map_err(OrganError::SerializationError)
    }

    async fn dispatch(&self, stimulus: Stimulus) -> Result<Value, OrganError> {
        match stimulus.op.as_str() {
            "metadata.extract" => self.handle_extract(stimulus.input).await,
            "metadata.version" => self.handle_version().await,
            "metadata.capabilities" => self.handle_capabilities(),
            "metrics" => Ok(json!(self.metrics.snapshot())),
            _ => Err(OrganError::UnsupportedOperation(stimulus.op)),
        }
    }
}

impl Default for ExifOrgan {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Organ for ExifOrgan {
    async fn stimulate(&self, stimulus: Stimulus) -> Result<Response, OrganError> {
        let timer = Timer::new();
        let op = stimulus.op.clone();

        let result = self.dispatch(stimulus).await;
        let latency = timer.elapsed_ms();
        self.metrics.record_request(&op, result.is_ok(), latency);

        let (ok, output) = match result {
            Ok(output) => (true, output),
            Err(OrganError::UnsupportedOperation(op)) => (false, json!({
                "error": "UnsupportedOperation",
                "op": op,
                "available_operations": OPERATIONS,
            })),
            Err(e) => {
                debug!(op = %op, error = %e, "Operation failed");
                (false, e.to_output())
            }
        };

        Ok(Response {
            ok,
            output,
            latency_ms: latency,
            cost: None,
        })
    }

    fn describe(&self) -> OrganCard {
        OrganCard {
            name: "soma_exif".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "ExifTool-backed metadata extraction organ for images, video, audio and documents".to_string(),
            division: "media".to_string(),
            subsystem: "metadata".to_string(),
            tags: vec![
                "media".to_string(),
                "metadata".to_string(),
                "exif".to_string(),
                "xmp".to_string(),
                "iptc".to_string(),
                "exiftool".to_string(),
            ],
            execution_modes: vec![
                "embedded".to_string(),
                "sidecar".to_string(),
                "server".to_string(),
            ],
            author: Some("SOMA Media Team".to_string()),
            repository: Some("https://github.com/unistorm10/soma_exif".to_string()),
            functions: vec![
                FunctionCard {
                    name: "metadata.extract".to_string(),
                    description: "Extract metadata tags with exiftool from a file path, a list of paths or an in-memory buffer".to_string(),
                    tags: vec!["metadata".to_string(), "exif".to_string(), "extraction".to_string()],
                    examples: vec![
                        "Read camera model and lens from a JPEG".to_string(),
                        "Batch-read capture dates for a list of RAW files".to_string(),
                        "Inspect an uploaded image buffer without writing it to disk".to_string(),
                    ],
                    idempotent: true,
                    side_effects: vec!["invokes exiftool".to_string()],
                    input_schema: Some(json!({
                        "type": "object",
                        "properties": {
                            "source": {
                                "description": "Path, array of paths, or {\"buffer\": [bytes]}",
                                "oneOf": [
                                    { "type": "string" },
                                    { "type": "array", "items": { "type": "string" } },
                                    { "type": "object", "properties": { "buffer": { "type": "array", "items": { "type": "integer" } } } }
                                ]
                            },
                            "tags": { "type": "array", "items": { "type": "string" }, "description": "Tag filter; prefix with '-' to exclude" },
                            "buffer_limit": { "type": "boolean", "description": "Truncate buffer sources (default: true)" },
                            "max_buffer_bytes": { "type": "integer", "description": "Bytes of a buffer sent to exiftool (default: 65536)" },
                            "config_path": { "type": "string", "description": "Custom exiftool config file" }
                        },
                        "required": ["source"]
                    })),
                    output_schema: json!({
                        "description": "One record object for a single subject, otherwise an array of records",
                        "oneOf": [
                            { "type": "object" },
                            { "type": "array", "items": { "type": "object" } }
                        ]
                    }),
                },
                FunctionCard {
                    name: "metadata.version".to_string(),
                    description: "Report the exiftool version this organ is running against".to_string(),
                    tags: vec!["metadata".to_string(), "health".to_string()],
                    examples: vec![
                        "Check exiftool is installed before scheduling extraction".to_string(),
                    ],
                    idempotent: true,
                    side_effects: vec!["invokes exiftool".to_string()],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "version": { "type": "string" },
                            "binary": { "type": "string" }
                        }
                    }),
                },
                FunctionCard {
                    name: "metadata.capabilities".to_string(),
                    description: "Return organ capability card with all available functions and metadata".to_string(),
                    tags: vec!["metadata".to_string(), "discovery".to_string(), "mcp".to_string()],
                    examples: vec![
                        "Discover available metadata operations".to_string(),
                        "Query organ capabilities for orchestration".to_string(),
                    ],
                    idempotent: true,
                    side_effects: vec![],
                    input_schema: None,
                    output_schema: json!({
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "version": { "type": "string" },
                            "functions": { "type": "array" }
                        }
                    }),
                },
            ],
        }
    }
}
