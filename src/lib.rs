//! soma_exif - ExifTool-based metadata extraction for SOMA platform
//!
//! Provides async and blocking interfaces over the system `exiftool` binary.
//! All operations shell out to `exiftool -j` (no linking, no Perl embedding).

mod command;
mod error;
mod exiftool;
mod output;
mod request;
pub mod metrics;
pub mod organ;

pub use command::{build_args, stdin_payload, ExifToolCommand, CONFIG_FLAG, JSON_FLAG, STDIN_PLACEHOLDER};
pub use error::{ExifError, Result};
pub use exiftool::{exiftool_available, ExifTool, EXIFTOOL_BINARY};
pub use output::{resolve_output, Metadata, Record};
pub use request::{ExtractOptions, ExtractRequest, Source};
