//! Core types shared across the decoder, analyzer and comparator.

use crate::error::{Result, SaveScopeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Options for decoding, analysis and comparison.
///
/// Every cap and threshold used by the scans lives here so that a caller
/// can widen or narrow them without touching the algorithms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    /// Bytes rendered in the hex dump
    pub hex_dump_bytes: usize,
    /// Shortest printable run reported as a string
    pub min_string_len: usize,
    /// Maximum number of strings kept per file
    pub max_strings: usize,
    /// Prefix searched for embedded signatures
    pub signature_window: usize,
    /// Maximum number of numeric field candidates kept per file
    pub max_numeric_fields: usize,
    /// Minimum occurrences for a repeating 4-byte window
    pub min_pattern_count: usize,
    /// Maximum number of repeating windows reported
    pub max_patterns: usize,
    /// Prefix over which static offsets are computed
    pub static_prefix: usize,
    /// Maximum number of variable offsets listed in reports
    pub max_variable_report: usize,
    /// Minimum number of usable files for a comparison
    pub min_samples: usize,
    /// Allowed gap between declared and actual payload size for passthrough
    pub passthrough_tolerance: u64,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyzerOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            hex_dump_bytes: 2048,
            min_string_len: 4,
            max_strings: 50,
            signature_window: 256,
            max_numeric_fields: 20,
            min_pattern_count: 3,
            max_patterns: 10,
            static_prefix: 256,
            max_variable_report: 50,
            min_samples: 2,
            passthrough_tolerance: 100,
        }
    }

    /// Create options for thorough analysis (larger windows and caps).
    pub fn thorough() -> Self {
        Self {
            hex_dump_bytes: 16 * 1024,
            max_strings: 500,
            signature_window: 4096,
            max_numeric_fields: 200,
            max_patterns: 50,
            static_prefix: 4096,
            max_variable_report: 500,
            ..Self::new()
        }
    }

    /// Create options for a quick overview.
    pub fn fast() -> Self {
        Self {
            hex_dump_bytes: 256,
            min_string_len: 6,
            max_strings: 20,
            signature_window: 64,
            max_numeric_fields: 10,
            max_patterns: 5,
            static_prefix: 64,
            max_variable_report: 20,
            ..Self::new()
        }
    }

    /// Check that the options describe a usable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.min_string_len == 0 {
            return Err(SaveScopeError::Config {
                message: "min_string_len must be at least 1".to_string(),
            });
        }
        if self.min_samples < 2 {
            return Err(SaveScopeError::Config {
                message: format!("min_samples must be at least 2, got {}", self.min_samples),
            });
        }
        if self.min_pattern_count == 0 {
            return Err(SaveScopeError::Config {
                message: "min_pattern_count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Sample files - raw bytes plus the metadata reports show
// =============================================================================

/// File metadata supplied alongside the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name (no directory)
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time, if known
    pub modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    /// Metadata for an in-memory buffer.
    pub fn in_memory(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            modified: None,
        }
    }
}

/// One member of a corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleFile {
    /// Where the sample came from
    pub path: PathBuf,
    /// Raw file contents
    pub bytes: Vec<u8>,
    /// Name, size and modification time
    pub metadata: FileMetadata,
}

impl SampleFile {
    /// Build a sample from bytes already in memory.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        let metadata = FileMetadata::in_memory(name, bytes.len() as u64);
        Self {
            path,
            bytes,
            metadata,
        }
    }

    /// Attach a modification time.
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.metadata.modified = Some(modified);
        self
    }

    /// Read a sample from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let modified = std::fs::metadata(path)?
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        let metadata = FileMetadata {
            name: file_name(path),
            size: bytes.len() as u64,
            modified,
        };
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
            metadata,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

// =============================================================================
// Diagnostic notes
// =============================================================================

/// Diagnostic note attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Severity level
    pub level: NoteLevel,
    /// Note message
    pub message: String,
    /// Optional context (e.g., "deflate")
    pub context: Option<String>,
}

impl Note {
    /// Create an info note.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoteLevel::Info,
            message: message.into(),
            context: None,
        }
    }

    /// Create a warning note.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoteLevel::Warning,
            message: message.into(),
            context: None,
        }
    }

    /// Create an error note.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoteLevel::Error,
            message: message.into(),
            context: None,
        }
    }

    /// Add context to the note.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "[{}] {}: {}", self.level, ctx, self.message),
            None => write!(f, "[{}] {}", self.level, self.message),
        }
    }
}

/// Note severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteLevel {
    /// Informational
    Info,
    /// Warning (non-fatal issue)
    Warning,
    /// Error (handled, reported in the outcome)
    Error,
}

impl fmt::Display for NoteLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteLevel::Info => write!(f, "info"),
            NoteLevel::Warning => write!(f, "warn"),
            NoteLevel::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_presets() {
        let default = AnalyzerOptions::new();
        let thorough = AnalyzerOptions::thorough();
        let fast = AnalyzerOptions::fast();

        assert_eq!(default.hex_dump_bytes, 2048);
        assert_eq!(default.static_prefix, 256);
        assert!(thorough.max_strings > default.max_strings);
        assert!(fast.hex_dump_bytes < default.hex_dump_bytes);
        assert_eq!(fast.min_samples, 2);
    }

    #[test]
    fn test_options_validate() {
        assert!(AnalyzerOptions::new().validate().is_ok());

        let mut opts = AnalyzerOptions::new();
        opts.min_samples = 1;
        assert!(matches!(
            opts.validate(),
            Err(SaveScopeError::Config { .. })
        ));

        let mut opts = AnalyzerOptions::new();
        opts.min_string_len = 0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_sample_from_bytes() {
        let sample = SampleFile::from_bytes("saves/slot1.sav", vec![1, 2, 3]);
        assert_eq!(sample.metadata.name, "slot1.sav");
        assert_eq!(sample.metadata.size, 3);
        assert!(sample.metadata.modified.is_none());
    }

    #[test]
    fn test_note_display() {
        let note = Note::warning("inflate failed").with_context("deflate");
        assert_eq!(note.to_string(), "[warn] deflate: inflate failed");
    }
}
