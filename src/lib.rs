//! savescope - format discovery for DZIP save containers
//!
//! This library helps reverse-engineer game save files. It unwraps the
//! "DZIP" container some games wrap their saves in, runs heuristic scans
//! over the raw or decoded bytes, and lines several saves up against each
//! other to separate fixed structure from per-save state.
//!
//! # Features
//!
//! - **Container Decoding**: Validates the 24-byte DZIP header and recovers
//!   the payload by trying passthrough, raw deflate and gzip in order
//! - **Structural Analysis**: Hex dump, signature search, printable strings,
//!   numeric field candidates and repeating 4-byte patterns
//! - **Corpus Comparison**: Static and variable offsets plus strings common
//!   to every sample
//! - **Reports**: Human-readable and JSON renderings of every result
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use savescope::{analyze_structure, compare_corpus, decode_container, SampleFile};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("slot1.sav")?;
//!
//!     let outcome = decode_container(&bytes);
//!     println!("strategy: {:?}", outcome.strategy());
//!
//!     let findings = analyze_structure(&bytes);
//!     println!("{} strings", findings.strings.len());
//!
//!     let comparison = compare_corpus(vec![
//!         SampleFile::load("slot1.sav")?,
//!         SampleFile::load("slot2.sav")?,
//!     ])?;
//!     println!("{} variable offsets", comparison.variable_offsets.len());
//!     Ok(())
//! }
//! ```
//!
//! The three entry points are pure functions of their input bytes. None of
//! them touches the file system; [`SampleFile::load`] is a helper for
//! callers that start from paths.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod analysis;
pub mod container;
pub mod corpus;
pub mod error;
pub mod formatter;
pub mod types;

pub use analysis::{
    Interpretation, NumericField, RepeatingPattern, SignatureKind, SignatureMatch, StringRun,
    StructuralFindings,
};
pub use container::{ContainerHeader, DecodeErrorKind, DecodeOutcome, Strategy};
pub use corpus::{AnalyzedSample, CorpusComparison};
pub use error::{Result, SaveScopeError};
pub use formatter::{HumanFormatter, JsonFormatter, ReportFormatter, ReportLimits};
pub use types::{AnalyzerOptions, FileMetadata, Note, NoteLevel, SampleFile};

/// Decode a DZIP container.
///
/// Never fails: problems are reported through
/// [`DecodeOutcome::error`]. Use [`DecodeOutcome::into_result`] to get a
/// `Result` instead.
///
/// # Example
///
/// ```rust
/// use savescope::{decode_container, ContainerHeader, Strategy};
///
/// let payload = vec![0x42u8; 64];
/// let header = ContainerHeader {
///     version: 1,
///     declared_size: 64,
///     ..ContainerHeader::default()
/// };
/// let mut bytes = header.to_bytes().to_vec();
/// bytes.extend_from_slice(&payload);
///
/// let outcome = decode_container(&bytes);
/// assert_eq!(outcome.strategy(), Some(Strategy::Passthrough));
/// assert_eq!(outcome.payload(), Some(&payload[..]));
/// ```
pub fn decode_container(data: &[u8]) -> DecodeOutcome {
    container::decode(data)
}

/// Decode a DZIP container with custom options.
pub fn decode_container_with_options(data: &[u8], options: &AnalyzerOptions) -> DecodeOutcome {
    container::decode_with_options(data, options)
}

/// Run every structural scan over a buffer.
///
/// Works on any bytes, container or not. An empty buffer gives empty
/// findings.
pub fn analyze_structure(data: &[u8]) -> StructuralFindings {
    analysis::analyze(data)
}

/// Run every structural scan over a buffer with custom options.
pub fn analyze_structure_with_options(
    data: &[u8],
    options: &AnalyzerOptions,
) -> StructuralFindings {
    analysis::analyze_with_options(data, options)
}

/// Compare a corpus of sample files.
///
/// # Errors
///
/// Returns [`SaveScopeError::InsufficientSamples`] when fewer than two
/// non-empty samples remain.
pub fn compare_corpus(files: Vec<SampleFile>) -> Result<CorpusComparison> {
    corpus::compare(files)
}

/// Compare a corpus of sample files with custom options.
///
/// # Errors
///
/// Returns [`SaveScopeError::Config`] for invalid options and
/// [`SaveScopeError::InsufficientSamples`] when too few samples are usable.
pub fn compare_corpus_with_options(
    files: Vec<SampleFile>,
    options: &AnalyzerOptions,
) -> Result<CorpusComparison> {
    corpus::compare_with_options(files, options)
}

/// Decode a container and analyze the recovered payload.
///
/// The findings are `None` when decoding failed.
pub fn analyze_decoded(
    data: &[u8],
    options: &AnalyzerOptions,
) -> (DecodeOutcome, Option<StructuralFindings>) {
    let outcome = container::decode_with_options(data, options);
    let findings = outcome
        .payload()
        .map(|payload| analysis::analyze_with_options(payload, options));
    (outcome, findings)
}

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
