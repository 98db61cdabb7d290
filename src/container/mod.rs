//! Container decoder.
//!
//! Save files are wrapped in a fixed 24-byte little-endian header followed
//! by an 8-byte compression parameter block and the payload:
//!
//! ```text
//! 0x00  magic              "DZIP"
//! 0x04  version            u32
//! 0x08  compression_type   u32
//! 0x0C  data_type          u32
//! 0x10  declared_size      u32   uncompressed payload size
//! 0x14  reserved           u32
//! 0x18  compression_params [u8; 8]
//! 0x20  payload ...
//! ```
//!
//! The compression fields are not trusted: the payload is recovered by
//! walking the [`strategy::STRATEGY_CHAIN`] until one strategy succeeds.

pub mod strategy;

use crate::error::{Result, SaveScopeError};
use crate::types::{AnalyzerOptions, Note};
use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

pub use strategy::{Attempt, Strategy, STRATEGY_CHAIN};

/// Container magic bytes: 'D' 'Z' 'I' 'P'
pub const MAGIC: [u8; 4] = [0x44, 0x5A, 0x49, 0x50];

/// Size of the fixed header.
pub const HEADER_SIZE: usize = 24;

/// Size of the compression parameter block following the header.
pub const PARAMS_SIZE: usize = 8;

/// Offset where the payload starts.
pub const PAYLOAD_OFFSET: usize = HEADER_SIZE + PARAMS_SIZE;

/// Header field offsets.
pub mod offsets {
    pub const MAGIC: usize = 0x00;
    pub const VERSION: usize = 0x04;
    pub const COMPRESSION_TYPE: usize = 0x08;
    pub const DATA_TYPE: usize = 0x0C;
    pub const DECLARED_SIZE: usize = 0x10;
    pub const RESERVED: usize = 0x14;
    pub const PARAMS: usize = 0x18;
}

/// Parsed container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Magic bytes
    pub magic: [u8; 4],
    /// Version or flags word
    pub version: u32,
    /// Declared compression type
    pub compression_type: u32,
    /// Declared data type
    pub data_type: u32,
    /// Declared uncompressed payload size
    pub declared_size: u32,
    /// Reserved word
    pub reserved: u32,
    /// Compression parameter block (zeroed when the file is shorter than 32 bytes)
    pub compression_params: [u8; PARAMS_SIZE],
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: 0,
            compression_type: 0,
            data_type: 0,
            declared_size: 0,
            reserved: 0,
            compression_params: [0; PARAMS_SIZE],
        }
    }
}

impl ContainerHeader {
    /// Parse a header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        read_header(data).map_err(|kind| match kind {
            DecodeErrorKind::BadMagic => SaveScopeError::BadMagic {
                actual: data[..MAGIC.len()].to_vec(),
            },
            _ => SaveScopeError::TooSmall {
                expected: HEADER_SIZE,
                actual: data.len(),
            },
        })
    }

    /// Parse a header if `data` starts with one, without reporting why not.
    pub fn probe(data: &[u8]) -> Option<Self> {
        read_header(data).ok()
    }

    /// Whether the magic bytes match the container signature.
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// Encode the header and parameter block (32 bytes).
    pub fn to_bytes(&self) -> [u8; PAYLOAD_OFFSET] {
        let mut out = [0u8; PAYLOAD_OFFSET];
        out[offsets::MAGIC..offsets::VERSION].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut out[offsets::VERSION..], self.version);
        LittleEndian::write_u32(&mut out[offsets::COMPRESSION_TYPE..], self.compression_type);
        LittleEndian::write_u32(&mut out[offsets::DATA_TYPE..], self.data_type);
        LittleEndian::write_u32(&mut out[offsets::DECLARED_SIZE..], self.declared_size);
        LittleEndian::write_u32(&mut out[offsets::RESERVED..], self.reserved);
        out[offsets::PARAMS..].copy_from_slice(&self.compression_params);
        out
    }
}

impl fmt::Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Container header:")?;
        writeln!(f, "  Version/Flags:      {}", self.version)?;
        writeln!(f, "  Compression Type:   {}", self.compression_type)?;
        writeln!(f, "  Data Type:          {}", self.data_type)?;
        writeln!(f, "  Uncompressed Size:  {} bytes", self.declared_size)?;
        write!(
            f,
            "  Compression Params: {}",
            crate::analysis::hexdump::spaced_hex(&self.compression_params)
        )
    }
}

fn read_header(data: &[u8]) -> std::result::Result<ContainerHeader, DecodeErrorKind> {
    if data.len() < HEADER_SIZE {
        return Err(DecodeErrorKind::TooSmall);
    }
    if data[..MAGIC.len()] != MAGIC {
        return Err(DecodeErrorKind::BadMagic);
    }

    let mut compression_params = [0u8; PARAMS_SIZE];
    if data.len() >= PAYLOAD_OFFSET {
        compression_params.copy_from_slice(&data[offsets::PARAMS..PAYLOAD_OFFSET]);
    }

    Ok(ContainerHeader {
        magic: MAGIC,
        version: LittleEndian::read_u32(&data[offsets::VERSION..]),
        compression_type: LittleEndian::read_u32(&data[offsets::COMPRESSION_TYPE..]),
        data_type: LittleEndian::read_u32(&data[offsets::DATA_TYPE..]),
        declared_size: LittleEndian::read_u32(&data[offsets::DECLARED_SIZE..]),
        reserved: LittleEndian::read_u32(&data[offsets::RESERVED..]),
        compression_params,
    })
}

/// Why a decode did not produce a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorKind {
    /// Buffer shorter than the fixed header
    TooSmall,
    /// Header present but the magic bytes differ
    BadMagic,
    /// Header valid, every strategy failed
    UnknownCompression,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::TooSmall => write!(f, "file too small to contain a container header"),
            DecodeErrorKind::BadMagic => write!(f, "not a container file - missing magic bytes"),
            DecodeErrorKind::UnknownCompression => {
                write!(f, "all recovery strategies failed - unknown compression")
            }
        }
    }
}

/// Outcome of one decode call.
///
/// Built once by [`decode`] and read through accessors afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeOutcome {
    header: Option<ContainerHeader>,
    #[serde(skip)]
    leading: Vec<u8>,
    #[serde(skip)]
    payload: Option<Vec<u8>>,
    payload_len: Option<usize>,
    input_len: usize,
    strategy: Option<Strategy>,
    compression_ratio: Option<f64>,
    error: Option<DecodeErrorKind>,
    notes: Vec<Note>,
}

impl DecodeOutcome {
    fn failed(
        data: &[u8],
        header: Option<ContainerHeader>,
        error: DecodeErrorKind,
        mut notes: Vec<Note>,
    ) -> Self {
        notes.push(Note::error(error.to_string()));
        Self {
            header,
            leading: data.iter().take(MAGIC.len()).copied().collect(),
            payload: None,
            payload_len: None,
            input_len: data.len(),
            strategy: None,
            compression_ratio: None,
            error: Some(error),
            notes,
        }
    }

    fn recovered(
        data: &[u8],
        header: ContainerHeader,
        compressed_len: usize,
        strategy: Strategy,
        payload: Vec<u8>,
        notes: Vec<Note>,
    ) -> Self {
        let compression_ratio = if payload.is_empty() {
            None
        } else {
            Some(compressed_len as f64 / payload.len() as f64)
        };
        Self {
            header: Some(header),
            leading: MAGIC.to_vec(),
            payload_len: Some(payload.len()),
            payload: Some(payload),
            input_len: data.len(),
            strategy: Some(strategy),
            compression_ratio,
            error: None,
            notes,
        }
    }

    /// Whether a payload was recovered.
    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }

    /// Parsed header, present whenever the magic matched.
    pub fn header(&self) -> Option<&ContainerHeader> {
        self.header.as_ref()
    }

    /// Recovered payload bytes.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Take ownership of the recovered payload.
    pub fn into_payload(self) -> Option<Vec<u8>> {
        self.payload
    }

    /// Length of the decoded input buffer.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Strategy that recovered the payload.
    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    /// Compressed payload length divided by recovered length.
    ///
    /// A value close to 1.0 means the payload was stored as-is.
    pub fn compression_ratio(&self) -> Option<f64> {
        self.compression_ratio
    }

    /// Failure classification, if the decode failed.
    pub fn error(&self) -> Option<DecodeErrorKind> {
        self.error
    }

    /// Diagnostics gathered while decoding (one per strategy attempt).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Convert into a `Result`, for callers that want to use `?`.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match (self.payload, self.error) {
            (Some(payload), _) => Ok(payload),
            (None, Some(DecodeErrorKind::BadMagic)) => Err(SaveScopeError::BadMagic {
                actual: self.leading,
            }),
            (None, Some(DecodeErrorKind::UnknownCompression)) => {
                Err(SaveScopeError::UnknownCompression {
                    attempted: STRATEGY_CHAIN
                        .iter()
                        .map(Strategy::name)
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
            (None, _) => Err(SaveScopeError::TooSmall {
                expected: HEADER_SIZE,
                actual: self.input_len,
            }),
        }
    }
}

/// Decode a container with default options.
pub fn decode(data: &[u8]) -> DecodeOutcome {
    decode_with_options(data, &AnalyzerOptions::new())
}

/// Decode a container, recovering the payload with the strategy chain.
///
/// Never panics on malformed input; failures are reported through
/// [`DecodeOutcome::error`].
pub fn decode_with_options(data: &[u8], options: &AnalyzerOptions) -> DecodeOutcome {
    let header = match read_header(data) {
        Ok(header) => header,
        Err(kind) => {
            debug!(len = data.len(), "rejected container: {}", kind);
            return DecodeOutcome::failed(data, None, kind, Vec::new());
        }
    };

    let payload = data.get(PAYLOAD_OFFSET..).unwrap_or(&[]);
    let mut notes = Vec::new();

    for &strategy in STRATEGY_CHAIN {
        match strategy.apply(&header, payload, options.passthrough_tolerance) {
            Attempt::Recovered(bytes) => {
                info!(
                    strategy = strategy.name(),
                    "recovered container payload: {} -> {} bytes",
                    payload.len(),
                    bytes.len()
                );
                notes.push(
                    Note::info(format!("recovered {} bytes", bytes.len()))
                        .with_context(strategy.name()),
                );
                return DecodeOutcome::recovered(
                    data,
                    header,
                    payload.len(),
                    strategy,
                    bytes,
                    notes,
                );
            }
            Attempt::NotApplicable(reason) => {
                debug!(strategy = strategy.name(), "skipped: {}", reason);
                notes.push(Note::info(reason).with_context(strategy.name()));
            }
            Attempt::Failed(reason) => {
                debug!(strategy = strategy.name(), "failed: {}", reason);
                notes.push(Note::warning(reason).with_context(strategy.name()));
            }
        }
    }

    warn!(
        declared = header.declared_size,
        payload = payload.len(),
        "all recovery strategies exhausted"
    );
    DecodeOutcome::failed(
        data,
        Some(header),
        DecodeErrorKind::UnknownCompression,
        notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn container(declared_size: u32, payload: &[u8]) -> Vec<u8> {
        let header = ContainerHeader {
            version: 1,
            declared_size,
            ..ContainerHeader::default()
        };
        let mut data = header.to_bytes().to_vec();
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_too_small() {
        for len in 0..HEADER_SIZE {
            let data = vec![0x44; len];
            let outcome = decode(&data);
            assert!(!outcome.is_success());
            assert_eq!(outcome.error(), Some(DecodeErrorKind::TooSmall));
            assert!(outcome.header().is_none());
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut data = container(0, &[]);
        data[0] = b'X';
        let outcome = decode(&data);
        assert_eq!(outcome.error(), Some(DecodeErrorKind::BadMagic));
        assert!(outcome.compression_ratio().is_none());
    }

    #[test]
    fn test_parse_header_fields() {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC);
        for v in [1u32, 2, 3, 1000, 5] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[0xAA; 8]);

        let header = ContainerHeader::parse(&data).unwrap();
        assert!(header.is_valid());
        assert_eq!(header.version, 1);
        assert_eq!(header.compression_type, 2);
        assert_eq!(header.data_type, 3);
        assert_eq!(header.declared_size, 1000);
        assert_eq!(header.reserved, 5);
        assert_eq!(header.compression_params, [0xAA; 8]);
        assert_eq!(header.to_bytes().to_vec(), data);
    }

    #[test]
    fn test_short_header_zeroes_params() {
        let data = container(0, &[]);
        let header = ContainerHeader::parse(&data[..28]).unwrap();
        assert_eq!(header.compression_params, [0; 8]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ContainerHeader::parse(&[0u8; 4]),
            Err(SaveScopeError::TooSmall { actual: 4, .. })
        ));
        assert!(matches!(
            ContainerHeader::parse(&[0u8; 32]),
            Err(SaveScopeError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_passthrough() {
        let payload: Vec<u8> = (0..1000u32).map(|i| (i * 7 % 251) as u8).collect();
        let data = container(1000, &payload);

        let outcome = decode(&data);
        assert!(outcome.is_success());
        assert_eq!(outcome.strategy(), Some(Strategy::Passthrough));
        assert_eq!(outcome.payload(), Some(payload.as_slice()));
        assert_eq!(outcome.header().map(|h| h.version), Some(1));
        let ratio = outcome.compression_ratio().unwrap();
        assert!((ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deflate_fallback() {
        let payload = b"chapter 2 roche path chosen; ".repeat(40);
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&payload).unwrap();
        let compressed = enc.finish().unwrap();

        let data = container(payload.len() as u32 + 500, &compressed);
        let outcome = decode(&data);
        assert_eq!(outcome.strategy(), Some(Strategy::Deflate));
        assert!(outcome.compression_ratio().unwrap() < 1.0);
        assert_eq!(outcome.into_payload(), Some(payload));
    }

    #[test]
    fn test_gzip_fallback() {
        let payload = b"inventory: silver sword; ".repeat(40);
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&payload).unwrap();
        let compressed = enc.finish().unwrap();

        let data = container(payload.len() as u32 + 500, &compressed);
        let outcome = decode(&data);
        assert_eq!(outcome.strategy(), Some(Strategy::Gzip));
        assert_eq!(outcome.payload(), Some(payload.as_slice()));
    }

    #[test]
    fn test_unknown_compression_keeps_header() {
        let data = container(5000, &[0xFF; 64]);
        let outcome = decode(&data);
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some(DecodeErrorKind::UnknownCompression));
        assert_eq!(outcome.header().map(|h| h.declared_size), Some(5000));
        assert!(outcome.notes().len() >= STRATEGY_CHAIN.len());
        assert!(matches!(
            outcome.into_result(),
            Err(SaveScopeError::UnknownCompression { .. })
        ));
    }

    #[test]
    fn test_custom_tolerance() {
        let data = container(100, &[0u8; 150]);
        let mut options = AnalyzerOptions::new();
        options.passthrough_tolerance = 10;
        let outcome = decode_with_options(&data, &options);
        assert_ne!(outcome.strategy(), Some(Strategy::Passthrough));
    }

    #[test]
    fn test_header_summary() {
        let header = ContainerHeader {
            declared_size: 1234,
            compression_params: [1, 2, 3, 4, 5, 6, 7, 8],
            ..ContainerHeader::default()
        };
        let summary = header.to_string();
        assert!(summary.contains("1234 bytes"));
        assert!(summary.contains("01 02 03 04 05 06 07 08"));
    }
}
