//! Signature scan.
//!
//! Reports the leading bytes, whether they carry the container magic, and
//! every byte-exact occurrence of a candidate signature that starts inside
//! the scan window.

use super::hexdump::spaced_hex;
use crate::container::MAGIC;
use memchr::memmem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate textual signatures (game, studio and container identifiers).
pub const CANDIDATE_SIGNATURES: &[&str] = &[
    "SAVE",
    "SAV",
    "WITCHER",
    "WIT",
    "CDProjekt",
    "CDP",
    "DZIP",
    "GAME",
];

/// What a signature match refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    /// The first 4 or 8 bytes, shown for inspection
    LeadingBytes,
    /// The container magic at offset 0
    ContainerMagic,
    /// A candidate signature found in the scan window
    Embedded,
}

/// One signature finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureMatch {
    /// Byte offset of the match
    pub offset: usize,
    /// Kind of match
    pub kind: SignatureKind,
    /// Human-readable description
    pub description: String,
}

impl fmt::Display for SignatureMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// Scan `data` for signatures starting at or before offset `window`.
///
/// The bound is inclusive: a match starting exactly at `window` is reported.
pub fn scan(data: &[u8], window: usize) -> Vec<SignatureMatch> {
    let mut matches = Vec::new();

    if data.len() >= 4 {
        matches.push(SignatureMatch {
            offset: 0,
            kind: SignatureKind::LeadingBytes,
            description: format!("First 4 bytes: {}", spaced_hex(&data[..4])),
        });

        if data[..4] == MAGIC {
            matches.push(SignatureMatch {
                offset: 0,
                kind: SignatureKind::ContainerMagic,
                description: "DZIP container format detected".to_string(),
            });
        }
    }

    if data.len() >= 8 {
        matches.push(SignatureMatch {
            offset: 0,
            kind: SignatureKind::LeadingBytes,
            description: format!("First 8 bytes: {}", spaced_hex(&data[..8])),
        });
    }

    for sig in CANDIDATE_SIGNATURES {
        let needle = sig.as_bytes();
        // Limit the haystack so that only matches starting at or before `window` are seen.
        let end = data.len().min(window.saturating_add(needle.len()));
        for offset in memmem::find_iter(&data[..end], needle) {
            matches.push(SignatureMatch {
                offset,
                kind: SignatureKind::Embedded,
                description: format!("Found '{}' at offset 0x{:04X}", sig, offset),
            });
        }
    }

    matches
}
