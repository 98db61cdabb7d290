//! Structural analysis of a single buffer.
//!
//! Runs the independent sub-scans (hex dump, signatures, printable strings,
//! numeric fields, repeating windows) and collects their output into one
//! [`StructuralFindings`] value. Analysis is total: a buffer with nothing
//! interesting in it simply yields empty lists.

pub mod hexdump;
pub mod numeric;
pub mod patterns;
pub mod signatures;
pub mod strings;

use crate::container::ContainerHeader;
use crate::types::AnalyzerOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use numeric::{Interpretation, NumericField};
pub use patterns::RepeatingPattern;
pub use signatures::{SignatureKind, SignatureMatch};
pub use strings::StringRun;

/// Everything the analyzer derives from one buffer.
///
/// A pure function of the input bytes and options: analyzing the same
/// bytes twice gives equal values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuralFindings {
    /// Length of the analyzed buffer
    pub input_len: usize,
    /// Hex dump of the leading bytes
    pub hex_dump: String,
    /// Signature matches
    pub signatures: Vec<SignatureMatch>,
    /// Printable runs
    pub strings: Vec<StringRun>,
    /// Candidate numeric fields
    pub numeric_fields: Vec<NumericField>,
    /// Most frequent repeating windows
    pub patterns: Vec<RepeatingPattern>,
    /// Container header, when the buffer starts with one
    pub container: Option<ContainerHeader>,
}

impl StructuralFindings {
    /// Whether no scan found anything.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
            && self.strings.is_empty()
            && self.numeric_fields.is_empty()
            && self.patterns.is_empty()
            && self.container.is_none()
    }
}

/// Analyze a buffer with default options.
pub fn analyze(data: &[u8]) -> StructuralFindings {
    analyze_with_options(data, &AnalyzerOptions::new())
}

/// Analyze a buffer.
pub fn analyze_with_options(data: &[u8], options: &AnalyzerOptions) -> StructuralFindings {
    let findings = StructuralFindings {
        input_len: data.len(),
        hex_dump: hexdump::render(data, options.hex_dump_bytes),
        signatures: signatures::scan(data, options.signature_window),
        strings: strings::extract(data, options.min_string_len, options.max_strings),
        numeric_fields: numeric::scan(data, options.max_numeric_fields),
        patterns: patterns::scan(data, options.min_pattern_count, options.max_patterns),
        container: ContainerHeader::probe(data),
    };

    debug!(
        len = data.len(),
        strings = findings.strings.len(),
        numeric = findings.numeric_fields.len(),
        patterns = findings.patterns.len(),
        "analysis complete"
    );

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MAGIC;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC);
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 24]);
        data.extend_from_slice(b"\x00Geralt of Rivia\x00");
        data.extend_from_slice(&1_650_000_000u32.to_le_bytes());
        data.extend_from_slice(&[0xAB; 16]);
        data
    }

    #[test]
    fn test_idempotent() {
        let data = sample();
        assert_eq!(analyze(&data), analyze(&data));
    }

    #[test]
    fn test_empty_input() {
        let findings = analyze(&[]);
        assert!(findings.is_empty());
        assert_eq!(findings.input_len, 0);
        assert!(findings.hex_dump.starts_with("Hex Dump (showing first 0 of 0 bytes)"));
    }

    #[test]
    fn test_collects_all_scans() {
        let findings = analyze(&sample());

        assert!(findings.container.is_some());
        assert!(findings
            .signatures
            .iter()
            .any(|s| s.kind == SignatureKind::ContainerMagic));
        assert!(findings
            .strings
            .iter()
            .any(|s| s.text == "Geralt of Rivia"));
        assert!(findings
            .numeric_fields
            .iter()
            .any(|f| f.interpretation == Interpretation::LevelOrStat && f.value == 1));
        assert!(findings.patterns.iter().any(|p| p.bytes == [0xAB; 4]));
    }

    #[test]
    fn test_options_are_honoured() {
        let data = b"word\x00".repeat(30);
        let mut options = AnalyzerOptions::new();
        options.max_strings = 5;
        options.hex_dump_bytes = 16;
        let findings = analyze_with_options(&data, &options);
        assert_eq!(findings.strings.len(), 5);
        assert_eq!(findings.hex_dump.lines().count(), 4);
    }
}
