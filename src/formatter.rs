//! Report formatters.
//!
//! This module provides trait-based formatters for rendering decode
//! outcomes, structural findings and corpus comparisons as human-readable
//! text or JSON. No decoding or analysis happens here.

use crate::analysis::{NumericField, RepeatingPattern, SignatureMatch, StringRun, StructuralFindings};
use crate::container::{ContainerHeader, DecodeOutcome};
use crate::corpus::CorpusComparison;
use crate::types::{AnalyzerOptions, FileMetadata, Note, NoteLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};

/// Trait for formatting analysis output.
///
/// Implementors provide methods for rendering each section of a
/// [`StructuralFindings`] value, plus whole-report methods for findings,
/// decode outcomes and comparisons.
pub trait ReportFormatter {
    /// Format the file header line.
    fn format_file(&self, metadata: &FileMetadata) -> String;

    /// Format the container header, if one was found.
    fn format_container(&self, header: Option<&ContainerHeader>) -> Option<String>;

    /// Format signature matches.
    fn format_signatures(&self, signatures: &[SignatureMatch]) -> Option<String>;

    /// Format printable strings.
    fn format_strings(&self, strings: &[StringRun]) -> Option<String>;

    /// Format candidate numeric fields.
    fn format_numeric(&self, fields: &[NumericField]) -> Option<String>;

    /// Format repeating patterns.
    fn format_patterns(&self, patterns: &[RepeatingPattern]) -> Option<String>;

    /// Format the hex dump.
    fn format_hex_dump(&self, dump: &str) -> Option<String>;

    /// Format the complete findings for one file.
    ///
    /// Default implementation concatenates all section outputs.
    fn format_findings(&self, findings: &StructuralFindings, metadata: &FileMetadata) -> String {
        let mut parts = vec![self.format_file(metadata)];

        let sections = [
            self.format_container(findings.container.as_ref()),
            self.format_signatures(&findings.signatures),
            self.format_strings(&findings.strings),
            self.format_numeric(&findings.numeric_fields),
            self.format_patterns(&findings.patterns),
            self.format_hex_dump(&findings.hex_dump),
        ];
        parts.extend(sections.into_iter().flatten());

        parts.join("")
    }

    /// Format a decode outcome.
    fn format_decode(&self, outcome: &DecodeOutcome, metadata: &FileMetadata) -> String;

    /// Format a corpus comparison.
    fn format_comparison(&self, comparison: &CorpusComparison) -> String;
}

/// How many entries of each list the human formatter shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLimits {
    /// Signature matches per file
    pub signatures: usize,
    /// Printable strings per file
    pub strings: usize,
    /// Numeric fields per file
    pub numeric_fields: usize,
    /// Repeating patterns per file
    pub patterns: usize,
    /// Hex dump lines per file
    pub hex_lines: usize,
    /// Common strings in a comparison
    pub common_strings: usize,
    /// Static offsets in a comparison
    pub static_offsets: usize,
    /// Variable offsets in a comparison
    pub variable_offsets: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            signatures: 5,
            strings: 10,
            numeric_fields: 8,
            patterns: 5,
            hex_lines: 10,
            common_strings: 10,
            static_offsets: 20,
            variable_offsets: AnalyzerOptions::new().max_variable_report,
        }
    }
}

impl ReportLimits {
    /// Default limits with the comparison caps taken from `options`.
    pub fn from_options(options: &AnalyzerOptions) -> Self {
        Self {
            variable_offsets: options.max_variable_report,
            ..Self::default()
        }
    }
}

/// Human-readable output formatter.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    /// Show verbose output (container summary, decode notes)
    pub verbose: bool,
    /// Quiet mode (one line per file)
    pub quiet: bool,
    /// Listing caps
    pub limits: ReportLimits,
}

impl HumanFormatter {
    /// Create a new human formatter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a verbose formatter.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    /// Create a quiet formatter.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// Replace the listing caps.
    pub fn with_limits(mut self, limits: ReportLimits) -> Self {
        self.limits = limits;
        self
    }

    fn section<T: fmt::Display>(&self, title: &str, items: &[T], limit: usize) -> Option<String> {
        if items.is_empty() || self.quiet {
            return None;
        }
        let mut s = format!("  {}:\n", title);
        for item in items.iter().take(limit) {
            let _ = writeln!(s, "    {}", item);
        }
        Some(s)
    }

    fn format_notes(&self, notes: &[Note]) -> Option<String> {
        // Only show warnings/errors unless verbose
        let to_show: Vec<_> = notes
            .iter()
            .filter(|n| self.verbose || n.level != NoteLevel::Info)
            .collect();
        if to_show.is_empty() {
            return None;
        }

        let mut s = String::new();
        for note in to_show {
            let _ = writeln!(s, "  {}", note);
        }
        Some(s)
    }
}

impl ReportFormatter for HumanFormatter {
    fn format_file(&self, metadata: &FileMetadata) -> String {
        if self.quiet {
            return String::new();
        }
        format!(
            "File: {}\n  Size:       {} bytes\n  Modified:   {}\n",
            metadata.name,
            metadata.size,
            format_modified(metadata.modified)
        )
    }

    fn format_container(&self, header: Option<&ContainerHeader>) -> Option<String> {
        let header = header?;
        if self.quiet {
            return None;
        }
        if !self.verbose {
            return Some(format!(
                "  Container:  DZIP v{}, declared {} bytes\n",
                header.version, header.declared_size
            ));
        }
        let mut s = String::new();
        for line in header.to_string().lines() {
            let _ = writeln!(s, "  {}", line);
        }
        Some(s)
    }

    fn format_signatures(&self, signatures: &[SignatureMatch]) -> Option<String> {
        self.section("Signatures", signatures, self.limits.signatures)
    }

    fn format_strings(&self, strings: &[StringRun]) -> Option<String> {
        self.section("Readable strings", strings, self.limits.strings)
    }

    fn format_numeric(&self, fields: &[NumericField]) -> Option<String> {
        self.section(
            "Candidate fields (timestamps, stats, money)",
            fields,
            self.limits.numeric_fields,
        )
    }

    fn format_patterns(&self, patterns: &[RepeatingPattern]) -> Option<String> {
        self.section("Repeating patterns", patterns, self.limits.patterns)
    }

    fn format_hex_dump(&self, dump: &str) -> Option<String> {
        if self.quiet || dump.is_empty() {
            return None;
        }
        let mut s = format!("  Hex dump (first {} lines):\n", self.limits.hex_lines);
        for line in dump.lines().filter(|l| !l.trim().is_empty()).take(self.limits.hex_lines) {
            let _ = writeln!(s, "    {}", line);
        }
        Some(s)
    }

    fn format_findings(&self, findings: &StructuralFindings, metadata: &FileMetadata) -> String {
        if self.quiet {
            return format!(
                "{}: {} strings, {} fields, {} patterns\n",
                metadata.name,
                findings.strings.len(),
                findings.numeric_fields.len(),
                findings.patterns.len()
            );
        }

        let mut parts = vec![self.format_file(metadata)];
        let sections = [
            self.format_container(findings.container.as_ref()),
            self.format_signatures(&findings.signatures),
            self.format_strings(&findings.strings),
            self.format_numeric(&findings.numeric_fields),
            self.format_patterns(&findings.patterns),
            self.format_hex_dump(&findings.hex_dump),
        ];
        parts.extend(sections.into_iter().flatten());
        parts.push(String::from("\n"));
        parts.join("")
    }

    fn format_decode(&self, outcome: &DecodeOutcome, metadata: &FileMetadata) -> String {
        let status = match (outcome.strategy(), outcome.error()) {
            (Some(strategy), _) => format!("decoded ({})", strategy),
            (None, Some(kind)) => format!("failed: {}", kind),
            (None, None) => "failed".to_string(),
        };

        if self.quiet {
            return format!("{}: {}\n", metadata.name, status);
        }

        let mut s = self.format_file(metadata);
        let _ = writeln!(s, "  Status:     {}", status);
        if let Some(len) = outcome.payload().map(<[u8]>::len) {
            let _ = writeln!(s, "  Payload:    {} bytes", len);
        }
        if let Some(ratio) = outcome.compression_ratio() {
            let _ = writeln!(s, "  Ratio:      {:.2}", ratio);
        }
        if let Some(header) = outcome.header() {
            let _ = writeln!(s, "  Version:    {}", header.version);
            let _ = writeln!(s, "  Compression type: {}", header.compression_type);
        }
        if let Some(payload) = outcome.payload() {
            let head = &payload[..payload.len().min(16)];
            let _ = writeln!(
                s,
                "  First {} bytes: {}",
                head.len(),
                crate::analysis::hexdump::spaced_hex(head)
            );
        }
        if self.verbose {
            if let Some(text) = self.format_container(outcome.header()) {
                s.push_str(&text);
            }
        }
        if let Some(notes) = self.format_notes(outcome.notes()) {
            s.push_str(&notes);
        }
        s.push('\n');
        s
    }

    fn format_comparison(&self, comparison: &CorpusComparison) -> String {
        if self.quiet {
            return format!(
                "{} files: {} common strings, {} static offsets, {} variable offsets\n",
                comparison.files.len(),
                comparison.common_strings.len(),
                comparison.static_offsets.len(),
                comparison.variable_offsets.len()
            );
        }

        let mut s = comparison.report.clone();
        s.push('\n');

        if !comparison.common_strings.is_empty() {
            s.push_str("Common strings (same text, same offset in all files):\n");
            for run in comparison.common_strings.iter().take(self.limits.common_strings) {
                let _ = writeln!(s, "  {}", run);
            }
            s.push('\n');
        }

        if self.verbose && !comparison.common_texts.is_empty() {
            s.push_str("Common texts (any offset):\n");
            for text in comparison.common_texts.iter().take(self.limits.common_strings) {
                let _ = writeln!(s, "  '{}'", text);
            }
            s.push('\n');
        }

        if !comparison.static_offsets.is_empty() {
            let _ = writeln!(
                s,
                "Static structure (same in all files, first {} of {}):",
                self.limits.static_offsets.min(comparison.static_offsets.len()),
                comparison.static_offsets.len()
            );
            for (offset, value) in comparison.static_offsets.iter().take(self.limits.static_offsets) {
                let _ = writeln!(s, "  0x{:04X}: 0x{:02X}", offset, value);
            }
            s.push('\n');
        }

        if !comparison.variable_offsets.is_empty() {
            let _ = writeln!(
                s,
                "Variable data (changes between files, first {} of {}):",
                self.limits.variable_offsets.min(comparison.variable_offsets.len()),
                comparison.variable_offsets.len()
            );
            for (offset, values) in comparison.variable_offsets_capped(self.limits.variable_offsets) {
                let rendered: Vec<String> = values.iter().map(|v| format!("0x{:02X}", v)).collect();
                let _ = writeln!(s, "  0x{:04X}: {}", offset, rendered.join(", "));
            }
            s.push('\n');
        }

        if let Some(notes) = self.format_notes(&comparison.notes) {
            s.push_str(&notes);
        }

        s
    }
}

/// JSON output formatter.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    /// Pretty-print JSON
    pub pretty: bool,
    /// Maximum variable offsets included in comparison output
    pub max_variable_offsets: usize,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self {
            pretty: true,
            max_variable_offsets: AnalyzerOptions::new().max_variable_report,
        }
    }
}

impl JsonFormatter {
    /// Create a new JSON formatter with pretty printing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact JSON formatter.
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Self::default()
        }
    }

    /// Take the variable offset cap from `options`.
    pub fn with_options(mut self, options: &AnalyzerOptions) -> Self {
        self.max_variable_offsets = options.max_variable_report;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut s = rendered.unwrap_or_else(|_| "{}".to_string());
        s.push('\n');
        s
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_file(&self, _metadata: &FileMetadata) -> String {
        String::new() // Handled in format_findings
    }

    fn format_container(&self, _header: Option<&ContainerHeader>) -> Option<String> {
        None
    }

    fn format_signatures(&self, _signatures: &[SignatureMatch]) -> Option<String> {
        None
    }

    fn format_strings(&self, _strings: &[StringRun]) -> Option<String> {
        None
    }

    fn format_numeric(&self, _fields: &[NumericField]) -> Option<String> {
        None
    }

    fn format_patterns(&self, _patterns: &[RepeatingPattern]) -> Option<String> {
        None
    }

    fn format_hex_dump(&self, _dump: &str) -> Option<String> {
        None
    }

    fn format_findings(&self, findings: &StructuralFindings, metadata: &FileMetadata) -> String {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            file: &'a FileMetadata,
            findings: &'a StructuralFindings,
        }

        self.render(&JsonOutput {
            file: metadata,
            findings,
        })
    }

    fn format_decode(&self, outcome: &DecodeOutcome, metadata: &FileMetadata) -> String {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            file: &'a FileMetadata,
            success: bool,
            outcome: &'a DecodeOutcome,
            payload_head: Option<String>,
        }

        self.render(&JsonOutput {
            file: metadata,
            success: outcome.is_success(),
            outcome,
            payload_head: outcome
                .payload()
                .map(|p| hex::encode_upper(&p[..p.len().min(16)])),
        })
    }

    fn format_comparison(&self, comparison: &CorpusComparison) -> String {
        #[derive(Serialize)]
        struct OffsetJson {
            offset: usize,
            values: Vec<u8>,
        }

        #[derive(Serialize)]
        struct JsonOutput<'a> {
            files: &'a [FileMetadata],
            shortest_len: usize,
            common_strings: Vec<&'a StringRun>,
            common_texts: Vec<&'a str>,
            static_offsets: Vec<OffsetJson>,
            variable_offset_count: usize,
            variable_offsets: Vec<OffsetJson>,
            notes: &'a [Note],
        }

        self.render(&JsonOutput {
            files: &comparison.files,
            shortest_len: comparison.shortest_len,
            common_strings: comparison.common_strings.iter().collect(),
            common_texts: comparison.common_texts.iter().map(String::as_str).collect(),
            static_offsets: comparison
                .static_offsets
                .iter()
                .map(|(&offset, &value)| OffsetJson {
                    offset,
                    values: vec![value],
                })
                .collect(),
            variable_offset_count: comparison.variable_offsets.len(),
            variable_offsets: comparison
                .variable_offsets_capped(self.max_variable_offsets)
                .map(|(&offset, values)| OffsetJson {
                    offset,
                    values: values.iter().copied().collect(),
                })
                .collect(),
            notes: &comparison.notes,
        })
    }
}

/// Render the comparison header: file count and one line per file.
pub fn difference_report(files: &[FileMetadata]) -> String {
    let mut s = String::from("=== Save File Comparison Report ===\n");
    let _ = writeln!(s, "Files analyzed: {}", files.len());
    s.push('\n');

    for file in files {
        let _ = writeln!(
            s,
            "{}: {} bytes, modified {}",
            file.name,
            file.size,
            format_modified(file.modified)
        );
    }

    s.push('\n');
    s.push_str("Static offsets: file structure and headers\n");
    s.push_str("Variable offsets: dynamic game data (progress, stats, etc.)\n");
    s.push_str("Common strings: game identifiers and text\n");
    s
}

fn format_modified(modified: Option<DateTime<Utc>>) -> String {
    modified.map_or_else(
        || "unknown".to_string(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}
