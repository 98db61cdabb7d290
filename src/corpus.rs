//! Corpus comparison.
//!
//! Lines up several sample files byte by byte to separate the stable
//! structure (static offsets, common strings) from per-save state
//! (variable offsets). Per-file analysis is independent and may run in
//! parallel; the comparison itself is a single fold over the finished
//! analyses.

use crate::analysis::{self, StringRun, StructuralFindings};
use crate::error::{Result, SaveScopeError};
use crate::formatter;
use crate::types::{AnalyzerOptions, FileMetadata, Note, SampleFile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// A sample together with its findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedSample {
    /// The sample file
    pub sample: SampleFile,
    /// Structural findings for its bytes
    pub findings: StructuralFindings,
}

impl AnalyzedSample {
    /// Analyze a sample.
    pub fn new(sample: SampleFile, options: &AnalyzerOptions) -> Self {
        let findings = analysis::analyze_with_options(&sample.bytes, options);
        Self { sample, findings }
    }
}

/// Result of comparing a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusComparison {
    /// Metadata of the compared files, in input order
    pub files: Vec<FileMetadata>,
    /// Length of the shortest compared file
    pub shortest_len: usize,
    /// Strings found at the same offset with the same text in every file
    pub common_strings: BTreeSet<StringRun>,
    /// Texts found in every file at any offset
    pub common_texts: BTreeSet<String>,
    /// Offset to shared byte value, over the static prefix
    pub static_offsets: BTreeMap<usize, u8>,
    /// Offset to the distinct byte values seen, over the shortest file
    pub variable_offsets: BTreeMap<usize, BTreeSet<u8>>,
    /// Rendered difference report header
    pub report: String,
    /// Samples left out of the comparison and why
    pub notes: Vec<Note>,
}

/// Analyze every sample, in parallel when the `parallel` feature is on.
///
/// Output order matches input order.
pub fn analyze_samples(samples: Vec<SampleFile>, options: &AnalyzerOptions) -> Vec<AnalyzedSample> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        samples
            .into_par_iter()
            .map(|sample| AnalyzedSample::new(sample, options))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        samples
            .into_iter()
            .map(|sample| AnalyzedSample::new(sample, options))
            .collect()
    }
}

/// Analyze and compare a set of sample files with default options.
pub fn compare(samples: Vec<SampleFile>) -> Result<CorpusComparison> {
    compare_with_options(samples, &AnalyzerOptions::new())
}

/// Analyze and compare a set of sample files.
pub fn compare_with_options(
    samples: Vec<SampleFile>,
    options: &AnalyzerOptions,
) -> Result<CorpusComparison> {
    options.validate()?;
    info!("comparing {} sample files", samples.len());
    let analyses = analyze_samples(samples, options);
    compare_analyses(&analyses, options)
}

/// Compare samples that have already been analyzed.
///
/// Empty samples carry no bytes to line up and are left out with a note.
/// Fewer than `options.min_samples` usable samples is an error.
pub fn compare_analyses(
    analyses: &[AnalyzedSample],
    options: &AnalyzerOptions,
) -> Result<CorpusComparison> {
    let mut notes = Vec::new();
    let usable: Vec<&AnalyzedSample> = analyses
        .iter()
        .filter(|a| {
            let keep = !a.sample.bytes.is_empty();
            if !keep {
                notes.push(
                    Note::warning("empty file excluded from comparison")
                        .with_context(a.sample.metadata.name.clone()),
                );
            }
            keep
        })
        .collect();

    let required = options.min_samples.max(2);
    if usable.len() < required {
        return Err(SaveScopeError::InsufficientSamples {
            required,
            actual: usable.len(),
        });
    }

    let buffers: Vec<&[u8]> = usable.iter().map(|a| a.sample.bytes.as_slice()).collect();
    let shortest_len = buffers.iter().map(|b| b.len()).min().unwrap_or(0);

    let files: Vec<FileMetadata> = usable.iter().map(|a| a.sample.metadata.clone()).collect();
    let comparison = CorpusComparison {
        report: formatter::difference_report(&files),
        files,
        shortest_len,
        common_strings: find_common_strings(&usable),
        common_texts: find_common_texts(&usable),
        static_offsets: find_static_offsets(&buffers, options.static_prefix.min(shortest_len)),
        variable_offsets: find_variable_offsets(&buffers, shortest_len),
        notes,
    };

    info!(
        common = comparison.common_strings.len(),
        static_offsets = comparison.static_offsets.len(),
        variable_offsets = comparison.variable_offsets.len(),
        "comparison complete"
    );

    Ok(comparison)
}

/// Strings present at the identical offset with identical text in every sample.
fn find_common_strings(analyses: &[&AnalyzedSample]) -> BTreeSet<StringRun> {
    let mut iter = analyses.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };

    let initial: BTreeSet<StringRun> = first.findings.strings.iter().cloned().collect();
    iter.fold(initial, |acc, a| {
        let other: BTreeSet<&StringRun> = a.findings.strings.iter().collect();
        acc.into_iter().filter(|s| other.contains(s)).collect()
    })
}

/// Texts present in every sample, wherever they sit.
fn find_common_texts(analyses: &[&AnalyzedSample]) -> BTreeSet<String> {
    let mut iter = analyses.iter();
    let Some(first) = iter.next() else {
        return BTreeSet::new();
    };

    let initial: BTreeSet<String> = first.findings.strings.iter().map(|s| s.text.clone()).collect();
    iter.fold(initial, |acc, a| {
        let other: BTreeSet<&str> = a.findings.strings.iter().map(|s| s.text.as_str()).collect();
        acc.into_iter().filter(|t| other.contains(t.as_str())).collect()
    })
}

/// Offsets in `[0, limit)` holding the same byte in every buffer.
fn find_static_offsets(buffers: &[&[u8]], limit: usize) -> BTreeMap<usize, u8> {
    (0..limit)
        .filter_map(|i| {
            let value = buffers[0][i];
            buffers.iter().all(|b| b[i] == value).then_some((i, value))
        })
        .collect()
}

/// Offsets in `[0, limit)` where at least two buffers disagree.
fn find_variable_offsets(buffers: &[&[u8]], limit: usize) -> BTreeMap<usize, BTreeSet<u8>> {
    let variable: BTreeMap<usize, BTreeSet<u8>> = (0..limit)
        .filter_map(|i| {
            let values: BTreeSet<u8> = buffers.iter().map(|b| b[i]).collect();
            (values.len() > 1).then_some((i, values))
        })
        .collect();
    debug!(limit, variable = variable.len(), "variable offset scan");
    variable
}

impl CorpusComparison {
    /// Variable offsets in ascending order, capped to `limit` entries.
    pub fn variable_offsets_capped(&self, limit: usize) -> impl Iterator<Item = (&usize, &BTreeSet<u8>)> {
        self.variable_offsets.iter().take(limit)
    }

    /// Whether an offset is part of the static prefix.
    pub fn is_static(&self, offset: usize) -> bool {
        self.static_offsets.contains_key(&offset)
    }

    /// Whether an offset differs across the corpus.
    pub fn is_variable(&self, offset: usize) -> bool {
        self.variable_offsets.contains_key(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(name: &str, bytes: Vec<u8>) -> SampleFile {
        SampleFile::from_bytes(name, bytes)
    }

    #[test]
    fn test_single_file_is_insufficient() {
        let err = compare(vec![sample("a.sav", vec![1, 2, 3])]).unwrap_err();
        assert!(matches!(
            err,
            SaveScopeError::InsufficientSamples {
                required: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_empty_files_are_excluded() {
        let err = compare(vec![sample("a.sav", vec![1, 2, 3]), sample("b.sav", Vec::new())])
            .unwrap_err();
        assert!(matches!(err, SaveScopeError::InsufficientSamples { actual: 1, .. }));

        let cmp = compare(vec![
            sample("a.sav", vec![1, 2, 3]),
            sample("b.sav", Vec::new()),
            sample("c.sav", vec![1, 9, 3]),
        ])
        .unwrap();
        assert_eq!(cmp.files.len(), 2);
        assert_eq!(cmp.notes.len(), 1);
    }

    #[test]
    fn test_static_and_variable_partition() {
        let files: Vec<SampleFile> = (0..3u8)
            .map(|n| {
                let mut bytes = vec![0x11u8; 100];
                bytes.extend((0..200u8).map(|i| i.wrapping_add(n)));
                sample(&format!("slot{}.sav", n), bytes)
            })
            .collect();

        let cmp = compare(files).unwrap();
        assert_eq!(cmp.shortest_len, 300);
        for i in 0..100 {
            assert_eq!(cmp.static_offsets.get(&i), Some(&0x11));
            assert!(!cmp.is_variable(i));
        }
        assert!(cmp.variable_offsets.keys().all(|&k| k >= 100));
        assert!(!cmp.variable_offsets.is_empty());
        // static offsets are only computed over the prefix
        assert!(cmp.static_offsets.keys().all(|&k| k < 256));
        for offset in cmp.variable_offsets.keys() {
            assert!(!cmp.is_static(*offset));
        }
    }

    #[test]
    fn test_shortest_file_bounds_scan() {
        let cmp = compare(vec![
            sample("a.sav", vec![1, 2, 3, 4, 5, 6]),
            sample("b.sav", vec![1, 2, 9]),
        ])
        .unwrap();
        assert_eq!(cmp.shortest_len, 3);
        assert_eq!(cmp.static_offsets.len(), 2);
        let values: Vec<u8> = cmp.variable_offsets[&2].iter().copied().collect();
        assert_eq!(values, vec![3, 9]);
        assert_eq!(cmp.variable_offsets.len(), 1);
    }

    #[test]
    fn test_common_strings_bound_to_offset() {
        let mut a = vec![0u8; 64];
        let mut b = vec![0xFFu8; 64];
        a[0x10..0x14].copy_from_slice(b"SAVE");
        b[0x10..0x14].copy_from_slice(b"SAVE");
        a[0x20..0x26].copy_from_slice(b"Geralt");
        b[0x28..0x2E].copy_from_slice(b"Geralt");

        let cmp = compare(vec![sample("a.sav", a), sample("b.sav", b)]).unwrap();
        let common: Vec<StringRun> = cmp.common_strings.iter().cloned().collect();
        assert_eq!(
            common,
            vec![StringRun {
                offset: 0x10,
                text: "SAVE".to_string()
            }]
        );
        assert!(cmp.common_texts.contains("Geralt"));
        assert!(cmp.common_texts.contains("SAVE"));
    }

    #[test]
    fn test_deterministic_output() {
        let files = || {
            vec![
                sample("a.sav", b"\x00SAVE\x00abc123\x01".to_vec()),
                sample("b.sav", b"\x00SAVE\x00abd124\x02".to_vec()),
                sample("c.sav", b"\x00SAVE\x00xbc125\x03".to_vec()),
            ]
        };
        assert_eq!(compare(files()).unwrap(), compare(files()).unwrap());
    }

    #[test]
    fn test_variable_cap() {
        let cmp = compare(vec![
            sample("a.sav", vec![0u8; 120]),
            sample("b.sav", vec![1u8; 120]),
        ])
        .unwrap();
        assert_eq!(cmp.variable_offsets.len(), 120);
        let capped: Vec<usize> = cmp.variable_offsets_capped(50).map(|(k, _)| *k).collect();
        assert_eq!(capped, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_report_lists_files() {
        let cmp = compare(vec![
            sample("slot1.sav", vec![1, 2, 3]),
            sample("slot2.sav", vec![1, 2, 4]),
        ])
        .unwrap();
        assert!(cmp.report.contains("Files analyzed: 2"));
        assert!(cmp.report.contains("slot1.sav: 3 bytes"));
    }
}
