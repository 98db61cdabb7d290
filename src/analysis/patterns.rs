//! Repeating 4-byte window scan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Window width in bytes.
pub const WINDOW: usize = 4;

/// A window value seen several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatingPattern {
    /// Window contents
    pub bytes: [u8; WINDOW],
    /// Number of (possibly overlapping) occurrences
    pub count: usize,
    /// Offset of the first occurrence
    pub first_offset: usize,
}

impl fmt::Display for RepeatingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pattern {} appears {} times",
            hex::encode_upper(self.bytes),
            self.count
        )
    }
}

/// Count every window and report the top `max` seen at least `min_count` times.
///
/// Ordered by descending count, ties broken by first occurrence.
pub fn scan(data: &[u8], min_count: usize, max: usize) -> Vec<RepeatingPattern> {
    let counts = data.windows(WINDOW).enumerate().fold(
        HashMap::<[u8; WINDOW], (usize, usize)>::new(),
        |mut acc, (offset, window)| {
            let mut key = [0u8; WINDOW];
            key.copy_from_slice(window);
            acc.entry(key).or_insert((0, offset)).0 += 1;
            acc
        },
    );

    let mut patterns: Vec<RepeatingPattern> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_count)
        .map(|(bytes, (count, first_offset))| RepeatingPattern {
            bytes,
            count,
            first_offset,
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first_offset.cmp(&b.first_offset))
    });
    patterns.truncate(max);
    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_overlapping_windows() {
        // eight zero bytes hold five overlapping zero windows
        let data = [0u8; 8];
        let patterns = scan(&data, 3, 10);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].bytes, [0; 4]);
        assert_eq!(patterns[0].count, 5);
        assert_eq!(patterns[0].first_offset, 0);
    }

    #[test]
    fn test_threshold() {
        let data = b"ABCDxABCDx";
        assert!(scan(data, 3, 10).is_empty());

        let patterns = scan(data, 2, 10);
        assert_eq!(patterns.len(), 2);
        assert_eq!(&patterns[0].bytes, b"ABCD");
        assert_eq!(&patterns[1].bytes, b"BCDx");
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let mut data = Vec::new();
        data.extend_from_slice(&b"QQQQ-".repeat(3));
        data.extend_from_slice(&b"ZZZZ-".repeat(4));
        data.extend_from_slice(&b"AAAA-".repeat(3));

        let patterns = scan(&data, 3, 20);
        assert_eq!(patterns[0].count, 4);
        for pair in patterns.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.count > b.count || (a.count == b.count && a.first_offset < b.first_offset));
        }

        // QQQQ and AAAA tie on count; QQQQ was seen first
        let q = patterns.iter().position(|p| &p.bytes == b"QQQQ").unwrap();
        let a = patterns.iter().position(|p| &p.bytes == b"AAAA").unwrap();
        assert!(q < a);
        assert_eq!(scan(&data, 3, 20), patterns);
    }

    #[test]
    fn test_cap() {
        let mut data = Vec::new();
        for b in 0u8..20 {
            data.extend_from_slice(&[b; 6]);
            data.push(0xFF);
        }
        assert_eq!(scan(&data, 3, 10).len(), 10);
    }

    #[test]
    fn test_display() {
        let p = RepeatingPattern {
            bytes: [0xDE, 0xAD, 0xBE, 0xEF],
            count: 7,
            first_offset: 0,
        };
        assert_eq!(p.to_string(), "Pattern DEADBEEF appears 7 times");
    }
}
