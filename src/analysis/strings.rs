//! Printable string extraction.

use super::hexdump::is_printable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A maximal run of printable ASCII bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringRun {
    /// Offset of the first byte of the run
    pub offset: usize,
    /// Run contents
    pub text: String,
}

impl fmt::Display for StringRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}: '{}'", self.offset, self.text)
    }
}

/// Extract up to `max` printable runs of at least `min_len` bytes.
///
/// Runs made only of spaces are skipped. A run reaching the end of the
/// buffer is reported like any other.
pub fn extract(data: &[u8], min_len: usize, max: usize) -> Vec<StringRun> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, &b) in data.iter().enumerate() {
        if runs.len() >= max {
            return runs;
        }
        match (is_printable(b), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                push_run(&mut runs, data, s, i, min_len);
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        push_run(&mut runs, data, s, data.len(), min_len);
    }

    runs.truncate(max);
    runs
}

fn push_run(runs: &mut Vec<StringRun>, data: &[u8], start: usize, end: usize, min_len: usize) {
    let bytes = &data[start..end];
    if bytes.len() < min_len || bytes.iter().all(|&b| b == b' ') {
        return;
    }
    runs.push(StringRun {
        offset: start,
        // Printable ASCII is valid UTF-8.
        text: String::from_utf8_lossy(bytes).into_owned(),
    });
}
