//! Numeric field heuristics.
//!
//! Every 4-byte aligned word is read as a little-endian `u32` and checked
//! against three value bands. Bands are tried in priority order and the
//! first hit wins, so an offset is reported at most once.

use byteorder::{ByteOrder, LittleEndian};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// 2020-01-01T00:00:00Z through 2030-01-01T00:00:00Z.
pub const TIMESTAMP_RANGE: RangeInclusive<u32> = 1_577_836_800..=1_893_456_000;

/// Plausible level or stat values.
pub const LEVEL_RANGE: RangeInclusive<u32> = 1..=100;

/// Plausible currency amounts.
pub const CURRENCY_RANGE: RangeInclusive<u32> = 1_000..=1_000_000;

/// How a candidate field might be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpretation {
    /// Unix timestamp
    Timestamp,
    /// Character level or stat
    LevelOrStat,
    /// Money amount
    Currency,
}

impl Interpretation {
    /// Bands in the order they are checked.
    pub const PRIORITY: [Interpretation; 3] = [
        Interpretation::Timestamp,
        Interpretation::LevelOrStat,
        Interpretation::Currency,
    ];

    /// Value band for this interpretation.
    pub fn range(&self) -> RangeInclusive<u32> {
        match self {
            Interpretation::Timestamp => TIMESTAMP_RANGE,
            Interpretation::LevelOrStat => LEVEL_RANGE,
            Interpretation::Currency => CURRENCY_RANGE,
        }
    }

    /// Classify a value against the bands.
    pub fn classify(value: u32) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|band| band.range().contains(&value))
    }
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpretation::Timestamp => write!(f, "timestamp"),
            Interpretation::LevelOrStat => write!(f, "level/stat"),
            Interpretation::Currency => write!(f, "money amount"),
        }
    }
}

/// A word that falls into one of the value bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericField {
    /// Offset of the word
    pub offset: usize,
    /// Matched band
    pub interpretation: Interpretation,
    /// Word value
    pub value: u32,
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:04X}: Possible {} {}",
            self.offset, self.interpretation, self.value
        )?;
        if self.interpretation == Interpretation::Timestamp {
            if let Some(date) = DateTime::from_timestamp(i64::from(self.value), 0) {
                write!(f, " ({})", date.format("%Y-%m-%d %H:%M:%S"))?;
            }
        }
        Ok(())
    }
}

/// Scan aligned words and return up to `max` candidate fields.
pub fn scan(data: &[u8], max: usize) -> Vec<NumericField> {
    data.chunks_exact(4)
        .enumerate()
        .filter_map(|(i, word)| {
            let value = LittleEndian::read_u32(word);
            Interpretation::classify(value).map(|interpretation| NumericField {
                offset: i * 4,
                interpretation,
                value,
            })
        })
        .take(max)
        .collect()
}
