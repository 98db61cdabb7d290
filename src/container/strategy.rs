//! Payload recovery strategies.
//!
//! Strategies are tried in [`STRATEGY_CHAIN`] order; the first one that
//! recovers bytes wins. Each attempt reports back as an [`Attempt`] value
//! instead of unwinding, so the decoder can record why a strategy was
//! skipped or failed.

use super::ContainerHeader;
use flate2::read::{DeflateDecoder, GzDecoder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;

/// A way of turning the container payload into uncompressed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Payload is stored uncompressed; returned verbatim.
    Passthrough,
    /// Raw deflate stream (no zlib or gzip framing).
    Deflate,
    /// Gzip-framed deflate stream.
    Gzip,
}

/// Order in which strategies are evaluated.
pub const STRATEGY_CHAIN: &[Strategy] = &[Strategy::Passthrough, Strategy::Deflate, Strategy::Gzip];

/// Result of applying one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The strategy produced the payload.
    Recovered(Vec<u8>),
    /// The strategy's precondition did not hold.
    NotApplicable(String),
    /// The strategy ran and failed.
    Failed(String),
}

impl Strategy {
    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Passthrough => "passthrough",
            Strategy::Deflate => "deflate",
            Strategy::Gzip => "gzip",
        }
    }

    /// Apply this strategy to a container payload.
    pub fn apply(self, header: &ContainerHeader, payload: &[u8], tolerance: u64) -> Attempt {
        match self {
            Strategy::Passthrough => passthrough(header, payload, tolerance),
            Strategy::Deflate => inflate(DeflateDecoder::new(payload)),
            Strategy::Gzip => inflate(GzDecoder::new(payload)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn passthrough(header: &ContainerHeader, payload: &[u8], tolerance: u64) -> Attempt {
    let declared = u64::from(header.declared_size);
    let actual = payload.len() as u64;
    let gap = declared.abs_diff(actual);

    if gap <= tolerance {
        Attempt::Recovered(payload.to_vec())
    } else {
        Attempt::NotApplicable(format!(
            "declared size {} differs from payload size {} by {} bytes (tolerance {})",
            declared, actual, gap, tolerance
        ))
    }
}

fn inflate<R: Read>(mut decoder: R) -> Attempt {
    let mut out = Vec::new();
    match decoder.read_to_end(&mut out) {
        Ok(0) => Attempt::Failed("stream produced no output".to_string()),
        Ok(_) => Attempt::Recovered(out),
        Err(e) => Attempt::Failed(e.to_string()),
    }
}
