//! sentdup engine: duplicate detection, survivor selection, relation merge and pass control.

pub mod announce;
pub mod chunker;
pub mod error;
pub mod fingerprint;
pub mod merge;
pub mod pass;
pub mod prioritize;
pub mod report;
pub mod time_window;

#[cfg(test)]
mod fixtures;

pub use chunker::{chunked_ranges, ChunkedRanges};
pub use error::{DedupError, Result, TimeParseError};
pub use fingerprint::{tally, ContentHash, Fingerprint, Tally};
pub use merge::{LinkMergeStats, MergeStats, Merger};
pub use pass::{
    run_pass, verify, GroupFailure, GroupOutcome, GroupSummary, Pass, PassOptions, PassReport,
    Verification,
};
pub use prioritize::{prioritize, Selection};
pub use report::Reporter;
pub use time_window::{parse_since, parse_time_window};
