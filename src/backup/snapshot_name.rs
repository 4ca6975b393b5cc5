//! Snapshot directory naming grammar.
//!
//! A snapshot directory is named `<timestamp><suffix>` where `<timestamp>` is
//! `YYYY-MM-DD_HH-MM-SS.ffffff` (fixed width, microsecond precision) and
//! `<suffix>` is empty for a complete snapshot or `.partial` for a pending one.
//!
//! Every field is zero padded to a fixed width, so sorting names as plain
//! strings sorts them by time. Other tooling (retention scripts, monitoring)
//! relies on this layout, so it must not change.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Utc};
use derive_more::Display;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

/// Suffix marking a snapshot whose transfer has not (yet) succeeded.
pub static PENDING_SUFFIX: &str = ".partial";

/// Byte length of `YYYY-MM-DD_HH-MM-SS.ffffff`.
pub const TIMESTAMP_LEN: usize = 26;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.6f";

const MAX_YEAR: i32 = 9999;
const MAX_MICROS: u32 = 999_999;

/// A moment in time restricted to what the on-disk name can encode losslessly:
/// years `0000..=9999` and whole microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotTimestamp(NaiveDateTime);

impl SnapshotTimestamp {
    /// Truncates to microseconds. A leap second is clamped to the last
    /// microsecond of second 59 so the encoding stays fixed width.
    pub fn from_naive(date_time: NaiveDateTime) -> Option<Self> {
        if !(0..=MAX_YEAR).contains(&date_time.year()) {
            return None;
        }
        let micros = (date_time.nanosecond() / 1_000).min(MAX_MICROS);
        date_time.with_nanosecond(micros * 1_000).map(Self)
    }

    pub fn micros(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }

    /// Inverse of the `Display` encoding. Anything that is not exactly
    /// `YYYY-MM-DD_HH-MM-SS.ffffff` with in-range fields yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() != TIMESTAMP_LEN {
            return None;
        }
        let separators = [(4, b'-'), (7, b'-'), (10, b'_'), (13, b'-'), (16, b'-'), (19, b'.')];
        if separators.iter().any(|&(idx, sep)| b[idx] != sep) {
            return None;
        }

        let year = digits(&b[0..4])?;
        let month = digits(&b[5..7])?;
        let day = digits(&b[8..10])?;
        let hour = digits(&b[11..13])?;
        let minute = digits(&b[14..16])?;
        let second = digits(&b[17..19])?;
        let micros = digits(&b[20..26])?;

        NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?
            .and_hms_micro_opt(hour, minute, second, micros)
            .and_then(Self::from_naive)
    }
}

impl std::fmt::Display for SnapshotTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// ASCII digits only, no sign.
fn digits(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0')))
}

/// Which wall clock a new snapshot is stamped with.
///
/// `Utc` keeps name order monotonic across DST changes. `Local` matches
/// repositories written with local naive time.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clock {
    #[default]
    #[display("utc")]
    Utc,
    #[display("local")]
    Local,
}

impl Clock {
    pub fn now(&self) -> Option<SnapshotTimestamp> {
        let naive = match self {
            Clock::Utc => Utc::now().naive_utc(),
            Clock::Local => Local::now().naive_local(),
        };
        SnapshotTimestamp::from_naive(naive)
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotState {
    #[display("pending")]
    Pending,
    #[display("complete")]
    Complete,
}

/// A parsed (or to-be-created) snapshot directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SnapshotName {
    timestamp: SnapshotTimestamp,
    state: SnapshotState,
}

impl SnapshotName {
    pub fn new(timestamp: SnapshotTimestamp, state: SnapshotState) -> Self {
        Self { timestamp, state }
    }

    pub fn pending(timestamp: SnapshotTimestamp) -> Self {
        Self::new(timestamp, SnapshotState::Pending)
    }

    pub fn complete(timestamp: SnapshotTimestamp) -> Self {
        Self::new(timestamp, SnapshotState::Complete)
    }

    pub fn is_complete(&self) -> bool {
        self.state == SnapshotState::Complete
    }

    /// Same timestamp, complete state.
    pub fn to_complete(self) -> Self {
        Self::complete(self.timestamp)
    }

    /// Returns `None` for any name outside the grammar. Snapshot roots may
    /// hold unrelated entries, so a mismatch is not an error.
    pub fn parse(name: &str) -> Option<Self> {
        match name.strip_suffix(PENDING_SUFFIX) {
            Some(timestamp) => SnapshotTimestamp::parse(timestamp).map(Self::pending),
            None => SnapshotTimestamp::parse(name).map(Self::complete),
        }
    }
}

impl std::fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.state {
            SnapshotState::Pending => write!(f, "{}{}", self.timestamp, PENDING_SUFFIX),
            SnapshotState::Complete => write!(f, "{}", self.timestamp),
        }
    }
}
