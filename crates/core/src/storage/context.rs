//! Per-upload path context.

use chrono::{DateTime, FixedOffset, Local};
use rand::Rng;

/// A field of [`PathContext`] that templates may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Four digit year.
    Year,
    /// Two digit month.
    Month,
    /// Two digit day of month.
    Day,
    /// Two digit hour (24h).
    Hour,
    /// Epoch milliseconds.
    Timestamp,
    /// Eight random decimal digits.
    Random,
    /// Extension of the original file name, including the dot.
    Ext,
    /// Original file name without directory or extension.
    Name,
}

impl Field {
    /// Every field, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Hour,
        Self::Timestamp,
        Self::Random,
        Self::Ext,
        Self::Name,
    ];

    /// Look up a field by its placeholder name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Placeholder name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Timestamp => "timestamp",
            Self::Random => "random",
            Self::Ext => "ext",
            Self::Name => "name",
        }
    }
}

/// Values available to path templates for a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext {
    /// Four digit year.
    pub year: String,
    /// Two digit month.
    pub month: String,
    /// Two digit day of month.
    pub day: String,
    /// Two digit hour.
    pub hour: String,
    /// Epoch milliseconds.
    pub timestamp: String,
    /// Eight random decimal digits.
    pub random: String,
    /// Extension of the original name, with the leading dot.
    pub ext: String,
    /// Original name without directory or extension.
    pub name: String,
}

impl PathContext {
    /// Build the context for an upload named `original` at time `now`.
    #[must_use]
    pub fn build(original: &str, now: &DateTime<FixedOffset>) -> Self {
        let (name, ext) = split_extension(basename(original));
        let random = rand::rng().random_range(0..100_000_000u32);

        Self {
            year: now.format("%Y").to_string(),
            month: now.format("%m").to_string(),
            day: now.format("%d").to_string(),
            hour: now.format("%H").to_string(),
            timestamp: now.timestamp_millis().to_string(),
            random: format!("{random:08}"),
            ext: ext.to_string(),
            name: name.to_string(),
        }
    }

    /// Value of a single field.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Year => &self.year,
            Field::Month => &self.month,
            Field::Day => &self.day,
            Field::Hour => &self.hour,
            Field::Timestamp => &self.timestamp,
            Field::Random => &self.random,
            Field::Ext => &self.ext,
            Field::Name => &self.name,
        }
    }
}

/// Source of the current time for path contexts.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// Last path segment, ignoring trailing slashes.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Split a base name into stem and extension.
///
/// Dot-files (`.bashrc`) and `..` have no extension.
fn split_extension(base: &str) -> (&str, &str) {
    match base.rfind('.') {
        None | Some(0) => (base, ""),
        Some(_) if base == ".." => (base, ""),
        Some(idx) => (&base[..idx], &base[idx..]),
    }
}
