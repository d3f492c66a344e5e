//! SeaORM entities. Column names follow the existing blog schema.

pub mod comment;
pub mod post;
pub mod subscriber;

/// Stored counters are signed; negative values read as zero.
pub(crate) fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

pub(crate) fn stored_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
