pub mod bootcamp;
pub mod user;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};

/// Result of a conditional write against a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,

    /// The stored revision no longer matches the one that was read.
    Stale,

    /// A unique index rejected the write.
    Duplicate,
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid stored timestamp: {value}"))?
        .with_timezone(&Utc))
}

pub(crate) fn parse_optional_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
