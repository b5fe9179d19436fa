//! Unique username resolution over the shared identity collection.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum UsernameError {
    #[error("Username lookup failed: {0}")]
    Lookup(String),

    #[error("No free username for '{base}' after {attempts} attempts")]
    Exhausted { base: String, attempts: u32 },
}

impl From<sea_orm::DbErr> for UsernameError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Lookup(err.to_string())
    }
}

impl From<anyhow::Error> for UsernameError {
    fn from(err: anyhow::Error) -> Self {
        Self::Lookup(err.to_string())
    }
}

/// Existence check against the identity namespace.
///
/// The namespace is the collection, not the subtype, so one implementation
/// serves users, applicants and instructors alike.
#[async_trait]
pub trait UsernameLookup: Send + Sync {
    async fn username_taken(&self, candidate: &str) -> Result<bool, UsernameError>;
}

#[must_use]
pub fn candidate(base: &str, suffix: u32) -> String {
    if suffix == 0 {
        base.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

/// Returns the first free name among `base`, `base1`, `base2`, ...
///
/// Lookups run strictly one after another starting at `suffix`. With
/// `max_attempts` set, gives up after that many probes; with `None` the
/// search continues until a free name is found, costing one lookup per
/// taken candidate.
pub async fn find_unique_username<L: UsernameLookup + ?Sized>(
    lookup: &L,
    base: &str,
    suffix: Option<u32>,
    max_attempts: Option<u32>,
) -> Result<String, UsernameError> {
    let mut suffix = suffix.unwrap_or(0);
    let mut attempts: u32 = 0;

    loop {
        if let Some(max) = max_attempts
            && attempts >= max
        {
            warn!(base, attempts, "Unique username search exhausted");
            return Err(UsernameError::Exhausted {
                base: base.to_string(),
                attempts,
            });
        }

        let possible = candidate(base, suffix);
        attempts += 1;

        if !lookup.username_taken(&possible).await? {
            debug!(base, username = %possible, attempts, "Resolved unique username");
            return Ok(possible);
        }

        suffix = suffix.checked_add(1).ok_or_else(|| UsernameError::Exhausted {
            base: base.to_string(),
            attempts,
        })?;
    }
}
