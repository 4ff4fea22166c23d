//! Core domain entities for Jotter.
//!
//! Profiles and notes are handed out as plain values: a snapshot of the stored record at
//! the time it was read. Record-level operations live alongside each type and are reached
//! through [`Store`](crate::Store).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use thiserror::Error;

use crate::store::config;

pub(crate) mod note;
pub(crate) mod profile;

pub use note::{Note, NoteEdit};
pub use profile::Profile;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage fault: {0}")]
    Storage(#[from] agdb::DbError),
    #[error("The store is unusable after an earlier storage fault, restart the application")]
    Faulted,
    #[error("The store has been closed")]
    Closed,
    #[error("Database path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("Unsupported data model version {found}, expected {expected}")]
    ModelVersion { found: u64, expected: u64 },
    #[error("No free note title left after {0} attempts")]
    TitlesExhausted(u32),
    #[error("No profile is bound to this session")]
    Unbound,
    #[error(transparent)]
    Config(#[from] config::Error),
}

/// Optimistic concurrency token of a [`Note`].
///
/// It is the note's creation instant in microseconds and never changes after creation. An
/// update must present the token it read; on rejection the caller must re-read the note
/// before retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
pub struct ConflictToken(i64);

impl ConflictToken {
    pub fn micros(self) -> i64 {
        self.0
    }

    pub fn created_at(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }

    /// Allocate the token for a note created now, strictly after `newest` when one is given.
    pub(crate) fn next(newest: Option<ConflictToken>) -> Self {
        let now = Utc::now().timestamp_micros();
        match newest {
            Some(ConflictToken(last)) if last >= now => Self(last.saturating_add(1)),
            _ => Self(now),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ConflictToken;

    #[test]
    fn test_next_is_strictly_increasing() {
        let far_future = ConflictToken::from(i64::MAX - 1);

        assert_eq!(ConflictToken::next(Some(far_future)).micros(), i64::MAX);

        let first = ConflictToken::next(None);
        assert!(ConflictToken::next(Some(first)) > first);
    }

    #[test]
    fn test_created_at_matches_micros() {
        let token = ConflictToken::from(1_700_000_000_123_456);
        let created_at = token.created_at().unwrap();

        assert_eq!(created_at.timestamp(), 1_700_000_000);
        assert_eq!(created_at.timestamp_subsec_micros(), 123_456);
    }
}
