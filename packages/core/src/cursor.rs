//! Forward-pagination cursor for account-ownership traversal.
//!
//! The text form `"<64 uppercase hex digits>,<decimal hint>"` is an interchange
//! format consumed by external clients resuming a traversal. It must stay
//! bit-stable across releases.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of the cursor index in bytes (a 256-bit ledger object key).
pub const CURSOR_INDEX_LEN: usize = 32;

/// A cursor used to traverse objects owned by an account.
///
/// The all-zero cursor means "no cursor / start of traversal"; any non-zero
/// index or hint marks a valid resumption point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccountCursor {
    /// 256-bit index of the next object to visit.
    pub index: [u8; CURSOR_INDEX_LEN],
    /// Disambiguation hint for objects sharing a directory page.
    pub hint: u32,
}

impl AccountCursor {
    /// Creates a cursor from its parts.
    #[must_use]
    pub fn new(index: [u8; CURSOR_INDEX_LEN], hint: u32) -> Self {
        Self { index, hint }
    }

    /// Whether this cursor marks a resumption point rather than the start of
    /// a traversal.
    #[must_use]
    pub fn is_non_zero(&self) -> bool {
        self.hint != 0 || self.index.iter().any(|b| *b != 0)
    }
}

impl fmt::Display for AccountCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", hex::encode_upper(self.index), self.hint)
    }
}

/// Failure to parse a cursor from its text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorParseError {
    #[error("cursor is missing the ',' separator")]
    MissingSeparator,
    #[error("cursor index must be {} hex digits", CURSOR_INDEX_LEN * 2)]
    BadIndex,
    #[error("cursor hint is not a decimal 32-bit integer")]
    BadHint,
}

impl FromStr for AccountCursor {
    type Err = CursorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index_part, hint_part) =
            s.split_once(',').ok_or(CursorParseError::MissingSeparator)?;

        if index_part.len() != CURSOR_INDEX_LEN * 2 {
            return Err(CursorParseError::BadIndex);
        }
        let mut index = [0u8; CURSOR_INDEX_LEN];
        hex::decode_to_slice(index_part, &mut index)
            .map_err(|_| CursorParseError::BadIndex)?;

        let hint = hint_part.parse().map_err(|_| CursorParseError::BadHint)?;

        Ok(Self { index, hint })
    }
}

impl Serialize for AccountCursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountCursor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
