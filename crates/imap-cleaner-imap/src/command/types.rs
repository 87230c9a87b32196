//! Arguments for SEARCH and STORE.

use chrono::NaiveDate;

use crate::types::Flag;

/// SEARCH key.
///
/// Date keys compare against the message's internal date at day
/// granularity, in the server's time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Internal date strictly before the day.
    Before(NaiveDate),
    /// Every key must match.
    And(Vec<Self>),
}

impl SearchCriteria {
    /// Combines keys with AND; a single key stands alone and no keys give
    /// `None`.
    #[must_use]
    pub fn and(mut keys: Vec<Self>) -> Option<Self> {
        match keys.len() {
            0 => None,
            1 => Some(keys.remove(0)),
            _ => Some(Self::And(keys)),
        }
    }
}

/// How STORE changes the flag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `+FLAGS`: add to the list.
    Add(Vec<Flag>),
    /// `-FLAGS`: remove from the list.
    Remove(Vec<Flag>),
}

impl StoreAction {
    pub(crate) const fn item_name(&self) -> &'static str {
        match self {
            Self::Add(_) => "+FLAGS",
            Self::Remove(_) => "-FLAGS",
        }
    }

    pub(crate) fn flags(&self) -> &[Flag] {
        match self {
            Self::Add(flags) | Self::Remove(flags) => flags,
        }
    }
}
