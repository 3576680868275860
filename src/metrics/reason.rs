//! Classification of a filtering decision.

use crate::core::StatsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why a query was, or was not, filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// No rule matched
    NotFilteredNotFound,
    /// An allow-list rule matched
    NotFilteredWhiteList,
    /// Filtering could not be applied
    NotFilteredError,
    /// A block-list rule matched
    FilteredBlackList,
    /// Safe-browsing lookup flagged the host
    FilteredSafeBrowsing,
    /// Parental control flagged the host
    FilteredParental,
    /// The request itself was invalid
    FilteredInvalid,
    /// Safe search rewrote the answer
    FilteredSafeSearch,
}

impl Reason {
    pub const ALL: [Reason; 8] = [
        Reason::NotFilteredNotFound,
        Reason::NotFilteredWhiteList,
        Reason::NotFilteredError,
        Reason::FilteredBlackList,
        Reason::FilteredSafeBrowsing,
        Reason::FilteredParental,
        Reason::FilteredInvalid,
        Reason::FilteredSafeSearch,
    ];

    /// Identifier, as shown in query logs
    pub fn as_str(self) -> &'static str {
        match self {
            Reason::NotFilteredNotFound => "NotFilteredNotFound",
            Reason::NotFilteredWhiteList => "NotFilteredWhiteList",
            Reason::NotFilteredError => "NotFilteredError",
            Reason::FilteredBlackList => "FilteredBlackList",
            Reason::FilteredSafeBrowsing => "FilteredSafeBrowsing",
            Reason::FilteredParental => "FilteredParental",
            Reason::FilteredInvalid => "FilteredInvalid",
            Reason::FilteredSafeSearch => "FilteredSafeSearch",
        }
    }

    /// Human-readable phrase
    pub fn description(self) -> &'static str {
        match self {
            Reason::NotFilteredNotFound => "not filtered: not found",
            Reason::NotFilteredWhiteList => "not filtered: allow-listed",
            Reason::NotFilteredError => "not filtered: error",
            Reason::FilteredBlackList => "filtered: block-list",
            Reason::FilteredSafeBrowsing => "filtered: safe-browsing",
            Reason::FilteredParental => "filtered: parental",
            Reason::FilteredInvalid => "filtered: invalid",
            Reason::FilteredSafeSearch => "filtered: safe-search",
        }
    }

    /// True when the answer was blocked or rewritten
    pub fn is_filtered(self) -> bool {
        matches!(
            self,
            Reason::FilteredBlackList
                | Reason::FilteredSafeBrowsing
                | Reason::FilteredParental
                | Reason::FilteredInvalid
                | Reason::FilteredSafeSearch
        )
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reason {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reason::ALL
            .into_iter()
            .find(|reason| reason.as_str() == s)
            .ok_or_else(|| StatsError::UnknownReason(s.to_string()))
    }
}
