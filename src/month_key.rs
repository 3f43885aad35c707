use regex::Regex;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static RE_MONTH_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}").expect("Invalid regex"));

/// Grouping key taken from a `YYYY-MM...` directory name.
///
/// The key is the whole matching segment, so `2020-05-extra` stays
/// `2020-05-extra`. Ordering is plain string ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(String);

impl MonthKey {
    /// Builds a key from a single path segment that starts with `YYYY-MM`
    pub fn from_segment(segment: &str) -> Option<Self> {
        if RE_MONTH_PREFIX.is_match(segment) {
            Some(Self(segment.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYYY` prefix
    pub fn year(&self) -> &str {
        &self.0[..4]
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' does not start with YYYY-MM")]
pub struct MonthKeyError(String);

impl FromStr for MonthKey {
    type Err = MonthKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_segment(s).ok_or_else(|| MonthKeyError(s.to_string()))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the key of the first segment, in path order, that starts with `YYYY-MM`
pub fn extract_month_key<'a, I>(segments: I) -> Option<MonthKey>
where
    I: IntoIterator<Item = &'a str>,
{
    segments.into_iter().find_map(MonthKey::from_segment)
}

/// Splits a directory path into segments and extracts its month key.
/// Segments that are not valid UTF-8 never match.
pub fn month_key_for_dir(dir: &Path) -> Option<MonthKey> {
    extract_month_key(dir.components().filter_map(|c| c.as_os_str().to_str()))
}
