//! Response routing
//!
//! Maps an intercepted request URL to the data slot its response belongs
//! to. Patterns are tried in order; the first one whose fragments all occur
//! in the URL (ignoring case) wins. Unmatched URLs are simply not ours.

use crate::model::DataSlotKind;
use serde::{Deserialize, Serialize};

/// URL fragments that identify one slot's chart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPattern {
    pub slot: DataSlotKind,
    pub fragments: Vec<String>,
}

impl EndpointPattern {
    pub fn new<I, S>(slot: DataSlotKind, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slot,
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }

    /// True when every fragment occurs in `url_lower`.
    ///
    /// `url_lower` must already be lowercased. A pattern without fragments
    /// never matches.
    fn matches_lowercase(&self, url_lower: &str) -> bool {
        !self.fragments.is_empty()
            && self
                .fragments
                .iter()
                .all(|f| url_lower.contains(&f.to_lowercase()))
    }

    /// Case-insensitive match against `url`.
    pub fn matches(&self, url: &str) -> bool {
        self.matches_lowercase(&url.to_lowercase())
    }
}

/// Slot of the first pattern that fully matches `url`.
///
/// # Examples
///
/// ```
/// use chart_harvest::model::DataSlotKind;
/// use chart_harvest::routing::{route, EndpointPattern};
///
/// let patterns = vec![
///     EndpointPattern::new(DataSlotKind::OneMonth, ["/chart/", "one_month"]),
///     EndpointPattern::new(DataSlotKind::Max, ["/chart/", "infinity"]),
/// ];
///
/// assert_eq!(
///     route("https://x.test/_api/CHART/1/INFINITY", &patterns),
///     Some(DataSlotKind::Max)
/// );
/// assert_eq!(route("https://x.test/_api/quote/1", &patterns), None);
/// ```
pub fn route(url: &str, patterns: &[EndpointPattern]) -> Option<DataSlotKind> {
    let url_lower = url.to_lowercase();
    patterns
        .iter()
        .find(|p| p.matches_lowercase(&url_lower))
        .map(|p| p.slot)
}

/// Chart endpoint patterns for the fund page's period selector.
pub fn default_patterns() -> Vec<EndpointPattern> {
    vec![
        EndpointPattern::new(DataSlotKind::OneMonth, ["/chart/", "one_month"]),
        EndpointPattern::new(DataSlotKind::ThreeMonths, ["/chart/", "three_months"]),
        EndpointPattern::new(DataSlotKind::YearToDate, ["/chart/", "this_year"]),
        EndpointPattern::new(DataSlotKind::OneYear, ["/chart/", "one_year"]),
        EndpointPattern::new(DataSlotKind::ThreeYears, ["/chart/", "three_years"]),
        EndpointPattern::new(DataSlotKind::FiveYears, ["/chart/", "five_years"]),
        EndpointPattern::new(DataSlotKind::Max, ["/chart/", "infinity"]),
    ]
}
