//! Date window for message selection.

use chrono::{NaiveDate, NaiveDateTime};
use imap_cleaner_imap::SearchCriteria;

/// Optional `[from, to)` window over message internal dates.
///
/// IMAP date search keys only carry a calendar day, so the bounds are
/// applied at day granularity: `from` keeps messages dated on or after its
/// day, `to` keeps messages dated strictly before its day. The time of day
/// only shows up in progress messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    from: Option<NaiveDateTime>,
    to: Option<NaiveDateTime>,
}

impl SelectionCriteria {
    /// Creates a window; either bound may be absent.
    #[must_use]
    pub const fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    /// A window with no bounds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn from(&self) -> Option<NaiveDateTime> {
        self.from
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn to(&self) -> Option<NaiveDateTime> {
        self.to
    }

    /// True when at least one bound is set.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// The SEARCH key for this window, or `None` when there is nothing to
    /// search for.
    #[must_use]
    pub fn to_search(&self) -> Option<SearchCriteria> {
        let mut keys = Vec::with_capacity(2);
        if let Some(from) = self.from {
            keys.push(SearchCriteria::Since(from.date()));
        }
        if let Some(to) = self.to {
            keys.push(SearchCriteria::Before(to.date()));
        }
        SearchCriteria::and(keys)
    }

    /// Whether a message with internal date `date` falls inside the window.
    #[must_use]
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from.date()) && self.to.is_none_or(|to| date < to.date())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unbounded_has_no_search() {
        assert!(!SelectionCriteria::unbounded().is_bounded());
        assert_eq!(SelectionCriteria::default().to_search(), None);
    }

    #[test]
    fn from_only_maps_to_since() {
        let criteria = SelectionCriteria::new(Some(at("2020-01-01 00:00:00")), None);
        assert_eq!(
            criteria.to_search(),
            Some(SearchCriteria::Since(day(2020, 1, 1)))
        );
    }

    #[test]
    fn to_only_maps_to_before() {
        let criteria = SelectionCriteria::new(None, Some(at("2021-06-15 13:45:00")));
        assert_eq!(
            criteria.to_search(),
            Some(SearchCriteria::Before(day(2021, 6, 15)))
        );
    }

    #[test]
    fn both_bounds_are_anded() {
        let criteria = SelectionCriteria::new(
            Some(at("2020-01-01 00:00:00")),
            Some(at("2020-02-01 00:00:00")),
        );
        assert_eq!(
            criteria.to_search(),
            Some(SearchCriteria::And(vec![
                SearchCriteria::Since(day(2020, 1, 1)),
                SearchCriteria::Before(day(2020, 2, 1)),
            ]))
        );
    }

    #[test]
    fn bounds_are_inclusive_then_exclusive() {
        let criteria = SelectionCriteria::new(
            Some(at("2020-01-10 08:00:00")),
            Some(at("2020-01-20 08:00:00")),
        );
        assert!(!criteria.matches(day(2020, 1, 9)));
        assert!(criteria.matches(day(2020, 1, 10)));
        assert!(criteria.matches(day(2020, 1, 19)));
        assert!(!criteria.matches(day(2020, 1, 20)));
    }

    #[test]
    fn unbounded_matches_everything() {
        assert!(SelectionCriteria::unbounded().matches(day(1970, 1, 1)));
        assert!(SelectionCriteria::unbounded().matches(day(2099, 12, 31)));
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..20_000).prop_map(|offset| day(1990, 1, 1) + chrono::Duration::days(offset))
    }

    fn any_bound() -> impl Strategy<Value = Option<NaiveDateTime>> {
        proptest::option::of((any_date(), 0u32..86_400).prop_map(|(d, secs)| {
            d.and_hms_opt(secs / 3600, (secs / 60) % 60, secs % 60).unwrap()
        }))
    }

    proptest! {
        #[test]
        fn matches_is_the_half_open_window(from in any_bound(), to in any_bound(), d in any_date()) {
            let criteria = SelectionCriteria::new(from, to);
            let expected = from.is_none_or(|f| d >= f.date()) && to.is_none_or(|t| d < t.date());
            prop_assert_eq!(criteria.matches(d), expected);
        }

        #[test]
        fn search_exists_iff_bounded(from in any_bound(), to in any_bound()) {
            let criteria = SelectionCriteria::new(from, to);
            prop_assert_eq!(criteria.to_search().is_some(), from.is_some() || to.is_some());
        }
    }
}
