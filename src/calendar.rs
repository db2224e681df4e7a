// Date views over an already-fetched snapshot: day filters, month grids, the week strip.
//
// Every function takes the timezone explicitly; front ends pass `Local`.
// Entries whose timestamp does not parse are left out of every date view.
use crate::model::JournalEntry;
use chrono::{Datelike, Days, Months, NaiveDate, TimeZone};
use std::collections::{BTreeMap, BTreeSet};

pub fn entries_on<Tz: TimeZone>(
    entries: &[JournalEntry],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<JournalEntry> {
    entries
        .iter()
        .filter(|e| e.date_in(tz) == Some(date))
        .cloned()
        .collect()
}

/// Entries grouped by creation day, each group keeping snapshot order.
pub fn group_by_day<Tz: TimeZone>(
    entries: &[JournalEntry],
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<JournalEntry>> {
    let mut groups: BTreeMap<NaiveDate, Vec<JournalEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(day) = entry.date_in(tz) {
            groups.entry(day).or_default().push(entry.clone());
        }
    }
    groups
}

/// Most recent first; undated entries sort last. Stable for equal timestamps.
pub fn recent(entries: &[JournalEntry], limit: usize) -> Vec<JournalEntry> {
    let mut sorted: Vec<JournalEntry> = entries.to_vec();
    sorted.sort_by(|a, b| b.created_at_utc().cmp(&a.created_at_utc()));
    sorted.truncate(limit);
    sorted
}

/// The Monday-first week containing `today`.
pub fn week_of(today: NaiveDate) -> [NaiveDate; 7] {
    let offset = today.weekday().num_days_from_monday() as u64;
    let monday = today - Days::new(offset);
    std::array::from_fn(|i| monday + Days::new(i as u64))
}

/// One month of a Sunday-first calendar grid.
///
/// Only months whose successor is also representable exist, so the length is always known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthView {
    first: NaiveDate,
    days: u32,
}

impl MonthView {
    /// `None` when `month` is outside 1..=12 or the month sits at the edge of the date range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let following = first.checked_add_months(Months::new(1))?;
        let days = u32::try_from(following.signed_duration_since(first).num_days()).ok()?;
        Some(Self { first, days })
    }

    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Parses `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        Self::new(y.parse().ok()?, m.parse().ok()?)
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn days_in_month(&self) -> u32 {
        self.days
    }

    /// Blank cells before day 1 in a Sunday-first grid.
    pub fn leading_blanks(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    pub fn previous(&self) -> Option<Self> {
        Self::containing(self.first.checked_sub_months(Months::new(1))?)
    }

    pub fn next(&self) -> Option<Self> {
        Self::containing(self.first.checked_add_months(Months::new(1))?)
    }

    /// Grid cells: `None` for padding, `Some(day)` otherwise.
    pub fn cells(&self) -> Vec<Option<u32>> {
        let mut cells: Vec<Option<u32>> = vec![None; self.leading_blanks() as usize];
        cells.extend((1..=self.days_in_month()).map(Some));
        cells
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    /// Days of this month with at least one entry.
    pub fn days_with_entries<Tz: TimeZone>(
        &self,
        entries: &[JournalEntry],
        tz: &Tz,
    ) -> BTreeSet<u32> {
        entries
            .iter()
            .filter_map(|e| e.date_in(tz))
            .filter(|d| self.contains(*d))
            .map(|d| d.day())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<JournalEntry> {
        vec![
            JournalEntry::new(1, "new year", "", "2024-01-01T08:00:00Z"),
            JournalEntry::new(2, "late", "", "2024-01-01T23:30:00Z"),
            JournalEntry::new(3, "feb", "", "2024-02-29T12:00:00Z"),
            JournalEntry::new(4, "undated", "", "someday"),
        ]
    }

    #[test]
    fn test_entries_on_respects_timezone() {
        let entries = sample();
        let utc_day = entries_on(&entries, date(2024, 1, 1), &Utc);
        assert_eq!(utc_day.len(), 2);

        // 23:30 UTC is already Jan 2nd at +02:00.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let shifted = entries_on(&entries, date(2024, 1, 2), &plus_two);
        assert_eq!(shifted.len(), 1);
        assert_eq!(shifted[0].title, "late");
    }

    #[test]
    fn test_group_by_day_skips_undated() {
        let groups = group_by_day(&sample(), &Utc);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&date(2024, 1, 1)].len(), 2);
        assert_eq!(groups[&date(2024, 2, 29)][0].title, "feb");
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let out = recent(&sample(), 3);
        let titles: Vec<&str> = out.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["feb", "late", "new year"]);
    }

    #[test]
    fn test_week_of_starts_monday() {
        // 2024-01-03 is a Wednesday.
        let week = week_of(date(2024, 1, 3));
        assert_eq!(week[0], date(2024, 1, 1));
        assert_eq!(week[6], date(2024, 1, 7));

        // Sunday belongs to the week that started six days earlier.
        let week = week_of(date(2024, 1, 7));
        assert_eq!(week[0], date(2024, 1, 1));
    }

    #[test]
    fn test_month_view_grid() {
        let feb = MonthView::new(2024, 2).unwrap();
        assert_eq!(feb.days_in_month(), 29);
        // 2024-02-01 is a Thursday.
        assert_eq!(feb.leading_blanks(), 4);
        assert_eq!(feb.cells().len(), 33);

        assert_eq!(MonthView::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(MonthView::new(2024, 12).unwrap().days_in_month(), 31);
        assert!(MonthView::new(2024, 13).is_none());
    }

    #[test]
    fn test_month_navigation_wraps_years() {
        let jan = MonthView::parse("2024-01").unwrap();
        assert_eq!(jan.previous(), MonthView::new(2023, 12));
        assert_eq!(jan.previous().and_then(|m| m.next()), Some(jan));
        assert_eq!(MonthView::parse("2024-12").unwrap().next().unwrap().year(), 2025);
        assert!(MonthView::parse("2024/01").is_none());
    }

    #[test]
    fn test_month_view_at_edges_of_date_range() {
        let last = NaiveDate::MAX;
        assert_eq!(MonthView::containing(last), None);
        assert!(MonthView::parse(&format!("{}-{:02}", last.year(), last.month())).is_none());
        // Whatever chrono's range is, an accepted month has a sane length.
        if let Some(view) = MonthView::parse("262142-12") {
            assert_eq!(view.days_in_month(), 31);
            assert_eq!(view.cells().len() as u32, view.leading_blanks() + 31);
        }

        let penultimate = last.checked_sub_months(Months::new(1)).unwrap();
        let view = MonthView::containing(penultimate).unwrap();
        assert_eq!(view.next(), None);

        let earliest = MonthView::containing(NaiveDate::MIN).unwrap();
        assert_eq!(earliest.previous(), None);
        assert_eq!(earliest.days_in_month(), 31);
    }

    #[test]
    fn test_days_with_entries() {
        let jan = MonthView::new(2024, 1).unwrap();
        let days = jan.days_with_entries(&sample(), &Utc);
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![1]);
    }
}
