use crate::config::DayCountPolicy;
use crate::store::{CalendarStore, HrStore, StoreError, StoreResult};
use chrono::{Datelike, NaiveDate, Weekday};
use moka::future::Cache;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Holiday dates of one year.
type HolidaySet = Arc<BTreeSet<NaiveDate>>;

/// Turns a leave date range into a day count under the configured policy.
///
/// Holidays are loaded per year and cached; callers that change holidays
/// must call [`WorkCalendar::invalidate_year`].
pub struct WorkCalendar {
    store: Arc<dyn HrStore>,
    policy: DayCountPolicy,
    holidays: Cache<i32, HolidaySet>,
}

impl WorkCalendar {
    pub fn new(store: Arc<dyn HrStore>, policy: DayCountPolicy) -> Self {
        Self {
            store,
            policy,
            holidays: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(3600))
                .build(),
        }
    }

    pub fn policy(&self) -> DayCountPolicy {
        self.policy
    }

    pub async fn count_days(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<i32> {
        match self.policy {
            DayCountPolicy::Calendar => Ok(calendar_days(start, end)),
            DayCountPolicy::Working => {
                let mut holidays = BTreeSet::new();
                for year in start.year()..=end.year() {
                    holidays.extend(self.holidays_of(year).await?.iter().copied());
                }
                Ok(working_days(start, end, &holidays))
            }
        }
    }

    pub async fn invalidate_year(&self, year: i32) {
        self.holidays.invalidate(&year).await;
    }

    async fn holidays_of(&self, year: i32) -> StoreResult<HolidaySet> {
        let store = self.store.clone();
        self.holidays
            .try_get_with(year, async move {
                let dates: BTreeSet<NaiveDate> = store
                    .list_holidays(year)
                    .await?
                    .into_iter()
                    .map(|h| h.date)
                    .collect();
                tracing::debug!(year, count = dates.len(), "Loaded holiday calendar");
                Ok::<_, StoreError>(Arc::new(dates))
            })
            .await
            .map_err(|e| StoreError::Unexpected(anyhow::anyhow!("loading holidays: {e}")))
    }
}

/// Inclusive calendar span; zero when `end < start`.
pub fn calendar_days(start: NaiveDate, end: NaiveDate) -> i32 {
    ((end - start).num_days() + 1).max(0) as i32
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive span minus Saturdays, Sundays and `holidays`.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> i32 {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !is_weekend(*d) && !holidays.contains(d))
        .count() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn calendar_span_is_inclusive() {
        assert_eq!(calendar_days(d(2026, 3, 2), d(2026, 3, 2)), 1);
        assert_eq!(calendar_days(d(2026, 3, 2), d(2026, 3, 4)), 3);
        assert_eq!(calendar_days(d(2026, 3, 4), d(2026, 3, 2)), 0);
    }

    #[test]
    fn working_days_skip_weekends() {
        // Fri 2026-03-06 .. Mon 2026-03-09
        assert_eq!(working_days(d(2026, 3, 6), d(2026, 3, 9), &BTreeSet::new()), 2);
        // Sat..Sun only
        assert_eq!(working_days(d(2026, 3, 7), d(2026, 3, 8), &BTreeSet::new()), 0);
    }

    #[test]
    fn working_days_skip_holidays() {
        let holidays = BTreeSet::from([d(2026, 3, 3)]);
        // Mon..Fri with a Tuesday holiday
        assert_eq!(working_days(d(2026, 3, 2), d(2026, 3, 6), &holidays), 4);
    }
}
