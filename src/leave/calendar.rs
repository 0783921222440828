use chrono::{Datelike, NaiveDate, Weekday};

/// Monday-Friday dates in `start..=end`, never less than 1.
///
/// Holidays are not consulted. An inverted range counts as 1; callers reject it first.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let weekdays = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .count();

    u32::try_from(weekdays).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn full_work_week() {
        // 2024-01-01 is a Monday
        assert_eq!(business_days(date(2024, 1, 1), date(2024, 1, 5)), 5);
    }

    #[test]
    fn weekend_only_floors_to_one() {
        assert_eq!(business_days(date(2024, 1, 6), date(2024, 1, 7)), 1);
    }

    #[test]
    fn single_day_and_spanning_weekend() {
        assert_eq!(business_days(date(2024, 1, 3), date(2024, 1, 3)), 1);
        // Fri..Tue
        assert_eq!(business_days(date(2024, 1, 5), date(2024, 1, 9)), 3);
        assert_eq!(business_days(date(2024, 1, 1), date(2024, 1, 31)), 23);
    }
}
