//! arXiv update-day calendar.
//!
//! New papers appear in the feed at 00:00 UTC Monday through Friday
//! (20:00 US-Eastern Sunday through Thursday), and a US holiday pushes the
//! following day's update back. See
//! <https://info.arxiv.org/help/availability.html>.

use chrono::Weekday;
use lazy_static::lazy_static;

use super::*;

lazy_static! {
  /// 2024 arXiv holidays (US-Eastern dates). A holiday on day `d` delays the
  /// UTC update of day `d + 1`.
  static ref HOLIDAYS_2024: Vec<NaiveDate> = [
    "2024-01-15",
    "2024-05-22",
    "2024-06-19",
    "2024-07-04",
    "2024-09-02",
    "2024-11-28",
    "2024-12-25",
    "2024-12-26",
    "2024-12-31",
  ]
  .iter()
  .map(|d| d.parse().expect("static holiday date"))
  .collect();
}

/// Whether no feed update happens on the given UTC date.
fn is_skipped(day: NaiveDate) -> bool {
  let eastern_evening_before = day.pred_opt().expect("date in supported range");
  HOLIDAYS_2024.contains(&eastern_evening_before)
    || matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The next time the feed will carry new announcements, at or after `now`.
///
/// Rounds up to the next UTC midnight when `now` is past one, then skips
/// weekends and holiday-delayed days.
pub fn next_update_time(now: DateTime<Utc>) -> DateTime<Utc> {
  let mut day = now.date_naive();
  let midnight = day.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc();
  if now > midnight {
    day = day.succ_opt().expect("date in supported range");
  }
  while is_skipped(day) {
    day = day.succ_opt().expect("date in supported range");
  }
  day.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc()
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
  }

  #[test]
  fn test_midnight_on_update_day_is_not_advanced() {
    // 2024-09-04 is a Wednesday with no preceding holiday
    assert_eq!(next_update_time(utc(2024, 9, 4, 0)), utc(2024, 9, 4, 0));
  }

  #[test]
  fn test_holiday_delays_following_update() {
    // Labor Day 2024-09-02 delays the 09-03 update to 09-04
    assert_eq!(next_update_time(utc(2024, 9, 3, 0)), utc(2024, 9, 4, 0));
  }

  #[test]
  fn test_weekend_skipped() {
    // Friday noon rolls over Sat/Sun to Monday
    assert_eq!(next_update_time(utc(2024, 9, 6, 12)), utc(2024, 9, 9, 0));
  }

  #[test]
  fn test_consecutive_holidays_and_weekend() {
    // 12-25 and 12-26 are holidays, then 12-28/29 are a weekend
    assert_eq!(next_update_time(utc(2024, 12, 25, 12)), utc(2024, 12, 30, 0));
  }
}
