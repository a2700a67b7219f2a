use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

/// Fire once a day at `hour:minute`, in local time unless `utc` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub hour: u8,
    pub minute: u8,
    pub utc: bool,
}

impl DailySchedule {
    pub fn new(hour: u8, minute: u8, utc: bool) -> Self {
        Self { hour, minute, utc }
    }

    /// Next fire instant strictly after `from`.
    ///
    /// Returns `None` only when `hour`/`minute` are out of range.
    pub fn next_after(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.utc {
            next_daily_run(&Utc, self.hour, self.minute, from)
        } else {
            next_daily_run(&Local, self.hour, self.minute, from)
        }
    }
}

/// Compute the next `hour:minute` wall-clock time in `tz` strictly after
/// `from`.
///
/// A wall-clock time skipped by a DST jump moves to the next day that has it.
pub fn next_daily_run<Tz: TimeZone>(
    tz: &Tz,
    hour: u8,
    minute: u8,
    from: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let local_today = from.with_timezone(tz).date_naive();

    // Today, tomorrow, and one spare day for a DST gap on tomorrow.
    for offset in 0..=2 {
        let day = local_today + Duration::days(offset);
        if let Some(candidate) = at_wall_clock(tz, day, hour, minute) {
            if candidate > from {
                return Some(candidate);
            }
        }
    }
    None
}

fn at_wall_clock<Tz: TimeZone>(
    tz: &Tz,
    day: NaiveDate,
    hour: u8,
    minute: u8,
) -> Option<DateTime<Utc>> {
    let naive = day.and_hms_opt(hour as u32, minute as u32, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn later_today_fires_today() {
        let next = next_daily_run(&Utc, 15, 15, utc(2026, 3, 10, 9, 0)).unwrap();
        assert_eq!(next, utc(2026, 3, 10, 15, 15));
    }

    #[test]
    fn passed_window_rolls_to_tomorrow() {
        let next = next_daily_run(&Utc, 15, 15, utc(2026, 3, 10, 16, 0)).unwrap();
        assert_eq!(next, utc(2026, 3, 11, 15, 15));
    }

    #[test]
    fn exact_fire_time_rolls_to_tomorrow() {
        let next = next_daily_run(&Utc, 15, 15, utc(2026, 3, 10, 15, 15)).unwrap();
        assert_eq!(next, utc(2026, 3, 11, 15, 15));
    }

    #[test]
    fn month_boundary() {
        let next = next_daily_run(&Utc, 0, 5, utc(2026, 1, 31, 23, 0)).unwrap();
        assert_eq!(next, utc(2026, 2, 1, 0, 5));
    }

    #[test]
    fn offset_zone_uses_its_wall_clock() {
        // 15:15 at UTC+2 is 13:15 UTC.
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let next = next_daily_run(&tz, 15, 15, utc(2026, 3, 10, 9, 0)).unwrap();
        assert_eq!(next, utc(2026, 3, 10, 13, 15));
    }

    #[test]
    fn out_of_range_time_is_none() {
        assert!(next_daily_run(&Utc, 24, 0, utc(2026, 3, 10, 9, 0)).is_none());
        assert!(DailySchedule::new(10, 60, true)
            .next_after(utc(2026, 3, 10, 9, 0))
            .is_none());
    }

    #[test]
    fn local_schedule_is_within_a_day() {
        let now = Utc::now();
        let next = DailySchedule::new(15, 15, false).next_after(now).unwrap();
        assert!(next > now);
        assert!(next - now <= Duration::hours(25));
        assert_eq!(next.with_timezone(&Local).minute(), 15);
    }
}
