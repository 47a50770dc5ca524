// Gpslog - a periodic GPS track logger
// Copyright (C) 2024  The Gpslog Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use chrono::prelude::*;
use chrono::Duration;

/// How the date borrows when the hour offset crosses midnight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateMode {
    /// Historical behavior: the borrow decrements day, month and year by
    /// exactly 1 and never consults the previous month's length, so
    /// crossing the 1st of a month yields day 0. Existing logs were
    /// written this way and downstream consumers expect it.
    Wrapped,
    /// Calendar-correct conversion.
    Clamped,
}

/// A local civil timestamp, derived from a fix and never stored. Plain
/// signed fields so the wrapped borrow's day 0 is representable.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct LocalStamp {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: i32,
}

pub fn from_utc(t: &DateTime<UTC>, offset_hours: i32, mode: DateMode) -> LocalStamp {
    match mode {
        DateMode::Clamped => {
            let l = t.clone() + Duration::hours(offset_hours as i64);

            LocalStamp {
                year: l.year(),
                month: l.month() as i32,
                day: l.day() as i32,
                hour: l.hour() as i32,
                minute: l.minute() as i32,
                second: l.second() as i32,
            }
        }
        DateMode::Wrapped => {
            let mut year = t.year();
            let mut month = t.month() as i32;
            let mut day = t.day() as i32;
            let mut hour = t.hour() as i32 + offset_hours;

            if hour < 0 {
                hour += 24;
                day -= 1;

                if day < 1 {
                    // no clamp to the previous month's length here
                    month -= 1;

                    if month < 1 {
                        month = 12;
                        year -= 1;
                    }
                }
            } else if hour > 23 {
                hour -= 24;
                day += 1;
            }

            LocalStamp {
                year,
                month,
                day,
                hour,
                minute: t.minute() as i32,
                second: t.second() as i32,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<UTC> {
        UTC.ymd(y, mo, d).and_hms(h, mi, s)
    }

    #[test]
    fn test_same_day_shift() {
        let l = from_utc(&utc(2025, 6, 15, 14, 0, 0), -7, DateMode::Wrapped);
        assert_eq!(
            l,
            LocalStamp {
                year: 2025,
                month: 6,
                day: 15,
                hour: 7,
                minute: 0,
                second: 0,
            }
        );
    }

    #[test]
    fn test_midnight_borrow() {
        let l = from_utc(&utc(2025, 6, 15, 3, 15, 42), -7, DateMode::Wrapped);
        assert_eq!(l.day, 14);
        assert_eq!(l.hour, 20);
        assert_eq!(l.minute, 15);
        assert_eq!(l.second, 42);
    }

    #[test]
    fn test_month_borrow_does_not_clamp() {
        // crossing the 1st leaves day at 0, month decremented by exactly 1
        let l = from_utc(&utc(2025, 6, 1, 1, 0, 0), -7, DateMode::Wrapped);
        assert_eq!((l.year, l.month, l.day, l.hour), (2025, 5, 0, 18));
    }

    #[test]
    fn test_year_borrow() {
        let l = from_utc(&utc(2025, 1, 1, 2, 0, 0), -7, DateMode::Wrapped);
        assert_eq!((l.year, l.month, l.day, l.hour), (2024, 12, 0, 19));
    }

    #[test]
    fn test_clamped_mode_is_calendar_correct() {
        let l = from_utc(&utc(2025, 6, 1, 1, 0, 0), -7, DateMode::Clamped);
        assert_eq!((l.year, l.month, l.day, l.hour), (2025, 5, 31, 18));
    }

    #[test]
    fn test_positive_offset_carries_forward() {
        let l = from_utc(&utc(2025, 6, 15, 22, 0, 0), 5, DateMode::Wrapped);
        assert_eq!((l.day, l.hour), (16, 3));
    }
}
