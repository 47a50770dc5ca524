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

use recorder::localtime::DateMode;
use std::time::Duration;

pub const LOG_PATH: &'static str = "gpslog.csv";

const LOG_INTERVAL_MS: u64 = 300_000;
const FIX_TIMEOUT_MS: u64 = 10_000;
const UTC_OFFSET_HOURS: i32 = -7;

/// Compile-time knobs, collected into one value so tests can shorten
/// the intervals.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// How often a record is appended to the log
    pub log_interval: Duration,
    /// How long a cycle may wait for the receiver to produce a fix
    pub fix_timeout: Duration,
    /// Fixed signed hour offset applied to UTC for the logged timestamp
    pub utc_offset_hours: i32,
    /// How the date borrows when the offset crosses midnight
    pub date_mode: DateMode,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            log_interval: Duration::from_millis(LOG_INTERVAL_MS),
            fix_timeout: Duration::from_millis(FIX_TIMEOUT_MS),
            utc_offset_hours: UTC_OFFSET_HOURS,
            date_mode: DateMode::Wrapped,
        }
    }
}
