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

pub mod localtime;

use config::Config;
use self::localtime::LocalStamp;
use sensor::{Fix, FixSource};
use storage::LogSink;
use tracker::handle::Clock;

/// Produces one CSV record per invocation, if the receiver can come up
/// with a valid fix inside the timeout.
pub struct Recorder {
    sink: Box<LogSink>,
    cfg: Config,
}

impl Recorder {
    pub fn new(sink: Box<LogSink>, cfg: Config) -> Recorder {
        Recorder { sink, cfg }
    }

    /// One logging cycle: wait (bounded) for a fix, then format and append
    /// a record. Every failure path reports and returns; the next interval
    /// is the only retry.
    pub fn log_cycle(&mut self, gps: &mut FixSource, clock: &Clock) {
        if !self.wait_for_fix(gps, clock) {
            warn!(
                "no valid fix within {:?}, skipping this cycle",
                self.cfg.fix_timeout
            );
            return;
        }

        let line = {
            let fix = gps.fix();

            let time = match fix.time {
                Some(ref t) => t.clone(),
                None => {
                    warn!("fix has no usable timestamp, skipping this cycle");
                    return;
                }
            };

            let stamp = localtime::from_utc(&time, self.cfg.utc_offset_hours, self.cfg.date_mode);

            format_record(fix, &stamp)
        };

        info!("appending record: {}", line);

        if let Err(e) = self.sink.append_line(&line) {
            error!("could not append record, dropping it: {}", e);
        }
    }

    /// The fix-wait state machine: drain the receiver until a position
    /// commits or the timeout elapses, then judge the fix by its validity
    /// flag regardless of how the loop exited.
    fn wait_for_fix(&self, gps: &mut FixSource, clock: &Clock) -> bool {
        let start = clock.now();

        loop {
            gps.drain_incoming();

            if gps.take_updated() {
                break;
            }

            if clock.now().duration_since(start) >= self.cfg.fix_timeout {
                break;
            }
        }

        gps.fix().valid
    }
}

/// Fixed-width CSV line: date, time, position to 6 decimals, altitude and
/// speed to 2, satellite count plain. Absent readings log as zero.
fn format_record(fix: &Fix, stamp: &LocalStamp) -> String {
    format!(
        "{:02}/{:02}/{:04},{:02}:{:02}:{:02},{:.6},{:.6},{:.2},{:.2},{}",
        stamp.month,
        stamp.day,
        stamp.year,
        stamp.hour,
        stamp.minute,
        stamp.second,
        fix.lat,
        fix.lon,
        fix.altitude_m.unwrap_or(0.0),
        fix.speed_mph.unwrap_or(0.0),
        fix.num_sat.unwrap_or(0)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::prelude::*;
    use sensor::fake::FakeFixSource;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    struct StepClock {
        now: Cell<Instant>,
        step: Duration,
    }

    impl StepClock {
        fn new(step: Duration) -> StepClock {
            StepClock {
                now: Cell::new(Instant::now()),
                step,
            }
        }
    }

    impl Clock for StepClock {
        fn now(&self) -> Instant {
            let t = self.now.get();
            self.now.set(t + self.step);
            t
        }
    }

    struct VecSink(Rc<RefCell<Vec<String>>>);

    impl LogSink for VecSink {
        fn append_line(&mut self, line: &str) -> io::Result<()> {
            self.0.borrow_mut().push(line.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn append_line(&mut self, _line: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "log file gone"))
        }
    }

    fn valid_fix() -> Fix {
        Fix {
            valid: true,
            lat: 37.1234567,
            lon: -122.0,
            time: Some(UTC.ymd(2025, 6, 15).and_hms(14, 0, 0)),
            altitude_m: None,
            speed_mph: None,
            num_sat: None,
        }
    }

    fn recorder(lines: Rc<RefCell<Vec<String>>>) -> Recorder {
        Recorder::new(Box::new(VecSink(lines)), Config::default())
    }

    #[test]
    fn test_success_path_appends_one_record() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recorder(lines.clone());
        let clock = StepClock::new(Duration::from_millis(100));
        let mut gps = FakeFixSource::new(valid_fix(), 1);

        rec.log_cycle(&mut gps, &clock);

        // -7 shifts 14:00 UTC to 07:00 the same day; absent readings are zero
        assert_eq!(
            *lines.borrow(),
            vec!["06/15/2025,07:00:00,37.123457,-122.000000,0.00,0.00,0".to_string()]
        );
    }

    #[test]
    fn test_midnight_crossing_record() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recorder(lines.clone());
        let clock = StepClock::new(Duration::from_millis(100));

        let mut fix = valid_fix();
        fix.time = Some(UTC.ymd(2025, 6, 15).and_hms(3, 15, 42));
        fix.altitude_m = Some(545.4);
        fix.speed_mph = Some(25.777472);
        fix.num_sat = Some(8);
        let mut gps = FakeFixSource::new(fix, 1);

        rec.log_cycle(&mut gps, &clock);

        assert_eq!(
            *lines.borrow(),
            vec!["06/14/2025,20:15:42,37.123457,-122.000000,545.40,25.78,8".to_string()]
        );
    }

    #[test]
    fn test_timeout_appends_nothing() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recorder(lines.clone());
        let clock = StepClock::new(Duration::from_millis(500));
        // never updates, never valid
        let mut gps = FakeFixSource::new(Fix::default(), 0);

        rec.log_cycle(&mut gps, &clock);

        assert!(lines.borrow().is_empty());
    }

    #[test]
    fn test_invalid_fix_after_update_is_skipped() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut rec = recorder(lines.clone());
        let clock = StepClock::new(Duration::from_millis(100));

        // updates arrive but the receiver still reports no valid position
        let mut invalid = valid_fix();
        invalid.valid = false;
        let mut gps = FakeFixSource::new(invalid, 1);

        rec.log_cycle(&mut gps, &clock);

        assert!(lines.borrow().is_empty());
    }

    #[test]
    fn test_append_failure_is_absorbed() {
        let mut rec = Recorder::new(Box::new(FailingSink), Config::default());
        let clock = StepClock::new(Duration::from_millis(100));
        let mut gps = FakeFixSource::new(valid_fix(), 1);

        // must not panic or propagate
        rec.log_cycle(&mut gps, &clock);
    }

    #[test]
    fn test_format_record_precision() {
        let stamp = LocalStamp {
            year: 2025,
            month: 1,
            day: 2,
            hour: 3,
            minute: 4,
            second: 5,
        };

        let mut fix = valid_fix();
        fix.lat = 37.1234567;
        fix.lon = -122.4567891;
        fix.altitude_m = Some(16.303);
        fix.speed_mph = Some(5.984056);
        fix.num_sat = Some(12);

        assert_eq!(
            format_record(&fix, &stamp),
            "01/02/2025,03:04:05,37.123457,-122.456789,16.30,5.98,12"
        );
    }
}
