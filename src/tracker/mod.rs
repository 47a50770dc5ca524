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

pub mod handle;

use config::Config;
use recorder::Recorder;
use self::handle::Clock;
use sensor::FixSource;
use std::thread::sleep;
use std::time::{Duration, Instant};

const POLL_INTERVAL_MS: u64 = 50;

/// The control loop. Owns the single receiver instance and the recorder;
/// drains serial input every pass and fires the recorder once per
/// `log_interval`.
pub struct Tracker<C: Clock> {
    gps: Box<FixSource>,
    recorder: Recorder,
    clock: C,
    interval: Duration,
    last_log: Option<Instant>,
}

impl<C: Clock> Tracker<C> {
    pub fn new(gps: Box<FixSource>, recorder: Recorder, clock: C, cfg: &Config) -> Tracker<C> {
        Tracker {
            gps,
            recorder,
            clock,
            interval: cfg.log_interval,
            // None means the gate is already open, so the first pass
            // produces a record right away
            last_log: None,
        }
    }

    /// One pass of the loop: drain the receiver, then invoke the recorder
    /// if the interval has elapsed.
    pub fn tick(&mut self) {
        self.gps.drain_incoming();

        let now = self.clock.now();
        let due = match self.last_log {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };

        if due {
            self.last_log = Some(now);
            self.recorder.log_cycle(&mut *self.gps, &self.clock);
        }
    }

    pub fn run(&mut self) {
        info!("logging a record every {:?}", self.interval);

        loop {
            let before = Instant::now();

            self.tick();

            // a due tick blocks in the fix-wait for up to the timeout, so
            // only pad out the short passes
            let elapsed = before.elapsed();
            let poll = Duration::from_millis(POLL_INTERVAL_MS);

            if elapsed < poll {
                sleep(poll - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::prelude::*;
    use recorder::Recorder;
    use sensor::fake::FakeFixSource;
    use sensor::Fix;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use storage::LogSink;

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

    fn fix() -> Fix {
        Fix {
            valid: true,
            lat: 48.1173,
            lon: 11.516667,
            time: Some(UTC.ymd(2025, 6, 15).and_hms(14, 0, 0)),
            altitude_m: Some(545.4),
            speed_mph: Some(25.78),
            num_sat: Some(8),
        }
    }

    fn tracker(interval: Duration, lines: Rc<RefCell<Vec<String>>>) -> Tracker<StepClock> {
        let cfg = Config {
            log_interval: interval,
            ..Config::default()
        };
        let recorder = Recorder::new(Box::new(VecSink(lines)), cfg);
        let gps = Box::new(FakeFixSource::new(fix(), 1));

        Tracker::new(gps, recorder, StepClock::new(Duration::from_secs(1)), &cfg)
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut t = tracker(Duration::from_secs(300), lines.clone());

        t.tick();
        assert_eq!(lines.borrow().len(), 1);

        // gate just closed, the next pass must not log again
        t.tick();
        assert_eq!(lines.borrow().len(), 1);
    }

    #[test]
    fn test_gate_reopens_after_interval() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let mut t = tracker(Duration::from_millis(1), lines.clone());

        t.tick();
        t.tick();
        assert_eq!(lines.borrow().len(), 2);
    }
}
