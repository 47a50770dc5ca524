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

#[macro_use]
extern crate log;
extern crate chrono;
extern crate env_logger;
extern crate nom;
extern crate serial;

#[macro_use]
mod utils;
mod config;
mod recorder;
mod sensor;
mod storage;
mod tracker;

use config::Config;
use recorder::Recorder;
use std::env;
use std::process;
use tracker::handle::SystemClock;
use tracker::Tracker;

fn init_logging() {
    let mut builder = env_logger::LogBuilder::new();
    builder.filter(None, log::LogLevelFilter::Info);

    if let Ok(directives) = env::var("RUST_LOG") {
        builder.parse(&directives);
    }

    builder.init().unwrap();
}

fn main() {
    init_logging();

    let cfg = Config::default();

    // without somewhere to put records there is nothing to do
    let sink = match storage::CsvLog::create(config::LOG_PATH) {
        Ok(s) => s,
        Err(e) => {
            error!("storage unavailable: {}", e);
            process::exit(1);
        }
    };

    let gps = match sensor::gps::GpsSensor::new() {
        Some(g) => g,
        None => {
            error!("no GPS receiver found, every cycle would time out");
            process::exit(1);
        }
    };

    let recorder = Recorder::new(Box::new(sink), cfg);

    Tracker::new(gps, recorder, SystemClock, &cfg).run();
}
