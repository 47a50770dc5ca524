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
use chrono::LocalResult;
use nom::{ErrorKind, IResult, Needed};
use sensor::Fix;
use std::mem;
use std::str;

#[derive(Debug)]
pub enum ProtocolError {
    Parse(ErrorKind),
    Checksum,
    Encoding,
}

/// One framed sentence: the text between `$` and `*`, already verified
/// against its checksum.
#[derive(Debug, PartialEq)]
pub struct Sentence {
    body: String,
}

/// Frames the next `$...*hh` sentence out of `input`, skipping leading
/// garbage. A sentence whose `*hh` tail has not arrived yet reports
/// `Incomplete` so the caller retains the bytes until the rest shows up;
/// `Error` means nothing in the buffer is worth keeping.
pub fn parse_sentence(input: &[u8]) -> IResult<&[u8], Sentence> {
    if input.is_empty() {
        return IResult::Incomplete(Needed::Size(1));
    }

    let start = match input.iter().position(|&b| b == b'$') {
        Some(p) => p,
        // no sentence head anywhere, all garbage
        None => return IResult::Error(ErrorKind::Tag),
    };

    let body_start = start + 1;

    let star = match input[body_start..].iter().position(|&b| b == b'*') {
        Some(p) => body_start + p,
        // tail still in flight
        None => return IResult::Incomplete(Needed::Unknown),
    };

    if input.len() < star + 3 {
        return IResult::Incomplete(Needed::Size(star + 3));
    }

    match Sentence::from_frame(&input[body_start..star], &input[star + 1..star + 3]) {
        Ok(s) => IResult::Done(&input[star + 3..], s),
        Err(e) => {
            debug!("sentence rejected: {:?}", e);
            IResult::Error(ErrorKind::Verify)
        }
    }
}

impl Sentence {
    /// Verifies the XOR checksum and lifts the framed body to text
    fn from_frame(body: &[u8], checksum: &[u8]) -> Result<Sentence, ProtocolError> {
        let mut sum = 0_u8;
        for b in body {
            sum ^= *b;
        }

        let checksum = match str::from_utf8(checksum) {
            Ok(s) => s,
            Err(_) => return Err(ProtocolError::Encoding),
        };
        let checksum = match u8::from_str_radix(checksum, 16) {
            Ok(c) => c,
            Err(_) => return Err(ProtocolError::Checksum),
        };

        if sum != checksum {
            return Err(ProtocolError::Checksum);
        }

        match str::from_utf8(body) {
            Ok(s) => Ok(Sentence {
                body: s.to_string(),
            }),
            Err(_) => Err(ProtocolError::Encoding),
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.body.split(',').collect()
    }
}

/// Decodes verified sentences into the single `Fix` instance. Only RMC and
/// GGA carry anything the log records; everything else is ignored.
pub struct NmeaDecoder {
    fix: Fix,
    updated: bool,
}

impl NmeaDecoder {
    pub fn new() -> NmeaDecoder {
        NmeaDecoder {
            fix: Fix::default(),
            updated: false,
        }
    }

    pub fn fix(&self) -> &Fix {
        &self.fix
    }

    pub fn take_updated(&mut self) -> bool {
        mem::replace(&mut self.updated, false)
    }

    pub fn handle_sentence(&mut self, s: &Sentence) {
        let fields = s.fields();

        if fields.is_empty() {
            return;
        }

        // talker prefix (GP/GN/...) varies by constellation
        if fields[0].ends_with("RMC") {
            self.handle_rmc(&fields);
        } else if fields[0].ends_with("GGA") {
            self.handle_gga(&fields);
        }
    }

    /// RMC carries position, date, time, speed over ground and the
    /// receiver's A/V status. A committed position raises the updated flag.
    fn handle_rmc(&mut self, fields: &[&str]) {
        if fields.len() < 10 {
            return;
        }

        if fields[2] != "A" {
            // receiver explicitly reports no fix
            self.fix.valid = false;
            return;
        }

        let lat = parse_coordinate(fields[3], fields[4]);
        let lon = parse_coordinate(fields[5], fields[6]);

        let (lat, lon) = match (lat, lon) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return,
        };

        self.fix.time = match (parse_dmy(fields[9]), parse_hms(fields[1])) {
            (Some((d, mo, y)), Some((h, mi, s))) => match UTC.ymd_opt(y, mo, d) {
                LocalResult::Single(date) => date.and_hms_opt(h, mi, s),
                _ => None,
            },
            _ => None,
        };

        self.fix.speed_mph = match fields[7].parse::<f64>() {
            Ok(knots) => Some(knots_to_mph!(knots)),
            Err(_) => None,
        };

        self.fix.lat = lat;
        self.fix.lon = lon;
        self.fix.valid = true;
        self.updated = true;
    }

    /// GGA supplies the unvalidated extras: antenna altitude and the
    /// satellite count, usable only while the quality indicator is nonzero.
    fn handle_gga(&mut self, fields: &[&str]) {
        if fields.len() < 10 {
            return;
        }

        let quality = match fields[6].parse::<u32>() {
            Ok(q) => q,
            Err(_) => 0,
        };

        if quality == 0 {
            self.fix.num_sat = None;
            self.fix.altitude_m = None;
            return;
        }

        self.fix.num_sat = fields[7].parse().ok();
        self.fix.altitude_m = fields[9].parse().ok();
    }
}

/// `ddmm.mmmm` plus a hemisphere letter to signed decimal degrees
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let raw = match value.parse::<f64>() {
        Ok(v) => v,
        Err(_) => return None,
    };

    let degrees = (raw / 100_f64).trunc();
    let minutes = raw - degrees * 100_f64;
    let decimal = degrees + minutes / 60_f64;

    match hemisphere {
        "N" | "E" => Some(decimal),
        "S" | "W" => Some(-decimal),
        _ => None,
    }
}

/// `hhmmss[.sss]` to (hour, minute, second)
fn parse_hms(field: &str) -> Option<(u32, u32, u32)> {
    if field.len() < 6 || !field.is_ascii() {
        return None;
    }

    match (
        field[0..2].parse(),
        field[2..4].parse(),
        field[4..6].parse(),
    ) {
        (Ok(h), Ok(m), Ok(s)) => Some((h, m, s)),
        _ => None,
    }
}

/// `ddmmyy` to (day, month, year); two-digit years land in 20xx
fn parse_dmy(field: &str) -> Option<(u32, u32, i32)> {
    if field.len() != 6 || !field.is_ascii() {
        return None;
    }

    match (
        field[0..2].parse(),
        field[2..4].parse(),
        field[4..6].parse::<i32>(),
    ) {
        (Ok(d), Ok(m), Ok(y)) => Some((d, m, 2000 + y)),
        _ => None,
    }
}
