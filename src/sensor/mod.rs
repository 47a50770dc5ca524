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

pub mod fake;
pub mod gps;
pub mod nmea;

use chrono::prelude::*;

/// The receiver's freshest reported state. One instance per process,
/// overwritten in place as sentences decode; never reset.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Fix {
    /// Whether the receiver currently reports a usable position
    pub valid: bool,
    /// Latitude in signed degrees, positive is north
    pub lat: f64,
    /// Longitude in signed degrees, positive is east
    pub lon: f64,
    /// UTC timestamp reported alongside the position
    pub time: Option<DateTime<UTC>>,
    /// Height above MSL in meters, if the receiver reports one
    pub altitude_m: Option<f64>,
    /// Speed over ground in mph, if the receiver reports one
    pub speed_mph: Option<f64>,
    /// Satellites used in the solution, if the receiver reports them
    pub num_sat: Option<u32>,
}

/// A source of fixes: something that can be polled for buffered input and
/// exposes the decoder's current state.
pub trait FixSource {
    /// Consume all currently buffered bytes, feeding complete sentences
    /// into the decoder. Must never block waiting for more input.
    fn drain_incoming(&mut self);

    /// The decoder's current fix
    fn fix(&self) -> &Fix;

    /// Whether a position has committed since the last call; reading
    /// clears the flag
    fn take_updated(&mut self) -> bool;
}
