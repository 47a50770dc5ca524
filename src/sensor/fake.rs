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

use super::{Fix, FixSource};
use std::mem;

/// Scripted fix source so the recorder and tracker can be exercised
/// without hardware.
pub struct FakeFixSource {
    fix: Fix,
    ready_after: u32,
    drains: u32,
    updated: bool,
}

impl FakeFixSource {
    /// `ready_after` is the number of drains before the fix reads as
    /// updated; 0 means it never does.
    pub fn new(fix: Fix, ready_after: u32) -> FakeFixSource {
        FakeFixSource {
            fix,
            ready_after,
            drains: 0,
            updated: false,
        }
    }
}

impl FixSource for FakeFixSource {
    fn drain_incoming(&mut self) {
        self.drains += 1;

        if self.ready_after > 0 && self.drains >= self.ready_after {
            self.updated = true;
        }
    }

    fn fix(&self) -> &Fix {
        &self.fix
    }

    fn take_updated(&mut self) -> bool {
        mem::replace(&mut self.updated, false)
    }
}
