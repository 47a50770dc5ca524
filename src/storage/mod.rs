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

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const HEADER: &'static str =
    "Local_Date,Local_Time,Latitude,Longitude,Altitude_m,Speed_mph,Num_Satellites";

/// Append capability for finished records. One line in, never read back.
pub trait LogSink {
    fn append_line(&mut self, line: &str) -> io::Result<()>;
}

/// The CSV log file. Header is written once at creation; every record is
/// appended through a fresh handle and synced, so a pulled plug loses at
/// most the line being written.
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    /// Fails only when the directory holding the log is unusable. A log
    /// file that cannot be created is reported here and again on every
    /// append until resolved externally.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<CsvLog> {
        let path = path.as_ref().to_path_buf();

        let dir = match path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        try!(fs::metadata(&dir));

        let log = CsvLog { path };

        match log.ensure_header() {
            Ok(true) => info!("created {} with header", log.path.display()),
            Ok(false) => info!("appending to existing {}", log.path.display()),
            Err(e) => error!("could not create {}: {}", log.path.display(), e),
        }

        Ok(log)
    }

    /// Writes the header line if the log does not exist yet. Returns
    /// whether a new file was created.
    fn ensure_header(&self) -> io::Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        let mut f = try!(
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.path)
        );
        try!(writeln!(f, "{}", HEADER));
        try!(f.sync_data());

        Ok(true)
    }
}

impl LogSink for CsvLog {
    fn append_line(&mut self, line: &str) -> io::Result<()> {
        let mut f = try!(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)
        );
        try!(writeln!(f, "{}", line));
        try!(f.sync_data());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Read;
    use std::process;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("gpslog-test-{}-{}.csv", name, process::id()))
    }

    fn read_lines(p: &Path) -> Vec<String> {
        let mut buf = String::new();
        File::open(p).unwrap().read_to_string(&mut buf).unwrap();
        buf.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_header_written_exactly_once() {
        let p = temp_path("header");
        let _ = fs::remove_file(&p);

        let mut log = CsvLog::create(&p).unwrap();
        assert_eq!(read_lines(&p), vec![HEADER.to_string()]);

        log.append_line("a,b").unwrap();

        // re-opening an existing log must not duplicate the header
        let mut log = CsvLog::create(&p).unwrap();
        log.append_line("c,d").unwrap();

        assert_eq!(
            read_lines(&p),
            vec![HEADER.to_string(), "a,b".to_string(), "c,d".to_string()]
        );

        fs::remove_file(&p).unwrap();
    }

    #[test]
    fn test_unusable_directory_is_fatal() {
        assert!(CsvLog::create("/nonexistent-gpslog-dir/gpslog.csv").is_err());
    }
}
