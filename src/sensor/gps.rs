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

use nom::{shift, IResult};
use sensor::nmea::{parse_sentence, NmeaDecoder, ProtocolError, Sentence};
use sensor::{Fix, FixSource};
use serial::{self, BaudRate, SerialPort, SystemPort};
use std::io::{self, Read};
use std::time::Duration;

const SERIAL_PATHS: [&'static str; 3] = ["/dev/ttyAMA0", "/dev/ttyACM0", "/dev/ttyUSB0"];
const BAUD_RATE: BaudRate = BaudRate::Baud9600;
const RECV_BUFFER_SIZE: usize = 1024;

#[derive(Debug)]
pub enum Error {
    /// No complete sentence in the buffer and no new bytes available
    Exhausted,
    Protocol(ProtocolError),
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Error {
        Error::Protocol(err)
    }
}

/// Buffered sentence reader over any byte source. Keeps a sliding window
/// so a sentence split across reads survives until its tail arrives.
struct NmeaReceiver<P: Read> {
    port: P,
    v: Vec<u8>,
    /// start of next position
    start: usize,
    /// start of free position
    end: usize,
}

impl<P: Read> NmeaReceiver<P> {
    fn new(port: P, buffer_size: usize) -> NmeaReceiver<P> {
        let mut v = Vec::with_capacity(buffer_size);
        v.extend(::std::iter::repeat(0).take(buffer_size));

        NmeaReceiver {
            port,
            v,
            start: 0,
            end: 0,
        }
    }

    fn refill(&mut self) -> io::Result<usize> {
        shift(&mut self.v, self.start, self.end);
        self.end = self.end - self.start;
        self.start = 0;

        let remaining = &mut self.v[self.end..];

        if remaining.is_empty() {
            return Ok(0);
        }

        match self.port.read(remaining) {
            Ok(c) => {
                self.end += c;
                Ok(c)
            }
            // a quiet port is not an error, just nothing to drain
            Err(ref e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    fn next_sentence(&mut self) -> Result<Sentence, Error> {
        loop {
            let n = try!(self.refill());

            let (consumed, result) = {
                let s = &self.v[self.start..self.end];

                match parse_sentence(s) {
                    IResult::Done(rem, sentence) => (s.len() - rem.len(), Some(Ok(sentence))),
                    IResult::Error(e) => (0, Some(Err(Error::Protocol(ProtocolError::Parse(e))))),
                    IResult::Incomplete(_) => (0, None),
                }
            };

            match result {
                Some(Ok(sentence)) => {
                    self.start += consumed;
                    return Ok(sentence);
                }
                Some(Err(e)) => {
                    // invalidate buffer
                    self.start = self.end;
                    debug!("sentence rejected, invalidating buffer");
                    return Err(e);
                }
                None => {
                    if self.end - self.start == self.v.len() {
                        warn!("buffer is full but still incomplete");
                        // invalidate buffer
                        self.start = self.end;
                    }

                    if n == 0 {
                        // wait for the next poll to bring the rest
                        return Err(Error::Exhausted);
                    }
                }
            }
        }
    }
}

/// The fix acquirer: a serial byte stream behind an NMEA decoder.
pub struct GpsSensor<P: Read> {
    rx: NmeaReceiver<P>,
    decoder: NmeaDecoder,
}

impl<P: Read> GpsSensor<P> {
    pub fn from_port(port: P, buffer_size: usize) -> GpsSensor<P> {
        GpsSensor {
            rx: NmeaReceiver::new(port, buffer_size),
            decoder: NmeaDecoder::new(),
        }
    }
}

impl GpsSensor<SystemPort> {
    pub fn new() -> Option<Box<FixSource>> {
        for path in &SERIAL_PATHS {
            info!("trying port {}", path);

            let mut port = match serial::open(path) {
                Ok(p) => p,
                Err(_) => continue,
            };

            let configured = port.reconfigure(&|settings| {
                try!(settings.set_baud_rate(BAUD_RATE));
                settings.set_char_size(serial::Bits8);
                settings.set_parity(serial::ParityNone);
                settings.set_stop_bits(serial::Stop1);
                settings.set_flow_control(serial::FlowNone);
                Ok(())
            });

            if let Err(e) = configured {
                info!("could not configure {}: {}", path, e);
                continue;
            }

            // never let a quiet port block the control loop
            port.set_timeout(Duration::from_secs(0)).unwrap();

            info!("GPS receiver on {} at 9600 baud", path);

            return Some(Box::new(GpsSensor::from_port(port, RECV_BUFFER_SIZE)));
        }

        info!("unable to find any GPS receiver");

        None
    }
}

impl<P: Read> FixSource for GpsSensor<P> {
    fn drain_incoming(&mut self) {
        loop {
            match self.rx.next_sentence() {
                Ok(s) => self.decoder.handle_sentence(&s),
                Err(Error::Exhausted) => break,
                Err(Error::Io(e)) => {
                    // retried on the next poll
                    info!("I/O error: {:?}, ending drain", e);
                    break;
                }
                Err(Error::Protocol(e)) => {
                    debug!("NMEA error: {:?}, continuing", e);
                    continue;
                }
            }
        }
    }

    fn fix(&self) -> &Fix {
        self.decoder.fix()
    }

    fn take_updated(&mut self) -> bool {
        self.decoder.take_updated()
    }
}
