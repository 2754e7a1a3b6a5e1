// Tempdash - Temperature history dashboard for rotated logger output
//
// Copyright 2024 Nick Pillitteri
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
//

use serde::Serialize;
use std::error::Error;
use std::fmt::{self, Formatter};

/// Temperature, in degrees celsius
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct TemperatureCelsius(f64);

impl From<TemperatureCelsius> for f64 {
    fn from(v: TemperatureCelsius) -> Self {
        v.0
    }
}

impl From<f64> for TemperatureCelsius {
    fn from(v: f64) -> Self {
        Self(v)
    }
}

impl fmt::Display for TemperatureCelsius {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}c", self.0)
    }
}

/// Result of asking for the current temperature. An absent value means no
/// reading could be obtained, which is distinct from a reading of zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct LiveReading {
    temp: Option<f64>,
}

impl LiveReading {
    pub fn absent() -> Self {
        Self { temp: None }
    }

    pub fn temperature(&self) -> Option<TemperatureCelsius> {
        self.temp.map(TemperatureCelsius::from)
    }
}

impl From<TemperatureCelsius> for LiveReading {
    fn from(v: TemperatureCelsius) -> Self {
        Self { temp: Some(v.into()) }
    }
}

impl From<Option<TemperatureCelsius>> for LiveReading {
    fn from(v: Option<TemperatureCelsius>) -> Self {
        Self { temp: v.map(f64::from) }
    }
}

/// Potential kinds of errors that can be encountered running the sensor command
#[derive(PartialEq, Eq, Debug, Hash, Clone, Copy)]
pub enum SensorErrorKind {
    Execution,
    Timeout,
    ExitStatus,
    NoReading,
}

impl SensorErrorKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            SensorErrorKind::Execution => "execution",
            SensorErrorKind::Timeout => "timeout",
            SensorErrorKind::ExitStatus => "exit_status",
            SensorErrorKind::NoReading => "no_reading",
        }
    }
}

/// Error running the sensor command or finding a temperature in its output
#[derive(Debug)]
pub enum SensorError {
    ExitStatus(Option<i32>),
    KindMsg(SensorErrorKind, &'static str),
    KindMsgCause(SensorErrorKind, &'static str, Box<dyn Error + Send + Sync>),
}

impl SensorError {
    pub fn kind(&self) -> SensorErrorKind {
        match self {
            SensorError::ExitStatus(_) => SensorErrorKind::ExitStatus,
            SensorError::KindMsg(kind, _) => *kind,
            SensorError::KindMsgCause(kind, _, _) => *kind,
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::ExitStatus(Some(code)) => write!(f, "sensor command exited with status {}", code),
            SensorError::ExitStatus(None) => write!(f, "sensor command terminated by signal"),
            SensorError::KindMsg(_, msg) => msg.fmt(f),
            SensorError::KindMsgCause(_, msg, ref e) => write!(f, "{}: {}", msg, e),
        }
    }
}

impl Error for SensorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SensorError::KindMsgCause(_, _, ref e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
