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

use crate::sensor::TemperatureCelsius;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;

/// Separator between the timestamp and message of each log line.
const FIELD_SEPARATOR: &str = " - ";

/// Marker for messages that carry a temperature reading.
const TEMPERATURE_MARKER: &str = "Temperature:";

/// Format used for timestamps shown on the chart: day-month hour:minute.
const DISPLAY_FORMAT: &str = "%d-%m %H:%M";

/// A single `<timestamp> - <message>` line from the temperature log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    timestamp: &'a str,
    message: &'a str,
}

impl<'a> LogLine<'a> {
    /// Split a line on the first separator, returning `None` if there isn't one.
    pub fn parse(line: &'a str) -> Option<Self> {
        let (timestamp, message) = line.trim().split_once(FIELD_SEPARATOR)?;
        Some(Self { timestamp, message })
    }

    pub fn timestamp_text(&self) -> &'a str {
        self.timestamp
    }

    pub fn message(&self) -> &'a str {
        self.message
    }

    /// Parse the leading timestamp of the line.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(self.timestamp)
    }

    /// Extract the temperature from a message like `Temperature: 21.3°C`.
    ///
    /// The value is the text after the first `": "` (up to any following `": "`)
    /// and before the first degree mark. Messages without the temperature marker
    /// or with a value that isn't a finite number yield `None`.
    pub fn temperature(&self) -> Option<f64> {
        if !self.message.contains(TEMPERATURE_MARKER) {
            return None;
        }

        let value = self.message.split(": ").nth(1)?;
        let value = value.split('°').next()?;
        value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Build a sample from this line if it has both a temperature and a timestamp.
    pub fn sample(&self) -> Option<Sample> {
        let temperature = self.temperature()?;
        let timestamp = self.timestamp()?;
        Some(Sample::new(timestamp, temperature.into()))
    }
}

/// Parse a human readable timestamp without requiring a single fixed format.
///
/// Parsing follows python-dateutil: ambiguous numeric dates are read month
/// first, missing date fields default to today, and a bare date is midnight.
/// Log timestamps are local time, so a timestamp with a UTC offset or zone
/// name is rejected.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match dtparse::parse(&decimal_fraction(text)) {
        Ok((dt, None)) => Some(dt),
        Ok((_, Some(offset))) => {
            tracing::trace!(message = "skipping timestamp with offset", timestamp = text, offset = %offset);
            None
        }
        Err(_) => None,
    }
}

/// Python's logging module writes fractional seconds after a comma
/// (`10:00:00,123`). Swap such a comma for a dot before parsing.
fn decimal_fraction(text: &str) -> String {
    let bytes = text.as_bytes();
    match text.rfind(',') {
        Some(i)
            if i > 0
                && i + 1 < bytes.len()
                && bytes[i - 1].is_ascii_digit()
                && bytes[i + 1].is_ascii_digit()
                && text[..i].contains(':') =>
        {
            let mut out = String::with_capacity(text.len());
            out.push_str(&text[..i]);
            out.push('.');
            out.push_str(&text[i + 1..]);
            out
        }
        _ => text.to_owned(),
    }
}

/// Temperature read from the log at a particular local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    timestamp: NaiveDateTime,
    temperature: TemperatureCelsius,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, temperature: TemperatureCelsius) -> Self {
        Self { timestamp, temperature }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn temperature(&self) -> TemperatureCelsius {
        self.temperature
    }

    /// Timestamp as shown on the chart, `DD-MM HH:MM`. The year and seconds are dropped.
    pub fn display_timestamp(&self) -> String {
        self.timestamp.format(DISPLAY_FORMAT).to_string()
    }

    /// Ordering key matching the display timestamp: month, day, hour, minute.
    ///
    /// Samples from different years with the same display timestamp compare equal.
    pub fn display_key(&self) -> (u32, u32, u32, u32) {
        (
            self.timestamp.month(),
            self.timestamp.day(),
            self.timestamp.hour(),
            self.timestamp.minute(),
        )
    }
}

/// A sample as returned to the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPoint {
    pub timestamp: String,
    pub temp: f64,
}

impl From<&Sample> for DataPoint {
    fn from(s: &Sample) -> Self {
        Self {
            timestamp: s.display_timestamp(),
            temp: s.temperature.into(),
        }
    }
}
