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

use crate::config::SensorConfig;
use crate::sensor::core::{LiveReading, SensorError, SensorErrorKind, TemperatureCelsius};
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;

/// Decimal value directly followed (possibly after a degree mark or spaces) by `C`.
///
/// A leading `-` is part of the captured value so readings below zero keep their
/// sign, where a `+`-only pattern would report `-4.5°C` as `4.5`.
const TEMPERATURE_PATTERN: &str = r"([+-]?\d+\.\d+)[°\s]*C";

/// Find the first temperature in line-oriented sensor output.
///
/// Lines are examined in order and the first one containing something that
/// looks like `+41.0°C` wins. `None` is returned if no line matches.
pub fn parse_sensor_output(pattern: &Regex, output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        pattern
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
    })
}

/// Read the current temperature by running an external command, usually
/// `sensors` from lm-sensors, and parsing its output.
#[derive(Debug, Clone)]
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    pattern: Regex,
}

impl CommandSensor {
    pub fn new(config: &SensorConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            timeout: config.timeout,
            pattern: Regex::new(TEMPERATURE_PATTERN).expect("unable to compile temperature pattern"),
        }
    }

    /// Run the sensor command and return the first temperature in its output or
    /// an error describing why no temperature could be read.
    ///
    /// The command is killed if it doesn't finish within the configured timeout.
    pub async fn read(&self) -> Result<TemperatureCelsius, SensorError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SensorError::KindMsg(SensorErrorKind::Timeout, "timeout waiting for sensor command"))?
            .map_err(|e| {
                SensorError::KindMsgCause(SensorErrorKind::Execution, "unable to run sensor command", Box::new(e))
            })?;

        if !output.status.success() {
            return Err(SensorError::ExitStatus(output.status.code()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::trace!(message = "sensor command output", program = %self.program, output = %stdout);

        let temperature = parse_sensor_output(&self.pattern, &stdout)
            .map(TemperatureCelsius::from)
            .ok_or(SensorError::KindMsg(
                SensorErrorKind::NoReading,
                "no temperature found in sensor command output",
            ))?;

        tracing::debug!(message = "read sensor command temperature", temperature = %temperature);
        Ok(temperature)
    }

    /// Run the sensor command, discarding the reason for any failure.
    pub async fn read_live(&self) -> LiveReading {
        self.read().await.ok().into()
    }
}
