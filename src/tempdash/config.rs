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

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_FILE: &str = "/var/log/temp_monitor.log";
pub const DEFAULT_BACKUP_COUNT: usize = 5;
pub const DEFAULT_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_SENSOR_COMMAND: &str = "sensors";
pub const DEFAULT_SENSOR_TIMEOUT_SECS: u64 = 3;
pub const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);

/// Location of the temperature log, its rotated backups, and how far back to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Primary log file written by the temperature logger.
    pub log_file: PathBuf,
    /// Number of numbered backups (`log_file.1` through `log_file.N`) to consider.
    pub backup_count: usize,
    /// Trailing window of samples to return, relative to the time of each query.
    pub window: chrono::Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            backup_count: DEFAULT_BACKUP_COUNT,
            window: chrono::Duration::days(DEFAULT_WINDOW_DAYS),
        }
    }
}

/// External command used to get a live temperature reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Upper bound on how long the command may run before the reading is abandoned.
    pub timeout: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            command: DEFAULT_SENSOR_COMMAND.to_owned(),
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_SENSOR_TIMEOUT_SECS),
        }
    }
}

/// Everything needed to run the dashboard, passed to each component when
/// it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub history: HistoryConfig,
    pub sensor: SensorConfig,
    pub bind: SocketAddr,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            history: HistoryConfig::default(),
            sensor: SensorConfig::default(),
            bind: DEFAULT_BIND_ADDR.into(),
        }
    }
}
