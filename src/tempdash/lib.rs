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

//! Chart temperature history from rotated logger output and show a live sensor reading.
//!
//! ## Features
//!
//! Tempdash serves a small web page that charts the last seven days of temperature
//! readings written by an external temperature logger, along with the current
//! temperature as reported by a local sensor command (`sensors` from
//! [lm-sensors](https://github.com/lm-sensors/lm-sensors) by default).
//!
//! The following routes are served:
//!
//! * `/` - Chart of recent temperature readings and the live temperature, refreshed every 5 seconds.
//! * `/data` - Recent readings as JSON, `[{"timestamp": "01-05 10:00", "temp": 21.3}, ...]`.
//! * `/current_temp` - Live temperature as JSON, `{"temp": 23.5}` or `{"temp": null}`.
//! * `/metrics` - Prometheus metrics about live readings and history queries.
//!
//! ## Log format
//!
//! Readings are read from a primary log file and its numbered backups (`temp_monitor.log.1`,
//! `temp_monitor.log.2`, ...) as produced by most log rotation schemes. Each line is expected
//! to look like the following. Lines that don't are ignored.
//!
//! ```text
//! 2024-05-01 10:00:00 - Temperature: 21.3°C
//! ```
//!
//! The timestamp may be in most common human readable formats and is assumed to be in
//! local time unless it includes a UTC offset.
//!
//! ## Build
//!
//! `tempdash` is a Rust program and must be built from source using a [Rust toolchain](https://rustup.rs/).
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Run
//!
//! By default, `tempdash` reads `/var/log/temp_monitor.log` and up to five backups and binds
//! to port `8080` on all addresses.
//!
//! ```text
//! ./target/release/tempdash --log-file /opt/pet_temp/logs/temp_monitor.log --backup-count 5
//! ```
//!
//! The sensor command is run each time the live temperature is requested and is killed if
//! it doesn't complete within three seconds. A different command may be used as long as it
//! prints a line containing something like `+23.5°C`.
//!
//! ```text
//! ./target/release/tempdash --sensor-command cat --sensor-arg /run/thermometer.txt
//! ```
//!

pub mod config;
pub mod history;
pub mod http;
pub mod metrics;
pub mod sensor;
