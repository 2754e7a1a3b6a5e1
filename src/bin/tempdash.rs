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

use clap::Parser;
use prometheus_client::registry::Registry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::{io, process};
use tempdash::config::{
    DashboardConfig, HistoryConfig, SensorConfig, DEFAULT_BACKUP_COUNT, DEFAULT_BIND_ADDR, DEFAULT_LOG_FILE,
    DEFAULT_SENSOR_COMMAND, DEFAULT_SENSOR_TIMEOUT_SECS, DEFAULT_WINDOW_DAYS,
};
use tempdash::history::LogHistory;
use tempdash::http::RequestState;
use tempdash::metrics::DashboardMetrics;
use tempdash::sensor::CommandSensor;
use tokio::signal::unix::{self, SignalKind};
use tracing::Level;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const MAX_WINDOW_DAYS: i64 = 36_500;

/// Chart temperature history from rotated logger output and show a live sensor reading
///
/// Serve a web page charting recent temperature readings parsed from the log file
/// of an external temperature logger (and its numbered backups), along with the
/// current temperature reported by a sensor command. Readings and the current
/// temperature are also available as JSON.
///
/// Lines of the log file that can't be parsed are ignored, as are backups that
/// don't exist. If the sensor command fails, the current temperature is reported
/// as unavailable.
#[derive(Debug, Parser)]
#[command(name = "tempdash", version = clap::crate_version!())]
struct TempdashApplication {
    /// Primary log file written by the temperature logger. Rotated backups are
    /// expected at the same path with a numeric suffix (`.1`, `.2`, ...)
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Number of rotated backups of the log file to read
    #[arg(long, default_value_t = DEFAULT_BACKUP_COUNT)]
    backup_count: usize,

    /// Only chart readings from this many days before the current time (1 to 36500)
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS, value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_DAYS))]
    window_days: i64,

    /// Command to run to get the current temperature
    #[arg(long, default_value = DEFAULT_SENSOR_COMMAND)]
    sensor_command: String,

    /// Argument to pass to the sensor command, may be given multiple times
    #[arg(long)]
    sensor_arg: Vec<String>,

    /// Kill the sensor command if it runs longer than this, in seconds
    #[arg(long, default_value_t = DEFAULT_SENSOR_TIMEOUT_SECS)]
    sensor_timeout_secs: u64,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[arg(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Address to bind to. By default, tempdash will bind to public address since
    /// the dashboard is meant to be viewed from other machines on the network
    #[arg(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

impl From<TempdashApplication> for DashboardConfig {
    fn from(opts: TempdashApplication) -> Self {
        DashboardConfig {
            history: HistoryConfig {
                log_file: opts.log_file,
                backup_count: opts.backup_count,
                window: chrono::Duration::days(opts.window_days),
            },
            sensor: SensorConfig {
                command: opts.sensor_command,
                args: opts.sensor_arg,
                timeout: Duration::from_secs(opts.sensor_timeout_secs),
            },
            bind: opts.bind,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let opts = TempdashApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let config = DashboardConfig::from(opts);
    let mut registry = <Registry>::default();
    let metrics = DashboardMetrics::new(&mut registry);
    let history = LogHistory::new(&config.history);
    let sensor = CommandSensor::new(&config.sensor);

    tracing::info!(
        message = "reading temperature history",
        log_file = %config.history.log_file.display(),
        backup_count = config.history.backup_count,
        sensor_command = %config.sensor.command,
    );

    let state = Arc::new(RequestState {
        registry,
        metrics,
        history,
        sensor,
    });
    let app = tempdash::http::router(state);

    let server = axum::Server::try_bind(&config.bind)
        .map(|s| {
            s.serve(app.into_make_service()).with_graceful_shutdown(async {
                // Wait for either SIGTERM or SIGINT to shutdown
                tokio::select! {
                    _ = sigterm() => {}
                    _ = sigint() => {}
                }
            })
        })
        .unwrap_or_else(|e| {
            tracing::error!(message = "error starting server", address = %config.bind, err = %e);
            process::exit(1)
        });

    tracing::info!(message = "starting server", address = %config.bind);
    server.await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
