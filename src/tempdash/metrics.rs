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

use crate::sensor::{SensorError, TemperatureCelsius};
use prometheus_client::encoding::text::Encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Hash, PartialEq, Eq, Encode)]
struct ErrorsLabels {
    kind: String,
}

/// Collection of Prometheus metrics updated as the dashboard answers queries for
/// the live temperature and for the temperature history.
pub struct DashboardMetrics {
    temperature: Gauge<f64>,
    last_reading: Gauge<f64>,
    reads: Counter,
    errors: Family<ErrorsLabels, Counter>,
    history_queries: Counter,
    history_samples: Gauge,
}

impl DashboardMetrics {
    pub fn new(reg: &mut Registry) -> Self {
        let temperature = Gauge::<f64>::default();
        let last_reading = Gauge::<f64>::default();
        let reads = Counter::default();
        let errors = Family::<ErrorsLabels, Counter>::default();
        let history_queries = Counter::default();
        let history_samples = Gauge::default();

        reg.register(
            "tempdash_temperature_degrees",
            "Temperature in celsius from the last live reading",
            Box::new(temperature.clone()),
        );
        reg.register(
            "tempdash_last_read_timestamp",
            "Timestamp of last successful live reading",
            Box::new(last_reading.clone()),
        );
        reg.register(
            "tempdash_sensor_reads",
            "Number of attempted live readings",
            Box::new(reads.clone()),
        );
        reg.register(
            "tempdash_sensor_errors",
            "Number of failed live readings by type",
            Box::new(errors.clone()),
        );
        reg.register(
            "tempdash_history_queries",
            "Number of temperature history queries",
            Box::new(history_queries.clone()),
        );
        reg.register(
            "tempdash_history_samples",
            "Number of samples returned by the last history query",
            Box::new(history_samples.clone()),
        );

        Self {
            temperature,
            last_reading,
            reads,
            errors,
            history_queries,
            history_samples,
        }
    }

    pub fn sensor_update(&self, result: &Result<TemperatureCelsius, SensorError>) {
        self.reads.inc();

        match result {
            Ok(temp) => {
                self.temperature.set((*temp).into());

                // If we can't get the number of seconds since the epoch, skip the update
                let _ = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| self.last_reading.set(d.as_secs_f64()));
            }
            Err(e) => {
                let labels = ErrorsLabels {
                    kind: e.kind().as_label().to_owned(),
                };

                self.errors.get_or_create(&labels).inc();
                tracing::debug!(message = "unable to get live temperature reading", error = %e);
            }
        };
    }

    pub fn history_update(&self, samples: usize) {
        self.history_queries.inc();
        self.history_samples.set(samples as u64);
    }
}
