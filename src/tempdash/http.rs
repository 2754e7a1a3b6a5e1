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

use crate::history::{DataPoint, LogHistory};
use crate::metrics::DashboardMetrics;
use crate::sensor::{CommandSensor, LiveReading};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use prometheus_client::encoding::text;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

const TEXT_FORMAT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";
const INDEX_PAGE: &str = include_str!("index.html");

/// Global state shared between all HTTP requests via Arc.
pub struct RequestState {
    pub registry: Registry,
    pub metrics: DashboardMetrics,
    pub history: LogHistory,
    pub sensor: CommandSensor,
}

/// Build the router for every route of the dashboard, sharing `state` between them.
pub fn router(state: Arc<RequestState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/data", get(data_handler))
        .route("/current_temp", get(current_temp_handler))
        .route("/metrics", get(text_metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Render the chart page. All data is fetched by the page itself from the
/// `/data` and `/current_temp` routes.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Return temperature samples from the trailing window as JSON.
///
/// Log files are read on the blocking thread pool. If that fails for some
/// reason, an HTTP 500 will be returned and the error will be logged.
pub async fn data_handler(State(state): State<Arc<RequestState>>) -> Result<Json<Vec<DataPoint>>, StatusCode> {
    let state_ref = state.clone();
    let samples = task::spawn_blocking(move || state_ref.history.recent_samples())
        .instrument(tracing::span!(tracing::Level::DEBUG, "history_read"))
        .await
        .map_err(|e| {
            tracing::error!(message = "error reading temperature history", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    state.metrics.history_update(samples.len());
    Ok(Json(samples.iter().map(DataPoint::from).collect()))
}

/// Return the current temperature from the sensor command as JSON, `null` if
/// it could not be read.
pub async fn current_temp_handler(State(state): State<Arc<RequestState>>) -> Json<LiveReading> {
    let res = state
        .sensor
        .read()
        .instrument(tracing::span!(tracing::Level::DEBUG, "sensor_read"))
        .await;

    state.metrics.sensor_update(&res);
    Json(res.ok().into())
}

/// Render Prometheus metrics from the registry in the text exposition format.
/// If an error is encountered, an HTTP 500 will be returned and the error will
/// be logged.
pub async fn text_metrics_handler(State(state): State<Arc<RequestState>>) -> Response {
    let mut buf = Vec::new();

    match text::encode(&mut buf, &state.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format");
            let mut res = buf.into_response();
            res.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
            res
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics to text format", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
