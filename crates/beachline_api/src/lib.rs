//! Beachline API Library
//!
//! HTTP and WebSocket surface of the coastal station dashboard backend.

pub mod config;
pub mod state;

mod alternatives;
mod calendar;
mod error;
mod occupancy;
mod push;
mod station;
mod telemetry;

use axum::{
    Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use crate::error::{ApiError, ErrorResponse};
pub use crate::state::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Response envelope for collections.
#[derive(Debug, Serialize, Deserialize)]
pub struct Listing<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new(data: Vec<T>) -> Self {
        Listing {
            count: data.len(),
            data,
        }
    }
}

/// Create the application router with all endpoints
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stations", get(station::list_stations))
        .route("/stations/{id}", get(station::get_station))
        .route("/occupancy", get(occupancy::current_occupancy))
        .route("/occupancy/{id}", post(telemetry::record_occupancy))
        .route(
            "/occupancy/{id}/history",
            get(occupancy::occupancy_history),
        )
        .route("/weather/{id}", post(telemetry::record_weather))
        .route("/congestion/{id}", post(telemetry::record_congestion))
        .route("/alternatives", post(alternatives::find_alternatives))
        .route(
            "/calendar",
            get(calendar::list_calendar).post(calendar::add_calendar_entry),
        )
        .route("/calendar/{date}", get(calendar::get_calendar_entry))
        .route("/ws", get(push::push_channel))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
