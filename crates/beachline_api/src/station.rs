use axum::{
    Json,
    extract::{Path, State},
};
use beachline_core::Station;
use beachline_engine::StationDetail;

use crate::error::ApiError;
use crate::state::AppState;
use crate::Listing;

/// List all stations sorted by name
pub async fn list_stations(
    State(app_state): State<AppState>,
) -> Result<Json<Listing<Station>>, ApiError> {
    tracing::info!("Listing stations");
    let stations = app_state.engine()?.stations()?;
    Ok(Json(Listing::new(stations)))
}

/// Get a station together with its latest readings
pub async fn get_station(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
) -> Result<Json<StationDetail>, ApiError> {
    tracing::info!("Getting station {}", station_id);
    let detail = app_state.engine()?.station_detail(&station_id)?;
    Ok(Json(detail))
}
