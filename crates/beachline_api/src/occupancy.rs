use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use beachline_core::OccupancyReading;
use beachline_engine::CurrentOccupancy;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use crate::Listing;

const DEFAULT_HISTORY_HOURS: u32 = 24;

#[derive(Serialize, Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<u32>,
}

/// Latest occupancy for every station that has a reading
pub async fn current_occupancy(
    State(app_state): State<AppState>,
) -> Result<Json<Listing<CurrentOccupancy>>, ApiError> {
    let current = app_state.engine()?.current_occupancy()?;
    tracing::info!("Returning occupancy for {} stations", current.len());
    Ok(Json(Listing::new(current)))
}

/// Occupancy readings of one station over the last `hours` hours
pub async fn occupancy_history(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Listing<OccupancyReading>>, ApiError> {
    let Query(query) = query?;
    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS);
    tracing::info!(
        "Getting occupancy history for station {} ({} hours)",
        station_id,
        hours
    );
    let history = app_state
        .engine()?
        .occupancy_history(&station_id, hours)?;
    Ok(Json(Listing::new(history)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::tests::{get_json, test_state};
    use axum::{Router, http::StatusCode, routing::get};

    fn create_app(state: AppState) -> Router {
        Router::new()
            .route("/occupancy", get(current_occupancy))
            .route("/occupancy/{id}/history", get(occupancy_history))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_current_occupancy() {
        let state = test_state();
        {
            let mut engine = state.engine().unwrap();
            engine.record_occupancy("binz", 89).unwrap();
            engine.record_occupancy("kuehlungsborn", 20).unwrap();
            engine.record_occupancy("kuehlungsborn", 35).unwrap();
        }
        let app = create_app(state);

        let (status, listing): (_, Listing<CurrentOccupancy>) = get_json(app, "/occupancy").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing.count, 2);
        let kuehlungsborn = listing
            .data
            .iter()
            .find(|c| c.station_id == "kuehlungsborn")
            .unwrap();
        assert_eq!(kuehlungsborn.name, "Kühlungsborn West");
        assert_eq!(kuehlungsborn.reading.occupancy_percent, 35);
    }

    #[tokio::test]
    async fn test_history() {
        let state = test_state();
        {
            let mut engine = state.engine().unwrap();
            engine.record_occupancy("binz", 50).unwrap();
            engine.record_occupancy("binz", 60).unwrap();
        }
        let app = create_app(state);

        let (status, listing): (_, Listing<OccupancyReading>) =
            get_json(app.clone(), "/occupancy/binz/history?hours=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing.count, 2);

        let (status, listing): (_, Listing<OccupancyReading>) =
            get_json(app, "/occupancy/binz/history").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing.count, 2);
    }

    #[tokio::test]
    async fn test_history_rejects_zero_hours() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) =
            get_json(app, "/occupancy/binz/history?hours=0").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, beachline_core::ErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_history_window_beyond_calendar_keeps_serving() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) =
            get_json(app.clone(), "/occupancy/binz/history?hours=4294967295").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, beachline_core::ErrorKind::InvalidParameter);

        let (status, listing): (_, Listing<CurrentOccupancy>) = get_json(app, "/occupancy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing.count, 0);
    }

    #[tokio::test]
    async fn test_history_rejects_negative_hours() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) =
            get_json(app, "/occupancy/binz/history?hours=-3").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, beachline_core::ErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_history_unknown_station() {
        let app = create_app(test_state());

        let (status, _): (_, ErrorResponse) = get_json(app, "/occupancy/prora/history").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
