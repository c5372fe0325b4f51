//! Ingestion of live readings. Each accepted reading is pushed to subscribers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use beachline_core::{
    CongestionObservation, CongestionReading, OccupancyReading, WeatherObservation, WeatherReading,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOccupancyRequest {
    pub occupancy_percent: u8,
}

pub async fn record_occupancy(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
    payload: Result<Json<RecordOccupancyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<OccupancyReading>), ApiError> {
    let Json(payload) = payload?;
    let reading = app_state
        .engine()?
        .record_occupancy(&station_id, payload.occupancy_percent)?;
    Ok((StatusCode::CREATED, Json(reading)))
}

pub async fn record_weather(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
    payload: Result<Json<WeatherObservation>, JsonRejection>,
) -> Result<(StatusCode, Json<WeatherReading>), ApiError> {
    let Json(payload) = payload?;
    let reading = app_state.engine()?.record_weather(&station_id, &payload)?;
    Ok((StatusCode::CREATED, Json(reading)))
}

pub async fn record_congestion(
    State(app_state): State<AppState>,
    Path(station_id): Path<String>,
    payload: Result<Json<CongestionObservation>, JsonRejection>,
) -> Result<(StatusCode, Json<CongestionReading>), ApiError> {
    let Json(payload) = payload?;
    let reading = app_state
        .engine()?
        .record_congestion(&station_id, &payload)?;
    Ok((StatusCode::CREATED, Json(reading)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::tests::{post_json, test_state};
    use axum::{Router, routing::post};
    use beachline_core::{
        BeachSuitability, ErrorKind, OccupancyLevel, SubscriberHandle, SubscriberId,
    };
    use std::sync::Arc;

    fn create_app(state: AppState) -> Router {
        Router::new()
            .route("/occupancy/{id}", post(record_occupancy))
            .route("/weather/{id}", post(record_weather))
            .route("/congestion/{id}", post(record_congestion))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_record_occupancy_pushes_update() {
        let state = test_state();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        state
            .engine()
            .unwrap()
            .subscribe_station("binz", SubscriberHandle::new(SubscriberId::new(), Arc::new(tx)))
            .unwrap();
        let app = create_app(state);

        let (status, reading): (_, OccupancyReading) = post_json(
            app,
            "/occupancy/binz",
            &RecordOccupancyRequest {
                occupancy_percent: 77,
            },
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reading.level, OccupancyLevel::High);
        match rx.recv().await {
            Some(beachline_core::PushMessage::OccupancyUpdate { station_id, reading }) => {
                assert_eq!(station_id, "binz");
                assert_eq!(reading.occupancy_percent, 77);
            }
            other => panic!("Expected OccupancyUpdate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_occupancy_out_of_range() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) = post_json(
            app,
            "/occupancy/binz",
            &RecordOccupancyRequest {
                occupancy_percent: 150,
            },
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("150%"));
    }

    #[tokio::test]
    async fn test_mistyped_body_reports_invalid_parameter() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) = post_json(
            app.clone(),
            "/occupancy/binz",
            &serde_json::json!({"occupancyPercent": -1}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, ErrorKind::InvalidParameter);

        let (status, body): (_, ErrorResponse) = post_json(
            app,
            "/weather/binz",
            &serde_json::json!({"temperature": "warm", "condition": "sunny", "windSpeed": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, ErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_record_weather() {
        let app = create_app(test_state());

        let (status, reading): (_, WeatherReading) = post_json(
            app,
            "/weather/sellin",
            &serde_json::json!({"temperature": 23.5, "condition": "sunny", "windSpeed": 9}),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reading.beach_suitability, BeachSuitability::Excellent);
    }

    #[tokio::test]
    async fn test_record_congestion_unknown_station() {
        let app = create_app(test_state());

        let (status, _): (_, ErrorResponse) = post_json(
            app,
            "/congestion/prora",
            &CongestionObservation {
                congestion_level: 50,
                waiting_time_minutes: 10,
                forecast_accuracy: 80.0,
            },
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
