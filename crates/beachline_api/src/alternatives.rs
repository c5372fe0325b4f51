use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use beachline_core::{CoreError, ScoredStation, SearchParams};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Search body as sent by clients. Required fields are checked by hand so
/// a missing one yields an `invalid_parameter` error instead of a 422.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativesRequest {
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub radius: Option<f64>,
    pub max_occupancy: Option<u8>,
    #[serde(default)]
    pub require_accessible: bool,
}

impl TryFrom<AlternativesRequest> for SearchParams {
    type Error = CoreError;

    fn try_from(request: AlternativesRequest) -> Result<Self, Self::Error> {
        match (request.start_lat, request.start_lng, request.radius) {
            (Some(start_lat), Some(start_lng), Some(radius)) => Ok(SearchParams {
                start_lat,
                start_lng,
                radius,
                max_occupancy: request.max_occupancy,
                require_accessible: request.require_accessible,
            }),
            _ => Err(CoreError::invalid(
                "startLat, startLng, and radius are required parameters",
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativesResponse {
    pub count: usize,
    pub data: Vec<ScoredStation>,
    pub search_params: SearchParams,
}

/// Rank the stations within the requested radius
pub async fn find_alternatives(
    State(app_state): State<AppState>,
    payload: Result<Json<AlternativesRequest>, JsonRejection>,
) -> Result<Json<AlternativesResponse>, ApiError> {
    let Json(payload) = payload?;
    let params = SearchParams::try_from(payload)?;
    tracing::info!(
        "Finding alternatives within {} km of ({}, {})",
        params.radius,
        params.start_lat,
        params.start_lng
    );
    let data = app_state.engine()?.find_alternatives(&params)?;
    Ok(Json(AlternativesResponse {
        count: data.len(),
        data,
        search_params: params,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorResponse;
    use crate::tests::{post_json, test_state};
    use axum::{Router, http::StatusCode, routing::post};
    use beachline_core::ErrorKind;

    fn create_app(state: AppState) -> Router {
        Router::new()
            .route("/alternatives", post(find_alternatives))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_quieter_station_ranks_first() {
        let state = test_state();
        {
            let mut engine = state.engine().unwrap();
            engine.record_occupancy("binz", 90).unwrap();
            engine.record_occupancy("sellin", 15).unwrap();
        }
        let app = create_app(state);

        let (status, response): (_, AlternativesResponse) = post_json(
            app,
            "/alternatives",
            &serde_json::json!({"startLat": 54.40, "startLng": 13.61, "radius": 20}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.count, 2);
        assert_eq!(response.data[0].station.id, "sellin");
        assert!(response.data[0].recommendation_score > response.data[1].recommendation_score);
        assert_eq!(response.search_params.radius, 20.0);
    }

    #[tokio::test]
    async fn test_max_occupancy_filter() {
        let state = test_state();
        {
            let mut engine = state.engine().unwrap();
            engine.record_occupancy("binz", 90).unwrap();
            engine.record_occupancy("sellin", 15).unwrap();
        }
        let app = create_app(state);

        let (status, response): (_, AlternativesResponse) = post_json(
            app,
            "/alternatives",
            &AlternativesRequest {
                start_lat: Some(54.40),
                start_lng: Some(13.61),
                radius: Some(20.0),
                max_occupancy: Some(50),
                require_accessible: false,
            },
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = response.data.iter().map(|s| s.station.id.as_str()).collect();
        assert_eq!(ids, vec!["sellin"]);
    }

    #[tokio::test]
    async fn test_missing_radius() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) = post_json(
            app,
            "/alternatives",
            &serde_json::json!({"startLat": 54.40, "startLng": 13.61}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.kind, ErrorKind::InvalidParameter);
        assert!(
            body.error
                .ends_with("startLat, startLng, and radius are required parameters")
        );
    }

    #[tokio::test]
    async fn test_mistyped_fields() {
        let app = create_app(test_state());

        for body in [
            serde_json::json!({"startLat": "54", "startLng": 13.61, "radius": 20}),
            serde_json::json!({"startLat": 54.4, "startLng": 13.61, "radius": 20, "maxOccupancy": 300}),
        ] {
            let (status, response): (_, ErrorResponse) =
                post_json(app.clone(), "/alternatives", &body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response.kind, ErrorKind::InvalidParameter);
        }
    }

    #[tokio::test]
    async fn test_negative_radius() {
        let app = create_app(test_state());

        let (status, body): (_, ErrorResponse) = post_json(
            app,
            "/alternatives",
            &serde_json::json!({"startLat": 54.40, "startLng": 13.61, "radius": -5}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("radius"));
    }
}
