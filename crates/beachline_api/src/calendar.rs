use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use beachline_core::{CalendarEntry, CoreError};
use chrono::{Datelike, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CalendarQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub count: usize,
    pub data: Vec<CalendarEntry>,
    pub date_range: DateRange,
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    date.with_day(1)
        .ok_or_else(|| CoreError::invalid(format!("no first day for {date}")))
}

fn last_of_month(date: NaiveDate) -> Result<NaiveDate, CoreError> {
    first_of_month(date)?
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| CoreError::invalid(format!("no month end for {date}")))
}

/// Fill in missing bounds: start falls back to the first of `today`'s month,
/// end to the last day of start's month.
fn resolve_range(query: &CalendarQuery, today: NaiveDate) -> Result<DateRange, CoreError> {
    let start = match query.start {
        Some(start) => start,
        None => first_of_month(today)?,
    };
    let end = match query.end {
        Some(end) => end,
        None => last_of_month(start)?,
    };
    Ok(DateRange { start, end })
}

/// Calendar entries in an inclusive date range
pub async fn list_calendar(
    State(app_state): State<AppState>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<CalendarResponse>, ApiError> {
    let Query(query) = query?;
    let range = resolve_range(&query, Utc::now().date_naive())?;
    tracing::info!("Getting calendar from {} to {}", range.start, range.end);
    let data = app_state.engine()?.calendar(range.start, range.end)?;
    Ok(Json(CalendarResponse {
        count: data.len(),
        data,
        date_range: range,
    }))
}

pub async fn get_calendar_entry(
    State(app_state): State<AppState>,
    date: Result<Path<NaiveDate>, PathRejection>,
) -> Result<Json<CalendarEntry>, ApiError> {
    let Path(date) = date?;
    let entry = app_state.engine()?.calendar_entry(date)?;
    Ok(Json(entry))
}

pub async fn add_calendar_entry(
    State(app_state): State<AppState>,
    entry: Result<Json<CalendarEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<CalendarEntry>), ApiError> {
    let Json(entry) = entry?;
    let entry = app_state.engine()?.add_calendar_entry(entry)?;
    Ok((StatusCode::CREATED, Json(entry)))
}
