use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broadcast::SubscriberId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
    #[error("Station {station_id} not found")]
    StationNotFound { station_id: String },
    #[error("No calendar entry for {date}")]
    CalendarEntryNotFound { date: NaiveDate },
    #[error("Data store unavailable: {message}")]
    StoreUnavailable { message: String },
    #[error("Delivery to subscriber {subscriber} failed: {reason}")]
    DeliveryFailure {
        subscriber: SubscriberId,
        reason: String,
    },
}

/// Coarse classification the transport layer maps to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameter,
    NotFound,
    StoreUnavailable,
    DeliveryFailure,
}

impl CoreError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CoreError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            CoreError::StationNotFound { .. } | CoreError::CalendarEntryNotFound { .. } => {
                ErrorKind::NotFound
            }
            CoreError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            CoreError::DeliveryFailure { .. } => ErrorKind::DeliveryFailure,
        }
    }
}
