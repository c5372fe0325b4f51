//! Domain model and core logic for the coastal station dashboard.
//!
//! Stations, their readings, the recommendation scoring and the topic
//! registry used to push live updates.

mod broadcast;
mod error;
pub mod geo;
mod models;
mod rating;
mod recommendation;
mod seed;
pub mod store;

pub use crate::broadcast::*;
pub use crate::error::*;
pub use crate::models::*;
pub use crate::rating::*;
pub use crate::recommendation::*;
pub use crate::seed::*;
