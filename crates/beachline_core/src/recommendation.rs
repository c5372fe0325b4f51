//! Ranking of alternative stations around a point.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::geo::{distance_km, validate_point};
use crate::store::{OccupancyStore, StationStore, WeatherStore};
use crate::{BeachSuitability, CoreError, GeoPoint, OccupancyReading, Station, WeatherReading};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeOptions {
    /// Drop stations whose latest occupancy is above this percentage
    pub max_occupancy: Option<u8>,
    pub require_accessible: bool,
}

/// The wire form of an alternatives search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub start_lat: f64,
    pub start_lng: f64,
    /// Search radius in kilometers
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occupancy: Option<u8>,
    #[serde(default)]
    pub require_accessible: bool,
}

impl SearchParams {
    pub fn origin(&self) -> GeoPoint {
        GeoPoint::new(self.start_lat, self.start_lng)
    }

    pub fn options(&self) -> AlternativeOptions {
        AlternativeOptions {
            max_occupancy: self.max_occupancy,
            require_accessible: self.require_accessible,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_point(self.origin())?;
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(CoreError::invalid(format!(
                "radius must be a positive number of kilometers, got {}",
                self.radius
            )));
        }
        if let Some(max) = self.max_occupancy {
            if max > 100 {
                return Err(CoreError::invalid(format!(
                    "maxOccupancy {max} is outside [0, 100]"
                )));
            }
        }
        Ok(())
    }

    /// Key-order independent serialization used to name alternatives topics.
    ///
    /// Keys are sorted, floats use six decimals, and options that do not
    /// filter anything are omitted, so two searches that select the same
    /// stations share a key.
    pub fn canonical_key(&self) -> String {
        let mut parts = Vec::with_capacity(5);
        if let Some(max) = self.max_occupancy {
            parts.push(format!("maxOccupancy={max}"));
        }
        parts.push(format!("radius={}", fixed(self.radius)));
        if self.require_accessible {
            parts.push("requireAccessible=true".to_string());
        }
        parts.push(format!("startLat={}", fixed(self.start_lat)));
        parts.push(format!("startLng={}", fixed(self.start_lng)));
        parts.join("&")
    }

    /// The same search with coordinates and radius rounded to the six
    /// decimals of `canonical_key`. Searches sharing a key normalize to
    /// equal parameters.
    pub fn normalized(&self) -> SearchParams {
        SearchParams {
            start_lat: quantize(self.start_lat),
            start_lng: quantize(self.start_lng),
            radius: quantize(self.radius),
            ..self.clone()
        }
    }
}

const CANONICAL_SCALE: f64 = 1e6;

fn quantize(value: f64) -> f64 {
    let rounded = (value * CANONICAL_SCALE).round() / CANONICAL_SCALE;
    // -0.0 and tiny negatives would otherwise create a second key for 0
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn fixed(value: f64) -> String {
    format!("{:.6}", quantize(value))
}

/// Points awarded per dimension. The total is always their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub occupancy: u32,
    pub beach_proximity: u32,
    pub accessibility: u32,
    pub weather: u32,
}

impl ScoreBreakdown {
    pub fn compute(
        station: &Station,
        occupancy: Option<&OccupancyReading>,
        weather: Option<&WeatherReading>,
    ) -> Self {
        ScoreBreakdown {
            occupancy: occupancy_score(occupancy.map(|r| r.occupancy_percent)),
            beach_proximity: beach_proximity_score(station.beach_distance),
            accessibility: accessibility_score(station.accessible),
            weather: suitability_score(weather.map(|r| r.beach_suitability)),
        }
    }

    pub fn total(&self) -> u32 {
        self.occupancy + self.beach_proximity + self.accessibility + self.weather
    }
}

fn occupancy_score(percent: Option<u8>) -> u32 {
    match percent {
        None => 0,
        Some(0..40) => 30,
        Some(40..70) => 20,
        Some(70..85) => 10,
        Some(_) => 0,
    }
}

fn beach_proximity_score(beach_distance: u32) -> u32 {
    match beach_distance {
        0..500 => 25,
        500..1000 => 20,
        _ => 10,
    }
}

fn accessibility_score(accessible: bool) -> u32 {
    if accessible { 15 } else { 0 }
}

fn suitability_score(suitability: Option<BeachSuitability>) -> u32 {
    match suitability {
        None => 0,
        Some(BeachSuitability::Excellent) => 20,
        Some(BeachSuitability::Good) => 15,
        Some(BeachSuitability::Moderate | BeachSuitability::Poor) => 5,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredStation {
    #[serde(flatten)]
    pub station: Station,
    pub distance_km: f64,
    pub occupancy: Option<OccupancyReading>,
    pub weather: Option<WeatherReading>,
    pub breakdown: ScoreBreakdown,
    pub recommendation_score: u32,
}

/// Read-only view over the stores that ranks stations.
pub struct RecommendationEngine<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> RecommendationEngine<'a, S>
where
    S: StationStore + OccupancyStore + WeatherStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        RecommendationEngine { store }
    }

    pub fn search(&self, params: &SearchParams) -> Result<Vec<ScoredStation>, CoreError> {
        self.find_alternatives(params.origin(), params.radius, &params.options())
    }

    /// Stations within `radius_km` of `origin` (inclusive), best first.
    ///
    /// Ties on score are broken by distance to the origin, then by id.
    pub fn find_alternatives(
        &self,
        origin: GeoPoint,
        radius_km: f64,
        options: &AlternativeOptions,
    ) -> Result<Vec<ScoredStation>, CoreError> {
        SearchParams {
            start_lat: origin.lat,
            start_lng: origin.lng,
            radius: radius_km,
            max_occupancy: options.max_occupancy,
            require_accessible: options.require_accessible,
        }
        .validate()?;

        let mut scored = Vec::new();
        for station in self.store.list_stations()? {
            let distance = distance_km(origin, station.location);
            if distance > radius_km {
                continue;
            }
            if options.require_accessible && !station.accessible {
                continue;
            }

            let occupancy = self.store.latest_occupancy(&station.id)?;
            if let (Some(max), Some(reading)) = (options.max_occupancy, &occupancy) {
                if reading.occupancy_percent > max {
                    continue;
                }
            }
            let weather = self.store.latest_weather(&station.id)?;

            let breakdown = ScoreBreakdown::compute(&station, occupancy.as_ref(), weather.as_ref());
            scored.push(ScoredStation {
                station,
                distance_km: distance,
                occupancy,
                weather,
                recommendation_score: breakdown.total(),
                breakdown,
            });
        }

        scored.sort_by(|a, b| {
            b.recommendation_score
                .cmp(&a.recommendation_score)
                .then_with(|| {
                    a.distance_km
                        .partial_cmp(&b.distance_km)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.station.id.cmp(&b.station.id))
        });
        tracing::debug!(
            "Ranked {} alternatives within {} km of ({}, {})",
            scored.len(),
            radius_km,
            origin.lat,
            origin.lng
        );
        Ok(scored)
    }
}
