use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::{BeachSuitability, OccupancyLevel, WeatherCondition};

/// A point on the earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

/// Reference data for a coastal station. Created at seed time, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    /// Walking distance to the beach in meters
    pub beach_distance: u32,
    pub platform_count: u8,
    pub accessible: bool,
    /// Line codes served by the station, in timetable order
    pub connections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyReading {
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    pub occupancy_percent: u8,
    pub level: OccupancyLevel,
    pub icon: String,
}

impl OccupancyReading {
    /// Build a reading, deriving level and icon from the percentage.
    pub(crate) fn new(station_id: &str, occupancy_percent: u8, timestamp: DateTime<Utc>) -> Self {
        let level = OccupancyLevel::from_percent(occupancy_percent);
        OccupancyReading {
            station_id: station_id.to_string(),
            timestamp,
            occupancy_percent,
            level,
            icon: level.icon().to_string(),
        }
    }
}

/// Raw weather measurements, before suitability is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    /// Air temperature in °C
    pub temperature: f64,
    pub condition: WeatherCondition,
    /// Wind speed in km/h
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub condition: WeatherCondition,
    pub wind_speed: f64,
    pub beach_suitability: BeachSuitability,
}

impl WeatherReading {
    pub(crate) fn new(
        station_id: &str,
        observation: &WeatherObservation,
        timestamp: DateTime<Utc>,
    ) -> Self {
        WeatherReading {
            station_id: station_id.to_string(),
            timestamp,
            temperature: observation.temperature,
            condition: observation.condition,
            wind_speed: observation.wind_speed,
            beach_suitability: BeachSuitability::assess(
                observation.temperature,
                observation.wind_speed,
                observation.condition,
            ),
        }
    }
}

/// A congestion forecast as delivered by the operator feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongestionObservation {
    /// Forecast crowding, 0-100
    pub congestion_level: u8,
    pub waiting_time_minutes: u32,
    /// Confidence of the forecast in percent
    pub forecast_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CongestionReading {
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    pub congestion_level: u8,
    pub waiting_time_minutes: u32,
    pub forecast_accuracy: f64,
}

impl CongestionReading {
    pub(crate) fn new(
        station_id: &str,
        observation: &CongestionObservation,
        timestamp: DateTime<Utc>,
    ) -> Self {
        CongestionReading {
            station_id: station_id.to_string(),
            timestamp,
            congestion_level: observation.congestion_level,
            waiting_time_minutes: observation.waiting_time_minutes,
            forecast_accuracy: observation.forecast_accuracy,
        }
    }
}

/// Public and school holidays plus local events, keyed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_holiday: bool,
    #[serde(default)]
    pub is_school_holiday: bool,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_occupancy_reading_derives_level_and_icon() {
        let at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let reading = OccupancyReading::new("binz", 89, at);
        assert_eq!(reading.level, OccupancyLevel::VeryHigh);
        assert_eq!(reading.icon, "🚫👥👥👥");
    }

    #[test]
    fn test_calendar_entry_json() {
        let json = r#"
        {
          "date": "2026-10-03",
          "isHoliday": true,
          "region": "bundesweit",
          "eventName": "Tag der Deutschen Einheit"
        }
        "#;

        let entry: CalendarEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 10, 3).unwrap());
        assert!(entry.is_holiday);
        assert!(!entry.is_school_holiday);

        let reparsed: CalendarEntry =
            serde_json::from_str(&serde_json::to_string(&entry).unwrap()).unwrap();
        assert_eq!(reparsed, entry);
    }

    #[test]
    fn test_station_json() {
        let json = r#"
        {
          "id": "binz",
          "name": "Binz",
          "location": {"lat": 54.4014, "lng": 13.6089},
          "beachDistance": 400,
          "platformCount": 3,
          "accessible": true,
          "connections": ["RE9", "RB23"]
        }
        "#;

        let station: Station = serde_json::from_str(json).unwrap();
        assert_eq!(station.id, "binz");
        assert_eq!(station.beach_distance, 400);
        assert_eq!(station.connections, vec!["RE9", "RB23"]);
    }
}
