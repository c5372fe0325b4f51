use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{CalendarStore, CongestionStore, MemoryStore, OccupancyStore, WeatherStore};
use crate::{CalendarEntry, CongestionObservation, CoreError, Station, WeatherObservation};

/// Initial readings for a station, keyed by station id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReadings {
    pub station_id: String,
    pub occupancy_percent: Option<u8>,
    pub weather: Option<WeatherObservation>,
    pub congestion: Option<CongestionObservation>,
}

/// Reference data and initial readings loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub stations: Vec<Station>,
    #[serde(default)]
    pub readings: Vec<SeedReadings>,
    #[serde(default)]
    pub calendar: Vec<CalendarEntry>,
}

impl SeedData {
    /// Build a store from the seed, stamping readings with `now`.
    pub fn into_store(self, now: DateTime<Utc>) -> Result<MemoryStore, CoreError> {
        let mut store = MemoryStore::new();
        for station in self.stations {
            store.insert_station(station)?;
        }
        for readings in &self.readings {
            let station_id = readings.station_id.as_str();
            if let Some(percent) = readings.occupancy_percent {
                store.append_occupancy(station_id, percent, now)?;
            }
            if let Some(weather) = &readings.weather {
                store.append_weather(station_id, weather, now)?;
            }
            if let Some(congestion) = &readings.congestion {
                store.append_congestion(station_id, congestion, now)?;
            }
        }
        for entry in self.calendar {
            store.add_calendar_entry(entry)?;
        }
        Ok(store)
    }
}
