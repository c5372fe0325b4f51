//! Storage seams and the in-memory implementation.
//!
//! Readings are append-only. "Latest" always means the reading with the
//! greatest timestamp, regardless of insertion order.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    CalendarEntry, CongestionObservation, CongestionReading, CoreError, OccupancyReading, Station,
    WeatherObservation, WeatherReading,
};

pub trait StationStore {
    fn list_stations(&self) -> Result<Vec<Station>, CoreError>;
    fn station_by_id(&self, station_id: &str) -> Result<Station, CoreError>;
}

pub trait OccupancyStore {
    fn latest_occupancy(&self, station_id: &str) -> Result<Option<OccupancyReading>, CoreError>;
    /// Readings strictly newer than `since`, oldest first.
    fn occupancy_since(
        &self,
        station_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<OccupancyReading>, CoreError>;
    fn append_occupancy(
        &mut self,
        station_id: &str,
        occupancy_percent: u8,
        timestamp: DateTime<Utc>,
    ) -> Result<OccupancyReading, CoreError>;
}

pub trait WeatherStore {
    fn latest_weather(&self, station_id: &str) -> Result<Option<WeatherReading>, CoreError>;
    fn append_weather(
        &mut self,
        station_id: &str,
        observation: &WeatherObservation,
        timestamp: DateTime<Utc>,
    ) -> Result<WeatherReading, CoreError>;
}

pub trait CongestionStore {
    fn latest_congestion(&self, station_id: &str) -> Result<Option<CongestionReading>, CoreError>;
    fn append_congestion(
        &mut self,
        station_id: &str,
        observation: &CongestionObservation,
        timestamp: DateTime<Utc>,
    ) -> Result<CongestionReading, CoreError>;
}

pub trait CalendarStore {
    /// Entries with `start <= date <= end`, ordered by date.
    fn calendar_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEntry>, CoreError>;
    fn calendar_entry(&self, date: NaiveDate) -> Result<CalendarEntry, CoreError>;
    fn add_calendar_entry(&mut self, entry: CalendarEntry) -> Result<CalendarEntry, CoreError>;
}

/// Everything the engine needs from persistence.
pub trait DataStore:
    StationStore + OccupancyStore + WeatherStore + CongestionStore + CalendarStore + Send
{
}

impl<T> DataStore for T where
    T: StationStore + OccupancyStore + WeatherStore + CongestionStore + CalendarStore + Send
{
}

fn latest<T: Clone>(readings: Option<&Vec<T>>, timestamp: impl Fn(&T) -> DateTime<Utc>) -> Option<T> {
    readings?
        .iter()
        .max_by_key(|reading| timestamp(reading))
        .cloned()
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    stations: BTreeMap<String, Station>,
    occupancy: HashMap<String, Vec<OccupancyReading>>,
    weather: HashMap<String, Vec<WeatherReading>>,
    congestion: HashMap<String, Vec<CongestionReading>>,
    calendar: BTreeMap<NaiveDate, CalendarEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register reference data for a station. Station ids are unique.
    pub fn insert_station(&mut self, station: Station) -> Result<(), CoreError> {
        if station.id.is_empty() {
            return Err(CoreError::invalid("station id must not be empty"));
        }
        if self.stations.contains_key(&station.id) {
            return Err(CoreError::invalid(format!(
                "station {} is already registered",
                station.id
            )));
        }
        crate::geo::validate_point(station.location)?;
        self.stations.insert(station.id.clone(), station);
        Ok(())
    }

    fn ensure_station(&self, station_id: &str) -> Result<(), CoreError> {
        if self.stations.contains_key(station_id) {
            Ok(())
        } else {
            Err(CoreError::StationNotFound {
                station_id: station_id.to_string(),
            })
        }
    }
}

impl StationStore for MemoryStore {
    fn list_stations(&self) -> Result<Vec<Station>, CoreError> {
        Ok(self.stations.values().cloned().collect())
    }

    fn station_by_id(&self, station_id: &str) -> Result<Station, CoreError> {
        self.stations
            .get(station_id)
            .cloned()
            .ok_or_else(|| CoreError::StationNotFound {
                station_id: station_id.to_string(),
            })
    }
}

impl OccupancyStore for MemoryStore {
    fn latest_occupancy(&self, station_id: &str) -> Result<Option<OccupancyReading>, CoreError> {
        Ok(latest(self.occupancy.get(station_id), |r| r.timestamp))
    }

    fn occupancy_since(
        &self,
        station_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<OccupancyReading>, CoreError> {
        let mut readings: Vec<OccupancyReading> = self
            .occupancy
            .get(station_id)
            .map(|readings| {
                readings
                    .iter()
                    .filter(|r| r.timestamp > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        readings.sort_by_key(|r| r.timestamp);
        Ok(readings)
    }

    fn append_occupancy(
        &mut self,
        station_id: &str,
        occupancy_percent: u8,
        timestamp: DateTime<Utc>,
    ) -> Result<OccupancyReading, CoreError> {
        self.ensure_station(station_id)?;
        if occupancy_percent > 100 {
            return Err(CoreError::invalid(format!(
                "occupancy {occupancy_percent}% is outside [0, 100]"
            )));
        }
        let reading = OccupancyReading::new(station_id, occupancy_percent, timestamp);
        self.occupancy
            .entry(station_id.to_string())
            .or_default()
            .push(reading.clone());
        Ok(reading)
    }
}

impl WeatherStore for MemoryStore {
    fn latest_weather(&self, station_id: &str) -> Result<Option<WeatherReading>, CoreError> {
        Ok(latest(self.weather.get(station_id), |r| r.timestamp))
    }

    fn append_weather(
        &mut self,
        station_id: &str,
        observation: &WeatherObservation,
        timestamp: DateTime<Utc>,
    ) -> Result<WeatherReading, CoreError> {
        self.ensure_station(station_id)?;
        if !observation.temperature.is_finite() {
            return Err(CoreError::invalid("temperature must be a finite number"));
        }
        if !observation.wind_speed.is_finite() || observation.wind_speed < 0.0 {
            return Err(CoreError::invalid(
                "wind speed must be a non-negative number",
            ));
        }
        let reading = WeatherReading::new(station_id, observation, timestamp);
        self.weather
            .entry(station_id.to_string())
            .or_default()
            .push(reading.clone());
        Ok(reading)
    }
}

impl CongestionStore for MemoryStore {
    fn latest_congestion(&self, station_id: &str) -> Result<Option<CongestionReading>, CoreError> {
        Ok(latest(self.congestion.get(station_id), |r| r.timestamp))
    }

    fn append_congestion(
        &mut self,
        station_id: &str,
        observation: &CongestionObservation,
        timestamp: DateTime<Utc>,
    ) -> Result<CongestionReading, CoreError> {
        self.ensure_station(station_id)?;
        if observation.congestion_level > 100 {
            return Err(CoreError::invalid(format!(
                "congestion level {} is outside [0, 100]",
                observation.congestion_level
            )));
        }
        if !(0.0..=100.0).contains(&observation.forecast_accuracy) {
            return Err(CoreError::invalid(format!(
                "forecast accuracy {} is outside [0, 100]",
                observation.forecast_accuracy
            )));
        }
        let reading = CongestionReading::new(station_id, observation, timestamp);
        self.congestion
            .entry(station_id.to_string())
            .or_default()
            .push(reading.clone());
        Ok(reading)
    }
}

impl CalendarStore for MemoryStore {
    fn calendar_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEntry>, CoreError> {
        if start > end {
            return Err(CoreError::invalid(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(self.calendar.range(start..=end).map(|(_, e)| e.clone()).collect())
    }

    fn calendar_entry(&self, date: NaiveDate) -> Result<CalendarEntry, CoreError> {
        self.calendar
            .get(&date)
            .cloned()
            .ok_or(CoreError::CalendarEntryNotFound { date })
    }

    fn add_calendar_entry(&mut self, entry: CalendarEntry) -> Result<CalendarEntry, CoreError> {
        if self.calendar.contains_key(&entry.date) {
            return Err(CoreError::invalid(format!(
                "a calendar entry for {} already exists",
                entry.date
            )));
        }
        self.calendar.insert(entry.date, entry.clone());
        Ok(entry)
    }
}
