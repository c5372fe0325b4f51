use beachline_core::store::{
    CalendarStore, CongestionStore, DataStore, OccupancyStore, StationStore, WeatherStore,
};
use beachline_core::{
    CalendarEntry, CongestionObservation, CongestionReading, CoreError, OccupancyReading,
    PushMessage, RecommendationEngine, ScoredStation, SearchParams, Station, SubscriberHandle,
    SubscriberId, Topic, UpdateBroadcaster, WeatherObservation, WeatherReading, geo,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A station with its most recent readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDetail {
    #[serde(flatten)]
    pub station: Station,
    pub occupancy: Option<OccupancyReading>,
    pub weather: Option<WeatherReading>,
    pub congestion: Option<CongestionReading>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentOccupancy {
    pub station_id: String,
    pub name: String,
    pub reading: OccupancyReading,
}

/// Owns the data store and the subscription registry.
///
/// Every write is appended to the store first and then pushed to the
/// station's topic. Occupancy also goes to the occupancy list topic.
/// Occupancy and weather writes re-rank each live alternatives search that
/// covers the station.
pub struct Engine {
    store: Box<dyn DataStore>,
    broadcaster: UpdateBroadcaster,
}

impl Engine {
    pub fn new(store: Box<dyn DataStore>) -> Self {
        Engine {
            store,
            broadcaster: UpdateBroadcaster::new(),
        }
    }

    pub fn broadcaster(&self) -> &UpdateBroadcaster {
        &self.broadcaster
    }

    /// All stations sorted by name.
    pub fn stations(&self) -> Result<Vec<Station>, CoreError> {
        let mut stations = self.store.list_stations()?;
        stations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stations)
    }

    pub fn station(&self, station_id: &str) -> Result<Station, CoreError> {
        self.store.station_by_id(station_id)
    }

    pub fn station_detail(&self, station_id: &str) -> Result<StationDetail, CoreError> {
        let station = self.store.station_by_id(station_id)?;
        Ok(StationDetail {
            occupancy: self.store.latest_occupancy(station_id)?,
            weather: self.store.latest_weather(station_id)?,
            congestion: self.store.latest_congestion(station_id)?,
            station,
        })
    }

    /// Latest occupancy per station. Stations without readings are left out.
    pub fn current_occupancy(&self) -> Result<Vec<CurrentOccupancy>, CoreError> {
        let mut current = Vec::new();
        for station in self.stations()? {
            if let Some(reading) = self.store.latest_occupancy(&station.id)? {
                current.push(CurrentOccupancy {
                    station_id: station.id,
                    name: station.name,
                    reading,
                });
            }
        }
        Ok(current)
    }

    pub fn occupancy_history(
        &self,
        station_id: &str,
        hours: u32,
    ) -> Result<Vec<OccupancyReading>, CoreError> {
        self.occupancy_history_at(station_id, hours, Utc::now())
    }

    fn occupancy_history_at(
        &self,
        station_id: &str,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<OccupancyReading>, CoreError> {
        if hours == 0 {
            return Err(CoreError::invalid("hours must be at least 1"));
        }
        let since = Duration::try_hours(i64::from(hours))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| CoreError::invalid(format!("hours {hours} is out of range")))?;
        self.store.station_by_id(station_id)?;
        self.store.occupancy_since(station_id, since)
    }

    pub fn find_alternatives(&self, params: &SearchParams) -> Result<Vec<ScoredStation>, CoreError> {
        RecommendationEngine::new(&*self.store).search(params)
    }

    pub fn calendar(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<CalendarEntry>, CoreError> {
        self.store.calendar_in_range(start, end)
    }

    pub fn calendar_entry(&self, date: NaiveDate) -> Result<CalendarEntry, CoreError> {
        self.store.calendar_entry(date)
    }

    pub fn add_calendar_entry(&mut self, entry: CalendarEntry) -> Result<CalendarEntry, CoreError> {
        tracing::info!("Adding calendar entry for {}", entry.date);
        self.store.add_calendar_entry(entry)
    }

    pub fn record_occupancy(
        &mut self,
        station_id: &str,
        occupancy_percent: u8,
    ) -> Result<OccupancyReading, CoreError> {
        let reading = self
            .store
            .append_occupancy(station_id, occupancy_percent, Utc::now())?;
        tracing::info!(
            "Recorded occupancy for station {}: {}%",
            station_id,
            occupancy_percent
        );
        self.broadcaster.publish(
            &Topic::Station(station_id.to_string()),
            &PushMessage::OccupancyUpdate {
                station_id: station_id.to_string(),
                reading: reading.clone(),
            },
        );
        self.broadcaster.publish(
            &Topic::OccupancyList,
            &PushMessage::OccupancyListUpdate {
                station_id: station_id.to_string(),
                reading: reading.clone(),
            },
        );
        self.refresh_alternatives(station_id);
        Ok(reading)
    }

    pub fn record_weather(
        &mut self,
        station_id: &str,
        observation: &WeatherObservation,
    ) -> Result<WeatherReading, CoreError> {
        let reading = self
            .store
            .append_weather(station_id, observation, Utc::now())?;
        tracing::info!(
            "Recorded weather for station {}: {}°C, {:?}",
            station_id,
            reading.temperature,
            reading.condition
        );
        self.broadcaster.publish(
            &Topic::Station(station_id.to_string()),
            &PushMessage::WeatherUpdate {
                station_id: station_id.to_string(),
                reading: reading.clone(),
            },
        );
        self.refresh_alternatives(station_id);
        Ok(reading)
    }

    pub fn record_congestion(
        &mut self,
        station_id: &str,
        observation: &CongestionObservation,
    ) -> Result<CongestionReading, CoreError> {
        let reading = self
            .store
            .append_congestion(station_id, observation, Utc::now())?;
        tracing::info!(
            "Recorded congestion for station {}: level {}",
            station_id,
            reading.congestion_level
        );
        self.broadcaster.publish(
            &Topic::Station(station_id.to_string()),
            &PushMessage::CongestionUpdate {
                station_id: station_id.to_string(),
                reading: reading.clone(),
            },
        );
        Ok(reading)
    }

    /// Re-rank every live search whose radius covers the changed station.
    ///
    /// The reading is already stored at this point, so failures are logged
    /// instead of being reported to the writer.
    fn refresh_alternatives(&self, station_id: &str) {
        if let Err(error) = self.try_refresh_alternatives(station_id) {
            tracing::warn!(
                "Could not refresh alternatives after update of {}: {}",
                station_id,
                error
            );
        }
    }

    fn try_refresh_alternatives(&self, station_id: &str) -> Result<(), CoreError> {
        let station = self.store.station_by_id(station_id)?;
        let affected: Vec<SearchParams> = self
            .broadcaster
            .active_searches()
            .filter(|params| geo::distance_km(params.origin(), station.location) <= params.radius)
            .cloned()
            .collect();
        for params in affected {
            let alternatives = self.find_alternatives(&params)?;
            self.broadcaster.publish(
                &Topic::Alternatives(params.clone()),
                &PushMessage::AlternativesUpdate {
                    search_params: params,
                    alternatives,
                },
            );
        }
        Ok(())
    }

    pub fn subscribe_station(
        &mut self,
        station_id: &str,
        handle: SubscriberHandle,
    ) -> Result<(), CoreError> {
        self.store.station_by_id(station_id)?;
        self.broadcaster
            .subscribe(&Topic::Station(station_id.to_string()), handle);
        Ok(())
    }

    /// Receive the occupancy of every station as it is recorded.
    pub fn subscribe_occupancy_list(&mut self, handle: SubscriberHandle) {
        self.broadcaster.subscribe(&Topic::OccupancyList, handle);
    }

    /// Subscribe to a search and push its current ranking to the new
    /// subscriber only.
    ///
    /// The search is normalized first, so everyone on a topic is ranked
    /// with the same parameters.
    pub fn subscribe_alternatives(
        &mut self,
        params: SearchParams,
        handle: SubscriberHandle,
    ) -> Result<(), CoreError> {
        let params = params.normalized();
        let alternatives = self.find_alternatives(&params)?;
        let snapshot = PushMessage::AlternativesUpdate {
            search_params: params.clone(),
            alternatives,
        };
        if let Err(error) = handle.deliver(&snapshot) {
            tracing::warn!("Could not send initial alternatives: {}", error);
        }
        self.broadcaster
            .subscribe(&Topic::Alternatives(params), handle);
        Ok(())
    }

    pub fn unsubscribe(&mut self, topic: &Topic, subscriber: SubscriberId) -> bool {
        self.broadcaster.unsubscribe(topic, subscriber)
    }

    pub fn disconnect(&mut self, subscriber: SubscriberId) -> usize {
        self.broadcaster.disconnect(subscriber)
    }
}
