//! Derived ratings.
//!
//! Every stored reading carries a level or suitability computed here, and the
//! recommendation scoring reads the same tables, so the two cannot drift apart.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccupancyLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl OccupancyLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..40 => OccupancyLevel::Low,
            40..70 => OccupancyLevel::Medium,
            70..85 => OccupancyLevel::High,
            _ => OccupancyLevel::VeryHigh,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            OccupancyLevel::Low => "👤",
            OccupancyLevel::Medium => "👥",
            OccupancyLevel::High => "👥👥👥",
            OccupancyLevel::VeryHigh => "🚫👥👥👥",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    Sunny,
    Fair,
    PartlyCloudy,
    Cloudy,
    Windy,
    Rainy,
    Stormy,
}

impl WeatherCondition {
    fn is_clear(self) -> bool {
        matches!(self, WeatherCondition::Sunny | WeatherCondition::Fair)
    }

    fn is_wet(self) -> bool {
        matches!(self, WeatherCondition::Rainy | WeatherCondition::Stormy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeachSuitability {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl BeachSuitability {
    /// Rate a weather observation for a beach visit.
    ///
    /// Rules are checked top to bottom, the first match wins:
    /// warm, calm and clear is excellent; mild, moderate wind and dry is good;
    /// strong wind or rain is poor; anything else is moderate.
    pub fn assess(temperature: f64, wind_speed: f64, condition: WeatherCondition) -> Self {
        if temperature >= 22.0 && wind_speed < 15.0 && condition.is_clear() {
            BeachSuitability::Excellent
        } else if temperature >= 18.0 && wind_speed < 20.0 && !condition.is_wet() {
            BeachSuitability::Good
        } else if wind_speed > 25.0 || condition.is_wet() {
            BeachSuitability::Poor
        } else {
            BeachSuitability::Moderate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_boundaries() {
        let cases = [
            (0, OccupancyLevel::Low),
            (39, OccupancyLevel::Low),
            (40, OccupancyLevel::Medium),
            (69, OccupancyLevel::Medium),
            (70, OccupancyLevel::High),
            (84, OccupancyLevel::High),
            (85, OccupancyLevel::VeryHigh),
            (100, OccupancyLevel::VeryHigh),
        ];
        for (percent, expected) in cases {
            assert_eq!(OccupancyLevel::from_percent(percent), expected, "{percent}%");
        }
    }

    #[test]
    fn test_level_serialization() {
        assert_eq!(
            serde_json::to_string(&OccupancyLevel::VeryHigh).unwrap(),
            "\"very-high\""
        );
        assert_eq!(
            serde_json::to_string(&WeatherCondition::PartlyCloudy).unwrap(),
            "\"partly-cloudy\""
        );
    }

    #[test]
    fn test_beach_suitability_rules() {
        use WeatherCondition::*;

        assert_eq!(BeachSuitability::assess(24.0, 10.0, Sunny), BeachSuitability::Excellent);
        assert_eq!(BeachSuitability::assess(22.0, 14.9, Fair), BeachSuitability::Excellent);
        // Warm and calm but cloudy only reaches good
        assert_eq!(BeachSuitability::assess(24.0, 10.0, Cloudy), BeachSuitability::Good);
        assert_eq!(BeachSuitability::assess(18.0, 12.0, Sunny), BeachSuitability::Good);
        assert_eq!(BeachSuitability::assess(25.0, 5.0, Rainy), BeachSuitability::Poor);
        assert_eq!(BeachSuitability::assess(16.0, 22.0, Windy), BeachSuitability::Moderate);
        assert_eq!(BeachSuitability::assess(16.0, 26.0, Windy), BeachSuitability::Poor);
        assert_eq!(BeachSuitability::assess(19.0, 25.0, PartlyCloudy), BeachSuitability::Moderate);
        assert_eq!(BeachSuitability::assess(10.0, 5.0, Stormy), BeachSuitability::Poor);
    }

    proptest! {
        #[test]
        fn level_is_pure_and_monotonic(p in 0u8..=100) {
            let level = OccupancyLevel::from_percent(p);
            prop_assert_eq!(level, OccupancyLevel::from_percent(p));
            prop_assert_eq!(level.icon(), OccupancyLevel::from_percent(p).icon());
            if p < 100 {
                let next = OccupancyLevel::from_percent(p + 1);
                prop_assert!(next as u8 >= level as u8);
            }
        }

        #[test]
        fn wet_weather_is_never_above_moderate(
            temperature in -10.0f64..40.0,
            wind_speed in 0.0f64..60.0,
        ) {
            for condition in [WeatherCondition::Rainy, WeatherCondition::Stormy] {
                prop_assert_eq!(
                    BeachSuitability::assess(temperature, wind_speed, condition),
                    BeachSuitability::Poor
                );
            }
        }
    }
}
