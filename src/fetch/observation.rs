use crate::catalog::CityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successfully fetched weather reading, user-scoped and timestamped.
///
/// Immutable once created; only a successful fetch produces one. The serde
/// field names define the persisted wire layout, one JSON object per
/// observation inside a user's stored list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub user_id: String,
    /// UTC time the reading was taken, stamped at fetch time.
    #[serde(rename = "datetime")]
    pub taken_at: DateTime<Utc>,
    pub city_id: CityId,
    /// Degrees Celsius.
    #[serde(rename = "temperature")]
    pub temperature_c: f64,
    /// Relative humidity, 0–100.
    #[serde(rename = "humidity")]
    pub humidity_pct: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_the_persisted_field_names() {
        let observation = Observation {
            user_id: "alice".to_string(),
            taken_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
            city_id: CityId(2643743),
            temperature_c: 18.5,
            humidity_pct: 62,
        };

        let value = serde_json::to_value(&observation).unwrap();
        assert_eq!(value["user_id"], "alice");
        assert_eq!(value["city_id"], 2643743);
        assert_eq!(value["temperature"], 18.5);
        assert_eq!(value["humidity"], 62);
        assert_eq!(value["datetime"], "2024-06-01T12:30:00Z");

        let back: Observation = serde_json::from_value(value).unwrap();
        assert_eq!(back, observation);
    }
}
