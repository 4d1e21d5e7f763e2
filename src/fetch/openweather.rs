//! Fetcher implementation backed by the OpenWeather current-weather endpoint.

use crate::catalog::CityId;
use crate::config::CollectorConfig;
use crate::fetch::error::FetchError;
use crate::fetch::observation::Observation;
use crate::fetch::Fetcher;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Shape of the remote success payload, reduced to the fields we keep.
#[derive(Debug, Deserialize)]
struct CurrentWeatherPayload {
    name: Option<String>,
    main: Option<MainReadings>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: Option<f64>,
    humidity: Option<f64>,
}

/// Shape of the remote error payload; `message` is best-effort.
#[derive(Debug, Deserialize)]
struct RemoteErrorPayload {
    message: Option<String>,
}

/// Performs one `GET {base_url}?id={city}&appid={key}&units=metric` per fetch.
///
/// A single `reqwest::Client` is shared across all calls; each request carries
/// a bounded timeout so one slow city cannot stall its batch indefinitely.
pub struct OpenWeatherFetcher {
    client: Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl OpenWeatherFetcher {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            request_timeout: config.fetch_timeout,
        }
    }
}

#[async_trait]
impl Fetcher for OpenWeatherFetcher {
    async fn fetch(&self, city: CityId, user: &str) -> Result<Observation, FetchError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("id", city.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport { city, source: e })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<RemoteErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(FetchError::RemoteStatus {
                city,
                status,
                message,
            });
        }

        let payload: CurrentWeatherPayload =
            response
                .json()
                .await
                .map_err(|e| FetchError::MalformedResponse {
                    city,
                    detail: e.to_string(),
                })?;

        let observation = observation_from_payload(payload, city, user, Utc::now())?;
        Ok(observation)
    }
}

/// Converts a decoded success payload into an [`Observation`].
///
/// Kept free of I/O so payload handling is testable without a server.
fn observation_from_payload(
    payload: CurrentWeatherPayload,
    city: CityId,
    user: &str,
    taken_at: DateTime<Utc>,
) -> Result<Observation, FetchError> {
    let main = payload.main.ok_or_else(|| FetchError::MalformedResponse {
        city,
        detail: "missing 'main' section".to_string(),
    })?;
    let temperature_c = main.temp.ok_or_else(|| FetchError::MalformedResponse {
        city,
        detail: "missing 'main.temp'".to_string(),
    })?;
    let humidity = main.humidity.ok_or_else(|| FetchError::MalformedResponse {
        city,
        detail: "missing 'main.humidity'".to_string(),
    })?;
    if !(0.0..=100.0).contains(&humidity) {
        warn!(
            "Humidity {} for city {} is outside 0-100, clamping",
            humidity, city
        );
    }
    let humidity_pct = humidity.round().clamp(0.0, 100.0) as u8;

    info!(
        "Fetched city {} ({}): {:.1} °C, {}% humidity",
        city,
        payload.name.as_deref().unwrap_or("unnamed"),
        temperature_c,
        humidity_pct
    );

    Ok(Observation {
        user_id: user.to_string(),
        taken_at,
        city_id: city,
        temperature_c,
        humidity_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> CurrentWeatherPayload {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn converts_a_full_payload() {
        let payload = decode(
            r#"{"name": "London", "main": {"temp": 17.3, "humidity": 58, "pressure": 1012}}"#,
        );
        let observation =
            observation_from_payload(payload, CityId(2643743), "alice", Utc::now()).unwrap();

        assert_eq!(observation.city_id, CityId(2643743));
        assert_eq!(observation.user_id, "alice");
        assert_eq!(observation.temperature_c, 17.3);
        assert_eq!(observation.humidity_pct, 58);
    }

    #[test]
    fn missing_main_section_is_malformed() {
        let payload = decode(r#"{"name": "London"}"#);
        let err =
            observation_from_payload(payload, CityId(1), "alice", Utc::now()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_humidity_is_malformed() {
        let payload = decode(r#"{"main": {"temp": 3.0}}"#);
        let err =
            observation_from_payload(payload, CityId(1), "alice", Utc::now()).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
    }

    #[test]
    fn out_of_range_humidity_is_clamped() {
        let payload = decode(r#"{"main": {"temp": 3.0, "humidity": 120}}"#);
        let observation =
            observation_from_payload(payload, CityId(1), "alice", Utc::now()).unwrap();
        assert_eq!(observation.humidity_pct, 100);
    }
}
