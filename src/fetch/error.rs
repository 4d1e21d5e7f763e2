use crate::catalog::CityId;
use thiserror::Error;

/// Why a single city lookup produced no observation.
///
/// Every variant is non-fatal to the surrounding batch: the city simply stays
/// outstanding and is retried on a future, externally triggered resumption.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS or timeout failure before a response arrived.
    #[error("Request for city {city} failed in transit")]
    Transport {
        city: CityId,
        #[source]
        source: reqwest::Error,
    },

    /// The remote service answered with a non-success status.
    #[error("Remote service rejected city {city} with status {status}: {message}")]
    RemoteStatus {
        city: CityId,
        status: reqwest::StatusCode,
        message: String,
    },

    /// A success response whose payload is missing the expected readings.
    #[error("Response for city {city} is missing expected data: {detail}")]
    MalformedResponse { city: CityId, detail: String },
}
