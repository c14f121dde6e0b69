//! Flights and flight statuses
//!
//! A flight is identified by the operating airline, its flight number and
//! the scheduled departure timestamp. Status requests additionally carry the
//! oracle index they were sharded to.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

/// Errors that can occur when decoding status codes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusCodeError {
    #[error("Unknown flight status code: {0}")]
    UnknownCode(u8),
}

/// Flight status as reported by oracles
///
/// The wire value is the numeric code (multiples of ten).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(try_from = "u8", into = "u8")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    Unknown,
    OnTime,
    /// Delay attributable to the airline; the only status that pays out by default
    LateAirline,
    LateWeather,
    LateTechnical,
    LateOther,
}

impl StatusCode {
    /// Numeric wire code
    pub const fn code(&self) -> u8 {
        match self {
            StatusCode::Unknown => 0,
            StatusCode::OnTime => 10,
            StatusCode::LateAirline => 20,
            StatusCode::LateWeather => 30,
            StatusCode::LateTechnical => 40,
            StatusCode::LateOther => 50,
        }
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = StatusCodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(StatusCode::Unknown),
            10 => Ok(StatusCode::OnTime),
            20 => Ok(StatusCode::LateAirline),
            30 => Ok(StatusCode::LateWeather),
            40 => Ok(StatusCode::LateTechnical),
            50 => Ok(StatusCode::LateOther),
            other => Err(StatusCodeError::UnknownCode(other)),
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

/// Identity of an insurable flight
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlightKey {
    /// Operating airline
    pub airline: Address,
    /// Flight number / route label (e.g. "ND1309")
    pub flight: String,
    /// Scheduled departure (unix seconds or millis, opaque to the ledger)
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: impl Into<Address>, flight: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline: airline.into(),
            flight: flight.into(),
            timestamp,
        }
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.airline, self.flight, self.timestamp)
    }
}

/// Key of a status request: the flight plus the oracle index it was sent to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.index, self.flight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_code_wire_values() {
        for status in StatusCode::iter() {
            assert_eq!(StatusCode::try_from(status.code()).unwrap(), status);
        }
        assert_eq!(StatusCode::LateAirline.code(), 20);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            StatusCode::try_from(25),
            Err(StatusCodeError::UnknownCode(25))
        );
    }

    #[test]
    fn test_status_code_display_and_parse() {
        assert_eq!(StatusCode::LateAirline.to_string(), "LATE_AIRLINE");
        assert_eq!("ON_TIME".parse::<StatusCode>().unwrap(), StatusCode::OnTime);
    }

    #[test]
    fn test_status_code_serializes_as_number() {
        let json = serde_json::to_string(&StatusCode::LateWeather).unwrap();
        assert_eq!(json, "30");
        assert!(serde_json::from_str::<StatusCode>("31").is_err());
    }

    #[test]
    fn test_flight_key_display() {
        let key = FlightKey::new("0xAir", "ND1309", 1572562800);
        assert_eq!(key.to_string(), "0xair|ND1309|1572562800");
        assert_eq!(RequestKey::new(7, key).to_string(), "#7:0xair|ND1309|1572562800");
    }
}
