pub mod client;
pub mod image;

pub use client::ScheduleClient;
pub use image::ImageFetcher;

use crate::error::{ArchiveError, Result};
use crate::time::parse_local_datetime;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize};

/// A scheduled broadcast as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: i64,
    pub start_datetime: String,
    pub end_datetime: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub full_title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub series_name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub episode: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub location_mapped: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub image: String,
}

/// Accepts strings, numbers and `null`; the backend is not consistent.
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

impl Event {
    pub fn start(&self, tz: Tz) -> Result<DateTime<Tz>> {
        parse_local_datetime(&self.start_datetime, tz)
    }

    pub fn end(&self, tz: Tz) -> Result<DateTime<Tz>> {
        parse_local_datetime(&self.end_datetime, tz)
    }
}

/// Envelope of every backend response.
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Vec<Event>,
}

/// What the user asked to archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventQuery {
    Date(NaiveDate),
    Id(i64),
}

impl std::fmt::Display for EventQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventQuery::Date(date) => write!(f, "events on {}", date.format("%Y-%m-%d")),
            EventQuery::Id(id) => write!(f, "event {id}"),
        }
    }
}

impl std::str::FromStr for EventQuery {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(EventQuery::Date(date));
        }
        if let Ok(id) = s.parse::<i64>() {
            return Ok(EventQuery::Id(id));
        }
        Err(ArchiveError::Format(format!(
            "Expected a date (YYYY-MM-DD) or an event id, got '{s}'"
        )))
    }
}

/// Source of event metadata.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// All events scheduled on `date`.
    async fn events_on(&self, date: NaiveDate) -> Result<Vec<Event>>;

    /// A single event; fails with `NotFound` when the backend has none.
    async fn event_by_id(&self, id: i64) -> Result<Event>;

    async fn resolve(&self, query: EventQuery) -> Result<Vec<Event>> {
        match query {
            EventQuery::Date(date) => self.events_on(date).await,
            EventQuery::Id(id) => Ok(vec![self.event_by_id(id).await?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_query_parsing() {
        assert_eq!(
            "2025-04-06".parse::<EventQuery>().unwrap(),
            EventQuery::Date(NaiveDate::from_ymd_opt(2025, 4, 6).unwrap())
        );
        assert_eq!("4711".parse::<EventQuery>().unwrap(), EventQuery::Id(4711));
        assert!("tomorrow".parse::<EventQuery>().is_err());
        assert!("2025-02-30".parse::<EventQuery>().is_err());
    }

    #[test]
    fn test_event_deserialize_nulls_and_numbers() {
        let json = r#"{
            "event_id": 17,
            "start_datetime": "2025-04-06 20:00:00",
            "end_datetime": "2025-04-06 21:00:00",
            "full_title": "Night Shift: Episode 3",
            "series_name": null,
            "episode": 3
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_id, 17);
        assert_eq!(event.series_name, "");
        assert_eq!(event.episode, "3");
        assert_eq!(event.image, "");
    }

    #[test]
    fn test_events_response_without_events() {
        let response: EventsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.events.is_empty());
    }
}
