use crate::error::{ArchiveError, Result};
use crate::schedule::{Event, EventSource, EventsResponse};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

/// HTTP client for the scheduling backend.
pub struct ScheduleClient {
    client: reqwest::Client,
    api_url: String,
    phase: String,
}

impl ScheduleClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            phase: "all".to_string(),
        }
    }

    /// Set the `phase` filter sent with date-range lookups.
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<Vec<Event>> {
        debug!("GET {} {:?}", self.api_url, query);

        let response = self.client.get(&self.api_url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Api(format!(
                "Schedule backend returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.text().await?;
        let parsed: EventsResponse = serde_json::from_str(&body)?;
        debug!("Backend returned {} events", parsed.events.len());
        Ok(parsed.events)
    }
}

#[async_trait]
impl EventSource for ScheduleClient {
    async fn events_on(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let day = date.format("%Y-%m-%d").to_string();
        self.fetch(&[
            ("from_date", day.clone()),
            ("from_time", "00:00".to_string()),
            ("till_date", day),
            ("till_time", "23:59".to_string()),
            ("phase", self.phase.clone()),
            ("json", "1".to_string()),
        ])
        .await
    }

    async fn event_by_id(&self, id: i64) -> Result<Event> {
        self.fetch(&[("event_id", id.to_string()), ("json", "1".to_string())])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ArchiveError::NotFound(format!("No event with id {id}")))
    }
}
