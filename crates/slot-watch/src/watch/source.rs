use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{FetchOutcome, LocationId, RawSlot};

pub const DEFAULT_API_BASE_URL: &str = "https://ttp.cbp.dhs.gov";
const SLOTS_PATH: &str = "/schedulerapi/slots";

/// Anything that can report the currently published slots for a location.
pub trait SlotSource: Send + Sync {
    fn fetch(
        &self,
        location: &LocationId,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("slot request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slot response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected slot response shape: expected a list, got {0}")]
    UnexpectedShape(&'static str),
}

/// Connection settings for the scheduler API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub api_base_url: String,
    pub slot_limit: u32,
    pub request_timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            slot_limit: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Slot source backed by the Trusted Traveler scheduler HTTP API.
#[derive(Debug, Clone)]
pub struct SchedulerApiSource {
    client: reqwest::Client,
    slots_url: String,
    slot_limit: u32,
}

impl SchedulerApiSource {
    pub fn new(config: &SourceConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            slots_url: format!("{}{}", config.api_base_url.trim_end_matches('/'), SLOTS_PATH),
            slot_limit: config.slot_limit,
        })
    }
}

impl SlotSource for SchedulerApiSource {
    async fn fetch(&self, location: &LocationId) -> Result<FetchOutcome, FetchError> {
        let limit = self.slot_limit.to_string();
        let body = self
            .client
            .get(&self.slots_url)
            .query(&[
                ("orderBy", "soonest"),
                ("limit", limit.as_str()),
                ("locationId", location.as_str()),
                ("minimum", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_slots(&body)
    }
}

/// Decodes a scheduler response body.
///
/// `null`, `[]` and `{}` mean "no openings". Individual records that fail to
/// decode are skipped so one bad entry does not hide the others.
pub fn parse_slots(body: &str) -> Result<FetchOutcome, FetchError> {
    let value: Value = serde_json::from_str(body)?;

    let records = match value {
        Value::Null => return Ok(FetchOutcome::Empty),
        Value::Object(map) if map.is_empty() => return Ok(FetchOutcome::Empty),
        Value::Array(records) if records.is_empty() => return Ok(FetchOutcome::Empty),
        Value::Array(records) => records,
        Value::Object(_) => return Err(FetchError::UnexpectedShape("object")),
        Value::Bool(_) => return Err(FetchError::UnexpectedShape("boolean")),
        Value::Number(_) => return Err(FetchError::UnexpectedShape("number")),
        Value::String(_) => return Err(FetchError::UnexpectedShape("string")),
    };

    let total = records.len();
    let slots: Vec<RawSlot> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<RawSlot>(record) {
            Ok(slot) => Some(slot),
            Err(err) => {
                warn!(error = %err, "skipping malformed slot record");
                None
            }
        })
        .collect();

    debug!(total, decoded = slots.len(), "decoded slot records");
    Ok(FetchOutcome::Slots(slots))
}
