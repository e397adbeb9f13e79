use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A validated group-trip submission. Immutable once a job is created from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSubmission {
    pub travelers: Vec<Traveler>,
    pub destinations: Vec<String>,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub default_filters: SearchFilters,
}

/// One member of the group, with a fixed origin and fully resolved filters.
/// Default-filter resolution happens at submission time, before a job exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traveler {
    pub name: String,
    pub origin_airport: String,
    pub filters: SearchFilters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    pub non_stop_only: bool,
    pub excluded_airlines: Vec<String>,
    #[serde(default)]
    pub max_stops: Option<u32>,
    #[serde(default)]
    pub outbound_departure_window: Option<TimeWindow>,
    #[serde(default)]
    pub outbound_arrival_window: Option<TimeWindow>,
    #[serde(default)]
    pub return_departure_window: Option<TimeWindow>,
    #[serde(default)]
    pub return_arrival_window: Option<TimeWindow>,
}

/// Half-open local-time interval [earliest, latest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hhmm")]
    pub earliest: NaiveTime,
    #[serde(with = "hhmm")]
    pub latest: NaiveTime,
}

impl TimeWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.earliest <= time && time < self.latest
    }
}

/// Window bounds travel as "HH:MM" strings.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}
