use async_trait::async_trait;
use chrono::NaiveDate;

use crate::offer::FlightOffer;
use crate::CoreResult;

/// One outbound+return search for a single traveler. `adults` is always 1:
/// travelers are never grouped into a multi-passenger query because each has
/// an independent origin and filter set.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub origin: String,
    pub destination: String,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
}

/// The query-time half of a traveler's filters, as produced by the filter
/// policy. Everything else is evaluated post-response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryConstraints {
    pub non_stop: bool,
    pub excluded_airlines: Vec<String>,
}

impl QueryConstraints {
    /// Comma-joined provider parameter, or None when no airline is excluded.
    /// An empty set must never be sent as an empty-string parameter.
    pub fn excluded_airlines_param(&self) -> Option<String> {
        if self.excluded_airlines.is_empty() {
            None
        } else {
            Some(self.excluded_airlines.join(","))
        }
    }
}

/// Narrow seam to the external flight-search provider. Authentication, rate
/// limiting and timeouts are the implementation's concern.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_offers(
        &self,
        query: &SearchQuery,
        constraints: &QueryConstraints,
    ) -> CoreResult<Vec<FlightOffer>>;
}

/// Best-effort IATA code to display-name resolution. Never fails the caller:
/// implementations fall back to the raw code.
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_city_name(&self, iata_code: &str) -> String;
}
