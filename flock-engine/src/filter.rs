use flock_core::provider::QueryConstraints;
use flock_core::trip::{SearchFilters, TimeWindow};

/// Decides which of a traveler's constraints can be pushed into the provider
/// query and which must be evaluated against the returned offers.
pub struct FilterPolicy;

/// Constraints the provider has no query parameter for; applied to each
/// offer after the response comes back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostConstraints {
    pub max_stops: Option<u32>,
    pub outbound_departure_window: Option<TimeWindow>,
    pub outbound_arrival_window: Option<TimeWindow>,
    pub return_departure_window: Option<TimeWindow>,
    pub return_arrival_window: Option<TimeWindow>,
}

impl FilterPolicy {
    /// Pure, total split of a resolved filter set. The non-stop flag and the
    /// airline exclusion list go into the query; the four time windows and
    /// the max-stops bound are always post-response.
    pub fn split(filters: &SearchFilters) -> (QueryConstraints, PostConstraints) {
        let query = QueryConstraints {
            non_stop: filters.non_stop_only,
            excluded_airlines: filters.excluded_airlines.clone(),
        };
        let post = PostConstraints {
            max_stops: filters.max_stops,
            outbound_departure_window: filters.outbound_departure_window,
            outbound_arrival_window: filters.outbound_arrival_window,
            return_departure_window: filters.return_departure_window,
            return_arrival_window: filters.return_arrival_window,
        };
        (query, post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn window(from: (u32, u32), to: (u32, u32)) -> TimeWindow {
        TimeWindow {
            earliest: NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap(),
            latest: NaiveTime::from_hms_opt(to.0, to.1, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_exclusions_never_reach_the_query() {
        let filters = SearchFilters {
            non_stop_only: true,
            excluded_airlines: vec![],
            ..Default::default()
        };
        let (query, _) = FilterPolicy::split(&filters);
        assert!(query.non_stop);
        assert_eq!(query.excluded_airlines_param(), None);
    }

    #[test]
    fn test_exclusions_are_query_time() {
        let filters = SearchFilters {
            excluded_airlines: vec!["NK".to_string()],
            ..Default::default()
        };
        let (query, _) = FilterPolicy::split(&filters);
        assert_eq!(query.excluded_airlines_param().as_deref(), Some("NK"));
    }

    #[test]
    fn test_time_windows_are_always_post_response() {
        let filters = SearchFilters {
            max_stops: Some(1),
            outbound_departure_window: Some(window((8, 0), (12, 0))),
            return_arrival_window: Some(window((18, 0), (23, 0))),
            ..Default::default()
        };
        let (query, post) = FilterPolicy::split(&filters);
        assert!(!query.non_stop);
        assert_eq!(post.max_stops, Some(1));
        assert_eq!(post.outbound_departure_window, Some(window((8, 0), (12, 0))));
        assert_eq!(post.return_arrival_window, Some(window((18, 0), (23, 0))));
        assert!(post.outbound_arrival_window.is_none());
        assert!(post.return_departure_window.is_none());
    }
}
