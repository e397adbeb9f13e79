use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ============================================================================
// Provider wire models (flight-offers search response)
// ============================================================================

/// One round-trip offer as returned by the search provider: an outbound and
/// a return itinerary plus a single un-itemized round-trip price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightOffer {
    pub itineraries: Vec<Itinerary>,
    pub price: OfferPrice,
}

impl FlightOffer {
    /// The outbound and return itineraries, or None when the payload does
    /// not carry exactly one of each.
    pub fn legs(&self) -> Option<(&Itinerary, &Itinerary)> {
        match self.itineraries.as_slice() {
            [outbound, ret] => Some((outbound, ret)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferPrice {
    /// Decimal amount as the provider sends it, e.g. "412.30".
    pub total: String,
    pub currency: String,
}

impl OfferPrice {
    pub fn total_amount(&self) -> CoreResult<f64> {
        self.total
            .parse::<f64>()
            .map_err(|_| CoreError::ProviderError(format!("unparseable price total: {:?}", self.total)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    /// ISO 8601 duration, e.g. "PT10H30M".
    pub duration: String,
    pub segments: Vec<Segment>,
}

impl Itinerary {
    pub fn stops(&self) -> u32 {
        self.segments.len().saturating_sub(1) as u32
    }

    /// Departure instant of the first segment, local time at the origin.
    pub fn departure_at(&self) -> Option<NaiveDateTime> {
        self.segments.first().map(|s| s.departure.at)
    }

    /// Arrival instant of the last segment, local time at the destination.
    pub fn arrival_at(&self) -> Option<NaiveDateTime> {
        self.segments.last().map(|s| s.arrival.at)
    }

    pub fn duration_minutes(&self) -> u32 {
        parse_iso_duration_minutes(&self.duration)
    }

    /// Marketing carrier of the first segment.
    pub fn airline(&self) -> &str {
        self.segments.first().map(|s| s.carrier_code.as_str()).unwrap_or("")
    }

    /// One flight number per connecting leg, e.g. ["BA117", "BA24"].
    pub fn flight_numbers(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|s| format!("{}{}", s.carrier_code, s.number))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub departure: SegmentPoint,
    pub arrival: SegmentPoint,
    pub carrier_code: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPoint {
    pub iata_code: String,
    /// Local time at the airport; the provider sends no UTC offset.
    pub at: NaiveDateTime,
}

/// Convert an ISO 8601 duration string (e.g. "PT10H30M") to minutes.
/// Unknown designators are ignored; a malformed string yields 0.
pub fn parse_iso_duration_minutes(duration: &str) -> u32 {
    let Some(rest) = duration.strip_prefix("PT") else {
        return 0;
    };
    let mut minutes = 0u32;
    let mut digits = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            let value: u32 = digits.parse().unwrap_or(0);
            digits.clear();
            match c {
                'H' => minutes += value * 60,
                'M' => minutes += value,
                _ => {}
            }
        }
    }
    minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_duration() {
        assert_eq!(parse_iso_duration_minutes("PT10H30M"), 630);
        assert_eq!(parse_iso_duration_minutes("PT2H"), 120);
        assert_eq!(parse_iso_duration_minutes("PT45M"), 45);
        assert_eq!(parse_iso_duration_minutes("garbage"), 0);
    }

    #[test]
    fn test_offer_deserialization() {
        let json = r#"
            {
                "itineraries": [
                    {
                        "duration": "PT3H55M",
                        "segments": [
                            {
                                "departure": {"iataCode": "JFK", "at": "2025-11-01T10:40:00"},
                                "arrival": {"iataCode": "CUN", "at": "2025-11-01T13:35:00"},
                                "carrierCode": "AA",
                                "number": "717"
                            }
                        ]
                    },
                    {
                        "duration": "PT3H40M",
                        "segments": [
                            {
                                "departure": {"iataCode": "CUN", "at": "2025-11-08T15:00:00"},
                                "arrival": {"iataCode": "JFK", "at": "2025-11-08T19:40:00"},
                                "carrierCode": "AA",
                                "number": "718"
                            }
                        ]
                    }
                ],
                "price": {"total": "412.30", "currency": "USD"}
            }
        "#;
        let offer: FlightOffer = serde_json::from_str(json).expect("Failed to deserialize");
        let (outbound, ret) = offer.legs().expect("round trip");
        assert_eq!(outbound.stops(), 0);
        assert_eq!(outbound.airline(), "AA");
        assert_eq!(outbound.flight_numbers(), vec!["AA717"]);
        assert_eq!(ret.duration_minutes(), 220);
        assert_eq!(offer.price.total_amount().unwrap(), 412.30);
    }

    #[test]
    fn test_legs_requires_round_trip() {
        let offer = FlightOffer {
            itineraries: vec![],
            price: OfferPrice {
                total: "100.00".to_string(),
                currency: "USD".to_string(),
            },
        };
        assert!(offer.legs().is_none());
    }
}
