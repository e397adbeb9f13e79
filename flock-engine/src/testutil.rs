//! Offer fixtures shared by the engine test modules.

use chrono::NaiveDateTime;
use flock_core::offer::{FlightOffer, Itinerary, OfferPrice, Segment, SegmentPoint};

pub struct OfferSpec {
    pub carrier: &'static str,
    pub total: &'static str,
    pub currency: &'static str,
    pub out_dep: &'static str,
    pub out_arr: &'static str,
    pub ret_dep: &'static str,
    pub ret_arr: &'static str,
    pub out_stops: u32,
    pub ret_stops: u32,
}

impl Default for OfferSpec {
    fn default() -> Self {
        Self {
            carrier: "AA",
            total: "400.00",
            currency: "USD",
            out_dep: "2025-11-01T10:00:00",
            out_arr: "2025-11-01T13:00:00",
            ret_dep: "2025-11-08T15:00:00",
            ret_arr: "2025-11-08T18:00:00",
            out_stops: 0,
            ret_stops: 0,
        }
    }
}

impl OfferSpec {
    pub fn build(&self) -> FlightOffer {
        FlightOffer {
            itineraries: vec![
                itinerary(self.carrier, self.out_dep, self.out_arr, self.out_stops, 100),
                itinerary(self.carrier, self.ret_dep, self.ret_arr, self.ret_stops, 200),
            ],
            price: OfferPrice {
                total: self.total.to_string(),
                currency: self.currency.to_string(),
            },
        }
    }
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").expect("test timestamp")
}

// Only the first departure and last arrival drive the filter predicates, so
// intermediate segments reuse the endpoint instants.
fn itinerary(carrier: &str, dep: &str, arr: &str, stops: u32, base_number: u32) -> Itinerary {
    let count = stops + 1;
    let segments = (0..count)
        .map(|i| Segment {
            departure: SegmentPoint {
                iata_code: if i == 0 { "JFK" } else { "ATL" }.to_string(),
                at: at(dep),
            },
            arrival: SegmentPoint {
                iata_code: if i == count - 1 { "CUN" } else { "ATL" }.to_string(),
                at: at(arr),
            },
            carrier_code: carrier.to_string(),
            number: (base_number + i).to_string(),
        })
        .collect();
    Itinerary {
        duration: "PT3H".to_string(),
        segments,
    }
}
