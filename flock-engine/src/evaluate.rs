use std::cmp::Ordering;

use flock_core::offer::FlightOffer;
use tracing::warn;

use crate::filter::PostConstraints;

/// An offer that survived post-response filtering, with its round-trip total
/// parsed once for ranking and aggregation.
#[derive(Debug, Clone)]
pub struct RankedOffer {
    pub offer: FlightOffer,
    pub total_price: f64,
    pub currency: String,
}

pub struct OfferEvaluator;

impl OfferEvaluator {
    /// Filter one pair's raw offers against the post-response constraints and
    /// return them sorted ascending by round-trip total (ties: earliest
    /// outbound departure, then airline code). The winner, when any offer
    /// survives, is element 0. An empty result is a legitimate "no valid
    /// flight" outcome, not an error.
    pub fn evaluate(raw_offers: Vec<FlightOffer>, constraints: &PostConstraints) -> Vec<RankedOffer> {
        let mut ranked: Vec<RankedOffer> = raw_offers
            .into_iter()
            .filter_map(|offer| Self::admit(offer, constraints))
            .collect();
        ranked.sort_by(Self::rank);
        ranked
    }

    fn admit(offer: FlightOffer, constraints: &PostConstraints) -> Option<RankedOffer> {
        let (outbound, ret) = offer.legs()?;
        if outbound.segments.is_empty() || ret.segments.is_empty() {
            return None;
        }

        if let Some(max_stops) = constraints.max_stops {
            if outbound.stops() > max_stops || ret.stops() > max_stops {
                return None;
            }
        }

        // Four independent AND-combined window predicates, each against the
        // relevant leg endpoint in local airport time.
        let window_checks = [
            (constraints.outbound_departure_window, outbound.departure_at()),
            (constraints.outbound_arrival_window, outbound.arrival_at()),
            (constraints.return_departure_window, ret.departure_at()),
            (constraints.return_arrival_window, ret.arrival_at()),
        ];
        for (window, instant) in window_checks {
            if let Some(window) = window {
                match instant {
                    Some(at) if window.contains(at.time()) => {}
                    _ => return None,
                }
            }
        }

        let total_price = match offer.price.total_amount() {
            Ok(amount) => amount,
            Err(e) => {
                warn!("Dropping offer: {}", e);
                return None;
            }
        };
        let currency = offer.price.currency.clone();
        Some(RankedOffer {
            offer,
            total_price,
            currency,
        })
    }

    fn rank(a: &RankedOffer, b: &RankedOffer) -> Ordering {
        a.total_price
            .partial_cmp(&b.total_price)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                let dep_a = a.offer.itineraries.first().and_then(|leg| leg.departure_at());
                let dep_b = b.offer.itineraries.first().and_then(|leg| leg.departure_at());
                dep_a.cmp(&dep_b)
            })
            .then_with(|| {
                let airline_a = a.offer.itineraries.first().map(|leg| leg.airline());
                let airline_b = b.offer.itineraries.first().map(|leg| leg.airline());
                airline_a.cmp(&airline_b)
            })
    }
}
