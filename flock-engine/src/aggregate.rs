use tracing::warn;

use flock_core::job::{DestinationResult, FlightOption, GroupStats, TravelerFlight};
use flock_core::offer::Itinerary;
use flock_core::trip::Traveler;

use crate::evaluate::RankedOffer;

pub struct Aggregator;

impl Aggregator {
    /// Build the destination-level result from each traveler's winning offer.
    /// Returns None when any traveler has no surviving offer: a group trip is
    /// not viable if one member cannot reach the destination under their own
    /// filters, and partial coverage is never surfaced.
    pub fn aggregate(
        destination: &str,
        destination_name: &str,
        travelers: &[Traveler],
        winners: &[Option<&RankedOffer>],
    ) -> Option<DestinationResult> {
        let resolved: Option<Vec<&RankedOffer>> = winners.iter().copied().collect();
        let Some(resolved) = resolved else {
            let present = winners.iter().filter(|w| w.is_some()).count();
            warn!(
                "Excluding {}: only {}/{} travelers have valid flights",
                destination,
                present,
                travelers.len()
            );
            return None;
        };

        // Currency comes from the first traveler's winning offer. Mixed
        // currencies within one destination are flagged, not converted.
        let currency = resolved.first()?.currency.clone();
        if resolved.iter().any(|r| r.currency != currency) {
            warn!("Mixed currencies for {}: keeping {}", destination, currency);
        }

        let mut traveler_flights = Vec::with_capacity(travelers.len());
        for (traveler, ranked) in travelers.iter().zip(&resolved) {
            traveler_flights.push(build_traveler_flight(traveler, ranked)?);
        }

        let individual_totals: Vec<f64> = resolved.iter().map(|r| r.total_price).collect();

        Some(DestinationResult {
            destination: destination.to_string(),
            destination_name: destination_name.to_string(),
            traveler_flights,
            group_stats: group_stats(currency, individual_totals),
        })
    }
}

fn build_traveler_flight(traveler: &Traveler, ranked: &RankedOffer) -> Option<TravelerFlight> {
    let (outbound, ret) = ranked.offer.legs()?;
    // The provider does not itemize per-leg cost; each leg carries half of
    // the round-trip total.
    let leg_price = ranked.total_price / 2.0;
    Some(TravelerFlight {
        traveler_name: traveler.name.clone(),
        origin: traveler.origin_airport.clone(),
        outbound: build_flight_option(outbound, leg_price)?,
        return_flight: build_flight_option(ret, leg_price)?,
        total_price: ranked.total_price,
        currency: ranked.currency.clone(),
    })
}

fn build_flight_option(itinerary: &Itinerary, price: f64) -> Option<FlightOption> {
    Some(FlightOption {
        departure_time: itinerary.departure_at()?,
        arrival_time: itinerary.arrival_at()?,
        duration_minutes: itinerary.duration_minutes(),
        stops: itinerary.stops(),
        airline: itinerary.airline().to_string(),
        flight_numbers: itinerary.flight_numbers(),
        price,
    })
}

fn group_stats(currency: String, individual_totals: Vec<f64>) -> GroupStats {
    let total: f64 = individual_totals.iter().sum();
    let count = individual_totals.len() as f64;
    GroupStats {
        median: median(&individual_totals),
        cheapest: individual_totals.iter().cloned().fold(f64::INFINITY, f64::min),
        most_expensive: individual_totals.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        average: total / count,
        total,
        currency,
        individual_totals,
    }
}

/// Standard order-statistic median over a sorted copy; the caller's ordering
/// is unaffected.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
