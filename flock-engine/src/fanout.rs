use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use flock_core::provider::{LocationResolver, SearchProvider, SearchQuery};
use flock_core::trip::TripSubmission;

use crate::evaluate::{OfferEvaluator, RankedOffer};
use crate::filter::FilterPolicy;

/// Outcome of one traveler x destination search.
#[derive(Debug)]
pub enum FanoutOutcome {
    /// Post-filtered offers, ranked cheapest-first; may be empty, which is a
    /// legitimate "no valid flight" result.
    Offers(Vec<RankedOffer>),
    /// Provider-level failure for this pair only. Never aborts the fanout
    /// and never fails the job; the pair simply contributes no offer.
    ProviderError(String),
}

impl FanoutOutcome {
    pub fn winner(&self) -> Option<&RankedOffer> {
        match self {
            FanoutOutcome::Offers(offers) => offers.first(),
            FanoutOutcome::ProviderError(_) => None,
        }
    }
}

pub struct FanoutResults {
    /// `outcomes[t][d]`, aligned with submission traveler and destination
    /// order.
    pub outcomes: Vec<Vec<FanoutOutcome>>,
    /// Display name per destination code, falling back to the code itself.
    pub destination_names: HashMap<String, String>,
}

/// Issues one provider query per traveler x destination pair. Queries are
/// independent and run concurrently under the shared limiter.
pub struct SearchFanout {
    provider: Arc<dyn SearchProvider>,
    resolver: Arc<dyn LocationResolver>,
    /// Process-wide ceiling on in-flight provider calls. The provider's rate
    /// limit is shared across jobs, so the limiter is constructed once at
    /// the composition root, not per job.
    limiter: Arc<Semaphore>,
}

impl SearchFanout {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        resolver: Arc<dyn LocationResolver>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            provider,
            resolver,
            limiter,
        }
    }

    /// Execute every pair search for one job. Completes only when all pairs
    /// have either returned or failed; each traveler searches with their own
    /// origin and their own resolved filters, one adult per query.
    pub async fn run(&self, job_id: Uuid, submission: &TripSubmission) -> FanoutResults {
        let destination_names = self.resolve_names(&submission.destinations).await;

        let mut searches = Vec::with_capacity(submission.travelers.len() * submission.destinations.len());
        for traveler in &submission.travelers {
            let (query_constraints, post_constraints) = FilterPolicy::split(&traveler.filters);
            for destination in &submission.destinations {
                let provider = Arc::clone(&self.provider);
                let limiter = Arc::clone(&self.limiter);
                let query = SearchQuery {
                    origin: traveler.origin_airport.clone(),
                    destination: destination.clone(),
                    outbound_date: submission.outbound_date,
                    return_date: submission.return_date,
                };
                let query_constraints = query_constraints.clone();
                let post_constraints = post_constraints.clone();
                searches.push(async move {
                    let _permit = match limiter.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return FanoutOutcome::ProviderError("search limiter closed".to_string()),
                    };
                    match provider.search_offers(&query, &query_constraints).await {
                        Ok(raw_offers) => {
                            let returned = raw_offers.len();
                            let ranked = OfferEvaluator::evaluate(raw_offers, &post_constraints);
                            info!(
                                "[{}] {} -> {}: {} offer(s) returned, {} after filtering",
                                job_id,
                                query.origin,
                                query.destination,
                                returned,
                                ranked.len()
                            );
                            FanoutOutcome::Offers(ranked)
                        }
                        Err(e) => {
                            warn!(
                                "[{}] Provider error for {} -> {}: {}",
                                job_id, query.origin, query.destination, e
                            );
                            FanoutOutcome::ProviderError(e.to_string())
                        }
                    }
                });
            }
        }

        let flat = join_all(searches).await;
        let per_destination = submission.destinations.len();
        let mut outcomes = Vec::with_capacity(submission.travelers.len());
        let mut flat_iter = flat.into_iter();
        for _ in 0..submission.travelers.len() {
            outcomes.push(flat_iter.by_ref().take(per_destination).collect());
        }

        FanoutResults {
            outcomes,
            destination_names,
        }
    }

    // Best-effort side lookup per unique destination code, independent of the
    // searches. Resolver failures fall back to the raw code and never fail
    // the job.
    async fn resolve_names(&self, destinations: &[String]) -> HashMap<String, String> {
        let lookups = destinations.iter().map(|code| {
            let resolver = Arc::clone(&self.resolver);
            let code = code.clone();
            async move {
                let name = resolver.resolve_city_name(&code).await;
                (code, name)
            }
        });
        join_all(lookups).await.into_iter().collect()
    }
}
