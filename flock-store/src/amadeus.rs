use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use flock_core::offer::FlightOffer;
use flock_core::provider::{LocationResolver, QueryConstraints, SearchProvider, SearchQuery};
use flock_core::{CoreError, CoreResult};

use crate::app_config::AmadeusConfig;
use crate::redis_repo::RedisClient;

/// Flight-offers search client. Authenticates with OAuth2 client
/// credentials; the token is cached in-process and refreshed shortly before
/// expiry. Every request carries the configured timeout, so a hung call
/// surfaces as a provider error for its pair rather than stalling the job.
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<FlightOffer>,
}

#[derive(Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<LocationEntry>,
}

#[derive(Deserialize)]
struct LocationEntry {
    #[serde(default)]
    address: LocationAddress,
}

#[derive(Deserialize, Default)]
struct LocationAddress {
    #[serde(rename = "cityName")]
    city_name: Option<String>,
}

fn provider_err(e: impl std::fmt::Display) -> CoreError {
    CoreError::ProviderError(e.to_string())
}

impl AmadeusClient {
    pub fn new(config: &AmadeusConfig, request_timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(provider_err)?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    async fn bearer_token(&self) -> CoreResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(format!("{}/v1/security/oauth2/token", self.base_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(provider_err)?;

        if !response.status().is_success() {
            return Err(CoreError::ProviderError(format!(
                "token request returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(provider_err)?;
        // Refresh a minute before the provider-side expiry.
        let expires_at = Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60));
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        Ok(access_token)
    }

    async fn lookup_city_name(&self, iata_code: &str) -> CoreResult<Option<String>> {
        let token = self.bearer_token().await?;
        let response = self
            .http
            .get(format!("{}/v1/reference-data/locations", self.base_url))
            .bearer_auth(token)
            .query(&[("keyword", iata_code), ("subType", "AIRPORT")])
            .send()
            .await
            .map_err(provider_err)?;

        if !response.status().is_success() {
            return Err(CoreError::ProviderError(format!(
                "locations lookup returned {}",
                response.status()
            )));
        }

        let locations: LocationsResponse = response.json().await.map_err(provider_err)?;
        Ok(locations
            .data
            .into_iter()
            .next()
            .and_then(|entry| entry.address.city_name))
    }
}

#[async_trait]
impl SearchProvider for AmadeusClient {
    async fn search_offers(
        &self,
        query: &SearchQuery,
        constraints: &QueryConstraints,
    ) -> CoreResult<Vec<FlightOffer>> {
        let token = self.bearer_token().await?;

        let mut request = self
            .http
            .get(format!("{}/v2/shopping/flight-offers", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("originLocationCode", query.origin.as_str()),
                ("destinationLocationCode", query.destination.as_str()),
            ])
            .query(&[
                ("departureDate", query.outbound_date.to_string()),
                ("returnDate", query.return_date.to_string()),
            ])
            .query(&[
                ("adults", "1"),
                ("nonStop", if constraints.non_stop { "true" } else { "false" }),
            ]);
        // Omitted entirely when no airline is excluded; the provider rejects
        // an empty-string parameter.
        if let Some(excluded) = constraints.excluded_airlines_param() {
            request = request.query(&[("excludedAirlineCodes", excluded)]);
        }

        let response = request.send().await.map_err(provider_err)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(CoreError::ProviderError(format!(
                "flight-offers search returned {}: {}",
                status, snippet
            )));
        }

        let offers: OffersResponse = response.json().await.map_err(provider_err)?;
        Ok(offers.data)
    }
}

#[async_trait]
impl LocationResolver for AmadeusClient {
    async fn resolve_city_name(&self, iata_code: &str) -> String {
        match self.lookup_city_name(iata_code).await {
            Ok(Some(name)) => name,
            Ok(None) => iata_code.to_string(),
            Err(e) => {
                warn!("Could not resolve city name for {}, using IATA code: {}", iata_code, e);
                iata_code.to_string()
            }
        }
    }
}

/// Redis-backed layer over a resolver. Lookups and cache writes are both
/// best-effort; a cold or unreachable cache just falls through.
pub struct CachingResolver {
    inner: Arc<dyn LocationResolver>,
    redis: Arc<RedisClient>,
}

const NAME_CACHE_TTL_SECONDS: u64 = 7 * 24 * 3600;

impl CachingResolver {
    pub fn new(inner: Arc<dyn LocationResolver>, redis: Arc<RedisClient>) -> Self {
        Self { inner, redis }
    }
}

#[async_trait]
impl LocationResolver for CachingResolver {
    async fn resolve_city_name(&self, iata_code: &str) -> String {
        if let Ok(Some(name)) = self.redis.get_destination_name(iata_code).await {
            return name;
        }
        let name = self.inner.resolve_city_name(iata_code).await;
        // A fallback-to-code answer is not worth pinning in the cache.
        if name != iata_code {
            if let Err(e) = self
                .redis
                .set_destination_name(iata_code, &name, NAME_CACHE_TTL_SECONDS)
                .await
            {
                debug!("Failed to cache destination name for {}: {}", iata_code, e);
            }
        }
        name
    }
}
