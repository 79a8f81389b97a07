use crate::core::retry::RetryPolicy;
use crate::domain::model::{
    GeocodeOutcome, KeyCheck, LocatorStrategy, MatchCandidate, NormalizedAddress,
};
use crate::domain::ports::Geocoder;
use crate::utils::error::{GeocodeError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_GEOCODE_HOST: &str = "https://api.mapserv.utah.gov";

/// Fixed address used to probe the API key before a run starts.
const KEY_CHECK_ADDRESS: &str = "270 E CENTER ST";
const KEY_CHECK_ZONE: &str = "LINDON";

/// Response envelope of the geocode endpoint: `status` mirrors the HTTP code
/// at the application layer, with `message` on failure and `result` on match.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: u16,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResult {
    match_address: String,
    #[serde(default)]
    address_grid: String,
    score: f64,
    location: ApiLocation,
    locator: String,
    #[serde(default)]
    input_address: String,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    x: f64,
    y: f64,
}

/// Reply shapes the service can legitimately produce for one attempt.
#[derive(Debug)]
enum RawReply {
    NotFound(String),
    Matched(ApiResult),
}

/// HTTP client for the geocode web API.
///
/// One request per record; transient failures (network errors, 5xx, bodies
/// that do not decode) are retried with backoff and reported as `NoResponse`
/// once the policy is exhausted.
pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    spatial_reference: u32,
    locator: LocatorStrategy,
    retry: RetryPolicy,
}

impl GeocodeClient {
    pub fn new(
        service_url: &str,
        api_key: impl Into<String>,
        spatial_reference: u32,
        locator: LocatorStrategy,
    ) -> Result<Self> {
        let base_url = Url::parse(service_url)?;
        if base_url.cannot_be_a_base() {
            return Err(GeocodeError::Config {
                message: format!("service URL cannot carry a path: {}", service_url),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
            spatial_reference,
            locator,
            retry: RetryPolicy::default(),
        })
    }

    /// Swap in a different backoff schedule (tests use millisecond delays).
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn geocode_url(&self, address: &str, zone: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeocodeError::Config {
                message: format!("service URL cannot carry a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(["api", "v1", "geocode", address, zone]);
        Ok(url)
    }

    fn locate_url(&self, address: &NormalizedAddress) -> Result<Url> {
        let mut url = self.geocode_url(&address.address, &address.zone)?;
        url.query_pairs_mut()
            .append_pair("spatialReference", &self.spatial_reference.to_string())
            .append_pair("locators", self.locator.as_query_value())
            .append_pair("apiKey", &self.api_key)
            .append_pair("pobox", "true");
        Ok(url)
    }

    fn key_check_url(&self) -> Result<Url> {
        let mut url = self.geocode_url(KEY_CHECK_ADDRESS, KEY_CHECK_ZONE)?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);
        Ok(url)
    }

    /// One wire attempt; `None` means no parseable reply and is what the
    /// retry policy feeds on.
    async fn attempt_locate(&self, url: &Url) -> Option<RawReply> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("geocode request failed: {}", e);
                return None;
            }
        };

        if response.status().is_server_error() {
            tracing::debug!("geocode service returned {}", response.status());
            return None;
        }

        // The service encodes "not found" as HTTP 404 with a JSON payload, so
        // the body is parsed regardless of the status line.
        let body: ApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("geocode response body not parseable: {}", e);
                return None;
            }
        };

        match classify(body) {
            Ok(reply) => Some(reply),
            Err(reason) => {
                tracing::debug!("unexpected geocode response shape: {}", reason);
                None
            }
        }
    }

    async fn attempt_key_check(&self, url: &Url) -> Option<KeyCheck> {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("api key check failed: {}", e);
                return None;
            }
        };

        let http_status = response.status();
        if http_status.is_server_error() {
            return None;
        }

        let body: ApiResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("api key check body not parseable: {}", e);
                return None;
            }
        };

        if http_status != reqwest::StatusCode::OK || body.status != 200 {
            let message = body
                .message
                .unwrap_or_else(|| format!("status {}", body.status));
            Some(KeyCheck::Invalid(format!("Error: {}", message)))
        } else {
            Some(KeyCheck::Valid("Api key is valid".to_string()))
        }
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn validate_api_key(&self) -> Result<KeyCheck> {
        let url = self.key_check_url()?;
        let checked = self.retry.run(|| self.attempt_key_check(&url)).await;
        Ok(checked.unwrap_or(KeyCheck::NoResponse))
    }

    async fn locate(&self, address: &NormalizedAddress) -> Result<GeocodeOutcome> {
        let url = self.locate_url(address)?;

        match self.retry.run(|| self.attempt_locate(&url)).await {
            None => Ok(GeocodeOutcome::NoResponse),
            Some(RawReply::NotFound(message)) => Ok(GeocodeOutcome::NotFound { message }),
            Some(RawReply::Matched(result)) => Ok(GeocodeOutcome::Matched(into_candidate(result))),
        }
    }
}

fn classify(body: ApiResponse) -> std::result::Result<RawReply, String> {
    if body.status == 404 {
        Ok(RawReply::NotFound(
            body.message.unwrap_or_else(|| "No match found".to_string()),
        ))
    } else if let Some(result) = body.result {
        Ok(RawReply::Matched(result))
    } else {
        Err(format!(
            "status {} carried neither result nor 404 message",
            body.status
        ))
    }
}

fn into_candidate(result: ApiResult) -> MatchCandidate {
    // The service sometimes appends a secondary descriptor after a comma;
    // only the leading address text is kept.
    let match_address = match result.match_address.split_once(',') {
        Some((head, _)) => head.to_string(),
        None => result.match_address.clone(),
    };

    let (input_address, input_zone) = match result.input_address.split_once(',') {
        Some((address, zone)) => (address.to_string(), zone.trim().to_string()),
        None => (result.input_address.clone(), String::new()),
    };

    MatchCandidate {
        match_address,
        match_zone: result.address_grid,
        score: result.score,
        x: result.location.x,
        y: result.location.y,
        locator: result.locator,
        input_address,
        input_zone,
    }
}
