use crate::domain::model::{GeocodeOutcome, KeyCheck, NormalizedAddress};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Seam to the geocode web service, mockable in pipeline tests.
///
/// Both methods absorb transient failures internally (retry with backoff) and
/// report exhaustion in-band as `NoResponse`; `Err` is reserved for
/// configuration-level problems such as an unusable service URL.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn validate_api_key(&self) -> Result<KeyCheck>;
    async fn locate(&self, address: &NormalizedAddress) -> Result<GeocodeOutcome>;
}

/// File staging seam. Buckets are modeled as a base location; cloud-backed
/// implementations plug in here without touching the pipeline.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
