use crate::core::retry::RetryPolicy;
use serde::Deserialize;

pub const VERSION_CHECK_URL: &str =
    "https://raw.githubusercontent.com/agrc/geocoding-toolbox/master/tool-version.json";
pub const DOWNLOAD_URL: &str = "https://github.com/agrc/geocoding-toolbox/releases";

#[derive(Debug, Deserialize)]
struct VersionManifest {
    #[serde(rename = "VERSION_NUMBER")]
    version_number: String,
}

/// Advisory check against the published tool version. Never blocks or fails
/// the run; an unreachable manifest is logged at debug and ignored.
pub struct VersionCheck {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl VersionCheck {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            retry,
        }
    }

    pub async fn fetch_current_version(&self, check_url: &str) -> Option<String> {
        self.retry.run(|| self.attempt(check_url)).await
    }

    async fn attempt(&self, check_url: &str) -> Option<String> {
        let response = self.client.get(check_url).send().await.ok()?;
        if response.status() != reqwest::StatusCode::OK {
            return None;
        }
        let manifest: VersionManifest = response.json().await.ok()?;
        Some(manifest.version_number)
    }

    /// Compares the published version against the running build and logs an
    /// advisory when a newer release exists.
    pub async fn advise(&self, check_url: &str, running_version: &str) {
        match self.fetch_current_version(check_url).await {
            Some(current) if current != running_version => {
                tracing::info!("Current version is: {}", current);
                tracing::info!("Please download at: {}", DOWNLOAD_URL);
            }
            Some(_) => {}
            None => tracing::debug!("version manifest unreachable, skipping check"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn fast_check() -> VersionCheck {
        VersionCheck::new(RetryPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(8),
            Duration::from_millis(1),
        ))
    }

    #[tokio::test]
    async fn fetches_published_version() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tool-version.json");
            then.status(200)
                .json_body(serde_json::json!({"VERSION_NUMBER": "4.1.2"}));
        });

        let version = fast_check()
            .fetch_current_version(&server.url("/tool-version.json"))
            .await;
        assert_eq!(version, Some("4.1.2".to_string()));
    }

    #[tokio::test]
    async fn unreachable_manifest_yields_none() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/tool-version.json");
            then.status(500);
        });

        let version = fast_check()
            .fetch_current_version(&server.url("/tool-version.json"))
            .await;
        assert_eq!(version, None);
        mock.assert_hits(5);
    }

    #[tokio::test]
    async fn malformed_manifest_yields_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/tool-version.json");
            then.status(200).json_body(serde_json::json!({"oops": true}));
        });

        let version = fast_check()
            .fetch_current_version(&server.url("/tool-version.json"))
            .await;
        assert_eq!(version, None);
    }
}
