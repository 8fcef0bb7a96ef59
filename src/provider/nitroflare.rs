use super::{Credentials, HostingProvider, ResolvedLink};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Envelope shared by every API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct DownloadLinkResult {
    name: String,
    url: String,
}

/// Client for the NitroFlare v2 API.
pub struct NitroflareClient {
    client: Client,
    api_base: String,
    credentials: Credentials,
    timeout: Duration,
}

impl NitroflareClient {
    pub fn new(client: Client, api_base: &str, credentials: Credentials, timeout: Duration) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            credentials,
            timeout,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_base, endpoint)
    }

    fn premium_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user", self.credentials.account().to_string()),
            ("premiumKey", self.credentials.premium_key().to_string()),
        ]
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<ApiResponse<T>> {
        let response = self
            .client
            .get(self.url(endpoint))
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .context(format!("Failed to GET {}", endpoint))?;

        if response.status() != StatusCode::OK {
            anyhow::bail!("{} returned {}", endpoint, response.status());
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Malformed JSON from {}", endpoint))?;

        if body.kind.as_deref() == Some("error") {
            anyhow::bail!(
                "{} failed: {}",
                endpoint,
                body.message.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(body)
    }
}

#[async_trait::async_trait]
impl HostingProvider for NitroflareClient {
    async fn check_key(&self) -> Result<()> {
        self.get::<serde_json::Value>("getKeyInfo", &self.premium_params())
            .await
            .map(|_| ())
    }

    async fn file_info(&self, file_id: &str) -> Result<()> {
        let params = [("files", file_id.to_string())];
        self.get::<serde_json::Value>("getFileInfo", &params)
            .await
            .map(|_| ())
    }

    async fn download_link(&self, file_id: &str) -> Result<ResolvedLink> {
        let mut params = self.premium_params();
        params.push(("file", file_id.to_string()));

        let body = self
            .get::<DownloadLinkResult>("getDownloadLink", &params)
            .await?;
        let result = body
            .result
            .with_context(|| format!("getDownloadLink for {} has no result", file_id))?;

        Ok(ResolvedLink {
            url: result.url,
            name: result.name,
        })
    }
}
