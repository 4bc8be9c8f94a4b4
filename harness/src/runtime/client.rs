//! Flyte admin client
//!
//! Thin client over the admin service's HTTP gateway, bound to one endpoint.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use shared::{Component, ServiceEndpoint, component_debug};

use crate::error::{HarnessError, HarnessResult};

pub const PLATFORM_URL_ENV: &str = "FLYTE_PLATFORM_URL";
pub const PLATFORM_INSECURE_ENV: &str = "FLYTE_PLATFORM_INSECURE";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Debug)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<Project>,
}

/// Client handle handed to tests once the platform is ready
#[derive(Clone, Debug)]
pub struct FlyteClient {
    endpoint: ServiceEndpoint,
    insecure: bool,
    base_url: Url,
    client: reqwest::Client,
}

impl FlyteClient {
    /// Create a client for `endpoint`; insecure selects plain http
    pub fn new(endpoint: ServiceEndpoint, insecure: bool) -> HarnessResult<Self> {
        let scheme = if insecure { "http" } else { "https" };
        let base_url = Url::parse(&format!("{scheme}://{}/", endpoint.address()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            endpoint,
            insecure,
            base_url,
            client,
        })
    }

    /// Create a client from `FLYTE_PLATFORM_URL` and `FLYTE_PLATFORM_INSECURE`
    pub fn from_env() -> HarnessResult<Self> {
        let url = std::env::var(PLATFORM_URL_ENV)
            .map_err(|_| HarnessError::config(PLATFORM_URL_ENV, "environment variable is not set"))?;
        let insecure = std::env::var(PLATFORM_INSECURE_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Self::new(ServiceEndpoint::parse(&url)?, insecure)
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn is_insecure(&self) -> bool {
        self.insecure
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List up to `limit` registered projects
    pub async fn list_projects(&self, limit: u32) -> HarnessResult<Vec<Project>> {
        let url = self.base_url.join("api/v1/projects")?;
        component_debug!(Component::Client, "📋 Listing projects at {}", url);

        let response = self
            .client
            .get(url)
            .query(&[("limit", limit)])
            .send()
            .await?
            .error_for_status()?;

        let body: ProjectsResponse = response.json().await?;
        Ok(body.projects)
    }

    /// Check whether the admin service answers its health endpoint
    pub async fn health_check(&self) -> HarnessResult<bool> {
        let url = self.base_url.join("healthcheck")?;
        let response = self.client.get(url).send().await?;
        Ok(response.status().is_success())
    }
}

/// Loose truthiness for environment flags: `true`, `1`, `yes`, `on` in any case
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
