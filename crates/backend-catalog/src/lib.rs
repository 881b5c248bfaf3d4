//! Catalog reference-service backend.
//!
//! Provides the `ReferenceBackend` trait and its HTTP implementation.
//! The engine itself never performs I/O; this crate turns a token sequence
//! into the single-shot batch reads of the reference dictionaries and
//! assembles the `ReferenceSnapshot` the engine consumes. The trait keeps
//! the core backend-agnostic should the catalog move off its REST service.

use skinfit_match::LookupPlan;
use skinfit_model::{EffectKeyword, KeywordWeight, ReferenceSnapshot, WeightProfile};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use thiserror::Error;

/// Errors from reference-backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Lookup failed: {0}")]
    LookupFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No weight profile for skin type '{0}'")]
    ProfileNotFound(String),

    #[error("Backend not available")]
    Unavailable,
}

/// Batch lookups against the reference dictionaries.
///
/// Every method is a bulk read over a whole name set; per-token round
/// trips would make matcher cost scale with latency instead of token
/// count, so the interface does not offer them.
pub trait ReferenceBackend {
    /// Dictionary A membership: which of these normalized names exist.
    fn lookup_normalized(
        &self,
        names: &HashSet<String>,
    ) -> impl Future<Output = Result<HashSet<String>, BackendError>> + Send;

    /// Dictionary B membership: which of these exact names exist.
    fn lookup_exact(
        &self,
        names: &HashSet<String>,
    ) -> impl Future<Output = Result<HashSet<String>, BackendError>> + Send;

    /// Exact name → effect keyword, for names that carry one.
    fn lookup_keywords(
        &self,
        names: &HashSet<String>,
    ) -> impl Future<Output = Result<HashMap<String, EffectKeyword>, BackendError>> + Send;

    /// Normalized name → purpose text.
    fn lookup_purposes(
        &self,
        normalized_names: &HashSet<String>,
    ) -> impl Future<Output = Result<HashMap<String, String>, BackendError>> + Send;

    /// Exact name → caution grade, for names on the caution list.
    fn lookup_cautions(
        &self,
        names: &HashSet<String>,
    ) -> impl Future<Output = Result<HashMap<String, String>, BackendError>> + Send;

    /// Weight profile for a skin type. `ProfileNotFound` when absent.
    fn weight_profile(
        &self,
        skin_type: &str,
    ) -> impl Future<Output = Result<WeightProfile, BackendError>> + Send;

    /// A user's declared caution ingredient names (already filtered to
    /// kind=caution by the service).
    fn user_cautions(
        &self,
        user_id: u64,
    ) -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;

    /// Check if the backend is healthy.
    fn health_check(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// Fetch everything the engine needs for a token sequence in one pass.
pub async fn fetch_snapshot<B: ReferenceBackend>(
    backend: &B,
    tokens: &[String],
) -> Result<ReferenceSnapshot, BackendError> {
    let plan = LookupPlan::for_tokens(tokens);

    let regulatory_normalized = backend.lookup_normalized(&plan.normalized).await?;
    let purposes = backend.lookup_purposes(&plan.normalized).await?;
    let catalog_exact = backend.lookup_exact(&plan.exact).await?;
    let keywords = backend.lookup_keywords(&plan.exact).await?;
    let cautions = backend.lookup_cautions(&plan.exact).await?;

    Ok(ReferenceSnapshot {
        regulatory_normalized,
        purposes,
        catalog_exact,
        keywords,
        cautions,
    })
}

/// Catalog service configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL for the catalog HTTP API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8900".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HTTP implementation of [`ReferenceBackend`] against the catalog service.
pub struct CatalogBackend {
    config: CatalogConfig,
    client: reqwest::Client,
}

impl CatalogBackend {
    /// Create a new catalog backend.
    pub fn new(config: CatalogConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// POST a name set to a lookup endpoint and return the response body.
    async fn post_lookup(
        &self,
        path: &str,
        names: &HashSet<String>,
    ) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/{}", self.config.base_url, path);

        tracing::debug!(url = %url, names = names.len(), "Executing catalog lookup");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "names": names }))
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::LookupFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))
    }
}

/// Parse a `{"names": [...]}` response into a set.
fn parse_name_set(response: &serde_json::Value) -> Result<HashSet<String>, BackendError> {
    let names = response
        .get("names")
        .and_then(|v| v.as_array())
        .ok_or_else(|| BackendError::ParseError("Missing names array".to_string()))?;

    Ok(names
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect())
}

/// Parse a `{"<field>": {name: string}}` response into a map.
fn parse_string_map(
    response: &serde_json::Value,
    field: &str,
) -> Result<HashMap<String, String>, BackendError> {
    let entries = response
        .get(field)
        .and_then(|v| v.as_object())
        .ok_or_else(|| BackendError::ParseError(format!("Missing {field} object")))?;

    Ok(entries
        .iter()
        .filter_map(|(name, v)| v.as_str().map(|s| (name.clone(), s.to_string())))
        .collect())
}

/// Parse a `{"keywords": {name: keyword}}` response, dropping entries with
/// keywords outside the fixed six.
fn parse_keyword_map(
    response: &serde_json::Value,
) -> Result<HashMap<String, EffectKeyword>, BackendError> {
    let entries = response
        .get("keywords")
        .and_then(|v| v.as_object())
        .ok_or_else(|| BackendError::ParseError("Missing keywords object".to_string()))?;

    Ok(entries
        .iter()
        .filter_map(|(name, v)| {
            v.as_str()
                .and_then(EffectKeyword::from_name)
                .map(|keyword| (name.clone(), keyword))
        })
        .collect())
}

/// Build a profile from a raw keyword → settings object, dropping unknown
/// keywords and collapsing malformed entries to neutral.
fn parse_profile(raw: HashMap<String, serde_json::Value>) -> WeightProfile {
    raw.into_iter()
        .filter_map(|(name, value)| {
            let keyword = EffectKeyword::from_name(&name)?;
            let weight: KeywordWeight = serde_json::from_value(value).unwrap_or_default();
            Some((keyword, weight))
        })
        .collect()
}

impl ReferenceBackend for CatalogBackend {
    async fn lookup_normalized(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashSet<String>, BackendError> {
        let response = self.post_lookup("lookup/normalized", names).await?;
        parse_name_set(&response)
    }

    async fn lookup_exact(&self, names: &HashSet<String>) -> Result<HashSet<String>, BackendError> {
        let response = self.post_lookup("lookup/exact", names).await?;
        parse_name_set(&response)
    }

    async fn lookup_keywords(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, EffectKeyword>, BackendError> {
        let response = self.post_lookup("lookup/keywords", names).await?;
        parse_keyword_map(&response)
    }

    async fn lookup_purposes(
        &self,
        normalized_names: &HashSet<String>,
    ) -> Result<HashMap<String, String>, BackendError> {
        let response = self.post_lookup("lookup/purposes", normalized_names).await?;
        parse_string_map(&response, "purposes")
    }

    async fn lookup_cautions(
        &self,
        names: &HashSet<String>,
    ) -> Result<HashMap<String, String>, BackendError> {
        let response = self.post_lookup("lookup/cautions", names).await?;
        parse_string_map(&response, "cautions")
    }

    async fn weight_profile(&self, skin_type: &str) -> Result<WeightProfile, BackendError> {
        let url = format!("{}/profiles/{}", self.config.base_url, skin_type);

        tracing::debug!(url = %url, "Fetching weight profile");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::ProfileNotFound(skin_type.to_string()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::LookupFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let raw: HashMap<String, serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        if raw.is_empty() {
            return Err(BackendError::ProfileNotFound(skin_type.to_string()));
        }

        Ok(parse_profile(raw))
    }

    async fn user_cautions(&self, user_id: u64) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/users/{}/cautions", self.config.base_url, user_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::LookupFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        Ok(parse_name_set(&json)?.into_iter().collect())
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .client
            .get(format!("{}/health", self.config.base_url))
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}
