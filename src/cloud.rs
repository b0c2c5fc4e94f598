//! Cloud backend.
//!
//! Talks to the hosted certificate service: API-key authenticated,
//! organization/zone scoped, JSON request and response bodies.

use reqwest::Method;
use serde_json::json;

use crate::config::{build_http_client, Auth, ConnectionConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::response::classify_response;
use crate::types::{split_pem_chain, Certificate, CertificateRequest, Retrieval};
use crate::zone::{Policy, Zone, ZoneConfig};

use async_trait::async_trait;

/// Header carrying the API key on every authenticated request.
const API_KEY_HEADER: &str = "x-api-key";

/// API paths under the service base URL.
mod paths {
    pub const PING: &str = "v1/ping";
    pub const USER_ACCOUNTS: &str = "v1/useraccounts";
    pub const ZONE_BY_TAG: &str = "v1/zones/tag";
    pub const POLICIES: &str = "v1/certificatepolicies";
    pub const CERTIFICATE_REQUESTS: &str = "v1/certificaterequests";
}

/// Connection to the cloud certificate service.
///
/// # Example
///
/// ```no_run
/// use certflow_client::{CloudConnection, Connection, ConnectionConfig};
///
/// # async fn example() -> certflow_client::Result<()> {
/// let config = ConnectionConfig::builder()
///     .base_url("https://api.certflow.example.com")?
///     .api_key("a1b2c3")
///     .build()?;
///
/// let conn = CloudConnection::new(config)?;
/// assert!(conn.ping().await?);
/// # Ok(())
/// # }
/// ```
pub struct CloudConnection {
    config: ConnectionConfig,
    http: reqwest::Client,
    api_key: Option<String>,
}

impl std::fmt::Debug for CloudConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudConnection")
            .field("base_url", &self.config.base_url)
            .field("api_key", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl CloudConnection {
    /// Create a cloud connection from a configuration.
    ///
    /// Requires [`Auth::ApiKey`] or [`Auth::None`]; credential auth
    /// belongs to the on-premises backend.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let api_key = match &config.auth {
            Auth::ApiKey(key) => Some(key.clone()),
            Auth::None => None,
            Auth::Credentials { .. } => {
                return Err(Error::field(
                    "cloud connections authenticate with an API key, not credentials",
                ))
            }
        };
        let http = build_http_client(&config)?;

        Ok(Self {
            config,
            http,
            api_key,
        })
    }

    /// The connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn request(&self, method: Method, url: url::Url) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(ref key) = self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }

    async fn get_policy(&self, policy_id: &str) -> Result<Policy> {
        let url = self
            .config
            .api_url(&format!("{}/{}", paths::POLICIES, policy_id));
        tracing::debug!(%url, "GET policy");

        let response = self.request(Method::GET, url).send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::policy_not_found(policy_id)))?;

        let policy = serde_json::from_value(classified.json()?.clone())?;
        Ok(policy)
    }
}

#[async_trait]
impl Connection for CloudConnection {
    async fn ping(&self) -> Result<bool> {
        let url = self.config.api_url(paths::PING);
        tracing::debug!(%url, "GET ping");

        let response = self.request(Method::GET, url).send().await?;
        Ok(response.status().is_success())
    }

    async fn authenticate(&self) -> Result<()> {
        // Stateless auth: validating the key against the account endpoint
        // is all there is to do, and doing it twice is harmless.
        let url = self.config.api_url(paths::USER_ACCOUNTS);
        tracing::debug!(%url, "GET user account");

        let response = self.request(Method::GET, url).send().await?;
        classify_response(response).await?;
        Ok(())
    }

    async fn register(&self, email: &str) -> Result<()> {
        let url = self.config.api_url(paths::USER_ACCOUNTS);
        tracing::debug!(%url, email, "POST user account");

        let body = json!({ "username": email, "userAccountType": "API" });
        let response = self.request(Method::POST, url).json(&body).send().await?;
        classify_response(response).await?;
        Ok(())
    }

    async fn get_zone_by_tag(&self, tag: &str) -> Result<Zone> {
        let url = self
            .config
            .api_url(&format!("{}/{}", paths::ZONE_BY_TAG, tag));
        tracing::debug!(%url, "GET zone");

        let response = self.request(Method::GET, url).send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("zone '{}'", tag))))?;

        let zone = serde_json::from_value(classified.json()?.clone())?;
        Ok(zone)
    }

    async fn read_zone_config(&self, tag: &str) -> Result<ZoneConfig> {
        let zone = self.get_zone_by_tag(tag).await?;

        let mut policies = Vec::with_capacity(zone.certificate_policy_ids.len());
        for policy_id in &zone.certificate_policy_ids {
            policies.push(self.get_policy(policy_id).await?);
        }

        Ok(ZoneConfig::assemble(&policies))
    }

    async fn request_certificate(
        &self,
        request: &CertificateRequest,
        zone_tag: &str,
    ) -> Result<String> {
        let zone = self.get_zone_by_tag(zone_tag).await?;

        let url = self.config.api_url(paths::CERTIFICATE_REQUESTS);
        tracing::debug!(%url, zone_id = %zone.id, "POST certificate request");

        let mut body = json!({
            "zoneId": zone.id,
            "certificateSigningRequest": request.csr_pem,
            "chainOrder": request.chain_option.as_str(),
        });
        if let Some(ref name) = request.friendly_name {
            body["name"] = json!(name);
        }

        let response = self.request(Method::POST, url).json(&body).send().await?;
        let classified = classify_response(response).await?;

        let request_id = classified.json()?["certificateRequests"]
            .as_array()
            .and_then(|requests| requests.first())
            .and_then(|r| r["id"].as_str())
            .ok_or_else(|| Error::field("certificate request id missing from response"))?
            .to_string();

        tracing::info!(%request_id, zone = zone_tag, "certificate request submitted");
        Ok(request_id)
    }

    async fn retrieve_certificate(&self, request_id: &str) -> Result<Retrieval> {
        let record = self.cert_status(request_id).await?;
        if record.status.is_in_progress() {
            return Ok(Retrieval::Pending);
        }
        if record.status != crate::CertStatus::Issued {
            // Terminal but nothing to download; the status tells the story.
            return Ok(Retrieval::Ready(record));
        }

        let url = self.config.api_url(&format!(
            "{}/{}/certificate",
            paths::CERTIFICATE_REQUESTS,
            request_id
        ));
        tracing::debug!(%url, "GET certificate");

        let response = self.request(Method::GET, url).send().await?;
        let classified = classify_response(response).await?;

        let mut blocks = split_pem_chain(classified.text()?);
        if blocks.is_empty() {
            return Err(Error::unexpected("no PEM certificate in retrieval response"));
        }
        let certificate = blocks.remove(0);

        Ok(Retrieval::Ready(Certificate {
            id: request_id.to_string(),
            status: record.status,
            certificate: Some(certificate),
            chain: blocks,
        }))
    }

    async fn revoke_certificate(&self, request_id: &str) -> Result<()> {
        let url = self.config.api_url(&format!(
            "{}/{}/revoke",
            paths::CERTIFICATE_REQUESTS,
            request_id
        ));
        tracing::debug!(%url, "POST revoke");

        let response = self.request(Method::POST, url).send().await?;
        classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;
        Ok(())
    }

    async fn renew_certificate(&self, request_id: &str) -> Result<()> {
        let url = self.config.api_url(&format!(
            "{}/{}/renew",
            paths::CERTIFICATE_REQUESTS,
            request_id
        ));
        tracing::debug!(%url, "POST renew");

        let response = self.request(Method::POST, url).send().await?;
        classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;
        Ok(())
    }

    async fn cert_status(&self, request_id: &str) -> Result<Certificate> {
        let url = self
            .config
            .api_url(&format!("{}/{}", paths::CERTIFICATE_REQUESTS, request_id));
        tracing::debug!(%url, "GET request status");

        let response = self.request(Method::GET, url).send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;

        let certificate = serde_json::from_value(classified.json()?.clone())?;
        Ok(certificate)
    }
}

/// Rewrite a 404 connection error as a domain not-found error.
fn missing_as(err: Error, not_found: Error) -> Error {
    match err {
        Error::Connection { status: 404, .. } => not_found,
        other => other,
    }
}
