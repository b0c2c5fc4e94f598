// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The certflow-client developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! On-premises backend.
//!
//! Talks to a self-hosted certificate gateway: credential-based session
//! auth, folder/zone scoped. Certificate operations use the gateway's
//! `CertificateDN`/`Guid` naming; the request identifier returned to
//! callers is the certificate DN.

use reqwest::{Method, StatusCode};
use serde_json::json;
use tokio::sync::RwLock;

use crate::config::{build_http_client, Auth, ConnectionConfig};
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::response::classify_response;
use crate::types::{split_pem_chain, Certificate, CertificateRequest, ChainOption, Retrieval};
use crate::zone::{Policy, Zone, ZoneConfig};

use async_trait::async_trait;

/// Header carrying the session key on authenticated requests.
const SESSION_HEADER: &str = "x-session-key";

mod paths {
    pub const AUTHORIZE: &str = "sdk/authorize";
    pub const PING: &str = "sdk/ping";
    pub const ZONES: &str = "sdk/zones";
    pub const POLICIES: &str = "sdk/policies";
    pub const CERT_REQUEST: &str = "sdk/certificates/request";
    pub const CERT_STATUS: &str = "sdk/certificates/checkstatus";
    pub const CERT_RETRIEVE: &str = "sdk/certificates/retrieve";
    pub const CERT_REVOKE: &str = "sdk/certificates/revoke";
    pub const CERT_RENEW: &str = "sdk/certificates/renew";
}

/// Connection to an on-premises certificate gateway.
///
/// Call [`Connection::authenticate`] before certificate or zone
/// operations; the session key it obtains is cached and reused. The
/// cache sits behind a lock, so one connection is safe to share across
/// concurrent issuance flows.
pub struct OnPremConnection {
    config: ConnectionConfig,
    http: reqwest::Client,
    username: String,
    password: String,
    session_key: RwLock<Option<String>>,
}

impl std::fmt::Debug for OnPremConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnPremConnection")
            .field("base_url", &self.config.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl OnPremConnection {
    /// Create an on-premises connection from a configuration.
    ///
    /// Requires [`Auth::Credentials`].
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let (username, password) = match &config.auth {
            Auth::Credentials { username, password } => (username.clone(), password.clone()),
            _ => {
                return Err(Error::field(
                    "on-premises connections authenticate with credentials",
                ))
            }
        };
        let http = build_http_client(&config)?;

        Ok(Self {
            config,
            http,
            username,
            password,
            session_key: RwLock::new(None),
        })
    }

    /// The connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn authed(&self, method: Method, url: url::Url) -> Result<reqwest::RequestBuilder> {
        let key = self.session_key.read().await.clone().ok_or_else(|| {
            Error::authentication_required("no session established; call authenticate() first")
        })?;
        Ok(self.http.request(method, url).header(SESSION_HEADER, key))
    }

    async fn get_policy(&self, policy_id: &str) -> Result<Policy> {
        let url = self
            .config
            .api_url(&format!("{}/{}", paths::POLICIES, policy_id));
        tracing::debug!(%url, "GET policy");

        let response = self.authed(Method::GET, url).await?.send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::policy_not_found(policy_id)))?;

        let policy = serde_json::from_value(classified.json()?.clone())?;
        Ok(policy)
    }
}

#[async_trait]
impl Connection for OnPremConnection {
    async fn ping(&self) -> Result<bool> {
        let url = self.config.api_url(paths::PING);
        tracing::debug!(%url, "GET ping");

        let response = self.http.get(url).send().await?;
        Ok(response.status().is_success())
    }

    async fn authenticate(&self) -> Result<()> {
        let url = self.config.api_url(paths::AUTHORIZE);
        tracing::debug!(%url, username = %self.username, "POST authorize");

        let body = json!({ "Username": self.username, "Password": self.password });
        let response = self.http.post(url).json(&body).send().await?;
        let classified = classify_response(response).await?;

        let key = classified.json()?["APIKey"]
            .as_str()
            .ok_or_else(|| Error::field("APIKey missing from authorize response"))?
            .to_string();

        // Overwriting an existing session is deliberate: re-authenticating
        // mid-session must always be safe.
        *self.session_key.write().await = Some(key);
        Ok(())
    }

    async fn register(&self, _email: &str) -> Result<()> {
        Err(Error::not_supported(
            "account registration is a cloud-service operation",
        ))
    }

    async fn get_zone_by_tag(&self, tag: &str) -> Result<Zone> {
        let url = self.config.api_url(&format!("{}/{}", paths::ZONES, tag));
        tracing::debug!(%url, "GET zone");

        let response = self.authed(Method::GET, url).await?.send().await?;
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
        let url = self.config.api_url(paths::CERT_REQUEST);
        tracing::debug!(%url, zone = zone_tag, "POST certificate request");

        let mut body = json!({
            "PolicyDN": zone_tag,
            "PKCS10": request.csr_pem,
            "RootFirstOrder": request.chain_option == ChainOption::RootFirst,
        });
        if let Some(ref name) = request.friendly_name {
            body["ObjectName"] = json!(name);
        }

        let response = self.authed(Method::POST, url).await?.json(&body).send().await?;
        let classified = classify_response(response).await?;

        let dn = classified.json()?["CertificateDN"]
            .as_str()
            .ok_or_else(|| Error::field("CertificateDN missing from request response"))?
            .to_string();

        tracing::info!(request_id = %dn, zone = zone_tag, "certificate request submitted");
        Ok(dn)
    }

    async fn retrieve_certificate(&self, request_id: &str) -> Result<Retrieval> {
        let url = self.config.api_url(paths::CERT_RETRIEVE);
        tracing::debug!(%url, request_id, "POST retrieve");

        let body = json!({ "CertificateDN": request_id, "IncludeChain": true });
        let response = self.authed(Method::POST, url).await?.json(&body).send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;

        // The gateway answers 202 while issuance is still in flight.
        if classified.status == StatusCode::ACCEPTED {
            return Ok(Retrieval::Pending);
        }

        let data = classified.json()?["CertificateData"]
            .as_str()
            .ok_or_else(|| Error::field("CertificateData missing from retrieve response"))?
            .to_string();

        let mut blocks = split_pem_chain(&data);
        if blocks.is_empty() {
            return Err(Error::unexpected("no PEM certificate in retrieval response"));
        }
        let certificate = blocks.remove(0);

        Ok(Retrieval::Ready(Certificate {
            id: request_id.to_string(),
            status: crate::CertStatus::Issued,
            certificate: Some(certificate),
            chain: blocks,
        }))
    }

    async fn revoke_certificate(&self, request_id: &str) -> Result<()> {
        let url = self.config.api_url(paths::CERT_REVOKE);
        tracing::debug!(%url, request_id, "POST revoke");

        let body = json!({ "CertificateDN": request_id });
        let response = self.authed(Method::POST, url).await?.json(&body).send().await?;
        classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;
        Ok(())
    }

    async fn renew_certificate(&self, request_id: &str) -> Result<()> {
        let url = self.config.api_url(paths::CERT_RENEW);
        tracing::debug!(%url, request_id, "POST renew");

        let body = json!({ "CertificateDN": request_id });
        let response = self.authed(Method::POST, url).await?.json(&body).send().await?;
        classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;
        Ok(())
    }

    async fn cert_status(&self, request_id: &str) -> Result<Certificate> {
        let url = self.config.api_url(paths::CERT_STATUS);
        tracing::debug!(%url, request_id, "POST check status");

        let body = json!({ "CertificateDN": request_id });
        let response = self.authed(Method::POST, url).await?.json(&body).send().await?;
        let classified = classify_response(response)
            .await
            .map_err(|e| missing_as(e, Error::not_found(format!("request '{}'", request_id))))?;

        let status = classified.json()?["Status"]
            .as_str()
            .map(crate::CertStatus::from)
            .ok_or_else(|| Error::field("Status missing from check status response"))?;

        Ok(Certificate::with_status(request_id, status))
    }
}

/// Rewrite a 404 connection error as a domain not-found error.
fn missing_as(err: Error, not_found: Error) -> Error {
    match err {
        Error::Connection { status: 404, .. } => not_found,
        other => other,
    }
}
