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

//! Configuration for certificate service connections.
//!
//! A [`ConnectionConfig`] carries the base URL, authentication material,
//! and HTTP-level settings shared by both backends. Build one with the
//! builder:
//!
//! ```
//! use certflow_client::ConnectionConfig;
//!
//! # fn example() -> certflow_client::Result<()> {
//! let config = ConnectionConfig::builder()
//!     .base_url("https://api.certflow.example.com")?
//!     .api_key("a1b2c3")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{Error, Result};

/// Authentication material for a connection.
#[derive(Clone)]
pub enum Auth {
    /// Cloud-style API key, sent with every request.
    ApiKey(String),
    /// On-premises credentials, exchanged for a session token.
    Credentials {
        /// Account username.
        username: String,
        /// Account password.
        password: String,
    },
    /// No authentication (liveness checks only).
    None,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secrets stay out of debug output.
        match self {
            Self::ApiKey(_) => f.write_str("Auth::ApiKey(..)"),
            Self::Credentials { username, .. } => f
                .debug_struct("Auth::Credentials")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::None => f.write_str("Auth::None"),
        }
    }
}

/// Configuration shared by both connection backends.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Service base URL (e.g. `https://api.certflow.example.com`).
    pub base_url: Url,
    /// Authentication material.
    pub auth: Auth,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Additional HTTP headers sent with every request.
    pub additional_headers: Vec<(String, String)>,
}

impl ConnectionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Build the URL for an API path under the base URL.
    pub fn api_url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let base = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}/{}", base, path.trim_start_matches('/')));
        url
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    base_url: Option<Url>,
    auth: Option<Auth>,
    timeout: Option<Duration>,
    additional_headers: Vec<(String, String)>,
}

impl ConnectionConfigBuilder {
    /// Set the service base URL.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Authenticate with a cloud API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.auth = Some(Auth::ApiKey(key.into()));
        self
    }

    /// Authenticate with on-premises credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Auth::Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Set the per-request timeout (default 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add an HTTP header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ConnectionConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::field("base URL is required"))?;

        Ok(ConnectionConfig {
            base_url,
            auth: self.auth.unwrap_or(Auth::None),
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
            additional_headers: self.additional_headers,
        })
    }
}

/// Build the shared HTTP client for a connection.
pub(crate) fn build_http_client(config: &ConnectionConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.additional_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::field(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::field(format!("invalid header value: {}", e)))?;
        headers.insert(name, value);
    }

    let client = reqwest::Client::builder()
        .user_agent(crate::USER_AGENT)
        .timeout(config.timeout)
        .default_headers(headers)
        .build()?;

    Ok(client)
}
