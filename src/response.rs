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

//! Server response classification.
//!
//! Every HTTP response from a certificate service passes through
//! [`classify`] before any backend interprets it. The classifier maps a
//! raw status/content-type/body triple to a typed payload or a typed
//! error, and nothing else: it never sleeps or retries. Retry and backoff
//! decisions belong to the caller.

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};

/// HTTP status codes the certificate services use for successful replies.
pub const ACCEPTED_STATUSES: [StatusCode; 2] = [StatusCode::OK, StatusCode::ACCEPTED];

/// Decoded body of an accepted server response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `text/plain` or `text/html` body, verbatim.
    Text(String),
    /// `application/json` body, parsed.
    Json(Value),
}

/// An accepted server response with its decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedResponse {
    /// Original HTTP status code (`200` or `202`).
    pub status: StatusCode,
    /// Decoded body.
    pub payload: Payload,
}

impl ClassifiedResponse {
    /// Borrow the JSON payload, or fail if the server sent text where
    /// JSON was required.
    pub fn json(&self) -> Result<&Value> {
        match &self.payload {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(Error::unexpected("expected a JSON body, got text")),
        }
    }

    /// Borrow the text payload, or fail if the server sent JSON where
    /// text was required.
    pub fn text(&self) -> Result<&str> {
        match &self.payload {
            Payload::Text(body) => Ok(body),
            Payload::Json(_) => Err(Error::unexpected("expected a text body, got JSON")),
        }
    }
}

/// Classify a raw HTTP response into a typed payload or a typed error.
///
/// Rules, in order:
/// - a status outside `{200, 202}` fails with [`Error::Connection`]
///   carrying the status, URL, and raw body, regardless of content-type;
/// - a content-type starting with `application/json` (charset suffixes
///   and other parameters ignored) parses the body as JSON;
/// - a content-type of `text/plain` or `text/html` passes the body
///   through verbatim;
/// - anything else fails with [`Error::UnexpectedServerBehavior`].
pub fn classify(
    url: &Url,
    status: StatusCode,
    content_type: &str,
    body: &str,
) -> Result<ClassifiedResponse> {
    if !ACCEPTED_STATUSES.contains(&status) {
        return Err(Error::connection(status.as_u16(), url.as_str(), body));
    }

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_str(body)?;
        tracing::debug!(status = status.as_u16(), %url, body, "server response");
        return Ok(ClassifiedResponse {
            status,
            payload: Payload::Json(value),
        });
    }

    // Parameters such as "; charset=utf-8" are not significant for the
    // text kinds either.
    let essence = content_type.split(';').next().unwrap_or("").trim();
    if essence == "text/plain" || essence == "text/html" {
        tracing::debug!(status = status.as_u16(), %url, body, "server response");
        return Ok(ClassifiedResponse {
            status,
            payload: Payload::Text(body.to_string()),
        });
    }

    tracing::error!(
        status = status.as_u16(),
        %url,
        content_type,
        "unexpected content type in server response"
    );
    Err(Error::unexpected(format!(
        "unhandled content type '{}' from {}",
        content_type, url
    )))
}

/// Drain a `reqwest` response and classify it.
pub(crate) async fn classify_response(response: reqwest::Response) -> Result<ClassifiedResponse> {
    let url = response.url().clone();
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.text().await?;

    classify(&url, status, &content_type, &body)
}
