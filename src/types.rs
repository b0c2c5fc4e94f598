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

//! Certificate lifecycle types.
//!
//! This module models certificate requests and the certificate lifecycle
//! state reported by the server. The status enumeration is deliberately
//! open: servers may introduce terminal states this client has never seen,
//! and an unknown status must end polling rather than wedge it.

use std::fmt;
use std::str::FromStr;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a certificate request.
///
/// `Requested` and `Pending` are the only in-progress states; every other
/// value, including [`CertStatus::Other`], is terminal and ends polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertStatus {
    /// Request received by the server, not yet being processed.
    Requested,
    /// Request is being processed or awaits approval.
    Pending,
    /// Certificate has been issued and can be retrieved.
    Issued,
    /// Request was rejected by the server or an approver.
    Rejected,
    /// Certificate was revoked.
    Revoked,
    /// A status string this client does not recognize. Terminal.
    Other(String),
}

impl CertStatus {
    /// Returns true while the certificate is still being processed.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Requested | Self::Pending)
    }

    /// Returns true once polling should stop.
    pub fn is_terminal(&self) -> bool {
        !self.is_in_progress()
    }

    /// Canonical wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Pending => "PENDING",
            Self::Issued => "ISSUED",
            Self::Rejected => "REJECTED",
            Self::Revoked => "REVOKED",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for CertStatus {
    fn from(s: &str) -> Self {
        // Backends disagree on capitalization ("PENDING" vs "Pending").
        match s.to_ascii_uppercase().as_str() {
            "REQUESTED" => Self::Requested,
            "PENDING" => Self::Pending,
            "ISSUED" => Self::Issued,
            "REJECTED" => Self::Rejected,
            "REVOKED" => Self::Revoked,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl FromStr for CertStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for CertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CertStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CertStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Preferred ordering of the issued certificate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainOption {
    /// Root certificate first, leaf last.
    RootFirst,
    /// Leaf certificate first, root last.
    #[default]
    RootLast,
    /// No chain, leaf only.
    Ignore,
}

impl ChainOption {
    /// Wire representation used by the cloud backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RootFirst => "ROOT_FIRST",
            Self::RootLast => "ROOT_LAST",
            Self::Ignore => "IGNORE",
        }
    }
}

/// A certificate signing request as submitted to a zone.
///
/// The CSR itself is opaque PEM produced by the caller; this client never
/// builds or inspects it. A request is immutable once submitted — the
/// server-assigned identifier is returned by
/// [`Connection::request_certificate`](crate::Connection::request_certificate),
/// not written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Server-assigned identifier, if known.
    pub id: Option<String>,
    /// PEM-encoded CSR bytes.
    pub csr_pem: String,
    /// Optional display name for the request.
    pub friendly_name: Option<String>,
    /// Pickup identifier of a previously submitted request, when resuming.
    pub pickup_id: Option<String>,
    /// Chain ordering preference for the issued certificate.
    pub chain_option: ChainOption,
}

impl CertificateRequest {
    /// Create a request from caller-provided PEM CSR bytes.
    pub fn new(csr_pem: impl Into<String>) -> Self {
        Self {
            id: None,
            csr_pem: csr_pem.into(),
            friendly_name: None,
            pickup_id: None,
            chain_option: ChainOption::default(),
        }
    }

    /// Set a display name for the request.
    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    /// Set a pickup identifier from a previous submission.
    pub fn with_pickup_id(mut self, pickup_id: impl Into<String>) -> Self {
        self.pickup_id = Some(pickup_id.into());
        self
    }

    /// Set the chain ordering preference.
    pub fn with_chain_option(mut self, chain_option: ChainOption) -> Self {
        self.chain_option = chain_option;
        self
    }
}

/// A certificate record as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Request/pickup identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: CertStatus,
    /// Issued end-entity certificate, PEM, once available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// Issuing chain, PEM, in the order the server returned it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain: Vec<String>,
}

impl Certificate {
    /// Create a status-only record, as returned by a cheap status poll.
    pub fn with_status(id: impl Into<String>, status: CertStatus) -> Self {
        Self {
            id: id.into(),
            status,
            certificate: None,
            chain: Vec::new(),
        }
    }
}

/// Outcome of a single non-blocking retrieval attempt.
///
/// `Pending` is a sentinel, not an error: the request is healthy, the
/// certificate just is not issued yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval {
    /// The certificate is issued and included.
    Ready(Certificate),
    /// Not issued yet; try again later.
    Pending,
}

impl Retrieval {
    /// Returns the certificate if retrieval succeeded.
    pub fn certificate(self) -> Option<Certificate> {
        match self {
            Self::Ready(cert) => Some(cert),
            Self::Pending => None,
        }
    }

    /// Returns true if the certificate is not issued yet.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Split a concatenated PEM body into individual certificate blocks.
///
/// The first block is the end-entity certificate, the rest its chain.
pub(crate) fn split_pem_chain(body: &str) -> Vec<String> {
    const END_MARKER: &str = "-----END CERTIFICATE-----";

    let mut blocks = Vec::new();
    let mut rest = body;
    while let Some(pos) = rest.find(END_MARKER) {
        let (block, tail) = rest.split_at(pos + END_MARKER.len());
        let block = block.trim();
        if !block.is_empty() {
            blocks.push(block.to_string());
        }
        rest = tail;
    }
    blocks
}
