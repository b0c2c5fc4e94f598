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

//! The connection capability set.
//!
//! [`Connection`] is the polymorphic interface both backends implement:
//! [`CloudConnection`](crate::CloudConnection) for the API-key cloud
//! service and [`OnPremConnection`](crate::OnPremConnection) for the
//! credential/session on-premises service. The backend is selected at
//! construction time; callers and the
//! [`IssuancePoller`](crate::IssuancePoller) work against `&dyn
//! Connection`.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Certificate, CertificateRequest, Retrieval};
use crate::zone::{Zone, ZoneConfig};

/// Operations a certificate service backend must provide.
///
/// Implementations are `Send + Sync` and safe for concurrent read
/// operations; independent issuance flows may share one connection.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Liveness check.
    ///
    /// Returns `false` when the server answers with an error status.
    /// An unreachable transport surfaces as an error instead.
    async fn ping(&self) -> Result<bool>;

    /// Obtain or validate session material.
    ///
    /// Idempotent: re-authenticating mid-session is always safe. Backends
    /// with stateful auth require this before any other call.
    async fn authenticate(&self) -> Result<()>;

    /// Register a new user account by email.
    ///
    /// Cloud-only; the on-premises backend fails with
    /// [`Error::NotSupported`](crate::Error::NotSupported).
    async fn register(&self, email: &str) -> Result<()>;

    /// Fetch the zone addressed by a tag.
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) when the
    /// server reports no matching zone.
    async fn get_zone_by_tag(&self, tag: &str) -> Result<Zone>;

    /// Resolve a zone's policies into a merged [`ZoneConfig`].
    ///
    /// Fails with [`Error::PolicyNotFound`](crate::Error::PolicyNotFound)
    /// if any referenced policy cannot be fetched.
    async fn read_zone_config(&self, tag: &str) -> Result<ZoneConfig>;

    /// Submit a CSR to a zone; returns the server-assigned request id.
    ///
    /// Never retried internally: an ambiguous failure is surfaced to the
    /// caller, who alone can decide whether a duplicate pending request
    /// is acceptable.
    async fn request_certificate(
        &self,
        request: &CertificateRequest,
        zone_tag: &str,
    ) -> Result<String>;

    /// Single non-blocking retrieval attempt.
    ///
    /// Returns [`Retrieval::Pending`] — a sentinel, not an error — while
    /// the certificate is not issued yet.
    async fn retrieve_certificate(&self, request_id: &str) -> Result<Retrieval>;

    /// Revoke a certificate. Idempotent server-side.
    async fn revoke_certificate(&self, request_id: &str) -> Result<()>;

    /// Renew a certificate. Idempotent server-side.
    async fn renew_certificate(&self, request_id: &str) -> Result<()>;

    /// Status-only poll, cheaper than full retrieval.
    ///
    /// Repeated calls with unchanged server state return equal records.
    /// Consumed by the [`IssuancePoller`](crate::IssuancePoller).
    async fn cert_status(&self, request_id: &str) -> Result<Certificate>;
}
