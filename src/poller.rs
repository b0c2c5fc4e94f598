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

//! Certificate issuance polling.
//!
//! After a CSR is submitted the server processes it asynchronously; the
//! request sits in `Requested` or `Pending` until an operator or policy
//! decides its fate. [`IssuancePoller`] drives that wait: on each tick it
//! asks the connection for the current status and stops at the first
//! status outside the in-progress set.
//!
//! Polling is bounded. The original service recommendation is a fixed
//! ten-second cadence, and both a wall-clock deadline and an optional
//! attempt bound guard against a request that never leaves the queue.
//!
//! # Example
//!
//! ```no_run
//! use certflow_client::{CloudConnection, ConnectionConfig, IssuancePoller, PollerConfig};
//! use certflow_client::CertificateRequest;
//! use std::time::Duration;
//!
//! # async fn example() -> certflow_client::Result<()> {
//! let config = ConnectionConfig::builder()
//!     .base_url("https://api.certflow.example.com")?
//!     .api_key("a1b2c3")
//!     .build()?;
//! let conn = CloudConnection::new(config)?;
//!
//! let poller = IssuancePoller::new(
//!     PollerConfig::builder()
//!         .poll_interval(Duration::from_secs(5))
//!         .timeout(Duration::from_secs(300))
//!         .build(),
//! );
//!
//! let request = CertificateRequest::new(std::fs::read_to_string("device.csr.pem")?);
//! let cert = poller.request_and_poll(&conn, &request, "Default").await?;
//! println!("final status: {}", cert.status);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::types::{Certificate, CertificateRequest};

/// Configuration for the issuance poller.
#[derive(Clone)]
pub struct PollerConfig {
    /// Fixed delay between status queries.
    pub poll_interval: Duration,

    /// Wall-clock deadline for the whole poll. `None` disables it.
    pub timeout: Option<Duration>,

    /// Maximum number of status queries. `None` disables it.
    pub max_attempts: Option<usize>,

    /// Optional observer notified of polling events.
    pub observer: Option<Arc<dyn PollObserver>>,
}

impl PollerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PollerConfigBuilder {
        PollerConfigBuilder::default()
    }

    /// Create a default configuration.
    ///
    /// Defaults:
    /// - Poll interval: 10 seconds (the server-recommended cadence)
    /// - Timeout: 10 minutes
    /// - Max attempts: unbounded
    pub fn default_config() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            timeout: Some(Duration::from_secs(600)),
            max_attempts: None,
            observer: None,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Builder for [`PollerConfig`].
#[derive(Default)]
pub struct PollerConfigBuilder {
    poll_interval: Option<Duration>,
    timeout: Option<Option<Duration>>,
    max_attempts: Option<usize>,
    observer: Option<Arc<dyn PollObserver>>,
}

impl PollerConfigBuilder {
    /// Set the delay between status queries.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the wall-clock deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Disable the wall-clock deadline.
    ///
    /// Only sensible together with [`max_attempts`](Self::max_attempts);
    /// a poller with neither bound can block forever.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = Some(None);
        self
    }

    /// Set the maximum number of status queries.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the polling event observer.
    pub fn observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PollerConfig {
        let default = PollerConfig::default_config();
        PollerConfig {
            poll_interval: self.poll_interval.unwrap_or(default.poll_interval),
            timeout: self.timeout.unwrap_or(default.timeout),
            max_attempts: self.max_attempts.or(default.max_attempts),
            observer: self.observer.or(default.observer),
        }
    }
}

/// Events emitted while polling for issuance.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A certificate request was submitted and polling begins.
    Submitted {
        /// Server-assigned request identifier.
        request_id: String,
    },

    /// A status query completed.
    Tick {
        /// Request identifier being polled.
        request_id: String,
        /// Attempt number (1-based).
        attempt: usize,
        /// Status reported by the server.
        status: crate::CertStatus,
    },

    /// Polling reached a terminal status.
    Terminal {
        /// The final certificate record.
        certificate: Box<Certificate>,
    },

    /// Polling gave up without reaching a terminal status.
    TimedOut {
        /// Number of status queries performed.
        attempts: usize,
        /// Wall-clock time spent.
        elapsed: Duration,
    },
}

/// Observer for polling events.
///
/// Injected per poller rather than configured globally, so concurrent
/// issuance flows can report to different sinks.
pub trait PollObserver: Send + Sync {
    /// Handle a polling event.
    fn on_event(&self, event: &PollEvent);
}

/// The issuance polling state machine.
///
/// Stateless between ticks: each tick issues exactly one status query
/// and keeps nothing but the attempt counter. Cancellation is
/// cooperative — drop the future and no further queries are made.
pub struct IssuancePoller {
    config: PollerConfig,
}

impl IssuancePoller {
    /// Create a poller with the given configuration.
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Create a poller with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(PollerConfig::default_config())
    }

    /// Poll a submitted request until its status leaves the in-progress
    /// set, then return the certificate record.
    ///
    /// # Errors
    ///
    /// - [`Error::Poll`] when a status query fails at the transport
    ///   level; the request itself may still be healthy, and the caller
    ///   may call `poll` again to resume.
    /// - [`Error::Timeout`] when the deadline or attempt bound is
    ///   reached first.
    pub async fn poll(&self, conn: &dyn Connection, request_id: &str) -> Result<Certificate> {
        let started = Instant::now();
        let mut attempts = 0usize;

        loop {
            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return self.give_up(request_id, attempts, started.elapsed());
                }
            }
            if let Some(deadline) = self.config.timeout {
                if started.elapsed() >= deadline {
                    return self.give_up(request_id, attempts, started.elapsed());
                }
            }

            sleep(self.config.poll_interval).await;
            attempts += 1;

            debug!(request_id, attempt = attempts, "checking certificate status");
            let certificate = conn
                .cert_status(request_id)
                .await
                .map_err(|e| Error::poll(request_id, e))?;

            self.emit(&PollEvent::Tick {
                request_id: request_id.to_string(),
                attempt: attempts,
                status: certificate.status.clone(),
            });

            if certificate.status.is_terminal() {
                info!(request_id, status = %certificate.status, "issuance polling finished");
                self.emit(&PollEvent::Terminal {
                    certificate: Box::new(certificate.clone()),
                });
                return Ok(certificate);
            }

            debug!(request_id, status = %certificate.status, "still in progress");
        }
    }

    /// Submit a certificate request, then poll it to completion.
    pub async fn request_and_poll(
        &self,
        conn: &dyn Connection,
        request: &CertificateRequest,
        zone_tag: &str,
    ) -> Result<Certificate> {
        let request_id = conn.request_certificate(request, zone_tag).await?;
        self.emit(&PollEvent::Submitted {
            request_id: request_id.clone(),
        });
        self.poll(conn, &request_id).await
    }

    fn give_up(
        &self,
        request_id: &str,
        attempts: usize,
        elapsed: Duration,
    ) -> Result<Certificate> {
        warn!(request_id, attempts, ?elapsed, "issuance polling timed out");
        self.emit(&PollEvent::TimedOut { attempts, elapsed });
        Err(Error::timeout(attempts, elapsed))
    }

    fn emit(&self, event: &PollEvent) {
        if let Some(ref observer) = self.config.observer {
            observer.on_event(event);
        }
    }
}
