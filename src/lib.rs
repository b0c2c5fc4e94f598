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

//! # certflow-client
//!
//! An async Rust client for CertFlow certificate issuance services.
//!
//! CertFlow issues X.509 certificates asynchronously: a client submits a
//! CSR into a zone, receives a request identifier, and polls until the
//! request reaches a terminal status. This library models that flow with
//! two interchangeable backends behind one [`Connection`] trait:
//!
//! - [`CloudConnection`] — the hosted service: API-key authentication,
//!   organization/zone scoped;
//! - [`OnPremConnection`] — a self-hosted gateway: credential/session
//!   authentication, folder/zone scoped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use certflow_client::{
//!     CertificateRequest, CloudConnection, Connection, ConnectionConfig, IssuancePoller,
//! };
//!
//! #[tokio::main]
//! async fn main() -> certflow_client::Result<()> {
//!     let config = ConnectionConfig::builder()
//!         .base_url("https://api.certflow.example.com")?
//!         .api_key(std::env::var("CERTFLOW_API_KEY").expect("api key"))
//!         .build()?;
//!
//!     let conn = CloudConnection::new(config)?;
//!     conn.authenticate().await?;
//!
//!     // CSR generation is the caller's business; the client only moves
//!     // PEM bytes.
//!     let csr_pem = std::fs::read_to_string("device.csr.pem")?;
//!     let request = CertificateRequest::new(csr_pem).with_friendly_name("device-01");
//!
//!     let poller = IssuancePoller::with_defaults();
//!     let cert = poller.request_and_poll(&conn, &request, "Default").await?;
//!     println!("{}: {}", cert.id, cert.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Zone policies
//!
//! Zones carry certificate policies. [`Connection::read_zone_config`]
//! resolves them into a [`ZoneConfig`] of default subject fields and
//! regex constraints, which callers can use to validate or auto-fill
//! request fields before submission:
//!
//! ```no_run
//! # async fn example(conn: &dyn certflow_client::Connection) -> certflow_client::Result<()> {
//! let zone_config = conn.read_zone_config("Default").await?;
//! assert!(zone_config.validate_common_name("device.example.com")?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design notes
//!
//! - Responses pass through one classifier ([`classify`]) that accepts
//!   exactly the statuses `200` and `202` and the content types
//!   `application/json*`, `text/plain`, and `text/html`; everything else
//!   is a typed error carrying the status, URL, and raw body.
//! - The poller never retries a failed tick on its own and never treats
//!   a transport failure as a certificate rejection; see
//!   [`Error::Poll`].
//! - Certificate submission is never retried internally — a retry on an
//!   ambiguous failure could create a duplicate pending request.
//! - The library emits [`tracing`] events and installs no subscriber;
//!   logging configuration belongs to the application.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cloud;
pub mod config;
pub mod connection;
pub mod error;
pub mod onprem;
pub mod poller;
pub mod response;
pub mod types;
pub mod zone;

// Re-export main types at crate root for convenience
pub use cloud::CloudConnection;
pub use config::{Auth, ConnectionConfig, ConnectionConfigBuilder};
pub use connection::Connection;
pub use error::{Error, Result};
pub use onprem::OnPremConnection;
pub use poller::{IssuancePoller, PollEvent, PollObserver, PollerConfig, PollerConfigBuilder};
pub use response::{classify, ClassifiedResponse, Payload};
pub use types::{CertStatus, Certificate, CertificateRequest, ChainOption, Retrieval};
pub use zone::{
    AllowedKeyConfiguration, CertField, KeyType, Policy, PolicyType, Zone, ZoneConfig,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("certflow-client/", env!("CARGO_PKG_VERSION"));
