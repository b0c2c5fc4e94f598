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

//! End-to-end issuance polling against the mock cloud service

use std::time::Duration;

use crate::integration::{fixtures, MockCaServer};
use certflow_client::{
    CertStatus, CertificateRequest, CloudConnection, ConnectionConfig, Error, IssuancePoller,
    PollerConfig,
};

fn cloud_conn(mock: &MockCaServer) -> CloudConnection {
    let config = ConnectionConfig::builder()
        .base_url(mock.url())
        .expect("valid URL")
        .api_key("test-key")
        .build()
        .expect("valid config");

    CloudConnection::new(config).expect("client creation failed")
}

fn fast_poller() -> IssuancePoller {
    IssuancePoller::new(
        PollerConfig::builder()
            .poll_interval(Duration::from_millis(1))
            .timeout(Duration::from_secs(5))
            .build(),
    )
}

#[tokio::test]
async fn test_submit_then_poll_to_issuance() {
    let mock = MockCaServer::start().await;
    mock.mock_zone("Default", fixtures::zone_json("Default")).await;
    mock.mock_request_created("abc123").await;

    // First two polls answer PENDING, every later one ISSUED.
    mock.mock_status_n("abc123", "PENDING", 2).await;
    mock.mock_status("abc123", "ISSUED").await;

    let conn = cloud_conn(&mock);
    let request = CertificateRequest::new("-----BEGIN CERTIFICATE REQUEST-----\n...");

    let cert = fast_poller()
        .request_and_poll(&conn, &request, "Default")
        .await
        .expect("issuance failed");

    assert_eq!(cert.id, "abc123");
    assert_eq!(cert.status, CertStatus::Issued);
}

#[tokio::test]
async fn test_polling_stops_on_rejection() {
    let mock = MockCaServer::start().await;
    mock.mock_status_n("abc123", "REQUESTED", 1).await;
    mock.mock_status("abc123", "REJECTED").await;

    let conn = cloud_conn(&mock);
    let cert = fast_poller().poll(&conn, "abc123").await.expect("poll failed");

    assert_eq!(cert.status, CertStatus::Rejected);
}

#[tokio::test]
async fn test_never_terminal_times_out() {
    let mock = MockCaServer::start().await;
    mock.mock_status("abc123", "PENDING").await;

    let poller = IssuancePoller::new(
        PollerConfig::builder()
            .poll_interval(Duration::from_millis(1))
            .max_attempts(5)
            .build(),
    );

    let conn = cloud_conn(&mock);
    let err = poller.poll(&conn, "abc123").await.unwrap_err();

    assert!(matches!(err, Error::Timeout { attempts: 5, .. }));
}

#[tokio::test]
async fn test_unknown_request_fails_as_poll_error() {
    // No status mock mounted: the server answers 404 on every tick.
    let mock = MockCaServer::start().await;

    let conn = cloud_conn(&mock);
    let err = fast_poller().poll(&conn, "ghost").await.unwrap_err();

    match err {
        Error::Poll { request_id, source } => {
            assert_eq!(request_id, "ghost");
            assert!(matches!(*source, Error::NotFound(_)));
        }
        other => panic!("wrong error type: {:?}", other),
    }
}
