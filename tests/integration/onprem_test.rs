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

//! Integration tests for the on-premises backend

use crate::integration::{MockCaServer, PEM_WITH_CHAIN};
use certflow_client::{
    CertStatus, CertificateRequest, Connection, ConnectionConfig, Error, OnPremConnection,
};

const FOLDER: &str = r"\VED\Policy\Devices";
const DEVICE_DN: &str = r"\VED\Policy\Devices\device-01";

fn onprem_conn(mock: &MockCaServer) -> OnPremConnection {
    let config = ConnectionConfig::builder()
        .base_url(mock.url())
        .expect("valid URL")
        .credentials("admin", "hunter2")
        .build()
        .expect("valid config");

    OnPremConnection::new(config).expect("client creation failed")
}

#[tokio::test]
async fn test_unauthenticated_call_is_rejected_locally() {
    let mock = MockCaServer::start().await;

    let conn = onprem_conn(&mock);
    let err = conn.cert_status(DEVICE_DN).await.unwrap_err();

    assert!(matches!(err, Error::AuthenticationRequired(_)));
}

#[tokio::test]
async fn test_authenticate_then_submit_and_poll_status() {
    let mock = MockCaServer::start().await;
    mock.mock_authorize("session-1").await;
    mock.mock_onprem_request(DEVICE_DN).await;
    mock.mock_onprem_status("Pending").await;

    let conn = onprem_conn(&mock);
    conn.authenticate().await.expect("authenticate failed");

    let request = CertificateRequest::new("-----BEGIN CERTIFICATE REQUEST-----\n...")
        .with_friendly_name("device-01");
    let request_id = conn
        .request_certificate(&request, FOLDER)
        .await
        .expect("submission failed");
    assert_eq!(request_id, DEVICE_DN);

    let record = conn.cert_status(&request_id).await.expect("status failed");
    assert_eq!(record.id, DEVICE_DN);
    assert_eq!(record.status, CertStatus::Pending);
}

#[tokio::test]
async fn test_reauthenticating_is_safe() {
    let mock = MockCaServer::start().await;
    mock.mock_authorize("session-1").await;

    let conn = onprem_conn(&mock);
    conn.authenticate().await.expect("first authenticate");
    conn.authenticate().await.expect("second authenticate");
}

#[tokio::test]
async fn test_retrieve_pending_uses_202_sentinel() {
    let mock = MockCaServer::start().await;
    mock.mock_authorize("session-1").await;
    mock.mock_onprem_retrieve_pending().await;

    let conn = onprem_conn(&mock);
    conn.authenticate().await.expect("authenticate failed");

    let outcome = conn
        .retrieve_certificate(DEVICE_DN)
        .await
        .expect("retrieve failed");
    assert!(outcome.is_pending());
}

#[tokio::test]
async fn test_retrieve_issued_certificate() {
    let mock = MockCaServer::start().await;
    mock.mock_authorize("session-1").await;
    mock.mock_onprem_retrieve(PEM_WITH_CHAIN).await;

    let conn = onprem_conn(&mock);
    conn.authenticate().await.expect("authenticate failed");

    let cert = conn
        .retrieve_certificate(DEVICE_DN)
        .await
        .expect("retrieve failed")
        .certificate()
        .expect("should be ready");

    assert_eq!(cert.status, CertStatus::Issued);
    assert!(cert.certificate.expect("pem").contains("MIIBLeafCertBody"));
    assert_eq!(cert.chain.len(), 1);
}

#[tokio::test]
async fn test_revoke() {
    let mock = MockCaServer::start().await;
    mock.mock_authorize("session-1").await;
    mock.mock_onprem_revoke().await;

    let conn = onprem_conn(&mock);
    conn.authenticate().await.expect("authenticate failed");
    conn.revoke_certificate(DEVICE_DN).await.expect("revoke failed");
}

#[tokio::test]
async fn test_register_is_not_supported() {
    let mock = MockCaServer::start().await;

    let conn = onprem_conn(&mock);
    let err = conn.register("new@example.com").await.unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));
}
