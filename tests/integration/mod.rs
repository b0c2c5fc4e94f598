//! Integration test utilities and helpers
//!
//! This module provides common test infrastructure: a mock certificate
//! service built on wiremock, plus JSON and PEM fixtures shared by the
//! backend and poller tests.

use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod onprem_test;
mod poller_test;

/// Cloud API paths
pub const PATH_PING: &str = "/v1/ping";
pub const PATH_USER_ACCOUNTS: &str = "/v1/useraccounts";
pub const PATH_CERT_REQUESTS: &str = "/v1/certificaterequests";

/// On-premises gateway paths
pub const PATH_AUTHORIZE: &str = "/sdk/authorize";
pub const PATH_ONPREM_REQUEST: &str = "/sdk/certificates/request";
pub const PATH_ONPREM_STATUS: &str = "/sdk/certificates/checkstatus";
pub const PATH_ONPREM_RETRIEVE: &str = "/sdk/certificates/retrieve";
pub const PATH_ONPREM_REVOKE: &str = "/sdk/certificates/revoke";

/// Two-block PEM body: an end-entity certificate and one chain element.
pub const PEM_WITH_CHAIN: &str = "-----BEGIN CERTIFICATE-----\n\
MIIBLeafCertBody\n\
-----END CERTIFICATE-----\n\
-----BEGIN CERTIFICATE-----\n\
MIIBChainCertBody\n\
-----END CERTIFICATE-----\n";

/// Mock certificate service for integration tests
pub struct MockCaServer {
    server: MockServer,
}

impl MockCaServer {
    /// Start a fresh mock server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Base URL of the mock server
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Access the inner server for custom mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    // =====================================================================
    // Cloud service mocks
    // =====================================================================

    /// Mock a live ping endpoint
    pub async fn mock_ping_ok(&self) {
        Mock::given(method("GET"))
            .and(path(PATH_PING))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("OK")
                    .insert_header("Content-Type", "text/plain"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock the account endpoint used for API-key validation
    pub async fn mock_user_account(&self) {
        Mock::given(method("GET"))
            .and(path(PATH_USER_ACCOUNTS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "robot@example.com",
                "companyId": "company-9",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a zone lookup
    pub async fn mock_zone(&self, tag: &str, zone: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/zones/tag/{}", tag)))
            .respond_with(ResponseTemplate::new(200).set_body_json(zone))
            .mount(&self.server)
            .await;
    }

    /// Mock a policy lookup
    pub async fn mock_policy(&self, id: &str, policy: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/certificatepolicies/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(policy))
            .mount(&self.server)
            .await;
    }

    /// Mock a successful certificate submission
    pub async fn mock_request_created(&self, request_id: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_CERT_REQUESTS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "certificateRequests": [{ "id": request_id, "status": "REQUESTED" }],
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a status poll answering `status` indefinitely
    pub async fn mock_status(&self, request_id: &str, status: &str) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", PATH_CERT_REQUESTS, request_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": request_id,
                "status": status,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a status poll answering `status` for the next `n` queries only
    pub async fn mock_status_n(&self, request_id: &str, status: &str, n: u64) {
        Mock::given(method("GET"))
            .and(path(format!("{}/{}", PATH_CERT_REQUESTS, request_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": request_id,
                "status": status,
            })))
            .up_to_n_times(n)
            .mount(&self.server)
            .await;
    }

    /// Mock the issued-certificate download
    pub async fn mock_certificate_pem(&self, request_id: &str, pem: &str) {
        Mock::given(method("GET"))
            .and(path(format!(
                "{}/{}/certificate",
                PATH_CERT_REQUESTS, request_id
            )))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(pem)
                    .insert_header("Content-Type", "text/plain"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a lifecycle action endpoint (revoke/renew)
    pub async fn mock_lifecycle_action(&self, request_id: &str, action: &str) {
        Mock::given(method("POST"))
            .and(path(format!(
                "{}/{}/{}",
                PATH_CERT_REQUESTS, request_id, action
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&self.server)
            .await;
    }

    /// Mock an arbitrary error response on a path
    pub async fn mock_error(&self, http_method: &str, on_path: &str, status: u16, body: &str) {
        Mock::given(method(http_method))
            .and(path(on_path))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_string(body)
                    .insert_header("Content-Type", "text/plain"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock an accepted status with a content type the client cannot handle
    pub async fn mock_unexpected_content_type(&self, http_method: &str, on_path: &str) {
        Mock::given(method(http_method))
            .and(path(on_path))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<response/>", "application/xml"),
            )
            .mount(&self.server)
            .await;
    }

    // =====================================================================
    // On-premises gateway mocks
    // =====================================================================

    /// Mock the credential exchange
    pub async fn mock_authorize(&self, session_key: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_AUTHORIZE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "APIKey": session_key,
                "ValidUntil": "2026-01-01T00:00:00Z",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock an on-premises certificate submission
    pub async fn mock_onprem_request(&self, certificate_dn: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_ONPREM_REQUEST))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "CertificateDN": certificate_dn,
                "Guid": "{f1e2d3c4}",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the on-premises status check
    pub async fn mock_onprem_status(&self, status: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_ONPREM_STATUS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Guid": "{f1e2d3c4}",
                "Status": status,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock an on-premises retrieve that is still pending (HTTP 202)
    pub async fn mock_onprem_retrieve_pending(&self) {
        Mock::given(method("POST"))
            .and(path(PATH_ONPREM_RETRIEVE))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "Status": "Pending",
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a completed on-premises retrieve
    pub async fn mock_onprem_retrieve(&self, pem: &str) {
        Mock::given(method("POST"))
            .and(path(PATH_ONPREM_RETRIEVE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "CertificateData": pem,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock the on-premises revoke endpoint
    pub async fn mock_onprem_revoke(&self) {
        Mock::given(method("POST"))
            .and(path(PATH_ONPREM_REVOKE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Success": true,
            })))
            .mount(&self.server)
            .await;
    }
}

/// Test fixture helpers
pub mod fixtures {
    use super::*;

    /// A zone referencing one identity and one use policy
    pub fn zone_json(tag: &str) -> Value {
        json!({
            "id": "zone-1",
            "companyId": "company-9",
            "tag": tag,
            "zoneType": "OTHER",
            "certificatePolicyIds": ["pol-ident", "pol-use"],
            "defaultCertificateIdentityPolicyId": "pol-ident",
            "defaultCertificateUsePolicyId": "pol-use",
            "systemGenerated": false,
            "creationDate": "2019-03-01T12:00:00Z",
        })
    }

    /// An identity policy with locked organization defaults
    pub fn identity_policy_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Default Identity",
            "certificatePolicyType": "CERTIFICATE_IDENTITY",
            "organization": { "value": "Example Corp", "locked": true },
            "organizationalUnit": ["Platform"],
            "country": { "value": "US", "locked": false },
            "province": { "value": "Utah", "locked": false },
            "locality": { "value": "Salt Lake City", "locked": false },
        })
    }

    /// A use policy constraining CNs to *.example.com with RSA-2048/4096
    pub fn use_policy_json(id: &str) -> Value {
        json!({
            "id": id,
            "name": "Default Use",
            "certificatePolicyType": "CERTIFICATE_USE",
            "subjectCNRegexes": [r".*\.example\.com"],
            "sanRegexes": [r".*\.example\.com"],
            "subjectCRegexes": ["US"],
            "keyTypes": [{ "keyType": "RSA", "keyLengths": [2048, 4096] }],
            "keyReuse": false,
        })
    }
}
