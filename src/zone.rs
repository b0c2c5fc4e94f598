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

//! Zones and certificate policies.
//!
//! A zone is a server-side scoping group under which certificates are
//! issued. Each zone references a set of policies; identity-typed policies
//! supply default subject fields, use-typed policies supply regex
//! constraints and key requirements. [`ZoneConfig::assemble`] merges both
//! kinds into the resolved configuration used to validate and auto-fill
//! request fields before submission.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A zone snapshot as fetched from the server.
///
/// Immutable; refetched on every resolution rather than cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    /// Server-assigned zone identifier.
    pub id: String,
    /// Owning organization identifier.
    pub company_id: String,
    /// Human-readable tag used to address the zone.
    pub tag: String,
    /// Zone type discriminator.
    pub zone_type: String,
    /// Identifiers of the policies attached to this zone.
    pub certificate_policy_ids: Vec<String>,
    /// Default identity policy, if any.
    #[serde(default)]
    pub default_certificate_identity_policy_id: Option<String>,
    /// Default use policy, if any.
    #[serde(default)]
    pub default_certificate_use_policy_id: Option<String>,
    /// Whether the server created this zone automatically.
    pub system_generated: bool,
    /// Creation timestamp, ISO-8601.
    pub creation_date: DateTime<Utc>,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.tag, self.id)
    }
}

/// Discriminator for the two policy kinds attached to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyType {
    /// Supplies default subject field values and their lock flags.
    #[serde(rename = "CERTIFICATE_IDENTITY")]
    CertificateIdentity,
    /// Supplies regex constraints and allowed key configurations.
    #[serde(rename = "CERTIFICATE_USE")]
    CertificateUse,
}

/// Public key algorithm accepted by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// RSA keys; sizes listed in `key_lengths`.
    #[serde(rename = "RSA")]
    Rsa,
    /// Elliptic curve keys; curve sizes listed in `key_lengths`.
    #[serde(rename = "EC")]
    Ec,
}

/// One key algorithm/size combination a policy permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedKeyConfiguration {
    /// Key algorithm.
    pub key_type: KeyType,
    /// Permitted sizes (bits) or curve sizes for the algorithm.
    pub key_lengths: Vec<u32>,
}

/// A subject field default paired with its lock flag.
///
/// When `locked` is set the server will override whatever the CSR carries,
/// so callers should treat the value as mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CertField {
    /// Default value for the field.
    pub value: String,
    /// Whether the server enforces the value.
    pub locked: bool,
}

impl CertField {
    /// Create a field default.
    pub fn new(value: impl Into<String>, locked: bool) -> Self {
        Self {
            value: value.into(),
            locked,
        }
    }
}

/// A certificate policy attached to a zone.
///
/// Identity policies populate the default-subject fields; use policies
/// populate the constraint fields. A single record carries both field
/// groups so the wire shape stays uniform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Server-assigned policy identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Policy kind.
    pub certificate_policy_type: PolicyType,

    // Constraint fields (use policies).
    /// Allowed common-name patterns.
    #[serde(default, rename = "subjectCNRegexes")]
    pub subject_cn_regexes: Vec<String>,
    /// Allowed organization patterns.
    #[serde(default, rename = "subjectORegexes")]
    pub subject_o_regexes: Vec<String>,
    /// Allowed organizational-unit patterns.
    #[serde(default, rename = "subjectOURegexes")]
    pub subject_ou_regexes: Vec<String>,
    /// Allowed state/province patterns.
    #[serde(default, rename = "subjectSTRegexes")]
    pub subject_st_regexes: Vec<String>,
    /// Allowed locality patterns.
    #[serde(default, rename = "subjectLRegexes")]
    pub subject_l_regexes: Vec<String>,
    /// Allowed country patterns.
    #[serde(default, rename = "subjectCRegexes")]
    pub subject_c_regexes: Vec<String>,
    /// Allowed subject-alternative-name patterns.
    #[serde(default, rename = "sanRegexes")]
    pub san_regexes: Vec<String>,
    /// Key algorithm/size combinations this policy permits.
    #[serde(default)]
    pub key_types: Vec<AllowedKeyConfiguration>,
    /// Whether re-submitting a previously used key pair is allowed.
    #[serde(default)]
    pub key_reuse: bool,

    // Default subject fields (identity policies).
    /// Default organization.
    #[serde(default)]
    pub organization: Option<CertField>,
    /// Default organizational units.
    #[serde(default)]
    pub organizational_unit: Vec<String>,
    /// Default country.
    #[serde(default)]
    pub country: Option<CertField>,
    /// Default state/province.
    #[serde(default)]
    pub province: Option<CertField>,
    /// Default locality.
    #[serde(default)]
    pub locality: Option<CertField>,
}

/// Resolved zone configuration, merged from the zone's policies.
///
/// Computed on demand by
/// [`Connection::read_zone_config`](crate::Connection::read_zone_config);
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneConfig {
    /// Default organization, from the identity policy.
    pub organization: Option<CertField>,
    /// Default organizational units.
    pub organizational_unit: Vec<String>,
    /// Default country.
    pub country: Option<CertField>,
    /// Default state/province.
    pub province: Option<CertField>,
    /// Default locality.
    pub locality: Option<CertField>,
    /// Allowed common-name patterns, from the use policy.
    pub subject_cn_regexes: Vec<String>,
    /// Allowed organization patterns.
    pub subject_o_regexes: Vec<String>,
    /// Allowed organizational-unit patterns.
    pub subject_ou_regexes: Vec<String>,
    /// Allowed state/province patterns.
    pub subject_st_regexes: Vec<String>,
    /// Allowed locality patterns.
    pub subject_l_regexes: Vec<String>,
    /// Allowed country patterns.
    pub subject_c_regexes: Vec<String>,
    /// Allowed subject-alternative-name patterns.
    pub san_regexes: Vec<String>,
    /// Merged key algorithm/size allowances.
    pub allowed_key_configurations: Vec<AllowedKeyConfiguration>,
    /// Whether key reuse is allowed in this zone.
    pub key_reuse: bool,
}

impl ZoneConfig {
    /// Merge a zone's policies into a resolved configuration.
    ///
    /// Identity policies supply the default subject fields and lock flags;
    /// use policies supply regex constraints, key configurations, and the
    /// key-reuse flag. Later policies of the same kind extend the
    /// constraint lists and override the defaults.
    pub fn assemble(policies: &[Policy]) -> Self {
        let mut config = Self::default();

        for policy in policies {
            match policy.certificate_policy_type {
                PolicyType::CertificateIdentity => {
                    if policy.organization.is_some() {
                        config.organization = policy.organization.clone();
                    }
                    if !policy.organizational_unit.is_empty() {
                        config.organizational_unit = policy.organizational_unit.clone();
                    }
                    if policy.country.is_some() {
                        config.country = policy.country.clone();
                    }
                    if policy.province.is_some() {
                        config.province = policy.province.clone();
                    }
                    if policy.locality.is_some() {
                        config.locality = policy.locality.clone();
                    }
                }
                PolicyType::CertificateUse => {
                    config
                        .subject_cn_regexes
                        .extend(policy.subject_cn_regexes.iter().cloned());
                    config
                        .subject_o_regexes
                        .extend(policy.subject_o_regexes.iter().cloned());
                    config
                        .subject_ou_regexes
                        .extend(policy.subject_ou_regexes.iter().cloned());
                    config
                        .subject_st_regexes
                        .extend(policy.subject_st_regexes.iter().cloned());
                    config
                        .subject_l_regexes
                        .extend(policy.subject_l_regexes.iter().cloned());
                    config
                        .subject_c_regexes
                        .extend(policy.subject_c_regexes.iter().cloned());
                    config
                        .san_regexes
                        .extend(policy.san_regexes.iter().cloned());
                    config
                        .allowed_key_configurations
                        .extend(policy.key_types.iter().cloned());
                    config.key_reuse = config.key_reuse || policy.key_reuse;
                }
            }
        }

        config
    }

    /// Check a common name against the zone's CN constraints.
    ///
    /// An empty constraint list permits everything. Fails on a malformed
    /// policy regex, which is a server-side configuration problem the
    /// caller should see.
    pub fn validate_common_name(&self, common_name: &str) -> Result<bool> {
        Self::matches_any(&self.subject_cn_regexes, common_name)
    }

    /// Check a subject-alternative-name against the zone's SAN constraints.
    pub fn validate_san(&self, san: &str) -> Result<bool> {
        Self::matches_any(&self.san_regexes, san)
    }

    /// Check whether the zone permits a key algorithm/size combination.
    pub fn allows_key(&self, key_type: KeyType, key_length: u32) -> bool {
        if self.allowed_key_configurations.is_empty() {
            return true;
        }
        self.allowed_key_configurations
            .iter()
            .any(|kc| kc.key_type == key_type && kc.key_lengths.contains(&key_length))
    }

    fn matches_any(patterns: &[String], value: &str) -> Result<bool> {
        if patterns.is_empty() {
            return Ok(true);
        }
        for pattern in patterns {
            let re = Regex::new(pattern)
                .map_err(|e| Error::field(format!("invalid policy regex '{}': {}", pattern, e)))?;
            if re.is_match(value) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
