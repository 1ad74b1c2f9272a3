// lib/crates/polis-common/src/auth.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Credential scheme used by a registry connection or a model connection.
///
/// Registry connections use `None`, `Basic` and `Token`; model connections use
/// the provider schemes. Credential values are never stored, only the names of
/// the environment variables that hold them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    Basic,
    Token,
    ApiKey,
    AwsCredentials,
    GcpServiceAccount,
    AzureApiKey,
}

impl AuthMethod {
    /// Every method, in display order.
    pub const ALL: [AuthMethod; 7] = [
        AuthMethod::None,
        AuthMethod::Basic,
        AuthMethod::Token,
        AuthMethod::ApiKey,
        AuthMethod::AwsCredentials,
        AuthMethod::GcpServiceAccount,
        AuthMethod::AzureApiKey,
    ];

    /// Methods a registry connection may use.
    pub const REGISTRY: [AuthMethod; 3] = [AuthMethod::None, AuthMethod::Basic, AuthMethod::Token];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::Basic => "basic",
            AuthMethod::Token => "token",
            AuthMethod::ApiKey => "api_key",
            AuthMethod::AwsCredentials => "aws_credentials",
            AuthMethod::GcpServiceAccount => "gcp_service_account",
            AuthMethod::AzureApiKey => "azure_api_key",
        }
    }

    /// Returns `true` for the methods a registry connection accepts.
    #[must_use]
    pub fn is_registry_method(self) -> bool {
        Self::REGISTRY.contains(&self)
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown auth method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAuthMethod(pub String);

impl fmt::Display for UnknownAuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown auth method '{}'", self.0)
    }
}

impl std::error::Error for UnknownAuthMethod {}

impl FromStr for AuthMethod {
    type Err = UnknownAuthMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownAuthMethod(s.to_string()))
    }
}
