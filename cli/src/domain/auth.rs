//! Auth method registry: which credential fields each auth method needs.
//!
//! Consulted both by editors (to render fields) and by validation (to decide
//! which fields are mandatory). Pure data, no I/O.

use polis_common::AuthMethod;
use serde::Serialize;

/// How a credential field is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum InputKind {
    /// Free text.
    Text,
    /// An `http(s)://` URL.
    Url,
    /// One value from a fixed option set.
    Select(&'static [&'static str]),
    /// The name of a declared environment variable.
    EnvVar,
}

/// One credential field of an auth method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialField {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: InputKind,
    pub required: bool,
}

impl CredentialField {
    const fn env(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: InputKind::EnvVar,
            required: true,
        }
    }

    const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    /// Returns `true` if `value` is acceptable for a select field. Non-select
    /// fields accept anything.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self.kind {
            InputKind::Select(options) => options.contains(&value),
            InputKind::Url => value.starts_with("http://") || value.starts_with("https://"),
            InputKind::Text | InputKind::EnvVar => true,
        }
    }
}

pub const AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-northeast-1",
    "ap-southeast-2",
];

pub const GCP_LOCATIONS: &[&str] = &["us-central1", "us-east5", "europe-west1", "asia-southeast1"];

const BASIC_FIELDS: &[CredentialField] = &[
    CredentialField::env("username_env", "Username variable"),
    CredentialField::env("password_env", "Password variable"),
];

const TOKEN_FIELDS: &[CredentialField] = &[CredentialField::env("token_env", "Token variable")];

const API_KEY_FIELDS: &[CredentialField] =
    &[CredentialField::env("api_key_env", "API key variable")];

const AWS_FIELDS: &[CredentialField] = &[
    CredentialField::env("access_key_id_env", "Access key ID variable"),
    CredentialField::env("secret_access_key_env", "Secret access key variable"),
    CredentialField::env("session_token_env", "Session token variable").optional(),
    CredentialField {
        name: "region",
        label: "Region",
        kind: InputKind::Select(AWS_REGIONS),
        required: true,
    },
];

const GCP_FIELDS: &[CredentialField] = &[
    CredentialField::env("credentials_env", "Service account JSON variable"),
    CredentialField {
        name: "project_id",
        label: "Project ID",
        kind: InputKind::Text,
        required: true,
    },
    CredentialField {
        name: "location",
        label: "Location",
        kind: InputKind::Select(GCP_LOCATIONS),
        required: true,
    },
];

const AZURE_FIELDS: &[CredentialField] = &[
    CredentialField::env("api_key_env", "API key variable"),
    CredentialField {
        name: "deployment",
        label: "Deployment name",
        kind: InputKind::Text,
        required: true,
    },
    CredentialField {
        name: "api_version",
        label: "API version",
        kind: InputKind::Text,
        required: false,
    },
];

/// Ordered credential fields required by `method`.
#[must_use]
pub fn fields_for(method: AuthMethod) -> &'static [CredentialField] {
    match method {
        AuthMethod::None => &[],
        AuthMethod::Basic => BASIC_FIELDS,
        AuthMethod::Token => TOKEN_FIELDS,
        AuthMethod::ApiKey => API_KEY_FIELDS,
        AuthMethod::AwsCredentials => AWS_FIELDS,
        AuthMethod::GcpServiceAccount => GCP_FIELDS,
        AuthMethod::AzureApiKey => AZURE_FIELDS,
    }
}

/// Looks up a single field of `method` by name.
#[must_use]
pub fn field(method: AuthMethod, name: &str) -> Option<&'static CredentialField> {
    fields_for(method).iter().find(|f| f.name == name)
}
