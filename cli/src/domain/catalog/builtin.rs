//! Builtin catalog tables.

use polis_common::AuthMethod;

use super::{HostingProvider, HostingProviderSupport, ModelCategory, ModelDefinition};

const HOSTING_PROVIDERS: &[(&str, &str)] = &[
    ("anthropic", "Anthropic"),
    ("openai", "OpenAI"),
    ("azure_openai", "Azure OpenAI"),
    ("aws_bedrock", "AWS Bedrock"),
    ("google_vertex", "Google Vertex AI"),
    ("google_ai_studio", "Google AI Studio"),
    ("groq", "Groq"),
    ("mistral", "Mistral AI"),
    ("together", "Together AI"),
];

/// Providers that are only reachable through a per-customer endpoint.
const ENDPOINT_PROVIDERS: &[&str] = &["azure_openai"];

pub(super) fn hosting_providers() -> Vec<HostingProvider> {
    HOSTING_PROVIDERS
        .iter()
        .map(|(id, name)| HostingProvider {
            id: (*id).to_string(),
            display_name: (*name).to_string(),
        })
        .collect()
}

fn auth_for(provider: &str) -> AuthMethod {
    match provider {
        "aws_bedrock" => AuthMethod::AwsCredentials,
        "google_vertex" => AuthMethod::GcpServiceAccount,
        "azure_openai" => AuthMethod::AzureApiKey,
        _ => AuthMethod::ApiKey,
    }
}

fn model(
    id: &str,
    display_name: &str,
    vendor: &str,
    category: ModelCategory,
    description: &str,
    providers: &[(&str, &str)],
) -> ModelDefinition {
    ModelDefinition {
        id: id.to_string(),
        display_name: display_name.to_string(),
        vendor: vendor.to_string(),
        category,
        description: description.to_string(),
        providers: providers
            .iter()
            .map(|(provider, provider_model_id)| HostingProviderSupport {
                provider: (*provider).to_string(),
                provider_model_id: (*provider_model_id).to_string(),
                auth_method: auth_for(provider),
                requires_endpoint: ENDPOINT_PROVIDERS.contains(provider),
            })
            .collect(),
    }
}

pub(super) fn models() -> Vec<ModelDefinition> {
    use ModelCategory::{Chat, Code, Embedding, Reasoning};

    vec![
        // Anthropic
        model(
            "claude-3-5-sonnet",
            "Claude 3.5 Sonnet",
            "Anthropic",
            Chat,
            "Balanced intelligence and speed for coding and agentic workflows",
            &[
                ("anthropic", "claude-3-5-sonnet-20241022"),
                ("aws_bedrock", "anthropic.claude-3-5-sonnet-20241022-v2:0"),
                ("google_vertex", "claude-3-5-sonnet-v2@20241022"),
            ],
        ),
        model(
            "claude-3-5-haiku",
            "Claude 3.5 Haiku",
            "Anthropic",
            Chat,
            "Fast, low-latency model for high-volume tasks",
            &[
                ("anthropic", "claude-3-5-haiku-20241022"),
                ("aws_bedrock", "anthropic.claude-3-5-haiku-20241022-v1:0"),
                ("google_vertex", "claude-3-5-haiku@20241022"),
            ],
        ),
        model(
            "claude-3-opus",
            "Claude 3 Opus",
            "Anthropic",
            Chat,
            "Most capable Claude 3 model for complex analysis",
            &[
                ("anthropic", "claude-3-opus-20240229"),
                ("aws_bedrock", "anthropic.claude-3-opus-20240229-v1:0"),
                ("google_vertex", "claude-3-opus@20240229"),
            ],
        ),
        // OpenAI
        model(
            "gpt-4o",
            "GPT-4o",
            "OpenAI",
            Chat,
            "Multimodal flagship model with text and vision input",
            &[("openai", "gpt-4o-2024-08-06"), ("azure_openai", "gpt-4o")],
        ),
        model(
            "gpt-4o-mini",
            "GPT-4o mini",
            "OpenAI",
            Chat,
            "Small, affordable multimodal model",
            &[("openai", "gpt-4o-mini-2024-07-18"), ("azure_openai", "gpt-4o-mini")],
        ),
        model(
            "o1",
            "o1",
            "OpenAI",
            Reasoning,
            "Reasoning model that thinks before answering",
            &[("openai", "o1-2024-12-17"), ("azure_openai", "o1")],
        ),
        model(
            "text-embedding-3-small",
            "Text Embedding 3 Small",
            "OpenAI",
            Embedding,
            "Compact embedding model for retrieval",
            &[
                ("openai", "text-embedding-3-small"),
                ("azure_openai", "text-embedding-3-small"),
            ],
        ),
        // Google
        model(
            "gemini-1-5-pro",
            "Gemini 1.5 Pro",
            "Google",
            Chat,
            "Long-context multimodal model",
            &[
                ("google_ai_studio", "gemini-1.5-pro"),
                ("google_vertex", "gemini-1.5-pro-002"),
            ],
        ),
        model(
            "gemini-1-5-flash",
            "Gemini 1.5 Flash",
            "Google",
            Chat,
            "Lightweight long-context model tuned for speed",
            &[
                ("google_ai_studio", "gemini-1.5-flash"),
                ("google_vertex", "gemini-1.5-flash-002"),
            ],
        ),
        // Meta
        model(
            "llama-3-1-70b",
            "Llama 3.1 70B",
            "Meta",
            Chat,
            "Open-weights instruction-tuned model",
            &[
                ("aws_bedrock", "meta.llama3-1-70b-instruct-v1:0"),
                ("groq", "llama-3.1-70b-versatile"),
                ("together", "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo"),
            ],
        ),
        model(
            "llama-3-1-405b",
            "Llama 3.1 405B",
            "Meta",
            Chat,
            "Largest open-weights Llama model",
            &[
                ("aws_bedrock", "meta.llama3-1-405b-instruct-v1:0"),
                ("together", "meta-llama/Meta-Llama-3.1-405B-Instruct-Turbo"),
            ],
        ),
        // Mistral
        model(
            "mistral-large",
            "Mistral Large",
            "Mistral",
            Chat,
            "Top-tier reasoning model from Mistral AI",
            &[
                ("mistral", "mistral-large-latest"),
                ("aws_bedrock", "mistral.mistral-large-2407-v1:0"),
            ],
        ),
        model(
            "codestral",
            "Codestral",
            "Mistral",
            Code,
            "Code generation model covering 80+ languages",
            &[("mistral", "codestral-latest")],
        ),
    ]
}
