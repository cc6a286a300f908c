// crates/courtside-ai/src/http.rs
// ============================================================================
// Module: HTTP Text Provider
// Description: Provider calling an external chat-completion endpoint.
// Purpose: Bounded, fail-closed access to the hosted model.
// Dependencies: courtside-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! The HTTP provider issues bounded POST requests to a chat-style endpoint
//! with per-request timeouts. Network and 5xx failures are transient; 4xx
//! and malformed bodies are permanent. Retry policy lives in the gateway,
//! not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use courtside_core::Generation;
use courtside_core::GenerationError;
use courtside_core::Purpose;
use courtside_core::TextGenerator;
use courtside_core::UsageRecord;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP provider.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpProviderConfig {
    /// Endpoint URL for chat completion.
    pub endpoint: Url,
    /// Bearer credential; opaque.
    pub api_key: String,
    /// Model identifier requested from the service.
    pub model_id: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Outbound request body.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    /// Model identifier.
    model: &'a str,
    /// System prompt.
    system: &'a str,
    /// User prompt.
    prompt: &'a str,
    /// Output token cap.
    max_tokens: u32,
}

/// Inbound response body.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    /// Generated text.
    text: String,
    /// Input tokens consumed.
    #[serde(default)]
    input_tokens: u64,
    /// Output tokens produced.
    #[serde(default)]
    output_tokens: u64,
    /// Cached tokens served.
    #[serde(default)]
    cache_tokens: u64,
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// HTTP-backed text provider.
pub struct HttpProvider {
    /// Provider configuration.
    config: HttpProviderConfig,
    /// Blocking HTTP client with the configured timeout.
    client: Client,
}

impl HttpProvider {
    /// Creates the provider, building the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Permanent`] when the client cannot build.
    pub fn new(config: HttpProviderConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| GenerationError::Permanent(format!("http client build: {err}")))?;
        Ok(Self { config, client })
    }
}

impl TextGenerator for HttpProvider {
    fn generate(
        &self,
        purpose: Purpose,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<Generation, GenerationError> {
        let started = Instant::now();
        let request = CompletionRequest {
            model: &self.config.model_id,
            system: system_prompt,
            prompt: user_prompt,
            max_tokens,
        };
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|err| GenerationError::Transient(format!("http send: {err}")))?;
        let status = response.status();
        if status.is_server_error() {
            return Err(GenerationError::Transient(format!("server status {status}")));
        }
        if !status.is_success() {
            return Err(GenerationError::Permanent(format!("client status {status}")));
        }
        let body: CompletionResponse = response
            .json()
            .map_err(|err| GenerationError::Permanent(format!("malformed body: {err}")))?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        Ok(Generation {
            text: body.text,
            usage: UsageRecord {
                purpose,
                model_id: self.config.model_id.clone(),
                input_tokens: body.input_tokens,
                output_tokens: body.output_tokens,
                cache_tokens: body.cache_tokens,
                latency_ms,
            },
        })
    }
}
