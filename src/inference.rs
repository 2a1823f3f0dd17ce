//! Client for Ollama-style `/api/generate` endpoints.
//!
//! The server streams its answer as newline-delimited JSON frames:
//!
//! ```text
//! {"response":"Hel","done":false}
//! {"response":"lo","done":false}
//! {"response":"","done":true}
//! ```
//!
//! [`InferenceClient`] concatenates the `response` fragments in arrival order
//! and returns the trimmed text. A single undecodable frame fails the whole
//! call; partial output is discarded.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::InferenceConfig;
use crate::error::{ChatdigestError, Result};

/// Path appended to the endpoint for generation requests.
pub const GENERATE_PATH: &str = "/api/generate";

/// Something that turns a prompt into model output.
pub trait Generate: Sync {
    /// Model name recorded alongside results.
    fn model(&self) -> &str;

    /// Sends `prompt` to the model behind `endpoint` and returns its full
    /// answer.
    fn generate(&self, endpoint: &str, prompt: &str)
    -> impl Future<Output = Result<String>> + Send;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct StreamFrame {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the generate endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    client: Client,
    config: InferenceConfig,
}

impl InferenceClient {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ChatdigestError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    async fn request(&self, endpoint: &str, prompt: &str) -> Result<String> {
        let url = format!("{}{GENERATE_PATH}", endpoint.trim_end_matches('/'));
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
        };

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| ChatdigestError::transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatdigestError::transport(format!("{url}: HTTP {status}")));
        }

        let mut decoder = StreamDecoder::default();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ChatdigestError::transport(format!("{url}: failed to read body: {e}")))?
        {
            debug!(bytes = chunk.len(), "stream chunk");
            if decoder.push(&chunk)? {
                break;
            }
        }
        let text = decoder.finish()?;

        info!(chars = text.chars().count(), "model answered");
        Ok(text)
    }
}

impl Generate for InferenceClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn generate(
        &self,
        endpoint: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        self.request(endpoint, prompt)
    }
}

/// Incremental NDJSON decoder for the response stream.
///
/// Lines may be split across network chunks; bytes are buffered until a
/// newline arrives.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
    output: String,
    line: usize,
    done: bool,
}

impl StreamDecoder {
    /// Feeds a chunk. Returns `true` once the final frame was seen.
    pub fn push(&mut self, chunk: &[u8]) -> Result<bool> {
        self.pending.extend_from_slice(chunk);
        while !self.done {
            let Some(nl) = self.pending.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.pending.drain(..=nl).collect();
            self.decode_line(&line[..nl])?;
        }
        Ok(self.done)
    }

    /// Decodes whatever is left after the body ended and returns the text.
    pub fn finish(mut self) -> Result<String> {
        if !self.done && !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.decode_line(&rest)?;
        }
        Ok(self.output.trim().to_string())
    }

    fn decode_line(&mut self, raw: &[u8]) -> Result<()> {
        self.line += 1;
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(());
        }

        let frame: StreamFrame =
            serde_json::from_slice(raw).map_err(|source| ChatdigestError::StreamDecode {
                line: self.line,
                source,
            })?;

        if let Some(error) = frame.error {
            return Err(ChatdigestError::transport(format!("model error: {error}")));
        }

        self.output.push_str(&frame.response);
        self.done = frame.done;
        Ok(())
    }
}

/// Decodes a complete NDJSON body in one go.
pub fn decode_stream(body: &[u8]) -> Result<String> {
    let mut decoder = StreamDecoder::default();
    decoder.push(body)?;
    decoder.finish()
}
