use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Request timeout for model calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const SITE_URL: &str = "http://localhost";
const SITE_NAME: &str = "House Evaluator";

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String>;

    /// Ask about a single PNG image together with a text prompt.
    async fn generate_with_image(
        &self,
        model: &str,
        prompt: String,
        image_png: &[u8],
        system: Option<String>,
    ) -> Result<String>;
}

/// Chat-completions client for OpenRouter and other OpenAI-compatible gateways.
pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build model HTTP client")?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    async fn complete(&self, model: &str, messages: Vec<Value>) -> Result<String> {
        let body = json!({
            "model": model,
            "messages": messages,
        });

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .header("HTTP-Referer", SITE_URL)
            .header("X-Title", SITE_NAME)
            .json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request
            .send()
            .await
            .with_context(|| format!("Chat completion request to {} failed", model))?
            .error_for_status()?;
        let json: Value = res.json().await.context("Chat completion body was not JSON")?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .context("Failed to parse content from OpenAI response")?;

        Ok(content.to_string())
    }
}

fn system_message(system: Option<String>) -> Option<Value> {
    system.map(|sys| json!({ "role": "system", "content": sys }))
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, model: &str, prompt: String, system: Option<String>) -> Result<String> {
        let mut messages: Vec<Value> = system_message(system).into_iter().collect();
        messages.push(json!({ "role": "user", "content": prompt }));
        self.complete(model, messages).await
    }

    async fn generate_with_image(
        &self,
        model: &str,
        prompt: String,
        image_png: &[u8],
        system: Option<String>,
    ) -> Result<String> {
        let mut messages: Vec<Value> = system_message(system).into_iter().collect();
        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(image_png));
        messages.push(json!({
            "role": "user",
            "content": [
                { "type": "image_url", "image_url": { "url": data_url, "detail": "high" } },
                { "type": "text", "text": prompt },
            ],
        }));
        self.complete(model, messages).await
    }
}
