use anyhow::{Context, Result, anyhow, bail};
use balance_books::{BooksError, Categorizer, build_categorization_prompt, parse_category_reply};
use balance_core::Category;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::auth;
use crate::config::LlmSection;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            other => bail!("unknown llm provider '{other}' (expected anthropic or openai)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    api_key: String,
}

impl LlmClient {
    /// Build a client from `[llm]` config; the key comes from the environment or auth.json.
    pub fn from_config(cfg: &LlmSection) -> Result<Self> {
        let provider: Provider = cfg.provider.parse()?;
        let (api_key, default_url, hint) = match provider {
            Provider::Anthropic => (auth::anthropic_api_key()?, ANTHROPIC_BASE_URL, "ANTHROPIC_API_KEY"),
            Provider::OpenAI => (auth::openai_api_key()?, OPENAI_BASE_URL, "OPENAI_API_KEY"),
        };
        let api_key = api_key.ok_or_else(|| anyhow!("missing API key; set {hint} or add it to ~/.balance/auth.json"))?;
        let base_url = if cfg.base_url.trim().is_empty() {
            default_url.to_string()
        } else {
            cfg.base_url.trim_end_matches('/').to_string()
        };
        Ok(Self {
            provider,
            model: cfg.model.clone(),
            base_url,
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            api_key,
        })
    }

    /// Single-turn completion. Blocks the caller.
    pub fn complete(&self, prompt: &str) -> Result<String> {
        // #[tokio::main] means we are usually already inside a runtime, where a
        // nested block_on would panic.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(prompt)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(prompt))
        }
    }

    async fn complete_async(&self, prompt: &str) -> Result<String> {
        debug!(provider = ?self.provider, model = %self.model, "llm request");
        match self.provider {
            Provider::Anthropic => self.anthropic_complete(prompt).await,
            Provider::OpenAI => self.openai_complete(prompt).await,
        }
    }

    async fn anthropic_complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let text: String = out
            .content
            .into_iter()
            .filter(|b| b.t == "text")
            .filter_map(|b| b.text)
            .collect();
        Ok(text.trim().to_string())
    }

    async fn openai_complete(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

/// Asks the configured model to pick a category.
pub struct LlmCategorizer {
    client: LlmClient,
}

impl LlmCategorizer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

impl Categorizer for LlmCategorizer {
    fn categorize(&self, description: &str, categories: &[Category]) -> balance_books::Result<String> {
        let prompt = build_categorization_prompt(categories, description);
        let reply = self
            .client
            .complete(&prompt)
            .map_err(|e| BooksError::Categorizer(format!("{e:#}")))?;
        debug!(%reply, "llm reply");
        parse_category_reply(&reply, categories)
    }
}
