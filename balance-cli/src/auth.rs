use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::state::ensure_balance_home;

/// Keys stored in `~/.balance/auth.json`. Environment variables take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthState {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

fn auth_path() -> Result<std::path::PathBuf> {
    Ok(ensure_balance_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    let p = auth_path()?;
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(serde_json::from_str(&s)?)
}

fn from_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

pub fn anthropic_api_key() -> Result<Option<String>> {
    match from_env("ANTHROPIC_API_KEY") {
        Some(key) => Ok(Some(key)),
        None => Ok(load_auth()?.anthropic_api_key),
    }
}

pub fn openai_api_key() -> Result<Option<String>> {
    match from_env("OPENAI_API_KEY") {
        Some(key) => Ok(Some(key)),
        None => Ok(load_auth()?.openai_api_key),
    }
}
