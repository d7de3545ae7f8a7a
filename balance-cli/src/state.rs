use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$BALANCE_HOME`, else `~/.balance`.
pub fn balance_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BALANCE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".balance"))
}

pub fn ensure_balance_home() -> Result<PathBuf> {
    let dir = balance_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
