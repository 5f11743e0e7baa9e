//! API key resolution.
//!
//! Resolution order: `MURMUR_API_KEY` env var, then `OPENAI_API_KEY`, then
//! the `transcription.api_key` config field. Returns `None` when no source
//! yields a non-empty key; the caller decides how to guide the user.

use crate::config::MurmurConfig;

const ENV_VARS: [&str; 2] = ["MURMUR_API_KEY", "OPENAI_API_KEY"];

/// Resolve the transcription API key from the environment or the config.
pub fn resolve_api_key(config: &MurmurConfig) -> Option<String> {
    for var in ENV_VARS {
        if let Ok(key) = std::env::var(var) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }
    }

    let key = config.transcription.api_key.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Redact a key for log output, keeping only the last four characters.
pub fn redact(key: &str) -> String {
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}
