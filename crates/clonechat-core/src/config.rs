//! Configuration loaded from the process environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_INDEX_DIR: &str = "chroma_db";
pub const DEFAULT_COLLECTION: &str = "clone";
pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_EMBED_MODEL: &str = "embed-english-v3.0";
pub const DEFAULT_CHAT_MODEL: &str = "command-r";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.com";

/// Name of the variable carrying the provider credential.
pub const API_KEY_VAR: &str = "API";

/// Top-level Clone Chat configuration.
#[derive(Clone, Serialize)]
pub struct CloneChatConfig {
    /// HTTP listen address.
    pub host: String,
    /// HTTP listen port.
    pub port: u16,
    /// Provider credential (Cohere). Never serialized.
    #[serde(skip)]
    pub api_key: String,
    /// Base URL of the provider API, without a trailing slash.
    pub provider_base_url: String,
    /// Directory holding `index.db`.
    pub index_dir: PathBuf,
    /// Collection searched at query time.
    pub collection: String,
    /// Passages retrieved per question.
    pub top_k: usize,
    /// Embedding model used for queries and for index building.
    pub embed_model: String,
    /// Generation model.
    pub chat_model: String,
    /// Upper bound on each external call.
    pub upstream_timeout: Duration,
    /// Replacement persona template; the built-in asset is used when unset.
    pub prompt_file: Option<PathBuf>,
}

impl std::fmt::Debug for CloneChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneChatConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &"<redacted>")
            .field("provider_base_url", &self.provider_base_url)
            .field("index_dir", &self.index_dir)
            .field("collection", &self.collection)
            .field("top_k", &self.top_k)
            .field("embed_model", &self.embed_model)
            .field("chat_model", &self.chat_model)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("prompt_file", &self.prompt_file)
            .finish()
    }
}

impl CloneChatConfig {
    /// Create configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but without a credential.
    /// Used by commands that only read the local index.
    pub fn from_env_without_credentials() -> Result<Self> {
        Self::parse(|key| std::env::var(key).ok(), false)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// A missing `API` is a configuration error so that a misconfigured
    /// deployment fails at startup instead of on the first request.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::parse(lookup, true)
    }

    fn parse<F>(lookup: F, require_key: bool) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = match get(API_KEY_VAR) {
            Some(key) => key.trim().to_string(),
            None if require_key => {
                return Err(Error::Config(format!(
                    "{} environment variable is not set",
                    API_KEY_VAR
                )))
            }
            None => String::new(),
        };

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let top_k: usize = parse_or("CLONECHAT_TOP_K", get("CLONECHAT_TOP_K"), DEFAULT_TOP_K)?;
        if top_k == 0 {
            return Err(Error::Config("CLONECHAT_TOP_K must be at least 1".into()));
        }
        let timeout_secs: u64 = parse_or(
            "CLONECHAT_TIMEOUT_SECS",
            get("CLONECHAT_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config("CLONECHAT_TIMEOUT_SECS must be at least 1".into()));
        }

        let provider_base_url = get("COHERE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_COHERE_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            api_key,
            provider_base_url,
            index_dir: get("CLONECHAT_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
            collection: get("CLONECHAT_COLLECTION").unwrap_or_else(|| DEFAULT_COLLECTION.into()),
            top_k,
            embed_model: get("CLONECHAT_EMBED_MODEL").unwrap_or_else(|| DEFAULT_EMBED_MODEL.into()),
            chat_model: get("CLONECHAT_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.into()),
            upstream_timeout: Duration::from_secs(timeout_secs),
            prompt_file: get("CLONECHAT_PROMPT_FILE").map(PathBuf::from),
        })
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, v))),
        None => Ok(default),
    }
}
