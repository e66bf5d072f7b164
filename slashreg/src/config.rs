//! アプリケーションの認証情報設定
//!
//! `dev.config.json` / `prod.config.json` のようなJSONファイルから読み込み、
//! 環境変数で上書きできる。

use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// 環境変数名: アプリケーションID
pub const ENV_CLIENT_ID: &str = "DISCORD_CLIENT_ID";
/// 環境変数名: クライアントシークレット
pub const ENV_CLIENT_SECRET: &str = "DISCORD_CLIENT_SECRET";
/// 環境変数名: 対象ギルドID
pub const ENV_GUILD_ID: &str = "DISCORD_GUILD_ID";

/// 設定のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Missing config value: {0}")]
    Missing(&'static str),
}

/// クライアント認証情報
#[derive(Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// アプリケーション（クライアント）ID
    #[serde(default)]
    pub id: String,
    /// クライアントシークレット
    #[serde(default)]
    pub secret: String,
    /// 対象ギルドID（未指定ならグローバル）
    #[serde(default, alias = "guild_id")]
    pub scope_id: Option<String>,
}

impl ClientConfig {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            scope_id: None,
        }
    }

    pub fn with_scope_id(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    /// JSONファイルから読み込み
    ///
    /// ファイルが存在しない場合は空の設定を返す（環境変数だけで動かせるように）。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);

        if !path.exists() {
            info!("Config file not found at {:?}, using environment only", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!("Loaded config for application {}", config.id);
        Ok(config)
    }

    /// 環境変数で上書き（空文字列は無視）
    pub fn apply_env(mut self) -> Self {
        if let Some(id) = non_empty_env(ENV_CLIENT_ID) {
            self.id = id;
        }
        if let Some(secret) = non_empty_env(ENV_CLIENT_SECRET) {
            self.secret = secret;
        }
        if let Some(scope_id) = non_empty_env(ENV_GUILD_ID) {
            self.scope_id = Some(scope_id);
        }
        self
    }

    /// 必須項目が揃っているかチェック
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.id.trim().is_empty() {
            return Err(ConfigError::Missing("id"));
        }
        if self.secret.trim().is_empty() {
            return Err(ConfigError::Missing("secret"));
        }
        Ok(())
    }
}

// シークレットはログに出さない
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .field("scope_id", &self.scope_id)
            .finish()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
