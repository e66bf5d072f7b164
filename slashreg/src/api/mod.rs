//! コマンドレジストリAPIクライアント
//!
//! クライアントクレデンシャルでBearerトークンを取得し、
//! グローバル / ギルド単位のコマンドをCRUD操作する。

mod session;
#[cfg(test)]
mod mock;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub use session::ApiClient;

// 定数
pub const API_BASE_URL: &str = "https://discord.com/api/v9";
pub const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
pub const REVOKE_URL: &str = "https://discord.com/api/oauth2/token/revoke";
/// トークン取得時に要求するスコープ
pub const TOKEN_SCOPE: &str = "applications.commands.update";
/// 1リクエストあたりのタイムアウト
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const GLOBAL_COMMANDS_PATH: &str = "/applications/{id}/commands";
const GUILD_COMMANDS_PATH: &str = "/applications/{id}/guilds/{guild}/commands";

/// APIエラー
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please call fetch_token() before using {operation}")]
    TokenRequired { operation: &'static str },

    #[error("Token has been revoked; cannot use {operation}")]
    TokenRevoked { operation: &'static str },

    #[error("Authorization failed with code {status}: {body}")]
    Auth { status: u16, body: String },

    #[error("{method} {path} failed with code {status}: {body}")]
    Upstream {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// 認証前・失効後の呼び出しによるエラーか
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::TokenRequired { .. } | Self::TokenRevoked { .. })
    }

    /// リモートが返したHTTPステータス
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::Upstream { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// セッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// トークン未取得（初期状態）
    Unauthenticated,
    /// トークン取得済み
    Authenticated,
    /// トークン失効済み（終端）
    Revoked,
}

/// コマンドの登録範囲
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// 全ギルド・DMに適用
    Global,
    /// 指定ギルドのみ
    Guild(String),
}

impl Scope {
    /// ギルドIDが指定されていればギルド、なければグローバル
    pub fn from_guild_id(guild_id: Option<&str>) -> Self {
        match guild_id {
            Some(id) => Self::Guild(id.to_string()),
            None => Self::Global,
        }
    }

    /// コマンド一覧エンドポイントのパス
    pub fn commands_path(&self, application_id: &str) -> String {
        match self {
            Self::Global => GLOBAL_COMMANDS_PATH.replace("{id}", application_id),
            Self::Guild(guild) => GUILD_COMMANDS_PATH
                .replace("{id}", application_id)
                .replace("{guild}", guild),
        }
    }

    /// 単一コマンドエンドポイントのパス
    pub fn command_path(&self, application_id: &str, command_id: &str) -> String {
        format!("{}/{}", self.commands_path(application_id), command_id)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Guild(id) => write!(f, "guild {}", id),
        }
    }
}

/// 接続先URL（テスト時にモックサーバーへ差し替える）
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_base: String,
    pub token_url: String,
    pub revoke_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: API_BASE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            revoke_url: REVOKE_URL.to_string(),
        }
    }
}

/// レジストリに登録済みのコマンド
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommandRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u8>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_permission: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
