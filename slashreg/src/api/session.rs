//! 認証セッションとコマンドCRUD

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, error, info};

use super::{ApiError, CommandRecord, Endpoints, Scope, SessionState, REQUEST_TIMEOUT, TOKEN_SCOPE};
use crate::config::ClientConfig;
use crate::schema::Command;

/// 保持しているクレデンシャル
///
/// トークンは `Authenticated` の間だけ存在する。
enum Credential {
    Unauthenticated,
    Authenticated { token: String },
    Revoked,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// コマンドレジストリAPIクライアント
///
/// `fetch_token()` でトークンを取得してから各操作を呼び出し、
/// 最後に `revoke_token()` でトークンを失効させる。
pub struct ApiClient {
    config: ClientConfig,
    endpoints: Endpoints,
    client: Client,
    credential: Credential,
}

impl ApiClient {
    /// 本番のエンドポイントでクライアントを作成
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_endpoints(config, Endpoints::default())
    }

    /// 接続先を指定してクライアントを作成
    pub fn with_endpoints(config: ClientConfig, endpoints: Endpoints) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        debug!(
            "API client created for application {} ({})",
            config.id, endpoints.api_base
        );

        Ok(Self {
            config,
            endpoints,
            client,
            credential: Credential::Unauthenticated,
        })
    }

    /// 現在のセッション状態
    pub fn state(&self) -> SessionState {
        match self.credential {
            Credential::Unauthenticated => SessionState::Unauthenticated,
            Credential::Authenticated { .. } => SessionState::Authenticated,
            Credential::Revoked => SessionState::Revoked,
        }
    }

    /// 設定から決まるデフォルトの登録範囲
    pub fn default_scope(&self) -> Scope {
        Scope::from_guild_id(self.config.scope_id.as_deref())
    }

    fn token(&self, operation: &'static str) -> Result<&str, ApiError> {
        match &self.credential {
            Credential::Authenticated { token } => Ok(token),
            Credential::Unauthenticated => Err(ApiError::TokenRequired { operation }),
            Credential::Revoked => Err(ApiError::TokenRevoked { operation }),
        }
    }

    /// クライアントクレデンシャルでBearerトークンを取得
    pub async fn fetch_token(&mut self) -> Result<String, ApiError> {
        if let Credential::Revoked = self.credential {
            return Err(ApiError::TokenRevoked {
                operation: "fetch_token()",
            });
        }

        let http_response = self
            .client
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.config.id.as_str()),
                ("client_secret", self.config.secret.as_str()),
                ("grant_type", "client_credentials"),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await?;

        let status = http_response.status();
        debug!("Token status: {}", status);

        if !status.is_success() {
            let body = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error".to_string());
            error!("Could not fetch token: {} {}", status, body);
            return Err(ApiError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = http_response.text().await?;
        let token_response: TokenResponse = serde_json::from_str(&response_text)?;

        info!("Fetched token for application {}", self.config.id);
        self.credential = Credential::Authenticated {
            token: token_response.access_token.clone(),
        };
        Ok(token_response.access_token)
    }

    /// トークンを失効させる
    ///
    /// 失敗した場合はセッションを `Authenticated` のまま残す。
    pub async fn revoke_token(&mut self) -> Result<(), ApiError> {
        let token = self.token("revoke_token()")?;

        let http_response = self
            .client
            .post(&self.endpoints.revoke_url)
            .form(&[
                ("client_id", self.config.id.as_str()),
                ("client_secret", self.config.secret.as_str()),
                ("token", token),
            ])
            .send()
            .await?;

        let status = http_response.status();
        debug!("Revoke status: {}", status);

        if !status.is_success() {
            let body = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error".to_string());
            error!("Could not revoke token: {} {}", status, body);
            return Err(ApiError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        info!("Revoked token for application {}", self.config.id);
        self.credential = Credential::Revoked;
        Ok(())
    }

    /// 認証付きリクエストを送信
    ///
    /// 204 No Content は空オブジェクトとして返し、ボディをデコードしない。
    async fn request(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let token = self.token(operation)?;
        let url = format!("{}{}", self.endpoints.api_base, path);

        debug!("{} {}", method, path);

        let mut request = self.client.request(method.clone(), &url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let http_response = request.send().await?;
        let status = http_response.status();
        debug!("{} {} -> {}", method, path, status);

        if !status.is_success() {
            let body = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error".to_string());
            error!("{} {} failed with code {}: {}", method, path, status, body);
            return Err(ApiError::Upstream {
                method: method.to_string(),
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Object(Map::new()));
        }

        let response_text = http_response.text().await?;
        Ok(serde_json::from_str(&response_text)?)
    }

    /// 登録済みコマンドの一覧
    pub async fn list_commands(&self, scope: &Scope) -> Result<Vec<CommandRecord>, ApiError> {
        let path = scope.commands_path(&self.config.id);
        let value = self
            .request("list_commands()", Method::GET, &path, None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// IDを指定してコマンドを取得
    pub async fn get_command(&self, scope: &Scope, id: &str) -> Result<CommandRecord, ApiError> {
        let path = scope.command_path(&self.config.id, id);
        let value = self
            .request("get_command()", Method::GET, &path, None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// コマンドを新規登録
    pub async fn create_command(
        &self,
        scope: &Scope,
        command: &Command,
    ) -> Result<CommandRecord, ApiError> {
        let path = scope.commands_path(&self.config.id);
        let value = self
            .request(
                "create_command()",
                Method::POST,
                &path,
                Some(&command.to_json()),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 既存コマンドを部分更新
    pub async fn update_command(
        &self,
        scope: &Scope,
        id: &str,
        command: &Command,
    ) -> Result<CommandRecord, ApiError> {
        let path = scope.command_path(&self.config.id, id);
        let value = self
            .request(
                "update_command()",
                Method::PATCH,
                &path,
                Some(&command.to_json()),
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// コマンドを削除
    pub async fn delete_command(&self, scope: &Scope, id: &str) -> Result<(), ApiError> {
        let path = scope.command_path(&self.config.id, id);
        self.request("delete_command()", Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    /// 範囲内の全コマンドを置き換える
    ///
    /// `commands` に含まれないコマンドはリモート側で削除される。
    pub async fn overwrite_commands(
        &self,
        scope: &Scope,
        commands: &[Command],
    ) -> Result<Vec<CommandRecord>, ApiError> {
        let path = scope.commands_path(&self.config.id);
        let body: Value = commands.iter().map(Command::to_json).collect();

        info!("Overwriting {} commands in {} scope", commands.len(), scope);

        let value = self
            .request("overwrite_commands()", Method::PUT, &path, Some(&body))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

// トークンとシークレットは出力しない
impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("endpoints", &self.endpoints)
            .field("state", &self.state())
            .finish()
    }
}
