//! モックのコマンドレジストリ（テスト用）
//!
//! `127.0.0.1` の空きポートで axum サーバーを起動し、
//! 受け取ったリクエストの回数・ヘッダー・ボディを記録する。

use axum::{
    body::Bytes,
    extract::{Form, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::Endpoints;

/// モックが発行するトークン
pub const MOCK_TOKEN: &str = "abc";
/// 存在しないコマンドとして扱うID
pub const MISSING_COMMAND_ID: &str = "404";

/// 最後に受け取ったリクエスト
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
    pub form: Option<HashMap<String, String>>,
}

/// モックの共有状態
#[derive(Default)]
pub struct MockState {
    token_status: Option<StatusCode>,
    revoke_status: Option<StatusCode>,
    hits: AtomicUsize,
    last: Mutex<Option<RecordedRequest>>,
}

impl MockState {
    fn record(&self, request: RecordedRequest) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last.lock() {
            *last = Some(request);
        }
    }
}

/// 起動済みのモックレジストリ
pub struct MockRegistry {
    pub endpoints: Endpoints,
    state: Arc<MockState>,
}

impl MockRegistry {
    /// 全エンドポイントが成功するモックを起動
    pub async fn start() -> Self {
        Self::start_with(StatusCode::OK, StatusCode::OK).await
    }

    /// トークン取得・失効のステータスを指定して起動
    pub async fn start_with(token_status: StatusCode, revoke_status: StatusCode) -> Self {
        let state = Arc::new(MockState {
            token_status: Some(token_status),
            revoke_status: Some(revoke_status),
            ..Default::default()
        });

        let app = Router::new()
            .route("/oauth2/token", post(token))
            .route("/oauth2/token/revoke", post(revoke))
            .fallback(registry)
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            endpoints: Endpoints {
                api_base: format!("http://{}/api/v9", addr),
                token_url: format!("http://{}/oauth2/token", addr),
                revoke_url: format!("http://{}/oauth2/token/revoke", addr),
            },
            state,
        }
    }

    /// 受け取ったリクエストの総数
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// 最後に受け取ったリクエスト
    pub fn last_request(&self) -> RecordedRequest {
        self.state
            .last
            .lock()
            .ok()
            .and_then(|last| last.clone())
            .unwrap_or_default()
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

async fn token(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.record(RecordedRequest {
        method: "POST".to_string(),
        path: "/oauth2/token".to_string(),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        form: Some(form),
        ..Default::default()
    });

    let status = state.token_status.unwrap_or(StatusCode::OK);
    if status != StatusCode::OK {
        return (status, r#"{"error": "invalid_client"}"#).into_response();
    }

    Json(json!({
        "access_token": MOCK_TOKEN,
        "token_type": "Bearer",
        "expires_in": 604800,
        "scope": "applications.commands.update"
    }))
    .into_response()
}

async fn revoke(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.record(RecordedRequest {
        method: "POST".to_string(),
        path: "/oauth2/token/revoke".to_string(),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        form: Some(form),
        ..Default::default()
    });

    let status = state.revoke_status.unwrap_or(StatusCode::OK);
    if status != StatusCode::OK {
        return (status, r#"{"error": "invalid_request"}"#).into_response();
    }
    StatusCode::OK.into_response()
}

/// `/api/v9/applications/...` 以下のコマンドエンドポイント
async fn registry(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api/v9")
        .unwrap_or(uri.path())
        .to_string();
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    let authorization = header_value(&headers, header::AUTHORIZATION);

    state.record(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        authorization: authorization.clone(),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        body: body.clone(),
        form: None,
    });

    if authorization.as_deref() != Some(format!("Bearer {}", MOCK_TOKEN).as_str()) {
        return (StatusCode::UNAUTHORIZED, r#"{"message": "401: Unauthorized", "code": 0}"#)
            .into_response();
    }

    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    let (guild, rest) = match segments.as_slice() {
        ["applications", _, "guilds", guild, rest @ ..] => (Some(guild.to_string()), rest),
        ["applications", _, rest @ ..] => (None, rest),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    match (method.as_str(), rest) {
        ("GET", ["commands"]) => Json(json!([
            record("1", "greet", guild.as_deref()),
            record("2", "ping", guild.as_deref())
        ]))
        .into_response(),
        ("PUT", ["commands"]) => {
            let commands = body
                .and_then(|b| b.as_array().cloned())
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(i, c)| with_id(c, &format!("{}", 2000 + i), guild.as_deref()))
                .collect::<Vec<_>>();
            Json(Value::Array(commands)).into_response()
        }
        ("POST", ["commands"]) => (
            StatusCode::CREATED,
            Json(with_id(body.unwrap_or_default(), "1001", guild.as_deref())),
        )
            .into_response(),
        (_, ["commands", id]) if *id == MISSING_COMMAND_ID => (
            StatusCode::NOT_FOUND,
            r#"{"message": "Unknown application command", "code": 10063}"#,
        )
            .into_response(),
        ("GET", ["commands", id]) => Json(record(id, "greet", guild.as_deref())).into_response(),
        ("PATCH", ["commands", id]) => {
            let mut updated = record(id, "greet", guild.as_deref());
            if let (Some(target), Some(Value::Object(patch))) = (updated.as_object_mut(), body) {
                target.extend(patch);
            }
            Json(updated).into_response()
        }
        ("DELETE", ["commands", _]) => StatusCode::NO_CONTENT.into_response(),
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn record(id: &str, name: &str, guild_id: Option<&str>) -> Value {
    let mut value = json!({
        "id": id,
        "application_id": "42",
        "version": "1",
        "type": 1,
        "name": name,
        "description": format!("{} command", name),
    });
    if let Some(guild_id) = guild_id {
        value["guild_id"] = json!(guild_id);
    }
    value
}

fn with_id(mut command: Value, id: &str, guild_id: Option<&str>) -> Value {
    if let Some(obj) = command.as_object_mut() {
        obj.insert("id".to_string(), json!(id));
        obj.insert("application_id".to_string(), json!("42"));
        obj.insert("version".to_string(), json!("1"));
        if let Some(guild_id) = guild_id {
            obj.insert("guild_id".to_string(), json!(guild_id));
        }
    }
    command
}
