//! slashreg - Slash Command 定義の検証とレジストリ同期
//!
//! - [`schema`]: コマンド / オプション / 選択肢のビルダーと検証
//! - [`api`]: Bearerトークンの取得・失効とコマンドのCRUD
//! - [`config`]: アプリケーションの認証情報

pub mod api;
pub mod config;
pub mod schema;

pub use api::{ApiClient, ApiError, CommandRecord, Endpoints, Scope, SessionState};
pub use config::{ClientConfig, ConfigError};
pub use schema::{
    ChannelType, ChoiceValue, Command, CommandModule, CommandOption, CommandOptionChoice,
    CommandOptionType, CommandType, OptionBound, ValidationError,
};
