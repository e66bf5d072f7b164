//! 登録可能なコマンド定義

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{
    check_length, CommandModule, CommandOption, CommandType, ValidationError,
    MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_OPTIONS,
};

/// 検証済みのコマンド定義
///
/// `Command::builder()` からのみ構築でき、構築後は変更できない。
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: Option<CommandType>,
    guild_id: Option<String>,
    name: String,
    description: String,
    options: Option<Vec<CommandOption>>,
    default_permission: Option<bool>,
}

impl Command {
    /// ビルダーを作成
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            kind: None,
            guild_id: None,
            name: name.into(),
            description: description.into(),
            options: None,
            default_permission: None,
        }
    }

    pub fn kind(&self) -> Option<CommandType> {
        self.kind
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn options(&self) -> &[CommandOption] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn default_permission(&self) -> Option<bool> {
        self.default_permission
    }

    /// レジストリ向けのJSON表現
    ///
    /// `name` と `description` は常に出力し、それ以外は設定されている場合のみ出力する。
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::from(self.name.as_str()));
        obj.insert(
            "description".to_string(),
            Value::from(self.description.as_str()),
        );

        if let Some(kind) = self.kind {
            obj.insert("type".to_string(), Value::from(kind));
        }
        if let Some(guild_id) = &self.guild_id {
            obj.insert("guild_id".to_string(), Value::from(guild_id.as_str()));
        }
        if let Some(default_permission) = self.default_permission {
            obj.insert(
                "default_permission".to_string(),
                Value::Bool(default_permission),
            );
        }
        if let Some(options) = &self.options {
            obj.insert(
                "options".to_string(),
                options.iter().map(CommandOption::to_json).collect(),
            );
        }

        Value::Object(obj)
    }
}

impl CommandModule for Command {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_json(&self) -> Value {
        Command::to_json(self)
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// `Command` のビルダー
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    kind: Option<CommandType>,
    guild_id: Option<String>,
    name: String,
    description: String,
    options: Option<Vec<CommandOption>>,
    default_permission: Option<bool>,
}

impl CommandBuilder {
    pub fn kind(mut self, kind: CommandType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// 登録先のギルドを指定（未指定ならグローバル）
    pub fn guild_id(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.get_or_insert_with(Vec::new).push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.get_or_insert_with(Vec::new).extend(options);
        self
    }

    pub fn default_permission(mut self, default_permission: bool) -> Self {
        self.default_permission = Some(default_permission);
        self
    }

    /// 検証して `Command` を構築
    pub fn build(self) -> Result<Command, ValidationError> {
        check_length("command name", &self.name, 1, MAX_NAME_LENGTH)?;

        // USER / MESSAGE コマンドは説明文を持たない
        let min_description = match self.kind {
            Some(CommandType::User | CommandType::Message) => 0,
            _ => 1,
        };
        check_length(
            "command description",
            &self.description,
            min_description,
            MAX_DESCRIPTION_LENGTH,
        )?;

        if let Some(options) = &self.options {
            if options.len() > MAX_OPTIONS {
                return Err(ValidationError::TooManyOptions {
                    max: MAX_OPTIONS,
                    actual: options.len(),
                });
            }
        }

        Ok(Command {
            kind: self.kind,
            guild_id: self.guild_id,
            name: self.name,
            description: self.description,
            options: self.options,
            default_permission: self.default_permission,
        })
    }
}
