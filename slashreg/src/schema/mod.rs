//! コマンド定義のスキーマとビルダー
//!
//! Slash Command / オプション / 選択肢を構築時に検証し、
//! リモートのコマンドレジストリが受け付けるJSON表現に変換する。
//! 検証は構築時に一度だけ行い、シリアライズ時には失敗しない。

mod choice;
mod command;
mod option;

use serde::{Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

pub use choice::{ChoiceValue, CommandOptionChoice};
pub use command::{Command, CommandBuilder};
pub use option::{CommandOption, CommandOptionBuilder, OptionBound};

/// 名前の最大文字数
pub const MAX_NAME_LENGTH: usize = 32;
/// 説明文の最大文字数
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
/// 文字列の選択肢値の最大文字数
pub const MAX_CHOICE_VALUE_LENGTH: usize = 100;
/// 1オプションあたりの選択肢の上限
pub const MAX_CHOICES: usize = 25;
/// 1コマンド（または1オプション）あたりの子オプションの上限
pub const MAX_OPTIONS: usize = 25;

/// 検証エラーの種類
///
/// どのフィールドがどの制約に違反したかを必ず含める。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least {min} and no more than {max} characters (got {actual})")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("amount of choices must not exceed {max} (got {actual})")]
    TooManyChoices { max: usize, actual: usize },

    #[error("amount of options must not exceed {max} (got {actual})")]
    TooManyOptions { max: usize, actual: usize },

    #[error("option type must be channel to use channel_types (got {0:?})")]
    ChannelTypesNotAllowed(CommandOptionType),

    #[error("cannot use min_value or max_value if option type is not integer or number (got {0:?})")]
    MinMaxNotAllowed(CommandOptionType),

    #[error("min_value ({min}) must not be greater than max_value ({max})")]
    InvalidRange { min: OptionBound, max: OptionBound },

    #[error("autocomplete can only be set if the type is string, number, or integer (got {0:?})")]
    AutocompleteNotAllowed(CommandOptionType),

    #[error("choices can only be used if the type is string, number, or integer (got {0:?})")]
    ChoicesNotAllowed(CommandOptionType),

    #[error("choice '{choice}' has a value that does not match option type {option_type:?}")]
    ChoiceTypeMismatch {
        choice: String,
        option_type: CommandOptionType,
    },

    #[error("nested options can only be used by sub commands and sub command groups (got {0:?})")]
    NestedOptionsNotAllowed(CommandOptionType),

    #[error("{parent:?} cannot contain an option of type {child:?}")]
    InvalidNesting {
        parent: CommandOptionType,
        child: CommandOptionType,
    },

    #[error("{field} must be a finite number")]
    NonFiniteNumber { field: &'static str },
}

/// 文字数（Unicodeスカラー値の数）が範囲内かチェック
pub(crate) fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::Length {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// コマンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    /// テキスト入力の Slash Command
    ChatInput = 1,
    /// ユーザーの右クリックメニュー
    User = 2,
    /// メッセージの右クリックメニュー
    Message = 3,
}

/// オプションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOptionType {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
}

impl CommandOptionType {
    /// 選択肢・オートコンプリートが使える型か
    pub fn accepts_choices(self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Number)
    }

    /// min_value / max_value が使える型か
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Number)
    }

    /// 子オプションを持てる型か
    pub fn is_sub_command(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

/// チャンネルの種類（`channel_types` 用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    GuildText = 0,
    Dm = 1,
    GuildVoice = 2,
    GroupDm = 3,
    GuildCategory = 4,
    GuildNews = 5,
    GuildStore = 6,
    GuildNewsThread = 10,
    GuildPublicThread = 11,
    GuildPrivateThread = 12,
    GuildStageVoice = 13,
}

macro_rules! serialize_as_integer {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_u8(*self as u8)
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::from(value as u8)
                }
            }
        )*
    };
}

serialize_as_integer!(CommandType, CommandOptionType, ChannelType);

/// 登録対象となるコマンド定義の共通インターフェース
///
/// 定義がどこでどう書かれたかには関知せず、
/// シリアライズ済みの表現だけを取り出す。
pub trait CommandModule {
    /// コマンド名
    fn name(&self) -> &str;

    /// レジストリに送るJSON表現
    fn to_json(&self) -> Value;
}
