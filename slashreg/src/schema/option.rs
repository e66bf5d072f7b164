//! コマンドのオプション（引数・サブコマンド・サブコマンドグループ）

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{
    check_length, ChannelType, ChoiceValue, CommandOptionChoice, CommandOptionType,
    ValidationError, MAX_CHOICES, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH, MAX_OPTIONS,
};

/// 数値オプションの下限・上限
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionBound {
    Integer(i64),
    Number(f64),
}

impl OptionBound {
    fn as_f64(self) -> f64 {
        match self {
            Self::Integer(i) => i as f64,
            Self::Number(n) => n,
        }
    }

    /// `self` が `other` より大きいか
    ///
    /// 整数同士は `i64` のまま比較する（`f64` では 2^53 を超えると丸まる）。
    fn exceeds(self, other: Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a > b,
            _ => self.as_f64() > other.as_f64(),
        }
    }

    fn to_json(self) -> Value {
        match self {
            Self::Integer(i) => Value::from(i),
            Self::Number(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Display for OptionBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<i64> for OptionBound {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for OptionBound {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for OptionBound {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// 検証済みのコマンドオプション
///
/// `CommandOption::builder()` からのみ構築でき、構築後は変更できない。
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOption {
    kind: CommandOptionType,
    name: String,
    description: String,
    required: Option<bool>,
    choices: Option<Vec<CommandOptionChoice>>,
    options: Option<Vec<CommandOption>>,
    channel_types: Option<Vec<ChannelType>>,
    min_value: Option<OptionBound>,
    max_value: Option<OptionBound>,
    autocomplete: Option<bool>,
}

impl CommandOption {
    /// ビルダーを作成
    pub fn builder(
        kind: CommandOptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> CommandOptionBuilder {
        CommandOptionBuilder {
            kind,
            name: name.into(),
            description: description.into(),
            required: None,
            choices: None,
            options: None,
            channel_types: None,
            min_value: None,
            max_value: None,
            autocomplete: None,
        }
    }

    pub fn kind(&self) -> CommandOptionType {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn required(&self) -> Option<bool> {
        self.required
    }

    pub fn choices(&self) -> &[CommandOptionChoice] {
        self.choices.as_deref().unwrap_or_default()
    }

    pub fn options(&self) -> &[CommandOption] {
        self.options.as_deref().unwrap_or_default()
    }

    pub fn channel_types(&self) -> &[ChannelType] {
        self.channel_types.as_deref().unwrap_or_default()
    }

    pub fn min_value(&self) -> Option<OptionBound> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<OptionBound> {
        self.max_value
    }

    pub fn autocomplete(&self) -> Option<bool> {
        self.autocomplete
    }

    /// レジストリ向けのJSON表現
    ///
    /// 未設定のフィールドはキー自体を出力しない。
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from(self.kind));
        obj.insert("name".to_string(), Value::from(self.name.as_str()));
        obj.insert(
            "description".to_string(),
            Value::from(self.description.as_str()),
        );

        if let Some(required) = self.required {
            obj.insert("required".to_string(), Value::Bool(required));
        }
        if let Some(min) = self.min_value {
            obj.insert("min_value".to_string(), min.to_json());
        }
        if let Some(max) = self.max_value {
            obj.insert("max_value".to_string(), max.to_json());
        }
        if let Some(autocomplete) = self.autocomplete {
            obj.insert("autocomplete".to_string(), Value::Bool(autocomplete));
        }
        if let Some(channel_types) = &self.channel_types {
            obj.insert(
                "channel_types".to_string(),
                channel_types.iter().copied().map(Value::from).collect(),
            );
        }
        if let Some(options) = &self.options {
            obj.insert(
                "options".to_string(),
                options.iter().map(CommandOption::to_json).collect(),
            );
        }
        if let Some(choices) = &self.choices {
            obj.insert(
                "choices".to_string(),
                choices.iter().map(CommandOptionChoice::to_json).collect(),
            );
        }

        Value::Object(obj)
    }
}

impl Serialize for CommandOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// `CommandOption` のビルダー
///
/// 型ごとに使えないフィールドの組み合わせは `build()` で拒否する。
#[derive(Debug, Clone)]
pub struct CommandOptionBuilder {
    kind: CommandOptionType,
    name: String,
    description: String,
    required: Option<bool>,
    choices: Option<Vec<CommandOptionChoice>>,
    options: Option<Vec<CommandOption>>,
    channel_types: Option<Vec<ChannelType>>,
    min_value: Option<OptionBound>,
    max_value: Option<OptionBound>,
    autocomplete: Option<bool>,
}

impl CommandOptionBuilder {
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn choice(mut self, choice: CommandOptionChoice) -> Self {
        self.choices.get_or_insert_with(Vec::new).push(choice);
        self
    }

    pub fn choices(mut self, choices: impl IntoIterator<Item = CommandOptionChoice>) -> Self {
        self.choices.get_or_insert_with(Vec::new).extend(choices);
        self
    }

    /// 子オプションを追加（サブコマンド・サブコマンドグループ用）
    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.get_or_insert_with(Vec::new).push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = CommandOption>) -> Self {
        self.options.get_or_insert_with(Vec::new).extend(options);
        self
    }

    pub fn channel_type(mut self, channel_type: ChannelType) -> Self {
        self.channel_types
            .get_or_insert_with(Vec::new)
            .push(channel_type);
        self
    }

    pub fn channel_types(mut self, channel_types: impl IntoIterator<Item = ChannelType>) -> Self {
        self.channel_types
            .get_or_insert_with(Vec::new)
            .extend(channel_types);
        self
    }

    pub fn min_value(mut self, min: impl Into<OptionBound>) -> Self {
        self.min_value = Some(min.into());
        self
    }

    pub fn max_value(mut self, max: impl Into<OptionBound>) -> Self {
        self.max_value = Some(max.into());
        self
    }

    pub fn autocomplete(mut self, autocomplete: bool) -> Self {
        self.autocomplete = Some(autocomplete);
        self
    }

    /// 検証して `CommandOption` を構築
    pub fn build(self) -> Result<CommandOption, ValidationError> {
        let kind = self.kind;

        check_length("option name", &self.name, 1, MAX_NAME_LENGTH)?;
        check_length(
            "option description",
            &self.description,
            1,
            MAX_DESCRIPTION_LENGTH,
        )?;

        if let Some(choices) = &self.choices {
            if choices.len() > MAX_CHOICES {
                return Err(ValidationError::TooManyChoices {
                    max: MAX_CHOICES,
                    actual: choices.len(),
                });
            }
            if !kind.accepts_choices() {
                return Err(ValidationError::ChoicesNotAllowed(kind));
            }
            if let Some(mismatch) = choices.iter().find(|c| !choice_matches(kind, c.value())) {
                return Err(ValidationError::ChoiceTypeMismatch {
                    choice: mismatch.name().to_string(),
                    option_type: kind,
                });
            }
        }

        if let Some(options) = &self.options {
            if !kind.is_sub_command() {
                return Err(ValidationError::NestedOptionsNotAllowed(kind));
            }
            if options.len() > MAX_OPTIONS {
                return Err(ValidationError::TooManyOptions {
                    max: MAX_OPTIONS,
                    actual: options.len(),
                });
            }
            for child in options {
                let allowed = match kind {
                    // グループの中身はサブコマンドのみ
                    CommandOptionType::SubCommandGroup => {
                        child.kind() == CommandOptionType::SubCommand
                    }
                    _ => !child.kind().is_sub_command(),
                };
                if !allowed {
                    return Err(ValidationError::InvalidNesting {
                        parent: kind,
                        child: child.kind(),
                    });
                }
            }
        }

        if self.channel_types.is_some() && kind != CommandOptionType::Channel {
            return Err(ValidationError::ChannelTypesNotAllowed(kind));
        }

        if self.min_value.is_some() || self.max_value.is_some() {
            if !kind.is_numeric() {
                return Err(ValidationError::MinMaxNotAllowed(kind));
            }
            if self.min_value.is_some_and(|b| !b.as_f64().is_finite()) {
                return Err(ValidationError::NonFiniteNumber { field: "min_value" });
            }
            if self.max_value.is_some_and(|b| !b.as_f64().is_finite()) {
                return Err(ValidationError::NonFiniteNumber { field: "max_value" });
            }
            if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
                if min.exceeds(max) {
                    return Err(ValidationError::InvalidRange { min, max });
                }
            }
        }

        if self.autocomplete.is_some() && !kind.accepts_choices() {
            return Err(ValidationError::AutocompleteNotAllowed(kind));
        }

        Ok(CommandOption {
            kind,
            name: self.name,
            description: self.description,
            required: self.required,
            choices: self.choices,
            options: self.options,
            channel_types: self.channel_types,
            min_value: self.min_value,
            max_value: self.max_value,
            autocomplete: self.autocomplete,
        })
    }
}

/// 選択肢の値の型がオプションの型に合うか
fn choice_matches(kind: CommandOptionType, value: &ChoiceValue) -> bool {
    matches!(
        (kind, value),
        (CommandOptionType::String, ChoiceValue::String(_))
            | (CommandOptionType::Integer, ChoiceValue::Integer(_))
            | (
                CommandOptionType::Number,
                ChoiceValue::Integer(_) | ChoiceValue::Number(_)
            )
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_option(name: &str) -> CommandOptionBuilder {
        CommandOption::builder(CommandOptionType::String, name, "a string option")
    }

    fn choices(count: usize) -> Vec<CommandOptionChoice> {
        (0..count)
            .map(|i| CommandOptionChoice::new(format!("c{}", i), format!("v{}", i)).unwrap())
            .collect()
    }

    #[test]
    fn test_minimal_option_json() {
        let option = string_option("person").build().unwrap();
        assert_eq!(
            option.to_json(),
            json!({"type": 3, "name": "person", "description": "a string option"})
        );
    }

    #[test]
    fn test_name_and_description_bounds() {
        assert!(string_option("a").build().is_ok());
        assert!(string_option(&"a".repeat(32)).build().is_ok());
        assert!(matches!(
            string_option("").build(),
            Err(ValidationError::Length { field: "option name", .. })
        ));
        assert!(string_option(&"a".repeat(33)).build().is_err());

        let ok = CommandOption::builder(CommandOptionType::String, "n", "d".repeat(100));
        assert!(ok.build().is_ok());
        let empty = CommandOption::builder(CommandOptionType::String, "n", "");
        assert!(matches!(
            empty.build(),
            Err(ValidationError::Length { field: "option description", .. })
        ));
        let long = CommandOption::builder(CommandOptionType::String, "n", "d".repeat(101));
        assert!(long.build().is_err());
    }

    #[test]
    fn test_choice_count_limit() {
        assert!(string_option("color").choices(choices(25)).build().is_ok());
        assert_eq!(
            string_option("color").choices(choices(26)).build(),
            Err(ValidationError::TooManyChoices { max: 25, actual: 26 })
        );
    }

    #[test]
    fn test_choices_require_matching_type() {
        let result = CommandOption::builder(CommandOptionType::Boolean, "flag", "a flag")
            .choices(choices(1))
            .build();
        assert_eq!(
            result,
            Err(ValidationError::ChoicesNotAllowed(CommandOptionType::Boolean))
        );

        let result = CommandOption::builder(CommandOptionType::Integer, "count", "a count")
            .choice(CommandOptionChoice::new("one", "1").unwrap())
            .build();
        assert!(matches!(
            result,
            Err(ValidationError::ChoiceTypeMismatch { .. })
        ));

        // NUMBER は整数の選択肢も受け付ける
        let result = CommandOption::builder(CommandOptionType::Number, "ratio", "a ratio")
            .choice(CommandOptionChoice::new("one", 1).unwrap())
            .choice(CommandOptionChoice::new("half", 0.5).unwrap())
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_channel_types_only_for_channel() {
        assert_eq!(
            string_option("where")
                .channel_type(ChannelType::GuildText)
                .build(),
            Err(ValidationError::ChannelTypesNotAllowed(CommandOptionType::String))
        );

        let option = CommandOption::builder(CommandOptionType::Channel, "where", "a channel")
            .channel_types([ChannelType::GuildText, ChannelType::GuildNews])
            .build()
            .unwrap();
        assert_eq!(option.to_json()["channel_types"], json!([0, 5]));
    }

    #[test]
    fn test_min_max_only_for_numeric() {
        assert_eq!(
            string_option("s").min_value(1).build(),
            Err(ValidationError::MinMaxNotAllowed(CommandOptionType::String))
        );

        let option = CommandOption::builder(CommandOptionType::Integer, "count", "a count")
            .min_value(1)
            .max_value(10)
            .build()
            .unwrap();
        assert_eq!(option.to_json()["min_value"], json!(1));
        assert_eq!(option.to_json()["max_value"], json!(10));

        let option = CommandOption::builder(CommandOptionType::Number, "ratio", "a ratio")
            .min_value(0.0)
            .max_value(1.5)
            .build()
            .unwrap();
        assert_eq!(option.to_json()["max_value"], json!(1.5));
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let result = CommandOption::builder(CommandOptionType::Integer, "count", "a count")
            .min_value(10)
            .max_value(1)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::InvalidRange {
                min: OptionBound::Integer(10),
                max: OptionBound::Integer(1)
            })
        );

        let result = CommandOption::builder(CommandOptionType::Number, "ratio", "a ratio")
            .min_value(f64::NEG_INFINITY)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::NonFiniteNumber { field: "min_value" })
        );
    }

    #[test]
    fn test_large_integer_range_compared_exactly() {
        // f64 に変換すると両者が同じ値に丸まる
        let result = CommandOption::builder(CommandOptionType::Integer, "id", "an id")
            .min_value(i64::MAX)
            .max_value(i64::MAX - 1)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::InvalidRange {
                min: OptionBound::Integer(i64::MAX),
                max: OptionBound::Integer(i64::MAX - 1)
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "min_value (9223372036854775807) must not be greater than max_value (9223372036854775806)"
        );

        // 等しい境界は許可
        assert!(
            CommandOption::builder(CommandOptionType::Integer, "id", "an id")
                .min_value(i64::MAX)
                .max_value(i64::MAX)
                .build()
                .is_ok()
        );

        // 整数と小数の混在は f64 で比較
        let result = CommandOption::builder(CommandOptionType::Number, "ratio", "a ratio")
            .min_value(2)
            .max_value(1.5)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::InvalidRange {
                min: OptionBound::Integer(2),
                max: OptionBound::Number(1.5)
            })
        );
    }

    #[test]
    fn test_autocomplete_eligibility() {
        for kind in [
            CommandOptionType::String,
            CommandOptionType::Integer,
            CommandOptionType::Number,
        ] {
            let option = CommandOption::builder(kind, "q", "query")
                .autocomplete(true)
                .build();
            assert!(option.is_ok(), "{:?} should allow autocomplete", kind);
        }

        let result = CommandOption::builder(CommandOptionType::User, "who", "a user")
            .autocomplete(true)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::AutocompleteNotAllowed(CommandOptionType::User))
        );
    }

    #[test]
    fn test_nesting_rules() {
        let param = string_option("text").build().unwrap();
        let sub = CommandOption::builder(CommandOptionType::SubCommand, "add", "add one")
            .option(param.clone())
            .build()
            .unwrap();
        let group = CommandOption::builder(CommandOptionType::SubCommandGroup, "items", "items")
            .option(sub.clone())
            .build();
        assert!(group.is_ok());

        // パラメータ型は子を持てない
        assert_eq!(
            string_option("s").option(param.clone()).build(),
            Err(ValidationError::NestedOptionsNotAllowed(CommandOptionType::String))
        );

        // グループ直下にパラメータは置けない
        assert_eq!(
            CommandOption::builder(CommandOptionType::SubCommandGroup, "g", "group")
                .option(param)
                .build(),
            Err(ValidationError::InvalidNesting {
                parent: CommandOptionType::SubCommandGroup,
                child: CommandOptionType::String,
            })
        );

        // サブコマンドの中にサブコマンドは置けない
        assert!(matches!(
            CommandOption::builder(CommandOptionType::SubCommand, "s", "sub")
                .option(sub)
                .build(),
            Err(ValidationError::InvalidNesting { .. })
        ));
    }

    #[test]
    fn test_optional_fields_emitted_only_when_set() {
        let option = CommandOption::builder(CommandOptionType::Integer, "n", "number")
            .required(false)
            .build()
            .unwrap();
        let json = option.to_json();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("required"), Some(&json!(false)));
        for key in ["min_value", "max_value", "autocomplete", "channel_types", "options", "choices"] {
            assert!(!obj.contains_key(key), "unexpected key {}", key);
        }
    }

    #[test]
    fn test_nested_serialization_preserves_order() {
        let sub = CommandOption::builder(CommandOptionType::SubCommand, "set", "set values")
            .option(string_option("first").required(true).build().unwrap())
            .option(string_option("second").build().unwrap())
            .build()
            .unwrap();
        let json = sub.to_json();
        assert_eq!(json["type"], json!(1));
        assert_eq!(json["options"][0]["name"], json!("first"));
        assert_eq!(json["options"][0]["required"], json!(true));
        assert_eq!(json["options"][1]["name"], json!("second"));
    }
}
