//! オプションの選択肢

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{check_length, ValidationError, MAX_CHOICE_VALUE_LENGTH, MAX_NAME_LENGTH};

/// 選択肢の値（数値または文字列）
#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    String(String),
}

impl ChoiceValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Integer(i) => Value::from(*i),
            // 構築時に有限値であることを保証済み
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::from(s.as_str()),
        }
    }
}

impl From<i64> for ChoiceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ChoiceValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ChoiceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ChoiceValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ChoiceValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// STRING / INTEGER / NUMBER オプションの固定選択肢
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOptionChoice {
    name: String,
    value: ChoiceValue,
}

impl CommandOptionChoice {
    /// 選択肢を作成
    ///
    /// * `name` - 1〜32文字
    /// * `value` - 数値はそのまま（有限値のみ）、文字列は1〜100文字
    pub fn new(
        name: impl Into<String>,
        value: impl Into<ChoiceValue>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        check_length("option choice name", &name, 1, MAX_NAME_LENGTH)?;

        let value = value.into();
        match &value {
            ChoiceValue::String(s) => {
                check_length("option choice value", s, 1, MAX_CHOICE_VALUE_LENGTH)?
            }
            ChoiceValue::Number(n) if !n.is_finite() => {
                return Err(ValidationError::NonFiniteNumber {
                    field: "option choice value",
                });
            }
            _ => {}
        }

        Ok(Self { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ChoiceValue {
        &self.value
    }

    /// レジストリ向けのJSON表現
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".to_string(), Value::from(self.name.as_str()));
        obj.insert("value".to_string(), self.value.to_json());
        Value::Object(obj)
    }
}

impl Serialize for CommandOptionChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
