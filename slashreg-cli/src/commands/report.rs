//! "Report message" - メッセージの右クリックメニュー

use slashreg::{Command, CommandType, ValidationError};

/// メッセージコマンドの定義（説明文なし）
pub fn register() -> Result<Command, ValidationError> {
    Command::builder("Report message", "")
        .kind(CommandType::Message)
        .default_permission(true)
        .build()
}
