//! /greet - ユーザーに挨拶する

use slashreg::{Command, CommandOption, CommandOptionType, ValidationError};

/// /greet コマンドの定義
pub fn register() -> Result<Command, ValidationError> {
    Command::builder("greet", "Greets a user")
        .option(
            CommandOption::builder(CommandOptionType::String, "person", "the person to greet")
                .build()?,
        )
        .build()
}
