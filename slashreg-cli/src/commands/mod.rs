//! 登録するコマンド定義
//!
//! 1コマンド1ファイルで定義し、ここで一覧にまとめる。

pub mod greet;
pub mod remind;
pub mod report;

use slashreg::{Command, CommandModule, ValidationError};

/// 全てのコマンド定義を構築
pub fn register_commands() -> Result<Vec<Command>, ValidationError> {
    Ok(vec![
        greet::register()?,
        remind::register()?,
        report::register()?,
    ])
}

/// 名前でコマンド定義を探す
pub fn find<'a, C: CommandModule>(commands: &'a [C], name: &str) -> Option<&'a C> {
    commands.iter().find(|c| c.name() == name)
}
