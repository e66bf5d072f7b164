//! /remind - リマインダー管理

use slashreg::{
    ChannelType, Command, CommandOption, CommandOptionChoice, CommandOptionType, ValidationError,
};

/// /remind コマンドの定義
///
/// ```text
/// /remind add <text> [minutes] [channel] [repeat]
/// /remind list
/// /remind settings timezone <zone>
/// ```
pub fn register() -> Result<Command, ValidationError> {
    let add = CommandOption::builder(CommandOptionType::SubCommand, "add", "Add a reminder")
        .option(
            CommandOption::builder(CommandOptionType::String, "text", "What to remind you about")
                .required(true)
                .build()?,
        )
        .option(
            CommandOption::builder(CommandOptionType::Integer, "minutes", "Minutes from now")
                .min_value(1)
                .max_value(10080)
                .build()?,
        )
        .option(
            CommandOption::builder(CommandOptionType::Channel, "channel", "Where to post it")
                .channel_types([ChannelType::GuildText, ChannelType::GuildNews])
                .build()?,
        )
        .option(
            CommandOption::builder(CommandOptionType::String, "repeat", "Repeat interval")
                .choice(CommandOptionChoice::new("Never", "never")?)
                .choice(CommandOptionChoice::new("Daily", "daily")?)
                .choice(CommandOptionChoice::new("Weekly", "weekly")?)
                .build()?,
        )
        .build()?;

    let list = CommandOption::builder(CommandOptionType::SubCommand, "list", "List your reminders")
        .build()?;

    let timezone = CommandOption::builder(
        CommandOptionType::SubCommand,
        "timezone",
        "Set your timezone",
    )
    .option(
        CommandOption::builder(CommandOptionType::String, "zone", "IANA timezone name")
            .required(true)
            .autocomplete(true)
            .build()?,
    )
    .build()?;

    let settings = CommandOption::builder(
        CommandOptionType::SubCommandGroup,
        "settings",
        "Reminder settings",
    )
    .option(timezone)
    .build()?;

    Command::builder("remind", "Manage reminders")
        .options([add, list, settings])
        .build()
}
