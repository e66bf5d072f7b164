//! slashreg - Slash Command 定義をレジストリと同期するCLIツール
//!
//! ローカルのコマンド定義を検証し、グローバル / ギルド単位で
//! 一覧・取得・登録・更新・削除・一括置換する。

mod commands;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use slashreg::{ApiClient, ApiError, ClientConfig, Command, CommandRecord, Scope};
use std::path::PathBuf;
use tracing::{debug, warn};

/// slashreg CLI
#[derive(Parser)]
#[command(name = "slashreg", version)]
#[command(about = "Validate and sync slash command definitions", long_about = None)]
struct Cli {
    /// Use prod.config.json instead of dev.config.json
    #[arg(long)]
    prod: bool,

    /// Config file path (overrides --prod)
    #[arg(short, long, env = "SLASHREG_CONFIG")]
    config: Option<PathBuf>,

    /// Target guild ID (overrides the config's scope_id)
    #[arg(short, long, conflicts_with = "global")]
    guild: Option<String>,

    /// Target global commands even if the config has a scope_id
    #[arg(long)]
    global: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print local definitions as JSON (no network)
    Show {
        /// Command name (all if omitted)
        name: Option<String>,
    },
    /// List registered commands
    List,
    /// Show a registered command
    Get {
        /// Command ID
        id: String,
    },
    /// Register one local definition
    Create {
        /// Local command name
        name: String,
    },
    /// Update a registered command from a local definition
    Update {
        /// Command ID
        id: String,
        /// Local command name
        name: String,
    },
    /// Delete a registered command
    Delete {
        /// Command ID
        id: String,
    },
    /// Replace every registered command with the local definitions
    Sync {
        /// Confirm the overwrite (commands missing locally are removed)
        #[arg(long)]
        yes: bool,
    },
    /// Check credentials (fetch and revoke a token)
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    // トレーシング初期化
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    // 定義の検証はネットワークより先に行う
    let definitions =
        commands::register_commands().context("Invalid local command definition")?;
    debug!("Loaded {} local definitions", definitions.len());

    if let Commands::Show { name } = &cli.command {
        return show_command(&definitions, name.as_deref());
    }
    ensure_confirmed(&cli.command)?;

    let config = load_config(&cli)?;
    let mut client = ApiClient::new(config)?;
    let scope = resolve_scope(&cli, &client);

    client
        .fetch_token()
        .await
        .context("Could not fetch token")?;

    let result = run(&client, &scope, &cli.command, &definitions).await;

    // 操作が失敗してもトークンは失効させる
    let revoked = client.revoke_token().await;
    finish_session(result, revoked)?;

    if let Commands::Token = cli.command {
        println!("{} Credentials are valid", "✓".green());
    }
    Ok(())
}

/// 確認なしの一括置換を拒否する（ネットワークに触れる前に呼ぶ）
fn ensure_confirmed(command: &Commands) -> Result<()> {
    if let Commands::Sync { yes: false } = command {
        bail!("sync replaces every registered command in the scope; re-run with --yes");
    }
    Ok(())
}

/// 操作結果と失効結果をまとめる
///
/// 操作のエラーを優先し、その場合の失効エラーは警告ログに留める。
fn finish_session(result: Result<()>, revoked: Result<(), ApiError>) -> Result<()> {
    match (result, revoked) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(e)) => Err(e).context("Could not revoke token"),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(revoke_error)) => {
            warn!("Could not revoke token: {}", revoke_error);
            Err(e)
        }
    }
}

/// 設定ファイルを読み込み、環境変数で上書き
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let path = cli.config.clone().unwrap_or_else(|| {
        PathBuf::from(if cli.prod {
            "prod.config.json"
        } else {
            "dev.config.json"
        })
    });

    let config = ClientConfig::load(&path)?.apply_env();
    config.validate()?;
    Ok(config)
}

/// フラグ > 設定ファイルの順で登録範囲を決定
fn resolve_scope(cli: &Cli, client: &ApiClient) -> Scope {
    if cli.global {
        Scope::Global
    } else if let Some(guild) = &cli.guild {
        Scope::Guild(guild.clone())
    } else {
        client.default_scope()
    }
}

fn find_definition<'a>(definitions: &'a [Command], name: &str) -> Result<&'a Command> {
    match commands::find(definitions, name) {
        Some(command) => Ok(command),
        None => bail!("No local definition named '{}'", name),
    }
}

async fn run(
    client: &ApiClient,
    scope: &Scope,
    command: &Commands,
    definitions: &[Command],
) -> Result<()> {
    match command {
        Commands::List => {
            let records = client.list_commands(scope).await?;
            if records.is_empty() {
                println!("No commands registered ({}).", scope);
            } else {
                println!("{}", format!("Commands ({}):", scope).green().bold());
                for record in &records {
                    print_record(record);
                }
            }
        }
        Commands::Get { id } => {
            let record = client.get_command(scope, id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::Create { name } => {
            let definition = find_definition(definitions, name)?;
            let record = client.create_command(scope, definition).await?;
            println!("{} Command created ({}):", "✓".green(), scope);
            print_record(&record);
        }
        Commands::Update { id, name } => {
            let definition = find_definition(definitions, name)?;
            let record = client.update_command(scope, id, definition).await?;
            println!("{} Command updated ({}):", "✓".green(), scope);
            print_record(&record);
        }
        Commands::Delete { id } => {
            client.delete_command(scope, id).await?;
            println!("{} Command deleted: {}", "✓".green(), id);
        }
        Commands::Sync { .. } => {
            let records = client.overwrite_commands(scope, definitions).await?;
            println!(
                "{} Synced {} commands ({}):",
                "✓".green(),
                records.len(),
                scope
            );
            for record in &records {
                print_record(record);
            }
        }
        // 取得と失効の両方が成功して初めて有効と表示する
        Commands::Token => {}
        Commands::Show { name } => show_command(definitions, name.as_deref())?,
    }

    Ok(())
}

fn show_command(definitions: &[Command], name: Option<&str>) -> Result<()> {
    let json: serde_json::Value = match name {
        Some(name) => find_definition(definitions, name)?.to_json(),
        None => definitions.iter().map(Command::to_json).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn print_record(record: &CommandRecord) {
    println!(
        "  {} {} {}",
        record.id.yellow(),
        record.name.cyan(),
        record.description.dimmed()
    );
}
