//! 命令行外壳：只负责读写参数和文件，所有逻辑交给 `App`

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use guided_interview::api::JsonReply;
use guided_interview::{logger, App, Config};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tracing::info;

use commands::{AskArgs, Commands, ReportArgs, SaveArgs};

#[derive(Parser, Debug)]
#[command(
    name = "guided-interview",
    version,
    about = "Generate interview questions, keep an append-only Q/A log and export it as PDF."
)]
pub struct Cli {
    /// TOML 配置文件
    #[arg(long, global = true, env = "INTERVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// 显示调试日志
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        logger::init(self.verbose || config.verbose_logging);

        let app = App::initialize(config)?;

        match self.command {
            Commands::Ask(args) => run_ask(&app, args).await,
            Commands::Save(args) => run_save(&app, args).await,
            Commands::Report(args) => run_report(&app, args).await,
            Commands::Show => {
                info!("会话日志: {}", app.config().log_path().display());
                print!("{}", app.read_log()?);
                Ok(())
            }
        }
    }
}

async fn run_ask(app: &App, args: AskArgs) -> Result<()> {
    let mut previous = match &args.history {
        Some(path) => read_history(path).await?,
        None => Vec::new(),
    };
    previous.extend(args.previous);

    let payload = serde_json::to_vec(&json!({ "previous_questions": previous }))?;
    let reply = app.ask(Some(&payload)).await;
    print_reply(&reply)
}

async fn run_save(app: &App, args: SaveArgs) -> Result<()> {
    let payload = match &args.input {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("无法读取会话文件: {}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .context("无法读取标准输入")?;
            buf
        }
    };

    print_reply(&app.save(&payload))
}

async fn run_report(app: &App, args: ReportArgs) -> Result<()> {
    let download = match app.report() {
        Ok(download) => download,
        Err(reply) => return print_reply(&reply),
    };

    tokio::fs::write(&args.output, &download.bytes)
        .await
        .with_context(|| format!("无法写入报告: {}", args.output.display()))?;
    info!(
        "✓ 报告已写入 {} ({}, {} 字节)",
        args.output.display(),
        download.content_type,
        download.bytes.len()
    );
    Ok(())
}

/// 历史文件既可以是字符串数组，也可以是 `{ "previous_questions": [...] }`
async fn read_history(path: &Path) -> Result<Vec<String>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("无法读取历史文件: {}", path.display()))?;
    let value: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("历史文件不是合法 JSON: {}", path.display()))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("previous_questions") {
            Some(Value::Array(items)) => items,
            _ => bail!("历史文件缺少 previous_questions 列表: {}", path.display()),
        },
        _ => bail!("历史文件格式不支持: {}", path.display()),
    };

    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn print_reply(reply: &JsonReply) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&reply.body)?);
    if !reply.is_success() {
        bail!("请求失败 (HTTP {})", reply.status);
    }
    Ok(())
}
