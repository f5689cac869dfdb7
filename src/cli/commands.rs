use std::path::PathBuf;

use clap::{Args, Subcommand};
use guided_interview::services::report_renderer::REPORT_FILE_NAME;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 取下一个问题
    Ask(AskArgs),

    /// 保存一次完整的会话（JSON：{ pairs, timestamp }）
    Save(SaveArgs),

    /// 生成 PDF 报告
    Report(ReportArgs),

    /// 输出全部会话日志
    Show,
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// 已经问过的问题，可重复
    #[arg(long = "previous")]
    pub previous: Vec<String>,

    /// 包含已问问题的 JSON 文件（字符串数组或 { "previous_questions": [...] }）
    #[arg(long)]
    pub history: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// 会话 JSON 文件，缺省时从标准输入读取
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// 输出路径
    #[arg(long, default_value = REPORT_FILE_NAME)]
    pub output: PathBuf,
}
