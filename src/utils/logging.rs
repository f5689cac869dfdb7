/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

use crate::config::Config;

/// 记录程序启动信息
///
/// 只记录凭证是否存在，不输出凭证本身
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 访谈问答模式");
    info!(
        "🔑 补全服务凭证: {}",
        if config.has_provider_credential() { "OK" } else { "缺失（降级模式）" }
    );
    info!("🤖 模型: {}", config.provider_model);
    info!("📄 会话日志: {}", config.log_path().display());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（字符数）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
