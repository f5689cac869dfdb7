use std::sync::Arc;

use tracing::debug;

use crate::api::{self, Download, JsonReply};
use crate::config::Config;
use crate::error::AppResult;
use crate::services::{QuestionGenerator, ReportRenderer, SessionLog};
use crate::utils::logging::log_startup;

/// 应用主结构
///
/// 持有三个业务能力，外壳（命令行等）只通过这里调用
pub struct App {
    config: Config,
    generator: QuestionGenerator,
    log: Arc<SessionLog>,
    renderer: ReportRenderer,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let generator = QuestionGenerator::new(&config)?;
        let log = Arc::new(SessionLog::from_config(&config));
        let renderer = ReportRenderer::new(Arc::clone(&log));
        debug!("会话日志路径: {}", log.path().display());

        Ok(Self {
            config,
            generator,
            log,
            renderer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 取下一个问题
    pub async fn ask(&self, payload: Option<&[u8]>) -> JsonReply {
        api::ask(&self.generator, payload).await
    }

    /// 保存会话
    pub fn save(&self, payload: &[u8]) -> JsonReply {
        api::save(&self.log, payload)
    }

    /// 生成报告
    pub fn report(&self) -> Result<Download, JsonReply> {
        api::report(&self.renderer)
    }

    /// 读取全部会话日志
    pub fn read_log(&self) -> AppResult<String> {
        Ok(self.log.read_all()?)
    }
}
