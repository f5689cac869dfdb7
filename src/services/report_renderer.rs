//! 报告生成服务 - 业务能力层
//!
//! 只通过会话日志的读取接口取数据，不直接访问日志文件

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::info;

use crate::error::AppResult;
use crate::report::{layout, write_pdf};
use crate::services::SessionLog;

/// 下载时使用的文件名
pub const REPORT_FILE_NAME: &str = "questions_reponses.pdf";

/// 报告的 MIME 类型
pub const REPORT_CONTENT_TYPE: &str = "application/pdf";

pub struct ReportRenderer {
    log: Arc<SessionLog>,
}

impl ReportRenderer {
    pub fn new(log: Arc<SessionLog>) -> Self {
        Self { log }
    }

    /// 以当前本地时间生成报告
    pub fn render(&self) -> AppResult<Vec<u8>> {
        self.render_at(Local::now().naive_local())
    }

    /// 以指定时间生成报告，相同日志内容和时间得到相同字节
    pub fn render_at(&self, generated_at: NaiveDateTime) -> AppResult<Vec<u8>> {
        let text = self.log.read_all()?;
        let layout = layout(&text, generated_at);
        let bytes = write_pdf(&layout)?;

        info!(
            "✓ 报告已生成: {} 页, {} 字节",
            layout.page_count(),
            bytes.len()
        );
        Ok(bytes)
    }
}
