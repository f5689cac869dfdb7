//! # Guided Interview
//!
//! 逐题生成访谈问题、追加保存问答记录、并把记录导出为 PDF 报告
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 对外部补全服务的单次调用
//! - `CompletionClient` - 发送请求并整理出一行问题
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionGenerator` - 防重复出题，含降级模式
//! - `SessionLog` - 只追加的会话日志
//! - `ReportRenderer` - 日志 → PDF
//!
//! ### ③ 报告排版（Report）
//! - `report/` - 确定性的分页、定位与 PDF 序列化
//!
//! ### ④ 接口层（Api）
//! - `api/` - 把请求数据交给业务能力层，错误统一转换为响应数据
//!
//! ## 模块结构

pub mod api;
pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use app::App;
pub use clients::{Complete, CompletionClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{QaPair, Session};
pub use services::{Generation, QuestionGenerator, ReportRenderer, SessionLog};
