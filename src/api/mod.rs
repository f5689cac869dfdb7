//! 对外接口层
//!
//! 把请求数据交给业务能力层，并把结果（包括错误）统一转换为可返回的数据。
//! 与具体的传输方式无关，命令行和其他外壳都通过这里调用核心

pub mod handlers;

pub use handlers::{ask, parse_save_payload, report, save, Download, JsonReply, ASK_PROMPT};
