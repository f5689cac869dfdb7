//! 三个接口：取下一个问题、保存会话、下载报告

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::clients::Complete;
use crate::error::{AppError, InputError};
use crate::models::{QaPair, Session};
use crate::services::report_renderer::{REPORT_CONTENT_TYPE, REPORT_FILE_NAME};
use crate::services::{QuestionGenerator, ReportRenderer, SessionLog};

/// 取问题接口固定使用的提示词
pub const ASK_PROMPT: &str = "Generate ONE question.";

/// JSON 响应：状态码 + 响应体
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonReply {
    pub status: u16,
    pub body: Value,
}

impl JsonReply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl std::fmt::Display) -> Self {
        Self {
            status,
            body: json!({ "error": message.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 报告下载
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// 取下一个问题
///
/// 请求体可选：`{ "previous_questions": [...] }`。请求体缺失或无法解析时视为没有历史。
/// 总是返回 200；补全服务失败时响应中带 `warning`
pub async fn ask<C: Complete>(generator: &QuestionGenerator<C>, payload: Option<&[u8]>) -> JsonReply {
    let previous = payload.map(previous_questions).unwrap_or_default();
    let generation = generator.generate_detailed(ASK_PROMPT, &previous).await;

    let mut body = Map::new();
    body.insert("question".to_string(), Value::String(generation.question));
    if let Some(warning) = generation.warning {
        body.insert("warning".to_string(), Value::String(warning));
    }
    JsonReply::ok(Value::Object(body))
}

/// 保存一次完整的会话
///
/// 请求体：`{ "pairs": [{id, question, answer}], "timestamp": "..." }`。
/// 格式错误或写入失败都返回 400，格式错误时不会写入任何内容
pub fn save(log: &SessionLog, payload: &[u8]) -> JsonReply {
    let result = parse_save_payload(payload)
        .map_err(AppError::from)
        .and_then(|session| log.append(&session).map_err(AppError::from));

    match result {
        Ok(()) => JsonReply::ok(json!({ "status": "ok" })),
        Err(e) => {
            warn!("⚠️ 保存会话失败: {}", e);
            let status = if e.is_client_error() { 400 } else { 500 };
            JsonReply::error(status, client_message(&e))
        }
    }
}

/// 生成报告
pub fn report(renderer: &ReportRenderer) -> Result<Download, JsonReply> {
    match renderer.render() {
        Ok(bytes) => {
            info!("✓ 报告准备下载: {}", REPORT_FILE_NAME);
            Ok(Download {
                filename: REPORT_FILE_NAME,
                content_type: REPORT_CONTENT_TYPE,
                bytes,
            })
        }
        Err(e) => {
            warn!("⚠️ 报告生成失败: {}", e);
            Err(JsonReply::error(500, e))
        }
    }
}

/// 解析保存请求
///
/// - `pairs` 缺省视为空列表；存在但不是列表（包括 null）时报错
/// - 列表元素必须是对象
/// - `timestamp` 缺省、为空或不是字符串/数字时使用当前 UTC 时间
pub fn parse_save_payload(payload: &[u8]) -> Result<Session, InputError> {
    let value: Value = serde_json::from_slice(payload).map_err(InputError::InvalidJson)?;
    let object = value.as_object().ok_or(InputError::NotAnObject)?;

    let pairs = match object.get("pairs") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(_) => QaPair::deserialize(item).map_err(|_| InputError::InvalidPairs),
                _ => Err(InputError::InvalidPairs),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(InputError::InvalidPairs),
    };

    let timestamp = match object.get("timestamp") {
        Some(Value::String(ts)) => Some(ts.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(Session::with_optional_timestamp(timestamp, pairs))
}

fn previous_questions(payload: &[u8]) -> Vec<String> {
    let Ok(value) = serde_json::from_slice::<Value>(payload) else {
        return Vec::new();
    };
    value
        .get("previous_questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// 输入和存储错误只返回内层信息，不带分类前缀
fn client_message(e: &AppError) -> String {
    match e {
        AppError::Input(inner) => inner.to_string(),
        AppError::Store(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
