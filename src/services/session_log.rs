//! 会话日志服务 - 业务能力层
//!
//! 唯一负责读写会话日志文件，只追加、不改写

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{QaPair, Session};

/// 日志为空或文件不存在时的占位文本
pub const NO_DATA_PLACEHOLDER: &str = "no data available";

/// 空回答在日志中的占位符
pub const EMPTY_ANSWER: &str = "(vide)";

/// 会话块的分隔行
pub const BLOCK_SEPARATOR: &str = "---";

/// 会话日志
///
/// 职责：
/// - 把一次会话格式化成一个完整的块后一次性追加
/// - 所有追加经过同一把写锁，块之间不会交错
/// - 读取时返回全部历史内容
pub struct SessionLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SessionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.log_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一个会话块
    pub fn append(&self, session: &Session) -> Result<(), StoreError> {
        let block = format_block(session);
        let path = self.path.display().to_string();

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned { path: path.clone() })?;

        self.ensure_dir()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        file.write_all(block.as_bytes())
            .map_err(|source| StoreError::WriteFailed { path, source })?;

        info!(
            "✓ 已保存会话 {} ({} 组问答)",
            session.timestamp,
            session.pairs.len()
        );
        Ok(())
    }

    /// 读取全部日志内容
    ///
    /// 从未写入过（文件不存在或为空）时返回 [`NO_DATA_PLACEHOLDER`]
    pub fn read_all(&self) -> Result<String, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(NO_DATA_PLACEHOLDER.to_string()),
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("会话日志不存在: {}", self.path.display());
                Ok(NO_DATA_PLACEHOLDER.to_string())
            }
            Err(source) => Err(StoreError::ReadFailed {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }

    /// 幂等地创建日志所在目录
    fn ensure_dir(&self) -> Result<(), StoreError> {
        let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
            path: dir.display().to_string(),
            source,
        })
    }
}

/// 把一次会话格式化为日志块
///
/// ```text
/// === Session @ {timestamp} ===
/// Q{id}: {question}
/// R{id}: {answer | (vide)}
/// ---
///
/// ```
pub fn format_block(session: &Session) -> String {
    let mut lines = Vec::with_capacity(session.pairs.len() * 2 + 3);
    lines.push(format!("=== Session @ {} ===", session.timestamp));
    for pair in &session.pairs {
        lines.extend(format_pair(pair));
    }
    lines.push(BLOCK_SEPARATOR.to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn format_pair(pair: &QaPair) -> [String; 2] {
    let question = single_line(&pair.question);
    let answer = single_line(&pair.answer);
    let answer = if answer.is_empty() { EMPTY_ANSWER } else { answer.as_str() };
    [
        format!("Q{}: {}", pair.label(), question),
        format!("R{}: {}", pair.label(), answer),
    ]
}

/// 换行替换为空格并去掉首尾空白
fn single_line(text: &str) -> String {
    text.replace('\n', " ").trim().to_string()
}
