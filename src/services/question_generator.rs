//! 问题生成服务 - 业务能力层
//!
//! 只负责"给出下一个问题"，不保存任何历史：
//! 防重复完全依赖调用方每次传入的 `previous_questions`

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::clients::{Complete, CompletionClient};
use crate::config::Config;
use crate::error::CompletionError;
use crate::utils::logging::truncate_text;

/// 降级模式下的默认问题
pub const DEFAULT_QUESTION: &str = "Can you clarify your main objective?";

/// 默认问题已经问过时的替代问题
pub const ALTERNATE_QUESTION: &str = "What concrete result do you want to achieve first?";

/// 补全服务调用失败时返回的问题
pub const PROVIDER_FAILURE_QUESTION: &str = "What is the top priority of your project?";

/// 调用方没有给出提示词时使用的指令
const GENERIC_INSTRUCTION: &str = "Generate a single relevant question.";

/// 提示词文件不存在时使用的系统指令
const DEFAULT_SYSTEM_PROMPT: &str = "You generate concise questions for an interview. \
                                     Ask ONE relevant question at a time, without preamble.";

const FORMAT_CONSTRAINTS: &str = "\n\nConstraints:\n\
                                  - Ask a NEW question covering an angle not yet addressed.\n\
                                  - A single sentence. No preamble. 5–18 words.\n";

/// 一次生成的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// 总是非空
    pub question: String,
    /// 补全服务失败时的原因
    pub warning: Option<String>,
}

/// 问题生成服务
///
/// 职责：
/// - 没有凭证时走降级模式（两个固定问题之间切换）
/// - 有凭证时构造防重复提示词并调用补全服务
/// - 吞掉补全服务的错误，始终返回可用的问题
/// - 不校验返回的问题是否真的没有重复
pub struct QuestionGenerator<C = CompletionClient> {
    client: Option<C>,
    prompts_path: PathBuf,
}

impl QuestionGenerator<CompletionClient> {
    /// 根据配置创建；未配置凭证时进入降级模式
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        let client = if config.has_provider_credential() {
            Some(CompletionClient::new(config)?)
        } else {
            warn!("⚠️ 未配置补全服务凭证，使用降级模式");
            None
        };

        Ok(Self {
            client,
            prompts_path: PathBuf::from(&config.prompts_path),
        })
    }
}

impl<C: Complete> QuestionGenerator<C> {
    /// 使用指定的补全客户端
    pub fn with_client(client: C, prompts_path: impl Into<PathBuf>) -> Self {
        Self {
            client: Some(client),
            prompts_path: prompts_path.into(),
        }
    }

    /// 不调用补全服务的生成器
    pub fn degraded(prompts_path: impl Into<PathBuf>) -> Self {
        Self {
            client: None,
            prompts_path: prompts_path.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.client.is_none()
    }

    /// 生成下一个问题
    pub async fn generate(&self, prompt_text: &str, previous_questions: &[String]) -> String {
        self.generate_detailed(prompt_text, previous_questions).await.question
    }

    /// 生成下一个问题，同时返回补全服务失败的原因
    pub async fn generate_detailed(&self, prompt_text: &str, previous_questions: &[String]) -> Generation {
        let Some(client) = &self.client else {
            let question = degraded_question(previous_questions);
            debug!("降级模式，返回固定问题: {}", question);
            return Generation {
                question: question.to_string(),
                warning: None,
            };
        };

        let user_message = build_user_message(prompt_text, previous_questions);
        let system_prompt = load_system_prompt(&self.prompts_path).await;

        match client.complete(&system_prompt, &user_message).await {
            Ok(question) => {
                info!("✓ 生成问题: {}", truncate_text(&question, 80));
                Generation {
                    question,
                    warning: None,
                }
            }
            Err(e) => {
                warn!("⚠️ 补全服务不可用，使用兜底问题: {}", e);
                Generation {
                    question: PROVIDER_FAILURE_QUESTION.to_string(),
                    warning: Some(e.to_string()),
                }
            }
        }
    }
}

/// 降级模式的两态选择：只看默认问题是否已经问过
pub fn degraded_question(previous_questions: &[String]) -> &'static str {
    if previous_questions.iter().any(|q| q == DEFAULT_QUESTION) {
        ALTERNATE_QUESTION
    } else {
        DEFAULT_QUESTION
    }
}

/// 构造用户消息：提示词 + 已问过的问题（非空时） + 格式约束
pub fn build_user_message(prompt_text: &str, previous_questions: &[String]) -> String {
    let mut message = if prompt_text.trim().is_empty() {
        GENERIC_INSTRUCTION.to_string()
    } else {
        prompt_text.to_string()
    };

    let asked: Vec<String> = previous_questions
        .iter()
        .filter(|q| !q.is_empty())
        .map(|q| format!("- {}", q))
        .collect();
    if !asked.is_empty() {
        message.push_str("\n\nQuestions already asked (do NOT repeat or paraphrase them):\n");
        message.push_str(&asked.join("\n"));
    }

    message.push_str(FORMAT_CONSTRAINTS);
    message
}

/// 读取系统指令；文件不存在、不可读或为空时使用内置指令
async fn load_system_prompt(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if !content.trim().is_empty() => content.trim().to_string(),
        Ok(_) => DEFAULT_SYSTEM_PROMPT.to_string(),
        Err(e) => {
            debug!("未读取到提示词文件 {} ({})，使用内置指令", path.display(), e);
            DEFAULT_SYSTEM_PROMPT.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 记录收到的消息并返回固定结果
    struct ScriptedClient {
        reply: Result<String, u16>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                reply: Err(status),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl Complete for ScriptedClient {
        async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, CompletionError> {
            self.seen
                .lock()
                .unwrap()
                .push((system_prompt.to_string(), user_message.to_string()));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(CompletionError::BadStatus {
                    endpoint: "https://provider.test".to_string(),
                    status: *status,
                }),
            }
        }
    }

    fn history(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn degraded_mode_is_two_valued() {
        assert_eq!(degraded_question(&[]), DEFAULT_QUESTION);
        assert_eq!(degraded_question(&history(&["Something else?"])), DEFAULT_QUESTION);
        assert_eq!(
            degraded_question(&history(&["Something else?", DEFAULT_QUESTION])),
            ALTERNATE_QUESTION
        );
        // 只认默认问题本身，不认替代问题
        assert_eq!(
            degraded_question(&history(&[DEFAULT_QUESTION, ALTERNATE_QUESTION])),
            ALTERNATE_QUESTION
        );
    }

    #[test]
    fn user_message_without_history_has_no_listing() {
        let message = build_user_message("Generate ONE question.", &[]);
        assert!(message.starts_with("Generate ONE question."));
        assert!(!message.contains("already asked"));
        assert!(message.contains("5–18 words"));
    }

    #[test]
    fn user_message_lists_every_previous_question() {
        let message = build_user_message("", &history(&["Who?", "", "Why?"]));
        assert!(message.starts_with(GENERIC_INSTRUCTION));
        assert!(message.contains("do NOT repeat or paraphrase"));
        assert!(message.contains("- Who?\n- Why?"));
        assert!(!message.contains("- \n"));
        let listing = message.find("already asked").unwrap();
        let constraints = message.find("Constraints:").unwrap();
        assert!(listing < constraints);
    }

    #[tokio::test]
    async fn degraded_generator_alternates_on_history() {
        let generator: QuestionGenerator = QuestionGenerator::degraded("missing-prompts.txt");
        assert!(generator.is_degraded());

        let first = generator.generate("Generate ONE question.", &[]).await;
        let second = generator.generate("Generate ONE question.", &[first.clone()]).await;
        assert_eq!(first, DEFAULT_QUESTION);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn provider_reply_is_returned_and_default_system_prompt_used() {
        let generator = QuestionGenerator::with_client(
            ScriptedClient::replying("Which team owns the budget?"),
            "definitely-missing-prompts.txt",
        );

        let generation = generator
            .generate_detailed("Generate ONE question.", &history(&["Who are you?"]))
            .await;
        assert_eq!(generation.question, "Which team owns the budget?");
        assert!(generation.warning.is_none());

        let client = generator.client.as_ref().unwrap();
        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, DEFAULT_SYSTEM_PROMPT);
        assert!(seen[0].1.contains("- Who are you?"));
    }

    #[tokio::test]
    async fn system_prompt_is_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"  You interview founders.\n").unwrap();

        let generator = QuestionGenerator::with_client(ScriptedClient::replying("Why now?"), file.path());
        generator.generate("", &[]).await;

        let seen = generator.client.as_ref().unwrap().seen.lock().unwrap();
        assert_eq!(seen[0].0, "You interview founders.");
    }

    #[tokio::test]
    async fn provider_failure_is_absorbed_with_warning() {
        let generator = QuestionGenerator::with_client(ScriptedClient::failing(502), "missing.txt");

        let generation = generator.generate_detailed("Generate ONE question.", &[]).await;
        assert_eq!(generation.question, PROVIDER_FAILURE_QUESTION);
        assert!(generation.warning.unwrap().contains("502"));
    }
}
