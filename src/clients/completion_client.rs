/// 补全服务客户端
///
/// 封装对外部补全服务的单次调用，不重试、不保存状态
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::CompletionError;
use crate::utils::logging::truncate_text;

/// 模型输出完全为空时使用的问题
pub const EMPTY_REPLY_QUESTION: &str = "Could you elaborate on your context?";

/// 行首行尾需要去掉的列表符号、引号和空白
const LINE_NOISE: &[char] = &[' ', '\t', '-', '–', '—', '•', ':'];

/// 补全能力
///
/// 返回一行整理好的文本；失败时返回可区分的 [`CompletionError`]
pub trait Complete: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// 补全服务客户端（兼容 chat/completions 接口）
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model_name: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatReply,
}

#[derive(Debug, Default, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// 第一条回复的文本，缺失时为空串
    fn into_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default()
    }
}

impl CompletionClient {
    /// 创建新的补全客户端
    pub fn new(config: &Config) -> Result<Self, CompletionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(CompletionError::ClientBuild)?;

        Ok(Self {
            http,
            api_key: config.provider_api_key.clone(),
            endpoint: config.provider_endpoint.clone(),
            model_name: config.provider_model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        })
    }

    async fn send(&self, system_prompt: &str, user_message: &str) -> Result<String, CompletionError> {
        debug!("调用补全服务，模型: {}", self.model_name);
        debug!("用户消息: {}", truncate_text(user_message, 200));

        let request = ChatRequest {
            model: &self.model_name,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| {
                warn!("补全服务调用失败: {}", source);
                if source.is_timeout() {
                    CompletionError::Timeout {
                        endpoint: self.endpoint.clone(),
                    }
                } else {
                    CompletionError::Transport {
                        endpoint: self.endpoint.clone(),
                        source,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("补全服务返回错误状态: {}", status);
            return Err(CompletionError::BadStatus {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body: ChatResponse = response.json().await.map_err(|source| CompletionError::Decode {
            endpoint: self.endpoint.clone(),
            source,
        })?;

        debug!("补全服务调用成功");
        Ok(body.into_content())
    }
}

impl Complete for CompletionClient {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, CompletionError> {
        let content = self.send(system_prompt, user_message).await?;
        Ok(extract_question(&content))
    }
}

/// 从模型输出中取出一行可用的问题
///
/// 规则依次为：
/// 1. 逐行去掉行首行尾的 [`LINE_NOISE`] 字符和空白
/// 2. 跳过处理后为空的行
/// 3. 第一个非空行即为结果
/// 4. 没有可用行时返回整段输出（trim 后），仍为空则返回 [`EMPTY_REPLY_QUESTION`]
pub fn extract_question(raw: &str) -> String {
    let content = raw.trim();
    if let Some(line) = first_clean_line(content) {
        return line.to_string();
    }
    if content.is_empty() {
        EMPTY_REPLY_QUESTION.to_string()
    } else {
        content.to_string()
    }
}

fn first_clean_line(content: &str) -> Option<&str> {
    content
        .lines()
        .map(|line| line.trim_matches(LINE_NOISE).trim())
        .find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_line_wins() {
        let raw = "\n\n- What drives your roadmap this quarter?\nSecond line";
        assert_eq!(extract_question(raw), "What drives your roadmap this quarter?");
    }

    #[test]
    fn bullets_and_dashes_are_stripped_on_both_ends() {
        assert_eq!(extract_question("• Who are your users? —"), "Who are your users?");
        assert_eq!(extract_question("\t–  : Which metric matters most?"), "Which metric matters most?");
    }

    #[test]
    fn noise_only_reply_falls_back_to_raw_text() {
        assert_eq!(extract_question(" --- \n •• "), "--- \n ••");
    }

    #[test]
    fn empty_reply_uses_generic_question() {
        assert_eq!(extract_question(""), EMPTY_REPLY_QUESTION);
        assert_eq!(extract_question("   \n\t"), EMPTY_REPLY_QUESTION);
    }

    #[test]
    fn inner_punctuation_is_kept() {
        assert_eq!(
            extract_question("What is the long-term goal: growth or profit?"),
            "What is the long-term goal: growth or profit?"
        );
    }

    #[test]
    fn missing_choices_decode_to_empty_content() {
        let body: ChatResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(body.into_content(), "");

        let body: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"Hi?"}}]}"#).unwrap();
        assert_eq!(body.into_content(), "Hi?");
    }

    #[test]
    fn request_carries_sampling_parameters() {
        let request = ChatRequest {
            model: "mistral-small-latest",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "usr" },
            ],
            temperature: 0.8,
            top_p: 0.9,
            max_tokens: 64,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "usr");
        assert_eq!(value["max_tokens"], 64);
        assert!(value.get("top_p").is_some());
    }

    // ========== 本地 HTTP 服务 ==========

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// 只应答一次的本地服务，返回补全地址和收到的原始请求
    async fn serve_once(response: String, delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            tokio::time::sleep(delay).await;
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
            request
        });

        (format!("http://{}/v1/chat/completions", addr), handle)
    }

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn client_for(endpoint: String, timeout_secs: u64) -> CompletionClient {
        let config = Config {
            provider_api_key: "test-key".to_string(),
            provider_endpoint: endpoint,
            request_timeout_secs: timeout_secs,
            ..Config::default()
        };
        CompletionClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn successful_reply_is_reduced_to_first_clean_line() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "\n- What is it?\nmore"}}]
        })
        .to_string();
        let (endpoint, server) = serve_once(http_response("200 OK", &body), Duration::ZERO).await;

        let client = client_for(endpoint, 5);
        let question = client.complete("sys prompt", "user message").await.unwrap();
        assert_eq!(question, "What is it?");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer test-key"));
        assert!(request.contains("\"model\":\"mistral-small-latest\""));
        assert!(request.contains("sys prompt"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_bad_status_error() {
        let (endpoint, server) =
            serve_once(http_response("500 Internal Server Error", "{}"), Duration::ZERO).await;

        let client = client_for(endpoint, 5);
        let err = client.complete("sys", "usr").await.unwrap_err();
        assert!(matches!(err, CompletionError::BadStatus { status: 500, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn slow_provider_is_a_timeout_error() {
        let (endpoint, server) =
            serve_once(http_response("200 OK", "{}"), Duration::from_secs(3)).await;

        let client = client_for(endpoint, 1);
        let err = client.complete("sys", "usr").await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout { .. }));
        server.abort();
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let (endpoint, server) = serve_once(http_response("200 OK", "not json"), Duration::ZERO).await;

        let client = client_for(endpoint, 5);
        let err = client.complete("sys", "usr").await.unwrap_err();
        assert!(matches!(err, CompletionError::Decode { .. }));
        server.await.unwrap();
    }
}
