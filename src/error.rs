use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 补全服务错误
    #[error("补全服务错误: {0}")]
    Completion(#[from] CompletionError),
    /// 会话日志读写错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 请求数据格式错误
    #[error("输入错误: {0}")]
    Input(#[from] InputError),
    /// 文档生成错误
    #[error("文档错误: {0}")]
    Render(#[from] RenderError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// 是否属于调用方的错误（对应 HTTP 4xx）
    ///
    /// 存储失败也归为客户端错误，与保存接口的约定一致
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Input(_) | AppError::Store(_))
    }
}

/// 补全服务调用失败（ProviderFailure）
#[derive(Debug, Error)]
pub enum CompletionError {
    /// 请求超时
    #[error("请求超时 ({endpoint})")]
    Timeout { endpoint: String },
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务返回非 2xx 状态
    #[error("HTTP {status} ({endpoint})")]
    BadStatus { endpoint: String, status: u16 },
    /// 响应体无法解析
    #[error("响应解析失败 ({endpoint}): {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端初始化失败: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// 会话日志读写失败（PersistenceFailure）
#[derive(Debug, Error)]
pub enum StoreError {
    /// 创建数据目录失败
    #[error("无法创建目录 {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 读取失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写锁被毒化（之前的写入线程 panic）
    #[error("写锁不可用: {path}")]
    LockPoisoned { path: String },
}

/// 请求数据格式错误（MalformedInput）
#[derive(Debug, Error)]
pub enum InputError {
    /// 请求体不是合法 JSON
    #[error("请求体不是合法 JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    /// 请求体不是 JSON 对象
    #[error("request body must be a JSON object")]
    NotAnObject,
    /// `pairs` 不是列表，或列表元素不是对象
    #[error("invalid 'pairs' format")]
    InvalidPairs,
}

/// 文档生成失败
#[derive(Debug, Error)]
pub enum RenderError {
    /// 内容流编码失败
    #[error("内容流编码失败: {0}")]
    Content(String),
    /// PDF 序列化失败
    #[error("PDF 序列化失败: {0}")]
    Serialize(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件无法读取
    #[error("无法读取配置文件 {path}: {source}")]
    FileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件格式错误
    #[error("配置文件格式错误 {path}: {source}")]
    FileInvalid {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
