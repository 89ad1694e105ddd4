//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `EVENTMIND__*` 覆盖（双下划线表示嵌套，
//! 如 `EVENTMIND__AGENT__BASE_URL=http://adk:8000`）。
//! LINE 凭据与模型凭据不走配置文件，启动时直接从环境变量读取并校验。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub agent: AgentSection,
    pub line: LineSection,
}

/// [app] 段：应用名（即注册到会话存储的 app_name）、监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub bind: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "EventMind".to_string(),
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

/// [agent] 段：ADK api server 地址与请求超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub base_url: String,
    /// 会话注册等短请求的超时（秒）；事件流不设超时，由平台侧 Webhook 超时兜底
    pub request_timeout_secs: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// [line] 段：Messaging API 地址（测试时可指向本地桩）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineSection {
    pub base_url: String,
}

impl Default for LineSection {
    fn default() -> Self {
        Self {
            base_url: "https://api.line.me".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 EVENTMIND__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 EVENTMIND__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("EVENTMIND")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 启动时校验模型侧环境变量
///
/// ADK 运行时与本服务同环境部署：GOOGLE_GENAI_USE_VERTEXAI 为 true 时要求
/// GOOGLE_CLOUD_PROJECT 与 GOOGLE_CLOUD_LOCATION，否则要求 GEMINI_API_KEY。
/// 缺失即返回错误，让进程在收到第一条消息前就退出。
pub fn validate_model_env() -> anyhow::Result<()> {
    let use_vertex =
        std::env::var("GOOGLE_GENAI_USE_VERTEXAI").unwrap_or_else(|_| "FALSE".to_string());
    if use_vertex.eq_ignore_ascii_case("true") {
        if std::env::var("GOOGLE_CLOUD_PROJECT").unwrap_or_default().is_empty() {
            anyhow::bail!(
                "Please set GOOGLE_CLOUD_PROJECT via env var when GOOGLE_GENAI_USE_VERTEXAI is true."
            );
        }
        if std::env::var("GOOGLE_CLOUD_LOCATION").unwrap_or_default().is_empty() {
            anyhow::bail!(
                "Please set GOOGLE_CLOUD_LOCATION via env var when GOOGLE_GENAI_USE_VERTEXAI is true."
            );
        }
    } else if std::env::var("GEMINI_API_KEY").unwrap_or_default().is_empty() {
        anyhow::bail!("Please set GEMINI_API_KEY via env var.");
    }
    Ok(())
}
