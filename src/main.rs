//! EventMind LINE Webhook 服务
//!
//! 接收 LINE 群組訊息，交给 ADK Agent 判断是否包含活动信息，
//! 回复追问文本或「新增到行事曆」确认卡片。
//!
//! 环境变量:
//! - ChannelSecret: LINE Channel Secret
//! - ChannelAccessToken: LINE Channel Access Token
//! - GEMINI_API_KEY: Gemini API Key
//!   （GOOGLE_GENAI_USE_VERTEXAI=True 时改为 GOOGLE_CLOUD_PROJECT + GOOGLE_CLOUD_LOCATION）
//!
//! 启动: cargo run

use std::sync::Arc;

use eventmind::config::{load_config, validate_model_env, AppConfig};
use eventmind::core::Orchestrator;
use eventmind::integrations::line::{create_router, LineState};
use eventmind::runtime::{AdkClient, AgentRuntime};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let channel_secret =
        std::env::var("ChannelSecret").expect("Specify ChannelSecret as environment variable.");
    let channel_access_token = std::env::var("ChannelAccessToken")
        .expect("Specify ChannelAccessToken as environment variable.");
    validate_model_env()?;

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let runtime: Arc<dyn AgentRuntime> = Arc::new(AdkClient::new(
        &cfg.agent.base_url,
        &cfg.app.name,
        cfg.agent.request_timeout_secs,
    ));
    tracing::info!("Agent runtime: {} (app '{}')", cfg.agent.base_url, cfg.app.name);

    let state = Arc::new(LineState {
        orchestrator: Arc::new(Orchestrator::new(runtime)),
        channel_secret,
        channel_access_token,
        base_url: cfg.line.base_url.clone(),
    });

    let app = create_router(state);

    let addr: std::net::SocketAddr = cfg.app.bind.parse()?;
    tracing::info!("EventMind server listening on http://{}", addr);
    tracing::info!("Webhook URL: http://YOUR_HOST:{}/callback", addr.port());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
