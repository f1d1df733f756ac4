use anyhow::Context;
use clap::Parser;
use sourcebot::domain::ports::SpeechSynthesizer;
use sourcebot::utils::error::{ErrorSeverity, SourceBotError};
use sourcebot::utils::{logger, validation::Validate};
use sourcebot::{
    notification_router, orchestrator_router, AnthropicClient, CliArgs, ElevenLabsClient,
    NotificationHub, ServiceConfig, WorkflowEngine,
};
use std::sync::Arc;

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &SourceBotError, context: &str) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(exit_code(e.severity()).max(1));
}

fn redacted(config: &ServiceConfig) -> ServiceConfig {
    let mut shown = config.clone();
    let mask = |key: &mut Option<String>| {
        if key.is_some() {
            *key = Some("********".to_string());
        }
    };
    mask(&mut shown.anthropic.api_key);
    mask(&mut shown.elevenlabs.api_key);
    shown
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
    }
    tracing::info!("🛑 Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = sourcebot::config::load_env_file();
    let args = CliArgs::parse();

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting SourceBot");
    match &env_file {
        Some(path) => tracing::info!("📁 Loaded environment from {}", path.display()),
        None => tracing::debug!("No api.env or .env file found"),
    }

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => fail(&e, "Failed to load configuration"),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        fail(&e, "Configuration validation failed");
    }
    for key in config.missing_keys() {
        tracing::warn!("⚠️  {} is not set; dependent endpoints will fail", key);
    }
    tracing::info!("✅ Configuration loaded and validated successfully");

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - services will not be started");
        let rendered = toml::to_string_pretty(&redacted(&config))
            .context("failed to render configuration")?;
        println!("{}", rendered);
        return Ok(());
    }

    let model = AnthropicClient::new(
        config.anthropic.api_key.clone(),
        config.anthropic.model.clone(),
    )
    .with_base_url(&config.anthropic.base_url);
    let voice = ElevenLabsClient::new(
        config.elevenlabs.api_key.clone(),
        config.elevenlabs.voice_id.clone(),
    )
    .with_model_id(&config.elevenlabs.model_id)
    .with_base_url(&config.elevenlabs.base_url);
    tracing::info!("🤖 Model: {}", model.model());
    tracing::info!("🔊 Voice: {}", voice.voice_id());
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(voice);

    let hub = NotificationHub::new(config.hub_settings(), Some(speech.clone()));
    let engine = Arc::new(
        WorkflowEngine::new(Arc::new(model), speech, config.dataset_paths())
            .with_notifications(hub.clone()),
    );

    let orchestrator_addr = format!("{}:{}", config.server.host, config.server.port);
    let notification_addr = format!(
        "{}:{}",
        config.server.host, config.server.notification_port
    );

    let orchestrator_listener = match tokio::net::TcpListener::bind(&orchestrator_addr).await {
        Ok(listener) => listener,
        Err(e) => fail(&SourceBotError::from(e), "Failed to bind orchestrator port"),
    };
    let notification_listener = match tokio::net::TcpListener::bind(&notification_addr).await {
        Ok(listener) => listener,
        Err(e) => fail(&SourceBotError::from(e), "Failed to bind notification port"),
    };

    tracing::info!("🗂️  Inventory: {}", config.data.inventory_file);
    tracing::info!("🗂️  Sales: {}", config.data.sales_file);
    tracing::info!(
        "🔔 Auto-approval: {}, voice notifications: {}",
        config.notifications.auto_approval,
        hub.voice_available()
    );
    tracing::info!("🔗 Agent platform: {}", config.notifications.agent_platform_url);
    tracing::info!("🌐 Orchestrator listening on http://{}", orchestrator_addr);
    tracing::info!("🌐 Notification service listening on http://{}", notification_addr);

    let orchestrator = axum::serve(orchestrator_listener, orchestrator_router(engine))
        .with_graceful_shutdown(shutdown_signal());
    let notifications = axum::serve(notification_listener, notification_router(hub))
        .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = tokio::try_join!(
        async { orchestrator.await },
        async { notifications.await }
    ) {
        fail(&SourceBotError::from(e), "Server terminated");
    }

    tracing::info!("✅ SourceBot stopped");
    Ok(())
}
