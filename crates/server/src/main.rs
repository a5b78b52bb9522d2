//! SevaSetu Server Entry Point

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use seva_agent::QuestionAssistant;
use seva_config::{load_settings, ConfigError, Settings};
use seva_core::LanguageRouter;
use seva_pipeline::{PollyTts, SpeechSynthesizer};
use seva_rag::{BedrockKnowledgeBase, RetrievalGateway};
use seva_server::{aws::load_sdk_config, create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> ExitCode {
    // Priority: flat env keys > SEVA__* > config/{env} > config/default > defaults
    let env = std::env::var("SEVA_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing is not initialized yet
            report_config_error(&e);
            return ExitCode::FAILURE;
        },
    };

    init_tracing(&settings);

    tracing::info!("Starting SevaSetu server v{}", env!("CARGO_PKG_VERSION"));
    for (key, value) in settings.summary() {
        tracing::info!(key, value = %value, "Configuration");
    }

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        },
    }
}

async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let metrics_handle = if settings.observability.metrics_enabled {
        let handle = init_metrics();
        if handle.is_some() {
            tracing::info!("Initialized Prometheus metrics at /metrics");
        }
        handle
    } else {
        None
    };

    let sdk_config = load_sdk_config(&settings.aws).await;
    let assistant = QuestionAssistant::new(
        LanguageRouter::new(&settings.supported_languages()),
        RetrievalGateway::new(
            Arc::new(BedrockKnowledgeBase::new(&sdk_config)),
            settings.retrieval_config(),
        ),
        SpeechSynthesizer::new(Arc::new(PollyTts::new(&sdk_config))),
    );
    tracing::info!(
        languages = ?assistant.router().languages(),
        knowledge_base = %settings.knowledge_base.knowledge_base_id,
        "Question assistant ready"
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let state = AppState::new(settings, assistant).with_metrics(metrics_handle);
    let cleanup_shutdown = state.sessions.start_cleanup_task();
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = cleanup_shutdown.send(true);
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn report_config_error(err: &ConfigError) {
    match err {
        ConfigError::Invalid(violations) => {
            eprintln!("Invalid configuration ({} problems):", violations.len());
            for violation in violations {
                eprintln!("  - {}", violation);
            }
        },
        other => eprintln!("Failed to load configuration: {}", other),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("seva={},tower_http=debug", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
