use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jira_chat_notifier::chat::ChatClient;
use jira_chat_notifier::config::{ConfigLoader, Settings, bind_address};
use jira_chat_notifier::metrics::RelayMetrics;
use jira_chat_notifier::router::ChatRouter;
use jira_chat_notifier::routes::{AppState, app};

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jira_chat_notifier=info".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn print_config_help() {
    eprintln!("\nConfiguration file (config.yaml, config.yml or config.json in . or /etc/jira-chat-notifier/):");
    eprintln!("  general.secret      - Shared URL secret (required, or URL_SECRET)");
    eprintln!("  general.ticket_url  - Prefix for ticket links (e.g. https://jira.example.com/browse/)");
    eprintln!("  general.listen      - Address to bind (default: :8081)");
    eprintln!("  projects.<KEY>[]    - webhook (required), ticket_url, on_events");
    eprintln!("\nOptional environment variables:");
    eprintln!("  CONFIG_PATH                  - Explicit configuration file path");
    eprintln!("  URL_SECRET                   - Shared URL secret, overrides general.secret");
    eprintln!("  CONFIG_RELOAD_INTERVAL_SECS  - Config change poll interval, 0 disables (default: 5)");
    eprintln!("  OUTBOUND_TIMEOUT_SECS        - Chat request timeout (default: 5)");
    eprintln!("  LOG_FORMAT                   - Set to 'json' for JSON logs");
}

#[tokio::main]
async fn main() {
    // Settings decide the log format, so they are read before tracing is up
    let settings = Settings::from_env();
    init_tracing(settings.as_ref().is_ok_and(Settings::json_logs));

    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to read environment settings");
            eprintln!("Error: Failed to read environment settings: {}", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    info!("Starting JIRA Webhook receiver and chat sender");

    // Load configuration
    let loaded = ConfigLoader::from_settings(&settings)
        .and_then(|loader| loader.load().map(|table| (loader, table)));
    let (loader, table) = match loaded {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            eprintln!("Error: Failed to load configuration: {}", e);
            print_config_help();
            std::process::exit(1);
        }
    };

    info!(
        config_path = %loader.path().display(),
        listen = %table.listen(),
        projects = table.project_count(),
        reload_interval_secs = settings.config_reload_interval_secs,
        "Configuration loaded"
    );

    let chat_client = match ChatClient::new(Duration::from_secs(settings.outbound_timeout_secs)) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    let metrics = match RelayMetrics::new() {
        Ok(m) => m,
        Err(e) => {
            error!(error = %e, "Failed to initialize metrics");
            std::process::exit(1);
        }
    };

    let listen = bind_address(table.listen());

    // Create the chat router (event routing engine)
    let router = Arc::new(ChatRouter::new(table, chat_client, loader));

    // Support hot config reloading
    router
        .clone()
        .start_reload_task(settings.config_reload_interval_secs);

    let app_state = Arc::new(AppState { router, metrics });

    // Start the server
    let listener = match tokio::net::TcpListener::bind(&listen).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, address = %listen, "Cannot start HTTP server");
            std::process::exit(1);
        }
    };

    info!(address = %listen, "Listening");
    info!("Jira webhook URL: http://<your-host>/<secret>/jira");

    if let Err(e) = axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "HTTP server shutdown error");
        std::process::exit(1);
    }

    info!("Byebye");
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight requests");
}
