use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_relay::commands;
use request_relay::config::Config;
use request_relay::ledger::SqliteLedger;
use request_relay::notify::{TelegramClient, TelegramNotifier};
use request_relay::relay::{Relay, RelayConfig};
use request_relay::source::HttpRequestSource;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            error!(error = %error, "configuration error");
            std::process::exit(1);
        }
    };

    let ledger = match SqliteLedger::open(&config.db_path).await {
        Ok(ledger) => ledger,
        Err(error) => {
            error!(path = %config.db_path.display(), error = %error, "failed to initialize ledger");
            std::process::exit(1);
        }
    };
    info!(path = %config.db_path.display(), "ledger ready");

    let telegram = TelegramClient::new(config.telegram_token.clone());
    let notifier = TelegramNotifier::new(telegram.clone(), config.telegram_chat_id.clone());
    let source = HttpRequestSource::new(config.api_url.clone());
    let relay = Relay::new(
        source,
        notifier,
        ledger,
        RelayConfig::new().with_poll_interval(config.poll_interval),
    );

    let shutdown = CancellationToken::new();

    let relay_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { relay.run(shutdown).await }
    });
    let listener_task = tokio::spawn(commands::run_listener(telegram, shutdown.clone()));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(error) => error!(error = %error, "failed to listen for shutdown signal"),
    }
    shutdown.cancel();

    let _ = relay_task.await;
    let _ = listener_task.await;
}
