//! Fardog runner - Entry Point
//!
//! Loads accounts and proxies, then runs the daily account cycle until
//! interrupted.

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fardog::api::{DispatchConfig, RequestDispatcher};
use fardog::proxy::{HealthCheckerConfig, ProxyHealthManager};
use fardog::services::AccountCycleScheduler;
use fardog::sources::{load_accounts, load_proxy_candidates, FileLineSource};
use fardog::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config);

    info!("Starting Fardog runner");

    let accounts = load_accounts(&FileLineSource::new(&config.files.cookie_file)).await?;
    let candidates = load_proxy_candidates(&FileLineSource::new(&config.files.proxy_file)).await;

    let mut health = ProxyHealthManager::new(HealthCheckerConfig::from(&config.proxy));
    health.build_pool(&candidates).await;

    let dispatcher = RequestDispatcher::new(DispatchConfig::from(&config))?;
    let mut scheduler =
        AccountCycleScheduler::new(dispatcher, health, accounts, config.delays.clone());

    tokio::select! {
        _ = scheduler.run_forever() => {},
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Fardog runner stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.log.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
