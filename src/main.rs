use clap::Parser;
use hirehub::application::payments::PaymentService;
use hirehub::config::Config;
use hirehub::infrastructure::chapa::ChapaClient;
use hirehub::infrastructure::open_stores;
use hirehub::interfaces::http::{AppState, router};
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Variables already present in the environment win over `.env`.
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if config.chapa.secret_key.is_empty() {
        warn!("CHAPA_SECRET_KEY is not set; gateway calls will be rejected");
    }

    let (payment_store, chat_store) = open_stores(&config.database_url).into_diagnostic()?;
    let gateway = ChapaClient::new(&config.chapa).into_diagnostic()?;

    let state = Arc::new(AppState {
        payments: PaymentService::new(payment_store, Box::new(gateway), &config.chapa),
        chats: chat_store,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.into_diagnostic()?;
    info!(%addr, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("server exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutting down server");
}
