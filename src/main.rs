use std::net::SocketAddr;
use std::process::ExitCode;

use pricealert::{config, routes, worker};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let settings = match config::load() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let monitor = match worker::build_monitor(&settings).await {
        Ok(m) => m,
        Err(e) => {
            tracing::error!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let ip = match settings.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(_) => {
            tracing::error!("configuration error: invalid value for HOST: {:?}", settings.host);
            return ExitCode::FAILURE;
        }
    };
    let addr = SocketAddr::from((ip, settings.port));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("could not bind {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("liveness endpoint on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, routes::app()).await {
            tracing::error!("liveness server stopped: {}", e);
        }
    });

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        tracing::info!("shutdown requested, finishing after the current cycle");
    };

    monitor.run(shutdown).await;

    ExitCode::SUCCESS
}
