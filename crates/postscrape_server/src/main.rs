use std::sync::Arc;

use postscrape_engine::ScrapeService;
use postscrape_logging::{scrape_info, scrape_warn};
use postscrape_server::platform::logging;
use postscrape_server::{build_router, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load()?;
    logging::initialize(config.log_level()?, config.log_file.as_deref());
    if config.max_concurrent > 1 {
        scrape_warn!(
            "max_concurrent = {} shares one browser session between requests",
            config.max_concurrent
        );
    }

    let service = Arc::new(ScrapeService::with_chromium(config.service_settings())?);
    let app = build_router(service.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    scrape_info!("listening on {}", config.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    scrape_info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        scrape_warn!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
