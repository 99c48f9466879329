use std::sync::Arc;

use clap::Parser;
use stamp_ledger::{
    adapters::{database::memory::MemoryDatabase, http},
    commands::DomainLogic,
    config::Config,
};
use tower::BoxError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .init();

    let domain = DomainLogic::new(Arc::new(MemoryDatabase::default()), config.ledger());
    let app = http::router(domain);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(
        addr = %config.listen_addr,
        batch_size = config.batch_size.get(),
        "listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
