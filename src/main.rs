use jewelbot_rust::{AppError, Configuration, CoordinatorBuilder};
use tokio_util::sync::CancellationToken;
use tracing::Level;

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let configuration = Configuration::load()?;
    init_logging(configuration.logging.max_level()?);

    let cancel_token = CancellationToken::new();
    let coordinator = CoordinatorBuilder::new(configuration)
        .cancel_token(cancel_token.clone())
        .build()?;

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown requested"),
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
        cancel_token.cancel();
    });

    coordinator.run().await
}
