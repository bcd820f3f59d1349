use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::repositories::fallback::FallbackStore;
use crate::settings::Settings;

pub mod document;
mod http;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Repository error: {0} - {1}")]
    Repository(String, String),
    #[error("User already exists: {0}")]
    DuplicateUser(String),
    #[error("Invalid credentials for user: {0}")]
    InvalidCredentials(String),
    #[error("Insufficient funds: balance {0}, requested {1}")]
    InsufficientFunds(f64, f64),
    #[error("Validation error: {0}")]
    Validation(String),
}

#[async_trait]
pub trait RequestHandler<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    async fn handle_request(&self, request: T);
}

#[async_trait]
pub trait Service<T, H>: Send + Sync + 'static
where
    T: Send + 'static,
    H: RequestHandler<T> + Clone + Send,
{
    async fn run(&mut self, handler: H, receiver: &mut mpsc::Receiver<T>) {
        while let Some(request) = receiver.recv().await {
            let handler = handler.clone();

            tokio::spawn(async move {
                handler.handle_request(request).await;
            });
        }
    }
}

pub async fn start_services(
    fallback: FallbackStore,
    settings: Settings,
    listen: String,
) -> Result<(), anyhow::Error> {
    let (document_tx, mut document_rx) = mpsc::channel(512);

    let mut document_service = document::DocumentService::new();
    let handler = document::DocumentRequestHandler::new(
        settings.store.master_key,
        settings.store.url,
        fallback,
    );

    if settings.store.seed_on_start {
        log::info!("Seeding the document store with the demo document.");
        handler
            .initialize()
            .await
            .map_err(|e| anyhow::anyhow!("Could not seed document store: {}", e))?;
    }

    log::info!("Starting document service.");
    tokio::spawn(async move {
        document_service.run(handler, &mut document_rx).await;
    });

    log::info!("Starting HTTP server.");
    http::start_http_server(&listen, document_tx).await?;

    Ok(())
}
