use std::{net::SocketAddr, sync::Arc};

use axum::{Extension, Router, routing::get};
use tokio::sync::Mutex;

use crate::{Res, api, config, types::PkceToken, warning};

pub fn router(state: Arc<Mutex<Option<PkceToken>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)))
}

/// Serves the OAuth callback until the task is aborted.
pub async fn start_api_server(state: Arc<Mutex<Option<PkceToken>>>) {
    if let Err(e) = serve(state).await {
        warning!("Callback server stopped: {}", e);
    }
}

async fn serve(state: Arc<Mutex<Option<PkceToken>>>) -> Res<()> {
    let addr: SocketAddr = config::server_addr()?
        .parse()
        .map_err(|e| format!("Failed to parse server address: {}", e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
