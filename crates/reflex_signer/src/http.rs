//! # HTTP Surface
//!
//! `axum` routes over [`SignatureService`]:
//!
//! - `POST /api/generate-mint-signature` - issue a mint signature
//! - `GET /health` - liveness and signer identity
//!
//! The body is taken as raw bytes so that malformed JSON gets the service's
//! own 400 message instead of the framework's rejection.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reflex_shared::MINT_SIGNATURE_PATH;
use serde_json::json;
use tokio::net::TcpListener;

use crate::service::SignatureService;

/// Builds the router.
pub fn router(service: Arc<SignatureService>) -> Router {
    Router::new()
        .route(MINT_SIGNATURE_PATH, post(generate_mint_signature))
        .route("/health", get(health))
        .with_state(service)
}

async fn generate_mint_signature(
    State(service): State<Arc<SignatureService>>,
    body: Bytes,
) -> Response {
    let response = service.handle(&body);
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

async fn health(State(service): State<Arc<SignatureService>>) -> Response {
    let signer = service.signer_address().map(|a| a.to_string());
    let contract = service
        .domain()
        .map(|d| d.verifying_contract.to_string());
    let ready = signer.is_some() && contract.is_some();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({ "ready": ready, "signer": signer, "nftContractAddress": contract })),
    )
        .into_response()
}

/// Serves the router on `listener` until the future is dropped.
///
/// # Errors
///
/// Propagates I/O errors from the listener.
pub async fn serve(listener: TcpListener, service: Arc<SignatureService>) -> std::io::Result<()> {
    let address = listener.local_addr()?;
    tracing::info!("Signature service listening on {}", address);
    axum::serve(listener, router(service)).await
}
