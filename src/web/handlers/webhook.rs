use crate::services::dispatcher::HEADER_DELIVERY;
use crate::services::ingest::{self, InboundRequest};
use crate::web::error::AppError;
use crate::web::state::AppState;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use std::net::SocketAddr;
use std::sync::Arc;

/// POST /webhook/:slug
pub async fn receive(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = InboundRequest {
        slug,
        payload: body,
        headers,
        peer_ip: connect_info.map(|ConnectInfo(addr)| addr.ip()),
    };

    // The pipeline runs detached from this handler: if the sender hangs up mid-dispatch the
    // handler future is dropped, but the event must still be logged.
    let pipeline = tokio::spawn(async move {
        ingest::process_inbound(&state.db, &state.dispatcher, request).await
    });

    let result = match pipeline.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Webhook pipeline task failed: {}", e);
            return AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "Webhook processing failed")
                .into_response();
        }
    };

    let status = StatusCode::from_u16(result.response.status).unwrap_or(StatusCode::OK);
    let mut response = (status, Json(result.response)).into_response();
    if let Ok(value) = HeaderValue::from_str(&result.correlation_id) {
        response.headers_mut().insert(HEADER_DELIVERY, value);
    }
    response
}
