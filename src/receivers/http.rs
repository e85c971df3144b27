//! HTTP ingestion endpoint.
//!
//! ```text
//! POST /notifications  {"title": .., "severity": .., "message": ..}
//!   200  accepted into the receiver queue
//!   400  "Error decoding JSON"
//!   503  receiver queue closed or shutting down
//! ```
//!
//! Bind and serve errors fail the attempt (the supervisor retries after backoff).
//! Cancellation triggers a graceful server shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{ChannelComponent, ComponentContext, Inlet, Properties, Receive, Receiver},
    error::{ChannelError, PropertyError},
    notification::Notification,
};

pub const KIND: &str = "HTTP";

/// Receiver exposing `POST /notifications` on `listenAddress`.
#[derive(Debug)]
pub struct HttpReceiver {
    listen_address: String,
}

/// Builder registered under [`KIND`].
pub fn build(
    ctx: ComponentContext,
    props: &Properties,
) -> Result<Arc<dyn ChannelComponent>, PropertyError> {
    let listen_address = props.required_str("listenAddress")?.to_string();
    Ok(Receiver::arc(ctx, HttpReceiver { listen_address }))
}

#[derive(Clone)]
struct Ingest {
    inlet: Inlet,
    cancel: CancellationToken,
}

/// Routes of the endpoint, bound to one receiver queue.
pub fn routes(inlet: Inlet, cancel: CancellationToken) -> Router {
    Router::new()
        .route("/notifications", post(accept))
        .with_state(Ingest { inlet, cancel })
}

async fn accept(State(ingest): State<Ingest>, body: Bytes) -> Response {
    let notification: Notification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(err) => {
            tracing::debug!(error = %err, "rejected request body");
            return (StatusCode::BAD_REQUEST, "Error decoding JSON").into_response();
        }
    };

    tokio::select! {
        res = ingest.inlet.push(notification) => match res {
            Ok(()) => StatusCode::OK.into_response(),
            Err(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response(),
        },
        _ = ingest.cancel.cancelled() => {
            (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
        }
    }
}

#[async_trait]
impl Receive for HttpReceiver {
    async fn receive(&self, output: Inlet, cancel: CancellationToken) -> Result<(), ChannelError> {
        let listener = TcpListener::bind(&self.listen_address).await?;
        tracing::info!(address = %listener.local_addr()?, "listening");

        let stop = cancel.clone();
        axum::serve(listener, routes(output, cancel.clone()))
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .await?;

        if cancel.is_cancelled() {
            tracing::info!("server stopped");
            Ok(())
        } else {
            Err(ChannelError::fail("server stopped unexpectedly"))
        }
    }
}
