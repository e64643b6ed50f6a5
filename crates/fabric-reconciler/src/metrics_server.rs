//! HTTP endpoint exposing the metrics registry for scraping.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use std::net::SocketAddr;
use tracing::{error, info};

use crate::metrics::ReconcilerMetrics;

/// Builds the metrics router.
pub fn router(metrics: ReconcilerMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<ReconcilerMetrics>) -> impl IntoResponse {
    match metrics.export() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Serves the metrics endpoint until the process exits.
pub async fn serve(metrics: ReconcilerMetrics, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Metrics server listening");
    axum::serve(listener, router(metrics)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::Response;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_handler_serves_exposition() {
        let metrics = ReconcilerMetrics::new().unwrap();
        metrics.record_desired_totals(1, 0);

        let response = metrics_handler(State(metrics)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("vpcs_total 1"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health_handler().await, "OK");
    }
}
