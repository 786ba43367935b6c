use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::routing::get;
use tokio::net::ToSocketAddrs;
use tokio::sync::watch;

use crate::sink::Point;

/// Field groups of the most recent successful collection cycle.
pub type LatestPoints = watch::Receiver<Arc<Vec<Point>>>;

async fn metrics(State(latest): State<LatestPoints>) -> Json<Vec<Point>> {
    let points: Arc<Vec<Point>> = latest.borrow().clone();
    Json(points.as_ref().clone())
}

async fn health() -> &'static str {
    "ok"
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new(latest: LatestPoints) -> Self {
        let router = axum::Router::new()
            .route("/metrics", get(metrics))
            .route("/health", get(health))
            .with_state(latest);
        Self { router }
    }

    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("Serving metrics on {}", listener.local_addr()?);
        axum::serve(listener, self.router.into_make_service()).await
    }
}
