mod handlers;
mod state;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use state::AppState;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let state = AppState::new().await?;

    // Permissive CORS: the browser popup posts from an extension origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(300));

    let app = Router::new()
        .route("/convert", post(handlers::convert))
        .route("/download/:filename", get(handlers::download))
        .route("/health", get(handlers::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .unwrap_or(3000);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let addr = resolve_bind_addr(&host, port);

    info!("mp3ify server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse the configured host, falling back to loopback on bad input
fn resolve_bind_addr(host: &str, port: u16) -> SocketAddr {
    let ip = host.parse::<IpAddr>().unwrap_or_else(|_| {
        warn!("invalid HOST value {:?}, falling back to 127.0.0.1", host);
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    });
    SocketAddr::new(ip, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bind_addr() {
        assert_eq!(
            resolve_bind_addr("0.0.0.0", 3000),
            SocketAddr::from(([0, 0, 0, 0], 3000))
        );
        assert_eq!(
            resolve_bind_addr("192.168.1.5", 8080),
            SocketAddr::from(([192, 168, 1, 5], 8080))
        );
        assert_eq!(
            resolve_bind_addr("::1", 3000),
            SocketAddr::new(IpAddr::V6(std::net::Ipv6Addr::LOCALHOST), 3000)
        );
    }

    #[test]
    fn test_resolve_bind_addr_bad_input_falls_back() {
        assert_eq!(
            resolve_bind_addr("not-an-ip", 3000),
            SocketAddr::from(([127, 0, 0, 1], 3000))
        );
    }
}
