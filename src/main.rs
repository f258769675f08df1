use axum::{http::HeaderValue, routing::get};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use seo_inspector::config::Config;
use seo_inspector::fetch::HttpFetcher;
use seo_inspector::handlers;
use seo_inspector::state::AppState;

#[tokio::main]
async fn main() {
    // Load configuration first so `.env` values (APP_ENV, RUST_LOG) are
    // visible to the tracing setup.
    let config = Config::from_env().expect("Failed to load configuration");

    // Initialize tracing — JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seo_inspector=info,tower_http=info".parse().unwrap());

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 SEO Inspector starting...");
    info!(
        proxy = config.fetch_proxy_url.as_deref().unwrap_or("none"),
        timeout_secs = config.fetch_timeout.as_secs(),
        block_private_hosts = config.block_private_hosts,
        "📝 Configuration loaded"
    );

    let fetcher = HttpFetcher::from_config(&config).expect("Failed to build HTTP client");

    // CORS: permissive in dev, ALLOWED_ORIGINS only in production.
    let cors = if config.is_dev {
        info!("🔓 CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid origin in ALLOWED_ORIGINS");
                    None
                }
            })
            .collect();
        if origins.is_empty() {
            tracing::warn!(
                "🔒 CORS: restrictive (production mode). \
                 Cross-origin requests will be denied. \
                 Set ALLOWED_ORIGINS to allow specific origins."
            );
        }
        CorsLayer::new().allow_origin(origins)
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = handlers::router(AppState::new(fetcher))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(cors);

    let addr = config.server_addr();
    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
