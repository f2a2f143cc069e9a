//! Application router configuration.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

use crate::{
    AppState, Error, endpoints, horoscope::horoscope_endpoint,
    transaction::submit_transaction_endpoint,
};

/// The text served at the root route so that clients can check the server is up.
pub const LIVENESS_MESSAGE: &str = "🪐 Welcome to AstroWatch API! Server is alive!";

/// Return a router with all the app's routes.
///
/// The API routes are served from the root and again under [endpoints::API_PREFIX].
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(endpoints::HOROSCOPE, post(horoscope_endpoint))
        .route(
            endpoints::SUBMIT_TRANSACTION,
            // Screenshots are not size limited.
            post(submit_transaction_endpoint).layer(DefaultBodyLimit::disable()),
        );

    Router::new()
        .route(endpoints::ROOT, get(get_liveness_message))
        .merge(api_routes.clone())
        .nest(endpoints::API_PREFIX, api_routes)
        .fallback(get_404_not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_liveness_message() -> &'static str {
    LIVENESS_MESSAGE
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}
