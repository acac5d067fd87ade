pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;


use std::time::Duration;

use axum::Json;
use axum::http::HeaderValue;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Catalog API",
        version = "1.0.0",
        description = "Product catalog with image uploads backed by blob storage"
    ),
    paths(
        handlers::product::list_products,
        handlers::product::create_product_form,
        handlers::product::store_product,
        handlers::product::show_product,
        handlers::product::edit_product_form,
        handlers::product::update_product,
        handlers::product::destroy_product,
        handlers::tournament::list_tournaments,
        handlers::image::get_image,
    ),
    tags(
        (name = "Products", description = "Product CRUD with primary and gallery images"),
        (name = "Tournaments", description = "Tournaments products belong to"),
        (name = "Images", description = "Stored product images"),
    ),
)]
pub struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let api = ApiDoc::openapi();
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .with_state(state)
        .route(
            "/api-docs/openapi.json",
            get({
                let api = api.clone();
                move || {
                    let api = api.clone();
                    async move { Json(api) }
                }
            }),
        )
        .merge(Scalar::with_url("/scalar", api))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age));

    if config.allow_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
