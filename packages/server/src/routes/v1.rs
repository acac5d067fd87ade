use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes(config))
        .route("/tournaments", get(handlers::tournament::list_tournaments))
        .route("/images/{*reference}", get(handlers::image::get_image))
}

fn product_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::product::list_products).post(handlers::product::store_product),
        )
        .route("/create", get(handlers::product::create_product_form))
        .route(
            "/{id}",
            get(handlers::product::show_product)
                .put(handlers::product::update_product)
                .post(handlers::product::update_product)
                .delete(handlers::product::destroy_product),
        )
        .route("/{id}/edit", get(handlers::product::edit_product_form))
        .layer(DefaultBodyLimit::max(config.images.body_limit()))
}
